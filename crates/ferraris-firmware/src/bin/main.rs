#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
#![deny(clippy::large_stack_frames)]

use embassy_executor::Spawner;
use embassy_net::StackResources;
use embassy_time::{Duration, Timer};
use esp_hal::clock::CpuClock;
use esp_hal::interrupt::Priority;
use esp_hal::interrupt::software::SoftwareInterruptControl;
use esp_hal::rng::Rng;
use esp_hal::timer::timg::TimerGroup;
use esp_rtos::embassy::InterruptExecutor;
use log::{error, info};
use static_cell::StaticCell;

use ferraris_core::sensor::HeldSensor;
use ferraris_core::{MeterConfig, MeterEngine, SharedMeter};
use ferraris_firmware::adc_sensor::AdcReflectance;
use ferraris_firmware::net::{connection_task, http_task, net_task};
use ferraris_firmware::tick::tick_task;

/// The 12-bit ADC reads four times the counts of the 10-bit calibration
const METER_CONFIG: MeterConfig = MeterConfig {
    reflectance_threshold: 840 * 4,
    ..MeterConfig::DEFAULT
};

/// Sockets needed by the stack: DHCP plus the page server
const STACK_SOCKETS: usize = 3;

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    rtt_target::rprintln!("PANIC: {}", info);
    loop {}
}

extern crate alloc;

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

static METER: StaticCell<SharedMeter> = StaticCell::new();
static TICK_EXECUTOR: StaticCell<InterruptExecutor<2>> = StaticCell::new();
static RADIO: StaticCell<esp_radio::Controller<'static>> = StaticCell::new();
static STACK_RESOURCES: StaticCell<StackResources<STACK_SOCKETS>> = StaticCell::new();

#[allow(
    clippy::large_stack_frames,
    reason = "it's not unusual to allocate larger buffers etc. in main"
)]
#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    rtt_target::rtt_init_log!();

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    esp_alloc::heap_allocator!(#[esp_hal::ram(reclaimed)] size: 73744);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    info!("Embassy initialized!");

    // Meter engine first, so counting starts before the network is up
    let engine = match MeterEngine::new(METER_CONFIG) {
        Ok(engine) => engine,
        Err(e) => {
            error!("Invalid meter configuration: {}", e);
            loop {
                Timer::after(Duration::from_secs(1)).await;
            }
        }
    };
    let meter: &'static SharedMeter = METER.init(SharedMeter::new(engine));

    let sensor = AdcReflectance::new(peripherals.ADC1, peripherals.GPIO1);
    // Start from a reflective reading so a stripe at boot still counts
    let sensor = HeldSensor::new(sensor, 0);

    // The tick runs above thread mode so network and page work can't delay it
    let sw_ints = SoftwareInterruptControl::new(peripherals.SW_INTERRUPT);
    let tick_executor = TICK_EXECUTOR.init(InterruptExecutor::new(sw_ints.software_interrupt2));
    let tick_spawner = tick_executor.start(Priority::Priority2);
    tick_spawner
        .spawn(tick_task(meter, sensor, METER_CONFIG.tick_period_ms))
        .expect("Failed to spawn tick task");

    info!(
        "Meter running: {} rev/kWh, threshold {}",
        METER_CONFIG.pulses_per_kwh, METER_CONFIG.reflectance_threshold
    );

    // WiFi and the network stack
    let radio_init = RADIO.init(esp_radio::init().expect("Failed to initialize Wi-Fi/BLE controller"));
    let (wifi_controller, interfaces) =
        esp_radio::wifi::new(radio_init, peripherals.WIFI, Default::default())
            .expect("Failed to initialize Wi-Fi controller");

    let rng = Rng::new();
    let seed = (rng.random() as u64) << 32 | rng.random() as u64;

    let (stack, runner) = embassy_net::new(
        interfaces.sta,
        embassy_net::Config::dhcpv4(Default::default()),
        STACK_RESOURCES.init(StackResources::new()),
        seed,
    );

    spawner
        .spawn(connection_task(wifi_controller))
        .expect("Failed to spawn WiFi task");
    spawner
        .spawn(net_task(runner))
        .expect("Failed to spawn network task");
    spawner
        .spawn(http_task(stack, meter))
        .expect("Failed to spawn page server");

    loop {
        let snapshot = meter.snapshot();
        info!(
            "{} W now, {} Wh since boot, {} minutes recorded",
            snapshot.current_usage(),
            snapshot.energy_wh(),
            snapshot.minutes_committed()
        );
        Timer::after(Duration::from_secs(60)).await;
    }
}
