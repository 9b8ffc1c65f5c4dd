//! Desktop simulator for the ferraris energy meter.
//!
//! Spins a synthetic meter disc in a background tick thread, feeding the
//! same engine the firmware runs, and serves the meter's pages on
//! <http://127.0.0.1:8080/>. Simulated time runs [`SPEEDUP`] times faster
//! than wall-clock time so the minute history fills in reasonable time.
//!
//! Set `RUST_LOG=debug` to see every detected pulse.

mod disc;

use std::fmt::Write as _;
use std::io::{self, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use ferraris_core::engine::{TickOutcome, UsageReading};
use ferraris_core::sensor::HeldSensor;
use ferraris_core::{MeterConfig, MeterEngine, MeterSnapshot, SharedMeter, pages};
use log::{debug, error, info, warn};

use disc::MockDisc;

// ---------------------------------------------------------------------------
// Simulation constants
// ---------------------------------------------------------------------------

/// Address the page server listens on
const LISTEN_ADDR: &str = "127.0.0.1:8080";

/// Simulated ticks run per wall-clock tick period
const SPEEDUP: u32 = 20;

/// Largest request head read from a client
const REQUEST_BUFFER_SIZE: usize = 1024;

/// Minutes shown in the console summary after each commit
const SUMMARY_MINUTES: usize = 10;

/// Client socket timeout
const CLIENT_TIMEOUT: Duration = Duration::from_secs(2);

// ---------------------------------------------------------------------------
// Tick thread
// ---------------------------------------------------------------------------

fn log_outcome(outcome: &TickOutcome, disc: &MockDisc) {
    if let Some(pulse) = outcome.pulse {
        match pulse.usage {
            UsageReading::Measured(watts) => debug!(
                "Pulse after {} ticks: {} W (load {:.0} W)",
                pulse.interval_ticks,
                watts,
                disc.load_watts()
            ),
            UsageReading::Held(watts) => {
                warn!("Pulse with zero interval, holding {} W", watts)
            }
        }
    }

    if let Some(committed) = outcome.committed {
        info!(
            "Minute {} committed: {} rotations",
            committed.index, committed.rotations
        );
    }
}

/// Log the most recent minutes, oldest first
fn log_recent_minutes(snapshot: &MeterSnapshot) {
    let minutes: Vec<(usize, u16)> = snapshot.history.chronological().collect();
    let recent = &minutes[minutes.len().saturating_sub(SUMMARY_MINUTES)..];

    let mut line = String::new();
    for (slot, rotations) in recent {
        let _ = write!(line, " #{}:{}", slot, rotations);
    }
    info!(
        "Last {} minutes:{} | {} Wh since boot",
        recent.len(),
        line,
        snapshot.energy_wh()
    );
}

/// Drive the engine at `SPEEDUP` simulated ticks per tick period, forever
fn run_ticks(meter: Arc<SharedMeter>, config: MeterConfig) {
    let period = Duration::from_millis(config.tick_period_ms as u64);
    let mut sensor = HeldSensor::new(MockDisc::new(config.pulses_per_kwh, config.tick_period_ms), 0);

    loop {
        let period_start = Instant::now();

        for _ in 0..SPEEDUP {
            let sample = sensor.sample();
            let outcome = meter.tick(sample);
            // Outcome handling happens outside the critical section
            log_outcome(&outcome, sensor.inner());
            if outcome.committed.is_some() {
                log_recent_minutes(&meter.snapshot());
            }
        }

        // --- Tick pacing --------------------------------------------------
        let elapsed = period_start.elapsed();
        if elapsed < period {
            thread::sleep(period - elapsed);
        }
    }
}

// ---------------------------------------------------------------------------
// Page server
// ---------------------------------------------------------------------------

fn serve_client(mut stream: TcpStream, meter: &SharedMeter) -> io::Result<()> {
    stream.set_read_timeout(Some(CLIENT_TIMEOUT))?;
    stream.set_write_timeout(Some(CLIENT_TIMEOUT))?;

    let mut buf = [0u8; REQUEST_BUFFER_SIZE];
    let len = stream.read(&mut buf)?;
    if len == 0 {
        return Ok(());
    }

    let response = pages::handle(&buf[..len], meter);
    debug!(
        "{} -> {} {}",
        String::from_utf8_lossy(buf[..len].split(|&b| b == b'\r').next().unwrap_or_default()),
        response.status.code(),
        response.status.reason()
    );

    stream.write_all(response.render().as_bytes())?;
    stream.flush()
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    env_logger::init();
    info!("Starting ferraris simulator");

    let config = MeterConfig::DEFAULT;
    let engine = match MeterEngine::new(config) {
        Ok(engine) => engine,
        Err(e) => {
            error!("Invalid meter configuration: {}", e);
            return;
        }
    };
    info!(
        "Meter: {} rev/kWh, threshold {}, {} ticks/minute, {}x speed",
        config.pulses_per_kwh, config.reflectance_threshold, config.ticks_per_minute, SPEEDUP
    );

    let meter = Arc::new(SharedMeter::new(engine));

    let tick_meter = Arc::clone(&meter);
    thread::spawn(move || run_ticks(tick_meter, config));

    let listener = match TcpListener::bind(LISTEN_ADDR) {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", LISTEN_ADDR, e);
            return;
        }
    };
    info!("Serving meter pages on http://{}/", LISTEN_ADDR);

    // One client at a time, like the firmware's single socket
    for stream in listener.incoming() {
        let result = stream.and_then(|stream| serve_client(stream, &meter));
        if let Err(e) = result {
            warn!("Client error: {}", e);
        }
    }

    info!("Simulator exiting");
}
