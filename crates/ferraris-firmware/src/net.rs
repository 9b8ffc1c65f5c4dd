//! WiFi station bring-up and the TCP page server

use embassy_net::tcp::{Error as TcpError, TcpSocket};
use embassy_net::{Runner, Stack};
use embassy_time::{Duration, Timer};
use embedded_io_async::Write;
use esp_radio::wifi::{ClientConfig, ModeConfig, WifiController, WifiDevice, WifiEvent, WifiStaState};
use ferraris_core::{SharedMeter, pages};
use log::{debug, info, warn};

use crate::wifi_secrets::{WIFI_PASSWORD, WIFI_SSID};

/// Port the meter pages are served on
pub const HTTP_PORT: u16 = 80;

/// Delay before retrying a failed or dropped WiFi connection
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Idle timeout for a client socket
const SOCKET_TIMEOUT: Duration = Duration::from_secs(10);

/// Largest request head read from a client
const REQUEST_BUFFER_SIZE: usize = 512;

/// Socket transmit buffer; a full minute page is about 700 bytes
const TX_BUFFER_SIZE: usize = 2048;

/// Keep the station associated, reconnecting whenever the link drops
#[embassy_executor::task]
pub async fn connection_task(mut controller: WifiController<'static>) {
    info!("Starting WiFi connection task");

    loop {
        if esp_radio::wifi::sta_state() == WifiStaState::Connected {
            controller.wait_for_event(WifiEvent::StaDisconnected).await;
            warn!("WiFi disconnected");
            Timer::after(RECONNECT_DELAY).await;
        }

        if !matches!(controller.is_started(), Ok(true)) {
            let config = ModeConfig::Client(
                ClientConfig::default()
                    .with_ssid(WIFI_SSID.into())
                    .with_password(WIFI_PASSWORD.into()),
            );
            if let Err(e) = controller.set_config(&config) {
                warn!("Failed to configure WiFi: {:?}", e);
                Timer::after(RECONNECT_DELAY).await;
                continue;
            }
            if let Err(e) = controller.start_async().await {
                warn!("Failed to start WiFi: {:?}", e);
                Timer::after(RECONNECT_DELAY).await;
                continue;
            }
            info!("WiFi started, joining {}", WIFI_SSID);
        }

        match controller.connect_async().await {
            Ok(()) => info!("WiFi connected"),
            Err(e) => {
                warn!("WiFi connect failed: {:?}", e);
                Timer::after(RECONNECT_DELAY).await;
            }
        }
    }
}

#[embassy_executor::task]
pub async fn net_task(mut runner: Runner<'static, WifiDevice<'static>>) {
    runner.run().await
}

/// Read one request from `socket` and write back the rendered page
async fn serve(socket: &mut TcpSocket<'_>, meter: &SharedMeter) -> Result<(), TcpError> {
    let mut buf = [0u8; REQUEST_BUFFER_SIZE];
    let len = socket.read(&mut buf).await?;
    if len == 0 {
        return Ok(());
    }

    // The snapshot is taken in a critical section; rendering happens after
    let response = pages::handle(&buf[..len], meter);
    debug!(
        "Request answered with {} {}",
        response.status.code(),
        response.status.reason()
    );

    socket.write_all(response.render().as_bytes()).await?;
    socket.flush().await
}

/// Accept clients one at a time on [`HTTP_PORT`] and serve the meter pages
#[embassy_executor::task]
pub async fn http_task(stack: Stack<'static>, meter: &'static SharedMeter) {
    let mut rx_buffer = [0u8; REQUEST_BUFFER_SIZE];
    let mut tx_buffer = [0u8; TX_BUFFER_SIZE];

    stack.wait_config_up().await;
    if let Some(config) = stack.config_v4() {
        info!("Serving meter pages on http://{}/", config.address.address());
    }

    loop {
        let mut socket = TcpSocket::new(stack, &mut rx_buffer, &mut tx_buffer);
        socket.set_timeout(Some(SOCKET_TIMEOUT));

        if let Err(e) = socket.accept(HTTP_PORT).await {
            warn!("Accept failed: {:?}", e);
            continue;
        }

        if let Err(e) = serve(&mut socket, meter).await {
            warn!("Client error: {:?}", e);
        }

        socket.close();
        // Let the FIN go out before the socket is dropped
        Timer::after(Duration::from_millis(50)).await;
        socket.abort();
    }
}
