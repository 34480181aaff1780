use embassy_net::{Runner, Stack};
use embassy_time::{Duration, Timer};
use esp_radio::wifi::{
    ClientConfig, ModeConfig, WifiController, WifiDevice, WifiEvent, WifiStaState,
};
use log::{info, warn};
use pinglight_strip::readiness::is_global_ipv6;
use pinglight_strip::{LinkState, NetworkReadiness};

use crate::infrastructure::{config, drivers::link_state};

const RECONNECT_DELAY: Duration = Duration::from_millis(2000);
const RETRY_DELAY: Duration = Duration::from_millis(5000);
const MONITOR_PERIOD: Duration = Duration::from_millis(100);

/// Background task for connecting to the `WiFi` network
///
/// It connects to the `WiFi` network and waits for the connection to be established.
/// If the connection is lost, it tries to reconnect.
#[embassy_executor::task]
pub(crate) async fn wifi_connection_task(mut controller: WifiController<'static>) {
    info!("network: connecting to ap {}", config::WIFI.ssid);
    loop {
        if esp_radio::wifi::sta_state() == WifiStaState::Connected {
            controller.wait_for_event(WifiEvent::StaDisconnected).await;
            warn!("network: disconnected, retrying");
            Timer::after(RECONNECT_DELAY).await;
        }

        if !matches!(controller.is_started(), Ok(true)) {
            let client_config = ModeConfig::Client(
                ClientConfig::default()
                    .with_ssid(config::WIFI.ssid.into())
                    .with_password(config::WIFI.password.into()),
            );
            if let Err(e) = controller.set_config(&client_config) {
                warn!("network: invalid wifi config: {:?}", e);
                Timer::after(RETRY_DELAY).await;
                continue;
            }
            if let Err(e) = controller.start_async().await {
                warn!("network: failed to start wifi: {:?}", e);
                Timer::after(RETRY_DELAY).await;
                continue;
            }
        }

        if let Err(e) = controller.connect_async().await {
            warn!("network: failed to connect to wifi: {:?}", e);
            Timer::after(RETRY_DELAY).await;
        }
    }
}

/// Background task for running the network stack
#[embassy_executor::task]
pub(crate) async fn network_runner_task(mut runner: Runner<'static, WifiDevice<'static>>) {
    runner.run().await;
}

/// Publishes which address families are usable
///
/// IPv4 counts once DHCP assigned an address, IPv6 only with a global
/// address. Both drop as soon as the link goes down.
#[embassy_executor::task]
pub(crate) async fn network_monitor_task(
    stack: Stack<'static>,
    readiness: &'static NetworkReadiness,
) {
    let mut published = LinkState::default();
    let mut link_local_logged = false;
    readiness.publish(published);
    loop {
        let state = link_state(stack);
        if !link_local_logged {
            let link_local = stack
                .config_v6()
                .filter(|config| !is_global_ipv6(&config.address.address()));
            if let Some(config) = link_local {
                info!("network: got ip6 link local: {}", config.address);
                link_local_logged = true;
            }
        }
        if state != published {
            log_transition(stack, published, state);
            readiness.publish(state);
            published = state;
        }
        Timer::after(MONITOR_PERIOD).await;
    }
}

fn log_transition(stack: Stack<'_>, from: LinkState, to: LinkState) {
    if to.ipv4 && !from.ipv4 {
        if let Some(config) = stack.config_v4() {
            info!("network: got ip: {}", config.address);
        }
    }
    if to.ipv6 && !from.ipv6 {
        if let Some(config) = stack.config_v6() {
            info!("network: got ip6: {}", config.address);
        }
    }
    if !to.any() && from.any() {
        warn!("network: link lost, waiting for reconnect");
    }
}
