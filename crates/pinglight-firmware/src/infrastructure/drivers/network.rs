use core::net::{IpAddr, Ipv6Addr};
use core::str::FromStr;

use embassy_net::dns::DnsQueryType;
use embassy_net::{
    ConfigV6, DhcpConfig, IpAddress, Ipv6Cidr, Runner, Stack, StackResources, StaticConfigV6,
};
use esp_hal::peripherals::WIFI;
use esp_hal::rng::Rng;
use esp_radio::wifi::{Config as WifiConfig, WifiController, WifiDevice};
use heapless::{String, Vec};
use log::{debug, warn};
use pinglight_strip::readiness::is_global_ipv6;
use pinglight_strip::{LinkState, ProbeError};
use static_cell::make_static;

use crate::infrastructure::config;

/// One ICMP socket per strip slot plus DHCP and DNS.
const MAX_SOCKETS: usize = config::LED_COUNT + 3;

pub(crate) fn init_network_stack(
    wifi_device: WIFI<'static>,
) -> (
    Stack<'static>,
    Runner<'static, WifiDevice<'static>>,
    WifiController<'static>,
) {
    let esp_radio_ctrl = &*make_static!(esp_radio::init().expect("radio init failed"));
    let wifi_config = WifiConfig::default();
    let (controller, interfaces) = esp_radio::wifi::new(esp_radio_ctrl, wifi_device, wifi_config)
        .expect("wifi init failed");

    let mut dhcp_config = DhcpConfig::default();
    dhcp_config.hostname = String::from_str(config::NETWORK.hostname).ok();

    let mut net_config = embassy_net::Config::dhcpv4(dhcp_config);
    if let Some(ipv6) = static_ipv6() {
        net_config.ipv6 = ConfigV6::Static(ipv6);
    }

    let network_resources = make_static!(StackResources::<MAX_SOCKETS>::new());
    let (stack, runner) =
        embassy_net::new(interfaces.sta, net_config, network_resources, get_seed());

    (stack, runner, controller)
}

/// Static IPv6 configuration from `IPV6_ADDRESS` (`addr/prefix`) and
/// `IPV6_GATEWAY`.
fn static_ipv6() -> Option<StaticConfigV6> {
    let raw = config::NETWORK.ipv6_address?;
    let parsed = raw.split_once('/').and_then(|(address, prefix)| {
        Some((address.parse::<Ipv6Addr>().ok()?, prefix.parse::<u8>().ok()?))
    });
    let Some((address, prefix)) = parsed.filter(|(_, prefix)| *prefix <= 128) else {
        warn!("network: ignoring malformed IPV6_ADDRESS {}", raw);
        return None;
    };
    let gateway = config::NETWORK
        .ipv6_gateway
        .and_then(|gateway| gateway.parse::<Ipv6Addr>().ok());

    Some(StaticConfigV6 {
        address: Ipv6Cidr::new(address, prefix),
        gateway,
        dns_servers: Vec::new(),
    })
}

fn get_seed() -> u64 {
    let rng = Rng::new();
    u64::from(rng.random()) << 32 | u64::from(rng.random())
}

/// Address families the stack can reach hosts on right now
pub(crate) fn link_state(stack: Stack<'_>) -> LinkState {
    if !stack.is_link_up() {
        return LinkState::default();
    }
    LinkState {
        ipv4: stack.config_v4().is_some(),
        ipv6: stack
            .config_v6()
            .is_some_and(|config| is_global_ipv6(&config.address.address())),
    }
}

/// Resolve a host literal or name, IPv4 answers first.
pub(crate) async fn resolve_target(stack: Stack<'static>, host: &str) -> Result<IpAddr, ProbeError> {
    if let Ok(address) = host.parse::<IpAddr>() {
        return Ok(address);
    }

    for (query, record) in [(DnsQueryType::A, "A"), (DnsQueryType::Aaaa, "AAAA")] {
        match stack.dns_query(host, query).await {
            Ok(addresses) => {
                if let Some(address) = addresses.first() {
                    return Ok(to_ip_addr(*address));
                }
            }
            Err(e) => debug!("network: {} lookup for {} failed: {:?}", record, host, e),
        }
    }
    Err(ProbeError::Unresolvable)
}

fn to_ip_addr(address: IpAddress) -> IpAddr {
    match address {
        IpAddress::Ipv4(address) => IpAddr::V4(address),
        IpAddress::Ipv6(address) => IpAddr::V6(address),
    }
}
