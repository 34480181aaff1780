use embassy_time::Duration;
use pinglight_strip::{ChannelId, LedFamily, OutputPin, StripSetup};
use smart_leds::RGB8;

#[cfg(any(
    all(feature = "ws2812", feature = "ws2811"),
    all(feature = "ws2812", feature = "sk6812"),
    all(feature = "ws2811", feature = "sk6812"),
))]
compile_error!("select exactly one of the `ws2812`, `ws2811` and `sk6812` features");

#[cfg(not(any(feature = "ws2812", feature = "ws2811", feature = "sk6812")))]
compile_error!("no LED family feature selected");

pub(crate) struct WifiConfig {
    pub ssid: &'static str,
    pub password: &'static str,
}

pub(crate) struct NetworkConfig {
    pub hostname: &'static str,
    /// Static IPv6 address with prefix, `None` leaves IPv6 unconfigured
    pub ipv6_address: Option<&'static str>,
    pub ipv6_gateway: Option<&'static str>,
}

pub(crate) struct ProbeConfig {
    pub interval: Duration,
    pub timeout: Duration,
    /// Echo requests per host, `None` probes forever
    pub count: Option<u32>,
    pub payload_size: usize,
    /// Extra wait for IPv6 targets when IPv6 is not up yet
    pub ipv6_settle: Duration,
    pub reachable: RGB8,
    pub unreachable: RGB8,
}

pub(crate) const LED_COUNT: usize = 25;

pub(crate) const WIFI: WifiConfig = WifiConfig {
    ssid: env!("WIFI_SSID"),
    password: env!("WIFI_PASSWORD"),
};

pub(crate) const NETWORK: NetworkConfig = NetworkConfig {
    hostname: "pinglight",
    ipv6_address: option_env!("IPV6_ADDRESS"),
    ipv6_gateway: option_env!("IPV6_GATEWAY"),
};

#[cfg(feature = "ws2812")]
const LED_FAMILY: LedFamily = LedFamily::Ws2812;
#[cfg(feature = "ws2811")]
const LED_FAMILY: LedFamily = LedFamily::Ws2811;
#[cfg(feature = "sk6812")]
const LED_FAMILY: LedFamily = LedFamily::Sk6812Rgbw;

/// RMT channel 0 driving GPIO 27, see [`led_gpio!`]
pub(crate) const STRIP: StripSetup = StripSetup {
    channel: ChannelId(0),
    pin: OutputPin(27),
    family: LED_FAMILY,
    length: LED_COUNT,
};

pub(crate) const PROBE: ProbeConfig = ProbeConfig {
    interval: Duration::from_millis(1000),
    timeout: Duration::from_millis(1000),
    count: None,
    payload_size: 64,
    ipv6_settle: Duration::from_secs(3),
    reachable: RGB8::new(0x03, 0x0f, 0x03),
    unreachable: RGB8::new(0x0f, 0x03, 0x03),
};

/// Host probed for every strip slot, `None` keeps the slot dark.
pub(crate) const TARGET_HOSTS: [Option<&str>; LED_COUNT] = [
    // IPv4
    Some("8.8.8.8"),
    Some("1.1.1.1"),
    None,
    Some("10.196.0.1"),
    Some("10.0.0.1"),
    // IPv6
    Some("2001:4860:4860::8888"),
    Some("2606:4700:4700::1111"),
    None,
    Some("240b:10:9ab0:2201::1"),
    Some("2400:4050:2223:4f00::2"),
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
];

#[macro_export]
macro_rules! led_gpio {
    ($p:expr) => {
        $p.GPIO27
    };
}
