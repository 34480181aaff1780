use core::net::IpAddr;

use embassy_net::icmp::PacketMetadata;
use embassy_net::icmp::ping::{PingManager, PingParams};
use embassy_net::{IpAddress, Stack};
use embassy_time::Duration;
use log::debug;
use pinglight_strip::{EchoOutcome, EchoProber};

use crate::infrastructure::config;

/// Room for one echo with the configured payload over IPv6.
const SOCKET_BUFFER_SIZE: usize = 256;

/// Socket storage of one prober, lives in the probe task's frame
pub(crate) struct IcmpBuffers {
    rx_meta: [PacketMetadata; 1],
    rx: [u8; SOCKET_BUFFER_SIZE],
    tx_meta: [PacketMetadata; 1],
    tx: [u8; SOCKET_BUFFER_SIZE],
}

impl IcmpBuffers {
    pub(crate) const fn new() -> Self {
        Self {
            rx_meta: [PacketMetadata::EMPTY],
            rx: [0; SOCKET_BUFFER_SIZE],
            tx_meta: [PacketMetadata::EMPTY],
            tx: [0; SOCKET_BUFFER_SIZE],
        }
    }
}

/// ICMP echo prober for a single resolved host
pub(crate) struct IcmpProber<'d> {
    manager: PingManager<'d>,
    target: IpAddress,
    payload: [u8; config::PROBE.payload_size],
    timeout: Duration,
}

impl<'d> IcmpProber<'d> {
    pub(crate) fn new(stack: Stack<'d>, target: IpAddr, buffers: &'d mut IcmpBuffers) -> Self {
        let IcmpBuffers {
            rx_meta,
            rx,
            tx_meta,
            tx,
        } = buffers;
        let target = match target {
            IpAddr::V4(address) => IpAddress::Ipv4(address),
            IpAddr::V6(address) => IpAddress::Ipv6(address),
        };

        Self {
            manager: PingManager::new(stack, rx_meta, rx, tx_meta, tx),
            target,
            payload: [0; config::PROBE.payload_size],
            timeout: config::PROBE.timeout,
        }
    }
}

impl EchoProber for IcmpProber<'_> {
    async fn echo(&mut self) -> EchoOutcome {
        let mut params = PingParams::new(self.target);
        params.set_payload(&self.payload);
        params.set_count(1);
        params.set_timeout(self.timeout);

        match self.manager.ping(&params).await {
            Ok(rtt) => EchoOutcome::Reply {
                rtt_ms: u32::try_from(rtt.as_millis()).unwrap_or(u32::MAX),
            },
            Err(e) => {
                debug!("probe: echo to {} failed: {:?}", self.target, e);
                EchoOutcome::Timeout
            }
        }
    }
}
