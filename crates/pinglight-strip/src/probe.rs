//! Probe status on the strip
//!
//! Each monitored host owns one pixel slot. A probe session asks its
//! [`EchoProber`] for one echo per interval and paints the slot green on a
//! reply and red on a timeout.

use core::fmt;
use core::net::IpAddr;

use embassy_time::{Duration, Instant, Timer};
use log::{error, info, warn};

use crate::{
    color::Color,
    error::StripError,
    generator::PulseChannel,
    shared::SharedStrip,
};

/// Slot color while the host answers
pub const REACHABLE: Color = Color::rgb(0x03, 0x0f, 0x03);
/// Slot color after a missed reply
pub const UNREACHABLE: Color = Color::rgb(0x0f, 0x03, 0x03);

/// Colors a slot takes for each probe result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusColors {
    pub reachable: Color,
    pub unreachable: Color,
}

impl Default for StatusColors {
    fn default() -> Self {
        Self {
            reachable: REACHABLE,
            unreachable: UNREACHABLE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeEvent {
    Success { rtt_ms: u32 },
    Timeout,
    /// The session sent its last request
    End,
}

impl ProbeEvent {
    /// Color the slot takes, `None` leaves it as it is.
    pub const fn color(self, colors: &StatusColors) -> Option<Color> {
        match self {
            ProbeEvent::Success { .. } => Some(colors.reachable),
            ProbeEvent::Timeout => Some(colors.unreachable),
            ProbeEvent::End => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeError {
    /// The host name did not resolve to an address
    Unresolvable,
    /// More tasks wait on readiness than the watch has room for
    TooManyWaiters,
    Strip(StripError),
}

impl From<StripError> for ProbeError {
    fn from(value: StripError) -> Self {
        ProbeError::Strip(value)
    }
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeError::Unresolvable => f.write_str("host does not resolve"),
            ProbeError::TooManyWaiters => f.write_str("too many readiness waiters"),
            ProbeError::Strip(e) => write!(f, "strip: {e}"),
        }
    }
}

impl core::error::Error for ProbeError {}

/// Result of a single echo request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EchoOutcome {
    Reply { rtt_ms: u32 },
    Timeout,
}

/// Reachability prober port
///
/// Implementations send one echo request to their target and wait for the
/// reply or for their own timeout.
#[allow(async_fn_in_trait)]
pub trait EchoProber {
    async fn echo(&mut self) -> EchoOutcome;
}

/// One configured host and the slot it owns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeTarget<'a> {
    pub index: usize,
    pub host: &'a str,
}

impl ProbeTarget<'_> {
    /// The host as an address literal, if it is one.
    pub fn literal(&self) -> Option<IpAddr> {
        self.host.parse().ok()
    }
}

/// Targets for the configured slots; unset slots get no probe.
pub fn probe_targets<'a>(hosts: &'a [Option<&'a str>]) -> impl Iterator<Item = ProbeTarget<'a>> {
    hosts
        .iter()
        .enumerate()
        .filter_map(|(index, host)| host.map(|host| ProbeTarget { index, host }))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Time between the start of two requests
    pub interval: Duration,
    /// Requests to send, `None` runs forever
    pub count: Option<u32>,
    pub colors: StatusColors,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(1000),
            count: None,
            colors: StatusColors::default(),
        }
    }
}

/// Drives one prober and paints its slot
pub struct ProbeSession<'a, C: PulseChannel> {
    target: ProbeTarget<'a>,
    strip: &'a SharedStrip<C>,
    config: SessionConfig,
}

impl<'a, C: PulseChannel> ProbeSession<'a, C> {
    pub fn new(target: ProbeTarget<'a>, strip: &'a SharedStrip<C>, config: SessionConfig) -> Self {
        Self {
            target,
            strip,
            config,
        }
    }

    /// Probe until the configured count is reached.
    pub async fn run<P: EchoProber>(&self, prober: &mut P) {
        let mut sent: u32 = 0;
        loop {
            if self.config.count.is_some_and(|count| sent >= count) {
                self.report(ProbeEvent::End).await;
                return;
            }

            let started = Instant::now();
            let event = match prober.echo().await {
                EchoOutcome::Reply { rtt_ms } => ProbeEvent::Success { rtt_ms },
                EchoOutcome::Timeout => ProbeEvent::Timeout,
            };
            sent = sent.saturating_add(1);
            self.report(event).await;

            Timer::at(started + self.config.interval).await;
        }
    }

    /// Log `event` and paint the slot.
    ///
    /// A failed transmission is retried once, after that the next event
    /// pushes the buffer again anyway.
    pub async fn report(&self, event: ProbeEvent) {
        let ProbeTarget { index, host } = self.target;
        match event {
            ProbeEvent::Success { rtt_ms } => info!("probe: success: {}ms {}", rtt_ms, host),
            ProbeEvent::Timeout => info!("probe: timeout: {}", host),
            ProbeEvent::End => warn!("probe: end: {}", host),
        }

        let Some(color) = event.color(&self.config.colors) else {
            return;
        };
        match self.strip.update(index, color).await {
            Err(e) if e.is_transient() => {
                if let Err(e) = self.strip.push().await {
                    warn!("probe: slot {} not shown: {}", index, e);
                }
            }
            Err(e) => error!("probe: slot {} update failed: {}", index, e),
            Ok(()) => {}
        }
    }
}
