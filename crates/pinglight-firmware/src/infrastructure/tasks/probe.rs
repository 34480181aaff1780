use embassy_net::Stack;
use embassy_time::Timer;
use log::{error, info};
use pinglight_strip::{
    AddressFamily, NetworkReadiness, ProbeError, ProbeSession, ProbeTarget, SessionConfig,
    StatusColors,
};

use crate::infrastructure::{
    config,
    drivers::{IcmpBuffers, IcmpProber, resolve_target},
    types::Strip,
};

/// Probes one host and paints its slot
///
/// A host that does not resolve ends this task only, the other slots keep
/// going.
#[embassy_executor::task(pool_size = config::LED_COUNT)]
pub(crate) async fn probe_task(
    stack: Stack<'static>,
    strip: &'static Strip,
    readiness: &'static NetworkReadiness,
    target: ProbeTarget<'static>,
) {
    if let Err(e) = run_probe(stack, strip, readiness, target).await {
        error!("probe: giving up on {}: {}", target.host, e);
    }
}

async fn run_probe(
    stack: Stack<'static>,
    strip: &'static Strip,
    readiness: &'static NetworkReadiness,
    target: ProbeTarget<'static>,
) -> Result<(), ProbeError> {
    let address = resolve_target(stack, target.host).await?;
    let family = AddressFamily::of(&address);
    info!("probe: slot {} -> {} ({})", target.index, target.host, address);

    if family == AddressFamily::Ipv6 && !readiness.current().ipv6 {
        Timer::after(config::PROBE.ipv6_settle).await;
    }
    readiness.wait_for(family).await?;

    let mut buffers = IcmpBuffers::new();
    let mut prober = IcmpProber::new(stack, address, &mut buffers);
    let session = ProbeSession::new(
        target,
        strip,
        SessionConfig {
            interval: config::PROBE.interval,
            count: config::PROBE.count,
            colors: StatusColors {
                reachable: config::PROBE.reachable.into(),
                unreachable: config::PROBE.unreachable.into(),
            },
        },
    );
    session.run(&mut prober).await;
    Ok(())
}
