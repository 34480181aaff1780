mod icmp;
mod network;
mod rmt;

pub(crate) use icmp::{IcmpBuffers, IcmpProber};
pub(crate) use network::{init_network_stack, link_state, resolve_target};
pub(crate) use rmt::RmtPulseChannel;
