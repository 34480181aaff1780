//! Infrastructure layer - ESP32 implementations of the strip and probe ports
//!
//! RMT pulse channel, Wi-Fi station, embassy-net stack, ICMP prober and the
//! tasks that tie them to the shared strip.

pub(crate) mod config;
pub(crate) mod drivers;
pub(crate) mod tasks;
pub(crate) mod types;
