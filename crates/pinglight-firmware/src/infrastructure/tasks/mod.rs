pub(crate) mod network;
pub(crate) mod probe;

pub(crate) use network::{network_monitor_task, network_runner_task, wifi_connection_task};
pub(crate) use probe::probe_task;
