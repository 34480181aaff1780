use core::net::{IpAddr, Ipv6Addr};

use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, watch::Watch};

use crate::probe::ProbeError;

/// Tasks that can wait on readiness at the same time.
pub const MAX_READINESS_WAITERS: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressFamily {
    Ipv4,
    Ipv6,
}

impl AddressFamily {
    pub const fn of(address: &IpAddr) -> Self {
        match address {
            IpAddr::V4(_) => AddressFamily::Ipv4,
            IpAddr::V6(_) => AddressFamily::Ipv6,
        }
    }
}

/// Which address families currently have a usable address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LinkState {
    pub ipv4: bool,
    pub ipv6: bool,
}

impl LinkState {
    pub const fn is_ready(&self, family: AddressFamily) -> bool {
        match family {
            AddressFamily::Ipv4 => self.ipv4,
            AddressFamily::Ipv6 => self.ipv6,
        }
    }

    pub const fn any(&self) -> bool {
        self.ipv4 || self.ipv6
    }
}

/// IPv4 and IPv6 readiness conditions
///
/// The network side publishes, probe tasks wait. Waits have no timeout.
pub struct NetworkReadiness {
    state: Watch<CriticalSectionRawMutex, LinkState, MAX_READINESS_WAITERS>,
}

impl NetworkReadiness {
    pub const fn new() -> Self {
        Self {
            state: Watch::new(),
        }
    }

    pub fn publish(&self, state: LinkState) {
        self.state.sender().send(state);
    }

    pub fn set(&self, family: AddressFamily, ready: bool) {
        self.state.sender().send_modify(|state| {
            let mut next = state.unwrap_or_default();
            match family {
                AddressFamily::Ipv4 => next.ipv4 = ready,
                AddressFamily::Ipv6 => next.ipv6 = ready,
            }
            *state = Some(next);
        });
    }

    pub fn current(&self) -> LinkState {
        self.state.anon_receiver().try_get().unwrap_or_default()
    }

    /// Wait until `family` has an address.
    pub async fn wait_for(&self, family: AddressFamily) -> Result<(), ProbeError> {
        let mut receiver = self.state.receiver().ok_or(ProbeError::TooManyWaiters)?;
        receiver.get_and(|state| state.is_ready(family)).await;
        Ok(())
    }

    /// Wait until any family has an address.
    pub async fn wait_any(&self) -> Result<LinkState, ProbeError> {
        let mut receiver = self.state.receiver().ok_or(ProbeError::TooManyWaiters)?;
        Ok(receiver.get_and(LinkState::any).await)
    }
}

impl Default for NetworkReadiness {
    fn default() -> Self {
        Self::new()
    }
}

/// Global unicast, not link-local (`fe80::/10`), loopback or unspecified.
pub fn is_global_ipv6(address: &Ipv6Addr) -> bool {
    let link_local = address.segments()[0] & 0xffc0 == 0xfe80;
    !(link_local || address.is_loopback() || address.is_unspecified())
}

#[cfg(test)]
mod tests {
    use embassy_futures::{block_on, join::join};

    use super::*;

    #[test]
    fn link_local_is_not_global() {
        assert!(!is_global_ipv6(&"fe80::1".parse().unwrap()));
        assert!(!is_global_ipv6(&"febf::1".parse().unwrap()));
        assert!(!is_global_ipv6(&Ipv6Addr::LOCALHOST));
        assert!(!is_global_ipv6(&Ipv6Addr::UNSPECIFIED));
        assert!(is_global_ipv6(&"2606:4700:4700::1111".parse().unwrap()));
        assert!(is_global_ipv6(&"fec0::1".parse().unwrap()));
    }

    #[test]
    fn family_of_address() {
        let v4: IpAddr = "8.8.8.8".parse().unwrap();
        let v6: IpAddr = "2001:4860:4860::8888".parse().unwrap();
        assert_eq!(AddressFamily::of(&v4), AddressFamily::Ipv4);
        assert_eq!(AddressFamily::of(&v6), AddressFamily::Ipv6);
    }

    #[test]
    fn starts_not_ready() {
        let readiness = NetworkReadiness::new();
        assert_eq!(readiness.current(), LinkState::default());
    }

    #[test]
    fn waiter_wakes_on_its_family_only() {
        let readiness = NetworkReadiness::new();
        block_on(join(
            async {
                readiness.wait_for(AddressFamily::Ipv6).await.unwrap();
                assert!(readiness.current().ipv6);
            },
            async {
                readiness.set(AddressFamily::Ipv4, true);
                embassy_futures::yield_now().await;
                readiness.set(AddressFamily::Ipv6, true);
            },
        ));
        assert_eq!(
            readiness.current(),
            LinkState {
                ipv4: true,
                ipv6: true
            }
        );
    }

    #[test]
    fn already_ready_returns_immediately() {
        let readiness = NetworkReadiness::new();
        readiness.publish(LinkState {
            ipv4: true,
            ipv6: false,
        });
        block_on(readiness.wait_for(AddressFamily::Ipv4)).unwrap();
        let state = block_on(readiness.wait_any()).unwrap();
        assert!(state.ipv4);
    }
}
