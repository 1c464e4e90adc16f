pub mod address;

pub use address::{AddressPool, Subnet};

use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::time::Duration;

/// Point-to-point link between the packet gateway and the remote host, plus
/// the two address spaces on either side of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackhaulConfig {
    pub data_rate_bps: u64,
    pub mtu: u16,
    pub delay: Duration,
    pub backhaul: Subnet,
    pub terminals: Subnet,
}

impl Default for BackhaulConfig {
    fn default() -> Self {
        Self {
            data_rate_bps: 100_000_000_000,
            mtu: 1500,
            delay: Duration::from_millis(10),
            backhaul: Subnet::new(Ipv4Addr::new(1, 0, 0, 0), 8),
            terminals: Subnet::new(Ipv4Addr::new(7, 0, 0, 0), 8),
        }
    }
}
