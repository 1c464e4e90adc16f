use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Subnet {
    pub network: Ipv4Addr,
    pub prefix: u8,
}

impl Subnet {
    pub fn new(network: Ipv4Addr, prefix: u8) -> Self {
        Self { network, prefix: prefix.min(32) }
    }

    pub fn mask(&self) -> Ipv4Addr {
        let bits = if self.prefix == 0 { 0 } else { u32::MAX << (32 - self.prefix as u32) };
        Ipv4Addr::from(bits)
    }

    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        let mask = u32::from(self.mask());
        u32::from(addr) & mask == u32::from(self.network) & mask
    }

    /// Usable host numbers, excluding network and broadcast.
    pub fn host_capacity(&self) -> u32 {
        match self.prefix {
            32 => 1,
            31 => 2,
            p => (1u32 << (32 - p as u32)) - 2,
        }
    }
}

impl fmt::Display for Subnet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix)
    }
}

/// Hands out host addresses of a subnet in increasing order, starting at `.1`.
#[derive(Debug, Clone)]
pub struct AddressPool {
    subnet: Subnet,
    next_host: u32,
}

impl AddressPool {
    pub fn new(subnet: Subnet) -> Self {
        Self { subnet, next_host: 1 }
    }

    pub fn subnet(&self) -> Subnet {
        self.subnet
    }

    pub fn allocate(&mut self) -> Result<Ipv4Addr> {
        if self.next_host > self.subnet.host_capacity() {
            bail!("address pool {} exhausted", self.subnet);
        }
        let base = u32::from(self.subnet.network) & u32::from(self.subnet.mask());
        let addr = Ipv4Addr::from(base + self.next_host);
        self.next_host += 1;
        Ok(addr)
    }
}
