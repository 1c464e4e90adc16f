use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bound on packet filters per template.
pub const MAX_FILTERS: usize = 16;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Downlink,
    Uplink,
    #[default]
    Bidirectional,
}

impl Direction {
    fn covers(&self, other: Direction) -> bool {
        matches!(
            (self, other),
            (Direction::Bidirectional, _)
                | (_, Direction::Bidirectional)
                | (Direction::Downlink, Direction::Downlink)
                | (Direction::Uplink, Direction::Uplink)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortRange {
    pub start: u16,
    pub end: u16,
}

impl PortRange {
    pub const ANY: PortRange = PortRange { start: 0, end: u16::MAX };

    pub fn new(start: u16, end: u16) -> Self {
        Self { start, end }
    }

    pub fn single(port: u16) -> Self {
        Self::new(port, port)
    }

    pub fn contains(&self, port: u16) -> bool {
        self.start <= port && port <= self.end
    }

    pub fn is_unbounded(&self) -> bool {
        *self == Self::ANY
    }
}

impl Default for PortRange {
    fn default() -> Self {
        Self::ANY
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unbounded() {
            f.write_str("*")
        } else if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// A port-range rule. A side left as `PortRange::ANY` places no constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PacketFilter {
    pub direction: Direction,
    pub local_ports: PortRange,
    pub remote_ports: PortRange,
}

impl PacketFilter {
    pub fn local(range: PortRange) -> Self {
        Self { local_ports: range, ..Self::default() }
    }

    pub fn remote(range: PortRange) -> Self {
        Self { remote_ports: range, ..Self::default() }
    }

    pub fn matches(&self, direction: Direction, local_port: u16, remote_port: u16) -> bool {
        self.direction.covers(direction)
            && self.local_ports.contains(local_port)
            && self.remote_ports.contains(remote_port)
    }
}

impl fmt::Display for PacketFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "local={} remote={}", self.local_ports, self.remote_ports)
    }
}

/// An empty template is the default one and claims every packet.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TrafficFlowTemplate {
    filters: Vec<PacketFilter>,
}

impl TrafficFlowTemplate {
    pub fn default_template() -> Self {
        Self::default()
    }

    pub(crate) fn from_filters(filters: Vec<PacketFilter>) -> Self {
        debug_assert!(filters.len() <= MAX_FILTERS);
        Self { filters }
    }

    pub fn filters(&self) -> &[PacketFilter] {
        &self.filters
    }

    pub fn is_default(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn matches(&self, direction: Direction, local_port: u16, remote_port: u16) -> bool {
        self.is_default()
            || self
                .filters
                .iter()
                .any(|f| f.matches(direction, local_port, remote_port))
    }
}

impl fmt::Display for TrafficFlowTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_default() {
            return f.write_str("default");
        }
        let rules: Vec<String> = self.filters.iter().map(|r| r.to_string()).collect();
        f.write_str(&rules.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_template_matches_everything() {
        let tft = TrafficFlowTemplate::default_template();
        assert!(tft.matches(Direction::Uplink, 1, 2));
        assert!(tft.matches(Direction::Downlink, 65535, 0));
        assert_eq!(tft.to_string(), "default");
    }

    #[test]
    fn local_filter_leaves_remote_open() {
        let filter = PacketFilter::local(PortRange::single(3478));
        assert!(filter.matches(Direction::Downlink, 3478, 9));
        assert!(!filter.matches(Direction::Downlink, 3479, 9));
        assert!(filter.remote_ports.is_unbounded());
    }

    #[test]
    fn direction_restricts_match() {
        let filter = PacketFilter {
            direction: Direction::Uplink,
            ..PacketFilter::remote(PortRange::single(80))
        };
        assert!(filter.matches(Direction::Uplink, 5000, 80));
        assert!(!filter.matches(Direction::Downlink, 5000, 80));
    }

    #[test]
    fn any_filter_claims_the_packet() {
        let tft = TrafficFlowTemplate::from_filters(vec![
            PacketFilter::remote(PortRange::single(80)),
            PacketFilter::local(PortRange::single(80)),
        ]);
        assert!(!tft.is_default());
        assert!(tft.matches(Direction::Downlink, 80, 40000));
        assert!(tft.matches(Direction::Uplink, 40000, 80));
        assert!(!tft.matches(Direction::Uplink, 40000, 443));
        assert_eq!(tft.to_string(), "local=* remote=80, local=80 remote=*");
        assert_eq!(Direction::default(), Direction::Bidirectional);
    }

    #[test]
    fn port_range_display() {
        assert_eq!(PortRange::single(80).to_string(), "80");
        assert_eq!(PortRange::new(1000, 2000).to_string(), "1000-2000");
        assert_eq!(PortRange::ANY.to_string(), "*");
    }
}
