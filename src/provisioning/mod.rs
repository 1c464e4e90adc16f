pub mod qci;
pub mod tft;

pub use qci::Qci;
pub use tft::{Direction, PacketFilter, PortRange, TrafficFlowTemplate};

use crate::topology::{Terminal, TerminalId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of role slots in the provisioning table.
pub const ROLE_SLOTS: usize = 4;

const STUN_PORT: u16 = 3478;
const HTTP_PORT: u16 = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlowRole {
    Voice,
    UplinkVideo,
    DownlinkVideo,
    BestEffort,
}

impl FlowRole {
    pub const ALL: [FlowRole; ROLE_SLOTS] = [
        FlowRole::Voice,
        FlowRole::UplinkVideo,
        FlowRole::DownlinkVideo,
        FlowRole::BestEffort,
    ];

    /// Slots wrap around, so group 5 takes the role of group 1.
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % ROLE_SLOTS]
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn name(&self) -> &'static str {
        match self {
            FlowRole::Voice => "voice",
            FlowRole::UplinkVideo => "uplink-video",
            FlowRole::DownlinkVideo => "downlink-video",
            FlowRole::BestEffort => "best-effort",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.to_lowercase();
        Self::ALL.into_iter().find(|r| r.name() == name)
    }
}

impl fmt::Display for FlowRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bearer {
    pub role: FlowRole,
    pub qci: Qci,
    pub tft: TrafficFlowTemplate,
}

/// One bearer applied to every terminal of one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BearerActivation {
    pub group: usize,
    pub bearer: Bearer,
    pub terminals: Vec<TerminalId>,
}

// The class tags do not line up with what the ports suggest (slot 0 is a
// voice class on the STUN port). The table is kept exactly as enumerated.
pub fn provision_role(role: FlowRole) -> Bearer {
    let (qci, filters) = match role {
        FlowRole::Voice => (
            Qci::GbrConvVoice,
            vec![PacketFilter::local(PortRange::single(STUN_PORT))],
        ),
        FlowRole::UplinkVideo => (
            Qci::GbrConvVideo,
            vec![PacketFilter::remote(PortRange::single(STUN_PORT))],
        ),
        FlowRole::DownlinkVideo => (
            Qci::GbrNonConvVideo,
            vec![
                PacketFilter::remote(PortRange::single(HTTP_PORT)),
                PacketFilter::local(PortRange::single(HTTP_PORT)),
            ],
        ),
        FlowRole::BestEffort => (Qci::GbrConvVideo, Vec::new()),
    };

    Bearer {
        role,
        qci,
        tft: TrafficFlowTemplate::from_filters(filters),
    }
}

pub fn provision(role_index: usize) -> Bearer {
    provision_role(FlowRole::from_index(role_index))
}

/// Group `g` gets role slot `g`. Empty groups activate nothing.
pub fn provision_all(groups: &[Vec<Terminal>]) -> Vec<BearerActivation> {
    groups
        .iter()
        .enumerate()
        .filter(|(_, terminals)| !terminals.is_empty())
        .map(|(group, terminals)| BearerActivation {
            group,
            bearer: provision(group),
            terminals: terminals.iter().map(|t| t.id).collect(),
        })
        .collect()
}
