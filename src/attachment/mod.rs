pub mod static_policy;
pub mod nearest;

pub use nearest::NearestCell;
pub use static_policy::StaticAttachment;

use crate::topology::{Cell, CellId, Terminal, TerminalId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttachmentMode {
    /// Group `g` is served by cell `g` ("comp").
    Static,
    /// Each terminal is served by its closest cell.
    #[default]
    Nearest,
}

impl AttachmentMode {
    /// `isComp == 1` selects the static mapping, anything else is nearest-cell.
    pub fn from_flag(is_comp: u8) -> Self {
        if is_comp == 1 { Self::Static } else { Self::Nearest }
    }

    pub fn flag(&self) -> u8 {
        match self {
            Self::Static => 1,
            Self::Nearest => 0,
        }
    }

    pub fn policy_name(&self) -> &'static str {
        match self {
            Self::Static => "comp",
            Self::Nearest => "nearest",
        }
    }
}

impl fmt::Display for AttachmentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.policy_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttachmentRecord {
    pub terminal: TerminalId,
    pub cell: CellId,
    pub mode: AttachmentMode,
    /// Terminal to serving cell, meters.
    pub distance: f64,
}

pub trait AttachmentPolicy: Send + Sync + fmt::Debug {
    /// `None` only when `cells` is empty or the policy has no cell for the terminal.
    fn select(&self, terminal: &Terminal, cells: &[Cell]) -> Option<CellId>;
    fn mode(&self) -> AttachmentMode;
    fn name(&self) -> &str;
}

pub fn policy_for(mode: AttachmentMode) -> Box<dyn AttachmentPolicy> {
    match mode {
        AttachmentMode::Static => Box::new(StaticAttachment::new()),
        AttachmentMode::Nearest => Box::new(NearestCell::new()),
    }
}

/// Runs `policy` over every group. A terminal the policy cannot place is
/// skipped rather than given an out-of-range cell.
pub fn attach_with(
    policy: &dyn AttachmentPolicy,
    groups: &[Vec<Terminal>],
    cells: &[Cell],
) -> Vec<AttachmentRecord> {
    let mut records = Vec::with_capacity(groups.iter().map(Vec::len).sum());

    for terminal in groups.iter().flatten() {
        let Some(cell) = policy
            .select(terminal, cells)
            .and_then(|id| cells.iter().find(|c| c.id == id))
        else {
            warn!("{} could not place {}", policy.name(), terminal.id);
            continue;
        };
        let distance = terminal.position.distance_to(&cell.position);
        let cell = cell.id;
        debug!("{} -> cell {} ({:.2} m, {})", terminal.id, cell.0, distance, policy.name());

        records.push(AttachmentRecord {
            terminal: terminal.id,
            cell,
            mode: policy.mode(),
            distance,
        });
    }

    records
}

pub fn attach(groups: &[Vec<Terminal>], cells: &[Cell], mode: AttachmentMode) -> Vec<AttachmentRecord> {
    attach_with(policy_for(mode).as_ref(), groups, cells)
}

/// Names the attachment modes answer to on the command line.
pub struct PolicyRegistry {
    names: BTreeMap<&'static str, AttachmentMode>,
}

impl PolicyRegistry {
    fn new() -> Self {
        let names = BTreeMap::from([
            ("comp", AttachmentMode::Static),
            ("static", AttachmentMode::Static),
            ("nearest", AttachmentMode::Nearest),
            ("closest", AttachmentMode::Nearest),
        ]);
        Self { names }
    }

    /// Case-insensitive. `None` for a name nothing answers to.
    pub fn resolve(&self, name: &str) -> Option<AttachmentMode> {
        self.names.get(name.to_lowercase().as_str()).copied()
    }

    /// Every accepted name with its mode, sorted by name.
    pub fn list(&self) -> impl Iterator<Item = (&'static str, AttachmentMode)> + '_ {
        self.names.iter().map(|(name, mode)| (*name, *mode))
    }

    pub fn global() -> &'static PolicyRegistry {
        use std::sync::OnceLock;
        static REGISTRY: OnceLock<PolicyRegistry> = OnceLock::new();
        REGISTRY.get_or_init(PolicyRegistry::new)
    }
}
