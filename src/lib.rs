pub mod topology;
pub mod attachment;
pub mod provisioning;
pub mod network;
pub mod engine;
pub mod scenario;
pub mod report;

pub use attachment::{AttachmentMode, AttachmentPolicy, AttachmentRecord, attach};
pub use engine::{DryRunEngine, SimulationEngine};
pub use provisioning::{Bearer, FlowRole, Qci, provision};
pub use scenario::{Scenario, ScenarioConfig};
pub use topology::{Topology, generate_topology};

pub mod prelude {
    pub use crate::attachment::{AttachmentMode, AttachmentPolicy, AttachmentRecord, PolicyRegistry};
    pub use crate::engine::{DryRunEngine, EngineEvent, SimulationEngine};
    pub use crate::provisioning::{Bearer, BearerActivation, FlowRole, PacketFilter, PortRange, Qci};
    pub use crate::report::ScenarioReport;
    pub use crate::scenario::{Scenario, ScenarioConfig, ScenarioOutcome, ScenarioPlan};
    pub use crate::topology::{Cell, CellId, Position, Terminal, TerminalId, Topology};
}
