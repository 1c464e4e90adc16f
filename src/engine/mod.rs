pub mod dry_run;

pub use dry_run::DryRunEngine;

use crate::attachment::AttachmentRecord;
use crate::network::BackhaulConfig;
use crate::provisioning::BearerActivation;
use crate::scenario::TracePaths;
use crate::topology::{Cell, Terminal, TerminalId};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::time::Duration;

/// The event-driven simulator the scenario is handed to. Mobility, radio,
/// protocol stacks and scheduling all live behind this trait.
pub trait SimulationEngine: fmt::Debug {
    fn name(&self) -> &str;

    /// Pins every cell and terminal to its position. Nothing moves afterwards.
    fn install_mobility(&mut self, cells: &[Cell], groups: &[Vec<Terminal>]) -> Result<()>;

    /// Links the packet gateway to a single remote host, returns the host address.
    fn connect_remote_host(&mut self, backhaul: &BackhaulConfig) -> Result<Ipv4Addr>;

    /// Radio devices, for nodes already placed by `install_mobility`.
    fn install_cells(&mut self, cells: &[Cell]) -> Result<()>;
    fn install_terminals(&mut self, group: usize, terminals: &[Terminal]) -> Result<()>;

    fn attach(&mut self, record: &AttachmentRecord) -> Result<()>;
    fn install_ip_stack(&mut self, terminal: TerminalId) -> Result<()>;
    fn assign_address(&mut self, terminal: TerminalId) -> Result<Ipv4Addr>;
    fn default_gateway(&self) -> Result<Ipv4Addr>;
    fn set_default_route(&mut self, terminal: TerminalId, gateway: Ipv4Addr) -> Result<()>;
    fn activate_bearer(&mut self, activation: &BearerActivation) -> Result<()>;

    fn enable_traces(&mut self, paths: &TracePaths) -> Result<()>;
    fn stop_at(&mut self, at: Duration) -> Result<()>;
    fn run(&mut self) -> Result<()>;
    fn destroy(&mut self);
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EngineEvent {
    MobilityInstalled { nodes: usize },
    CellsInstalled { count: usize },
    TerminalsInstalled { group: usize, count: usize },
    RemoteHostConnected { address: Ipv4Addr },
    Attached { terminal: TerminalId, cell: usize },
    IpStackInstalled { terminal: TerminalId },
    AddressAssigned { terminal: TerminalId, address: Ipv4Addr },
    DefaultRouteSet { terminal: TerminalId, gateway: Ipv4Addr },
    BearerActivated { group: usize, qci: u8, terminals: usize },
    TracesEnabled,
    StopScheduled { at: Duration },
    Ran { until: Duration },
    Destroyed,
}

impl EngineEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            EngineEvent::MobilityInstalled { .. } => "mobility-installed",
            EngineEvent::CellsInstalled { .. } => "cells-installed",
            EngineEvent::TerminalsInstalled { .. } => "terminals-installed",
            EngineEvent::RemoteHostConnected { .. } => "remote-host-connected",
            EngineEvent::Attached { .. } => "attached",
            EngineEvent::IpStackInstalled { .. } => "ip-stack-installed",
            EngineEvent::AddressAssigned { .. } => "address-assigned",
            EngineEvent::DefaultRouteSet { .. } => "default-route-set",
            EngineEvent::BearerActivated { .. } => "bearer-activated",
            EngineEvent::TracesEnabled => "traces-enabled",
            EngineEvent::StopScheduled { .. } => "stop-scheduled",
            EngineEvent::Ran { .. } => "ran",
            EngineEvent::Destroyed => "destroyed",
        }
    }
}
