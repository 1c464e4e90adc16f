// Stand-in engine: validates the call sequence and hands out addresses,
// nothing is actually simulated.

use super::{EngineEvent, SimulationEngine};
use crate::attachment::AttachmentRecord;
use crate::network::{AddressPool, BackhaulConfig};
use crate::provisioning::{BearerActivation, Qci};
use crate::scenario::TracePaths;
use crate::topology::{Cell, CellId, Terminal, TerminalId};
use anyhow::{Result, bail, ensure};
use std::collections::{BTreeMap, BTreeSet};
use std::net::Ipv4Addr;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Setup,
    Ran,
    Destroyed,
}

#[derive(Debug, Clone, Default)]
pub struct TerminalState {
    pub serving: Option<CellId>,
    pub ip_stack: bool,
    pub address: Option<Ipv4Addr>,
    pub default_route: Option<Ipv4Addr>,
    pub bearers: Vec<Qci>,
}

#[derive(Debug)]
pub struct DryRunEngine {
    placed_cells: BTreeSet<CellId>,
    placed_terminals: BTreeSet<TerminalId>,
    cells: Vec<CellId>,
    terminals: BTreeMap<TerminalId, TerminalState>,
    terminal_pool: AddressPool,
    gateway: Ipv4Addr,
    remote_host: Option<Ipv4Addr>,
    traces: Option<TracePaths>,
    stop_at: Option<Duration>,
    now: Duration,
    lifecycle: Lifecycle,
    events: Vec<EngineEvent>,
}

impl DryRunEngine {
    /// The first terminal-side address is reserved for the gateway.
    pub fn new(backhaul: &BackhaulConfig) -> Result<Self> {
        let mut terminal_pool = AddressPool::new(backhaul.terminals);
        let gateway = terminal_pool.allocate()?;

        Ok(Self {
            placed_cells: BTreeSet::new(),
            placed_terminals: BTreeSet::new(),
            cells: Vec::new(),
            terminals: BTreeMap::new(),
            terminal_pool,
            gateway,
            remote_host: None,
            traces: None,
            stop_at: None,
            now: Duration::ZERO,
            lifecycle: Lifecycle::Setup,
            events: Vec::new(),
        })
    }

    pub fn events(&self) -> &[EngineEvent] {
        &self.events
    }

    pub fn terminal(&self, id: TerminalId) -> Option<&TerminalState> {
        self.terminals.get(&id)
    }

    pub fn traces(&self) -> Option<&TracePaths> {
        self.traces.as_ref()
    }

    pub fn remote_host(&self) -> Option<Ipv4Addr> {
        self.remote_host
    }

    /// Simulated time reached by `run`.
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn is_destroyed(&self) -> bool {
        self.lifecycle == Lifecycle::Destroyed
    }

    fn ensure_setup(&self, what: &str) -> Result<()> {
        ensure!(
            self.lifecycle == Lifecycle::Setup,
            "cannot {} after the run has started",
            what
        );
        Ok(())
    }

    fn terminal_mut(&mut self, id: TerminalId) -> Result<&mut TerminalState> {
        match self.terminals.get_mut(&id) {
            Some(state) => Ok(state),
            None => bail!("unknown terminal {}", id),
        }
    }
}

impl SimulationEngine for DryRunEngine {
    fn name(&self) -> &str {
        "dry-run"
    }

    fn install_mobility(&mut self, cells: &[Cell], groups: &[Vec<Terminal>]) -> Result<()> {
        self.ensure_setup("install mobility")?;
        self.placed_cells.extend(cells.iter().map(|c| c.id));
        self.placed_terminals.extend(groups.iter().flatten().map(|t| t.id));

        let nodes = cells.len() + groups.iter().map(Vec::len).sum::<usize>();
        self.events.push(EngineEvent::MobilityInstalled { nodes });
        Ok(())
    }

    fn install_cells(&mut self, cells: &[Cell]) -> Result<()> {
        self.ensure_setup("install cells")?;
        for cell in cells {
            ensure!(self.placed_cells.contains(&cell.id), "cell {} has no position", cell.id.0);
        }
        self.cells.extend(cells.iter().map(|c| c.id));
        self.events.push(EngineEvent::CellsInstalled { count: cells.len() });
        Ok(())
    }

    fn install_terminals(&mut self, group: usize, terminals: &[Terminal]) -> Result<()> {
        self.ensure_setup("install terminals")?;
        for terminal in terminals {
            ensure!(
                self.placed_terminals.contains(&terminal.id),
                "{} has no position",
                terminal.id
            );
            if self.terminals.insert(terminal.id, TerminalState::default()).is_some() {
                bail!("terminal {} installed twice", terminal.id);
            }
        }
        self.events.push(EngineEvent::TerminalsInstalled { group, count: terminals.len() });
        Ok(())
    }

    fn connect_remote_host(&mut self, backhaul: &BackhaulConfig) -> Result<Ipv4Addr> {
        self.ensure_setup("connect the remote host")?;
        ensure!(self.remote_host.is_none(), "remote host already connected");

        // gateway side takes .1, remote host .2
        let mut pool = AddressPool::new(backhaul.backhaul);
        let _pgw = pool.allocate()?;
        let address = pool.allocate()?;

        debug!(
            "backhaul {} bps, mtu {}, delay {:?}, route {} via if 1",
            backhaul.data_rate_bps, backhaul.mtu, backhaul.delay, backhaul.terminals
        );
        self.remote_host = Some(address);
        self.events.push(EngineEvent::RemoteHostConnected { address });
        Ok(address)
    }

    fn attach(&mut self, record: &AttachmentRecord) -> Result<()> {
        self.ensure_setup("attach")?;
        ensure!(self.cells.contains(&record.cell), "cell {} is not installed", record.cell.0);

        let state = self.terminal_mut(record.terminal)?;
        ensure!(state.serving.is_none(), "terminal {} is already attached", record.terminal);
        state.serving = Some(record.cell);

        self.events.push(EngineEvent::Attached { terminal: record.terminal, cell: record.cell.0 });
        Ok(())
    }

    fn install_ip_stack(&mut self, terminal: TerminalId) -> Result<()> {
        self.ensure_setup("install an ip stack")?;
        self.terminal_mut(terminal)?.ip_stack = true;
        self.events.push(EngineEvent::IpStackInstalled { terminal });
        Ok(())
    }

    fn assign_address(&mut self, terminal: TerminalId) -> Result<Ipv4Addr> {
        self.ensure_setup("assign addresses")?;
        let state = self.terminal_mut(terminal)?;
        ensure!(state.ip_stack, "terminal {} has no ip stack", terminal);
        ensure!(state.address.is_none(), "terminal {} already has an address", terminal);

        let address = self.terminal_pool.allocate()?;
        self.terminal_mut(terminal)?.address = Some(address);
        self.events.push(EngineEvent::AddressAssigned { terminal, address });
        Ok(address)
    }

    fn default_gateway(&self) -> Result<Ipv4Addr> {
        Ok(self.gateway)
    }

    fn set_default_route(&mut self, terminal: TerminalId, gateway: Ipv4Addr) -> Result<()> {
        self.ensure_setup("set routes")?;
        ensure!(
            self.terminal_pool.subnet().contains(gateway),
            "gateway {} is outside {}",
            gateway,
            self.terminal_pool.subnet()
        );
        self.terminal_mut(terminal)?.default_route = Some(gateway);
        self.events.push(EngineEvent::DefaultRouteSet { terminal, gateway });
        Ok(())
    }

    fn activate_bearer(&mut self, activation: &BearerActivation) -> Result<()> {
        self.ensure_setup("activate bearers")?;
        for id in &activation.terminals {
            let state = self.terminal_mut(*id)?;
            ensure!(state.serving.is_some(), "terminal {} is not attached", id);
            state.bearers.push(activation.bearer.qci);
        }
        self.events.push(EngineEvent::BearerActivated {
            group: activation.group,
            qci: activation.bearer.qci.value(),
            terminals: activation.terminals.len(),
        });
        Ok(())
    }

    fn enable_traces(&mut self, paths: &TracePaths) -> Result<()> {
        self.ensure_setup("enable traces")?;
        self.traces = Some(paths.clone());
        self.events.push(EngineEvent::TracesEnabled);
        Ok(())
    }

    fn stop_at(&mut self, at: Duration) -> Result<()> {
        self.ensure_setup("schedule a stop")?;
        self.stop_at = Some(at);
        self.events.push(EngineEvent::StopScheduled { at });
        Ok(())
    }

    fn run(&mut self) -> Result<()> {
        match self.lifecycle {
            Lifecycle::Setup => {}
            Lifecycle::Ran => bail!("engine has already run"),
            Lifecycle::Destroyed => bail!("engine has been destroyed"),
        }

        let until = match self.stop_at {
            Some(at) => at,
            None => {
                warn!("no stop scheduled, nothing to run");
                Duration::ZERO
            }
        };

        if let Some(traces) = &self.traces {
            for file in traces.files() {
                debug!("trace collector -> {}", file.display());
            }
        }
        info!(
            "{} terminals on {} cells, run until {:?}",
            self.terminals.len(),
            self.cells.len(),
            until
        );

        self.now = until;
        self.lifecycle = Lifecycle::Ran;
        self.events.push(EngineEvent::Ran { until });
        Ok(())
    }

    fn destroy(&mut self) {
        if self.lifecycle == Lifecycle::Destroyed {
            return;
        }
        self.placed_cells.clear();
        self.placed_terminals.clear();
        self.cells.clear();
        self.terminals.clear();
        self.lifecycle = Lifecycle::Destroyed;
        self.events.push(EngineEvent::Destroyed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachment::AttachmentMode;
    use crate::provisioning::provision;
    use crate::topology::Position;

    fn engine() -> DryRunEngine {
        DryRunEngine::new(&BackhaulConfig::default()).expect("engine")
    }

    fn one_cell_one_terminal(engine: &mut DryRunEngine) -> TerminalId {
        let id = TerminalId::new(0, 0);
        let cells = [Cell { id: CellId(0), position: Position::new(50.0, 50.0) }];
        let terminals = vec![Terminal { id, position: Position::new(60.0, 50.0) }];
        engine.install_mobility(&cells, std::slice::from_ref(&terminals)).unwrap();
        engine.install_cells(&cells).unwrap();
        engine.install_terminals(0, &terminals).unwrap();
        id
    }

    fn record(terminal: TerminalId, cell: usize) -> AttachmentRecord {
        AttachmentRecord {
            terminal,
            cell: CellId(cell),
            mode: AttachmentMode::Static,
            distance: 0.0,
        }
    }

    #[test]
    fn devices_need_a_position() {
        let mut engine = engine();
        let cell = Cell { id: CellId(2), position: Position::new(0.0, 0.0) };
        let terminal = Terminal { id: TerminalId::new(0, 0), position: Position::new(1.0, 1.0) };

        assert!(engine.install_cells(std::slice::from_ref(&cell)).is_err());
        assert!(engine.install_terminals(0, std::slice::from_ref(&terminal)).is_err());

        engine.install_mobility(std::slice::from_ref(&cell), &[vec![terminal.clone()]]).unwrap();
        assert!(engine.install_cells(std::slice::from_ref(&cell)).is_ok());
        assert!(engine.install_terminals(0, &[terminal]).is_ok());
        assert_eq!(engine.events()[0], EngineEvent::MobilityInstalled { nodes: 2 });
    }

    #[test]
    fn addresses_follow_the_gateway() {
        let mut engine = engine();
        let id = one_cell_one_terminal(&mut engine);
        engine.install_ip_stack(id).unwrap();

        assert_eq!(engine.default_gateway().unwrap(), Ipv4Addr::new(7, 0, 0, 1));
        assert_eq!(engine.assign_address(id).unwrap(), Ipv4Addr::new(7, 0, 0, 2));
        assert!(engine.assign_address(id).is_err());
    }

    #[test]
    fn remote_host_sits_on_backhaul() {
        let mut engine = engine();
        let addr = engine.connect_remote_host(&BackhaulConfig::default()).unwrap();
        assert_eq!(addr, Ipv4Addr::new(1, 0, 0, 2));
        assert!(engine.connect_remote_host(&BackhaulConfig::default()).is_err());
    }

    #[test]
    fn rejects_unknown_cell_and_double_attach() {
        let mut engine = engine();
        let id = one_cell_one_terminal(&mut engine);

        assert!(engine.attach(&record(id, 3)).is_err());
        assert!(engine.attach(&record(id, 0)).is_ok());
        assert!(engine.attach(&record(id, 0)).is_err());
        assert_eq!(engine.terminal(id).and_then(|t| t.serving), Some(CellId(0)));
    }

    #[test]
    fn bearer_needs_attached_terminal() {
        let mut engine = engine();
        let id = one_cell_one_terminal(&mut engine);
        let activation = BearerActivation { group: 0, bearer: provision(0), terminals: vec![id] };

        assert!(engine.activate_bearer(&activation).is_err());
        engine.attach(&record(id, 0)).unwrap();
        assert!(engine.activate_bearer(&activation).is_ok());
        assert_eq!(engine.terminal(id).map(|t| t.bearers.clone()), Some(vec![Qci::GbrConvVoice]));
    }

    #[test]
    fn runs_once_until_stop() {
        let mut engine = engine();
        engine.stop_at(Duration::from_secs(3)).unwrap();
        engine.run().unwrap();
        assert_eq!(engine.now(), Duration::from_secs(3));
        assert!(engine.run().is_err());
        assert!(engine.stop_at(Duration::from_secs(5)).is_err());

        engine.destroy();
        engine.destroy();
        assert!(engine.is_destroyed());
        assert_eq!(engine.events().last(), Some(&EngineEvent::Destroyed));
        assert_eq!(engine.events().iter().filter(|e| **e == EngineEvent::Destroyed).count(), 1);
    }
}
