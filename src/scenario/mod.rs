pub mod config;
pub use config::{RunTag, ScenarioConfig, TracePaths};

use crate::attachment::{self, AttachmentRecord};
use crate::engine::SimulationEngine;
use crate::provisioning::{self, BearerActivation};
use crate::report::ScenarioReport;
use crate::report::logger::PlacementLogger;
use crate::topology::{self, TerminalId, Topology};
use anyhow::{Context, Result, ensure};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

/// Output of the three pure setup stages, before anything touches the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioPlan {
    pub topology: Topology,
    pub attachments: Vec<AttachmentRecord>,
    pub activations: Vec<BearerActivation>,
}

impl ScenarioPlan {
    pub fn serving_cell(&self, terminal: TerminalId) -> Option<usize> {
        self.attachments
            .iter()
            .find(|r| r.terminal == terminal)
            .map(|r| r.cell.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioOutcome {
    pub tag: RunTag,
    pub plan: ScenarioPlan,
    pub addresses: BTreeMap<TerminalId, Ipv4Addr>,
    pub remote_host: Ipv4Addr,
    pub trace_paths: TracePaths,
    pub simulated: Duration,
}

/// Engine-side results of a successful setup and run.
struct Wiring {
    addresses: BTreeMap<TerminalId, Ipv4Addr>,
    remote_host: Ipv4Addr,
    trace_paths: TracePaths,
}

pub struct Scenario {
    config: ScenarioConfig,
}

impl Scenario {
    pub fn new(config: ScenarioConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    /// Topology, attachment and provisioning. Same config, same plan.
    pub fn plan(&self) -> ScenarioPlan {
        let mut rng = StdRng::seed_from_u64(self.config.rng_seed());
        let topology = topology::generate_topology(&self.config.topology_params(), &mut rng);
        let attachments = attachment::attach(&topology.groups, &topology.cells, self.config.mode);
        let activations = provisioning::provision_all(&topology.groups);

        ScenarioPlan {
            topology,
            attachments,
            activations,
        }
    }

    pub fn run<E>(&self, engine: &mut E) -> Result<ScenarioOutcome>
    where
        E: SimulationEngine + ?Sized,
    {
        self.run_with_output(engine, &mut std::io::sink())
    }

    /// Drives `engine` through setup and one timed run. Console diagnostics
    /// go to `out`. The engine is destroyed whether or not setup and the run
    /// succeed.
    pub fn run_with_output<E, W>(&self, engine: &mut E, out: &mut W) -> Result<ScenarioOutcome>
    where
        E: SimulationEngine + ?Sized,
        W: Write,
    {
        let config = &self.config;
        let tag = config.tag();

        info!("Starting scenario{} on {}", tag, engine.name());
        info!("Attachment: {}", config.mode);
        info!("Cells: {}, terminals per cell: {}", config.num_cells, config.num_ues);

        let plan = self.plan();
        let driven = self.drive(engine, &plan, out);
        engine.destroy();
        let Wiring {
            addresses,
            remote_host,
            trace_paths,
        } = driven?;

        writeln!(out, "Simulation finish {}", config.num_ues)?;
        info!("Scenario{} finished", tag);

        Ok(ScenarioOutcome {
            tag,
            plan,
            addresses,
            remote_host,
            trace_paths,
            simulated: config.duration(),
        })
    }

    fn drive<E, W>(&self, engine: &mut E, plan: &ScenarioPlan, out: &mut W) -> Result<Wiring>
    where
        E: SimulationEngine + ?Sized,
        W: Write,
    {
        let config = &self.config;
        let topo = &plan.topology;

        engine
            .install_mobility(&topo.cells, &topo.groups)
            .context("installing mobility")?;

        let remote_host = engine
            .connect_remote_host(&config.backhaul)
            .context("connecting remote host")?;
        debug!("Remote host at {}", remote_host);

        engine.install_cells(&topo.cells).context("installing cells")?;
        for (group, terminals) in topo.groups.iter().enumerate() {
            engine
                .install_terminals(group, terminals)
                .with_context(|| format!("installing terminal group {}", group))?;
        }

        for record in &plan.attachments {
            engine.attach(record)?;
        }
        ensure!(
            plan.attachments.len() == topo.terminal_count(),
            "{} of {} terminals attached",
            plan.attachments.len(),
            topo.terminal_count()
        );

        for terminal in topo.terminals() {
            engine.install_ip_stack(terminal.id)?;
        }

        let mut addresses = BTreeMap::new();
        for terminal in topo.terminals() {
            addresses.insert(terminal.id, engine.assign_address(terminal.id)?);
        }

        let gateway = engine.default_gateway()?;
        for terminal in topo.terminals() {
            engine.set_default_route(terminal.id, gateway)?;
        }

        for activation in &plan.activations {
            debug!(
                "Group {}: {} bearer ({}) on {} terminals, tft {}",
                activation.group,
                activation.bearer.role,
                activation.bearer.qci,
                activation.terminals.len(),
                activation.bearer.tft
            );
            engine.activate_bearer(activation)?;
        }

        let trace_paths = config.trace_paths();
        engine.enable_traces(&trace_paths)?;

        write_positions(out, topo)?;
        write_addresses(out, topo, &addresses)?;
        write_summary(out, config)?;

        // the stop has to be in the queue before the run, or the run is unbounded
        engine.stop_at(config.duration())?;
        engine.run().context("simulation run")?;

        Ok(Wiring {
            addresses,
            remote_host,
            trace_paths,
        })
    }

    /// Writes the placement CSV and the JSON report next to the trace files.
    pub fn save_results(&self, outcome: &ScenarioOutcome) -> Result<(PathBuf, PathBuf)> {
        let dir = &self.config.output_dir;
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating {}", dir.display()))?;

        let csv_path = dir.join(outcome.tag.file_name("Placement", "csv"));
        let mut logger = PlacementLogger::new(&csv_path)?;
        logger.log_outcome(outcome)?;
        info!("Placement saved to: {}", csv_path.display());

        let report = ScenarioReport::from_outcome(&self.config, outcome);
        let json_path = dir.join(outcome.tag.file_name("Scenario", "json"));
        std::fs::write(&json_path, serde_json::to_string_pretty(&report)?)?;
        info!("Report saved to: {}", json_path.display());

        info!("Cell load: {:?}", report.cell_load);
        info!("Mean serving distance: {:.2} m", report.mean_serving_distance);

        Ok((csv_path, json_path))
    }
}

fn write_positions<W: Write>(out: &mut W, topo: &Topology) -> Result<()> {
    for terminal in topo.terminals() {
        writeln!(out, "{}", terminal.position)?;
    }
    Ok(())
}

fn write_addresses<W: Write>(
    out: &mut W,
    topo: &Topology,
    addresses: &BTreeMap<TerminalId, Ipv4Addr>,
) -> Result<()> {
    for terminal in topo.terminals() {
        if let Some(addr) = addresses.get(&terminal.id) {
            writeln!(out, "   {}", addr)?;
        }
    }
    Ok(())
}

fn write_summary<W: Write>(out: &mut W, config: &ScenarioConfig) -> Result<()> {
    writeln!(out, "Simulation")?;
    writeln!(out, "Number of Base Stations: {}", config.num_cells)?;
    writeln!(out, "Distance Between every Base Station: {}", config.enb_dist)?;
    writeln!(out, "Number of Ues by Base Station: {}", config.num_ues)?;
    writeln!(out, "Comp: {}", config.mode.flag())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachment::AttachmentMode;
    use crate::engine::{DryRunEngine, EngineEvent};
    use crate::network::BackhaulConfig;
    use crate::topology::{Cell, Terminal};
    use anyhow::bail;

    fn dry_run(config: &ScenarioConfig) -> DryRunEngine {
        DryRunEngine::new(&config.backhaul).expect("engine")
    }

    #[test]
    fn plan_is_reproducible() {
        let scenario = Scenario::new(ScenarioConfig::default()).unwrap();
        assert_eq!(scenario.plan(), scenario.plan());

        let other = Scenario::new(ScenarioConfig::default().with_rng_run(9)).unwrap();
        assert_ne!(scenario.plan().topology, other.plan().topology);
    }

    #[test]
    fn stop_is_scheduled_before_run() {
        let config = ScenarioConfig::default();
        let mut engine = dry_run(&config);
        Scenario::new(config).unwrap().run(&mut engine).unwrap();

        let kinds: Vec<&str> = engine.events().iter().map(EngineEvent::kind).collect();
        let n = kinds.len();
        assert_eq!(&kinds[n - 3..], &["stop-scheduled", "ran", "destroyed"]);
        assert_eq!(kinds[0], "mobility-installed");
    }

    #[test]
    fn console_output_matches_layout() {
        let config = ScenarioConfig::default()
            .with_num_ues(2)
            .with_mode(AttachmentMode::Static);
        let mut engine = dry_run(&config);
        let mut out = Vec::new();
        Scenario::new(config).unwrap().run_with_output(&mut engine, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 8 + 8 + 5 + 1);
        assert!(lines[..8].iter().all(|l| l.split('\t').count() == 2));
        assert_eq!(lines[8], "   7.0.0.2");
        assert_eq!(lines[15], "   7.0.0.9");
        assert_eq!(lines[16], "Simulation");
        assert_eq!(lines[17], "Number of Base Stations: 4");
        assert_eq!(lines[18], "Distance Between every Base Station: 100");
        assert_eq!(lines[19], "Number of Ues by Base Station: 2");
        assert_eq!(lines[20], "Comp: 1");
        assert_eq!(lines[21], "Simulation finish 2");
    }

    #[test]
    fn empty_groups_still_run() {
        let config = ScenarioConfig::default().with_num_ues(0);
        let mut engine = dry_run(&config);
        let outcome = Scenario::new(config).unwrap().run(&mut engine).unwrap();

        assert!(outcome.plan.attachments.is_empty());
        assert!(outcome.plan.activations.is_empty());
        assert!(outcome.addresses.is_empty());
        assert!(engine.is_destroyed());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = ScenarioConfig { num_cells: 0, ..ScenarioConfig::default() };
        assert!(Scenario::new(config).is_err());
    }

    /// Dry run whose bearer activation always fails.
    #[derive(Debug)]
    struct RejectsBearers(DryRunEngine);

    impl SimulationEngine for RejectsBearers {
        fn name(&self) -> &str {
            "rejects-bearers"
        }
        fn install_mobility(&mut self, cells: &[Cell], groups: &[Vec<Terminal>]) -> Result<()> {
            self.0.install_mobility(cells, groups)
        }
        fn install_cells(&mut self, cells: &[Cell]) -> Result<()> {
            self.0.install_cells(cells)
        }
        fn install_terminals(&mut self, group: usize, terminals: &[Terminal]) -> Result<()> {
            self.0.install_terminals(group, terminals)
        }
        fn connect_remote_host(&mut self, backhaul: &BackhaulConfig) -> Result<Ipv4Addr> {
            self.0.connect_remote_host(backhaul)
        }
        fn attach(&mut self, record: &AttachmentRecord) -> Result<()> {
            self.0.attach(record)
        }
        fn install_ip_stack(&mut self, terminal: TerminalId) -> Result<()> {
            self.0.install_ip_stack(terminal)
        }
        fn assign_address(&mut self, terminal: TerminalId) -> Result<Ipv4Addr> {
            self.0.assign_address(terminal)
        }
        fn default_gateway(&self) -> Result<Ipv4Addr> {
            self.0.default_gateway()
        }
        fn set_default_route(&mut self, terminal: TerminalId, gateway: Ipv4Addr) -> Result<()> {
            self.0.set_default_route(terminal, gateway)
        }
        fn activate_bearer(&mut self, _activation: &BearerActivation) -> Result<()> {
            bail!("bearer rejected")
        }
        fn enable_traces(&mut self, paths: &TracePaths) -> Result<()> {
            self.0.enable_traces(paths)
        }
        fn stop_at(&mut self, at: Duration) -> Result<()> {
            self.0.stop_at(at)
        }
        fn run(&mut self) -> Result<()> {
            self.0.run()
        }
        fn destroy(&mut self) {
            self.0.destroy()
        }
    }

    #[test]
    fn failed_setup_still_destroys_engine() {
        let config = ScenarioConfig::default().with_num_ues(2);
        let mut engine = RejectsBearers(dry_run(&config));
        let mut out = Vec::new();
        let err = Scenario::new(config)
            .unwrap()
            .run_with_output(&mut engine, &mut out)
            .unwrap_err();

        assert!(format!("{:#}", err).contains("bearer rejected"));
        assert!(engine.0.is_destroyed());
        assert!(!engine.0.events().iter().any(|e| e.kind() == "ran"));
        assert!(!String::from_utf8(out).unwrap().contains("Simulation finish"));
    }
}
