use crate::attachment::AttachmentMode;
use crate::network::BackhaulConfig;
use crate::topology::{MAX_CELLS, TopologyParams};
use anyhow::{Result, ensure};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Distance parameter of the cell grid, meters.
    pub enb_dist: f64,
    /// Radius of the terminal scatter disc, meters.
    pub radius: f64,
    /// Terminals per cell group.
    pub num_ues: usize,
    pub mode: AttachmentMode,
    /// Simulated seconds.
    pub sec: u64,
    pub rng_run: u64,
    pub seed: u64,
    pub num_cells: usize,
    pub output_dir: PathBuf,
    pub backhaul: BackhaulConfig,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            enb_dist: 100.0,
            radius: 50.0,
            num_ues: 10,
            mode: AttachmentMode::Nearest,
            sec: 1,
            rng_run: 1,
            seed: 1,
            num_cells: MAX_CELLS,
            output_dir: PathBuf::from("Results"),
            backhaul: BackhaulConfig::default(),
        }
    }
}

impl ScenarioConfig {
    pub fn with_mode(mut self, mode: AttachmentMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_geometry(mut self, enb_dist: f64, radius: f64) -> Self {
        self.enb_dist = enb_dist;
        self.radius = radius;
        self
    }

    pub fn with_num_ues(mut self, num_ues: usize) -> Self {
        self.num_ues = num_ues;
        self
    }

    pub fn with_rng_run(mut self, rng_run: u64) -> Self {
        self.rng_run = rng_run;
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Non-positive distances are allowed through, the geometry just collapses.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            (1..=MAX_CELLS).contains(&self.num_cells),
            "num_cells must be within 1..={}, got {}",
            MAX_CELLS,
            self.num_cells
        );
        ensure!(self.enb_dist.is_finite(), "enbDist must be finite, got {}", self.enb_dist);
        ensure!(self.radius.is_finite(), "radius must be finite, got {}", self.radius);

        if self.enb_dist <= 0.0 {
            warn!("enbDist {} is not positive, cells will overlap", self.enb_dist);
        }
        if self.radius <= 0.0 {
            warn!("radius {} is not positive, terminals collapse onto the disc center", self.radius);
        }
        if self.num_ues == 0 {
            warn!("numUes is 0, nothing will be attached");
        }
        Ok(())
    }

    pub fn topology_params(&self) -> TopologyParams {
        TopologyParams {
            enb_dist: self.enb_dist,
            radius: self.radius,
            num_ues: self.num_ues,
            num_cells: self.num_cells,
        }
    }

    /// Seed for the placement RNG. Each run number yields its own stream.
    pub fn rng_seed(&self) -> u64 {
        self.seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ self.rng_run
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.sec)
    }

    pub fn tag(&self) -> RunTag {
        RunTag::from_config(self)
    }

    pub fn trace_paths(&self) -> TracePaths {
        TracePaths::new(&self.output_dir, &self.tag())
    }
}

/// Suffix shared by every output file of a run, e.g.
/// `_enbDist100_radius050_numUes010_isComp000_rngRun001_sec001`.
///
/// Fields are filled with `0` up to width 3 in front of any sign, so a
/// negative distance of 5 reads `0-5`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunTag(String);

impl RunTag {
    pub fn from_config(config: &ScenarioConfig) -> Self {
        Self(format!(
            "_enbDist{:0>3.0}_radius{:0>3.0}_numUes{:0>3}_isComp{:0>3}_rngRun{:0>3}_sec{:0>3}",
            config.enb_dist,
            config.radius,
            config.num_ues,
            config.mode.flag(),
            config.rng_run,
            config.sec,
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn file_name(&self, prefix: &str, extension: &str) -> String {
        format!("{}{}.{}", prefix, self.0, extension)
    }
}

impl fmt::Display for RunTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where the engine's statistics collectors write their reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TracePaths {
    pub dl_rlc: PathBuf,
    pub ul_rlc: PathBuf,
    pub dl_pdcp: PathBuf,
    pub ul_pdcp: PathBuf,
    pub dl_mac: PathBuf,
    pub ul_mac: PathBuf,
}

impl TracePaths {
    pub fn new(dir: &Path, tag: &RunTag) -> Self {
        let path = |prefix: &str| dir.join(tag.file_name(prefix, "txt"));
        Self {
            dl_rlc: path("DlRlcStats"),
            ul_rlc: path("UlRlcStats"),
            dl_pdcp: path("DlPdcpStats"),
            ul_pdcp: path("UlPdcpStats"),
            dl_mac: path("DlMacStats"),
            ul_mac: path("UlMacStats"),
        }
    }

    pub fn files(&self) -> [&Path; 6] {
        [
            self.dl_rlc.as_path(),
            self.ul_rlc.as_path(),
            self.dl_pdcp.as_path(),
            self.ul_pdcp.as_path(),
            self.dl_mac.as_path(),
            self.ul_mac.as_path(),
        ]
    }
}
