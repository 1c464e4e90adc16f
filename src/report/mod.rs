pub mod logger;
pub mod analyzer;

use crate::attachment::AttachmentMode;
use crate::scenario::{ScenarioConfig, ScenarioOutcome, ScenarioPlan};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub tag: String,
    pub mode: AttachmentMode,
    pub enb_dist: f64,
    pub radius: f64,
    pub num_ues: usize,
    pub rng_run: u64,
    pub terminals: usize,
    pub attachments: usize,
    pub bearers: usize,
    /// Attached terminals per cell, indexed by cell.
    pub cell_load: Vec<usize>,
    pub mean_serving_distance: f64,
    pub max_serving_distance: f64,
    /// Share of terminals not served by the cell of their own group.
    pub off_home_ratio: f64,
    /// Terminals covered per QoS class label.
    pub bearers_per_qci: BTreeMap<String, usize>,
    /// Share of bearer-covered terminals on a guaranteed-bit-rate class.
    #[serde(default)]
    pub gbr_share: f64,
    pub simulated_secs: f64,
}

impl ScenarioReport {
    pub fn from_plan(config: &ScenarioConfig, plan: &ScenarioPlan) -> Self {
        let attachments = &plan.attachments;

        let mut cell_load = vec![0; plan.topology.cells.len()];
        for record in attachments {
            if let Some(load) = cell_load.get_mut(record.cell.0) {
                *load += 1;
            }
        }

        let (mean_serving_distance, max_serving_distance, off_home_ratio) = if attachments.is_empty() {
            (0.0, 0.0, 0.0)
        } else {
            let n = attachments.len() as f64;
            let total: f64 = attachments.iter().map(|r| r.distance).sum();
            let max = attachments.iter().map(|r| r.distance).fold(0.0, f64::max);
            let off_home = attachments.iter().filter(|r| r.cell.0 != r.terminal.group).count();
            (total / n, max, off_home as f64 / n)
        };

        let mut bearers_per_qci = BTreeMap::new();
        let (mut covered, mut gbr) = (0, 0);
        for activation in &plan.activations {
            let n = activation.terminals.len();
            *bearers_per_qci
                .entry(activation.bearer.qci.label().to_string())
                .or_insert(0) += n;
            covered += n;
            if activation.bearer.qci.is_gbr() {
                gbr += n;
            }
        }
        let gbr_share = if covered == 0 { 0.0 } else { gbr as f64 / covered as f64 };

        Self {
            tag: config.tag().to_string(),
            mode: config.mode,
            enb_dist: config.enb_dist,
            radius: config.radius,
            num_ues: config.num_ues,
            rng_run: config.rng_run,
            terminals: plan.topology.terminal_count(),
            attachments: attachments.len(),
            bearers: plan.activations.len(),
            cell_load,
            mean_serving_distance,
            max_serving_distance,
            off_home_ratio,
            bearers_per_qci,
            gbr_share,
            simulated_secs: config.duration().as_secs_f64(),
        }
    }

    pub fn from_outcome(config: &ScenarioConfig, outcome: &ScenarioOutcome) -> Self {
        let mut report = Self::from_plan(config, &outcome.plan);
        report.simulated_secs = outcome.simulated.as_secs_f64();
        report
    }

    /// Spread between the busiest and the idlest cell.
    pub fn load_imbalance(&self) -> usize {
        let max = self.cell_load.iter().copied().max().unwrap_or(0);
        let min = self.cell_load.iter().copied().min().unwrap_or(0);
        max - min
    }
}
