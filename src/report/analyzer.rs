use super::ScenarioReport;
use crate::attachment::AttachmentMode;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Averages of one attachment mode over several runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeSummary {
    pub mode: AttachmentMode,
    pub runs: usize,
    pub avg_serving_distance: f64,
    pub max_serving_distance: f64,
    pub avg_off_home_ratio: f64,
    pub avg_load_imbalance: f64,
    pub avg_cell_load: Vec<f64>,
}

pub fn average(mode: AttachmentMode, reports: &[ScenarioReport]) -> Option<ModeSummary> {
    let reports: Vec<&ScenarioReport> = reports.iter().filter(|r| r.mode == mode).collect();
    if reports.is_empty() {
        return None;
    }
    let n = reports.len() as f64;

    let cells = reports.iter().map(|r| r.cell_load.len()).max().unwrap_or(0);
    let mut avg_cell_load = vec![0.0; cells];
    for report in &reports {
        for (slot, load) in avg_cell_load.iter_mut().zip(&report.cell_load) {
            *slot += *load as f64 / n;
        }
    }

    Some(ModeSummary {
        mode,
        runs: reports.len(),
        avg_serving_distance: reports.iter().map(|r| r.mean_serving_distance).sum::<f64>() / n,
        max_serving_distance: reports.iter().map(|r| r.max_serving_distance).fold(0.0, f64::max),
        avg_off_home_ratio: reports.iter().map(|r| r.off_home_ratio).sum::<f64>() / n,
        avg_load_imbalance: reports.iter().map(|r| r.load_imbalance() as f64).sum::<f64>() / n,
        avg_cell_load,
    })
}

pub fn summarize(reports: &[ScenarioReport]) -> Vec<ModeSummary> {
    [AttachmentMode::Static, AttachmentMode::Nearest]
        .into_iter()
        .filter_map(|mode| average(mode, reports))
        .collect()
}

/// Loads every `Scenario*.json` report under `dir`. Unreadable files are skipped.
pub fn load_reports(dir: impl AsRef<Path>) -> Result<Vec<ScenarioReport>> {
    let dir = dir.as_ref();
    let mut reports = Vec::new();

    for entry in fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))? {
        let path = entry?.path();
        let is_report = path.extension().and_then(|s| s.to_str()) == Some("json")
            && path
                .file_name()
                .and_then(|s| s.to_str())
                .is_some_and(|name| name.starts_with("Scenario"));
        if !is_report {
            continue;
        }

        let content = fs::read_to_string(&path)?;
        match serde_json::from_str::<ScenarioReport>(&content) {
            Ok(report) => {
                debug!("Loaded {}", path.display());
                reports.push(report);
            }
            Err(e) => warn!("Skipping {}: {}", path.display(), e),
        }
    }

    reports.sort_by(|a, b| a.tag.cmp(&b.tag));
    Ok(reports)
}

pub fn comparison_table(summaries: &[ModeSummary]) {
    println!("\n╔══════════╦══════╦═════════════╦═════════════╦═══════════╦═══════════╗");
    println!("║ Mode     ║ Runs ║ Avg dist(m) ║ Max dist(m) ║ Off-home  ║ Imbalance ║");
    println!("╠══════════╬══════╬═════════════╬═════════════╬═══════════╬═══════════╣");

    for s in summaries {
        println!(
            "║ {:<8} ║ {:>4} ║ {:>11.2} ║ {:>11.2} ║ {:>8.1}% ║ {:>9.2} ║",
            s.mode.policy_name(),
            s.runs,
            s.avg_serving_distance,
            s.max_serving_distance,
            s.avg_off_home_ratio * 100.0,
            s.avg_load_imbalance,
        );
    }

    println!("╚══════════╩══════╩═════════════╩═════════════╩═══════════╩═══════════╝\n");

    for s in summaries {
        let loads: Vec<String> = s.avg_cell_load.iter().map(|l| format!("{:.1}", l)).collect();
        println!("{} cell load: [{}]", s.mode.policy_name(), loads.join(", "));
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn report(mode: AttachmentMode, load: Vec<usize>, dist: f64) -> ScenarioReport {
        ScenarioReport {
            tag: format!("_{}", dist),
            mode,
            enb_dist: 100.0,
            radius: 50.0,
            num_ues: 2,
            rng_run: 1,
            terminals: 8,
            attachments: 8,
            bearers: 4,
            cell_load: load,
            mean_serving_distance: dist,
            max_serving_distance: dist * 2.0,
            off_home_ratio: 0.5,
            bearers_per_qci: BTreeMap::new(),
            gbr_share: 1.0,
            simulated_secs: 1.0,
        }
    }

    #[test]
    fn averages_per_mode() {
        let reports = vec![
            report(AttachmentMode::Nearest, vec![4, 2, 2, 0], 10.0),
            report(AttachmentMode::Nearest, vec![2, 2, 2, 2], 20.0),
            report(AttachmentMode::Static, vec![2, 2, 2, 2], 50.0),
        ];

        let nearest = average(AttachmentMode::Nearest, &reports).unwrap();
        assert_eq!(nearest.runs, 2);
        assert_eq!(nearest.avg_serving_distance, 15.0);
        assert_eq!(nearest.max_serving_distance, 40.0);
        assert_eq!(nearest.avg_load_imbalance, 2.0);
        assert_eq!(nearest.avg_cell_load, vec![3.0, 2.0, 2.0, 1.0]);

        assert_eq!(summarize(&reports).len(), 2);
        assert!(average(AttachmentMode::Static, &reports[..2]).is_none());
    }

    #[test]
    fn loads_only_scenario_reports() {
        let dir = std::env::temp_dir().join(format!("lte-comp-analyze-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let r = report(AttachmentMode::Static, vec![1, 1], 3.0);
        fs::write(dir.join("Scenario_a.json"), serde_json::to_string(&r).unwrap()).unwrap();
        fs::write(dir.join("comparison_x.json"), "[]").unwrap();
        fs::write(dir.join("Scenario_broken.json"), "{").unwrap();

        let loaded = load_reports(&dir).unwrap();
        fs::remove_dir_all(&dir).ok();

        assert_eq!(loaded, vec![r]);
    }
}
