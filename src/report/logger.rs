use crate::scenario::ScenarioOutcome;
use anyhow::Result;
use csv::Writer;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementRow {
    pub group: usize,
    pub index: usize,
    pub x: f64,
    pub y: f64,
    pub cell: Option<usize>,
    pub distance: Option<f64>,
    pub role: String,
    pub address: Option<String>,
}

pub struct PlacementLogger {
    writer: Writer<File>,
}

impl PlacementLogger {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let writer = Writer::from_path(path)?;
        Ok(Self { writer })
    }

    pub fn log_outcome(&mut self, outcome: &ScenarioOutcome) -> Result<()> {
        for row in rows(outcome) {
            self.writer.serialize(&row)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

pub fn rows(outcome: &ScenarioOutcome) -> Vec<PlacementRow> {
    let plan = &outcome.plan;

    plan.topology
        .terminals()
        .map(|terminal| {
            let record = plan.attachments.iter().find(|r| r.terminal == terminal.id);
            let role = plan
                .activations
                .iter()
                .find(|a| a.group == terminal.id.group)
                .map(|a| a.bearer.role.name().to_string())
                .unwrap_or_default();

            PlacementRow {
                group: terminal.id.group,
                index: terminal.id.index,
                x: terminal.position.x,
                y: terminal.position.y,
                cell: record.map(|r| r.cell.0),
                distance: record.map(|r| r.distance),
                role,
                address: outcome.addresses.get(&terminal.id).map(|a| a.to_string()),
            }
        })
        .collect()
}
