use super::{AttachmentMode, AttachmentPolicy};
use crate::topology::{Cell, CellId, Terminal};

/// Greedy attachment to the closest site. Only a strictly smaller distance
/// replaces the current best, so ties stay with the lowest cell index.
#[derive(Debug, Clone, Default)]
pub struct NearestCell;

impl NearestCell {
    pub fn new() -> Self {
        Self
    }
}

impl AttachmentPolicy for NearestCell {
    fn select(&self, terminal: &Terminal, cells: &[Cell]) -> Option<CellId> {
        let mut best: Option<(CellId, f64)> = None;

        for cell in cells {
            let d = terminal.position.distance_to(&cell.position);
            match best {
                Some((_, best_d)) if d >= best_d => {}
                _ => best = Some((cell.id, d)),
            }
        }

        best.map(|(id, _)| id)
    }

    fn mode(&self) -> AttachmentMode { AttachmentMode::Nearest }

    fn name(&self) -> &str { "Nearest" }
}
