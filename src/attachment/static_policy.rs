// Coordinated (comp) mapping: the group index is the cell index

use super::{AttachmentMode, AttachmentPolicy};
use crate::topology::{Cell, CellId, Terminal};

#[derive(Debug, Clone, Default)]
pub struct StaticAttachment;

impl StaticAttachment {
    pub fn new() -> Self {
        Self
    }
}

impl AttachmentPolicy for StaticAttachment {
    fn select(&self, terminal: &Terminal, cells: &[Cell]) -> Option<CellId> {
        cells.get(terminal.id.group).map(|cell| cell.id)
    }

    fn mode(&self) -> AttachmentMode { AttachmentMode::Static }

    fn name(&self) -> &str { "Static" }
}
