use rand::Rng;
use rand_distr::{Distribution, UnitDisc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed number of cell sites the grid can place.
pub const MAX_CELLS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Position) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", Significant(self.x), Significant(self.y))
    }
}

/// Six significant digits with trailing zeros dropped, scientific below
/// 1e-4 and from 1e6 up (`%g` style).
struct Significant(f64);

impl fmt::Display for Significant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = self.0;
        if !value.is_finite() || value == 0.0 {
            return write!(f, "{}", value);
        }

        let sci = format!("{:.5e}", value);
        let Some((mantissa, exp)) = sci.split_once('e') else {
            return f.write_str(&sci);
        };
        let exp: i32 = exp.parse().unwrap_or(0);

        if (-4..6).contains(&exp) {
            let fixed = format!("{:.*}", (5 - exp) as usize, value);
            f.write_str(trim_fraction(&fixed))
        } else {
            let sign = if exp < 0 { '-' } else { '+' };
            write!(f, "{}e{}{:02}", trim_fraction(mantissa), sign, exp.abs())
        }
    }
}

fn trim_fraction(digits: &str) -> &str {
    if digits.contains('.') {
        digits.trim_end_matches('0').trim_end_matches('.')
    } else {
        digits
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellId(pub usize);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub id: CellId,
    pub position: Position,
}

/// Group index is the home cell slot, index is the position inside the group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TerminalId {
    pub group: usize,
    pub index: usize,
}

impl TerminalId {
    pub fn new(group: usize, index: usize) -> Self {
        Self { group, index }
    }
}

impl fmt::Display for TerminalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ue[{}][{}]", self.group, self.index)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Terminal {
    pub id: TerminalId,
    pub position: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TopologyParams {
    pub enb_dist: f64,
    pub radius: f64,
    pub num_ues: usize,
    pub num_cells: usize,
}

impl Default for TopologyParams {
    fn default() -> Self {
        Self {
            enb_dist: 100.0,
            radius: 50.0,
            num_ues: 10,
            num_cells: MAX_CELLS,
        }
    }
}

impl TopologyParams {
    pub fn new(enb_dist: f64, radius: f64, num_ues: usize) -> Self {
        Self {
            enb_dist,
            radius,
            num_ues,
            ..Self::default()
        }
    }

    /// Every group is scattered around this one point, not around its own cell.
    pub fn disc_center(&self) -> Position {
        Position::new(self.enb_dist, self.enb_dist)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    pub cells: Vec<Cell>,
    pub groups: Vec<Vec<Terminal>>,
}

impl Topology {
    pub fn terminal_count(&self) -> usize {
        self.groups.iter().map(Vec::len).sum()
    }

    pub fn terminals(&self) -> impl Iterator<Item = &Terminal> {
        self.groups.iter().flatten()
    }

    pub fn terminal(&self, id: TerminalId) -> Option<&Terminal> {
        self.groups.get(id.group).and_then(|g| g.get(id.index))
    }
}

/// Corner sites of a square of side `2 * enb_dist`, pulled inward by `enb_dist / 2`.
/// Order is bottom-left, bottom-right, top-left, top-right.
pub fn cell_positions(enb_dist: f64) -> [Position; MAX_CELLS] {
    let max = enb_dist * 2.0;
    let delta = enb_dist / 2.0;
    [
        Position::new(delta, delta),
        Position::new(max - delta, delta),
        Position::new(delta, max - delta),
        Position::new(max - delta, max - delta),
    ]
}

pub fn sample_in_disc<R: Rng + ?Sized>(rng: &mut R, center: Position, radius: f64) -> Position {
    let [dx, dy]: [f64; 2] = UnitDisc.sample(rng);
    Position::new(center.x + dx * radius, center.y + dy * radius)
}

pub fn generate_topology<R: Rng + ?Sized>(params: &TopologyParams, rng: &mut R) -> Topology {
    let num_cells = params.num_cells.min(MAX_CELLS);

    let cells: Vec<Cell> = cell_positions(params.enb_dist)
        .into_iter()
        .take(num_cells)
        .enumerate()
        .map(|(i, position)| Cell { id: CellId(i), position })
        .collect();

    let center = params.disc_center();
    let groups = (0..num_cells)
        .map(|group| {
            (0..params.num_ues)
                .map(|index| Terminal {
                    id: TerminalId::new(group, index),
                    position: sample_in_disc(rng, center, params.radius),
                })
                .collect()
        })
        .collect();

    Topology { cells, groups }
}
