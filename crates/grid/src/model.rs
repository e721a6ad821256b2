//! Arrangement model: boxes, legs, grid, and the fitness objective.
//!
//! Pure data plus pure evaluation. [`LayoutModel::evaluate`] has no side
//! effects and is safe to call concurrently on independent arrangements;
//! mutation of a single [`Arrangement`] belongs to the solver that owns it.

use std::collections::HashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use er_arrange_core::{Error, Result};

use crate::geometry::{self, Point};

/// Kind of a diagram box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BoxKind {
    /// An entity box.
    Entity,
    /// An association box.
    Association,
}

/// A diagram box as supplied by the parsing collaborator.
///
/// The identifier is stable across runs; width and height are abstract
/// units computed by the layout-to-geometry collaborator and are read-only
/// here. The box's position lives in the [`Arrangement`], not in the box.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoxSpec {
    /// Stable identifier.
    pub id: String,
    /// Entity or association.
    pub kind: BoxKind,
    /// Width in abstract units.
    pub width: f64,
    /// Height in abstract units.
    pub height: f64,
}

impl BoxSpec {
    /// Creates an entity box.
    pub fn entity(id: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            id: id.into(),
            kind: BoxKind::Entity,
            width,
            height,
        }
    }

    /// Creates an association box.
    pub fn association(id: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            id: id.into(),
            kind: BoxKind::Association,
            width,
            height,
        }
    }
}

/// A relationship connector between an association box and an entity box,
/// by identifier.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LegSpec {
    /// Identifier of the association box.
    pub association: String,
    /// Identifier of the entity box.
    pub entity: String,
}

impl LegSpec {
    /// Creates a leg from an association to an entity.
    pub fn new(association: impl Into<String>, entity: impl Into<String>) -> Self {
        Self {
            association: association.into(),
            entity: entity.into(),
        }
    }
}

/// A leg with its endpoints resolved to box indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Leg {
    /// Index of the association box.
    pub association: usize,
    /// Index of the entity box.
    pub entity: usize,
}

/// A grid coordinate. Ordering is row-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Cell {
    /// Row, growing downward.
    pub row: i32,
    /// Column, growing rightward.
    pub col: i32,
}

impl Cell {
    /// Creates a cell.
    pub fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    fn point(self) -> Point {
        (self.row as i64, self.col as i64)
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// The constrained coordinate space: a bounding rectangle as close to
/// square as possible that holds all boxes. Organic search ignores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Grid {
    /// Number of rows.
    pub rows: i32,
    /// Number of columns.
    pub cols: i32,
}

impl Grid {
    /// Derives the near-square grid for a box count.
    pub fn for_box_count(count: usize) -> Self {
        if count == 0 {
            return Self { rows: 0, cols: 0 };
        }
        let cols = (count as f64).sqrt().ceil() as i32;
        let rows = (count as f64 / cols as f64).ceil() as i32;
        Self { rows, cols }
    }

    /// Total number of cells.
    pub fn area(&self) -> usize {
        (self.rows as usize) * (self.cols as usize)
    }

    /// True if the cell lies inside the grid.
    pub fn contains(&self, cell: Cell) -> bool {
        cell.row >= 0 && cell.row < self.rows && cell.col >= 0 && cell.col < self.cols
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> Vec<Cell> {
        let mut cells = Vec::with_capacity(self.area());
        for row in 0..self.rows {
            for col in 0..self.cols {
                cells.push(Cell::new(row, col));
            }
        }
        cells
    }
}

/// A total, injective mapping from box index to grid cell.
///
/// The unit of comparison and mutation for every solver. Injectivity is
/// checked at the orchestrator boundary by [`LayoutModel::validate`];
/// solver mutations preserve it by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Arrangement {
    cells: Vec<Cell>,
}

impl Arrangement {
    /// Creates an arrangement from per-box cells.
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    /// Fills the first `count` cells of the grid in row-major order.
    pub fn row_major(grid: &Grid, count: usize) -> Self {
        Self {
            cells: grid.cells().into_iter().take(count).collect(),
        }
    }

    /// Number of boxes mapped.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True if no boxes are mapped.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cell of the given box.
    pub fn cell(&self, box_ix: usize) -> Cell {
        self.cells[box_ix]
    }

    /// All cells, indexed by box.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Moves a box to a cell.
    pub fn set(&mut self, box_ix: usize, cell: Cell) {
        self.cells[box_ix] = cell;
    }

    /// Swaps the cells of two boxes. The canonical move: it preserves
    /// injectivity for any pair.
    pub fn swap(&mut self, a: usize, b: usize) {
        self.cells.swap(a, b);
    }
}

/// Weights of the fitness components.
///
/// The score of an arrangement is
/// `crossing * crossings + length * total_length + spread * spread`.
/// The default ratio is 10:1:1, so one crossing outweighs any single-leg
/// length penalty reachable on a small grid, so crossing removal always
/// dominates leg shortening.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FitnessWeights {
    /// Cost per leg crossing (and per box pierced by a leg).
    pub crossing: f64,
    /// Cost per unit of total leg length.
    pub length: f64,
    /// Cost per cell of bounding-box sprawl beyond the compact grid.
    pub spread: f64,
}

impl Default for FitnessWeights {
    fn default() -> Self {
        Self {
            crossing: 10.0,
            length: 1.0,
            spread: 1.0,
        }
    }
}

impl FitnessWeights {
    /// Creates the default weights.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the crossing weight.
    pub fn with_crossing(mut self, weight: f64) -> Self {
        self.crossing = weight.max(0.0);
        self
    }

    /// Sets the length weight.
    pub fn with_length(mut self, weight: f64) -> Self {
        self.length = weight.max(0.0);
        self
    }

    /// Sets the spread weight.
    pub fn with_spread(mut self, weight: f64) -> Self {
        self.spread = weight.max(0.0);
        self
    }
}

/// Quality of an arrangement. Lower is better; zero is the ideal.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Fitness {
    /// Pairwise leg crossings plus boxes pierced by a leg.
    pub crossings: usize,
    /// Total leg length (Euclidean center distance less one per leg,
    /// clamped at zero; orthogonally adjacent boxes cost nothing).
    pub total_length: f64,
    /// Occupied bounding-box area in excess of the compact grid.
    pub spread: f64,
    /// Weighted scalar score.
    pub score: f64,
}

/// The grid, the boxes, the legs, and the objective function.
#[derive(Debug, Clone)]
pub struct LayoutModel {
    boxes: Vec<BoxSpec>,
    legs: Vec<Leg>,
    grid: Grid,
    weights: FitnessWeights,
    /// Per box: half extents in cell units, `(row, col)` components.
    half_extents: Vec<(f64, f64)>,
    /// Box indices sorted by identifier; fixes the neighbor enumeration
    /// order.
    id_order: Vec<usize>,
}

impl LayoutModel {
    /// Builds the model from parsed boxes and legs.
    ///
    /// Legs must pair an association with an entity, both present among
    /// the boxes; anything else is a programming error in the caller.
    pub fn new(boxes: Vec<BoxSpec>, leg_specs: &[LegSpec]) -> Result<Self> {
        let mut index = HashMap::with_capacity(boxes.len());
        for (ix, spec) in boxes.iter().enumerate() {
            if index.insert(spec.id.clone(), ix).is_some() {
                return Err(Error::InvalidArrangement(format!(
                    "duplicate box identifier {:?}",
                    spec.id
                )));
            }
        }

        let mut legs = Vec::with_capacity(leg_specs.len());
        for leg in leg_specs {
            let association = *index.get(&leg.association).ok_or_else(|| {
                Error::InvalidArrangement(format!("leg references unknown box {:?}", leg.association))
            })?;
            let entity = *index.get(&leg.entity).ok_or_else(|| {
                Error::InvalidArrangement(format!("leg references unknown box {:?}", leg.entity))
            })?;
            if boxes[association].kind != BoxKind::Association
                || boxes[entity].kind != BoxKind::Entity
            {
                return Err(Error::InvalidArrangement(format!(
                    "leg {:?} -> {:?} does not pair an association with an entity",
                    leg.association, leg.entity
                )));
            }
            legs.push(Leg { association, entity });
        }

        // The widest and tallest boxes span their full cell; the rest
        // scale proportionally.
        let pitch_w = boxes.iter().map(|b| b.width).fold(0.0_f64, f64::max);
        let pitch_h = boxes.iter().map(|b| b.height).fold(0.0_f64, f64::max);
        let half_extents = boxes
            .iter()
            .map(|b| {
                let half_row = if pitch_h > 0.0 {
                    0.5 * b.height / pitch_h
                } else {
                    0.0
                };
                let half_col = if pitch_w > 0.0 {
                    0.5 * b.width / pitch_w
                } else {
                    0.0
                };
                (half_row, half_col)
            })
            .collect();

        let mut id_order: Vec<usize> = (0..boxes.len()).collect();
        id_order.sort_by(|&a, &b| boxes[a].id.cmp(&boxes[b].id));

        let grid = Grid::for_box_count(boxes.len());

        Ok(Self {
            boxes,
            legs,
            grid,
            weights: FitnessWeights::default(),
            half_extents,
            id_order,
        })
    }

    /// Replaces the fitness weights.
    pub fn with_weights(mut self, weights: FitnessWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Number of boxes.
    pub fn n_boxes(&self) -> usize {
        self.boxes.len()
    }

    /// The boxes, in caller order.
    pub fn boxes(&self) -> &[BoxSpec] {
        &self.boxes
    }

    /// The legs, endpoints resolved to box indices.
    pub fn legs(&self) -> &[Leg] {
        &self.legs
    }

    /// The constrained grid.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// The fitness weights.
    pub fn weights(&self) -> &FitnessWeights {
        &self.weights
    }

    /// Number of legs incident to a box.
    pub fn degree(&self, box_ix: usize) -> usize {
        self.legs
            .iter()
            .filter(|leg| leg.association == box_ix || leg.entity == box_ix)
            .count()
    }

    /// Checks the structural invariants of an arrangement: one cell per
    /// box, no cell shared.
    pub fn validate(&self, arrangement: &Arrangement) -> Result<()> {
        if arrangement.len() != self.boxes.len() {
            return Err(Error::InvalidArrangement(format!(
                "arrangement maps {} boxes, model has {}",
                arrangement.len(),
                self.boxes.len()
            )));
        }
        let mut seen: HashMap<Cell, usize> = HashMap::with_capacity(arrangement.len());
        for (ix, &cell) in arrangement.cells().iter().enumerate() {
            if let Some(other) = seen.insert(cell, ix) {
                return Err(Error::InvalidArrangement(format!(
                    "boxes {:?} and {:?} share cell {}",
                    self.boxes[other].id, self.boxes[ix].id, cell
                )));
            }
        }
        Ok(())
    }

    /// Scores an arrangement. Pure and deterministic; the same
    /// arrangement always yields the same fitness.
    pub fn evaluate(&self, arrangement: &Arrangement) -> Fitness {
        debug_assert!(self.validate(arrangement).is_ok());
        let slots: Vec<Option<Cell>> = arrangement.cells().iter().copied().map(Some).collect();
        let (crossings, total_length) = self.connective_cost(&slots);
        let spread = self.spread(arrangement);
        let score = self.weights.crossing * crossings as f64
            + self.weights.length * total_length
            + self.weights.spread * spread;
        Fitness {
            crossings,
            total_length,
            spread,
            score,
        }
    }

    /// Lower bound on the score of any completion of a partial
    /// assignment: the cost of the legs and boxes already determined.
    /// Admissible: every component only grows as more boxes land.
    pub(crate) fn partial_score(&self, slots: &[Option<Cell>]) -> f64 {
        let (crossings, total_length) = self.connective_cost(slots);
        self.weights.crossing * crossings as f64 + self.weights.length * total_length
    }

    /// Crossing count and total length over the determined legs.
    fn connective_cost(&self, slots: &[Option<Cell>]) -> (usize, f64) {
        let determined: Vec<(usize, Point, Point)> = self
            .legs
            .iter()
            .enumerate()
            .filter_map(|(ix, leg)| match (slots[leg.association], slots[leg.entity]) {
                (Some(a), Some(e)) => Some((ix, a.point(), e.point())),
                _ => None,
            })
            .collect();

        let mut crossings = 0;
        for (i, &(leg_a, p1, q1)) in determined.iter().enumerate() {
            for &(leg_b, p2, q2) in &determined[i + 1..] {
                if self.share_box(leg_a, leg_b) {
                    continue;
                }
                if geometry::segments_cross(p1, q1, p2, q2) {
                    crossings += 1;
                }
            }
        }

        // A leg running through a third box counts like a crossing.
        for &(leg_ix, p, q) in &determined {
            let leg = self.legs[leg_ix];
            for (box_ix, slot) in slots.iter().enumerate() {
                let Some(cell) = slot else { continue };
                if box_ix == leg.association || box_ix == leg.entity {
                    continue;
                }
                let center = (cell.row as f64, cell.col as f64);
                let from = (p.0 as f64, p.1 as f64);
                let to = (q.0 as f64, q.1 as f64);
                if geometry::segment_intersects_rect(from, to, center, self.half_extents[box_ix]) {
                    crossings += 1;
                }
            }
        }

        let total_length = determined
            .iter()
            .map(|&(_, p, q)| (geometry::distance(p, q) - 1.0).max(0.0))
            .sum();

        (crossings, total_length)
    }

    fn share_box(&self, leg_a: usize, leg_b: usize) -> bool {
        let a = self.legs[leg_a];
        let b = self.legs[leg_b];
        a.association == b.association
            || a.association == b.entity
            || a.entity == b.association
            || a.entity == b.entity
    }

    fn spread(&self, arrangement: &Arrangement) -> f64 {
        if arrangement.is_empty() {
            return 0.0;
        }
        let rows = arrangement.cells().iter().map(|c| c.row);
        let cols = arrangement.cells().iter().map(|c| c.col);
        let height = (rows.clone().max().unwrap() - rows.min().unwrap() + 1) as usize;
        let width = (cols.clone().max().unwrap() - cols.min().unwrap() + 1) as usize;
        (height * width).saturating_sub(self.grid.area()) as f64
    }

    /// All arrangements reachable by swapping the cells of exactly two
    /// boxes, ordered by identifier pair. Lazily produced, finite, and
    /// identical on every call.
    pub fn neighbors<'a>(
        &'a self,
        arrangement: &'a Arrangement,
    ) -> impl Iterator<Item = Arrangement> + 'a {
        let order = &self.id_order;
        (0..order.len()).flat_map(move |a| {
            ((a + 1)..order.len()).map(move |b| {
                let mut next = arrangement.clone();
                next.swap(order[a], order[b]);
                next
            })
        })
    }
}
