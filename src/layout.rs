use petgraph::algo::toposort;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::HashMap;
use std::ops::Index;

use tracing::debug;

use crate::error::{Error, Result};
use crate::graph::LabelGraph;

const MIN_DISTANCE: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Position { x, y }
    }

    pub fn distance(&self, other: &Position) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// One position per node, indexed by `NodeIndex::index()`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layout {
    positions: Vec<Position>,
}

impl Layout {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// (min, max) corners of the bounding box, `None` when empty.
    pub fn bounds(&self) -> Option<(Position, Position)> {
        bounds(&self.positions)
    }
}

fn bounds(positions: &[Position]) -> Option<(Position, Position)> {
    let first = *positions.first()?;
    Some(positions.iter().fold((first, first), |(lo, hi), p| {
        (
            Position::new(lo.x.min(p.x), lo.y.min(p.y)),
            Position::new(hi.x.max(p.x), hi.y.max(p.y)),
        )
    }))
}

impl From<Vec<Position>> for Layout {
    fn from(positions: Vec<Position>) -> Self {
        Layout { positions }
    }
}

impl Index<NodeIndex> for Layout {
    type Output = Position;

    fn index(&self, node: NodeIndex) -> &Position {
        &self.positions[node.index()]
    }
}

#[derive(Debug, Clone)]
pub struct SpringConfig {
    pub iterations: usize,
    /// Optimal distance between nodes; `1/sqrt(n)` when unset.
    pub k: Option<f64>,
    pub threshold: f64,
    pub scale: f64,
    pub seed: u64,
}

impl Default for SpringConfig {
    fn default() -> Self {
        SpringConfig {
            iterations: 50,
            k: None,
            threshold: 1e-4,
            scale: 1.0,
            seed: 42,
        }
    }
}

/// Fruchterman-Reingold force-directed layout. Arc direction is ignored.
pub fn spring_layout(graph: &LabelGraph, config: &SpringConfig) -> Layout {
    let n = graph.node_count();
    match n {
        0 => return Layout::default(),
        1 => {
            return Layout {
                positions: vec![Position::default()],
            }
        }
        _ => {}
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut pos: Vec<Position> = (0..n)
        .map(|_| Position::new(rng.gen::<f64>(), rng.gen::<f64>()))
        .collect();

    let links = undirected_links(graph);

    let k = config.k.unwrap_or_else(|| (1.0 / n as f64).sqrt());
    let mut temperature = bounds(&pos)
        .map(|(lo, hi)| (hi.x - lo.x).max(hi.y - lo.y) * 0.1)
        .unwrap_or(0.1);
    let cooling = temperature / (config.iterations as f64 + 1.0);

    for iteration in 0..config.iterations {
        let mut moved = 0.0;
        let mut displacement = vec![Position::default(); n];

        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let dx = pos[i].x - pos[j].x;
                let dy = pos[i].y - pos[j].y;
                let distance = dx.hypot(dy).max(MIN_DISTANCE);
                let force = k * k / (distance * distance);
                displacement[i].x += dx * force;
                displacement[i].y += dy * force;
            }
        }

        for &(s, t) in &links {
            let dx = pos[s].x - pos[t].x;
            let dy = pos[s].y - pos[t].y;
            let pull = dx.hypot(dy).max(MIN_DISTANCE) / k;
            displacement[s].x -= dx * pull;
            displacement[s].y -= dy * pull;
            displacement[t].x += dx * pull;
            displacement[t].y += dy * pull;
        }

        for (p, d) in pos.iter_mut().zip(&displacement) {
            let length = d.x.hypot(d.y).max(MIN_DISTANCE);
            let step = Position::new(d.x * temperature / length, d.y * temperature / length);
            p.x += step.x;
            p.y += step.y;
            moved += step.x.hypot(step.y);
        }

        temperature -= cooling;
        if moved / (n as f64) < config.threshold {
            debug!("Spring layout converged after {} iterations", iteration + 1);
            break;
        }
    }

    rescale(&mut pos, config.scale);
    Layout { positions: pos }
}

// Distinct node pairs joined by an arc in either direction, self-loops left out.
pub(crate) fn undirected_links(graph: &LabelGraph) -> Vec<(usize, usize)> {
    let mut links: Vec<(usize, usize)> = graph
        .inner()
        .edge_references()
        .filter(|edge| edge.source() != edge.target())
        .map(|edge| {
            let (s, t) = (edge.source().index(), edge.target().index());
            (s.min(t), s.max(t))
        })
        .collect();
    links.sort_unstable();
    links.dedup();
    links
}

// Center on the origin, largest coordinate magnitude becomes `scale`.
fn rescale(pos: &mut [Position], scale: f64) {
    let n = pos.len() as f64;
    let cx = pos.iter().map(|p| p.x).sum::<f64>() / n;
    let cy = pos.iter().map(|p| p.y).sum::<f64>() / n;

    let mut extent: f64 = 0.0;
    for p in pos.iter_mut() {
        p.x -= cx;
        p.y -= cy;
        extent = extent.max(p.x.abs()).max(p.y.abs());
    }

    if extent > 0.0 {
        for p in pos.iter_mut() {
            p.x *= scale / extent;
            p.y *= scale / extent;
        }
    }
}

/// Column = longest path ending at the node, row = arrival order within the
/// column. Every arc points strictly to the right.
pub fn layered_layout(graph: &LabelGraph) -> Result<Layout> {
    let g = graph.inner();
    let order = toposort(g, None)
        .map_err(|cycle| Error::Cyclic(graph.label(cycle.node_id()).to_string()))?;

    let mut column = vec![0usize; g.node_count()];
    for &node in &order {
        let x = g
            .neighbors_directed(node, Direction::Incoming)
            .map(|prev| column[prev.index()] + 1)
            .max()
            .unwrap_or(0);
        column[node.index()] = x;
    }

    let mut rows: HashMap<usize, usize> = HashMap::new();
    let positions = g
        .node_indices()
        .map(|node| {
            let x = column[node.index()];
            let row = rows.entry(x).or_insert(0);
            let y = *row;
            *row += 1;
            Position::new(x as f64, y as f64)
        })
        .collect();

    Ok(Layout { positions })
}

/// Total Euclidean length of all arcs; the lower the tidier.
pub fn sum_edge_length(graph: &LabelGraph, layout: &Layout) -> f64 {
    graph
        .inner()
        .edge_references()
        .map(|edge| layout[edge.source()].distance(&layout[edge.target()]))
        .sum()
}
