//! Tidying passes for layered layouts: row swaps inside a column to shorten
//! arcs, then pushing nodes off arcs that run straight through them.

use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::error::Result;
use crate::graph::LabelGraph;
use crate::layout::{layered_layout, sum_edge_length, Layout, Position};

const EPS: f64 = 1e-9;

/// Row-swap search settings. With both temperatures at zero only swaps that
/// do not lengthen the arcs are taken, i.e. plain hill climbing.
#[derive(Debug, Clone)]
pub struct AnnealConfig {
    pub steps: usize,
    pub start_temperature: f64,
    pub end_temperature: f64,
    pub seed: u64,
}

impl Default for AnnealConfig {
    fn default() -> Self {
        AnnealConfig {
            steps: 20_000,
            start_temperature: 10.0,
            end_temperature: 0.01,
            seed: 1234,
        }
    }
}

impl AnnealConfig {
    pub fn hill_climbing(steps: usize, seed: u64) -> Self {
        AnnealConfig {
            steps,
            start_temperature: 0.0,
            end_temperature: 0.0,
            seed,
        }
    }
}

/// Greedy layered layout, improved by row swaps, with penetrations removed.
pub fn refined_layered_layout(graph: &LabelGraph, config: &AnnealConfig) -> Result<Layout> {
    let layout = layered_layout(graph)?;
    let layout = anneal_rows(graph, &layout, config);
    Ok(resolve_penetrations(graph, &layout))
}

// Summed length of the arcs touching `node`.
fn local_length(node: usize, pos: &[Position], neighbours: &[Vec<usize>]) -> f64 {
    neighbours[node]
        .iter()
        .map(|&other| pos[node].distance(&pos[other]))
        .sum()
}

/// Swaps the rows of two nodes sharing a column, accepting longer arcs with
/// a probability that shrinks as the temperature cools exponentially from
/// `start_temperature` to `end_temperature`. Returns the shortest layout
/// seen, so the total arc length never grows.
pub fn anneal_rows(graph: &LabelGraph, layout: &Layout, config: &AnnealConfig) -> Layout {
    let mut pos = layout.positions().to_vec();

    let mut columns: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    for (node, p) in pos.iter().enumerate() {
        columns.entry(p.x.round() as i64).or_default().push(node);
    }
    let movable: Vec<Vec<usize>> = columns.into_values().filter(|c| c.len() >= 2).collect();
    if movable.is_empty() || config.steps == 0 {
        return layout.clone();
    }

    let mut neighbours = vec![Vec::new(); pos.len()];
    for edge in graph.inner().edge_references() {
        let (s, t) = (edge.source().index(), edge.target().index());
        if s != t {
            neighbours[s].push(t);
            neighbours[t].push(s);
        }
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let initial = sum_edge_length(graph, layout);
    let mut score = initial;
    let mut best_score = initial;
    let mut best = pos.clone();

    for step in 0..config.steps {
        let t = step as f64 / config.steps as f64;
        let temperature =
            config.start_temperature.powf(1.0 - t) * config.end_temperature.powf(t);

        let column = &movable[rng.gen_range(0..movable.len())];
        let a = column[rng.gen_range(0..column.len())];
        let b = column[rng.gen_range(0..column.len())];
        if a == b {
            continue;
        }

        let before = local_length(a, &pos, &neighbours) + local_length(b, &pos, &neighbours);
        let (ya, yb) = (pos[a].y, pos[b].y);
        pos[a].y = yb;
        pos[b].y = ya;
        let delta = local_length(a, &pos, &neighbours) + local_length(b, &pos, &neighbours) - before;

        if delta <= 0.0 || rng.gen::<f64>() < (-delta / temperature).exp() {
            score += delta;
            if score < best_score - EPS {
                best_score = score;
                best.clone_from(&pos);
            }
        } else {
            pos[a].y = ya;
            pos[b].y = yb;
        }
    }

    debug!("Row swaps: edge length {:.4} -> {:.4}", initial, best_score);
    Layout::from(best)
}

// Is `b` strictly between `a` and `c` horizontally and on the segment a-c?
fn lies_on_arc(a: Position, b: Position, c: Position) -> bool {
    let (left, right) = if a.x <= c.x { (a, c) } else { (c, a) };
    if b.x <= left.x + EPS || b.x >= right.x - EPS {
        return false;
    }
    let cross = (b.x - left.x) * (right.y - left.y) - (b.y - left.y) * (right.x - left.x);
    cross.abs() < EPS
}

/// Every `(arc source, arc target, node)` where the arc passes exactly
/// through the node's position.
pub fn penetrations(graph: &LabelGraph, layout: &Layout) -> Vec<(NodeIndex, NodeIndex, NodeIndex)> {
    let mut found = Vec::new();
    for edge in graph.inner().edge_references() {
        let (a, c) = (edge.source(), edge.target());
        if a == c {
            continue;
        }
        for b in graph.inner().node_indices() {
            if b != a && b != c && lies_on_arc(layout[a], layout[b], layout[c]) {
                found.push((a, c, b));
            }
        }
    }
    found
}

/// Top-down sweep: the highest penetrated node and everything below it in
/// its column move one row down, until no arc crosses a node.
pub fn resolve_penetrations(graph: &LabelGraph, layout: &Layout) -> Layout {
    let mut current = layout.clone();
    let limit = (graph.node_count() + 1) * (graph.edge_count() + 1);

    for _ in 0..limit {
        let hit = penetrations(graph, &current)
            .into_iter()
            .map(|(_, _, node)| node)
            .min_by(|&u, &v| {
                let (pu, pv) = (current[u], current[v]);
                pu.y.total_cmp(&pv.y).then(pu.x.total_cmp(&pv.x))
            });
        let Some(node) = hit else {
            return current;
        };

        let Position { x, y } = current[node];
        let mut pos = current.positions().to_vec();
        for p in pos.iter_mut() {
            if (p.x - x).abs() < EPS && p.y >= y - EPS {
                p.y += 1.0;
            }
        }
        debug!("Moved {:?} and the nodes below it down a row", graph.label(node));
        current = Layout::from(pos);
    }

    warn!("Stopped moving nodes after {} shifts, arcs may still cross nodes", limit);
    current
}
