//! Reads a `source,target` edge list, builds a directed graph and draws it.

pub mod edge_list;
pub mod error;
pub mod graph;
pub mod layout;
pub mod refine;
pub mod render;
pub mod validate;

pub use edge_list::{parse_edges, read_edge_list, Edge, EdgeList};
pub use error::{Error, Result};
pub use graph::LabelGraph;
pub use layout::{layered_layout, spring_layout, sum_edge_length, Layout, Position, SpringConfig};
pub use refine::{refined_layered_layout, AnnealConfig};
pub use render::{write_dot, write_positions, write_svg, SvgStyle};
