//! Node simulation: nodes, attractors, walls and the connection graph.

pub mod attraction;
pub mod boundary;
pub mod engine;
pub mod graph;
pub mod node;
pub mod noise;

pub use attraction::{AttractionPoint, AttractorKind};
pub use engine::SimulationEngine;
pub use graph::{ConnectionEdge, ConnectionGraph};
pub use node::{Node, NodeKind};
