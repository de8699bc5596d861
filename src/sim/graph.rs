//! Per-frame proximity/affinity graph between nodes.

use glam::Vec2;

use super::node::Node;
use crate::color::{Hsl, Rgba};
use crate::params::SimulationTuning;
use crate::surface::Surface;

/// Undirected edge; `a < b` always holds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectionEdge {
    pub a: usize,
    pub b: usize,
    pub distance: f32,
    pub affinity: f32,
    /// Affinity faded by distance; drives stroke width and alpha
    pub strength: f32,
}

/// How strongly two nodes want to be linked, in [0, 1].
///
/// Weighted sum of kind match (0.3), hue proximity (0.3), normalized
/// inverse distance (0.2) and mean social tendency (0.2).
pub fn affinity(a: &Node, b: &Node, distance: f32, max_distance: f32) -> f32 {
    let kind = if a.kind == b.kind { 0.8 } else { 0.3 };
    let hue = 1.0 - Hsl::hue_distance(a.hsl.h, b.hsl.h) / 180.0;
    let near = if max_distance > 0.0 {
        (1.0 - distance / max_distance).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let social = (a.social_tendency + b.social_tendency) * 0.5;

    kind * 0.3 + hue * 0.3 + near * 0.2 + social * 0.2
}

/// Edge list plus adjacency, rebuilt from scratch every tick.
#[derive(Debug, Default)]
pub struct ConnectionGraph {
    edges: Vec<ConnectionEdge>,
    adjacency: Vec<Vec<usize>>,
}

impl ConnectionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan every unordered pair in index order. An edge is accepted when
    /// the pair is closer than `max_distance`, affinity exceeds the
    /// threshold and neither endpoint is at its connection cap yet.
    pub fn rebuild(&mut self, nodes: &[Node], max_distance: f32, tuning: &SimulationTuning) {
        self.edges.clear();
        self.adjacency.resize_with(nodes.len(), Vec::new);
        for list in &mut self.adjacency {
            list.clear();
        }

        for (i, a) in nodes.iter().enumerate() {
            for (j, b) in nodes.iter().enumerate().skip(i + 1) {
                if self.adjacency[i].len() >= a.max_connections {
                    break;
                }
                if self.adjacency[j].len() >= b.max_connections {
                    continue;
                }

                let distance = a.pos.distance(b.pos);
                if distance.is_nan() || distance >= max_distance {
                    continue;
                }

                let affinity = affinity(a, b, distance, max_distance);
                if affinity <= tuning.affinity_threshold {
                    continue;
                }

                self.edges.push(ConnectionEdge {
                    a: i,
                    b: j,
                    distance,
                    affinity,
                    strength: (1.0 - distance / max_distance) * affinity,
                });
                self.adjacency[i].push(j);
                self.adjacency[j].push(i);
            }
        }
    }

    pub fn edges(&self) -> &[ConnectionEdge] {
        &self.edges
    }

    pub fn neighbors(&self, node: usize) -> &[usize] {
        self.adjacency.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn degree(&self, node: usize) -> usize {
        self.neighbors(node).len()
    }

    pub fn is_connected(&self, a: usize, b: usize) -> bool {
        self.neighbors(a).contains(&b)
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Draw every edge behind the nodes.
    pub fn draw(
        &self,
        nodes: &[Node],
        surface: &mut dyn Surface,
        style: &EdgeStyle,
        tuning: &SimulationTuning,
    ) {
        for edge in &self.edges {
            let (Some(a), Some(b)) = (nodes.get(edge.a), nodes.get(edge.b)) else {
                continue;
            };

            let width = style.width * edge.strength * (0.8 + style.energy * 0.4);
            let from = a.color().with_alpha(edge.strength * 0.5);
            let to = b.color().with_alpha(edge.strength * 0.3);

            if style.energy > tuning.edge_glow_energy && edge.affinity > 0.5 {
                let pulse = (style.time * 5.0).sin() * 0.5 + 0.5;
                let glow = width * 3.0 * pulse;
                if glow > 0.0 {
                    surface.stroke_line(a.pos, b.pos, glow, from.fade(0.25), to.fade(0.25));
                }
            }

            surface.stroke_line(a.pos, b.pos, width, from, to);

            if edge.affinity > tuning.strong_affinity {
                let mid: Vec2 = (a.pos + b.pos) * 0.5;
                surface.fill_circle(mid, (width * 0.8).max(0.5), Rgba::mix(from, to, 0.5));
            }
        }
    }
}

/// Per-frame inputs to [`ConnectionGraph::draw`].
#[derive(Debug, Clone, Copy)]
pub struct EdgeStyle {
    /// Stroke width of a full-strength edge
    pub width: f32,
    /// Current track energy
    pub energy: f32,
    /// Simulation clock (seconds)
    pub time: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;
    use crate::features::AudioFeatures;
    use crate::params::SimulationParameters;
    use crate::sim::node::NodeKind;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn scatter(count: usize, seed: u64) -> Vec<Node> {
        let params = SimulationParameters::from_features(&AudioFeatures::default(), None);
        let tuning = SimulationTuning::default();
        let bounds = Vec2::new(400.0, 300.0);
        let mut rng = StdRng::seed_from_u64(seed);
        let palette = [Rgb::new(34.0, 197.0, 94.0), Rgb::new(59.0, 130.0, 246.0)];

        (0..count)
            .map(|id| {
                let kind = if id % 3 == 0 {
                    NodeKind::Organic
                } else {
                    NodeKind::Standard
                };
                let color = palette[rng.gen_range(0..palette.len())];
                Node::new(id, kind, color, bounds, &params, &tuning, &mut rng)
            })
            .collect()
    }

    #[test]
    fn test_edges_are_symmetric_and_unique() {
        let nodes = scatter(150, 8);
        let mut graph = ConnectionGraph::new();
        graph.rebuild(&nodes, 100.0, &SimulationTuning::default());
        assert!(!graph.is_empty());

        let mut seen = std::collections::HashSet::new();
        for edge in graph.edges() {
            assert!(edge.a < edge.b);
            assert!(seen.insert((edge.a, edge.b)), "duplicate edge");
            assert!(graph.is_connected(edge.a, edge.b));
            assert!(graph.is_connected(edge.b, edge.a));
        }
        for i in 0..nodes.len() {
            for &j in graph.neighbors(i) {
                assert!(graph.neighbors(j).contains(&i));
            }
        }
    }

    #[test]
    fn test_edges_respect_distance_affinity_and_cap() {
        let nodes = scatter(150, 13);
        let tuning = SimulationTuning::default();
        let mut graph = ConnectionGraph::new();
        graph.rebuild(&nodes, 100.0, &tuning);

        for edge in graph.edges() {
            assert!(edge.distance < 100.0);
            assert!(edge.affinity > tuning.affinity_threshold);
        }
        for (i, node) in nodes.iter().enumerate() {
            assert!(graph.degree(i) <= node.max_connections);
        }
    }

    #[test]
    fn test_rebuild_is_deterministic() {
        let nodes = scatter(80, 3);
        let tuning = SimulationTuning::default();
        let mut first = ConnectionGraph::new();
        let mut second = ConnectionGraph::new();
        first.rebuild(&nodes, 120.0, &tuning);
        second.rebuild(&nodes, 120.0, &tuning);
        assert_eq!(first.edges(), second.edges());
    }

    #[test]
    fn test_capped_node_keeps_earliest_pair() {
        // Node 0 takes one link. Pair (0, 1) is scanned before the nearer
        // (0, 2), so it wins the slot.
        let mut base = scatter(1, 4).remove(0);
        base.social_tendency = 1.0;
        base.max_connections = 5;

        let mut nodes = vec![base.clone(), base.clone(), base];
        nodes[0].pos = Vec2::new(100.0, 100.0);
        nodes[0].max_connections = 1;
        nodes[1].pos = Vec2::new(160.0, 100.0);
        nodes[2].pos = Vec2::new(105.0, 100.0);

        let mut graph = ConnectionGraph::new();
        graph.rebuild(&nodes, 100.0, &SimulationTuning::default());

        assert!(graph.is_connected(0, 1));
        assert!(!graph.is_connected(0, 2));
        assert_eq!(graph.degree(0), 1);
        assert!(graph.is_connected(1, 2));
        assert_eq!(graph.edges()[0].a, 0);
        assert_eq!(graph.edges()[0].b, 1);
    }

    #[test]
    fn test_affinity_weights() {
        let mut nodes = scatter(2, 1);
        nodes[1] = nodes[0].clone();
        nodes[0].social_tendency = 1.0;
        nodes[1].social_tendency = 1.0;
        // Same kind, same hue, zero distance, fully social.
        let a = affinity(&nodes[0], &nodes[1], 0.0, 100.0);
        assert!((a - (0.8 * 0.3 + 0.3 + 0.2 + 0.2)).abs() < 1e-5);
    }

    #[test]
    fn test_shrinking_population_clears_stale_adjacency() {
        let tuning = SimulationTuning::default();
        let mut graph = ConnectionGraph::new();
        graph.rebuild(&scatter(100, 2), 150.0, &tuning);
        graph.rebuild(&scatter(10, 2), 150.0, &tuning);
        assert_eq!(graph.neighbors(50), &[] as &[usize]);
        assert!(graph.edges().iter().all(|e| e.b < 10));
    }
}
