//! The node engine: owns the population, reacts to track and theme
//! updates, steps the simulation and draws a frame.

use std::cmp::Ordering;

use glam::Vec2;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::attraction::AttractionPoint;
use super::graph::{ConnectionGraph, EdgeStyle};
use super::node::{Node, NodeContext, NodeKind};
use super::noise::DriftNoise;
use crate::color::{Rgb, Theme};
use crate::features::{AudioFeatures, MovementRules, TrackState};
use crate::params::{SimulationParameters, SimulationTuning};
use crate::surface::Surface;
use crate::viz::Visualizer;

const HAPPY_SPARK: Rgb = Rgb::new(255.0, 215.0, 0.0);
const SAD_SPARK: Rgb = Rgb::new(100.0, 100.0, 255.0);

pub struct SimulationEngine {
    nodes: Vec<Node>,
    graph: ConnectionGraph,
    attractors: Vec<AttractionPoint>,

    features: AudioFeatures,
    rules: Option<MovementRules>,
    params: SimulationParameters,
    tuning: SimulationTuning,

    theme: Theme,
    palette: Vec<Rgb>,

    bounds: Vec2,
    time: f32,
    running: bool,
    is_playing: bool,
    duration_ms: u64,
    progress_ms: u64,

    noise: DriftNoise,
    rng: StdRng,
}

impl SimulationEngine {
    pub fn new(width: u32, height: u32, seed: u64) -> Self {
        Self::with_tuning(width, height, seed, SimulationTuning::default())
    }

    pub fn with_tuning(width: u32, height: u32, seed: u64, tuning: SimulationTuning) -> Self {
        let theme = Theme::idle();
        let mut engine = Self {
            nodes: Vec::new(),
            graph: ConnectionGraph::new(),
            attractors: AttractionPoint::defaults(),
            features: AudioFeatures::default(),
            rules: None,
            params: SimulationParameters::default(),
            noise: DriftNoise::new(tuning.noise_seed),
            tuning,
            palette: theme.palette.clone(),
            theme,
            bounds: Vec2::new(width.max(1) as f32, height.max(1) as f32),
            time: 0.0,
            running: false,
            is_playing: false,
            duration_ms: 0,
            progress_ms: 0,
            rng: StdRng::seed_from_u64(seed),
        };
        engine.adjust_node_count();
        engine
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn graph(&self) -> &ConnectionGraph {
        &self.graph
    }

    pub fn attractors(&self) -> &[AttractionPoint] {
        &self.attractors
    }

    pub fn features(&self) -> &AudioFeatures {
        &self.features
    }

    pub fn params(&self) -> &SimulationParameters {
        &self.params
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn bounds(&self) -> Vec2 {
        self.bounds
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    /// Playback position as a fraction of the track, 0 when unknown.
    pub fn progress(&self) -> f32 {
        if self.duration_ms == 0 {
            return 0.0;
        }
        (self.progress_ms as f32 / self.duration_ms as f32).clamp(0.0, 1.0)
    }

    /// Grow or shrink the population to the current target.
    ///
    /// New nodes get contiguous ids and the kind selected by the current
    /// behaviour tags. Shrinking drops the lowest-vitality nodes and
    /// re-numbers the survivors. Returns the new population size.
    pub fn adjust_node_count(&mut self) -> usize {
        let target = self.params.target_node_count;
        let current = self.nodes.len();

        match target.cmp(&current) {
            Ordering::Greater => {
                let kind = NodeKind::select(&self.params.behavior_tags, self.features.energy);
                for id in current..target {
                    let color = pick_color(&self.palette, &mut self.rng);
                    let node = Node::new(
                        id,
                        kind,
                        color,
                        self.bounds,
                        &self.params,
                        &self.tuning,
                        &mut self.rng,
                    );
                    self.nodes.push(node);
                }
                info!("Nodes: {} -> {} ({})", current, target, kind.name());
            }
            Ordering::Less => {
                let mut order: Vec<usize> = (0..current).collect();
                order.sort_by(|&a, &b| self.nodes[a].energy.total_cmp(&self.nodes[b].energy));

                let mut doomed = vec![false; current];
                for &i in &order[..current - target] {
                    doomed[i] = true;
                }

                let mut index = 0;
                self.nodes.retain(|_| {
                    let keep = !doomed[index];
                    index += 1;
                    keep
                });
                for (id, node) in self.nodes.iter_mut().enumerate() {
                    node.id = id;
                }
                info!("Nodes: {} -> {}", current, target);
            }
            Ordering::Equal => {}
        }

        target
    }

    fn recolor(&mut self, palette: Vec<Rgb>) {
        if palette.is_empty() || palette == self.palette {
            return;
        }
        self.palette = palette;
        for node in &mut self.nodes {
            node.set_base_color(pick_color(&self.palette, &mut self.rng));
        }
        debug!("Recoloured {} nodes from {} colours", self.nodes.len(), self.palette.len());
    }

    fn draw_background(&mut self, surface: &mut dyn Surface) {
        let (w, h) = (surface.width(), surface.height());
        let [top, middle, bottom] = self.theme.background_gradient;

        if !self.is_playing {
            surface.fill_linear_gradient(
                Vec2::ZERO,
                Vec2::new(w, h),
                &[
                    (0.0, top.with_alpha(1.0)),
                    (0.5, middle.with_alpha(1.0)),
                    (1.0, bottom.with_alpha(1.0)),
                ],
            );
            return;
        }

        // Translucent wash: earlier frames fade out instead of clearing.
        surface.fill_linear_gradient(
            Vec2::ZERO,
            Vec2::new(w, h),
            &[
                (0.0, top.with_alpha(0.3)),
                (0.5, middle.with_alpha(0.2)),
                (1.0, bottom.with_alpha(0.1)),
            ],
        );

        let energy = self.features.energy;
        if energy > 0.3 {
            let count = (energy * 20.0) as usize;
            let radius = 1.0 + energy * 3.0;
            let layer = 0.05 + energy * 0.1;
            for _ in 0..count {
                let at = Vec2::new(self.rng.gen_range(0.0..w), self.rng.gen_range(0.0..h));
                let alpha = self.rng.gen_range(0.1..0.3) * layer;
                surface.fill_circle(at, radius, self.theme.primary.with_alpha(alpha));
            }
        }
    }

    fn draw_effects(&mut self, surface: &mut dyn Surface) {
        let (w, h) = (surface.width(), surface.height());
        let center = Vec2::new(w, h) * 0.5;
        let f = self.features;

        if f.energy > 0.4 {
            let waves = (f.energy * 3.0) as usize;
            let beat = self.time * (f.tempo / 60.0);
            for i in 0..waves {
                let swing = (beat + i as f32).sin() * 0.5 + 0.5;
                let radius = w * 0.5 * (0.2 + swing * 0.8);
                let alpha = 0.05 * (1.0 - i as f32 / waves as f32);
                surface.stroke_circle(center, radius, 1.0, self.theme.primary.with_alpha(alpha));
            }
        }

        if f.energy > 0.5 {
            let base = if f.valence > 0.7 {
                HAPPY_SPARK
            } else if f.valence < 0.3 {
                SAD_SPARK
            } else {
                self.theme.accent
            };

            for i in 0..(f.energy * 10.0) as usize {
                let angle = self.time * 2.0 + i as f32 * 0.5;
                let distance = w * 0.3 + (self.time + i as f32).sin() * w * 0.1;
                let at = center + Vec2::from_angle(angle) * distance;
                let radius = 1.0 + self.rng.gen_range(0.0..1.0) * f.energy * 3.0;
                let color = base.with_alpha(self.rng.gen_range(0.2..0.5));

                surface.fill_circle(at, radius, color);
                surface.stroke_circle(at, radius * 2.0, 0.5, color.with_alpha(0.1));
            }
        }
    }
}

fn pick_color(palette: &[Rgb], rng: &mut StdRng) -> Rgb {
    if palette.is_empty() {
        return Rgb::WHITE;
    }
    palette[rng.gen_range(0..palette.len())]
}

impl Visualizer for SimulationEngine {
    fn name(&self) -> &'static str {
        "creative_nodes"
    }

    fn start(&mut self) {
        if !self.running {
            self.running = true;
            info!("Node engine started ({} nodes)", self.nodes.len());
        }
    }

    fn stop(&mut self) {
        if self.running {
            self.running = false;
            info!("Node engine stopped");
        }
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            warn!("Ignoring resize to {}x{}", width, height);
            return;
        }
        let next = Vec2::new(width as f32, height as f32);
        let scale = next / self.bounds;
        for node in &mut self.nodes {
            node.rescale(scale);
        }
        self.bounds = next;
        debug!("Node engine resized to {}x{}", width, height);
    }

    fn set_track_state(&mut self, state: &TrackState) {
        self.features.merge(&state.audio_features);
        self.is_playing = state.is_playing;
        if let Some(duration) = state.duration_ms.filter(|d| *d > 0) {
            self.duration_ms = duration;
        }
        if let Some(progress) = state.progress_ms {
            self.progress_ms = progress;
        }

        if let Some(rules) = &state.movement_rules {
            if let Some(points) = &rules.attraction_points {
                self.attractors = points.clone();
            }
            self.rules = Some(rules.clone());
        }

        if let Some(colors) = &state.album_colors {
            let palette = colors.to_album_palette();
            if !palette.is_default {
                self.recolor(palette.colors);
            }
        }

        self.params = SimulationParameters::from_features(&self.features, self.rules.as_ref());
        self.adjust_node_count();
        debug!(
            "Track state: energy={:.2} tempo={:.0} speed={:.1} target={}",
            self.features.energy,
            self.features.tempo,
            self.params.movement_speed,
            self.params.target_node_count
        );
    }

    fn set_theme(&mut self, theme: &Theme) {
        self.theme = theme.clone();
        self.recolor(theme.palette.clone());
    }

    fn tick(&mut self, dt: f32) {
        if !self.running || !dt.is_finite() || dt <= 0.0 {
            return;
        }
        self.time += dt;

        let ctx = NodeContext {
            features: &self.features,
            params: &self.params,
            tuning: &self.tuning,
            attractors: &self.attractors,
            noise: &self.noise,
            bounds: self.bounds,
            time: self.time,
        };
        for node in &mut self.nodes {
            node.update(dt, &ctx, &mut self.rng);
        }

        self.graph.rebuild(&self.nodes, self.params.connection_distance, &self.tuning);
    }

    fn draw(&mut self, surface: &mut dyn Surface) {
        self.draw_background(surface);
        if !self.is_playing {
            return;
        }

        let style = EdgeStyle {
            width: self.params.connection_width,
            energy: self.features.energy,
            time: self.time,
        };
        self.graph.draw(&self.nodes, surface, &style, &self.tuning);

        for node in &self.nodes {
            node.draw(surface, self.tuning.aura_energy);
        }

        self.draw_effects(surface);
    }
}
