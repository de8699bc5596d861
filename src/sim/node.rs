//! One simulated node: motion laws per kind, trail, life cycle, drawing.

use std::collections::VecDeque;
use std::f32::consts::{PI, TAU};

use glam::Vec2;
use rand::Rng;

use super::attraction::{AttractionPoint, AttractorKind};
use super::boundary::WallResponse;
use super::noise::DriftNoise;
use crate::color::{Hsl, Rgb, Rgba};
use crate::features::AudioFeatures;
use crate::params::{BehaviorTag, SimulationParameters, SimulationTuning};
use crate::surface::Surface;

const ORGANIC_POINTS: usize = 8;
const ORGANIC_DETAILS: usize = 3;
const DANCER_POINTS: usize = 6;

/// Motion law and draw routine, fixed for the node's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Radial pulsing on the beat clock; drawn as rings around a core
    Pulse,
    /// Figure-eight trajectories; drawn as a spiky star
    Dancer,
    /// Slow sinusoidal drift
    Float,
    /// Circles the centre, correcting toward a target radius
    Orbital,
    /// Noise-driven drift; drawn as an irregular polygon
    Organic,
    /// Wave plus jitter
    Standard,
}

impl NodeKind {
    pub fn select(tags: &[BehaviorTag], energy: f32) -> NodeKind {
        let has = |tag| tags.contains(&tag);
        if has(BehaviorTag::Energetic) && energy > 0.7 {
            NodeKind::Pulse
        } else if has(BehaviorTag::Dancing) {
            NodeKind::Dancer
        } else if has(BehaviorTag::Melancholic) {
            NodeKind::Float
        } else if has(BehaviorTag::Instrumental) {
            NodeKind::Orbital
        } else if has(BehaviorTag::Organic) {
            NodeKind::Organic
        } else {
            NodeKind::Standard
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Pulse => "pulse",
            NodeKind::Dancer => "dancer",
            NodeKind::Float => "float",
            NodeKind::Orbital => "orbital",
            NodeKind::Organic => "organic",
            NodeKind::Standard => "standard",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailPoint {
    pub pos: Vec2,
    pub size: f32,
    pub alpha: f32,
}

/// Shared, read-only inputs to [`Node::update`].
pub struct NodeContext<'a> {
    pub features: &'a AudioFeatures,
    pub params: &'a SimulationParameters,
    pub tuning: &'a SimulationTuning,
    pub attractors: &'a [AttractionPoint],
    pub noise: &'a DriftNoise,
    pub bounds: Vec2,
    /// Monotonic simulation clock (seconds)
    pub time: f32,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub id: usize,
    pub kind: NodeKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub base_size: f32,
    pub size: f32,

    base_hsl: Hsl,
    hue_drift: f32,
    /// Current drawing colour
    pub hsl: Hsl,
    pub base_alpha: f32,
    pub alpha: f32,

    /// Remaining life in (0, 1]
    pub life: f32,
    decay_rate: f32,
    /// Vitality; follows the track energy and is boosted by wall hits
    pub energy: f32,

    trail: VecDeque<TrailPoint>,
    trail_capacity: usize,
    trail_decay: f32,

    pub responsiveness: f32,
    pub chaos_factor: f32,
    pub social_tendency: f32,
    pub max_connections: usize,

    pulse_phase: f32,
    spin: f32,
    angle: f32,

    /// Organic outline radii as fractions of `size`
    outline: [f32; ORGANIC_POINTS],
    /// Organic detail dots as (angle, fraction of `size`)
    details: [(f32, f32); ORGANIC_DETAILS],
}

impl Node {
    pub fn new<R: Rng + ?Sized>(
        id: usize,
        kind: NodeKind,
        base_color: Rgb,
        bounds: Vec2,
        params: &SimulationParameters,
        tuning: &SimulationTuning,
        rng: &mut R,
    ) -> Self {
        let mut node = Self {
            id,
            kind,
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            base_size: params.base_size,
            size: params.base_size,
            base_hsl: Hsl::new(0.0, 0.0, 0.0),
            hue_drift: 0.0,
            hsl: Hsl::new(0.0, 0.0, 0.0),
            base_alpha: rng.gen_range(0.6..0.9),
            alpha: 0.0,
            life: 1.0,
            decay_rate: rng.gen_range(tuning.decay_rate.clone()),
            energy: rng.gen_range(0.8..1.0),
            trail: VecDeque::new(),
            trail_capacity: rng.gen_range(tuning.trail_length.clone()),
            trail_decay: rng.gen_range(tuning.trail_decay.clone()),
            responsiveness: 0.0,
            chaos_factor: 0.0,
            social_tendency: 0.0,
            max_connections: 0,
            pulse_phase: 0.0,
            spin: 0.0,
            angle: 0.0,
            outline: [1.0; ORGANIC_POINTS],
            details: [(0.0, 0.0); ORGANIC_DETAILS],
        };
        node.trail.reserve(node.trail_capacity);
        node.reset(bounds, params, tuning, rng);
        node.set_base_color(base_color);
        node.alpha = node.base_alpha;
        node
    }

    /// In-place respawn: new position, velocity and personality. Keeps
    /// `id`, `kind` and colour.
    pub fn reset<R: Rng + ?Sized>(
        &mut self,
        bounds: Vec2,
        params: &SimulationParameters,
        tuning: &SimulationTuning,
        rng: &mut R,
    ) {
        let center = bounds * 0.5;
        self.pos = match self.kind {
            NodeKind::Pulse => Vec2::new(
                bounds.x * rng.gen_range(0.3..0.7),
                bounds.y * rng.gen_range(0.3..0.7),
            ),
            NodeKind::Dancer => center,
            NodeKind::Orbital => {
                let angle = rng.gen_range(0.0..TAU);
                center + Vec2::from_angle(angle) * bounds.x * 0.3
            }
            _ => Vec2::new(
                rng.gen_range(0.0..=bounds.x),
                rng.gen_range(0.0..=bounds.y),
            ),
        };

        let v = params.movement_speed * 0.1;
        self.vel = Vec2::new(rng.gen_range(-v..=v), rng.gen_range(-v..=v));
        self.base_size = params.base_size * rng.gen_range(0.7..1.3);
        self.size = self.base_size;

        self.responsiveness = rng.gen_range(0.5..1.0);
        self.chaos_factor = rng.gen_range(0.0..0.3);
        self.social_tendency = rng.gen_range(0.3..1.0);
        self.max_connections = rng.gen_range(tuning.max_connections.clone());

        self.pulse_phase = rng.gen_range(0.0..TAU);
        self.spin = rng.gen_range(-0.05..0.05);
        self.angle = rng.gen_range(0.0..TAU);

        for r in &mut self.outline {
            *r = 1.0 + rng.gen_range(-0.15..0.15);
        }
        for d in &mut self.details {
            *d = (rng.gen_range(0.0..TAU), rng.gen_range(0.0..0.3));
        }

        self.life = 1.0;
        self.trail.clear();
    }

    /// Recolour from a palette entry, applying the per-kind variation.
    pub fn set_base_color(&mut self, color: Rgb) {
        let mut hsl = color.to_hsl();
        match self.kind {
            NodeKind::Pulse => {
                hsl.h = (hsl.h + 30.0).rem_euclid(360.0);
                hsl.s = (hsl.s * 1.3).min(100.0);
            }
            NodeKind::Dancer => hsl.l = (hsl.l * 1.2).min(100.0),
            NodeKind::Float => {
                hsl.s *= 0.7;
                hsl.l *= 0.8;
            }
            _ => {}
        }
        self.base_hsl = hsl;
        self.hue_drift = 0.0;
        self.hsl = hsl;
    }

    pub fn trail(&self) -> impl ExactSizeIterator<Item = &TrailPoint> {
        self.trail.iter()
    }

    pub fn trail_capacity(&self) -> usize {
        self.trail_capacity
    }

    pub fn update<R: Rng + ?Sized>(&mut self, dt: f32, ctx: &NodeContext<'_>, rng: &mut R) {
        let f = ctx.features;

        self.life *= self.decay_rate;
        if self.life < ctx.tuning.rebirth_threshold {
            self.reset(ctx.bounds, ctx.params, ctx.tuning, rng);
        }

        self.push_trail();

        match self.kind {
            NodeKind::Pulse => self.move_pulse(dt, ctx, rng),
            NodeKind::Dancer => self.move_dancer(dt, ctx),
            NodeKind::Float => self.move_float(dt, ctx),
            NodeKind::Orbital => self.move_orbital(dt, ctx),
            NodeKind::Organic => self.move_organic(dt, ctx),
            NodeKind::Standard => self.move_standard(dt, ctx, rng),
        }

        self.apply_attractors(ctx);

        let follow = (ctx.tuning.vitality_follow_rate * dt).clamp(0.0, 1.0);
        self.energy += (f.energy.clamp(0.0, 1.0) - self.energy) * follow;

        self.handle_walls(ctx, rng);
        self.update_visuals(dt, ctx);

        self.angle += self.spin * dt * (1.0 + f.energy * 2.0);
    }

    fn push_trail(&mut self) {
        self.trail.push_back(TrailPoint {
            pos: self.pos,
            size: self.size,
            alpha: self.alpha,
        });
        while self.trail.len() > self.trail_capacity {
            self.trail.pop_front();
        }
        for point in &mut self.trail {
            point.alpha *= self.trail_decay;
            point.size *= 0.95;
        }
    }

    fn move_pulse<R: Rng + ?Sized>(&mut self, dt: f32, ctx: &NodeContext<'_>, rng: &mut R) {
        let f = ctx.features;
        let beat = ctx.time * (f.tempo / 60.0);
        let pulse = (beat * TAU + self.pulse_phase).sin() * 0.5 + 0.5;

        let outward = (self.pos - ctx.bounds * 0.5).normalize_or_zero();
        self.vel += outward * pulse * f.energy * 20.0 * dt * self.responsiveness;

        let jitter = 10.0 * f.energy * dt * (1.0 + self.chaos_factor);
        self.vel += Vec2::new(
            rng.gen_range(-0.5..0.5) * jitter,
            rng.gen_range(-0.5..0.5) * jitter,
        );

        self.vel *= 0.95;
        self.pos += self.vel * dt * ctx.params.movement_speed;
        self.size = self.base_size * (0.8 + pulse * 0.4);
    }

    fn move_dancer(&mut self, dt: f32, ctx: &NodeContext<'_>) {
        let f = ctx.features;
        let t = ctx.time;
        let id = self.id as f32 * 0.1;
        let frames = dt * 60.0;

        let sway = Vec2::new(
            (t * 2.0 + self.pos.x * 0.01).sin() * f.danceability * 30.0,
            (t * (f.tempo / 60.0) + self.pos.y * 0.01).sin() * 20.0,
        );
        let target = ctx.bounds * 0.5
            + Vec2::new(
                (t * 1.5 + id).sin() * ctx.bounds.x * 0.2,
                (t * 2.0 + id).sin() * ctx.bounds.y * 0.15,
            );

        self.vel = (target - self.pos) * 0.02 + sway * dt;
        self.pos += self.vel * frames;
        self.spin = 0.05 + f.danceability * 0.1;
    }

    fn move_float(&mut self, dt: f32, ctx: &NodeContext<'_>) {
        let f = ctx.features;
        let t = ctx.time;
        let wave = Vec2::new(
            (t * 0.5 + self.pos.x * 0.005).sin() * 10.0 * (1.0 - f.valence),
            (t * 0.7 + self.pos.y * 0.005).cos() * 8.0 * f.acousticness,
        );

        self.vel = self.vel * 0.98 + wave * dt;
        self.pos += self.vel * dt * ctx.params.movement_speed * 0.5;

        let swell = (t + self.id as f32 * 0.05).sin() * 0.2 + 0.8;
        self.size = self.base_size * swell * (0.7 + f.valence * 0.3);
    }

    fn move_orbital(&mut self, dt: f32, ctx: &NodeContext<'_>) {
        let f = ctx.features;
        let center = ctx.bounds * 0.5;
        let offset = self.pos - center;
        let distance = offset.length();
        let frames = dt * 60.0;

        let angular = (0.02 + f.instrumentalness * 0.03) * (1.0 + f.key as f32 * 0.1);
        let angle = offset.y.atan2(offset.x) + angular * frames;

        let target_radius = ctx.bounds.x * 0.25 + (self.id % 5) as f32 * 20.0;
        let correction = (target_radius - distance) * (0.1 * frames).min(1.0);
        let next = center + Vec2::from_angle(angle) * (distance + correction);

        let spiral = f.instrumentalness * 0.1;
        let next = next + Vec2::from_angle(ctx.time * 0.3) * spiral;

        if dt > 0.0 {
            self.vel = (next - self.pos) / (dt * ctx.params.movement_speed);
        }
        self.pos = next;
    }

    fn move_organic(&mut self, dt: f32, ctx: &NodeContext<'_>) {
        let f = ctx.features;
        let t = ctx.time * 0.5;
        let seed = self.id as f32 * 0.1;
        let drift = Vec2::new(
            ctx.noise.sample(t, seed) * 20.0 * f.acousticness,
            ctx.noise.sample(t, seed + 0.5) * 15.0 * f.acousticness,
        );

        self.vel = self.vel * 0.96 + drift * dt;

        let breath = (ctx.time * 0.3).sin() * 0.1 + 0.9;
        self.pos += self.vel * dt * ctx.params.movement_speed * breath;
        self.size = self.base_size * breath * (1.0 + f.liveness * 0.3);
    }

    fn move_standard<R: Rng + ?Sized>(&mut self, dt: f32, ctx: &NodeContext<'_>, rng: &mut R) {
        let f = ctx.features;
        let t = ctx.time;
        let jitter = 15.0 * f.energy * f.speechiness * (1.0 + self.chaos_factor);
        let chaos = Vec2::new(
            rng.gen_range(-0.5..0.5) * jitter,
            rng.gen_range(-0.5..0.5) * jitter,
        );
        let wave = Vec2::new((t * 2.0).sin() * 8.0, (t * 1.7).cos() * 6.0) * f.energy;

        self.vel = self.vel * 0.92 + (wave + chaos) * dt;
        self.pos += self.vel * dt * ctx.params.movement_speed;
    }

    fn apply_attractors(&mut self, ctx: &NodeContext<'_>) {
        for point in ctx.attractors {
            let Some(pull) = point.pull(
                self.pos,
                ctx.bounds,
                ctx.features.energy,
                ctx.tuning.attraction_gain,
            ) else {
                continue;
            };
            self.vel += pull.velocity;
            if point.kind == AttractorKind::Beat {
                self.size = self.base_size * (1.0 + pull.force * 0.3);
            }
        }
    }

    fn handle_walls<R: Rng + ?Sized>(&mut self, ctx: &NodeContext<'_>, rng: &mut R) {
        let response = WallResponse {
            bounce_intensity: ctx.params.bounce_intensity,
            energy: ctx.features.energy,
            weights: ctx.tuning.edge_policy_weights,
        };

        let hit_x = response.constrain(&mut self.pos.x, &mut self.vel.x, ctx.bounds.x, rng);
        if hit_x {
            self.on_wall_hit();
        }
        let hit_y = response.constrain(&mut self.pos.y, &mut self.vel.y, ctx.bounds.y, rng);
        if hit_y {
            self.on_wall_hit();
        }
    }

    fn on_wall_hit(&mut self) {
        self.hue_drift = (self.hue_drift + 5.0).rem_euclid(360.0);
        self.energy = (self.energy * 1.1).min(1.0);
    }

    /// Colour and alpha are recomputed from the base colour every update;
    /// only the hue drift accumulates.
    fn update_visuals(&mut self, dt: f32, ctx: &NodeContext<'_>) {
        let f = ctx.features;
        self.alpha = self.base_alpha * self.life * (0.7 + f.energy * 0.3);

        let hue_shift = (ctx.time * 0.5).sin() * 10.0 * f.valence;
        self.hue_drift = (self.hue_drift + hue_shift * dt).rem_euclid(360.0);

        self.hsl = Hsl::new(
            (self.base_hsl.h + self.hue_drift).rem_euclid(360.0),
            (self.base_hsl.s * (0.8 + f.danceability * 0.4)).min(100.0),
            (self.base_hsl.l * (0.7 + f.energy * 0.6)).min(100.0),
        );
    }

    /// Scale position, velocity and trail after a surface resize.
    pub fn rescale(&mut self, scale: Vec2) {
        self.pos *= scale;
        self.vel *= scale;
        for point in &mut self.trail {
            point.pos *= scale;
        }
    }

    /// Current colour with lightness offset and alpha.
    fn tint(&self, lightness: f32, alpha: f32) -> Rgba {
        Hsl::new(self.hsl.h, self.hsl.s, (self.hsl.l + lightness).clamp(0.0, 100.0)).with_alpha(alpha)
    }

    pub fn color(&self) -> Rgba {
        self.tint(0.0, self.alpha)
    }

    pub fn draw(&self, surface: &mut dyn Surface, aura_threshold: f32) {
        if self.trail.len() > 1 {
            self.draw_trail(surface);
        }

        match self.kind {
            NodeKind::Pulse => self.draw_pulse(surface),
            NodeKind::Dancer => self.draw_dancer(surface),
            NodeKind::Organic => self.draw_organic(surface),
            NodeKind::Float | NodeKind::Orbital | NodeKind::Standard => self.draw_standard(surface),
        }

        if self.energy > aura_threshold {
            self.draw_aura(surface);
        }
    }

    fn draw_trail(&self, surface: &mut dyn Surface) {
        for (a, b) in self.trail.iter().zip(self.trail.iter().skip(1)) {
            surface.stroke_line(
                a.pos,
                b.pos,
                a.size * 0.5,
                self.tint(0.0, a.alpha * 0.3),
                self.tint(0.0, b.alpha * 0.1),
            );
        }
        for point in &self.trail {
            surface.fill_circle(point.pos, point.size * 0.3, self.tint(0.0, point.alpha * 0.5));
        }
    }

    fn draw_pulse(&self, surface: &mut dyn Surface) {
        for ring in (0..=3).rev() {
            let radius = self.size + ring as f32 * self.size * 0.5;
            let alpha = 0.3 / (ring as f32 + 1.0) * self.alpha * self.energy;
            surface.stroke_circle(self.pos, radius, 1.0, self.tint(0.0, alpha));
        }
        surface.fill_radial_gradient(
            self.pos,
            self.size,
            &[
                (0.0, self.tint(20.0, self.alpha)),
                (1.0, self.tint(0.0, self.alpha * 0.3)),
            ],
        );
    }

    fn draw_dancer(&self, surface: &mut dyn Surface) {
        let inner = self.size * 0.6;
        let outer = self.size * 1.2;
        let star: Vec<Vec2> = (0..DANCER_POINTS * 2)
            .map(|i| {
                let radius = if i % 2 == 0 { outer } else { inner };
                let angle = self.angle + i as f32 * PI / DANCER_POINTS as f32;
                self.pos + Vec2::from_angle(angle) * radius
            })
            .collect();

        surface.fill_polygon(&star, self.tint(15.0, self.alpha * 0.75));
        surface.fill_circle(self.pos, self.size * 0.4, self.tint(40.0, self.alpha));
    }

    fn draw_organic(&self, surface: &mut dyn Surface) {
        let outline: Vec<Vec2> = self
            .outline
            .iter()
            .enumerate()
            .map(|(i, r)| {
                let angle = self.angle + i as f32 / ORGANIC_POINTS as f32 * TAU;
                self.pos + Vec2::from_angle(angle) * self.size * r
            })
            .collect();
        surface.fill_polygon(&outline, self.tint(0.0, self.alpha));

        let detail = self.tint(20.0, self.alpha * 0.7);
        for (angle, r) in self.details {
            let at = self.pos + Vec2::from_angle(self.angle + angle) * self.size * r;
            surface.fill_circle(at, self.size * 0.15, detail);
        }
    }

    fn draw_standard(&self, surface: &mut dyn Surface) {
        surface.fill_radial_gradient(
            self.pos,
            self.size,
            &[
                (0.0, self.tint(20.0, self.alpha)),
                (0.7, self.tint(0.0, self.alpha * 0.8)),
                (1.0, self.tint(-10.0, self.alpha * 0.3)),
            ],
        );
        surface.stroke_circle(self.pos, self.size, 1.0, self.tint(30.0, self.alpha * 0.8));
    }

    fn draw_aura(&self, surface: &mut dyn Surface) {
        let radius = self.size * 3.0 * self.energy;
        surface.fill_radial_gradient(
            self.pos,
            radius,
            &[
                (0.0, self.tint(0.0, self.alpha * 0.3)),
                (1.0, self.tint(0.0, 0.0)),
            ],
        );
    }
}
