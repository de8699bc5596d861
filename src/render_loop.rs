//! Cooperative frame loop: wall-clock delta, one tick, one draw.

use std::time::Instant;

use log::debug;

use crate::surface::Surface;
use crate::viz::Visualizer;

/// Converts wall-clock instants into clamped frame deltas (seconds).
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Option<Instant>,
    max_dt: f32,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(FrameClock::DEFAULT_MAX_DT)
    }
}

impl FrameClock {
    /// Longest step handed to a visualizer
    pub const DEFAULT_MAX_DT: f32 = 0.1;

    pub fn new(max_dt: f32) -> Self {
        Self { last: None, max_dt }
    }

    /// Forget the previous instant; the next delta is zero.
    pub fn reset(&mut self) {
        self.last = None;
    }

    pub fn delta(&mut self, now: Instant) -> f32 {
        let dt = self
            .last
            .map(|prev| now.saturating_duration_since(prev).as_secs_f32())
            .unwrap_or(0.0);
        self.last = Some(now);
        dt.min(self.max_dt)
    }
}

/// Drives a [`Visualizer`] frame by frame.
#[derive(Debug, Default)]
pub struct RenderLoop {
    clock: FrameClock,
    frames: u64,
}

impl RenderLoop {
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Start the visualizer. The clock restarts so the first step after a
    /// pause is zero-length.
    pub fn start(&mut self, visualizer: &mut dyn Visualizer) {
        self.clock.reset();
        visualizer.start();
    }

    pub fn stop(&mut self, visualizer: &mut dyn Visualizer) {
        visualizer.stop();
    }

    /// Start if stopped, stop if running. Returns the new running state.
    pub fn toggle(&mut self, visualizer: &mut dyn Visualizer) -> bool {
        if visualizer.is_running() {
            self.stop(visualizer);
        } else {
            self.start(visualizer);
        }
        visualizer.is_running()
    }

    /// Tick and draw once if the visualizer is running. Returns whether
    /// another frame should be requested.
    pub fn advance(
        &mut self,
        now: Instant,
        visualizer: &mut dyn Visualizer,
        surface: &mut dyn Surface,
    ) -> bool {
        if !visualizer.is_running() {
            self.clock.reset();
            return false;
        }
        let dt = self.clock.delta(now);
        self.step(dt, visualizer, surface);
        true
    }

    /// Fixed-step frame, used for headless recording.
    pub fn step(&mut self, dt: f32, visualizer: &mut dyn Visualizer, surface: &mut dyn Surface) {
        visualizer.tick(dt);
        visualizer.draw(surface);
        self.frames += 1;
        if self.frames % 600 == 0 {
            debug!("{} frames rendered", self.frames);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Theme;
    use crate::features::TrackState;
    use crate::surface::Canvas;
    use std::time::Duration;

    #[derive(Default)]
    struct Probe {
        running: bool,
        ticks: Vec<f32>,
        draws: usize,
    }

    impl Visualizer for Probe {
        fn name(&self) -> &'static str {
            "probe"
        }
        fn start(&mut self) {
            self.running = true;
        }
        fn stop(&mut self) {
            self.running = false;
        }
        fn is_running(&self) -> bool {
            self.running
        }
        fn resize(&mut self, _width: u32, _height: u32) {}
        fn set_track_state(&mut self, _state: &TrackState) {}
        fn set_theme(&mut self, _theme: &Theme) {}
        fn tick(&mut self, dt: f32) {
            self.ticks.push(dt);
        }
        fn draw(&mut self, _surface: &mut dyn Surface) {
            self.draws += 1;
        }
    }

    #[test]
    fn test_clock_clamps_and_resets() {
        let mut clock = FrameClock::default();
        let t0 = Instant::now();
        assert_eq!(clock.delta(t0), 0.0);

        let dt = clock.delta(t0 + Duration::from_millis(16));
        assert!((dt - 0.016).abs() < 1e-4);

        assert_eq!(clock.delta(t0 + Duration::from_secs(5)), FrameClock::DEFAULT_MAX_DT);

        clock.reset();
        assert_eq!(clock.delta(t0 + Duration::from_secs(9)), 0.0);
    }

    #[test]
    fn test_stopped_visualizer_is_not_ticked() {
        let mut render_loop = RenderLoop::default();
        let mut probe = Probe::default();
        let mut canvas = Canvas::new(8, 8).unwrap();

        assert!(!render_loop.advance(Instant::now(), &mut probe, &mut canvas));
        assert!(probe.ticks.is_empty());
        assert_eq!(probe.draws, 0);
        assert_eq!(render_loop.frames(), 0);
    }

    #[test]
    fn test_advance_ticks_once_per_frame() {
        let mut render_loop = RenderLoop::default();
        let mut probe = Probe::default();
        let mut canvas = Canvas::new(8, 8).unwrap();
        let t0 = Instant::now();

        render_loop.start(&mut probe);
        for i in 0..3 {
            let now = t0 + Duration::from_millis(20 * i);
            assert!(render_loop.advance(now, &mut probe, &mut canvas));
        }
        assert_eq!(probe.ticks.len(), 3);
        assert_eq!(probe.draws, 3);
        assert_eq!(probe.ticks[0], 0.0);
        assert!((probe.ticks[2] - 0.02).abs() < 1e-4);
    }

    #[test]
    fn test_resume_after_pause_does_not_jump() {
        let mut render_loop = RenderLoop::default();
        let mut probe = Probe::default();
        let mut canvas = Canvas::new(8, 8).unwrap();
        let t0 = Instant::now();

        render_loop.start(&mut probe);
        render_loop.advance(t0, &mut probe, &mut canvas);
        assert!(!render_loop.toggle(&mut probe));
        assert!(render_loop.toggle(&mut probe));
        render_loop.advance(t0 + Duration::from_secs(30), &mut probe, &mut canvas);

        assert_eq!(probe.ticks, vec![0.0, 0.0]);
    }
}
