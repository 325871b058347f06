use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{
    AnimatorConfig, ConfigError, EffectBehavior, LeaveBehavior, PlanePoint, PointerSpace, TimeBase,
};
use crate::snapshot::{UniformSnapshot, UniformValue};

/// Step used by the scaled time base when the caller supplies no elapsed
/// hint (headless advancement at a nominal 60 Hz).
const FALLBACK_FRAME_SECONDS: f32 = 1.0 / 60.0;

/// Per-frame uniform state machine for one shader plane.
///
/// Pointer callbacks only retarget state; all motion happens inside
/// [`advance`](UniformAnimator::advance), which applies one exponential
/// smoothing step (`current += (target - current) * ease`), ticks the
/// variant's intensity decay or easing, and advances the time base.
/// [`snapshot`](UniformAnimator::snapshot) then reads the state out as a
/// flat name-to-value mapping ready for uniform upload.
#[derive(Debug)]
pub struct UniformAnimator {
    config: AnimatorConfig,
    current: PlanePoint,
    target: PlanePoint,
    previous: PlanePoint,
    ease: f32,
    intensity: f32,
    intensity_target: f32,
    hovered: bool,
    hover_accum: f32,
    time: f32,
    rng: StdRng,
}

impl UniformAnimator {
    /// Builds an animator from a validated config. The seed fixes the
    /// random intensity sequence of the glitch behavior so runs replay.
    pub fn new(config: AnimatorConfig, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;

        let (intensity, intensity_target) = match config.behavior {
            EffectBehavior::Wavy { base_intensity, .. } => (base_intensity, base_intensity),
            _ => (0.0, 0.0),
        };
        let time = match config.time {
            TimeBase::FixedStep { start, .. } => start,
            _ => 0.0,
        };

        Ok(Self {
            current: config.initial_pointer,
            target: config.initial_pointer,
            previous: config.initial_pointer,
            ease: config.easing.fast,
            intensity,
            intensity_target,
            hovered: false,
            hover_accum: 0.0,
            time,
            rng: StdRng::seed_from_u64(seed),
            config,
        })
    }

    /// Records a pointer position in the config's coordinate space.
    ///
    /// Selects the fast ease, shifts the old target into `previous`, and
    /// pulses the aberration intensity. No smoothing happens here.
    pub fn on_pointer_move(&mut self, x: f32, y: f32) {
        if self.config.pointer_space == PointerSpace::Inactive {
            return;
        }
        self.ease = self.config.easing.fast;
        self.previous = self.target;
        self.target = PlanePoint::new(x, y);
        if matches!(self.config.behavior, EffectBehavior::Aberration { .. }) {
            self.intensity = 1.0;
        }
    }

    pub fn on_pointer_enter(&mut self) {
        self.hovered = true;
        if self.config.snap_on_enter {
            self.ease = self.config.easing.fast;
            self.current = self.target;
        }
        if let EffectBehavior::Wavy {
            hover_intensity, ..
        } = self.config.behavior
        {
            self.intensity_target = hover_intensity;
        }
    }

    pub fn on_pointer_leave(&mut self) {
        self.hovered = false;
        self.ease = self.config.easing.slow;
        match self.config.leave {
            LeaveBehavior::RestorePrevious => self.target = self.previous,
            LeaveBehavior::ReturnTo(rest) => self.target = rest,
            LeaveBehavior::None => {}
        }
        match self.config.behavior {
            EffectBehavior::Glitch { .. } => self.intensity = 0.0,
            EffectBehavior::Wavy { base_intensity, .. } => {
                self.intensity_target = base_intensity;
            }
            _ => {}
        }
    }

    /// Advances all state by one frame.
    ///
    /// `elapsed` is the wall-clock seconds since the previous call; only the
    /// scaled time base consumes it, every other quantity moves by a fixed
    /// per-call amount so the demo feel tracks the original frame-coupled
    /// behavior. When `elapsed` is `None` the scaled clock assumes 60 Hz.
    pub fn advance(&mut self, elapsed: Option<f32>) {
        self.current.x += (self.target.x - self.current.x) * self.ease;
        self.current.y += (self.target.y - self.current.y) * self.ease;

        match self.config.behavior {
            EffectBehavior::Aberration { decay_step } => {
                self.intensity = (self.intensity - decay_step).max(0.0);
            }
            EffectBehavior::Glitch { tick, interval } => {
                if self.hovered {
                    self.hover_accum += tick;
                    if self.hover_accum >= interval {
                        self.hover_accum = 0.0;
                        self.intensity = self.rng.gen::<f32>();
                    }
                }
            }
            EffectBehavior::LavaLamp => {}
            EffectBehavior::Wavy { .. } => {
                self.intensity += (self.intensity_target - self.intensity) * self.ease;
            }
        }

        match self.config.time {
            TimeBase::None => {}
            TimeBase::FixedStep { step, .. } => self.time += step,
            TimeBase::Scaled { factor } => {
                self.time += factor * elapsed.unwrap_or(FALLBACK_FRAME_SECONDS);
            }
        }
    }

    /// Reads the current state out as uniform values. Pure: calling it
    /// repeatedly without an intervening `advance` yields equal snapshots.
    pub fn snapshot(&self) -> UniformSnapshot {
        let mut snapshot = UniformSnapshot::default();
        match self.config.behavior {
            EffectBehavior::Aberration { .. } => {
                // Pointer state is tracked y-down; the plane samples y-up.
                snapshot.push(
                    "u_mouse",
                    UniformValue::Vec2([self.current.x, 1.0 - self.current.y]),
                );
                snapshot.push(
                    "u_prevMouse",
                    UniformValue::Vec2([self.previous.x, 1.0 - self.previous.y]),
                );
                snapshot.push("u_aberrationIntensity", UniformValue::Float(self.intensity));
            }
            EffectBehavior::Glitch { .. } => {
                snapshot.push("glitchIntensity", UniformValue::Float(self.intensity));
            }
            EffectBehavior::LavaLamp => {
                snapshot.push("u_time", UniformValue::Float(self.time));
            }
            EffectBehavior::Wavy { .. } => {
                snapshot.push("u_time", UniformValue::Float(self.time));
                snapshot.push(
                    "u_mouse",
                    UniformValue::Vec2([self.current.x, self.current.y]),
                );
                snapshot.push("u_intensity", UniformValue::Float(self.intensity));
            }
        }
        if let Some((name, handle)) = self.config.texture {
            snapshot.push(name, UniformValue::Texture(handle));
        }
        snapshot
    }

    pub fn current_pointer(&self) -> PlanePoint {
        self.current
    }

    pub fn target_pointer(&self) -> PlanePoint {
        self.target
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn is_hovered(&self) -> bool {
        self.hovered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnimatorConfig;

    fn aberration() -> UniformAnimator {
        UniformAnimator::new(AnimatorConfig::aberration(), 7).unwrap()
    }

    fn glitch() -> UniformAnimator {
        UniformAnimator::new(AnimatorConfig::glitch(), 7).unwrap()
    }

    fn wavy() -> UniformAnimator {
        UniformAnimator::new(AnimatorConfig::wavy(), 7).unwrap()
    }

    #[test]
    fn smoothing_converges_within_one_percent() {
        let mut animator = aberration();
        animator.on_pointer_move(1.0, 1.0);
        // (1 - 0.02)^230 < 0.01, so 230 steps close 99% of the gap.
        for _ in 0..230 {
            animator.advance(None);
        }
        let current = animator.current_pointer();
        assert!((1.0 - current.x).abs() < 0.01 * 0.5, "x = {}", current.x);
        assert!((1.0 - current.y).abs() < 0.01 * 0.5, "y = {}", current.y);
    }

    #[test]
    fn smoothing_step_matches_fixed_factor() {
        let mut animator = aberration();
        animator.on_pointer_move(0.9, 0.1);
        animator.advance(None);
        let current = animator.current_pointer();
        assert!((current.x - 0.508).abs() < 1e-6, "x = {}", current.x);
        assert!((current.y - 0.492).abs() < 1e-6, "y = {}", current.y);
    }

    #[test]
    fn aberration_intensity_pulses_to_exactly_one() {
        let mut animator = aberration();
        for _ in 0..3 {
            animator.advance(None);
        }
        animator.on_pointer_move(0.2, 0.8);
        assert_eq!(animator.intensity(), 1.0);
    }

    #[test]
    fn aberration_intensity_never_goes_negative() {
        let mut animator = aberration();
        animator.on_pointer_move(0.2, 0.8);
        // 1.0 / 0.05 = 20 steps to reach zero; keep going past it.
        for _ in 0..40 {
            animator.advance(None);
            assert!(animator.intensity() >= 0.0);
        }
        assert_eq!(animator.intensity(), 0.0);
    }

    #[test]
    fn leave_restores_the_previous_target() {
        let mut animator = aberration();
        animator.on_pointer_enter();
        animator.on_pointer_move(0.3, 0.3);
        animator.on_pointer_move(0.8, 0.8);
        animator.on_pointer_leave();
        let target = animator.target_pointer();
        assert_eq!(target, PlanePoint::new(0.3, 0.3));
    }

    #[test]
    fn enter_snaps_current_onto_target() {
        let mut animator = aberration();
        animator.on_pointer_move(0.9, 0.9);
        animator.on_pointer_enter();
        assert_eq!(animator.current_pointer(), PlanePoint::new(0.9, 0.9));
    }

    #[test]
    fn glitch_redraws_exactly_once_per_interval() {
        let mut animator = glitch();
        animator.on_pointer_enter();
        // tick 0.1 against interval 0.5: a redraw lands on every 5th call.
        for cycle in 0..4 {
            let before = animator.intensity();
            for step in 1..=5 {
                animator.advance(None);
                let changed = animator.intensity() != before;
                if step < 5 {
                    assert!(!changed, "cycle {cycle} redrew early at step {step}");
                } else {
                    assert!(changed, "cycle {cycle} failed to redraw at step 5");
                }
            }
            let value = animator.intensity();
            assert!((0.0..1.0).contains(&value), "intensity = {value}");
        }
    }

    #[test]
    fn glitch_leave_zeroes_intensity_and_stops_redraws() {
        let mut animator = glitch();
        animator.on_pointer_enter();
        for _ in 0..5 {
            animator.advance(None);
        }
        assert!(animator.intensity() > 0.0);
        animator.on_pointer_leave();
        assert_eq!(animator.intensity(), 0.0);
        for _ in 0..10 {
            animator.advance(None);
            assert_eq!(animator.intensity(), 0.0);
        }
    }

    #[test]
    fn glitch_sequence_is_deterministic_per_seed() {
        let run = |seed| {
            let mut animator =
                UniformAnimator::new(AnimatorConfig::glitch(), seed).unwrap();
            animator.on_pointer_enter();
            let mut values = Vec::new();
            for _ in 0..3 {
                for _ in 0..5 {
                    animator.advance(None);
                }
                values.push(animator.intensity());
            }
            values
        };
        assert_eq!(run(42), run(42));
        assert_ne!(run(42), run(43));
    }

    #[test]
    fn glitch_ignores_pointer_position() {
        let mut animator = glitch();
        animator.on_pointer_move(0.9, 0.9);
        assert_eq!(animator.target_pointer(), PlanePoint::default());
    }

    #[test]
    fn lava_lamp_time_scales_elapsed_seconds() {
        let mut animator =
            UniformAnimator::new(AnimatorConfig::lava_lamp(), 0).unwrap();
        animator.advance(Some(2.0));
        assert!((animator.time() - 0.02).abs() < 1e-6);
        animator.advance(Some(3.0));
        assert!((animator.time() - 0.05).abs() < 1e-6);
    }

    #[test]
    fn wavy_time_steps_fixed_amount_from_start() {
        let mut animator = wavy();
        assert_eq!(animator.time(), 1.0);
        for _ in 0..10 {
            animator.advance(None);
        }
        assert!((animator.time() - 1.05).abs() < 1e-5);
    }

    #[test]
    fn wavy_intensity_eases_between_rest_and_hover() {
        let mut animator = wavy();
        assert_eq!(animator.intensity(), 0.005);

        animator.on_pointer_enter();
        for _ in 0..400 {
            animator.advance(None);
        }
        assert!((animator.intensity() - 0.009).abs() < 1e-5);

        animator.on_pointer_leave();
        for _ in 0..400 {
            animator.advance(None);
        }
        assert!((animator.intensity() - 0.005).abs() < 1e-5);
    }

    #[test]
    fn wavy_leave_returns_target_to_origin() {
        let mut animator = wavy();
        animator.on_pointer_move(0.7, -0.4);
        animator.on_pointer_leave();
        assert_eq!(animator.target_pointer(), PlanePoint::default());
    }

    #[test]
    fn snapshot_is_idempotent_between_advances() {
        let mut animator = aberration();
        animator.on_pointer_move(0.6, 0.4);
        animator.advance(None);
        assert_eq!(animator.snapshot(), animator.snapshot());
    }

    #[test]
    fn aberration_snapshot_flips_y_for_the_plane() {
        let mut animator = aberration();
        animator.on_pointer_move(0.9, 0.1);
        animator.on_pointer_enter();
        let snapshot = animator.snapshot();
        assert_eq!(
            snapshot.get("u_mouse"),
            Some(&UniformValue::Vec2([0.9, 0.9]))
        );
        assert_eq!(
            snapshot.get("u_aberrationIntensity"),
            Some(&UniformValue::Float(1.0))
        );
        assert!(snapshot.get("u_texture").is_some());
    }

    #[test]
    fn snapshot_names_follow_the_effect() {
        let animator = UniformAnimator::new(AnimatorConfig::lava_lamp(), 0).unwrap();
        let snapshot = animator.snapshot();
        assert!(snapshot.get("u_time").is_some());
        assert!(snapshot.get("u_mouse").is_none());

        let animator = glitch();
        let snapshot = animator.snapshot();
        assert!(snapshot.get("glitchIntensity").is_some());
        assert!(snapshot.get("tDiffuse").is_some());
    }
}
