use serde::{Deserialize, Serialize};

use crate::snapshot::TextureHandle;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("ease factor '{name}' is {value}; must be in (0, 1]")]
    EaseOutOfRange { name: &'static str, value: f32 },
    #[error("decay step is {0}; must be non-negative")]
    NegativeDecayStep(f32),
    #[error("glitch {name} is {value}; must be greater than zero")]
    NonPositiveGlitch { name: &'static str, value: f32 },
    #[error("wave intensity '{name}' is {value}; must be non-negative")]
    NegativeIntensity { name: &'static str, value: f32 },
}

/// The four demo effects. Each maps to one preset parameter table in
/// [`AnimatorConfig`] and one fragment program in the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EffectKind {
    Aberration,
    Glitch,
    LavaLamp,
    Wavy,
}

impl EffectKind {
    pub const ALL: [EffectKind; 4] = [
        EffectKind::Aberration,
        EffectKind::Glitch,
        EffectKind::LavaLamp,
        EffectKind::Wavy,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EffectKind::Aberration => "aberration",
            EffectKind::Glitch => "glitch",
            EffectKind::LavaLamp => "lava-lamp",
            EffectKind::Wavy => "wavy",
        }
    }
}

impl std::fmt::Display for EffectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for EffectKind {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "aberration" => Ok(EffectKind::Aberration),
            "glitch" => Ok(EffectKind::Glitch),
            "lava-lamp" | "lavalamp" | "lava" => Ok(EffectKind::LavaLamp),
            "wavy" | "wave" => Ok(EffectKind::Wavy),
            other => Err(format!("unknown effect '{other}'")),
        }
    }
}

/// A point in the plane's local coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlanePoint {
    pub x: f32,
    pub y: f32,
}

impl PlanePoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Which normalized coordinate space pointer callbacks expect.
///
/// The adapter feeding `on_pointer_move` must translate device pixels into
/// this space; the animator itself never sees pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerSpace {
    /// `[0, 1]` on both axes, y increasing downward (texture space).
    UnitSquare,
    /// `[-1, 1]` on both axes, y increasing upward (clip-plane space).
    CenteredUnit,
    /// Pointer position is ignored; only enter/leave matter.
    Inactive,
}

/// Smoothing rates applied by `advance`. `fast` is selected on enter/move,
/// `slow` on leave. Both must lie in `(0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Easing {
    pub fast: f32,
    pub slow: f32,
}

/// Where `target` goes when the pointer leaves the plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LeaveBehavior {
    /// Ease back to the position the pointer held before its last move.
    RestorePrevious,
    /// Ease back to a fixed rest position.
    ReturnTo(PlanePoint),
    /// Leave the target where it is.
    None,
}

/// How the internal time accumulator advances each frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeBase {
    None,
    /// Fixed increment per `advance` call, regardless of wall-clock time.
    FixedStep { step: f32, start: f32 },
    /// `factor × elapsed-seconds` taken from the advance hint.
    Scaled { factor: f32 },
}

/// Selects the per-variant decay mode / state machine on top of the shared
/// pointer smoothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EffectBehavior {
    /// Intensity pulses to 1.0 on pointer move and decays linearly to zero.
    Aberration { decay_step: f32 },
    /// While hovered, intensity is redrawn from the random source every time
    /// `tick` accumulates up to `interval`; leave zeroes it immediately.
    Glitch { tick: f32, interval: f32 },
    /// Pure time-driven palette blend; no channels, no pointer.
    LavaLamp,
    /// Intensity eases between a resting and a hovered constant.
    Wavy {
        base_intensity: f32,
        hover_intensity: f32,
    },
}

/// Full parameterization of one animator instance.
///
/// Use the per-effect constructors ([`AnimatorConfig::aberration`] and
/// friends) for the stock demo behaviors; the fields are public so callers
/// can tweak individual constants before construction.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimatorConfig {
    pub easing: Easing,
    pub pointer_space: PointerSpace,
    pub initial_pointer: PlanePoint,
    /// Snap `current` onto `target` on pointer enter instead of easing from
    /// a stale position.
    pub snap_on_enter: bool,
    pub leave: LeaveBehavior,
    pub time: TimeBase,
    pub behavior: EffectBehavior,
    /// Uniform name + opaque handle of the sampled texture, when the effect
    /// has one. The handle is passed through the snapshot unchanged.
    pub texture: Option<(&'static str, TextureHandle)>,
}

impl AnimatorConfig {
    /// Mouse-driven chromatic aberration: grid-offset sampling follows the
    /// smoothed pointer, intensity pulses on move and decays linearly.
    pub fn aberration() -> Self {
        Self {
            easing: Easing {
                fast: 0.02,
                slow: 0.5,
            },
            pointer_space: PointerSpace::UnitSquare,
            initial_pointer: PlanePoint::new(0.5, 0.5),
            snap_on_enter: true,
            leave: LeaveBehavior::RestorePrevious,
            time: TimeBase::None,
            behavior: EffectBehavior::Aberration { decay_step: 0.05 },
            texture: Some(("u_texture", TextureHandle::default())),
        }
    }

    /// Hover-only segment glitch: a fresh random intensity every half second
    /// of accumulated hover time, zeroed on leave.
    pub fn glitch() -> Self {
        Self {
            easing: Easing {
                fast: 0.02,
                slow: 0.5,
            },
            pointer_space: PointerSpace::Inactive,
            initial_pointer: PlanePoint::default(),
            snap_on_enter: false,
            leave: LeaveBehavior::None,
            time: TimeBase::None,
            behavior: EffectBehavior::Glitch {
                tick: 0.1,
                interval: 0.5,
            },
            texture: Some(("tDiffuse", TextureHandle::default())),
        }
    }

    /// Pure time-driven palette blend; ignores the pointer entirely.
    pub fn lava_lamp() -> Self {
        Self {
            easing: Easing {
                fast: 0.02,
                slow: 0.5,
            },
            pointer_space: PointerSpace::Inactive,
            initial_pointer: PlanePoint::default(),
            snap_on_enter: false,
            leave: LeaveBehavior::None,
            time: TimeBase::Scaled { factor: 0.01 },
            behavior: EffectBehavior::LavaLamp,
            texture: None,
        }
    }

    /// Sinusoidal UV warp following the pointer, with the wave amplitude
    /// easing between a resting and a hovered constant.
    pub fn wavy() -> Self {
        Self {
            easing: Easing {
                fast: 0.03,
                slow: 0.03,
            },
            pointer_space: PointerSpace::CenteredUnit,
            initial_pointer: PlanePoint::default(),
            snap_on_enter: false,
            leave: LeaveBehavior::ReturnTo(PlanePoint::default()),
            time: TimeBase::FixedStep {
                step: 0.005,
                start: 1.0,
            },
            behavior: EffectBehavior::Wavy {
                base_intensity: 0.005,
                hover_intensity: 0.009,
            },
            texture: Some(("u_texture", TextureHandle::default())),
        }
    }

    pub fn for_effect(kind: EffectKind) -> Self {
        match kind {
            EffectKind::Aberration => Self::aberration(),
            EffectKind::Glitch => Self::glitch(),
            EffectKind::LavaLamp => Self::lava_lamp(),
            EffectKind::Wavy => Self::wavy(),
        }
    }

    /// Rejects invalid constants up front so `advance` never has to.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_ease("fast", self.easing.fast)?;
        check_ease("slow", self.easing.slow)?;

        match &self.behavior {
            EffectBehavior::Aberration { decay_step } => {
                if *decay_step < 0.0 {
                    return Err(ConfigError::NegativeDecayStep(*decay_step));
                }
            }
            EffectBehavior::Glitch { tick, interval } => {
                if *tick <= 0.0 {
                    return Err(ConfigError::NonPositiveGlitch {
                        name: "tick",
                        value: *tick,
                    });
                }
                if *interval <= 0.0 {
                    return Err(ConfigError::NonPositiveGlitch {
                        name: "interval",
                        value: *interval,
                    });
                }
            }
            EffectBehavior::LavaLamp => {}
            EffectBehavior::Wavy {
                base_intensity,
                hover_intensity,
            } => {
                if *base_intensity < 0.0 {
                    return Err(ConfigError::NegativeIntensity {
                        name: "base",
                        value: *base_intensity,
                    });
                }
                if *hover_intensity < 0.0 {
                    return Err(ConfigError::NegativeIntensity {
                        name: "hover",
                        value: *hover_intensity,
                    });
                }
            }
        }

        Ok(())
    }
}

fn check_ease(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::EaseOutOfRange { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() {
        for kind in EffectKind::ALL {
            AnimatorConfig::for_effect(kind)
                .validate()
                .unwrap_or_else(|err| panic!("{kind} preset invalid: {err}"));
        }
    }

    #[test]
    fn rejects_ease_outside_unit_interval() {
        let mut config = AnimatorConfig::aberration();
        config.easing.fast = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EaseOutOfRange { name: "fast", .. })
        ));

        config.easing.fast = 1.5;
        assert!(config.validate().is_err());

        config.easing.fast = 1.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_negative_decay_step() {
        let mut config = AnimatorConfig::aberration();
        config.behavior = EffectBehavior::Aberration { decay_step: -0.05 };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NegativeDecayStep(_))
        ));
    }

    #[test]
    fn rejects_non_positive_glitch_timing() {
        let mut config = AnimatorConfig::glitch();
        config.behavior = EffectBehavior::Glitch {
            tick: 0.0,
            interval: 0.5,
        };
        assert!(config.validate().is_err());

        config.behavior = EffectBehavior::Glitch {
            tick: 0.1,
            interval: -1.0,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn effect_names_round_trip() {
        for kind in EffectKind::ALL {
            assert_eq!(kind.name().parse::<EffectKind>().unwrap(), kind);
        }
    }
}
