//! Per-frame uniform animation driver for the planefx effect demos.
//!
//! The animator sits between a pointer adapter and a renderer:
//!
//! ```text
//!   pointer adapter ──▶ on_pointer_move/enter/leave
//!                             │ (mutates target state)
//!                             ▼
//!   renderer tick ──▶ advance() ──▶ snapshot() ──▶ uniform upload ──▶ draw
//! ```
//!
//! Pointer input is smoothed into shader-consumable values with a fixed
//! per-call exponential step (`current += (target - current) * ease`),
//! transient effect intensities decay or ease toward their targets, and a
//! per-variant time base feeds the `u_time`-style uniforms. The four demo
//! behaviors share this one state machine and differ only in the constants
//! and decay mode selected by [`AnimatorConfig`].
//!
//! All state lives on the animator instance and is advanced synchronously
//! once per rendered frame; nothing here blocks or spans frames.

mod config;
mod driver;
mod snapshot;

pub use config::{
    AnimatorConfig, ConfigError, Easing, EffectBehavior, EffectKind, LeaveBehavior, PlanePoint,
    PointerSpace, TimeBase,
};
pub use driver::UniformAnimator;
pub use snapshot::{TextureHandle, UniformSnapshot, UniformValue};
