//! Embedded WGSL programs, one fragment per effect plus a shared prelude.

use animator::EffectKind;

/// Shared prelude: the uniform block (layout mirrored by the CPU-side
/// `PlaneUniforms`), the texture bindings, and the fullscreen-triangle
/// vertex stage. Every fragment program is compiled against this.
const PRELUDE: &str = r"struct EffectParams {
    mouse: vec2<f32>,
    prev_mouse: vec2<f32>,
    time: f32,
    intensity: f32,
    _pad: vec2<f32>,
    palette: array<vec4<f32>, 5>,
};

@group(0) @binding(0) var<uniform> params: EffectParams;
@group(1) @binding(0) var plane_texture: texture_2d<f32>;
@group(1) @binding(1) var plane_sampler: sampler;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@builtin(vertex_index) index: u32) -> VertexOutput {
    var positions = array<vec2<f32>, 3>(
        vec2<f32>(-1.0, -3.0),
        vec2<f32>(3.0, 1.0),
        vec2<f32>(-1.0, 1.0),
    );
    let pos = positions[index];
    var out: VertexOutput;
    out.position = vec4<f32>(pos, 0.0, 1.0);
    out.uv = pos * 0.5 + vec2<f32>(0.5, 0.5);
    return out;
}
";

fn fragment_body(effect: EffectKind) -> &'static str {
    match effect {
        EffectKind::Aberration => include_str!("shaders/aberration.wgsl"),
        EffectKind::Glitch => include_str!("shaders/glitch.wgsl"),
        EffectKind::LavaLamp => include_str!("shaders/lava_lamp.wgsl"),
        EffectKind::Wavy => include_str!("shaders/wavy.wgsl"),
    }
}

/// Produces the complete WGSL module for an effect.
pub fn effect_source(effect: EffectKind) -> String {
    format!("{PRELUDE}\n{}", fragment_body(effect))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_effect_has_both_entry_points() {
        for kind in EffectKind::ALL {
            let source = effect_source(kind);
            assert!(source.contains("fn vs_main"), "{kind} lacks a vertex stage");
            assert!(
                source.contains("fn fs_main"),
                "{kind} lacks a fragment stage"
            );
        }
    }

    #[test]
    fn glitch_samples_both_shift_directions() {
        let body = fragment_body(EffectKind::Glitch);
        assert!(body.contains("uv + offset"));
        assert!(body.contains("uv - offset"));
    }

    #[test]
    fn fragments_use_only_prelude_bindings() {
        for kind in EffectKind::ALL {
            let body = fragment_body(kind);
            assert!(
                !body.contains("@group"),
                "{kind} declares its own bindings"
            );
        }
    }
}
