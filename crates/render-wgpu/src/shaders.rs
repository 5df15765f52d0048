//! WGSL sources for the built-in material kinds.
//!
//! Each stage is emitted as a standalone module: a generated prelude (the
//! uniform block, texture bindings and vertex input struct, all derived from
//! the kind's program interface) followed by the hand-written body.

use crate::layout::uniform_block_wgsl;
use meshview_render::{MaterialKind, ProgramInterface, ProgramSource};
use std::fmt::Write;

const PHONG_VARYINGS: &str = r#"
struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) eye_position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};
"#;

const PHONG_VERTEX: &str = r#"
@vertex
fn vs_main(vertex: VertexInput) -> VertexOutput {
    let eye = u.model_view * vec4<f32>(vertex.position, 1.0);
    var out: VertexOutput;
    out.clip_position = u.projection * eye;
    out.eye_position = eye.xyz;
    out.normal = (u.normal_matrix * vec4<f32>(vertex.normal, 0.0)).xyz;
    out.uv = vertex.texcoord;
    return out;
}
"#;

const PHONG_FRAGMENT: &str = r#"
@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    // Sampled unconditionally: textureSample needs uniform control flow.
    let texel = textureSample(diffuse_map, diffuse_map_sampler, in.uv);
    let base = select(u.diffuse_color, texel.rgb * u.diffuse_color, u.use_texture != 0);
    if u.light_enabled == 0 {
        return vec4<f32>(base, 1.0);
    }

    let n = normalize(in.normal);
    let l = normalize(u.light_position - in.eye_position);
    let v = normalize(-in.eye_position);
    let r = reflect(-l, n);
    let diffuse = max(dot(n, l), 0.0);
    let specular = pow(max(dot(r, v), 0.0), u.shininess);

    let color = u.ka * u.ambient_color * base
        + u.kd * diffuse * base
        + u.ks * specular * u.specular_color;
    return vec4<f32>(color, 1.0);
}
"#;

const VERTEX_COLOR_VARYINGS: &str = r#"
struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
};
"#;

const VERTEX_COLOR_VERTEX: &str = r#"
@vertex
fn vs_main(vertex: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = u.projection * u.model_view * vec4<f32>(vertex.position, 1.0);
    out.color = vertex.color * u.tint;
    return out;
}
"#;

const VERTEX_COLOR_FRAGMENT: &str = r#"
@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return in.color;
}
"#;

/// Uniform block, texture bindings and vertex input for `interface`.
pub fn prelude(interface: &ProgramInterface) -> String {
    let mut out = uniform_block_wgsl(interface);
    for sampler in &interface.samplers {
        let _ = write!(
            out,
            "\n@group(1) @binding(0)\nvar {name}: texture_2d<f32>;\n\
             @group(1) @binding(1)\nvar {name}_sampler: sampler;\n",
            name = sampler.name
        );
    }
    out.push_str("\nstruct VertexInput {\n");
    for attribute in &interface.attributes {
        let ty = match attribute.components {
            1 => "f32",
            2 => "vec2<f32>",
            3 => "vec3<f32>",
            _ => "vec4<f32>",
        };
        let _ = writeln!(
            out,
            "    @location({}) {}: {ty},",
            attribute.location, attribute.name
        );
    }
    out.push_str("};\n");
    out
}

fn assemble(kind: MaterialKind, varyings: &str, vertex: &str, fragment: &str) -> ProgramSource {
    let interface = kind.schema().interface();
    let prelude = prelude(&interface);
    ProgramSource {
        label: format!("{kind:?}").to_lowercase(),
        vertex: format!("{prelude}{varyings}{vertex}"),
        fragment: format!("{prelude}{varyings}{fragment}"),
        interface,
    }
}

pub fn phong_program() -> ProgramSource {
    assemble(
        MaterialKind::Phong,
        PHONG_VARYINGS,
        PHONG_VERTEX,
        PHONG_FRAGMENT,
    )
}

pub fn vertex_color_program() -> ProgramSource {
    assemble(
        MaterialKind::VertexColor,
        VERTEX_COLOR_VARYINGS,
        VERTEX_COLOR_VERTEX,
        VERTEX_COLOR_FRAGMENT,
    )
}

/// Built-in program for a material kind.
pub fn program_for(kind: MaterialKind) -> ProgramSource {
    match kind {
        MaterialKind::Phong => phong_program(),
        MaterialKind::VertexColor => vertex_color_program(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshview_render::{
        DebugDevice, MaterialRegistry, MaterialValues, RenderDevice, build_program,
    };

    #[test]
    fn prelude_declares_interface() {
        let source = phong_program();
        assert!(source.vertex.contains("@location(2) texcoord: vec2<f32>,"));
        assert!(source.fragment.contains("var diffuse_map: texture_2d<f32>;"));
        assert!(source.fragment.contains("var diffuse_map_sampler: sampler;"));
        assert!(source.vertex.contains("use_texture: i32,"));
    }

    #[test]
    fn each_stage_has_one_entry_point() {
        for source in [phong_program(), vertex_color_program()] {
            assert!(source.vertex.contains("fn vs_main"));
            assert!(!source.vertex.contains("fn fs_main"));
            assert!(source.fragment.contains("fn fs_main"));
            assert!(!source.fragment.contains("fn vs_main"));
        }
    }

    #[test]
    fn built_in_programs_satisfy_their_schema() {
        let mut device = DebugDevice::new();
        let mut registry = MaterialRegistry::new();
        for kind in [MaterialKind::Phong, MaterialKind::VertexColor] {
            let program = build_program(&mut device, &program_for(kind)).ok();
            assert!(program.is_some());
            registry
                .create(&device, kind, program, &MaterialValues::new())
                .unwrap();
        }
        assert_eq!(registry.len(), 2);
        assert_eq!(device.viewport_size(), (800, 600));
    }
}
