//! CPU-side layout of a program's uniform block.
//!
//! Offsets follow WGSL uniform address-space rules, so the struct emitted by
//! [`uniform_block_wgsl`] and the bytes written by [`UniformLayout::write`]
//! always agree.

use meshview_render::{ProgramInterface, UniformData, UniformType};
use std::fmt::Write;

/// WGSL `(align, size)` of a uniform member.
pub fn align_and_size(ty: UniformType) -> (u32, u32) {
    match ty {
        UniformType::Float | UniformType::Int => (4, 4),
        UniformType::Vec2 => (8, 8),
        UniformType::Vec3 => (16, 12),
        UniformType::Vec4 => (16, 16),
        UniformType::Mat4 => (16, 64),
    }
}

pub fn wgsl_type(ty: UniformType) -> &'static str {
    match ty {
        UniformType::Float => "f32",
        UniformType::Int => "i32",
        UniformType::Vec2 => "vec2<f32>",
        UniformType::Vec3 => "vec3<f32>",
        UniformType::Vec4 => "vec4<f32>",
        UniformType::Mat4 => "mat4x4<f32>",
    }
}

fn round_up(value: u32, align: u32) -> u32 {
    value.div_ceil(align) * align
}

#[derive(Debug, Clone, PartialEq)]
pub struct UniformLayout {
    members: Vec<(UniformType, u32)>,
    size: u32,
}

impl UniformLayout {
    pub fn new(interface: &ProgramInterface) -> Self {
        let mut cursor = 0;
        let mut members = Vec::with_capacity(interface.uniforms.len());
        for decl in &interface.uniforms {
            let (align, size) = align_and_size(decl.ty);
            let offset = round_up(cursor, align);
            members.push((decl.ty, offset));
            cursor = offset + size;
        }
        // Uniform structs are padded to a multiple of 16.
        let size = round_up(cursor.max(16), 16);
        Self { members, size }
    }

    /// Block size in bytes.
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn offset(&self, location: u32) -> Option<u32> {
        self.members.get(location as usize).map(|(_, offset)| *offset)
    }

    /// Write `data` into `block` at the member for `location`. Returns
    /// false, leaving `block` untouched, when the location is unknown or
    /// the shape differs from the declaration.
    pub fn write(&self, block: &mut [u8], location: u32, data: &UniformData) -> bool {
        let Some(&(ty, offset)) = self.members.get(location as usize) else {
            return false;
        };
        if ty != data.uniform_type() {
            return false;
        }
        let cols;
        let bytes: &[u8] = match data {
            UniformData::Float(v) => bytemuck::bytes_of(v),
            UniformData::Int(v) => bytemuck::bytes_of(v),
            UniformData::Vec2(v) => bytemuck::bytes_of(v),
            UniformData::Vec3(v) => bytemuck::bytes_of(v),
            UniformData::Vec4(v) => bytemuck::bytes_of(v),
            UniformData::Mat4(m) => {
                cols = m.to_cols_array();
                bytemuck::cast_slice(&cols)
            }
        };
        let start = offset as usize;
        match block.get_mut(start..start + bytes.len()) {
            Some(slot) => {
                slot.copy_from_slice(bytes);
                true
            }
            None => false,
        }
    }
}

/// WGSL declaration of the uniform struct and its binding at group 0.
pub fn uniform_block_wgsl(interface: &ProgramInterface) -> String {
    let mut out = String::from("struct Uniforms {\n");
    for decl in &interface.uniforms {
        let _ = writeln!(out, "    {}: {},", decl.name, wgsl_type(decl.ty));
    }
    if interface.uniforms.is_empty() {
        out.push_str("    _unused: vec4<f32>,\n");
    }
    out.push_str("};\n\n@group(0) @binding(0)\nvar<uniform> u: Uniforms;\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Mat4, Vec3};
    use meshview_render::MaterialKind;

    fn floats(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|c| f32::from_ne_bytes(c.try_into().unwrap()))
            .collect()
    }

    #[test]
    fn phong_block_offsets() {
        let interface = MaterialKind::Phong.schema().interface();
        let layout = UniformLayout::new(&interface);
        let offset = |name: &str| layout.offset(interface.uniform_index(name).unwrap() as u32);
        assert_eq!(offset("projection"), Some(0));
        assert_eq!(offset("normal_matrix"), Some(128));
        assert_eq!(offset("light_enabled"), Some(192));
        assert_eq!(offset("light_position"), Some(208));
        // An i32 packs into the tail of the preceding vec3.
        assert_eq!(offset("use_texture"), Some(220));
        assert_eq!(offset("shininess"), Some(236));
        assert_eq!(offset("ambient_color"), Some(240));
        assert_eq!(offset("specular_color"), Some(272));
        assert_eq!(layout.size(), 288);
    }

    #[test]
    fn vertex_color_block_size() {
        let interface = MaterialKind::VertexColor.schema().interface();
        assert_eq!(UniformLayout::new(&interface).size(), 144);
    }

    #[test]
    fn empty_interface_still_has_a_block() {
        let layout = UniformLayout::new(&ProgramInterface::new());
        assert_eq!(layout.size(), 16);
        assert!(uniform_block_wgsl(&ProgramInterface::new()).contains("_unused"));
    }

    #[test]
    fn write_places_bytes_at_member_offset() {
        let interface = ProgramInterface::new()
            .uniform("flag", UniformType::Int)
            .uniform("light", UniformType::Vec3)
            .uniform("mvp", UniformType::Mat4);
        let layout = UniformLayout::new(&interface);
        let mut block = vec![0u8; layout.size() as usize];

        assert!(layout.write(&mut block, 1, &UniformData::Vec3(Vec3::new(1.0, 2.0, 3.0))));
        assert_eq!(floats(&block[16..28]), vec![1.0, 2.0, 3.0]);

        let m = Mat4::from_translation(Vec3::new(4.0, 5.0, 6.0));
        assert!(layout.write(&mut block, 2, &UniformData::Mat4(m)));
        assert_eq!(&floats(&block[32..96])[12..15], &[4.0, 5.0, 6.0]);

        assert!(!layout.write(&mut block, 0, &UniformData::Float(1.0)));
        assert!(!layout.write(&mut block, 9, &UniformData::Int(1)));
        assert_eq!(&block[0..4], &[0, 0, 0, 0]);
    }

    #[test]
    fn block_text_lists_members_in_order() {
        let interface = MaterialKind::VertexColor.schema().interface();
        let text = uniform_block_wgsl(&interface);
        let projection = text.find("projection: mat4x4<f32>").unwrap();
        let tint = text.find("tint: vec4<f32>").unwrap();
        assert!(projection < tint);
        assert!(text.contains("var<uniform> u: Uniforms;"));
    }
}
