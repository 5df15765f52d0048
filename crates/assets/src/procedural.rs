//! Procedural geometry: the floor grid and the textured cube.

use crate::record::{GeometryError, GeometryRecord};
use serde::{Deserialize, Serialize};

/// Orange tone applied to every grid vertex.
pub const GRID_COLOR: [f32; 4] = [0.878, 0.592, 0.400, 1.0];

/// How grid normals are produced.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalMode {
    /// Every normal is +Y.
    #[default]
    Up,
    /// +Y direction with a pseudo-random length in [0, 1), seeded for reproducibility.
    Jittered { seed: u64 },
}

/// Grid lattice parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridParams {
    /// Width of one square cell.
    pub square_width: f32,
    /// Number of cells along X.
    pub columns: u32,
    /// Number of cells along Z.
    pub rows: u32,
    pub normals: NormalMode,
    pub color: [f32; 4],
}

impl Default for GridParams {
    fn default() -> Self {
        Self {
            square_width: 0.4,
            columns: 50,
            rows: 50,
            normals: NormalMode::Up,
            color: GRID_COLOR,
        }
    }
}

/// Build a `(columns+1) x (rows+1)` vertex lattice centered on the origin in
/// the XZ plane, two counter-clockwise triangles per cell (seen from +Y).
pub fn grid(params: &GridParams) -> Result<GeometryRecord, GeometryError> {
    let GridParams {
        square_width,
        columns,
        rows,
        normals: normal_mode,
        color,
    } = *params;

    if columns == 0 || rows == 0 {
        return Err(GeometryError::InvalidGridParameters(format!(
            "need at least one column and row, got {columns}x{rows}"
        )));
    }
    if !(square_width.is_finite() && square_width > 0.0) {
        return Err(GeometryError::InvalidGridParameters(format!(
            "square width must be positive, got {square_width}"
        )));
    }

    // Indices are u32, so the whole lattice must be addressable by one.
    let too_large = || {
        GeometryError::InvalidGridParameters(format!(
            "{columns}x{rows} lattice exceeds the u32 index range"
        ))
    };
    let stride = columns.checked_add(1).ok_or_else(too_large)?;
    let vertex_count = rows
        .checked_add(1)
        .and_then(|r| r.checked_mul(stride))
        .ok_or_else(too_large)? as usize;
    let index_count = columns
        .checked_mul(rows)
        .and_then(|cells| cells.checked_mul(6))
        .ok_or_else(too_large)? as usize;
    let start_x = -(columns as f32) * square_width / 2.0;
    let start_z = -(rows as f32) * square_width / 2.0;

    let mut positions = Vec::with_capacity(vertex_count);
    let mut normals = Vec::with_capacity(vertex_count);
    let mut texcoords = Vec::with_capacity(vertex_count);
    let mut indices = Vec::with_capacity(index_count);
    let mut jitter_state = match normal_mode {
        NormalMode::Jittered { seed } => seed,
        NormalMode::Up => 0,
    };

    for h in 0..=rows {
        for w in 0..=columns {
            positions.push([
                start_x + w as f32 * square_width,
                0.0,
                start_z + h as f32 * square_width,
            ]);

            let up = match normal_mode {
                NormalMode::Up => 1.0,
                NormalMode::Jittered { .. } => {
                    jitter_state = splitmix64(jitter_state);
                    unit_float(jitter_state)
                }
            };
            normals.push([0.0, up, 0.0]);
            texcoords.push([w as f32 / columns as f32, h as f32 / rows as f32]);

            if w < columns && h < rows {
                let i = w + h * stride;
                indices.extend_from_slice(&[i, i + stride, i + stride + 1]);
                indices.extend_from_slice(&[i, i + stride + 1, i + 1]);
            }
        }
    }

    Ok(GeometryRecord {
        name: format!("grid_{columns}x{rows}"),
        positions,
        normals,
        texcoords: Some(texcoords),
        colors: Some(vec![color; vertex_count]),
        indices,
    })
}

/// A 2-unit cube: 6 faces of 4 unshared vertices, outward normals, unit-square UVs.
///
/// Face order: front (+Z), back (-Z), top (+Y), bottom (-Y), right (+X), left (-X).
pub fn cube(face_colors: Option<[[f32; 4]; 6]>) -> GeometryRecord {
    #[rustfmt::skip]
    let positions: Vec<[f32; 3]> = vec![
        // Front
        [-1.0, -1.0,  1.0], [ 1.0, -1.0,  1.0], [ 1.0,  1.0,  1.0], [-1.0,  1.0,  1.0],
        // Back
        [-1.0, -1.0, -1.0], [-1.0,  1.0, -1.0], [ 1.0,  1.0, -1.0], [ 1.0, -1.0, -1.0],
        // Top
        [-1.0,  1.0, -1.0], [-1.0,  1.0,  1.0], [ 1.0,  1.0,  1.0], [ 1.0,  1.0, -1.0],
        // Bottom
        [-1.0, -1.0, -1.0], [ 1.0, -1.0, -1.0], [ 1.0, -1.0,  1.0], [-1.0, -1.0,  1.0],
        // Right
        [ 1.0, -1.0, -1.0], [ 1.0,  1.0, -1.0], [ 1.0,  1.0,  1.0], [ 1.0, -1.0,  1.0],
        // Left
        [-1.0, -1.0, -1.0], [-1.0, -1.0,  1.0], [-1.0,  1.0,  1.0], [-1.0,  1.0, -1.0],
    ];
    let face_normals: [[f32; 3]; 6] = [
        [0.0, 0.0, 1.0],
        [0.0, 0.0, -1.0],
        [0.0, 1.0, 0.0],
        [0.0, -1.0, 0.0],
        [1.0, 0.0, 0.0],
        [-1.0, 0.0, 0.0],
    ];
    let face_uv: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

    let mut normals = Vec::with_capacity(24);
    let mut texcoords = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (face, normal) in face_normals.iter().enumerate() {
        normals.extend_from_slice(&[*normal; 4]);
        texcoords.extend_from_slice(&face_uv);
        let base = face as u32 * 4;
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    let colors = face_colors.map(|faces| {
        faces
            .iter()
            .flat_map(|color| std::iter::repeat_n(*color, 4))
            .collect()
    });

    GeometryRecord {
        name: "cube".into(),
        positions,
        normals,
        texcoords: Some(texcoords),
        colors,
        indices,
    }
}

fn splitmix64(mut state: u64) -> u64 {
    state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Map the top 24 bits to [0, 1).
fn unit_float(bits: u64) -> f32 {
    (bits >> 40) as f32 / (1u64 << 24) as f32
}
