//! Wavefront OBJ decoding into [`GeometryRecord`].

use crate::AssetError;
use crate::record::GeometryRecord;
use obj::ObjError;
use obj::raw::RawObj;
use obj::raw::object::Polygon;
use std::collections::HashMap;
use std::path::Path;

/// Read and decode a mesh file. Only `.obj` is supported.
pub fn load_mesh_file(path: impl AsRef<Path>) -> Result<GeometryRecord, AssetError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    if extension.as_deref() != Some("obj") {
        return Err(AssetError::UnsupportedFormat(path.display().to_string()));
    }

    let source = std::fs::read(path)?;
    let mut record = parse_obj(&source)?;
    if record.name.is_empty() {
        record.name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
    }
    tracing::debug!(
        path = %path.display(),
        vertices = record.vertex_count(),
        indices = record.index_count(),
        "decoded mesh"
    );
    Ok(record)
}

/// Decode OBJ text. Faces must carry normals; texture coordinates are kept
/// when every face has them. Polygons with more than three corners are
/// fan-triangulated around their first corner.
pub fn parse_obj(source: &[u8]) -> Result<GeometryRecord, AssetError> {
    let raw = obj::raw::parse_obj(source).map_err(translate_error)?;
    let textured = !raw.polygons.is_empty()
        && raw.polygons.iter().all(|p| matches!(p, Polygon::PTN(_)));

    let mut builder = MeshBuilder::new(&raw, textured);
    for polygon in &raw.polygons {
        let corners: Vec<Corner> = match polygon {
            Polygon::PN(vs) => vs
                .iter()
                .map(|&(position, normal)| Corner {
                    position,
                    texcoord: None,
                    normal,
                })
                .collect(),
            Polygon::PTN(vs) => vs
                .iter()
                .map(|&(position, texcoord, normal)| Corner {
                    position,
                    texcoord: Some(texcoord),
                    normal,
                })
                .collect(),
            Polygon::P(_) | Polygon::PT(_) => {
                return Err(AssetError::Parse("face without vertex normals".into()));
            }
        };
        builder.polygon(&corners)?;
    }

    let record = builder.finish(raw.name.clone().unwrap_or_default());
    record.validate()?;
    Ok(record)
}

/// One face corner: indices into the raw position, texcoord and normal pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Corner {
    position: usize,
    texcoord: Option<usize>,
    normal: usize,
}

/// Deduplicates corners into vertices and collects triangle indices.
struct MeshBuilder<'a> {
    raw: &'a RawObj,
    textured: bool,
    lookup: HashMap<Corner, u32>,
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    texcoords: Vec<[f32; 2]>,
    indices: Vec<u32>,
}

impl<'a> MeshBuilder<'a> {
    fn new(raw: &'a RawObj, textured: bool) -> Self {
        Self {
            raw,
            textured,
            lookup: HashMap::new(),
            positions: Vec::new(),
            normals: Vec::new(),
            texcoords: Vec::new(),
            indices: Vec::new(),
        }
    }

    fn polygon(&mut self, corners: &[Corner]) -> Result<(), AssetError> {
        let Some((first, rest)) = corners.split_first() else {
            return Err(AssetError::Parse("empty face".into()));
        };
        if rest.len() < 2 {
            return Err(AssetError::Parse(format!(
                "face with {} corners",
                corners.len()
            )));
        }
        let anchor = self.vertex(*first)?;
        for pair in rest.windows(2) {
            let b = self.vertex(pair[0])?;
            let c = self.vertex(pair[1])?;
            self.indices.extend_from_slice(&[anchor, b, c]);
        }
        Ok(())
    }

    fn vertex(&mut self, mut corner: Corner) -> Result<u32, AssetError> {
        if !self.textured {
            corner.texcoord = None;
        }
        if let Some(&index) = self.lookup.get(&corner) {
            return Ok(index);
        }

        let out_of_range = || AssetError::Parse("face index out of range".into());
        let &(px, py, pz, _) = self
            .raw
            .positions
            .get(corner.position)
            .ok_or_else(out_of_range)?;
        let &(nx, ny, nz) = self
            .raw
            .normals
            .get(corner.normal)
            .ok_or_else(out_of_range)?;
        if let Some(t) = corner.texcoord {
            let &(u, v, _) = self.raw.tex_coords.get(t).ok_or_else(out_of_range)?;
            self.texcoords.push([u, v]);
        }

        let index = u32::try_from(self.positions.len())
            .map_err(|_| AssetError::Parse("mesh exceeds u32 vertex range".into()))?;
        self.positions.push([px, py, pz]);
        self.normals.push([nx, ny, nz]);
        self.lookup.insert(corner, index);
        Ok(index)
    }

    fn finish(self, name: String) -> GeometryRecord {
        GeometryRecord {
            name,
            positions: self.positions,
            normals: self.normals,
            texcoords: self.textured.then_some(self.texcoords),
            colors: None,
            indices: self.indices,
        }
    }
}

fn translate_error(from: ObjError) -> AssetError {
    match from {
        ObjError::Io(e) => AssetError::Io(e),
        other => AssetError::Parse(other.to_string()),
    }
}
