//! Asset pipeline: CPU-side geometry records, procedural builders, file
//! decoding and fire-once asynchronous loading.
//!
//! Nothing here touches the graphics device. The renderer consumes
//! validated [`GeometryRecord`]s and decoded [`ImageData`].
//!
//! # Invariants
//! - Every present per-vertex attribute has the same length as `positions`.
//! - Every index is below the vertex count; index count is a multiple of 3.
//! - Loads are never retried or cancelled.

mod image_data;
mod loader;
mod obj_mesh;
mod procedural;
mod record;

pub use image_data::{ImageData, PLACEHOLDER_TEXEL, decode_image, load_image_file};
pub use loader::{AssetLoader, LoadEvent, LoadState, LoadTicket, LoadedAsset};
pub use obj_mesh::{load_mesh_file, parse_obj};
pub use procedural::{GRID_COLOR, GridParams, NormalMode, cube, grid};
pub use record::{GeometryError, GeometryRecord};

/// Errors from loading or decoding an asset.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("mesh parse error: {0}")]
    Parse(String),
    #[error("image decode error: {0}")]
    Image(#[from] image::ImageError),
    #[error("invalid geometry: {0}")]
    Geometry(#[from] GeometryError),
    #[error("unsupported asset format: {0}")]
    UnsupportedFormat(String),
    #[error("loader worker failed: {0}")]
    Worker(String),
}
