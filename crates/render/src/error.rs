use crate::device::DeviceError;
use crate::geometry::GeometryId;
use crate::material::MaterialError;
use crate::texture::TextureId;
use meshview_assets::{AssetError, GeometryError};

/// Errors surfaced by the session and frame renderer.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("geometry error: {0}")]
    Geometry(#[from] GeometryError),
    #[error("material error: {0}")]
    Material(#[from] MaterialError),
    #[error("device error: {0}")]
    Device(#[from] DeviceError),
    #[error("asset error: {0}")]
    Asset(#[from] AssetError),
    #[error("unknown geometry {0:?}")]
    UnknownGeometry(GeometryId),
    #[error("unknown texture {0:?}")]
    UnknownTexture(TextureId),
}
