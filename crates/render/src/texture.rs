//! Sampled images with a placeholder until decode completes.

use crate::device::{DeviceError, RenderDevice, TextureHandle};
use meshview_assets::ImageData;

/// Index of a [`TextureResource`] in the session's texture pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub usize);

/// A device texture that starts as a 1x1 placeholder and is replaced in
/// place at most once.
#[derive(Debug, Clone)]
pub struct TextureResource {
    pub label: String,
    handle: TextureHandle,
    resolved: bool,
}

impl TextureResource {
    pub fn with_placeholder<D: RenderDevice + ?Sized>(
        device: &mut D,
        placeholder: [u8; 4],
        label: &str,
    ) -> Self {
        let handle = device.create_texture(&ImageData::solid(placeholder), label);
        Self {
            label: label.to_string(),
            handle,
            resolved: false,
        }
    }

    pub fn handle(&self) -> TextureHandle {
        self.handle
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Replace the placeholder with the decoded image.
    ///
    /// Returns `Ok(false)` without touching the device if this texture was
    /// already resolved.
    pub fn resolve<D: RenderDevice + ?Sized>(
        &mut self,
        device: &mut D,
        image: &ImageData,
    ) -> Result<bool, DeviceError> {
        if self.resolved {
            tracing::warn!(label = %self.label, "texture already resolved; ignoring new image");
            return Ok(false);
        }
        device.update_texture(self.handle, image)?;
        self.resolved = true;
        tracing::info!(label = %self.label, image.width, image.height, "texture resolved");
        Ok(true)
    }
}
