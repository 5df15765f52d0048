use crate::AssetError;
use std::path::Path;

/// Opaque red, shown until a texture's image finishes decoding.
pub const PLACEHOLDER_TEXEL: [u8; 4] = [255, 0, 0, 255];

/// Decoded RGBA8 pixels, rows top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl ImageData {
    /// A 1x1 image of a single texel.
    pub fn solid(texel: [u8; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            rgba: texel.to_vec(),
        }
    }

    pub fn bytes_per_row(&self) -> u32 {
        self.width * 4
    }
}

/// Decode an encoded image (PNG or JPEG) to RGBA8.
pub fn decode_image(bytes: &[u8]) -> Result<ImageData, AssetError> {
    let decoded = image::load_from_memory(bytes)?.to_rgba8();
    let (width, height) = decoded.dimensions();
    Ok(ImageData {
        width,
        height,
        rgba: decoded.into_raw(),
    })
}

pub fn load_image_file(path: impl AsRef<Path>) -> Result<ImageData, AssetError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let image = decode_image(&bytes)?;
    tracing::debug!(path = %path.display(), image.width, image.height, "decoded image");
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn encoded_png(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn solid_is_one_texel() {
        let image = ImageData::solid(PLACEHOLDER_TEXEL);
        assert_eq!((image.width, image.height), (1, 1));
        assert_eq!(image.rgba, vec![255, 0, 0, 255]);
    }

    #[test]
    fn decode_png_to_rgba() {
        let image = decode_image(&encoded_png(3, 2)).unwrap();
        assert_eq!((image.width, image.height), (3, 2));
        assert_eq!(image.rgba.len(), 3 * 2 * 4);
        assert_eq!(&image.rgba[..4], &[10, 20, 30, 255]);
        assert_eq!(image.bytes_per_row(), 12);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        assert!(matches!(
            decode_image(b"not an image"),
            Err(AssetError::Image(_))
        ));
    }
}
