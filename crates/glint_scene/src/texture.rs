//! Diffuse texture loading.
//!
//! Decodes image files into RGBA8 pixel data ready for GPU upload. Color
//! textures stay sRGB-encoded; the viewport uploads them with an sRGB
//! format so the hardware handles linearization.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur during texture loading.
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image decoding error: {0}")]
    Image(#[from] image::ImageError),
}

/// A decoded texture with RGBA8 pixel data.
#[derive(Clone, Debug)]
pub struct Texture {
    /// Texture width in pixels
    pub width: u32,

    /// Texture height in pixels
    pub height: u32,

    /// Pixel data, 4 bytes per pixel in row-major order
    pub rgba8: Vec<u8>,

    /// Original file path (for diagnostics)
    pub path: String,
}

impl Texture {
    /// Load and decode a texture from a file path.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, TextureError> {
        let path = path.as_ref();
        let img = image::open(path)?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();

        log::debug!(
            "Loaded texture: {} ({}x{}, {:.1} KB)",
            path.display(),
            width,
            height,
            rgba.len() as f32 / 1024.0
        );

        Ok(Self {
            width,
            height,
            rgba8: rgba.into_raw(),
            path: path.to_string_lossy().to_string(),
        })
    }

    /// Create a 1x1 solid color texture.
    ///
    /// Used as the fallback when a model has no diffuse map.
    pub fn solid_color(rgba: [u8; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            rgba8: rgba.to_vec(),
            path: "<solid>".to_string(),
        }
    }

    /// Look for a diffuse map next to a model file.
    ///
    /// Checks for a sibling file with the same stem and a common image
    /// extension, e.g. `suzanne.obj` -> `suzanne.png`.
    pub fn sidecar_for<P: AsRef<Path>>(model_path: P) -> Option<PathBuf> {
        let model_path = model_path.as_ref();
        for ext in ["png", "jpg", "jpeg"] {
            let candidate = model_path.with_extension(ext);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
        None
    }

    /// Total size of the pixel data in bytes.
    pub fn size_bytes(&self) -> usize {
        self.rgba8.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solid_color_texture() {
        let tex = Texture::solid_color([128, 128, 128, 255]);

        assert_eq!(tex.width, 1);
        assert_eq!(tex.height, 1);
        assert_eq!(tex.rgba8, vec![128, 128, 128, 255]);
        assert_eq!(tex.size_bytes(), 4);
    }

    #[test]
    fn test_load_missing_file() {
        let result = Texture::load("/nonexistent/glint_missing.png");
        assert!(result.is_err());
    }

    #[test]
    fn test_sidecar_lookup() {
        let dir = std::env::temp_dir();
        let model = dir.join(format!("glint_sidecar_test_{}.obj", std::process::id()));
        let sidecar = model.with_extension("png");

        std::fs::write(&sidecar, b"not a real png, presence is enough").unwrap();
        let found = Texture::sidecar_for(&model);
        std::fs::remove_file(&sidecar).ok();

        assert_eq!(found, Some(sidecar));
        assert_eq!(Texture::sidecar_for("/nonexistent/glint_none.obj"), None);
    }
}
