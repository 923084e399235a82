//! Image decoding and PNG output

use crate::IoError;
use image::{EncodableLayout, ImageBuffer, ImageFormat, PixelWithColorType, RgbImage};
use std::path::Path;
use tactilecrate_core::Result;
use tracing::debug;

/// Decode a PNG, BMP or JPEG file into 8-bit RGB. Alpha is dropped.
pub fn load_rgb_image<P: AsRef<Path>>(path: P) -> Result<RgbImage> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(IoError::FileNotFound {
            path: path.display().to_string(),
        }
        .into());
    }
    let image = image::open(path).map_err(|e| IoError::Decode {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let rgb = image.to_rgb8();
    debug!(path = %path.display(), width = rgb.width(), height = rgb.height(), "image loaded");
    Ok(rgb)
}

/// Write an 8-bit image as PNG.
pub fn save_png<P, Q>(image: &ImageBuffer<P, Vec<P::Subpixel>>, path: Q) -> Result<()>
where
    P: PixelWithColorType,
    [P::Subpixel]: EncodableLayout,
    Q: AsRef<Path>,
{
    let path = path.as_ref();
    image
        .save_with_format(path, ImageFormat::Png)
        .map_err(|e| IoError::WriteError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
    debug!(path = %path.display(), "png written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb};
    use tactilecrate_core::Error;

    #[test]
    fn test_png_roundtrip() {
        let path = std::env::temp_dir().join("tactilecrate_raster_roundtrip.png");
        let image = RgbImage::from_fn(3, 2, |x, y| Rgb([x as u8 * 50, y as u8 * 90, 7]));
        save_png(&image, &path).unwrap();
        let loaded = load_rgb_image(&path).unwrap();
        assert_eq!(loaded, image);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_grey_png_loads_as_rgb() {
        let path = std::env::temp_dir().join("tactilecrate_io_grey.png");
        save_png(&GrayImage::from_pixel(2, 2, Luma([128])), &path).unwrap();
        let loaded = load_rgb_image(&path).unwrap();
        assert!(loaded.pixels().all(|p| p.0 == [128, 128, 128]));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_missing_file_is_an_input_error() {
        let err = load_rgb_image("does/not/exist.png").unwrap_err();
        assert!(matches!(err, Error::Input(_)));
    }

    #[test]
    fn test_corrupt_file_is_an_input_error() {
        let path = std::env::temp_dir().join("tactilecrate_io_corrupt.png");
        std::fs::write(&path, b"not an image").unwrap();
        let err = load_rgb_image(&path).unwrap_err();
        assert!(matches!(err, Error::Input(_)));
        let _ = std::fs::remove_file(&path);
    }
}
