//! Synthetic capture image for the smoke test.

use std::io::Cursor;
use std::path::Path;

use image::{ImageFormat, Rgb, RgbImage};
use tracing::info;

use crate::{StorageError, StorageResult};

/// Edge length of the test image in pixels.
pub const TEST_IMAGE_SIZE: u32 = 200;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
const BLUE: Rgb<u8> = Rgb([0, 0, 255]);

/// Border rectangle (inclusive) and its stroke width.
const BORDER_MIN: u32 = 10;
const BORDER_MAX: u32 = 190;
const BORDER_WIDTH: u32 = 2;

/// White square with a black border and a blue marker band.
pub fn render_test_image() -> RgbImage {
    let mut img = RgbImage::from_pixel(TEST_IMAGE_SIZE, TEST_IMAGE_SIZE, WHITE);

    for y in BORDER_MIN..=BORDER_MAX {
        for x in BORDER_MIN..=BORDER_MAX {
            let on_edge = x < BORDER_MIN + BORDER_WIDTH
                || x > BORDER_MAX - BORDER_WIDTH
                || y < BORDER_MIN + BORDER_WIDTH
                || y > BORDER_MAX - BORDER_WIDTH;
            if on_edge {
                img.put_pixel(x, y, BLACK);
            }
        }
    }

    // Marker band where the code label sits on a real capture
    for y in 108..=122 {
        for x in 30..=170 {
            img.put_pixel(x, y, BLUE);
        }
    }

    img
}

/// JPEG bytes of [`render_test_image`].
pub fn encode_test_image() -> StorageResult<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    render_test_image().write_to(&mut cursor, ImageFormat::Jpeg)?;
    Ok(cursor.into_inner())
}

/// Write the test image to `path` as JPEG, creating parent directories.
pub fn generate_test_image(path: &Path) -> StorageResult<Vec<u8>> {
    let bytes = encode_test_image()?;
    let io_error = |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_error)?;
    }
    std::fs::write(path, &bytes).map_err(io_error)?;
    info!(path = %path.display(), bytes = bytes.len(), "Generated test image");
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_render_layout() {
        let img = render_test_image();
        assert_eq!(img.dimensions(), (200, 200));
        assert_eq!(*img.get_pixel(0, 0), WHITE);
        assert_eq!(*img.get_pixel(10, 100), BLACK);
        assert_eq!(*img.get_pixel(190, 50), BLACK);
        assert_eq!(*img.get_pixel(100, 115), BLUE);
        assert_eq!(*img.get_pixel(100, 60), WHITE);
    }

    #[test]
    fn test_generate_writes_jpeg() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/test.jpg");
        let bytes = generate_test_image(&path).unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), bytes);
        // JPEG SOI marker
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory(&bytes).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (200, 200));
        let band = decoded.get_pixel(100, 115);
        assert!(band[2] > 200 && band[0] < 60);
    }
}
