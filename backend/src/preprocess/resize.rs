use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::path::Path;

pub const DEFAULT_MAX_DIMENSIONS: (u32, u32) = (1024, 1024);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeOutcome {
    Unchanged { width: u32, height: u32 },
    Resized { from: (u32, u32), to: (u32, u32) },
    /// The file could not be read or rewritten and was left as it was.
    Failed,
}

#[derive(Debug, thiserror::Error)]
enum ResizeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Unrecognized image format")]
    UnknownFormat,
}

/// Downsamples the image at `path` in place when either side exceeds
/// `max_dimensions`, keeping the aspect ratio. Never fails: problems are
/// logged and the original file is kept.
pub fn resize_if_needed(path: &Path, max_dimensions: (u32, u32)) -> ResizeOutcome {
    match try_resize(path, max_dimensions) {
        Ok(outcome) => {
            if let ResizeOutcome::Resized { to, .. } = outcome {
                log::info!("Image {} resized to {}x{}", path.display(), to.0, to.1);
            }
            outcome
        }
        Err(e) => {
            log::error!("Error resizing image {}: {}", path.display(), e);
            ResizeOutcome::Failed
        }
    }
}

fn try_resize(path: &Path, (max_width, max_height): (u32, u32)) -> Result<ResizeOutcome, ResizeError> {
    let reader = ImageReader::open(path)?.with_guessed_format()?;
    let format = reader.format().ok_or(ResizeError::UnknownFormat)?;
    let img = reader.decode()?;
    let (width, height) = (img.width(), img.height());

    if width <= max_width && height <= max_height {
        return Ok(ResizeOutcome::Unchanged { width, height });
    }

    let resized = img.resize(max_width, max_height, FilterType::Lanczos3);
    let to = (resized.width(), resized.height());

    // JPEG has no alpha channel.
    let resized = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(resized.to_rgb8()),
        _ => resized,
    };

    // Encode fully before touching the file so a failed encode leaves it intact.
    let mut encoded = std::io::Cursor::new(Vec::new());
    resized.write_to(&mut encoded, format)?;
    std::fs::write(path, encoded.into_inner())?;

    Ok(ResizeOutcome::Resized {
        from: (width, height),
        to,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::path::PathBuf;

    fn scratch_file(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("resize-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    fn write_image(path: &Path, width: u32, height: u32) {
        RgbImage::from_pixel(width, height, Rgb([120, 80, 40]))
            .save(path)
            .unwrap();
    }

    fn dimensions(path: &Path) -> (u32, u32) {
        image::image_dimensions(path).unwrap()
    }

    #[test]
    fn downsamples_landscape_image_preserving_aspect_ratio() {
        let path = scratch_file("photo_b.png");
        write_image(&path, 2000, 1500);

        let outcome = resize_if_needed(&path, DEFAULT_MAX_DIMENSIONS);

        assert_eq!(
            outcome,
            ResizeOutcome::Resized {
                from: (2000, 1500),
                to: (1024, 768)
            }
        );
        assert_eq!(dimensions(&path), (1024, 768));
    }

    #[test]
    fn leaves_small_images_alone() {
        let path = scratch_file("photo_a.png");
        write_image(&path, 800, 600);
        let before = std::fs::read(&path).unwrap();

        let outcome = resize_if_needed(&path, DEFAULT_MAX_DIMENSIONS);

        assert_eq!(outcome, ResizeOutcome::Unchanged { width: 800, height: 600 });
        assert_eq!(std::fs::read(&path).unwrap(), before);
    }

    #[test]
    fn second_pass_is_a_no_op() {
        let path = scratch_file("tall.jpg");
        write_image(&path, 900, 3000);

        resize_if_needed(&path, DEFAULT_MAX_DIMENSIONS);
        let once = dimensions(&path);
        let outcome = resize_if_needed(&path, DEFAULT_MAX_DIMENSIONS);

        assert!(once.0 <= 1024 && once.1 <= 1024);
        assert_eq!(once.1, 1024);
        assert!(matches!(outcome, ResizeOutcome::Unchanged { .. }));
        assert_eq!(dimensions(&path), once);
    }

    #[test]
    fn unreadable_file_is_left_untouched() {
        let path = scratch_file("broken.png");
        std::fs::write(&path, b"definitely not a png").unwrap();

        let outcome = resize_if_needed(&path, DEFAULT_MAX_DIMENSIONS);

        assert_eq!(outcome, ResizeOutcome::Failed);
        assert_eq!(std::fs::read(&path).unwrap(), b"definitely not a png");
    }
}
