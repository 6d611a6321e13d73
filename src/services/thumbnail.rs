//! Thumbnail generation.
//!
//! Decodes the payload, applies its EXIF orientation, shrinks it to fit a
//! bounding box and re-encodes it in the source format. Embedded metadata
//! (ICC profile and EXIF) is written into JPEG, PNG and WebP derivatives;
//! the EXIF orientation tag is reset since the pixels are already upright.

use std::io::Cursor;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageEncoder, ImageError, ImageFormat, ImageReader};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_THUMBNAIL_WIDTH: u32 = 250;
pub const DEFAULT_THUMBNAIL_HEIGHT: u32 = 250;

const JPEG_QUALITY: u8 = 85;

#[derive(Debug, Error)]
pub enum ThumbnailError {
    #[error("thumbnail bounds must be non-zero, got {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("unrecognized image format")]
    UnknownFormat,
    #[error(transparent)]
    Image(#[from] ImageError),
    #[error("failed to read image data: {0}")]
    Io(#[from] std::io::Error),
    #[error("thumbnail worker failed: {0}")]
    Worker(String),
}

/// Bounding box for generated thumbnails.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThumbnailSize {
    pub width: u32,
    pub height: u32,
}

impl Default for ThumbnailSize {
    fn default() -> Self {
        Self {
            width: DEFAULT_THUMBNAIL_WIDTH,
            height: DEFAULT_THUMBNAIL_HEIGHT,
        }
    }
}

/// An encoded thumbnail.
#[derive(Clone, Debug)]
pub struct Thumbnail {
    pub data: Bytes,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

/// Metadata chunks lifted from the source image.
#[derive(Debug)]
struct EmbeddedMetadata {
    icc_profile: Option<Vec<u8>>,
    exif: Option<Vec<u8>>,
}

impl EmbeddedMetadata {
    /// Hand the chunks to `encoder`; formats that cannot carry one drop it.
    fn attach(self, encoder: &mut impl ImageEncoder) {
        if let Some(profile) = self.icc_profile {
            if let Err(err) = encoder.set_icc_profile(profile) {
                debug!("dropping ICC profile: {}", err);
            }
        }
        if let Some(exif) = self.exif {
            if let Err(err) = encoder.set_exif_metadata(exif) {
                debug!("dropping EXIF metadata: {}", err);
            }
        }
    }
}

/// Produce a derivative of `data` that fits within `width` x `height`.
///
/// Aspect ratio is kept and images already inside the box are not upscaled.
pub fn generate_thumbnail(
    data: &[u8],
    width: u32,
    height: u32,
) -> Result<Thumbnail, ThumbnailError> {
    if width == 0 || height == 0 {
        return Err(ThumbnailError::InvalidDimensions { width, height });
    }

    let reader = ImageReader::new(Cursor::new(data)).with_guessed_format()?;
    let format = reader.format().ok_or(ThumbnailError::UnknownFormat)?;

    let mut decoder = reader.into_decoder()?;
    let orientation = decoder.orientation()?;
    let mut metadata = EmbeddedMetadata {
        icc_profile: decoder.icc_profile()?,
        exif: decoder.exif_metadata()?,
    };
    if let Some(chunk) = metadata.exif.as_mut() {
        // Pixels get rotated below; a stale tag would rotate them twice.
        let _ = Orientation::remove_from_exif_chunk(chunk);
    }

    let mut img = DynamicImage::from_decoder(decoder)?;
    img.apply_orientation(orientation);

    let resized = if img.width() > width || img.height() > height {
        img.thumbnail(width, height)
    } else {
        img
    };

    let encoded = encode(&resized, format, metadata)?;
    Ok(Thumbnail {
        data: Bytes::from(encoded),
        format,
        width: resized.width(),
        height: resized.height(),
    })
}

fn encode(
    img: &DynamicImage,
    format: ImageFormat,
    metadata: EmbeddedMetadata,
) -> Result<Vec<u8>, ThumbnailError> {
    let mut buf = Cursor::new(Vec::new());
    match format {
        ImageFormat::Jpeg => {
            let mut encoder = JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY);
            metadata.attach(&mut encoder);
            img.write_with_encoder(encoder)?;
        }
        ImageFormat::Png => {
            let mut encoder = PngEncoder::new(&mut buf);
            metadata.attach(&mut encoder);
            img.write_with_encoder(encoder)?;
        }
        ImageFormat::WebP => {
            let mut encoder = WebPEncoder::new_lossless(&mut buf);
            metadata.attach(&mut encoder);
            img.write_with_encoder(encoder)?;
        }
        other => img.write_to(&mut buf, other)?,
    }
    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn encoded_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let mut img = RgbImage::new(width, height);
        for pixel in img.pixels_mut() {
            *pixel = Rgb([40, 120, 200]);
        }
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut buf, format)
            .unwrap();
        buf.into_inner()
    }

    #[test]
    fn shrinks_to_fit_bounds() {
        let data = encoded_image(600, 400, ImageFormat::Png);
        let thumb = generate_thumbnail(&data, 250, 250).unwrap();
        assert_eq!(thumb.width, 250);
        assert!(thumb.height <= 250);
        assert!(thumb.height < thumb.width);
        assert_eq!(thumb.format, ImageFormat::Png);

        let decoded = image::load_from_memory(&thumb.data).unwrap();
        assert_eq!(decoded.width(), thumb.width);
        assert_eq!(decoded.height(), thumb.height);
    }

    #[test]
    fn keeps_jpeg_format() {
        let data = encoded_image(300, 900, ImageFormat::Jpeg);
        let thumb = generate_thumbnail(&data, 250, 250).unwrap();
        assert_eq!(thumb.format, ImageFormat::Jpeg);
        assert_eq!(thumb.height, 250);
        assert!(thumb.width < 250);
        assert_eq!(
            image::guess_format(&thumb.data).unwrap(),
            ImageFormat::Jpeg
        );
    }

    #[test]
    fn small_images_are_not_upscaled() {
        let data = encoded_image(100, 80, ImageFormat::Png);
        let thumb = generate_thumbnail(&data, 250, 250).unwrap();
        assert_eq!((thumb.width, thumb.height), (100, 80));
    }

    #[test]
    fn rejects_non_image_payload() {
        let err = generate_thumbnail(b"%PDF-1.7 definitely not a raster", 250, 250).unwrap_err();
        assert!(matches!(
            err,
            ThumbnailError::UnknownFormat | ThumbnailError::Image(_)
        ));
    }

    #[test]
    fn rejects_truncated_image() {
        let data = encoded_image(64, 64, ImageFormat::Png);
        let err = generate_thumbnail(&data[..data.len() / 3], 32, 32).unwrap_err();
        assert!(matches!(err, ThumbnailError::Image(_) | ThumbnailError::Io(_)));
    }

    #[test]
    fn rejects_zero_bounds() {
        let data = encoded_image(10, 10, ImageFormat::Png);
        let err = generate_thumbnail(&data, 0, 250).unwrap_err();
        assert!(matches!(
            err,
            ThumbnailError::InvalidDimensions { width: 0, height: 250 }
        ));
    }

    /// Minimal little-endian TIFF chunk: IFD0 with Make="ACM" and Orientation.
    fn exif_chunk(orientation: u16) -> Vec<u8> {
        let mut chunk = Vec::new();
        chunk.extend_from_slice(b"II");
        chunk.extend_from_slice(&42u16.to_le_bytes());
        chunk.extend_from_slice(&8u32.to_le_bytes());
        chunk.extend_from_slice(&2u16.to_le_bytes());
        // Make, ASCII, 4 bytes stored inline
        chunk.extend_from_slice(&0x010fu16.to_le_bytes());
        chunk.extend_from_slice(&2u16.to_le_bytes());
        chunk.extend_from_slice(&4u32.to_le_bytes());
        chunk.extend_from_slice(b"ACM\0");
        // Orientation, SHORT
        chunk.extend_from_slice(&0x0112u16.to_le_bytes());
        chunk.extend_from_slice(&3u16.to_le_bytes());
        chunk.extend_from_slice(&1u32.to_le_bytes());
        chunk.extend_from_slice(&orientation.to_le_bytes());
        chunk.extend_from_slice(&[0, 0]);
        chunk.extend_from_slice(&0u32.to_le_bytes());
        chunk
    }

    fn icc_profile() -> Vec<u8> {
        (0..=255u8).cycle().take(700).collect()
    }

    fn jpeg_with_metadata(
        width: u32,
        height: u32,
        icc: Option<Vec<u8>>,
        exif: Option<Vec<u8>>,
    ) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([90, 60, 30])));
        let mut buf = Cursor::new(Vec::new());
        let mut encoder = JpegEncoder::new_with_quality(&mut buf, 90);
        if let Some(profile) = icc {
            encoder.set_icc_profile(profile).unwrap();
        }
        if let Some(chunk) = exif {
            encoder.set_exif_metadata(chunk).unwrap();
        }
        img.write_with_encoder(encoder).unwrap();
        buf.into_inner()
    }

    fn read_metadata(data: &[u8]) -> (Option<Vec<u8>>, Option<Vec<u8>>) {
        let mut decoder = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .unwrap()
            .into_decoder()
            .unwrap();
        (
            decoder.icc_profile().unwrap(),
            decoder.exif_metadata().unwrap(),
        )
    }

    #[test]
    fn jpeg_keeps_icc_profile() {
        let data = jpeg_with_metadata(600, 400, Some(icc_profile()), None);
        let thumb = generate_thumbnail(&data, 250, 250).unwrap();
        let (icc, _) = read_metadata(&thumb.data);
        assert_eq!(icc, Some(icc_profile()));
    }

    #[test]
    fn png_keeps_icc_profile() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(400, 300, Rgb([1, 2, 3])));
        let mut buf = Cursor::new(Vec::new());
        let mut encoder = PngEncoder::new(&mut buf);
        encoder.set_icc_profile(icc_profile()).unwrap();
        img.write_with_encoder(encoder).unwrap();

        let thumb = generate_thumbnail(&buf.into_inner(), 250, 250).unwrap();
        assert_eq!(thumb.format, ImageFormat::Png);
        let (icc, _) = read_metadata(&thumb.data);
        assert_eq!(icc, Some(icc_profile()));
    }

    #[test]
    fn jpeg_keeps_exif_tags() {
        let data = jpeg_with_metadata(600, 400, None, Some(exif_chunk(1)));
        let thumb = generate_thumbnail(&data, 250, 250).unwrap();

        let (_, exif) = read_metadata(&thumb.data);
        let exif = exif.expect("thumbnail lost its EXIF chunk");
        assert!(exif.windows(3).any(|w| w == b"ACM"));
        assert_eq!(
            Orientation::from_exif_chunk(&exif),
            Some(Orientation::NoTransforms)
        );
    }

    #[test]
    fn applies_exif_orientation_and_resets_tag() {
        // Orientation 6: stored landscape, displayed rotated 90° clockwise.
        let data = jpeg_with_metadata(600, 400, None, Some(exif_chunk(6)));
        let thumb = generate_thumbnail(&data, 250, 250).unwrap();

        assert_eq!(thumb.height, 250);
        assert!((166..=167).contains(&thumb.width), "width {}", thumb.width);

        let (_, exif) = read_metadata(&thumb.data);
        assert_eq!(
            exif.as_deref().and_then(Orientation::from_exif_chunk),
            Some(Orientation::NoTransforms)
        );
    }
}
