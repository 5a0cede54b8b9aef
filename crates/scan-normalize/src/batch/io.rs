//! Image codec access

use crate::types::*;
use image::{DynamicImage, ImageError, ImageFormat, ImageReader};
use std::io::Cursor;
use std::path::Path;

/// Decode an image, guessing the format from its content
pub fn read_image(path: impl AsRef<Path>) -> Result<DynamicImage> {
    let path = path.as_ref();
    let decode_error = |source: ImageError| ScanError::Decode {
        path: path.to_owned(),
        source,
    };

    ImageReader::open(path)
        .map_err(|e| decode_error(ImageError::IoError(e)))?
        .with_guessed_format()
        .map_err(|e| decode_error(ImageError::IoError(e)))?
        .decode()
        .map_err(decode_error)
}

/// Encode an image in memory, choosing the format from the file extension
pub fn encode_image(image: &DynamicImage, path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    let encode_error = |source: ImageError| ScanError::Encode {
        path: path.to_owned(),
        source,
    };

    let format = ImageFormat::from_path(path).map_err(encode_error)?;

    let mut bytes = Vec::new();
    let mut cursor = Cursor::new(&mut bytes);
    let written = match format {
        // JPEG has no alpha channel
        ImageFormat::Jpeg if image.color().has_alpha() => {
            DynamicImage::ImageRgb8(image.to_rgb8()).write_to(&mut cursor, format)
        }
        _ => image.write_to(&mut cursor, format),
    };
    written.map_err(encode_error)?;

    Ok(bytes)
}
