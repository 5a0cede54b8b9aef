//! Sheet geometry normalization
//!
//! Resolves the user's geometry settings to pixels and applies them to a
//! sheet buffer in a fixed order:
//! pre-mirror, pre-shift, one sizing step (sheet-size, size or stretch),
//! post-mirror, post-shift, post-rotate.

mod ops;

pub use ops::*;

use crate::options::GeometryOptions;
use crate::types::*;
use image::DynamicImage;
use image::imageops::FilterType;
use log::debug;

/// Run a generic pixel operation on whichever 8-bit buffer `image` holds.
/// Deeper formats are converted to RGBA8 first.
macro_rules! map_pixels {
    ($image:expr, |$buf:ident| $body:expr) => {
        match $image {
            DynamicImage::ImageLuma8($buf) => DynamicImage::ImageLuma8($body),
            DynamicImage::ImageLumaA8($buf) => DynamicImage::ImageLumaA8($body),
            DynamicImage::ImageRgb8($buf) => DynamicImage::ImageRgb8($body),
            DynamicImage::ImageRgba8($buf) => DynamicImage::ImageRgba8($body),
            other => {
                let $buf = other.to_rgba8();
                DynamicImage::ImageRgba8($body)
            }
        }
    };
}

/// Sizing step, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeTarget {
    /// Crop or pad around the centre
    Crop { width: u32, height: u32 },
    /// Scale preserving aspect ratio, then pad
    Fit { width: u32, height: u32 },
    /// Scale each axis to the exact size
    Stretch { width: u32, height: u32 },
}

impl SizeTarget {
    pub fn dimensions(&self) -> (u32, u32) {
        match *self {
            SizeTarget::Crop { width, height }
            | SizeTarget::Fit { width, height }
            | SizeTarget::Stretch { width, height } => (width, height),
        }
    }
}

/// Geometry settings resolved to absolute pixels for one buffer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryDirective {
    pub pre_rotate: Rotation,
    pub pre_mirror: Option<Mirror>,
    pub pre_shift: Option<(i64, i64)>,
    pub target: Option<SizeTarget>,
    pub post_mirror: Option<Mirror>,
    pub post_shift: Option<(i64, i64)>,
    pub post_rotate: Rotation,
    pub background: Background,
    pub filter: FilterType,
}

impl GeometryDirective {
    /// Convert physical units at `dpi`.
    ///
    /// Fails when more than one sizing target is set or a target collapses
    /// to zero pixels.
    pub fn resolve(options: &GeometryOptions, dpi: u32, rounding: Rounding) -> Result<Self> {
        if options.target_count() > 1 {
            return Err(ScanError::Config(
                "Only one of sheet-size, size and stretch may be given".to_string(),
            ));
        }

        let target = if let Some(dims) = options.sheet_size {
            let (width, height) = dims.to_pixels(dpi, rounding)?;
            Some(SizeTarget::Crop { width, height })
        } else if let Some(dims) = options.size {
            let (width, height) = dims.to_pixels(dpi, rounding)?;
            Some(SizeTarget::Fit { width, height })
        } else if let Some(dims) = options.stretch {
            let (width, height) = dims.to_pixels(dpi, rounding)?;
            Some(SizeTarget::Stretch { width, height })
        } else {
            None
        };

        let shift = |offset: Option<crate::units::Offset>| {
            offset
                .map(|o| o.to_pixels(dpi, rounding))
                .filter(|&(dx, dy)| dx != 0 || dy != 0)
        };

        Ok(Self {
            pre_rotate: options.pre_rotate,
            pre_mirror: options.pre_mirror,
            pre_shift: shift(options.pre_shift),
            target,
            post_mirror: options.post_mirror,
            post_shift: shift(options.post_shift),
            post_rotate: options.post_rotate,
            background: options.background,
            filter: options.interpolation.filter(),
        })
    }

    /// True when the sheet-level steps leave a buffer untouched
    pub fn is_identity(&self) -> bool {
        self.pre_mirror.is_none()
            && self.pre_shift.is_none()
            && self.target.is_none()
            && self.post_mirror.is_none()
            && self.post_shift.is_none()
            && self.post_rotate == Rotation::None
    }

    /// Rotation applied to each input file as it is loaded
    pub fn apply_pre_rotate(&self, image: DynamicImage) -> DynamicImage {
        rotate(image, self.pre_rotate)
    }

    /// Apply the sheet-level steps in order
    pub fn apply(&self, image: DynamicImage) -> DynamicImage {
        if self.is_identity() {
            return image;
        }

        let mut image = image;
        let background = self.background;

        if let Some(direction) = self.pre_mirror {
            debug!("Pre-mirror {:?}", direction);
            image = mirror(image, direction);
        }
        if let Some((dx, dy)) = self.pre_shift {
            debug!("Pre-shift by ({}, {}) px", dx, dy);
            image = map_pixels!(image, |buf| shift(&buf, dx, dy, background));
        }

        if let Some(target) = self.target {
            debug!(
                "Sizing {}x{} -> {:?}",
                image.width(),
                image.height(),
                target
            );
            let filter = self.filter;
            image = match target {
                SizeTarget::Crop { width, height } => {
                    map_pixels!(image, |buf| crop_pad_centered(&buf, width, height, background))
                }
                SizeTarget::Fit { width, height } => {
                    map_pixels!(image, |buf| fit(&buf, width, height, filter, background))
                }
                SizeTarget::Stretch { width, height } => {
                    map_pixels!(image, |buf| stretch(&buf, width, height, filter))
                }
            };
        }

        if let Some(direction) = self.post_mirror {
            debug!("Post-mirror {:?}", direction);
            image = mirror(image, direction);
        }
        if let Some((dx, dy)) = self.post_shift {
            debug!("Post-shift by ({}, {}) px", dx, dy);
            image = map_pixels!(image, |buf| shift(&buf, dx, dy, background));
        }
        if self.post_rotate != Rotation::None {
            debug!("Post-rotate {} degrees", self.post_rotate.degrees());
            image = rotate(image, self.post_rotate);
        }

        image
    }
}

pub fn mirror(image: DynamicImage, direction: Mirror) -> DynamicImage {
    match direction {
        Mirror::Horizontal => image.fliph(),
        Mirror::Vertical => image.flipv(),
        Mirror::Both => image.rotate180(),
    }
}

pub fn rotate(image: DynamicImage, rotation: Rotation) -> DynamicImage {
    match rotation {
        Rotation::None => image,
        Rotation::Clockwise90 => image.rotate90(),
        Rotation::Clockwise180 => image.rotate180(),
        Rotation::Clockwise270 => image.rotate270(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{Dimensions, Length, Offset};

    #[test]
    fn test_zero_shift_is_identity() {
        let options = GeometryOptions {
            pre_shift: Some(Offset::new(Length::ZERO, Length::ZERO)),
            ..Default::default()
        };
        let directive = GeometryDirective::resolve(&options, 300, Rounding::HalfUp).unwrap();
        assert!(directive.is_identity());
    }

    #[test]
    fn test_two_targets_rejected() {
        let size = Dimensions::new(Length::cm(10.0), Length::cm(10.0));
        let options = GeometryOptions {
            size: Some(size),
            stretch: Some(size),
            ..Default::default()
        };
        assert!(matches!(
            GeometryDirective::resolve(&options, 300, Rounding::HalfUp),
            Err(ScanError::Config(_))
        ));
    }

    #[test]
    fn test_sixteen_bit_is_converted() {
        let image = DynamicImage::new_rgb16(4, 4);
        let options = GeometryOptions {
            sheet_size: Some(Dimensions::new(Length::px(2.0), Length::px(2.0))),
            ..Default::default()
        };
        let directive = GeometryDirective::resolve(&options, 300, Rounding::HalfUp).unwrap();
        let out = directive.apply(image);
        assert!(matches!(out, DynamicImage::ImageRgba8(_)));
        assert_eq!((out.width(), out.height()), (2, 2));
    }
}
