//! Pixel operations on a single buffer
//!
//! All operations return a new buffer of the same pixel type. Areas that
//! are not covered by source content are filled with the background.

use crate::types::Background;
use image::imageops::{self, FilterType};
use image::{ImageBuffer, Luma, LumaA, Pixel, Rgb, Rgba};

pub type Buffer<P> = ImageBuffer<P, Vec<u8>>;

/// Pixel types that can be filled with a background colour
pub trait FillPixel: Pixel<Subpixel = u8> + 'static {
    fn fill(background: Background) -> Self;
}

impl FillPixel for Luma<u8> {
    fn fill(background: Background) -> Self {
        Luma([background.luma()])
    }
}

impl FillPixel for LumaA<u8> {
    fn fill(background: Background) -> Self {
        LumaA([background.luma(), u8::MAX])
    }
}

impl FillPixel for Rgb<u8> {
    fn fill(background: Background) -> Self {
        Rgb([background.r, background.g, background.b])
    }
}

impl FillPixel for Rgba<u8> {
    fn fill(background: Background) -> Self {
        Rgba([background.r, background.g, background.b, u8::MAX])
    }
}

fn canvas<P: FillPixel>(width: u32, height: u32, background: Background) -> Buffer<P> {
    ImageBuffer::from_pixel(width, height, P::fill(background))
}

/// Translate content by `(dx, dy)` on a canvas of unchanged size.
///
/// Negative values move content up/left. Content pushed off the canvas is
/// lost.
pub fn shift<P: FillPixel>(image: &Buffer<P>, dx: i64, dy: i64, background: Background) -> Buffer<P> {
    let mut out = canvas(image.width(), image.height(), background);
    imageops::replace(&mut out, image, dx, dy);
    out
}

/// Crop or pad to `width` x `height`, keeping the content centred.
///
/// Each axis is handled independently: a larger source is cropped
/// symmetrically, a smaller one padded symmetrically.
pub fn crop_pad_centered<P: FillPixel>(
    image: &Buffer<P>,
    width: u32,
    height: u32,
    background: Background,
) -> Buffer<P> {
    if image.dimensions() == (width, height) {
        return image.clone();
    }
    let x = (width as i64 - image.width() as i64) / 2;
    let y = (height as i64 - image.height() as i64) / 2;
    let mut out = canvas(width, height, background);
    imageops::replace(&mut out, image, x, y);
    out
}

/// Largest size with the source aspect ratio that fits the target box
pub fn fit_dimensions(src_width: u32, src_height: u32, width: u32, height: u32) -> (u32, u32) {
    let scale_w = width as f64 / src_width as f64;
    let scale_h = height as f64 / src_height as f64;
    let scale = scale_w.min(scale_h);

    let fitted = |src: u32, bound: u32| ((src as f64 * scale).round() as u32).clamp(1, bound);
    (fitted(src_width, width), fitted(src_height, height))
}

/// Scale uniformly into the target box, then pad to the exact box size
pub fn fit<P: FillPixel>(
    image: &Buffer<P>,
    width: u32,
    height: u32,
    filter: FilterType,
    background: Background,
) -> Buffer<P> {
    let (w, h) = fit_dimensions(image.width(), image.height(), width, height);
    if (w, h) == image.dimensions() {
        return crop_pad_centered(image, width, height, background);
    }
    let scaled = imageops::resize(image, w, h, filter);
    crop_pad_centered(&scaled, width, height, background)
}

/// Scale each axis independently to the exact target size
pub fn stretch<P: FillPixel>(image: &Buffer<P>, width: u32, height: u32, filter: FilterType) -> Buffer<P> {
    if image.dimensions() == (width, height) {
        return image.clone();
    }
    imageops::resize(image, width, height, filter)
}

/// Place `pages` left to right on one canvas, each centred vertically
pub fn join_horizontal<P: FillPixel>(pages: &[Buffer<P>], background: Background) -> Buffer<P> {
    let width = pages.iter().map(|p| p.width()).sum();
    let height = pages.iter().map(|p| p.height()).max().unwrap_or(0);
    let mut out = canvas(width, height, background);

    let mut x = 0i64;
    for page in pages {
        let y = (height as i64 - page.height() as i64) / 2;
        imageops::replace(&mut out, page, x, y);
        x += page.width() as i64;
    }
    out
}
