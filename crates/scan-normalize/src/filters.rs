//! Per-page filter pipeline
//!
//! The batch driver hands every logical page to a [`PageFilter`] before the
//! sheet is assembled, unless filtering is disabled globally or for that
//! sheet.

use crate::options::FilterConfig;
use crate::raster::PageBuffer;
use crate::types::*;
use image::{GenericImage, GrayImage, Rgba};
use log::trace;

/// A pure transform of one page buffer
pub trait PageFilter: Send + Sync {
    fn apply(&self, page: PageBuffer, config: &FilterConfig) -> Result<PageBuffer>;
}

/// Leaves pages untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFilters;

impl PageFilter for NoFilters {
    fn apply(&self, page: PageBuffer, _config: &FilterConfig) -> Result<PageBuffer> {
        Ok(page)
    }
}

/// Noise filter followed by gray filter
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardFilters;

impl PageFilter for StandardFilters {
    fn apply(&self, page: PageBuffer, config: &FilterConfig) -> Result<PageBuffer> {
        if !config.noise_filter && !config.gray_filter {
            return Ok(page);
        }

        let mut page = page;
        let mut canvas = Canvas::new(&mut page, config);

        if config.noise_filter {
            let removed = canvas.noise_filter(config.noise_intensity);
            trace!(
                "Noise filter removed {} pixel(s) on sheet {} page {}",
                removed, canvas.sheet, canvas.page
            );
        }
        if config.gray_filter {
            let cleared = canvas.gray_filter(config.gray_tile, config.gray_step, config.gray_threshold);
            trace!(
                "Gray filter cleared {} tile(s) on sheet {} page {}",
                cleared, canvas.sheet, canvas.page
            );
        }

        Ok(page)
    }
}

/// Luminance view of a page that whitens pixels in both the view and the
/// underlying image
struct Canvas<'a> {
    image: &'a mut image::DynamicImage,
    luma: GrayImage,
    black_max: u8,
    white_from: u8,
    sheet: usize,
    page: usize,
}

impl<'a> Canvas<'a> {
    fn new(page: &'a mut PageBuffer, config: &FilterConfig) -> Self {
        let luma = page.image.to_luma8();
        Self {
            sheet: page.origin.sheet,
            page: page.origin.page,
            image: &mut page.image,
            luma,
            black_max: ((1.0 - config.black_threshold) * 255.0) as u8,
            white_from: (config.white_threshold * 255.0).round() as u8,
        }
    }

    fn is_white(&self, x: u32, y: u32) -> bool {
        self.luma.get_pixel(x, y)[0] >= self.white_from
    }

    fn is_black(&self, x: u32, y: u32) -> bool {
        self.luma.get_pixel(x, y)[0] <= self.black_max
    }

    fn whiten(&mut self, x: u32, y: u32) {
        self.luma.put_pixel(x, y, image::Luma([u8::MAX]));
        self.image.put_pixel(x, y, Rgba([u8::MAX, u8::MAX, u8::MAX, u8::MAX]));
    }

    /// Remove 8-connected clusters of non-white pixels no larger than
    /// `intensity`. Returns the number of pixels whitened.
    fn noise_filter(&mut self, intensity: usize) -> usize {
        let (width, height) = self.luma.dimensions();
        let mut visited = vec![false; width as usize * height as usize];
        let mut removed = 0;
        let mut cluster = Vec::with_capacity(intensity + 1);
        let mut stack = Vec::new();

        for y in 0..height {
            for x in 0..width {
                let idx = (y * width + x) as usize;
                if visited[idx] || self.is_white(x, y) {
                    continue;
                }

                cluster.clear();
                stack.clear();
                stack.push((x, y));
                visited[idx] = true;
                let mut overflow = false;

                while let Some((cx, cy)) = stack.pop() {
                    cluster.push((cx, cy));
                    if cluster.len() > intensity {
                        overflow = true;
                        break;
                    }
                    for (nx, ny) in neighbours(cx, cy, width, height) {
                        let nidx = (ny * width + nx) as usize;
                        if !visited[nidx] && !self.is_white(nx, ny) {
                            visited[nidx] = true;
                            stack.push((nx, ny));
                        }
                    }
                }

                if overflow {
                    // Finish marking the cluster so it is not walked again
                    while let Some((cx, cy)) = stack.pop() {
                        for (nx, ny) in neighbours(cx, cy, width, height) {
                            let nidx = (ny * width + nx) as usize;
                            if !visited[nidx] && !self.is_white(nx, ny) {
                                visited[nidx] = true;
                                stack.push((nx, ny));
                            }
                        }
                    }
                    continue;
                }

                for &(cx, cy) in &cluster {
                    self.whiten(cx, cy);
                }
                removed += cluster.len();
            }
        }
        removed
    }

    /// Whiten `tile`-sized areas, moved by `step`, that hold no black pixel
    /// and whose mean darkness is below `threshold`. Returns the number of
    /// tiles cleared.
    fn gray_filter(&mut self, tile: u32, step: u32, threshold: f32) -> usize {
        let (width, height) = self.luma.dimensions();
        let mut cleared = 0;

        let mut top = 0;
        while top < height {
            let bottom = (top + tile).min(height);
            let mut left = 0;
            while left < width {
                let right = (left + tile).min(width);

                let mut any_black = false;
                let mut darkness = 0u64;
                'scan: for y in top..bottom {
                    for x in left..right {
                        if self.is_black(x, y) {
                            any_black = true;
                            break 'scan;
                        }
                        darkness += (u8::MAX - self.luma.get_pixel(x, y)[0]) as u64;
                    }
                }

                if !any_black {
                    let area = ((right - left) * (bottom - top)) as f64;
                    let mean = darkness as f64 / (area * u8::MAX as f64);
                    if mean < threshold as f64 && darkness > 0 {
                        for y in top..bottom {
                            for x in left..right {
                                self.whiten(x, y);
                            }
                        }
                        cleared += 1;
                    }
                }

                left += step;
            }
            top += step;
        }
        cleared
    }
}

fn neighbours(x: u32, y: u32, width: u32, height: u32) -> impl Iterator<Item = (u32, u32)> {
    let (x, y) = (x as i64, y as i64);
    (-1..=1)
        .flat_map(move |dy| (-1..=1).map(move |dx| (x + dx, y + dy)))
        .filter(move |&(nx, ny)| {
            (nx, ny) != (x, y) && nx >= 0 && ny >= 0 && nx < width as i64 && ny < height as i64
        })
        .map(|(nx, ny)| (nx as u32, ny as u32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::PageOrigin;
    use image::{DynamicImage, ImageBuffer, Luma};

    fn page(image: GrayImage) -> PageBuffer {
        PageBuffer::new(
            DynamicImage::ImageLuma8(image),
            PageOrigin {
                sheet: 1,
                input_index: Some(1),
                page: 0,
            },
            300,
        )
    }

    fn noise_only() -> FilterConfig {
        FilterConfig {
            gray_filter: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_noise_filter_removes_specks() {
        let mut image: GrayImage = ImageBuffer::from_pixel(20, 20, Luma([255]));
        // 2x2 speck
        for (x, y) in [(2, 2), (3, 2), (2, 3), (3, 3)] {
            image.put_pixel(x, y, Luma([0]));
        }
        // 3x3 blob survives
        for y in 10..13 {
            for x in 10..13 {
                image.put_pixel(x, y, Luma([0]));
            }
        }

        let out = StandardFilters.apply(page(image), &noise_only()).unwrap();
        let out = out.image.as_luma8().unwrap();
        assert_eq!(out.get_pixel(2, 2)[0], 255);
        assert_eq!(out.get_pixel(3, 3)[0], 255);
        assert_eq!(out.get_pixel(11, 11)[0], 0);
    }

    #[test]
    fn test_gray_filter_clears_light_tiles() {
        let image: GrayImage = ImageBuffer::from_fn(100, 100, |x, _| {
            if x < 50 { Luma([230]) } else { Luma([0]) }
        });
        let config = FilterConfig {
            noise_filter: false,
            ..Default::default()
        };
        let out = StandardFilters.apply(page(image), &config).unwrap();
        let out = out.image.as_luma8().unwrap();
        // light gray area with no black pixel is cleared
        assert_eq!(out.get_pixel(5, 5)[0], 255);
        // black area untouched
        assert_eq!(out.get_pixel(80, 80)[0], 0);
    }

    #[test]
    fn test_gray_filter_keeps_dark_gray_text() {
        let mut image: GrayImage = ImageBuffer::from_pixel(60, 60, Luma([255]));
        for y in 20..30 {
            for x in 20..30 {
                image.put_pixel(x, y, Luma([120]));
            }
        }
        let config = FilterConfig {
            noise_filter: false,
            ..Default::default()
        };
        let out = StandardFilters.apply(page(image), &config).unwrap();
        let out = out.image.as_luma8().unwrap();
        assert_eq!(out.get_pixel(25, 25)[0], 120);
    }

    #[test]
    fn test_gray_filter_wipes_whole_tile() {
        // near-white pixels inside a cleared tile become pure white too
        let image: GrayImage = ImageBuffer::from_fn(50, 50, |x, _| {
            if x < 25 { Luma([200]) } else { Luma([240]) }
        });
        let config = FilterConfig {
            noise_filter: false,
            ..Default::default()
        };
        let out = StandardFilters.apply(page(image), &config).unwrap();
        let out = out.image.as_luma8().unwrap();
        assert_eq!(out.get_pixel(10, 10)[0], 255);
        assert_eq!(out.get_pixel(40, 40)[0], 255);
    }

    #[test]
    fn test_no_filters_is_identity() {
        let image: GrayImage = ImageBuffer::from_pixel(3, 3, Luma([7]));
        let out = NoFilters.apply(page(image.clone()), &FilterConfig::default()).unwrap();
        assert_eq!(out.image.as_luma8().unwrap(), &image);
    }
}
