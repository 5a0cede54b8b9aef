//! Page buffers and the split/join steps around geometry
//!
//! A sheet is assembled from the logical pages of its input files, laid
//! out left to right, and later cut into equal-width strips, one per
//! output file.

use crate::geometry::{FillPixel, join_horizontal};
use crate::types::Background;
use image::{DynamicImage, ImageBuffer};

/// Where a page came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageOrigin {
    pub sheet: usize,
    /// Input file number, `None` for an inserted or replacing blank
    pub input_index: Option<usize>,
    /// Logical page within the sheet, starting at 0
    pub page: usize,
}

/// One logical page and its metadata.
///
/// Owned by exactly one stage at a time: the loader, the filter pipeline,
/// sheet assembly.
#[derive(Debug, Clone)]
pub struct PageBuffer {
    pub image: DynamicImage,
    pub origin: PageOrigin,
    pub dpi: u32,
}

impl PageBuffer {
    pub fn new(image: DynamicImage, origin: PageOrigin, dpi: u32) -> Self {
        Self { image, origin, dpi }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn channels(&self) -> u8 {
        self.image.color().channel_count()
    }

    pub fn bits_per_channel(&self) -> u16 {
        self.image.color().bits_per_pixel() / self.channels() as u16
    }
}

/// Left edges of `pages` equal-width strips across `width`, plus `width`.
///
/// With an odd width the rightmost strip gets the extra column.
pub fn strip_edges(width: u32, pages: usize) -> Vec<u32> {
    let n = pages.max(1) as u64;
    (0..=n).map(|i| (width as u64 * i / n) as u32).collect()
}

/// Cut `image` into `pages` equal-width strips, left to right
pub fn split_pages(image: DynamicImage, pages: usize) -> Vec<DynamicImage> {
    if pages <= 1 {
        return vec![image];
    }
    let height = image.height();
    strip_edges(image.width(), pages)
        .windows(2)
        .map(|edge| image.crop_imm(edge[0], 0, edge[1] - edge[0], height))
        .collect()
}

/// Blank page of the given size in the background colour
pub fn blank_page(width: u32, height: u32, background: Background) -> DynamicImage {
    if background.r == background.g && background.g == background.b {
        DynamicImage::ImageLuma8(ImageBuffer::from_pixel(
            width,
            height,
            FillPixel::fill(background),
        ))
    } else {
        DynamicImage::ImageRgb8(ImageBuffer::from_pixel(
            width,
            height,
            FillPixel::fill(background),
        ))
    }
}

/// Lay pages out left to right on one canvas.
///
/// A single page is returned as-is. Several pages are converted to their
/// common 8-bit format (gray, RGB, or RGBA when any page has alpha) and
/// centred vertically on a canvas as tall as the tallest page.
pub fn assemble_sheet(pages: Vec<PageBuffer>, background: Background) -> Option<DynamicImage> {
    let mut pages = pages;
    if pages.len() <= 1 {
        return pages.pop().map(|p| p.image);
    }

    let any_alpha = pages.iter().any(|p| p.image.color().has_alpha());
    let any_color = pages.iter().any(|p| p.image.color().has_color());

    let sheet = if any_alpha {
        let bufs: Vec<_> = pages.into_iter().map(|p| p.image.into_rgba8()).collect();
        DynamicImage::ImageRgba8(join_horizontal(&bufs, background))
    } else if any_color {
        let bufs: Vec<_> = pages.into_iter().map(|p| p.image.into_rgb8()).collect();
        DynamicImage::ImageRgb8(join_horizontal(&bufs, background))
    } else {
        let bufs: Vec<_> = pages.into_iter().map(|p| p.image.into_luma8()).collect();
        DynamicImage::ImageLuma8(join_horizontal(&bufs, background))
    };
    Some(sheet)
}

/// Cut a finished sheet into one image per output.
///
/// `page_edges` holds the left edge of every logical page on the assembled
/// sheet followed by its total width. Each output is a `(first_page,
/// page_count)` span. When geometry changed the sheet width the edges are
/// scaled to the new width.
pub fn split_outputs(
    sheet: DynamicImage,
    page_edges: &[u32],
    outputs: &[(usize, usize)],
) -> Vec<DynamicImage> {
    let pages = page_edges.len().saturating_sub(1);
    if let [(0, count)] = outputs
        && *count >= pages
    {
        return vec![sheet];
    }

    let (width, height) = (sheet.width(), sheet.height());
    let total = page_edges.last().copied().unwrap_or(0).max(1) as u64;
    let scale = |x: u32| (x as u64 * width as u64 / total) as u32;
    let edge = |page: usize| scale(page_edges.get(page.min(pages)).copied().unwrap_or(0));

    outputs
        .iter()
        .map(|&(first, count)| {
            let left = edge(first);
            let right = edge(first + count).max(left);
            sheet.crop_imm(left, 0, right - left, height)
        })
        .collect()
}
