//! Shared constants for sheet normalization
//!
//! This module centralizes magic numbers used by unit conversion,
//! geometry and the default filter pipeline.

// =============================================================================
// Unit Conversion
// =============================================================================

/// Millimeters per inch (1 inch = 25.4mm by definition)
pub const MM_PER_INCH: f64 = 25.4;

/// Centimeters per inch
pub const CM_PER_INCH: f64 = 2.54;

/// Resolution assumed for physical units when none is configured
pub const DEFAULT_DPI: u32 = 300;

/// Convert millimeters to inches
#[inline]
pub fn mm_to_in(mm: f64) -> f64 {
    mm / MM_PER_INCH
}

// =============================================================================
// Path Templates
// =============================================================================

/// Character that introduces a numbered placeholder such as `%03d`
pub const PLACEHOLDER_MARKER: char = '%';

// =============================================================================
// Filters
// =============================================================================

/// Largest dark cluster (in pixels) the noise filter removes
pub const DEFAULT_NOISE_INTENSITY: usize = 4;

/// Gray filter tile edge length (pixels)
pub const DEFAULT_GRAY_TILE: u32 = 50;

/// Gray filter tile step (pixels)
pub const DEFAULT_GRAY_STEP: u32 = 20;

/// Mean darkness below which a tile without black pixels is cleared
pub const DEFAULT_GRAY_THRESHOLD: f32 = 0.5;

/// Fraction of full darkness above which a pixel counts as black
pub const DEFAULT_BLACK_THRESHOLD: f32 = 0.33;

/// Fraction of full brightness above which a pixel counts as white
pub const DEFAULT_WHITE_THRESHOLD: f32 = 0.9;
