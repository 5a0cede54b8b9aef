//! Physical lengths and their conversion to pixels
//!
//! Sizes and offsets are kept in the unit the user typed them in and are
//! only resolved to pixels once the resolution of the page is known.

use crate::constants::{CM_PER_INCH, MM_PER_INCH, mm_to_in};
use crate::types::*;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Unit attached to a length value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Unit {
    /// Device pixels, never scaled by dpi
    #[default]
    Px,
    Mm,
    Cm,
    In,
}

impl Unit {
    fn suffix(self) -> &'static str {
        match self {
            Unit::Px => "",
            Unit::Mm => "mm",
            Unit::Cm => "cm",
            Unit::In => "in",
        }
    }
}

/// A single length, e.g. `20cm`, `-1.5in` or `300`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Length {
    pub value: f64,
    pub unit: Unit,
}

impl Length {
    pub const ZERO: Length = Length::px(0.0);

    pub const fn px(value: f64) -> Self {
        Self {
            value,
            unit: Unit::Px,
        }
    }

    pub const fn mm(value: f64) -> Self {
        Self {
            value,
            unit: Unit::Mm,
        }
    }

    pub const fn cm(value: f64) -> Self {
        Self {
            value,
            unit: Unit::Cm,
        }
    }

    pub const fn inches(value: f64) -> Self {
        Self {
            value,
            unit: Unit::In,
        }
    }

    /// Resolve to pixels at `dpi`, rounding with `rounding`
    pub fn to_pixels(&self, dpi: u32, rounding: Rounding) -> i64 {
        let dpi = dpi as f64;
        let exact = match self.unit {
            Unit::Px => self.value,
            Unit::Mm => self.value / MM_PER_INCH * dpi,
            Unit::Cm => self.value / CM_PER_INCH * dpi,
            Unit::In => self.value * dpi,
        };
        rounding.apply(exact)
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.suffix())
    }
}

impl FromStr for Length {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let split = trimmed
            .find(|c: char| c.is_ascii_alphabetic())
            .unwrap_or(trimmed.len());
        let (number, suffix) = trimmed.split_at(split);

        let value: f64 = number
            .parse()
            .map_err(|_| ScanError::Config(format!("Unable to parse dimension '{}'", s)))?;
        if !value.is_finite() {
            return Err(ScanError::Config(format!("Dimension '{}' is not finite", s)));
        }

        let unit = match suffix.to_ascii_lowercase().as_str() {
            "" | "px" => Unit::Px,
            "mm" => Unit::Mm,
            "cm" => Unit::Cm,
            "in" => Unit::In,
            other => {
                return Err(ScanError::Config(format!(
                    "Unable to parse dimension '{}': unknown unit '{}'",
                    s, other
                )));
            }
        };
        Ok(Length { value, unit })
    }
}

/// Parse `A` or `A,B`; a single value is used for both components
fn parse_pair(s: &str) -> Result<(Length, Length)> {
    match s.split_once(',') {
        Some((first, second)) => Ok((first.parse()?, second.parse()?)),
        None => {
            let value: Length = s.parse()?;
            Ok((value, value))
        }
    }
}

/// Width and height target
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dimensions {
    pub width: Length,
    pub height: Length,
}

impl Dimensions {
    pub fn new(width: Length, height: Length) -> Self {
        Self { width, height }
    }

    /// Parse a size, looking up named sizes in `presets` first
    pub fn parse_with(s: &str, presets: &SizePresets) -> Result<Self> {
        if let Some(named) = presets.get(s) {
            return Ok(named);
        }
        if !s.chars().any(|c| c.is_ascii_digit()) {
            let known: Vec<&str> = presets.names().collect();
            return Err(ScanError::Config(format!(
                "Unknown size '{}'; expected W,H or one of: {}",
                s.trim(),
                known.join(", ")
            )));
        }
        let (width, height) = parse_pair(s)?;
        Ok(Self { width, height })
    }

    /// Resolve to `(width, height)` in pixels.
    ///
    /// A size that rounds to zero or below is a configuration error.
    pub fn to_pixels(&self, dpi: u32, rounding: Rounding) -> Result<(u32, u32)> {
        let w = self.width.to_pixels(dpi, rounding);
        let h = self.height.to_pixels(dpi, rounding);
        if w <= 0 || h <= 0 || w > u32::MAX as i64 || h > u32::MAX as i64 {
            return Err(ScanError::Config(format!(
                "Size {}x{} resolves to {}x{} pixels at {} dpi",
                self.width, self.height, w, h, dpi
            )));
        }
        Ok((w as u32, h as u32))
    }
}

impl FromStr for Dimensions {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self> {
        Dimensions::parse_with(s, &SizePresets::standard())
    }
}

/// Horizontal and vertical displacement
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Offset {
    pub dx: Length,
    pub dy: Length,
}

impl Offset {
    pub fn new(dx: Length, dy: Length) -> Self {
        Self { dx, dy }
    }

    pub fn to_pixels(&self, dpi: u32, rounding: Rounding) -> (i64, i64) {
        (
            self.dx.to_pixels(dpi, rounding),
            self.dy.to_pixels(dpi, rounding),
        )
    }
}

impl FromStr for Offset {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self> {
        let (dx, dy) = parse_pair(s)?;
        Ok(Self { dx, dy })
    }
}

/// Named sizes accepted wherever a size is expected.
///
/// Starts out with the standard paper sizes and their `-landscape`
/// variants; callers may add their own.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SizePresets {
    /// Lowercase name -> size in the unit it was defined in
    entries: BTreeMap<String, Dimensions>,
}

impl Default for SizePresets {
    fn default() -> Self {
        Self::standard()
    }
}

impl SizePresets {
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// ISO A0-A10 in mm, letter, legal and tabloid in inches, portrait and
    /// landscape
    pub fn standard() -> Self {
        let mut presets = Self::empty();
        for paper in PaperSize::ALL {
            for orientation in [Orientation::Portrait, Orientation::Landscape] {
                let (w, h) = paper.dimensions_with_orientation(orientation);
                let size = if paper.is_imperial() {
                    let inches = |mm: f64| (mm_to_in(mm) * 100.0).round() / 100.0;
                    Dimensions::new(Length::inches(inches(w)), Length::inches(inches(h)))
                } else {
                    Dimensions::new(Length::mm(w), Length::mm(h))
                };
                let name = match orientation {
                    Orientation::Portrait => paper.name().to_string(),
                    Orientation::Landscape => format!("{}-landscape", paper.name()),
                };
                presets.entries.insert(name, size);
            }
        }
        presets
    }

    /// Add or replace a named size
    pub fn insert(&mut self, name: &str, size: Dimensions) -> Result<()> {
        if size.width.unit == Unit::Px || size.height.unit == Unit::Px {
            return Err(ScanError::Config(format!(
                "Preset '{}' must use physical units (mm, cm or in)",
                name
            )));
        }
        self.entries.insert(name.to_ascii_lowercase(), size);
        Ok(())
    }

    /// Parse `NAME=W,H` and add it
    pub fn insert_spec(&mut self, spec: &str) -> Result<()> {
        let (name, size) = spec.split_once('=').ok_or_else(|| {
            ScanError::Config(format!("Preset '{}' must look like NAME=W,H", spec))
        })?;
        let name = name.trim();
        if name.is_empty() {
            return Err(ScanError::Config(format!("Preset '{}' has no name", spec)));
        }
        let (width, height) = parse_pair(size)?;
        self.insert(name, Dimensions::new(width, height))
    }

    pub fn get(&self, name: &str) -> Option<Dimensions> {
        self.entries.get(&name.trim().to_ascii_lowercase()).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}
