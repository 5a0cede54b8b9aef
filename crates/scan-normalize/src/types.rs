use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Invalid selector '{input}': {reason}")]
    Selector { input: String, reason: String },
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Sheet {sheet}: incomplete input group, found {found} of {expected} files")]
    IncompleteGroup {
        sheet: usize,
        found: usize,
        expected: usize,
    },
    #[error("Sheet {sheet}: input file {} does not exist", path.display())]
    MissingInput { sheet: usize, path: PathBuf },
    #[error("Sheet {sheet}: output file {} already exists, use --overwrite to replace it", path.display())]
    DestinationExists { sheet: usize, path: PathBuf },
    #[error("Failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("Failed to encode {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Sheet {sheet}: {source}")]
    Sheet {
        sheet: usize,
        source: Box<ScanError>,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
    #[error("No sheets to process")]
    EmptyPlan,
}

impl ScanError {
    /// Attach the sheet number to an error raised while processing that sheet.
    ///
    /// Errors that already name their sheet are returned unchanged.
    pub fn at_sheet(self, sheet: usize) -> Self {
        match self {
            ScanError::IncompleteGroup { .. }
            | ScanError::MissingInput { .. }
            | ScanError::DestinationExists { .. }
            | ScanError::Sheet { .. } => self,
            other => ScanError::Sheet {
                sheet,
                source: Box::new(other),
            },
        }
    }

    /// The innermost error, looking through sheet context.
    pub fn root(&self) -> &ScanError {
        match self {
            ScanError::Sheet { source, .. } => source.root(),
            other => other,
        }
    }

    pub(crate) fn selector(input: &str, reason: impl Into<String>) -> Self {
        ScanError::Selector {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;

/// How many logical pages one physical input file holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Layout {
    /// One page per file
    #[default]
    Single,
    /// Two pages side by side (an open book)
    Double,
}

impl Layout {
    pub fn pages_per_file(self) -> usize {
        match self {
            Layout::Single => 1,
            Layout::Double => 2,
        }
    }
}

impl FromStr for Layout {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "single" => Ok(Layout::Single),
            "double" => Ok(Layout::Double),
            _ => Err(ScanError::Config(format!(
                "Unknown layout '{}', expected 'single' or 'double'",
                s
            ))),
        }
    }
}

/// Fill colour used for padding and exposed areas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Background {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Default for Background {
    fn default() -> Self {
        Self::WHITE
    }
}

impl Background {
    pub const WHITE: Background = Background::rgb(255, 255, 255);
    pub const BLACK: Background = Background::rgb(0, 0, 0);
    pub const GRAY: Background = Background::rgb(128, 128, 128);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Rec. 601 luma, used when filling grayscale buffers
    pub fn luma(self) -> u8 {
        let y = 0.299 * self.r as f32 + 0.587 * self.g as f32 + 0.114 * self.b as f32;
        y.round().clamp(0.0, 255.0) as u8
    }
}

impl FromStr for Background {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self> {
        let bad = || ScanError::Config(format!("Cannot parse colour '{}'", s));
        match s.to_ascii_lowercase().as_str() {
            "white" => return Ok(Background::WHITE),
            "black" => return Ok(Background::BLACK),
            "gray" | "grey" => return Ok(Background::GRAY),
            _ => {}
        }

        let hex = s.strip_prefix('#').ok_or_else(bad)?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(bad());
        }
        let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| bad());
        match hex.len() {
            6 => Ok(Background::rgb(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            3 => {
                // #rgb expands each digit: #f80 == #ff8800
                let expand = |i: usize| channel(&hex[i..i + 1]).map(|v| v * 17);
                Ok(Background::rgb(expand(0)?, expand(1)?, expand(2)?))
            }
            _ => Err(bad()),
        }
    }
}

/// Rounding rule for physical-unit to pixel conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Rounding {
    /// Round half away from zero (2.5 -> 3, -2.5 -> -3)
    #[default]
    HalfUp,
    /// Banker's rounding (2.5 -> 2, 3.5 -> 4)
    HalfEven,
    /// Drop the fractional part
    Truncate,
}

impl Rounding {
    pub fn apply(self, value: f64) -> i64 {
        match self {
            Rounding::HalfUp => value.round() as i64,
            Rounding::HalfEven => value.round_ties_even() as i64,
            Rounding::Truncate => value.trunc() as i64,
        }
    }
}

impl FromStr for Rounding {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "half-up" | "halfup" => Ok(Rounding::HalfUp),
            "half-even" | "halfeven" => Ok(Rounding::HalfEven),
            "truncate" => Ok(Rounding::Truncate),
            _ => Err(ScanError::Config(format!("Unknown rounding mode '{}'", s))),
        }
    }
}

/// Resampling used by fit and stretch scaling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Interpolation {
    Nearest,
    Linear,
    #[default]
    Cubic,
}

impl Interpolation {
    pub fn filter(self) -> image::imageops::FilterType {
        use image::imageops::FilterType;
        match self {
            Interpolation::Nearest => FilterType::Nearest,
            Interpolation::Linear => FilterType::Triangle,
            Interpolation::Cubic => FilterType::CatmullRom,
        }
    }
}

/// Mirror axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Mirror {
    /// Flip left/right
    Horizontal,
    /// Flip top/bottom
    Vertical,
    Both,
}

impl FromStr for Mirror {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "h" | "horizontal" => Ok(Mirror::Horizontal),
            "v" | "vertical" => Ok(Mirror::Vertical),
            "hv" | "vh" | "both" => Ok(Mirror::Both),
            _ => Err(ScanError::Config(format!(
                "Unknown mirror direction '{}', expected 'h', 'v' or 'hv'",
                s
            ))),
        }
    }
}

/// Rotation for pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Rotation {
    #[default]
    None,
    Clockwise90,
    Clockwise180,
    Clockwise270,
}

impl Rotation {
    pub fn degrees(self) -> i32 {
        match self {
            Rotation::None => 0,
            Rotation::Clockwise90 => 90,
            Rotation::Clockwise180 => 180,
            Rotation::Clockwise270 => 270,
        }
    }

    /// Accepts any multiple of 90, negative values rotate anticlockwise
    pub fn from_degrees(degrees: i32) -> Result<Self> {
        match degrees.rem_euclid(360) {
            0 => Ok(Rotation::None),
            90 => Ok(Rotation::Clockwise90),
            180 => Ok(Rotation::Clockwise180),
            270 => Ok(Rotation::Clockwise270),
            _ => Err(ScanError::Config(format!(
                "Rotation must be a multiple of 90 degrees, got {}",
                degrees
            ))),
        }
    }
}

/// Paper orientation
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Orientation {
    /// Portrait: height > width (default for most paper sizes)
    #[default]
    Portrait,
    /// Landscape: width > height
    Landscape,
}

/// Standard paper sizes
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PaperSize {
    A0,
    A1,
    A2,
    A3,
    A4,
    A5,
    A6,
    A7,
    A8,
    A9,
    A10,
    Letter,
    Legal,
    Tabloid,
}

impl PaperSize {
    pub const ALL: [PaperSize; 14] = [
        PaperSize::A0,
        PaperSize::A1,
        PaperSize::A2,
        PaperSize::A3,
        PaperSize::A4,
        PaperSize::A5,
        PaperSize::A6,
        PaperSize::A7,
        PaperSize::A8,
        PaperSize::A9,
        PaperSize::A10,
        PaperSize::Letter,
        PaperSize::Legal,
        PaperSize::Tabloid,
    ];

    /// Get base dimensions (always portrait: width < height)
    pub fn dimensions_mm(self) -> (f64, f64) {
        match self {
            PaperSize::A0 => (841.0, 1189.0),
            PaperSize::A1 => (594.0, 841.0),
            PaperSize::A2 => (420.0, 594.0),
            PaperSize::A3 => (297.0, 420.0),
            PaperSize::A4 => (210.0, 297.0),
            PaperSize::A5 => (148.0, 210.0),
            PaperSize::A6 => (105.0, 148.0),
            PaperSize::A7 => (74.0, 105.0),
            PaperSize::A8 => (52.0, 74.0),
            PaperSize::A9 => (37.0, 52.0),
            PaperSize::A10 => (26.0, 37.0),
            PaperSize::Letter => (215.9, 279.4),
            PaperSize::Legal => (215.9, 355.6),
            PaperSize::Tabloid => (279.4, 431.8),
        }
    }

    /// Get dimensions with orientation applied
    pub fn dimensions_with_orientation(self, orientation: Orientation) -> (f64, f64) {
        let (w, h) = self.dimensions_mm();
        match orientation {
            Orientation::Portrait => (w, h),
            Orientation::Landscape => (h, w),
        }
    }

    /// US sizes, defined in whole and half inches
    pub fn is_imperial(self) -> bool {
        matches!(self, PaperSize::Letter | PaperSize::Legal | PaperSize::Tabloid)
    }

    /// Lowercase preset keyword, e.g. `a4` or `letter`
    pub fn name(self) -> &'static str {
        match self {
            PaperSize::A0 => "a0",
            PaperSize::A1 => "a1",
            PaperSize::A2 => "a2",
            PaperSize::A3 => "a3",
            PaperSize::A4 => "a4",
            PaperSize::A5 => "a5",
            PaperSize::A6 => "a6",
            PaperSize::A7 => "a7",
            PaperSize::A8 => "a8",
            PaperSize::A9 => "a9",
            PaperSize::A10 => "a10",
            PaperSize::Letter => "letter",
            PaperSize::Legal => "legal",
            PaperSize::Tabloid => "tabloid",
        }
    }
}
