use crate::constants::*;
use crate::geometry::GeometryDirective;
use crate::selector::MultiIndex;
use crate::types::*;
use crate::units::{Dimensions, Offset, SizePresets};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Sheet-level geometry settings, in the units the user gave them
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GeometryOptions {
    // Sizing targets, at most one may be set
    pub sheet_size: Option<Dimensions>,
    pub size: Option<Dimensions>,
    pub stretch: Option<Dimensions>,

    // Displacement
    pub pre_shift: Option<Offset>,
    pub post_shift: Option<Offset>,

    // Orientation
    pub pre_rotate: Rotation,
    pub post_rotate: Rotation,
    pub pre_mirror: Option<Mirror>,
    pub post_mirror: Option<Mirror>,

    pub background: Background,
    pub interpolation: Interpolation,
}

impl GeometryOptions {
    pub(crate) fn target_count(&self) -> usize {
        [&self.sheet_size, &self.size, &self.stretch]
            .iter()
            .filter(|t| t.is_some())
            .count()
    }
}

/// Settings for the default page filter pipeline
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FilterConfig {
    pub noise_filter: bool,
    pub gray_filter: bool,
    pub noise_intensity: usize,
    pub gray_tile: u32,
    pub gray_step: u32,
    pub gray_threshold: f32,
    pub black_threshold: f32,
    pub white_threshold: f32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            noise_filter: true,
            gray_filter: true,
            noise_intensity: DEFAULT_NOISE_INTENSITY,
            gray_tile: DEFAULT_GRAY_TILE,
            gray_step: DEFAULT_GRAY_STEP,
            gray_threshold: DEFAULT_GRAY_THRESHOLD,
            black_threshold: DEFAULT_BLACK_THRESHOLD,
            white_threshold: DEFAULT_WHITE_THRESHOLD,
        }
    }
}

/// Complete configuration for one run
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SheetSpec {
    // Page arithmetic
    pub layout: Layout,
    pub input_pages: usize,
    pub output_pages: usize,

    // Sheet range
    pub start_sheet: usize,
    pub end_sheet: Option<usize>,
    pub start_input: Option<usize>,
    pub start_output: Option<usize>,

    // Per-sheet selectors
    pub sheets: Option<MultiIndex>,
    pub exclude: Option<MultiIndex>,
    pub no_processing: Option<MultiIndex>,

    // Per-position selectors
    pub insert_blank: Option<MultiIndex>,
    pub replace_blank: Option<MultiIndex>,

    pub geometry: GeometryOptions,

    // Filtering
    pub filters_enabled: bool,
    pub filters: FilterConfig,

    // Output
    pub overwrite: bool,

    // Unit resolution
    pub dpi: u32,
    pub rounding: Rounding,
    pub presets: SizePresets,
}

impl Default for SheetSpec {
    fn default() -> Self {
        Self {
            layout: Layout::Single,
            input_pages: 1,
            output_pages: 1,
            start_sheet: 1,
            end_sheet: None,
            start_input: None,
            start_output: None,
            sheets: None,
            exclude: None,
            no_processing: None,
            insert_blank: None,
            replace_blank: None,
            geometry: GeometryOptions::default(),
            filters_enabled: true,
            filters: FilterConfig::default(),
            overwrite: false,
            dpi: DEFAULT_DPI,
            rounding: Rounding::HalfUp,
            presets: SizePresets::standard(),
        }
    }
}

impl SheetSpec {
    /// Load options from JSON file
    #[cfg(feature = "serde")]
    pub async fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let spec = serde_json::from_slice(&bytes)
            .map_err(|e| ScanError::Config(format!("Failed to parse config: {}", e)))?;
        Ok(spec)
    }

    /// Save options to JSON file
    #[cfg(feature = "serde")]
    pub async fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ScanError::Config(format!("Failed to serialize config: {}", e)))?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    /// Logical pages assembled into one sheet
    pub fn pages_per_sheet(&self) -> usize {
        self.input_pages * self.layout.pages_per_file()
    }

    /// Logical pages written into each output file
    pub fn pages_per_output(&self) -> usize {
        self.pages_per_sheet() / self.output_pages.max(1)
    }

    /// Parse a size argument against this spec's presets
    pub fn parse_size(&self, s: &str) -> Result<Dimensions> {
        Dimensions::parse_with(s, &self.presets)
    }

    /// Whether `sheet` is materialized at all
    pub fn is_selected(&self, sheet: usize) -> bool {
        let wanted = self.sheets.as_ref().is_none_or(|s| s.contains(sheet));
        let excluded = self.exclude.as_ref().is_some_and(|s| s.contains(sheet));
        wanted && !excluded
    }

    /// Whether the filter pipeline runs for `sheet`
    pub fn filters_for(&self, sheet: usize) -> bool {
        self.filters_enabled
            && !self
                .no_processing
                .as_ref()
                .is_some_and(|s| s.contains(sheet))
    }

    /// Resolve geometry settings to pixels at this spec's dpi
    pub fn directive(&self) -> Result<GeometryDirective> {
        GeometryDirective::resolve(&self.geometry, self.dpi, self.rounding)
    }

    /// Validate the options
    pub fn validate(&self) -> Result<()> {
        if self.input_pages == 0 {
            return Err(ScanError::Config(
                "Input pages per sheet must be at least 1".to_string(),
            ));
        }
        if self.output_pages == 0 {
            return Err(ScanError::Config(
                "Output pages per sheet must be at least 1".to_string(),
            ));
        }

        let pages = self.pages_per_sheet();
        if self.output_pages > pages || pages % self.output_pages != 0 {
            return Err(ScanError::Config(format!(
                "Cannot distribute {} page(s) per sheet ({} layout, {} input file(s)) across {} output file(s)",
                pages,
                match self.layout {
                    Layout::Single => "single",
                    Layout::Double => "double",
                },
                self.input_pages,
                self.output_pages
            )));
        }

        if self.start_sheet == 0 {
            return Err(ScanError::Config(
                "Sheet numbering starts at 1".to_string(),
            ));
        }
        if let Some(end) = self.end_sheet
            && end < self.start_sheet
        {
            return Err(ScanError::Config(format!(
                "End sheet {} is before start sheet {}",
                end, self.start_sheet
            )));
        }
        if self.start_input == Some(0) || self.start_output == Some(0) {
            return Err(ScanError::Config(
                "File numbering starts at 1".to_string(),
            ));
        }

        if let (Some(insert), Some(replace)) = (&self.insert_blank, &self.replace_blank)
            && let Some(both) = insert.first_common(replace)
        {
            return Err(ScanError::Config(format!(
                "Position {} is both inserted and replaced as blank",
                both
            )));
        }

        if self.dpi == 0 {
            return Err(ScanError::Config("DPI must be greater than 0".to_string()));
        }

        if self.geometry.target_count() > 1 {
            return Err(ScanError::Config(
                "Only one of sheet-size, size and stretch may be given".to_string(),
            ));
        }

        let f = &self.filters;
        for (name, value) in [
            ("gray threshold", f.gray_threshold),
            ("black threshold", f.black_threshold),
            ("white threshold", f.white_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ScanError::Config(format!(
                    "{} must be between 0 and 1, got {}",
                    name, value
                )));
            }
        }
        if f.gray_tile == 0 || f.gray_step == 0 {
            return Err(ScanError::Config(
                "Gray filter tile size and step must be at least 1".to_string(),
            ));
        }

        // Catches sizes that collapse to zero pixels
        self.directive()?;

        Ok(())
    }
}
