mod logger;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, ValueEnum};
use scan_normalize::{Background, Mirror, MultiIndex, Offset, Positional, Rotation, SheetSpec};
use std::path::PathBuf;

use crate::logger::CliLogger;

/// Normalize scanned sheets: split, join, crop, fit and reposition pages
#[derive(Parser)]
#[command(name = "scant", about = "Scanned sheet layout tools", version)]
struct Cli {
    /// Input paths followed by output paths; `%d`, `%03d` templates number files
    paths: Vec<String>,

    /// Pages per physical input file
    #[arg(long, value_enum)]
    layout: Option<LayoutArg>,

    /// Input files assembled into each sheet
    #[arg(long)]
    input_pages: Option<usize>,

    /// Output files written per sheet
    #[arg(long)]
    output_pages: Option<usize>,

    /// First sheet to process
    #[arg(long)]
    start_sheet: Option<usize>,

    /// Last sheet to process
    #[arg(long)]
    end_sheet: Option<usize>,

    /// Number of the first input file
    #[arg(long)]
    start_input: Option<usize>,

    /// Number of the first output file
    #[arg(long)]
    start_output: Option<usize>,

    /// Only process these sheets, e.g. "1-3,7"
    #[arg(long = "sheet")]
    sheets: Option<MultiIndex>,

    /// Skip these sheets
    #[arg(long)]
    exclude: Option<MultiIndex>,

    /// Sheets that bypass the filter pipeline
    #[arg(long)]
    no_processing: Option<MultiIndex>,

    /// Input positions filled with a blank page
    #[arg(long)]
    insert_blank: Option<MultiIndex>,

    /// Input positions whose file is replaced by a blank page
    #[arg(long)]
    replace_blank: Option<MultiIndex>,

    /// Crop or pad the sheet to W,H or a named size (e.g. a4-landscape)
    #[arg(long)]
    sheet_size: Option<String>,

    /// Scale the sheet to fit inside W,H, keeping aspect ratio
    #[arg(long)]
    size: Option<String>,

    /// Resize the sheet to exactly W,H
    #[arg(long)]
    stretch: Option<String>,

    /// Shift content before sizing, e.g. "-1cm,2mm"
    #[arg(long, allow_hyphen_values = true)]
    pre_shift: Option<Offset>,

    /// Shift content after sizing
    #[arg(long, allow_hyphen_values = true)]
    post_shift: Option<Offset>,

    /// Rotate every input file as it is loaded (-90, 90, 180, 270)
    #[arg(long, allow_hyphen_values = true)]
    pre_rotate: Option<i32>,

    /// Rotate the finished sheet (-90, 90, 180, 270)
    #[arg(long, allow_hyphen_values = true)]
    post_rotate: Option<i32>,

    /// Mirror before shifting (h, v, hv)
    #[arg(long)]
    pre_mirror: Option<Mirror>,

    /// Mirror after sizing (h, v, hv)
    #[arg(long)]
    post_mirror: Option<Mirror>,

    /// Fill colour for exposed areas: black, white, gray, #rrggbb
    #[arg(long = "sheet-background")]
    background: Option<Background>,

    /// Scaling filter for --size and --stretch
    #[arg(long = "interpolate", value_enum)]
    interpolation: Option<InterpolationArg>,

    /// Resolution used to convert physical units to pixels
    #[arg(long)]
    dpi: Option<u32>,

    /// Rounding rule for unit conversion
    #[arg(long, value_enum)]
    rounding: Option<RoundingArg>,

    /// Add a named size, e.g. "postcard=148mm,105mm"
    #[arg(long = "preset")]
    presets: Vec<String>,

    /// Disable all filtering
    #[arg(short = 'n', long = "no-filters")]
    no_filters: bool,

    /// Disable the noise filter
    #[arg(long = "no-noisefilter")]
    no_noise_filter: bool,

    /// Disable the gray filter
    #[arg(long = "no-grayfilter")]
    no_gray_filter: bool,

    /// Replace existing output files
    #[arg(long)]
    overwrite: bool,

    /// Start from a saved JSON configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Save the effective configuration as JSON
    #[arg(long)]
    save_config: Option<PathBuf>,

    /// Show the plan statistics only, don't read or write images
    #[arg(long)]
    plan_only: bool,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum LayoutArg {
    Single,
    Double,
}

#[derive(Clone, Copy, ValueEnum)]
enum InterpolationArg {
    Nearest,
    Linear,
    Cubic,
}

#[derive(Clone, Copy, ValueEnum)]
enum RoundingArg {
    HalfUp,
    HalfEven,
    Truncate,
}

impl From<LayoutArg> for scan_normalize::Layout {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::Single => Self::Single,
            LayoutArg::Double => Self::Double,
        }
    }
}

impl From<InterpolationArg> for scan_normalize::Interpolation {
    fn from(arg: InterpolationArg) -> Self {
        match arg {
            InterpolationArg::Nearest => Self::Nearest,
            InterpolationArg::Linear => Self::Linear,
            InterpolationArg::Cubic => Self::Cubic,
        }
    }
}

impl From<RoundingArg> for scan_normalize::Rounding {
    fn from(arg: RoundingArg) -> Self {
        match arg {
            RoundingArg::HalfUp => Self::HalfUp,
            RoundingArg::HalfEven => Self::HalfEven,
            RoundingArg::Truncate => Self::Truncate,
        }
    }
}

impl Cli {
    /// Layer the command line over the saved (or default) configuration
    fn apply(&self, spec: &mut SheetSpec) -> Result<()> {
        if let Some(layout) = self.layout {
            spec.layout = layout.into();
        }
        if let Some(n) = self.input_pages {
            spec.input_pages = n;
        }
        if let Some(m) = self.output_pages {
            spec.output_pages = m;
        }

        if let Some(start) = self.start_sheet {
            spec.start_sheet = start;
        }
        if self.end_sheet.is_some() {
            spec.end_sheet = self.end_sheet;
        }
        if self.start_input.is_some() {
            spec.start_input = self.start_input;
        }
        if self.start_output.is_some() {
            spec.start_output = self.start_output;
        }

        for (target, value) in [
            (&mut spec.sheets, &self.sheets),
            (&mut spec.exclude, &self.exclude),
            (&mut spec.no_processing, &self.no_processing),
            (&mut spec.insert_blank, &self.insert_blank),
            (&mut spec.replace_blank, &self.replace_blank),
        ] {
            if value.is_some() {
                *target = value.clone();
            }
        }

        // Presets first so size arguments can name them
        for preset in &self.presets {
            spec.presets.insert_spec(preset)?;
        }
        if let Some(dpi) = self.dpi {
            spec.dpi = dpi;
        }
        if let Some(rounding) = self.rounding {
            spec.rounding = rounding.into();
        }

        let geometry = &mut spec.geometry;
        if let Some(size) = &self.sheet_size {
            geometry.sheet_size = Some(
                scan_normalize::Dimensions::parse_with(size, &spec.presets)
                    .with_context(|| format!("Invalid --sheet-size '{}'", size))?,
            );
        }
        if let Some(size) = &self.size {
            geometry.size = Some(
                scan_normalize::Dimensions::parse_with(size, &spec.presets)
                    .with_context(|| format!("Invalid --size '{}'", size))?,
            );
        }
        if let Some(size) = &self.stretch {
            geometry.stretch = Some(
                scan_normalize::Dimensions::parse_with(size, &spec.presets)
                    .with_context(|| format!("Invalid --stretch '{}'", size))?,
            );
        }
        if self.pre_shift.is_some() {
            geometry.pre_shift = self.pre_shift;
        }
        if self.post_shift.is_some() {
            geometry.post_shift = self.post_shift;
        }
        if let Some(degrees) = self.pre_rotate {
            geometry.pre_rotate = Rotation::from_degrees(degrees)?;
        }
        if let Some(degrees) = self.post_rotate {
            geometry.post_rotate = Rotation::from_degrees(degrees)?;
        }
        if self.pre_mirror.is_some() {
            geometry.pre_mirror = self.pre_mirror;
        }
        if self.post_mirror.is_some() {
            geometry.post_mirror = self.post_mirror;
        }
        if let Some(background) = self.background {
            geometry.background = background;
        }
        if let Some(interpolation) = self.interpolation {
            geometry.interpolation = interpolation.into();
        }

        if self.no_filters {
            spec.filters_enabled = false;
        }
        if self.no_noise_filter {
            spec.filters.noise_filter = false;
        }
        if self.no_gray_filter {
            spec.filters.gray_filter = false;
        }
        if self.overwrite {
            spec.overwrite = true;
        }

        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    CliLogger::from_verbosity(cli.verbose, cli.quiet).init()?;

    let mut spec = match &cli.config {
        Some(path) => SheetSpec::load(path)
            .await
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => SheetSpec::default(),
    };
    cli.apply(&mut spec)?;
    spec.validate()?;

    if let Some(path) = &cli.save_config {
        spec.save(path).await?;
        println!("Saved configuration → {}", path.display());
        if cli.paths.is_empty() {
            return Ok(());
        }
    }

    if cli.paths.is_empty() {
        bail!("No input and output paths given");
    }
    let positional = Positional::partition(&cli.paths, spec.input_pages, spec.output_pages)?;

    if cli.plan_only {
        let plan = scan_normalize::plan_run(&spec, &positional)?;
        let stats = scan_normalize::plan_statistics(&plan);
        println!("Plan Statistics:");
        match (stats.first_sheet, stats.last_sheet) {
            (Some(first), Some(last)) => {
                println!("  Sheets: {} ({}-{})", stats.sheets, first, last)
            }
            _ => println!("  Sheets: {}", stats.sheets),
        }
        println!("  Skipped sheets: {}", stats.skipped_sheets);
        println!("  Input files: {}", stats.input_files);
        println!("  Blank pages: {}", stats.blank_pages);
        println!("  Logical pages: {}", stats.logical_pages);
        println!("  Output files: {}", stats.output_files);
        println!("  Pages per output: {}", stats.pages_per_output);
        println!("  Filtered sheets: {}", stats.filtered_sheets);
        return Ok(());
    }

    let report = scan_normalize::run(&spec, &positional).await?;
    println!(
        "Processed {} sheet(s), wrote {} file(s)",
        report.sheets.len(),
        report.written.len()
    );
    if !report.skipped.is_empty() {
        println!("Skipped {} sheet(s)", report.skipped.len());
    }

    Ok(())
}
