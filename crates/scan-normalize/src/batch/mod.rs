//! Batch processing of scanned sheets
//!
//! This module drives a run:
//! 1. Plan every sheet (no file is read or written while planning)
//! 2. For each sheet in order: load inputs, filter pages, assemble
//! 3. Normalize sheet geometry and split into output files
//! 4. Write outputs with overwrite protection
//!
//! Sheets are processed strictly one after another; a failing sheet stops
//! the run before any later sheet produces output.

mod io;
mod writer;

pub use io::{encode_image, read_image};
pub use writer::OutputWriter;

use crate::filters::{PageFilter, StandardFilters};
use crate::geometry::GeometryDirective;
use crate::layout::{AssemblyPlan, SheetPlan, SourceSlot, plan_run};
use crate::options::SheetSpec;
use crate::raster::{
    PageBuffer, PageOrigin, assemble_sheet, blank_page, split_outputs, split_pages, strip_edges,
};
use crate::sequence::Positional;
use crate::types::*;
use image::DynamicImage;
use log::{debug, info};
use std::path::PathBuf;

/// What a run produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Sheets processed, in order
    pub sheets: Vec<usize>,
    /// Sheets in range that were deselected
    pub skipped: Vec<usize>,
    /// Files written, in order
    pub written: Vec<PathBuf>,
}

/// Run a batch with the standard filter pipeline
pub async fn run(spec: &SheetSpec, positional: &Positional) -> Result<RunReport> {
    run_with_filter(spec, positional, StandardFilters).await
}

/// Run a batch with a custom filter pipeline
pub async fn run_with_filter<F>(spec: &SheetSpec, positional: &Positional, filter: F) -> Result<RunReport>
where
    F: PageFilter + 'static,
{
    spec.validate()?;

    let spec = spec.clone();
    let positional = positional.clone();

    tokio::task::spawn_blocking(move || run_blocking_with(&spec, &positional, &filter)).await?
}

/// Synchronous form of [`run`]
pub fn run_blocking(spec: &SheetSpec, positional: &Positional) -> Result<RunReport> {
    run_blocking_with(spec, positional, &StandardFilters)
}

/// Synchronous form of [`run_with_filter`]
pub fn run_blocking_with(
    spec: &SheetSpec,
    positional: &Positional,
    filter: &dyn PageFilter,
) -> Result<RunReport> {
    let plan = plan_run(spec, positional)?;
    execute(spec, &plan, filter)
}

/// Produce every sheet of an already built plan
pub fn execute(spec: &SheetSpec, plan: &AssemblyPlan, filter: &dyn PageFilter) -> Result<RunReport> {
    let writer = OutputWriter::new(spec.overwrite);
    let mut report = RunReport {
        skipped: plan.skipped.clone(),
        ..Default::default()
    };
    let mut previous_size = None;

    for sheet in &plan.sheets {
        info!(
            "Processing sheet {} ({} input(s), {} output(s))",
            sheet.sheet,
            sheet.sources.len(),
            sheet.destinations.len()
        );
        let written = process_sheet(spec, sheet, filter, &writer, &mut previous_size)
            .map_err(|e| e.at_sheet(sheet.sheet))?;
        for path in &written {
            info!("Sheet {}: wrote {}", sheet.sheet, path.display());
        }
        report.sheets.push(sheet.sheet);
        report.written.extend(written);
    }

    Ok(report)
}

fn process_sheet(
    spec: &SheetSpec,
    sheet: &SheetPlan,
    filter: &dyn PageFilter,
    writer: &OutputWriter,
    previous_size: &mut Option<(u32, u32)>,
) -> Result<Vec<PathBuf>> {
    // Refuse before reading anything
    writer.check(sheet.sheet, &sheet.destinations)?;

    let directive = GeometryDirective::resolve(&spec.geometry, spec.dpi, spec.rounding)?;

    // Load
    let mut files = Vec::with_capacity(sheet.sources.len());
    for slot in &sheet.sources {
        let image = match slot {
            SourceSlot::File { path, .. } => {
                debug!("Loading {}", path.display());
                Some(directive.apply_pre_rotate(read_image(path)?))
            }
            SourceSlot::Blank { .. } => None,
        };
        files.push(image);
    }

    let blank_size = files
        .iter()
        .flatten()
        .next()
        .map(|image| (image.width(), image.height()))
        .or(*previous_size)
        .or_else(|| directive.target.map(|t| t.dimensions()));
    if let Some(first) = files.iter().flatten().next() {
        *previous_size = Some((first.width(), first.height()));
    }

    // Files are only cut into logical pages when a filter needs them;
    // otherwise each file stays whole and only its page edges are recorded
    let mut units = Vec::with_capacity(sheet.page_count());
    let mut page_edges = vec![0u32];
    for (slot, image) in sheet.sources.iter().zip(files) {
        let (input_index, image) = match (slot, image) {
            (SourceSlot::File { input_index, .. }, Some(image)) => (Some(*input_index), image),
            _ => {
                let (width, height) = blank_size.ok_or_else(|| {
                    ScanError::Config(format!(
                        "Cannot size the blank page at input position {}: no input file or sheet size to copy",
                        slot.position()
                    ))
                })?;
                debug!("Blank page {}x{} at position {}", width, height, slot.position());
                (None, blank_page(width, height, directive.background))
            }
        };

        let offset = page_edges.last().copied().unwrap_or(0);
        page_edges.extend(
            strip_edges(image.width(), sheet.pages_per_source)
                .into_iter()
                .skip(1)
                .map(|edge| offset + edge),
        );

        let filtered = sheet.run_filters && input_index.is_some();
        let parts = if filtered {
            split_pages(image, sheet.pages_per_source)
        } else {
            vec![image]
        };
        for image in parts {
            let origin = PageOrigin {
                sheet: sheet.sheet,
                input_index,
                page: units.len(),
            };
            let page = PageBuffer::new(image, origin, spec.dpi);
            debug!(
                "Page {}: {}x{}, {} channel(s) at {} bit",
                origin.page,
                page.width(),
                page.height(),
                page.channels(),
                page.bits_per_channel()
            );
            let page = if filtered {
                filter.apply(page, &spec.filters)?
            } else {
                page
            };
            units.push(page);
        }
    }

    // Assemble, normalize, split at page edges
    let assembled = assemble_sheet(units, directive.background)
        .ok_or_else(|| ScanError::Config("Sheet has no pages".to_string()))?;
    let normalized: DynamicImage = directive.apply(assembled);
    let spans: Vec<_> = sheet
        .destinations
        .iter()
        .map(|d| (d.first_page, d.page_count))
        .collect();
    let outputs = split_outputs(normalized, &page_edges, &spans);

    let mut written = Vec::with_capacity(outputs.len());
    for (destination, image) in sheet.destinations.iter().zip(outputs) {
        written.push(writer.write(sheet.sheet, &destination.path, &image)?);
    }
    Ok(written)
}
