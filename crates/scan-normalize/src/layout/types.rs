//! Assembly plan types
//!
//! These describe, for every materialized sheet, which input files supply
//! its pages and which output files receive them. They are built once per
//! run and never modified afterwards.

use std::path::PathBuf;

/// One input position of a sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSlot {
    /// A real input file
    File {
        /// Run-wide input position (1-based, `input_pages` per sheet)
        position: usize,
        /// Input file number the path was resolved from
        input_index: usize,
        path: PathBuf,
    },
    /// A generated blank page standing in for a file
    Blank { position: usize },
}

impl SourceSlot {
    pub fn position(&self) -> usize {
        match self {
            SourceSlot::File { position, .. } | SourceSlot::Blank { position } => *position,
        }
    }

    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            SourceSlot::File { path, .. } => Some(path),
            SourceSlot::Blank { .. } => None,
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, SourceSlot::Blank { .. })
    }
}

/// One output file of a sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    /// Output file number the path was resolved from
    pub output_index: usize,
    pub path: PathBuf,
    /// First logical page of the sheet written here (0-based)
    pub first_page: usize,
    /// Number of consecutive logical pages written here
    pub page_count: usize,
}

/// Everything needed to produce one sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetPlan {
    pub sheet: usize,
    pub sources: Vec<SourceSlot>,
    pub destinations: Vec<Destination>,
    /// Logical pages held by each source
    pub pages_per_source: usize,
    /// Whether the filter pipeline runs on this sheet's pages
    pub run_filters: bool,
}

impl SheetPlan {
    /// Logical pages of the sheet as `(input index, page offset within that
    /// file)` pairs, in sheet order. Blank slots have no input index.
    pub fn pages(&self) -> impl Iterator<Item = (Option<usize>, usize)> + '_ {
        self.sources.iter().flat_map(move |slot| {
            let index = match slot {
                SourceSlot::File { input_index, .. } => Some(*input_index),
                SourceSlot::Blank { .. } => None,
            };
            (0..self.pages_per_source).map(move |offset| (index, offset))
        })
    }

    pub fn page_count(&self) -> usize {
        self.sources.len() * self.pages_per_source
    }

    pub fn files(&self) -> impl Iterator<Item = &PathBuf> {
        self.sources.iter().filter_map(SourceSlot::path)
    }
}

/// The resolved plan for a whole run
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AssemblyPlan {
    /// Sheets to produce, in increasing sheet order
    pub sheets: Vec<SheetPlan>,
    /// Sheets inside the range that were deselected
    pub skipped: Vec<usize>,
}

impl AssemblyPlan {
    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    pub fn destinations(&self) -> impl Iterator<Item = &Destination> {
        self.sheets.iter().flat_map(|s| s.destinations.iter())
    }
}
