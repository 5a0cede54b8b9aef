use crate::layout::AssemblyPlan;
use std::collections::BTreeSet;

/// Summary of what a plan will read and write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanStatistics {
    pub sheets: usize,
    pub skipped_sheets: usize,
    pub first_sheet: Option<usize>,
    pub last_sheet: Option<usize>,
    pub input_files: usize,
    pub blank_pages: usize,
    pub logical_pages: usize,
    pub output_files: usize,
    pub pages_per_output: usize,
    pub filtered_sheets: usize,
}

/// Calculate statistics for a plan
pub fn plan_statistics(plan: &AssemblyPlan) -> PlanStatistics {
    let inputs: BTreeSet<_> = plan.sheets.iter().flat_map(|s| s.files()).collect();

    let blank_pages = plan
        .sheets
        .iter()
        .map(|s| s.sources.iter().filter(|slot| slot.is_blank()).count() * s.pages_per_source)
        .sum();

    let logical_pages = plan.sheets.iter().map(|s| s.page_count()).sum();
    let output_files = plan.destinations().count();
    let pages_per_output = plan
        .destinations()
        .next()
        .map(|d| d.page_count)
        .unwrap_or(0);

    PlanStatistics {
        sheets: plan.sheets.len(),
        skipped_sheets: plan.skipped.len(),
        first_sheet: plan.sheets.first().map(|s| s.sheet),
        last_sheet: plan.sheets.last().map(|s| s.sheet),
        input_files: inputs.len(),
        blank_pages,
        logical_pages,
        output_files,
        pages_per_output,
        filtered_sheets: plan.sheets.iter().filter(|s| s.run_filters).count(),
    }
}
