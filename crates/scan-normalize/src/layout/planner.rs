use super::types::*;
use crate::options::SheetSpec;
use crate::sequence::{PathSequence, Positional};
use crate::types::*;
use log::{debug, warn};
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

/// Build the assembly plan for a run, checking the filesystem for inputs.
///
/// Only existence is checked; nothing is opened.
pub fn plan_run(spec: &SheetSpec, positional: &Positional) -> Result<AssemblyPlan> {
    plan_run_with(spec, positional, |path| path.exists())
}

/// Key used to spot two spellings of the same output file.
///
/// Lexical only; `..` and symlinks are left alone.
fn destination_key(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_owned());
    absolute
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// Build the assembly plan with a custom existence check
pub fn plan_run_with<F>(spec: &SheetSpec, positional: &Positional, exists: F) -> Result<AssemblyPlan>
where
    F: Fn(&Path) -> bool,
{
    spec.validate()?;

    let n = spec.input_pages;
    let m = spec.output_pages;
    let pages = spec.pages_per_sheet();
    let pages_per_output = spec.pages_per_output();

    let first_input = spec
        .start_input
        .unwrap_or((spec.start_sheet - 1) * n + 1);
    let first_output = spec
        .start_output
        .unwrap_or((spec.start_sheet - 1) * m + 1);
    let inputs = positional.inputs.clone().starting_at(first_input);
    let outputs = positional.outputs.clone().starting_at(first_output);

    // End of the loop; only an explicit end sheet makes every sheet required
    let required_end = spec.end_sheet;
    let last_wanted = match (spec.end_sheet, spec.sheets.as_ref().and_then(|s| s.max())) {
        (Some(end), Some(max)) => Some(end.min(max)),
        (end, max) => end.or(max),
    };

    let mut plan = AssemblyPlan::default();
    let mut seen = HashSet::new();
    let mut input_cursor = 1;
    let mut output_cursor = 1;
    let mut position = (spec.start_sheet - 1) * n + 1;

    for sheet in spec.start_sheet.. {
        if last_wanted.is_some_and(|last| sheet > last) {
            break;
        }
        let selected = spec.is_selected(sheet);

        // Inputs
        let mut sources = Vec::with_capacity(n);
        let mut present = 0;
        let mut absent = Vec::new();
        for _ in 0..n {
            let pos = position;
            position += 1;

            if spec.insert_blank.as_ref().is_some_and(|s| s.contains(pos)) {
                sources.push(SourceSlot::Blank { position: pos });
                continue;
            }

            let index = input_cursor;
            input_cursor += 1;

            if spec.replace_blank.as_ref().is_some_and(|s| s.contains(pos)) {
                sources.push(SourceSlot::Blank { position: pos });
                continue;
            }

            let input_index = first_input + index - 1;
            match inputs.get(index) {
                Some(path) if exists(&path) => {
                    present += 1;
                    sources.push(SourceSlot::File {
                        position: pos,
                        input_index,
                        path,
                    });
                }
                Some(path) if inputs.is_template() => absent.push((input_index, Some(path))),
                Some(path) if selected => return Err(ScanError::MissingInput { sheet, path }),
                Some(path) => {
                    // deselected sheets are never read
                    present += 1;
                    sources.push(SourceSlot::File {
                        position: pos,
                        input_index,
                        path,
                    });
                }
                None => absent.push((input_index, None)),
            }
        }

        if !absent.is_empty() {
            if present > 0 {
                if !selected {
                    plan.skipped.push(sheet);
                    output_cursor += m;
                    continue;
                }
                return Err(ScanError::IncompleteGroup {
                    sheet,
                    found: present,
                    expected: present + absent.len(),
                });
            }
            match required_end {
                None => {
                    debug!("Input exhausted at sheet {}, ending batch", sheet);
                    break;
                }
                Some(_) if !selected => {
                    plan.skipped.push(sheet);
                    output_cursor += m;
                    continue;
                }
                Some(end) => {
                    let (input_index, path) = absent.swap_remove(0);
                    return Err(match path {
                        Some(path) => ScanError::MissingInput { sheet, path },
                        None => ScanError::Config(format!(
                            "Sheet {} of {} needs input file #{} but the input list ran out",
                            sheet, end, input_index
                        )),
                    });
                }
            }
        }

        if !selected {
            debug!("Sheet {} not selected, skipping", sheet);
            plan.skipped.push(sheet);
            output_cursor += m;
            continue;
        }

        // Outputs
        let mut destinations = Vec::with_capacity(m);
        for j in 0..m {
            let index = output_cursor;
            output_cursor += 1;
            let path = outputs.get(index).ok_or_else(|| {
                ScanError::Config(format!(
                    "Sheet {} needs output file #{} but only {} output path(s) were given; \
                     use a numbered template to write more files",
                    sheet,
                    index,
                    outputs.len().unwrap_or(0)
                ))
            })?;
            if !seen.insert(destination_key(&path)) {
                return Err(ScanError::Config(format!(
                    "Output {} would be written more than once",
                    path.display()
                )));
            }
            destinations.push(Destination {
                output_index: first_output + index - 1,
                path,
                first_page: j * pages_per_output,
                page_count: pages_per_output,
            });
        }

        debug!(
            "Sheet {}: {} source(s), {} page(s) -> {} output(s)",
            sheet,
            sources.len(),
            pages,
            destinations.len()
        );
        plan.sheets.push(SheetPlan {
            sheet,
            sources,
            destinations,
            pages_per_source: spec.layout.pages_per_file(),
            run_filters: spec.filters_for(sheet),
        });
    }

    warn_unused("input", &inputs, input_cursor);
    warn_unused("output", &outputs, output_cursor);

    if plan.is_empty() {
        return Err(ScanError::EmptyPlan);
    }
    Ok(plan)
}

fn warn_unused(kind: &str, sequence: &PathSequence, cursor: usize) {
    if let Some(len) = sequence.len()
        && len >= cursor
    {
        warn!(
            "{} {} path(s) were not used, starting with {}",
            len + 1 - cursor,
            kind,
            sequence
                .get(cursor)
                .map(|p| p.display().to_string())
                .unwrap_or_default()
        );
    }
}
