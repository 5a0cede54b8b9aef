//! Layout planning
//!
//! Reconciles layout mode, pages per sheet and the sheet range into an
//! [`AssemblyPlan`] before any image is read:
//! - Input grouping (`input_pages` files per sheet, blanks included)
//! - Output distribution (`output_pages` files per sheet)
//! - Sheet selection and end-of-batch detection

mod planner;
mod types;

pub use planner::*;
pub use types::*;
