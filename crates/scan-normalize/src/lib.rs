pub mod batch;
pub mod constants;
mod filters;
pub mod geometry;
pub mod layout;
mod options;
pub mod raster;
mod selector;
mod sequence;
mod stats;
mod types;
mod units;

pub use batch::{RunReport, execute, run, run_blocking, run_blocking_with, run_with_filter};
pub use filters::{NoFilters, PageFilter, StandardFilters};
pub use geometry::{GeometryDirective, SizeTarget};
pub use layout::{AssemblyPlan, Destination, SheetPlan, SourceSlot, plan_run, plan_run_with};
pub use options::*;
pub use raster::{PageBuffer, PageOrigin};
pub use selector::MultiIndex;
pub use sequence::{PathSequence, PathTemplate, Positional};
pub use stats::{PlanStatistics, plan_statistics};
pub use types::*;
pub use units::*;
