//! Metadata-only federation of multi-file NetCDF time series.
//!
//! This crate opens a set of NetCDF files that together form one dataset
//! split along a shared dimension (almost always time), merges their
//! structural metadata into a single [`dataset::FederatedDataset`], and
//! answers questions about the combined timeline without reading any bulk
//! data:
//!
//! - which physical files back a given coordinate or date range,
//! - what the sampling frequency of the combined coordinate is,
//! - how the timeline splits into calendar-correct periods (years, months,
//!   days, ...) under any of the six CF calendars.
//!
//! All calendar arithmetic is exact integer math on day numbers, so results
//! stay correct across leap years, the 360-day model calendar, and
//! multi-century spans.
//!
//! ```no_run
//! use nc_federate::prelude::*;
//!
//! fn run() -> nc_federate::errors::Result<()> {
//!     let ds = FederatedDataset::open_mfdataset_glob("data/temp_*.nc", "time")?;
//!     for group in ds.groupby_time("1Y", true)? {
//!         println!("period {}: {} file(s)", group.period_index, group.member_files().len());
//!     }
//!     Ok(())
//! }
//! ```

pub mod calendar;
pub mod cli;
pub mod dataset;
pub mod errors;
pub mod frequency;
pub mod grouper;
pub mod mfopen;
pub mod reader;
pub mod registry;

#[cfg(test)]
mod testing;

pub use calendar::{Calendar, CalendarDate, CfTimeUnits, TimeUnit};
pub use dataset::{AttrValue, CoordSelector, FederatedDataset};
pub use errors::{FederateError, Result};
pub use grouper::TimeGroup;
pub use registry::{FileRegistry, SourceFile, VariableMeta};

/// Convenient single-line import for the common types.
pub mod prelude {
    pub use crate::calendar::{Calendar, CalendarDate, CfTimeUnits, TimeUnit};
    pub use crate::dataset::{AttrValue, CoordSelector, FederatedDataset};
    pub use crate::errors::{FederateError, Result};
    pub use crate::grouper::TimeGroup;
    pub use crate::registry::{FileRegistry, SourceFile, VariableMeta};
}
