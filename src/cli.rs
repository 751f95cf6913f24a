//! Defines command-line interface options using `clap` for the nc_federate tool.

use clap::Parser;

use crate::calendar::CalendarDate;

/// A CLI tool for federating and querying multi-file NetCDF datasets
#[derive(Parser, Debug)]
#[command(
    version,
    name = "nc-federate",
    about = "Open multiple NetCDF files as one dataset and query its metadata"
)]
pub struct Args {
    /// Input NetCDF files, or a single glob pattern such as 'data/*.nc'
    #[arg(required = true)]
    pub inputs: Vec<String>,

    /// Dimension along which the files are concatenated
    #[arg(long, default_value = "time")]
    pub concat_dim: String,

    /// Group the timeline into calendar periods, e.g. '1Y', '6M', '1D'
    #[arg(long)]
    pub groupby: Option<String>,

    /// Keep the original time units in each group instead of rebasing them
    /// onto the group's start
    #[arg(long, default_value_t = false)]
    pub keep_units: bool,

    /// List the files covering a coordinate range, formatted as <min>:<max>
    #[arg(long, value_parser = parse_offset_range)]
    pub files_for: Option<(f64, f64)>,

    /// List the files covering a date range, formatted as <start>..<end>
    /// (dates as YYYY-MM-DD)
    #[arg(long, value_parser = parse_date_range)]
    pub files_between: Option<(CalendarDate, CalendarDate)>,

    /// Describe a variable or coordinate (dimension list and attributes)
    #[arg(long)]
    pub describe: Option<String>,

    /// Show the recorded metadata for one tracked file
    #[arg(long)]
    pub file_info: Option<String>,

    /// Print the dataset summary as JSON instead of plain text
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

fn parse_offset_range(s: &str) -> Result<(f64, f64), String> {
    let parts: Vec<&str> = s.split(':').collect();
    match parts.as_slice() {
        [lo, hi] => {
            let lo = lo
                .trim()
                .parse::<f64>()
                .map_err(|_| format!("Invalid range minimum '{}'", lo))?;
            let hi = hi
                .trim()
                .parse::<f64>()
                .map_err(|_| format!("Invalid range maximum '{}'", hi))?;
            if lo > hi {
                return Err("Range minimum is greater than maximum".to_string());
            }
            Ok((lo, hi))
        }
        _ => Err("Invalid format: Expected '<min>:<max>'.".to_string()),
    }
}

fn parse_date_range(s: &str) -> Result<(CalendarDate, CalendarDate), String> {
    let parts: Vec<&str> = s.split("..").collect();
    match parts.as_slice() {
        [start, end] => {
            let start: CalendarDate = start.trim().parse().map_err(|e| format!("{}", e))?;
            let end: CalendarDate = end.trim().parse().map_err(|e| format!("{}", e))?;
            if start > end {
                return Err("Range start is after its end".to_string());
            }
            Ok((start, end))
        }
        _ => Err("Invalid format: Expected '<start>..<end>'.".to_string()),
    }
}
