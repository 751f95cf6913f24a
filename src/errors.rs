//! Centralized error handling for nc_federate
//!
//! This module provides structured error types for every failure kind in the
//! federation pipeline, so callers can tell an unreadable file apart from a
//! structurally incompatible one.

use std::fmt;
use std::path::PathBuf;

/// Main error type for nc_federate operations
#[derive(Debug)]
pub enum FederateError {
    /// NetCDF library errors without file context
    NetCDFError(netcdf::Error),

    /// A file could not be opened
    OpenError { path: PathBuf, source: netcdf::Error },

    /// I/O operation errors
    IoError(std::io::Error),

    /// A file is missing required structural metadata (concat dimension,
    /// coordinate variable, units attribute, ...)
    MetadataError { path: PathBuf, reason: String },

    /// A file's structure does not match the registry baseline
    CompatibilityError {
        path: PathBuf,
        baseline: PathBuf,
        details: String,
    },

    /// A CF units string could not be parsed
    UnitsParseError { units: String, reason: String },

    /// Unrecognized calendar name
    UnknownCalendar(String),

    /// Invalid period or frequency specification (e.g. "10X")
    InvalidPeriodSpec(String),

    /// Calendar arithmetic produced an invalid date
    CalendarError(String),

    /// A required attribute is absent from a coordinate
    MissingCoordAttr { coord: String, attr: String },

    /// A queried file is not tracked by the registry
    FileNotTracked { path: PathBuf },

    /// A glob pattern matched no files
    NoFilesMatched { pattern: String },

    /// Generic error for everything else
    Generic(String),
}

impl fmt::Display for FederateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FederateError::NetCDFError(e) => write!(f, "NetCDF error: {}", e),
            FederateError::OpenError { path, source } => {
                write!(f, "Cannot open '{}': {}", path.display(), source)
            }
            FederateError::IoError(e) => write!(f, "I/O error: {}", e),
            FederateError::MetadataError { path, reason } => {
                write!(f, "Invalid metadata in '{}': {}", path.display(), reason)
            }
            FederateError::CompatibilityError {
                path,
                baseline,
                details,
            } => write!(
                f,
                "File '{}' is incompatible with baseline '{}': {}",
                path.display(),
                baseline.display(),
                details
            ),
            FederateError::UnitsParseError { units, reason } => {
                write!(f, "Invalid CF units string '{}': {}", units, reason)
            }
            FederateError::UnknownCalendar(name) => write!(f, "Unknown calendar '{}'", name),
            FederateError::InvalidPeriodSpec(spec) => {
                write!(f, "Invalid period specification '{}'", spec)
            }
            FederateError::CalendarError(msg) => write!(f, "Calendar arithmetic error: {}", msg),
            FederateError::MissingCoordAttr { coord, attr } => {
                write!(f, "Coordinate '{}' has no '{}' attribute", coord, attr)
            }
            FederateError::FileNotTracked { path } => {
                write!(f, "File not tracked: {}", path.display())
            }
            FederateError::NoFilesMatched { pattern } => {
                write!(f, "No files found matching pattern: {}", pattern)
            }
            FederateError::Generic(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for FederateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FederateError::NetCDFError(e) => Some(e),
            FederateError::OpenError { source, .. } => Some(source),
            FederateError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<netcdf::Error> for FederateError {
    fn from(error: netcdf::Error) -> Self {
        FederateError::NetCDFError(error)
    }
}

impl From<std::io::Error> for FederateError {
    fn from(error: std::io::Error) -> Self {
        FederateError::IoError(error)
    }
}

impl From<String> for FederateError {
    fn from(error: String) -> Self {
        FederateError::Generic(error)
    }
}

impl From<&str> for FederateError {
    fn from(error: &str) -> Self {
        FederateError::Generic(error.to_string())
    }
}

impl From<serde_json::Error> for FederateError {
    fn from(error: serde_json::Error) -> Self {
        FederateError::Generic(format!("JSON serialization error: {}", error))
    }
}

/// Result type alias for nc_federate operations
pub type Result<T> = std::result::Result<T, FederateError>;
