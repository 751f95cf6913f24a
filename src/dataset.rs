//! The federated dataset aggregate
//!
//! A [`FederatedDataset`] is a metadata-only description of a gridded
//! dataset: dimensions, coordinates, data variables, and global attributes,
//! optionally backed by a [`FileRegistry`] that records which physical files
//! contribute which slice of the concatenation dimension. Capabilities are
//! composed explicitly: the registry is a plain field with delegating
//! methods, not an inherited behavior.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::calendar::{Calendar, CalendarDate, CfTimeUnits};
use crate::errors::{FederateError, Result};
use crate::grouper::{self, TimeGroup};
use crate::mfopen;
use crate::registry::{FileRegistry, SourceFile, VariableMeta};

/// An owned NetCDF-style attribute value.
///
/// Numeric attribute types collapse to `i64`/`f64`: attribute values are
/// metadata, not data, and width distinctions carry no meaning here.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttrValue {
    Str(String),
    Int(i64),
    Double(f64),
    IntList(Vec<i64>),
    DoubleList(Vec<f64>),
    StrList(Vec<String>),
}

impl AttrValue {
    /// The string content, if this is a string attribute.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Str(s) => write!(f, "{}", s),
            AttrValue::Int(v) => write!(f, "{}", v),
            AttrValue::Double(v) => write!(f, "{}", v),
            AttrValue::IntList(v) => write!(f, "{:?}", v),
            AttrValue::DoubleList(v) => write!(f, "{:?}", v),
            AttrValue::StrList(v) => write!(f, "{:?}", v),
        }
    }
}

impl From<netcdf::AttributeValue> for AttrValue {
    fn from(value: netcdf::AttributeValue) -> Self {
        use netcdf::AttributeValue as A;
        match value {
            A::Str(s) => AttrValue::Str(s),
            A::Strs(s) => AttrValue::StrList(s),
            A::Uchar(v) => AttrValue::Int(i64::from(v)),
            A::Schar(v) => AttrValue::Int(i64::from(v)),
            A::Short(v) => AttrValue::Int(i64::from(v)),
            A::Ushort(v) => AttrValue::Int(i64::from(v)),
            A::Int(v) => AttrValue::Int(i64::from(v)),
            A::Uint(v) => AttrValue::Int(i64::from(v)),
            A::Longlong(v) => AttrValue::Int(v),
            A::Ulonglong(v) => AttrValue::Int(v as i64),
            A::Float(v) => AttrValue::Double(f64::from(v)),
            A::Double(v) => AttrValue::Double(v),
            A::Uchars(v) => AttrValue::IntList(v.into_iter().map(i64::from).collect()),
            A::Schars(v) => AttrValue::IntList(v.into_iter().map(i64::from).collect()),
            A::Shorts(v) => AttrValue::IntList(v.into_iter().map(i64::from).collect()),
            A::Ushorts(v) => AttrValue::IntList(v.into_iter().map(i64::from).collect()),
            A::Ints(v) => AttrValue::IntList(v.into_iter().map(i64::from).collect()),
            A::Uints(v) => AttrValue::IntList(v.into_iter().map(i64::from).collect()),
            A::Longlongs(v) => AttrValue::IntList(v),
            A::Ulonglongs(v) => AttrValue::IntList(v.into_iter().map(|x| x as i64).collect()),
            A::Floats(v) => AttrValue::DoubleList(v.into_iter().map(f64::from).collect()),
            A::Doubles(v) => AttrValue::DoubleList(v),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Str(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Str(s)
    }
}

/// A selection along the concatenation dimension for source file queries.
///
/// Selectors are typed: numeric offsets compare directly against registered
/// coordinate ranges, while calendar dates are converted through the
/// coordinate's own CF units before comparison. A date selector on a
/// coordinate without parseable units is an error, never a silent match-all.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CoordSelector {
    /// Raw numeric offsets in the coordinate's native units, inclusive
    Offset { min: f64, max: f64 },
    /// Civil dates under the coordinate's calendar, inclusive
    Date { start: CalendarDate, end: CalendarDate },
}

/// Metadata-only description of a (possibly multi-file) gridded dataset.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FederatedDataset {
    /// Dimension name -> size
    pub dims: BTreeMap<String, usize>,
    /// Coordinate variables
    pub coords: BTreeMap<String, VariableMeta>,
    /// Data variables
    pub variables: BTreeMap<String, VariableMeta>,
    /// Global attributes
    pub attrs: BTreeMap<String, AttrValue>,
    #[serde(skip)]
    registry: Option<FileRegistry>,
}

impl FederatedDataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open multiple files as one federated dataset. See
    /// [`mfopen::open_mfdataset`].
    pub fn open_mfdataset<P: AsRef<Path>>(paths: &[P], concat_dim: &str) -> Result<Self> {
        mfopen::open_mfdataset(paths, concat_dim)
    }

    /// Open every file matching a glob pattern, in lexicographic order. See
    /// [`mfopen::open_mfdataset_glob`].
    pub fn open_mfdataset_glob(pattern: &str, concat_dim: &str) -> Result<Self> {
        mfopen::open_mfdataset_glob(pattern, concat_dim)
    }

    // -- builder operations -------------------------------------------------

    /// Add (or resize) a dimension.
    pub fn add_dim(&mut self, name: impl Into<String>, size: usize) -> &mut Self {
        self.dims.insert(name.into(), size);
        self
    }

    /// Add a coordinate variable with its dimension list and attributes.
    pub fn add_coord(
        &mut self,
        name: impl Into<String>,
        dims: Vec<String>,
        attrs: BTreeMap<String, AttrValue>,
    ) -> &mut Self {
        self.coords.insert(name.into(), VariableMeta { dims, attrs });
        self
    }

    /// Add a data variable with its dimension list and attributes.
    pub fn add_variable(
        &mut self,
        name: impl Into<String>,
        dims: Vec<String>,
        attrs: BTreeMap<String, AttrValue>,
    ) -> &mut Self {
        self.variables.insert(name.into(), VariableMeta { dims, attrs });
        self
    }

    /// Set one global attribute.
    pub fn assign_attr(&mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> &mut Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Rename a dimension everywhere it is referenced: the dimension map,
    /// coordinate keys, and every variable's dimension list.
    pub fn rename_dim(&mut self, old: &str, new: impl Into<String>) -> Result<()> {
        let new = new.into();
        let size = self
            .dims
            .remove(old)
            .ok_or_else(|| FederateError::Generic(format!("Dimension '{}' not found", old)))?;
        self.dims.insert(new.clone(), size);
        if let Some(coord) = self.coords.remove(old) {
            self.coords.insert(new.clone(), coord);
        }
        for meta in self.coords.values_mut().chain(self.variables.values_mut()) {
            for dim in &mut meta.dims {
                if dim == old {
                    *dim = new.clone();
                }
            }
        }
        if let Some(reg) = &mut self.registry {
            if reg.concat_dim() == old {
                let entries: Vec<SourceFile> = reg.iter().cloned().collect();
                let mut renamed = FileRegistry::new(new);
                for entry in entries {
                    renamed.add(entry)?;
                }
                self.registry = Some(renamed);
            }
        }
        Ok(())
    }

    // -- file tracking ------------------------------------------------------

    /// Start tracking source files along `concat_dim`, replacing any
    /// existing registry.
    pub fn enable_file_tracking(&mut self, concat_dim: impl Into<String>) {
        self.registry = Some(FileRegistry::new(concat_dim));
    }

    pub fn is_file_tracking_enabled(&self) -> bool {
        self.registry.is_some()
    }

    /// The concatenation dimension, when file tracking is enabled.
    pub fn concat_dim(&self) -> Option<&str> {
        self.registry.as_ref().map(|r| r.concat_dim())
    }

    /// Register a source file. Errors if file tracking is not enabled or the
    /// file is structurally incompatible with the registry baseline.
    pub fn add_file_source(&mut self, file: SourceFile) -> Result<()> {
        match &mut self.registry {
            Some(reg) => reg.add(file),
            None => Err(FederateError::Generic(
                "File tracking not enabled. Call enable_file_tracking() first.".to_string(),
            )),
        }
    }

    pub fn registry(&self) -> Option<&FileRegistry> {
        self.registry.as_ref()
    }

    /// Copy of the dataset's structure (dims, coords, variables, attrs)
    /// without any file tracking state.
    pub(crate) fn structural_clone(&self) -> FederatedDataset {
        FederatedDataset {
            dims: self.dims.clone(),
            coords: self.coords.clone(),
            variables: self.variables.clone(),
            attrs: self.attrs.clone(),
            registry: None,
        }
    }

    /// Files that back the selected part of the concatenation dimension, in
    /// registration order. `None` selects everything. Without file tracking
    /// the result is empty.
    pub fn get_source_files(&self, selector: Option<CoordSelector>) -> Result<Vec<PathBuf>> {
        let reg = match &self.registry {
            Some(reg) => reg,
            None => return Ok(Vec::new()),
        };
        let paths = match selector {
            None => reg.paths(),
            Some(CoordSelector::Offset { min, max }) => reg.files_for_range(min, max),
            Some(CoordSelector::Date { start, end }) => {
                let (units, calendar) = self.concat_coord_time(reg.concat_dim())?;
                let lo = units.date_to_offset(&start, calendar);
                let hi = units.date_to_offset(&end, calendar);
                reg.files_for_range(lo as f64, hi as f64)
            }
        };
        Ok(paths.into_iter().map(Path::to_path_buf).collect())
    }

    /// Structural metadata recorded for one source file.
    pub fn get_file_info(&self, path: impl AsRef<Path>) -> Result<&SourceFile> {
        match &self.registry {
            Some(reg) => reg.info(path),
            None => Err(FederateError::FileNotTracked {
                path: path.as_ref().to_path_buf(),
            }),
        }
    }

    /// Parse the concat-dim coordinate's CF units and calendar attributes.
    pub(crate) fn concat_coord_time(&self, concat_dim: &str) -> Result<(CfTimeUnits, Calendar)> {
        let coord = self
            .coords
            .get(concat_dim)
            .ok_or_else(|| FederateError::Generic(format!("Coordinate '{}' not found in dataset", concat_dim)))?;
        let units_attr = coord
            .attrs
            .get("units")
            .and_then(AttrValue::as_str)
            .ok_or_else(|| FederateError::MissingCoordAttr {
                coord: concat_dim.to_string(),
                attr: "units".to_string(),
            })?;
        let units = CfTimeUnits::parse(units_attr)?;
        let calendar = match coord.attrs.get("calendar").and_then(AttrValue::as_str) {
            Some(name) => name.parse()?,
            None => Calendar::Standard,
        };
        Ok((units, calendar))
    }

    // -- grouping -----------------------------------------------------------

    /// Partition the virtual timeline into calendar-correct periods. See
    /// [`grouper::groupby_time`].
    pub fn groupby_time(&self, period_spec: &str, normalize_units: bool) -> Result<Vec<TimeGroup>> {
        grouper::groupby_time(self, period_spec, normalize_units)
    }

    // -- export -------------------------------------------------------------

    /// JSON summary of dimensions, coordinates, variables, attributes, and
    /// tracked source files.
    pub fn to_json_string(&self) -> Result<String> {
        let mut value = serde_json::to_value(self)?;
        if let Some(reg) = &self.registry {
            let files: Vec<String> = reg
                .paths()
                .iter()
                .map(|p| p.display().to_string())
                .collect();
            if let Some(map) = value.as_object_mut() {
                map.insert("concat_dim".to_string(), serde_json::json!(reg.concat_dim()));
                map.insert("source_files".to_string(), serde_json::json!(files));
            }
        }
        Ok(serde_json::to_string_pretty(&value)?)
    }
}

impl fmt::Display for FederatedDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "<nc_federate.FederatedDataset>")?;

        let dims: Vec<String> = self
            .dims
            .iter()
            .map(|(name, size)| format!("{}: {}", name, size))
            .collect();
        writeln!(f, "Dimensions:     ({})", dims.join(", "))?;

        if !self.coords.is_empty() {
            writeln!(f, "Coordinates:")?;
            for (name, meta) in &self.coords {
                write!(f, "    {} ({})", name, meta.dims.join(", "))?;
                if let Some(units) = meta.attrs.get("units") {
                    write!(f, "  [{}]", units)?;
                }
                writeln!(f)?;
            }
        }

        writeln!(f, "Data variables:")?;
        if self.variables.is_empty() {
            writeln!(f, "    (none)")?;
        }
        for (name, meta) in &self.variables {
            writeln!(f, "    {} ({})", name, meta.dims.join(", "))?;
        }

        if !self.attrs.is_empty() {
            writeln!(f, "Attributes:")?;
            for (key, value) in &self.attrs {
                writeln!(f, "    {}: {}", key, value)?;
            }
        }

        if let Some(reg) = &self.registry {
            writeln!(f, "Source files:   {} (concat_dim: {})", reg.len(), reg.concat_dim())?;
        }
        Ok(())
    }
}
