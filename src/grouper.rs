//! Calendar-correct partitioning of the virtual timeline
//!
//! [`groupby_time`] walks the federated timeline in calendar steps (e.g.
//! decades) and produces one self-contained dataset per non-empty period,
//! each tracking only the physical files that back it. Periods are computed
//! with exact calendar arithmetic, so a "1Y" grouping of a standard-calendar
//! dataset starting in a leap year yields a 366-step first period.

use crate::dataset::{AttrValue, FederatedDataset};
use crate::errors::{FederateError, Result};
use crate::frequency::parse_period_spec;

/// One period of a [`groupby_time`] partition.
///
/// A group is an independent snapshot: it copies the structure and the
/// member file metadata it needs, holding no reference back into the parent
/// dataset's registry, so later changes to the parent cannot corrupt it.
#[derive(Debug, Clone)]
pub struct TimeGroup {
    /// Absolute period number from the timeline start. Dropped (empty)
    /// periods still advance this index, so gaps remain detectable.
    pub period_index: usize,
    /// Period start, in the coordinate's native units (inclusive)
    pub start_offset: i64,
    /// Period end, in the coordinate's native units (exclusive)
    pub end_offset: i64,
    /// Metadata for this period, with its own file registry
    pub dataset: FederatedDataset,
}

impl TimeGroup {
    /// Paths of the files backing this period, in registration order.
    pub fn member_files(&self) -> Vec<&std::path::Path> {
        self.dataset.registry().map(|r| r.paths()).unwrap_or_default()
    }
}

/// Partition a file-tracked dataset into periods of `period_spec` (e.g.
/// `"10Y"`, `"1M"`).
///
/// The timeline starts at the smallest registered coordinate offset and ends
/// (exclusively) `dims[concat_dim]` sampling steps later, so the final period
/// covers the last sample's full step. The sampling step comes from the
/// coordinate's `"frequency"` attribute; datasets must therefore be opened
/// with `open_mfdataset`, which infers it. Periods backed by no file are
/// dropped.
///
/// With `normalize_units`, each group's time coordinate `units` is rewritten
/// to reference the period start as its epoch (keeping the unit symbol), so
/// per-group time values restart near zero; otherwise every group keeps the
/// parent's units string untouched.
pub fn groupby_time(
    ds: &FederatedDataset,
    period_spec: &str,
    normalize_units: bool,
) -> Result<Vec<TimeGroup>> {
    let reg = ds.registry().ok_or_else(|| {
        FederateError::Generic(
            "Time grouping requires file tracking; open the dataset with open_mfdataset()".to_string(),
        )
    })?;
    if reg.is_empty() {
        return Ok(Vec::new());
    }
    let concat_dim = reg.concat_dim().to_string();

    let (units, calendar) = ds.concat_coord_time(&concat_dim)?;
    let freq_label = ds
        .coords
        .get(&concat_dim)
        .and_then(|c| c.attrs.get("frequency"))
        .and_then(AttrValue::as_str)
        .ok_or_else(|| FederateError::MissingCoordAttr {
            coord: concat_dim.clone(),
            attr: "frequency".to_string(),
        })?;
    let (freq_count, freq_unit) = parse_period_spec(freq_label)?;
    let (period_count, period_unit) = parse_period_spec(period_spec)?;

    let total_steps = *ds.dims.get(&concat_dim).ok_or_else(|| {
        FederateError::Generic(format!("Dimension '{}' not found in dataset", concat_dim))
    })? as i64;

    // Fractional start offsets are floored; sampling positions within the
    // first step do not shift period boundaries.
    let min_offset = reg
        .iter()
        .map(|e| e.coord_range.0)
        .fold(f64::INFINITY, f64::min)
        .floor() as i64;

    let start = units.offset_to_date(min_offset, calendar)?;
    let span = total_steps.checked_mul(freq_count).ok_or_else(|| {
        FederateError::CalendarError(format!("{} steps of {} overflows", total_steps, freq_label))
    })?;
    let end = calendar.add_interval(&start, span, freq_unit)?;

    let mut groups = Vec::new();
    let mut period_start = start;
    let mut period_index = 0usize;

    while period_start < end {
        let period_end = calendar.add_interval(&period_start, period_count, period_unit)?;
        if period_end <= period_start {
            return Err(FederateError::CalendarError(format!(
                "period '{}' does not advance past {}",
                period_spec, period_start
            )));
        }
        let clamped_end = if period_end > end { end } else { period_end };

        let start_offset = units.date_to_offset(&period_start, calendar);
        let end_offset = units.date_to_offset(&clamped_end, calendar);

        // Periods are half-open: a file starting exactly at the next
        // boundary belongs to the next period
        let members = reg.files_for_range(start_offset as f64, (end_offset - 1) as f64);
        if !members.is_empty() {
            let steps = calendar.count_between(&period_start, &clamped_end, units.unit);

            let mut group_ds = ds.structural_clone();
            group_ds.dims.insert(concat_dim.clone(), steps as usize);
            if normalize_units {
                if let Some(coord) = group_ds.coords.get_mut(&concat_dim) {
                    coord
                        .attrs
                        .insert("units".to_string(), AttrValue::from(units.rebase(&period_start)));
                }
            }

            group_ds.enable_file_tracking(&concat_dim);
            for path in members {
                group_ds.add_file_source(reg.info(path)?.clone())?;
            }

            groups.push(TimeGroup {
                period_index,
                start_offset,
                end_offset,
                dataset: group_ds,
            });
        }

        period_index += 1;
        period_start = period_end;
    }

    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::CalendarDate;
    use crate::testing::source_file_with_units;
    use std::collections::BTreeMap;
    use std::path::Path;

    fn daily_dataset(units: &str, calendar: &str, frequency: &str, files: &[(&str, (f64, f64))]) -> FederatedDataset {
        let total: usize = files
            .iter()
            .map(|(_, r)| (r.1 - r.0) as usize + 1)
            .sum();

        let mut coord_attrs = BTreeMap::new();
        coord_attrs.insert("units".to_string(), AttrValue::from(units));
        coord_attrs.insert("calendar".to_string(), AttrValue::from(calendar));
        coord_attrs.insert("frequency".to_string(), AttrValue::from(frequency));

        let mut ds = FederatedDataset::new();
        ds.add_dim("time", total)
            .add_dim("lat", 5)
            .add_coord("time", vec!["time".to_string()], coord_attrs)
            .add_variable(
                "temperature",
                vec!["time".to_string(), "lat".to_string()],
                BTreeMap::new(),
            );
        ds.enable_file_tracking("time");
        for (path, range) in files {
            ds.add_file_source(source_file_with_units(path, *range, units, calendar))
                .unwrap();
        }
        ds
    }

    #[test]
    fn yearly_groups_honor_leap_years() {
        // 2000 is a leap year: 730 daily steps cover 2000 fully and all but
        // the last day of 2001
        let ds = daily_dataset(
            "days since 2000-01-01",
            "standard",
            "1D",
            &[("a.nc", (0.0, 364.0)), ("b.nc", (365.0, 729.0))],
        );
        let groups = ds.groupby_time("1Y", true).unwrap();
        assert_eq!(groups.len(), 2);

        assert_eq!(groups[0].period_index, 0);
        assert_eq!((groups[0].start_offset, groups[0].end_offset), (0, 366));
        assert_eq!(groups[0].dataset.dims["time"], 366);
        // Day 365 is 2000-12-31, so file b backs the tail of the first year
        assert_eq!(groups[0].member_files(), vec![Path::new("a.nc"), Path::new("b.nc")]);

        assert_eq!(groups[1].period_index, 1);
        assert_eq!((groups[1].start_offset, groups[1].end_offset), (366, 730));
        assert_eq!(groups[1].dataset.dims["time"], 364);
        assert_eq!(groups[1].member_files(), vec![Path::new("b.nc")]);
        assert_eq!(
            groups[1].dataset.coords["time"].attrs["units"],
            AttrValue::from("days since 2001-01-01 00:00:00")
        );

        // Non-time structure is carried over unchanged
        assert_eq!(groups[0].dataset.dims["lat"], 5);
        assert!(groups[0].dataset.variables.contains_key("temperature"));
    }

    #[test]
    fn normalize_units_false_keeps_original_epoch() {
        let ds = daily_dataset(
            "days since 2000-01-01",
            "standard",
            "1D",
            &[("a.nc", (0.0, 364.0)), ("b.nc", (365.0, 729.0))],
        );
        let groups = ds.groupby_time("1Y", false).unwrap();
        assert_eq!(
            groups[1].dataset.coords["time"].attrs["units"],
            AttrValue::from("days since 2000-01-01")
        );
    }

    #[test]
    fn noleap_years_are_365_days() {
        let ds = daily_dataset(
            "days since 2000-01-01",
            "noleap",
            "1D",
            &[("a.nc", (0.0, 364.0)), ("b.nc", (365.0, 729.0))],
        );
        let groups = ds.groupby_time("1Y", true).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].dataset.dims["time"], 365);
        assert_eq!(groups[0].member_files(), vec![Path::new("a.nc")]);
        assert_eq!(groups[1].dataset.dims["time"], 365);
        assert_eq!(groups[1].member_files(), vec![Path::new("b.nc")]);
    }

    #[test]
    fn decade_groups_on_360_day_calendar() {
        let ds = daily_dataset(
            "days since 1900-01-01",
            "360_day",
            "1D",
            &[("a.nc", (0.0, 3599.0)), ("b.nc", (3600.0, 7199.0))],
        );
        let groups = ds.groupby_time("10Y", true).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].dataset.dims["time"], 3600);
        assert_eq!(groups[1].dataset.dims["time"], 3600);
        assert_eq!(
            groups[1].dataset.coords["time"].attrs["units"],
            AttrValue::from("days since 1910-01-01 00:00:00")
        );
    }

    #[test]
    fn monthly_groups_have_calendar_month_lengths() {
        let ds = daily_dataset(
            "days since 2000-01-01",
            "standard",
            "1D",
            &[("a.nc", (0.0, 364.0))],
        );
        let groups = ds.groupby_time("1M", true).unwrap();
        assert_eq!(groups.len(), 12);
        let sizes: Vec<usize> = groups.iter().map(|g| g.dataset.dims["time"]).collect();
        // 2000 is a leap year; the final December is one day short of the data
        assert_eq!(sizes[..3], [31, 29, 31]);
        let total: usize = sizes.iter().sum();
        assert_eq!(total, 365);
    }

    #[test]
    fn empty_periods_are_dropped_but_still_counted() {
        // File far past the data span leaves the middle periods empty
        let ds = daily_dataset(
            "days since 2000-01-01",
            "noleap",
            "1D",
            &[("a.nc", (0.0, 364.0)), ("c.nc", (1095.0, 1459.0))],
        );
        let groups = ds.groupby_time("1Y", true).unwrap();
        // Timeline covers 730 steps = 2 years; only year 0 has a file
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].period_index, 0);
        assert_eq!(groups[0].member_files(), vec![Path::new("a.nc")]);
    }

    #[test]
    fn missing_frequency_attribute_is_an_error() {
        let mut ds = daily_dataset(
            "days since 2000-01-01",
            "standard",
            "1D",
            &[("a.nc", (0.0, 364.0))],
        );
        ds.coords.get_mut("time").unwrap().attrs.remove("frequency");
        let err = ds.groupby_time("1Y", true).unwrap_err();
        assert!(matches!(err, FederateError::MissingCoordAttr { ref attr, .. } if attr == "frequency"));
    }

    #[test]
    fn grouping_without_tracking_is_an_error() {
        let ds = FederatedDataset::new();
        assert!(ds.groupby_time("1Y", true).is_err());
    }

    #[test]
    fn groups_are_independent_snapshots() {
        let mut ds = daily_dataset(
            "days since 2000-01-01",
            "standard",
            "1D",
            &[("a.nc", (0.0, 364.0)), ("b.nc", (365.0, 729.0))],
        );
        let groups = ds.groupby_time("1Y", true).unwrap();
        // Mutating the parent after grouping must not affect the group
        ds.add_file_source(source_file_with_units(
            "late.nc",
            (0.0, 9.0),
            "days since 2000-01-01",
            "standard",
        ))
        .unwrap();
        assert_eq!(groups[0].member_files().len(), 2);
    }

    #[test]
    fn selecting_groups_by_date_works_on_group_registry() {
        let ds = daily_dataset(
            "days since 2000-01-01",
            "standard",
            "1D",
            &[("a.nc", (0.0, 364.0)), ("b.nc", (365.0, 729.0))],
        );
        let groups = ds.groupby_time("1Y", false).unwrap();
        let files = groups[1]
            .dataset
            .get_source_files(Some(crate::dataset::CoordSelector::Date {
                start: CalendarDate::new(2001, 6, 1),
                end: CalendarDate::new(2001, 6, 30),
            }))
            .unwrap();
        assert_eq!(files, vec![std::path::PathBuf::from("b.nc")]);
    }
}
