//! Sampling frequency inference for time coordinates
//!
//! Detects uniform spacing in a numeric time coordinate and maps it to a
//! canonical pandas-style label ("1H", "3H", "1D", "1M", "1Y", ...). Irregular
//! spacing is not an error: it simply means the frequency is unknown and the
//! `"frequency"` attribute is omitted.

use crate::calendar::{Calendar, CfTimeUnits, TimeUnit};
use crate::errors::{FederateError, Result};

/// Infer the sampling frequency of a time coordinate.
///
/// `values` are raw numeric offsets in the coordinate's own units. The input
/// is sorted (on a copy) before differencing, so callers need not
/// pre-sort. Returns `None` (never an error) when the frequency cannot be
/// determined: fewer than two values, an unparsable units string, fractional
/// or unequal spacing.
///
/// Fixed-span units label through a seconds cascade (whole days become "ND",
/// whole hours "NH", whole minutes "NT", otherwise "NS"). For month- and
/// year-based units the step is confirmed against calendar arithmetic: a
/// whole number of years labels "NY", otherwise "NM".
pub fn infer_frequency(values: &[f64], units: &str, calendar: Calendar) -> Option<String> {
    if values.len() < 2 {
        return None;
    }
    let cf = CfTimeUnits::parse(units).ok()?;

    let mut sorted = values.to_vec();
    // NaN values sort arbitrarily here; their differences fail the exact
    // spacing check below, yielding Unknown rather than a panic
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    // Spacing must be an exact integer step in the source unit
    let first_diff = sorted[1] - sorted[0];
    if first_diff <= 0.0 || first_diff.fract() != 0.0 {
        return None;
    }
    let step = first_diff as i64;
    for pair in sorted.windows(2) {
        if pair[1] - pair[0] != first_diff {
            return None;
        }
    }

    match cf.unit {
        TimeUnit::Months => {
            // A month step that always lands on year boundaries is a year step
            let landed = calendar.add_interval(&cf.origin, step, TimeUnit::Months).ok()?;
            let years = calendar.count_between(&cf.origin, &landed, TimeUnit::Years);
            let whole_years = years > 0
                && calendar
                    .add_interval(&cf.origin, years, TimeUnit::Years)
                    .map(|d| d == landed)
                    .unwrap_or(false);
            if whole_years {
                Some(format!("{}Y", years))
            } else {
                Some(format!("{}M", step))
            }
        }
        TimeUnit::Years => Some(format!("{}Y", step)),
        fixed => {
            let total_secs = step.checked_mul(fixed.fixed_seconds()?)?;
            Some(label_from_seconds(total_secs))
        }
    }
}

fn label_from_seconds(total_secs: i64) -> String {
    if total_secs % 86_400 == 0 {
        format!("{}D", total_secs / 86_400)
    } else if total_secs % 3_600 == 0 {
        format!("{}H", total_secs / 3_600)
    } else if total_secs % 60 == 0 {
        format!("{}T", total_secs / 60)
    } else {
        format!("{}S", total_secs)
    }
}

/// Parse a period or frequency specification such as `"10Y"`, `"3H"` or
/// `"1M"` into a count and unit.
///
/// The suffix follows the label alphabet: S seconds, T minutes, H hours,
/// D days, M months, Y years.
pub fn parse_period_spec(spec: &str) -> Result<(i64, TimeUnit)> {
    let spec = spec.trim();
    if spec.len() < 2 {
        return Err(FederateError::InvalidPeriodSpec(spec.to_string()));
    }
    let (count_str, suffix) = spec.split_at(spec.len() - 1);
    let unit = match suffix {
        "S" => TimeUnit::Seconds,
        "T" => TimeUnit::Minutes,
        "H" => TimeUnit::Hours,
        "D" => TimeUnit::Days,
        "M" => TimeUnit::Months,
        "Y" => TimeUnit::Years,
        _ => return Err(FederateError::InvalidPeriodSpec(spec.to_string())),
    };
    let count: i64 = count_str
        .parse()
        .map_err(|_| FederateError::InvalidPeriodSpec(spec.to_string()))?;
    if count <= 0 {
        return Err(FederateError::InvalidPeriodSpec(spec.to_string()));
    }
    Ok((count, unit))
}
