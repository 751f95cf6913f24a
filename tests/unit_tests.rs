//! Unit tests for nc_federate exercised through the public API.

use nc_federate::{
    calendar::{Calendar, CalendarDate, CfTimeUnits, TimeUnit},
    dataset::AttrValue,
    errors::FederateError,
    frequency::{infer_frequency, parse_period_spec},
};

#[test]
fn test_error_types() {
    // NetCDF error conversion
    let netcdf_err = FederateError::NetCDFError(netcdf::Error::NotFound("test".to_string()));
    assert!(format!("{}", netcdf_err).contains("NetCDF error"));

    // Generic error
    let generic_err = FederateError::Generic("Test error".to_string());
    assert_eq!(format!("{}", generic_err), "Test error");

    // Metadata error names the file
    let meta_err = FederateError::MetadataError {
        path: "bad.nc".into(),
        reason: "concatenation dimension 'time' not found".to_string(),
    };
    let msg = format!("{}", meta_err);
    assert!(msg.contains("bad.nc"));
    assert!(msg.contains("'time'"));

    // Missing attribute error
    let attr_err = FederateError::MissingCoordAttr {
        coord: "time".to_string(),
        attr: "units".to_string(),
    };
    assert!(format!("{}", attr_err).contains("Coordinate 'time' has no 'units' attribute"));

    // Period spec error
    let spec_err = FederateError::InvalidPeriodSpec("10X".to_string());
    assert!(format!("{}", spec_err).contains("'10X'"));
}

#[test]
fn test_calendar_names() {
    assert_eq!("standard".parse::<Calendar>().unwrap(), Calendar::Standard);
    assert_eq!("GREGORIAN".parse::<Calendar>().unwrap(), Calendar::Standard);
    assert_eq!("365_day".parse::<Calendar>().unwrap(), Calendar::NoLeap);
    assert_eq!("360_day".parse::<Calendar>().unwrap(), Calendar::Day360);
    assert!("lunar".parse::<Calendar>().is_err());
}

#[test]
fn test_cf_units_round_trip() {
    let units = CfTimeUnits::parse("hours since 2000-01-01 06:00:00").unwrap();
    assert_eq!(units.unit, TimeUnit::Hours);
    assert_eq!(units.origin.year, 2000);
    assert_eq!(units.origin.hour, 6);

    let date = units.offset_to_date(18, Calendar::Standard).unwrap();
    assert_eq!(date, "2000-01-02".parse().unwrap());
    assert_eq!(units.date_to_offset(&date, Calendar::Standard), 18);
}

#[test]
fn test_leap_year_arithmetic() {
    let units = CfTimeUnits::parse("days since 2000-01-01").unwrap();

    // 2000 is a leap year in the standard calendar
    let next_year = units.offset_to_date(366, Calendar::Standard).unwrap();
    assert_eq!(next_year, CalendarDate::new(2001, 1, 1));

    // but not in noleap
    let noleap = units.offset_to_date(365, Calendar::NoLeap).unwrap();
    assert_eq!(noleap, CalendarDate::new(2001, 1, 1));

    // 360_day years are always 360 days
    let d360 = units.offset_to_date(360, Calendar::Day360).unwrap();
    assert_eq!(d360, CalendarDate::new(2001, 1, 1));
}

#[test]
fn test_month_end_clamping() {
    let jan31 = CalendarDate::new(2001, 1, 31);
    let feb = Calendar::Standard.add_interval(&jan31, 1, TimeUnit::Months).unwrap();
    assert_eq!(feb, CalendarDate::new(2001, 2, 28));

    let feb_leap = Calendar::Standard
        .add_interval(&CalendarDate::new(2000, 1, 31), 1, TimeUnit::Months)
        .unwrap();
    assert_eq!(feb_leap, CalendarDate::new(2000, 2, 29));

    // Clamped steps still count as whole months
    assert_eq!(
        Calendar::Standard.count_between(&jan31, &feb, TimeUnit::Months),
        1
    );
}

#[test]
fn test_frequency_inference() {
    let hourly: Vec<f64> = (0..48).map(|v| v as f64).collect();
    assert_eq!(
        infer_frequency(&hourly, "hours since 2000-01-01", Calendar::Standard),
        Some("1H".to_string())
    );

    let six_hourly: Vec<f64> = (0..8).map(|v| (v * 6) as f64).collect();
    assert_eq!(
        infer_frequency(&six_hourly, "hours since 2000-01-01", Calendar::Standard),
        Some("6H".to_string())
    );

    let irregular = [0.0, 1.0, 3.0, 4.0];
    assert_eq!(
        infer_frequency(&irregular, "days since 2000-01-01", Calendar::Standard),
        None
    );

    assert_eq!(
        infer_frequency(&[0.0], "days since 2000-01-01", Calendar::Standard),
        None
    );
}

#[test]
fn test_period_spec_parsing() {
    assert_eq!(parse_period_spec("1Y").unwrap(), (1, TimeUnit::Years));
    assert_eq!(parse_period_spec("6M").unwrap(), (6, TimeUnit::Months));
    assert_eq!(parse_period_spec("12H").unwrap(), (12, TimeUnit::Hours));
    assert!(parse_period_spec("0Y").is_err());
    assert!(parse_period_spec("10X").is_err());
    assert!(parse_period_spec("Y").is_err());
}

#[test]
fn test_attr_value_display() {
    assert_eq!(format!("{}", AttrValue::from("days since 2000-01-01")), "days since 2000-01-01");
    assert_eq!(format!("{}", AttrValue::Int(42)), "42");
    assert_eq!(format!("{}", AttrValue::DoubleList(vec![1.5, 2.5])), "[1.5, 2.5]");
    assert_eq!(AttrValue::from("standard").as_str(), Some("standard"));
    assert_eq!(AttrValue::Int(1).as_str(), None);
}
