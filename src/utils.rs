/// Utility functions for validation, rounding and formatting
use time::{format_description::BorrowedFormatItem, macros::format_description, OffsetDateTime};

/// Plausible sensor range for temperature in °C
pub const TEMPERATURE_RANGE: (f32, f32) = (-40.0, 80.0);
/// Relative humidity range in %
pub const HUMIDITY_RANGE: (f32, f32) = (0.0, 100.0);

const DATETIME_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[day].[month].[year] - [hour]:[minute]:[second]");

/// Format a timestamp for human-readable logging
///
/// Converts an OffsetDateTime to DD.MM.YYYY - HH:MM:SS format
/// Falls back to default string representation if formatting fails.
pub fn format_datetime(dt: &OffsetDateTime) -> String {
    dt.format(DATETIME_FORMAT).unwrap_or_else(|_| dt.to_string())
}

/// Whole minutes since the Unix epoch, used as a unique key per minute boundary
pub fn minute_key(dt: &OffsetDateTime) -> i64 {
    dt.unix_timestamp().div_euclid(60)
}

fn within(value: f32, (low, high): (f32, f32)) -> Option<f32> {
    (value.is_finite() && value >= low && value <= high).then_some(value)
}

/// Accept a raw temperature only if it lies within the sensor range
pub fn validate_temperature(value: f32) -> Option<f32> {
    within(value, TEMPERATURE_RANGE)
}

/// Accept a raw humidity only if it lies within 0-100 %
pub fn validate_humidity(value: f32) -> Option<f32> {
    within(value, HUMIDITY_RANGE)
}

/// Round to two decimal places
pub fn round2(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}
