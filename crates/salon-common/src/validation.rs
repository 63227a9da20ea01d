use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;

/// A request field that is missing or malformed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    Missing(&'static str),
    #[error("Invalid {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

/// Raw booking fields as submitted by a client
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingInput {
    pub barber: Option<String>,
    pub service: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Booking fields that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidBooking {
    pub barber: String,
    pub service: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub email: String,
    pub phone: String,
}

impl BookingInput {
    pub fn validate(&self) -> Result<ValidBooking, ValidationError> {
        let barber = required("barber", self.barber.as_deref())?;
        let service = required("service", self.service.as_deref())?;
        let date = required("date", self.date.as_deref())?;
        let time = required("time", self.time.as_deref())?;
        let email = required("email", self.email.as_deref())?;
        let phone = required("phone", self.phone.as_deref())?;

        Ok(ValidBooking {
            barber: barber.to_string(),
            service: service.to_string(),
            date: parse_date(date)?,
            time: parse_time(time)?,
            email: email.to_string(),
            phone: phone.to_string(),
        })
    }
}

/// Validate a new date/time pair for a reschedule
pub fn validate_schedule(
    date: Option<&str>,
    time: Option<&str>,
) -> Result<(NaiveDate, NaiveTime), ValidationError> {
    let date = required("date", date)?;
    let time = required("time", time)?;
    Ok((parse_date(date)?, parse_time(time)?))
}

/// Returns the trimmed value, rejecting absent and blank fields
pub fn required<'a>(field: &'static str, value: Option<&'a str>) -> Result<&'a str, ValidationError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ValidationError::Missing(field)),
    }
}

/// Parse a `YYYY-MM-DD` calendar date
pub fn parse_date(value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| ValidationError::Invalid {
        field: "date",
        message: format!("'{}' is not a YYYY-MM-DD date", value),
    })
}

/// Parse an `HH:MM` (or `HH:MM:SS`) time of day
pub fn parse_time(value: &str) -> Result<NaiveTime, ValidationError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| ValidationError::Invalid {
            field: "time",
            message: format!("'{}' is not an HH:MM time", value),
        })
}
