use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime};
use thiserror::Error;

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum FieldError {
    #[error("Subject is required.")]
    SubjectRequired,

    #[error("Duration must be greater than 0.")]
    DurationNotPositive,
}

#[derive(Debug, Error)]
pub enum DateError {
    #[error("invalid date {value:?} (expected YYYY-MM-DD): {source}")]
    Invalid {
        value: String,
        source: time::error::Parse,
    },
}

/// Checks the fields a session form must carry before it reaches the store.
///
/// Every failing field is reported, not just the first.
pub fn validate_session_input(subject: &str, duration: i64) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();
    if subject.trim().is_empty() {
        errors.push(FieldError::SubjectRequired);
    }
    if duration <= 0 {
        errors.push(FieldError::DurationNotPositive);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

pub fn normalize_date(input: &str) -> Result<String, DateError> {
    let trimmed = input.trim();
    let date = Date::parse(trimmed, DATE_FORMAT).map_err(|source| DateError::Invalid {
        value: trimmed.to_string(),
        source,
    })?;
    Ok(format_date(date))
}

pub fn today() -> String {
    format_date(OffsetDateTime::now_utc().date())
}

fn format_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}
