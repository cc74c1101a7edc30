// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::Date;
use time::macros::format_description;

pub const DATE_LAYOUT: &str = "YYYY-MM-DD";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateError {
    InvalidDate,
}

impl std::fmt::Display for DateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDate => write!(f, "invalid date value -- use {DATE_LAYOUT}"),
        }
    }
}

impl std::error::Error for DateError {}

pub type DateResult<T> = std::result::Result<T, DateError>;

pub fn parse_optional_date(input: &str) -> DateResult<Option<Date>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    parse_date(trimmed).map(Some)
}

/// Renders a date the way the wire and the date inputs expect it; `None` is
/// the empty string.
pub fn format_date(value: Option<Date>) -> String {
    let Some(value) = value else {
        return String::new();
    };
    value
        .format(&format_description!("[year]-[month]-[day]"))
        .unwrap_or_default()
}

fn parse_date(input: &str) -> DateResult<Date> {
    Date::parse(input, &format_description!("[year]-[month]-[day]"))
        .map_err(|_| DateError::InvalidDate)
}

/// Serde adapter for `Option<Date>` fields carried as `"YYYY-MM-DD"`, where
/// both `""` and `null` mean no date.
pub mod optional_date {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};
    use time::Date;

    pub fn serialize<S>(value: &Option<Date>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_date(*value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Date>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(raw) => super::parse_optional_date(&raw).map_err(D::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DateError, format_date, parse_optional_date};
    use time::{Date, Month};

    #[test]
    fn parse_optional_date_accepts_blank() {
        assert_eq!(parse_optional_date("   "), Ok(None));
    }

    #[test]
    fn parse_optional_date_rejects_garbage() {
        assert_eq!(parse_optional_date("2024/01/01"), Err(DateError::InvalidDate));
        assert_eq!(parse_optional_date("2024-02-30"), Err(DateError::InvalidDate));
        assert_eq!(parse_optional_date("tomorrow"), Err(DateError::InvalidDate));
    }

    #[test]
    fn format_and_parse_agree_on_layout() {
        let date = Date::from_calendar_date(2024, Month::January, 5).expect("valid date");
        assert_eq!(format_date(Some(date)), "2024-01-05");
        assert_eq!(parse_optional_date(" 2024-01-05 "), Ok(Some(date)));
        assert_eq!(format_date(None), "");
    }

    #[test]
    fn error_message_names_expected_layout() {
        assert!(DateError::InvalidDate.to_string().contains("YYYY-MM-DD"));
    }
}
