// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::Date;
use time::macros::format_description;

use crate::{
    HouseSystem, MaintenanceCategory, MaintenancePriority, MaintenanceStatus, StatusFilter,
};

pub const DATE_LAYOUT: &str = "YYYY-MM-DD";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    InvalidDate,
    UnknownCategory,
    UnknownPriority,
    UnknownStatus,
    UnknownSystem,
    UnknownFilter,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDate => write!(f, "invalid date value; use {DATE_LAYOUT}"),
            Self::UnknownCategory => f.write_str("unknown maintenance category"),
            Self::UnknownPriority => f.write_str("unknown priority"),
            Self::UnknownStatus => f.write_str("unknown status"),
            Self::UnknownSystem => f.write_str("unknown house system"),
            Self::UnknownFilter => f.write_str("unknown status filter"),
        }
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult<T> = std::result::Result<T, ValidationError>;

pub fn parse_optional_date(input: &str) -> ValidationResult<Option<Date>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    parse_date(trimmed).map(Some)
}

pub fn format_date(value: Option<Date>) -> String {
    let Some(value) = value else {
        return String::new();
    };
    value
        .format(&format_description!("[year]-[month]-[day]"))
        .unwrap_or_default()
}

/// Free text fields store blank input as absent.
pub fn normalize_optional_text(input: &str) -> Option<String> {
    if input.trim().is_empty() {
        None
    } else {
        Some(input.to_owned())
    }
}

/// Enum keys are matched case-insensitively, with `-` and spaces read as `_`.
pub fn normalize_key(input: &str) -> String {
    input
        .trim()
        .to_ascii_lowercase()
        .chars()
        .map(|ch| if ch == '-' || ch == ' ' { '_' } else { ch })
        .collect()
}

pub fn parse_category(input: &str) -> ValidationResult<MaintenanceCategory> {
    MaintenanceCategory::parse(&normalize_key(input)).ok_or(ValidationError::UnknownCategory)
}

pub fn parse_priority(input: &str) -> ValidationResult<MaintenancePriority> {
    MaintenancePriority::parse(&normalize_key(input)).ok_or(ValidationError::UnknownPriority)
}

pub fn parse_status(input: &str) -> ValidationResult<MaintenanceStatus> {
    MaintenanceStatus::parse(&normalize_key(input)).ok_or(ValidationError::UnknownStatus)
}

/// Blank input means no related system.
pub fn parse_optional_system(input: &str) -> ValidationResult<Option<HouseSystem>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    HouseSystem::parse(&normalize_key(input))
        .map(Some)
        .ok_or(ValidationError::UnknownSystem)
}

pub fn parse_filter(input: &str) -> ValidationResult<StatusFilter> {
    StatusFilter::parse(&normalize_key(input)).ok_or(ValidationError::UnknownFilter)
}

fn parse_date(input: &str) -> ValidationResult<Date> {
    Date::parse(input, &format_description!("[year]-[month]-[day]"))
        .map_err(|_| ValidationError::InvalidDate)
}

#[cfg(test)]
mod tests {
    use super::{
        ValidationError, format_date, normalize_key, normalize_optional_text, parse_category,
        parse_filter, parse_optional_date, parse_optional_system, parse_priority, parse_status,
    };
    use crate::{
        HouseSystem, MaintenanceCategory, MaintenancePriority, MaintenanceStatus, StatusFilter,
    };
    use time::{Date, Month};

    #[test]
    fn parse_optional_date_test() {
        let parsed = parse_optional_date("2025-06-11")
            .expect("date should parse")
            .expect("date should be present");
        assert_eq!(parsed.to_string(), "2025-06-11");

        assert!(parse_optional_date("06/11/2025").is_err());
        assert_eq!(parse_optional_date("   ").expect("blank is valid"), None);
    }

    #[test]
    fn impossible_dates_are_rejected() {
        assert_eq!(
            parse_optional_date(" 2025-02-30 "),
            Err(ValidationError::InvalidDate)
        );
    }

    #[test]
    fn format_date_test() {
        let date = Date::from_calendar_date(2025, Month::March, 4).expect("valid date");
        assert_eq!(format_date(Some(date)), "2025-03-04");
        assert_eq!(format_date(None), "");
    }

    #[test]
    fn blank_text_normalizes_to_absent() {
        assert_eq!(normalize_optional_text(""), None);
        assert_eq!(normalize_optional_text("  \n"), None);
        assert_eq!(
            normalize_optional_text("check the flue"),
            Some("check the flue".to_owned())
        );
    }

    #[test]
    fn normalize_key_folds_case_and_separators() {
        assert_eq!(normalize_key("In-Progress"), "in_progress");
        assert_eq!(normalize_key(" in progress "), "in_progress");
        assert_eq!(normalize_key("HVAC"), "hvac");
    }

    #[test]
    fn enum_inputs_are_forgiving() {
        assert_eq!(parse_category("Seasonal"), Ok(MaintenanceCategory::Seasonal));
        assert_eq!(parse_priority(" URGENT "), Ok(MaintenancePriority::Urgent));
        assert_eq!(parse_status("in progress"), Ok(MaintenanceStatus::InProgress));
        assert_eq!(parse_filter("All"), Ok(StatusFilter::All));
        assert_eq!(parse_optional_system(""), Ok(None));
        assert_eq!(parse_optional_system("HVAC"), Ok(Some(HouseSystem::Hvac)));
    }

    #[test]
    fn unknown_enum_inputs_name_the_field() {
        assert_eq!(parse_category("gardening"), Err(ValidationError::UnknownCategory));
        assert_eq!(parse_priority("meh"), Err(ValidationError::UnknownPriority));
        assert_eq!(parse_status("done"), Err(ValidationError::UnknownStatus));
        assert_eq!(parse_optional_system("attic"), Err(ValidationError::UnknownSystem));
        assert_eq!(parse_filter("open"), Err(ValidationError::UnknownFilter));
    }
}
