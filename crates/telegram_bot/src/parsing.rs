//! Free-text input classification for the dialogue steps.

use chrono::{Duration, NaiveDate};
use engine::period;

use crate::state::SelectedDate;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub(crate) enum ParseError {
    #[error("sana formati noto'g'ri")]
    InvalidDate,
    #[error("summa noto'g'ri")]
    InvalidAmount,
}

/// Parses the date step of the add-transaction dialogue. Button labels
/// are accepted with or without their `📅 ` icon, free-typed dates in
/// `dd.mm.yyyy` (single-digit day and month included).
pub(crate) fn parse_selected_date(text: &str, today: NaiveDate) -> Result<SelectedDate, ParseError> {
    let trimmed = text.trim();
    let trimmed = trimmed.strip_prefix("📅 ").unwrap_or(trimmed);

    match trimmed {
        "Bugun" => Ok(SelectedDate::Today),
        "Kecha" => Ok(SelectedDate::Yesterday),
        "3 kun oldin" => Ok(SelectedDate::Day(today - Duration::days(3))),
        "1 hafta oldin" => Ok(SelectedDate::Day(today - Duration::days(7))),
        other => period::parse_date_value(other)
            .map(SelectedDate::Day)
            .ok_or(ParseError::InvalidDate),
    }
}

/// Parses the amount step: a positive integer of so'm, digit groups
/// optionally separated by spaces.
pub(crate) fn parse_amount(text: &str) -> Result<i64, ParseError> {
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() || !cleaned.chars().all(|c| c.is_ascii_digit()) {
        return Err(ParseError::InvalidAmount);
    }
    let amount: i64 = cleaned.parse().map_err(|_| ParseError::InvalidAmount)?;
    if amount <= 0 {
        return Err(ParseError::InvalidAmount);
    }
    Ok(amount)
}

/// A bare 4-digit year, for the year list views.
pub(crate) fn parse_year(text: &str) -> Option<i32> {
    let trimmed = text.trim();
    if trimmed.len() != 4 || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    trimmed.parse().ok()
}

/// True when the whole message is numeric; those get the "use /menu"
/// hint instead of the unknown-command reply.
pub(crate) fn is_numeric(text: &str) -> bool {
    let trimmed = text.trim();
    !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 15).unwrap()
    }

    #[test]
    fn date_buttons_accept_the_icon_and_its_absence() {
        assert_eq!(parse_selected_date("Bugun", today()), Ok(SelectedDate::Today));
        assert_eq!(
            parse_selected_date("📅 Bugun", today()),
            Ok(SelectedDate::Today)
        );
        assert_eq!(
            parse_selected_date("📅 Kecha", today()),
            Ok(SelectedDate::Yesterday)
        );
    }

    #[test]
    fn relative_date_buttons_count_back_from_today() {
        assert_eq!(
            parse_selected_date("📅 3 kun oldin", today()),
            Ok(SelectedDate::Day(NaiveDate::from_ymd_opt(2025, 3, 12).unwrap()))
        );
        assert_eq!(
            parse_selected_date("1 hafta oldin", today()),
            Ok(SelectedDate::Day(NaiveDate::from_ymd_opt(2025, 3, 8).unwrap()))
        );
    }

    #[test]
    fn typed_dates_are_normalized() {
        assert_eq!(
            parse_selected_date("5.3.2025", today()),
            Ok(SelectedDate::Day(NaiveDate::from_ymd_opt(2025, 3, 5).unwrap()))
        );
        assert_eq!(
            parse_selected_date("15.03.2025", today()),
            Ok(SelectedDate::Day(today()))
        );
    }

    #[test]
    fn garbage_dates_are_rejected() {
        for bad in ["ertaga", "32.01.2025", "15/03/2025", ""] {
            assert_eq!(parse_selected_date(bad, today()), Err(ParseError::InvalidDate));
        }
    }

    #[test]
    fn amounts_accept_space_groups() {
        assert_eq!(parse_amount("50000"), Ok(50_000));
        assert_eq!(parse_amount("1 000 000"), Ok(1_000_000));
    }

    #[test]
    fn amounts_reject_non_positive_and_non_numeric() {
        for bad in ["0", "-100", "abc", "12.50", "100ming", ""] {
            assert_eq!(parse_amount(bad), Err(ParseError::InvalidAmount), "{bad:?}");
        }
    }

    #[test]
    fn year_needs_exactly_four_digits() {
        assert_eq!(parse_year("2025"), Some(2025));
        assert_eq!(parse_year(" 2024 "), Some(2024));
        assert_eq!(parse_year("202"), None);
        assert_eq!(parse_year("20251"), None);
        assert_eq!(parse_year("yil"), None);
    }

    #[test]
    fn numeric_detection_catches_decimals() {
        assert!(is_numeric("100"));
        assert!(is_numeric("100.5"));
        assert!(!is_numeric("100 so'm"));
        assert!(!is_numeric(""));
    }
}
