//! Reply-keyboard construction and validation.
//!
//! Keyboards are assembled as loosely-typed grids first and squeezed
//! through [`validate`] before every send. Upstream data (category
//! names, picker values) has produced broken buttons before, so the
//! validator drops or coerces anything that cannot render and never
//! fails: the worst outcome is an empty keyboard.

use chrono::{Datelike, Duration, NaiveDate};
use engine::period;
use teloxide::types::{KeyboardButton, KeyboardMarkup};

use crate::ui;

#[derive(Clone, Debug)]
pub(crate) enum RawButton {
    Label(String),
    Int(i64),
    Missing,
    Nested(Vec<RawButton>),
}

#[derive(Clone, Debug)]
pub(crate) enum RawRow {
    Buttons(Vec<RawButton>),
    /// A row that is not a list of buttons at all; carries a short
    /// description of what was found, for the log.
    Malformed(String),
}

/// Applies the sanitation rules in order: malformed rows are dropped
/// (logged), empty rows silently, text-less buttons are dropped,
/// integer labels are coerced to text with a warning, nested payloads
/// are dropped, labels are trimmed and empty-after-trim ones dropped.
/// Rows left without buttons are omitted.
pub(crate) fn validate(rows: Vec<RawRow>, context: &str) -> Vec<Vec<String>> {
    let mut grid = Vec::with_capacity(rows.len());
    for row in rows {
        let buttons = match row {
            RawRow::Malformed(found) => {
                tracing::error!(context, %found, "keyboard row is not a button list, dropped");
                continue;
            }
            RawRow::Buttons(buttons) => buttons,
        };
        if buttons.is_empty() {
            continue;
        }

        let mut labels = Vec::with_capacity(buttons.len());
        for button in buttons {
            match button {
                RawButton::Label(text) => {
                    let trimmed = text.trim();
                    if trimmed.is_empty() {
                        tracing::error!(context, "keyboard label empty after trim, dropped");
                        continue;
                    }
                    labels.push(trimmed.to_string());
                }
                RawButton::Int(value) => {
                    tracing::warn!(context, value, "numeric keyboard label, coerced to text");
                    labels.push(value.to_string());
                }
                RawButton::Missing => {
                    tracing::error!(context, "keyboard button without text, dropped");
                }
                RawButton::Nested(_) => {
                    tracing::error!(context, "nested keyboard button payload, dropped");
                }
            }
        }
        if !labels.is_empty() {
            grid.push(labels);
        }
    }
    grid
}

pub(crate) fn markup(grid: Vec<Vec<String>>) -> KeyboardMarkup {
    KeyboardMarkup::new(
        grid.into_iter()
            .map(|row| row.into_iter().map(KeyboardButton::new).collect::<Vec<_>>()),
    )
    .resize_keyboard()
    .one_time_keyboard()
}

fn label(text: &str) -> RawButton {
    RawButton::Label(text.to_string())
}

pub(crate) fn main_menu() -> KeyboardMarkup {
    let rows = vec![
        RawRow::Buttons(vec![label(ui::INCOME), label(ui::EXPENSE)]),
        RawRow::Buttons(vec![label(ui::STATISTICS), label(ui::ALL_OPERATIONS)]),
    ];
    markup(validate(rows, "main_menu"))
}

/// Income/expense section: add, view, back.
pub(crate) fn submenu() -> KeyboardMarkup {
    let rows = vec![
        RawRow::Buttons(vec![label(ui::ADD), label(ui::VIEW)]),
        RawRow::Buttons(vec![label(ui::BACK)]),
    ];
    markup(validate(rows, "submenu"))
}

pub(crate) fn back_only() -> KeyboardMarkup {
    markup(validate(
        vec![RawRow::Buttons(vec![label(ui::BACK)])],
        "back_only",
    ))
}

pub(crate) fn statistics_menu() -> KeyboardMarkup {
    let rows = vec![
        RawRow::Buttons(vec![label(ui::TODAY), label(ui::YESTERDAY)]),
        RawRow::Buttons(vec![label(ui::THIS_WEEK), label(ui::LAST_WEEK)]),
        RawRow::Buttons(vec![label(ui::THIS_MONTH), label(ui::LAST_MONTH)]),
        RawRow::Buttons(vec![label(ui::PICK_MONTH), label(ui::PICK_YEAR)]),
        RawRow::Buttons(vec![label(ui::YEARLY_REPORT), label(ui::PICK_DAY)]),
        RawRow::Buttons(vec![label(ui::BACK)]),
    ];
    markup(validate(rows, "statistics_menu"))
}

/// Date filters for the list views.
pub(crate) fn list_filters() -> KeyboardMarkup {
    let rows = vec![
        RawRow::Buttons(vec![label(ui::TODAY), label(ui::YESTERDAY)]),
        RawRow::Buttons(vec![label(ui::THIS_WEEK), label(ui::LAST_WEEK)]),
        RawRow::Buttons(vec![label(ui::THIS_MONTH), label(ui::LAST_MONTH)]),
        RawRow::Buttons(vec![label(ui::PICK_MONTH), label(ui::PICK_YEAR)]),
        RawRow::Buttons(vec![label(ui::PICK_DATE)]),
        RawRow::Buttons(vec![label(ui::BACK)]),
    ];
    markup(validate(rows, "list_filters"))
}

/// Date step of the add-transaction dialogue: today, yesterday, the
/// two relative shortcuts, then the last four weeks of dates in pairs.
pub(crate) fn transaction_date(today: NaiveDate) -> KeyboardMarkup {
    let mut rows = vec![
        RawRow::Buttons(vec![label(ui::TODAY), label(ui::YESTERDAY)]),
        RawRow::Buttons(vec![label(ui::THREE_DAYS_AGO), label(ui::WEEK_AGO)]),
    ];

    let dates: Vec<NaiveDate> = (2..=30).map(|back| today - Duration::days(back)).collect();
    for pair in dates.chunks(2) {
        rows.push(RawRow::Buttons(
            pair.iter()
                .map(|d| label(&ui::format_date(*d)))
                .collect(),
        ));
    }
    rows.push(RawRow::Buttons(vec![label(ui::BACK)]));
    markup(validate(rows, "transaction_date"))
}

/// The last twelve full months, newest first, two per row. Statistics
/// labels carry the `📊` prefix so the router can tell them apart from
/// the list-view ones.
pub(crate) fn month_picker(today: NaiveDate, statistics: bool) -> KeyboardMarkup {
    let mut rows = Vec::new();
    let mut labels = Vec::new();
    for back in 1..=12u32 {
        let (year, month) = shift_month(today.year(), today.month(), back);
        let Some(name) = period::month_name(month) else {
            continue;
        };
        let text = if statistics {
            format!("📊 {name} ({year})")
        } else {
            format!("{name} ({year})")
        };
        labels.push(RawButton::Label(text));
        if labels.len() == 2 {
            rows.push(RawRow::Buttons(std::mem::take(&mut labels)));
        }
    }
    if !labels.is_empty() {
        rows.push(RawRow::Buttons(labels));
    }
    rows.push(RawRow::Buttons(vec![label(ui::BACK)]));
    markup(validate(rows, "month_picker"))
}

/// Year picker. The list variant feeds raw integers through the
/// validator on purpose: picker values arrive as numbers and the
/// coercion path is the supported way to render them.
pub(crate) fn year_picker(today: NaiveDate, statistics: bool) -> KeyboardMarkup {
    let current = today.year();
    let mut rows = Vec::new();
    let mut buttons = Vec::new();
    let years: Vec<i32> = if statistics {
        ((current - 4)..=(current + 1)).rev().collect()
    } else {
        ((current - 5)..=current).rev().collect()
    };
    for year in years {
        let button = if statistics {
            RawButton::Label(format!("📅 {year}"))
        } else {
            RawButton::Int(i64::from(year))
        };
        buttons.push(button);
        if buttons.len() == 2 {
            rows.push(RawRow::Buttons(std::mem::take(&mut buttons)));
        }
    }
    if !buttons.is_empty() {
        rows.push(RawRow::Buttons(buttons));
    }
    rows.push(RawRow::Buttons(vec![label(ui::BACK)]));
    markup(validate(rows, "year_picker"))
}

/// The last two weeks of single days. Statistics labels carry the `📊`
/// prefix, list ones are bare dates.
pub(crate) fn day_picker(today: NaiveDate, statistics: bool) -> KeyboardMarkup {
    let mut rows = Vec::new();
    let dates: Vec<NaiveDate> = (0..14).map(|back| today - Duration::days(back)).collect();
    for pair in dates.chunks(2) {
        rows.push(RawRow::Buttons(
            pair.iter()
                .map(|d| {
                    let text = ui::format_date(*d);
                    if statistics {
                        RawButton::Label(format!("📊 {text}"))
                    } else {
                        RawButton::Label(text)
                    }
                })
                .collect(),
        ));
    }
    rows.push(RawRow::Buttons(vec![label(ui::BACK)]));
    markup(validate(rows, "day_picker"))
}

/// Pagination controls for a rendered list page. `Oldingi` only shows
/// past page one, `Keyingi` only when pages remain.
pub(crate) fn pagination(has_prev: bool, has_next: bool) -> KeyboardMarkup {
    let mut nav = Vec::new();
    if has_prev {
        nav.push(label(ui::PREV_PAGE));
    }
    if has_next {
        nav.push(label(ui::NEXT_PAGE));
    }

    let mut rows = Vec::new();
    if !nav.is_empty() {
        rows.push(RawRow::Buttons(nav));
    }
    rows.push(RawRow::Buttons(vec![label(ui::BACK)]));
    markup(validate(rows, "pagination"))
}

fn shift_month(year: i32, month: u32, back: u32) -> (i32, u32) {
    let index = year * 12 + month as i32 - 1 - back as i32;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validator_applies_every_rule_in_one_pass() {
        let rows = vec![
            RawRow::Malformed("string".to_string()),
            RawRow::Buttons(vec![]),
            RawRow::Buttons(vec![
                RawButton::Label("  💵 Kirim  ".to_string()),
                RawButton::Missing,
                RawButton::Int(2024),
            ]),
            RawRow::Buttons(vec![
                RawButton::Nested(vec![RawButton::Label("inner".to_string())]),
                RawButton::Label("   ".to_string()),
            ]),
            RawRow::Buttons(vec![RawButton::Label("🔙 Orqaga".to_string())]),
        ];

        let grid = validate(rows, "test");
        assert_eq!(
            grid,
            vec![
                vec!["💵 Kirim".to_string(), "2024".to_string()],
                vec!["🔙 Orqaga".to_string()],
            ]
        );
    }

    #[test]
    fn worst_case_is_an_empty_grid() {
        let rows = vec![
            RawRow::Malformed("null".to_string()),
            RawRow::Buttons(vec![RawButton::Missing]),
        ];
        assert!(validate(rows, "test").is_empty());
    }

    #[test]
    fn transaction_date_offers_twenty_nine_past_dates() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
        let markup = transaction_date(today);
        let dates: Vec<NaiveDate> = markup
            .keyboard
            .iter()
            .flatten()
            .filter_map(|button| period::parse_date_value(&button.text))
            .collect();
        assert_eq!(dates.len(), 29);
        assert_eq!(dates.first().copied(), NaiveDate::from_ymd_opt(2025, 3, 13));
        assert_eq!(dates.last().copied(), NaiveDate::from_ymd_opt(2025, 2, 13));
    }

    #[test]
    fn reply_keyboards_are_resized_and_one_shot() {
        let markup = back_only();
        assert!(markup.resize_keyboard);
        assert!(markup.one_time_keyboard);
    }

    #[test]
    fn month_picker_skips_the_current_month() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
        let mut labels = Vec::new();
        for back in 1..=12u32 {
            let (year, month) = shift_month(today.year(), today.month(), back);
            labels.push((year, month));
        }
        assert_eq!(labels.first(), Some(&(2025, 2)));
        assert_eq!(labels.last(), Some(&(2024, 3)));
        assert!(!labels.contains(&(2025, 3)));
    }

    #[test]
    fn shift_month_wraps_across_january() {
        assert_eq!(shift_month(2025, 1, 1), (2024, 12));
        assert_eq!(shift_month(2025, 1, 13), (2023, 12));
        assert_eq!(shift_month(2025, 6, 3), (2025, 3));
    }
}
