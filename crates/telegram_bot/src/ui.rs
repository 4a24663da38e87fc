//! Button labels, user-facing texts and inline keyboards.
//!
//! Reply-keyboard labels double as the router's match keys, so they
//! live here as constants and nowhere else.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use engine::{Period, Report, TransactionPage, TxKind, categories, period};
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

pub(crate) const INCOME: &str = "💵 Kirim";
pub(crate) const EXPENSE: &str = "💸 Chiqim";
pub(crate) const STATISTICS: &str = "📊 Statistika";
pub(crate) const ALL_OPERATIONS: &str = "📋 Barcha amaliyotlar";
pub(crate) const ADD: &str = "➕ Qo'shish";
pub(crate) const VIEW: &str = "👁 Ko'rish";
pub(crate) const BACK: &str = "🔙 Orqaga";
pub(crate) const MAIN_MENU: &str = "🏠 Asosiy menyu";

pub(crate) const TODAY: &str = "📅 Bugun";
pub(crate) const YESTERDAY: &str = "📅 Kecha";
pub(crate) const THIS_WEEK: &str = "📅 Bu hafta";
pub(crate) const LAST_WEEK: &str = "📅 O'tgan hafta";
pub(crate) const THIS_MONTH: &str = "📅 Bu oy";
pub(crate) const LAST_MONTH: &str = "📅 O'tgan oy";
pub(crate) const PICK_MONTH: &str = "📅 Oy tanlash";
pub(crate) const PICK_YEAR: &str = "📅 Yil tanlash";
pub(crate) const PICK_DAY: &str = "📅 Kun tanlash";
pub(crate) const PICK_DATE: &str = "📅 Aniq sana tanlash";
pub(crate) const PICK_DATE_SHORT: &str = "📅 Sana tanlash";
pub(crate) const YEARLY_REPORT: &str = "📊 Yillik hisobot";
pub(crate) const THREE_DAYS_AGO: &str = "📅 3 kun oldin";
pub(crate) const WEEK_AGO: &str = "📅 1 hafta oldin";

pub(crate) const PREV_PAGE: &str = "⬅️ Oldingi";
pub(crate) const NEXT_PAGE: &str = "Keyingi ➡️";

pub(crate) const CHOOSE_MENU: &str = "Quyidagi bo'limlardan birini tanlang:";
pub(crate) const CHOOSE_PERIOD: &str = "Davrni tanlang:";
pub(crate) const CHOOSE_CATEGORY: &str = "Kategoriyani tanlang:";
pub(crate) const CHOOSE_DATE: &str = "Sanani tanlang yoki kiriting (masalan: 15.03.2025):";
pub(crate) const BAD_DATE: &str = "❌ Sana formati noto'g'ri. Masalan: 15.03.2025";
pub(crate) const ENTER_AMOUNT: &str = "Summani so'mda kiriting:";
pub(crate) const BAD_AMOUNT: &str = "❌ Summa noto'g'ri. Faqat musbat son kiriting.";
pub(crate) const ENTER_DESCRIPTION: &str = "Izoh kiriting yoki /skip buyrug'ini yuboring:";
pub(crate) const UNKNOWN_COMMAND: &str = "Noma'lum buyruq. /menu orqali menyuni oching.";
pub(crate) const USE_MENU_HINT: &str =
    "Amaliyot qo'shish uchun avval /menu orqali bo'lim tanlang.";
pub(crate) const NO_TRANSACTIONS: &str = "Bu davrda amaliyotlar topilmadi.";
pub(crate) const ALL_OPERATIONS_SOON: &str = "📋 Barcha amaliyotlar bo'limi tez orada qo'shiladi.";
pub(crate) const SERVER_ERROR: &str = "Xatolik yuz berdi. Birozdan so'ng qayta urinib ko'ring.";
pub(crate) const CATEGORY_GONE: &str = "Kategoriya topilmadi. /menu orqali qaytadan boshlang.";
pub(crate) const SUBSCRIBE_PROMPT: &str = "Botdan foydalanish uchun kanalimizga obuna bo'ling:";
pub(crate) const SUBSCRIBED_OK: &str = "✅ Obuna tasdiqlandi!";
pub(crate) const STILL_NOT_SUBSCRIBED: &str = "❌ Obuna topilmadi. Avval kanalga obuna bo'ling.";

pub(crate) fn greeting(name: &str) -> String {
    format!(
        "Assalomu alaykum, {name}! 👋\n\nMen shaxsiy moliyangizni yuritishga yordam beraman: \
         kirim va chiqimlarni yozib boring, davr bo'yicha hisobot oling.\n\n\
         Boshlash uchun /menu buyrug'ini yuboring."
    )
}

pub(crate) fn help_text() -> String {
    [
        "Buyruqlar:",
        "/start — botni ishga tushirish",
        "/menu — asosiy menyu",
        "/help — yordam",
        "/skip — izoh bosqichini o'tkazib yuborish",
    ]
    .join("\n")
}

/// `1234567` -> `1 234 567`.
pub(crate) fn format_amount(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if amount < 0 {
        out.push('-');
    }
    let first = digits.len() % 3;
    for (i, ch) in digits.chars().enumerate() {
        if i != 0 && (i + 3 - first) % 3 == 0 {
            out.push(' ');
        }
        out.push(ch);
    }
    out
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

/// Human label of a period, consistent with the range `resolve` picks:
/// a malformed value reads "Bugun" because that is what it resolves to.
pub(crate) fn period_label(period: Period, value: Option<&str>, now: NaiveDateTime) -> String {
    match period {
        Period::Today => "Bugun".to_string(),
        Period::Yesterday => "Kecha".to_string(),
        Period::ThisWeek => "Bu hafta".to_string(),
        Period::LastWeek => "O'tgan hafta".to_string(),
        Period::ThisMonth => "Bu oy".to_string(),
        Period::LastMonth => "O'tgan oy".to_string(),
        Period::MonthYear => value
            .and_then(period::parse_month_year)
            .and_then(|(month, year)| {
                period::month_name(month).map(|name| format!("{name} ({year})"))
            })
            .unwrap_or_else(|| "Bugun".to_string()),
        Period::Year => value
            .and_then(crate::parsing::parse_year)
            .unwrap_or_else(|| now.year())
            .to_string(),
        Period::Date => value
            .and_then(period::parse_date_value)
            .map(format_date)
            .unwrap_or_else(|| "Bugun".to_string()),
    }
}

pub(crate) fn render_statistics(report: &Report, period_label: &str) -> String {
    let mut text = format!("📊 Statistika — {period_label}\n");

    text.push_str("\n💵 Kirimlar:\n");
    if report.incomes.is_empty() {
        text.push_str("yo'q\n");
    } else {
        for sum in &report.incomes {
            text.push_str(&format!(
                "{}: {} so'm\n",
                sum.category,
                format_amount(sum.total)
            ));
        }
    }
    text.push_str(&format!(
        "Jami kirim: {} so'm\n",
        format_amount(report.total_income)
    ));

    text.push_str("\n💸 Chiqimlar:\n");
    if report.expenses.is_empty() {
        text.push_str("yo'q\n");
    } else {
        for sum in &report.expenses {
            text.push_str(&format!(
                "{}: {} so'm\n",
                sum.category,
                format_amount(sum.total)
            ));
        }
    }
    text.push_str(&format!(
        "Jami chiqim: {} so'm\n",
        format_amount(report.total_expense)
    ));

    let emoji = if report.balance() >= 0 { "✅" } else { "❌" };
    text.push_str(&format!(
        "\n{emoji} Balans: {} so'm",
        format_amount(report.balance())
    ));
    text
}

/// Renders one list page. Today's and yesterday's views carry a single
/// date header and per-item times; wider periods repeat the full date
/// on every line.
pub(crate) fn render_list(
    page: &TransactionPage,
    kind: TxKind,
    period: Period,
    period_label: &str,
) -> String {
    if page.total == 0 {
        return NO_TRANSACTIONS.to_string();
    }

    let title = match kind {
        TxKind::Income => "💵 Kirimlar",
        TxKind::Expense => "💸 Chiqimlar",
    };
    let single_day = matches!(period, Period::Today | Period::Yesterday);

    let mut text = format!("{title} — {period_label}\n\n");
    let mut total = 0i64;
    for (tx, category) in &page.items {
        let when = if single_day {
            tx.created_at.format("%H:%M").to_string()
        } else {
            tx.created_at.format("%d.%m.%Y %H:%M").to_string()
        };
        text.push_str(&format!(
            "• {}: {} so'm ({when})",
            category,
            format_amount(tx.amount)
        ));
        if let Some(description) = tx.description.as_deref() {
            text.push_str(&format!(" — {description}"));
        }
        text.push('\n');
        total += tx.amount;
    }

    text.push_str(&format!(
        "\nSahifada jami: {} so'm\nSahifa: {}/{}",
        format_amount(total),
        page.page,
        page.pages
    ));
    text
}

pub(crate) fn confirmation(
    kind: TxKind,
    category: &str,
    amount: i64,
    created_at: NaiveDateTime,
    description: Option<&str>,
) -> String {
    let title = match kind {
        TxKind::Income => "✅ Kirim saqlandi!",
        TxKind::Expense => "✅ Chiqim saqlandi!",
    };
    let mut text = format!(
        "{title}\n\n📁 Kategoriya: {category}\n💰 Summa: {} so'm\n📅 Sana: {}",
        format_amount(amount),
        created_at.format("%d.%m.%Y %H:%M"),
    );
    if let Some(description) = description {
        text.push_str(&format!("\n📝 Izoh: {description}"));
    }
    text
}

pub(crate) fn category_keyboard(
    categories: &[categories::Model],
    kind: TxKind,
) -> InlineKeyboardMarkup {
    let prefix = match kind {
        TxKind::Income => "income_cat_",
        TxKind::Expense => "expense_cat_",
    };
    let mut rows: Vec<Vec<InlineKeyboardButton>> = Vec::new();
    for pair in categories.chunks(2) {
        rows.push(
            pair.iter()
                .map(|c| {
                    InlineKeyboardButton::callback(c.name.clone(), format!("{prefix}{}", c.id))
                })
                .collect(),
        );
    }
    rows.push(vec![InlineKeyboardButton::callback(BACK, "main_menu")]);
    InlineKeyboardMarkup::new(rows)
}

pub(crate) fn after_save_keyboard(kind: TxKind) -> InlineKeyboardMarkup {
    let (add, menu) = match kind {
        TxKind::Income => ("add_income", "income_menu"),
        TxKind::Expense => ("add_expense", "expense_menu"),
    };
    InlineKeyboardMarkup::new(vec![
        vec![
            InlineKeyboardButton::callback("➕ Yana qo'shish", add),
            InlineKeyboardButton::callback(BACK, menu),
        ],
        vec![InlineKeyboardButton::callback(MAIN_MENU, "main_menu")],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::CategorySum;

    #[test]
    fn greeting_points_at_the_menu_command() {
        let text = greeting("Ali");
        assert!(text.contains("Ali"));
        assert!(text.contains("/menu"));
    }

    #[test]
    fn amounts_group_digits_with_spaces() {
        assert_eq!(format_amount(0), "0");
        assert_eq!(format_amount(950), "950");
        assert_eq!(format_amount(50_000), "50 000");
        assert_eq!(format_amount(1_234_567), "1 234 567");
        assert_eq!(format_amount(-40_000), "-40 000");
    }

    #[test]
    fn balance_emoji_tracks_the_sign() {
        let mut report = Report {
            incomes: vec![CategorySum {
                category: "💼 Ish haqi".to_string(),
                total: 100,
            }],
            expenses: vec![],
            total_income: 100,
            total_expense: 0,
        };
        assert!(render_statistics(&report, "Bugun").contains("✅ Balans: 100 so'm"));

        report.total_expense = 300;
        assert!(render_statistics(&report, "Bugun").contains("❌ Balans: -200 so'm"));
    }

    #[test]
    fn period_label_falls_back_with_the_range() {
        let now = chrono::NaiveDate::from_ymd_opt(2025, 3, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        assert_eq!(
            period_label(Period::MonthYear, Some("Yanvar (2025)"), now),
            "Yanvar (2025)"
        );
        assert_eq!(period_label(Period::MonthYear, Some("garbage"), now), "Bugun");
        assert_eq!(period_label(Period::Year, None, now), "2025");
        assert_eq!(
            period_label(Period::Date, Some("05.03.2025"), now),
            "05.03.2025"
        );
        assert_eq!(period_label(Period::Date, Some("32.01.2025"), now), "Bugun");
    }
}
