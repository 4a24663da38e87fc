//! The add-transaction dialogue: category, date, amount, description.

use chrono::{Duration, NaiveDateTime, NaiveTime};
use engine::{EngineError, TxKind, categories, users};
use teloxide::prelude::*;

use crate::{
    ConfigParameters, keyboard, parsing,
    state::{DraftStep, MenuContext, SelectedDate, TransactionDraft},
    ui,
};

pub(super) async fn show_categories(
    bot: &Bot,
    cfg: &ConfigParameters,
    chat_id: ChatId,
    context: Option<MenuContext>,
) -> ResponseResult<()> {
    let kind = match context {
        Some(MenuContext::Income) => TxKind::Income,
        Some(MenuContext::Expense) => TxKind::Expense,
        _ => {
            bot.send_message(chat_id, ui::USE_MENU_HINT).await?;
            return Ok(());
        }
    };
    show_categories_of_kind(bot, cfg, chat_id, kind).await
}

pub(super) async fn show_categories_of_kind(
    bot: &Bot,
    cfg: &ConfigParameters,
    chat_id: ChatId,
    kind: TxKind,
) -> ResponseResult<()> {
    let categories = match cfg.engine.categories(kind).await {
        Ok(categories) => categories,
        Err(err) => {
            tracing::error!("category listing failed: {err}");
            bot.send_message(chat_id, ui::SERVER_ERROR).await?;
            return Ok(());
        }
    };
    bot.send_message(chat_id, ui::CHOOSE_CATEGORY)
        .reply_markup(ui::category_keyboard(&categories, kind))
        .await?;
    Ok(())
}

pub(super) async fn start_draft(
    bot: &Bot,
    cfg: &ConfigParameters,
    chat_id: ChatId,
    user: &users::Model,
    category: categories::Model,
    now: NaiveDateTime,
) -> ResponseResult<()> {
    let draft = TransactionDraft {
        user_id: user.id,
        category_id: category.id,
        category_name: category.name,
        kind: category.kind,
        step: DraftStep::Date,
        selected_date: None,
        amount: None,
    };
    cfg.sessions.set_draft(chat_id, draft).await;
    bot.send_message(chat_id, ui::CHOOSE_DATE)
        .reply_markup(keyboard::transaction_date(now.date()))
        .await?;
    Ok(())
}

/// Category ids arrive as callback-payload text; a stale button can
/// name a category that no longer exists, which aborts the flow.
pub(super) async fn start_draft_by_id(
    bot: &Bot,
    cfg: &ConfigParameters,
    chat_id: ChatId,
    user: &users::Model,
    id: &str,
    kind: TxKind,
    now: NaiveDateTime,
) -> ResponseResult<()> {
    let Ok(id) = id.parse::<i32>() else {
        bot.send_message(chat_id, ui::CATEGORY_GONE).await?;
        return Ok(());
    };
    match cfg.engine.category(id).await {
        Ok(category) if category.kind == kind => {
            start_draft(bot, cfg, chat_id, user, category, now).await
        }
        Ok(_) | Err(EngineError::KeyNotFound(_)) => {
            cfg.sessions.clear_draft(chat_id).await;
            bot.send_message(chat_id, ui::CATEGORY_GONE).await?;
            Ok(())
        }
        Err(err) => {
            tracing::error!("category fetch failed: {err}");
            bot.send_message(chat_id, ui::SERVER_ERROR).await?;
            Ok(())
        }
    }
}

/// One step of the dialogue. Rejected input replies with the format
/// error and leaves the draft exactly where it was.
pub(super) async fn handle_draft_input(
    bot: &Bot,
    cfg: &ConfigParameters,
    chat_id: ChatId,
    mut draft: TransactionDraft,
    text: &str,
    now: NaiveDateTime,
) -> ResponseResult<()> {
    match draft.step {
        DraftStep::Date => match parsing::parse_selected_date(text, now.date()) {
            Ok(selected) => {
                draft.selected_date = Some(selected);
                draft.step = DraftStep::Amount;
                cfg.sessions.set_draft(chat_id, draft).await;
                bot.send_message(chat_id, ui::ENTER_AMOUNT)
                    .reply_markup(keyboard::back_only())
                    .await?;
            }
            Err(_) => {
                bot.send_message(chat_id, ui::BAD_DATE).await?;
            }
        },
        DraftStep::Amount => match parsing::parse_amount(text) {
            Ok(amount) => {
                draft.amount = Some(amount);
                draft.step = DraftStep::Description;
                cfg.sessions.set_draft(chat_id, draft).await;
                bot.send_message(chat_id, ui::ENTER_DESCRIPTION)
                    .reply_markup(keyboard::back_only())
                    .await?;
            }
            Err(_) => {
                bot.send_message(chat_id, ui::BAD_AMOUNT).await?;
            }
        },
        DraftStep::Description => {
            let description = (text != "/skip").then_some(text);
            finalize(bot, cfg, chat_id, draft, description, now).await?;
        }
    }
    Ok(())
}

async fn finalize(
    bot: &Bot,
    cfg: &ConfigParameters,
    chat_id: ChatId,
    draft: TransactionDraft,
    description: Option<&str>,
    now: NaiveDateTime,
) -> ResponseResult<()> {
    // The step order guarantees an amount by now; a missing one means
    // the draft was clobbered, so drop it instead of guessing.
    let Some(amount) = draft.amount else {
        cfg.sessions.clear_draft(chat_id).await;
        bot.send_message(chat_id, ui::SERVER_ERROR).await?;
        return Ok(());
    };
    let created_at = resolve_created_at(draft.selected_date, now);

    match cfg
        .engine
        .add_transaction(
            draft.user_id,
            draft.category_id,
            draft.kind,
            amount,
            description,
            created_at,
        )
        .await
    {
        Ok(tx) => {
            cfg.sessions.clear_draft(chat_id).await;
            let text = ui::confirmation(
                draft.kind,
                &draft.category_name,
                tx.amount,
                tx.created_at,
                tx.description.as_deref(),
            );
            bot.send_message(chat_id, text)
                .reply_markup(ui::after_save_keyboard(draft.kind))
                .await?;
        }
        Err(EngineError::KeyNotFound(key)) => {
            tracing::warn!(%key, "add flow aborted, category vanished");
            cfg.sessions.clear_draft(chat_id).await;
            bot.send_message(chat_id, ui::CATEGORY_GONE).await?;
        }
        Err(err) => {
            tracing::error!("transaction insert failed: {err}");
            bot.send_message(chat_id, ui::SERVER_ERROR).await?;
        }
    }
    Ok(())
}

/// Today keeps the real time of day; yesterday and explicit dates get
/// pinned to 23:59 of their day.
fn resolve_created_at(selected: Option<SelectedDate>, now: NaiveDateTime) -> NaiveDateTime {
    let end_of_day = NaiveTime::from_hms_opt(23, 59, 0).unwrap_or(NaiveTime::MIN);
    match selected {
        None | Some(SelectedDate::Today) => now,
        Some(SelectedDate::Yesterday) => (now.date() - Duration::days(1)).and_time(end_of_day),
        Some(SelectedDate::Day(day)) => day.and_time(end_of_day),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 15)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap()
    }

    #[test]
    fn today_keeps_the_current_time() {
        assert_eq!(resolve_created_at(Some(SelectedDate::Today), now()), now());
        assert_eq!(resolve_created_at(None, now()), now());
    }

    #[test]
    fn yesterday_pins_to_end_of_day() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 14)
            .unwrap()
            .and_hms_opt(23, 59, 0)
            .unwrap();
        assert_eq!(
            resolve_created_at(Some(SelectedDate::Yesterday), now()),
            expected
        );
    }

    #[test]
    fn explicit_days_pin_to_end_of_day() {
        let day = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        let expected = day.and_hms_opt(23, 59, 0).unwrap();
        assert_eq!(
            resolve_created_at(Some(SelectedDate::Day(day)), now()),
            expected
        );
    }
}
