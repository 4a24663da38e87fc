//! Dialogue routing.
//!
//! Messages are free text: button labels and typed input arrive the
//! same way, so dispatch is a single precedence chain. The order is
//! load-bearing: an active draft shadows menu labels, fixed labels
//! beat the context-dependent date filters, filters beat the textual
//! patterns, and an exact category name is the last resort before the
//! unknown-command reply. Callback payloads live in their own
//! namespace and are handled separately.

use chrono::NaiveDateTime;
use chrono_tz::Asia::Tashkent;
use engine::{Period, TxKind, categories, period};
use teloxide::{prelude::*, types::CallbackQuery};

use crate::{
    ConfigParameters, keyboard, parsing,
    state::{MenuContext, Session},
    subscription, ui,
};

mod finance;
mod statistics;

/// One wall-clock instant per update; handlers thread it through so a
/// request served across midnight stays on one calendar day.
pub(crate) fn now_tashkent() -> NaiveDateTime {
    chrono::Utc::now().with_timezone(&Tashkent).naive_local()
}

pub(crate) async fn handle_message(
    bot: Bot,
    msg: Message,
    cfg: ConfigParameters,
) -> ResponseResult<()> {
    if !msg.chat.is_private() {
        return Ok(());
    }
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let text = text.trim();
    if text.is_empty() {
        return Ok(());
    }

    let chat_id = msg.chat.id;
    let now = now_tashkent();

    let user = match cfg
        .engine
        .upsert_user(chat_id.0, Some(&from.first_name), from.username.as_deref())
        .await
    {
        Ok(user) => user,
        Err(err) => {
            tracing::error!("user upsert failed: {err}");
            bot.send_message(chat_id, ui::SERVER_ERROR).await?;
            return Ok(());
        }
    };

    if text == "/start" {
        return handle_start(&bot, &cfg, chat_id, &from.first_name, from.id).await;
    }

    if let Some(channel) = cfg.channel.as_deref()
        && !subscription::is_subscribed(&bot, channel, from.id).await
    {
        bot.send_message(chat_id, ui::SUBSCRIBE_PROMPT)
            .reply_markup(subscription::subscribe_keyboard(channel))
            .await?;
        return Ok(());
    }

    let session = cfg.sessions.get(chat_id).await;

    // An active draft shadows everything but the global back button.
    if let Some(draft) = session.draft.clone() {
        if text == ui::BACK {
            cfg.sessions.clear(chat_id).await;
            return show_main_menu(&bot, &cfg, chat_id).await;
        }
        return finance::handle_draft_input(&bot, &cfg, chat_id, draft, text, now).await;
    }

    match text {
        "/menu" => return show_main_menu(&bot, &cfg, chat_id).await,
        "/help" => {
            bot.send_message(chat_id, ui::help_text()).await?;
            return Ok(());
        }
        _ => {}
    }

    // Fixed menu labels.
    match text {
        ui::INCOME | "Kirim" => {
            cfg.sessions
                .set_menu_context(chat_id, MenuContext::Income)
                .await;
            bot.send_message(chat_id, ui::CHOOSE_MENU)
                .reply_markup(keyboard::submenu())
                .await?;
            return Ok(());
        }
        ui::EXPENSE | "Chiqim" => {
            cfg.sessions
                .set_menu_context(chat_id, MenuContext::Expense)
                .await;
            bot.send_message(chat_id, ui::CHOOSE_MENU)
                .reply_markup(keyboard::submenu())
                .await?;
            return Ok(());
        }
        ui::STATISTICS | "Statistika" => {
            cfg.sessions
                .set_menu_context(chat_id, MenuContext::Statistics)
                .await;
            bot.send_message(chat_id, ui::CHOOSE_PERIOD)
                .reply_markup(keyboard::statistics_menu())
                .await?;
            return Ok(());
        }
        ui::ALL_OPERATIONS => {
            bot.send_message(chat_id, ui::ALL_OPERATIONS_SOON).await?;
            return Ok(());
        }
        ui::ADD => return finance::show_categories(&bot, &cfg, chat_id, session.menu_context).await,
        ui::VIEW => {
            return statistics::show_filters(&bot, &cfg, chat_id, session.menu_context).await;
        }
        ui::BACK => {
            cfg.sessions.clear(chat_id).await;
            return show_main_menu(&bot, &cfg, chat_id).await;
        }
        ui::YEARLY_REPORT => {
            return statistics::send_statistics(&bot, &cfg, chat_id, &user, Period::Year, None, now)
                .await;
        }
        ui::PICK_MONTH => {
            bot.send_message(chat_id, ui::CHOOSE_PERIOD)
                .reply_markup(keyboard::month_picker(now.date(), session.statistics_active))
                .await?;
            return Ok(());
        }
        ui::PICK_YEAR => {
            bot.send_message(chat_id, ui::CHOOSE_PERIOD)
                .reply_markup(keyboard::year_picker(now.date(), session.statistics_active))
                .await?;
            return Ok(());
        }
        ui::PICK_DAY => {
            bot.send_message(chat_id, ui::CHOOSE_PERIOD)
                .reply_markup(keyboard::day_picker(now.date(), true))
                .await?;
            return Ok(());
        }
        ui::PICK_DATE | ui::PICK_DATE_SHORT => {
            bot.send_message(chat_id, ui::CHOOSE_PERIOD)
                .reply_markup(keyboard::day_picker(now.date(), false))
                .await?;
            return Ok(());
        }
        _ => {}
    }

    // Date-filter labels resolve against the statistics flag first,
    // then the menu context.
    if let Some(filter_period) = filter_period(text) {
        return if session.statistics_active {
            statistics::send_statistics(&bot, &cfg, chat_id, &user, filter_period, None, now).await
        } else {
            statistics::send_list(
                &bot,
                &cfg,
                chat_id,
                &user,
                list_kind(&session),
                filter_period,
                None,
                1,
                now,
            )
            .await
        };
    }

    // Patterns: statistics-prefixed month/date, prefixed and bare
    // years, bare month/date, pagination.
    if let Some(rest) = text.strip_prefix("📊 ") {
        if period::parse_month_year(rest).is_some() {
            return statistics::send_statistics(
                &bot,
                &cfg,
                chat_id,
                &user,
                Period::MonthYear,
                Some(rest),
                now,
            )
            .await;
        }
        if period::parse_date_value(rest).is_some() {
            return statistics::send_statistics(
                &bot,
                &cfg,
                chat_id,
                &user,
                Period::Date,
                Some(rest),
                now,
            )
            .await;
        }
    }
    if let Some(rest) = text.strip_prefix("📅 ")
        && parsing::parse_year(rest).is_some()
    {
        return statistics::send_statistics(
            &bot,
            &cfg,
            chat_id,
            &user,
            Period::Year,
            Some(rest),
            now,
        )
        .await;
    }
    if period::parse_month_year(text).is_some() {
        return if session.statistics_active {
            statistics::send_statistics(
                &bot,
                &cfg,
                chat_id,
                &user,
                Period::MonthYear,
                Some(text),
                now,
            )
            .await
        } else {
            statistics::send_list(
                &bot,
                &cfg,
                chat_id,
                &user,
                list_kind(&session),
                Period::MonthYear,
                Some(text.to_string()),
                1,
                now,
            )
            .await
        };
    }
    if parsing::parse_year(text).is_some() {
        return statistics::send_list(
            &bot,
            &cfg,
            chat_id,
            &user,
            list_kind(&session),
            Period::Year,
            Some(text.to_string()),
            1,
            now,
        )
        .await;
    }
    if period::parse_date_value(text).is_some() {
        return if session.statistics_active {
            statistics::send_statistics(&bot, &cfg, chat_id, &user, Period::Date, Some(text), now)
                .await
        } else {
            statistics::send_list(
                &bot,
                &cfg,
                chat_id,
                &user,
                list_kind(&session),
                Period::Date,
                Some(text.to_string()),
                1,
                now,
            )
            .await
        };
    }
    if text == ui::PREV_PAGE || text == ui::NEXT_PAGE {
        return statistics::handle_pagination(&bot, &cfg, chat_id, &user, text == ui::NEXT_PAGE, now)
            .await;
    }

    // Last resort: an exact category name starts the add dialogue,
    // income names checked first.
    match category_by_exact_name(&cfg, text).await {
        Ok(Some(category)) => {
            return finance::start_draft(&bot, &cfg, chat_id, &user, category, now).await;
        }
        Ok(None) => {}
        Err(err) => {
            tracing::error!("category lookup failed: {err}");
            bot.send_message(chat_id, ui::SERVER_ERROR).await?;
            return Ok(());
        }
    }

    if parsing::is_numeric(text) {
        bot.send_message(chat_id, ui::USE_MENU_HINT).await?;
    } else {
        bot.send_message(chat_id, ui::UNKNOWN_COMMAND).await?;
    }
    Ok(())
}

pub(crate) async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    cfg: ConfigParameters,
) -> ResponseResult<()> {
    let Some(message) = q.message.as_ref() else {
        let _ = bot.answer_callback_query(q.id.clone()).await;
        return Ok(());
    };
    let chat_id = message.chat().id;
    let _ = bot.answer_callback_query(q.id.clone()).await;

    let Some(data) = q.data.as_deref() else {
        return Ok(());
    };
    let now = now_tashkent();

    if data == "check_subscription" || data == "manual_check_subscription" {
        let subscribed = match cfg.channel.as_deref() {
            Some(channel) => subscription::is_subscribed(&bot, channel, q.from.id).await,
            None => true,
        };
        if subscribed {
            bot.send_message(chat_id, ui::SUBSCRIBED_OK).await?;
            return show_main_menu(&bot, &cfg, chat_id).await;
        }
        let markup = cfg.channel.as_deref().map(subscription::subscribe_keyboard);
        let mut request = bot.send_message(chat_id, ui::STILL_NOT_SUBSCRIBED);
        if let Some(markup) = markup {
            request = request.reply_markup(markup);
        }
        request.await?;
        return Ok(());
    }

    let user = match cfg
        .engine
        .upsert_user(chat_id.0, Some(&q.from.first_name), q.from.username.as_deref())
        .await
    {
        Ok(user) => user,
        Err(err) => {
            tracing::error!("user upsert failed: {err}");
            bot.send_message(chat_id, ui::SERVER_ERROR).await?;
            return Ok(());
        }
    };

    if data == "main_menu" {
        cfg.sessions.clear(chat_id).await;
        return show_main_menu(&bot, &cfg, chat_id).await;
    }
    if data == "income_menu" || data == "expense_menu" {
        let context = if data == "income_menu" {
            MenuContext::Income
        } else {
            MenuContext::Expense
        };
        cfg.sessions.set_menu_context(chat_id, context).await;
        bot.send_message(chat_id, ui::CHOOSE_MENU)
            .reply_markup(keyboard::submenu())
            .await?;
        return Ok(());
    }
    if data == "add_income" || data == "add_expense" {
        let kind = if data == "add_income" {
            TxKind::Income
        } else {
            TxKind::Expense
        };
        let context = match kind {
            TxKind::Income => MenuContext::Income,
            TxKind::Expense => MenuContext::Expense,
        };
        cfg.sessions.set_menu_context(chat_id, context).await;
        return finance::show_categories_of_kind(&bot, &cfg, chat_id, kind).await;
    }
    if let Some(id) = data.strip_prefix("income_cat_") {
        return finance::start_draft_by_id(&bot, &cfg, chat_id, &user, id, TxKind::Income, now)
            .await;
    }
    if let Some(id) = data.strip_prefix("expense_cat_") {
        return finance::start_draft_by_id(&bot, &cfg, chat_id, &user, id, TxKind::Expense, now)
            .await;
    }
    if let Some(rest) = data.strip_prefix("view_income") {
        return handle_view_callback(&bot, &cfg, chat_id, &user, TxKind::Income, rest, now).await;
    }
    if let Some(rest) = data.strip_prefix("view_expense") {
        return handle_view_callback(&bot, &cfg, chat_id, &user, TxKind::Expense, rest, now).await;
    }

    tracing::warn!(data, "unknown callback payload");
    Ok(())
}

async fn handle_view_callback(
    bot: &Bot,
    cfg: &ConfigParameters,
    chat_id: ChatId,
    user: &engine::users::Model,
    kind: TxKind,
    rest: &str,
    now: NaiveDateTime,
) -> ResponseResult<()> {
    let context = match kind {
        TxKind::Income => MenuContext::Income,
        TxKind::Expense => MenuContext::Expense,
    };
    cfg.sessions.set_menu_context(chat_id, context).await;

    let Some(suffix) = rest.strip_prefix('_') else {
        bot.send_message(chat_id, ui::CHOOSE_PERIOD)
            .reply_markup(keyboard::list_filters())
            .await?;
        return Ok(());
    };
    let Some(callback_period) = callback_period(suffix) else {
        tracing::warn!(suffix, "unknown view period suffix");
        bot.send_message(chat_id, ui::CHOOSE_PERIOD)
            .reply_markup(keyboard::list_filters())
            .await?;
        return Ok(());
    };
    statistics::send_list(bot, cfg, chat_id, user, kind, callback_period, None, 1, now).await
}

async fn handle_start(
    bot: &Bot,
    cfg: &ConfigParameters,
    chat_id: ChatId,
    name: &str,
    user_id: UserId,
) -> ResponseResult<()> {
    if let Some(channel) = cfg.channel.as_deref()
        && !subscription::is_subscribed(bot, channel, user_id).await
    {
        bot.send_message(chat_id, ui::SUBSCRIBE_PROMPT)
            .reply_markup(subscription::subscribe_keyboard(channel))
            .await?;
        return Ok(());
    }

    cfg.sessions.clear(chat_id).await;
    seed_categories(cfg).await;
    // The greeting carries no keyboard; the text points at /menu.
    bot.send_message(chat_id, ui::greeting(name)).await?;
    Ok(())
}

async fn show_main_menu(bot: &Bot, cfg: &ConfigParameters, chat_id: ChatId) -> ResponseResult<()> {
    seed_categories(cfg).await;
    bot.send_message(chat_id, ui::CHOOSE_MENU)
        .reply_markup(keyboard::main_menu())
        .await?;
    Ok(())
}

async fn seed_categories(cfg: &ConfigParameters) {
    if let Err(err) = cfg.engine.ensure_default_categories().await {
        tracing::error!("category seeding failed: {err}");
    }
}

fn filter_period(text: &str) -> Option<Period> {
    match text {
        ui::TODAY => Some(Period::Today),
        ui::YESTERDAY => Some(Period::Yesterday),
        ui::THIS_WEEK => Some(Period::ThisWeek),
        ui::LAST_WEEK => Some(Period::LastWeek),
        ui::THIS_MONTH => Some(Period::ThisMonth),
        ui::LAST_MONTH => Some(Period::LastMonth),
        _ => None,
    }
}

fn callback_period(suffix: &str) -> Option<Period> {
    match suffix {
        "today" => Some(Period::Today),
        "yesterday" => Some(Period::Yesterday),
        "week" => Some(Period::ThisWeek),
        "last_week" => Some(Period::LastWeek),
        "month" => Some(Period::ThisMonth),
        "last_month" => Some(Period::LastMonth),
        _ => None,
    }
}

/// List views default to incomes when the menu context is gone.
fn list_kind(session: &Session) -> TxKind {
    match session.menu_context {
        Some(MenuContext::Expense) => TxKind::Expense,
        _ => TxKind::Income,
    }
}

async fn category_by_exact_name(
    cfg: &ConfigParameters,
    text: &str,
) -> Result<Option<categories::Model>, engine::EngineError> {
    if let Some(category) = cfg.engine.category_by_name(text, TxKind::Income).await? {
        return Ok(Some(category));
    }
    cfg.engine.category_by_name(text, TxKind::Expense).await
}
