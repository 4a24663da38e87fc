//! Statistics reports, transaction list views and pagination.

use chrono::NaiveDateTime;
use engine::{Period, TxKind, period, users};
use teloxide::prelude::*;

use crate::{
    ConfigParameters, keyboard,
    state::{MenuContext, PageState},
    ui,
};

pub(super) async fn show_filters(
    bot: &Bot,
    _cfg: &ConfigParameters,
    chat_id: ChatId,
    context: Option<MenuContext>,
) -> ResponseResult<()> {
    if !matches!(context, Some(MenuContext::Income) | Some(MenuContext::Expense)) {
        bot.send_message(chat_id, ui::USE_MENU_HINT).await?;
        return Ok(());
    }
    bot.send_message(chat_id, ui::CHOOSE_PERIOD)
        .reply_markup(keyboard::list_filters())
        .await?;
    Ok(())
}

pub(super) async fn send_statistics(
    bot: &Bot,
    cfg: &ConfigParameters,
    chat_id: ChatId,
    user: &users::Model,
    stats_period: Period,
    value: Option<&str>,
    now: NaiveDateTime,
) -> ResponseResult<()> {
    let range = period::resolve(stats_period, value, now);
    let report = match cfg.engine.statistics(user.id, range).await {
        Ok(report) => report,
        Err(err) => {
            tracing::error!("statistics query failed: {err}");
            bot.send_message(chat_id, ui::SERVER_ERROR).await?;
            return Ok(());
        }
    };

    // Refreshes the statistics flag, so follow-up filter presses keep
    // resolving to reports.
    cfg.sessions
        .set_menu_context(chat_id, MenuContext::Statistics)
        .await;

    let label = ui::period_label(stats_period, value, now);
    bot.send_message(chat_id, ui::render_statistics(&report, &label))
        .reply_markup(keyboard::statistics_menu())
        .await?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub(super) async fn send_list(
    bot: &Bot,
    cfg: &ConfigParameters,
    chat_id: ChatId,
    user: &users::Model,
    kind: TxKind,
    list_period: Period,
    value: Option<String>,
    page: u64,
    now: NaiveDateTime,
) -> ResponseResult<()> {
    let range = period::resolve(list_period, value.as_deref(), now);
    let mut list = match cfg
        .engine
        .transactions_page(user.id, kind, range, page)
        .await
    {
        Ok(list) => list,
        Err(err) => {
            tracing::error!("transaction list failed: {err}");
            bot.send_message(chat_id, ui::SERVER_ERROR).await?;
            return Ok(());
        }
    };

    // A racing insert or delete can strand the cursor past the last
    // page; snap back to it.
    if list.items.is_empty() && list.total > 0 && list.page > list.pages {
        list = match cfg
            .engine
            .transactions_page(user.id, kind, range, list.pages)
            .await
        {
            Ok(list) => list,
            Err(err) => {
                tracing::error!("transaction list failed: {err}");
                bot.send_message(chat_id, ui::SERVER_ERROR).await?;
                return Ok(());
            }
        };
    }

    cfg.sessions
        .set_pagination(
            chat_id,
            PageState {
                page: list.page,
                kind,
                period: list_period,
                value: value.clone(),
            },
        )
        .await;

    let label = ui::period_label(list_period, value.as_deref(), now);
    let text = ui::render_list(&list, kind, list_period, &label);
    let markup = if list.total == 0 {
        keyboard::list_filters()
    } else {
        keyboard::pagination(list.page > 1, list.page < list.pages)
    };
    bot.send_message(chat_id, text).reply_markup(markup).await?;
    Ok(())
}

/// A bare pagination press reconstructs its query from the cached page
/// state. An expired cursor degrades to the menu hint; `Oldingi` on
/// page one is a no-op.
pub(super) async fn handle_pagination(
    bot: &Bot,
    cfg: &ConfigParameters,
    chat_id: ChatId,
    user: &users::Model,
    forward: bool,
    now: NaiveDateTime,
) -> ResponseResult<()> {
    let Some(page_state) = cfg.sessions.get(chat_id).await.pagination else {
        bot.send_message(chat_id, ui::USE_MENU_HINT).await?;
        return Ok(());
    };

    let page = if forward {
        page_state.page + 1
    } else {
        if page_state.page <= 1 {
            return Ok(());
        }
        page_state.page - 1
    };

    send_list(
        bot,
        cfg,
        chat_id,
        user,
        page_state.kind,
        page_state.period,
        page_state.value,
        page,
        now,
    )
    .await
}
