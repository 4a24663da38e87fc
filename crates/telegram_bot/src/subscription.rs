//! Channel-subscription gate.
//!
//! When a channel is configured, users must be subscribed before using
//! the bot. A failing membership check counts as subscribed so that
//! Telegram API hiccups never lock anyone out.

use teloxide::{
    prelude::*,
    types::{ChatMemberStatus, InlineKeyboardButton, InlineKeyboardMarkup, Recipient, UserId},
};
use url::Url;

pub(crate) async fn is_subscribed(bot: &Bot, channel: &str, user_id: UserId) -> bool {
    let recipient = match channel.parse::<i64>() {
        Ok(id) => Recipient::Id(ChatId(id)),
        Err(_) => Recipient::ChannelUsername(format!("@{}", channel.trim_start_matches('@'))),
    };

    match bot.get_chat_member(recipient, user_id).await {
        Ok(member) => matches!(
            member.status(),
            ChatMemberStatus::Member | ChatMemberStatus::Administrator | ChatMemberStatus::Owner
        ),
        Err(err) => {
            tracing::warn!("subscription check failed: {err}");
            true
        }
    }
}

pub(crate) fn subscribe_keyboard(channel: &str) -> InlineKeyboardMarkup {
    let username = channel.trim_start_matches('@');
    let mut rows = Vec::new();
    if let Ok(url) = format!("https://t.me/{username}").parse::<Url>() {
        rows.push(vec![InlineKeyboardButton::url("📢 Kanalga o'tish", url)]);
    }
    rows.push(vec![InlineKeyboardButton::callback(
        "✅ Tekshirish",
        "check_subscription",
    )]);
    InlineKeyboardMarkup::new(rows)
}
