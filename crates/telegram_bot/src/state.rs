//! Per-chat session state with per-field expiry.
//!
//! Each chat carries four independent fields (menu context, the
//! statistics flag, the transaction draft, the pagination cursor).
//! Every field has its own time-to-live and expires on its own, so a
//! chat can lose its pagination cursor while the draft is still alive.
//! Expired fields simply read back as absent.

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use chrono::NaiveDate;
use engine::{Period, TxKind};
use teloxide::types::ChatId;
use tokio::sync::Mutex;

pub(crate) const MENU_CONTEXT_TTL: Duration = Duration::from_secs(300);
pub(crate) const STATISTICS_TTL: Duration = Duration::from_secs(300);
pub(crate) const DRAFT_TTL: Duration = Duration::from_secs(600);
pub(crate) const PAGINATION_TTL: Duration = Duration::from_secs(300);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum MenuContext {
    Income,
    Expense,
    Statistics,
}

/// Steps of the add-transaction dialogue, strictly forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DraftStep {
    Date,
    Amount,
    Description,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SelectedDate {
    Today,
    Yesterday,
    Day(NaiveDate),
}

#[derive(Clone, Debug)]
pub(crate) struct TransactionDraft {
    pub user_id: i32,
    pub category_id: i32,
    pub category_name: String,
    pub kind: TxKind,
    pub step: DraftStep,
    pub selected_date: Option<SelectedDate>,
    pub amount: Option<i64>,
}

/// Cached list-view query, so a bare pagination button press can
/// reconstruct the page it belongs to.
#[derive(Clone, Debug)]
pub(crate) struct PageState {
    pub page: u64,
    pub kind: TxKind,
    pub period: Period,
    pub value: Option<String>,
}

#[derive(Clone, Debug)]
struct Expiring<T> {
    value: T,
    expires_at: Instant,
}

impl<T> Expiring<T> {
    fn new(value: T, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + ttl,
        }
    }

    fn live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

#[derive(Clone, Debug, Default)]
struct ChatSession {
    menu_context: Option<Expiring<MenuContext>>,
    statistics_active: Option<Expiring<()>>,
    draft: Option<Expiring<TransactionDraft>>,
    pagination: Option<Expiring<PageState>>,
}

impl ChatSession {
    fn prune(&mut self, now: Instant) {
        if self.menu_context.as_ref().is_some_and(|e| !e.live(now)) {
            self.menu_context = None;
        }
        if self.statistics_active.as_ref().is_some_and(|e| !e.live(now)) {
            self.statistics_active = None;
        }
        if self.draft.as_ref().is_some_and(|e| !e.live(now)) {
            self.draft = None;
        }
        if self.pagination.as_ref().is_some_and(|e| !e.live(now)) {
            self.pagination = None;
        }
    }

    fn snapshot(&mut self, now: Instant) -> Session {
        self.prune(now);
        Session {
            menu_context: self.menu_context.as_ref().map(|e| e.value),
            statistics_active: self.statistics_active.is_some(),
            draft: self.draft.as_ref().map(|e| e.value.clone()),
            pagination: self.pagination.as_ref().map(|e| e.value.clone()),
        }
    }
}

/// Live view of one chat's session, with expired fields removed.
#[derive(Clone, Debug, Default)]
pub(crate) struct Session {
    pub menu_context: Option<MenuContext>,
    pub statistics_active: bool,
    pub draft: Option<TransactionDraft>,
    pub pagination: Option<PageState>,
}

#[derive(Clone, Default)]
pub(crate) struct SessionStore {
    inner: Arc<Mutex<HashMap<ChatId, ChatSession>>>,
}

impl SessionStore {
    pub(crate) async fn get(&self, chat_id: ChatId) -> Session {
        let mut guard = self.inner.lock().await;
        match guard.get_mut(&chat_id) {
            Some(session) => session.snapshot(Instant::now()),
            None => Session::default(),
        }
    }

    /// Selecting a menu also drops the statistics flag, unless the
    /// menu selected is the statistics one.
    pub(crate) async fn set_menu_context(&self, chat_id: ChatId, context: MenuContext) {
        let mut guard = self.inner.lock().await;
        let session = guard.entry(chat_id).or_default();
        session.menu_context = Some(Expiring::new(context, MENU_CONTEXT_TTL));
        session.statistics_active = (context == MenuContext::Statistics)
            .then(|| Expiring::new((), STATISTICS_TTL));
    }

    pub(crate) async fn set_draft(&self, chat_id: ChatId, draft: TransactionDraft) {
        let mut guard = self.inner.lock().await;
        let session = guard.entry(chat_id).or_default();
        session.draft = Some(Expiring::new(draft, DRAFT_TTL));
    }

    pub(crate) async fn clear_draft(&self, chat_id: ChatId) {
        let mut guard = self.inner.lock().await;
        if let Some(session) = guard.get_mut(&chat_id) {
            session.draft = None;
        }
    }

    pub(crate) async fn set_pagination(&self, chat_id: ChatId, page: PageState) {
        let mut guard = self.inner.lock().await;
        let session = guard.entry(chat_id).or_default();
        session.pagination = Some(Expiring::new(page, PAGINATION_TTL));
    }

    /// The global back button: every field goes at once.
    pub(crate) async fn clear(&self, chat_id: ChatId) {
        let mut guard = self.inner.lock().await;
        guard.remove(&chat_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> TransactionDraft {
        TransactionDraft {
            user_id: 1,
            category_id: 2,
            category_name: "🍕 Oziq-ovqat".to_string(),
            kind: TxKind::Expense,
            step: DraftStep::Date,
            selected_date: None,
            amount: None,
        }
    }

    #[test]
    fn fields_expire_independently() {
        let mut session = ChatSession {
            menu_context: Some(Expiring::new(MenuContext::Income, Duration::ZERO)),
            statistics_active: None,
            draft: Some(Expiring::new(draft(), Duration::from_secs(600))),
            pagination: Some(Expiring::new(
                PageState {
                    page: 2,
                    kind: TxKind::Expense,
                    period: Period::Today,
                    value: None,
                },
                Duration::ZERO,
            )),
        };

        let view = session.snapshot(Instant::now() + Duration::from_millis(1));
        assert_eq!(view.menu_context, None);
        assert!(view.pagination.is_none());
        assert!(view.draft.is_some());
    }

    #[tokio::test]
    async fn statistics_menu_sets_the_flag_and_other_menus_drop_it() {
        let store = SessionStore::default();
        let chat = ChatId(7);

        store.set_menu_context(chat, MenuContext::Statistics).await;
        assert!(store.get(chat).await.statistics_active);

        store.set_menu_context(chat, MenuContext::Expense).await;
        let session = store.get(chat).await;
        assert!(!session.statistics_active);
        assert_eq!(session.menu_context, Some(MenuContext::Expense));
    }

    #[tokio::test]
    async fn clear_drops_every_field() {
        let store = SessionStore::default();
        let chat = ChatId(7);

        store.set_menu_context(chat, MenuContext::Income).await;
        store.set_draft(chat, draft()).await;
        store
            .set_pagination(
                chat,
                PageState {
                    page: 1,
                    kind: TxKind::Income,
                    period: Period::ThisMonth,
                    value: None,
                },
            )
            .await;

        store.clear(chat).await;
        let session = store.get(chat).await;
        assert!(session.menu_context.is_none());
        assert!(session.draft.is_none());
        assert!(session.pagination.is_none());
    }

    #[tokio::test]
    async fn unknown_chat_reads_as_empty() {
        let store = SessionStore::default();
        let session = store.get(ChatId(99)).await;
        assert!(session.draft.is_none());
        assert!(!session.statistics_active);
    }
}
