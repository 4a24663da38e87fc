//! Storage and reporting engine for the finance bot.
//!
//! The engine owns the database connection and exposes the operations
//! the bot needs: user upserts, the category registry, transaction
//! writes with a caller-supplied date, paged transaction lists and
//! per-category statistics.

use chrono::NaiveDateTime;
use sea_orm::{
    ActiveValue, DatabaseConnection, PaginatorTrait, QueryFilter, QueryOrder, prelude::*,
};

pub use error::EngineError;
pub use period::{DateRange, Period};
pub use report::{CategorySum, Report};
pub use transactions::TxKind;

pub mod categories;
mod error;
pub mod period;
mod report;
pub mod transactions;
pub mod users;

type ResultEngine<T> = Result<T, EngineError>;

/// Transactions per page in list views.
pub const PAGE_SIZE: u64 = 10;

const DEFAULT_INCOME_CATEGORIES: [&str; 6] = [
    "💼 Ish haqi",
    "💰 Biznes",
    "🎁 Sovg'a",
    "💵 Qo'shimcha daromad",
    "🏦 Investitsiya",
    "📈 Foydalar",
];

const DEFAULT_EXPENSE_CATEGORIES: [&str; 10] = [
    "🍕 Oziq-ovqat",
    "🚗 Transport",
    "🏠 Uy-joy",
    "👕 Kiyim-kechak",
    "💊 Sog'liq",
    "🎓 Ta'lim",
    "🎮 O'yin-kulgi",
    "📱 Aloqa",
    "⚡ Kommunal",
    "🛒 Xaridlar",
];

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

/// One page of a transaction list, with the resolved category names.
#[derive(Clone, Debug)]
pub struct TransactionPage {
    pub items: Vec<(transactions::Model, String)>,
    pub page: u64,
    pub pages: u64,
    pub total: u64,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub(crate) fn database(&self) -> &DatabaseConnection {
        &self.database
    }

    /// Inserts the user on first contact, refreshes name and username
    /// on later ones.
    pub async fn upsert_user(
        &self,
        chat_id: i64,
        name: Option<&str>,
        username: Option<&str>,
    ) -> ResultEngine<users::Model> {
        let existing = users::Entity::find()
            .filter(users::Column::ChatId.eq(chat_id))
            .one(&self.database)
            .await?;

        match existing {
            Some(user) => {
                if user.name.as_deref() == name && user.username.as_deref() == username {
                    return Ok(user);
                }
                let mut active: users::ActiveModel = user.into();
                active.name = ActiveValue::Set(name.map(str::to_string));
                active.username = ActiveValue::Set(username.map(str::to_string));
                Ok(active.update(&self.database).await?)
            }
            None => {
                let active = users::ActiveModel {
                    chat_id: ActiveValue::Set(chat_id),
                    name: ActiveValue::Set(name.map(str::to_string)),
                    username: ActiveValue::Set(username.map(str::to_string)),
                    ..Default::default()
                };
                Ok(active.insert(&self.database).await?)
            }
        }
    }

    pub async fn user_by_chat(&self, chat_id: i64) -> ResultEngine<Option<users::Model>> {
        Ok(users::Entity::find()
            .filter(users::Column::ChatId.eq(chat_id))
            .one(&self.database)
            .await?)
    }

    /// Seeds the default Uzbek categories. Idempotent: already-present
    /// names are left untouched.
    pub async fn ensure_default_categories(&self) -> ResultEngine<()> {
        for name in DEFAULT_INCOME_CATEGORIES {
            self.first_or_create_category(name, TxKind::Income).await?;
        }
        for name in DEFAULT_EXPENSE_CATEGORIES {
            self.first_or_create_category(name, TxKind::Expense).await?;
        }
        Ok(())
    }

    async fn first_or_create_category(
        &self,
        name: &str,
        kind: TxKind,
    ) -> ResultEngine<categories::Model> {
        if let Some(category) = self.category_by_name(name, kind).await? {
            return Ok(category);
        }
        let active = categories::ActiveModel {
            name: ActiveValue::Set(name.to_string()),
            kind: ActiveValue::Set(kind),
            ..Default::default()
        };
        Ok(active.insert(&self.database).await?)
    }

    pub async fn categories(&self, kind: TxKind) -> ResultEngine<Vec<categories::Model>> {
        Ok(categories::Entity::find()
            .filter(categories::Column::Kind.eq(kind))
            .order_by_asc(categories::Column::Id)
            .all(&self.database)
            .await?)
    }

    pub async fn category(&self, id: i32) -> ResultEngine<categories::Model> {
        categories::Entity::find_by_id(id)
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("category {id}")))
    }

    pub async fn category_by_name(
        &self,
        name: &str,
        kind: TxKind,
    ) -> ResultEngine<Option<categories::Model>> {
        Ok(categories::Entity::find()
            .filter(categories::Column::Name.eq(name))
            .filter(categories::Column::Kind.eq(kind))
            .one(&self.database)
            .await?)
    }

    /// Persists one transaction. `created_at` is the user-selected
    /// local date, not the insert time.
    pub async fn add_transaction(
        &self,
        user_id: i32,
        category_id: i32,
        kind: TxKind,
        amount: i64,
        description: Option<&str>,
        created_at: NaiveDateTime,
    ) -> ResultEngine<transactions::Model> {
        if amount <= 0 {
            return Err(EngineError::InvalidAmount(amount.to_string()));
        }
        let category = self.category(category_id).await?;
        if category.kind != kind {
            return Err(EngineError::KeyNotFound(format!(
                "category {category_id} has a different kind"
            )));
        }

        let active = transactions::ActiveModel {
            user_id: ActiveValue::Set(user_id),
            category_id: ActiveValue::Set(category_id),
            kind: ActiveValue::Set(kind),
            amount: ActiveValue::Set(amount),
            description: ActiveValue::Set(description.map(str::to_string)),
            created_at: ActiveValue::Set(created_at),
            ..Default::default()
        };
        Ok(active.insert(&self.database).await?)
    }

    /// One page of a user's transactions of one kind within a range,
    /// newest first. `page` is 1-based; out-of-range pages come back
    /// empty rather than erroring.
    pub async fn transactions_page(
        &self,
        user_id: i32,
        kind: TxKind,
        range: DateRange,
        page: u64,
    ) -> ResultEngine<TransactionPage> {
        let page = page.max(1);
        let paginator = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id))
            .filter(transactions::Column::Kind.eq(kind))
            .filter(transactions::Column::CreatedAt.gte(range.0))
            .filter(transactions::Column::CreatedAt.lt(range.1))
            .order_by_desc(transactions::Column::CreatedAt)
            .order_by_desc(transactions::Column::Id)
            .find_also_related(categories::Entity)
            .paginate(&self.database, PAGE_SIZE);

        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page - 1).await?;

        let items = rows
            .into_iter()
            .map(|(tx, category)| {
                let name = category.map(|c| c.name).unwrap_or_default();
                (tx, name)
            })
            .collect();

        Ok(TransactionPage {
            items,
            page,
            pages: total.div_ceil(PAGE_SIZE),
            total,
        })
    }
}

#[derive(Default)]
pub struct EngineBuilder {
    database: Option<DatabaseConnection>,
}

impl EngineBuilder {
    pub fn database(mut self, database: DatabaseConnection) -> EngineBuilder {
        self.database = Some(database);
        self
    }

    pub async fn build(self) -> ResultEngine<Engine> {
        let database = self
            .database
            .ok_or_else(|| EngineError::KeyNotFound("database".to_string()))?;
        Ok(Engine { database })
    }
}
