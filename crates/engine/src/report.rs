//! Per-category aggregation for statistics reports.

use sea_orm::{ConnectionTrait, Statement};

use crate::{Engine, ResultEngine, period::DateRange, transactions::TxKind};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategorySum {
    pub category: String,
    pub total: i64,
}

/// Aggregated totals for one user over one date range.
#[derive(Clone, Debug, Default)]
pub struct Report {
    pub incomes: Vec<CategorySum>,
    pub expenses: Vec<CategorySum>,
    pub total_income: i64,
    pub total_expense: i64,
}

impl Report {
    pub fn balance(&self) -> i64 {
        self.total_income - self.total_expense
    }
}

impl Engine {
    /// Builds the statistics report: per-category sums for both kinds
    /// plus the grand totals. Categories with no transactions in the
    /// range do not appear.
    pub async fn statistics(&self, user_id: i32, range: DateRange) -> ResultEngine<Report> {
        let incomes = self.sums_by_category(user_id, TxKind::Income, range).await?;
        let expenses = self
            .sums_by_category(user_id, TxKind::Expense, range)
            .await?;

        let total_income = incomes.iter().map(|s| s.total).sum();
        let total_expense = expenses.iter().map(|s| s.total).sum();

        Ok(Report {
            incomes,
            expenses,
            total_income,
            total_expense,
        })
    }

    async fn sums_by_category(
        &self,
        user_id: i32,
        kind: TxKind,
        range: DateRange,
    ) -> ResultEngine<Vec<CategorySum>> {
        let backend = self.database().get_database_backend();
        let rows = self
            .database()
            .query_all(Statement::from_sql_and_values(
                backend,
                "SELECT c.name AS name, COALESCE(SUM(t.amount), 0) AS total \
                 FROM transactions t \
                 INNER JOIN categories c ON c.id = t.category_id \
                 WHERE t.user_id = ? AND t.kind = ? \
                   AND t.created_at >= ? AND t.created_at < ? \
                 GROUP BY c.id, c.name \
                 HAVING SUM(t.amount) <> 0 \
                 ORDER BY total DESC, name ASC;",
                vec![user_id.into(), kind.into(), range.0.into(), range.1.into()],
            ))
            .await?;

        let mut sums = Vec::with_capacity(rows.len());
        for row in rows {
            sums.push(CategorySum {
                category: row.try_get("", "name")?,
                total: row.try_get("", "total")?,
            });
        }
        Ok(sums)
    }
}
