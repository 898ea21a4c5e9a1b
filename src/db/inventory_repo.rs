// src/db/inventory_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::inventory::{InventoryLogEntry, InventoryLogFilter, NewInventoryLog, StockDirection},
};

#[derive(Clone)]
pub struct InventoryRepository {
    pool: PgPool,
}

impl InventoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Registra uma movimentação no livro-razão (auditoria).
    pub async fn record_entry<'e, E>(
        &self,
        executor: E,
        entry: &NewInventoryLog,
    ) -> Result<InventoryLogEntry, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let logged = sqlx::query_as::<_, InventoryLogEntry>(
            r#"
            INSERT INTO inventory_logs (
                menu_item_id, action, quantity_changed, stock_after, actor_id, order_id
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(entry.menu_item_id)
        .bind(entry.action)
        .bind(entry.quantity_changed)
        .bind(entry.stock_after)
        .bind(entry.actor_id)
        .bind(entry.order_id)
        .fetch_one(executor)
        .await?;

        Ok(logged)
    }

    pub async fn list_entries(
        &self,
        filter: &InventoryLogFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<InventoryLogEntry>, AppError> {
        // direção: 1 = entrada, -1 = saída, NULL = qualquer
        let direction: Option<i32> = filter.direction.map(|d| match d {
            StockDirection::Up => 1,
            StockDirection::Down => -1,
        });

        let entries = sqlx::query_as::<_, InventoryLogEntry>(
            r#"
            SELECT * FROM inventory_logs
            WHERE ($1::inventory_action IS NULL OR action = $1)
              AND ($2::int IS NULL
                   OR ($2 > 0 AND quantity_changed > 0)
                   OR ($2 < 0 AND quantity_changed < 0))
              AND ($3::bigint IS NULL OR menu_item_id = $3)
            ORDER BY created_at DESC, id DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(filter.action)
        .bind(direction)
        .bind(filter.menu_item_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}
