// src/db/menu_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};

use crate::{common::error::AppError, models::menu::MenuItem};

#[derive(Clone)]
pub struct MenuRepository {
    pool: PgPool,
}

impl MenuRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Funções de "Leitura"
    // ---
    // Leituras simples usam a pool principal.

    pub async fn get_active_menu_items(&self) -> Result<Vec<MenuItem>, AppError> {
        let items = sqlx::query_as::<_, MenuItem>(
            "SELECT * FROM menu_items WHERE is_active ORDER BY name ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    pub async fn get_items_by_ids<'e, E>(
        &self,
        executor: E,
        ids: &[i64],
    ) -> Result<Vec<MenuItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, MenuItem>(
            "SELECT * FROM menu_items WHERE id = ANY($1) ORDER BY id ASC",
        )
        .bind(ids)
        .fetch_all(executor)
        .await?;
        Ok(items)
    }

    /// Trava as linhas dos itens até o fim da transação.
    /// A ordem crescente de id evita deadlock entre dois checkouts simultâneos.
    pub async fn lock_items_for_update<'e, E>(
        &self,
        executor: E,
        ids: &[i64],
    ) -> Result<Vec<MenuItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, MenuItem>(
            "SELECT * FROM menu_items WHERE id = ANY($1) ORDER BY id ASC FOR UPDATE",
        )
        .bind(ids)
        .fetch_all(executor)
        .await?;
        Ok(items)
    }

    // ---
    // Funções de "Escrita" (Transacionais)
    // ---

    /// Baixa o estoque só se houver saldo. Devolve o saldo resultante,
    /// ou None se o item não tem estoque controlado ou o saldo não cobre.
    pub async fn decrement_stock<'e, E>(
        &self,
        executor: E,
        item_id: i64,
        quantity: i32,
    ) -> Result<Option<i32>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let stock_after = sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE menu_items
            SET stock_qty = stock_qty - $2, updated_at = NOW()
            WHERE id = $1 AND stock_qty IS NOT NULL AND stock_qty >= $2
            RETURNING stock_qty
            "#,
        )
        .bind(item_id)
        .bind(quantity)
        .fetch_optional(executor)
        .await?;
        Ok(stock_after)
    }

    /// Devolve unidades ao estoque (cancelamento). None se o item não é controlado.
    pub async fn increment_stock<'e, E>(
        &self,
        executor: E,
        item_id: i64,
        quantity: i32,
    ) -> Result<Option<i32>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let stock_after = sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE menu_items
            SET stock_qty = stock_qty + $2, updated_at = NOW()
            WHERE id = $1 AND stock_qty IS NOT NULL
            RETURNING stock_qty
            "#,
        )
        .bind(item_id)
        .bind(quantity)
        .fetch_optional(executor)
        .await?;
        Ok(stock_after)
    }

    pub async fn create_item<'e, E>(
        &self,
        executor: E,
        name: &str,
        price: Decimal,
        stock_qty: Option<i32>,
        is_active: bool,
    ) -> Result<MenuItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, MenuItem>(
            r#"
            INSERT INTO menu_items (name, price, stock_qty, is_active)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(price)
        .bind(stock_qty)
        .bind(is_active)
        .fetch_one(executor)
        .await?;
        Ok(item)
    }

    pub async fn find_by_id_for_update<'e, E>(
        &self,
        executor: E,
        item_id: i64,
    ) -> Result<Option<MenuItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, MenuItem>(
            "SELECT * FROM menu_items WHERE id = $1 FOR UPDATE",
        )
        .bind(item_id)
        .fetch_optional(executor)
        .await?;
        Ok(item)
    }

    pub async fn update_item<'e, E>(
        &self,
        executor: E,
        item_id: i64,
        name: &str,
        price: Decimal,
        stock_qty: Option<i32>,
        is_active: bool,
    ) -> Result<MenuItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, MenuItem>(
            r#"
            UPDATE menu_items
            SET name = $2, price = $3, stock_qty = $4, is_active = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(item_id)
        .bind(name)
        .bind(price)
        .bind(stock_qty)
        .bind(is_active)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::ItemNotFound(item_id))
    }

    /// Há linha de pedido apontando para o item? (a FK impede o DELETE)
    pub async fn is_referenced_by_orders<'e, E>(
        &self,
        executor: E,
        item_id: i64,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let referenced = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM order_lines WHERE menu_item_id = $1)",
        )
        .bind(item_id)
        .fetch_one(executor)
        .await?;
        Ok(referenced)
    }

    pub async fn deactivate_item<'e, E>(
        &self,
        executor: E,
        item_id: i64,
    ) -> Result<MenuItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, MenuItem>(
            r#"
            UPDATE menu_items
            SET is_active = FALSE, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(item_id)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::ItemNotFound(item_id))
    }

    /// Remove o item (o histórico de estoque vai junto, por cascata).
    pub async fn delete_item<'e, E>(&self, executor: E, item_id: i64) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM menu_items WHERE id = $1")
            .bind(item_id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::ItemNotFound(item_id));
        }
        Ok(())
    }
}
