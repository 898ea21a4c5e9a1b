// src/db/order_repo.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::order::{Order, OrderFilter, OrderLine, PaymentMethod},
};

#[derive(Clone)]
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  CRIAÇÃO
    // =========================================================================

    pub async fn insert_order<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        payment_method: PaymentMethod,
        total: Decimal,
        pickup_code_hash: Option<&str>,
        pickup_code_expires_at: Option<DateTime<Utc>>,
    ) -> Result<Order, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, Order>(
            r#"
            INSERT INTO orders (
                user_id, payment_method, payment_status, total,
                pickup_code_hash, pickup_code_expires_at
            )
            VALUES ($1, $2, 'pending', $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(payment_method)
        .bind(total)
        .bind(pickup_code_hash)
        .bind(pickup_code_expires_at)
        .fetch_one(executor)
        .await?;

        Ok(order)
    }

    pub async fn insert_line<'e, E>(
        &self,
        executor: E,
        order_id: i64,
        menu_item_id: i64,
        quantity: i32,
        unit_price: Decimal,
    ) -> Result<OrderLine, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let line = sqlx::query_as::<_, OrderLine>(
            r#"
            INSERT INTO order_lines (order_id, menu_item_id, quantity, unit_price)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(order_id)
        .bind(menu_item_id)
        .bind(quantity)
        .bind(unit_price)
        .fetch_one(executor)
        .await?;

        Ok(line)
    }

    // =========================================================================
    //  CONSULTAS
    // =========================================================================

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        order_id: i64,
    ) -> Result<Option<Order>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
            .bind(order_id)
            .fetch_optional(executor)
            .await?;
        Ok(order)
    }

    /// Trava o pedido até o fim da transação (verificação / ações do admin).
    pub async fn find_by_id_for_update<'e, E>(
        &self,
        executor: E,
        order_id: i64,
    ) -> Result<Option<Order>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1 FOR UPDATE")
            .bind(order_id)
            .fetch_optional(executor)
            .await?;
        Ok(order)
    }

    /// Pedidos pendentes, com código ainda válido, criados a partir de `since`.
    /// Mais antigos primeiro.
    pub async fn list_pickup_candidates<'e, E>(
        &self,
        executor: E,
        since: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Order>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT * FROM orders
            WHERE payment_status = 'pending'
              AND pickup_code_hash IS NOT NULL
              AND paid_at IS NULL
              AND created_at >= $1
              AND (pickup_code_expires_at IS NULL OR pickup_code_expires_at > $2)
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(since)
        .bind(now)
        .fetch_all(executor)
        .await?;
        Ok(orders)
    }

    pub async fn list_lines<'e, E>(
        &self,
        executor: E,
        order_id: i64,
    ) -> Result<Vec<OrderLine>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lines = sqlx::query_as::<_, OrderLine>(
            "SELECT * FROM order_lines WHERE order_id = $1 ORDER BY id ASC",
        )
        .bind(order_id)
        .fetch_all(executor)
        .await?;
        Ok(lines)
    }

    pub async fn list_orders(
        &self,
        filter: &OrderFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Order>, AppError> {
        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT * FROM orders
            WHERE ($1::payment_status IS NULL OR payment_status = $1)
              AND ($2::payment_method IS NULL OR payment_method = $2)
              AND ($3::uuid IS NULL OR user_id = $3)
            ORDER BY created_at DESC, id DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(filter.status)
        .bind(filter.method)
        .bind(filter.user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(orders)
    }

    // =========================================================================
    //  TRANSIÇÕES DE PAGAMENTO
    // =========================================================================
    // Só saem de 'pending'. Se o pedido já mudou, nenhuma linha volta (None).

    pub async fn mark_paid<'e, E>(
        &self,
        executor: E,
        order_id: i64,
        paid_by: Uuid,
        paid_at: DateTime<Utc>,
    ) -> Result<Option<Order>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, Order>(
            r#"
            UPDATE orders
            SET payment_status = 'paid',
                paid_at = $2,
                paid_by = $3,
                pickup_code_hash = NULL,
                updated_at = NOW()
            WHERE id = $1 AND payment_status = 'pending'
            RETURNING *
            "#,
        )
        .bind(order_id)
        .bind(paid_at)
        .bind(paid_by)
        .fetch_optional(executor)
        .await?;
        Ok(order)
    }

    pub async fn mark_cancelled<'e, E>(
        &self,
        executor: E,
        order_id: i64,
    ) -> Result<Option<Order>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, Order>(
            r#"
            UPDATE orders
            SET payment_status = 'cancelled',
                pickup_code_hash = NULL,
                updated_at = NOW()
            WHERE id = $1 AND payment_status = 'pending'
            RETURNING *
            "#,
        )
        .bind(order_id)
        .fetch_optional(executor)
        .await?;
        Ok(order)
    }
}
