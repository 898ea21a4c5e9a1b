// src/services/payment_service.rs

use chrono::Utc;
use sqlx::{Acquire, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{InventoryRepository, MenuRepository, OrderRepository},
    models::{
        inventory::{InventoryAction, NewInventoryLog},
        order::Order,
    },
};

/// Ações manuais do admin sobre o pagamento. Só pedidos pendentes mudam de estado.
#[derive(Clone)]
pub struct PaymentService {
    menu_repo: MenuRepository,
    order_repo: OrderRepository,
    inventory_repo: InventoryRepository,
}

fn ensure_pending(order: &Order) -> Result<(), AppError> {
    if order.payment_status.is_terminal() {
        return Err(AppError::InvalidStatusTransition {
            order_id: order.id,
            status: order.payment_status.to_string(),
        });
    }
    Ok(())
}

impl PaymentService {
    pub fn new(
        menu_repo: MenuRepository,
        order_repo: OrderRepository,
        inventory_repo: InventoryRepository,
    ) -> Self {
        Self {
            menu_repo,
            order_repo,
            inventory_repo,
        }
    }

    /// Baixa manual (ex: pagamento por QR conferido no caixa). Invalida o código.
    pub async fn mark_paid<'a, A>(
        &self,
        conn: A,
        order_id: i64,
        admin_id: Uuid,
    ) -> Result<Order, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut tx = conn.begin().await?;

        let order = self
            .order_repo
            .find_by_id_for_update(&mut *tx, order_id)
            .await?
            .ok_or(AppError::OrderNotFound(order_id))?;
        ensure_pending(&order)?;

        let paid = self
            .order_repo
            .mark_paid(&mut *tx, order_id, admin_id, Utc::now())
            .await?
            .ok_or(AppError::OrderNotFound(order_id))?;

        tx.commit().await?;

        tracing::info!("💰 Pedido #{} marcado como pago pelo admin {}", order_id, admin_id);
        Ok(paid)
    }

    /// Cancela um pedido pendente e devolve ao estoque o que foi baixado.
    pub async fn cancel_order<'a, A>(
        &self,
        conn: A,
        order_id: i64,
        admin_id: Uuid,
    ) -> Result<Order, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut tx = conn.begin().await?;

        let order = self
            .order_repo
            .find_by_id_for_update(&mut *tx, order_id)
            .await?
            .ok_or(AppError::OrderNotFound(order_id))?;
        ensure_pending(&order)?;

        let mut lines = self.order_repo.list_lines(&mut *tx, order_id).await?;
        // mesma ordem de travamento do checkout
        lines.sort_by_key(|line| line.menu_item_id);

        for line in &lines {
            // Item sem estoque controlado: nada a devolver
            let Some(stock_after) = self
                .menu_repo
                .increment_stock(&mut *tx, line.menu_item_id, line.quantity)
                .await?
            else {
                continue;
            };

            self.inventory_repo
                .record_entry(
                    &mut *tx,
                    &NewInventoryLog {
                        menu_item_id: line.menu_item_id,
                        action: InventoryAction::Cancellation,
                        quantity_changed: line.quantity,
                        stock_after,
                        actor_id: Some(admin_id),
                        order_id: Some(order_id),
                    },
                )
                .await?;
        }

        let cancelled = self
            .order_repo
            .mark_cancelled(&mut *tx, order_id)
            .await?
            .ok_or(AppError::OrderNotFound(order_id))?;

        tx.commit().await?;

        tracing::info!(
            "❌ Pedido #{} cancelado pelo admin {} ({} linha(s) devolvida(s))",
            order_id,
            admin_id,
            lines.len()
        );
        Ok(cancelled)
    }
}
