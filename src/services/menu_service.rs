// src/services/menu_service.rs

use rust_decimal::Decimal;
use sqlx::{Acquire, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{InventoryRepository, MenuRepository},
    models::{
        inventory::{InventoryAction, NewInventoryLog},
        menu::MenuItem,
    },
};

/// Variação de estoque de uma edição manual: (delta, saldo final).
/// Estoque não controlado conta como zero; passar a não controlado não gera registro.
pub fn stock_adjustment(old: Option<i32>, new: Option<i32>) -> Option<(i32, i32)> {
    let new = new?;
    let delta = new - old.unwrap_or(0);
    (delta != 0).then_some((delta, new))
}

/// O que aconteceu com um item pedido para remoção.
#[derive(Debug)]
pub enum MenuItemRemoval {
    Deleted,
    // Já aparece em pedidos: sai do cardápio mas a linha fica
    Deactivated(MenuItem),
}

#[derive(Clone)]
pub struct MenuService {
    menu_repo: MenuRepository,
    inventory_repo: InventoryRepository,
}

impl MenuService {
    pub fn new(menu_repo: MenuRepository, inventory_repo: InventoryRepository) -> Self {
        Self {
            menu_repo,
            inventory_repo,
        }
    }

    pub async fn get_active_menu_items(&self) -> Result<Vec<MenuItem>, AppError> {
        self.menu_repo.get_active_menu_items().await
    }

    pub async fn get_items_by_ids<'a, A>(
        &self,
        conn: A,
        ids: &[i64],
    ) -> Result<Vec<MenuItem>, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut conn = conn.acquire().await?;
        self.menu_repo.get_items_by_ids(&mut *conn, ids).await
    }

    // --- CREATE ITEM ---
    pub async fn create_item<'a, A>(
        &self,
        conn: A,
        actor_id: Uuid,
        name: &str,
        price: Decimal,
        stock_qty: Option<i32>,
        is_active: bool,
    ) -> Result<MenuItem, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut tx = conn.begin().await?;

        let item = self
            .menu_repo
            .create_item(&mut *tx, name, price.round_dp(2), stock_qty, is_active)
            .await?;

        // Estoque inicial entra no histórico como ajuste
        if let Some((delta, stock_after)) = stock_adjustment(None, item.stock_qty) {
            self.inventory_repo
                .record_entry(
                    &mut *tx,
                    &NewInventoryLog {
                        menu_item_id: item.id,
                        action: InventoryAction::Adjustment,
                        quantity_changed: delta,
                        stock_after,
                        actor_id: Some(actor_id),
                        order_id: None,
                    },
                )
                .await?;
        }

        tx.commit().await?;

        tracing::info!("🍽️ Item #{} '{}' criado", item.id, item.name);
        Ok(item)
    }

    // --- UPDATE ITEM ---
    pub async fn update_item<'a, A>(
        &self,
        conn: A,
        actor_id: Uuid,
        item_id: i64,
        name: &str,
        price: Decimal,
        stock_qty: Option<i32>,
        is_active: bool,
    ) -> Result<MenuItem, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut tx = conn.begin().await?;

        // Trava a linha: um checkout concorrente não pode baixar no meio da edição
        let current = self
            .menu_repo
            .find_by_id_for_update(&mut *tx, item_id)
            .await?
            .ok_or(AppError::ItemNotFound(item_id))?;

        let updated = self
            .menu_repo
            .update_item(&mut *tx, item_id, name, price.round_dp(2), stock_qty, is_active)
            .await?;

        if let Some((delta, stock_after)) = stock_adjustment(current.stock_qty, updated.stock_qty) {
            self.inventory_repo
                .record_entry(
                    &mut *tx,
                    &NewInventoryLog {
                        menu_item_id: item_id,
                        action: InventoryAction::Adjustment,
                        quantity_changed: delta,
                        stock_after,
                        actor_id: Some(actor_id),
                        order_id: None,
                    },
                )
                .await?;

            tracing::info!(
                "📦 Estoque do item #{} ajustado em {} (saldo {})",
                item_id,
                delta,
                stock_after
            );
        }

        tx.commit().await?;
        Ok(updated)
    }

    // --- DELETE ITEM ---
    pub async fn delete_item<'a, A>(
        &self,
        conn: A,
        actor_id: Uuid,
        item_id: i64,
    ) -> Result<MenuItemRemoval, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut tx = conn.begin().await?;

        // Trava a linha: nenhum checkout novo entra enquanto decidimos
        self.menu_repo
            .find_by_id_for_update(&mut *tx, item_id)
            .await?
            .ok_or(AppError::ItemNotFound(item_id))?;

        let removal = if self
            .menu_repo
            .is_referenced_by_orders(&mut *tx, item_id)
            .await?
        {
            let item = self.menu_repo.deactivate_item(&mut *tx, item_id).await?;
            MenuItemRemoval::Deactivated(item)
        } else {
            self.menu_repo.delete_item(&mut *tx, item_id).await?;
            MenuItemRemoval::Deleted
        };

        tx.commit().await?;

        match &removal {
            MenuItemRemoval::Deleted => {
                tracing::info!("🗑️ Item #{} removido pelo admin {}", item_id, actor_id)
            }
            MenuItemRemoval::Deactivated(_) => tracing::info!(
                "🙈 Item #{} já tem pedidos; desativado pelo admin {}",
                item_id,
                actor_id
            ),
        }
        Ok(removal)
    }
}
