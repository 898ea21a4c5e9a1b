// src/models/inventory.rs

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "inventory_action", rename_all = "lowercase")] // Banco
#[serde(rename_all = "lowercase")] // JSON
pub enum InventoryAction {
    Order,        // Baixa por pedido (negativo)
    Adjustment,   // Edição manual do admin (qualquer sinal)
    Cancellation, // Devolução por pedido cancelado (positivo)
}

impl FromStr for InventoryAction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "order" => Ok(InventoryAction::Order),
            "adjustment" => Ok(InventoryAction::Adjustment),
            "cancellation" => Ok(InventoryAction::Cancellation),
            other => Err(AppError::InvalidInput(format!("tipo de movimentação desconhecido: '{}'", other))),
        }
    }
}

// --- Histórico de estoque ---
// Uma linha por evento que altera o estoque de um item.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryLogEntry {
    pub id: i64,
    pub menu_item_id: i64,
    pub action: InventoryAction,
    #[schema(example = -2)]
    pub quantity_changed: i32,
    #[schema(example = 3)]
    pub stock_after: i32,
    pub actor_id: Option<Uuid>,
    pub order_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Registro ainda não persistido; o serviço monta, o repositório grava.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInventoryLog {
    pub menu_item_id: i64,
    pub action: InventoryAction,
    pub quantity_changed: i32,
    pub stock_after: i32,
    pub actor_id: Option<Uuid>,
    pub order_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockDirection {
    Up,
    Down,
}

impl FromStr for StockDirection {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(StockDirection::Up),
            "down" => Ok(StockDirection::Down),
            other => Err(AppError::InvalidInput(format!("direção desconhecida: '{}'", other))),
        }
    }
}

/// Filtros da listagem de histórico (todos opcionais).
#[derive(Debug, Clone, Default)]
pub struct InventoryLogFilter {
    pub action: Option<InventoryAction>,
    pub direction: Option<StockDirection>,
    pub menu_item_id: Option<i64>,
}
