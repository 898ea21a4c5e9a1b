// src/models/menu.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

// --- Item do Cardápio ---
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    #[schema(example = 7)]
    pub id: i64,
    #[schema(example = "Pão de queijo")]
    pub name: String,
    #[schema(example = 3.5)]
    pub price: Decimal,
    // None = estoque não controlado (não decrementa nem bloqueia pedidos)
    #[schema(example = 5)]
    pub stock_qty: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

