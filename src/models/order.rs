// src/models/order.rs

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::error::AppError;

// --- Enums ---
// Valores de fora chegam como texto solto ("cash", "QR", "completed"...).
// Normalizamos aqui, na borda, e qualquer outra coisa vira erro de validação.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_method", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentMethod {
    Cash,
    Qr,
}

impl FromStr for PaymentMethod {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CASH" => Ok(PaymentMethod::Cash),
            "QR" => Ok(PaymentMethod::Qr),
            other => Err(AppError::InvalidInput(format!(
                "método de pagamento desconhecido: '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::Cash => f.write_str("CASH"),
            PaymentMethod::Qr => f.write_str("QR"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Cancelled,
}

impl PaymentStatus {
    // pago e cancelado são terminais
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }
}

impl FromStr for PaymentStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(PaymentStatus::Pending),
            "paid" | "completed" => Ok(PaymentStatus::Paid),
            "cancelled" | "canceled" => Ok(PaymentStatus::Cancelled),
            other => Err(AppError::InvalidInput(format!(
                "status de pagamento desconhecido: '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::Pending => f.write_str("pending"),
            PaymentStatus::Paid => f.write_str("paid"),
            PaymentStatus::Cancelled => f.write_str("cancelled"),
        }
    }
}

// --- Structs de Operação ---

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[schema(example = 42)]
    pub id: i64,
    pub user_id: Uuid,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    // Soma de quantidade × preço unitário capturado no momento do pedido
    #[schema(example = 7.0)]
    pub total: Decimal,
    // Só o hash bcrypt; o código em claro nunca é gravado nem serializado.
    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub pickup_code_hash: Option<String>,
    pub pickup_code_expires_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub paid_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub id: i64,
    pub order_id: i64,
    #[schema(example = 7)]
    pub menu_item_id: i64,
    #[schema(example = 2)]
    pub quantity: i32,
    #[schema(example = 3.5)]
    pub unit_price: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    #[serde(flatten)]
    pub header: Order,
    pub lines: Vec<OrderLine>,
}

/// Resultado de `place_order`. O `pickup_code` em claro existe só aqui,
/// para ser mostrado uma única vez a quem fez o pedido.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlacedOrder {
    #[serde(flatten)]
    pub detail: OrderDetail,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "0427")]
    pub pickup_code: Option<String>,
}

/// Uma linha do carrinho: só id e quantidade são aceitos do cliente.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartLine {
    pub menu_item_id: i64,
    pub quantity: i32,
}

#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<PaymentStatus>,
    pub method: Option<PaymentMethod>,
    pub user_id: Option<Uuid>,
}
