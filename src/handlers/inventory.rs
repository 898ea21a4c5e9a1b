// src/handlers/inventory.rs

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    common::{error::AppError, pagination::Page},
    config::AppState,
    middleware::rbac::{Admin, RequireRole},
    models::inventory::{InventoryAction, InventoryLogEntry, InventoryLogFilter, StockDirection},
};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct InventoryLogQuery {
    /// order | adjustment | cancellation
    pub action: Option<String>,
    /// up (entradas) | down (saídas)
    pub direction: Option<String>,
    pub item_id: Option<i64>,
    pub page: Option<u32>,
}

impl InventoryLogQuery {
    fn filter(&self) -> Result<InventoryLogFilter, AppError> {
        Ok(InventoryLogFilter {
            action: self
                .action
                .as_deref()
                .map(str::parse::<InventoryAction>)
                .transpose()?,
            direction: self
                .direction
                .as_deref()
                .map(str::parse::<StockDirection>)
                .transpose()?,
            menu_item_id: self.item_id,
        })
    }
}

// GET /api/inventory/logs
#[utoipa::path(
    get,
    path = "/api/inventory/logs",
    tag = "Inventory",
    params(InventoryLogQuery),
    responses(
        (status = 200, description = "Movimentações de estoque, mais recentes primeiro", body = Page<InventoryLogEntry>),
        (status = 400, description = "Filtro inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_logs(
    State(app_state): State<AppState>,
    _guard: RequireRole<Admin>,
    Query(query): Query<InventoryLogQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = app_state
        .inventory_service
        .list_logs(&query.filter()?, query.page.unwrap_or(1))
        .await?;

    Ok(Json(page))
}
