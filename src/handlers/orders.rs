// src/handlers/orders.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    common::{error::AppError, pagination::Page},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{Admin, RequireRole},
    },
    models::order::{
        CartLine, Order, OrderDetail, OrderFilter, PaymentMethod, PaymentStatus, PlacedOrder,
    },
};

// ---
// Payload: PlaceOrder
// ---
// Preço e nome nunca vêm do cliente: só id e quantidade.
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartItemPayload {
    #[schema(example = 7)]
    pub id: i64,

    #[validate(range(min = 1, max = 1000, message = "A quantidade deve estar entre 1 e 1000."))]
    #[schema(example = 2)]
    pub qty: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderPayload {
    /// "CASH" ou "QR" (sem diferenciar maiúsculas)
    #[schema(example = "CASH")]
    pub method: String,

    #[validate(length(min = 1, message = "O carrinho está vazio."), nested)]
    pub items: Vec<CartItemPayload>,
}

impl PlaceOrderPayload {
    fn cart(&self) -> Vec<CartLine> {
        self.items
            .iter()
            .map(|item| CartLine {
                menu_item_id: item.id,
                quantity: item.qty,
            })
            .collect()
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct OrderListQuery {
    /// pending | paid | cancelled ("completed" é aceito como paid)
    pub status: Option<String>,
    /// CASH | QR
    pub method: Option<String>,
    pub page: Option<u32>,
}

impl OrderListQuery {
    fn filter(&self) -> Result<OrderFilter, AppError> {
        Ok(OrderFilter {
            status: self
                .status
                .as_deref()
                .map(str::parse::<PaymentStatus>)
                .transpose()?,
            method: self
                .method
                .as_deref()
                .map(str::parse::<PaymentMethod>)
                .transpose()?,
            user_id: None,
        })
    }
}

// POST /api/orders
#[utoipa::path(
    post,
    path = "/api/orders",
    tag = "Orders",
    request_body = PlaceOrderPayload,
    responses(
        (status = 201, description = "Pedido criado; pedidos em dinheiro trazem o código de retirada", body = PlacedOrder),
        (status = 400, description = "Carrinho inválido"),
        (status = 404, description = "Item inexistente ou inativo"),
        (status = 409, description = "Estoque insuficiente")
    ),
    security(("api_jwt" = []))
)]
pub async fn place_order(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<PlaceOrderPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let method = payload.method.parse::<PaymentMethod>()?;

    let placed = app_state
        .order_service
        .place_order(&app_state.db_pool, user.id, method, &payload.cart())
        .await?;

    Ok((StatusCode::CREATED, Json(placed)))
}

// GET /api/orders/mine
#[utoipa::path(
    get,
    path = "/api/orders/mine",
    tag = "Orders",
    params(OrderListQuery),
    responses(
        (status = 200, description = "Pedidos do usuário logado, mais recentes primeiro", body = Page<Order>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_my_orders(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<OrderListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filter = OrderFilter {
        user_id: Some(user.id),
        ..query.filter()?
    };

    let page = app_state
        .order_service
        .list_orders(&filter, query.page.unwrap_or(1))
        .await?;

    Ok(Json(page))
}

// GET /api/orders
#[utoipa::path(
    get,
    path = "/api/orders",
    tag = "Orders",
    params(OrderListQuery),
    responses(
        (status = 200, description = "Todos os pedidos (admin)", body = Page<Order>),
        (status = 403, description = "Apenas administradores")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_orders(
    State(app_state): State<AppState>,
    _guard: RequireRole<Admin>,
    Query(query): Query<OrderListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = app_state
        .order_service
        .list_orders(&query.filter()?, query.page.unwrap_or(1))
        .await?;

    Ok(Json(page))
}

// GET /api/orders/{id}
#[utoipa::path(
    get,
    path = "/api/orders/{order_id}",
    tag = "Orders",
    params(
        ("order_id" = i64, Path, description = "ID do Pedido")
    ),
    responses(
        (status = 200, description = "Pedido com as linhas", body = OrderDetail),
        (status = 404, description = "Pedido não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_order(
    State(app_state): State<AppState>,
    _guard: RequireRole<Admin>,
    Path(order_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let detail = app_state
        .order_service
        .get_order_detail(&app_state.db_pool, order_id)
        .await?;

    Ok(Json(detail))
}
