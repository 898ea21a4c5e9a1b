// src/handlers/menu.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{Admin, RequireRole},
    },
    models::menu::MenuItem,
    services::menu_service::MenuItemRemoval,
};

// ---
// Validação Customizada
// ---
fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("O valor não pode ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

fn default_active() -> bool {
    true
}

// ---
// Payload: cria e edita usam o mesmo formato (edição é substituição completa)
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemPayload {
    #[validate(length(min = 1, max = 255, message = "O nome é obrigatório."))]
    #[schema(example = "Pão de queijo")]
    pub name: String,

    #[validate(custom(function = "validate_not_negative"))]
    #[schema(example = 3.5)]
    pub price: Decimal,

    // Ausente = estoque não controlado
    #[validate(range(min = 0, message = "O estoque não pode ser negativo."))]
    pub stock_qty: Option<i32>,

    #[serde(default = "default_active")]
    pub is_active: bool,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ItemsByIdsQuery {
    /// Lista separada por vírgulas, ex: `1,2,7`
    pub ids: String,
}

fn parse_ids(raw: &str) -> Result<Vec<i64>, AppError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i64>()
                .map_err(|_| AppError::InvalidInput(format!("id inválido: '{}'", part)))
        })
        .collect()
}

// GET /api/menu
#[utoipa::path(
    get,
    path = "/api/menu",
    tag = "Menu",
    responses(
        (status = 200, description = "Itens ativos do cardápio", body = Vec<MenuItem>)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_active_menu(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let items = app_state.menu_service.get_active_menu_items().await?;
    Ok(Json(items))
}

// GET /api/menu/items?ids=1,2
#[utoipa::path(
    get,
    path = "/api/menu/items",
    tag = "Menu",
    params(ItemsByIdsQuery),
    responses(
        (status = 200, description = "Itens encontrados (ids desconhecidos são omitidos)", body = Vec<MenuItem>),
        (status = 400, description = "Lista de ids mal formada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_items_by_ids(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<ItemsByIdsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let ids = parse_ids(&query.ids)?;
    let items = app_state
        .menu_service
        .get_items_by_ids(&app_state.db_pool, &ids)
        .await?;
    Ok(Json(items))
}

// POST /api/menu
#[utoipa::path(
    post,
    path = "/api/menu",
    tag = "Menu",
    request_body = MenuItemPayload,
    responses(
        (status = 201, description = "Item criado", body = MenuItem),
        (status = 403, description = "Apenas administradores")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_item(
    State(app_state): State<AppState>,
    RequireRole(admin, _): RequireRole<Admin>,
    Json(payload): Json<MenuItemPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let item = app_state
        .menu_service
        .create_item(
            &app_state.db_pool,
            admin.id,
            payload.name.trim(),
            payload.price,
            payload.stock_qty,
            payload.is_active,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(item)))
}

// PUT /api/menu/{id}
#[utoipa::path(
    put,
    path = "/api/menu/{item_id}",
    tag = "Menu",
    request_body = MenuItemPayload,
    params(
        ("item_id" = i64, Path, description = "ID do Item")
    ),
    responses(
        (status = 200, description = "Item atualizado", body = MenuItem),
        (status = 404, description = "Item não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_item(
    State(app_state): State<AppState>,
    RequireRole(admin, _): RequireRole<Admin>,
    Path(item_id): Path<i64>,
    Json(payload): Json<MenuItemPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let item = app_state
        .menu_service
        .update_item(
            &app_state.db_pool,
            admin.id,
            item_id,
            payload.name.trim(),
            payload.price,
            payload.stock_qty,
            payload.is_active,
        )
        .await?;

    Ok(Json(item))
}

// DELETE /api/menu/{id}
#[utoipa::path(
    delete,
    path = "/api/menu/{item_id}",
    tag = "Menu",
    params(
        ("item_id" = i64, Path, description = "ID do Item")
    ),
    responses(
        (status = 204, description = "Item removido"),
        (status = 200, description = "Item já usado em pedidos: foi só desativado", body = MenuItem),
        (status = 404, description = "Item não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_item(
    State(app_state): State<AppState>,
    RequireRole(admin, _): RequireRole<Admin>,
    Path(item_id): Path<i64>,
) -> Result<Response, AppError> {
    let removal = app_state
        .menu_service
        .delete_item(&app_state.db_pool, admin.id, item_id)
        .await?;

    Ok(removal_response(removal))
}

fn removal_response(removal: MenuItemRemoval) -> Response {
    match removal {
        MenuItemRemoval::Deleted => StatusCode::NO_CONTENT.into_response(),
        MenuItemRemoval::Deactivated(item) => (StatusCode::OK, Json(item)).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_parsed_from_a_comma_list() {
        assert_eq!(parse_ids("1, 2,7").unwrap(), vec![1, 2, 7]);
        assert_eq!(parse_ids("").unwrap(), Vec::<i64>::new());
        assert!(matches!(parse_ids("1,abc"), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn negative_price_and_stock_are_rejected() {
        let payload: MenuItemPayload =
            serde_json::from_str(r#"{"name":"Suco","price":-1,"stockQty":-2}"#).unwrap();
        let errors = payload.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("price"));
        assert!(fields.contains_key("stock_qty"));
    }

    #[test]
    fn items_are_active_unless_said_otherwise() {
        let payload: MenuItemPayload =
            serde_json::from_str(r#"{"name":"Café","price":2.0}"#).unwrap();
        assert!(payload.is_active);
        assert_eq!(payload.stock_qty, None);
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn removal_outcome_picks_the_status() {
        assert_eq!(
            removal_response(MenuItemRemoval::Deleted).status(),
            StatusCode::NO_CONTENT
        );

        let now = chrono::Utc::now();
        let item = MenuItem {
            id: 3,
            name: "Pastel".into(),
            price: Decimal::new(600, 2),
            stock_qty: None,
            is_active: false,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(
            removal_response(MenuItemRemoval::Deactivated(item)).status(),
            StatusCode::OK
        );
    }
}
