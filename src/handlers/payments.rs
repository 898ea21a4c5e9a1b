// src/handlers/payments.rs

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::rbac::{Admin, RequireRole},
    models::order::Order,
    services::{pickup::is_well_formed, verification_service::VerificationOutcome},
};

fn validate_pickup_code(code: &str) -> Result<(), ValidationError> {
    if !is_well_formed(code) {
        let mut err = ValidationError::new("pickup_code");
        err.message = Some("O código de retirada deve ter 4 dígitos.".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPickupPayload {
    #[validate(custom(function = "validate_pickup_code"))]
    #[schema(example = "0427")]
    pub code: String,

    // Opcional: sem ele, o código é procurado entre os pedidos pendentes recentes
    #[serde(alias = "order_id")]
    #[schema(example = 42)]
    pub order_id: Option<i64>,
}

// POST /api/payments/verify
#[utoipa::path(
    post,
    path = "/api/payments/verify",
    tag = "Payments",
    request_body = VerifyPickupPayload,
    responses(
        (status = 200, description = "Código aceito, pedido marcado como pago", body = VerificationOutcome),
        (status = 404, description = "Pedido não encontrado ou nenhum pedido com esse código"),
        (status = 410, description = "Código expirado"),
        (status = 422, description = "Código não confere")
    ),
    security(("api_jwt" = []))
)]
pub async fn verify_pickup(
    State(app_state): State<AppState>,
    RequireRole(admin, _): RequireRole<Admin>,
    Json(payload): Json<VerifyPickupPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let outcome = app_state
        .verification_service
        .verify_pickup(&payload.code, payload.order_id, admin.id)
        .await?;

    Ok(Json(outcome))
}

// POST /api/payments/{id}/paid
#[utoipa::path(
    post,
    path = "/api/payments/{order_id}/paid",
    tag = "Payments",
    params(
        ("order_id" = i64, Path, description = "ID do Pedido")
    ),
    responses(
        (status = 200, description = "Pedido marcado como pago", body = Order),
        (status = 404, description = "Pedido não encontrado"),
        (status = 409, description = "Pedido já pago ou cancelado")
    ),
    security(("api_jwt" = []))
)]
pub async fn mark_paid(
    State(app_state): State<AppState>,
    RequireRole(admin, _): RequireRole<Admin>,
    Path(order_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let order = app_state
        .payment_service
        .mark_paid(&app_state.db_pool, order_id, admin.id)
        .await?;

    Ok(Json(order))
}

// POST /api/payments/{id}/cancel
#[utoipa::path(
    post,
    path = "/api/payments/{order_id}/cancel",
    tag = "Payments",
    params(
        ("order_id" = i64, Path, description = "ID do Pedido")
    ),
    responses(
        (status = 200, description = "Pedido cancelado e estoque devolvido", body = Order),
        (status = 404, description = "Pedido não encontrado"),
        (status = 409, description = "Pedido já pago ou cancelado")
    ),
    security(("api_jwt" = []))
)]
pub async fn cancel_order(
    State(app_state): State<AppState>,
    RequireRole(admin, _): RequireRole<Admin>,
    Path(order_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let order = app_state
        .payment_service
        .cancel_order(&app_state.db_pool, order_id, admin.id)
        .await?;

    Ok(Json(order))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_must_be_four_digits() {
        let ok: VerifyPickupPayload = serde_json::from_str(r#"{"code":"0427"}"#).unwrap();
        assert!(ok.validate().is_ok());
        assert_eq!(ok.order_id, None);

        for bad in ["427", "04270", "04a7", ""] {
            let payload = VerifyPickupPayload {
                code: bad.to_string(),
                order_id: Some(1),
            };
            assert!(payload.validate().is_err(), "aceitou '{}'", bad);
        }
    }

    #[test]
    fn order_id_is_read_in_camel_case() {
        let payload: VerifyPickupPayload =
            serde_json::from_str(r#"{"code":"1234","orderId":42}"#).unwrap();
        assert_eq!(payload.order_id, Some(42));

        let snake: VerifyPickupPayload =
            serde_json::from_str(r#"{"code":"1234","order_id":7}"#).unwrap();
        assert_eq!(snake.order_id, Some(7));
    }
}
