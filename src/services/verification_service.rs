// src/services/verification_service.rs

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::PgPool;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::OrderRepository,
    models::order::Order,
    services::pickup::{is_well_formed, PickupCodeService},
};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerificationOutcome {
    pub order: Order,
    #[schema(example = "Order #42 marked as paid.")]
    pub message: String,
}

/// Confere se o pedido ainda aceita o código: pendente, dentro da validade e com hash.
/// Devolve o hash a comparar.
pub fn ensure_redeemable(order: &Order, now: DateTime<Utc>) -> Result<&str, AppError> {
    if order.payment_status.is_terminal() {
        return Err(AppError::OrderNotFound(order.id));
    }
    if order
        .pickup_code_expires_at
        .is_some_and(|expires_at| expires_at <= now)
    {
        return Err(AppError::CredentialExpired);
    }
    order
        .pickup_code_hash
        .as_deref()
        .ok_or(AppError::InvalidCredential)
}

#[derive(Clone)]
pub struct PickupVerificationService {
    order_repo: OrderRepository,
    pickup_codes: PickupCodeService,
    scan_window: Duration,
    pool: PgPool,
}

impl PickupVerificationService {
    pub fn new(
        order_repo: OrderRepository,
        pickup_codes: PickupCodeService,
        scan_window_hours: i64,
        pool: PgPool,
    ) -> Self {
        Self {
            order_repo,
            pickup_codes,
            scan_window: Duration::hours(scan_window_hours),
            pool,
        }
    }

    /// Baixa o pagamento de um pedido em dinheiro a partir do código apresentado.
    ///
    /// Com `order_id`, compara só com aquele pedido. Sem ele, percorre os
    /// pendentes da janela recente (mais antigos primeiro) e aceita o primeiro
    /// hash que bater. Se dois pedidos pendentes tiverem o mesmo código, o mais
    /// antigo é baixado: a colisão não é detectada nem resolvida aqui.
    pub async fn verify_pickup(
        &self,
        code: &str,
        order_id: Option<i64>,
        admin_id: Uuid,
    ) -> Result<VerificationOutcome, AppError> {
        if !is_well_formed(code) {
            return Err(AppError::InvalidInput(
                "o código de retirada deve ter 4 dígitos".into(),
            ));
        }

        let result = match order_id {
            Some(id) => self.verify_for_order(code, id, admin_id).await,
            None => self.verify_by_scan(code, admin_id).await,
        };

        match &result {
            Ok(outcome) => tracing::info!(
                "✅ Pedido #{} pago na retirada (admin {})",
                outcome.order.id,
                admin_id
            ),
            Err(e) => tracing::warn!("⚠️ Verificação de retirada falhou: {}", e),
        }

        result
    }

    async fn verify_for_order(
        &self,
        code: &str,
        order_id: i64,
        admin_id: Uuid,
    ) -> Result<VerificationOutcome, AppError> {
        let mut tx = self.pool.begin().await?;

        let order = self
            .order_repo
            .find_by_id_for_update(&mut *tx, order_id)
            .await?
            .ok_or(AppError::OrderNotFound(order_id))?;

        let hash = ensure_redeemable(&order, Utc::now())?;
        if !self.pickup_codes.matches(code, hash).await? {
            return Err(AppError::InvalidCredential);
        }

        let paid = self
            .order_repo
            .mark_paid(&mut *tx, order_id, admin_id, Utc::now())
            .await?
            .ok_or(AppError::OrderNotFound(order_id))?;

        tx.commit().await?;
        Ok(outcome(paid))
    }

    async fn verify_by_scan(
        &self,
        code: &str,
        admin_id: Uuid,
    ) -> Result<VerificationOutcome, AppError> {
        let now = Utc::now();
        let candidates = self
            .order_repo
            .list_pickup_candidates(&self.pool, now - self.scan_window, now)
            .await?;

        tracing::debug!("🔎 {} pedido(s) candidatos para o código", candidates.len());

        for candidate in candidates {
            let Some(hash) = candidate.pickup_code_hash.as_deref() else {
                continue;
            };
            if !self.pickup_codes.matches(code, hash).await? {
                continue;
            }

            // Bateu: trava e confere de novo, outro caixa pode ter baixado antes.
            let mut tx = self.pool.begin().await?;
            let Some(current) = self
                .order_repo
                .find_by_id_for_update(&mut *tx, candidate.id)
                .await?
            else {
                continue;
            };

            let still_same = ensure_redeemable(&current, Utc::now())
                .map(|current_hash| current_hash == hash)
                .unwrap_or(false);
            if !still_same {
                continue;
            }

            if let Some(paid) = self
                .order_repo
                .mark_paid(&mut *tx, current.id, admin_id, Utc::now())
                .await?
            {
                tx.commit().await?;
                return Ok(outcome(paid));
            }
        }

        Err(AppError::NoMatchingOrder)
    }
}

fn outcome(order: Order) -> VerificationOutcome {
    VerificationOutcome {
        message: format!("Order #{} marked as paid.", order.id),
        order,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::order::{PaymentMethod, PaymentStatus};
    use rust_decimal::Decimal;

    fn cash_order(status: PaymentStatus, hash: Option<&str>, expires_in_hours: i64) -> Order {
        let now = Utc::now();
        Order {
            id: 42,
            user_id: Uuid::new_v4(),
            payment_method: PaymentMethod::Cash,
            payment_status: status,
            total: Decimal::new(700, 2),
            pickup_code_hash: hash.map(str::to_string),
            pickup_code_expires_at: Some(now + Duration::hours(expires_in_hours)),
            paid_at: None,
            paid_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn pending_order_within_validity_is_redeemable() {
        let order = cash_order(PaymentStatus::Pending, Some("$2b$04$hash"), 24);
        assert_eq!(ensure_redeemable(&order, Utc::now()).unwrap(), "$2b$04$hash");
    }

    #[test]
    fn paid_or_cancelled_orders_are_not_found() {
        for status in [PaymentStatus::Paid, PaymentStatus::Cancelled] {
            let order = cash_order(status, Some("$2b$04$hash"), 24);
            assert!(matches!(
                ensure_redeemable(&order, Utc::now()),
                Err(AppError::OrderNotFound(42))
            ));
        }
    }

    #[test]
    fn expired_code_fails_even_with_a_hash() {
        let order = cash_order(PaymentStatus::Pending, Some("$2b$04$hash"), -1);
        assert!(matches!(
            ensure_redeemable(&order, Utc::now()),
            Err(AppError::CredentialExpired)
        ));
    }

    #[test]
    fn expiry_boundary_is_exclusive() {
        let order = cash_order(PaymentStatus::Pending, Some("$2b$04$hash"), 1);
        let at_expiry = order.pickup_code_expires_at.unwrap();
        assert!(matches!(
            ensure_redeemable(&order, at_expiry),
            Err(AppError::CredentialExpired)
        ));
        assert!(ensure_redeemable(&order, at_expiry - Duration::seconds(1)).is_ok());
    }

    #[test]
    fn order_without_hash_has_invalid_credential() {
        let mut order = cash_order(PaymentStatus::Pending, None, 24);
        order.payment_method = PaymentMethod::Qr;
        order.pickup_code_expires_at = None;
        assert!(matches!(
            ensure_redeemable(&order, Utc::now()),
            Err(AppError::InvalidCredential)
        ));
    }

    #[test]
    fn outcome_message_names_the_order() {
        let order = cash_order(PaymentStatus::Paid, None, 24);
        assert_eq!(outcome(order).message, "Order #42 marked as paid.");
    }
}
