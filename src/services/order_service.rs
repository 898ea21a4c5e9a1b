// src/services/order_service.rs

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{Acquire, Postgres};
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{limit_offset, Page},
    },
    db::{InventoryRepository, MenuRepository, OrderRepository},
    models::{
        inventory::{InventoryAction, NewInventoryLog},
        menu::MenuItem,
        order::{
            CartLine, Order, OrderDetail, OrderFilter, PaymentMethod, PlacedOrder,
        },
    },
    services::pickup::PickupCodeService,
};

pub const ORDERS_PER_PAGE: u32 = 25;

/// Maior quantidade aceita numa linha do carrinho.
pub const MAX_LINE_QUANTITY: i32 = 1_000;

// NUMERIC(10, 2): o total precisa ficar abaixo de 10^8
fn max_order_total() -> Decimal {
    Decimal::new(100_000_000, 0)
}

// ---
// Planejamento do pedido (puro, sem banco)
// ---

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedLine {
    pub menu_item_id: i64,
    pub quantity: i32,
    // Preço capturado agora; mudanças futuras no cardápio não afetam o pedido
    pub unit_price: Decimal,
    // Saldo antes da baixa; None = estoque não controlado
    pub stock_before: Option<i32>,
}

impl PlannedLine {
    pub fn line_total(&self) -> Decimal {
        Decimal::from(self.quantity) * self.unit_price
    }

    pub fn stock_after(&self) -> Option<i32> {
        self.stock_before.map(|stock| stock - self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderPlan {
    pub lines: Vec<PlannedLine>,
    pub total: Decimal,
}

/// Regras de forma do carrinho, checadas antes de abrir transação.
pub fn validate_cart(cart: &[CartLine]) -> Result<(), AppError> {
    if cart.is_empty() {
        return Err(AppError::EmptyCart);
    }

    let mut seen = HashSet::with_capacity(cart.len());
    for line in cart {
        if !(1..=MAX_LINE_QUANTITY).contains(&line.quantity) {
            return Err(AppError::InvalidInput(format!(
                "quantidade do item {} deve estar entre 1 e {}",
                line.menu_item_id, MAX_LINE_QUANTITY
            )));
        }
        if !seen.insert(line.menu_item_id) {
            return Err(AppError::DuplicateCartItem(line.menu_item_id));
        }
    }
    Ok(())
}

/// Confere o carrinho contra os itens do cardápio e monta as linhas.
/// Qualquer linha inválida derruba o pedido inteiro.
pub fn plan_order(cart: &[CartLine], items: &[MenuItem]) -> Result<OrderPlan, AppError> {
    validate_cart(cart)?;

    let by_id: HashMap<i64, &MenuItem> = items.iter().map(|item| (item.id, item)).collect();

    let mut lines = Vec::with_capacity(cart.len());
    for line in cart {
        let item = by_id
            .get(&line.menu_item_id)
            .filter(|item| item.is_active)
            .ok_or(AppError::ItemNotFound(line.menu_item_id))?;

        if let Some(available) = item.stock_qty {
            if available < line.quantity {
                return Err(AppError::InsufficientStock {
                    item_id: item.id,
                    name: item.name.clone(),
                    requested: line.quantity,
                    available,
                });
            }
        }

        lines.push(PlannedLine {
            menu_item_id: item.id,
            quantity: line.quantity,
            unit_price: item.price,
            stock_before: item.stock_qty,
        });
    }

    let total = lines
        .iter()
        .map(PlannedLine::line_total)
        .sum::<Decimal>()
        .round_dp(2);

    if total >= max_order_total() {
        return Err(AppError::InvalidInput(format!(
            "total do pedido ({}) excede o limite aceito",
            total
        )));
    }

    Ok(OrderPlan { lines, total })
}

// ---
// Serviço
// ---

#[derive(Clone)]
pub struct OrderService {
    menu_repo: MenuRepository,
    order_repo: OrderRepository,
    inventory_repo: InventoryRepository,
    pickup_codes: PickupCodeService,
}

impl OrderService {
    pub fn new(
        menu_repo: MenuRepository,
        order_repo: OrderRepository,
        inventory_repo: InventoryRepository,
        pickup_codes: PickupCodeService,
    ) -> Self {
        Self {
            menu_repo,
            order_repo,
            inventory_repo,
            pickup_codes,
        }
    }

    // --- PLACE ORDER ---
    /// Cria pedido + linhas, baixa estoque e registra o histórico, tudo em uma transação.
    /// Para CASH devolve o código de retirada em claro; ele não é gravado em lugar nenhum.
    pub async fn place_order<'a, A>(
        &self,
        conn: A,
        user_id: Uuid,
        payment_method: PaymentMethod,
        cart: &[CartLine],
    ) -> Result<PlacedOrder, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        validate_cart(cart)?;

        // O hash bcrypt é lento; fazemos antes de travar as linhas do estoque.
        let issued = match payment_method {
            PaymentMethod::Cash => Some(self.pickup_codes.issue(Utc::now()).await?),
            PaymentMethod::Qr => None,
        };

        let mut ids: Vec<i64> = cart.iter().map(|line| line.menu_item_id).collect();
        ids.sort_unstable();

        let mut tx = conn.begin().await?;

        // 1. Trava os itens e valida todas as linhas antes de qualquer escrita
        let items = self.menu_repo.lock_items_for_update(&mut *tx, &ids).await?;
        let plan = plan_order(cart, &items).inspect_err(|e| {
            if let AppError::InsufficientStock { .. } = e {
                tracing::warn!("🚫 Pedido recusado para o usuário {}: {}", user_id, e);
            }
        })?;

        // 2. Cria o pedido
        let order = self
            .order_repo
            .insert_order(
                &mut *tx,
                user_id,
                payment_method,
                plan.total,
                issued.as_ref().map(|code| code.hash.as_str()),
                issued.as_ref().map(|code| code.expires_at),
            )
            .await?;

        // 3. Linhas + baixa de estoque + histórico
        let mut lines = Vec::with_capacity(plan.lines.len());
        for planned in &plan.lines {
            let line = self
                .order_repo
                .insert_line(
                    &mut *tx,
                    order.id,
                    planned.menu_item_id,
                    planned.quantity,
                    planned.unit_price,
                )
                .await?;
            lines.push(line);

            if let Some(available) = planned.stock_before {
                let stock_after = self
                    .menu_repo
                    .decrement_stock(&mut *tx, planned.menu_item_id, planned.quantity)
                    .await?
                    .ok_or_else(|| AppError::InsufficientStock {
                        item_id: planned.menu_item_id,
                        name: format!("item {}", planned.menu_item_id),
                        requested: planned.quantity,
                        available,
                    })?;
                // linha travada desde o planejamento: o saldo tem que bater
                debug_assert_eq!(Some(stock_after), planned.stock_after());

                self.inventory_repo
                    .record_entry(
                        &mut *tx,
                        &NewInventoryLog {
                            menu_item_id: planned.menu_item_id,
                            action: InventoryAction::Order,
                            quantity_changed: -planned.quantity,
                            stock_after,
                            actor_id: Some(user_id),
                            order_id: Some(order.id),
                        },
                    )
                    .await?;
            }
        }

        // 4. Se chegou aqui, deu tudo certo.
        tx.commit().await?;

        tracing::info!(
            "🧾 Pedido #{} criado ({}, total {}, {} linha(s))",
            order.id,
            payment_method,
            order.total,
            lines.len()
        );

        Ok(PlacedOrder {
            detail: OrderDetail { header: order, lines },
            pickup_code: issued.map(|code| code.plaintext),
        })
    }

    // --- CONSULTAS ---

    pub async fn get_order_detail<'a, A>(
        &self,
        conn: A,
        order_id: i64,
    ) -> Result<OrderDetail, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut conn = conn.acquire().await?;

        let header = self
            .order_repo
            .find_by_id(&mut *conn, order_id)
            .await?
            .ok_or(AppError::OrderNotFound(order_id))?;
        let lines = self.order_repo.list_lines(&mut *conn, order_id).await?;

        Ok(OrderDetail { header, lines })
    }

    pub async fn list_orders(
        &self,
        filter: &OrderFilter,
        page: u32,
    ) -> Result<Page<Order>, AppError> {
        let (limit, offset) = limit_offset(page, ORDERS_PER_PAGE);
        let orders = self.order_repo.list_orders(filter, limit, offset).await?;
        Ok(Page::new(orders, page.max(1), ORDERS_PER_PAGE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn item(id: i64, price: &str, stock: Option<i32>) -> MenuItem {
        MenuItem {
            id,
            name: format!("Item {}", id),
            price: Decimal::from_str(price).unwrap(),
            stock_qty: stock,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn line(id: i64, qty: i32) -> CartLine {
        CartLine {
            menu_item_id: id,
            quantity: qty,
        }
    }

    #[test]
    fn single_line_order_totals_and_decrements() {
        let items = vec![item(7, "3.50", Some(5))];
        let plan = plan_order(&[line(7, 2)], &items).unwrap();

        assert_eq!(plan.total, Decimal::from_str("7.00").unwrap());
        assert_eq!(plan.lines.len(), 1);
        assert_eq!(plan.lines[0].stock_after(), Some(3));
        assert_eq!(plan.lines[0].unit_price, Decimal::from_str("3.50").unwrap());
    }

    #[test]
    fn insufficient_stock_names_the_item() {
        let items = vec![item(9, "2.00", Some(4))];
        let err = plan_order(&[line(9, 10)], &items).unwrap_err();

        match err {
            AppError::InsufficientStock {
                item_id,
                requested,
                available,
                ..
            } => {
                assert_eq!(item_id, 9);
                assert_eq!(requested, 10);
                assert_eq!(available, 4);
            }
            other => panic!("erro inesperado: {:?}", other),
        }
    }

    #[test]
    fn one_failing_line_rejects_the_whole_cart() {
        let items = vec![item(1, "1.00", Some(10)), item(2, "1.00", Some(1))];
        let result = plan_order(&[line(1, 3), line(2, 2)], &items);
        assert!(matches!(result, Err(AppError::InsufficientStock { item_id: 2, .. })));

        // ordem inversa também falha
        let result = plan_order(&[line(2, 2), line(1, 3)], &items);
        assert!(matches!(result, Err(AppError::InsufficientStock { item_id: 2, .. })));
    }

    #[test]
    fn untracked_items_skip_the_stock_check() {
        let items = vec![item(3, "4.25", None)];
        let plan = plan_order(&[line(3, 100)], &items).unwrap();

        assert_eq!(plan.lines[0].stock_after(), None);
        assert_eq!(plan.total, Decimal::from_str("425.00").unwrap());
    }

    #[test]
    fn exact_stock_is_enough() {
        let items = vec![item(4, "1.10", Some(3))];
        let plan = plan_order(&[line(4, 3)], &items).unwrap();
        assert_eq!(plan.lines[0].stock_after(), Some(0));
    }

    #[test]
    fn unknown_or_inactive_items_are_not_found() {
        let mut inactive = item(5, "1.00", Some(3));
        inactive.is_active = false;

        assert!(matches!(
            plan_order(&[line(99, 1)], &[]),
            Err(AppError::ItemNotFound(99))
        ));
        assert!(matches!(
            plan_order(&[line(5, 1)], &[inactive]),
            Err(AppError::ItemNotFound(5))
        ));
    }

    #[test]
    fn cart_shape_is_validated() {
        assert!(matches!(validate_cart(&[]), Err(AppError::EmptyCart)));
        assert!(matches!(
            validate_cart(&[line(1, 0)]),
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            validate_cart(&[line(1, 1), line(1, 2)]),
            Err(AppError::DuplicateCartItem(1))
        ));
        assert!(validate_cart(&[line(1, 1), line(2, 2)]).is_ok());
    }

    #[test]
    fn total_is_the_sum_of_captured_prices() {
        let items = vec![
            item(1, "3.50", Some(10)),
            item(2, "0.99", None),
            item(3, "12.10", Some(2)),
        ];
        let plan = plan_order(&[line(3, 1), line(1, 2), line(2, 3)], &items).unwrap();

        // 12.10 + 7.00 + 2.97
        assert_eq!(plan.total, Decimal::from_str("22.07").unwrap());
        // linhas seguem a ordem do carrinho
        let ids: Vec<i64> = plan.lines.iter().map(|l| l.menu_item_id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn oversized_quantities_are_rejected_before_the_database() {
        assert!(matches!(
            validate_cart(&[line(1, MAX_LINE_QUANTITY + 1)]),
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            validate_cart(&[line(1, 100_000_000)]),
            Err(AppError::InvalidInput(_))
        ));
        assert!(validate_cart(&[line(1, MAX_LINE_QUANTITY)]).is_ok());
    }

    #[test]
    fn total_that_does_not_fit_the_column_is_rejected() {
        // 1000 × 99.999,99 passa de 10^8
        let items = vec![item(5, "99999.99", None)];
        let result = plan_order(&[line(5, MAX_LINE_QUANTITY)], &items);
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
        assert_eq!(result.unwrap_err().status_code(), axum::http::StatusCode::BAD_REQUEST);

        let plan = plan_order(&[line(5, 10)], &items).unwrap();
        assert_eq!(plan.total, Decimal::from_str("999999.90").unwrap());
    }
}
