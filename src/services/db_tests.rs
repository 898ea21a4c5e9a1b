// src/services/db_tests.rs
//
// Testes contra um Postgres real. Rodar com:
//   DATABASE_URL=postgres://... cargo test -- --ignored

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::{AppState, Config},
    services::menu_service::MenuItemRemoval,
    models::{
        inventory::{InventoryAction, InventoryLogFilter},
        order::{CartLine, PaymentMethod, PaymentStatus},
    },
};

fn state(pool: PgPool) -> AppState {
    let config = Config {
        database_url: String::new(),
        jwt_secret: "segredo".into(),
        bind_addr: "127.0.0.1:0".into(),
        db_max_connections: 5,
        pickup_code_ttl_hours: 24,
        pickup_scan_window_hours: 24,
        pickup_hash_cost: 4,
    };
    AppState::with_pool(pool, config)
}

async fn seed_item(state: &AppState, name: &str, price: i64, stock: Option<i32>) -> i64 {
    state
        .menu_service
        .create_item(&state.db_pool, Uuid::new_v4(), name, Decimal::new(price, 2), stock, true)
        .await
        .unwrap()
        .id
}

async fn stock_of(pool: &PgPool, item_id: i64) -> Option<i32> {
    sqlx::query_scalar("SELECT stock_qty FROM menu_items WHERE id = $1")
        .bind(item_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn order_count(pool: &PgPool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM orders")
        .fetch_one(pool)
        .await
        .unwrap()
}

fn line(menu_item_id: i64, quantity: i32) -> CartLine {
    CartLine { menu_item_id, quantity }
}

#[sqlx::test]
#[ignore]
async fn cash_order_decrements_stock_and_is_paid_once(pool: PgPool) {
    let state = state(pool.clone());
    let item = seed_item(&state, "Pão de queijo", 350, Some(5)).await;

    let placed = state
        .order_service
        .place_order(&pool, Uuid::new_v4(), PaymentMethod::Cash, &[line(item, 2)])
        .await
        .unwrap();

    assert_eq!(placed.detail.header.total, Decimal::new(700, 2));
    assert_eq!(placed.detail.header.payment_status, PaymentStatus::Pending);
    assert_eq!(stock_of(&pool, item).await, Some(3));
    let code = placed.pickup_code.expect("pedido em dinheiro traz código");
    let order_id = placed.detail.header.id;

    // uma única baixa, com delta e saldo da linha
    let logs: Vec<(i32, i32)> = sqlx::query_as(
        "SELECT quantity_changed, stock_after FROM inventory_logs WHERE order_id = $1 AND action = 'order'",
    )
    .bind(order_id)
    .fetch_all(&pool)
    .await
    .unwrap();
    assert_eq!(logs, vec![(-2, 3)]);

    // no banco fica só o hash bcrypt
    let stored: Option<String> =
        sqlx::query_scalar("SELECT pickup_code_hash FROM orders WHERE id = $1")
            .bind(order_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    let stored = stored.expect("pedido em dinheiro pendente guarda o hash");
    assert_ne!(stored, code);
    assert!(stored.starts_with("$2"));
    assert_eq!(stored.len(), 60);

    let outcome = state
        .verification_service
        .verify_pickup(&code, Some(order_id), Uuid::new_v4())
        .await
        .unwrap();
    assert_eq!(outcome.order.payment_status, PaymentStatus::Paid);
    assert!(outcome.order.pickup_code_hash.is_none());

    let again = state
        .verification_service
        .verify_pickup(&code, Some(order_id), Uuid::new_v4())
        .await;
    assert!(matches!(again, Err(AppError::OrderNotFound(id)) if id == order_id));
}

#[sqlx::test]
#[ignore]
async fn failed_order_leaves_nothing_behind(pool: PgPool) {
    let state = state(pool.clone());
    let plenty = seed_item(&state, "Suco", 500, Some(10)).await;
    let scarce = seed_item(&state, "Bolo", 800, Some(1)).await;

    let result = state
        .order_service
        .place_order(
            &pool,
            Uuid::new_v4(),
            PaymentMethod::Qr,
            &[line(plenty, 3), line(scarce, 2)],
        )
        .await;

    assert!(matches!(
        result,
        Err(AppError::InsufficientStock { item_id, requested: 2, available: 1, .. }) if item_id == scarce
    ));
    assert_eq!(stock_of(&pool, plenty).await, Some(10));
    assert_eq!(stock_of(&pool, scarce).await, Some(1));
    assert_eq!(order_count(&pool).await, 0);
}

#[sqlx::test]
#[ignore]
async fn concurrent_orders_never_oversell(pool: PgPool) {
    let state = state(pool.clone());
    let item = seed_item(&state, "Último salgado", 600, Some(1)).await;

    let first = {
        let state = state.clone();
        tokio::spawn(async move {
            state
                .order_service
                .place_order(&state.db_pool, Uuid::new_v4(), PaymentMethod::Qr, &[line(item, 1)])
                .await
        })
    };
    let second = {
        let state = state.clone();
        tokio::spawn(async move {
            state
                .order_service
                .place_order(&state.db_pool, Uuid::new_v4(), PaymentMethod::Qr, &[line(item, 1)])
                .await
        })
    };

    let results = [first.await.unwrap(), second.await.unwrap()];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(stock_of(&pool, item).await, Some(0));
}

#[sqlx::test]
#[ignore]
async fn code_is_found_without_order_id(pool: PgPool) {
    let state = state(pool.clone());
    let item = seed_item(&state, "Café", 200, None).await;

    let placed = state
        .order_service
        .place_order(&pool, Uuid::new_v4(), PaymentMethod::Cash, &[line(item, 1)])
        .await
        .unwrap();
    let code = placed.pickup_code.unwrap();

    let outcome = state
        .verification_service
        .verify_pickup(&code, None, Uuid::new_v4())
        .await
        .unwrap();
    assert_eq!(outcome.order.id, placed.detail.header.id);
    assert_eq!(stock_of(&pool, item).await, None);

    let again = state
        .verification_service
        .verify_pickup(&code, None, Uuid::new_v4())
        .await;
    assert!(matches!(again, Err(AppError::NoMatchingOrder)));
}

#[sqlx::test]
#[ignore]
async fn expired_code_is_refused(pool: PgPool) {
    let state = state(pool.clone());
    let item = seed_item(&state, "Água", 300, Some(4)).await;

    let placed = state
        .order_service
        .place_order(&pool, Uuid::new_v4(), PaymentMethod::Cash, &[line(item, 1)])
        .await
        .unwrap();
    let order_id = placed.detail.header.id;

    sqlx::query("UPDATE orders SET pickup_code_expires_at = NOW() - INTERVAL '1 minute' WHERE id = $1")
        .bind(order_id)
        .execute(&pool)
        .await
        .unwrap();

    let result = state
        .verification_service
        .verify_pickup(&placed.pickup_code.unwrap(), Some(order_id), Uuid::new_v4())
        .await;
    assert!(matches!(result, Err(AppError::CredentialExpired)));
}

#[sqlx::test]
#[ignore]
async fn cancelling_restores_stock_and_logs_it(pool: PgPool) {
    let state = state(pool.clone());
    let item = seed_item(&state, "Coxinha", 450, Some(5)).await;

    let placed = state
        .order_service
        .place_order(&pool, Uuid::new_v4(), PaymentMethod::Qr, &[line(item, 2)])
        .await
        .unwrap();
    assert_eq!(stock_of(&pool, item).await, Some(3));

    let cancelled = state
        .payment_service
        .cancel_order(&pool, placed.detail.header.id, Uuid::new_v4())
        .await
        .unwrap();
    assert_eq!(cancelled.payment_status, PaymentStatus::Cancelled);
    assert_eq!(stock_of(&pool, item).await, Some(5));

    let logs = state
        .inventory_service
        .list_logs(
            &InventoryLogFilter {
                menu_item_id: Some(item),
                ..Default::default()
            },
            1,
        )
        .await
        .unwrap();
    let net: i32 = logs.items.iter().map(|entry| entry.quantity_changed).sum();
    // ajuste inicial (+5), pedido (-2), cancelamento (+2)
    assert_eq!(logs.items.len(), 3);
    assert_eq!(net, 5);
    let returned: Vec<(i32, i32)> = logs
        .items
        .iter()
        .filter(|entry| entry.action == InventoryAction::Cancellation)
        .map(|entry| (entry.quantity_changed, entry.stock_after))
        .collect();
    assert_eq!(returned, vec![(2, 5)]);

    let again = state
        .payment_service
        .cancel_order(&pool, placed.detail.header.id, Uuid::new_v4())
        .await;
    assert!(matches!(again, Err(AppError::InvalidStatusTransition { .. })));
}

#[sqlx::test]
#[ignore]
async fn scan_pays_only_the_order_holding_the_code(pool: PgPool) {
    let state = state(pool.clone());
    let item = seed_item(&state, "Pão na chapa", 400, None).await;

    let first = state
        .order_service
        .place_order(&pool, Uuid::new_v4(), PaymentMethod::Cash, &[line(item, 1)])
        .await
        .unwrap();
    let first_code = first.pickup_code.clone().unwrap();

    // sorteia de novo até sair um código diferente do primeiro
    let second = loop {
        let placed = state
            .order_service
            .place_order(&pool, Uuid::new_v4(), PaymentMethod::Cash, &[line(item, 1)])
            .await
            .unwrap();
        if placed.pickup_code.as_deref() != Some(first_code.as_str()) {
            break placed;
        }
    };

    let outcome = state
        .verification_service
        .verify_pickup(&second.pickup_code.unwrap(), None, Uuid::new_v4())
        .await
        .unwrap();
    assert_eq!(outcome.order.id, second.detail.header.id);

    let first_status: PaymentStatus =
        sqlx::query_scalar("SELECT payment_status FROM orders WHERE id = $1")
            .bind(first.detail.header.id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(first_status, PaymentStatus::Pending);
}

#[sqlx::test]
#[ignore]
async fn unused_item_is_deleted(pool: PgPool) {
    let state = state(pool.clone());
    let item = seed_item(&state, "Esfiha", 550, Some(3)).await;

    let removal = state
        .menu_service
        .delete_item(&pool, Uuid::new_v4(), item)
        .await
        .unwrap();
    assert!(matches!(removal, MenuItemRemoval::Deleted));

    let left: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM menu_items WHERE id = $1")
        .bind(item)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(left, 0);

    let again = state.menu_service.delete_item(&pool, Uuid::new_v4(), item).await;
    assert!(matches!(again, Err(AppError::ItemNotFound(id)) if id == item));
}

#[sqlx::test]
#[ignore]
async fn ordered_item_is_only_deactivated(pool: PgPool) {
    let state = state(pool.clone());
    let item = seed_item(&state, "Empada", 500, Some(3)).await;

    let placed = state
        .order_service
        .place_order(&pool, Uuid::new_v4(), PaymentMethod::Qr, &[line(item, 1)])
        .await
        .unwrap();

    let removal = state
        .menu_service
        .delete_item(&pool, Uuid::new_v4(), item)
        .await
        .unwrap();
    match removal {
        MenuItemRemoval::Deactivated(menu_item) => assert!(!menu_item.is_active),
        other => panic!("esperava desativação, veio {:?}", other),
    }

    // o pedido continua consultável e o item some do cardápio
    let detail = state
        .order_service
        .get_order_detail(&pool, placed.detail.header.id)
        .await
        .unwrap();
    assert_eq!(detail.lines[0].menu_item_id, item);
    let menu = state.menu_service.get_active_menu_items().await.unwrap();
    assert!(menu.iter().all(|m| m.id != item));
}
