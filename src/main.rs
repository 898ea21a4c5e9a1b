//src/main.rs

use axum::{
    routing::{get, post, put},
    Json, Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::AppState;
use crate::docs::ApiDoc;

#[tokio::main]
async fn main() {
    // RUST_LOG manda; sem ele, "info"
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    // .expect() é bom aqui: se a configuração falhar, a aplicação não deve iniciar.
    let app_state = AppState::new()
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let bind_addr = app_state.config.bind_addr.clone();
    let app = router(app_state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", bind_addr);
    axum::serve(listener, app)
        .await
        .expect("Erro no servidor Axum");
}

fn router(app_state: AppState) -> Router {
    // Autenticação e papel são checados pelos extratores de cada handler
    let menu_routes = Router::new()
        .route("/"
               ,get(handlers::menu::get_active_menu)
               .post(handlers::menu::create_item)
        )
        .route("/items", get(handlers::menu::get_items_by_ids))
        .route("/{id}"
               ,put(handlers::menu::update_item)
               .delete(handlers::menu::delete_item)
        );

    let order_routes = Router::new()
        .route("/"
               ,post(handlers::orders::place_order)
               .get(handlers::orders::list_orders)
        )
        .route("/mine", get(handlers::orders::list_my_orders))
        .route("/{id}", get(handlers::orders::get_order));

    let payment_routes = Router::new()
        .route("/verify", post(handlers::payments::verify_pickup))
        .route("/{id}/paid", post(handlers::payments::mark_paid))
        .route("/{id}/cancel", post(handlers::payments::cancel_order));

    let inventory_routes = Router::new()
        .route("/logs", get(handlers::inventory::list_logs));

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .nest("/api/menu", menu_routes)
        .nest("/api/orders", order_routes)
        .nest("/api/payments", payment_routes)
        .nest("/api/inventory", inventory_routes)
        .with_state(app_state)
}
