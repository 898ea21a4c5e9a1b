// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;
use crate::services;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- MENU ---
        handlers::menu::get_active_menu,
        handlers::menu::get_items_by_ids,
        handlers::menu::create_item,
        handlers::menu::update_item,
        handlers::menu::delete_item,

        // --- ORDERS ---
        handlers::orders::place_order,
        handlers::orders::list_my_orders,
        handlers::orders::list_orders,
        handlers::orders::get_order,

        // --- PAYMENTS ---
        handlers::payments::verify_pickup,
        handlers::payments::mark_paid,
        handlers::payments::cancel_order,

        // --- INVENTORY ---
        handlers::inventory::list_logs,
    ),
    components(
        schemas(
            // --- Menu ---
            models::menu::MenuItem,
            handlers::menu::MenuItemPayload,

            // --- Orders ---
            models::order::PaymentMethod,
            models::order::PaymentStatus,
            models::order::Order,
            models::order::OrderLine,
            models::order::OrderDetail,
            models::order::PlacedOrder,
            handlers::orders::CartItemPayload,
            handlers::orders::PlaceOrderPayload,

            // --- Payments ---
            handlers::payments::VerifyPickupPayload,
            services::verification_service::VerificationOutcome,

            // --- Inventory ---
            models::inventory::InventoryAction,
            models::inventory::InventoryLogEntry,
        )
    ),
    tags(
        (name = "Menu", description = "Cardápio e Estoque dos Itens"),
        (name = "Orders", description = "Pedidos dos Alunos"),
        (name = "Payments", description = "Baixa de Pagamento e Retirada no Balcão"),
        (name = "Inventory", description = "Histórico de Movimentações de Estoque")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/menu",
            "/api/menu/items",
            "/api/menu/{item_id}",
            "/api/orders",
            "/api/orders/mine",
            "/api/orders/{order_id}",
            "/api/payments/verify",
            "/api/payments/{order_id}/paid",
            "/api/payments/{order_id}/cancel",
            "/api/inventory/logs",
        ] {
            assert!(doc.paths.paths.contains_key(path), "faltou {}", path);
        }
    }
}
