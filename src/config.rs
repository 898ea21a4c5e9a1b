// src/config.rs

use std::{env, str::FromStr, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{InventoryRepository, MenuRepository, OrderRepository},
    services::{
        inventory_service::InventoryService, menu_service::MenuService,
        order_service::OrderService, payment_service::PaymentService,
        pickup::PickupCodeService, verification_service::PickupVerificationService,
    },
};

/// Configuração lida do ambiente (e do `.env`, se existir).
#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    // Validade do código de retirada
    pub pickup_code_ttl_hours: i64,
    // Janela da busca sem id de pedido
    pub pickup_scan_window_hours: i64,
    pub pickup_hash_cost: u32,
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).with_context(|| format!("{} deve ser definida", key))
}

fn optional<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} inválida ('{}'): {}", key, raw, e)),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let config = Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            bind_addr: optional("BIND_ADDR", "0.0.0.0:3000".to_string())?,
            db_max_connections: optional("DB_MAX_CONNECTIONS", 5)?,
            pickup_code_ttl_hours: optional("PICKUP_CODE_TTL_HOURS", 24)?,
            pickup_scan_window_hours: optional("PICKUP_SCAN_WINDOW_HOURS", 24)?,
            pickup_hash_cost: optional("PICKUP_HASH_COST", 10)?,
        };

        if !(4..=31).contains(&config.pickup_hash_cost) {
            anyhow::bail!("PICKUP_HASH_COST deve estar entre 4 e 31");
        }
        if config.pickup_code_ttl_hours <= 0 || config.pickup_scan_window_hours <= 0 {
            anyhow::bail!("PICKUP_CODE_TTL_HOURS e PICKUP_SCAN_WINDOW_HOURS devem ser positivas");
        }

        Ok(config)
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Config,
    pub menu_service: MenuService,
    pub order_service: OrderService,
    pub verification_service: PickupVerificationService,
    pub payment_service: PaymentService,
    pub inventory_service: InventoryService,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config::from_env()?;

        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Ok(Self::with_pool(db_pool, config))
    }

    // --- Monta o gráfico de dependências ---
    pub fn with_pool(db_pool: PgPool, config: Config) -> Self {
        let menu_repo = MenuRepository::new(db_pool.clone());
        let order_repo = OrderRepository::new(db_pool.clone());
        let inventory_repo = InventoryRepository::new(db_pool.clone());

        let pickup_codes =
            PickupCodeService::new(config.pickup_hash_cost, config.pickup_code_ttl_hours);

        let menu_service = MenuService::new(menu_repo.clone(), inventory_repo.clone());
        let order_service = OrderService::new(
            menu_repo.clone(),
            order_repo.clone(),
            inventory_repo.clone(),
            pickup_codes.clone(),
        );
        let verification_service = PickupVerificationService::new(
            order_repo.clone(),
            pickup_codes,
            config.pickup_scan_window_hours,
            db_pool.clone(),
        );
        let payment_service =
            PaymentService::new(menu_repo, order_repo, inventory_repo.clone());
        let inventory_service = InventoryService::new(inventory_repo);

        Self {
            db_pool,
            config,
            menu_service,
            order_service,
            verification_service,
            payment_service,
            inventory_service,
        }
    }
}
