// src/services/pickup.rs

//! Códigos de retirada para pedidos pagos em dinheiro.
//!
//! O código tem 4 dígitos (0000-9999), sorteados uniformemente. Só o hash
//! bcrypt é persistido; o texto em claro vive em memória até ser devolvido
//! uma única vez a quem fez o pedido.
//!
//! Não há garantia de unicidade entre pedidos pendentes: com 10.000 códigos
//! possíveis, dois pedidos podem receber o mesmo número.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use crate::common::error::AppError;

pub const PICKUP_CODE_LEN: usize = 4;

/// Sorteia um código de 4 dígitos, com zeros à esquerda.
pub fn generate_code() -> String {
    let n: u16 = rand::thread_rng().gen_range(0..=9999);
    format!("{:04}", n)
}

/// Exatamente 4 dígitos ASCII.
pub fn is_well_formed(code: &str) -> bool {
    code.len() == PICKUP_CODE_LEN && code.bytes().all(|b| b.is_ascii_digit())
}

/// Código recém-emitido. O Debug não mostra o texto em claro.
pub struct IssuedCode {
    pub plaintext: String,
    pub hash: String,
    pub expires_at: DateTime<Utc>,
}

impl fmt::Debug for IssuedCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedCode")
            .field("plaintext", &"****")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[derive(Clone)]
pub struct PickupCodeService {
    hash_cost: u32,
    ttl: Duration,
}

impl PickupCodeService {
    pub fn new(hash_cost: u32, ttl_hours: i64) -> Self {
        Self {
            hash_cost,
            ttl: Duration::hours(ttl_hours),
        }
    }

    pub fn expiry_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.ttl
    }

    /// Sorteia, faz o hash e calcula a validade.
    pub async fn issue(&self, now: DateTime<Utc>) -> Result<IssuedCode, AppError> {
        let plaintext = generate_code();
        let hash = self.hash(&plaintext).await?;
        Ok(IssuedCode {
            plaintext,
            hash,
            expires_at: self.expiry_from(now),
        })
    }

    pub async fn hash(&self, code: &str) -> Result<String, AppError> {
        let code = code.to_owned();
        let cost = self.hash_cost;

        // bcrypt é lento de propósito; roda fora do executor async
        let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(&code, cost))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

        Ok(hashed)
    }

    /// Compara o código apresentado com o hash guardado (bcrypt, tempo constante).
    pub async fn matches(&self, code: &str, hash: &str) -> Result<bool, AppError> {
        let code = code.to_owned();
        let hash = hash.to_owned();

        let valid = tokio::task::spawn_blocking(move || bcrypt::verify(&code, &hash))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação do código: {}", e))??;

        Ok(valid)
    }
}
