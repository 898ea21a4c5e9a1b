use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::collections::HashMap;
use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // Entrada malformada que não passa pelo `validator` (ex: enum desconhecido)
    #[error("Entrada inválida: {0}")]
    InvalidInput(String),

    #[error("O carrinho está vazio")]
    EmptyCart,

    #[error("Item {0} repetido no carrinho")]
    DuplicateCartItem(i64),

    #[error("Item {0} não encontrado")]
    ItemNotFound(i64),

    #[error("Estoque insuficiente para o item {item_id} ({name}): pedido {requested}, disponível {available}")]
    InsufficientStock {
        item_id: i64,
        name: String,
        requested: i32,
        available: i32,
    },

    #[error("Pedido {0} não encontrado ou não está pendente")]
    OrderNotFound(i64),

    #[error("Código de retirada expirado")]
    CredentialExpired,

    #[error("Código de retirada inválido")]
    InvalidCredential,

    #[error("Nenhum pedido pendente corresponde ao código")]
    NoMatchingOrder,

    #[error("Pedido {order_id} está '{status}' e não pode ser alterado")]
    InvalidStatusTransition { order_id: i64, status: String },

    #[error("Token inválido")]
    InvalidToken,

    #[error("Acesso negado")]
    Forbidden,

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::InvalidInput(_)
            | AppError::EmptyCart
            | AppError::DuplicateCartItem(_) => StatusCode::BAD_REQUEST,
            AppError::ItemNotFound(_) | AppError::OrderNotFound(_) | AppError::NoMatchingOrder => {
                StatusCode::NOT_FOUND
            }
            AppError::InsufficientStock { .. } | AppError::InvalidStatusTransition { .. } => {
                StatusCode::CONFLICT
            }
            AppError::CredentialExpired => StatusCode::GONE,
            AppError::InvalidCredential => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Achata os erros de validação em `campo -> mensagens`, incluindo os
/// aninhados (`items[0].qty`).
pub fn validation_details(errors: &ValidationErrors) -> HashMap<String, Vec<String>> {
    let mut details = HashMap::new();
    collect_details("", errors, &mut details);
    details
}

fn collect_details(prefix: &str, errors: &ValidationErrors, out: &mut HashMap<String, Vec<String>>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                let messages = field_errors
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect();
                out.insert(path, messages);
            }
            ValidationErrorsKind::Struct(inner) => collect_details(&path, inner, out),
            ValidationErrorsKind::List(entries) => {
                for (index, inner) in entries {
                    collect_details(&format!("{}[{}]", path, index), inner, out);
                }
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let error_message = match self {
            // Retorna todos os detalhes da validação.
            AppError::ValidationError(errors) => {
                let details = validation_details(&errors);
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (status, body).into_response();
            }
            AppError::InvalidToken => "Token de autenticação inválido ou ausente.".to_string(),
            AppError::Forbidden => "Você não tem permissão para realizar esta ação.".to_string(),

            // Erros internos viram 500; o detalhe fica só no log.
            ref e if status == StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!("Erro Interno do Servidor: {:?}", e);
                "Ocorreu um erro inesperado.".to_string()
            }

            // Erros de negócio já carregam uma mensagem útil para o usuário.
            e => e.to_string(),
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
