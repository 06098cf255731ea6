use std::borrow::Cow;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use validator::{ValidationError, ValidationErrors};

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    // Entrada inválida ou ausente (o chamador corrige e tenta de novo)
    #[error("Erro de validação: {0}")]
    ValidationError(#[from] ValidationErrors),

    // Operação ilegal no estado atual da entidade
    #[error("{0}")]
    InvalidState(String),

    #[error("{0} não encontrado(a)")]
    ResourceNotFound(String),

    // Operação proibida por regra de propriedade
    #[error("{0}")]
    Forbidden(String),

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),
}

impl AppError {
    /// Erro de validação apontando um único campo.
    pub fn invalid_field(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = ValidationErrors::new();
        let error = ValidationError::new("invalid").with_message(Cow::from(message.into()));
        errors.add(field, error);
        AppError::ValidationError(errors)
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        AppError::ResourceNotFound(what.into())
    }

    /// Soma ou produto monetário fora da faixa do `Decimal`.
    pub fn overflow(what: &str) -> Self {
        AppError::InternalServerError(anyhow::anyhow!("estouro aritmético ao calcular {}", what))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            // Retorna todos os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::InvalidState(ref message) => (StatusCode::CONFLICT, message.clone()),
            AppError::ResourceNotFound(ref what) => {
                (StatusCode::NOT_FOUND, format!("{} não encontrado(a)", what))
            }
            AppError::Forbidden(ref message) => (StatusCode::FORBIDDEN, message.clone()),

            // DatabaseError e InternalServerError viram 500; o detalhe fica só no log.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Ocorreu um erro inesperado.".to_string(),
                )
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
pub(crate) fn invalid_fields(err: &AppError) -> Vec<String> {
    match err {
        AppError::ValidationError(errors) => errors
            .field_errors()
            .into_iter()
            .map(|(field, _)| field.to_string())
            .collect(),
        _ => Vec::new(),
    }
}
