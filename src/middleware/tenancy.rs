// src/middleware/tenancy.rs

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::common::error::AppError;

// Cabeçalho com a empresa dona dos dados. A autenticação em si é externa.
pub const COMPANY_ID_HEADER: &str = "x-company-id";

/// Empresa em nome da qual a requisição opera.
#[derive(Debug, Clone, Copy)]
pub struct CompanyContext(pub Uuid);

impl<S> FromRequestParts<S> for CompanyContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts.headers.get(COMPANY_ID_HEADER).ok_or_else(|| {
            AppError::invalid_field(COMPANY_ID_HEADER, "O cabeçalho X-Company-ID é obrigatório.")
        })?;

        let company_id = value
            .to_str()
            .ok()
            .and_then(|v| Uuid::parse_str(v.trim()).ok())
            .ok_or_else(|| {
                AppError::invalid_field(
                    COMPANY_ID_HEADER,
                    "Cabeçalho X-Company-ID inválido (não é um UUID).",
                )
            })?;

        Ok(CompanyContext(company_id))
    }
}
