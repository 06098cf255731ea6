// src/handlers/billing.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::tenancy::CompanyContext,
    models::billing::BillingRecord,
};

// GET /api/obras/{id}/faturamentos
#[utoipa::path(
    get,
    path = "/api/obras/{id}/faturamentos",
    tag = "Faturamentos",
    responses(
        (status = 200, description = "Faturamentos da obra", body = Vec<BillingRecord>),
        (status = 404, description = "Obra não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da obra"),
        ("x-company-id" = Uuid, Header, description = "ID da empresa")
    )
)]
pub async fn list_billing(
    State(app_state): State<AppState>,
    company: CompanyContext,
    Path(site_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let records = app_state.billing_service.list(company.0, site_id).await?;
    Ok((StatusCode::OK, Json(records)))
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkPaidPayload {
    #[validate(length(max = 60, message = "Número da nota fiscal muito longo."))]
    pub invoice_number: Option<String>,
}

// POST /api/faturamentos/{id}/pay
#[utoipa::path(
    post,
    path = "/api/faturamentos/{id}/pay",
    tag = "Faturamentos",
    request_body = MarkPaidPayload,
    responses(
        (status = 200, description = "Faturamento marcado como pago", body = BillingRecord),
        (status = 409, description = "Faturamento já pago"),
        (status = 404, description = "Faturamento não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do faturamento"),
        ("x-company-id" = Uuid, Header, description = "ID da empresa")
    )
)]
pub async fn mark_paid(
    State(app_state): State<AppState>,
    company: CompanyContext,
    Path(billing_id): Path<Uuid>,
    Json(payload): Json<MarkPaidPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let record = app_state
        .billing_service
        .mark_paid(company.0, billing_id, payload.invoice_number.as_deref())
        .await?;

    Ok((StatusCode::OK, Json(record)))
}
