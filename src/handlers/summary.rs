// src/handlers/summary.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::tenancy::CompanyContext,
    models::{
        site::SiteProgress,
        summary::{FinancialSummary, MonthlyEntry, ProgressDisplay, SummaryDisplay},
    },
};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    #[serde(flatten)]
    pub summary: FinancialSummary,
    pub display: SummaryDisplay,
}

// GET /api/obras/{id}/resumo
#[utoipa::path(
    get,
    path = "/api/obras/{id}/resumo",
    tag = "Resumo",
    responses(
        (status = 200, description = "Resumo financeiro da obra", body = SummaryResponse),
        (status = 404, description = "Obra não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da obra"),
        ("x-company-id" = Uuid, Header, description = "ID da empresa")
    )
)]
pub async fn get_summary(
    State(app_state): State<AppState>,
    company: CompanyContext,
    Path(site_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let summary = app_state.summary_service.summarize(company.0, site_id).await?;
    let display = summary.display();
    Ok((StatusCode::OK, Json(SummaryResponse { summary, display })))
}

#[derive(Debug, Deserialize, Validate)]
pub struct MonthlyQuery {
    #[validate(range(min = 2000, max = 2100, message = "Ano fora do intervalo aceito."))]
    pub year: Option<i32>,
}

// GET /api/obras/{id}/resumo/mensal?year=2025
#[utoipa::path(
    get,
    path = "/api/obras/{id}/resumo/mensal",
    tag = "Resumo",
    responses(
        (status = 200, description = "Doze meses de faturamento e despesas", body = Vec<MonthlyEntry>),
        (status = 404, description = "Obra não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da obra"),
        ("year" = Option<i32>, Query, description = "Ano (padrão: ano corrente)"),
        ("x-company-id" = Uuid, Header, description = "ID da empresa")
    )
)]
pub async fn get_monthly(
    State(app_state): State<AppState>,
    company: CompanyContext,
    Path(site_id): Path<Uuid>,
    Query(query): Query<MonthlyQuery>,
) -> Result<impl IntoResponse, AppError> {
    query.validate()?;

    let year = query.year.unwrap_or_else(|| Utc::now().year());
    let months = app_state
        .summary_service
        .monthly(company.0, site_id, year)
        .await?;
    Ok((StatusCode::OK, Json(months)))
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResponse {
    #[serde(flatten)]
    pub progress: SiteProgress,
    pub display: ProgressDisplay,
}

// GET /api/obras/{id}/progresso
#[utoipa::path(
    get,
    path = "/api/obras/{id}/progresso",
    tag = "Resumo",
    responses(
        (status = 200, description = "Previsto x executado", body = ProgressResponse),
        (status = 404, description = "Obra não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da obra"),
        ("x-company-id" = Uuid, Header, description = "ID da empresa")
    )
)]
pub async fn get_progress(
    State(app_state): State<AppState>,
    company: CompanyContext,
    Path(site_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let progress = app_state.summary_service.progress(company.0, site_id).await?;
    let display = progress.display();
    Ok((StatusCode::OK, Json(ProgressResponse { progress, display })))
}
