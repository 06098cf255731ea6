// src/handlers/sites.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::tenancy::CompanyContext,
    models::site::{NewSite, Site, SiteStatus},
};

// ---
// Payload: CreateSite
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSitePayload {
    #[validate(length(min = 1, max = 200, message = "O nome deve ter entre 1 e 200 caracteres."))]
    #[schema(example = "Pavimentação Jardim Europa")]
    pub name: String,

    pub client_id: Option<Uuid>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub city: Option<String>,

    #[validate(length(equal = 2, message = "Use a sigla do estado (ex.: SP)."))]
    pub state: Option<String>,

    // Vem do catálogo de serviços; pode ser definido depois
    #[schema(example = "25.00")]
    pub unit_price: Option<Decimal>,
    pub start_date: Option<NaiveDate>,
}

// POST /api/obras
#[utoipa::path(
    post,
    path = "/api/obras",
    tag = "Obras",
    request_body = CreateSitePayload,
    responses(
        (status = 201, description = "Obra criada em planejamento", body = Site),
        (status = 400, description = "Campos inválidos")
    ),
    params(
        ("x-company-id" = Uuid, Header, description = "ID da empresa")
    )
)]
pub async fn create_site(
    State(app_state): State<AppState>,
    company: CompanyContext,
    Json(payload): Json<CreateSitePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let site = app_state
        .site_service
        .create(NewSite {
            company_id: company.0,
            client_id: payload.client_id,
            name: payload.name,
            description: payload.description,
            location: payload.location,
            city: payload.city,
            state: payload.state.map(|s| s.to_uppercase()),
            unit_price: payload.unit_price,
            start_date: payload.start_date,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(site)))
}

#[derive(Debug, Deserialize)]
pub struct ListSitesQuery {
    pub status: Option<SiteStatus>,
}

// GET /api/obras?status=in_progress
#[utoipa::path(
    get,
    path = "/api/obras",
    tag = "Obras",
    responses(
        (status = 200, description = "Obras da empresa", body = Vec<Site>)
    ),
    params(
        ("status" = Option<SiteStatus>, Query, description = "Filtra pela situação da obra"),
        ("x-company-id" = Uuid, Header, description = "ID da empresa")
    )
)]
pub async fn list_sites(
    State(app_state): State<AppState>,
    company: CompanyContext,
    Query(query): Query<ListSitesQuery>,
) -> Result<impl IntoResponse, AppError> {
    let sites = app_state.site_service.list(company.0, query.status).await?;
    Ok((StatusCode::OK, Json(sites)))
}

// GET /api/obras/{id}
#[utoipa::path(
    get,
    path = "/api/obras/{id}",
    tag = "Obras",
    responses(
        (status = 200, description = "Obra", body = Site),
        (status = 404, description = "Obra não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da obra"),
        ("x-company-id" = Uuid, Header, description = "ID da empresa")
    )
)]
pub async fn get_site(
    State(app_state): State<AppState>,
    company: CompanyContext,
    Path(site_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let site = app_state.site_service.get(company.0, site_id).await?;
    Ok((StatusCode::OK, Json(site)))
}

// DELETE /api/obras/{id}
#[utoipa::path(
    delete,
    path = "/api/obras/{id}",
    tag = "Obras",
    responses(
        (status = 204, description = "Obra excluída"),
        (status = 404, description = "Obra não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da obra"),
        ("x-company-id" = Uuid, Header, description = "ID da empresa")
    )
)]
pub async fn delete_site(
    State(app_state): State<AppState>,
    company: CompanyContext,
    Path(site_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.site_service.delete(company.0, site_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetUnitPricePayload {
    pub unit_price: Decimal,
}

// PUT /api/obras/{id}/unit-price
#[utoipa::path(
    put,
    path = "/api/obras/{id}/unit-price",
    tag = "Obras",
    request_body = SetUnitPricePayload,
    responses(
        (status = 200, description = "Preço por m² atualizado", body = Site),
        (status = 400, description = "Preço inválido"),
        (status = 404, description = "Obra não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da obra"),
        ("x-company-id" = Uuid, Header, description = "ID da empresa")
    )
)]
pub async fn set_unit_price(
    State(app_state): State<AppState>,
    company: CompanyContext,
    Path(site_id): Path<Uuid>,
    Json(payload): Json<SetUnitPricePayload>,
) -> Result<impl IntoResponse, AppError> {
    let site = app_state
        .site_service
        .set_unit_price(company.0, site_id, payload.unit_price)
        .await?;
    Ok((StatusCode::OK, Json(site)))
}

// POST /api/obras/{id}/conclude
#[utoipa::path(
    post,
    path = "/api/obras/{id}/conclude",
    tag = "Obras",
    responses(
        (status = 200, description = "Obra concluída, valor executado congelado", body = Site),
        (status = 409, description = "Obra já encerrada"),
        (status = 404, description = "Obra não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da obra"),
        ("x-company-id" = Uuid, Header, description = "ID da empresa")
    )
)]
pub async fn conclude_site(
    State(app_state): State<AppState>,
    company: CompanyContext,
    Path(site_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let site = app_state.site_service.conclude(company.0, site_id).await?;
    Ok((StatusCode::OK, Json(site)))
}

// POST /api/obras/{id}/cancel
#[utoipa::path(
    post,
    path = "/api/obras/{id}/cancel",
    tag = "Obras",
    responses(
        (status = 200, description = "Obra cancelada", body = Site),
        (status = 409, description = "Obra já encerrada"),
        (status = 404, description = "Obra não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da obra"),
        ("x-company-id" = Uuid, Header, description = "ID da empresa")
    )
)]
pub async fn cancel_site(
    State(app_state): State<AppState>,
    company: CompanyContext,
    Path(site_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let site = app_state.site_service.cancel(company.0, site_id).await?;
    Ok((StatusCode::OK, Json(site)))
}
