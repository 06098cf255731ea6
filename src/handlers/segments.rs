// src/handlers/segments.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::tenancy::CompanyContext,
    models::segment::{NewSegment, Segment, SegmentStatusCount},
    services::segment_service::{CompleteSegment, CompletedSegment},
};

// ---
// Payload: CreateSegment
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSegmentPayload {
    #[validate(length(max = 200, message = "O nome deve ter no máximo 200 caracteres."))]
    pub name: String,

    #[validate(range(min = 0, message = "A ordem não pode ser negativa."))]
    pub position: Option<i32>,

    // Metragem e toneladas previstas (toneladas estimadas se omitidas)
    pub planned_area: Option<Decimal>,
    pub planned_mass: Option<Decimal>,
    pub notes: Option<String>,

    #[validate(url(message = "URL da imagem inválida."))]
    pub image_url: Option<String>,
}

// POST /api/obras/{id}/ruas
#[utoipa::path(
    post,
    path = "/api/obras/{id}/ruas",
    tag = "Ruas",
    request_body = CreateSegmentPayload,
    responses(
        (status = 201, description = "Rua criada como pendente", body = Segment),
        (status = 400, description = "Campos inválidos"),
        (status = 404, description = "Obra não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da obra"),
        ("x-company-id" = Uuid, Header, description = "ID da empresa")
    )
)]
pub async fn create_segment(
    State(app_state): State<AppState>,
    company: CompanyContext,
    Path(site_id): Path<Uuid>,
    Json(payload): Json<CreateSegmentPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let segment = app_state
        .segment_service
        .create(
            company.0,
            NewSegment {
                site_id,
                name: payload.name,
                position: payload.position,
                planned_area: payload.planned_area,
                planned_mass: payload.planned_mass,
                notes: payload.notes,
                image_url: payload.image_url,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(segment)))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SegmentList {
    pub segments: Vec<Segment>,
    pub counts: SegmentStatusCount,
}

// GET /api/obras/{id}/ruas
#[utoipa::path(
    get,
    path = "/api/obras/{id}/ruas",
    tag = "Ruas",
    responses(
        (status = 200, description = "Ruas na ordem de execução, com contagem por situação", body = SegmentList),
        (status = 404, description = "Obra não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da obra"),
        ("x-company-id" = Uuid, Header, description = "ID da empresa")
    )
)]
pub async fn list_segments(
    State(app_state): State<AppState>,
    company: CompanyContext,
    Path(site_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let segments = app_state.segment_service.list(company.0, site_id).await?;
    let counts = app_state
        .segment_service
        .count_by_status(company.0, site_id)
        .await?;

    Ok((StatusCode::OK, Json(SegmentList { segments, counts })))
}

// POST /api/ruas/{id}/start
#[utoipa::path(
    post,
    path = "/api/ruas/{id}/start",
    tag = "Ruas",
    responses(
        (status = 200, description = "Rua em execução", body = Segment),
        (status = 409, description = "Rua já iniciada ou finalizada"),
        (status = 404, description = "Rua não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da rua"),
        ("x-company-id" = Uuid, Header, description = "ID da empresa")
    )
)]
pub async fn start_segment(
    State(app_state): State<AppState>,
    company: CompanyContext,
    Path(segment_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let segment = app_state.segment_service.start(company.0, segment_id).await?;
    Ok((StatusCode::OK, Json(segment)))
}

// ---
// Payload: CompleteSegment (medição da execução)
// ---
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompleteSegmentPayload {
    #[schema(example = "1450.00")]
    pub executed_area: Decimal,
    #[schema(example = "150.00")]
    pub executed_mass: Decimal,
    pub notes: Option<String>,
}

// POST /api/ruas/{id}/complete
#[utoipa::path(
    post,
    path = "/api/ruas/{id}/complete",
    tag = "Ruas",
    request_body = CompleteSegmentPayload,
    responses(
        (status = 200, description = "Rua finalizada e faturamento gerado", body = CompletedSegment),
        (status = 400, description = "Medição inválida ou obra sem preço por m²"),
        (status = 409, description = "Rua já finalizada"),
        (status = 404, description = "Rua não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da rua"),
        ("x-company-id" = Uuid, Header, description = "ID da empresa")
    )
)]
pub async fn complete_segment(
    State(app_state): State<AppState>,
    company: CompanyContext,
    Path(segment_id): Path<Uuid>,
    Json(payload): Json<CompleteSegmentPayload>,
) -> Result<impl IntoResponse, AppError> {
    let completed = app_state
        .segment_service
        .complete(
            company.0,
            segment_id,
            CompleteSegment {
                executed_area: payload.executed_area,
                executed_mass: payload.executed_mass,
                notes: payload.notes,
            },
        )
        .await?;

    Ok((StatusCode::OK, Json(completed)))
}

// DELETE /api/ruas/{id}
#[utoipa::path(
    delete,
    path = "/api/ruas/{id}",
    tag = "Ruas",
    responses(
        (status = 204, description = "Rua e faturamento removidos"),
        (status = 404, description = "Rua não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da rua"),
        ("x-company-id" = Uuid, Header, description = "ID da empresa")
    )
)]
pub async fn delete_segment(
    State(app_state): State<AppState>,
    company: CompanyContext,
    Path(segment_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.segment_service.delete(company.0, segment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
