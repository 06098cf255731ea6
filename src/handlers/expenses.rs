// src/handlers/expenses.rs

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
    models::expense::{ExpenseCategory, ExpenseFilter, ExpenseRecord},
    services::expense_service::AddExpense,
};

// ---
// Payload: AddExpense
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddExpensePayload {
    pub category: ExpenseCategory,

    #[validate(length(max = 500, message = "A descrição deve ter no máximo 500 caracteres."))]
    pub description: String,

    #[schema(example = "1800.00")]
    pub amount: Decimal,
    pub expense_date: Option<NaiveDate>,
    pub supplier: Option<String>,

    // Maquinário de origem (despesas de diesel)
    pub equipment_id: Option<Uuid>,

    #[validate(url(message = "URL do comprovante inválida."))]
    pub receipt_url: Option<String>,

    pub include_in_company_rollup: Option<bool>,
}

// POST /api/obras/{id}/despesas
#[utoipa::path(
    post,
    path = "/api/obras/{id}/despesas",
    tag = "Despesas",
    request_body = AddExpensePayload,
    responses(
        (status = 201, description = "Despesa lançada", body = ExpenseRecord),
        (status = 400, description = "Campos inválidos"),
        (status = 404, description = "Obra não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da obra"),
        ("x-company-id" = Uuid, Header, description = "ID da empresa")
    )
)]
pub async fn add_expense(
    State(app_state): State<AppState>,
    company: CompanyContext,
    Path(site_id): Path<Uuid>,
    Json(payload): Json<AddExpensePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let expense = app_state
        .expense_service
        .add(
            company.0,
            site_id,
            AddExpense {
                category: payload.category,
                description: payload.description,
                amount: payload.amount,
                expense_date: payload.expense_date,
                supplier: payload.supplier,
                equipment_id: payload.equipment_id,
                receipt_url: payload.receipt_url,
                include_in_company_rollup: payload.include_in_company_rollup,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(expense)))
}

// GET /api/obras/{id}/despesas?category=fuel&from=2025-01-01&to=2025-01-31
#[utoipa::path(
    get,
    path = "/api/obras/{id}/despesas",
    tag = "Despesas",
    responses(
        (status = 200, description = "Despesas da obra, mais recentes primeiro", body = Vec<ExpenseRecord>),
        (status = 404, description = "Obra não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da obra"),
        ("category" = Option<ExpenseCategory>, Query, description = "Categoria da despesa"),
        ("from" = Option<NaiveDate>, Query, description = "Data inicial (inclusiva)"),
        ("to" = Option<NaiveDate>, Query, description = "Data final (inclusiva)"),
        ("equipmentId" = Option<Uuid>, Query, description = "Maquinário de origem"),
        ("x-company-id" = Uuid, Header, description = "ID da empresa")
    )
)]
pub async fn list_expenses(
    State(app_state): State<AppState>,
    company: CompanyContext,
    Path(site_id): Path<Uuid>,
    Query(filter): Query<ExpenseFilter>,
) -> Result<impl IntoResponse, AppError> {
    let expenses = app_state
        .expense_service
        .list(company.0, site_id, &filter)
        .await?;
    Ok((StatusCode::OK, Json(expenses)))
}

// DELETE /api/despesas/{id}
#[utoipa::path(
    delete,
    path = "/api/despesas/{id}",
    tag = "Despesas",
    responses(
        (status = 204, description = "Despesa excluída"),
        (status = 403, description = "Despesa de diesel pertence ao controle de abastecimento"),
        (status = 404, description = "Despesa não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da despesa"),
        ("x-company-id" = Uuid, Header, description = "ID da empresa")
    )
)]
pub async fn delete_expense(
    State(app_state): State<AppState>,
    company: CompanyContext,
    Path(expense_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.expense_service.remove(company.0, expense_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
