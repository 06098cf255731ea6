// src/models/site.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use utoipa::ToSchema;

use crate::common::error::AppError;

// --- Enums (Mapeando o Postgres) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "site_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SiteStatus {
    Planning,   // Planejamento
    InProgress, // Em andamento
    Completed,  // Concluída
    Cancelled,  // Cancelada
}

impl SiteStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SiteStatus::Planning => "planning",
            SiteStatus::InProgress => "in_progress",
            SiteStatus::Completed => "completed",
            SiteStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_closed(self) -> bool {
        matches!(self, SiteStatus::Completed | SiteStatus::Cancelled)
    }
}

// --- Structs ---

/// Obra: um contrato de pavimentação.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub id: Uuid,
    pub company_id: Uuid,
    pub client_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub status: SiteStatus,

    // Preço contratado por m² (vem do catálogo de serviços)
    pub unit_price: Option<Decimal>,
    // Congelado na conclusão da obra, nunca recalculado
    pub executed_value: Option<Decimal>,

    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Site {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Preço vigente para faturar. Sem preço resolvido não há faturamento.
    pub fn billing_price(&self) -> Result<Decimal, AppError> {
        match self.unit_price {
            Some(price) if price > Decimal::ZERO => Ok(price),
            _ => Err(AppError::invalid_field(
                "unit_price",
                "A obra não possui preço por m² definido; não é possível faturar.",
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewSite {
    pub company_id: Uuid,
    pub client_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub unit_price: Option<Decimal>,
    pub start_date: Option<NaiveDate>,
}

/// Métricas de progresso da obra.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SiteProgress {
    pub planned_area: Decimal,
    pub executed_area: Decimal,
    pub planned_mass: Decimal,
    pub executed_mass: Decimal,
    pub total_segments: usize,
    pub completed_segments: usize,
    pub area_pct: Decimal,
    pub mass_pct: Decimal,
    pub segments_pct: Decimal,
    pub average_thickness: Decimal,
    pub planned_revenue: Decimal,
}
