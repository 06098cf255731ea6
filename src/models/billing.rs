// src/models/billing.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "billing_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BillingStatus {
    Pending, // A receber
    Paid,    // Pago
}

/// Faturamento: valor faturável de uma rua finalizada (1:1 com a rua).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BillingRecord {
    pub id: Uuid,
    pub site_id: Uuid,
    pub segment_id: Uuid,

    // Medição
    pub executed_area: Decimal,
    pub executed_mass: Decimal,
    pub thickness: Decimal,

    // Valores (preço congelado na finalização)
    pub unit_price: Decimal,
    pub total_value: Decimal,

    pub status: BillingStatus,
    pub completed_on: NaiveDate,
    pub paid_on: Option<NaiveDate>,
    pub invoice_number: Option<String>,
    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BillingRecord {
    pub fn is_paid(&self) -> bool {
        self.status == BillingStatus::Paid
    }
}
