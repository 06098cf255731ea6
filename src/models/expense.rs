// src/models/expense.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "expense_category", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ExpenseCategory {
    Fuel,        // Diesel (vem do controle de abastecimento dos maquinários)
    Materials,   // Materiais
    Maintenance, // Manutenção
    Other,       // Outros
}

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; 4] = [
        ExpenseCategory::Fuel,
        ExpenseCategory::Materials,
        ExpenseCategory::Maintenance,
        ExpenseCategory::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ExpenseCategory::Fuel => "Diesel",
            ExpenseCategory::Materials => "Materiais",
            ExpenseCategory::Maintenance => "Manutenção",
            ExpenseCategory::Other => "Outros",
        }
    }
}

/// Despesa lançada contra a obra.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseRecord {
    pub id: Uuid,
    pub site_id: Uuid,
    pub category: ExpenseCategory,
    pub description: String,
    pub amount: Decimal,
    pub expense_date: NaiveDate,
    pub supplier: Option<String>,
    pub equipment_id: Option<Uuid>,
    pub receipt_url: Option<String>,
    // Entra no financeiro consolidado da empresa
    pub include_in_company_rollup: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewExpense {
    pub site_id: Uuid,
    pub category: ExpenseCategory,
    pub description: String,
    pub amount: Decimal,
    pub expense_date: NaiveDate,
    pub supplier: Option<String>,
    pub equipment_id: Option<Uuid>,
    pub receipt_url: Option<String>,
    pub include_in_company_rollup: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseFilter {
    pub category: Option<ExpenseCategory>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub equipment_id: Option<Uuid>,
}

impl ExpenseFilter {
    pub fn matches(&self, expense: &ExpenseRecord) -> bool {
        self.category.is_none_or(|c| c == expense.category)
            && self.from.is_none_or(|from| expense.expense_date >= from)
            && self.to.is_none_or(|to| expense.expense_date <= to)
            && self
                .equipment_id
                .is_none_or(|id| expense.equipment_id == Some(id))
    }
}
