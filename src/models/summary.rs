// src/models/summary.rs

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    common::formulas,
    models::{expense::ExpenseCategory, site::SiteProgress},
};

/// Resumo financeiro da obra. Não é persistido, é recalculado a cada leitura.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinancialSummary {
    pub total_billed: Decimal,  // Faturamentos pagos
    pub total_pending: Decimal, // Faturamentos a receber
    pub total_expenses: Decimal,
    pub expenses_by_category: BTreeMap<ExpenseCategory, Decimal>,
    pub net_margin: Decimal, // Faturado - Despesas

    // Quando a obra foi concluída, este valor prevalece sobre o cálculo ao vivo
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frozen_executed_value: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyEntry {
    pub month: String, // "YYYY-MM"
    pub billed: Decimal,
    pub expenses: Decimal,
}

/// Valores do resumo já formatados em pt-BR, para a tela e a exportação.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SummaryDisplay {
    pub total_billed: String,
    pub total_pending: String,
    pub total_expenses: String,
    pub net_margin: String,
    pub frozen_executed_value: String,
}

impl FinancialSummary {
    pub fn display(&self) -> SummaryDisplay {
        SummaryDisplay {
            total_billed: formulas::format_currency(Some(self.total_billed)),
            total_pending: formulas::format_currency(Some(self.total_pending)),
            total_expenses: formulas::format_currency(Some(self.total_expenses)),
            net_margin: formulas::format_currency(Some(self.net_margin)),
            frozen_executed_value: formulas::format_currency(self.frozen_executed_value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressDisplay {
    pub planned_area: String,
    pub executed_area: String,
    pub planned_mass: String,
    pub executed_mass: String,
    pub average_thickness: String,
    pub planned_revenue: String,
}

impl SiteProgress {
    pub fn display(&self) -> ProgressDisplay {
        // Sem rua finalizada não há espessura média para mostrar
        let average_thickness =
            (self.completed_segments > 0).then_some(self.average_thickness);
        ProgressDisplay {
            planned_area: formulas::format_area(Some(self.planned_area)),
            executed_area: formulas::format_area(Some(self.executed_area)),
            planned_mass: formulas::format_mass(Some(self.planned_mass)),
            executed_mass: formulas::format_mass(Some(self.executed_mass)),
            average_thickness: formulas::format_thickness(average_thickness),
            planned_revenue: formulas::format_currency(Some(self.planned_revenue)),
        }
    }
}
