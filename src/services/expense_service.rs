// src/services/expense_service.rs

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::ObrasStore,
    models::expense::{ExpenseCategory, ExpenseFilter, ExpenseRecord, NewExpense},
    services::site_service::active_site,
};

/// Lançamento de despesa como chega da borda (data e flag ainda opcionais).
#[derive(Debug, Clone)]
pub struct AddExpense {
    pub category: ExpenseCategory,
    pub description: String,
    pub amount: Decimal,
    pub expense_date: Option<NaiveDate>,
    pub supplier: Option<String>,
    pub equipment_id: Option<Uuid>,
    pub receipt_url: Option<String>,
    pub include_in_company_rollup: Option<bool>,
}

#[derive(Clone)]
pub struct ExpenseService {
    store: Arc<dyn ObrasStore>,
}

impl ExpenseService {
    pub fn new(store: Arc<dyn ObrasStore>) -> Self {
        Self { store }
    }

    pub async fn add(
        &self,
        company_id: Uuid,
        site_id: Uuid,
        input: AddExpense,
    ) -> Result<ExpenseRecord, AppError> {
        let description = input.description.trim().to_string();
        if description.is_empty() {
            return Err(AppError::invalid_field("description", "A descrição é obrigatória."));
        }
        if input.amount <= Decimal::ZERO {
            return Err(AppError::invalid_field("amount", "O valor deve ser maior que zero."));
        }
        let expense_date = input
            .expense_date
            .ok_or_else(|| AppError::invalid_field("expense_date", "A data da despesa é obrigatória."))?;

        active_site(self.store.as_ref(), company_id, site_id).await?;

        let expense = self
            .store
            .insert_expense(NewExpense {
                site_id,
                category: input.category,
                description,
                amount: input.amount,
                expense_date,
                supplier: input.supplier.filter(|s| !s.trim().is_empty()),
                equipment_id: input.equipment_id,
                receipt_url: input.receipt_url.filter(|s| !s.trim().is_empty()),
                include_in_company_rollup: input.include_in_company_rollup.unwrap_or(true),
            })
            .await?;

        tracing::info!(
            expense_id = %expense.id,
            site_id = %site_id,
            category = expense.category.label(),
            amount = %expense.amount,
            "Despesa lançada"
        );
        Ok(expense)
    }

    pub async fn list(
        &self,
        company_id: Uuid,
        site_id: Uuid,
        filter: &ExpenseFilter,
    ) -> Result<Vec<ExpenseRecord>, AppError> {
        active_site(self.store.as_ref(), company_id, site_id).await?;
        self.store.list_expenses(site_id, filter).await
    }

    /// Despesas de diesel pertencem ao controle de abastecimento e não podem ser removidas aqui.
    pub async fn remove(&self, company_id: Uuid, expense_id: Uuid) -> Result<(), AppError> {
        let expense = self
            .store
            .find_expense(expense_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Despesa {}", expense_id)))?;
        active_site(self.store.as_ref(), company_id, expense.site_id)
            .await
            .map_err(|e| match e {
                AppError::ResourceNotFound(_) => AppError::not_found(format!("Despesa {}", expense_id)),
                other => other,
            })?;

        if expense.category == ExpenseCategory::Fuel {
            tracing::warn!(expense_id = %expense_id, "Tentativa de excluir despesa de diesel");
            return Err(AppError::Forbidden(
                "Despesas de diesel devem ser excluídas pelo controle de abastecimento.".into(),
            ));
        }

        self.store.delete_expense(expense_id).await?;
        tracing::info!(expense_id = %expense_id, site_id = %expense.site_id, "Despesa excluída");
        Ok(())
    }
}
