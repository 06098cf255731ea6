// src/services/billing_service.rs

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::{error::AppError, formulas},
    db::ObrasStore,
    models::{
        billing::{BillingRecord, BillingStatus},
        segment::{area_out_of_range, Segment},
    },
    services::site_service::active_site,
};

/// Deriva o faturamento de uma rua finalizada. Determinístico: mesma
/// (metragem, toneladas, preço) produz mesma espessura e mesmo valor.
/// Só é chamado pela finalização da rua; não existe outro caminho de criação.
pub(crate) fn derive(
    segment: &Segment,
    site_unit_price: Decimal,
    notes: Option<String>,
) -> Result<BillingRecord, AppError> {
    let execution = segment.execution().ok_or_else(|| {
        AppError::InvalidState(format!(
            "A rua '{}' ainda não foi finalizada; não há o que faturar.",
            segment.name
        ))
    })?;
    let total_value = formulas::billed_value(execution.executed_area, site_unit_price)
        .ok_or_else(area_out_of_range)?;

    Ok(BillingRecord {
        id: Uuid::new_v4(),
        site_id: segment.site_id,
        segment_id: segment.id,
        executed_area: execution.executed_area,
        executed_mass: execution.executed_mass,
        thickness: formulas::thickness(execution.executed_mass, execution.executed_area),
        unit_price: site_unit_price,
        total_value,
        status: BillingStatus::Pending,
        completed_on: execution.completed_at.date_naive(),
        paid_on: None,
        invoice_number: None,
        notes,
        created_at: execution.completed_at,
        updated_at: execution.completed_at,
    })
}

#[derive(Clone)]
pub struct BillingService {
    store: Arc<dyn ObrasStore>,
}

impl BillingService {
    pub fn new(store: Arc<dyn ObrasStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, company_id: Uuid, site_id: Uuid) -> Result<Vec<BillingRecord>, AppError> {
        active_site(self.store.as_ref(), company_id, site_id).await?;
        self.store.list_billing(site_id).await
    }

    /// Marca o faturamento como pago. Pagar de novo é rejeitado para não sobrescrever a data.
    pub async fn mark_paid(
        &self,
        company_id: Uuid,
        billing_id: Uuid,
        invoice_number: Option<&str>,
    ) -> Result<BillingRecord, AppError> {
        let record = self
            .store
            .find_billing(billing_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Faturamento {}", billing_id)))?;
        active_site(self.store.as_ref(), company_id, record.site_id)
            .await
            .map_err(|e| match e {
                AppError::ResourceNotFound(_) => AppError::not_found(format!("Faturamento {}", billing_id)),
                other => other,
            })?;

        if record.is_paid() {
            tracing::warn!(billing_id = %billing_id, "Tentativa de pagar faturamento já pago");
            return Err(already_paid(&record));
        }

        let invoice_number = invoice_number.map(str::trim).filter(|n| !n.is_empty());
        let paid = self
            .store
            .mark_billing_paid(billing_id, Utc::now().date_naive(), invoice_number)
            .await?
            // Outro pagamento venceu entre a leitura e o update
            .ok_or_else(|| already_paid(&record))?;

        tracing::info!(
            billing_id = %billing_id,
            total_value = %paid.total_value,
            invoice = ?paid.invoice_number,
            "Faturamento marcado como pago"
        );
        Ok(paid)
    }
}

fn already_paid(record: &BillingRecord) -> AppError {
    AppError::InvalidState(format!(
        "O faturamento {} já está pago{}.",
        record.id,
        record
            .paid_on
            .map(|d| format!(" desde {}", d.format("%d/%m/%Y")))
            .unwrap_or_default()
    ))
}
