// src/services/segment_service.rs

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::{error::AppError, formulas},
    db::ObrasStore,
    models::{
        billing::BillingRecord,
        segment::{finalized_error, Execution, NewSegment, Segment, SegmentStatusCount},
        site::Site,
    },
    services::{
        billing_service,
        site_service::{active_site, SiteService},
    },
};

/// Medição informada ao finalizar a rua.
#[derive(Debug, Clone)]
pub struct CompleteSegment {
    pub executed_area: Decimal,
    pub executed_mass: Decimal,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompletedSegment {
    pub segment: Segment,
    pub billing: BillingRecord,
}

#[derive(Clone)]
pub struct SegmentService {
    store: Arc<dyn ObrasStore>,
    site_service: SiteService,
}

impl SegmentService {
    pub fn new(store: Arc<dyn ObrasStore>, site_service: SiteService) -> Self {
        Self { store, site_service }
    }

    // Rua + obra dona, respeitando o escopo da empresa
    async fn scoped_segment(
        &self,
        company_id: Uuid,
        segment_id: Uuid,
    ) -> Result<(Segment, Site), AppError> {
        let segment = self
            .store
            .find_segment(segment_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Rua {}", segment_id)))?;
        let site = active_site(self.store.as_ref(), company_id, segment.site_id)
            .await
            .map_err(|e| match e {
                AppError::ResourceNotFound(_) => AppError::not_found(format!("Rua {}", segment_id)),
                other => other,
            })?;
        Ok((segment, site))
    }

    // --- CRIAÇÃO ---

    pub async fn create(&self, company_id: Uuid, mut new: NewSegment) -> Result<Segment, AppError> {
        new.name = new.name.trim().to_string();
        if new.name.is_empty() {
            return Err(AppError::invalid_field("name", "O nome da rua é obrigatório."));
        }
        if new.planned_area.is_some_and(|a| a < Decimal::ZERO) {
            return Err(AppError::invalid_field(
                "planned_area",
                "Metragem planejada não pode ser negativa.",
            ));
        }
        if new.planned_mass.is_some_and(|m| m < Decimal::ZERO) {
            return Err(AppError::invalid_field(
                "planned_mass",
                "Toneladas previstas não podem ser negativas.",
            ));
        }

        let site = active_site(self.store.as_ref(), company_id, new.site_id).await?;

        // Sem toneladas informadas, estima pela metragem (1.000 m² ≈ 100 t)
        if new.planned_mass.is_none() {
            new.planned_mass = new
                .planned_area
                .filter(|a| *a > Decimal::ZERO)
                .map(formulas::estimated_mass);
        }

        let segment = self.store.insert_segment(new).await?;
        tracing::info!(segment_id = %segment.id, site_id = %site.id, "Rua criada");

        self.site_service.promote_on_first_segment(&site).await?;

        Ok(segment)
    }

    pub async fn list(&self, company_id: Uuid, site_id: Uuid) -> Result<Vec<Segment>, AppError> {
        active_site(self.store.as_ref(), company_id, site_id).await?;
        self.store.list_segments(site_id).await
    }

    pub async fn count_by_status(
        &self,
        company_id: Uuid,
        site_id: Uuid,
    ) -> Result<SegmentStatusCount, AppError> {
        let segments = self.list(company_id, site_id).await?;
        Ok(SegmentStatusCount::tally(&segments))
    }

    // --- TRANSIÇÕES ---

    /// Marca a rua como em execução. Opcional: a finalização não exige este passo.
    pub async fn start(&self, company_id: Uuid, segment_id: Uuid) -> Result<Segment, AppError> {
        let (mut segment, _) = self.scoped_segment(company_id, segment_id).await?;
        segment.start(Utc::now())?;

        let segment = self.store.start_segment(&segment).await?;
        tracing::info!(segment_id = %segment_id, "Rua em execução");
        Ok(segment)
    }

    /// Finaliza a rua e gera o faturamento numa única operação atômica.
    pub async fn complete(
        &self,
        company_id: Uuid,
        segment_id: Uuid,
        input: CompleteSegment,
    ) -> Result<CompletedSegment, AppError> {
        if input.executed_area <= Decimal::ZERO {
            return Err(AppError::invalid_field(
                "executed_area",
                "Metragem executada deve ser maior que zero.",
            ));
        }
        if input.executed_mass <= Decimal::ZERO {
            return Err(AppError::invalid_field(
                "executed_mass",
                "Toneladas utilizadas devem ser maior que zero.",
            ));
        }

        let (mut segment, site) = self.scoped_segment(company_id, segment_id).await?;
        if segment.is_completed() {
            tracing::warn!(segment_id = %segment_id, "Tentativa de finalizar rua já finalizada");
            return Err(finalized_error(&segment.name));
        }

        // Sem preço resolvido não fatura: nada de valor padrão escondido
        let unit_price = site.billing_price()?;

        let execution = Execution::measure(
            input.executed_area,
            input.executed_mass,
            unit_price,
            Utc::now(),
        )?;
        segment.complete(execution)?;

        let notes = input
            .notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        let billing = billing_service::derive(&segment, unit_price, notes)?;

        let (segment, billing) = self.store.complete_segment(&segment, &billing).await?;

        tracing::info!(
            segment_id = %segment_id,
            billing_id = %billing.id,
            thickness = %billing.thickness.round_dp(2),
            total_value = %billing.total_value,
            "Rua finalizada e faturamento gerado"
        );
        Ok(CompletedSegment { segment, billing })
    }

    /// Remove a rua em qualquer status; o faturamento de uma rua finalizada vai junto.
    /// O resumo financeiro não é recalculado aqui, o chamador relê.
    pub async fn delete(&self, company_id: Uuid, segment_id: Uuid) -> Result<(), AppError> {
        let (segment, _) = self.scoped_segment(company_id, segment_id).await?;

        self.store
            .delete_segment(segment_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Rua {}", segment_id)))?;

        tracing::info!(
            segment_id = %segment_id,
            was_completed = segment.is_completed(),
            "Rua excluída"
        );
        Ok(())
    }
}
