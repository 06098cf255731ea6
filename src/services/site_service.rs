// src/services/site_service.rs

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::{error::AppError, formulas},
    db::ObrasStore,
    models::site::{NewSite, Site, SiteStatus},
};

/// Busca a obra ativa (não excluída) da empresa. Obra de outra empresa é tratada como inexistente.
pub(crate) async fn active_site(
    store: &dyn ObrasStore,
    company_id: Uuid,
    site_id: Uuid,
) -> Result<Site, AppError> {
    match store.find_site(site_id).await? {
        Some(site) if site.company_id == company_id && !site.is_deleted() => Ok(site),
        _ => Err(AppError::not_found(format!("Obra {}", site_id))),
    }
}

#[derive(Clone)]
pub struct SiteService {
    store: Arc<dyn ObrasStore>,
}

impl SiteService {
    pub fn new(store: Arc<dyn ObrasStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, mut new: NewSite) -> Result<Site, AppError> {
        new.name = new.name.trim().to_string();
        if new.name.is_empty() {
            return Err(AppError::invalid_field("name", "O nome da obra é obrigatório."));
        }
        if let Some(price) = new.unit_price {
            if price <= Decimal::ZERO {
                return Err(AppError::invalid_field(
                    "unit_price",
                    "Preço por m² deve ser maior que zero.",
                ));
            }
        }

        let site = self.store.insert_site(new).await?;
        tracing::info!(site_id = %site.id, company_id = %site.company_id, "Obra criada");
        Ok(site)
    }

    pub async fn get(&self, company_id: Uuid, site_id: Uuid) -> Result<Site, AppError> {
        active_site(self.store.as_ref(), company_id, site_id).await
    }

    pub async fn list(
        &self,
        company_id: Uuid,
        status: Option<SiteStatus>,
    ) -> Result<Vec<Site>, AppError> {
        self.store.list_sites(company_id, status).await
    }

    /// Entrada do catálogo de serviços. Faturamentos já gerados mantêm o preço antigo.
    pub async fn set_unit_price(
        &self,
        company_id: Uuid,
        site_id: Uuid,
        unit_price: Decimal,
    ) -> Result<Site, AppError> {
        if unit_price <= Decimal::ZERO {
            return Err(AppError::invalid_field(
                "unit_price",
                "Preço por m² deve ser maior que zero.",
            ));
        }
        active_site(self.store.as_ref(), company_id, site_id).await?;

        let site = self.store.set_unit_price(site_id, unit_price).await?;
        tracing::info!(site_id = %site_id, %unit_price, "Preço por m² da obra atualizado");
        Ok(site)
    }

    /// Exclusão lógica: a obra é marcada, não removida.
    pub async fn delete(&self, company_id: Uuid, site_id: Uuid) -> Result<(), AppError> {
        active_site(self.store.as_ref(), company_id, site_id).await?;
        self.store.soft_delete_site(site_id, Utc::now()).await?;
        tracing::info!(site_id = %site_id, "Obra excluída (soft delete)");
        Ok(())
    }

    /// Planejamento → Em andamento na primeira rua. Nunca volta automaticamente.
    pub(crate) async fn promote_on_first_segment(&self, site: &Site) -> Result<(), AppError> {
        if site.status != SiteStatus::Planning {
            return Ok(());
        }
        let promoted = self
            .store
            .transition_site(site.id, &[SiteStatus::Planning], SiteStatus::InProgress)
            .await?;
        if promoted.is_some() {
            tracing::info!(site_id = %site.id, "Obra passou de planejamento para em andamento");
        }
        Ok(())
    }

    /// Conclusão explícita: congela o valor executado (soma dos faturamentos).
    pub async fn conclude(&self, company_id: Uuid, site_id: Uuid) -> Result<Site, AppError> {
        let site = active_site(self.store.as_ref(), company_id, site_id).await?;
        if site.status.is_closed() {
            return Err(closed_error(&site));
        }

        let billing = self.store.list_billing(site_id).await?;
        let executed_value = formulas::checked_sum(billing.iter().map(|b| b.total_value))
            .ok_or_else(|| AppError::overflow("valor executado"))?;

        match self
            .store
            .conclude_site(site_id, executed_value, Utc::now().date_naive())
            .await?
        {
            Some(site) => {
                tracing::info!(site_id = %site_id, %executed_value, "Obra concluída, valor executado congelado");
                Ok(site)
            }
            None => Err(closed_error(&site)),
        }
    }

    pub async fn cancel(&self, company_id: Uuid, site_id: Uuid) -> Result<Site, AppError> {
        let site = active_site(self.store.as_ref(), company_id, site_id).await?;
        self.store
            .transition_site(
                site_id,
                &[SiteStatus::Planning, SiteStatus::InProgress],
                SiteStatus::Cancelled,
            )
            .await?
            .ok_or_else(|| closed_error(&site))
    }
}

fn closed_error(site: &Site) -> AppError {
    AppError::InvalidState(format!(
        "A obra '{}' já está encerrada ({}).",
        site.name,
        site.status.as_str()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryObrasRepository;
    use assert_matches::assert_matches;
    use std::str::FromStr;

    fn new_site(company_id: Uuid, name: &str) -> NewSite {
        NewSite {
            company_id,
            client_id: None,
            name: name.to_string(),
            description: None,
            location: None,
            city: Some("Campinas".into()),
            state: Some("SP".into()),
            unit_price: Some(Decimal::from(25)),
            start_date: None,
        }
    }

    fn service() -> SiteService {
        SiteService::new(Arc::new(MemoryObrasRepository::new()))
    }

    #[tokio::test]
    async fn created_site_starts_in_planning() {
        let sites = service();
        let site = sites.create(new_site(Uuid::new_v4(), "  Jardim América ")).await.unwrap();
        assert_eq!(site.status, SiteStatus::Planning);
        assert_eq!(site.name, "Jardim América");
        assert!(site.executed_value.is_none());
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        let err = service().create(new_site(Uuid::new_v4(), "   ")).await.unwrap_err();
        assert_eq!(crate::common::error::invalid_fields(&err), vec!["name".to_string()]);
    }

    #[tokio::test]
    async fn other_company_cannot_see_site() {
        let sites = service();
        let site = sites.create(new_site(Uuid::new_v4(), "Centro")).await.unwrap();
        assert_matches!(
            sites.get(Uuid::new_v4(), site.id).await,
            Err(AppError::ResourceNotFound(_))
        );
    }

    #[tokio::test]
    async fn soft_deleted_site_disappears_from_reads() {
        let sites = service();
        let company = Uuid::new_v4();
        let site = sites.create(new_site(company, "Centro")).await.unwrap();

        sites.delete(company, site.id).await.unwrap();

        assert_matches!(sites.get(company, site.id).await, Err(AppError::ResourceNotFound(_)));
        assert!(sites.list(company, None).await.unwrap().is_empty());
        assert_matches!(sites.delete(company, site.id).await, Err(AppError::ResourceNotFound(_)));
    }

    #[tokio::test]
    async fn unit_price_must_be_positive() {
        let sites = service();
        let company = Uuid::new_v4();
        let site = sites.create(new_site(company, "Centro")).await.unwrap();

        let err = sites.set_unit_price(company, site.id, Decimal::ZERO).await.unwrap_err();
        assert_eq!(crate::common::error::invalid_fields(&err), vec!["unit_price".to_string()]);

        let price = Decimal::from_str("27.5").unwrap();
        let updated = sites.set_unit_price(company, site.id, price).await.unwrap();
        assert_eq!(updated.unit_price, Some(price));
    }

    #[tokio::test]
    async fn conclude_freezes_value_and_cannot_repeat() {
        let sites = service();
        let company = Uuid::new_v4();
        let site = sites.create(new_site(company, "Centro")).await.unwrap();

        let concluded = sites.conclude(company, site.id).await.unwrap();
        assert_eq!(concluded.status, SiteStatus::Completed);
        assert_eq!(concluded.executed_value, Some(Decimal::ZERO));
        assert!(concluded.end_date.is_some());

        assert_matches!(sites.conclude(company, site.id).await, Err(AppError::InvalidState(_)));
        assert_matches!(sites.cancel(company, site.id).await, Err(AppError::InvalidState(_)));
    }

    #[tokio::test]
    async fn conclude_reports_overflowing_total_and_keeps_site_open() {
        use crate::{
            models::billing::{BillingRecord, BillingStatus},
            services::fixtures::{d, Fixture},
        };

        let fx = Fixture::new();
        let site = fx.site(Some("25")).await;
        let now = Utc::now();
        for _ in 0..2 {
            fx.store
                .insert_billing_raw(BillingRecord {
                    id: Uuid::new_v4(),
                    site_id: site.id,
                    segment_id: Uuid::new_v4(),
                    executed_area: d("1000"),
                    executed_mass: d("100"),
                    thickness: d("4.1667"),
                    unit_price: d("25"),
                    total_value: d("50000000000000000000000000000"),
                    status: BillingStatus::Pending,
                    completed_on: now.date_naive(),
                    paid_on: None,
                    invoice_number: None,
                    notes: None,
                    created_at: now,
                    updated_at: now,
                })
                .await;
        }

        assert_matches!(
            fx.sites.conclude(fx.company, site.id).await,
            Err(AppError::InternalServerError(_))
        );
        let still_open = fx.sites.get(fx.company, site.id).await.unwrap();
        assert_eq!(still_open.status, SiteStatus::Planning);
        assert!(still_open.executed_value.is_none());
    }

    #[tokio::test]
    async fn list_filters_by_status() {
        let sites = service();
        let company = Uuid::new_v4();
        let a = sites.create(new_site(company, "A")).await.unwrap();
        sites.create(new_site(company, "B")).await.unwrap();
        sites.cancel(company, a.id).await.unwrap();

        let cancelled = sites.list(company, Some(SiteStatus::Cancelled)).await.unwrap();
        assert_eq!(cancelled.len(), 1);
        assert_eq!(cancelled[0].id, a.id);
        assert_eq!(sites.list(company, None).await.unwrap().len(), 2);
    }
}
