// src/db/memory_repo.rs

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::store::ObrasStore,
    models::{
        billing::{BillingRecord, BillingStatus},
        expense::{ExpenseFilter, ExpenseRecord, NewExpense},
        segment::{finalized_error, NewSegment, Segment, SegmentState},
        site::{NewSite, Site, SiteStatus},
    },
};

#[derive(Default)]
struct Tables {
    sites: HashMap<Uuid, Site>,
    segments: HashMap<Uuid, Segment>,
    billing: HashMap<Uuid, BillingRecord>,
    expenses: HashMap<Uuid, ExpenseRecord>,
}

/// Armazenamento em memória, usado quando não há DATABASE_URL e nos testes.
/// Cada operação roda sob um único guard de escrita, o que a torna atômica.
#[derive(Clone, Default)]
pub struct MemoryObrasRepository {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryObrasRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grava um faturamento sem passar pela finalização (simula dado legado/importado).
    #[cfg(test)]
    pub async fn insert_billing_raw(&self, record: BillingRecord) {
        self.tables.write().await.billing.insert(record.id, record);
    }
}

#[async_trait]
impl ObrasStore for MemoryObrasRepository {
    // =========================================================================
    //  OBRAS
    // =========================================================================

    async fn insert_site(&self, new: NewSite) -> Result<Site, AppError> {
        let now = Utc::now();
        let site = Site {
            id: Uuid::new_v4(),
            company_id: new.company_id,
            client_id: new.client_id,
            name: new.name,
            description: new.description,
            location: new.location,
            city: new.city,
            state: new.state,
            status: SiteStatus::Planning,
            unit_price: new.unit_price,
            executed_value: None,
            start_date: new.start_date,
            end_date: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.tables.write().await.sites.insert(site.id, site.clone());
        Ok(site)
    }

    async fn find_site(&self, site_id: Uuid) -> Result<Option<Site>, AppError> {
        Ok(self.tables.read().await.sites.get(&site_id).cloned())
    }

    async fn list_sites(
        &self,
        company_id: Uuid,
        status: Option<SiteStatus>,
    ) -> Result<Vec<Site>, AppError> {
        let tables = self.tables.read().await;
        let mut sites: Vec<Site> = tables
            .sites
            .values()
            .filter(|s| s.company_id == company_id && !s.is_deleted())
            .filter(|s| status.is_none_or(|st| s.status == st))
            .cloned()
            .collect();
        sites.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sites)
    }

    async fn transition_site(
        &self,
        site_id: Uuid,
        from: &[SiteStatus],
        to: SiteStatus,
    ) -> Result<Option<Site>, AppError> {
        let mut tables = self.tables.write().await;
        match tables.sites.get_mut(&site_id) {
            Some(site) if !site.is_deleted() && from.contains(&site.status) => {
                site.status = to;
                site.updated_at = Utc::now();
                Ok(Some(site.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn conclude_site(
        &self,
        site_id: Uuid,
        executed_value: Decimal,
        end_date: NaiveDate,
    ) -> Result<Option<Site>, AppError> {
        let mut tables = self.tables.write().await;
        match tables.sites.get_mut(&site_id) {
            Some(site) if !site.is_deleted() && !site.status.is_closed() => {
                site.status = SiteStatus::Completed;
                site.executed_value = Some(executed_value);
                site.end_date = Some(end_date);
                site.updated_at = Utc::now();
                Ok(Some(site.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn set_unit_price(&self, site_id: Uuid, unit_price: Decimal) -> Result<Site, AppError> {
        let mut tables = self.tables.write().await;
        match tables.sites.get_mut(&site_id) {
            Some(site) if !site.is_deleted() => {
                site.unit_price = Some(unit_price);
                site.updated_at = Utc::now();
                Ok(site.clone())
            }
            _ => Err(AppError::not_found(format!("Obra {}", site_id))),
        }
    }

    async fn soft_delete_site(&self, site_id: Uuid, at: DateTime<Utc>) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        match tables.sites.get_mut(&site_id) {
            Some(site) if !site.is_deleted() => {
                site.deleted_at = Some(at);
                site.updated_at = at;
                Ok(())
            }
            _ => Err(AppError::not_found(format!("Obra {}", site_id))),
        }
    }

    // =========================================================================
    //  RUAS
    // =========================================================================

    async fn insert_segment(&self, new: NewSegment) -> Result<Segment, AppError> {
        let mut tables = self.tables.write().await;
        let position = new.position.unwrap_or_else(|| {
            tables
                .segments
                .values()
                .filter(|s| s.site_id == new.site_id)
                .map(|s| s.position)
                .max()
                .map_or(0, |max| max + 1)
        });

        let now = Utc::now();
        let segment = Segment {
            id: Uuid::new_v4(),
            site_id: new.site_id,
            name: new.name,
            position,
            planned_area: new.planned_area,
            planned_mass: new.planned_mass,
            notes: new.notes,
            image_url: new.image_url,
            state: SegmentState::Planned,
            created_at: now,
            updated_at: now,
        };
        tables.segments.insert(segment.id, segment.clone());
        Ok(segment)
    }

    async fn find_segment(&self, segment_id: Uuid) -> Result<Option<Segment>, AppError> {
        Ok(self.tables.read().await.segments.get(&segment_id).cloned())
    }

    async fn list_segments(&self, site_id: Uuid) -> Result<Vec<Segment>, AppError> {
        let tables = self.tables.read().await;
        let mut segments: Vec<Segment> = tables
            .segments
            .values()
            .filter(|s| s.site_id == site_id)
            .cloned()
            .collect();
        segments.sort_by(|a, b| {
            a.position
                .cmp(&b.position)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        Ok(segments)
    }

    async fn start_segment(&self, segment: &Segment) -> Result<Segment, AppError> {
        let mut tables = self.tables.write().await;
        let current = tables
            .segments
            .get_mut(&segment.id)
            .ok_or_else(|| AppError::not_found(format!("Rua {}", segment.id)))?;

        if !matches!(current.state, SegmentState::Planned) {
            return Err(AppError::InvalidState(format!(
                "A rua '{}' não está mais pendente.",
                current.name
            )));
        }
        current.state = segment.state.clone();
        current.updated_at = segment.updated_at;
        Ok(current.clone())
    }

    async fn complete_segment(
        &self,
        segment: &Segment,
        billing: &BillingRecord,
    ) -> Result<(Segment, BillingRecord), AppError> {
        let mut tables = self.tables.write().await;

        let current = tables
            .segments
            .get(&segment.id)
            .ok_or_else(|| AppError::not_found(format!("Rua {}", segment.id)))?;
        if current.is_completed() {
            return Err(finalized_error(&current.name));
        }

        // Mesma restrição do UNIQUE(segment_id): verificada antes de qualquer escrita,
        // então uma falha aqui não deixa a rua finalizada.
        if tables.billing.values().any(|b| b.segment_id == segment.id) {
            return Err(AppError::InternalServerError(anyhow::anyhow!(
                "já existe faturamento para a rua {}",
                segment.id
            )));
        }

        let mut stored = segment.clone();
        stored.updated_at = segment
            .execution()
            .map(|e| e.completed_at)
            .unwrap_or(segment.updated_at);

        tables.segments.insert(stored.id, stored.clone());
        tables.billing.insert(billing.id, billing.clone());
        Ok((stored, billing.clone()))
    }

    async fn delete_segment(&self, segment_id: Uuid) -> Result<Option<Segment>, AppError> {
        let mut tables = self.tables.write().await;
        tables.billing.retain(|_, b| b.segment_id != segment_id);
        Ok(tables.segments.remove(&segment_id))
    }

    // =========================================================================
    //  FATURAMENTOS
    // =========================================================================

    async fn list_billing(&self, site_id: Uuid) -> Result<Vec<BillingRecord>, AppError> {
        let tables = self.tables.read().await;
        let mut records: Vec<BillingRecord> = tables
            .billing
            .values()
            .filter(|b| b.site_id == site_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| {
            b.completed_on
                .cmp(&a.completed_on)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(records)
    }

    async fn find_billing(&self, billing_id: Uuid) -> Result<Option<BillingRecord>, AppError> {
        Ok(self.tables.read().await.billing.get(&billing_id).cloned())
    }

    async fn mark_billing_paid(
        &self,
        billing_id: Uuid,
        paid_on: NaiveDate,
        invoice_number: Option<&str>,
    ) -> Result<Option<BillingRecord>, AppError> {
        let mut tables = self.tables.write().await;
        match tables.billing.get_mut(&billing_id) {
            Some(record) if record.status == BillingStatus::Pending => {
                record.status = BillingStatus::Paid;
                record.paid_on = Some(paid_on);
                record.invoice_number = invoice_number.map(str::to_string);
                record.updated_at = Utc::now();
                Ok(Some(record.clone()))
            }
            _ => Ok(None),
        }
    }

    // =========================================================================
    //  DESPESAS
    // =========================================================================

    async fn insert_expense(&self, new: NewExpense) -> Result<ExpenseRecord, AppError> {
        let expense = ExpenseRecord {
            id: Uuid::new_v4(),
            site_id: new.site_id,
            category: new.category,
            description: new.description,
            amount: new.amount,
            expense_date: new.expense_date,
            supplier: new.supplier,
            equipment_id: new.equipment_id,
            receipt_url: new.receipt_url,
            include_in_company_rollup: new.include_in_company_rollup,
            created_at: Utc::now(),
        };
        self.tables
            .write()
            .await
            .expenses
            .insert(expense.id, expense.clone());
        Ok(expense)
    }

    async fn find_expense(&self, expense_id: Uuid) -> Result<Option<ExpenseRecord>, AppError> {
        Ok(self.tables.read().await.expenses.get(&expense_id).cloned())
    }

    async fn list_expenses(
        &self,
        site_id: Uuid,
        filter: &ExpenseFilter,
    ) -> Result<Vec<ExpenseRecord>, AppError> {
        let tables = self.tables.read().await;
        let mut expenses: Vec<ExpenseRecord> = tables
            .expenses
            .values()
            .filter(|e| e.site_id == site_id && filter.matches(e))
            .cloned()
            .collect();
        expenses.sort_by(|a, b| {
            b.expense_date
                .cmp(&a.expense_date)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(expenses)
    }

    async fn delete_expense(&self, expense_id: Uuid) -> Result<(), AppError> {
        match self.tables.write().await.expenses.remove(&expense_id) {
            Some(_) => Ok(()),
            None => Err(AppError::not_found(format!("Despesa {}", expense_id))),
        }
    }
}
