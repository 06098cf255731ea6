// src/db/store.rs

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        billing::BillingRecord,
        expense::{ExpenseFilter, ExpenseRecord, NewExpense},
        segment::{NewSegment, Segment},
        site::{NewSite, Site, SiteStatus},
    },
};

/// Porta de persistência das obras. O banco é o único árbitro de atomicidade:
/// `complete_segment` e `delete_segment` precisam ser aplicados por inteiro ou não aplicados.
#[async_trait]
pub trait ObrasStore: Send + Sync {
    // =========================================================================
    //  OBRAS
    // =========================================================================

    async fn insert_site(&self, new: NewSite) -> Result<Site, AppError>;

    /// Busca a obra pelo ID, inclusive as excluídas (soft delete).
    async fn find_site(&self, site_id: Uuid) -> Result<Option<Site>, AppError>;

    /// Lista as obras ativas da empresa.
    async fn list_sites(
        &self,
        company_id: Uuid,
        status: Option<SiteStatus>,
    ) -> Result<Vec<Site>, AppError>;

    /// Muda o status apenas se o atual for `from`. Retorna a obra se mudou.
    async fn transition_site(
        &self,
        site_id: Uuid,
        from: &[SiteStatus],
        to: SiteStatus,
    ) -> Result<Option<Site>, AppError>;

    /// Conclui a obra congelando o valor executado, se ainda estiver aberta.
    async fn conclude_site(
        &self,
        site_id: Uuid,
        executed_value: Decimal,
        end_date: NaiveDate,
    ) -> Result<Option<Site>, AppError>;

    async fn set_unit_price(&self, site_id: Uuid, unit_price: Decimal) -> Result<Site, AppError>;

    async fn soft_delete_site(&self, site_id: Uuid, at: DateTime<Utc>) -> Result<(), AppError>;

    // =========================================================================
    //  RUAS
    // =========================================================================

    /// Insere a rua como `Planned`; sem posição informada usa max(posição) + 1.
    async fn insert_segment(&self, new: NewSegment) -> Result<Segment, AppError>;

    async fn find_segment(&self, segment_id: Uuid) -> Result<Option<Segment>, AppError>;

    async fn list_segments(&self, site_id: Uuid) -> Result<Vec<Segment>, AppError>;

    /// Grava `Planned → InExecution`, condicionado ao status atual ser `Planned`.
    async fn start_segment(&self, segment: &Segment) -> Result<Segment, AppError>;

    /// Grava a execução e cria o faturamento numa única unidade atômica.
    /// Só uma finalização concorrente vence; a outra recebe `InvalidState`.
    async fn complete_segment(
        &self,
        segment: &Segment,
        billing: &BillingRecord,
    ) -> Result<(Segment, BillingRecord), AppError>;

    /// Remove a rua e o faturamento dela. Retorna a rua removida.
    async fn delete_segment(&self, segment_id: Uuid) -> Result<Option<Segment>, AppError>;

    // =========================================================================
    //  FATURAMENTOS
    // =========================================================================

    async fn list_billing(&self, site_id: Uuid) -> Result<Vec<BillingRecord>, AppError>;

    async fn find_billing(&self, billing_id: Uuid) -> Result<Option<BillingRecord>, AppError>;

    /// Marca como pago se ainda estiver pendente. `None` se já estava pago.
    async fn mark_billing_paid(
        &self,
        billing_id: Uuid,
        paid_on: NaiveDate,
        invoice_number: Option<&str>,
    ) -> Result<Option<BillingRecord>, AppError>;

    // =========================================================================
    //  DESPESAS
    // =========================================================================

    async fn insert_expense(&self, new: NewExpense) -> Result<ExpenseRecord, AppError>;

    async fn find_expense(&self, expense_id: Uuid) -> Result<Option<ExpenseRecord>, AppError>;

    async fn list_expenses(
        &self,
        site_id: Uuid,
        filter: &ExpenseFilter,
    ) -> Result<Vec<ExpenseRecord>, AppError>;

    async fn delete_expense(&self, expense_id: Uuid) -> Result<(), AppError>;
}
