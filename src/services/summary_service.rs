// src/services/summary_service.rs

use std::{collections::BTreeMap, sync::Arc};

use chrono::Datelike;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::{error::AppError, formulas},
    db::ObrasStore,
    models::{
        billing::{BillingRecord, BillingStatus},
        expense::{ExpenseCategory, ExpenseFilter, ExpenseRecord},
        segment::Segment,
        site::{Site, SiteProgress},
        summary::{FinancialSummary, MonthlyEntry},
    },
    services::site_service::active_site,
};

// =========================================================================
//  AGREGAÇÕES PURAS
// =========================================================================

/// Consolida faturamentos e despesas. Obra vazia resulta em zeros.
/// Totais fora da faixa do `Decimal` viram erro, nunca pânico.
pub fn fold_summary(
    billing: &[BillingRecord],
    expenses: &[ExpenseRecord],
) -> Result<FinancialSummary, AppError> {
    let mut total_billed = Decimal::ZERO;
    let mut total_pending = Decimal::ZERO;
    for b in billing {
        let bucket = match b.status {
            BillingStatus::Paid => &mut total_billed,
            BillingStatus::Pending => &mut total_pending,
        };
        *bucket = bucket
            .checked_add(b.total_value)
            .ok_or_else(|| AppError::overflow("total faturado"))?;
    }

    let mut expenses_by_category: BTreeMap<ExpenseCategory, Decimal> = ExpenseCategory::ALL
        .iter()
        .map(|c| (*c, Decimal::ZERO))
        .collect();
    for expense in expenses {
        let slot = expenses_by_category.entry(expense.category).or_default();
        *slot = slot
            .checked_add(expense.amount)
            .ok_or_else(|| AppError::overflow("despesas por categoria"))?;
    }
    let total_expenses = formulas::checked_sum(expenses_by_category.values().copied())
        .ok_or_else(|| AppError::overflow("total de despesas"))?;
    let net_margin = total_billed
        .checked_sub(total_expenses)
        .ok_or_else(|| AppError::overflow("margem líquida"))?;

    Ok(FinancialSummary {
        total_billed,
        total_pending,
        total_expenses,
        expenses_by_category,
        net_margin,
        frozen_executed_value: None,
    })
}

/// Doze meses do ano: faturamento pela data de finalização, despesa pela data da despesa.
pub fn fold_monthly(
    year: i32,
    billing: &[BillingRecord],
    expenses: &[ExpenseRecord],
) -> Result<Vec<MonthlyEntry>, AppError> {
    let mut billed = [Decimal::ZERO; 12];
    let mut spent = [Decimal::ZERO; 12];

    for b in billing.iter().filter(|b| b.completed_on.year() == year) {
        let slot = &mut billed[b.completed_on.month0() as usize];
        *slot = slot
            .checked_add(b.total_value)
            .ok_or_else(|| AppError::overflow("faturamento mensal"))?;
    }
    for e in expenses.iter().filter(|e| e.expense_date.year() == year) {
        let slot = &mut spent[e.expense_date.month0() as usize];
        *slot = slot
            .checked_add(e.amount)
            .ok_or_else(|| AppError::overflow("despesa mensal"))?;
    }

    Ok((0..12)
        .map(|i| MonthlyEntry {
            month: format!("{}-{:02}", year, i + 1),
            billed: billed[i],
            expenses: spent[i],
        })
        .collect())
}

fn sum_of<I>(values: I, what: &str) -> Result<Decimal, AppError>
where
    I: IntoIterator<Item = Decimal>,
{
    formulas::checked_sum(values).ok_or_else(|| AppError::overflow(what))
}

pub fn fold_progress(site: &Site, segments: &[Segment]) -> Result<SiteProgress, AppError> {
    let planned_area = sum_of(segments.iter().filter_map(|s| s.planned_area), "metragem prevista")?;
    let planned_mass = sum_of(segments.iter().filter_map(|s| s.planned_mass), "toneladas previstas")?;

    let executions: Vec<_> = segments.iter().filter_map(Segment::execution).collect();
    let executed_area = sum_of(executions.iter().map(|e| e.executed_area), "metragem executada")?;
    let executed_mass = sum_of(executions.iter().map(|e| e.executed_mass), "toneladas executadas")?;
    let thickness_sum = sum_of(executions.iter().map(|e| e.thickness), "espessura média")?;

    let total_segments = segments.len();
    let completed_segments = executions.len();

    let average_thickness = if completed_segments == 0 {
        Decimal::ZERO
    } else {
        thickness_sum / Decimal::from(completed_segments)
    };

    let planned_revenue = planned_area
        .checked_mul(site.unit_price.unwrap_or(Decimal::ZERO))
        .ok_or_else(|| AppError::overflow("receita prevista"))?;

    Ok(SiteProgress {
        planned_area,
        executed_area,
        planned_mass,
        executed_mass,
        total_segments,
        completed_segments,
        area_pct: formulas::progress_pct(executed_area, planned_area),
        mass_pct: formulas::progress_pct(executed_mass, planned_mass),
        segments_pct: formulas::progress_pct(
            Decimal::from(completed_segments),
            Decimal::from(total_segments),
        ),
        average_thickness,
        planned_revenue,
    })
}

// =========================================================================
//  SERVIÇO
// =========================================================================

/// Leitura sob demanda: nada é cacheado, cada chamada relê os registros atuais.
#[derive(Clone)]
pub struct SummaryService {
    store: Arc<dyn ObrasStore>,
}

impl SummaryService {
    pub fn new(store: Arc<dyn ObrasStore>) -> Self {
        Self { store }
    }

    pub async fn summarize(&self, company_id: Uuid, site_id: Uuid) -> Result<FinancialSummary, AppError> {
        let site = active_site(self.store.as_ref(), company_id, site_id).await?;
        let billing = self.store.list_billing(site_id).await?;
        let expenses = self
            .store
            .list_expenses(site_id, &ExpenseFilter::default())
            .await?;

        let mut summary = fold_summary(&billing, &expenses)?;
        summary.frozen_executed_value = site.executed_value;
        Ok(summary)
    }

    pub async fn monthly(
        &self,
        company_id: Uuid,
        site_id: Uuid,
        year: i32,
    ) -> Result<Vec<MonthlyEntry>, AppError> {
        active_site(self.store.as_ref(), company_id, site_id).await?;
        let billing = self.store.list_billing(site_id).await?;
        let expenses = self
            .store
            .list_expenses(site_id, &ExpenseFilter::default())
            .await?;
        fold_monthly(year, &billing, &expenses)
    }

    pub async fn progress(&self, company_id: Uuid, site_id: Uuid) -> Result<SiteProgress, AppError> {
        let site = active_site(self.store.as_ref(), company_id, site_id).await?;
        let segments = self.store.list_segments(site_id).await?;
        fold_progress(&site, &segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use crate::services::{
        expense_service::AddExpense,
        fixtures::{d, date, Fixture},
        segment_service::CompleteSegment,
    };

    async fn add_expense(fx: &Fixture, site_id: Uuid, category: ExpenseCategory, amount: &str) {
        fx.expenses
            .add(
                fx.company,
                site_id,
                AddExpense {
                    category,
                    description: category.label().to_string(),
                    amount: d(amount),
                    expense_date: Some(date(2025, 6, 15)),
                    supplier: None,
                    equipment_id: None,
                    receipt_url: None,
                    include_in_company_rollup: None,
                },
            )
            .await
            .unwrap();
    }

    async fn complete(fx: &Fixture, site_id: Uuid, name: &str, area: &str, mass: &str) -> BillingRecord {
        let segment = fx.segment(site_id, name, None).await;
        fx.segments
            .complete(
                fx.company,
                segment.id,
                CompleteSegment {
                    executed_area: d(area),
                    executed_mass: d(mass),
                    notes: None,
                },
            )
            .await
            .unwrap()
            .billing
    }

    #[tokio::test]
    async fn summary_splits_paid_and_pending() {
        let fx = Fixture::new();
        let site = fx.site(Some("25")).await;

        let paid = complete(&fx, site.id, "Rua 1", "1450", "150").await;
        complete(&fx, site.id, "Rua 2", "1200", "120").await;
        fx.billing.mark_paid(fx.company, paid.id, Some("NF-100")).await.unwrap();

        add_expense(&fx, site.id, ExpenseCategory::Fuel, "1800").await;
        add_expense(&fx, site.id, ExpenseCategory::Materials, "500").await;
        add_expense(&fx, site.id, ExpenseCategory::Other, "300").await;

        let summary = fx.summary.summarize(fx.company, site.id).await.unwrap();

        assert_eq!(summary.total_billed, d("36250"));
        assert_eq!(summary.total_pending, d("30000"));
        assert_eq!(summary.total_expenses, d("2600"));
        assert_eq!(summary.net_margin, d("33650"));
        assert_eq!(summary.expenses_by_category[&ExpenseCategory::Fuel], d("1800"));
        assert_eq!(summary.expenses_by_category[&ExpenseCategory::Maintenance], Decimal::ZERO);
        assert_eq!(summary.display().net_margin, "R$ 33.650,00");
    }

    #[tokio::test]
    async fn empty_site_summarizes_to_zero() {
        let fx = Fixture::new();
        let site = fx.site(Some("25")).await;

        let summary = fx.summary.summarize(fx.company, site.id).await.unwrap();

        assert_eq!(summary.total_billed, Decimal::ZERO);
        assert_eq!(summary.total_pending, Decimal::ZERO);
        assert_eq!(summary.total_expenses, Decimal::ZERO);
        assert_eq!(summary.net_margin, Decimal::ZERO);
        assert_eq!(summary.expenses_by_category.len(), 4);
        assert!(summary.expenses_by_category.values().all(|v| v.is_zero()));
        assert!(summary.frozen_executed_value.is_none());
    }

    #[tokio::test]
    async fn summarize_is_idempotent_and_keeps_aggregation_law() {
        let fx = Fixture::new();
        let site = fx.site(Some("25")).await;
        let first = complete(&fx, site.id, "Rua 1", "1000", "100").await;
        complete(&fx, site.id, "Rua 2", "333.33", "35").await;
        fx.billing.mark_paid(fx.company, first.id, None).await.unwrap();

        let a = fx.summary.summarize(fx.company, site.id).await.unwrap();
        let b = fx.summary.summarize(fx.company, site.id).await.unwrap();
        assert_eq!(a, b);

        let billed: Decimal = fx
            .billing
            .list(fx.company, site.id)
            .await
            .unwrap()
            .iter()
            .map(|r| r.total_value)
            .sum();
        assert_eq!(a.total_billed + a.total_pending, billed);
    }

    #[tokio::test]
    async fn concluded_site_exposes_frozen_value() {
        let fx = Fixture::new();
        let site = fx.site(Some("25")).await;
        complete(&fx, site.id, "Rua 1", "1000", "100").await;

        fx.sites.conclude(fx.company, site.id).await.unwrap();
        let summary = fx.summary.summarize(fx.company, site.id).await.unwrap();

        assert_eq!(summary.frozen_executed_value, Some(d("25000")));
        assert_eq!(summary.display().frozen_executed_value, "R$ 25.000,00");
    }

    #[tokio::test]
    async fn mark_paid_twice_is_rejected() {
        let fx = Fixture::new();
        let site = fx.site(Some("25")).await;
        let record = complete(&fx, site.id, "Rua 1", "1000", "100").await;

        let paid = fx.billing.mark_paid(fx.company, record.id, Some("  ")).await.unwrap();
        assert_eq!(paid.status, BillingStatus::Paid);
        assert!(paid.paid_on.is_some());
        assert!(paid.invoice_number.is_none());

        assert!(matches!(
            fx.billing.mark_paid(fx.company, record.id, None).await,
            Err(AppError::InvalidState(_))
        ));
        assert!(matches!(
            fx.billing.mark_paid(fx.company, Uuid::new_v4(), None).await,
            Err(AppError::ResourceNotFound(_))
        ));
    }

    #[test]
    fn monthly_buckets_by_completion_and_expense_dates() {
        let site_id = Uuid::new_v4();
        let now = chrono::Utc::now();
        let billing = |on: NaiveDate, value: &str| BillingRecord {
            id: Uuid::new_v4(),
            site_id,
            segment_id: Uuid::new_v4(),
            executed_area: d("100"),
            executed_mass: d("10"),
            thickness: d("4.1667"),
            unit_price: d("25"),
            total_value: d(value),
            status: BillingStatus::Pending,
            completed_on: on,
            paid_on: None,
            invoice_number: None,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        let expense = |on: NaiveDate, amount: &str| ExpenseRecord {
            id: Uuid::new_v4(),
            site_id,
            category: ExpenseCategory::Materials,
            description: "Emulsão".into(),
            amount: d(amount),
            expense_date: on,
            supplier: None,
            equipment_id: None,
            receipt_url: None,
            include_in_company_rollup: true,
            created_at: now,
        };

        let months = fold_monthly(
            2025,
            &[
                billing(date(2025, 1, 31), "1000"),
                billing(date(2025, 1, 2), "500"),
                billing(date(2024, 12, 31), "9999"),
            ],
            &[expense(date(2025, 12, 1), "80"), expense(date(2026, 1, 1), "70")],
        )
        .unwrap();

        assert_eq!(months.len(), 12);
        assert_eq!(months[0].month, "2025-01");
        assert_eq!(months[0].billed, d("1500"));
        assert_eq!(months[11].month, "2025-12");
        assert_eq!(months[11].expenses, d("80"));
        let total_billed: Decimal = months.iter().map(|m| m.billed).sum();
        assert_eq!(total_billed, d("1500"));
    }

    #[tokio::test]
    async fn oversized_expenses_fail_instead_of_panicking() {
        let fx = Fixture::new();
        let site = fx.site(Some("25")).await;
        add_expense(&fx, site.id, ExpenseCategory::Materials, "50000000000000000000000000000").await;
        add_expense(&fx, site.id, ExpenseCategory::Materials, "50000000000000000000000000000").await;

        assert!(matches!(
            fx.summary.summarize(fx.company, site.id).await,
            Err(AppError::InternalServerError(_))
        ));
        assert!(matches!(
            fx.summary.monthly(fx.company, site.id, 2025).await,
            Err(AppError::InternalServerError(_))
        ));
        // O restante da obra continua legível
        assert!(fx.summary.progress(fx.company, site.id).await.is_ok());
    }

    #[test]
    fn totals_in_different_categories_overflow_as_error() {
        let now = chrono::Utc::now();
        let expense = |category: ExpenseCategory| ExpenseRecord {
            id: Uuid::new_v4(),
            site_id: Uuid::nil(),
            category,
            description: "Usinagem".into(),
            amount: d("50000000000000000000000000000"),
            expense_date: date(2025, 6, 1),
            supplier: None,
            equipment_id: None,
            receipt_url: None,
            include_in_company_rollup: true,
            created_at: now,
        };

        let result = fold_summary(
            &[],
            &[expense(ExpenseCategory::Materials), expense(ExpenseCategory::Maintenance)],
        );
        assert!(matches!(result, Err(AppError::InternalServerError(_))));
    }

    #[tokio::test]
    async fn progress_compares_planned_and_executed() {
        let fx = Fixture::new();
        let site = fx.site(Some("25")).await;
        fx.segment(site.id, "Rua 1", Some("1000")).await;
        let second = fx.segment(site.id, "Rua 2", Some("1000")).await;

        fx.segments
            .complete(
                fx.company,
                second.id,
                CompleteSegment {
                    executed_area: d("1500"),
                    executed_mass: d("150"),
                    notes: None,
                },
            )
            .await
            .unwrap();

        let progress = fx.summary.progress(fx.company, site.id).await.unwrap();

        assert_eq!(progress.planned_area, d("2000"));
        assert_eq!(progress.executed_area, d("1500"));
        assert_eq!(progress.planned_mass, d("200"));
        assert_eq!(progress.area_pct, d("75"));
        assert_eq!(progress.segments_pct, d("50"));
        assert_eq!(progress.planned_revenue, d("50000"));
        assert_eq!(progress.average_thickness.round_dp(4), d("4.1667"));
        assert_eq!(progress.display().average_thickness, "4,17 cm");
        assert_eq!(progress.display().planned_area, "2.000 m²");
    }

    #[tokio::test]
    async fn progress_without_segments_is_zero() {
        let fx = Fixture::new();
        let site = fx.site(None).await;

        let progress = fx.summary.progress(fx.company, site.id).await.unwrap();

        assert_eq!(progress.total_segments, 0);
        assert_eq!(progress.area_pct, Decimal::ZERO);
        assert_eq!(progress.planned_revenue, Decimal::ZERO);
        assert_eq!(progress.display().average_thickness, "-");
    }
}
