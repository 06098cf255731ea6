// src/db/obras_repo.rs

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::store::ObrasStore,
    models::{
        billing::BillingRecord,
        expense::{ExpenseFilter, ExpenseRecord, NewExpense},
        segment::{finalized_error, NewSegment, Segment, SegmentRow, SegmentState},
        site::{NewSite, Site, SiteStatus},
    },
};

// Colunas na ordem da struct SegmentRow
const SEGMENT_COLUMNS: &str = r#"
    id, site_id, name, position, planned_area, planned_mass, notes, image_url,
    status, started_at, executed_area, executed_mass, thickness, unit_price,
    total_value, completed_at, created_at, updated_at
"#;

#[derive(Clone)]
pub struct PgObrasRepository {
    pool: PgPool,
}

impl PgObrasRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ObrasStore for PgObrasRepository {
    // =========================================================================
    //  OBRAS
    // =========================================================================

    async fn insert_site(&self, new: NewSite) -> Result<Site, AppError> {
        let site = sqlx::query_as::<_, Site>(
            r#"
            INSERT INTO sites (
                id, company_id, client_id, name, description,
                location, city, state, unit_price, start_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.company_id)
        .bind(new.client_id)
        .bind(&new.name)
        .bind(&new.description)
        .bind(&new.location)
        .bind(&new.city)
        .bind(&new.state)
        .bind(new.unit_price)
        .bind(new.start_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(site)
    }

    async fn find_site(&self, site_id: Uuid) -> Result<Option<Site>, AppError> {
        let site = sqlx::query_as::<_, Site>("SELECT * FROM sites WHERE id = $1")
            .bind(site_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(site)
    }

    async fn list_sites(
        &self,
        company_id: Uuid,
        status: Option<SiteStatus>,
    ) -> Result<Vec<Site>, AppError> {
        let sites = sqlx::query_as::<_, Site>(
            r#"
            SELECT * FROM sites
            WHERE company_id = $1
              AND deleted_at IS NULL
              AND ($2::site_status IS NULL OR status = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(company_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(sites)
    }

    async fn transition_site(
        &self,
        site_id: Uuid,
        from: &[SiteStatus],
        to: SiteStatus,
    ) -> Result<Option<Site>, AppError> {
        let from: Vec<String> = from.iter().map(|s| s.as_str().to_string()).collect();

        // Update condicional: o banco decide quem vence em caso de corrida
        let site = sqlx::query_as::<_, Site>(
            r#"
            UPDATE sites
            SET status = $2, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL AND status::text = ANY($3)
            RETURNING *
            "#,
        )
        .bind(site_id)
        .bind(to)
        .bind(&from)
        .fetch_optional(&self.pool)
        .await?;

        Ok(site)
    }

    async fn conclude_site(
        &self,
        site_id: Uuid,
        executed_value: Decimal,
        end_date: NaiveDate,
    ) -> Result<Option<Site>, AppError> {
        let site = sqlx::query_as::<_, Site>(
            r#"
            UPDATE sites
            SET status = 'completed', executed_value = $2, end_date = $3, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL AND status IN ('planning', 'in_progress')
            RETURNING *
            "#,
        )
        .bind(site_id)
        .bind(executed_value)
        .bind(end_date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(site)
    }

    async fn set_unit_price(&self, site_id: Uuid, unit_price: Decimal) -> Result<Site, AppError> {
        sqlx::query_as::<_, Site>(
            r#"
            UPDATE sites
            SET unit_price = $2, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(site_id)
        .bind(unit_price)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Obra {}", site_id)))
    }

    async fn soft_delete_site(&self, site_id: Uuid, at: DateTime<Utc>) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE sites SET deleted_at = $2, updated_at = $2 WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(site_id)
        .bind(at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Obra {}", site_id)));
        }
        Ok(())
    }

    // =========================================================================
    //  RUAS
    // =========================================================================

    async fn insert_segment(&self, new: NewSegment) -> Result<Segment, AppError> {
        // A subquery calcula a próxima posição quando nenhuma foi informada
        let row = sqlx::query_as::<_, SegmentRow>(&format!(
            r#"
            INSERT INTO segments (
                id, site_id, name, position, planned_area, planned_mass, notes, image_url
            )
            VALUES (
                $1, $2, $3,
                COALESCE(
                    $4,
                    (SELECT COALESCE(MAX(position), -1) + 1 FROM segments WHERE site_id = $2)
                ),
                $5, $6, $7, $8
            )
            RETURNING {SEGMENT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(new.site_id)
        .bind(&new.name)
        .bind(new.position)
        .bind(new.planned_area)
        .bind(new.planned_mass)
        .bind(&new.notes)
        .bind(&new.image_url)
        .fetch_one(&self.pool)
        .await?;

        Segment::try_from(row)
    }

    async fn find_segment(&self, segment_id: Uuid) -> Result<Option<Segment>, AppError> {
        let row = sqlx::query_as::<_, SegmentRow>(&format!(
            "SELECT {SEGMENT_COLUMNS} FROM segments WHERE id = $1"
        ))
        .bind(segment_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Segment::try_from).transpose()
    }

    async fn list_segments(&self, site_id: Uuid) -> Result<Vec<Segment>, AppError> {
        let rows = sqlx::query_as::<_, SegmentRow>(&format!(
            r#"
            SELECT {SEGMENT_COLUMNS} FROM segments
            WHERE site_id = $1
            ORDER BY position ASC, created_at ASC
            "#
        ))
        .bind(site_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Segment::try_from).collect()
    }

    async fn start_segment(&self, segment: &Segment) -> Result<Segment, AppError> {
        let started_at = match segment.state {
            SegmentState::InExecution { started_at } => started_at,
            _ => {
                return Err(AppError::InternalServerError(anyhow::anyhow!(
                    "start_segment chamado com rua fora de execução"
                )))
            }
        };

        let row = sqlx::query_as::<_, SegmentRow>(&format!(
            r#"
            UPDATE segments
            SET status = 'in_execution', started_at = $2, updated_at = $2
            WHERE id = $1 AND status = 'planned'
            RETURNING {SEGMENT_COLUMNS}
            "#
        ))
        .bind(segment.id)
        .bind(started_at)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Segment::try_from(row),
            None => Err(AppError::InvalidState(format!(
                "A rua '{}' não está mais pendente.",
                segment.name
            ))),
        }
    }

    async fn complete_segment(
        &self,
        segment: &Segment,
        billing: &BillingRecord,
    ) -> Result<(Segment, BillingRecord), AppError> {
        let execution = segment.execution().ok_or_else(|| {
            AppError::InternalServerError(anyhow::anyhow!(
                "complete_segment chamado com rua sem execução"
            ))
        })?;

        // Rua + faturamento na mesma transação: qualquer falha desfaz as duas escritas
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, SegmentRow>(&format!(
            r#"
            UPDATE segments
            SET status = 'completed',
                executed_area = $2, executed_mass = $3, thickness = $4,
                unit_price = $5, total_value = $6, completed_at = $7, updated_at = $7
            WHERE id = $1 AND status <> 'completed'
            RETURNING {SEGMENT_COLUMNS}
            "#
        ))
        .bind(segment.id)
        .bind(execution.executed_area)
        .bind(execution.executed_mass)
        .bind(execution.thickness)
        .bind(execution.unit_price)
        .bind(execution.total_value)
        .bind(execution.completed_at)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return match self.find_segment(segment.id).await? {
                Some(current) => Err(finalized_error(&current.name)),
                None => Err(AppError::not_found(format!("Rua {}", segment.id))),
            };
        };

        let created = sqlx::query_as::<_, BillingRecord>(
            r#"
            INSERT INTO billing_records (
                id, site_id, segment_id, executed_area, executed_mass, thickness,
                unit_price, total_value, status, completed_on, notes, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12)
            RETURNING *
            "#,
        )
        .bind(billing.id)
        .bind(billing.site_id)
        .bind(billing.segment_id)
        .bind(billing.executed_area)
        .bind(billing.executed_mass)
        .bind(billing.thickness)
        .bind(billing.unit_price)
        .bind(billing.total_value)
        .bind(billing.status)
        .bind(billing.completed_on)
        .bind(&billing.notes)
        .bind(billing.created_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((Segment::try_from(row)?, created))
    }

    async fn delete_segment(&self, segment_id: Uuid) -> Result<Option<Segment>, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM billing_records WHERE segment_id = $1")
            .bind(segment_id)
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query_as::<_, SegmentRow>(&format!(
            "DELETE FROM segments WHERE id = $1 RETURNING {SEGMENT_COLUMNS}"
        ))
        .bind(segment_id)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;

        row.map(Segment::try_from).transpose()
    }

    // =========================================================================
    //  FATURAMENTOS
    // =========================================================================

    async fn list_billing(&self, site_id: Uuid) -> Result<Vec<BillingRecord>, AppError> {
        let records = sqlx::query_as::<_, BillingRecord>(
            r#"
            SELECT * FROM billing_records
            WHERE site_id = $1
            ORDER BY completed_on DESC, created_at DESC
            "#,
        )
        .bind(site_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn find_billing(&self, billing_id: Uuid) -> Result<Option<BillingRecord>, AppError> {
        let record = sqlx::query_as::<_, BillingRecord>("SELECT * FROM billing_records WHERE id = $1")
            .bind(billing_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    async fn mark_billing_paid(
        &self,
        billing_id: Uuid,
        paid_on: NaiveDate,
        invoice_number: Option<&str>,
    ) -> Result<Option<BillingRecord>, AppError> {
        let record = sqlx::query_as::<_, BillingRecord>(
            r#"
            UPDATE billing_records
            SET status = 'paid', paid_on = $2, invoice_number = $3, updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(billing_id)
        .bind(paid_on)
        .bind(invoice_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    // =========================================================================
    //  DESPESAS
    // =========================================================================

    async fn insert_expense(&self, new: NewExpense) -> Result<ExpenseRecord, AppError> {
        let expense = sqlx::query_as::<_, ExpenseRecord>(
            r#"
            INSERT INTO expenses (
                id, site_id, category, description, amount, expense_date,
                supplier, equipment_id, receipt_url, include_in_company_rollup
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.site_id)
        .bind(new.category)
        .bind(&new.description)
        .bind(new.amount)
        .bind(new.expense_date)
        .bind(&new.supplier)
        .bind(new.equipment_id)
        .bind(&new.receipt_url)
        .bind(new.include_in_company_rollup)
        .fetch_one(&self.pool)
        .await?;

        Ok(expense)
    }

    async fn find_expense(&self, expense_id: Uuid) -> Result<Option<ExpenseRecord>, AppError> {
        let expense = sqlx::query_as::<_, ExpenseRecord>("SELECT * FROM expenses WHERE id = $1")
            .bind(expense_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(expense)
    }

    async fn list_expenses(
        &self,
        site_id: Uuid,
        filter: &ExpenseFilter,
    ) -> Result<Vec<ExpenseRecord>, AppError> {
        let expenses = sqlx::query_as::<_, ExpenseRecord>(
            r#"
            SELECT * FROM expenses
            WHERE site_id = $1
              AND ($2::expense_category IS NULL OR category = $2)
              AND ($3::date IS NULL OR expense_date >= $3)
              AND ($4::date IS NULL OR expense_date <= $4)
              AND ($5::uuid IS NULL OR equipment_id = $5)
            ORDER BY expense_date DESC, created_at DESC
            "#,
        )
        .bind(site_id)
        .bind(filter.category)
        .bind(filter.from)
        .bind(filter.to)
        .bind(filter.equipment_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(expenses)
    }

    async fn delete_expense(&self, expense_id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = $1")
            .bind(expense_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Despesa {}", expense_id)));
        }
        Ok(())
    }
}
