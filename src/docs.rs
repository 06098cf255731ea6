// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use crate::handlers;
use crate::middleware::tenancy::COMPANY_ID_HEADER;
use crate::models;
use crate::services;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Obras ---
        handlers::sites::create_site,
        handlers::sites::list_sites,
        handlers::sites::get_site,
        handlers::sites::delete_site,
        handlers::sites::set_unit_price,
        handlers::sites::conclude_site,
        handlers::sites::cancel_site,

        // --- Ruas ---
        handlers::segments::create_segment,
        handlers::segments::list_segments,
        handlers::segments::start_segment,
        handlers::segments::complete_segment,
        handlers::segments::delete_segment,

        // --- Faturamentos ---
        handlers::billing::list_billing,
        handlers::billing::mark_paid,

        // --- Despesas ---
        handlers::expenses::add_expense,
        handlers::expenses::list_expenses,
        handlers::expenses::delete_expense,

        // --- Resumo ---
        handlers::summary::get_summary,
        handlers::summary::get_monthly,
        handlers::summary::get_progress,
    ),
    components(
        schemas(
            // --- Obras ---
            models::site::SiteStatus,
            models::site::Site,
            models::site::SiteProgress,

            // --- Ruas ---
            models::segment::SegmentStatus,
            models::segment::SegmentState,
            models::segment::Execution,
            models::segment::Segment,
            models::segment::SegmentStatusCount,
            services::segment_service::CompletedSegment,

            // --- Faturamentos ---
            models::billing::BillingStatus,
            models::billing::BillingRecord,

            // --- Despesas ---
            models::expense::ExpenseCategory,
            models::expense::ExpenseRecord,

            // --- Resumo ---
            models::summary::FinancialSummary,
            models::summary::MonthlyEntry,
            models::summary::SummaryDisplay,
            models::summary::ProgressDisplay,
            handlers::summary::SummaryResponse,
            handlers::summary::ProgressResponse,

            // --- Payloads ---
            handlers::sites::CreateSitePayload,
            handlers::sites::SetUnitPricePayload,
            handlers::segments::CreateSegmentPayload,
            handlers::segments::CompleteSegmentPayload,
            handlers::segments::SegmentList,
            handlers::billing::MarkPaidPayload,
            handlers::expenses::AddExpensePayload,
        )
    ),
    tags(
        (name = "Obras", description = "Contratos de pavimentação"),
        (name = "Ruas", description = "Ruas da obra e finalização com medição"),
        (name = "Faturamentos", description = "Faturamentos gerados na finalização das ruas"),
        (name = "Despesas", description = "Despesas lançadas contra a obra"),
        (name = "Resumo", description = "Resumo financeiro, visão mensal e progresso")
    ),
    modifiers(&CompanyHeaderAddon)
)]
pub struct ApiDoc;

struct CompanyHeaderAddon;

impl utoipa::Modify for CompanyHeaderAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "company_id",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(COMPANY_ID_HEADER))),
        );
    }
}
