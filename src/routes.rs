// src/routes.rs

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::AppState, docs::ApiDoc, handlers};

pub fn app(app_state: AppState) -> Router {
    // Obras e tudo que pertence a uma obra
    let obras_routes = Router::new()
        .route("/", post(handlers::sites::create_site).get(handlers::sites::list_sites))
        .route(
            "/{id}",
            get(handlers::sites::get_site).delete(handlers::sites::delete_site),
        )
        .route("/{id}/unit-price", put(handlers::sites::set_unit_price))
        .route("/{id}/conclude", post(handlers::sites::conclude_site))
        .route("/{id}/cancel", post(handlers::sites::cancel_site))
        .route(
            "/{id}/ruas",
            post(handlers::segments::create_segment).get(handlers::segments::list_segments),
        )
        .route("/{id}/faturamentos", get(handlers::billing::list_billing))
        .route(
            "/{id}/despesas",
            post(handlers::expenses::add_expense).get(handlers::expenses::list_expenses),
        )
        .route("/{id}/resumo", get(handlers::summary::get_summary))
        .route("/{id}/resumo/mensal", get(handlers::summary::get_monthly))
        .route("/{id}/progresso", get(handlers::summary::get_progress));

    let ruas_routes = Router::new()
        .route("/{id}", delete(handlers::segments::delete_segment))
        .route("/{id}/start", post(handlers::segments::start_segment))
        .route("/{id}/complete", post(handlers::segments::complete_segment));

    let faturamentos_routes =
        Router::new().route("/{id}/pay", post(handlers::billing::mark_paid));

    let despesas_routes =
        Router::new().route("/{id}", delete(handlers::expenses::delete_expense));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/obras", obras_routes)
        .nest("/api/ruas", ruas_routes)
        .nest("/api/faturamentos", faturamentos_routes)
        .nest("/api/despesas", despesas_routes)
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::{db::MemoryObrasRepository, middleware::tenancy::COMPANY_ID_HEADER};

    struct TestApp {
        router: Router,
        company: Uuid,
    }

    impl TestApp {
        fn new() -> Self {
            let state = AppState::with_store(Arc::new(MemoryObrasRepository::new()));
            Self {
                router: app(state),
                company: Uuid::new_v4(),
            }
        }

        async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
            let builder = Request::builder()
                .method(method)
                .uri(uri)
                .header(COMPANY_ID_HEADER, self.company.to_string());
            let request = match body {
                Some(json) => builder
                    .header("content-type", "application/json")
                    .body(Body::from(json.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };

            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = response.into_body().collect().await.unwrap().to_bytes();
            let value = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, value)
        }

        async fn site(&self, unit_price: Value) -> String {
            let (status, body) = self
                .send(
                    "POST",
                    "/api/obras",
                    Some(json!({ "name": "Vila Nova", "city": "Campinas", "state": "sp", "unitPrice": unit_price })),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED);
            body["id"].as_str().unwrap().to_string()
        }

        async fn segment(&self, site_id: &str, name: &str) -> String {
            let (status, body) = self
                .send(
                    "POST",
                    &format!("/api/obras/{}/ruas", site_id),
                    Some(json!({ "name": name, "plannedArea": 1000 })),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED);
            body["id"].as_str().unwrap().to_string()
        }
    }

    #[tokio::test]
    async fn health_check_responds_ok() {
        let app = TestApp::new();
        let request = Request::builder().uri("/api/health").body(Body::empty()).unwrap();
        let response = app.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let app = TestApp::new();
        let request = Request::builder()
            .uri("/api-docs/openapi.json")
            .body(Body::empty())
            .unwrap();
        let response = app.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let doc: Value = serde_json::from_slice(&bytes).unwrap();
        assert!(doc["paths"]["/api/obras/{id}/resumo"]["get"].is_object());
        assert!(doc["paths"]["/api/ruas/{id}/complete"]["post"].is_object());
    }

    #[tokio::test]
    async fn missing_company_header_is_rejected() {
        let app = TestApp::new();
        let request = Request::builder().uri("/api/obras").body(Body::empty()).unwrap();
        let response = app.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn completion_flow_over_http() {
        let app = TestApp::new();
        let site_id = app.site(json!(25)).await;
        let segment_id = app.segment(&site_id, "Rua 1").await;

        let (status, site) = app.send("GET", &format!("/api/obras/{}", site_id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(site["status"], "in_progress");
        assert_eq!(site["state"], "SP");

        let (status, done) = app
            .send(
                "POST",
                &format!("/api/ruas/{}/complete", segment_id),
                Some(json!({ "executedArea": 1000, "executedMass": 100 })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(done["segment"]["status"], "completed");
        assert_eq!(done["billing"]["status"], "pending");
        assert_eq!(done["billing"]["totalValue"], 25000.0);

        let (status, _) = app
            .send(
                "POST",
                &format!("/api/ruas/{}/complete", segment_id),
                Some(json!({ "executedArea": 1000, "executedMass": 100 })),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let billing_id = done["billing"]["id"].as_str().unwrap().to_string();
        let (status, paid) = app
            .send(
                "POST",
                &format!("/api/faturamentos/{}/pay", billing_id),
                Some(json!({ "invoiceNumber": "NF-42" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(paid["status"], "paid");
        assert_eq!(paid["invoiceNumber"], "NF-42");

        let (status, summary) = app
            .send("GET", &format!("/api/obras/{}/resumo", site_id), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(summary["totalBilled"], 25000.0);
        assert_eq!(summary["totalPending"], 0.0);
        assert_eq!(summary["display"]["totalBilled"], "R$ 25.000,00");
    }

    #[tokio::test]
    async fn validation_errors_name_the_field() {
        let app = TestApp::new();
        let site_id = app.site(Value::Null).await;
        let segment_id = app.segment(&site_id, "Rua 1").await;

        let (status, body) = app
            .send(
                "POST",
                &format!("/api/ruas/{}/complete", segment_id),
                Some(json!({ "executedArea": 0, "executedMass": 100 })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["details"]["executed_area"].is_array());

        let (status, body) = app
            .send(
                "POST",
                &format!("/api/ruas/{}/complete", segment_id),
                Some(json!({ "executedArea": 1000, "executedMass": 100 })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["details"]["unit_price"].is_array());
    }

    #[tokio::test]
    async fn fuel_expense_delete_is_forbidden() {
        let app = TestApp::new();
        let site_id = app.site(json!(25)).await;

        let (status, expense) = app
            .send(
                "POST",
                &format!("/api/obras/{}/despesas", site_id),
                Some(json!({
                    "category": "fuel",
                    "description": "Diesel da vibroacabadora",
                    "amount": 1800,
                    "expenseDate": "2025-03-10"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(expense["includeInCompanyRollup"], true);

        let expense_id = expense["id"].as_str().unwrap().to_string();
        let (status, _) = app
            .send("DELETE", &format!("/api/despesas/{}", expense_id), None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, listed) = app
            .send(
                "GET",
                &format!("/api/obras/{}/despesas?category=fuel&from=2025-03-01", site_id),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed.as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn segment_list_carries_status_counts() {
        let app = TestApp::new();
        let site_id = app.site(json!(25)).await;
        let first = app.segment(&site_id, "Rua 1").await;
        app.segment(&site_id, "Rua 2").await;

        let (status, _) = app.send("POST", &format!("/api/ruas/{}/start", first), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = app
            .send("GET", &format!("/api/obras/{}/ruas", site_id), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["segments"].as_array().map(Vec::len), Some(2));
        assert_eq!(body["counts"]["planned"], 1);
        assert_eq!(body["counts"]["inExecution"], 1);
        assert_eq!(body["segments"][0]["plannedMass"], 100.0);
    }

    #[tokio::test]
    async fn monthly_breakdown_has_twelve_months() {
        let app = TestApp::new();
        let site_id = app.site(json!(25)).await;

        let (status, months) = app
            .send("GET", &format!("/api/obras/{}/resumo/mensal?year=2025", site_id), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(months.as_array().map(Vec::len), Some(12));
        assert_eq!(months[0]["month"], "2025-01");
    }

    #[tokio::test]
    async fn deleted_site_is_not_found() {
        let app = TestApp::new();
        let site_id = app.site(json!(25)).await;

        let (status, _) = app.send("DELETE", &format!("/api/obras/{}", site_id), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = app
            .send("GET", &format!("/api/obras/{}/progresso", site_id), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
