// src/config.rs

use std::{env, sync::Arc, time::Duration};

use sqlx::postgres::PgPoolOptions;

use crate::{
    db::{MemoryObrasRepository, ObrasStore, PgObrasRepository},
    services::{BillingService, ExpenseService, SegmentService, SiteService, SummaryService},
};

/// Configuração lida do ambiente (e do `.env`, quando existir).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").ok().filter(|v| !v.trim().is_empty());
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let db_max_connections = parse_or("DB_MAX_CONNECTIONS", 5)?;
        let acquire_secs = parse_or("DB_ACQUIRE_TIMEOUT_SECS", 3)?;

        Ok(Self {
            database_url,
            bind_addr,
            db_max_connections,
            db_acquire_timeout: Duration::from_secs(acquire_secs),
        })
    }
}

fn parse_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} inválido ({}): {}", key, raw, e)),
        Err(_) => Ok(default),
    }
}

#[derive(Clone)]
pub struct AppState {
    pub site_service: SiteService,
    pub segment_service: SegmentService,
    pub billing_service: BillingService,
    pub expense_service: ExpenseService,
    pub summary_service: SummaryService,
}

impl AppState {
    pub async fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let store: Arc<dyn ObrasStore> = match &config.database_url {
            Some(database_url) => {
                let pool = PgPoolOptions::new()
                    .max_connections(config.db_max_connections)
                    .acquire_timeout(config.db_acquire_timeout)
                    .connect(database_url)
                    .await?;
                tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

                sqlx::migrate!().run(&pool).await?;
                tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

                Arc::new(PgObrasRepository::new(pool))
            }
            None => {
                tracing::warn!("DATABASE_URL ausente: usando armazenamento em memória (dados não persistem)");
                Arc::new(MemoryObrasRepository::new())
            }
        };

        Ok(Self::with_store(store))
    }

    // --- Monta o gráfico de dependências ---
    pub fn with_store(store: Arc<dyn ObrasStore>) -> Self {
        let site_service = SiteService::new(store.clone());
        Self {
            segment_service: SegmentService::new(store.clone(), site_service.clone()),
            billing_service: BillingService::new(store.clone()),
            expense_service: ExpenseService::new(store.clone()),
            summary_service: SummaryService::new(store),
            site_service,
        }
    }
}
