// src/models/segment.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use utoipa::ToSchema;

use crate::common::{error::AppError, formulas};

// --- Enums (Mapeando o Postgres) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "segment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SegmentStatus {
    Planned,     // Pendente
    InExecution, // Em andamento
    Completed,   // Finalizada
}

/// Dados de execução, gravados uma única vez na finalização.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Execution {
    pub executed_area: Decimal,
    pub executed_mass: Decimal,
    pub thickness: Decimal,
    pub unit_price: Decimal,
    pub total_value: Decimal,
    pub completed_at: DateTime<Utc>,
}

impl Execution {
    /// Aplica as fórmulas sobre a medição e congela o preço informado.
    /// Metragem × preço fora da faixa do `Decimal` é rejeitada como entrada inválida.
    pub fn measure(
        executed_area: Decimal,
        executed_mass: Decimal,
        unit_price: Decimal,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, AppError> {
        let total_value =
            formulas::billed_value(executed_area, unit_price).ok_or_else(area_out_of_range)?;
        Ok(Self {
            executed_area,
            executed_mass,
            thickness: formulas::thickness(executed_mass, executed_area),
            unit_price,
            total_value,
            completed_at,
        })
    }
}

/// Estado da rua. Os dados de execução só existem em `Completed`.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SegmentState {
    Planned,
    #[serde(rename_all = "camelCase")]
    InExecution { started_at: DateTime<Utc> },
    Completed(Execution),
}

/// Rua: uma unidade de trabalho dentro da obra.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub id: Uuid,
    pub site_id: Uuid,
    pub name: String,
    pub position: i32,

    // Planejamento (imutável depois que a rua entra em execução)
    pub planned_area: Option<Decimal>,
    pub planned_mass: Option<Decimal>,
    pub notes: Option<String>,
    pub image_url: Option<String>,

    #[serde(flatten)]
    pub state: SegmentState,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Segment {
    pub fn status(&self) -> SegmentStatus {
        match self.state {
            SegmentState::Planned => SegmentStatus::Planned,
            SegmentState::InExecution { .. } => SegmentStatus::InExecution,
            SegmentState::Completed(_) => SegmentStatus::Completed,
        }
    }

    pub fn execution(&self) -> Option<&Execution> {
        match &self.state {
            SegmentState::Completed(execution) => Some(execution),
            _ => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.state, SegmentState::Completed(_))
    }

    /// Planned → InExecution. Marcador opcional, não é pré-requisito da finalização.
    pub fn start(&mut self, at: DateTime<Utc>) -> Result<(), AppError> {
        match self.state {
            SegmentState::Planned => {
                self.state = SegmentState::InExecution { started_at: at };
                self.updated_at = at;
                Ok(())
            }
            SegmentState::InExecution { .. } => Err(AppError::InvalidState(format!(
                "A rua '{}' já está em execução.",
                self.name
            ))),
            SegmentState::Completed(_) => Err(finalized_error(&self.name)),
        }
    }

    /// Planned | InExecution → Completed.
    pub fn complete(&mut self, execution: Execution) -> Result<(), AppError> {
        match self.state {
            SegmentState::Planned | SegmentState::InExecution { .. } => {
                self.updated_at = execution.completed_at;
                self.state = SegmentState::Completed(execution);
                Ok(())
            }
            SegmentState::Completed(_) => Err(finalized_error(&self.name)),
        }
    }
}

pub(crate) fn area_out_of_range() -> AppError {
    AppError::invalid_field(
        "executed_area",
        "Metragem executada grande demais para o preço por m² da obra.",
    )
}

pub(crate) fn finalized_error(name: &str) -> AppError {
    AppError::InvalidState(format!(
        "A rua '{}' já foi finalizada e não pode ser alterada.",
        name
    ))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SegmentStatusCount {
    pub planned: usize,
    pub in_execution: usize,
    pub completed: usize,
}

impl SegmentStatusCount {
    pub fn tally(segments: &[Segment]) -> Self {
        segments.iter().fold(Self::default(), |mut acc, s| {
            match s.status() {
                SegmentStatus::Planned => acc.planned += 1,
                SegmentStatus::InExecution => acc.in_execution += 1,
                SegmentStatus::Completed => acc.completed += 1,
            }
            acc
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewSegment {
    pub site_id: Uuid,
    pub name: String,
    pub position: Option<i32>,
    pub planned_area: Option<Decimal>,
    pub planned_mass: Option<Decimal>,
    pub notes: Option<String>,
    pub image_url: Option<String>,
}

// --- Linha do banco ---
// As colunas de execução são anuláveis; a conversão para `Segment` rejeita
// linhas que quebram a regra "execução presente sse finalizada".

#[derive(Debug, Clone, FromRow)]
pub struct SegmentRow {
    pub id: Uuid,
    pub site_id: Uuid,
    pub name: String,
    pub position: i32,
    pub planned_area: Option<Decimal>,
    pub planned_mass: Option<Decimal>,
    pub notes: Option<String>,
    pub image_url: Option<String>,
    pub status: SegmentStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub executed_area: Option<Decimal>,
    pub executed_mass: Option<Decimal>,
    pub thickness: Option<Decimal>,
    pub unit_price: Option<Decimal>,
    pub total_value: Option<Decimal>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<SegmentRow> for Segment {
    type Error = AppError;

    fn try_from(row: SegmentRow) -> Result<Self, Self::Error> {
        let has_execution = row.executed_area.is_some()
            || row.executed_mass.is_some()
            || row.thickness.is_some()
            || row.unit_price.is_some()
            || row.total_value.is_some()
            || row.completed_at.is_some();

        let state = match (row.status, has_execution) {
            (SegmentStatus::Planned, false) => SegmentState::Planned,
            (SegmentStatus::InExecution, false) => SegmentState::InExecution {
                started_at: row.started_at.unwrap_or(row.updated_at),
            },
            (SegmentStatus::Completed, true) => {
                match (
                    row.executed_area,
                    row.executed_mass,
                    row.thickness,
                    row.unit_price,
                    row.total_value,
                    row.completed_at,
                ) {
                    (
                        Some(executed_area),
                        Some(executed_mass),
                        Some(thickness),
                        Some(unit_price),
                        Some(total_value),
                        Some(completed_at),
                    ) => SegmentState::Completed(Execution {
                        executed_area,
                        executed_mass,
                        thickness,
                        unit_price,
                        total_value,
                        completed_at,
                    }),
                    _ => return Err(inconsistent_row(row.id)),
                }
            }
            _ => return Err(inconsistent_row(row.id)),
        };

        Ok(Segment {
            id: row.id,
            site_id: row.site_id,
            name: row.name,
            position: row.position,
            planned_area: row.planned_area,
            planned_mass: row.planned_mass,
            notes: row.notes,
            image_url: row.image_url,
            state,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn inconsistent_row(id: Uuid) -> AppError {
    AppError::InternalServerError(anyhow::anyhow!(
        "rua {} com status e dados de execução inconsistentes",
        id
    ))
}
