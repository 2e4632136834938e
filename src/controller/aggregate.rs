//! Per-stage aggregation and pipeline KPIs.
//!
//! Pure functions over a lead collection; the controller feeds them its
//! current visible view. Active stages make up the kanban board; won and
//! lost are aggregated separately and never appear as board columns.

use serde::{Deserialize, Serialize};

use crate::config::ScoreThresholds;
use crate::core::{Lead, Stage, Temperature};

/// Count and value rollup for one group of leads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StageAggregate {
    pub count: usize,
    pub total_estimated_value: f64,
}

impl StageAggregate {
    fn add(&mut self, lead: &Lead) {
        self.count += 1;
        self.total_estimated_value += lead.estimated_value;
    }
}

/// One kanban column header.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageColumn {
    pub stage: Stage,
    pub aggregate: StageAggregate,
}

/// Kanban board rollup: active columns in stage order, terminals apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardAggregates {
    pub columns: Vec<StageColumn>,
    pub won: StageAggregate,
    pub lost: StageAggregate,
}

/// Group leads by stage for the kanban column headers.
///
/// Every active stage gets a column, empty ones included, so the board
/// shape is stable regardless of the data.
pub fn aggregate_by_stage(leads: &[Lead]) -> BoardAggregates {
    let mut columns: Vec<StageColumn> = Stage::ACTIVE
        .iter()
        .map(|&stage| StageColumn {
            stage,
            aggregate: StageAggregate::default(),
        })
        .collect();
    let mut won = StageAggregate::default();
    let mut lost = StageAggregate::default();

    for lead in leads {
        match lead.stage {
            Stage::Won => won.add(lead),
            Stage::Lost => lost.add(lead),
            active => {
                if let Some(ord) = active.ordinal() {
                    columns[ord].aggregate.add(lead);
                }
            }
        }
    }

    BoardAggregates { columns, won, lost }
}

/// Counts of leads per temperature band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemperatureDistribution {
    pub cold: usize,
    pub warm: usize,
    pub hot: usize,
}

/// Headline pipeline KPIs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineKpis {
    /// Sum of estimated value over active (non-terminal) leads.
    pub pipeline_value: f64,
    pub active_count: usize,
    pub won_count: usize,
    pub lost_count: usize,
    /// won / (won + lost); 0 when nothing has closed yet.
    pub conversion_rate: f64,
    pub average_score: f64,
    pub temperature_distribution: TemperatureDistribution,
}

/// Compute the pipeline KPIs for a lead collection.
///
/// Converted leads count as won even if their stage was edited upstream;
/// the conversion rate never divides by zero.
pub fn compute_kpis(leads: &[Lead], thresholds: &ScoreThresholds) -> PipelineKpis {
    let mut kpis = PipelineKpis {
        pipeline_value: 0.0,
        active_count: 0,
        won_count: 0,
        lost_count: 0,
        conversion_rate: 0.0,
        average_score: 0.0,
        temperature_distribution: TemperatureDistribution::default(),
    };

    let mut score_sum = 0.0;
    for lead in leads {
        score_sum += lead.lead_score;
        match thresholds.classify(lead.lead_score) {
            Temperature::Cold => kpis.temperature_distribution.cold += 1,
            Temperature::Warm => kpis.temperature_distribution.warm += 1,
            Temperature::Hot => kpis.temperature_distribution.hot += 1,
        }

        if lead.stage == Stage::Won || lead.converted {
            kpis.won_count += 1;
        } else if lead.stage == Stage::Lost {
            kpis.lost_count += 1;
        } else {
            kpis.active_count += 1;
            kpis.pipeline_value += lead.estimated_value;
        }
    }

    let closed = kpis.won_count + kpis.lost_count;
    if closed > 0 {
        kpis.conversion_rate = kpis.won_count as f64 / closed as f64;
    }
    if !leads.is_empty() {
        kpis.average_score = score_sum / leads.len() as f64;
    }

    kpis
}
