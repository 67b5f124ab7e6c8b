//! Orchestrator module for the inspection indexer pipeline.
//!
//! Runs extract, transform and load in order, retrying failed stages and
//! triggering runs on a daily schedule.

pub mod schedule;
pub mod stages;

pub use schedule::{DailySchedule, RetryPolicy};
pub use stages::{EtlPipeline, EtlStages};

use chrono::{DateTime, Utc};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::errors::PipelineError;
use crate::loader::LoadReport;

/// Job name runs are reported under.
pub const DEFAULT_JOB_NAME: &str = "fetch_clean_elastic";

/// One step of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Extract,
    Transform,
    Load,
}

impl Stage {
    /// Stages in execution order.
    pub const ALL: [Stage; 3] = [Stage::Extract, Stage::Transform, Stage::Load];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Extract => "extract",
            Stage::Transform => "transform",
            Stage::Load => "load",
        }
    }

    /// Whether re-running the stage leaves the same end state.
    ///
    /// Extract and transform overwrite their output file. Load appends new
    /// documents on every invocation.
    pub fn is_idempotent(&self) -> bool {
        match self {
            Stage::Extract | Stage::Transform => true,
            Stage::Load => false,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    /// Not reached, either because the run is ongoing or an upstream stage failed.
    Pending,
    Succeeded,
    /// Failed on every allowed attempt.
    Failed,
}

/// Outcome of one stage within a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageRecord {
    pub stage: Stage,
    pub status: StageStatus,
    pub attempts: u32,
    /// Error of the most recent failed attempt.
    pub error: Option<String>,
}

/// Outcome of one run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    pub job_name: String,
    pub triggered_at: DateTime<Utc>,
    /// One record per stage, in execution order.
    pub stages: Vec<StageRecord>,
    /// Present when the load stage succeeded.
    pub load: Option<LoadReport>,
}

impl RunReport {
    fn new(job_name: &str, triggered_at: DateTime<Utc>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            job_name: job_name.to_string(),
            triggered_at,
            stages: Stage::ALL
                .iter()
                .map(|stage| StageRecord {
                    stage: *stage,
                    status: StageStatus::Pending,
                    attempts: 0,
                    error: None,
                })
                .collect(),
            load: None,
        }
    }

    pub fn stage(&self, stage: Stage) -> &StageRecord {
        &self.stages[stage as usize]
    }

    fn stage_mut(&mut self, stage: Stage) -> &mut StageRecord {
        &mut self.stages[stage as usize]
    }

    /// Whether every stage succeeded.
    pub fn succeeded(&self) -> bool {
        self.stages
            .iter()
            .all(|record| record.status == StageStatus::Succeeded)
    }

    /// The stage that halted the run, if any.
    pub fn failed_stage(&self) -> Option<&StageRecord> {
        self.stages
            .iter()
            .find(|record| record.status == StageStatus::Failed)
    }
}

/// Configuration for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub job_name: String,
    pub retry: RetryPolicy,
    pub schedule: DailySchedule,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            job_name: DEFAULT_JOB_NAME.to_string(),
            retry: RetryPolicy::default(),
            schedule: DailySchedule::default(),
        }
    }
}

/// Orchestrator that chains the pipeline stages.
///
/// Only one run executes at a time; stages run strictly in sequence and each
/// stage's output path is handed to the next one.
pub struct Orchestrator {
    stages: Arc<dyn EtlStages>,
    index_name: String,
    config: OrchestratorConfig,
    shutdown_tx: broadcast::Sender<()>,
}

impl Orchestrator {
    /// Create a new orchestrator loading into `index_name`.
    pub fn new(stages: Arc<dyn EtlStages>, index_name: impl Into<String>) -> Self {
        Self::with_config(stages, index_name, OrchestratorConfig::default())
    }

    /// Create a new orchestrator with custom configuration.
    pub fn with_config(
        stages: Arc<dyn EtlStages>,
        index_name: impl Into<String>,
        config: OrchestratorConfig,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            stages,
            index_name: index_name.into(),
            config,
            shutdown_tx,
        }
    }

    /// Run extract, transform and load once.
    ///
    /// A stage that exhausts its retries halts the run; downstream stages
    /// stay [`StageStatus::Pending`].
    #[instrument(skip(self), fields(job = %self.config.job_name, index = %self.index_name))]
    pub async fn run_once(&self, triggered_at: DateTime<Utc>) -> RunReport {
        let mut report = RunReport::new(&self.config.job_name, triggered_at);
        info!(run_id = %report.run_id, "Starting run");

        let stages: &dyn EtlStages = self.stages.as_ref();

        let Some(raw_path) = self
            .run_stage(Stage::Extract, &mut report, move || stages.extract())
            .await
        else {
            return finish(report);
        };

        let raw_path = raw_path.as_path();
        let Some(clean_path) = self
            .run_stage(Stage::Transform, &mut report, move || {
                stages.transform(raw_path)
            })
            .await
        else {
            return finish(report);
        };

        let clean_path = clean_path.as_path();
        let index_name = self.index_name.as_str();
        report.load = self
            .run_stage(Stage::Load, &mut report, move || {
                stages.load(clean_path, index_name)
            })
            .await;

        finish(report)
    }

    /// Invoke a stage until it succeeds or runs out of attempts.
    async fn run_stage<T, F, Fut>(
        &self,
        stage: Stage,
        report: &mut RunReport,
        mut invoke: F,
    ) -> Option<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, PipelineError>>,
    {
        let policy = self.config.retry;
        let max_attempts = policy.max_attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;
            let result = invoke().await;

            let record = report.stage_mut(stage);
            record.attempts = attempt;

            match result {
                Ok(value) => {
                    record.status = StageStatus::Succeeded;
                    record.error = None;
                    info!(stage = %stage, attempts = attempt, "Stage succeeded");
                    return Some(value);
                }
                Err(e) if attempt >= max_attempts => {
                    record.status = StageStatus::Failed;
                    record.error = Some(e.to_string());
                    error!(
                        stage = %stage,
                        attempts = attempt,
                        error = %e,
                        "Stage failed, halting run"
                    );
                    return None;
                }
                Err(e) => {
                    record.error = Some(e.to_string());
                    warn!(
                        stage = %stage,
                        attempt = attempt,
                        max_attempts = max_attempts,
                        retry_in_secs = policy.delay.as_secs(),
                        error = %e,
                        "Stage failed, retrying"
                    );
                    if !stage.is_idempotent() {
                        warn!(
                            stage = %stage,
                            "Stage is not idempotent; documents written by the failed attempt will be duplicated"
                        );
                    }
                    tokio::time::sleep(policy.delay).await;
                }
            }
        }
    }

    /// Run on the daily schedule until shutdown.
    ///
    /// Triggers missed while a run was executing are skipped. Ctrl-C and
    /// [`Orchestrator::shutdown`] are observed only while waiting for the next
    /// trigger; a run in progress always completes.
    #[instrument(skip(self), fields(job = %self.config.job_name, schedule = %self.config.schedule))]
    pub async fn run_scheduled(&self) -> Result<(), PipelineError> {
        info!("Starting scheduler");
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            let now = Utc::now();
            let next = self.config.schedule.next_after(now);
            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);

            info!(next_run = %next, "Waiting for next scheduled run");

            tokio::select! {
                _ = tokio::time::sleep(wait) => {
                    self.run_once(next).await;
                }
                signal = tokio::signal::ctrl_c() => {
                    signal?;
                    info!("Received shutdown signal");
                    break;
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown requested");
                    break;
                }
            }
        }

        info!("Scheduler stopped");
        Ok(())
    }

    /// Stop [`Orchestrator::run_scheduled`] before its next trigger.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }
}

fn finish(report: RunReport) -> RunReport {
    match report.failed_stage() {
        None => info!(
            run_id = %report.run_id,
            indexed = report.load.as_ref().map(|l| l.indexed).unwrap_or(0),
            "Run completed"
        ),
        Some(failed) => error!(
            run_id = %report.run_id,
            stage = %failed.stage,
            error = failed.error.as_deref().unwrap_or(""),
            "Run failed"
        ),
    }
    report
}
