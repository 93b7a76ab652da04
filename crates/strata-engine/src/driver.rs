//! Stage sequencer: decides what runs next and executes one stage at a time.

use std::collections::BTreeMap;

use strata_types::stage::{Stage, UnknownStage};

use crate::config::types::PipelineConfig;
use crate::registry::TaskRegistry;

/// Errors from stage sequencing and execution.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// Stage name outside the fixed enumeration. Fail fast, never retried.
    #[error(transparent)]
    UnknownStage(#[from] UnknownStage),

    /// No task bound for the stage.
    #[error("no task registered for stage '{0}'")]
    Unregistered(Stage),

    /// The stage's task failed. Nothing downstream is scheduled.
    #[error("stage '{stage}' failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: anyhow::Error,
    },
}

/// Drives one pipeline: computes the stage execution order and runs the
/// injected per-stage tasks.
pub struct Driver {
    config: PipelineConfig,
    tasks: TaskRegistry,
}

impl std::fmt::Debug for Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Driver {
    #[must_use]
    pub fn new(config: PipelineConfig, tasks: TaskRegistry) -> Self {
        Self { config, tasks }
    }

    /// The configuration this driver was built from.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Ordered list of stages to execute. `None` or `"all"` selects the
    /// full order; a stage name selects the contiguous suffix starting
    /// there (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::UnknownStage`] for names outside the fixed
    /// enumeration.
    pub fn execution_order(&self, selected: Option<&str>) -> Result<Vec<Stage>, DriverError> {
        match selected {
            None => Ok(Stage::ORDER.to_vec()),
            Some(s) if s.eq_ignore_ascii_case("all") => Ok(Stage::ORDER.to_vec()),
            Some(s) => Ok(s.parse::<Stage>()?.suffix()),
        }
    }

    /// Pure, side-effect-free equivalent of [`Driver::execution_order`],
    /// for dry-run inspection.
    ///
    /// # Errors
    ///
    /// Same as [`Driver::execution_order`].
    pub fn plan(&self, selected: Option<&str>) -> Result<Vec<Stage>, DriverError> {
        self.execution_order(selected)
    }

    /// Execute exactly one stage's task and return its summary.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Unregistered`] when no task is bound, or
    /// [`DriverError::Stage`] when the task fails.
    pub fn run_stage(&self, stage: Stage) -> Result<String, DriverError> {
        let task = self
            .tasks
            .get(stage)
            .ok_or(DriverError::Unregistered(stage))?;
        tracing::info!(pipeline = self.config.pipeline, stage = %stage, "Starting stage");
        match task.run() {
            Ok(summary) => {
                tracing::info!(
                    pipeline = self.config.pipeline,
                    stage = %stage,
                    summary,
                    "Stage completed"
                );
                Ok(summary)
            }
            Err(source) => {
                tracing::error!(
                    pipeline = self.config.pipeline,
                    stage = %stage,
                    error = %source,
                    "Stage failed"
                );
                Err(DriverError::Stage { stage, source })
            }
        }
    }

    /// Run the selected execution order synchronously in-process, stage by
    /// stage. Stops at the first failure and propagates it; stages after
    /// the failed one are never started.
    ///
    /// # Errors
    ///
    /// Returns the first sequencing or stage error encountered.
    pub fn run(&self, selected: Option<&str>) -> Result<BTreeMap<Stage, String>, DriverError> {
        let order = self.execution_order(selected)?;
        // Surface missing bindings before any work starts.
        if let Some(stage) = order.iter().find(|s| !self.tasks.is_registered(**s)) {
            return Err(DriverError::Unregistered(*stage));
        }

        let mut results = BTreeMap::new();
        for stage in order {
            let summary = self.run_stage(stage)?;
            results.insert(stage, summary);
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn test_config() -> PipelineConfig {
        serde_yaml::from_str(
            r"
pipeline: test
sources:
  - name: crm
    type: postgres
    tables:
      - name: customers
stages:
  bronze:
    local_path: data/bronze
    checkpoint_path: state/checkpoints.json
  silver:
    local_path: data/silver
  gold:
    local_path: data/gold
monitoring:
  log_path: logs/run.log
  metrics_path: logs/metrics.json
queue:
  path: state/queue.json
",
        )
        .unwrap()
    }

    fn driver_with_all_tasks() -> Driver {
        let mut tasks = TaskRegistry::new();
        for stage in Stage::ORDER {
            tasks.register(stage, Box::new(move || Ok(format!("{stage} ok"))));
        }
        Driver::new(test_config(), tasks)
    }

    #[test]
    fn execution_order_none_and_all_return_full_order() {
        let driver = driver_with_all_tasks();
        assert_eq!(driver.execution_order(None).unwrap(), Stage::ORDER.to_vec());
        assert_eq!(driver.execution_order(Some("all")).unwrap(), Stage::ORDER.to_vec());
        assert_eq!(driver.execution_order(Some("ALL")).unwrap(), Stage::ORDER.to_vec());
    }

    #[test]
    fn execution_order_returns_contiguous_suffix() {
        let driver = driver_with_all_tasks();
        assert_eq!(
            driver.execution_order(Some("silver")).unwrap(),
            vec![Stage::Silver, Stage::Gold]
        );
        assert_eq!(driver.execution_order(Some("Gold")).unwrap(), vec![Stage::Gold]);
    }

    #[test]
    fn execution_order_rejects_unknown_stage() {
        let driver = driver_with_all_tasks();
        let err = driver.execution_order(Some("platinum")).unwrap_err();
        assert!(matches!(err, DriverError::UnknownStage(_)));
        assert!(err.to_string().contains("platinum"));
    }

    #[test]
    fn plan_equals_execution_order() {
        let driver = driver_with_all_tasks();
        assert_eq!(
            driver.plan(Some("silver")).unwrap(),
            driver.execution_order(Some("silver")).unwrap()
        );
    }

    #[test]
    fn run_stage_requires_registration() {
        let driver = Driver::new(test_config(), TaskRegistry::new());
        let err = driver.run_stage(Stage::Bronze).unwrap_err();
        assert!(matches!(err, DriverError::Unregistered(Stage::Bronze)));
    }

    #[test]
    fn run_executes_all_stages_in_order() {
        let driver = driver_with_all_tasks();
        let results = driver.run(None).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[&Stage::Bronze], "bronze ok");
        assert_eq!(results[&Stage::Gold], "gold ok");
    }

    #[test]
    fn run_stops_at_first_failure() {
        let gold_runs = Arc::new(AtomicUsize::new(0));
        let mut tasks = TaskRegistry::new();
        tasks.register(Stage::Bronze, Box::new(|| Ok("bronze ok".to_string())));
        tasks.register(
            Stage::Silver,
            Box::new(|| Err(anyhow::anyhow!("transform blew up"))),
        );
        let counter = Arc::clone(&gold_runs);
        tasks.register(
            Stage::Gold,
            Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok("gold ok".to_string())
            }),
        );

        let driver = Driver::new(test_config(), tasks);
        let err = driver.run(None).unwrap_err();
        assert!(matches!(err, DriverError::Stage { stage: Stage::Silver, .. }));
        assert_eq!(gold_runs.load(Ordering::SeqCst), 0, "gold must never start");
    }

    #[test]
    fn run_fails_fast_on_missing_binding_before_any_work() {
        let bronze_runs = Arc::new(AtomicUsize::new(0));
        let mut tasks = TaskRegistry::new();
        let counter = Arc::clone(&bronze_runs);
        tasks.register(
            Stage::Bronze,
            Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok("bronze ok".to_string())
            }),
        );
        // silver and gold unbound

        let driver = Driver::new(test_config(), tasks);
        let err = driver.run(None).unwrap_err();
        assert!(matches!(err, DriverError::Unregistered(Stage::Silver)));
        assert_eq!(bronze_runs.load(Ordering::SeqCst), 0);
    }
}
