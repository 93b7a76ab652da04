//! Queue-driven continuation protocol.
//!
//! [`schedule`] seeds the queue with the first stage of an execution
//! order. [`process_one`] is one worker invocation: receive a message,
//! run its stage, enqueue the follow-on message, then acknowledge. A
//! failed stage acknowledges nothing, so the visibility timeout returns
//! the message for redelivery and downstream stages never start.

use std::path::Path;

use strata_types::{ContinuationMessage, Stage};

use crate::driver::{Driver, DriverError};
use crate::queue::{QueueError, TaskQueue};

/// Errors from the continuation protocol.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Driver(#[from] DriverError),

    /// The worker could not rebuild a driver from the message's config
    /// path.
    #[error("failed to load pipeline from '{path}'")]
    Load {
        path: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Outcome of one successfully processed message.
#[derive(Debug)]
pub struct ProcessedStage {
    /// Stage that ran.
    pub stage: Stage,
    /// The stage task's summary.
    pub summary: String,
    /// Follow-on stage enqueued, if any. `None` means the run finished.
    pub enqueued_next: Option<Stage>,
}

/// Seed the queue with the first message of the selected execution order.
///
/// Returns the enqueued message, or `None` when the order is empty and
/// nothing was scheduled.
///
/// # Errors
///
/// Returns [`DispatchError::Driver`] for an unknown stage selection or
/// [`DispatchError::Queue`] when the enqueue fails.
pub fn schedule(
    queue: &dyn TaskQueue,
    driver: &Driver,
    config_path: &Path,
    selected: Option<&str>,
) -> Result<Option<ContinuationMessage>, DispatchError> {
    let order = driver.execution_order(selected)?;
    let Some(message) = ContinuationMessage::head(config_path.to_string_lossy(), &order) else {
        tracing::warn!(pipeline = driver.config().pipeline, "No stages to enqueue");
        return Ok(None);
    };
    queue.enqueue(&message)?;
    tracing::info!(
        pipeline = driver.config().pipeline,
        stage = %message.stage,
        remaining = message.remaining.len(),
        "Scheduled pipeline run"
    );
    Ok(Some(message))
}

/// Process at most one message from the queue.
///
/// The driver is rebuilt from the message's `config_path` on every
/// invocation; workers carry no state between messages. The follow-on
/// message is enqueued before the processed one is deleted, so a crash
/// between the two duplicates a stage rather than losing one. Stage
/// tasks are idempotent for exactly this reason.
///
/// # Errors
///
/// Returns [`DispatchError::Load`] when the config cannot be loaded,
/// [`DispatchError::Driver`] when the stage fails (the message stays on
/// the queue for redelivery), or [`DispatchError::Queue`] on queue
/// failures.
pub fn process_one<F>(
    queue: &dyn TaskQueue,
    build_driver: F,
) -> Result<Option<ProcessedStage>, DispatchError>
where
    F: FnOnce(&Path) -> anyhow::Result<Driver>,
{
    let Some(received) = queue.receive_one()? else {
        return Ok(None);
    };
    let message = &received.message;
    let config_path = Path::new(&message.config_path);
    let driver = build_driver(config_path).map_err(|source| DispatchError::Load {
        path: message.config_path.clone(),
        source,
    })?;

    let summary = driver.run_stage(message.stage)?;

    let enqueued_next = match message.next() {
        Some(next) => {
            queue.enqueue(&next)?;
            Some(next.stage)
        }
        None => {
            tracing::info!(
                pipeline = driver.config().pipeline,
                "Pipeline run complete, no stages remaining"
            );
            None
        }
    };
    queue.delete(&received.handle)?;

    Ok(Some(ProcessedStage {
        stage: message.stage,
        summary,
        enqueued_next,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::config::parser::parse_pipeline_str;
    use crate::queue::MemoryTaskQueue;
    use crate::registry::TaskRegistry;

    fn test_driver(fail_stage: Option<Stage>) -> Driver {
        let config = parse_pipeline_str(
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
        .unwrap();
        let mut tasks = TaskRegistry::new();
        for stage in Stage::ORDER {
            let fails = fail_stage == Some(stage);
            tasks.register(
                stage,
                Box::new(move || {
                    if fails {
                        anyhow::bail!("{stage} task failed")
                    }
                    Ok(format!("{stage} ok"))
                }),
            );
        }
        Driver::new(config, tasks)
    }

    #[test]
    fn schedule_enqueues_head_of_order() {
        let queue = MemoryTaskQueue::new(Duration::from_secs(60));
        let driver = test_driver(None);
        let message = schedule(&queue, &driver, Path::new("cfg.yml"), None)
            .unwrap()
            .unwrap();
        assert_eq!(message.stage, Stage::Bronze);
        assert_eq!(message.remaining, vec![Stage::Silver, Stage::Gold]);
        assert!(!queue.is_empty().unwrap());
    }

    #[test]
    fn schedule_from_suffix_starts_mid_pipeline() {
        let queue = MemoryTaskQueue::new(Duration::from_secs(60));
        let driver = test_driver(None);
        let message = schedule(&queue, &driver, Path::new("cfg.yml"), Some("gold"))
            .unwrap()
            .unwrap();
        assert_eq!(message.stage, Stage::Gold);
        assert!(message.remaining.is_empty());
    }

    #[test]
    fn process_one_on_empty_queue_is_none() {
        let queue = MemoryTaskQueue::new(Duration::from_secs(60));
        let result = process_one(&queue, |_| Ok(test_driver(None))).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn full_run_chains_all_three_stages() {
        let queue = MemoryTaskQueue::new(Duration::from_secs(60));
        let driver = test_driver(None);
        schedule(&queue, &driver, Path::new("cfg.yml"), None).unwrap();

        let mut seen = Vec::new();
        while let Some(processed) = process_one(&queue, |_| Ok(test_driver(None))).unwrap() {
            seen.push((processed.stage, processed.enqueued_next));
        }
        assert_eq!(
            seen,
            vec![
                (Stage::Bronze, Some(Stage::Silver)),
                (Stage::Silver, Some(Stage::Gold)),
                (Stage::Gold, None),
            ]
        );
        assert!(queue.is_empty().unwrap());
    }

    #[test]
    fn failed_stage_enqueues_nothing_and_keeps_message() {
        let queue = MemoryTaskQueue::new(Duration::ZERO);
        let driver = test_driver(Some(Stage::Silver));
        schedule(&queue, &driver, Path::new("cfg.yml"), Some("silver")).unwrap();

        let err = process_one(&queue, |_| Ok(test_driver(Some(Stage::Silver)))).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Driver(DriverError::Stage { stage: Stage::Silver, .. })
        ));

        // Zero visibility timeout: the unacknowledged message is already
        // redeliverable, and it is still the silver message.
        let redelivered = queue.receive_one().unwrap().unwrap();
        assert_eq!(redelivered.message.stage, Stage::Silver);
    }

    #[test]
    fn load_failure_keeps_message_for_redelivery() {
        let queue = MemoryTaskQueue::new(Duration::ZERO);
        let driver = test_driver(None);
        schedule(&queue, &driver, Path::new("missing.yml"), None).unwrap();

        let err = process_one(&queue, |_| anyhow::bail!("no such file")).unwrap_err();
        assert!(matches!(err, DispatchError::Load { .. }));
        assert!(!queue.is_empty().unwrap());
    }
}
