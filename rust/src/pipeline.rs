//! Ranking pipeline: validate, score, sort, truncate.
//!
//! A run moves through `Validating → Scoring → Sorting → Done`, or stops
//! at `Rejected` when the dependency graph has cycles. A rejection carries
//! every cycle found and no scores.

use std::cmp::Ordering;

use crate::config::{InvalidTaskPolicy, RankingConfig};
use crate::error::RankingError;
use crate::index::TaskIndex;
use crate::models::{ScoredTask, Task, TaskRecord};
use crate::scoring::PriorityScorer;
use crate::{log_changes, log_checks, log_debug};

/// Number of results returned by `suggest`.
pub const SUGGEST_TOP_K: usize = 3;

/// Rank caller records (batch mode).
///
/// Records are validated into tasks first; ids default to the 1-based
/// position of the record. See `rank_index` for the remaining steps.
pub fn rank(records: &[TaskRecord], config: &RankingConfig) -> Result<Vec<ScoredTask>, RankingError> {
    let index = build_index(records, config)?;
    rank_index(&index, config)
}

/// Rank every task of an already-built index (store mode).
///
/// # Returns
/// * Tasks sorted by descending score; ties keep index order
/// * `Err(RankingError::CircularDependencies)` with every cycle if the graph is cyclic
/// * `Err(RankingError::InvalidTaskAttribute)` if any task fails validation
pub fn rank_index(index: &TaskIndex, config: &RankingConfig) -> Result<Vec<ScoredTask>, RankingError> {
    let verbosity = config.verbosity;

    let cycles = index.find_cycles();
    if !cycles.is_empty() {
        log_changes!(
            verbosity,
            "Rejected ranking of {} task(s): {} dependency cycle(s)",
            index.len(),
            cycles.len()
        );
        return Err(RankingError::CircularDependencies { cycles });
    }

    let mut scorer = PriorityScorer::new(index, config.strategy, config.weights, config.reference_date)
        .with_verbosity(verbosity);
    let mut scored: Vec<ScoredTask> = Vec::with_capacity(index.len());
    for task in index.tasks() {
        if config.exclude_completed && task.completed {
            log_checks!(verbosity, "Skipping completed task {}", task.id);
            continue;
        }
        let result = scorer.score(task)?;
        log_debug!(
            verbosity,
            "Scored {} = {:.4} [{}]",
            task.id,
            result.score,
            result.explanation.join("; ")
        );
        scored.push(ScoredTask {
            task: task.clone(),
            score: result.score,
            explanation: result.explanation,
            why: None,
        });
    }

    // sort_by is stable, so equal scores keep index order
    scored.sort_by(|a, b| cmp_score_desc(a.score, b.score));

    if let Some(top_k) = config.top_k {
        scored.truncate(top_k);
        for item in &mut scored {
            item.why = Some(summarize(item));
        }
    }

    log_changes!(
        verbosity,
        "Ranked {} task(s) with strategy {}",
        scored.len(),
        config.strategy
    );
    Ok(scored)
}

/// The top `SUGGEST_TOP_K` tasks, each with a `why` line.
pub fn suggest(records: &[TaskRecord], config: &RankingConfig) -> Result<Vec<ScoredTask>, RankingError> {
    let config = RankingConfig {
        top_k: Some(SUGGEST_TOP_K),
        ..config.clone()
    };
    rank(records, &config)
}

/// Validate records and build the run's index, applying the invalid-task policy.
fn build_index(records: &[TaskRecord], config: &RankingConfig) -> Result<TaskIndex, RankingError> {
    let mut tasks: Vec<Task> = Vec::with_capacity(records.len());
    for (i, record) in records.iter().enumerate() {
        match Task::from_record(record, i + 1) {
            Ok(task) => tasks.push(task),
            Err(err) if config.invalid_task_policy == InvalidTaskPolicy::Skip => {
                log_changes!(config.verbosity, "Skipping record {}: {}", i + 1, err);
            }
            Err(err) => return Err(err),
        }
    }
    TaskIndex::new(tasks)
}

/// Descending order by score. NaN compares equal so the sort stays stable.
fn cmp_score_desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

fn summarize(item: &ScoredTask) -> String {
    format!("Score {:.4}: {}", item.score, item.explanation.join("; "))
}
