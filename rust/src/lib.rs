//! Dependency-aware task ranking engine.
//!
//! Validates a snapshot of tasks for dependency cycles, scores every task
//! under a selectable strategy and returns them ranked with an explanation
//! per score. Every run is a pure function of its input and reference date.
//!
//! The Rust API lives in `pipeline`, `scoring` and `cycles`; this file also
//! exposes it to Python as the `taskrank.rust` module.

// Allow clippy warning triggered by PyO3 macro expansion
#![allow(clippy::useless_conversion)]

use chrono::{Local, NaiveDate};
use pyo3::prelude::*;

mod config;
pub mod cycles;
mod error;
pub mod index;
mod interner;
pub mod logging;
mod models;
pub mod pipeline;
pub mod scoring;

pub use config::{InvalidTaskPolicy, RankingConfig, ScoringWeights, Strategy};
pub use cycles::find_cycles;
pub use error::RankingError;
pub use index::TaskIndex;
pub use models::{ScoredTask, Task, TaskRecord};
pub use pipeline::{rank, rank_index, suggest, SUGGEST_TOP_K};
pub use scoring::{score_task, PriorityScorer, ScoreFactors, TaskScore};

pyo3::create_exception!(
    rust,
    CircularDependencyError,
    pyo3::exceptions::PyValueError,
    "Raised with (message, cycles) when the dependency graph has cycles."
);

impl From<RankingError> for PyErr {
    fn from(err: RankingError) -> Self {
        match err {
            RankingError::CircularDependencies { ref cycles } => {
                CircularDependencyError::new_err((err.to_string(), cycles.clone()))
            }
            other => pyo3::exceptions::PyValueError::new_err(other.to_string()),
        }
    }
}

/// Resolve the config for a Python call: defaults measure urgency from today.
fn resolve_config(config: Option<RankingConfig>, strategy: Option<&str>) -> PyResult<RankingConfig> {
    let mut config = config.unwrap_or_else(|| RankingConfig::for_date(today()));
    if let Some(strategy) = strategy {
        config.strategy = strategy.parse()?;
    }
    Ok(config)
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Rank tasks by priority.
///
/// # Arguments
/// * `tasks` - Task records; dependency ids refer to other records in the list
/// * `config` - Ranking configuration (defaults: balanced, measured from today)
/// * `strategy` - Overrides the config's strategy when given
///
/// # Returns
/// * List of ScoredTask sorted by descending score (ties keep input order)
///
/// # Raises
/// * CircularDependencyError with every cycle if the dependency graph is cyclic
/// * ValueError for invalid task attributes, duplicate ids or unknown strategies
#[pyfunction]
#[pyo3(signature = (tasks, config=None, strategy=None))]
fn rank_tasks(
    tasks: Vec<TaskRecord>,
    config: Option<RankingConfig>,
    strategy: Option<&str>,
) -> PyResult<Vec<ScoredTask>> {
    let config = resolve_config(config, strategy)?;
    Ok(rank(&tasks, &config)?)
}

/// Suggest the top three tasks to work on, each with a one-line reason.
///
/// Raises the same errors as `rank_tasks`.
#[pyfunction]
#[pyo3(signature = (tasks, config=None, strategy=None))]
fn suggest_tasks(
    tasks: Vec<TaskRecord>,
    config: Option<RankingConfig>,
    strategy: Option<&str>,
) -> PyResult<Vec<ScoredTask>> {
    let config = resolve_config(config, strategy)?;
    Ok(suggest(&tasks, &config)?)
}

/// Every cycle in an adjacency list of `(task_id, dependency_ids)` pairs.
#[pyfunction]
#[pyo3(name = "find_cycles")]
fn py_find_cycles(adjacency: Vec<(String, Vec<String>)>) -> Vec<Vec<String>> {
    find_cycles(&adjacency)
}

/// Names accepted for the `strategy` argument.
#[pyfunction]
fn strategies() -> Vec<&'static str> {
    Strategy::ALL.iter().map(|s| s.as_str()).collect()
}

/// The taskrank.rust Python module.
#[pymodule]
fn rust(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Core data types
    m.add_class::<TaskRecord>()?;
    m.add_class::<Task>()?;
    m.add_class::<ScoredTask>()?;

    // Config types
    m.add_class::<ScoringWeights>()?;
    m.add_class::<RankingConfig>()?;

    m.add(
        "CircularDependencyError",
        m.py().get_type_bound::<CircularDependencyError>(),
    )?;

    // Algorithms
    m.add_function(wrap_pyfunction!(rank_tasks, m)?)?;
    m.add_function(wrap_pyfunction!(suggest_tasks, m)?)?;
    m.add_function(wrap_pyfunction!(py_find_cycles, m)?)?;
    m.add_function(wrap_pyfunction!(strategies, m)?)?;

    Ok(())
}
