//! Configuration types for the ranking engine.

use chrono::NaiveDate;
use pyo3::prelude::*;
use std::fmt;
use std::str::FromStr;

use crate::error::RankingError;

/// Scoring formula selected for a ranking run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Strategy {
    /// Weighted blend of urgency, importance, effort and fan-out, plus a
    /// small bonus propagated from dependencies.
    #[default]
    Balanced,
    /// Smallest estimated effort first.
    Fastest,
    /// Raw importance.
    Impact,
    /// Urgency only.
    Deadline,
    /// Integer points per factor, no propagation.
    Additive,
}

impl Strategy {
    pub const ALL: [Strategy; 5] = [
        Strategy::Balanced,
        Strategy::Fastest,
        Strategy::Impact,
        Strategy::Deadline,
        Strategy::Additive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Balanced => "balanced",
            Self::Fastest => "fastest",
            Self::Impact => "impact",
            Self::Deadline => "deadline",
            Self::Additive => "additive",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = RankingError;

    /// Accepts the canonical names as well as the product labels shown in
    /// the task dashboard ("Smart Balance", "Fastest Wins", ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "balanced" | "smart balance" => Ok(Self::Balanced),
            "fastest" | "fastest wins" => Ok(Self::Fastest),
            "impact" | "high impact" => Ok(Self::Impact),
            "deadline" | "deadline driven" => Ok(Self::Deadline),
            "additive" => Ok(Self::Additive),
            _ => Err(RankingError::UnknownStrategy(s.to_string())),
        }
    }
}

/// Weights of the `balanced` strategy. They need not sum to 1.
#[pyclass]
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScoringWeights {
    /// Weight of the urgency factor (`w_u`)
    #[pyo3(get, set)]
    pub urgency: f64,
    /// Weight of the normalized importance (`w_i`)
    #[pyo3(get, set)]
    pub importance: f64,
    /// Weight of the effort factor (`w_e`)
    #[pyo3(get, set)]
    pub effort: f64,
    /// Weight of the normalized fan-out (`w_d`)
    #[pyo3(get, set)]
    pub dependency: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            urgency: 0.4,
            importance: 0.3,
            effort: 0.2,
            dependency: 0.1,
        }
    }
}

#[pymethods]
impl ScoringWeights {
    #[new]
    #[pyo3(signature = (urgency=None, importance=None, effort=None, dependency=None))]
    fn new(
        urgency: Option<f64>,
        importance: Option<f64>,
        effort: Option<f64>,
        dependency: Option<f64>,
    ) -> Self {
        let defaults = Self::default();
        Self {
            urgency: urgency.unwrap_or(defaults.urgency),
            importance: importance.unwrap_or(defaults.importance),
            effort: effort.unwrap_or(defaults.effort),
            dependency: dependency.unwrap_or(defaults.dependency),
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "ScoringWeights(urgency={}, importance={}, effort={}, dependency={})",
            self.urgency, self.importance, self.effort, self.dependency
        )
    }
}

/// What the pipeline does with a record that fails attribute validation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InvalidTaskPolicy {
    /// Fail the whole run.
    #[default]
    Abort,
    /// Drop the record. Dependencies on it then behave as dangling references.
    Skip,
}

impl FromStr for InvalidTaskPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "abort" => Ok(Self::Abort),
            "skip" => Ok(Self::Skip),
            _ => Err(format!("Unknown invalid task policy: {}", s)),
        }
    }
}

/// Configuration for one ranking run.
#[pyclass]
#[derive(Clone, Debug)]
pub struct RankingConfig {
    pub strategy: Strategy,
    #[pyo3(get, set)]
    pub weights: ScoringWeights,
    /// The day urgency is measured from.
    #[pyo3(get, set)]
    pub reference_date: NaiveDate,
    /// Keep only the first `top_k` results and give each a `why` line.
    #[pyo3(get, set)]
    pub top_k: Option<usize>,
    pub invalid_task_policy: InvalidTaskPolicy,
    /// Score completed tasks as part of the graph but leave them out of the output.
    #[pyo3(get, set)]
    pub exclude_completed: bool,
    /// Verbosity level: 0=silent, 1=changes, 2=checks, 3=debug.
    #[pyo3(get, set)]
    pub verbosity: u8,
}

impl RankingConfig {
    /// Default configuration measuring urgency from `reference_date`.
    pub fn for_date(reference_date: NaiveDate) -> Self {
        Self {
            strategy: Strategy::default(),
            weights: ScoringWeights::default(),
            reference_date,
            top_k: None,
            invalid_task_policy: InvalidTaskPolicy::default(),
            exclude_completed: false,
            verbosity: 0,
        }
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_weights(mut self, weights: ScoringWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }
}

#[pymethods]
impl RankingConfig {
    #[new]
    #[pyo3(signature = (
        reference_date,
        strategy="balanced",
        weights=None,
        top_k=None,
        invalid_task_policy="abort",
        exclude_completed=false,
        verbosity=0
    ))]
    #[allow(clippy::too_many_arguments)]
    fn py_new(
        reference_date: NaiveDate,
        strategy: &str,
        weights: Option<ScoringWeights>,
        top_k: Option<usize>,
        invalid_task_policy: &str,
        exclude_completed: bool,
        verbosity: u8,
    ) -> PyResult<Self> {
        Ok(Self {
            strategy: strategy.parse()?,
            weights: weights.unwrap_or_default(),
            reference_date,
            top_k,
            invalid_task_policy: invalid_task_policy
                .parse()
                .map_err(pyo3::exceptions::PyValueError::new_err)?,
            exclude_completed,
            verbosity,
        })
    }

    #[getter(strategy)]
    fn py_strategy(&self) -> &'static str {
        self.strategy.as_str()
    }

    #[setter(strategy)]
    fn py_set_strategy(&mut self, strategy: &str) -> PyResult<()> {
        self.strategy = strategy.parse()?;
        Ok(())
    }

    #[getter(invalid_task_policy)]
    fn py_invalid_task_policy(&self) -> &'static str {
        match self.invalid_task_policy {
            InvalidTaskPolicy::Abort => "abort",
            InvalidTaskPolicy::Skip => "skip",
        }
    }

    #[setter(invalid_task_policy)]
    fn py_set_invalid_task_policy(&mut self, policy: &str) -> PyResult<()> {
        self.invalid_task_policy = policy
            .parse()
            .map_err(pyo3::exceptions::PyValueError::new_err)?;
        Ok(())
    }

    fn __repr__(&self) -> String {
        format!(
            "RankingConfig(strategy={:?}, reference_date={}, top_k={:?})",
            self.strategy.as_str(),
            self.reference_date,
            self.top_k
        )
    }
}
