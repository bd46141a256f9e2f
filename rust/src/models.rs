//! Core data types for the ranking engine.

use chrono::NaiveDate;
use pyo3::prelude::*;

use crate::error::RankingError;

/// A task as supplied by the caller, before validation.
///
/// `id` may be absent; the pipeline then assigns the record's 1-based
/// position in the input.
#[pyclass]
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TaskRecord {
    #[pyo3(get, set)]
    #[cfg_attr(feature = "serde", serde(default))]
    pub id: Option<String>,
    #[pyo3(get, set)]
    #[cfg_attr(feature = "serde", serde(default))]
    pub title: String,
    #[pyo3(get, set)]
    #[cfg_attr(feature = "serde", serde(default))]
    pub due_date: Option<NaiveDate>,
    #[pyo3(get, set)]
    pub estimated_hours: f64,
    #[pyo3(get, set)]
    pub importance: i32,
    #[pyo3(get, set)]
    #[cfg_attr(feature = "serde", serde(default))]
    pub dependencies: Vec<String>,
    #[pyo3(get, set)]
    #[cfg_attr(feature = "serde", serde(default))]
    pub completed: bool,
}

#[pymethods]
impl TaskRecord {
    #[new]
    #[pyo3(signature = (
        title,
        estimated_hours,
        importance,
        dependencies=None,
        due_date=None,
        id=None,
        completed=false
    ))]
    fn new(
        title: String,
        estimated_hours: f64,
        importance: i32,
        dependencies: Option<Vec<String>>,
        due_date: Option<NaiveDate>,
        id: Option<String>,
        completed: bool,
    ) -> Self {
        Self {
            id,
            title,
            due_date,
            estimated_hours,
            importance,
            dependencies: dependencies.unwrap_or_default(),
            completed,
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "TaskRecord(id={:?}, title={:?}, importance={}, deps={})",
            self.id,
            self.title,
            self.importance,
            self.dependencies.len()
        )
    }
}

/// A validated task with a resolved id.
#[pyclass]
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Task {
    #[pyo3(get)]
    pub id: String,
    #[pyo3(get)]
    pub title: String,
    #[pyo3(get)]
    pub due_date: Option<NaiveDate>,
    #[pyo3(get)]
    pub estimated_hours: f64,
    #[pyo3(get)]
    pub importance: i32,
    #[pyo3(get)]
    pub dependencies: Vec<String>,
    #[pyo3(get)]
    pub completed: bool,
}

impl Task {
    /// Lowest accepted importance.
    pub const MIN_IMPORTANCE: i32 = 1;
    /// Highest accepted importance.
    pub const MAX_IMPORTANCE: i32 = 10;

    /// Validate a caller record and give it an id.
    ///
    /// `position` is the 1-based position of the record in the input and is
    /// only used when the record carries no id of its own.
    pub fn from_record(record: &TaskRecord, position: usize) -> Result<Self, RankingError> {
        let task = Self {
            id: record
                .id
                .clone()
                .unwrap_or_else(|| position.to_string()),
            title: record.title.clone(),
            due_date: record.due_date,
            estimated_hours: record.estimated_hours,
            importance: record.importance,
            dependencies: record.dependencies.clone(),
            completed: record.completed,
        };
        task.validate()?;
        Ok(task)
    }

    /// Check the numeric fields against their domains.
    pub fn validate(&self) -> Result<(), RankingError> {
        if !self.estimated_hours.is_finite() || self.estimated_hours < 0.0 {
            return Err(RankingError::InvalidTaskAttribute {
                task_id: self.id.clone(),
                field: "estimated_hours",
                reason: format!(
                    "must be a finite non-negative number, got {}",
                    self.estimated_hours
                ),
            });
        }
        if !(Self::MIN_IMPORTANCE..=Self::MAX_IMPORTANCE).contains(&self.importance) {
            return Err(RankingError::InvalidTaskAttribute {
                task_id: self.id.clone(),
                field: "importance",
                reason: format!(
                    "must be between {} and {}, got {}",
                    Self::MIN_IMPORTANCE,
                    Self::MAX_IMPORTANCE,
                    self.importance
                ),
            });
        }
        Ok(())
    }
}

#[pymethods]
impl Task {
    fn __repr__(&self) -> String {
        format!(
            "Task(id={:?}, title={:?}, importance={}, deps={})",
            self.id,
            self.title,
            self.importance,
            self.dependencies.len()
        )
    }
}

/// A task together with its computed priority.
#[pyclass]
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScoredTask {
    #[pyo3(get)]
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub task: Task,
    /// Score rounded to 4 decimal places.
    #[pyo3(get)]
    pub score: f64,
    /// One line per factor used by the strategy.
    #[pyo3(get)]
    pub explanation: Vec<String>,
    /// One-line summary, only filled in top-K mode.
    #[pyo3(get)]
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub why: Option<String>,
}

#[pymethods]
impl ScoredTask {
    #[getter]
    fn id(&self) -> String {
        self.task.id.clone()
    }

    fn __repr__(&self) -> String {
        format!("ScoredTask(id={:?}, score={:.4})", self.task.id, self.score)
    }
}
