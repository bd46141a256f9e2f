//! Priority scoring strategies.
//!
//! Shared factors, measured against an explicit reference date:
//! - urgency: 0 without a due date, 1 when past due, else `1 / (days_left + 1)`
//! - importance: `importance / 10`
//! - effort: `1 / (estimated_hours + 1)`
//! - fan-out: other tasks depending on this one, normalized by `len(index) + 1`
//!
//! `balanced` also adds `0.05 ×` the score of each direct dependency,
//! walked with an explicit stack. The walk tracks the ids on the current
//! path and a dependency already on it contributes 0, so scoring terminates
//! even on a graph that was never validated. That guard is a fallback: the pipeline rejects
//! cyclic graphs before any score is computed.

use chrono::NaiveDate;
use rustc_hash::FxHashSet;

use crate::config::{ScoringWeights, Strategy};
use crate::error::RankingError;
use crate::index::TaskIndex;
use crate::interner::TaskIdInt;
use crate::log_checks;
use crate::models::Task;

/// Added to the hours divisor of `fastest` so zero-effort tasks stay finite.
pub const FASTEST_EPSILON: f64 = 1e-4;

/// Share of each direct dependency's score added by `balanced`.
pub const PROPAGATION_FACTOR: f64 = 0.05;

/// Round a score to 4 decimal places.
#[inline]
pub fn round_score(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Days from `reference_date` until `due_date`, negative when past due.
pub fn days_left(due_date: Option<NaiveDate>, reference_date: NaiveDate) -> Option<i64> {
    due_date.map(|due| (due - reference_date).num_days())
}

/// Urgency in `[0, 1]`.
///
/// Past-due tasks get maximal urgency; otherwise urgency falls off as
/// `1 / (days_left + 1)`.
pub fn compute_urgency(due_date: Option<NaiveDate>, reference_date: NaiveDate) -> f64 {
    match days_left(due_date, reference_date) {
        None => 0.0,
        Some(days) if days < 0 => 1.0,
        Some(days) => 1.0 / (days as f64 + 1.0),
    }
}

/// Per-task inputs shared by every strategy.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoreFactors {
    pub days_left: Option<i64>,
    pub urgency: f64,
    pub importance_norm: f64,
    pub effort: f64,
    pub fan_out: usize,
    pub fan_out_norm: f64,
}

impl ScoreFactors {
    pub fn compute(task: &Task, index: &TaskIndex, reference_date: NaiveDate) -> Self {
        let fan_out = index.fan_out(&task.id);
        Self {
            days_left: days_left(task.due_date, reference_date),
            urgency: compute_urgency(task.due_date, reference_date),
            importance_norm: task.importance as f64 / 10.0,
            effort: 1.0 / (task.estimated_hours + 1.0),
            fan_out,
            fan_out_norm: fan_out as f64 / (index.len() as f64 + 1.0),
        }
    }
}

/// A computed score and the lines explaining it.
#[derive(Clone, Debug, PartialEq)]
pub struct TaskScore {
    /// Rounded to 4 decimal places.
    pub score: f64,
    pub explanation: Vec<String>,
}

/// A dependency whose own dependencies are still being scored.
#[derive(Clone, Copy)]
struct Frame {
    id: TaskIdInt,
    next: usize,
    base: f64,
    bonus: f64,
    truncated: bool,
}

/// Scores tasks of one index under one strategy.
///
/// `balanced` propagation walks dependencies with an explicit stack, so long
/// chains cannot overflow the call stack. Dependency scores are memoized for
/// the lifetime of the scorer. Only results whose subtree never hit the
/// call-path guard are cached, since those do not depend on the path they
/// were reached from.
pub struct PriorityScorer<'a> {
    index: &'a TaskIndex,
    strategy: Strategy,
    weights: ScoringWeights,
    reference_date: NaiveDate,
    verbosity: u8,
    memo: Vec<Option<f64>>,
}

impl<'a> PriorityScorer<'a> {
    pub fn new(
        index: &'a TaskIndex,
        strategy: Strategy,
        weights: ScoringWeights,
        reference_date: NaiveDate,
    ) -> Self {
        Self {
            index,
            strategy,
            weights,
            reference_date,
            verbosity: 0,
            memo: vec![None; index.len()],
        }
    }

    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Score `task` against the index.
    ///
    /// Fails with `InvalidTaskAttribute` if `task`, or a dependency reached
    /// by `balanced` propagation, has out-of-domain fields.
    pub fn score(&mut self, task: &Task) -> Result<TaskScore, RankingError> {
        task.validate()?;
        let factors = ScoreFactors::compute(task, self.index, self.reference_date);

        let (raw, explanation) = match self.strategy {
            Strategy::Deadline => {
                let value = factors.urgency * 10.0;
                (value, vec![explain_urgency(&factors, value)])
            }
            Strategy::Impact => {
                let value = task.importance as f64;
                (value, vec![explain_importance(task, factors.importance_norm, value)])
            }
            Strategy::Fastest => {
                let value = 1.0 / (task.estimated_hours + FASTEST_EPSILON);
                (
                    value,
                    vec![format!(
                        "Effort: {} hour(s) → +{:.4}",
                        task.estimated_hours, value
                    )],
                )
            }
            Strategy::Balanced => {
                let base = self.weighted_sum(&factors);
                let bonus = self.propagate(task)?;
                (base + bonus, self.explain_balanced(task, &factors, bonus))
            }
            Strategy::Additive => additive_score(task, &factors),
        };

        Ok(TaskScore {
            score: round_score(raw),
            explanation,
        })
    }

    fn weighted_sum(&self, factors: &ScoreFactors) -> f64 {
        let w = &self.weights;
        w.urgency * factors.urgency
            + w.importance * factors.importance_norm
            + w.effort * factors.effort
            + w.dependency * factors.fan_out_norm
    }

    /// Sum of `PROPAGATION_FACTOR × score(dep)` over the direct dependencies
    /// of a top-level `task`.
    fn propagate(&mut self, task: &Task) -> Result<f64, RankingError> {
        let index = self.index;
        let own = index.id_of(&task.id);
        // An indexed task carries its resolved list, anything else is resolved here
        let deps: Vec<TaskIdInt> = match own {
            Some(id) if index.task_at(id).dependencies == task.dependencies => {
                index.deps_of(id).to_vec()
            }
            _ => index.resolve(&task.dependencies),
        };

        let mut path: FxHashSet<TaskIdInt> = FxHashSet::default();
        path.extend(own);

        let mut bonus = 0.0;
        for dep in deps {
            if path.contains(&dep) {
                self.log_cut(dep, &task.id);
                continue;
            }
            bonus += PROPAGATION_FACTOR * self.score_dependency(dep, &mut path)?;
        }
        Ok(bonus)
    }

    /// Rounded `balanced` score of an indexed dependency, including the
    /// bonus from its own dependencies. `path` holds the ids on the current
    /// path from the top-level task and is restored on success.
    fn score_dependency(
        &mut self,
        start: TaskIdInt,
        path: &mut FxHashSet<TaskIdInt>,
    ) -> Result<f64, RankingError> {
        if let Some(score) = self.memo[start as usize] {
            return Ok(score);
        }

        let index = self.index;
        let mut frames = vec![self.enter(start, path)?];
        let mut score = 0.0;

        while let Some(frame) = frames.last_mut() {
            if let Some(&dep) = index.deps_of(frame.id).get(frame.next) {
                frame.next += 1;
                if path.contains(&dep) {
                    frame.truncated = true;
                    self.log_cut(dep, &index.task_at(frame.id).id);
                } else if let Some(dep_score) = self.memo[dep as usize] {
                    frame.bonus += PROPAGATION_FACTOR * dep_score;
                } else {
                    let child = self.enter(dep, path)?;
                    frames.push(child);
                }
                continue;
            }

            // All dependencies of the top frame are scored
            let done = *frame;
            frames.pop();
            path.remove(&done.id);
            score = round_score(done.base + done.bonus);
            if !done.truncated {
                self.memo[done.id as usize] = Some(score);
            }
            if let Some(parent) = frames.last_mut() {
                parent.bonus += PROPAGATION_FACTOR * score;
                parent.truncated |= done.truncated;
            }
        }

        Ok(score)
    }

    /// Validate an indexed task, compute its base score and put it on the path.
    fn enter(
        &self,
        id: TaskIdInt,
        path: &mut FxHashSet<TaskIdInt>,
    ) -> Result<Frame, RankingError> {
        let task = self.index.task_at(id);
        task.validate()?;
        let factors = ScoreFactors::compute(task, self.index, self.reference_date);
        path.insert(id);
        Ok(Frame {
            id,
            next: 0,
            base: self.weighted_sum(&factors),
            bonus: 0.0,
            truncated: false,
        })
    }

    fn log_cut(&self, dep: TaskIdInt, parent: &str) {
        log_checks!(
            self.verbosity,
            "Dependency {} of {} is already on the scoring path, contributing 0",
            self.index.task_at(dep).id,
            parent
        );
    }

    fn explain_balanced(&self, task: &Task, factors: &ScoreFactors, bonus: f64) -> Vec<String> {
        let w = &self.weights;
        let mut dependency = format!(
            "Dependencies: blocks {} task(s) ({:.4}) → +{:.4}",
            factors.fan_out,
            factors.fan_out_norm,
            w.dependency * factors.fan_out_norm
        );
        if bonus != 0.0 {
            dependency.push_str(&format!("; upstream bonus +{:.4}", bonus));
        }
        vec![
            explain_urgency(factors, w.urgency * factors.urgency),
            explain_importance(task, factors.importance_norm, w.importance * factors.importance_norm),
            format!(
                "Effort: {} hour(s) ({:.4}) → +{:.4}",
                task.estimated_hours,
                factors.effort,
                w.effort * factors.effort
            ),
            dependency,
        ]
    }
}

/// Score a single task. Shorthand for a one-off `PriorityScorer`.
pub fn score_task(
    task: &Task,
    index: &TaskIndex,
    strategy: Strategy,
    weights: &ScoringWeights,
    reference_date: NaiveDate,
) -> Result<TaskScore, RankingError> {
    PriorityScorer::new(index, strategy, *weights, reference_date).score(task)
}

/// Integer points per factor. Urgency is only counted with a due date and
/// effort only with positive hours.
fn additive_score(task: &Task, factors: &ScoreFactors) -> (f64, Vec<String>) {
    let mut score = 0.0;
    let mut explanation = Vec::with_capacity(4);

    if let Some(days) = factors.days_left {
        let points = (10.0 - days as f64).max(0.0);
        score += points;
        explanation.push(format!(
            "Urgency: {} → +{}",
            describe_due(Some(days)),
            points
        ));
    }

    let points = task.importance as f64 * 2.0;
    score += points;
    explanation.push(format!("Importance: {}/10 → +{}", task.importance, points));

    if task.estimated_hours > 0.0 {
        let points = (10.0 - task.estimated_hours).max(0.0);
        score += points;
        explanation.push(format!(
            "Effort: {} hour(s) → +{}",
            task.estimated_hours, points
        ));
    }

    let points = factors.fan_out as f64 * 3.0;
    score += points;
    explanation.push(format!(
        "Dependencies: blocks {} task(s) → +{}",
        factors.fan_out, points
    ));

    (score, explanation)
}

fn describe_due(days_left: Option<i64>) -> String {
    match days_left {
        None => "no due date".to_string(),
        Some(0) => "due today".to_string(),
        Some(days) if days < 0 => format!("overdue by {} day(s)", -days),
        Some(days) => format!("due in {} day(s)", days),
    }
}

fn explain_urgency(factors: &ScoreFactors, contribution: f64) -> String {
    format!(
        "Urgency: {} ({:.4}) → +{:.4}",
        describe_due(factors.days_left),
        factors.urgency,
        contribution
    )
}

fn explain_importance(task: &Task, normalized: f64, contribution: f64) -> String {
    format!(
        "Importance: {}/10 ({:.4}) → +{:.4}",
        task.importance, normalized, contribution
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn today() -> NaiveDate {
        make_date(2025, 1, 1)
    }

    fn make_task(
        id: &str,
        due_in: Option<i64>,
        importance: i32,
        hours: f64,
        deps: &[&str],
    ) -> Task {
        Task {
            id: id.to_string(),
            title: format!("task {}", id),
            due_date: due_in.map(|d| today() + chrono::Duration::days(d)),
            estimated_hours: hours,
            importance,
            dependencies: deps.iter().map(|d| d.to_string()).collect(),
            completed: false,
        }
    }

    fn index_of(tasks: Vec<Task>) -> TaskIndex {
        TaskIndex::new(tasks).unwrap()
    }

    fn score(task: &Task, index: &TaskIndex, strategy: Strategy) -> TaskScore {
        score_task(task, index, strategy, &ScoringWeights::default(), today()).unwrap()
    }

    #[test]
    fn test_urgency_past_due_is_max() {
        for days in 1..30 {
            let due = today() - chrono::Duration::days(days);
            assert_eq!(compute_urgency(Some(due), today()), 1.0);
        }
    }

    #[test]
    fn test_urgency_strictly_decreasing() {
        let mut previous = f64::INFINITY;
        for days in 0..365 {
            let due = today() + chrono::Duration::days(days);
            let urgency = compute_urgency(Some(due), today());
            assert!(urgency < previous);
            previous = urgency;
        }
    }

    #[test]
    fn test_urgency_without_due_date() {
        assert_eq!(compute_urgency(None, today()), 0.0);
    }

    #[test]
    fn test_balanced_reference_scenario() {
        let a = make_task("a", Some(0), 10, 1.0, &[]);
        let b = make_task("b", Some(30), 1, 100.0, &[]);
        let index = index_of(vec![a.clone(), b.clone()]);

        assert_eq!(score(&a, &index, Strategy::Balanced).score, 0.8);
        assert_eq!(score(&b, &index, Strategy::Balanced).score, 0.0449);
    }

    #[test]
    fn test_doubling_importance_increases_balanced_score() {
        for importance in 1..=5 {
            let low = make_task("a", Some(5), importance, 3.0, &[]);
            let high = make_task("a", Some(5), importance * 2, 3.0, &[]);
            let low_score = score(&low, &index_of(vec![low.clone()]), Strategy::Balanced);
            let high_score = score(&high, &index_of(vec![high.clone()]), Strategy::Balanced);
            assert!(high_score.score > low_score.score);
        }
    }

    #[test]
    fn test_fan_out_raises_balanced_score() {
        let a = make_task("a", None, 5, 1.0, &[]);
        let lonely = index_of(vec![a.clone(), make_task("b", None, 5, 1.0, &[])]);
        let blocking = index_of(vec![a.clone(), make_task("b", None, 5, 1.0, &["a"])]);
        assert!(
            score(&a, &blocking, Strategy::Balanced).score
                > score(&a, &lonely, Strategy::Balanced).score
        );
    }

    #[test]
    fn test_dangling_dependency_contributes_nothing() {
        let with_ghost = make_task("a", None, 5, 1.0, &["ghost"]);
        let plain = make_task("a", None, 5, 1.0, &[]);
        let index = index_of(vec![with_ghost.clone()]);
        assert_eq!(index.fan_out("ghost"), 0);
        assert_eq!(
            score(&with_ghost, &index, Strategy::Balanced).score,
            score(&plain, &index_of(vec![plain.clone()]), Strategy::Balanced).score
        );
    }

    #[test]
    fn test_balanced_propagates_dependency_scores() {
        // b: 0.15 + 0.1 + 0.1 * 1/3 = 0.2833
        // a: 0.15 + 0.1 + 0.05 * 0.2833 = 0.2642
        let a = make_task("a", None, 5, 1.0, &["b"]);
        let b = make_task("b", None, 5, 1.0, &[]);
        let index = index_of(vec![a.clone(), b.clone()]);

        assert_eq!(score(&b, &index, Strategy::Balanced).score, 0.2833);
        let result = score(&a, &index, Strategy::Balanced);
        assert_eq!(result.score, 0.2642);
        assert!(result.explanation[3].contains("upstream bonus +0.0142"));
    }

    #[test]
    fn test_custom_weights_apply_to_balanced_only() {
        let a = make_task("a", Some(0), 10, 1.0, &[]);
        let index = index_of(vec![a.clone()]);
        let weights = ScoringWeights {
            urgency: 1.0,
            importance: 1.0,
            effort: 0.0,
            dependency: 0.0,
        };
        let balanced = score_task(&a, &index, Strategy::Balanced, &weights, today()).unwrap();
        assert_eq!(balanced.score, 2.0);
        let impact = score_task(&a, &index, Strategy::Impact, &weights, today()).unwrap();
        assert_eq!(impact.score, 10.0);
    }

    #[test]
    fn test_unvalidated_cycle_contributes_zero() {
        // b: 0.15 + 0.1 + 0.1 * 1/3 = 0.2833 (its edge back to a is cut)
        // a: 0.2833 + 0.05 * 0.2833 = 0.2975
        let a = make_task("a", None, 5, 1.0, &["b"]);
        let b = make_task("b", None, 5, 1.0, &["a"]);
        let index = index_of(vec![a.clone(), b]);
        assert_eq!(score(&a, &index, Strategy::Balanced).score, 0.2975);
    }

    #[test]
    fn test_self_reference_contributes_zero() {
        // 0.15 + 0.1, no fan-out and no bonus from itself
        let a = make_task("a", None, 5, 1.0, &["a"]);
        let index = index_of(vec![a.clone()]);
        let result = score(&a, &index, Strategy::Balanced);
        assert_eq!(result.score, 0.25);
        assert!(result.explanation[3].starts_with("Dependencies: blocks 0 task(s)"));
    }

    #[test]
    fn test_unindexed_task_resolves_its_own_dependencies() {
        // Same id as an indexed task but a different dependency list
        let indexed = make_task("a", None, 5, 1.0, &[]);
        let b = make_task("b", None, 5, 1.0, &[]);
        let index = index_of(vec![indexed, b]);
        let caller = make_task("a", None, 5, 1.0, &["b", "b", "ghost"]);
        // 0.25 + 0.05 * 0.25, b counted once
        assert_eq!(score(&caller, &index, Strategy::Balanced).score, 0.2625);
    }

    #[test]
    fn test_deep_unvalidated_chain_does_not_overflow() {
        let n = 100_000;
        let tasks: Vec<Task> = (0..n)
            .map(|i| {
                let next = (i + 1).to_string();
                let deps: Vec<&str> = if i + 1 < n { vec![next.as_str()] } else { vec![] };
                make_task(&i.to_string(), None, 5, 1.0, &deps)
            })
            .collect();
        let index = index_of(tasks);
        let head = &index.tasks()[0];
        let result = score(head, &index, Strategy::Balanced);
        assert!(result.score > 0.25);
    }

    #[test]
    fn test_memoized_dependency_scores_match_fresh_ones() {
        let tasks = vec![
            make_task("d", Some(3), 7, 2.0, &["b", "c"]),
            make_task("b", Some(10), 4, 5.0, &["a"]),
            make_task("c", None, 6, 1.0, &["a"]),
            make_task("a", Some(1), 9, 8.0, &[]),
        ];
        let index = index_of(tasks.clone());
        let mut shared =
            PriorityScorer::new(&index, Strategy::Balanced, ScoringWeights::default(), today());
        for task in index.tasks() {
            let fresh = score(task, &index, Strategy::Balanced);
            assert_eq!(shared.score(task).unwrap(), fresh);
        }
    }

    #[test]
    fn test_deadline_strategy() {
        let index = index_of(vec![]);
        let overdue = make_task("a", Some(-2), 1, 50.0, &[]);
        let soon = make_task("b", Some(1), 1, 50.0, &[]);
        let none = make_task("c", None, 10, 0.0, &[]);
        assert_eq!(score(&overdue, &index, Strategy::Deadline).score, 10.0);
        assert_eq!(score(&soon, &index, Strategy::Deadline).score, 5.0);
        assert_eq!(score(&none, &index, Strategy::Deadline).score, 0.0);
    }

    #[test]
    fn test_impact_strategy_is_raw_importance() {
        let index = index_of(vec![]);
        for importance in [3, 9, 1] {
            let task = make_task("a", Some(0), importance, 4.0, &[]);
            assert_eq!(
                score(&task, &index, Strategy::Impact).score,
                importance as f64
            );
        }
    }

    #[test]
    fn test_fastest_strategy() {
        let index = index_of(vec![]);
        let zero = make_task("a", None, 5, 0.0, &[]);
        let two = make_task("b", None, 5, 2.0, &[]);
        assert_eq!(score(&zero, &index, Strategy::Fastest).score, 10_000.0);
        assert_eq!(score(&two, &index, Strategy::Fastest).score, 0.5);
    }

    #[test]
    fn test_additive_strategy() {
        // due in 3 days: 7, importance 6: 12, 4 hours: 6, one dependent: 3
        let a = make_task("a", Some(3), 6, 4.0, &[]);
        let b = make_task("b", None, 1, 0.0, &["a"]);
        let index = index_of(vec![a.clone(), b.clone()]);

        let result = score(&a, &index, Strategy::Additive);
        assert_eq!(result.score, 28.0);
        assert_eq!(
            result.explanation,
            vec![
                "Urgency: due in 3 day(s) → +7",
                "Importance: 6/10 → +12",
                "Effort: 4 hour(s) → +6",
                "Dependencies: blocks 1 task(s) → +3",
            ]
        );

        // No due date and zero hours: those factors are left out
        let result = score(&b, &index, Strategy::Additive);
        assert_eq!(result.score, 2.0);
        assert_eq!(result.explanation.len(), 2);
    }

    #[test]
    fn test_explanation_lists_active_factors_in_order() {
        let a = make_task("a", Some(2), 7, 3.0, &[]);
        let index = index_of(vec![a.clone()]);

        let balanced = score(&a, &index, Strategy::Balanced).explanation;
        assert_eq!(balanced.len(), 4);
        assert!(balanced[0].starts_with("Urgency: due in 2 day(s)"));
        assert!(balanced[1].starts_with("Importance: 7/10"));
        assert!(balanced[2].starts_with("Effort: 3 hour(s)"));
        assert!(balanced[3].starts_with("Dependencies: blocks 0 task(s)"));

        for (strategy, prefix) in [
            (Strategy::Deadline, "Urgency"),
            (Strategy::Impact, "Importance"),
            (Strategy::Fastest, "Effort"),
        ] {
            let lines = score(&a, &index, strategy).explanation;
            assert_eq!(lines.len(), 1);
            assert!(lines[0].starts_with(prefix));
        }
    }

    #[test]
    fn test_invalid_attributes_abort_scoring() {
        let index = index_of(vec![]);
        let negative = make_task("a", None, 5, -1.0, &[]);
        let too_important = make_task("b", None, 11, 1.0, &[]);
        for task in [&negative, &too_important] {
            let err = score_task(
                task,
                &index,
                Strategy::Balanced,
                &ScoringWeights::default(),
                today(),
            )
            .unwrap_err();
            assert_eq!(err.kind(), "invalid_task_attribute");
        }
    }

    #[test]
    fn test_round_score() {
        assert_eq!(round_score(0.044_883_6), 0.0449);
        assert_eq!(round_score(0.800_000_000_000_000_2), 0.8);
    }
}
