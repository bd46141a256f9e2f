//! Read-only, per-run index of tasks.

use crate::cycles::{detect_cycles, resolve_cycle};
use crate::error::RankingError;
use crate::interner::{TaskIdInt, TaskIdInterner};
use crate::models::{Task, TaskRecord};
use rustc_hash::FxHashSet;

/// Immutable mapping from task id to task, built once per ranking run.
///
/// Tasks keep their declaration order. Dependencies are resolved to
/// interned ids up front: dangling ids are dropped and repeated ids are
/// kept once, so traversal and fan-out never see them.
#[derive(Debug, Clone, Default)]
pub struct TaskIndex {
    ids: TaskIdInterner,
    tasks: Vec<Task>,
    /// Resolved dependencies, indexed by interned id.
    deps: Vec<Vec<TaskIdInt>>,
    /// Number of tasks depending on each task, indexed by interned id.
    fan_out: Vec<usize>,
}

impl TaskIndex {
    /// Build an index from validated tasks.
    ///
    /// Fails with `DuplicateTaskId` if two tasks share an id.
    pub fn new(tasks: Vec<Task>) -> Result<Self, RankingError> {
        let mut ids = TaskIdInterner::with_capacity(tasks.len());
        for task in &tasks {
            if ids.intern_unique(&task.id).is_none() {
                return Err(RankingError::DuplicateTaskId(task.id.clone()));
            }
        }

        let mut deps: Vec<Vec<TaskIdInt>> = Vec::with_capacity(tasks.len());
        let mut fan_out = vec![0usize; tasks.len()];
        for (own, task) in tasks.iter().enumerate() {
            let resolved = resolve_dependencies(&ids, &task.dependencies);
            // A self-reference is a cycle, not a dependent
            for &dep_id in resolved.iter().filter(|&&dep_id| dep_id as usize != own) {
                fan_out[dep_id as usize] += 1;
            }
            deps.push(resolved);
        }

        Ok(Self {
            ids,
            tasks,
            deps,
            fan_out,
        })
    }

    /// Validate caller records and build an index from them.
    ///
    /// Records without an id get their 1-based position.
    pub fn from_records(records: &[TaskRecord]) -> Result<Self, RankingError> {
        let tasks = records
            .iter()
            .enumerate()
            .map(|(i, record)| Task::from_record(record, i + 1))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(tasks)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Tasks in declaration order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.ids.get(id).map(|i| &self.tasks[i as usize])
    }

    /// Number of other tasks in the index that declare `id` as a dependency.
    ///
    /// Ids not in the index have no fan-out.
    pub fn fan_out(&self, id: &str) -> usize {
        self.ids
            .get(id)
            .map_or(0, |i| self.fan_out[i as usize])
    }

    /// Adjacency view `(task id, declared dependency ids)` in declaration order.
    pub fn adjacency(&self) -> Vec<(String, Vec<String>)> {
        self.tasks
            .iter()
            .map(|task| (task.id.clone(), task.dependencies.clone()))
            .collect()
    }

    /// Every cycle in the dependency graph, empty when acyclic.
    pub fn find_cycles(&self) -> Vec<Vec<String>> {
        detect_cycles(&self.deps)
            .into_iter()
            .map(|cycle| resolve_cycle(&self.ids, &cycle))
            .collect()
    }

    #[inline]
    pub(crate) fn id_of(&self, id: &str) -> Option<TaskIdInt> {
        self.ids.get(id)
    }

    #[inline]
    pub(crate) fn task_at(&self, id: TaskIdInt) -> &Task {
        &self.tasks[id as usize]
    }

    /// Resolved dependencies of an indexed task.
    #[inline]
    pub(crate) fn deps_of(&self, id: TaskIdInt) -> &[TaskIdInt] {
        &self.deps[id as usize]
    }

    /// Resolve a declared dependency list against this index.
    pub(crate) fn resolve(&self, dependencies: &[String]) -> Vec<TaskIdInt> {
        resolve_dependencies(&self.ids, dependencies)
    }
}

/// Interned ids of the dependencies that exist, each once, in declaration order.
fn resolve_dependencies(ids: &TaskIdInterner, dependencies: &[String]) -> Vec<TaskIdInt> {
    let mut seen: FxHashSet<TaskIdInt> = FxHashSet::default();
    dependencies
        .iter()
        .filter_map(|dep| ids.get(dep))
        .filter(|&dep_id| seen.insert(dep_id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_task(id: &str, deps: &[&str]) -> Task {
        Task {
            id: id.to_string(),
            title: format!("task {}", id),
            due_date: None,
            estimated_hours: 1.0,
            importance: 5,
            dependencies: deps.iter().map(|d| d.to_string()).collect(),
            completed: false,
        }
    }

    #[test]
    fn test_lookup_and_order() {
        let index = TaskIndex::new(vec![make_task("b", &[]), make_task("a", &["b"])]).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.tasks()[0].id, "b");
        assert_eq!(index.get("a").map(|t| t.id.as_str()), Some("a"));
        assert!(index.get("zzz").is_none());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let err = TaskIndex::new(vec![make_task("a", &[]), make_task("a", &[])]).unwrap_err();
        assert_eq!(err, RankingError::DuplicateTaskId("a".to_string()));
    }

    #[test]
    fn test_fan_out_counts_dependents() {
        let index = TaskIndex::new(vec![
            make_task("a", &[]),
            make_task("b", &["a"]),
            make_task("c", &["a", "b"]),
        ])
        .unwrap();
        assert_eq!(index.fan_out("a"), 2);
        assert_eq!(index.fan_out("b"), 1);
        assert_eq!(index.fan_out("c"), 0);
    }

    #[test]
    fn test_repeated_dependency_counts_once() {
        let index =
            TaskIndex::new(vec![make_task("a", &[]), make_task("b", &["a", "a"])]).unwrap();
        assert_eq!(index.fan_out("a"), 1);
        let b = index.id_of("b").unwrap();
        assert_eq!(index.deps_of(b).len(), 1);
    }

    #[test]
    fn test_self_reference_not_counted_as_dependent() {
        let index =
            TaskIndex::new(vec![make_task("a", &["a"]), make_task("b", &["a"])]).unwrap();
        assert_eq!(index.fan_out("a"), 1);
        // Still kept as an edge so the cycle is found
        let a = index.id_of("a").unwrap();
        assert_eq!(index.deps_of(a), &[a]);
        assert_eq!(index.find_cycles(), vec![vec!["a".to_string()]]);
    }

    #[test]
    fn test_dangling_dependency_ignored() {
        let index = TaskIndex::new(vec![make_task("a", &["ghost"])]).unwrap();
        assert_eq!(index.fan_out("ghost"), 0);
        assert!(index.deps_of(index.id_of("a").unwrap()).is_empty());
        assert!(index.resolve(&["ghost".to_string()]).is_empty());
        // The declared list is left untouched
        assert_eq!(index.get("a").unwrap().dependencies, vec!["ghost"]);
    }

    #[test]
    fn test_from_records_assigns_positions() {
        let records = vec![
            TaskRecord {
                title: "first".into(),
                estimated_hours: 1.0,
                importance: 3,
                ..Default::default()
            },
            TaskRecord {
                title: "second".into(),
                estimated_hours: 1.0,
                importance: 3,
                dependencies: vec!["1".into()],
                ..Default::default()
            },
        ];
        let index = TaskIndex::from_records(&records).unwrap();
        assert_eq!(index.tasks()[0].id, "1");
        assert_eq!(index.tasks()[1].id, "2");
        assert_eq!(index.fan_out("1"), 1);
    }

    #[test]
    fn test_find_cycles_matches_adjacency_view() {
        let index = TaskIndex::new(vec![
            make_task("a", &["b"]),
            make_task("b", &["c"]),
            make_task("c", &["a"]),
        ])
        .unwrap();
        assert_eq!(index.find_cycles(), crate::cycles::find_cycles(&index.adjacency()));
        assert_eq!(index.find_cycles().len(), 1);
    }
}
