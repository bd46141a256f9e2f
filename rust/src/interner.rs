//! Dense integer ids for task id strings.
//!
//! Ids are handed out in first-seen order, so the integer id of a task is
//! also its declaration position. Graph traversal and fan-out counting work
//! on these integers instead of hashing strings.

use rustc_hash::FxHashMap;

/// Interned task id. Doubles as an index into per-task vectors.
pub type TaskIdInt = u32;

/// Maps task id strings to dense integers and back.
#[derive(Debug, Clone, Default)]
pub struct TaskIdInterner {
    to_int: FxHashMap<String, TaskIdInt>,
    from_int: Vec<String>,
}

impl TaskIdInterner {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            to_int: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            from_int: Vec::with_capacity(capacity),
        }
    }

    /// Intern a string, returning the existing id if it was seen before.
    pub fn intern(&mut self, s: &str) -> TaskIdInt {
        if let Some(&id) = self.to_int.get(s) {
            return id;
        }
        self.push(s)
    }

    /// Intern a string that must not have been seen before.
    ///
    /// Returns `None` and leaves the interner untouched on a repeat.
    pub fn intern_unique(&mut self, s: &str) -> Option<TaskIdInt> {
        if self.to_int.contains_key(s) {
            return None;
        }
        Some(self.push(s))
    }

    fn push(&mut self, s: &str) -> TaskIdInt {
        let id = self.from_int.len() as TaskIdInt;
        self.from_int.push(s.to_string());
        self.to_int.insert(s.to_string(), id);
        id
    }

    #[inline]
    pub fn get(&self, s: &str) -> Option<TaskIdInt> {
        self.to_int.get(s).copied()
    }

    #[inline]
    pub fn resolve(&self, id: TaskIdInt) -> Option<&str> {
        self.from_int.get(id as usize).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.from_int.len()
    }

    pub fn is_empty(&self) -> bool {
        self.from_int.is_empty()
    }
}
