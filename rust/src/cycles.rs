//! Cycle detection over task dependency graphs.
//!
//! Scoring is only allowed on a graph that this module certifies acyclic.
//! The traversal is a depth-first search from every unvisited task in
//! declaration order, following each task's dependencies in declaration
//! order. When an edge reaches a task that is still on the current path,
//! the path slice from that task to the current one is reported as a cycle,
//! so the reported rotation depends on traversal order while the set of
//! ids in each cycle does not.
//!
//! The search keeps its own stack, so deep dependency chains cannot
//! overflow the call stack.

use crate::interner::{TaskIdInt, TaskIdInterner};

/// Find every cycle in an adjacency list given as `(task id, dependency ids)`.
///
/// Dependency ids that are not keys of the adjacency are dangling and are
/// treated as leaves. Repeated keys have their dependency lists merged and
/// a dependency listed twice is followed once.
/// An empty result means the graph is acyclic.
pub fn find_cycles(adjacency: &[(String, Vec<String>)]) -> Vec<Vec<String>> {
    let mut ids = TaskIdInterner::with_capacity(adjacency.len());
    for (task_id, _) in adjacency {
        ids.intern(task_id);
    }

    let mut resolved: Vec<Vec<TaskIdInt>> = vec![Vec::new(); ids.len()];
    for (task_id, deps) in adjacency {
        let Some(id) = ids.get(task_id) else {
            continue;
        };
        let list = &mut resolved[id as usize];
        for dep_id in deps.iter().filter_map(|dep| ids.get(dep)) {
            if !list.contains(&dep_id) {
                list.push(dep_id);
            }
        }
    }

    detect_cycles(&resolved)
        .into_iter()
        .map(|cycle| resolve_cycle(&ids, &cycle))
        .collect()
}

/// Map an interned cycle back to task id strings.
pub(crate) fn resolve_cycle(ids: &TaskIdInterner, cycle: &[TaskIdInt]) -> Vec<String> {
    cycle
        .iter()
        .filter_map(|&id| ids.resolve(id))
        .map(str::to_string)
        .collect()
}

/// Find every cycle in an interned adjacency list.
///
/// `adjacency[i]` lists the dependencies of task `i`. Entries that fall
/// outside the list are ignored like dangling references.
pub(crate) fn detect_cycles(adjacency: &[Vec<TaskIdInt>]) -> Vec<Vec<TaskIdInt>> {
    let n = adjacency.len();
    let mut visited = vec![false; n];
    // Position of each task on the current path, if it is on it.
    let mut path_pos: Vec<Option<usize>> = vec![None; n];
    let mut path: Vec<TaskIdInt> = Vec::new();
    // (task, index of the next dependency to follow)
    let mut frames: Vec<(TaskIdInt, usize)> = Vec::new();
    let mut cycles = Vec::new();

    for root in 0..n {
        if visited[root] {
            continue;
        }
        visited[root] = true;
        path_pos[root] = Some(0);
        path.push(root as TaskIdInt);
        frames.push((root as TaskIdInt, 0));

        while let Some(frame) = frames.last_mut() {
            let (node, next) = *frame;
            match adjacency[node as usize].get(next) {
                Some(&dep) => {
                    frame.1 += 1;
                    let dep_idx = dep as usize;
                    if dep_idx >= n {
                        continue;
                    }
                    if let Some(start) = path_pos[dep_idx] {
                        cycles.push(path[start..].to_vec());
                    } else if !visited[dep_idx] {
                        visited[dep_idx] = true;
                        path_pos[dep_idx] = Some(path.len());
                        path.push(dep);
                        frames.push((dep, 0));
                    }
                }
                None => {
                    frames.pop();
                    path.pop();
                    path_pos[node as usize] = None;
                }
            }
        }
    }

    cycles
}
