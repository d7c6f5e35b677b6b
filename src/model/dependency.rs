use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::graph::{DiGraph, NodeIndex};

use super::task::Task;
use crate::error::GanttError;

/// Task id -> ids of the tasks that list it as a dependency.
#[derive(Debug, Clone, Default)]
pub struct DependencyMap {
    dependents: HashMap<String, Vec<String>>,
}

impl DependencyMap {
    /// Build the inverse adjacency of every task's `dependencies`.
    ///
    /// Rejects duplicate ids and dependency cycles (self references
    /// included). References to unknown ids are kept on the task but never
    /// reach the map.
    pub fn build(tasks: &[Task]) -> Result<Self, GanttError> {
        let mut graph: DiGraph<&str, ()> = DiGraph::new();
        let mut nodes: HashMap<&str, NodeIndex> = HashMap::with_capacity(tasks.len());
        for task in tasks {
            if nodes.insert(&task.id, graph.add_node(&task.id)).is_some() {
                return Err(GanttError::DuplicateTaskId(task.id.clone()));
            }
        }

        let mut dependents: HashMap<String, Vec<String>> = HashMap::new();
        for task in tasks {
            for dep in &task.dependencies {
                let Some(&from) = nodes.get(dep.as_str()) else {
                    tracing::warn!(task = %task.id, dependency = %dep, "dependency on unknown task");
                    continue;
                };
                graph.update_edge(from, nodes[task.id.as_str()], ());
                let entry = dependents.entry(dep.clone()).or_default();
                if !entry.contains(&task.id) {
                    entry.push(task.id.clone());
                }
            }
        }

        if petgraph::algo::toposort(&graph, None).is_err() {
            return Err(GanttError::DependencyCycle {
                path: cycle_path(&graph),
            });
        }

        Ok(Self { dependents })
    }

    /// Direct dependents of `id`.
    pub fn dependents_of(&self, id: &str) -> &[String] {
        self.dependents.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Transitive dependents of `id` in breadth-first order, without `id`
    /// itself and without duplicates.
    pub fn closure(&self, id: &str) -> Vec<String> {
        let mut seen: HashSet<&str> = HashSet::from([id]);
        let mut queue: VecDeque<&str> = VecDeque::from([id]);
        let mut out = Vec::new();
        while let Some(current) = queue.pop_front() {
            for next in self.dependents_of(current) {
                if seen.insert(next) {
                    out.push(next.clone());
                    queue.push_back(next);
                }
            }
        }
        out
    }
}

/// Ids along one cycle, first id repeated at the end.
fn cycle_path(graph: &DiGraph<&str, ()>) -> Vec<String> {
    for component in petgraph::algo::tarjan_scc(graph) {
        let looped = component.len() > 1
            || component
                .first()
                .is_some_and(|&n| graph.find_edge(n, n).is_some());
        if looped {
            let mut path: Vec<String> = component.iter().map(|&n| graph[n].to_string()).collect();
            path.sort();
            path.push(path[0].clone());
            return path;
        }
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::{normalize, RawTask};

    fn tasks(specs: &[(&str, &str)]) -> Vec<Task> {
        specs
            .iter()
            .enumerate()
            .map(|(i, (id, deps))| {
                normalize(
                    &RawTask::new(*id)
                        .with_id(*id)
                        .with_dates("2024-03-01", "2024-03-02")
                        .with_dependencies(deps),
                    i,
                )
                .unwrap()
            })
            .collect()
    }

    #[test]
    fn closure_walks_breadth_first_without_repeats() {
        let map = DependencyMap::build(&tasks(&[
            ("a", ""),
            ("b", "a"),
            ("c", "b"),
            ("d", "a, c"),
        ]))
        .unwrap();
        assert_eq!(map.dependents_of("a"), ["b", "d"]);
        assert_eq!(map.closure("a"), vec!["b", "d", "c"]);
        assert!(map.closure("d").is_empty());
    }

    #[test]
    fn unknown_dependencies_are_inert() {
        let map = DependencyMap::build(&tasks(&[("a", "ghost")])).unwrap();
        assert!(map.dependents_of("ghost").is_empty());
    }

    #[test]
    fn cycles_are_rejected() {
        let err = DependencyMap::build(&tasks(&[("a", "c"), ("b", "a"), ("c", "b")])).unwrap_err();
        assert_eq!(
            err,
            GanttError::DependencyCycle {
                path: vec!["a".into(), "b".into(), "c".into(), "a".into()]
            }
        );

        let err = DependencyMap::build(&tasks(&[("a", "a")])).unwrap_err();
        assert!(matches!(err, GanttError::DependencyCycle { .. }));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = DependencyMap::build(&tasks(&[("a", ""), ("a", "")])).unwrap_err();
        assert_eq!(err, GanttError::DuplicateTaskId("a".into()));
    }
}
