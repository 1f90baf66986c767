//! Step dependency graph (Arc<str> ids)
//!
//! An edge `a -> b` exists when some input of step `b` reads an output of
//! step `a`.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use super::Workflow;

/// Graph of step dependencies built from step input sources.
pub struct StepGraph {
    /// step_id -> steps reading from it
    adjacency: HashMap<Arc<str>, Vec<Arc<str>>>,
    /// step_id -> steps it reads from
    predecessors: HashMap<Arc<str>, Vec<Arc<str>>>,
    /// All step ids, in document order
    step_ids: Vec<Arc<str>>,
}

impl StepGraph {
    pub fn from_workflow(workflow: &Workflow) -> Self {
        let capacity = workflow.steps.len();
        let mut adjacency: HashMap<Arc<str>, Vec<Arc<str>>> = HashMap::with_capacity(capacity);
        let mut predecessors: HashMap<Arc<str>, Vec<Arc<str>>> = HashMap::with_capacity(capacity);
        let mut step_ids: Vec<Arc<str>> = Vec::with_capacity(capacity);

        for step in &workflow.steps {
            let id: Arc<str> = Arc::from(step.id.as_str());
            if adjacency.contains_key(&id) {
                continue;
            }
            step_ids.push(Arc::clone(&id));
            adjacency.insert(Arc::clone(&id), Vec::new());
            predecessors.insert(id, Vec::new());
        }

        for step in &workflow.steps {
            let Some(target) = adjacency.get_key_value(step.id.as_str()).map(|(id, _)| Arc::clone(id)) else {
                continue;
            };
            for upstream in step.upstream_steps() {
                // Sources naming unknown steps are reported by validation
                let Some(source) = adjacency.get_key_value(upstream).map(|(id, _)| Arc::clone(id)) else {
                    continue;
                };
                let successors = adjacency.entry(Arc::clone(&source)).or_default();
                if !successors.contains(&target) {
                    successors.push(Arc::clone(&target));
                    predecessors.entry(Arc::clone(&target)).or_default().push(source);
                }
            }
        }

        Self {
            adjacency,
            predecessors,
            step_ids,
        }
    }

    pub fn step_ids(&self) -> &[Arc<str>] {
        &self.step_ids
    }

    /// Steps that `step_id` reads from
    pub fn dependencies(&self, step_id: &str) -> &[Arc<str>] {
        self.predecessors.get(step_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Steps that read from `step_id`
    pub fn successors(&self, step_id: &str) -> &[Arc<str>] {
        self.adjacency.get(step_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, step_id: &str) -> bool {
        self.adjacency.contains_key(step_id)
    }

    /// Check if there's a path from `from` to `to` (BFS)
    pub fn has_path(&self, from: &str, to: &str) -> bool {
        if from == to {
            return true;
        }

        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();

        queue.push_back(from);
        visited.insert(from);

        while let Some(current) = queue.pop_front() {
            for neighbor in self.successors(current) {
                if neighbor.as_ref() == to {
                    return true;
                }
                if visited.insert(neighbor.as_ref()) {
                    queue.push_back(neighbor.as_ref());
                }
            }
        }

        false
    }

    /// Find a cycle with three-colour DFS; returns its path (`a → b → a`).
    pub fn detect_cycle(&self) -> Option<String> {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Color {
            White,
            Gray,
            Black,
        }

        fn dfs(
            node: &Arc<str>,
            adjacency: &HashMap<Arc<str>, Vec<Arc<str>>>,
            colors: &mut HashMap<Arc<str>, Color>,
            stack: &mut Vec<Arc<str>>,
        ) -> Option<String> {
            colors.insert(Arc::clone(node), Color::Gray);
            stack.push(Arc::clone(node));

            if let Some(neighbors) = adjacency.get(node) {
                for neighbor in neighbors {
                    match colors.get(neighbor) {
                        Some(Color::Gray) => {
                            // Gray means `neighbor` is on the current path
                            let start = stack.iter().position(|x| x == neighbor).unwrap_or(0);
                            let cycle: Vec<&str> = stack[start..].iter().map(|s| s.as_ref()).collect();
                            return Some(format!("{} → {}", cycle.join(" → "), neighbor));
                        }
                        Some(Color::White) | None => {
                            if let Some(cycle) = dfs(neighbor, adjacency, colors, stack) {
                                return Some(cycle);
                            }
                        }
                        Some(Color::Black) => {}
                    }
                }
            }

            stack.pop();
            colors.insert(Arc::clone(node), Color::Black);
            None
        }

        let mut colors: HashMap<Arc<str>, Color> =
            self.step_ids.iter().map(|id| (Arc::clone(id), Color::White)).collect();
        let mut stack: Vec<Arc<str>> = Vec::new();

        for step_id in &self.step_ids {
            if colors.get(step_id) == Some(&Color::White) {
                if let Some(cycle) = dfs(step_id, &self.adjacency, &mut colors, &mut stack) {
                    return Some(cycle);
                }
            }
        }
        None
    }

    /// Kahn's algorithm, ties broken by document order. `None` on a cycle.
    pub fn topological_order(&self) -> Option<Vec<Arc<str>>> {
        let mut in_degree: HashMap<&str, usize> = self
            .step_ids
            .iter()
            .map(|id| (id.as_ref(), self.dependencies(id).len()))
            .collect();
        let mut ready: VecDeque<&Arc<str>> = self
            .step_ids
            .iter()
            .filter(|id| self.dependencies(id).is_empty())
            .collect();
        let mut order = Vec::with_capacity(self.step_ids.len());

        while let Some(id) = ready.pop_front() {
            order.push(Arc::clone(id));
            for successor in self.successors(id) {
                if let Some(degree) = in_degree.get_mut(successor.as_ref()) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push_back(successor);
                    }
                }
            }
        }

        (order.len() == self.step_ids.len()).then_some(order)
    }
}
