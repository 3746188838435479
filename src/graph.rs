//! Prerequisite dependency graph.
//!
//! Nodes are required course codes; adjacency is kept in maps keyed by code.
//! Two relations are tracked:
//!
//! - **REQUIRES** `X → Y`: `Y` must be scheduled in a strictly earlier term
//!   than `X`. The reverse map (`dependents`) is built in the same pass.
//! - **CONCURRENT** `X ~ Y`: `Y` must be scheduled in the same term as `X`
//!   or earlier.
//!
//! Edges come from each course's raw, unsimplified prerequisite tree. Every
//! COURSE leaf becomes an edge, including leaves under OR / CHOOSE_N /
//! CREDITS_FROM, so ordering errs on the side of taking more courses earlier.
//! Leaves naming courses outside the required set, and leaves naming the
//! course itself, produce no edge.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::debug;

use crate::catalog::Catalog;
use crate::config::ConcurrencyPolicy;
use crate::error::{PlanError, Result};

type Adjacency = BTreeMap<String, BTreeSet<String>>;

/// Directed prerequisite graph over the required courses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DependencyGraph {
    nodes: BTreeSet<String>,
    requires: Adjacency,
    dependents: Adjacency,
    concurrent: Adjacency,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Visited,
}

impl DependencyGraph {
    /// Builds the graph for a required-course set.
    ///
    /// Courses missing from the catalog become isolated nodes.
    pub fn build<C: Catalog + ?Sized>(
        catalog: &C,
        required: &BTreeSet<String>,
        policy: ConcurrencyPolicy,
    ) -> Self {
        let mut graph = Self {
            nodes: required.clone(),
            ..Self::default()
        };

        for code in required {
            let Some(course) = catalog.get_course(code) else {
                continue;
            };
            course.raw_requisite.for_each_course(&mut |target, timing| {
                if target == code.as_str() || !required.contains(target) {
                    return;
                }
                let same_term = timing.allows_same_term();
                match policy {
                    ConcurrencyPolicy::SameTerm if same_term => {
                        graph.add_concurrent(code, target);
                    }
                    _ => {
                        graph.add_requires(code, target);
                        if same_term {
                            graph.add_concurrent(code, target);
                        }
                    }
                }
            });
        }

        debug!(
            nodes = graph.nodes.len(),
            requires = graph.requires_edge_count(),
            concurrent = graph.concurrent_edge_count(),
            "dependency graph built"
        );
        graph
    }

    /// Adds a REQUIRES edge: `course` needs `prerequisite` in an earlier term.
    pub fn add_requires(&mut self, course: &str, prerequisite: &str) {
        if course == prerequisite {
            return;
        }
        self.nodes.insert(course.to_string());
        self.nodes.insert(prerequisite.to_string());
        self.requires
            .entry(course.to_string())
            .or_default()
            .insert(prerequisite.to_string());
        self.dependents
            .entry(prerequisite.to_string())
            .or_default()
            .insert(course.to_string());
    }

    /// Adds a CONCURRENT edge: `course` needs `partner` in the same term or earlier.
    pub fn add_concurrent(&mut self, course: &str, partner: &str) {
        if course == partner {
            return;
        }
        self.nodes.insert(course.to_string());
        self.nodes.insert(partner.to_string());
        self.concurrent
            .entry(course.to_string())
            .or_default()
            .insert(partner.to_string());
    }

    /// Course codes, in code order.
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(String::as_str)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.nodes.contains(code)
    }

    /// Strict prerequisites of a course.
    pub fn prerequisites(&self, code: &str) -> impl Iterator<Item = &str> {
        neighbours(&self.requires, code)
    }

    /// Courses that list `code` as a strict prerequisite.
    pub fn dependents(&self, code: &str) -> impl Iterator<Item = &str> {
        neighbours(&self.dependents, code)
    }

    /// Same-term-or-earlier partners of a course.
    pub fn concurrent_with(&self, code: &str) -> impl Iterator<Item = &str> {
        neighbours(&self.concurrent, code)
    }

    pub fn has_requires(&self, course: &str, prerequisite: &str) -> bool {
        self.requires
            .get(course)
            .is_some_and(|set| set.contains(prerequisite))
    }

    /// All REQUIRES edges as `(course, prerequisite)`.
    pub fn requires_edges(&self) -> impl Iterator<Item = (&str, &str)> {
        edges(&self.requires)
    }

    /// All CONCURRENT edges as `(course, partner)`.
    pub fn concurrent_edges(&self) -> impl Iterator<Item = (&str, &str)> {
        edges(&self.concurrent)
    }

    pub fn requires_edge_count(&self) -> usize {
        self.requires.values().map(BTreeSet::len).sum()
    }

    pub fn concurrent_edge_count(&self) -> usize {
        self.concurrent.values().map(BTreeSet::len).sum()
    }

    /// Number of strict prerequisites per course.
    pub fn in_degrees(&self) -> BTreeMap<&str, usize> {
        self.nodes
            .iter()
            .map(|code| {
                let degree = self.requires.get(code).map_or(0, BTreeSet::len);
                (code.as_str(), degree)
            })
            .collect()
    }

    /// The graph restricted to `keep`; edges touching other nodes vanish.
    pub fn subgraph(&self, keep: &BTreeSet<String>) -> Self {
        let mut graph = Self {
            nodes: self.nodes.intersection(keep).cloned().collect(),
            ..Self::default()
        };
        for (course, prerequisite) in self.requires_edges() {
            if keep.contains(course) && keep.contains(prerequisite) {
                graph.add_requires(course, prerequisite);
            }
        }
        for (course, partner) in self.concurrent_edges() {
            if keep.contains(course) && keep.contains(partner) {
                graph.add_concurrent(course, partner);
            }
        }
        graph
    }

    /// Finds a REQUIRES cycle with a three-colour depth-first walk.
    ///
    /// Returns the cycle in edge order with the first course repeated at the
    /// end (`A -> B -> A`), or `None` if the graph is acyclic. Roots are tried
    /// in code order, so the result is deterministic.
    pub fn detect_cycle(&self) -> Option<Vec<String>> {
        let mut marks: HashMap<&str, Mark> = HashMap::new();
        let mut path: Vec<&str> = Vec::new();

        for start in &self.nodes {
            if !marks.contains_key(start.as_str()) {
                if let Some(cycle) = self.visit(start, &mut marks, &mut path) {
                    return Some(cycle);
                }
            }
        }
        None
    }

    fn visit<'a>(
        &'a self,
        code: &'a str,
        marks: &mut HashMap<&'a str, Mark>,
        path: &mut Vec<&'a str>,
    ) -> Option<Vec<String>> {
        marks.insert(code, Mark::Visiting);
        path.push(code);

        for next in self.prerequisites(code) {
            match marks.get(next) {
                Some(Mark::Visiting) => {
                    let start = path.iter().position(|c| *c == next).unwrap_or(0);
                    let mut cycle: Vec<String> =
                        path[start..].iter().map(|c| c.to_string()).collect();
                    cycle.push(next.to_string());
                    return Some(cycle);
                }
                Some(Mark::Visited) => {}
                None => {
                    if let Some(cycle) = self.visit(next, marks, path) {
                        return Some(cycle);
                    }
                }
            }
        }

        path.pop();
        marks.insert(code, Mark::Visited);
        None
    }

    /// Fails with [`PlanError::CycleDetected`] if the REQUIRES relation has a cycle.
    pub fn ensure_acyclic(&self) -> Result<()> {
        match self.detect_cycle() {
            Some(courses) => Err(PlanError::CycleDetected { courses }),
            None => Ok(()),
        }
    }

    /// Longest REQUIRES chain, prerequisite first.
    ///
    /// Its length is a lower bound on the number of terms a plan needs.
    /// Ties go to the chain whose courses come first in code order. The
    /// graph must be acyclic; on a cyclic graph back edges are ignored.
    pub fn longest_chain(&self) -> Vec<String> {
        let mut depth: HashMap<&str, usize> = HashMap::new();
        let mut next: HashMap<&str, &str> = HashMap::new();
        let mut marks: HashMap<&str, Mark> = HashMap::new();

        for code in &self.nodes {
            self.chain_depth(code, &mut depth, &mut next, &mut marks);
        }

        let mut best: Option<(&str, usize)> = None;
        for code in &self.nodes {
            let d = depth.get(code.as_str()).copied().unwrap_or(0);
            if best.map_or(true, |(_, b)| d > b) {
                best = Some((code.as_str(), d));
            }
        }

        let mut chain = Vec::new();
        let mut cursor = best.map(|(code, _)| code);
        while let Some(code) = cursor {
            chain.push(code.to_string());
            cursor = next.get(code).copied();
        }
        chain.reverse();
        chain
    }

    fn chain_depth<'a>(
        &'a self,
        code: &'a str,
        depth: &mut HashMap<&'a str, usize>,
        next: &mut HashMap<&'a str, &'a str>,
        marks: &mut HashMap<&'a str, Mark>,
    ) -> usize {
        if let Some(d) = depth.get(code) {
            return *d;
        }
        if marks.contains_key(code) {
            return 0;
        }
        marks.insert(code, Mark::Visiting);

        let mut best = 0;
        for prerequisite in self.prerequisites(code) {
            let d = self.chain_depth(prerequisite, depth, next, marks);
            if d > best {
                best = d;
                next.insert(code, prerequisite);
            }
        }

        marks.insert(code, Mark::Visited);
        depth.insert(code, best + 1);
        best + 1
    }
}

fn neighbours<'a>(map: &'a Adjacency, code: &str) -> impl Iterator<Item = &'a str> {
    map.get(code)
        .into_iter()
        .flat_map(|set| set.iter().map(String::as_str))
}

fn edges(map: &Adjacency) -> impl Iterator<Item = (&str, &str)> {
    map.iter()
        .flat_map(|(from, tos)| tos.iter().map(move |to| (from.as_str(), to.as_str())))
}
