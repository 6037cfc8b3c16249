//! Dependency graph for derived attributes.
//!
//! Nodes are attribute keys; an edge `dep -> target` means the derived
//! attribute `target` is recomputed whenever `dep` changes. The graph is
//! built once per schema, validated for cycles, and used to order initial
//! computation.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use hashbrown::HashMap;
use trellis_core::{Error, Result};

/// Directed graph from source keys to the derived keys that read them.
#[derive(Clone, Debug, Default)]
pub struct DependencyGraph {
    /// Source key -> derived keys depending on it, in declaration order
    dependents: HashMap<String, Vec<String>>,
    /// Derived key -> its dependency keys, in declaration order
    dependencies: HashMap<String, Vec<String>>,
    /// Derived keys in declaration order
    targets: Vec<String>,
}

impl DependencyGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a derived key and its dependencies.
    ///
    /// Repeated dependency keys are collapsed so each edge exists once.
    pub fn add(&mut self, target: &str, deps: &[String]) {
        if !self.dependencies.contains_key(target) {
            self.targets.push(target.to_string());
        }

        let mut unique: Vec<String> = Vec::with_capacity(deps.len());
        for dep in deps {
            if !unique.contains(dep) {
                unique.push(dep.clone());
            }
        }

        for dep in &unique {
            self.dependents
                .entry(dep.clone())
                .or_default()
                .push(target.to_string());
        }
        self.dependencies.insert(target.to_string(), unique);
    }

    /// Returns the derived keys that read `key` directly.
    pub fn dependents_of(&self, key: &str) -> &[String] {
        self.dependents.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns the dependencies of a derived key.
    pub fn dependencies_of(&self, target: &str) -> &[String] {
        self.dependencies.get(target).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns true if `key` is a derived key in this graph.
    #[inline]
    pub fn is_derived(&self, key: &str) -> bool {
        self.dependencies.contains_key(key)
    }

    /// Returns the number of derived keys.
    #[inline]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Returns true if there are no derived keys.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Checks that no derived key depends on itself through other derived keys.
    pub fn validate(&self) -> Result<()> {
        self.topological_order().map(|_| ())
    }

    /// Orders derived keys so every key comes after the derived keys it reads.
    ///
    /// Ties keep declaration order. Returns `Error::CyclicDerivation` with the
    /// offending path if the graph has a cycle.
    pub fn topological_order(&self) -> Result<Vec<String>> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Visiting,
            Done,
        }

        fn visit<'a>(
            graph: &'a DependencyGraph,
            key: &'a str,
            marks: &mut HashMap<&'a str, Mark>,
            stack: &mut Vec<&'a str>,
            out: &mut Vec<String>,
        ) -> Result<()> {
            match marks.get(key) {
                Some(Mark::Done) => return Ok(()),
                Some(Mark::Visiting) => {
                    let start = stack.iter().position(|k| *k == key).unwrap_or(0);
                    let mut path: Vec<&str> = stack[start..].to_vec();
                    path.push(key);
                    return Err(Error::cyclic_derivation(path));
                }
                None => {}
            }

            marks.insert(key, Mark::Visiting);
            stack.push(key);
            for dep in graph.dependencies_of(key) {
                if graph.is_derived(dep) {
                    visit(graph, dep, marks, stack, out)?;
                }
            }
            stack.pop();
            marks.insert(key, Mark::Done);
            out.push(key.to_string());
            Ok(())
        }

        let mut marks = HashMap::new();
        let mut stack = Vec::new();
        let mut out = Vec::with_capacity(self.targets.len());
        for target in &self.targets {
            visit(self, target, &mut marks, &mut stack, &mut out)?;
        }
        Ok(out)
    }
}
