//! Stable dependency sort for named items (documents or tasks)
//!
//! Items split into two groups:
//! - **independent**: no known dependencies and nothing depends on them.
//!   These keep their original index.
//! - **networked**: everything else, ordered by a DFS topological sort
//!   (dependencies first, ties broken by original order).
//!
//! The networked items then fill the slots the independent ones left free.
//! If two items share a name the topology is ambiguous and the input order is
//! returned untouched.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, warn};

use crate::error::{KilnError, Result};

/// Topologically sort `items` by the names returned from `deps_of`
///
/// Dependencies naming an item outside the batch are ignored (logged).
/// A cycle fails with `CycleDetected` carrying the full chain.
pub fn sort<T, N, D>(items: Vec<T>, name_of: N, deps_of: D) -> Result<Vec<T>>
where
    N: Fn(&T) -> &str,
    D: Fn(&T) -> &[String],
{
    let names: Vec<String> = items.iter().map(|item| name_of(item).to_string()).collect();

    let mut index: FxHashMap<&str, usize> = FxHashMap::default();
    for (i, name) in names.iter().enumerate() {
        if index.insert(name.as_str(), i).is_some() {
            debug!(name = %name, "Duplicate name, keeping original order");
            return Ok(items);
        }
    }

    // Known dependency edges, deduplicated, declaration order
    let mut edges: Vec<Vec<usize>> = Vec::with_capacity(items.len());
    let mut has_dependents = vec![false; items.len()];
    for (i, item) in items.iter().enumerate() {
        let mut seen = FxHashSet::default();
        let mut deps = Vec::new();
        for dep in deps_of(item) {
            match index.get(dep.as_str()) {
                Some(&j) => {
                    if seen.insert(j) {
                        deps.push(j);
                        has_dependents[j] = true;
                    }
                }
                None => warn!(item = %names[i], dependency = %dep, "Unknown dependency ignored"),
            }
        }
        edges.push(deps);
    }

    let independent: Vec<bool> = (0..items.len())
        .map(|i| edges[i].is_empty() && !has_dependents[i])
        .collect();

    let networked: Vec<usize> = (0..items.len()).filter(|&i| !independent[i]).collect();
    let sorted = topological_order(&networked, &edges, &names)?;

    let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
    let mut queue = sorted.into_iter();
    let mut result = Vec::with_capacity(slots.len());
    for position in 0..slots.len() {
        let source = if independent[position] {
            position
        } else {
            queue.next().unwrap_or(position)
        };
        if let Some(item) = slots[source].take() {
            result.push(item);
        }
    }

    Ok(result)
}

/// DFS post-order over `roots` using three-color marking
fn topological_order(roots: &[usize], edges: &[Vec<usize>], names: &[String]) -> Result<Vec<usize>> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Color {
        White,
        Gray,
        Black,
    }

    fn dfs(
        node: usize,
        edges: &[Vec<usize>],
        colors: &mut [Color],
        stack: &mut Vec<usize>,
        order: &mut Vec<usize>,
        names: &[String],
    ) -> std::result::Result<(), String> {
        colors[node] = Color::Gray;
        stack.push(node);

        for &dep in &edges[node] {
            match colors[dep] {
                Color::Gray => {
                    let start = stack.iter().position(|&n| n == dep).unwrap_or(0);
                    let chain: Vec<&str> = stack[start..].iter().map(|&n| names[n].as_str()).collect();
                    return Err(format!("{} → {}", chain.join(" → "), names[dep]));
                }
                Color::White => dfs(dep, edges, colors, stack, order, names)?,
                Color::Black => {}
            }
        }

        stack.pop();
        colors[node] = Color::Black;
        order.push(node);
        Ok(())
    }

    let mut colors = vec![Color::White; edges.len()];
    let mut stack = Vec::new();
    let mut order = Vec::with_capacity(roots.len());

    for &root in roots {
        if colors[root] == Color::White {
            dfs(root, edges, &mut colors, &mut stack, &mut order, names)
                .map_err(|cycle| KilnError::CycleDetected { cycle })?;
        }
    }

    Ok(order)
}
