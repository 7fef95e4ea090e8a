//! Property-based tests for the dependency sorter
//!
//! Random acyclic graphs where some items are fully independent (no
//! dependencies, nothing depends on them).

use kiln::dag;
use proptest::prelude::*;

#[derive(Debug, Clone)]
struct Item {
    name: String,
    deps: Vec<String>,
}

/// (independent flag, raw dependency picks) per item, plus edge direction
fn arb_graph() -> impl Strategy<Value = (Vec<(bool, Vec<usize>)>, bool)> {
    (
        prop::collection::vec(
            (any::<bool>(), prop::collection::vec(0usize..16, 0..4)),
            1..14,
        ),
        any::<bool>(),
    )
}

/// Build items; edges only point one way (lower → higher index or the
/// reverse) so the graph is acyclic.
fn build(spec: &[(bool, Vec<usize>)], forward: bool) -> Vec<Item> {
    let n = spec.len();
    spec.iter()
        .enumerate()
        .map(|(i, (independent, picks))| {
            let deps = if *independent {
                Vec::new()
            } else {
                picks
                    .iter()
                    .map(|p| p % n)
                    .filter(|&j| if forward { j > i } else { j < i })
                    .filter(|&j| !spec[j].0)
                    .map(|j| format!("n{j}"))
                    .collect()
            };
            Item {
                name: format!("n{i}"),
                deps,
            }
        })
        .collect()
}

fn sort(items: Vec<Item>) -> Vec<Item> {
    dag::sort(items, |i: &Item| i.name.as_str(), |i: &Item| i.deps.as_slice()).unwrap()
}

proptest! {
    /// Property: items nobody depends on and with no dependencies keep their index
    #[test]
    fn independent_items_keep_their_position((spec, forward) in arb_graph()) {
        let items = build(&spec, forward);
        let depended_on: Vec<&str> = items
            .iter()
            .flat_map(|i| i.deps.iter().map(String::as_str))
            .collect();
        let independent: Vec<(usize, String)> = items
            .iter()
            .enumerate()
            .filter(|(_, i)| i.deps.is_empty() && !depended_on.contains(&i.name.as_str()))
            .map(|(pos, i)| (pos, i.name.clone()))
            .collect();

        let sorted = sort(items);
        for (pos, name) in independent {
            prop_assert_eq!(&sorted[pos].name, &name);
        }
    }

    /// Property: every dependency comes before its dependent
    #[test]
    fn dependencies_precede_dependents((spec, forward) in arb_graph()) {
        let sorted = sort(build(&spec, forward));
        let position = |name: &str| sorted.iter().position(|i| i.name == name).unwrap();
        for item in &sorted {
            for dep in &item.deps {
                prop_assert!(position(dep) < position(&item.name));
            }
        }
    }

    /// Property: the output is a permutation of the input
    #[test]
    fn output_is_a_permutation((spec, forward) in arb_graph()) {
        let items = build(&spec, forward);
        let mut before: Vec<String> = items.iter().map(|i| i.name.clone()).collect();
        let mut after: Vec<String> = sort(items).into_iter().map(|i| i.name).collect();
        before.sort();
        after.sort();
        prop_assert_eq!(before, after);
    }
}

#[test]
fn cycle_is_reported_with_full_chain() {
    let items = vec![
        Item { name: "a".into(), deps: vec!["b".into()] },
        Item { name: "b".into(), deps: vec!["c".into()] },
        Item { name: "c".into(), deps: vec!["a".into()] },
    ];
    let err = dag::sort(items, |i: &Item| i.name.as_str(), |i: &Item| i.deps.as_slice()).unwrap_err();
    assert!(matches!(err, kiln::KilnError::CycleDetected { ref cycle } if cycle == "a → b → c → a"));
}
