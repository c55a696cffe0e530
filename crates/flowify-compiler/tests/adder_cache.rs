//! Property tests: adder routines are built once per key and shared.

use std::collections::{HashMap, HashSet};

use flowify_compiler::{AdderCompiler, Alphabet, Radix};
use flowify_ir::{FeatureGraph, RoutineId};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Helpers / Strategies
// ---------------------------------------------------------------------------

const BASE: u32 = 4;
const PLACES: u32 = 7;

/// A request order over valid `(exponent, addend)` keys, with repeats.
fn arb_requests() -> impl Strategy<Value = Vec<(u32, u32)>> {
    prop::collection::vec((0..PLACES, 1..=BASE), 1..60)
}

// ---------------------------------------------------------------------------
// Property Tests
// ---------------------------------------------------------------------------

proptest! {
    /// The same key always yields the same routine, whatever the call order.
    #[test]
    fn same_key_same_routine(requests in arb_requests()) {
        let alphabet = Alphabet::new(Radix::new(BASE, PLACES).unwrap());
        let mut graph = FeatureGraph::new();
        let mut adder = AdderCompiler::new(&alphabet);
        let mut first_seen: HashMap<(u32, u32), RoutineId> = HashMap::new();

        for key in &requests {
            let id = adder.add_routine(&mut graph, key.0, key.1).unwrap();
            let expected = *first_seen.entry(*key).or_insert(id);
            prop_assert_eq!(id, expected);
        }

        let distinct: HashSet<_> = requests.iter().collect();
        prop_assert_eq!(graph.arena.len(), distinct.len());
        prop_assert_eq!(adder.add_routine_count(), distinct.len());
    }

    /// Building place adders in any order reuses the add routines.
    #[test]
    fn place_adders_share_add_routines(
        order in Just((0..PLACES).collect::<Vec<_>>()).prop_shuffle(),
    ) {
        let alphabet = Alphabet::new(Radix::new(BASE, PLACES).unwrap());
        let mut graph = FeatureGraph::new();
        let mut adder = AdderCompiler::new(&alphabet);
        for exponent in &order {
            let first = adder.place_adder(&mut graph, *exponent).unwrap();
            let again = adder.place_adder(&mut graph, *exponent).unwrap();
            prop_assert_eq!(first, again);
        }
        // place 0 needs addends 1..BASE-1; every other place needs 1..=BASE
        let expected_add = (BASE - 1) + (PLACES - 1) * BASE;
        prop_assert_eq!(adder.add_routine_count(), expected_add as usize);
        prop_assert_eq!(graph.arena.len(), (expected_add + PLACES) as usize);
    }
}

#[test]
fn two_generations_share_everything_below_the_wrappers() {
    let alphabet = Alphabet::new(Radix::new(BASE, PLACES).unwrap());
    let mut graph = FeatureGraph::new();
    let mut adder = AdderCompiler::new(&alphabet);
    let first = adder.full_adder(&mut graph, 1).unwrap();
    let second = adder.full_adder(&mut graph, 2).unwrap();
    for (a, b) in first.iter().zip(&second) {
        assert_ne!(a, b);
        assert_eq!(
            graph.routine(*a).unwrap().children(),
            graph.routine(*b).unwrap().children()
        );
    }
}
