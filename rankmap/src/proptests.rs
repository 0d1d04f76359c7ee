use std::collections::BTreeMap;
use std::ops::ControlFlow;

use proptest::prelude::*;
use proptest_derive::Arbitrary;

use crate::WeightedAvlMap;

/// Model implementation: a BTreeMap holding (weight, value) per key.
#[derive(Default, Clone)]
struct Model {
    map: BTreeMap<u16, (u64, u64)>,
}

impl Model {
    fn put(&mut self, key: u16, weight: u64, value: u64) {
        self.map.insert(key, (weight, value));
    }

    fn remove(&mut self, key: u16) {
        self.map.remove(&key);
    }

    fn get(&self, key: u16) -> Option<u64> {
        self.map.get(&key).map(|&(_, value)| value)
    }

    fn total_weight(&self) -> u64 {
        self.map.values().map(|&(weight, _)| weight).sum()
    }

    fn left_weight(&self, key: u16) -> Option<u64> {
        self.map.contains_key(&key).then(|| {
            self.map
                .range(..key)
                .map(|(_, &(weight, _))| weight)
                .sum()
        })
    }

    fn right_weight(&self, key: u16) -> Option<u64> {
        self.map.contains_key(&key).then(|| {
            self.map
                .range((std::ops::Bound::Excluded(key), std::ops::Bound::Unbounded))
                .map(|(_, &(weight, _))| weight)
                .sum()
        })
    }
}

/// Actions to test against both implementations.
#[derive(Arbitrary, Debug, Clone)]
enum Action {
    Put { key: u16, weight: Weight, value: u64 },
    Remove { key: u16 },
    Get { key: u16 },
}

/// Node weights kept small so collisions in subtree sums would be caught.
#[derive(Debug, Clone, Copy)]
struct Weight(u64);

impl Arbitrary for Weight {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        prop_oneof![
            Just(Weight(0)),
            Just(Weight(1)),
            (2u64..100).prop_map(Weight),
        ]
        .boxed()
    }
}

/// Test harness that executes actions on both the map and the model.
#[derive(Default)]
struct Test {
    map: WeightedAvlMap<u16, u64>,
    model: Model,
}

impl Test {
    fn execute(&mut self, action: Action) {
        match action {
            Action::Put { key, weight, value } => {
                self.map = self.map.put(key, weight.0, value);
                self.model.put(key, weight.0, value);
            }
            Action::Remove { key } => {
                self.map = self.map.remove(&key);
                self.model.remove(key);
            }
            Action::Get { key } => {
                assert_eq!(
                    self.map.get(&key).copied(),
                    self.model.get(key),
                    "get mismatch for key {key}",
                );
            }
        }
        self.check();
    }

    fn check(&self) {
        self.map.assert_invariants();
        assert_eq!(self.map.total_weight(), self.model.total_weight());
        assert_eq!(self.map.is_empty(), self.model.map.is_empty());

        let mut visited = Vec::new();
        let _ = self.map.for_each(|&key, &value, lw, nw, rw| {
            assert_eq!(lw + nw + rw, self.map.total_weight(), "weights of {key} do not partition the total");
            visited.push((key, value));
            ControlFlow::Continue(())
        });
        let expected: Vec<(u16, u64)> = self
            .model
            .map
            .iter()
            .map(|(&key, &(_, value))| (key, value))
            .collect();
        assert_eq!(visited, expected, "in-order traversal mismatch");

        for &(key, _) in &expected {
            assert_eq!(self.map.left_weight(&key), self.model.left_weight(key));
            assert_eq!(self.map.right_weight(&key), self.model.right_weight(key));
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        failure_persistence: None,
        ..ProptestConfig::default()
    })]

    #[test]
    fn proptest_vs_btreemap(actions in prop::collection::vec(any::<Action>(), 1..128)) {
        let mut test = Test::default();
        for action in actions {
            test.execute(action);
        }
    }

    #[test]
    fn proptest_snapshots_stay_frozen(
        base in prop::collection::vec(any::<(u16, u64)>(), 1..64),
        later in prop::collection::vec(any::<Action>(), 1..64),
    ) {
        let mut map: WeightedAvlMap<u16, u64> = WeightedAvlMap::new();
        for &(key, value) in &base {
            map = map.put(key, 1, value);
        }
        let snapshot = map.clone();
        let mut frozen = Vec::new();
        let _ = snapshot.for_each(|&k, &v, _, _, _| {
            frozen.push((k, v));
            ControlFlow::Continue(())
        });

        for action in later {
            match action {
                Action::Put { key, weight, value } => map = map.put(key, weight.0, value),
                Action::Remove { key } => map = map.remove(&key),
                Action::Get { key } => {
                    let _ = map.get(&key);
                }
            }
        }

        let mut still = Vec::new();
        let _ = snapshot.for_each(|&k, &v, _, _, _| {
            still.push((k, v));
            ControlFlow::Continue(())
        });
        prop_assert_eq!(frozen, still);
    }
}
