//! Property-based test generators using proptest.
//!
//! Mutation scripts address entities by position in the current entity
//! list rather than by key, so one script can be run in any mode: keys
//! differ between local and remote stores, positions do not.

use proptest::prelude::*;

/// One step of a mutation script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    /// Insert a new customer.
    Insert {
        /// Customer name.
        name: String,
    },
    /// Rename the customer at `target`, modulo the number of customers.
    Update {
        /// Position in the current entity list.
        target: usize,
        /// New name.
        name: String,
    },
    /// Delete the customer at `target` by key.
    DeleteById {
        /// Position in the current entity list.
        target: usize,
    },
    /// Delete the customer at `target` by value.
    DeleteByEntity {
        /// Position in the current entity list.
        target: usize,
    },
    /// Delete every customer.
    DeleteAll,
}

/// Strategy for generating customer names.
pub fn customer_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Z][a-z]{2,8}").expect("Invalid regex")
}

/// Strategy for generating one script step.
///
/// Inserts and updates dominate so scripts build up some state.
pub fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => customer_name_strategy().prop_map(|name| Op::Insert { name }),
        3 => (any::<usize>(), customer_name_strategy())
            .prop_map(|(target, name)| Op::Update { target, name }),
        2 => any::<usize>().prop_map(|target| Op::DeleteById { target }),
        1 => any::<usize>().prop_map(|target| Op::DeleteByEntity { target }),
        1 => Just(Op::DeleteAll),
    ]
}

/// Strategy for generating scripts of up to `max_len` steps.
pub fn script_strategy(max_len: usize) -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(op_strategy(), 0..=max_len)
}

/// Strategy for the first key a remote store hands out.
///
/// Small values make server keys collide with local keys.
pub fn first_server_key_strategy() -> impl Strategy<Value = i64> {
    prop_oneof![1i64..6, 1000i64..1010]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::strategy::ValueTree;
    use proptest::test_runner::TestRunner;

    #[test]
    fn scripts_respect_max_len() {
        let mut runner = TestRunner::default();
        for _ in 0..32 {
            let script = script_strategy(5).new_tree(&mut runner).unwrap().current();
            assert!(script.len() <= 5);
        }
    }

    proptest! {
        #[test]
        fn names_are_capitalized(name in customer_name_strategy()) {
            prop_assert!(name.chars().next().is_some_and(|c| c.is_ascii_uppercase()));
            prop_assert!(name.len() >= 3);
        }
    }
}
