//! Property tests for the ordered unique-id list.

#![allow(clippy::unwrap_used, missing_docs)]

use std::collections::HashSet;

use agora_core::{Uid, UidList};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Add(Uid, bool),
    Remove(Uid),
    MoveUp(Uid),
    MoveDown(Uid),
    Raise(Uid),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    // A small id space makes duplicate adds and hits on existing items likely.
    let uid = 1u64..20u64;
    prop_oneof![
        (uid.clone(), any::<bool>()).prop_map(|(u, top)| Op::Add(u, top)),
        uid.clone().prop_map(Op::Remove),
        uid.clone().prop_map(Op::MoveUp),
        uid.clone().prop_map(Op::MoveDown),
        uid.prop_map(Op::Raise),
    ]
}

fn distinct_count(list: &UidList) -> usize {
    list.iter().collect::<HashSet<_>>().len()
}

proptest! {
    #[test]
    fn any_op_sequence_keeps_items_unique(ops in prop::collection::vec(op_strategy(), 0..64)) {
        let mut list = UidList::new();
        for op in ops {
            let before = list.clone();
            let failed = match op {
                Op::Add(uid, top) => list.add(uid, top).is_err(),
                Op::Remove(uid) => list.remove(uid).is_err(),
                Op::MoveUp(uid) => list.move_up(uid).is_err(),
                Op::MoveDown(uid) => list.move_down(uid).is_err(),
                Op::Raise(uid) => list.raise(uid).is_err(),
            };
            // A failed operation must not mutate the list.
            if failed {
                prop_assert_eq!(&list, &before);
            }
            prop_assert_eq!(list.len(), distinct_count(&list));
        }
    }

    #[test]
    fn pages_concatenate_to_the_original(
        uids in prop::collection::hash_set(1u64..1000u64, 0..40),
        page_size in 1usize..7,
    ) {
        let uids: Vec<Uid> = uids.into_iter().collect();
        let list = UidList::from_vec(uids.clone()).unwrap();

        let mut concatenated = Vec::new();
        let mut page = 1;
        loop {
            let items = list.page(page, page_size);
            if items.is_empty() {
                break;
            }
            concatenated.extend_from_slice(items);
            page += 1;
        }

        let expected_pages = list.len().div_ceil(page_size);
        prop_assert_eq!(page - 1, expected_pages);
        prop_assert_eq!(concatenated, uids);
    }

    #[test]
    fn json_round_trip(uids in prop::collection::hash_set(1u64..1000u64, 0..40)) {
        let list = UidList::from_vec(uids.into_iter().collect()).unwrap();
        let json = serde_json::to_string(&list).unwrap();
        let back: UidList = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back, list);
    }
}
