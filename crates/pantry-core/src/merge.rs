//! Local-wins merge of a local and a remote inventory snapshot.
//!
//! The result starts as the local snapshot, unchanged and in order. Remote
//! items whose id is absent locally are appended in remote order. When an id
//! exists on both sides the local item is kept verbatim; timestamps and
//! contents are never compared.
//!
//! Known limitation: if the same item is edited on two devices, the edit made
//! on the device performing the merge wins and the other edit is silently
//! dropped.

use std::collections::HashSet;

use crate::models::{InventoryItem, ItemId};

/// Outcome of [`merge`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeResult {
    /// Merged collection: local items first, then newly discovered remote items
    pub items: Vec<InventoryItem>,
    /// Ids appended from the remote snapshot
    pub appended: Vec<ItemId>,
    /// Ids present on both sides where the local version was kept
    pub kept_local: Vec<ItemId>,
}

impl MergeResult {
    /// Whether the merge added nothing to the local snapshot
    #[must_use]
    pub fn is_unchanged(&self) -> bool {
        self.appended.is_empty()
    }
}

/// Merge `remote` into `local`.
#[must_use]
pub fn merge(local: &[InventoryItem], remote: &[InventoryItem]) -> MergeResult {
    let mut seen: HashSet<ItemId> = local.iter().map(|item| item.id).collect();
    let mut items = local.to_vec();
    let mut appended = Vec::new();
    let mut kept_local = Vec::new();

    for item in remote {
        if seen.insert(item.id) {
            appended.push(item.id);
            items.push(item.clone());
        } else if !appended.contains(&item.id) && !kept_local.contains(&item.id) {
            kept_local.push(item.id);
        }
    }

    MergeResult {
        items,
        appended,
        kept_local,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::FoodCategory;

    fn item(name: &str) -> InventoryItem {
        InventoryItem::new(name, FoodCategory::Pantry, 1_000)
    }

    fn ids(items: &[InventoryItem]) -> Vec<ItemId> {
        items.iter().map(|item| item.id).collect()
    }

    #[test]
    fn empty_local_takes_remote() {
        let remote = vec![item("Beans"), item("Corn")];
        let merged = merge(&[], &remote);

        assert_eq!(merged.items, remote);
        assert_eq!(merged.appended, ids(&remote));
        assert!(merged.kept_local.is_empty());
    }

    #[test]
    fn local_wins_on_shared_id() {
        let local_a = item("Oats");
        let mut remote_a = local_a.clone();
        remote_a.name = "Rolled oats".to_string();
        remote_a.expires_at = 99_999;
        let remote_d = item("Flour");

        let merged = merge(&[local_a.clone()], &[remote_a, remote_d.clone()]);

        assert_eq!(merged.items, vec![local_a.clone(), remote_d.clone()]);
        assert_eq!(merged.appended, vec![remote_d.id]);
        assert_eq!(merged.kept_local, vec![local_a.id]);
    }

    #[test]
    fn merge_is_idempotent() {
        let local = vec![item("Salt"), item("Sugar")];
        let mut shared = local[0].clone();
        shared.name = "Sea salt".to_string();
        let remote = vec![item("Pepper"), shared, item("Cumin")];

        let once = merge(&local, &remote);
        let twice = merge(&once.items, &remote);

        assert_eq!(twice.items, once.items);
        assert!(twice.is_unchanged());
    }

    #[test]
    fn merge_contains_union_without_duplicates() {
        let local = vec![item("Tea"), item("Coffee")];
        let extra = item("Cocoa");
        // duplicate ids inside the remote snapshot itself are appended once
        let remote = vec![extra.clone(), local[1].clone(), extra.clone()];

        let merged = merge(&local, &remote);
        let merged_ids = ids(&merged.items);
        let unique: HashSet<_> = merged_ids.iter().copied().collect();

        assert_eq!(merged_ids.len(), unique.len());
        assert_eq!(merged_ids.len(), 3);
        for id in ids(&local).into_iter().chain([extra.id]) {
            assert!(unique.contains(&id));
        }
    }

    #[test]
    fn remote_order_does_not_change_membership() {
        let local = vec![item("Rice")];
        let remote = vec![item("Lentils"), item("Quinoa"), local[0].clone()];
        let mut reversed = remote.clone();
        reversed.reverse();

        let forward: HashSet<_> = ids(&merge(&local, &remote).items).into_iter().collect();
        let backward: HashSet<_> = ids(&merge(&local, &reversed).items).into_iter().collect();

        assert_eq!(forward, backward);
    }

    #[test]
    fn merge_is_asymmetric() {
        let local = item("Butter");
        let mut remote = local.clone();
        remote.name = "Salted butter".to_string();

        let local_first = merge(&[local.clone()], &[remote.clone()]);
        let remote_first = merge(&[remote.clone()], &[local.clone()]);

        assert_eq!(local_first.items, vec![local]);
        assert_eq!(remote_first.items, vec![remote]);
    }

    mod properties {
        use std::collections::BTreeSet;

        use proptest::prelude::*;

        use super::*;

        const ID_POOL: usize = 16;

        fn pooled_item(index: usize, side: &str) -> InventoryItem {
            let mut item = InventoryItem::new(format!("{side} {index}"), FoodCategory::Pantry, 1_000);
            item.id = format!("01900000-0000-7000-8000-{index:012}").parse().unwrap();
            item
        }

        /// A snapshot drawn from the shared id pool, in arbitrary order.
        fn arb_snapshot(side: &'static str) -> impl Strategy<Value = Vec<InventoryItem>> {
            proptest::sample::subsequence((0..ID_POOL).collect::<Vec<_>>(), 0..=ID_POOL)
                .prop_shuffle()
                .prop_map(move |indexes| {
                    indexes
                        .into_iter()
                        .map(|index| pooled_item(index, side))
                        .collect()
                })
        }

        proptest! {
            #[test]
            fn merging_twice_changes_nothing(
                local in arb_snapshot("local"),
                remote in arb_snapshot("remote"),
            ) {
                let once = merge(&local, &remote);
                let twice = merge(&once.items, &remote);

                prop_assert_eq!(&twice.items, &once.items);
                prop_assert!(twice.is_unchanged());
            }

            #[test]
            fn local_version_wins_for_shared_ids(
                local in arb_snapshot("local"),
                remote in arb_snapshot("remote"),
            ) {
                let merged = merge(&local, &remote);

                prop_assert_eq!(&merged.items[..local.len()], &local[..]);
                for item in &merged.items {
                    if let Some(local_item) = local.iter().find(|candidate| candidate.id == item.id) {
                        prop_assert_eq!(item, local_item);
                    }
                }
            }

            #[test]
            fn merged_ids_are_the_union_without_duplicates(
                local in arb_snapshot("local"),
                remote in arb_snapshot("remote"),
            ) {
                let merged = merge(&local, &remote);
                let expected: BTreeSet<ItemId> =
                    ids(&local).into_iter().chain(ids(&remote)).collect();
                let merged_ids = ids(&merged.items);
                let actual: BTreeSet<ItemId> = merged_ids.iter().copied().collect();

                prop_assert_eq!(merged_ids.len(), expected.len());
                prop_assert_eq!(actual, expected);
            }

            #[test]
            fn remote_order_never_changes_membership(
                local in arb_snapshot("local"),
                remote in arb_snapshot("remote"),
            ) {
                let mut reversed = remote.clone();
                reversed.reverse();

                let forward: BTreeSet<ItemId> = ids(&merge(&local, &remote).items).into_iter().collect();
                let backward: BTreeSet<ItemId> = ids(&merge(&local, &reversed).items).into_iter().collect();

                prop_assert_eq!(forward, backward);
            }
        }
    }
}
