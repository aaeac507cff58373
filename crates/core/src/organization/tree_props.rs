//! Property-based tests for the organization tree.

use proptest::prelude::*;
use tmi_shared::types::{CompanyId, MetaGroupId};

use super::tree::OrganizationTree;
use super::types::{GroupType, MetaGroup};

fn arb_type() -> impl Strategy<Value = GroupType> {
    (0usize..GroupType::ALL.len()).prop_map(|i| GroupType::ALL[i])
}

fn node(group_type: GroupType, parent: Option<MetaGroupId>) -> MetaGroup {
    MetaGroup {
        id: MetaGroupId::generate(),
        company_id: CompanyId::from(uuid::Uuid::nil()),
        name: format!("{group_type}"),
        code: None,
        active: true,
        group_type,
        parent_id: parent,
        sequence: 0,
    }
}

/// A zone with a random number of districts, churches and small groups.
/// Returns the nodes and the number of small groups.
fn build_zone(shape: &[Vec<usize>]) -> (Vec<MetaGroup>, MetaGroupId, usize) {
    let zone = node(GroupType::Zone, None);
    let zone_id = zone.id;
    let mut all = vec![zone];
    let mut leaves = 0;
    for churches in shape {
        let district = node(GroupType::District, Some(zone_id));
        let district_id = district.id;
        all.push(district);
        for &small_groups in churches {
            let church = node(GroupType::Church, Some(district_id));
            let church_id = church.id;
            all.push(church);
            for _ in 0..small_groups {
                all.push(node(GroupType::SmallGroup, Some(church_id)));
                leaves += 1;
            }
        }
    }
    (all, zone_id, leaves)
}

fn arb_shape() -> impl Strategy<Value = Vec<Vec<usize>>> {
    prop::collection::vec(prop::collection::vec(0usize..5, 0..4), 0..4)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // =========================================================================
    // Parent links are accepted exactly when the parent is one rank up
    // =========================================================================

    #[test]
    fn prop_parent_type_invariant(child_type in arb_type(), parent_type in arb_type()) {
        let parent = node(parent_type, None);
        let child = node(child_type, Some(parent.id));
        let result = OrganizationTree::build(vec![parent, child], vec![]);
        if child_type.parent_type() == Some(parent_type) {
            prop_assert!(result.is_ok());
        } else {
            prop_assert!(result.is_err());
        }
    }

    // =========================================================================
    // child_value of any node equals the small groups found below it
    // =========================================================================

    #[test]
    fn prop_child_value_counts_small_groups(shape in arb_shape()) {
        let (all, zone_id, leaves) = build_zone(&shape);
        let tree = OrganizationTree::build(all.clone(), vec![]).unwrap();

        prop_assert_eq!(tree.child_value(zone_id).unwrap(), leaves as u64);
        for meta in &all {
            let below = tree
                .descendants(meta.id)
                .unwrap()
                .into_iter()
                .filter(|id| tree.get(*id).unwrap().group_type == GroupType::SmallGroup)
                .count();
            prop_assert_eq!(tree.child_value(meta.id).unwrap(), below as u64);
        }
    }

    // =========================================================================
    // Every node is reached exactly once from the root
    // =========================================================================

    #[test]
    fn prop_descendants_visit_each_node_once(shape in arb_shape()) {
        let (all, zone_id, _) = build_zone(&shape);
        let tree = OrganizationTree::build(all.clone(), vec![]).unwrap();

        let visited = tree.descendants(zone_id).unwrap();
        prop_assert_eq!(visited.len(), all.len());
        prop_assert_eq!(tree.closure(&[zone_id]).unwrap().len(), all.len());

        let ordered = tree.childs_by_order(zone_id, |a, b| a.name.cmp(&b.name)).unwrap();
        prop_assert_eq!(ordered.len(), all.len() - 1);
        for id in ordered {
            let meta = tree.get(id).unwrap();
            prop_assert_eq!(tree.level(id).unwrap(), meta.group_type.rank() as u32 - GroupType::Zone.rank() as u32);
        }
    }
}
