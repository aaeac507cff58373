//! Arena-backed organization tree.
//!
//! Nodes live in a map keyed by id with explicit parent and children links.
//! The parent-type rule makes cycles impossible: a parent's type is always
//! strictly one rank above its child's, so following parents strictly
//! decreases the rank and must terminate.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use tmi_shared::types::{CompanyId, GroupId, MetaGroupId};

use super::error::OrganizationError;
use super::types::{Group, GroupType, MetaGroup};

#[derive(Debug, Clone)]
struct TreeNode {
    meta: MetaGroup,
    children: Vec<MetaGroupId>,
    child_value: u64,
    level: u32,
}

/// A forest of organizational nodes plus their operational groups.
///
/// Built once from loaded records; `child_value` and `level` are computed
/// for every node at build time.
#[derive(Debug, Clone, Default)]
pub struct OrganizationTree {
    nodes: HashMap<MetaGroupId, TreeNode>,
    roots: Vec<MetaGroupId>,
    group_by_meta: HashMap<MetaGroupId, Group>,
    meta_by_group: HashMap<GroupId, MetaGroupId>,
}

fn type_name(t: Option<GroupType>) -> String {
    t.map_or_else(|| "none".to_string(), |t| t.as_str().to_string())
}

fn sibling_order(a: &MetaGroup, b: &MetaGroup) -> Ordering {
    a.sequence
        .cmp(&b.sequence)
        .then_with(|| a.code.cmp(&b.code))
        .then_with(|| a.name.cmp(&b.name))
}

impl OrganizationTree {
    /// Checks the parent-type rule for `node`.
    ///
    /// Roots may have any type (a company can own just a district), but a
    /// node with a parent must sit exactly one rank below it.
    pub fn validate_parent(node: &MetaGroup, parent: Option<&MetaGroup>) -> Result<(), OrganizationError> {
        let Some(parent) = parent else {
            return Ok(());
        };
        let expected = node.group_type.parent_type();
        if expected != Some(parent.group_type) {
            return Err(OrganizationError::InvalidParentType {
                name: node.name.clone(),
                child_type: node.group_type,
                expected: type_name(expected),
                actual: parent.group_type.as_str().to_string(),
            });
        }
        Ok(())
    }

    /// Checks that `parent` belongs to the node's company or to one of the
    /// companies visible from it.
    pub fn validate_parent_company(
        node: &MetaGroup,
        parent: &MetaGroup,
        visible_companies: &HashSet<CompanyId>,
    ) -> Result<(), OrganizationError> {
        if parent.company_id == node.company_id || visible_companies.contains(&parent.company_id) {
            Ok(())
        } else {
            Err(OrganizationError::ParentCompanyMismatch(node.name.clone()))
        }
    }

    /// Checks that `meta` may receive an operational group.
    pub fn validate_group(&self, meta: &MetaGroup) -> Result<(), OrganizationError> {
        if !meta.group_type.has_operational_group() {
            return Err(OrganizationError::GroupNotAllowed {
                name: meta.name.clone(),
                group_type: meta.group_type,
            });
        }
        if self.group_by_meta.contains_key(&meta.id) {
            return Err(OrganizationError::DuplicateGroup(meta.name.clone()));
        }
        Ok(())
    }

    /// Builds the tree, validating every parent link and group binding.
    pub fn build(metas: Vec<MetaGroup>, groups: Vec<Group>) -> Result<Self, OrganizationError> {
        let mut nodes: HashMap<MetaGroupId, TreeNode> = metas
            .into_iter()
            .map(|meta| {
                (
                    meta.id,
                    TreeNode {
                        meta,
                        children: Vec::new(),
                        child_value: 0,
                        level: 0,
                    },
                )
            })
            .collect();

        let mut roots = Vec::new();
        let mut links = Vec::new();
        for node in nodes.values() {
            match node.meta.parent_id {
                None => roots.push(node.meta.id),
                Some(parent_id) => {
                    let parent = nodes
                        .get(&parent_id)
                        .ok_or(OrganizationError::NodeNotFound(parent_id))?;
                    Self::validate_parent(&node.meta, Some(&parent.meta))?;
                    links.push((parent_id, node.meta.id));
                }
            }
        }
        for (parent_id, child_id) in links {
            if let Some(parent) = nodes.get_mut(&parent_id) {
                parent.children.push(child_id);
            }
        }

        // Rank order: parents before children for levels, the reverse for
        // leaf counts.
        let mut by_rank: Vec<(GroupType, MetaGroupId)> =
            nodes.values().map(|n| (n.meta.group_type, n.meta.id)).collect();
        by_rank.sort_unstable();

        for &(_, id) in &by_rank {
            let parent_level = nodes
                .get(&id)
                .and_then(|n| n.meta.parent_id)
                .and_then(|p| nodes.get(&p))
                .map(|p| p.level + 1);
            if let (Some(level), Some(node)) = (parent_level, nodes.get_mut(&id)) {
                node.level = level;
            }
        }

        for &(group_type, id) in by_rank.iter().rev() {
            let value = if group_type == GroupType::SmallGroup {
                1
            } else {
                nodes.get(&id).map_or(0, |n| {
                    n.children
                        .iter()
                        .filter_map(|c| nodes.get(c))
                        .map(|c| c.child_value)
                        .sum::<u64>()
                })
            };
            if let Some(node) = nodes.get_mut(&id) {
                node.child_value = value;
            }
        }

        let metas_by_id: HashMap<MetaGroupId, MetaGroup> =
            nodes.iter().map(|(id, n)| (*id, n.meta.clone())).collect();
        for node in nodes.values_mut() {
            node.children.sort_by(|a, b| match (metas_by_id.get(a), metas_by_id.get(b)) {
                (Some(a), Some(b)) => sibling_order(a, b),
                _ => a.cmp(b),
            });
        }
        roots.sort_by(|a, b| match (metas_by_id.get(a), metas_by_id.get(b)) {
            (Some(a), Some(b)) => sibling_order(a, b),
            _ => a.cmp(b),
        });

        let mut tree = Self {
            nodes,
            roots,
            group_by_meta: HashMap::new(),
            meta_by_group: HashMap::new(),
        };
        for group in groups {
            let meta = tree.node(group.meta_id)?.clone();
            tree.validate_group(&meta)?;
            tree.group_by_meta.insert(group.meta_id, group);
            tree.meta_by_group.insert(group.id, group.meta_id);
        }
        Ok(tree)
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the tree has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Root nodes in sibling order.
    #[must_use]
    pub fn roots(&self) -> &[MetaGroupId] {
        &self.roots
    }

    /// Returns a node if it exists.
    #[must_use]
    pub fn get(&self, id: MetaGroupId) -> Option<&MetaGroup> {
        self.nodes.get(&id).map(|n| &n.meta)
    }

    /// Returns a node or `NodeNotFound`.
    pub fn node(&self, id: MetaGroupId) -> Result<&MetaGroup, OrganizationError> {
        self.get(id).ok_or(OrganizationError::NodeNotFound(id))
    }

    /// Direct children in sibling order.
    pub fn children(&self, id: MetaGroupId) -> Result<&[MetaGroupId], OrganizationError> {
        self.nodes
            .get(&id)
            .map(|n| n.children.as_slice())
            .ok_or(OrganizationError::NodeNotFound(id))
    }

    /// Number of small group leaves under the node (1 for a small group).
    pub fn child_value(&self, id: MetaGroupId) -> Result<u64, OrganizationError> {
        self.nodes
            .get(&id)
            .map(|n| n.child_value)
            .ok_or(OrganizationError::NodeNotFound(id))
    }

    /// Depth from the node's root, 0 for roots.
    pub fn level(&self, id: MetaGroupId) -> Result<u32, OrganizationError> {
        self.nodes
            .get(&id)
            .map(|n| n.level)
            .ok_or(OrganizationError::NodeNotFound(id))
    }

    /// The node and all its descendants, depth-first in sibling order.
    pub fn descendants(&self, id: MetaGroupId) -> Result<Vec<MetaGroupId>, OrganizationError> {
        self.node(id)?;
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            if let Some(node) = self.nodes.get(&current) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        Ok(out)
    }

    /// Union of the descendant sets (node included) of every id.
    pub fn closure(&self, ids: &[MetaGroupId]) -> Result<HashSet<MetaGroupId>, OrganizationError> {
        let mut out = HashSet::new();
        for &id in ids {
            if out.contains(&id) {
                continue;
            }
            out.extend(self.descendants(id)?);
        }
        Ok(out)
    }

    /// All descendants of `id` (node excluded), depth-first, each set of
    /// siblings sorted with `compare`. Used to flatten a subtree for
    /// printing.
    pub fn childs_by_order<F>(&self, id: MetaGroupId, mut compare: F) -> Result<Vec<MetaGroupId>, OrganizationError>
    where
        F: FnMut(&MetaGroup, &MetaGroup) -> Ordering,
    {
        self.node(id)?;
        let mut out = Vec::new();
        self.collect_ordered(id, &mut compare, &mut out);
        Ok(out)
    }

    fn collect_ordered<F>(&self, id: MetaGroupId, compare: &mut F, out: &mut Vec<MetaGroupId>)
    where
        F: FnMut(&MetaGroup, &MetaGroup) -> Ordering,
    {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        let mut children: Vec<&MetaGroup> = node
            .children
            .iter()
            .filter_map(|c| self.nodes.get(c).map(|n| &n.meta))
            .collect();
        children.sort_by(|a, b| compare(a, b));
        for child in children {
            out.push(child.id);
            self.collect_ordered(child.id, compare, out);
        }
    }

    /// Every node of the given type, sorted by sibling order.
    #[must_use]
    pub fn of_type(&self, group_type: GroupType) -> Vec<MetaGroupId> {
        let mut metas: Vec<&MetaGroup> = self
            .nodes
            .values()
            .map(|n| &n.meta)
            .filter(|m| m.group_type == group_type)
            .collect();
        metas.sort_by(|a, b| sibling_order(a, b));
        metas.into_iter().map(|m| m.id).collect()
    }

    /// Operational group bound to a node.
    #[must_use]
    pub fn group_for(&self, meta_id: MetaGroupId) -> Option<&Group> {
        self.group_by_meta.get(&meta_id)
    }

    /// Node an operational group stands for.
    #[must_use]
    pub fn meta_of_group(&self, group_id: GroupId) -> Option<MetaGroupId> {
        self.meta_by_group.get(&group_id).copied()
    }

    /// Active small group children of a church that carry a group, in
    /// sibling order.
    pub fn active_small_groups(&self, church: MetaGroupId) -> Result<Vec<Group>, OrganizationError> {
        Ok(self
            .children(church)?
            .iter()
            .filter_map(|id| self.get(*id))
            .filter(|m| m.active && m.group_type == GroupType::SmallGroup)
            .filter_map(|m| self.group_for(m.id).copied())
            .collect())
    }

    /// `name - code - parent name`, leaving out what is missing.
    pub fn display_name(&self, id: MetaGroupId) -> Result<String, OrganizationError> {
        let meta = self.node(id)?;
        let mut parts = vec![meta.name.as_str()];
        if let Some(code) = meta.code.as_deref() {
            parts.push(code);
        }
        if let Some(parent) = meta.parent_id.and_then(|p| self.get(p)) {
            parts.push(parent.name.as_str());
        }
        Ok(parts.join(" - "))
    }

    /// Nodes whose code, type or name contains `text` (case-insensitive).
    #[must_use]
    pub fn search(&self, text: &str) -> Vec<MetaGroupId> {
        let needle = text.to_lowercase();
        let mut hits: Vec<&MetaGroup> = self
            .nodes
            .values()
            .map(|n| &n.meta)
            .filter(|m| {
                m.name.to_lowercase().contains(&needle)
                    || m.group_type.as_str().contains(&needle)
                    || m.code.as_deref().is_some_and(|c| c.to_lowercase().contains(&needle))
            })
            .collect();
        hits.sort_by(|a, b| sibling_order(a, b));
        hits.into_iter().map(|m| m.id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn company() -> CompanyId {
        CompanyId::from(Uuid::nil())
    }

    fn node(name: &str, group_type: GroupType, parent: Option<&MetaGroup>) -> MetaGroup {
        MetaGroup {
            id: MetaGroupId::generate(),
            company_id: company(),
            name: name.to_string(),
            code: None,
            active: true,
            group_type,
            parent_id: parent.map(|p| p.id),
            sequence: 0,
        }
    }

    /// district → 2 churches → 3 small groups each
    fn district_fixture() -> (Vec<MetaGroup>, MetaGroup, Vec<MetaGroup>) {
        let district = node("District", GroupType::District, None);
        let mut all = vec![district.clone()];
        let mut churches = Vec::new();
        for c in 0..2 {
            let church = node(&format!("Church {c}"), GroupType::Church, Some(&district));
            for s in 0..3 {
                all.push(node(&format!("SG {c}.{s}"), GroupType::SmallGroup, Some(&church)));
            }
            churches.push(church.clone());
            all.push(church);
        }
        (all, district, churches)
    }

    #[test]
    fn test_child_value_counts_leaves() {
        let (all, district, churches) = district_fixture();
        let tree = OrganizationTree::build(all.clone(), vec![]).unwrap();

        assert_eq!(tree.child_value(district.id).unwrap(), 6);
        assert_eq!(tree.child_value(churches[0].id).unwrap(), 3);
        for m in all.iter().filter(|m| m.group_type == GroupType::SmallGroup) {
            assert_eq!(tree.child_value(m.id).unwrap(), 1);
        }
    }

    #[test]
    fn test_empty_church_has_no_value() {
        let district = node("District", GroupType::District, None);
        let church = node("Church", GroupType::Church, Some(&district));
        let tree = OrganizationTree::build(vec![district.clone(), church.clone()], vec![]).unwrap();
        assert_eq!(tree.child_value(church.id).unwrap(), 0);
        assert_eq!(tree.child_value(district.id).unwrap(), 0);
    }

    #[test]
    fn test_levels() {
        let (all, district, churches) = district_fixture();
        let tree = OrganizationTree::build(all.clone(), vec![]).unwrap();
        assert_eq!(tree.level(district.id).unwrap(), 0);
        assert_eq!(tree.level(churches[1].id).unwrap(), 1);
        let leaf = all.iter().find(|m| m.group_type == GroupType::SmallGroup).unwrap();
        assert_eq!(tree.level(leaf.id).unwrap(), 2);
    }

    #[test]
    fn test_wrong_parent_type_rejected() {
        let district = node("District", GroupType::District, None);
        let leaf = node("Orphan SG", GroupType::SmallGroup, Some(&district));
        let err = OrganizationTree::build(vec![district, leaf], vec![]).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_PARENT_TYPE");
        assert_eq!(
            err.to_string(),
            "\"Orphan SG\" is a small_group and needs a church parent, got district"
        );
    }

    #[test]
    fn test_missing_parent_rejected() {
        let ghost = node("Ghost", GroupType::Church, None);
        let leaf = node("SG", GroupType::SmallGroup, Some(&ghost));
        assert_eq!(
            OrganizationTree::build(vec![leaf], vec![]).unwrap_err(),
            OrganizationError::NodeNotFound(ghost.id)
        );
    }

    #[test]
    fn test_closure_and_descendants() {
        let (all, district, churches) = district_fixture();
        let tree = OrganizationTree::build(all, vec![]).unwrap();

        let below_church = tree.descendants(churches[0].id).unwrap();
        assert_eq!(below_church.len(), 4);
        assert_eq!(below_church[0], churches[0].id);

        let closure = tree.closure(&[district.id, churches[0].id]).unwrap();
        assert_eq!(closure.len(), 9);
        assert!(tree.closure(&[MetaGroupId::generate()]).is_err());
    }

    #[test]
    fn test_childs_by_order_is_depth_first() {
        let (all, district, _) = district_fixture();
        let tree = OrganizationTree::build(all, vec![]).unwrap();
        let ordered = tree
            .childs_by_order(district.id, |a, b| b.name.cmp(&a.name))
            .unwrap();
        let names: Vec<_> = ordered.iter().map(|id| tree.get(*id).unwrap().name.clone()).collect();
        assert_eq!(
            names,
            vec!["Church 1", "SG 1.2", "SG 1.1", "SG 1.0", "Church 0", "SG 0.2", "SG 0.1", "SG 0.0"]
        );
    }

    #[test]
    fn test_groups_bind_once_to_operational_nodes() {
        let (all, district, churches) = district_fixture();
        let church_group = Group {
            id: GroupId::generate(),
            meta_id: churches[0].id,
        };
        let tree = OrganizationTree::build(all.clone(), vec![church_group]).unwrap();
        assert_eq!(tree.meta_of_group(church_group.id), Some(churches[0].id));
        assert_eq!(tree.group_for(churches[0].id), Some(&church_group));

        let duplicate = Group {
            id: GroupId::generate(),
            meta_id: churches[0].id,
        };
        assert_eq!(
            OrganizationTree::build(all.clone(), vec![church_group, duplicate]).unwrap_err().error_code(),
            "DUPLICATE_GROUP"
        );

        let on_district = Group {
            id: GroupId::generate(),
            meta_id: district.id,
        };
        assert_eq!(
            OrganizationTree::build(all, vec![on_district]).unwrap_err().error_code(),
            "GROUP_NOT_ALLOWED"
        );
    }

    #[test]
    fn test_active_small_groups_skip_inactive_and_unbound() {
        let church = node("Church", GroupType::Church, None);
        let a = node("A", GroupType::SmallGroup, Some(&church));
        let mut b = node("B", GroupType::SmallGroup, Some(&church));
        b.active = false;
        let c = node("C", GroupType::SmallGroup, Some(&church));
        let groups = vec![
            Group { id: GroupId::generate(), meta_id: a.id },
            Group { id: GroupId::generate(), meta_id: b.id },
        ];
        let tree = OrganizationTree::build(vec![church.clone(), a.clone(), b, c], groups).unwrap();
        let prefill = tree.active_small_groups(church.id).unwrap();
        assert_eq!(prefill.len(), 1);
        assert_eq!(prefill[0].meta_id, a.id);
    }

    #[test]
    fn test_display_name_and_search() {
        let district = node("North", GroupType::District, None);
        let mut church = node("Central", GroupType::Church, Some(&district));
        church.code = Some("C-01".into());
        let tree = OrganizationTree::build(vec![district.clone(), church.clone()], vec![]).unwrap();

        assert_eq!(tree.display_name(church.id).unwrap(), "Central - C-01 - North");
        assert_eq!(tree.display_name(district.id).unwrap(), "North");
        assert_eq!(tree.search("c-0"), vec![church.id]);
        assert_eq!(tree.search("district"), vec![district.id]);
        assert_eq!(tree.search("NORTH"), vec![district.id]);
    }

    #[test]
    fn test_parent_company_visibility() {
        let parent = node("District", GroupType::District, None);
        let mut child = node("Church", GroupType::Church, Some(&parent));
        child.company_id = CompanyId::generate();

        let mut visible = HashSet::new();
        assert!(OrganizationTree::validate_parent_company(&child, &parent, &visible).is_err());
        visible.insert(parent.company_id);
        assert!(OrganizationTree::validate_parent_company(&child, &parent, &visible).is_ok());
    }
}
