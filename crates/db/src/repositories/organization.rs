//! Organization tree repository.
//!
//! Nodes (`meta_groups`) and their operational records (`groups`) are
//! validated against the loaded tree before any write. Built trees are
//! kept in a [`TreeCache`] and every node or group write drops the cache.

use std::collections::HashSet;
use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tmi_core::organization::{Group, GroupType, MetaGroup, OrganizationError, OrganizationTree, TreeCache};
use tmi_shared::config::CacheConfig;
use tmi_shared::types::{CompanyId, GroupId, MetaGroupId};
use tracing::{debug, info, warn};

use super::company::visible_companies;
use crate::entities::{groups, lines, meta_groups, moves};

/// Error types for organization repository operations.
#[derive(Debug, thiserror::Error)]
pub enum OrganizationRepoError {
    /// A tree rule was violated.
    #[error(transparent)]
    Organization(#[from] OrganizationError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a node.
#[derive(Debug, Clone)]
pub struct CreateMetaGroupInput {
    /// Owning company.
    pub company_id: CompanyId,
    /// Node name.
    pub name: String,
    /// Optional short code.
    pub code: Option<String>,
    /// Whether the node accepts new lines.
    pub active: bool,
    /// Level in the hierarchy.
    pub group_type: GroupType,
    /// Parent node.
    pub parent_id: Option<MetaGroupId>,
    /// Manual sort position.
    pub sequence: i32,
}

impl CreateMetaGroupInput {
    /// An active small group with no parent.
    #[must_use]
    pub fn new(company_id: CompanyId, name: impl Into<String>) -> Self {
        Self {
            company_id,
            name: name.into(),
            code: None,
            active: true,
            group_type: GroupType::SmallGroup,
            parent_id: None,
            sequence: 0,
        }
    }

    /// Sets the node type.
    #[must_use]
    pub fn of_type(mut self, group_type: GroupType) -> Self {
        self.group_type = group_type;
        self
    }

    /// Sets the parent node.
    #[must_use]
    pub fn under(mut self, parent_id: MetaGroupId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Sets the code.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

/// Changes to an existing node. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateMetaGroupInput {
    /// New name.
    pub name: Option<String>,
    /// New code (`Some(None)` clears it).
    pub code: Option<Option<String>>,
    /// New active flag.
    pub active: Option<bool>,
    /// New sort position.
    pub sequence: Option<i32>,
    /// New parent (`Some(None)` makes the node a root).
    pub parent_id: Option<Option<MetaGroupId>>,
}

/// Organization tree repository.
#[derive(Debug, Clone)]
pub struct OrganizationRepository {
    db: DatabaseConnection,
    cache: TreeCache,
}

impl OrganizationRepository {
    /// Creates a new organization repository with a default tree cache.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self::with_cache(db, TreeCache::new())
    }

    /// Creates a repository sharing `cache` with other repositories.
    #[must_use]
    pub fn with_cache(db: DatabaseConnection, cache: TreeCache) -> Self {
        Self { db, cache }
    }

    /// Creates a repository with a cache sized from configuration.
    #[must_use]
    pub fn from_config(db: DatabaseConnection, config: &CacheConfig) -> Self {
        Self::with_cache(db, TreeCache::with_config(config.tree_capacity, config.tree_ttl_secs))
    }

    /// The tree cache, for sharing with the aggregation repository.
    #[must_use]
    pub fn cache(&self) -> &TreeCache {
        &self.cache
    }

    /// Creates a node after checking the parent type and company.
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` for an unknown parent, `InvalidParentType` or
    /// `ParentCompanyMismatch`, or a database error.
    pub async fn create_meta_group(&self, input: CreateMetaGroupInput) -> Result<MetaGroup, OrganizationRepoError> {
        let txn = self.db.begin().await?;

        let node = MetaGroup {
            id: MetaGroupId::generate(),
            company_id: input.company_id,
            name: input.name,
            code: input.code,
            active: input.active,
            group_type: input.group_type,
            parent_id: input.parent_id,
            sequence: input.sequence,
        };
        check_parent(&txn, &node).await?;

        let now = chrono::Utc::now().into();
        meta_groups::ActiveModel {
            id: Set(node.id.uuid()),
            company_id: Set(node.company_id.uuid()),
            name: Set(node.name.clone()),
            code: Set(node.code.clone()),
            active: Set(node.active),
            group_type: Set(node.group_type.into()),
            parent_id: Set(node.parent_id.map(MetaGroupId::uuid)),
            sequence: Set(node.sequence),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        self.cache.invalidate_all();
        info!(meta_id = %node.id, group_type = %node.group_type, "Node created");
        Ok(node)
    }

    /// Updates a node, re-checking the parent when it changes.
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound`, a parent rule error, or a database error.
    pub async fn update_meta_group(
        &self,
        id: MetaGroupId,
        changes: UpdateMetaGroupInput,
    ) -> Result<MetaGroup, OrganizationRepoError> {
        let txn = self.db.begin().await?;

        let mut node = require_node(&txn, id).await?;
        if let Some(name) = changes.name {
            node.name = name;
        }
        if let Some(code) = changes.code {
            node.code = code;
        }
        if let Some(active) = changes.active {
            node.active = active;
        }
        if let Some(sequence) = changes.sequence {
            node.sequence = sequence;
        }
        if let Some(parent_id) = changes.parent_id {
            node.parent_id = parent_id;
            check_parent(&txn, &node).await?;
        }

        meta_groups::ActiveModel {
            id: Set(id.uuid()),
            name: Set(node.name.clone()),
            code: Set(node.code.clone()),
            active: Set(node.active),
            sequence: Set(node.sequence),
            parent_id: Set(node.parent_id.map(MetaGroupId::uuid)),
            ..Default::default()
        }
        .update(&txn)
        .await?;

        txn.commit().await?;
        self.cache.invalidate_all();
        info!(meta_id = %id, "Node updated");
        Ok(node)
    }

    /// Activates or deactivates a node.
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound`, or a database error.
    pub async fn set_active(&self, id: MetaGroupId, active: bool) -> Result<MetaGroup, OrganizationRepoError> {
        self.update_meta_group(
            id,
            UpdateMetaGroupInput {
                active: Some(active),
                ..Default::default()
            },
        )
        .await
    }

    /// Deletes a node that has no children, operational group or moves.
    ///
    /// A bound group must be removed first with [`Self::delete_group`].
    ///
    /// # Errors
    ///
    /// Returns `NodeInUse` when anything still references the node.
    pub async fn delete_meta_group(&self, id: MetaGroupId) -> Result<(), OrganizationRepoError> {
        let txn = self.db.begin().await?;

        let node = require_node(&txn, id).await?;
        let children = meta_groups::Entity::find()
            .filter(meta_groups::Column::ParentId.eq(id.uuid()))
            .count(&txn)
            .await?;
        let move_count = moves::Entity::find()
            .filter(moves::Column::GroupId.eq(id.uuid()))
            .count(&txn)
            .await?;
        let has_group = groups::Entity::find()
            .filter(groups::Column::MetaId.eq(id.uuid()))
            .one(&txn)
            .await?
            .is_some();
        if has_group || children + move_count > 0 {
            warn!(meta_id = %id, children, move_count, has_group, "Node delete rejected");
            return Err(OrganizationError::NodeInUse(node.name).into());
        }

        meta_groups::Entity::delete_by_id(id.uuid()).exec(&txn).await?;
        txn.commit().await?;
        self.cache.invalidate_all();
        info!(meta_id = %id, "Node deleted");
        Ok(())
    }

    /// Unbinds the operational group of a node. Groups with lines stay.
    ///
    /// # Errors
    ///
    /// Returns `GroupNotFound`, or `NodeInUse` while lines reference the
    /// group.
    pub async fn delete_group(&self, id: GroupId) -> Result<(), OrganizationRepoError> {
        let txn = self.db.begin().await?;

        let group = groups::Entity::find_by_id(id.uuid())
            .one(&txn)
            .await?
            .ok_or(OrganizationError::GroupNotFound(id))?;
        let line_count = lines::Entity::find()
            .filter(lines::Column::GroupId.eq(group.id))
            .count(&txn)
            .await?;
        if line_count > 0 {
            let node = require_node(&txn, MetaGroupId::from(group.meta_id)).await?;
            warn!(group_id = %id, line_count, "Group delete rejected");
            return Err(OrganizationError::NodeInUse(node.name).into());
        }

        groups::Entity::delete_by_id(id.uuid()).exec(&txn).await?;
        txn.commit().await?;
        self.cache.invalidate_all();
        info!(group_id = %id, "Group deleted");
        Ok(())
    }

    /// Binds an operational group to a church or small group node.
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound`, `GroupNotAllowed` or `DuplicateGroup`, or a
    /// database error.
    pub async fn create_group(&self, meta_id: MetaGroupId) -> Result<Group, OrganizationRepoError> {
        let txn = self.db.begin().await?;

        let meta = require_node(&txn, meta_id).await?;
        let tree = load_tree(&txn, meta.company_id).await?;
        tree.validate_group(&meta)?;

        let group = Group {
            id: GroupId::generate(),
            meta_id,
        };
        let now = chrono::Utc::now().into();
        groups::ActiveModel {
            id: Set(group.id.uuid()),
            company_id: Set(meta.company_id.uuid()),
            meta_id: Set(meta_id.uuid()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        self.cache.invalidate_all();
        info!(meta_id = %meta_id, group_id = %group.id, "Group created");
        Ok(group)
    }

    /// Finds a node by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get_meta_group(&self, id: MetaGroupId) -> Result<Option<MetaGroup>, OrganizationRepoError> {
        Ok(meta_groups::Entity::find_by_id(id.uuid())
            .one(&self.db)
            .await?
            .map(MetaGroup::from))
    }

    /// The tree visible from a company, built once and then cached.
    ///
    /// # Errors
    ///
    /// Returns a tree build error for inconsistent stored data, or a
    /// database error.
    pub async fn tree(&self, company_id: CompanyId) -> Result<Arc<OrganizationTree>, OrganizationRepoError> {
        cached_tree(&self.db, &self.cache, company_id).await
    }

    /// Nodes whose code, type or name contains `text`, in display order.
    ///
    /// # Errors
    ///
    /// Returns an error if the tree cannot be loaded.
    pub async fn search(&self, company_id: CompanyId, text: &str) -> Result<Vec<MetaGroup>, OrganizationRepoError> {
        let tree = self.tree(company_id).await?;
        Ok(tree
            .search(text)
            .into_iter()
            .filter_map(|id| tree.get(id).cloned())
            .collect())
    }

    /// Display name `name - code - parent name` of a node.
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound`, or an error if the tree cannot be loaded.
    pub async fn display_name(&self, company_id: CompanyId, id: MetaGroupId) -> Result<String, OrganizationRepoError> {
        Ok(self.tree(company_id).await?.display_name(id)?)
    }
}

/// Reads a tree from the cache, building and caching it on a miss.
pub(crate) async fn cached_tree<C: ConnectionTrait>(
    conn: &C,
    cache: &TreeCache,
    company_id: CompanyId,
) -> Result<Arc<OrganizationTree>, OrganizationRepoError> {
    if let Some(tree) = cache.get(company_id) {
        return Ok(tree);
    }
    let tree = load_tree(conn, company_id).await?;
    debug!(company_id = %company_id, nodes = tree.len(), "Organization tree loaded");
    Ok(cache.insert(company_id, tree))
}

/// Loads every node and group visible from a company and builds the tree.
pub(crate) async fn load_tree<C: ConnectionTrait>(
    conn: &C,
    company_id: CompanyId,
) -> Result<OrganizationTree, OrganizationRepoError> {
    let visible = visible_companies(conn, company_id).await?;
    let metas: Vec<MetaGroup> = meta_groups::Entity::find()
        .filter(meta_groups::Column::CompanyId.is_in(visible.iter().map(|c| c.uuid())))
        .order_by_asc(meta_groups::Column::Code)
        .order_by_asc(meta_groups::Column::Name)
        .all(conn)
        .await?
        .into_iter()
        .map(MetaGroup::from)
        .collect();
    let meta_ids: HashSet<_> = metas.iter().map(|m| m.id.uuid()).collect();
    let groups: Vec<Group> = groups::Entity::find()
        .filter(groups::Column::MetaId.is_in(meta_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(Group::from)
        .collect();
    Ok(OrganizationTree::build(metas, groups)?)
}

async fn require_node<C: ConnectionTrait>(conn: &C, id: MetaGroupId) -> Result<MetaGroup, OrganizationRepoError> {
    meta_groups::Entity::find_by_id(id.uuid())
        .one(conn)
        .await?
        .map(MetaGroup::from)
        .ok_or_else(|| OrganizationError::NodeNotFound(id).into())
}

/// Parent type and company rules for a new or re-parented node.
async fn check_parent<C: ConnectionTrait>(conn: &C, node: &MetaGroup) -> Result<(), OrganizationRepoError> {
    let Some(parent_id) = node.parent_id else {
        return Ok(());
    };
    let parent = require_node(conn, parent_id).await?;
    OrganizationTree::validate_parent(node, Some(&parent))?;
    let visible = visible_companies(conn, node.company_id).await?;
    OrganizationTree::validate_parent_company(node, &parent, &visible)?;
    Ok(())
}
