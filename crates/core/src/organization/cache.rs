//! Loaded trees kept per company using Moka.
//!
//! Building a tree means reading every node and group of a company, so
//! aggregation requests reuse the last build until a node or group write
//! invalidates it. Only the tree shape is cached; line values never are.

use moka::sync::Cache;
use std::sync::Arc;
use std::time::Duration;

use tmi_shared::types::CompanyId;

use super::tree::OrganizationTree;

/// Default cache capacity (number of companies).
const DEFAULT_CACHE_CAPACITY: u64 = 64;

/// Default time-to-live for cache entries (5 minutes).
const DEFAULT_TTL_SECS: u64 = 300;

/// Cache of organization trees keyed by company.
#[derive(Debug, Clone)]
pub struct TreeCache {
    cache: Cache<CompanyId, Arc<OrganizationTree>>,
}

impl TreeCache {
    /// Creates a cache with default settings: 64 companies, 5 minute TTL.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DEFAULT_CACHE_CAPACITY, DEFAULT_TTL_SECS)
    }

    /// Creates a cache with custom capacity and time-to-live.
    #[must_use]
    pub fn with_config(max_capacity: u64, ttl_secs: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self { cache }
    }

    /// Cached tree of a company, if present.
    #[must_use]
    pub fn get(&self, company_id: CompanyId) -> Option<Arc<OrganizationTree>> {
        self.cache.get(&company_id)
    }

    /// Stores a freshly built tree and returns the shared handle.
    pub fn insert(&self, company_id: CompanyId, tree: OrganizationTree) -> Arc<OrganizationTree> {
        let tree = Arc::new(tree);
        self.cache.insert(company_id, Arc::clone(&tree));
        tree
    }

    /// Drops the tree of one company.
    pub fn invalidate(&self, company_id: CompanyId) {
        self.cache.invalidate(&company_id);
    }

    /// Drops every tree.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    /// Number of cached trees.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Runs pending eviction work so counts are current.
    pub fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks();
    }
}

impl Default for TreeCache {
    fn default() -> Self {
        Self::new()
    }
}
