use super::state::ResourceKind;
use std::collections::HashSet;

/// Registry of resource kinds that are account-wide rather than regional.
/// These return the same data regardless of which region is queried, so they
/// are fetched once and never fanned out across regions.
pub struct GlobalServiceRegistry {
    global_kinds: HashSet<ResourceKind>,
}

impl Default for GlobalServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl GlobalServiceRegistry {
    pub fn new() -> Self {
        let mut registry = HashSet::new();

        // S3 bucket listing is global; bucket regions would need one call per bucket
        registry.insert(ResourceKind::S3);

        Self {
            global_kinds: registry,
        }
    }

    /// Check if a resource kind is a global service
    pub fn is_global(&self, kind: ResourceKind) -> bool {
        self.global_kinds.contains(&kind)
    }
}
