//! In-memory application store
//!
//! Seeded once from configuration and read-only afterwards.

use async_trait::async_trait;
use std::collections::HashMap;

use super::model::{AclPermission, Application};
use super::ApplicationLookup;

/// Applications indexed by the id they were cloned from
#[derive(Debug, Default)]
pub struct InMemoryApplicationStore {
    by_source: HashMap<String, Vec<Application>>,
}

impl InMemoryApplicationStore {
    pub fn new(applications: &[Application]) -> Self {
        let mut by_source: HashMap<String, Vec<Application>> = HashMap::new();
        for app in applications {
            if let Some(source) = &app.cloned_from {
                by_source.entry(source.clone()).or_default().push(app.clone());
            }
        }
        Self { by_source }
    }

    /// Number of indexed forks
    pub fn len(&self) -> usize {
        self.by_source.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ApplicationLookup for InMemoryApplicationStore {
    async fn find_by_cloned_from(
        &self,
        source_app_id: &str,
        permission: AclPermission,
    ) -> Option<Application> {
        // Several forks of one source: the last one seeded wins
        self.by_source
            .get(source_app_id)?
            .iter()
            .rev()
            .find(|app| app.grants(permission))
            .cloned()
    }
}
