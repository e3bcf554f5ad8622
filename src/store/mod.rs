//! Application store module
//!
//! The redirect resolver only needs one question answered: which application
//! was forked from a given source application. That question sits behind
//! [`ApplicationLookup`] so the backing store can be swapped.

mod memory;
mod model;

pub use memory::InMemoryApplicationStore;
pub use model::{edit_page_url, AclPermission, Application, ApplicationPage};

use async_trait::async_trait;

/// Lookup of applications by the application they were cloned from
#[async_trait]
pub trait ApplicationLookup: Send + Sync {
    /// Find the application cloned from `source_app_id` that grants `permission`.
    ///
    /// When several forks qualify, the last one in store order is returned.
    async fn find_by_cloned_from(
        &self,
        source_app_id: &str,
        permission: AclPermission,
    ) -> Option<Application>;
}
