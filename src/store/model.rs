//! Application records
//!
//! Read-only view of an application and its pages, as handed back by a lookup.

use serde::{Deserialize, Serialize};

/// Access-control permission required to read or edit an application
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AclPermission {
    ReadApplications,
    ManageApplications,
}

/// A page within an application
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ApplicationPage {
    pub id: String,
    #[serde(default)]
    pub is_default: bool,
}

/// An application, possibly forked from another one
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct Application {
    pub id: String,
    /// Id of the application this one was cloned from
    #[serde(default)]
    pub cloned_from: Option<String>,
    /// Pages in display order
    #[serde(default)]
    pub pages: Vec<ApplicationPage>,
    /// Permissions granted on this application
    #[serde(default = "default_permissions")]
    pub permissions: Vec<AclPermission>,
}

fn default_permissions() -> Vec<AclPermission> {
    vec![AclPermission::ReadApplications]
}

impl Application {
    /// Page a visitor lands on: the first page flagged as default, otherwise
    /// the first page in order. `None` when the application has no pages.
    pub fn default_page_id(&self) -> Option<&str> {
        let mut selected: Option<&str> = None;
        for page in &self.pages {
            if selected.is_none() || page.is_default {
                selected = Some(&page.id);
            }
            if page.is_default {
                break;
            }
        }
        selected
    }

    pub fn grants(&self, permission: AclPermission) -> bool {
        self.permissions.contains(&permission)
    }
}

/// Builder URL for editing a page
pub fn edit_page_url(origin: &str, application_id: &str, page_id: &str) -> String {
    format!("{origin}/applications/{application_id}/pages/{page_id}/edit")
}
