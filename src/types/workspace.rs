use serde::{Deserialize, Serialize};

/// Brand profile of a workspace.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WorkspaceProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_language_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_location_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_products_services: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_logo_url: Option<String>,
}

/// A workspace.  Newer servers flatten the profile into the workspace;
/// older ones nest it under `profile`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Workspace {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub owner_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub flat_profile: WorkspaceProfile,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<WorkspaceProfile>,
}

impl Workspace {
    /// The brand profile, preferring the flat fields.
    pub fn effective_profile(&self) -> &WorkspaceProfile {
        match &self.profile {
            Some(nested) if self.flat_profile == WorkspaceProfile::default() => nested,
            _ => &self.flat_profile,
        }
    }
}

/// The account part of a workspace member.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemberUser {
    pub id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Role of a member within a workspace.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WorkspaceRole {
    Owner,
    Admin,
    Member,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkspaceMember {
    pub id: String,
    pub user_id: String,
    pub workspace_id: String,
    pub role: WorkspaceRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub joined_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<MemberUser>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkspaceInvitation {
    pub id: String,
    pub workspace_id: String,
    pub invitee_email: String,
    pub role: WorkspaceRole,
    /// `pending`, `accepted` or `declined`.
    pub status: String,
    #[serde(default)]
    pub invited_by: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Body of `POST /workspaces`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateWorkspaceRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Body of `POST /workspaces/{id}/invitations`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InviteMemberRequest {
    pub invitee_email: String,
    pub role: WorkspaceRole,
}
