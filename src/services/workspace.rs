use crate::error::Result;
use crate::rest::RestClient;
use crate::types::{
    CreateWorkspaceRequest, InviteMemberRequest, MaybeEnveloped, MessageResponse, Workspace,
    WorkspaceInvitation, WorkspaceMember, WorkspaceProfile,
};

/// Workspaces, their brand profiles and their members.
#[derive(Debug, Clone)]
pub struct WorkspaceService {
    rest: RestClient,
}

impl WorkspaceService {
    pub fn new(rest: RestClient) -> Self {
        Self { rest }
    }

    pub async fn create(&self, request: &CreateWorkspaceRequest) -> Result<Workspace> {
        let workspace: MaybeEnveloped<Workspace> =
            self.rest.post(&["workspaces"], request).await?;
        Ok(workspace.into_inner())
    }

    /// Workspaces the user belongs to.
    pub async fn list(&self) -> Result<Vec<Workspace>> {
        let workspaces: MaybeEnveloped<Vec<Workspace>> = self.rest.get(&["workspaces"]).await?;
        Ok(workspaces.into_inner())
    }

    /// Workspaces the user owns.
    pub async fn mine(&self) -> Result<Vec<Workspace>> {
        let workspaces: MaybeEnveloped<Vec<Workspace>> =
            self.rest.get(&["workspaces", "my"]).await?;
        Ok(workspaces.into_inner())
    }

    pub async fn get(&self, workspace_id: &str) -> Result<Workspace> {
        let workspace: MaybeEnveloped<Workspace> =
            self.rest.get(&["workspaces", workspace_id]).await?;
        Ok(workspace.into_inner())
    }

    pub async fn update_profile(
        &self,
        workspace_id: &str,
        profile: &WorkspaceProfile,
    ) -> Result<MessageResponse> {
        self.rest
            .put(&["workspaces", workspace_id, "profile"], profile)
            .await
    }

    pub async fn members(&self, workspace_id: &str) -> Result<Vec<WorkspaceMember>> {
        let members: MaybeEnveloped<Vec<WorkspaceMember>> = self
            .rest
            .get(&["workspaces", workspace_id, "members"])
            .await?;
        Ok(members.into_inner())
    }

    pub async fn invite(
        &self,
        workspace_id: &str,
        request: &InviteMemberRequest,
    ) -> Result<MessageResponse> {
        self.rest
            .post(&["workspaces", workspace_id, "invitations"], request)
            .await
    }

    pub async fn remove_member(&self, workspace_id: &str, user_id: &str) -> Result<()> {
        self.rest
            .delete(&["workspaces", workspace_id, "members", user_id])
            .await
    }

    /// Invitations addressed to the signed-in user.
    pub async fn my_invitations(&self) -> Result<Vec<WorkspaceInvitation>> {
        let invitations: MaybeEnveloped<Vec<WorkspaceInvitation>> =
            self.rest.get(&["workspaces", "me", "invitations"]).await?;
        Ok(invitations.into_inner())
    }

    pub async fn accept_invitation(&self, invitation_id: &str) -> Result<MessageResponse> {
        self.rest
            .post_empty(&["workspaces", "invitations", invitation_id, "accept"])
            .await
    }

    pub async fn decline_invitation(&self, invitation_id: &str) -> Result<MessageResponse> {
        self.rest
            .post_empty(&["workspaces", "invitations", invitation_id, "decline"])
            .await
    }
}
