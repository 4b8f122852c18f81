// Public modules
pub mod ai_service;
pub mod auth;
pub mod content_plan;
pub mod envelope;
pub mod message;
pub mod parsed_message;
pub mod stream_event;
pub mod tool_call;
pub mod workspace;

// Re-exports
pub use ai_service::{
    Agent, AgentsResponse, ChatHistoryResponse, ChatRequestBody, EventPart, SessionCreateRequest,
    SessionCreateResponse, SessionEvent, SessionEventsResponse, SessionSummary,
};
pub use auth::{AuthResponse, LoginRequest, RefreshTokenRequest, RegisterRequest, User};
pub use content_plan::{
    ChannelType, ContentPlanItem, ContentPlanQuery, ContentStatus, CreateContentPlanRequest,
    UpdateContentPlanRequest,
};
pub use envelope::{ApiEnvelope, MaybeEnveloped, MessageResponse, PaginatedEnvelope, Pagination};
pub use message::{Message, Sender};
pub use parsed_message::{ContentType, ParsedMessage};
pub use stream_event::{ChatStreamEvent, StreamEnd};
pub use tool_call::ToolCall;
pub use workspace::{
    CreateWorkspaceRequest, InviteMemberRequest, MemberUser, Workspace, WorkspaceInvitation,
    WorkspaceMember, WorkspaceProfile, WorkspaceRole,
};
