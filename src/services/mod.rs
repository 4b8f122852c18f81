//! Typed wrappers over the web service endpoints.
//!
//! Every service owns a clone of one [`RestClient`](crate::rest::RestClient),
//! so they all share its token store.

pub mod auth;
pub mod content_plan;
pub mod workspace;

pub use auth::AuthService;
pub use content_plan::ContentPlanService;
pub use workspace::WorkspaceService;
