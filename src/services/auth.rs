use crate::error::Result;
use crate::rest::{RestClient, Tokens};
use crate::types::{AuthResponse, LoginRequest, MaybeEnveloped, RegisterRequest, User};

/// Sign-in, sign-up and sign-out against the web service.
#[derive(Debug, Clone)]
pub struct AuthService {
    rest: RestClient,
}

impl AuthService {
    pub fn new(rest: RestClient) -> Self {
        Self { rest }
    }

    /// Signs in and stores the returned tokens.
    pub async fn login(&self, credentials: &LoginRequest) -> Result<AuthResponse> {
        let auth: MaybeEnveloped<AuthResponse> = self
            .rest
            .post_public(&["auth", "login"], credentials)
            .await?;
        Ok(self.remember(auth.into_inner()))
    }

    /// Creates an account and stores the returned tokens.
    pub async fn register(&self, account: &RegisterRequest) -> Result<AuthResponse> {
        let auth: MaybeEnveloped<AuthResponse> = self
            .rest
            .post_public(&["auth", "register"], account)
            .await?;
        Ok(self.remember(auth.into_inner()))
    }

    /// Replaces the access token using the stored refresh token.
    pub async fn refresh(&self) -> Result<String> {
        self.rest.refresh_tokens().await
    }

    /// Signs out.
    ///
    /// The server call is best-effort: whatever it answers, the local tokens
    /// are cleared.
    pub async fn logout(&self) {
        if self.rest.is_authenticated() {
            let _ = self
                .rest
                .post_empty::<serde_json::Value>(&["auth", "logout"])
                .await;
        }
        self.rest.token_store().clear();
    }

    /// The signed-in account.
    pub async fn me(&self) -> Result<User> {
        let user: MaybeEnveloped<User> = self.rest.get(&["users", "me"]).await?;
        Ok(user.into_inner())
    }

    pub fn is_authenticated(&self) -> bool {
        self.rest.is_authenticated()
    }

    fn remember(&self, auth: AuthResponse) -> AuthResponse {
        self.rest.token_store().save(Tokens::from(&auth));
        auth
    }
}
