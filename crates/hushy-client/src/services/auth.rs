use tracing::{info, warn};

use hushy_shared::api::{AuthResponse, Credentials, ProfileUpdate, Registration, TokenRef};
use hushy_shared::types::User;

use crate::error::Result;
use crate::events::ClientEvent;
use crate::state::{Context, Session, PUSH_TOKEN_KEY, SESSION_KEY};

#[derive(Clone)]
pub struct AuthService {
    ctx: Context,
}

impl AuthService {
    pub fn new(ctx: Context) -> Self {
        Self { ctx }
    }

    /// Create an account and sign in with it.
    pub async fn register(&self, email: &str, username: &str, password: &str) -> Result<User> {
        let body = Registration {
            email: email.trim().to_string(),
            username: username.trim().to_string(),
            password: password.to_string(),
        };
        let resp: AuthResponse = self.ctx.api.post("/api/users/register", &body).await?;
        info!(user = %resp.user.id, "account created");
        self.start_session(resp)
    }

    /// Sign in and persist the session for the next start.
    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let body = Credentials {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        let resp: AuthResponse = self.ctx.api.post("/api/users/login", &body).await?;
        info!(user = %resp.user.id, "signed in");
        self.start_session(resp)
    }

    fn start_session(&self, resp: AuthResponse) -> Result<User> {
        let session = Session {
            token: resp.token,
            user: resp.user,
        };
        self.ctx.api.set_token(Some(session.token.clone()));
        self.ctx.with_db("persist session", |db| db.kv_put(SESSION_KEY, &session));

        let user = session.user.clone();
        self.ctx.with_state(|s| {
            s.session = Some(session);
            s.unread.clear();
        })?;

        self.ctx.events.emit(ClientEvent::SessionChanged { signed_in: true });
        Ok(user)
    }

    /// Bring back the session persisted by a previous run, if any.
    pub fn restore_session(&self) -> Result<Option<User>> {
        let stored = self
            .ctx
            .with_db("load session", |db| db.kv_get::<Session>(SESSION_KEY))
            .flatten();

        let Some(entry) = stored else {
            return Ok(None);
        };

        let session = entry.value;
        let push_token = self
            .ctx
            .with_db("load push token", |db| db.kv_get::<String>(PUSH_TOKEN_KEY))
            .flatten()
            .map(|e| e.value);

        self.ctx.api.set_token(Some(session.token.clone()));
        let user = session.user.clone();
        self.ctx.with_state(|s| {
            s.session = Some(session);
            s.push_token = push_token;
        })?;

        info!(user = %user.id, "session restored");
        self.ctx.events.emit(ClientEvent::SessionChanged { signed_in: true });
        Ok(Some(user))
    }

    /// Sign out. The push token is unregistered first so the device stops
    /// receiving the previous user's notifications; that step is best effort.
    pub async fn logout(&self) -> Result<()> {
        let push_token = self.ctx.with_state(|s| s.push_token.clone())?;
        if let Some(token) = push_token {
            if let Err(e) = self
                .ctx
                .api
                .delete_with_body("/api/notifications/token", &TokenRef { token: &token })
                .await
            {
                warn!(error = %e, "failed to unregister push token on logout");
            }
        }

        self.ctx.api.set_token(None);
        self.ctx.with_db("clear session", |db| {
            db.kv_delete(SESSION_KEY)?;
            db.kv_delete(PUSH_TOKEN_KEY)
        });
        self.ctx.with_state(|s| {
            s.session = None;
            s.push_token = None;
            s.active_conversation = None;
            s.unread.clear();
        })?;

        info!("signed out");
        self.ctx.events.emit(ClientEvent::SessionChanged { signed_in: false });
        Ok(())
    }

    pub fn is_signed_in(&self) -> bool {
        self.ctx
            .with_state(|s| s.session.is_some())
            .unwrap_or(false)
    }

    /// Fetch the current user from the backend and refresh the session copy.
    pub async fn current_user(&self) -> Result<User> {
        self.ctx.require_user()?;
        let user: User = self.ctx.api.get("/api/users/me").await?;
        self.store_user(&user)?;
        Ok(user)
    }

    /// Change username or avatar and refresh the session copy.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User> {
        self.ctx.require_user()?;
        let user: User = self.ctx.api.patch("/api/users/me", update).await?;
        self.store_user(&user)?;
        info!(user = %user.id, "profile updated");
        Ok(user)
    }

    fn store_user(&self, user: &User) -> Result<()> {
        let session = self.ctx.with_state(|s| {
            let session = s.session.as_mut()?;
            session.user = user.clone();
            Some(session.clone())
        })?;
        if let Some(session) = session {
            self.ctx.with_db("persist session", |db| db.kv_put(SESSION_KEY, &session));
        }
        Ok(())
    }
}
