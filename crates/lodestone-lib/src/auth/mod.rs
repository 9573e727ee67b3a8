//! Authentication interface
//!
//! The launch path only needs an `AuthData`; where it comes from is up to the
//! `AuthProvider`. `OfflineAuth` produces one without any identity service.

use anyhow::Result;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Session details substituted into launch arguments
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthData {
    pub user_type: String,
    pub player_name: String,
    pub uuid: String,
    pub token: String,
}

/// Session lifecycle of an identity service.
pub trait AuthProvider: Send + Sync {
    /// Start a new session using the given credentials.
    fn login<'a>(&'a self, user: &'a str, pass: &'a str) -> BoxFuture<'a, Result<AuthData>>;

    /// Update `data` in place; the previous token is no longer usable.
    fn refresh<'a>(&'a self, data: &'a mut AuthData) -> BoxFuture<'a, Result<()>>;

    /// Whether `data` is still usable.
    fn validate<'a>(&'a self, data: &'a AuthData) -> BoxFuture<'a, Result<bool>>;

    /// Terminate the session.
    fn invalidate<'a>(&'a self, data: &'a AuthData) -> BoxFuture<'a, Result<()>>;
}

pub const OFFLINE_USER_TYPE: &str = "legacy";
const OFFLINE_TOKEN: &str = "0";

/// Offline-mode UUID for a player name
pub fn offline_uuid(player_name: &str) -> String {
    let name = format!("OfflinePlayer:{}", player_name);
    Uuid::new_v3(&Uuid::nil(), name.as_bytes())
        .simple()
        .to_string()
}

/// Offline sessions: any name is accepted, the password is ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineAuth;

impl OfflineAuth {
    pub fn session(player_name: &str) -> AuthData {
        AuthData {
            user_type: OFFLINE_USER_TYPE.to_string(),
            player_name: player_name.to_string(),
            uuid: offline_uuid(player_name),
            token: OFFLINE_TOKEN.to_string(),
        }
    }
}

impl AuthProvider for OfflineAuth {
    fn login<'a>(&'a self, user: &'a str, _pass: &'a str) -> BoxFuture<'a, Result<AuthData>> {
        Box::pin(async move {
            if user.trim().is_empty() {
                anyhow::bail!("Player name must not be empty");
            }
            log::info!("Offline login for {}", user);
            Ok(Self::session(user))
        })
    }

    fn refresh<'a>(&'a self, data: &'a mut AuthData) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            *data = Self::session(&data.player_name);
            Ok(())
        })
    }

    fn validate<'a>(&'a self, data: &'a AuthData) -> BoxFuture<'a, Result<bool>> {
        Box::pin(async move {
            Ok(data.user_type == OFFLINE_USER_TYPE && data.uuid == offline_uuid(&data.player_name))
        })
    }

    fn invalidate<'a>(&'a self, _data: &'a AuthData) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_uuid_is_stable() {
        assert_eq!(offline_uuid("Steve"), offline_uuid("Steve"));
        assert_ne!(offline_uuid("Steve"), offline_uuid("Alex"));
        assert_eq!(offline_uuid("Steve").len(), 32);
    }

    #[tokio::test]
    async fn test_offline_session_lifecycle() {
        let auth = OfflineAuth;
        let mut data = auth.login("Steve", "").await.unwrap();
        assert_eq!(data.user_type, "legacy");
        assert_eq!(data.token, "0");
        assert!(auth.validate(&data).await.unwrap());

        data.uuid = "tampered".to_string();
        assert!(!auth.validate(&data).await.unwrap());

        auth.refresh(&mut data).await.unwrap();
        assert!(auth.validate(&data).await.unwrap());
        auth.invalidate(&data).await.unwrap();
    }

    #[tokio::test]
    async fn test_offline_login_rejects_empty_name() {
        assert!(OfflineAuth.login("  ", "").await.is_err());
    }
}
