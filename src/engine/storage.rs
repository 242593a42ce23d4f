// Storage abstraction for app and session definitions

//! # Definition Storage
//!
//! The engine reads app definitions at run start through [`AppRepository`]
//! and never writes them; hosts additionally persist run surfaces through
//! [`SessionRepository`]. Both traits are async so network- or
//! database-backed implementations can plug in; the in-memory
//! implementations serve development and tests.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::models::{App, Session};
use crate::Result;

/// Storage operations for app definitions
#[async_trait]
pub trait AppRepository: Send + Sync {
    /// Insert or update an app definition (upsert by id)
    async fn save_app(&self, app: App) -> Result<()>;

    /// All apps, pinned first, most recently updated next
    async fn get_apps(&self) -> Result<Vec<App>>;

    /// Look up one app definition; `Ok(None)` when the id is unknown
    async fn get_app(&self, id: &str) -> Result<Option<App>>;

    async fn delete_app(&self, id: &str) -> Result<()>;
}

/// Storage operations for saved sessions
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn save_session(&self, session: Session) -> Result<()>;

    /// All sessions, most recently updated first
    async fn get_sessions(&self) -> Result<Vec<Session>>;

    async fn get_session(&self, id: &str) -> Result<Option<Session>>;

    async fn delete_session(&self, id: &str) -> Result<()>;
}

/// In-memory app storage for development and testing
#[derive(Default)]
pub struct InMemoryAppRepository {
    apps: RwLock<HashMap<String, App>>,
}

impl InMemoryAppRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AppRepository for InMemoryAppRepository {
    async fn save_app(&self, app: App) -> Result<()> {
        self.apps.write().await.insert(app.id.clone(), app);
        Ok(())
    }

    async fn get_apps(&self) -> Result<Vec<App>> {
        let mut apps: Vec<App> = self.apps.read().await.values().cloned().collect();
        apps.sort_by(|a, b| {
            let pinned_a = a.is_pinned.unwrap_or(false);
            let pinned_b = b.is_pinned.unwrap_or(false);
            pinned_b
                .cmp(&pinned_a)
                .then(b.updated_at.cmp(&a.updated_at))
        });
        Ok(apps)
    }

    async fn get_app(&self, id: &str) -> Result<Option<App>> {
        Ok(self.apps.read().await.get(id).cloned())
    }

    async fn delete_app(&self, id: &str) -> Result<()> {
        self.apps.write().await.remove(id);
        Ok(())
    }
}

/// In-memory session storage for development and testing
#[derive(Default)]
pub struct InMemorySessionRepository {
    sessions: RwLock<HashMap<String, Session>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn save_session(&self, session: Session) -> Result<()> {
        self.sessions
            .write()
            .await
            .insert(session.id.clone(), session);
        Ok(())
    }

    async fn get_sessions(&self) -> Result<Vec<Session>> {
        let mut sessions: Vec<Session> = self.sessions.read().await.values().cloned().collect();
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(sessions)
    }

    async fn get_session(&self, id: &str) -> Result<Option<Session>> {
        Ok(self.sessions.read().await.get(id).cloned())
    }

    async fn delete_session(&self, id: &str) -> Result<()> {
        self.sessions.write().await.remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AppRunMode;

    fn app(id: &str, updated_at: i64, pinned: bool) -> App {
        App {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            icon: String::new(),
            run_mode: AppRunMode::Panel,
            components: Vec::new(),
            layout_config: None,
            created_at: 0,
            updated_at,
            is_pinned: pinned.then_some(true),
        }
    }

    #[tokio::test]
    async fn test_app_round_trip_and_delete() {
        let repo = InMemoryAppRepository::new();
        repo.save_app(app("a1", 1, false)).await.unwrap();

        assert!(repo.get_app("a1").await.unwrap().is_some());
        assert!(repo.get_app("missing").await.unwrap().is_none());

        repo.delete_app("a1").await.unwrap();
        assert!(repo.get_app("a1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_is_upsert() {
        let repo = InMemoryAppRepository::new();
        repo.save_app(app("a1", 1, false)).await.unwrap();
        repo.save_app(app("a1", 9, false)).await.unwrap();

        let apps = repo.get_apps().await.unwrap();
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0].updated_at, 9);
    }

    #[tokio::test]
    async fn test_apps_ordered_pinned_then_recent() {
        let repo = InMemoryAppRepository::new();
        repo.save_app(app("old", 1, false)).await.unwrap();
        repo.save_app(app("new", 5, false)).await.unwrap();
        repo.save_app(app("pinned", 2, true)).await.unwrap();

        let ids: Vec<String> = repo
            .get_apps()
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec!["pinned", "new", "old"]);
    }

    #[tokio::test]
    async fn test_sessions_ordered_by_recency() {
        let repo = InMemorySessionRepository::new();
        for (id, at) in [("s1", 3), ("s2", 7), ("s3", 5)] {
            repo.save_session(Session {
                id: id.to_string(),
                app_id: "a1".to_string(),
                name: id.to_string(),
                kind: AppRunMode::Chat,
                data: serde_json::Value::Null,
                updated_at: at,
                is_pinned: None,
            })
            .await
            .unwrap();
        }

        let ids: Vec<String> = repo
            .get_sessions()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec!["s2", "s3", "s1"]);
    }
}
