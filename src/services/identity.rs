use std::collections::HashMap;

use sqlx::{PgPool, Row};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::UserProfile;

/// Lookup side of the external identity service.
///
/// This core never writes user documents; it only resolves partial usernames
/// to candidate ids and fetches display profiles to attach to reviews.
#[async_trait::async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// Ids of users whose username contains `partial` (case-insensitive),
    /// excluding the requester.
    async fn search_ids(&self, partial: &str, exclude: Uuid) -> AppResult<Vec<Uuid>>;

    /// Display profiles for the given ids; unknown ids are simply absent.
    async fn profiles(&self, ids: &[Uuid]) -> AppResult<HashMap<Uuid, UserProfile>>;

    /// Records an identity observed on an authenticated request.
    ///
    /// A no-op for backends whose user table is owned by the identity
    /// service itself.
    async fn remember(&self, profile: &UserProfile) -> AppResult<()>;
}

/// In-memory directory; populated from verified token claims as requests
/// arrive (and seeded directly in tests).
#[derive(Default)]
pub struct MemoryIdentityDirectory {
    users: RwLock<HashMap<Uuid, UserProfile>>,
}

impl MemoryIdentityDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl IdentityDirectory for MemoryIdentityDirectory {
    async fn search_ids(&self, partial: &str, exclude: Uuid) -> AppResult<Vec<Uuid>> {
        let needle = partial.to_lowercase();
        let users = self.users.read().await;

        let mut ids: Vec<Uuid> = users
            .values()
            .filter(|u| u.id != exclude && u.username.to_lowercase().contains(&needle))
            .map(|u| u.id)
            .collect();
        ids.sort();
        Ok(ids)
    }

    async fn profiles(&self, ids: &[Uuid]) -> AppResult<HashMap<Uuid, UserProfile>> {
        let users = self.users.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| users.get(id).cloned())
            .map(|profile| (profile.id, profile))
            .collect())
    }

    async fn remember(&self, profile: &UserProfile) -> AppResult<()> {
        self.users
            .write()
            .await
            .insert(profile.id, profile.clone());
        Ok(())
    }
}

/// Directory backed by the users table the identity service maintains.
#[derive(Clone)]
pub struct PgIdentityDirectory {
    pool: PgPool,
}

impl PgIdentityDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl IdentityDirectory for PgIdentityDirectory {
    async fn search_ids(&self, partial: &str, exclude: Uuid) -> AppResult<Vec<Uuid>> {
        let rows = sqlx::query(
            "SELECT id FROM users WHERE username ILIKE $1 AND id <> $2 ORDER BY id",
        )
        .bind(format!("%{}%", partial))
        .bind(exclude)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| row.try_get("id").map_err(crate::error::AppError::from))
            .collect()
    }

    async fn profiles(&self, ids: &[Uuid]) -> AppResult<HashMap<Uuid, UserProfile>> {
        let rows = sqlx::query("SELECT id, username, avatar FROM users WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        let mut profiles = HashMap::with_capacity(rows.len());
        for row in rows {
            let profile = UserProfile {
                id: row.try_get("id")?,
                username: row.try_get("username")?,
                avatar: row.try_get("avatar")?,
            };
            profiles.insert(profile.id, profile);
        }
        Ok(profiles)
    }

    async fn remember(&self, _profile: &UserProfile) -> AppResult<()> {
        // The identity service owns this table.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(name: &str) -> UserProfile {
        UserProfile {
            id: Uuid::new_v4(),
            username: name.to_string(),
            avatar: None,
        }
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_substring() {
        let directory = MemoryIdentityDirectory::new();
        let ana = profile("AnaBanana");
        let bob = profile("bob");
        directory.remember(&ana).await.unwrap();
        directory.remember(&bob).await.unwrap();

        let ids = directory.search_ids("ana", Uuid::new_v4()).await.unwrap();
        assert_eq!(ids, vec![ana.id]);
    }

    #[tokio::test]
    async fn test_search_excludes_requester() {
        let directory = MemoryIdentityDirectory::new();
        let ana = profile("ana");
        directory.remember(&ana).await.unwrap();

        let ids = directory.search_ids("ana", ana.id).await.unwrap();
        assert!(ids.is_empty());
    }

    #[tokio::test]
    async fn test_profiles_skips_unknown_ids() {
        let directory = MemoryIdentityDirectory::new();
        let ana = profile("ana");
        directory.remember(&ana).await.unwrap();

        let found = directory
            .profiles(&[ana.id, Uuid::new_v4()])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[&ana.id].username, "ana");
    }
}
