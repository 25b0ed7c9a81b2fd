use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::ReviewView;
use crate::services::identity::IdentityDirectory;
use crate::store::{ExploreFilter, FeedSort, ReviewStore};

pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Query parameters of the explore endpoint.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExploreParams {
    pub movie_id: Option<String>,
    pub username: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort_by: Option<FeedSort>,
}

/// One page of the explore feed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPage {
    pub reviews: Vec<ReviewView>,
    pub total: i64,
    pub pages: i64,
    pub current_page: i64,
}

impl FeedPage {
    fn empty() -> Self {
        Self {
            reviews: Vec::new(),
            total: 0,
            pages: 0,
            current_page: 1,
        }
    }
}

/// Builds the explore feed: visibility, self-exclusion, optional author and
/// movie filters, sort, pagination, and per-review like status.
pub struct FeedQueryEngine {
    store: Arc<dyn ReviewStore>,
    directory: Arc<dyn IdentityDirectory>,
}

impl FeedQueryEngine {
    pub fn new(store: Arc<dyn ReviewStore>, directory: Arc<dyn IdentityDirectory>) -> Self {
        Self { store, directory }
    }

    pub async fn explore(&self, requester_id: Uuid, params: &ExploreParams) -> AppResult<FeedPage> {
        let page = params.page.unwrap_or(1).max(1);
        let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE).max(1);
        let sort = params.sort_by.unwrap_or_default();

        let username = params
            .username
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let author_ids = match username {
            Some(username) => {
                let ids = self.directory.search_ids(username, requester_id).await?;
                if ids.is_empty() {
                    // No matching authors: short-circuit without querying the
                    // store at all.
                    return Ok(FeedPage::empty());
                }
                Some(ids)
            }
            None => None,
        };

        let result = self
            .store
            .explore(&ExploreFilter {
                requester_id,
                movie_id: params.movie_id.clone(),
                author_ids,
                sort,
                offset: (page - 1) * limit,
                limit,
            })
            .await?;

        let mut author_ids: Vec<Uuid> = result.reviews.iter().map(|r| r.user_id).collect();
        author_ids.sort();
        author_ids.dedup();
        let profiles = self.directory.profiles(&author_ids).await?;

        let reviews = result
            .reviews
            .iter()
            .map(|review| {
                ReviewView::from(review)
                    .with_has_liked(review.has_liked(requester_id))
                    .with_author(profiles.get(&review.user_id).cloned())
            })
            .collect();

        Ok(FeedPage {
            reviews,
            total: result.total,
            pages: (result.total + limit - 1) / limit,
            current_page: page,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserProfile;
    use crate::services::identity::MemoryIdentityDirectory;
    use crate::store::MemoryReviewStore;

    async fn seeded_engine() -> (Arc<MemoryReviewStore>, Arc<MemoryIdentityDirectory>, FeedQueryEngine)
    {
        let store = Arc::new(MemoryReviewStore::new());
        let directory = Arc::new(MemoryIdentityDirectory::new());
        let engine = FeedQueryEngine::new(store.clone(), directory.clone());
        (store, directory, engine)
    }

    fn profile(name: &str) -> UserProfile {
        UserProfile {
            id: Uuid::new_v4(),
            username: name.to_string(),
            avatar: Some(format!("{}.png", name)),
        }
    }

    #[tokio::test]
    async fn test_explore_never_includes_own_reviews() {
        let (store, _, engine) = seeded_engine().await;
        let requester = Uuid::new_v4();
        store.create(requester, "603", 5, "mine").await.unwrap();
        store.create(Uuid::new_v4(), "604", 4, "theirs").await.unwrap();

        let page = engine
            .explore(requester, &ExploreParams::default())
            .await
            .unwrap();

        assert_eq!(page.total, 1);
        assert!(page.reviews.iter().all(|r| r.user_id != requester));
    }

    #[tokio::test]
    async fn test_unmatched_username_short_circuits() {
        let (store, _, engine) = seeded_engine().await;
        let requester = Uuid::new_v4();
        store.create(Uuid::new_v4(), "603", 4, "r").await.unwrap();

        let page = engine
            .explore(
                requester,
                &ExploreParams {
                    username: Some("nobody".to_string()),
                    movie_id: Some("603".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(page.reviews.is_empty());
        assert_eq!(page.total, 0);
        assert_eq!(page.pages, 0);
        assert_eq!(page.current_page, 1);
    }

    #[tokio::test]
    async fn test_username_filter_restricts_authors() {
        let (store, directory, engine) = seeded_engine().await;
        let requester = Uuid::new_v4();
        let ana = profile("ana");
        let bob = profile("bob");
        directory.remember(&ana).await.unwrap();
        directory.remember(&bob).await.unwrap();
        store.create(ana.id, "603", 5, "by ana").await.unwrap();
        store.create(bob.id, "604", 4, "by bob").await.unwrap();

        let page = engine
            .explore(
                requester,
                &ExploreParams {
                    username: Some("an".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(page.total, 1);
        assert_eq!(page.reviews[0].user_id, ana.id);
        let author = page.reviews[0].user.as_ref().unwrap();
        assert_eq!(author.username, "ana");
        assert_eq!(author.avatar.as_deref(), Some("ana.png"));
    }

    #[tokio::test]
    async fn test_has_liked_reflects_requester_only() {
        let (store, _, engine) = seeded_engine().await;
        let requester = Uuid::new_v4();
        let liked = store.create(Uuid::new_v4(), "603", 4, "a").await.unwrap();
        store.create(Uuid::new_v4(), "604", 4, "b").await.unwrap();
        store.toggle_like(liked.id, requester).await.unwrap();
        store.toggle_like(liked.id, Uuid::new_v4()).await.unwrap();

        let page = engine
            .explore(requester, &ExploreParams::default())
            .await
            .unwrap();

        for review in &page.reviews {
            if review.id == liked.id {
                assert_eq!(review.has_liked, Some(true));
                assert_eq!(review.likes_count, 2);
            } else {
                assert_eq!(review.has_liked, Some(false));
            }
        }
    }

    #[tokio::test]
    async fn test_pages_is_ceiling_of_total_over_limit() {
        let (store, _, engine) = seeded_engine().await;
        let requester = Uuid::new_v4();
        for i in 0..5 {
            store
                .create(Uuid::new_v4(), &format!("m{}", i), 3, "r")
                .await
                .unwrap();
        }

        let page = engine
            .explore(
                requester,
                &ExploreParams {
                    limit: Some(2),
                    page: Some(3),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(page.total, 5);
        assert_eq!(page.pages, 3);
        assert_eq!(page.current_page, 3);
        assert_eq!(page.reviews.len(), 1);
    }
}
