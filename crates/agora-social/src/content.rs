//! Posts, comments, and likes
//!
//! Content lifecycle with the derived-counter contract: every like/comment
//! mutation adjusts its post's cached counter inside the same critical
//! section as the edge mutation. Like edges are unique per (post, user) by
//! conditional insert.
//!
//! Writes that target an existing post (comments, likes) pass through the
//! visibility rule first; a principal who cannot read a post cannot attach
//! content to it.

use agora_core::errors::{AgoraError, AgoraResult};
use agora_core::events::DomainEvent;
use agora_core::identifiers::{CommentId, CommunityId, PostId, UserId};
use agora_core::time::PhysicalTime;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::counters::CounterMaintainer;
use crate::state::SocialStore;
use crate::visibility;

/// Audience scope of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Visibility {
    /// Readable by any principal
    Public,
    /// Readable by members of the exact owning community (city scope)
    City,
    /// Readable by members of the exact owning community (local scope)
    Local,
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Public => write!(f, "public"),
            Self::City => write!(f, "city"),
            Self::Local => write!(f, "local"),
        }
    }
}

/// A post record.
///
/// `likes_count` and `comments_count` are cached derived values with the
/// same contract as `Community::member_count`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Unique identifier
    pub id: PostId,
    /// Authoring principal
    pub author: UserId,
    /// Owning community
    pub community: CommunityId,
    /// Audience scope
    pub visibility: Visibility,
    /// Post body; attachment URLs arrive pre-uploaded from blob storage
    pub content: String,
    /// Cached count of like edges targeting this post
    pub likes_count: u64,
    /// Cached count of comments under this post
    pub comments_count: u64,
    /// Creation time
    pub created_at: PhysicalTime,
}

/// A comment record. Visibility is inherited from the parent post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Unique identifier
    pub id: CommentId,
    /// Parent post
    pub post: PostId,
    /// Authoring principal
    pub author: UserId,
    /// Comment body
    pub content: String,
    /// Creation time
    pub created_at: PhysicalTime,
}

/// Post, comment, and like lifecycle operations.
#[derive(Debug, Clone)]
pub struct ContentStore {
    store: SocialStore,
}

impl ContentStore {
    pub(crate) fn new(store: SocialStore) -> Self {
        Self { store }
    }

    /// Create a post in `community`. Open to any authenticated principal.
    pub fn create_post(
        &self,
        author: UserId,
        community: CommunityId,
        visibility: Visibility,
        content: impl Into<String>,
        at: PhysicalTime,
    ) -> AgoraResult<Post> {
        let post = {
            let mut state = self.store.state.write();
            if !state.communities.contains_key(&community) {
                return Err(AgoraError::not_found(format!("community {community}")));
            }
            let post = Post {
                id: PostId::generate(),
                author,
                community,
                visibility,
                content: content.into(),
                likes_count: 0,
                comments_count: 0,
                created_at: at,
            };
            state.posts.insert(post.id, post.clone());
            debug!(post = %post.id, %author, %community, scope = %visibility, "post created");
            post
        };
        self.store.emit(DomainEvent::PostCreated {
            post: post.id,
            author,
            community,
        });
        Ok(post)
    }

    /// Fetch a post record by id.
    pub fn get_post(&self, id: PostId) -> AgoraResult<Post> {
        self.store
            .state
            .read()
            .posts
            .get(&id)
            .cloned()
            .ok_or_else(|| AgoraError::not_found(format!("post {id}")))
    }

    /// Replace the body of a post. Author only.
    pub fn update_post(
        &self,
        principal: UserId,
        id: PostId,
        content: impl Into<String>,
    ) -> AgoraResult<Post> {
        let mut state = self.store.state.write();
        let post = state
            .posts
            .get_mut(&id)
            .ok_or_else(|| AgoraError::not_found(format!("post {id}")))?;
        if post.author != principal {
            return Err(AgoraError::not_authorized(format!(
                "{principal} is not the author of post {id}"
            )));
        }
        post.content = content.into();
        Ok(post.clone())
    }

    /// Delete a post with its comments and likes. Author only.
    pub fn delete_post(&self, principal: UserId, id: PostId) -> AgoraResult<()> {
        {
            let mut state = self.store.state.write();
            let post = state
                .posts
                .get(&id)
                .ok_or_else(|| AgoraError::not_found(format!("post {id}")))?;
            if post.author != principal {
                return Err(AgoraError::not_authorized(format!(
                    "{principal} is not the author of post {id}"
                )));
            }
            state.posts.remove(&id);
            state.likes.remove(&id);
            state.comments.retain(|_, comment| comment.post != id);
            debug!(post = %id, "post deleted");
        }
        self.store.emit(DomainEvent::PostDeleted { post: id });
        Ok(())
    }

    /// Create a comment under `post`.
    ///
    /// The author must be able to read the post; comments inherit its
    /// visibility.
    pub fn create_comment(
        &self,
        author: UserId,
        post: PostId,
        content: impl Into<String>,
        at: PhysicalTime,
    ) -> AgoraResult<Comment> {
        let comment = {
            let mut state = self.store.state.write();
            let record = state
                .posts
                .get(&post)
                .ok_or_else(|| AgoraError::not_found(format!("post {post}")))?;
            if !visibility::evaluate_read(&state, author, record) {
                return Err(AgoraError::not_authorized(format!(
                    "{author} cannot read post {post}"
                )));
            }
            let comment = Comment {
                id: CommentId::generate(),
                post,
                author,
                content: content.into(),
                created_at: at,
            };
            state.comments.insert(comment.id, comment.clone());
            let record = state
                .posts
                .get_mut(&post)
                .ok_or_else(|| AgoraError::not_found(format!("post {post}")))?;
            CounterMaintainer::on_comment_created(record);
            debug!(comment = %comment.id, %post, %author, "comment created");
            comment
        };
        self.store.emit(DomainEvent::CommentCreated {
            comment: comment.id,
            post,
            author,
        });
        Ok(comment)
    }

    /// Fetch a comment record by id.
    pub fn get_comment(&self, id: CommentId) -> AgoraResult<Comment> {
        self.store
            .state
            .read()
            .comments
            .get(&id)
            .cloned()
            .ok_or_else(|| AgoraError::not_found(format!("comment {id}")))
    }

    /// Delete a comment. Comment author only.
    pub fn delete_comment(&self, principal: UserId, id: CommentId) -> AgoraResult<()> {
        let post = {
            let mut state = self.store.state.write();
            let comment = state
                .comments
                .get(&id)
                .ok_or_else(|| AgoraError::not_found(format!("comment {id}")))?;
            if comment.author != principal {
                return Err(AgoraError::not_authorized(format!(
                    "{principal} is not the author of comment {id}"
                )));
            }
            let post = comment.post;
            state.comments.remove(&id);
            let record = state.posts.get_mut(&post).ok_or_else(|| {
                AgoraError::consistency_fault(format!(
                    "comment {id} referenced missing post {post}"
                ))
            })?;
            CounterMaintainer::on_comment_deleted(record)?;
            debug!(comment = %id, %post, "comment deleted");
            post
        };
        self.store
            .emit(DomainEvent::CommentDeleted { comment: id, post });
        Ok(())
    }

    /// Insert a like edge from `user` to `post`.
    ///
    /// The user must be able to read the post. One like per (post, user);
    /// duplicates are `AlreadyExists`.
    pub fn like_post(&self, user: UserId, post: PostId, at: PhysicalTime) -> AgoraResult<()> {
        {
            let mut state = self.store.state.write();
            let record = state
                .posts
                .get(&post)
                .ok_or_else(|| AgoraError::not_found(format!("post {post}")))?;
            if !visibility::evaluate_read(&state, user, record) {
                return Err(AgoraError::not_authorized(format!(
                    "{user} cannot read post {post}"
                )));
            }
            let edges = state.likes.entry(post).or_default();
            if edges.contains_key(&user) {
                return Err(AgoraError::already_exists(format!(
                    "like edge {user} -> {post}"
                )));
            }
            edges.insert(user, at);
            let record = state
                .posts
                .get_mut(&post)
                .ok_or_else(|| AgoraError::not_found(format!("post {post}")))?;
            CounterMaintainer::on_like_added(record);
            debug!(%user, %post, likes = record.likes_count, "like added");
        }
        self.store.emit(DomainEvent::LikeAdded { post, user });
        Ok(())
    }

    /// Remove the like edge from `user` to `post`.
    pub fn unlike_post(&self, user: UserId, post: PostId) -> AgoraResult<()> {
        {
            let mut state = self.store.state.write();
            if !state.posts.contains_key(&post) {
                return Err(AgoraError::not_found(format!("post {post}")));
            }
            let removed = state
                .likes
                .get_mut(&post)
                .and_then(|edges| edges.remove(&user));
            if removed.is_none() {
                return Err(AgoraError::not_found(format!("like edge {user} -> {post}")));
            }
            let record = state
                .posts
                .get_mut(&post)
                .ok_or_else(|| AgoraError::not_found(format!("post {post}")))?;
            CounterMaintainer::on_like_removed(record)?;
            debug!(%user, %post, likes = record.likes_count, "like removed");
        }
        self.store.emit(DomainEvent::LikeRemoved { post, user });
        Ok(())
    }
}
