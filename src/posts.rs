//! Discussion threads

use serde::{Deserialize, Serialize};

use crate::auth::{Role, User};
use crate::error::{Error, Result};
use crate::gateway::RequestGateway;

/// A discussion post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub post_id: String,
    pub post_owner: String,
    pub post_title: String,
    #[serde(default)]
    pub post_content: Option<String>,
    pub created_at: String,
    /// `None` until the post is first edited
    #[serde(default)]
    pub updated_at: Option<String>,
    /// Role of the post's author, when the endpoint reports it
    #[serde(default)]
    pub owner_role: Option<Role>,
}

impl Post {
    pub fn is_edited(&self) -> bool {
        self.updated_at.is_some()
    }
}

/// Whether `user` may edit or delete `post`
///
/// Admins may change any post and authors their own. Moderators may change
/// posts written by plain users only; a post whose author role is unknown
/// is left to its author and admins.
pub fn can_modify(user: &User, post: &Post) -> bool {
    match user.user_role {
        Role::Admin => true,
        _ if post.post_owner == user.user_id => true,
        Role::Moderator => post.owner_role == Some(Role::User),
        Role::User => false,
    }
}

/// Title and body of a post being created or edited
#[derive(Debug, Clone, Serialize)]
pub struct PostDraft {
    pub post_title: String,
    pub post_content: String,
}

impl PostDraft {
    pub fn new(title: &str, content: &str) -> Self {
        Self {
            post_title: title.to_string(),
            post_content: content.to_string(),
        }
    }
}

/// Acknowledgement returned by update and delete endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub message: String,
}

/// Client for the post endpoints
pub struct PostsClient<'a> {
    gateway: &'a RequestGateway,
}

impl<'a> PostsClient<'a> {
    pub(crate) fn new(gateway: &'a RequestGateway) -> Self {
        Self { gateway }
    }

    pub async fn create(&self, draft: &PostDraft) -> Result<Post> {
        self.gateway
            .post("/create-post")
            .json(draft)?
            .execute::<Post>()
            .await
    }

    /// Posts owned by the current user
    pub async fn mine(&self) -> Result<Vec<Post>> {
        self.gateway.get("/my-posts").execute::<Vec<Post>>().await
    }

    pub async fn view(&self, post_id: &str) -> Result<Post> {
        self.gateway
            .get(&format!("/view-post/{}", post_id))
            .execute::<Post>()
            .await
    }

    pub async fn update(&self, post_id: &str, draft: &PostDraft) -> Result<ApiMessage> {
        self.gateway
            .put(&format!("/update-post/{}", post_id))
            .json(draft)?
            .execute::<ApiMessage>()
            .await
    }

    pub async fn delete(&self, post_id: &str) -> Result<ApiMessage> {
        self.gateway
            .delete(&format!("/delete-post/{}", post_id))
            .execute::<ApiMessage>()
            .await
    }

    /// Edit `post`, refusing locally when the current user may not
    pub async fn edit(&self, post: &Post, draft: &PostDraft) -> Result<ApiMessage> {
        self.require_modify(post)?;
        self.update(&post.post_id, draft).await
    }

    /// Delete `post`, refusing locally when the current user may not
    pub async fn remove(&self, post: &Post) -> Result<ApiMessage> {
        self.require_modify(post)?;
        self.delete(&post.post_id).await
    }

    fn require_modify(&self, post: &Post) -> Result<()> {
        let user = self
            .gateway
            .session()
            .current_user()
            .ok_or(Error::NotAuthenticated)?;
        if can_modify(&user, post) {
            Ok(())
        } else {
            Err(Error::forbidden(format!(
                "{} {} may not modify post {}",
                user.user_role, user.username, post.post_id
            )))
        }
    }
}
