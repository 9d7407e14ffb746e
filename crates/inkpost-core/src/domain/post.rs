use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Banner used when a post is created without one.
pub const DEFAULT_BANNER: &str = "default.jpeg";

/// Post entity - a blog post written by a registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub body: String,
    pub slug: String,
    pub banner: String,
    /// Creation time. Set once by [`Post::new`] and never touched again.
    pub date: DateTime<Utc>,
}

/// Validated content for a post that has not been stored yet.
///
/// Produced by [`NewPost::parse`](crate::domain::form); carries no author or
/// timestamp, those are stamped when the post is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub title: String,
    pub body: String,
    pub slug: String,
    pub banner: String,
}

impl Post {
    /// Create a new post authored by `author_id`, dated now.
    pub fn new(author_id: Uuid, content: NewPost) -> Self {
        Self {
            id: Uuid::new_v4(),
            author_id,
            title: content.title,
            body: content.body,
            slug: content.slug,
            banner: content.banner,
            date: Utc::now(),
        }
    }
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}
