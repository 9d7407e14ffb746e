use askama::Template;

use inkpost_core::domain::{FieldErrors, Post};

use super::messages;

const DATE_FORMAT: &str = "%B %-d, %Y, %H:%M";
const EXCERPT_CHARS: usize = 200;

/// Summary of a post on the listing page.
pub struct PostCard {
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub date: String,
    pub banner_url: String,
}

impl PostCard {
    pub fn new(post: &Post, media_url: &str) -> Self {
        let mut excerpt: String = post.body.chars().take(EXCERPT_CHARS).collect();
        if post.body.chars().count() > EXCERPT_CHARS {
            excerpt.push('…');
        }

        Self {
            title: post.title.clone(),
            slug: post.slug.clone(),
            excerpt,
            date: post.date.format(DATE_FORMAT).to_string(),
            banner_url: format!("{media_url}{}", post.banner),
        }
    }
}

/// A full post with its body split into paragraphs.
pub struct PostDetail {
    pub title: String,
    pub author: String,
    pub date: String,
    pub banner_url: String,
    pub paragraphs: Vec<String>,
}

impl PostDetail {
    pub fn new(post: &Post, author: String, media_url: &str) -> Self {
        let paragraphs = post
            .body
            .split("\n\n")
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();

        Self {
            title: post.title.clone(),
            author,
            date: post.date.format(DATE_FORMAT).to_string(),
            banner_url: format!("{media_url}{}", post.banner),
            paragraphs,
        }
    }
}

#[derive(Template)]
#[template(path = "posts/posts_list.html")]
pub struct PostsListPage {
    pub user: Option<String>,
    pub posts: Vec<PostCard>,
}

#[derive(Template)]
#[template(path = "posts/post_page.html")]
pub struct PostPage {
    pub user: Option<String>,
    pub post: PostDetail,
}

#[derive(Template)]
#[template(path = "posts/post_new.html")]
pub struct NewPostPage {
    pub user: Option<String>,
    pub title: String,
    pub body: String,
    pub slug: String,
    pub banner: String,
    pub title_errors: Vec<String>,
    pub body_errors: Vec<String>,
    pub slug_errors: Vec<String>,
    pub banner_errors: Vec<String>,
}

impl NewPostPage {
    /// Empty form.
    pub fn blank(user: Option<String>) -> Self {
        Self::with_errors(user, "", "", "", "", &FieldErrors::new())
    }

    /// Form redisplayed with the submitted values and their errors.
    pub fn with_errors(
        user: Option<String>,
        title: &str,
        body: &str,
        slug: &str,
        banner: &str,
        errors: &FieldErrors,
    ) -> Self {
        Self {
            user,
            title: title.to_string(),
            body: body.to_string(),
            slug: slug.to_string(),
            banner: banner.to_string(),
            title_errors: messages(errors, "title"),
            body_errors: messages(errors, "body"),
            slug_errors: messages(errors, "slug"),
            banner_errors: messages(errors, "banner"),
        }
    }
}
