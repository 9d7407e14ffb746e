//! Blog pages: listing, detail and the login-only "new post" form.

use actix_web::{HttpResponse, http::StatusCode, http::header, web};

use inkpost_core::DomainError;
use inkpost_core::domain::{FieldErrors, NewPost, Post};
use inkpost_core::error::RepoError;
use inkpost_shared::dto::NewPostForm;

use crate::handlers::redirect;
use crate::middleware::auth::{Identity, LOGIN_URL, OptionalIdentity};
use crate::middleware::error::AppResult;
use crate::state::AppState;
use crate::views::{self, NewPostPage, PostCard, PostDetail, PostPage, PostsListPage};

/// GET /
pub async fn posts_list(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
) -> AppResult<HttpResponse> {
    let posts = state.posts.list_newest_first().await?;

    let page = PostsListPage {
        user: identity.username(),
        posts: posts
            .iter()
            .map(|post| PostCard::new(post, &state.media_url))
            .collect(),
    };

    views::render(StatusCode::OK, &page)
}

/// GET /{slug}/
pub async fn post_page(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let slug = path.into_inner();

    let post = state
        .posts
        .find_by_slug(&slug)
        .await?
        .ok_or_else(|| DomainError::post_not_found(&slug))?;

    let author = state
        .users
        .find_by_id(post.author_id)
        .await?
        .map(|user| user.username)
        .unwrap_or_default();

    let page = PostPage {
        user: identity.username(),
        post: PostDetail::new(&post, author, &state.media_url),
    };

    views::render(StatusCode::OK, &page)
}

/// GET /new/
pub async fn new_post_form(identity: Identity) -> AppResult<HttpResponse> {
    views::render(StatusCode::OK, &NewPostPage::blank(Some(identity.username)))
}

/// POST /new/
pub async fn create_post(
    state: web::Data<AppState>,
    identity: Identity,
    form: web::Form<NewPostForm>,
) -> AppResult<HttpResponse> {
    let form = form.into_inner();

    // The token can outlive its account.
    if state.users.find_by_id(identity.user_id).await?.is_none() {
        tracing::info!(user_id = %identity.user_id, "Session for a deleted user");
        return Ok(HttpResponse::Found()
            .insert_header((header::LOCATION, format!("{LOGIN_URL}?next=/new/")))
            .cookie(state.session.removal_cookie())
            .finish());
    }

    let content = match NewPost::parse(&form.title, &form.body, &form.slug, &form.banner) {
        Ok(content) => content,
        Err(errors) => return redisplay(identity, &form, &errors),
    };

    if state.posts.slug_exists(&content.slug).await? {
        return redisplay(identity, &form, &slug_taken());
    }

    let slug = content.slug.clone();
    let post = match state.posts.save(Post::new(identity.user_id, content)).await {
        Ok(post) => post,
        Err(RepoError::Constraint(reason)) => {
            // another post took the slug after the check above
            if state.posts.slug_exists(&slug).await? {
                return redisplay(identity, &form, &slug_taken());
            }
            return Err(RepoError::Constraint(reason).into());
        }
        Err(e) => return Err(e.into()),
    };
    tracing::info!(post_id = %post.id, slug = %post.slug, author = %identity.username, "Post created");

    Ok(redirect("/"))
}

fn slug_taken() -> FieldErrors {
    let mut errors = FieldErrors::new();
    errors.add("slug", "A post with this slug already exists.");
    errors
}

fn redisplay(
    identity: Identity,
    form: &NewPostForm,
    errors: &FieldErrors,
) -> AppResult<HttpResponse> {
    tracing::debug!(%errors, "New post form rejected");

    let page = NewPostPage::with_errors(
        Some(identity.username),
        &form.title,
        &form.body,
        &form.slug,
        &form.banner,
        errors,
    );
    views::render(StatusCode::OK, &page)
}
