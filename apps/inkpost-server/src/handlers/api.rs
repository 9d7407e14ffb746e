//! Read-only JSON view of the blog.

use actix_web::{HttpResponse, web};

use inkpost_core::DomainError;
use inkpost_core::domain::Post;
use inkpost_shared::ApiResponse;
use inkpost_shared::dto::PostResponse;

use crate::middleware::error::{ApiError, ApiResult};
use crate::observability::RequestId;
use crate::state::AppState;

fn to_response(post: Post) -> PostResponse {
    PostResponse {
        id: post.id,
        title: post.title,
        body: post.body,
        slug: post.slug,
        banner: post.banner,
        date: post.date,
        author_id: post.author_id,
    }
}

/// GET /api/posts
pub async fn list_posts(
    state: web::Data<AppState>,
    request_id: RequestId,
) -> ApiResult<HttpResponse> {
    let posts = state
        .posts
        .list_newest_first()
        .await
        .map_err(ApiError::tagged(&request_id))?;

    let body: Vec<PostResponse> = posts.into_iter().map(to_response).collect();
    Ok(HttpResponse::Ok().json(ApiResponse::ok(body)))
}

/// GET /api/posts/{slug}
pub async fn get_post(
    state: web::Data<AppState>,
    request_id: RequestId,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let slug = path.into_inner();

    let post = state
        .posts
        .find_by_slug(&slug)
        .await
        .map_err(ApiError::tagged(&request_id))?
        .ok_or_else(|| DomainError::post_not_found(&slug))
        .map_err(ApiError::tagged(&request_id))?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(to_response(post))))
}
