//! HTTP handlers and route configuration.

mod api;
mod health;
mod posts;
mod users;

use actix_web::{HttpResponse, http::Method, http::header, web};

use crate::middleware::rate_limit::RateLimitMiddleware;

/// Configure all application routes.
///
/// `/{slug}/` matches any single path segment, so it is registered last.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(health::health_check))
            .route("/posts", web::get().to(api::list_posts))
            .route("/posts/{slug}", web::get().to(api::get_post)),
    )
    .service(
        web::scope("/users")
            .service(
                web::resource("/register/")
                    .route(web::get().to(users::register_form))
                    .route(web::post().to(users::register)),
            )
            .service(
                web::resource("/login/")
                    .wrap(RateLimitMiddleware::only(Method::POST))
                    .route(web::get().to(users::login_form))
                    .route(web::post().to(users::login)),
            )
            .service(
                web::resource("/logout/")
                    .route(web::get().to(users::logout))
                    .route(web::post().to(users::logout)),
            ),
    )
    .service(
        web::resource("/new/")
            .route(web::get().to(posts::new_post_form))
            .route(web::post().to(posts::create_post)),
    )
    .route("/", web::get().to(posts::posts_list))
    .route("/{slug}/", web::get().to(posts::post_page));
}

/// `302 Found` to `location`.
pub(crate) fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}

#[cfg(test)]
mod tests;
