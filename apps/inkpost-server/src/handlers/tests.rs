use actix_web::cookie::Cookie;
use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use chrono::{Duration, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use uuid::Uuid;

use inkpost_core::domain::{NewPost, Post, User};
use inkpost_core::error::RepoError;
use inkpost_core::ports::{
    AuthError, BaseRepository, PasswordService, PostRepository, TokenService,
};
use inkpost_infra::{JwtConfig, JwtTokenService};
use inkpost_shared::dto::{LoginForm, NewPostForm, RegisterForm};

use super::configure_routes;
use crate::middleware::auth::{SESSION_COOKIE, SessionConfig};
use crate::observability::RequestIdMiddleware;
use crate::state::AppState;

/// Stores passwords as `plain:<password>`; Argon2 is far too slow for tests.
struct PlainPasswords;

impl PasswordService for PlainPasswords {
    fn hash(&self, password: &str) -> Result<String, AuthError> {
        Ok(format!("plain:{password}"))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        Ok(hash.strip_prefix("plain:") == Some(password))
    }
}

/// [`PlainPasswords`] that counts hashing work.
#[derive(Default)]
struct CountingPasswords {
    hashes: AtomicUsize,
    verifies: AtomicUsize,
}

impl PasswordService for CountingPasswords {
    fn hash(&self, password: &str) -> Result<String, AuthError> {
        self.hashes.fetch_add(1, Ordering::SeqCst);
        PlainPasswords.hash(password)
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        self.verifies.fetch_add(1, Ordering::SeqCst);
        PlainPasswords.verify(password, hash)
    }
}

fn test_state() -> AppState {
    let mut state = AppState::in_memory(SessionConfig::default());
    state.passwords = Arc::new(PlainPasswords);
    state
}

fn token_service() -> Arc<dyn TokenService> {
    Arc::new(JwtTokenService::new(JwtConfig::default()))
}

macro_rules! test_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state.clone()))
                .app_data(web::Data::new(token_service()))
                .wrap(RequestIdMiddleware)
                .configure(configure_routes),
        )
        .await
    };
}

async fn seed_user(state: &AppState, username: &str) -> User {
    let user = User::new(username.to_string(), "plain:correct-horse".to_string());
    state.users.save(user).await.unwrap()
}

async fn seed_post(state: &AppState, author: &User, title: &str, age_minutes: i64) -> Post {
    let mut post = Post::new(
        author.id,
        NewPost::parse(title, "Some body text.", "", "").unwrap(),
    );
    post.date = Utc::now() - Duration::minutes(age_minutes);
    state.posts.save(post).await.unwrap()
}

fn session_for(user: &User) -> Cookie<'static> {
    let token = token_service()
        .generate_token(user.id, &user.username)
        .unwrap();
    Cookie::new(SESSION_COOKIE, token)
}

fn location(res: &actix_web::dev::ServiceResponse) -> &str {
    res.headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
}

async fn body_text(res: actix_web::dev::ServiceResponse) -> String {
    String::from_utf8(test::read_body(res).await.to_vec()).unwrap()
}

fn post_form(title: &str, slug: &str) -> NewPostForm {
    NewPostForm {
        title: title.to_string(),
        body: "Hello there.".to_string(),
        slug: slug.to_string(),
        banner: String::new(),
    }
}

// ---------------------------------------------------------------------------
// Listing and detail
// ---------------------------------------------------------------------------

#[actix_rt::test]
async fn test_empty_listing() {
    let state = test_state();
    let app = test_app!(state);

    let res = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;

    assert_eq!(res.status(), StatusCode::OK);
    assert!(body_text(res).await.contains("No posts yet."));
}

#[actix_rt::test]
async fn test_listing_is_newest_first() {
    let state = test_state();
    let alice = seed_user(&state, "alice").await;
    seed_post(&state, &alice, "Middle post", 10).await;
    seed_post(&state, &alice, "Oldest post", 20).await;
    seed_post(&state, &alice, "Newest post", 0).await;
    let app = test_app!(state);

    let res = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    let html = body_text(res).await;

    let newest = html.find("Newest post").unwrap();
    let middle = html.find("Middle post").unwrap();
    let oldest = html.find("Oldest post").unwrap();
    assert!(newest < middle && middle < oldest);
    assert!(html.contains("default.jpeg"));
}

#[actix_rt::test]
async fn test_post_detail() {
    let state = test_state();
    let alice = seed_user(&state, "alice").await;
    seed_post(&state, &alice, "Hello World", 0).await;
    let app = test_app!(state);

    let res = test::call_service(
        &app,
        test::TestRequest::get().uri("/hello-world/").to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::OK);
    let html = body_text(res).await;
    assert!(html.contains("Hello World"));
    assert!(html.contains("By alice"));
}

#[actix_rt::test]
async fn test_post_detail_not_found() {
    let state = test_state();
    let app = test_app!(state);

    let res = test::call_service(
        &app,
        test::TestRequest::get().uri("/no-such-post/").to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert!(body_text(res).await.contains("no-such-post"));
}

#[actix_rt::test]
async fn test_not_found_page_for_logged_in_user() {
    let state = test_state();
    let alice = seed_user(&state, "alice").await;
    let app = test_app!(state);

    let req = test::TestRequest::get()
        .uri("/no-such-post/")
        .cookie(session_for(&alice))
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let html = body_text(res).await;
    assert!(!html.contains("Log in"));
    assert!(!html.contains("Register"));
}

#[actix_rt::test]
async fn test_deleting_author_removes_their_posts() {
    let state = test_state();
    let alice = seed_user(&state, "alice").await;
    seed_post(&state, &alice, "Hello World", 0).await;
    state.users.delete(alice.id).await.unwrap();
    let app = test_app!(state);

    let res = test::call_service(
        &app,
        test::TestRequest::get().uri("/hello-world/").to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert!(body_text(res).await.contains("No posts yet."));
}

// ---------------------------------------------------------------------------
// Post creation
// ---------------------------------------------------------------------------

#[actix_rt::test]
async fn test_new_post_form_requires_login() {
    let state = test_state();
    let app = test_app!(state);

    let res = test::call_service(&app, test::TestRequest::get().uri("/new/").to_request()).await;

    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/users/login/?next=/new/");
}

#[actix_rt::test]
async fn test_anonymous_submission_is_not_saved() {
    let state = test_state();
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/new/")
        .set_form(post_form("Sneaky", ""))
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/users/login/?next=/new/");
    assert!(state.posts.list_newest_first().await.unwrap().is_empty());
}

#[actix_rt::test]
async fn test_new_post_form_for_logged_in_user() {
    let state = test_state();
    let alice = seed_user(&state, "alice").await;
    let app = test_app!(state);

    let req = test::TestRequest::get()
        .uri("/new/")
        .cookie(session_for(&alice))
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::OK);
    let html = body_text(res).await;
    assert!(html.contains("name=\"title\""));
    assert!(html.contains("Logged in as alice"));
}

#[actix_rt::test]
async fn test_bearer_token_is_accepted() {
    let state = test_state();
    let alice = seed_user(&state, "alice").await;
    let app = test_app!(state);

    let token = token_service()
        .generate_token(alice.id, &alice.username)
        .unwrap();
    let req = test::TestRequest::get()
        .uri("/new/")
        .insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn test_create_post() {
    let state = test_state();
    let alice = seed_user(&state, "alice").await;
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/new/")
        .cookie(session_for(&alice))
        .set_form(post_form("My First Post", ""))
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/");

    let posts = state.posts.list_newest_first().await.unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].author_id, alice.id);
    assert_eq!(posts[0].slug, "my-first-post");
    assert_eq!(posts[0].banner, "default.jpeg");
}

#[actix_rt::test]
async fn test_invalid_post_is_redisplayed() {
    let state = test_state();
    let alice = seed_user(&state, "alice").await;
    let app = test_app!(state);

    let form = NewPostForm {
        title: String::new(),
        body: "Kept body".to_string(),
        slug: String::new(),
        banner: "notes.txt".to_string(),
    };
    let req = test::TestRequest::post()
        .uri("/new/")
        .cookie(session_for(&alice))
        .set_form(form)
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::OK);
    let html = body_text(res).await;
    assert!(html.contains("This field is required."));
    assert!(html.contains("Upload a valid image."));
    assert!(html.contains("Kept body"));
    assert!(state.posts.list_newest_first().await.unwrap().is_empty());
}

#[actix_rt::test]
async fn test_duplicate_slug_is_rejected() {
    let state = test_state();
    let alice = seed_user(&state, "alice").await;
    seed_post(&state, &alice, "Taken", 5).await;
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/new/")
        .cookie(session_for(&alice))
        .set_form(post_form("Another title", "taken"))
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::OK);
    assert!(body_text(res).await.contains("A post with this slug already exists."));
    assert_eq!(state.posts.list_newest_first().await.unwrap().len(), 1);
}

/// Post repository whose first `slug_exists` answers "free", as if another
/// request saved the same slug between the check and the insert.
struct SlugCheckLosesRace {
    inner: Arc<dyn PostRepository>,
    checked: AtomicBool,
}

#[async_trait::async_trait]
impl BaseRepository<Post, Uuid> for SlugCheckLosesRace {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        self.inner.find_by_id(id).await
    }

    async fn save(&self, post: Post) -> Result<Post, RepoError> {
        self.inner.save(post).await
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.inner.delete(id).await
    }
}

#[async_trait::async_trait]
impl PostRepository for SlugCheckLosesRace {
    async fn list_newest_first(&self) -> Result<Vec<Post>, RepoError> {
        self.inner.list_newest_first().await
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        self.inner.find_by_slug(slug).await
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool, RepoError> {
        if !self.checked.swap(true, Ordering::SeqCst) {
            return Ok(false);
        }
        self.inner.slug_exists(slug).await
    }
}

#[actix_rt::test]
async fn test_slug_taken_during_save_is_redisplayed() {
    let mut state = test_state();
    let alice = seed_user(&state, "alice").await;
    seed_post(&state, &alice, "Taken", 5).await;
    state.posts = Arc::new(SlugCheckLosesRace {
        inner: state.posts.clone(),
        checked: AtomicBool::new(false),
    });
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/new/")
        .cookie(session_for(&alice))
        .set_form(post_form("Another title", "taken"))
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::OK);
    let html = body_text(res).await;
    assert!(html.contains("A post with this slug already exists."));
    assert!(html.contains("Another title"));
    assert_eq!(state.posts.list_newest_first().await.unwrap().len(), 1);
}

#[actix_rt::test]
async fn test_session_of_deleted_user_cannot_post() {
    let state = test_state();
    let alice = seed_user(&state, "alice").await;
    let cookie = session_for(&alice);
    state.users.delete(alice.id).await.unwrap();
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/new/")
        .cookie(cookie)
        .set_form(post_form("Ghost post", ""))
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::FOUND);
    assert!(location(&res).starts_with("/users/login/"));
    assert!(state.posts.list_newest_first().await.unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

#[actix_rt::test]
async fn test_register_logs_the_user_in() {
    let state = test_state();
    let app = test_app!(state);

    let form = RegisterForm {
        username: "bob".to_string(),
        password1: "s3cret-pass".to_string(),
        password2: "s3cret-pass".to_string(),
    };
    let req = test::TestRequest::post()
        .uri("/users/register/")
        .set_form(form)
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/");
    let cookie = res
        .response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .unwrap();
    assert!(cookie.http_only().unwrap_or(false));
    assert!(!cookie.value().is_empty());

    let bob = state.users.find_by_username("bob").await.unwrap().unwrap();
    assert_eq!(bob.password_hash, "plain:s3cret-pass");
}

#[actix_rt::test]
async fn test_register_rejects_taken_username() {
    let state = test_state();
    seed_user(&state, "alice").await;
    let app = test_app!(state);

    let form = RegisterForm {
        username: "alice".to_string(),
        password1: "s3cret-pass".to_string(),
        password2: "s3cret-pass".to_string(),
    };
    let req = test::TestRequest::post()
        .uri("/users/register/")
        .set_form(form)
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::OK);
    assert!(body_text(res).await.contains("A user with that username already exists."));
}

#[actix_rt::test]
async fn test_register_rejects_mismatched_passwords() {
    let state = test_state();
    let app = test_app!(state);

    let form = RegisterForm {
        username: "bob".to_string(),
        password1: "s3cret-pass".to_string(),
        password2: "different".to_string(),
    };
    let req = test::TestRequest::post()
        .uri("/users/register/")
        .set_form(form)
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::OK);
    assert!(body_text(res).await.contains("The two password fields didn"));
    assert!(state.users.find_by_username("bob").await.unwrap().is_none());
}

#[actix_rt::test]
async fn test_login_form_carries_next() {
    let state = test_state();
    let app = test_app!(state);

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/users/login/?next=/new/")
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::OK);
    let html = body_text(res).await;
    let next_field = html.find("name=\"next\"").unwrap();
    assert!(html[next_field..].contains("new"));
}

#[actix_rt::test]
async fn test_login_redirects_to_next() {
    let state = test_state();
    seed_user(&state, "alice").await;
    let app = test_app!(state);

    let form = LoginForm {
        username: "alice".to_string(),
        password: "correct-horse".to_string(),
        next: Some("/new/".to_string()),
    };
    let req = test::TestRequest::post()
        .uri("/users/login/")
        .set_form(form)
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/new/");
    assert!(
        res.response()
            .cookies()
            .any(|c| c.name() == SESSION_COOKIE && !c.value().is_empty())
    );
}

#[actix_rt::test]
async fn test_login_ignores_offsite_next() {
    let state = test_state();
    seed_user(&state, "alice").await;
    let app = test_app!(state);

    let form = LoginForm {
        username: "alice".to_string(),
        password: "correct-horse".to_string(),
        next: Some("//evil.example/".to_string()),
    };
    let req = test::TestRequest::post()
        .uri("/users/login/")
        .set_form(form)
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(location(&res), "/");
}

#[actix_rt::test]
async fn test_login_with_wrong_password() {
    let state = test_state();
    seed_user(&state, "alice").await;
    let app = test_app!(state);

    let form = LoginForm {
        username: "alice".to_string(),
        password: "wrong-horse".to_string(),
        next: None,
    };
    let req = test::TestRequest::post()
        .uri("/users/login/")
        .set_form(form)
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.response().cookies().next().is_none());
    assert!(body_text(res).await.contains("Invalid username or password."));
}

#[actix_rt::test]
async fn test_unknown_username_still_costs_a_hash() {
    let passwords = Arc::new(CountingPasswords::default());
    let mut state = test_state();
    state.passwords = passwords.clone();
    seed_user(&state, "alice").await;
    let app = test_app!(state);

    let attempt = |username: &str| {
        test::TestRequest::post()
            .uri("/users/login/")
            .set_form(LoginForm {
                username: username.to_string(),
                password: "nope".to_string(),
                next: None,
            })
            .to_request()
    };

    let res = test::call_service(&app, attempt("nobody")).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(body_text(res).await.contains("Invalid username or password."));
    assert_eq!(passwords.hashes.load(Ordering::SeqCst), 1);
    assert_eq!(passwords.verifies.load(Ordering::SeqCst), 0);

    let res = test::call_service(&app, attempt("alice")).await;
    assert!(body_text(res).await.contains("Invalid username or password."));
    assert_eq!(passwords.hashes.load(Ordering::SeqCst), 1);
    assert_eq!(passwords.verifies.load(Ordering::SeqCst), 1);
}

#[actix_rt::test]
async fn test_logout_clears_session() {
    let state = test_state();
    let alice = seed_user(&state, "alice").await;
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/users/logout/")
        .cookie(session_for(&alice))
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/");
    let cookie = res
        .response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .unwrap();
    assert_eq!(cookie.value(), "");
    assert_eq!(
        cookie.max_age(),
        Some(actix_web::cookie::time::Duration::ZERO)
    );
}

#[cfg(feature = "rate-limit")]
#[actix_rt::test]
async fn test_login_attempts_are_throttled() {
    use inkpost_core::ports::RateLimiter;
    use inkpost_infra::{InMemoryRateLimiter, RateLimitConfig};

    let state = test_state();
    let limiter: Arc<dyn RateLimiter> = Arc::new(
        InMemoryRateLimiter::new(RateLimitConfig {
            max_requests: 2,
            window: std::time::Duration::from_secs(60),
        })
        .unwrap(),
    );
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state.clone()))
            .app_data(web::Data::new(token_service()))
            .app_data(web::Data::new(limiter))
            .configure(configure_routes),
    )
    .await;

    let attempt = || {
        test::TestRequest::post()
            .uri("/users/login/")
            .set_form(LoginForm {
                username: "alice".to_string(),
                password: "nope".to_string(),
                next: None,
            })
            .to_request()
    };

    for _ in 0..2 {
        let res = test::call_service(&app, attempt()).await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    let res = test::call_service(&app, attempt()).await;
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(res.headers().contains_key(header::RETRY_AFTER));

    // viewing the form is never throttled
    let res = test::call_service(
        &app,
        test::TestRequest::get().uri("/users/login/").to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[cfg(feature = "rate-limit")]
fn two_attempt_limiter() -> Arc<dyn inkpost_core::ports::RateLimiter> {
    use inkpost_infra::{InMemoryRateLimiter, RateLimitConfig};

    Arc::new(
        InMemoryRateLimiter::new(RateLimitConfig {
            max_requests: 2,
            window: std::time::Duration::from_secs(60),
        })
        .unwrap(),
    )
}

#[cfg(feature = "rate-limit")]
fn login_attempt_from(peer: &str, forwarded_for: &str) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/users/login/")
        .peer_addr(peer.parse().unwrap())
        .insert_header(("x-forwarded-for", forwarded_for))
        .set_form(LoginForm {
            username: "alice".to_string(),
            password: "nope".to_string(),
            next: None,
        })
}

#[cfg(feature = "rate-limit")]
#[actix_rt::test]
async fn test_forwarded_for_does_not_reset_throttle() {
    let state = test_state();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state.clone()))
            .app_data(web::Data::new(token_service()))
            .app_data(web::Data::new(two_attempt_limiter()))
            .configure(configure_routes),
    )
    .await;

    let mut statuses = Vec::new();
    for i in 0..10 {
        let req = login_attempt_from("203.0.113.7:5000", &format!("10.0.0.{i}")).to_request();
        statuses.push(test::call_service(&app, req).await.status());
    }

    assert_eq!(statuses[..2], [StatusCode::OK, StatusCode::OK]);
    assert!(
        statuses[2..]
            .iter()
            .all(|s| *s == StatusCode::TOO_MANY_REQUESTS)
    );
}

#[cfg(feature = "rate-limit")]
#[actix_rt::test]
async fn test_trusted_proxy_keys_on_forwarded_client() {
    use crate::middleware::rate_limit::ClientKeyConfig;

    let state = test_state();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state.clone()))
            .app_data(web::Data::new(token_service()))
            .app_data(web::Data::new(two_attempt_limiter()))
            .app_data(ClientKeyConfig {
                trust_proxy_headers: true,
            })
            .configure(configure_routes),
    )
    .await;

    // every client arrives through the same proxy
    for i in 0..5 {
        let req = login_attempt_from("10.1.1.1:443", &format!("198.51.100.{i}")).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    }

    for _ in 0..2 {
        let req = login_attempt_from("10.1.1.1:443", "198.51.100.99").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    }
    let req = login_attempt_from("10.1.1.1:443", "198.51.100.99").to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );
}

// ---------------------------------------------------------------------------
// JSON API
// ---------------------------------------------------------------------------

#[actix_rt::test]
async fn test_health() {
    let state = test_state();
    let app = test_app!(state);

    let res = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/health").to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(res).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storage"], "memory");
}

#[actix_rt::test]
async fn test_api_lists_posts_newest_first() {
    let state = test_state();
    let alice = seed_user(&state, "alice").await;
    seed_post(&state, &alice, "Older", 30).await;
    seed_post(&state, &alice, "Newer", 1).await;
    let app = test_app!(state);

    let res = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/posts").to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(res).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"][0]["slug"], "newer");
    assert_eq!(body["data"][1]["slug"], "older");
    assert_eq!(body["data"][0]["author_id"], alice.id.to_string());
}

#[actix_rt::test]
async fn test_api_missing_post_is_problem_document() {
    let state = test_state();
    let app = test_app!(state);

    let req = test::TestRequest::get()
        .uri("/api/posts/missing")
        .insert_header(("x-request-id", "req-42"))
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = test::read_body_json(res).await;
    assert_eq!(body["status"], 404);
    assert_eq!(body["request_id"], "req-42");
}
