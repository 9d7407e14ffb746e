//! Validation for user-submitted forms.
//!
//! Handlers hand the raw strings in; a validated value or a list of
//! per-field messages comes back. An invalid form is redisplayed with
//! those messages, so nothing here is an `Err` in the `?` sense.

use std::fmt;

use super::post::{DEFAULT_BANNER, NewPost};

pub const TITLE_MAX_LEN: usize = 100;
pub const SLUG_MAX_LEN: usize = 50;
pub const BANNER_MAX_LEN: usize = 100;
pub const USERNAME_MAX_LEN: usize = 150;
pub const PASSWORD_MIN_LEN: usize = 8;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// First path segments routed elsewhere, so `/{slug}/` could never reach them.
const RESERVED_SLUGS: &[&str] = &["api", "new", "users"];

/// A single message attached to a form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Ordered collection of field errors. Empty means the form is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Messages recorded against `field`, in insertion order.
    pub fn get<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.0
            .iter()
            .filter(move |e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    fn finish<T>(self, value: impl FnOnce() -> T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", e.field, e.message)?;
        }
        Ok(())
    }
}

/// Turn arbitrary text into a URL slug.
///
/// ASCII letters and digits are lower-cased and kept, underscores are kept,
/// whitespace and dashes collapse into single `-`, everything else is dropped.
/// The result is cut to [`SLUG_MAX_LEN`] and never starts or ends with `-`.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len().min(SLUG_MAX_LEN));
    let mut pending_dash = false;

    for c in text.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() || c == '-' {
            pending_dash = true;
        }
    }

    // slug is pure ASCII, so byte truncation is char-safe
    slug.truncate(SLUG_MAX_LEN);
    let trimmed = slug.trim_end_matches('-').len();
    slug.truncate(trimmed);
    slug
}

pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn is_image_name(name: &str) -> bool {
    name.rsplit_once('.')
        .map(|(stem, ext)| {
            !stem.is_empty() && IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
        })
        .unwrap_or(false)
}

impl NewPost {
    /// Validate the fields of the "new post" form.
    ///
    /// Surrounding whitespace is stripped from every field. A blank slug is
    /// derived from the title and a blank banner falls back to
    /// [`DEFAULT_BANNER`].
    pub fn parse(title: &str, body: &str, slug: &str, banner: &str) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();

        let title = title.trim();
        if title.is_empty() {
            errors.add("title", "This field is required.");
        } else if title.chars().count() > TITLE_MAX_LEN {
            errors.add(
                "title",
                format!("Ensure this value has at most {TITLE_MAX_LEN} characters."),
            );
        }

        let body = body.trim();
        if body.is_empty() {
            errors.add("body", "This field is required.");
        }

        let slug = match slug.trim() {
            "" => slugify(title),
            given => given.to_string(),
        };
        if slug.is_empty() {
            if !title.is_empty() {
                errors.add("slug", "Could not derive a slug from the title; enter one.");
            }
        } else if !is_valid_slug(&slug) {
            errors.add(
                "slug",
                "Enter a valid slug consisting of letters, numbers, underscores or hyphens.",
            );
        } else if slug.len() > SLUG_MAX_LEN {
            errors.add(
                "slug",
                format!("Ensure this value has at most {SLUG_MAX_LEN} characters."),
            );
        } else if RESERVED_SLUGS.contains(&slug.to_ascii_lowercase().as_str()) {
            errors.add("slug", format!("The slug “{slug}” is reserved."));
        }

        let banner = match banner.trim() {
            "" => DEFAULT_BANNER,
            given => given,
        };
        if banner.len() > BANNER_MAX_LEN {
            errors.add(
                "banner",
                format!("Ensure this file name has at most {BANNER_MAX_LEN} characters."),
            );
        } else if banner.contains("..") || banner.starts_with('/') || !is_image_name(banner) {
            errors.add(
                "banner",
                "Upload a valid image. Supported types: jpg, jpeg, png, gif, webp.",
            );
        }

        errors.finish(|| NewPost {
            title: title.to_string(),
            body: body.to_string(),
            slug,
            banner: banner.to_string(),
        })
    }
}

/// A validated sign-up: username plus the plain password to be hashed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub username: String,
    pub password: String,
}

impl Registration {
    pub fn parse(username: &str, password1: &str, password2: &str) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();

        let username = username.trim();
        if let Some(msg) = username_problem(username) {
            errors.add("username", msg);
        }

        if password1.is_empty() {
            errors.add("password1", "This field is required.");
        } else if password1.chars().count() < PASSWORD_MIN_LEN {
            errors.add(
                "password1",
                format!("This password is too short. It must contain at least {PASSWORD_MIN_LEN} characters."),
            );
        }
        if password1 != password2 {
            errors.add("password2", "The two password fields didn't match.");
        }

        errors.finish(|| Registration {
            username: username.to_string(),
            password: password1.to_string(),
        })
    }
}

fn username_problem(username: &str) -> Option<String> {
    if username.is_empty() {
        return Some("This field is required.".to_string());
    }
    if username.chars().count() > USERNAME_MAX_LEN {
        return Some(format!(
            "Ensure this value has at most {USERNAME_MAX_LEN} characters."
        ));
    }
    let allowed = |c: char| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_');
    if !username.chars().all(allowed) {
        return Some(
            "Enter a valid username. It may contain only letters, numbers, and @/./+/-/_ characters."
                .to_string(),
        );
    }
    None
}
