use serde_json::Value;
use std::time::Duration;

// Base addresses of the two collaborators
#[derive(Debug, Clone)]
pub struct Upstream {
    pub user_service: String,
    pub listing_service: String,
}

impl Upstream {
    pub fn new(user_service: &str, listing_service: &str) -> Self {
        let upstream = Self {
            user_service: normalize_base(user_service),
            listing_service: normalize_base(listing_service),
        };
        tracing::info!(
            user_service = %upstream.user_service,
            listing_service = %upstream.listing_service,
            "upstream collaborators configured"
        );
        upstream
    }

    pub fn create_user_url(&self) -> String {
        format!("{}/users", self.user_service)
    }

    // The id is pushed as one percent-encoded segment so it can't leave /users
    pub fn user_url(&self, id: &str) -> Option<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.user_service).ok()?;
        url.path_segments_mut()
            .ok()?
            .pop_if_empty()
            .push("users")
            .push(id);
        Some(url)
    }

    pub fn create_listing_url(&self) -> String {
        format!("{}/listings", self.listing_service)
    }

    // The query string is forwarded untouched
    pub fn list_listings_url(&self, query: Option<&str>) -> String {
        match query {
            Some(q) if !q.is_empty() => format!("{}/listings?{}", self.listing_service, q),
            _ => format!("{}/listings", self.listing_service),
        }
    }
}

// add http:// if not present, drop trailing slashes
fn normalize_base(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}

pub fn build_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder().timeout(timeout).build()
}

/// Path segment for a listing owner, or `None` when the record has no usable owner id.
///
/// String ids are limited to ASCII letters, digits, `-` and `_`.
pub fn owner_path_segment(owner: &Value) -> Option<String> {
    match owner {
        Value::String(s) if is_plain_id(s) => Some(s.clone()),
        Value::Number(_) => Some(crate::form::to_form_value(owner)),
        _ => None,
    }
}

fn is_plain_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}
