//! HttpOnly cookies carrying the access and refresh tokens.

use crate::types::TokenPair;
use axum::http::{header, HeaderMap};
use cookie::{time::Duration, Cookie, SameSite};

/// Cookie name for the access token
pub const ACCESS_COOKIE: &str = "access-token";

/// Cookie name for the refresh token
pub const REFRESH_COOKIE: &str = "refresh-token";

/// Attributes applied to every auth cookie
#[derive(Debug, Clone, PartialEq)]
pub struct CookieSettings {
    /// Whether to set the Secure flag (disable only for plain-HTTP development)
    pub secure: bool,
    pub same_site: SameSite,
    pub path: String,
    /// Domain (None = current domain)
    pub domain: Option<String>,
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            secure: true,
            same_site: SameSite::Lax,
            path: "/".to_string(),
            domain: None,
        }
    }
}

/// Parses `strict`, `lax` or `none` (case-insensitive).
pub fn parse_same_site(value: &str) -> Option<SameSite> {
    match value.to_ascii_lowercase().as_str() {
        "strict" => Some(SameSite::Strict),
        "lax" => Some(SameSite::Lax),
        "none" => Some(SameSite::None),
        _ => None,
    }
}

fn build(name: &'static str, value: String, max_age_secs: i64, settings: &CookieSettings) -> String {
    let mut cookie = Cookie::build((name, value))
        .path(settings.path.clone())
        .http_only(true)
        .secure(settings.secure)
        .same_site(settings.same_site)
        .max_age(Duration::seconds(max_age_secs))
        .build();

    if let Some(domain) = &settings.domain {
        cookie.set_domain(domain.clone());
    }

    cookie.to_string()
}

/// `Set-Cookie` values for a freshly issued token pair.
pub fn session_cookies(
    tokens: &TokenPair,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
    settings: &CookieSettings,
) -> [String; 2] {
    [
        build(ACCESS_COOKIE, tokens.access_token.clone(), access_ttl_secs, settings),
        build(REFRESH_COOKIE, tokens.refresh_token.clone(), refresh_ttl_secs, settings),
    ]
}

/// `Set-Cookie` values that blank both auth cookies.
pub fn cleared_cookies(settings: &CookieSettings) -> [String; 2] {
    [
        build(ACCESS_COOKIE, String::new(), 0, settings),
        build(REFRESH_COOKIE, String::new(), 0, settings),
    ]
}

/// First non-empty cookie called `name` across all `Cookie` headers.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(|parsed| parsed.ok())
        .find(|c| c.name() == name && !c.value().is_empty())
        .map(|c| c.value().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn tokens() -> TokenPair {
        TokenPair {
            access_token: "a.b.c".to_string(),
            refresh_token: "d.e.f".to_string(),
        }
    }

    #[test]
    fn test_session_cookies_attributes() {
        let [access, refresh] = session_cookies(&tokens(), 900, 604800, &CookieSettings::default());

        assert!(access.starts_with("access-token=a.b.c"));
        assert!(access.contains("HttpOnly"));
        assert!(access.contains("Secure"));
        assert!(access.contains("SameSite=Lax"));
        assert!(access.contains("Max-Age=900"));
        assert!(refresh.starts_with("refresh-token=d.e.f"));
        assert!(refresh.contains("Max-Age=604800"));
    }

    #[test]
    fn test_cleared_cookies_are_empty() {
        let settings = CookieSettings {
            secure: false,
            ..Default::default()
        };
        let [access, refresh] = cleared_cookies(&settings);

        assert!(access.starts_with("access-token=;"));
        assert!(refresh.starts_with("refresh-token=;"));
        assert!(access.contains("Max-Age=0"));
        assert!(!access.contains("Secure"));
    }

    #[test]
    fn test_read_cookie() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("theme=dark; access-token=tok1"));
        headers.append(header::COOKIE, HeaderValue::from_static("refresh-token=tok2"));

        assert_eq!(read_cookie(&headers, ACCESS_COOKIE).as_deref(), Some("tok1"));
        assert_eq!(read_cookie(&headers, REFRESH_COOKIE).as_deref(), Some("tok2"));
        assert_eq!(read_cookie(&headers, "missing"), None);
    }

    #[test]
    fn test_read_cookie_skips_blank_values() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("access-token="));

        assert_eq!(read_cookie(&headers, ACCESS_COOKIE), None);
    }

    #[test]
    fn test_parse_same_site() {
        assert_eq!(parse_same_site("Strict"), Some(SameSite::Strict));
        assert_eq!(parse_same_site("none"), Some(SameSite::None));
        assert_eq!(parse_same_site("sideways"), None);
    }
}
