//! Session cookie handling

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Duration;

/// Cookie name used when none is configured
pub const DEFAULT_SESSION_COOKIE: &str = "at";

/// Name and lifetime of the cookie that carries the session token
#[derive(Debug, Clone)]
pub struct SessionCookie {
    name: String,
    ttl: Duration,
    secure: bool,
}

impl SessionCookie {
    pub fn new(name: impl Into<String>, ttl: Duration, secure: bool) -> Self {
        Self {
            name: name.into(),
            ttl,
            secure,
        }
    }

    /// Lifetime of issued tokens and of the cookie itself
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Read the session token, treating an empty cookie as absent
    pub fn extract_token(&self, jar: &CookieJar) -> Option<String> {
        jar.get(&self.name)
            .map(|cookie| cookie.value())
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }

    /// Cookie that hands a freshly issued token to the browser
    pub fn issue(&self, token: String) -> Cookie<'static> {
        Cookie::build((self.name.clone(), token))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(time::Duration::seconds(self.ttl.num_seconds()))
            .build()
    }

    /// Cookie that, added to a jar via `remove`, clears the session
    pub fn removal(&self) -> Cookie<'static> {
        Cookie::build((self.name.clone(), "")).path("/").build()
    }
}

impl Default for SessionCookie {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_COOKIE, Duration::minutes(15), false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, HeaderValue, header::COOKIE};

    fn jar(cookie_header: &str) -> CookieJar {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(cookie_header).unwrap());
        CookieJar::from_headers(&headers)
    }

    #[test]
    fn test_extract_token() {
        let session = SessionCookie::default();

        assert_eq!(
            session.extract_token(&jar("theme=dark; at=abc.def.ghi")),
            Some("abc.def.ghi".to_string())
        );
        assert_eq!(session.extract_token(&jar("theme=dark")), None);
        assert_eq!(session.extract_token(&jar("at=")), None);
        assert_eq!(session.extract_token(&CookieJar::new()), None);
    }

    #[test]
    fn test_custom_cookie_name() {
        let session = SessionCookie::new("sid", Duration::minutes(5), true);

        assert_eq!(session.extract_token(&jar("at=one; sid=two")), Some("two".to_string()));
    }

    #[test]
    fn test_issued_cookie_attributes() {
        let session = SessionCookie::new("at", Duration::minutes(15), true);
        let cookie = session.issue("token-value".to_string());

        assert_eq!(cookie.name(), "at");
        assert_eq!(cookie.value(), "token-value");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(time::Duration::minutes(15)));
    }
}
