//! Cross-cutting HTTP layers: CORS, response security headers and the
//! JSON fallback for unknown routes.

use axum::Router;
use axum::http::request::Parts;
use axum::http::{HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::debug;

use crate::error::AppError;

/// CORS for the browser client. Only origins in `allowed` may call the API
/// with credentials; see [`origin_allowed`] for the matching rules.
pub fn cors_layer(allowed: &[String]) -> CorsLayer {
    let allowed = allowed.to_vec();

    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _parts: &Parts| {
            let ok = origin.to_str().is_ok_and(|origin| origin_allowed(&allowed, origin));
            if !ok {
                debug!("CORS blocked origin {:?}", origin);
            }
            ok
        }))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

/// Exact match, or a `*.domain` entry matching any subdomain of `domain`.
pub fn origin_allowed(allowed: &[String], origin: &str) -> bool {
    allowed.iter().any(|entry| match entry.strip_prefix('*') {
        Some(suffix) => suffix.starts_with('.') && origin.ends_with(suffix),
        None => entry == origin,
    })
}

pub fn with_security_headers(router: Router) -> Router {
    router
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_XSS_PROTECTION,
            HeaderValue::from_static("1; mode=block"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=31536000; includeSubDomains; preload"),
        ))
}

pub async fn not_found() -> AppError {
    AppError::RouteNotFound
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowed() -> Vec<String> {
        vec!["http://localhost:8081".to_string(), "*.vercel.app".to_string()]
    }

    #[test]
    fn exact_origins_match() {
        assert!(origin_allowed(&allowed(), "http://localhost:8081"));
        assert!(!origin_allowed(&allowed(), "http://localhost:8082"));
        assert!(!origin_allowed(&allowed(), "https://localhost:8081"));
    }

    #[test]
    fn wildcard_matches_subdomains_only() {
        assert!(origin_allowed(&allowed(), "https://track.vercel.app"));
        assert!(origin_allowed(&allowed(), "https://pr-12.track.vercel.app"));
        assert!(!origin_allowed(&allowed(), "https://vercel.app"));
        assert!(!origin_allowed(&allowed(), "https://evilvercel.app"));
    }
}
