//! Security headers for every response.
//!
//! The policy is locked down except where the Razorpay checkout widget needs
//! room: its script host, its iframe and API hosts, and the popup it opens.

use axum::{
    extract::Request,
    http::{
        HeaderName, HeaderValue,
        header::{
            CACHE_CONTROL, CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS,
            X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};

use super::csp::CspNonce;

/// Razorpay widget script host.
pub const RAZORPAY_SCRIPT_ORIGIN: &str = "https://checkout.razorpay.com";

/// Razorpay API host the widget talks to and frames.
pub const RAZORPAY_API_ORIGIN: &str = "https://api.razorpay.com";

/// Build the CSP header value.
///
/// Without a nonce inline scripts are refused outright. Product images come
/// from the backend's upload host, which is only known at runtime, so any
/// https image source is allowed.
#[must_use]
pub fn content_security_policy(nonce: Option<&str>) -> String {
    let script_src = match nonce {
        Some(nonce) if !nonce.is_empty() => {
            format!("'self' 'nonce-{nonce}' {RAZORPAY_SCRIPT_ORIGIN}")
        }
        _ => format!("'self' {RAZORPAY_SCRIPT_ORIGIN}"),
    };

    [
        "default-src 'none'".to_owned(),
        format!("script-src {script_src}"),
        "style-src 'self'".to_owned(),
        "font-src 'self'".to_owned(),
        "img-src 'self' data: https:".to_owned(),
        format!("connect-src 'self' {RAZORPAY_API_ORIGIN} https://lumberjack.razorpay.com"),
        format!("frame-src {RAZORPAY_API_ORIGIN} {RAZORPAY_SCRIPT_ORIGIN}"),
        "object-src 'none'".to_owned(),
        "base-uri 'self'".to_owned(),
        format!("form-action 'self' {RAZORPAY_API_ORIGIN}"),
        "frame-ancestors 'none'".to_owned(),
    ]
    .join("; ")
}

/// Add security headers to all responses.
///
/// - `X-Frame-Options: DENY`
/// - `X-Content-Type-Options: nosniff`
/// - `Referrer-Policy: strict-origin-when-cross-origin` (Razorpay checks the
///   referring origin)
/// - `Content-Security-Policy` from [`content_security_policy`]
/// - `Permissions-Policy` denying sensors and media, payment allowed for
///   the widget
/// - `Cache-Control: no-store` unless the handler set its own
/// - `Cross-Origin-Opener-Policy: same-origin-allow-popups`
pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;

    let csp = content_security_policy(
        response
            .extensions()
            .get::<CspNonce>()
            .map(CspNonce::value),
    );
    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(
        REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    if let Ok(value) = HeaderValue::from_str(&csp) {
        headers.insert(CONTENT_SECURITY_POLICY, value);
    }

    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static(
            "accelerometer=(), \
             camera=(), \
             display-capture=(), \
             geolocation=(), \
             gyroscope=(), \
             magnetometer=(), \
             microphone=(), \
             midi=(), \
             payment=(self \"https://api.razorpay.com\"), \
             usb=()",
        ),
    );

    // Static assets set their own caching; pages carry cart and account data
    if !headers.contains_key(CACHE_CONTROL) {
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store, max-age=0"));
    }

    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin-allow-popups"),
    );
    headers.insert(
        HeaderName::from_static("x-dns-prefetch-control"),
        HeaderValue::from_static("off"),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_with_nonce_allows_razorpay() {
        let csp = content_security_policy(Some("abc123"));
        assert!(csp.contains("script-src 'self' 'nonce-abc123' https://checkout.razorpay.com"));
        assert!(csp.contains("frame-src https://api.razorpay.com"));
        assert!(csp.contains("frame-ancestors 'none'"));
    }

    #[test]
    fn test_policy_without_nonce_refuses_inline() {
        for csp in [content_security_policy(None), content_security_policy(Some(""))] {
            assert!(!csp.contains("nonce-"));
            assert!(!csp.contains("unsafe-inline"));
        }
    }
}
