//! XSS protection for overlay markup
//!
//! Chat and notification envelopes carry a pre-rendered HTML span for the
//! user name, which the overlay inserts as markup. Everything interpolated
//! into that span goes through this module.

use crate::constants::DEFAULT_USER_COLOR;

/// HTML entities for encoding special characters
const HTML_ENTITIES: &[(&str, &str)] = &[
    ("&", "&amp;"),   // Must be first to avoid double encoding
    ("<", "&lt;"),
    (">", "&gt;"),
    ("\"", "&quot;"),
    ("'", "&#x27;"),
    ("/", "&#x2F;"),
    ("`", "&#x60;"),
    ("=", "&#x3D;"),
];

/// URL schemes that are potentially dangerous
const DANGEROUS_SCHEMES: &[&str] = &[
    "javascript:", "data:", "vbscript:", "file:", "ftp:"
];

/// Encode HTML entities to prevent XSS attacks
pub fn encode_html(input: &str) -> String {
    let mut result = input.to_string();

    for (char, entity) in HTML_ENTITIES {
        result = result.replace(char, entity);
    }

    result
}

/// Accept `#rgb` or `#rrggbb`, anything else falls back to the default color
pub fn sanitize_color(color: &str) -> String {
    let trimmed = color.trim();
    let hex = trimmed.strip_prefix('#').unwrap_or("");
    let valid = matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit());

    if valid {
        trimmed.to_ascii_lowercase()
    } else {
        if !trimmed.is_empty() {
            log::warn!("Replacing invalid user color {:?} with default", color);
        }
        DEFAULT_USER_COLOR.to_string()
    }
}

/// Render the user name span shown by the chat and notification overlays
pub fn user_span(user: &str, color: &str) -> String {
    format!(
        "<span class=\"user\" style=\"color: {}\">{}</span>",
        sanitize_color(color),
        encode_html(user)
    )
}

/// Only http(s) and relative URLs may reach the emote wall
pub fn is_safe_url(url: &str) -> bool {
    let url_lower = url.trim().to_lowercase();

    // Check for dangerous schemes
    for scheme in DANGEROUS_SCHEMES {
        if url_lower.starts_with(scheme) {
            log::warn!("Blocked dangerous URL scheme: {}", scheme);
            return false;
        }
    }

    if url_lower.starts_with("http://") || url_lower.starts_with("https://") || url_lower.starts_with('/') {
        !url.contains(&['"', '<', '>'][..])
    } else {
        log::warn!("Blocked potentially unsafe URL: {}", url);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_encoding() {
        assert_eq!(encode_html("<script>alert('xss')</script>"),
                   "&lt;script&gt;alert(&#x27;xss&#x27;)&lt;&#x2F;script&gt;");
        assert_eq!(encode_html("Hello & goodbye"), "Hello &amp; goodbye");
        assert_eq!(encode_html("\"quoted\""), "&quot;quoted&quot;");
    }

    #[test]
    fn test_color_sanitizing() {
        assert_eq!(sanitize_color("#FF0000"), "#ff0000");
        assert_eq!(sanitize_color("#abc"), "#abc");
        assert_eq!(sanitize_color("red"), DEFAULT_USER_COLOR);
        assert_eq!(sanitize_color("#12345g"), DEFAULT_USER_COLOR);
        assert_eq!(sanitize_color("#fff\" onmouseover=\"x"), DEFAULT_USER_COLOR);
    }

    #[test]
    fn test_user_span() {
        assert_eq!(
            user_span("alice", "#a970ff"),
            "<span class=\"user\" style=\"color: #a970ff\">alice</span>"
        );
        assert_eq!(
            user_span("<b>eve</b>", "nope"),
            "<span class=\"user\" style=\"color: #a970ff\">&lt;b&gt;eve&lt;&#x2F;b&gt;</span>"
        );
    }

    #[test]
    fn test_url_checks() {
        assert!(is_safe_url("https://static-cdn.example/emote/1.0"));
        assert!(is_safe_url("/emotes/kappa.png"));
        assert!(!is_safe_url("javascript:alert(1)"));
        assert!(!is_safe_url("data:image/png;base64,AAAA"));
        assert!(!is_safe_url("kappa.png"));
        assert!(!is_safe_url("https://x/\"onerror=\"alert(1)"));
    }
}
