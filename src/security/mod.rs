//! Sanitizing helpers for text that ends up inside overlay markup

pub mod xss;

pub use xss::{encode_html, is_safe_url, sanitize_color, user_span};
