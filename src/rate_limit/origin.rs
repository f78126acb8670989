//! Request origin extraction for rate limit keys

use reqwest::header::HeaderMap;
use std::collections::HashMap;

/// Origin used when no address header is present
pub const UNKNOWN_ORIGIN: &str = "unknown";

const FORWARDED_FOR: &str = "x-forwarded-for";
const REAL_IP: &str = "x-real-ip";

/// Anything headers can be looked up in by case-insensitive name
pub trait HeaderSource {
    fn header(&self, name: &str) -> Option<&str>;
}

impl HeaderSource for HeaderMap {
    fn header(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|value| value.to_str().ok())
    }
}

impl HeaderSource for HashMap<String, String> {
    fn header(&self, name: &str) -> Option<&str> {
        self.iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Caller address: first `x-forwarded-for` entry, then `x-real-ip`, then `"unknown"`
pub fn request_origin<H: HeaderSource + ?Sized>(headers: &H) -> String {
    let forwarded = headers
        .header(FORWARDED_FOR)
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|first| !first.is_empty());
    if let Some(first) = forwarded {
        return first.to_string();
    }

    headers
        .header(REAL_IP)
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .unwrap_or(UNKNOWN_ORIGIN)
        .to_string()
}
