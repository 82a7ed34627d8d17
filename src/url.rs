//! Extracting and rewriting the `asin=` query parameter of a URL.

use crate::asin::Asin;
use regex::Regex;
use std::sync::LazyLock;

/// Query parameter name carrying the identifier.
pub const ASIN_PARAM: &str = "asin";

static ASIN_IN_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[?&])asin=([A-Z0-9]{10})\b").expect("valid ASIN regex"));

static ASIN_PARAM_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|[?&])asin=[^&#]*").expect("valid asin param regex"));

/// Outcome of rewriting one URL.
#[derive(Debug, Clone, PartialEq)]
pub struct Rewrite {
    pub url: String,
    pub changed: bool,
}

/// Find the identifier carried by the URL's `asin=` parameter.
pub fn extract_asin(url: &str) -> Option<Asin> {
    let caps = ASIN_IN_URL.captures(url)?;
    Asin::parse(caps.get(1)?.as_str()).ok()
}

/// Point the URL at `asin`, replacing the existing parameter value or
/// appending a new parameter.
pub fn replace_asin(url: &str, asin: &Asin) -> Rewrite {
    let new_url = if ASIN_PARAM_VALUE.is_match(url) {
        ASIN_PARAM_VALUE
            .replace_all(url, |caps: &regex::Captures<'_>| {
                format!("{}{}={}", &caps[1], ASIN_PARAM, asin)
            })
            .into_owned()
    } else {
        let sep = if url.contains('?') { '&' } else { '?' };
        format!("{}{}{}={}", url, sep, ASIN_PARAM, asin)
    };

    Rewrite {
        changed: new_url != url,
        url: new_url,
    }
}
