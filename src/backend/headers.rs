//! Header defaults for backend calls.

use axum::http::{header, HeaderMap, HeaderValue};

/// Headers every backend call starts from.
pub fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers
}

/// Merge caller headers over defaults.
///
/// A key present in `caller` replaces every default value for that key;
/// multi-valued caller headers are kept intact.
pub fn merge_headers(defaults: &HeaderMap, caller: &HeaderMap) -> HeaderMap {
    let mut merged = defaults.clone();
    for key in caller.keys() {
        merged.remove(key);
    }
    for (key, value) in caller {
        merged.append(key.clone(), value.clone());
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_survive_empty_caller() {
        let merged = merge_headers(&default_headers(), &HeaderMap::new());
        assert_eq!(merged.get(header::CONTENT_TYPE).unwrap(), "application/json");
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn caller_overrides_conflicting_key() {
        let mut caller = HeaderMap::new();
        caller.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        let merged = merge_headers(&default_headers(), &caller);
        assert_eq!(merged.get_all(header::CONTENT_TYPE).iter().count(), 1);
        assert_eq!(merged.get(header::CONTENT_TYPE).unwrap(), "text/plain");
    }

    #[test]
    fn caller_adds_new_keys_and_keeps_repeats() {
        let mut caller = HeaderMap::new();
        caller.append(header::ACCEPT, HeaderValue::from_static("application/json"));
        caller.append(header::ACCEPT, HeaderValue::from_static("text/html"));
        caller.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));

        let merged = merge_headers(&default_headers(), &caller);
        assert_eq!(merged.get(header::CONTENT_TYPE).unwrap(), "application/json");
        assert_eq!(merged.get_all(header::ACCEPT).iter().count(), 2);
        assert_eq!(merged.get(header::AUTHORIZATION).unwrap(), "Bearer abc");
    }
}
