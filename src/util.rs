//! URL and JSON helpers shared by the API modules.

use serde_json::{Map, Value};
use url::Url;

use crate::error::{EodhError, Result};

/// Whether `url` has a scheme and host.
pub fn is_absolute_url(url: &str) -> bool {
    Url::parse(url).map(|u| u.has_host()).unwrap_or(false)
}

/// Join path segments onto `base` using posix rules.
///
/// Only `base` may be absolute; a later segment starting with `/` would
/// discard everything before it, so it is rejected. Empty segments are
/// skipped and a trailing `/` on any part is not doubled.
pub fn join_url<S: AsRef<str>>(base: &str, segments: &[S]) -> Result<String> {
    let mut joined = base.to_string();
    for segment in segments {
        let segment = segment.as_ref();
        if segment.starts_with('/') {
            return Err(EodhError::InvalidPath(segment.to_string()));
        }
        if segment.is_empty() {
            continue;
        }
        if !joined.is_empty() && !joined.ends_with('/') {
            joined.push('/');
        }
        joined.push_str(segment);
    }
    Ok(joined)
}

/// Drop entries whose value is JSON `null`.
pub fn remove_null_items(map: Map<String, Value>) -> Map<String, Value> {
    map.into_iter().filter(|(_, v)| !v.is_null()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_is_absolute_url() {
        assert!(is_absolute_url("https://example.com"));
        assert!(is_absolute_url("http://example.com"));
        assert!(!is_absolute_url("example.com"));
        assert!(!is_absolute_url("/path/to/resource"));
        assert!(!is_absolute_url("path/to/resource"));
        assert!(!is_absolute_url(""));
    }

    #[test]
    fn test_join_url() {
        assert_eq!(
            join_url("https://example.com", &["path", "to", "resource"]).unwrap(),
            "https://example.com/path/to/resource"
        );
        assert_eq!(
            join_url("https://example.com/", &["path", "to", "resource"]).unwrap(),
            "https://example.com/path/to/resource"
        );
        assert_eq!(
            join_url("https://example.com", &["path/with/slash/", "resource"]).unwrap(),
            "https://example.com/path/with/slash/resource"
        );
        assert_eq!(join_url("", &["path", "to", "resource"]).unwrap(), "path/to/resource");
        assert_eq!(join_url("/path", &["to", "resource"]).unwrap(), "/path/to/resource");
    }

    #[test]
    fn test_join_url_rejects_absolute_segment() {
        let err = join_url("https://example.com", &["/path", "to"]).unwrap_err();
        assert!(matches!(err, EodhError::InvalidPath(p) if p == "/path"));
    }

    #[test]
    fn test_remove_null_items() {
        let input = json!({"a": 0, "b": "", "c": false, "d": null});
        let output = remove_null_items(input.as_object().unwrap().clone());
        assert_eq!(Value::Object(output), json!({"a": 0, "b": "", "c": false}));

        let all_null = json!({"a": null, "b": null});
        assert!(remove_null_items(all_null.as_object().unwrap().clone()).is_empty());
    }
}
