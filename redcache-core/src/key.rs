//! Cache key normalization.
//!
//! Callers hand string keys to the cache. Before a key is sent to a backend it
//! goes through one explicit [`KeyPolicy`]:
//!
//! - [`KeyPolicy::Verbatim`] passes keys through untouched (the default)
//! - [`KeyPolicy::Sanitize`] namespaces the key with an optional prefix and
//!   slugifies every `:`-separated segment
//!
//! ## Slug rules
//!
//! Each segment is lowercased, `_` becomes `-`, `@` becomes `-at-`, anything
//! that is not a letter, digit, whitespace or `-` is dropped, and runs of
//! whitespace and dashes collapse into a single `-`. Leading and trailing
//! dashes are removed. Leading and trailing `:` of the whole key are trimmed
//! before splitting.
//!
//! ```
//! use redcache_core::KeyPolicy;
//!
//! let policy = KeyPolicy::sanitize(Some("app"));
//! assert_eq!(policy.normalize("Users:John Smith!"), "app:users:john-smith");
//!
//! assert_eq!(KeyPolicy::Verbatim.normalize("Users:John Smith!"), "Users:John Smith!");
//! ```

use std::borrow::Cow;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

const SEPARATOR: char = ':';

lazy_static! {
    static ref DISALLOWED: Regex = Regex::new(r"[^\-\p{L}\p{N}\s]+").expect("valid regex");
    static ref DASH_RUNS: Regex = Regex::new(r"[\-\s]+").expect("valid regex");
}

/// Key normalization applied by the cache facade before any backend call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum KeyPolicy {
    /// Keys are used exactly as given.
    #[default]
    Verbatim,
    /// Keys are prefixed and slugified segment by segment.
    Sanitize {
        /// Namespace prepended as the first segment.
        #[serde(default)]
        prefix: Option<String>,
    },
}

impl KeyPolicy {
    /// Creates a sanitizing policy with an optional namespace prefix.
    pub fn sanitize(prefix: Option<impl Into<String>>) -> Self {
        KeyPolicy::Sanitize {
            prefix: prefix.map(Into::into),
        }
    }

    /// Applies the policy to `key`.
    pub fn normalize<'a>(&self, key: &'a str) -> Cow<'a, str> {
        match self {
            KeyPolicy::Verbatim => Cow::Borrowed(key),
            KeyPolicy::Sanitize { prefix } => {
                let namespaced = match prefix {
                    Some(prefix) => Cow::Owned(format!("{prefix}{SEPARATOR}{key}")),
                    None => Cow::Borrowed(key),
                };
                let segments = namespaced
                    .trim_matches(SEPARATOR)
                    .split(SEPARATOR)
                    .map(slug)
                    .collect::<Vec<_>>();
                Cow::Owned(segments.join(":"))
            }
        }
    }
}

fn slug(segment: &str) -> String {
    let flipped = segment.replace('_', "-").replace('@', "-at-").to_lowercase();
    let stripped = DISALLOWED.replace_all(&flipped, "");
    let dashed = DASH_RUNS.replace_all(&stripped, "-");
    dashed.trim_matches('-').to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_without_prefix_trims_separators() {
        let policy = KeyPolicy::Sanitize { prefix: None };
        assert_eq!(policy.normalize(":Orders:Latest Batch:"), "orders:latest-batch");
    }

    #[test]
    fn sanitize_rewrites_underscores_and_at_signs() {
        let policy = KeyPolicy::sanitize(None::<String>);
        assert_eq!(policy.normalize("user_email:me@example.com"), "user-email:me-at-examplecom");
    }

    #[test]
    fn sanitize_collapses_whitespace_and_dashes() {
        let policy = KeyPolicy::sanitize(Some("Tenant A"));
        assert_eq!(policy.normalize("a -- b\t c"), "tenant-a:a-b-c");
    }

    #[test]
    fn verbatim_borrows() {
        assert!(matches!(KeyPolicy::Verbatim.normalize("x"), Cow::Borrowed("x")));
    }

    #[test]
    fn policy_deserializes_from_tagged_form() {
        let policy: KeyPolicy =
            serde_json::from_str(r#"{"type":"Sanitize","prefix":"app"}"#).unwrap();
        assert_eq!(policy, KeyPolicy::sanitize(Some("app")));
    }
}
