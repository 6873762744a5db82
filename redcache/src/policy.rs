use serde::{Deserialize, Serialize};

/// What a [`Cache`](crate::Cache) does when its backend fails.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Return the backend error to the caller.
    #[default]
    Propagate,
    /// Log a connection error and switch the cache off. Every later call
    /// answers as if the key were absent, without reaching the backend, until
    /// [`Cache::enable`](crate::Cache::enable) is called. Errors that concern a
    /// single value, such as a failed decode, are still returned.
    Disable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_names_are_snake_case() {
        let policy: FailurePolicy = serde_json::from_str("\"disable\"").unwrap();
        assert_eq!(policy, FailurePolicy::Disable);
        assert_eq!(
            serde_json::to_string(&FailurePolicy::Propagate).unwrap(),
            "\"propagate\""
        );
    }
}
