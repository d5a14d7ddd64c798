//! Checkout records and staleness detection.
//!
//! Every package directory keeps a record of what is actually materialized in
//! its `repository/` checkout. The record lives in the package's
//! `yacpkg.json` under `^`-prefixed keys, which mark them as written by yacpm
//! rather than by the package author.
//!
//! Two independent questions are answered from it:
//!
//! - does the version need to be re-resolved and checked out again, and
//! - does the sparse selection need to be re-applied.
//!
//! A version refresh invalidates the recorded selection, so it always implies
//! a content refresh. A content refresh can happen on its own when include
//! paths change without the version changing.

use serde::{Deserialize, Deserializer, Serialize};

use crate::version;

/// What is currently checked out for one package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRecord {
    /// Last version checked out; `null` before the first checkout.
    #[serde(rename = "^current_version", default)]
    pub current_version: Option<String>,

    /// Paths passed to the last `git sparse-checkout set`.
    #[serde(
        rename = "^sparse_checkout_list",
        default,
        deserialize_with = "words_or_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub sparse_selection: Vec<String>,

    /// Origin URL of the checkout.
    #[serde(rename = "^repository", default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
}

impl CheckoutRecord {
    /// Reset the record for a freshly initialized (or re-pointed) repository.
    pub fn initialize(&mut self, repository: &str) {
        self.current_version = None;
        self.sparse_selection.clear();
        self.repository = Some(repository.to_string());
    }

    /// Record a successful checkout; the previous selection no longer applies.
    pub fn mark_checked_out(&mut self, version: &str) {
        self.current_version = Some(version.to_string());
        self.sparse_selection.clear();
    }

    /// Record a successful `sparse-checkout set`.
    pub fn mark_selected(&mut self, selection: Vec<String>) {
        self.sparse_selection = selection;
    }
}

/// Older records store the selection as one space separated string.
fn words_or_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum WordsOrList {
        Words(String),
        List(Vec<String>),
    }

    Ok(match WordsOrList::deserialize(deserializer)? {
        WordsOrList::Words(words) => words.split_whitespace().map(str::to_string).collect(),
        WordsOrList::List(items) => items,
    })
}

/// Whether `version` must be resolved and checked out again.
///
/// Floating versions always are, since the tip of their branch may have moved.
pub fn needs_version_refresh(version: &str, record: &CheckoutRecord) -> bool {
    version::is_floating(version) || record.current_version.as_deref() != Some(version)
}

/// Whether the sparse selection must be re-applied.
pub fn needs_content_refresh(selection: &[String], record: &CheckoutRecord) -> bool {
    !selection.is_empty() && selection != record.sparse_selection.as_slice()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(version: Option<&str>, selection: &[&str]) -> CheckoutRecord {
        CheckoutRecord {
            current_version: version.map(str::to_string),
            sparse_selection: selection.iter().map(|s| s.to_string()).collect(),
            repository: Some("https://example.com/repo.git".to_string()),
        }
    }

    #[test]
    fn test_first_checkout_needs_refresh() {
        assert!(needs_version_refresh("", &CheckoutRecord::default()));
        assert!(needs_version_refresh("abc", &CheckoutRecord::default()));
    }

    #[test]
    fn test_same_frozen_version_is_fresh() {
        let record = record(Some("abc123"), &[]);
        assert!(!needs_version_refresh("abc123", &record));
        assert!(needs_version_refresh("def456", &record));
    }

    #[test]
    fn test_floating_version_is_always_stale() {
        let floating = record(Some("+main"), &[]);
        assert!(needs_version_refresh("+main", &floating));

        let always = record(Some("++"), &[]);
        assert!(needs_version_refresh("++", &always));
    }

    #[test]
    fn test_content_refresh_on_changed_selection() {
        let record = record(Some("abc"), &["include"]);
        let same = vec!["include".to_string()];
        let grown = vec!["include".to_string(), "src".to_string()];

        assert!(!needs_content_refresh(&same, &record));
        assert!(needs_content_refresh(&grown, &record));
    }

    #[test]
    fn test_empty_selection_never_refreshes() {
        let record = record(Some("abc"), &[]);
        assert!(!needs_content_refresh(&[], &record));
    }

    #[test]
    fn test_checkout_invalidates_selection() {
        let mut record = record(Some("abc"), &["include"]);
        record.mark_checked_out("def");

        assert_eq!(record.current_version.as_deref(), Some("def"));
        assert!(record.sparse_selection.is_empty());
        assert!(needs_content_refresh(&["include".to_string()], &record));
    }

    #[test]
    fn test_initialize_resets_version() {
        let mut record = record(Some("abc"), &["include"]);
        record.initialize("https://example.com/other.git");

        assert_eq!(record.current_version, None);
        assert!(record.sparse_selection.is_empty());
        assert_eq!(
            record.repository.as_deref(),
            Some("https://example.com/other.git")
        );
    }

    #[test]
    fn test_space_separated_selection_is_accepted() {
        let record: CheckoutRecord = serde_json::from_str(
            r#"{"^current_version": "abc", "^sparse_checkout_list": "include src "}"#,
        )
        .unwrap();
        assert_eq!(record.sparse_selection, vec!["include", "src"]);
        assert_eq!(record.repository, None);
    }

    #[test]
    fn test_serialized_keys_are_marked() {
        let record = record(Some("abc"), &["include"]);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["^current_version"], "abc");
        assert_eq!(json["^sparse_checkout_list"][0], "include");
        assert_eq!(json["^repository"], "https://example.com/repo.git");

        let empty = serde_json::to_value(CheckoutRecord::default()).unwrap();
        assert!(empty["^current_version"].is_null());
    }
}
