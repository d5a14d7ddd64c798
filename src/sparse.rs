//! Sparse checkout path selection.
//!
//! The paths materialized for a package are the union of what the package
//! itself says it always needs (`include` in its `yacpkg.json`), what the
//! requests for it asked for, and what was already selected by an earlier run.
//! Keeping the earlier selection means content is never silently dropped just
//! because a manifest stopped mentioning it.
//!
//! Order is first-occurrence order. `git sparse-checkout set` does not care,
//! but a stable order keeps the recorded selection reproducible.

use indexmap::IndexSet;

/// Ordered union of `lists`, keeping the first occurrence of each path.
pub fn ordered_union<'a, I>(lists: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a [String]>,
{
    let mut seen: IndexSet<&str> = IndexSet::new();
    for list in lists {
        for path in list {
            seen.insert(path.as_str());
        }
    }
    seen.into_iter().map(str::to_string).collect()
}

/// Paths to select for a package.
pub fn compute_selection(
    required: &[String],
    requested: &[String],
    previous: &[String],
) -> Vec<String> {
    ordered_union([required, requested, previous])
}

/// Merge `incoming` include paths ahead of `existing` ones.
pub fn prepend_paths(incoming: &[String], existing: &[String]) -> Vec<String> {
    ordered_union([incoming, existing])
}
