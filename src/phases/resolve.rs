//! Generation loop: process every Ready package, merge what they declare, and
//! repeat until nothing is left.
//!
//! Declarations made while a generation runs are buffered and only merged
//! once the whole generation is done, so every package of a generation sees
//! the table as it was when the generation started.

use std::fmt;

use indexmap::IndexSet;
use log::debug;

use super::merge::{Declaration, MergeTable, ResolvedPackage};
use crate::error::Result;
use crate::manifest::{Manifest, PackageMap};
use crate::sparse::ordered_union;

/// Position of a package in the run, shown as `[3/7]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}/{}]", self.current, self.total)
    }
}

/// What processing one package produced.
#[derive(Debug, Clone, Default)]
pub struct ProcessedPackage {
    /// The version to record, frozen where applicable.
    pub version: String,
    /// The package's own `dependencies`.
    pub dependencies: PackageMap,
    /// Remotes the package adds for its dependencies.
    pub remotes: Vec<String>,
    /// Whether the version was resolved and checked out again.
    pub version_refreshed: bool,
    /// Whether the sparse selection was re-applied.
    pub content_refreshed: bool,
}

/// The per-package pipeline, behind a trait so the loop can be driven without git.
pub trait PackageProcessor {
    fn process(&mut self, package: &ResolvedPackage, progress: Progress)
        -> Result<ProcessedPackage>;

    /// Re-apply the selection of a package merged into after it was processed.
    /// Returns whether anything was fetched.
    fn reconcile(&mut self, package: &ResolvedPackage) -> Result<bool>;
}

/// Outcome of the generation loop.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub table: MergeTable,
    pub generations: usize,
    /// Packages whose version was resolved again.
    pub refreshed: Vec<String>,
    /// Packages whose sparse selection was applied, including reconciles.
    pub fetched: Vec<String>,
}

/// Run the generation loop for `manifest`.
pub fn execute(manifest: &Manifest, processor: &mut dyn PackageProcessor) -> Result<Resolution> {
    let mut table = MergeTable::new(manifest)?;
    let mut generations = 0;
    let mut processed_count = 0;
    let mut refreshed = Vec::new();
    let mut fetched = Vec::new();

    loop {
        let ready = table.ready();
        if ready.is_empty() {
            if table.has_pending() && table.release_stalled() {
                continue;
            }
            break;
        }

        generations += 1;
        debug!("Generation {}: {}", generations, ready.join(", "));

        let mut next_generation: Vec<Declaration> = Vec::new();
        for name in ready {
            let Some(package) = table.get(&name).cloned() else {
                continue;
            };
            processed_count += 1;
            let progress = Progress {
                current: processed_count,
                total: table.live_count(),
            };

            let outcome = processor.process(&package, progress)?;
            if outcome.version_refreshed {
                refreshed.push(name.clone());
            }
            if outcome.content_refreshed {
                fetched.push(name.clone());
            }
            table.mark_processed(&name, &outcome.version);

            let declared: IndexSet<String> = outcome.dependencies.keys().cloned().collect();
            table.forget_dependent(&name, &declared);

            let remotes = ordered_union([package.remotes.as_slice(), outcome.remotes.as_slice()]);
            for (dependency, entry) in outcome.dependencies {
                next_generation.push(Declaration {
                    owner: name.clone(),
                    name: dependency,
                    request: entry.request(),
                    remotes: remotes.clone(),
                });
            }
        }

        for declaration in next_generation {
            table.merge(declaration)?;
        }
    }

    for name in table.needing_reconcile() {
        let Some(package) = table.get(&name).cloned() else {
            continue;
        };
        debug!("Reconciling {} with requests merged after it was installed", name);
        if processor.reconcile(&package)? {
            fetched.push(name.clone());
        }
        table.mark_reconciled(&name);
    }

    Ok(Resolution {
        table,
        generations,
        refreshed,
        fetched,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::parse_package_map;
    use crate::phases::merge::PackageState;
    use std::collections::HashMap;

    /// Serves `dependencies` from a fixed map and freezes versions to `<name>@<spec>`.
    #[derive(Default)]
    struct FakeProcessor {
        dependencies: HashMap<String, serde_json::Value>,
        order: Vec<String>,
        reconciled: Vec<(String, Vec<String>)>,
    }

    impl FakeProcessor {
        fn with(mut self, name: &str, deps: serde_json::Value) -> Self {
            self.dependencies.insert(name.to_string(), deps);
            self
        }
    }

    impl PackageProcessor for FakeProcessor {
        fn process(
            &mut self,
            package: &ResolvedPackage,
            _progress: Progress,
        ) -> Result<ProcessedPackage> {
            self.order.push(package.name.clone());
            let dependencies = match self.dependencies.get(&package.name) {
                Some(value) => parse_package_map(value, "dependencies")?,
                None => PackageMap::new(),
            };
            Ok(ProcessedPackage {
                version: format!("{}@{}", package.name, package.version),
                dependencies,
                remotes: Vec::new(),
                version_refreshed: true,
                content_refreshed: !package.include_paths.is_empty(),
            })
        }

        fn reconcile(&mut self, package: &ResolvedPackage) -> Result<bool> {
            self.reconciled
                .push((package.name.clone(), package.include_paths.clone()));
            Ok(true)
        }
    }

    fn run(manifest: &str, processor: &mut FakeProcessor) -> Resolution {
        execute(&Manifest::parse(manifest).unwrap(), processor).unwrap()
    }

    #[test]
    fn test_single_direct_package() {
        let mut processor = FakeProcessor::default();
        let resolution = run(r#"{"packages": {"foo": "v1.0"}}"#, &mut processor);

        assert_eq!(resolution.generations, 1);
        let foo = resolution.table.get("foo").unwrap();
        assert_eq!(foo.version, "foo@v1.0");
        assert!(foo.is_direct());
    }

    #[test]
    fn test_shared_dependency_merges_requests() {
        let mut processor = FakeProcessor::default()
            .with("a", serde_json::json!({"bar": {"version": "", "include": ["inc/a"]}}))
            .with("b", serde_json::json!({"bar": {"version": "", "include": ["inc/b"]}}));
        let resolution = run(r#"{"packages": {"a": "", "b": ""}}"#, &mut processor);

        let bar = resolution.table.get("bar").unwrap();
        assert!(bar.include_paths.contains(&"inc/a".to_string()));
        assert!(bar.include_paths.contains(&"inc/b".to_string()));
        assert_eq!(
            bar.dependents.iter().cloned().collect::<Vec<_>>(),
            vec!["a", "b"]
        );
        assert_eq!(processor.order, vec!["a", "b", "bar"]);
        assert_eq!(resolution.generations, 2);
    }

    #[test]
    fn test_transitive_chain() {
        let mut processor = FakeProcessor::default()
            .with("app", serde_json::json!({"mid": ""}))
            .with("mid", serde_json::json!({"leaf": "v2"}));
        let resolution = run(r#"{"packages": {"app": ""}}"#, &mut processor);

        assert_eq!(resolution.generations, 3);
        let names: Vec<_> = resolution.table.live().map(|p| p.name.clone()).collect();
        assert_eq!(names, vec!["app", "mid", "leaf"]);
        assert_eq!(resolution.table.get("leaf").unwrap().version, "leaf@v2");
    }

    #[test]
    fn test_every_package_processed_once_in_cycle() {
        let mut processor = FakeProcessor::default()
            .with("x", serde_json::json!({"y": ""}))
            .with("y", serde_json::json!({"x": ""}));
        let resolution = run(r#"{"packages": {"x": ""}}"#, &mut processor);

        assert_eq!(processor.order, vec!["x", "y"]);
        let x = resolution.table.get("x").unwrap();
        assert_eq!(x.state, PackageState::Processed);
        assert!(x.dependents.contains("y"));
    }

    #[test]
    fn test_seeded_dependency_waits_for_all_dependents() {
        // last run: both a and c (via b) declared bar
        let manifest = r#"{
            "packages": {"a": "", "b": ""},
            "dependency_packages": {
                "c": {"version": "c@", "^requested": "", "^dependents": ["b"]},
                "bar": {"version": "frozen", "^requested": "main", "^dependents": ["a", "c"]}
            }
        }"#;
        let mut processor = FakeProcessor::default()
            .with("a", serde_json::json!({"bar": {"version": "main", "include": ["inc/a"]}}))
            .with("b", serde_json::json!({"c": ""}))
            .with("c", serde_json::json!({"bar": {"version": "main", "include": ["inc/c"]}}));
        let resolution = run(manifest, &mut processor);

        assert_eq!(processor.order, vec!["a", "b", "c", "bar"]);
        let bar = resolution.table.get("bar").unwrap();
        assert_eq!(bar.include_paths, vec!["inc/c", "inc/a"]);
        assert_eq!(bar.version, "bar@frozen");
        assert!(processor.reconciled.is_empty());
    }

    #[test]
    fn test_dependent_that_dropped_declaration_is_forgotten() {
        let manifest = r#"{
            "packages": {"a": "", "b": ""},
            "dependency_packages": {
                "bar": {"version": "x", "^dependents": ["a", "b"]}
            }
        }"#;
        let mut processor =
            FakeProcessor::default().with("a", serde_json::json!({"bar": "x"}));
        let resolution = run(manifest, &mut processor);

        let bar = resolution.table.get("bar").unwrap();
        assert_eq!(bar.dependents.iter().cloned().collect::<Vec<_>>(), vec!["a"]);
        assert_eq!(bar.state, PackageState::Processed);
    }

    #[test]
    fn test_unclaimed_seed_is_dropped() {
        let manifest = r#"{
            "packages": {"a": ""},
            "dependency_packages": {"old": {"version": "x", "^dependents": ["a"]}}
        }"#;
        let mut processor = FakeProcessor::default();
        let resolution = run(manifest, &mut processor);

        assert_eq!(resolution.table.get("old").unwrap().state, PackageState::Unseen);
        assert_eq!(resolution.table.live_count(), 1);
        assert_eq!(processor.order, vec!["a"]);
    }

    #[test]
    fn test_late_request_triggers_reconcile() {
        // bar is direct and processed in generation 1; a adds a path in generation 2
        let mut processor = FakeProcessor::default().with(
            "a",
            serde_json::json!({"bar": {"version": "", "include": ["extra"]}}),
        );
        let resolution = run(r#"{"packages": {"a": "", "bar": ""}}"#, &mut processor);

        assert_eq!(processor.order, vec!["a", "bar"]);
        assert_eq!(
            processor.reconciled,
            vec![("bar".to_string(), vec!["extra".to_string()])]
        );
        assert!(resolution.fetched.contains(&"bar".to_string()));
        assert!(!resolution.table.get("bar").unwrap().is_direct());
    }

    #[test]
    fn test_progress_display() {
        let progress = Progress {
            current: 2,
            total: 5,
        };
        assert_eq!(progress.to_string(), "[2/5]");
    }
}
