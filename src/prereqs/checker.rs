//! Prerequisite evaluation.
//!
//! The [`PrereqChecker`] resolves what is installed for each declared
//! dependency and checks it against the bucket's version specification.

use std::collections::BTreeMap;

use super::inspector::{ModuleInspector, ResidentModules, RuntimeIdentity};
use super::report;
use super::status::{Installed, InstalledStatus, PrereqFailures, PrereqKind, PrereqScope};
use crate::error::{BuildError, Result};
use crate::properties::instance::split_pairs;
use crate::properties::{Properties, PropertyValue};
use crate::version::{is_zero, parse_conditions, Condition, VersionOp};

/// Action whose missing requirements only produce warnings.
pub const LEGACY_ACTION: &str = "configure";

/// Declared prerequisites, grouped by bucket.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Prerequisites {
    buckets: BTreeMap<PrereqScope, BTreeMap<String, String>>,
}

impl Prerequisites {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect every prerequisite bucket from registered properties and the
    /// free-form argument bag.
    pub fn from_properties(props: &Properties) -> Self {
        let mut prereqs = Self::new();
        for (name, value) in props.values().iter().chain(props.args()) {
            let Ok(scope) = name.parse::<PrereqScope>() else {
                continue;
            };
            for (module, spec) in bucket_entries(value) {
                prereqs.insert(scope.clone(), module, spec);
            }
        }
        prereqs
    }

    /// Declare one prerequisite.
    pub fn insert(&mut self, scope: PrereqScope, module: impl Into<String>, spec: impl Into<String>) {
        self.buckets
            .entry(scope)
            .or_default()
            .insert(module.into(), spec.into());
    }

    /// The dependencies declared in one bucket.
    pub fn bucket(&self, scope: &PrereqScope) -> Option<&BTreeMap<String, String>> {
        self.buckets.get(scope)
    }

    /// All non-empty buckets.
    pub fn buckets(&self) -> impl Iterator<Item = (&PrereqScope, &BTreeMap<String, String>)> {
        self.buckets.iter().filter(|(_, entries)| !entries.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.buckets().next().is_none()
    }
}

fn bucket_entries(value: &PropertyValue) -> Vec<(String, String)> {
    match value {
        PropertyValue::Map(map) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        PropertyValue::Text(text) => split_pairs(text).unwrap_or_default(),
        PropertyValue::List(items) => items
            .iter()
            .flat_map(|item| split_pairs(item).unwrap_or_default())
            .collect(),
        _ => Vec::new(),
    }
}

/// Checks declared prerequisites against what is installed.
pub struct PrereqChecker<'a> {
    inspector: &'a dyn ModuleInspector,
    resident: &'a ResidentModules,
    identities: &'a [RuntimeIdentity],
}

impl<'a> PrereqChecker<'a> {
    pub fn new(
        inspector: &'a dyn ModuleInspector,
        resident: &'a ResidentModules,
        identities: &'a [RuntimeIdentity],
    ) -> Self {
        Self {
            inspector,
            resident,
            identities,
        }
    }

    /// What is installed for `module`.
    ///
    /// Runtime identities win over resident markers, which win over
    /// static inspection.
    pub fn installed(&self, module: &str) -> Installed {
        if let Some(identity) = self.identities.iter().find(|i| i.name == module) {
            return Installed::Version(identity.version.clone());
        }
        if let Some(marker) = self.resident.get(module) {
            return marker.map_or(Installed::Unversioned, |v| Installed::Version(v.to_string()));
        }

        let lookup = self.inspector.resolve(module);
        match (lookup.found, lookup.version) {
            (false, _) => Installed::Missing,
            (true, Some(version)) => Installed::Version(version),
            (true, None) => Installed::Unversioned,
        }
    }

    /// Check one dependency against a version specification.
    pub fn check_installed_status(&self, module: &str, spec: Option<&str>) -> InstalledStatus {
        let need = spec.map(str::trim).filter(|s| !s.is_empty()).unwrap_or("0");
        let mut status = InstalledStatus::new(module, need);

        status.have = self.installed(module);
        if status.have.is_missing() {
            status.message = Some(format!("{} is not installed", module));
            return status;
        }

        for clause in parse_conditions(Some(need)) {
            let Some(condition) = Condition::parse(&clause) else {
                tracing::warn!("Invalid prerequisite condition '{}' for {}", clause, module);
                status.message = Some(format!(
                    "Invalid prerequisite condition '{}' for {}",
                    clause, module
                ));
                return status;
            };

            if condition.op == VersionOp::Ge && is_zero(&condition.version) {
                continue;
            }

            let Some(have) = status.have.version() else {
                status.message = Some(format!(
                    "Couldn't find a version in prerequisite {}",
                    module
                ));
                return status;
            };

            if !condition.is_satisfied_by(have) {
                status.message = Some(format!(
                    "{} ({}) is installed, but we need version {}",
                    module, have, condition
                ));
                return status;
            }
        }

        status.ok = true;
        status
    }

    /// Every violated prerequisite, grouped by bucket.
    ///
    /// Returns `None` when nothing is violated.
    pub fn prereq_failures(&self, prereqs: &Prerequisites) -> Option<PrereqFailures> {
        let mut failures = PrereqFailures::new();

        for (scope, entries) in prereqs.buckets() {
            for (module, spec) in entries {
                let status = self.check_installed_status(module, Some(spec));
                let Some(status) = classify(scope.kind, status) else {
                    continue;
                };
                failures
                    .entry(scope.name())
                    .or_default()
                    .insert(module.clone(), status);
            }
        }

        (!failures.is_empty()).then_some(failures)
    }

    /// Gate `action` on its own `requires` and `conflicts` buckets.
    ///
    /// Conflicts are always fatal. Missing requirements are fatal except for
    /// [`LEGACY_ACTION`], where they are logged as warnings. Every fatal
    /// violation is reported in a single error.
    pub fn validate_action_prereqs(&self, action: &str, prereqs: &Prerequisites) -> Result<()> {
        let mut fatal = PrereqFailures::new();

        for kind in [PrereqKind::Requires, PrereqKind::Conflicts] {
            let scope = PrereqScope::action(action, kind);
            let Some(entries) = prereqs.bucket(&scope) else {
                continue;
            };

            for (module, spec) in entries {
                let status = self.check_installed_status(module, Some(spec));
                let Some(status) = classify(kind, status) else {
                    continue;
                };

                if kind == PrereqKind::Requires && action == LEGACY_ACTION {
                    tracing::warn!(
                        "[{}] {}",
                        scope,
                        status.message.as_deref().unwrap_or(module)
                    );
                    continue;
                }
                fatal
                    .entry(scope.name())
                    .or_default()
                    .insert(module.clone(), status);
            }
        }

        if fatal.is_empty() {
            return Ok(());
        }
        Err(BuildError::PrerequisiteFailure {
            action: action.to_string(),
            report: report::render(&fatal),
        })
    }
}

/// Decide whether a status is a violation for its bucket kind, rewriting
/// the message where the kind calls for it.
fn classify(kind: PrereqKind, mut status: InstalledStatus) -> Option<InstalledStatus> {
    match kind {
        PrereqKind::Requires => (!status.ok).then_some(status),
        PrereqKind::Recommends => {
            if status.ok {
                return None;
            }
            status.message = Some(if status.have.is_missing() {
                format!("{} is not installed", status.module)
            } else {
                format!(
                    "{} ({}) is installed, but we prefer to have {}",
                    status.module, status.have, status.need
                )
            });
            Some(status)
        }
        // A satisfied conflict spec means the forbidden version is present.
        PrereqKind::Conflicts => {
            if !status.ok {
                return None;
            }
            status.message = Some(format!(
                "{} ({}) conflicts with this distribution",
                status.module, status.have
            ));
            Some(status)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prereqs::inspector::ModuleLookup;

    struct FakeInspector(BTreeMap<&'static str, Option<&'static str>>);

    impl ModuleInspector for FakeInspector {
        fn resolve(&self, module: &str) -> ModuleLookup {
            match self.0.get(module) {
                Some(v) => ModuleLookup::found(v.map(String::from)),
                None => ModuleLookup::not_found(),
            }
        }
    }

    fn inspector() -> FakeInspector {
        FakeInspector(BTreeMap::from([
            ("Foo", Some("1.5")),
            ("Bar", None),
            ("Old", Some("0.9")),
            ("Dev", Some("2.00_01")),
        ]))
    }

    fn with_checker<F: FnOnce(&PrereqChecker<'_>)>(f: F) {
        let inspector = inspector();
        let resident = ResidentModules::new();
        let identities = [RuntimeIdentity::new("engine", "3.0")];
        let checker = PrereqChecker::new(&inspector, &resident, &identities);
        f(&checker);
    }

    #[test]
    fn missing_dependency() {
        with_checker(|checker| {
            let status = checker.check_installed_status("Nope", Some("1.0"));
            assert!(!status.ok);
            assert!(status.have.is_missing());
            assert_eq!(status.message.as_deref(), Some("Nope is not installed"));
        });
    }

    #[test]
    fn satisfied_and_unsatisfied_versions() {
        with_checker(|checker| {
            assert!(checker.check_installed_status("Foo", Some("1.0")).ok);
            assert!(checker.check_installed_status("Foo", Some(">= 1.0, < 2.0")).ok);

            let status = checker.check_installed_status("Foo", Some(">= 1.0, != 1.5"));
            assert!(!status.ok);
            assert_eq!(
                status.message.as_deref(),
                Some("Foo (1.5) is installed, but we need version != 1.5")
            );
        });
    }

    #[test]
    fn zero_requirement_needs_no_declared_version() {
        with_checker(|checker| {
            assert!(checker.check_installed_status("Bar", Some("0")).ok);
            assert!(checker.check_installed_status("Bar", None).ok);

            let status = checker.check_installed_status("Bar", Some("1.0"));
            assert!(!status.ok);
            assert_eq!(status.have, Installed::Unversioned);
            assert_eq!(
                status.message.as_deref(),
                Some("Couldn't find a version in prerequisite Bar")
            );
        });
    }

    #[test]
    fn invalid_condition_fails_status() {
        with_checker(|checker| {
            let status = checker.check_installed_status("Foo", Some(">= 1.0, ~> 2"));
            assert!(!status.ok);
            assert_eq!(
                status.message.as_deref(),
                Some("Invalid prerequisite condition '~> 2' for Foo")
            );
        });
    }

    #[test]
    fn alpha_versions_are_compared_numerically() {
        with_checker(|checker| {
            assert!(checker.check_installed_status("Dev", Some("2.00")).ok);
            assert!(!checker.check_installed_status("Dev", Some("2.01")).ok);
        });
    }

    #[test]
    fn resolution_order() {
        let inspector = inspector();
        let mut resident = ResidentModules::new();
        resident.insert("Foo", Some("9.0".into()));
        resident.insert("engine", Some("1.0".into()));
        let identities = [RuntimeIdentity::new("engine", "3.0")];
        let checker = PrereqChecker::new(&inspector, &resident, &identities);

        assert_eq!(checker.installed("engine"), Installed::Version("3.0".into()));
        assert_eq!(checker.installed("Foo"), Installed::Version("9.0".into()));
        assert_eq!(checker.installed("Old"), Installed::Version("0.9".into()));
    }

    #[test]
    fn no_failures_is_none() {
        with_checker(|checker| {
            let mut prereqs = Prerequisites::new();
            prereqs.insert(PrereqScope::global(PrereqKind::Requires), "Foo", "1.0");
            prereqs.insert(PrereqScope::global(PrereqKind::Conflicts), "Nope", "0");
            prereqs.insert(PrereqScope::action("test", PrereqKind::Recommends), "Old", "0.5");

            assert_eq!(checker.prereq_failures(&prereqs), None);
            assert_eq!(checker.prereq_failures(&Prerequisites::new()), None);
        });
    }

    #[test]
    fn failures_keyed_by_violating_buckets() {
        with_checker(|checker| {
            let mut prereqs = Prerequisites::new();
            prereqs.insert(PrereqScope::global(PrereqKind::Requires), "Foo", "1.0");
            prereqs.insert(PrereqScope::global(PrereqKind::Requires), "Nope", "1.0");
            prereqs.insert(PrereqScope::global(PrereqKind::Recommends), "Old", "1.0");
            prereqs.insert(PrereqScope::global(PrereqKind::Recommends), "Gone", "0");
            prereqs.insert(PrereqScope::action("build", PrereqKind::Conflicts), "Foo", "< 2.0");
            prereqs.insert(PrereqScope::action("test", PrereqKind::Requires), "Foo", "1.0");

            let failures = checker.prereq_failures(&prereqs).unwrap();
            assert_eq!(
                failures.keys().collect::<Vec<_>>(),
                ["build_conflicts", "recommends", "requires"]
            );
            assert_eq!(failures["requires"].len(), 1);
            assert!(failures["requires"].contains_key("Nope"));
            assert_eq!(
                failures["recommends"]["Old"].message.as_deref(),
                Some("Old (0.9) is installed, but we prefer to have 1.0")
            );
            assert_eq!(
                failures["recommends"]["Gone"].message.as_deref(),
                Some("Gone is not installed")
            );
            assert_eq!(
                failures["build_conflicts"]["Foo"].message.as_deref(),
                Some("Foo (1.5) conflicts with this distribution")
            );
        });
    }

    #[test]
    fn conflict_with_other_version_is_not_a_failure() {
        with_checker(|checker| {
            let mut prereqs = Prerequisites::new();
            prereqs.insert(PrereqScope::global(PrereqKind::Conflicts), "Foo", "< 1.0");
            assert_eq!(checker.prereq_failures(&prereqs), None);
        });
    }

    #[test]
    fn validate_batches_all_fatal_lines() {
        with_checker(|checker| {
            let mut prereqs = Prerequisites::new();
            prereqs.insert(PrereqScope::action("test", PrereqKind::Requires), "Nope", "1.0");
            prereqs.insert(PrereqScope::action("test", PrereqKind::Requires), "Old", "1.0");
            prereqs.insert(PrereqScope::action("test", PrereqKind::Conflicts), "Foo", "0");
            prereqs.insert(PrereqScope::action("test", PrereqKind::Recommends), "Gone", "0");

            let err = checker.validate_action_prereqs("test", &prereqs).unwrap_err();
            let BuildError::PrerequisiteFailure { action, report } = err else {
                panic!("expected a prerequisite failure");
            };
            assert_eq!(action, "test");
            assert_eq!(report.lines().count(), 3);
            assert!(report.contains("Nope is not installed"));
            assert!(report.contains("Old (0.9) is installed, but we need version >= 1.0"));
            assert!(report.contains("Foo (1.5) conflicts with this distribution"));
            assert!(!report.contains("Gone"));
        });
    }

    #[test]
    fn other_actions_are_not_gated() {
        with_checker(|checker| {
            let mut prereqs = Prerequisites::new();
            prereqs.insert(PrereqScope::action("test", PrereqKind::Requires), "Nope", "1.0");
            prereqs.insert(PrereqScope::global(PrereqKind::Requires), "Nope", "1.0");
            assert!(checker.validate_action_prereqs("build", &prereqs).is_ok());
        });
    }

    #[test]
    fn legacy_action_downgrades_requires_only() {
        with_checker(|checker| {
            let mut prereqs = Prerequisites::new();
            prereqs.insert(PrereqScope::action(LEGACY_ACTION, PrereqKind::Requires), "Nope", "1.0");
            assert!(checker.validate_action_prereqs(LEGACY_ACTION, &prereqs).is_ok());

            prereqs.insert(PrereqScope::action(LEGACY_ACTION, PrereqKind::Conflicts), "Foo", "0");
            assert!(checker.validate_action_prereqs(LEGACY_ACTION, &prereqs).is_err());
        });
    }

    #[test]
    fn collects_buckets_from_properties() {
        use crate::properties::PropertyRegistry;

        let mut registry = PropertyRegistry::new();
        registry.add_class("core");
        registry
            .add_property("core", "requires", BTreeMap::<String, String>::new())
            .unwrap();
        registry.add_property("core", "verbose", false).unwrap();

        let mut explicit = BTreeMap::new();
        explicit.insert(
            "requires".to_string(),
            PropertyValue::Map(BTreeMap::from([("Foo".to_string(), "1.0".to_string())])),
        );
        explicit.insert(
            "install_conflicts".to_string(),
            PropertyValue::from("Bad=< 2"),
        );
        let props = Properties::new(&registry, explicit).unwrap();

        let prereqs = Prerequisites::from_properties(&props);
        assert_eq!(
            prereqs.bucket(&PrereqScope::global(PrereqKind::Requires)).unwrap()["Foo"],
            "1.0"
        );
        assert_eq!(
            prereqs
                .bucket(&PrereqScope::action("install", PrereqKind::Conflicts))
                .unwrap()["Bad"],
            "< 2"
        );
        assert_eq!(prereqs.buckets().count(), 2);
    }

    #[test]
    fn action_bucket_text_keeps_clause_lists_together() {
        use crate::properties::PropertyRegistry;

        let mut registry = PropertyRegistry::new();
        registry.add_class("core");
        let mut explicit = BTreeMap::new();
        explicit.insert(
            "test_requires".to_string(),
            PropertyValue::from("Foo=>= 1.0, != 1.5,Bar::Baz=0"),
        );
        let props = Properties::new(&registry, explicit).unwrap();

        let prereqs = Prerequisites::from_properties(&props);
        let bucket = prereqs
            .bucket(&PrereqScope::action("test", PrereqKind::Requires))
            .unwrap();
        assert_eq!(bucket.len(), 2);
        assert_eq!(bucket["Foo"], ">= 1.0, != 1.5");
        assert_eq!(bucket["Bar::Baz"], "0");
    }
}
