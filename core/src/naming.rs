//! Deterministic, collision-free component naming.
//!
//! Every component starts from its default name: the last pointer segment
//! when the reference carries a pointer, otherwise the file stem. Names only
//! change when two distinct targets of the same kind share a default name,
//! or when the default is already taken by the source document's own
//! components section.
//!
//! Colliding components are ordered by canonical key and suffixed with the
//! innermost directory segments of their source location, using the
//! shortest depth that makes every name in the group unique. When the
//! locations do not tell the components apart, a numeric suffix is used.
//!
//! # Example
//!
//! ```
//! use schema_bundle_core::{ComponentKind, ComponentManager, ComponentNameResolver, Location, Reference};
//!
//! let root = Location::file("/project/root.yaml");
//! let mut manager = ComponentManager::new("components");
//! for target in ["billing/Error.yaml", "users/Error.yaml"] {
//!     let reference = Reference::resolve(target, &root).unwrap();
//!     manager.get_or_create(ComponentKind::Schemas, &reference, &root);
//! }
//!
//! let names = ComponentNameResolver::new().resolve(manager.components());
//! assert_eq!(names.get(ComponentKind::Schemas, "/project/billing/Error.yaml#"), Some("Error_billing"));
//! assert_eq!(names.get(ComponentKind::Schemas, "/project/users/Error.yaml#"), Some("Error_users"));
//! ```

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::component::{Component, ComponentKind};
use crate::node::Node;

/// Final name assignment, keyed by kind and canonical key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedNames {
    names: HashMap<(ComponentKind, String), String>,
}

impl ResolvedNames {
    pub fn get(&self, kind: ComponentKind, key: &str) -> Option<&str> {
        self.names
            .get(&(kind, key.to_string()))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Assigns final names to the components discovered in the first pass.
#[derive(Debug, Clone, Default)]
pub struct ComponentNameResolver {
    reserved: HashMap<ComponentKind, HashSet<String>>,
    claims: HashMap<(ComponentKind, String), String>,
}

impl ComponentNameResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `names` as unavailable for components of `kind`.
    pub fn reserve<I, S>(mut self, kind: ComponentKind, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reserved
            .entry(kind)
            .or_default()
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Gives the component with `key` exactly `name`. Used when the source
    /// document's own components section points an entry at an external
    /// target: that entry keeps its name.
    pub fn claim(mut self, kind: ComponentKind, key: impl Into<String>, name: impl Into<String>) -> Self {
        self.claims
            .entry((kind, key.into()))
            .or_insert_with(|| name.into());
        self
    }

    /// Reserves every name already present in an existing components
    /// section (`{ schemas: { Pet: … }, responses: { … } }`).
    pub fn reserving_section(section: Option<&Node>) -> Self {
        let mut resolver = Self::new();
        let Some(section) = section.and_then(Node::as_object) else {
            return resolver;
        };
        for (key, entries) in section {
            let (Some(kind), Some(entries)) = (ComponentKind::from_section(key), entries.as_object())
            else {
                continue;
            };
            resolver = resolver.reserve(kind, entries.keys().cloned());
        }
        resolver
    }

    /// Computes the name of every component.
    ///
    /// Input order matters only for components whose names do not collide;
    /// colliding groups are ordered by canonical key, so identical input
    /// always yields identical names.
    pub fn resolve(&self, components: &[Component]) -> ResolvedNames {
        let mut resolved = ResolvedNames::default();
        let empty = HashSet::new();

        for kind in ComponentKind::ALL {
            let reserved = self.reserved.get(&kind).unwrap_or(&empty);

            let mut groups: Vec<(String, Vec<&Component>)> = Vec::new();
            let mut seen_keys = HashSet::new();
            for component in components.iter().filter(|c| c.kind == kind) {
                if !seen_keys.insert(component.key.as_str()) {
                    continue;
                }
                if let Some(claimed) = self.claims.get(&(kind, component.key.clone())) {
                    resolved
                        .names
                        .insert((kind, component.key.clone()), claimed.clone());
                    continue;
                }
                match groups.iter_mut().find(|(name, _)| *name == component.name) {
                    Some((_, members)) => members.push(component),
                    None => groups.push((component.name.clone(), vec![component])),
                }
            }

            let mut blocked: HashSet<String> = reserved.clone();
            blocked.extend(
                self.claims
                    .iter()
                    .filter(|((claim_kind, _), _)| *claim_kind == kind)
                    .map(|(_, name)| name.clone()),
            );
            let mut used = blocked.clone();
            used.extend(groups.iter().map(|(name, _)| name.clone()));

            for (default, mut members) in groups {
                if members.len() == 1 && !blocked.contains(&default) {
                    resolved
                        .names
                        .insert((kind, members[0].key.clone()), default);
                    continue;
                }

                members.sort_by(|a, b| a.key.cmp(&b.key));
                let names = disambiguate(&default, &members, &used);
                debug!(
                    kind = %kind,
                    name = %default,
                    assigned = ?names,
                    "Resolved component name collision"
                );
                for (member, name) in members.iter().zip(names) {
                    used.insert(name.clone());
                    resolved.names.insert((kind, member.key.clone()), name);
                }
            }
        }

        resolved
    }
}

fn disambiguate(default: &str, members: &[&Component], used: &HashSet<String>) -> Vec<String> {
    let segments: Vec<Vec<String>> = members.iter().map(|c| suffix_segments(c)).collect();
    let max_depth = segments.iter().map(Vec::len).min().unwrap_or(0);

    for depth in 1..=max_depth {
        let candidates: Vec<String> = segments
            .iter()
            .map(|segs| {
                let suffix = segs[segs.len() - depth..].join("_");
                sanitize_name(&format!("{default}_{suffix}"))
            })
            .collect();
        let distinct: HashSet<&String> = candidates.iter().collect();
        if distinct.len() == candidates.len() && !candidates.iter().any(|c| used.contains(c)) {
            return candidates;
        }
    }

    let mut taken = used.clone();
    let mut counter = 2usize;
    members
        .iter()
        .map(|_| {
            let mut candidate = format!("{default}_{counter}");
            while taken.contains(&candidate) {
                counter += 1;
                candidate = format!("{default}_{counter}");
            }
            counter += 1;
            taken.insert(candidate.clone());
            candidate
        })
        .collect()
}

/// Location segments that can tell two same-named components apart. The
/// file stem is dropped when it already is the default name.
fn suffix_segments(component: &Component) -> Vec<String> {
    let mut segments = component.source.segments();
    if component.pointer.trim_matches('/').is_empty() {
        segments.pop();
    }
    segments
}

/// Restricts a name to the characters allowed in component keys
/// (`A-Z a-z 0-9 . - _`).
pub fn sanitize_name(raw: &str) -> String {
    let name: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if name.is_empty() {
        "Component".to_string()
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use crate::component::ComponentManager;
    use crate::reference::{Location, Reference};

    use super::*;

    fn register(targets: &[(ComponentKind, &str)]) -> ComponentManager {
        let root = Location::file("/project/root.yaml");
        let mut manager = ComponentManager::new("components");
        for (kind, target) in targets {
            let reference = Reference::resolve(target, &root).unwrap();
            manager.get_or_create(*kind, &reference, &root);
        }
        manager
    }

    fn name_of<'a>(names: &'a ResolvedNames, manager: &ComponentManager, index: usize) -> &'a str {
        let component = &manager.components()[index];
        names.get(component.kind, &component.key).unwrap()
    }

    #[test]
    fn test_unique_defaults_are_kept() {
        let manager = register(&[
            (ComponentKind::Schemas, "Pet.yaml"),
            (ComponentKind::Schemas, "common.yaml#/definitions/Error"),
        ]);
        let names = ComponentNameResolver::new().resolve(manager.components());
        assert_eq!(name_of(&names, &manager, 0), "Pet");
        assert_eq!(name_of(&names, &manager, 1), "Error");
    }

    #[test]
    fn test_collision_is_resolved_by_directory() {
        let manager = register(&[
            (ComponentKind::Schemas, "users/Error.yaml"),
            (ComponentKind::Schemas, "billing/Error.yaml"),
        ]);
        let names = ComponentNameResolver::new().resolve(manager.components());
        assert_eq!(name_of(&names, &manager, 0), "Error_users");
        assert_eq!(name_of(&names, &manager, 1), "Error_billing");
    }

    #[test]
    fn test_collision_needs_deeper_suffix() {
        let manager = register(&[
            (ComponentKind::Schemas, "v1/models/Error.yaml"),
            (ComponentKind::Schemas, "v2/models/Error.yaml"),
        ]);
        let names = ComponentNameResolver::new().resolve(manager.components());
        assert_eq!(name_of(&names, &manager, 0), "Error_v1_models");
        assert_eq!(name_of(&names, &manager, 1), "Error_v2_models");
    }

    #[test]
    fn test_pointer_names_from_same_file_fall_back_to_counter() {
        let manager = register(&[
            (ComponentKind::Schemas, "common.yaml#/a/Error"),
            (ComponentKind::Schemas, "common.yaml#/b/Error"),
        ]);
        let names = ComponentNameResolver::new().resolve(manager.components());
        assert_eq!(name_of(&names, &manager, 0), "Error_2");
        assert_eq!(name_of(&names, &manager, 1), "Error_3");
    }

    #[test]
    fn test_reserved_name_forces_suffix() {
        let manager = register(&[(ComponentKind::Schemas, "shared/Pet.yaml")]);
        let names = ComponentNameResolver::new()
            .reserve(ComponentKind::Schemas, ["Pet"])
            .resolve(manager.components());
        assert_eq!(name_of(&names, &manager, 0), "Pet_shared");
    }

    #[test]
    fn test_claimed_name_is_kept_and_others_move_aside() {
        let manager = register(&[
            (ComponentKind::Schemas, "models/Error.yaml"),
            (ComponentKind::Schemas, "legacy/Error.yaml"),
        ]);
        let names = ComponentNameResolver::new()
            .reserve(ComponentKind::Schemas, ["Error"])
            .claim(ComponentKind::Schemas, "/project/models/Error.yaml#", "Error")
            .resolve(manager.components());
        assert_eq!(name_of(&names, &manager, 0), "Error");
        assert_eq!(name_of(&names, &manager, 1), "Error_legacy");
    }

    #[test]
    fn test_reservation_is_per_kind() {
        let manager = register(&[(ComponentKind::Responses, "Pet.yaml")]);
        let names = ComponentNameResolver::new()
            .reserve(ComponentKind::Schemas, ["Pet"])
            .resolve(manager.components());
        assert_eq!(name_of(&names, &manager, 0), "Pet");
    }

    #[test]
    fn test_reserving_section_reads_existing_components() {
        let section = serde_json::json!({ "schemas": { "Error": {} }, "x-extra": 1 });
        let manager = register(&[(ComponentKind::Schemas, "lib/Error.yaml")]);
        let names = ComponentNameResolver::reserving_section(Some(&section))
            .resolve(manager.components());
        assert_eq!(name_of(&names, &manager, 0), "Error_lib");
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let targets = [
            (ComponentKind::Schemas, "b/Error.yaml"),
            (ComponentKind::Schemas, "a/Error.yaml"),
            (ComponentKind::Schemas, "c/Error.yaml"),
        ];
        let first = ComponentNameResolver::new().resolve(register(&targets).components());
        let second = ComponentNameResolver::new().resolve(register(&targets).components());
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("Pet Store"), "Pet_Store");
        assert_eq!(sanitize_name("a/b"), "a_b");
        assert_eq!(sanitize_name(""), "Component");
        assert_eq!(sanitize_name("v1.Error-x"), "v1.Error-x");
    }
}
