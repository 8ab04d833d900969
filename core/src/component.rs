//! Component registry for a single merge pass.
//!
//! A component is content reached through a reference that gets hoisted into
//! the components section of the bundled document and referenced by a short
//! local pointer (`#/components/schemas/Error`). The [`ComponentManager`]
//! guarantees that each `(kind, canonical key)` pair maps to exactly one
//! component, so every distinct target is loaded and merged at most once.

use std::collections::HashMap;
use std::fmt;

use serde_json::{Map, Value};
use tracing::warn;

use crate::naming::{ResolvedNames, sanitize_name};
use crate::node::Node;
use crate::reference::{Location, Reference};

/// Namespace of a component inside the components section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ComponentKind {
    Schemas,
    Parameters,
    Responses,
    RequestBodies,
    Headers,
    Examples,
    Links,
    Callbacks,
    SecuritySchemes,
}

impl ComponentKind {
    /// All kinds, in the order they are emitted.
    pub const ALL: [ComponentKind; 9] = [
        ComponentKind::Schemas,
        ComponentKind::Parameters,
        ComponentKind::Responses,
        ComponentKind::RequestBodies,
        ComponentKind::Headers,
        ComponentKind::Examples,
        ComponentKind::Links,
        ComponentKind::Callbacks,
        ComponentKind::SecuritySchemes,
    ];

    /// Key of this kind's sub-mapping in the components section.
    pub fn section(self) -> &'static str {
        match self {
            ComponentKind::Schemas => "schemas",
            ComponentKind::Parameters => "parameters",
            ComponentKind::Responses => "responses",
            ComponentKind::RequestBodies => "requestBodies",
            ComponentKind::Headers => "headers",
            ComponentKind::Examples => "examples",
            ComponentKind::Links => "links",
            ComponentKind::Callbacks => "callbacks",
            ComponentKind::SecuritySchemes => "securitySchemes",
        }
    }

    pub fn from_section(section: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.section() == section)
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.section())
    }
}

/// Index of a component inside its [`ComponentManager`].
pub type ComponentId = usize;

/// A hoisted, uniquely named piece of content.
#[derive(Debug, Clone)]
pub struct Component {
    pub kind: ComponentKind,
    /// `<absolute location>#<pointer>`, the deduplication identity.
    pub key: String,
    pub name: String,
    pub source: Location,
    pub pointer: String,
    /// Fully merged content, filled once during materialization.
    pub content: Option<Node>,
}

/// Registry of the components discovered or materialized by one pass.
///
/// Created fresh for each pass and dropped when the pass ends. In the
/// materialization pass it is seeded with the names chosen by the
/// [`ComponentNameResolver`](crate::ComponentNameResolver).
#[derive(Debug)]
pub struct ComponentManager {
    section: String,
    components: Vec<Component>,
    index: HashMap<(ComponentKind, String), ComponentId>,
    names: Option<ResolvedNames>,
}

impl ComponentManager {
    /// Creates a registry that hands out provisional names.
    pub fn new(section: impl Into<String>) -> Self {
        Self {
            section: section.into(),
            components: Vec::new(),
            index: HashMap::new(),
            names: None,
        }
    }

    /// Creates a registry that names components from `names`.
    pub fn with_names(section: impl Into<String>, names: ResolvedNames) -> Self {
        Self {
            names: Some(names),
            ..Self::new(section)
        }
    }

    /// Returns the component for `reference`, creating it on first sight.
    ///
    /// The boolean is `true` when the component was created by this call;
    /// only the creator loads and merges the component's content.
    pub fn get_or_create(
        &mut self,
        kind: ComponentKind,
        reference: &Reference,
        current: &Location,
    ) -> (ComponentId, bool) {
        let key = reference.canonical_key(current);
        if let Some(&id) = self.index.get(&(kind, key.clone())) {
            return (id, false);
        }

        let provisional = sanitize_name(&reference.terminal_name(current));
        let name = match &self.names {
            Some(names) => names.get(kind, &key).map(str::to_string).unwrap_or_else(|| {
                warn!(key = %key, kind = %kind, "Component missing from resolved names");
                provisional
            }),
            None => provisional,
        };

        let id = self.components.len();
        self.components.push(Component {
            kind,
            key: key.clone(),
            name,
            source: reference.location(current).clone(),
            pointer: reference.pointer().to_string(),
            content: None,
        });
        self.index.insert((kind, key), id);
        (id, true)
    }

    /// Looks up a registered component by kind and canonical key.
    pub fn get(&self, kind: ComponentKind, key: &str) -> Option<&Component> {
        self.index
            .get(&(kind, key.to_string()))
            .map(|&id| &self.components[id])
    }

    /// Returns `true` if any kind registered `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.components.iter().any(|c| c.key == key)
    }

    pub fn component(&self, id: ComponentId) -> &Component {
        &self.components[id]
    }

    /// Short in-document pointer for a component:
    /// `#/<section>/<kind>/<name>`.
    pub fn local_ref(&self, id: ComponentId) -> String {
        let component = &self.components[id];
        format!("#/{}/{}/{}", self.section, component.kind, component.name)
    }

    /// Stores the merged content of a component. Content is set once; later
    /// calls are ignored.
    pub fn set_content(&mut self, id: ComponentId, content: Node) {
        let component = &mut self.components[id];
        if component.content.is_some() {
            warn!(key = %component.key, "Component content already set");
            return;
        }
        component.content = Some(content);
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Builds `{ kind: { name: content } }` for every registered component.
    ///
    /// Kinds follow [`ComponentKind::ALL`]; names keep registration order.
    pub fn components_section(&self) -> Node {
        let mut section = Map::new();
        for kind in ComponentKind::ALL {
            let entries: Map<String, Value> = self
                .components
                .iter()
                .filter(|c| c.kind == kind)
                .map(|c| (c.name.clone(), c.content.clone().unwrap_or(Value::Null)))
                .collect();
            if !entries.is_empty() {
                section.insert(kind.section().to_string(), Value::Object(entries));
            }
        }
        Value::Object(section)
    }
}
