//! Positional policy: does a reference found at a given JSON path become a
//! shared component, or is its content inlined?
//!
//! The decision only looks at the trailing segments of the path. Rules are
//! checked top to bottom and the first match wins:
//!
//! | Trailing path | Context |
//! |---------------|---------|
//! | `…/discriminator/<tag>` | schemas |
//! | `…/properties/<name>`, `…/patternProperties/<re>`, `…/definitions/<name>`, `…/$defs/<name>` | schemas |
//! | `…/components/<kind>/<name>` | `<kind>` |
//! | `…/schema`, `…/items`, `…/not`, `…/additionalProperties`, `…/additionalItems`, `…/contains`, `…/if`, `…/then`, `…/else` | schemas |
//! | `…/allOf/[i]`, `…/oneOf/[i]`, `…/anyOf/[i]`, `…/prefixItems/[i]` | schemas |
//! | `…/parameters/[i]` | parameters |
//! | `…/responses/<code>` | responses |
//! | `…/requestBody` | requestBodies |
//! | `…/headers/<name>` | headers |
//! | `…/examples/<name>` | examples |
//! | `…/links/<name>` | links |
//! | `…/callbacks/<name>` | callbacks |
//! | anything else | inline |
//!
//! Path items (`$.paths./pets`), the document root and extension keys fall
//! through to inline: their content is copied in place and never receives a
//! component identity.
//!
//! ```
//! use schema_bundle_core::{ComponentKind, Context, JsonPath, classify_context};
//!
//! let response = JsonPath::from_keys(["paths", "/pets", "get", "responses", "default"]);
//! assert_eq!(classify_context(&response), Context::Hoistable(ComponentKind::Responses));
//!
//! let path_item = JsonPath::from_keys(["paths", "/pets"]);
//! assert_eq!(classify_context(&path_item), Context::Inline);
//! ```

use crate::component::ComponentKind;
use crate::node::{JsonPath, Segment};

/// What happens to a reference found at some position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Context {
    /// Becomes (or reuses) a named component of the given kind.
    Hoistable(ComponentKind),
    /// Content is copied in place, like an inclusion directive.
    Inline,
}

const SCHEMA_MAPS: &[&str] = &["properties", "patternProperties", "definitions", "$defs"];
const SCHEMA_SLOTS: &[&str] = &[
    "schema",
    "items",
    "not",
    "additionalProperties",
    "additionalItems",
    "contains",
    "if",
    "then",
    "else",
];
const SCHEMA_LISTS: &[&str] = &["allOf", "oneOf", "anyOf", "prefixItems"];

/// Classifies the position of a reference. See the module docs for the
/// rule table.
pub fn classify_context(path: &JsonPath) -> Context {
    use ComponentKind::*;

    if let Some([parent, _]) = path.tail(2) {
        match parent.as_key() {
            Some("discriminator") => return Context::Hoistable(Schemas),
            Some(key) if SCHEMA_MAPS.contains(&key) => return Context::Hoistable(Schemas),
            _ => {}
        }
    }

    if let Some([Segment::Key(components), Segment::Key(section), Segment::Key(_)]) = path.tail(3) {
        if components == "components" {
            if let Some(kind) = ComponentKind::from_section(section) {
                return Context::Hoistable(kind);
            }
        }
    }

    if let Some([Segment::Key(slot)]) = path.tail(1) {
        if SCHEMA_SLOTS.contains(&slot.as_str()) {
            return Context::Hoistable(Schemas);
        }
        if slot == "requestBody" {
            return Context::Hoistable(RequestBodies);
        }
    }

    if let Some([Segment::Key(parent), last]) = path.tail(2) {
        let kind = match (parent.as_str(), last.is_index()) {
            (list, true) if SCHEMA_LISTS.contains(&list) => Some(Schemas),
            ("parameters", true) => Some(Parameters),
            ("responses", false) => Some(Responses),
            ("headers", false) => Some(Headers),
            ("examples", false) => Some(Examples),
            ("links", false) => Some(Links),
            ("callbacks", false) => Some(Callbacks),
            _ => None,
        };
        if let Some(kind) = kind {
            return Context::Hoistable(kind);
        }
    }

    Context::Inline
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(keys: &[&str]) -> Context {
        classify_context(&JsonPath::from_keys(keys.iter().copied()))
    }

    #[test]
    fn test_schema_positions_are_hoisted() {
        let schemas = Context::Hoistable(ComponentKind::Schemas);
        assert_eq!(
            classify(&["paths", "/pets", "get", "responses", "200", "content", "application/json", "schema"]),
            schemas
        );
        assert_eq!(classify(&["components", "schemas", "Pet", "properties", "owner"]), schemas);
        assert_eq!(classify(&["components", "schemas", "Pet", "items"]), schemas);
        assert_eq!(classify(&["components", "schemas", "Pet", "discriminator", "cat"]), schemas);
        assert_eq!(classify(&["components", "schemas", "Pet"]), schemas);
    }

    #[test]
    fn test_composition_lists_need_an_index() {
        let path = JsonPath::from_keys(["components", "schemas", "Pet", "allOf"]).index(1);
        assert_eq!(classify_context(&path), Context::Hoistable(ComponentKind::Schemas));
    }

    #[test]
    fn test_property_named_like_a_section_is_a_schema() {
        assert_eq!(
            classify(&["components", "schemas", "Page", "properties", "responses"]),
            Context::Hoistable(ComponentKind::Schemas)
        );
    }

    #[test]
    fn test_operation_level_kinds() {
        let op = JsonPath::from_keys(["paths", "/pets", "post"]);
        assert_eq!(
            classify_context(&op.key("parameters").index(0)),
            Context::Hoistable(ComponentKind::Parameters)
        );
        assert_eq!(
            classify_context(&op.key("requestBody")),
            Context::Hoistable(ComponentKind::RequestBodies)
        );
        assert_eq!(
            classify_context(&op.key("responses").key("404")),
            Context::Hoistable(ComponentKind::Responses)
        );
        assert_eq!(
            classify_context(&op.key("responses").key("200").key("headers").key("X-Rate-Limit")),
            Context::Hoistable(ComponentKind::Headers)
        );
    }

    #[test]
    fn test_component_sections() {
        assert_eq!(
            classify(&["components", "securitySchemes", "oauth"]),
            Context::Hoistable(ComponentKind::SecuritySchemes)
        );
        assert_eq!(
            classify(&["components", "parameters", "limit"]),
            Context::Hoistable(ComponentKind::Parameters)
        );
    }

    #[test]
    fn test_everything_else_is_inlined() {
        assert_eq!(classify_context(&JsonPath::root()), Context::Inline);
        assert_eq!(classify(&["paths", "/pets"]), Context::Inline);
        assert_eq!(classify(&["paths"]), Context::Inline);
        assert_eq!(classify(&["info", "x-logo"]), Context::Inline);
        // parameters keyed by name only exist under components
        assert_eq!(classify(&["paths", "/pets", "get", "parameters"]), Context::Inline);
    }
}
