//! The two-pass merge engine.
//!
//! Bundling walks the root document twice with the same walker:
//!
//! 1. **Discover**: follow every `$ref`, `$include` and discriminator mapping,
//!    registering each hoistable target as a component under a provisional
//!    name. Nothing produced by this pass is kept except the component list.
//! 2. Name resolution: [`ComponentNameResolver`] assigns final, unique names
//!    based on the complete set of components.
//! 3. **Materialize**: walk again with a registry seeded with those names,
//!    rewriting every reference site to its local pointer and filling each
//!    component's content exactly once.
//!
//! The result is the root document with the registry deep-merged into its
//! `components` section.
//!
//! Each pass owns a `PassContext` that is passed down by `&mut` and dropped
//! when the pass ends. Components are registered before their content is
//! walked, so a reference back to a component that is still being merged
//! (a cycle) resolves to its local pointer instead of recursing again.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::component::{ComponentId, ComponentKind, ComponentManager};
use crate::context::{Context, classify_context};
use crate::error::{BundleError, Result};
use crate::include::InclusionDirective;
use crate::naming::{ComponentNameResolver, ResolvedNames};
use crate::node::{JsonPath, MergeStrategy, Node, Segment, deep_merge, navigate};
use crate::reference::{Location, Reference};
use crate::sources::{Sources, is_glob};

/// Top-level key holding hoisted components.
pub const COMPONENTS_SECTION: &str = "components";
/// Standard reference key.
pub const REF_KEY: &str = "$ref";

const DISCRIMINATOR_KEY: &str = "discriminator";
const MAPPING_KEY: &str = "mapping";

/// Which pass the walker is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Register components under provisional names.
    Discover,
    /// Rewrite reference sites and fill component content.
    Materialize,
}

/// A discovered component with its final name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentSummary {
    pub kind: ComponentKind,
    pub name: String,
    /// `<absolute location>#<pointer>` of the hoisted content.
    pub key: String,
    /// Pointer that replaces references to this component.
    pub local_ref: String,
}

/// Result of walking one node.
enum Merged {
    Node(Node),
    /// A sequence produced by an inclusion; flattened into a parent sequence.
    Splice(Vec<Node>),
}

impl Merged {
    fn into_node(self) -> Node {
        match self {
            Merged::Node(node) => node,
            Merged::Splice(items) => Value::Array(items),
        }
    }
}

/// State owned by a single pass.
struct PassContext {
    mode: Mode,
    root: Location,
    manager: ComponentManager,
    /// Parsed documents by location; each is loaded at most once per pass.
    documents: HashMap<Location, Rc<Node>>,
    /// Targets currently being inlined, innermost last.
    inlining: Vec<String>,
    /// Root `components/<kind>/<name>` entries that point at external
    /// targets: `(kind, canonical key, name)`.
    claims: Vec<(ComponentKind, String, String)>,
}

impl PassContext {
    fn new(mode: Mode, root: &Location, document: &Node, manager: ComponentManager) -> Self {
        let mut documents = HashMap::new();
        documents.insert(root.clone(), Rc::new(document.clone()));
        Self {
            mode,
            root: root.clone(),
            manager,
            documents,
            inlining: Vec::new(),
            claims: Vec::new(),
        }
    }
}

/// Bundles a document using `sources` for all I/O.
///
/// Shorthand for [`MergeEngine::new`] followed by [`MergeEngine::merge`].
pub fn merge(document: &Node, location: &Location, sources: Sources<'_>) -> Result<Node> {
    MergeEngine::new(sources).merge(document, location)
}

/// Bundles multi-file documents into one self-contained document.
pub struct MergeEngine<'a> {
    sources: Sources<'a>,
}

impl<'a> MergeEngine<'a> {
    pub fn new(sources: Sources<'a>) -> Self {
        Self { sources }
    }

    /// Merges `document`, which was read from `location`.
    ///
    /// # Errors
    ///
    /// Any load, fetch, structural or resolution failure aborts the whole
    /// merge; see [`BundleError`].
    pub fn merge(&self, document: &Node, location: &Location) -> Result<Node> {
        info!(location = %location, "Bundling document");
        let (names, _) = self.discover_pass(document, location)?;

        let manager = ComponentManager::with_names(COMPONENTS_SECTION, names);
        let mut ctx = PassContext::new(Mode::Materialize, location, document, manager);
        let merged = self
            .merge_node(document, location, &JsonPath::root(), &mut ctx)?
            .into_node();
        info!(
            components = ctx.manager.len(),
            documents = ctx.documents.len(),
            "Materialized components"
        );

        if ctx.manager.is_empty() {
            return Ok(merged);
        }
        let registry = ctx.manager.components_section();
        match merged {
            Value::Object(mut root) => {
                let existing = root.get(COMPONENTS_SECTION).cloned().unwrap_or(Value::Null);
                root.insert(
                    COMPONENTS_SECTION.to_string(),
                    deep_merge(&existing, &registry, MergeStrategy::PreferBase),
                );
                Ok(Value::Object(root))
            }
            _ => Err(BundleError::StructuralMerge {
                path: JsonPath::root().to_string(),
            }),
        }
    }

    /// Runs discovery and naming only, returning every component that a
    /// merge would hoist, in discovery order.
    pub fn discover(&self, document: &Node, location: &Location) -> Result<Vec<ComponentSummary>> {
        let (names, manager) = self.discover_pass(document, location)?;
        Ok(manager
            .components()
            .iter()
            .map(|component| {
                let name = names
                    .get(component.kind, &component.key)
                    .unwrap_or(component.name.as_str())
                    .to_string();
                ComponentSummary {
                    kind: component.kind,
                    local_ref: format!("#/{COMPONENTS_SECTION}/{}/{name}", component.kind),
                    name,
                    key: component.key.clone(),
                }
            })
            .collect())
    }

    fn discover_pass(
        &self,
        document: &Node,
        location: &Location,
    ) -> Result<(ResolvedNames, ComponentManager)> {
        let manager = ComponentManager::new(COMPONENTS_SECTION);
        let mut ctx = PassContext::new(Mode::Discover, location, document, manager);
        self.merge_node(document, location, &JsonPath::root(), &mut ctx)?;
        debug!(components = ctx.manager.len(), "Discovered components");

        let mut resolver = ComponentNameResolver::reserving_section(document.get(COMPONENTS_SECTION));
        for (kind, key, name) in ctx.claims {
            resolver = resolver.claim(kind, key, name);
        }
        let names = resolver.resolve(ctx.manager.components());
        Ok((names, ctx.manager))
    }

    fn merge_node(
        &self,
        node: &Node,
        current: &Location,
        path: &JsonPath,
        ctx: &mut PassContext,
    ) -> Result<Merged> {
        match node {
            Value::Object(map) => self.merge_map(map, current, path, ctx),
            Value::Array(items) => {
                let mut merged = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    match self.merge_node(item, current, &path.index(index), ctx)? {
                        Merged::Node(node) => merged.push(node),
                        Merged::Splice(spliced) => merged.extend(spliced),
                    }
                }
                Ok(Merged::Node(Value::Array(merged)))
            }
            scalar => Ok(Merged::Node(scalar.clone())),
        }
    }

    fn merge_map(
        &self,
        map: &Map<String, Value>,
        current: &Location,
        path: &JsonPath,
        ctx: &mut PassContext,
    ) -> Result<Merged> {
        let Some(Value::String(raw)) = map.get(REF_KEY) else {
            return self.merge_entries(map, current, path, ctx, false);
        };

        let reference = Reference::resolve(raw, current)?;
        match classify_context(path) {
            Context::Inline => self.merge_entries(map, current, path, ctx, true),
            Context::Hoistable(_) if *reference.location(current) == ctx.root => {
                self.merge_root_ref(map, &reference, current, path, ctx)
            }
            Context::Hoistable(kind) => {
                self.merge_hoisted(map, &reference, kind, current, path, ctx)
            }
        }
    }

    /// Walks the entries of a mapping, expanding `$include` directives (and
    /// the `$ref` key itself when `inline_ref` is set).
    fn merge_entries(
        &self,
        map: &Map<String, Value>,
        current: &Location,
        path: &JsonPath,
        ctx: &mut PassContext,
        inline_ref: bool,
    ) -> Result<Merged> {
        let is_expansion =
            |key: &str| (inline_ref && key == REF_KEY) || InclusionDirective::is_directive(key);
        let explicit: HashSet<&str> = map
            .keys()
            .map(String::as_str)
            .filter(|key| !is_expansion(*key))
            .collect();

        let mut out = Map::with_capacity(map.len());
        for (key, value) in map {
            let expansion = if inline_ref && key == REF_KEY {
                let raw = value.as_str().unwrap_or_default();
                let reference = Reference::resolve(raw, current)?;
                Some(self.include_single(&reference, None, current, path, ctx)?)
            } else if let Some(directive) = InclusionDirective::parse(key)? {
                let raw = value.as_str().ok_or_else(|| {
                    BundleError::unresolvable(
                        value.to_string(),
                        current,
                        format!("'{key}' target must be a string"),
                    )
                })?;
                Some(self.expand_inclusion(raw, &directive, current, path, ctx)?)
            } else {
                None
            };

            match expansion {
                None => {
                    let merged = if key == DISCRIMINATOR_KEY && !keys_are_names(path) {
                        self.merge_discriminator(value, current, path, ctx)?
                    } else {
                        self.merge_node(value, current, &path.key(key.as_str()), ctx)?
                            .into_node()
                    };
                    out.insert(key.clone(), merged);
                }
                // Same-document target already registered.
                Some(None) => {}
                Some(Some(Value::Object(included))) => {
                    for (included_key, included_value) in included {
                        if !explicit.contains(included_key.as_str()) {
                            out.insert(included_key, included_value);
                        }
                    }
                }
                Some(Some(other)) => {
                    if map.len() > 1 {
                        return Err(BundleError::StructuralMerge {
                            path: path.to_string(),
                        });
                    }
                    return Ok(match other {
                        Value::Array(items) => Merged::Splice(items),
                        scalar => Merged::Node(scalar),
                    });
                }
            }
        }

        Ok(Merged::Node(Value::Object(out)))
    }

    /// A reference into the root document stays a pointer into the root,
    /// whichever file it was found in.
    fn merge_root_ref(
        &self,
        map: &Map<String, Value>,
        reference: &Reference,
        current: &Location,
        path: &JsonPath,
        ctx: &mut PassContext,
    ) -> Result<Merged> {
        match self.merge_entries(map, current, path, ctx, false)? {
            Merged::Node(Value::Object(mut out)) => {
                out.insert(REF_KEY.to_string(), Value::String(root_pointer(reference)));
                Ok(Merged::Node(Value::Object(out)))
            }
            other => Ok(other),
        }
    }

    fn merge_hoisted(
        &self,
        map: &Map<String, Value>,
        reference: &Reference,
        kind: ComponentKind,
        current: &Location,
        path: &JsonPath,
        ctx: &mut PassContext,
    ) -> Result<Merged> {
        let id = self.hoist(kind, reference, current, ctx)?;

        let claimed = claim_site(kind, current, path, ctx);
        if let Some(name) = &claimed {
            if ctx.mode == Mode::Discover {
                ctx.claims
                    .push((kind, reference.canonical_key(current), name.clone()));
            }
        }

        let local = ctx.manager.local_ref(id);
        let mut out = match self.merge_entries(map, current, path, ctx, false)? {
            Merged::Node(Value::Object(out)) => out,
            other => return Ok(other),
        };

        if ctx.mode == Mode::Materialize {
            if let Some(name) = claimed {
                // The entry is the component itself; a pointer here would
                // point at itself. Sibling keys overlay the target content.
                let component = ctx.manager.component(id);
                if component.name == name {
                    if let Some(content) = &component.content {
                        out.shift_remove(REF_KEY);
                        if out.is_empty() {
                            return Ok(Merged::Node(content.clone()));
                        }
                        let overlay = Value::Object(out);
                        return Ok(Merged::Node(deep_merge(
                            content,
                            &overlay,
                            MergeStrategy::PreferOverlay,
                        )));
                    }
                }
            }
        }

        out.insert(REF_KEY.to_string(), Value::String(local));
        Ok(Merged::Node(Value::Object(out)))
    }

    /// Registers the component for `reference` and, on first sight, merges
    /// its content.
    fn hoist(
        &self,
        kind: ComponentKind,
        reference: &Reference,
        current: &Location,
        ctx: &mut PassContext,
    ) -> Result<ComponentId> {
        let (id, created) = ctx.manager.get_or_create(kind, reference, current);
        if !created {
            return Ok(id);
        }

        let key = reference.canonical_key(current);
        let target = reference.location(current).clone();
        let name = ctx.manager.component(id).name.clone();
        debug!(kind = %kind, name = %name, target = %key, mode = ?ctx.mode, "Hoisting component");

        let document = self.load_document(&target, ctx)?;
        let content = navigate(&document, reference.pointer()).ok_or_else(|| {
            BundleError::unresolvable(
                key.as_str(),
                current,
                "pointer does not exist in target document",
            )
        })?;
        let content_path = JsonPath::from_keys([COMPONENTS_SECTION, kind.section(), name.as_str()]);
        let merged = self
            .merge_node(content, &target, &content_path, ctx)?
            .into_node();

        if ctx.mode == Mode::Materialize {
            ctx.manager.set_content(id, merged);
        }
        Ok(id)
    }

    fn merge_discriminator(
        &self,
        value: &Node,
        current: &Location,
        path: &JsonPath,
        ctx: &mut PassContext,
    ) -> Result<Node> {
        let discriminator_path = path.key(DISCRIMINATOR_KEY);
        let Some(discriminator) = value.as_object() else {
            return Ok(self
                .merge_node(value, current, &discriminator_path, ctx)?
                .into_node());
        };
        let Some(mapping) = discriminator.get(MAPPING_KEY).and_then(Value::as_object) else {
            return Ok(self
                .merge_node(value, current, &discriminator_path, ctx)?
                .into_node());
        };

        let mut out = Map::with_capacity(discriminator.len());
        for (key, entry) in discriminator {
            if key != MAPPING_KEY {
                let merged = self
                    .merge_node(entry, current, &discriminator_path.key(key.as_str()), ctx)?
                    .into_node();
                out.insert(key.clone(), merged);
                continue;
            }

            let mut rewritten = Map::with_capacity(mapping.len());
            for (tag, target) in mapping {
                let target = match target.as_str() {
                    Some(raw) => Value::String(self.resolve_mapping_target(
                        raw,
                        current,
                        &discriminator_path.key(tag.as_str()),
                        ctx,
                    )?),
                    None => target.clone(),
                };
                rewritten.insert(tag.clone(), target);
            }
            out.insert(key.clone(), Value::Object(rewritten));
        }
        Ok(Value::Object(out))
    }

    fn resolve_mapping_target(
        &self,
        raw: &str,
        current: &Location,
        path: &JsonPath,
        ctx: &mut PassContext,
    ) -> Result<String> {
        // Bare schema names (`cat: Cat`) are not references.
        if !raw.contains(['#', '/', '.']) {
            return Ok(raw.to_string());
        }

        let reference = Reference::resolve(raw, current)?;
        if reference.is_same_document() && *current == ctx.root {
            return Ok(raw.to_string());
        }
        if *reference.location(current) == ctx.root {
            return Ok(root_pointer(&reference));
        }

        let kind = match classify_context(path) {
            Context::Hoistable(kind) => kind,
            Context::Inline => ComponentKind::Schemas,
        };
        if reference.is_same_document()
            && ctx
                .manager
                .get(kind, &reference.canonical_key(current))
                .is_some()
        {
            debug!(target = %reference.canonical_key(current), "Mapping target already registered");
        }
        let id = self.hoist(kind, &reference, current, ctx)?;
        Ok(ctx.manager.local_ref(id))
    }

    fn expand_inclusion(
        &self,
        raw: &str,
        directive: &InclusionDirective,
        current: &Location,
        path: &JsonPath,
        ctx: &mut PassContext,
    ) -> Result<Option<Node>> {
        let reference = Reference::resolve(raw, current)?;
        let (target_path, _) = raw.split_once('#').unwrap_or((raw, ""));
        let included = match reference.target() {
            Some(Location::File(_)) if is_glob(target_path) => {
                self.expand_glob(&reference, directive, current, path, ctx)?
            }
            _ => self.include_single(&reference, directive.fragment(), current, path, ctx)?,
        };
        Ok(included.map(|node| directive.filter(node)))
    }

    fn expand_glob(
        &self,
        reference: &Reference,
        directive: &InclusionDirective,
        current: &Location,
        path: &JsonPath,
        ctx: &mut PassContext,
    ) -> Result<Option<Node>> {
        let pattern = reference.location(current).to_string();
        let matches = self
            .sources
            .glob
            .expand(&pattern)
            .map_err(|source| BundleError::Load {
                location: pattern.clone(),
                source,
            })?;
        debug!(pattern = %pattern, matches = matches.len(), "Expanded inclusion glob");

        match matches.as_slice() {
            [] => Err(BundleError::unresolvable(
                pattern,
                current,
                "glob pattern matched no files",
            )),
            [single] => {
                let reference = reference.with_target(Location::file(single));
                self.include_single(&reference, directive.fragment(), current, path, ctx)
            }
            files => {
                let mut assembled = Map::with_capacity(files.len());
                for file in files {
                    let location = Location::file(file);
                    let stem = location
                        .stem()
                        .unwrap_or_else(|| file.display().to_string());
                    let reference = reference.with_target(location);
                    let included = self.include_single(
                        &reference,
                        directive.fragment(),
                        current,
                        &path.key(stem.as_str()),
                        ctx,
                    )?;
                    if let Some(node) = included {
                        assembled.insert(stem, node);
                    }
                }
                Ok(Some(Value::Object(assembled)))
            }
        }
    }

    /// Loads the target of an inclusion (or inlined reference) and merges it
    /// at `path`. Returns `None` when a same-document target is already a
    /// registered component.
    fn include_single(
        &self,
        reference: &Reference,
        fragment: Option<&str>,
        current: &Location,
        path: &JsonPath,
        ctx: &mut PassContext,
    ) -> Result<Option<Node>> {
        if reference.is_same_document() {
            let key = reference.canonical_key(current);
            if ctx.manager.contains_key(&key) {
                debug!(target = %key, "Skipping inclusion of registered target");
                return Ok(None);
            }
        }

        let target = reference.location(current).clone();
        let pointer = format!("{}{}", reference.pointer(), fragment.unwrap_or_default());
        let inline_key = format!("{target}#{pointer}");
        if ctx.inlining.contains(&inline_key) {
            return Err(BundleError::InclusionCycle(inline_key));
        }

        let document = self.load_document(&target, ctx)?;
        let content = navigate(&document, &pointer).ok_or_else(|| {
            BundleError::unresolvable(
                inline_key.as_str(),
                current,
                "pointer does not exist in target document",
            )
        })?;
        debug!(target = %inline_key, path = %path, "Inlining content");

        ctx.inlining.push(inline_key);
        let merged = self.merge_node(content, &target, path, ctx);
        ctx.inlining.pop();
        Ok(Some(merged?.into_node()))
    }

    fn load_document(&self, location: &Location, ctx: &mut PassContext) -> Result<Rc<Node>> {
        if let Some(document) = ctx.documents.get(location) {
            return Ok(Rc::clone(document));
        }

        let document = match location {
            Location::File(path) => {
                self.sources
                    .loader
                    .load(path)
                    .map_err(|source| BundleError::Load {
                        location: location.to_string(),
                        source,
                    })?
            }
            Location::Url(url) => {
                let text = self
                    .sources
                    .fetcher
                    .fetch(url)
                    .map_err(|source| BundleError::Fetch {
                        url: url.to_string(),
                        source,
                    })?;
                self.sources
                    .loader
                    .parse(&text, url.as_str())
                    .map_err(|source| BundleError::Load {
                        location: location.to_string(),
                        source,
                    })?
            }
        };
        debug!(location = %location, "Loaded document");

        let document = Rc::new(document);
        ctx.documents.insert(location.clone(), Rc::clone(&document));
        Ok(document)
    }
}

/// Returns the entry name when `path` is `components/<kind>/<name>` in the
/// root document.
fn claim_site(
    kind: ComponentKind,
    current: &Location,
    path: &JsonPath,
    ctx: &PassContext,
) -> Option<String> {
    if *current != ctx.root {
        return None;
    }
    match path.segments() {
        [Segment::Key(section), Segment::Key(kind_key), Segment::Key(name)]
            if section == COMPONENTS_SECTION && kind_key == kind.section() =>
        {
            Some(name.clone())
        }
        _ => None,
    }
}

/// Local form of a reference whose target is the root document.
fn root_pointer(reference: &Reference) -> String {
    format!("#{}", reference.pointer())
}

/// Returns `true` when the keys of the mapping at `path` are user-chosen
/// names rather than keywords (so `discriminator` there is a property).
fn keys_are_names(path: &JsonPath) -> bool {
    match path.segments() {
        [.., Segment::Key(parent)]
            if matches!(
                parent.as_str(),
                "properties" | "patternProperties" | "definitions" | "$defs"
            ) =>
        {
            true
        }
        [.., Segment::Key(section), Segment::Key(_)] => section == COMPONENTS_SECTION,
        _ => false,
    }
}
