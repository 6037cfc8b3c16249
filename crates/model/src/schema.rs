//! Model type declarations.
//!
//! A `Schema` is the per-type declaration surface of a model: which keys hold
//! child entities (relations), which keys are derived from others, which
//! events its models expose to a parent, and an optional hook run once a
//! model is fully initialized. It is built and validated once, then shared by
//! every model of that type.

use crate::attr::Attr;
use crate::graph::DependencyGraph;
use crate::model::Model;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use trellis_core::{Error, Result};

/// Compute function of a derived attribute.
pub type ComputeFn = Rc<dyn Fn(&Model) -> Attr>;

/// Hook invoked at the end of model construction.
pub type InitHook = Rc<dyn Fn(&Model)>;

/// The kind of entity a relation key holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelationKind {
    /// A single child model
    Model,
    /// A nested collection of models
    Collection,
}

/// A declared relation: entity kind plus the schema used to build child
/// models from raw data.
#[derive(Clone)]
pub struct Relation {
    kind: RelationKind,
    schema: Option<Rc<Schema>>,
}

impl Relation {
    /// A single child model.
    pub fn one() -> Self {
        Self {
            kind: RelationKind::Model,
            schema: None,
        }
    }

    /// A nested collection.
    pub fn many() -> Self {
        Self {
            kind: RelationKind::Collection,
            schema: None,
        }
    }

    /// Builds child models from raw data with `schema`.
    pub fn of(mut self, schema: &Rc<Schema>) -> Self {
        self.schema = Some(Rc::clone(schema));
        self
    }

    /// Returns the relation kind.
    #[inline]
    pub fn kind(&self) -> RelationKind {
        self.kind
    }

    /// Returns the child schema, if declared.
    #[inline]
    pub fn schema(&self) -> Option<&Rc<Schema>> {
        self.schema.as_ref()
    }

    /// Returns the child schema, or an anonymous one.
    pub fn schema_or_anonymous(&self) -> Rc<Schema> {
        self.schema.clone().unwrap_or_else(Schema::anonymous)
    }
}

impl fmt::Debug for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Relation")
            .field("kind", &self.kind)
            .field("schema", &self.schema.as_ref().map(|s| s.name()))
            .finish()
    }
}

/// Declaration of one derived attribute.
///
/// A spec without a compute function is malformed; it is kept in the schema
/// but never wired or computed.
#[derive(Clone, Default)]
pub struct DerivedSpec {
    deps: Vec<String>,
    compute: Option<ComputeFn>,
}

impl DerivedSpec {
    /// Creates a derived attribute recomputed whenever any of `deps` changes.
    pub fn new<I, F, R>(deps: I, compute: F) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
        F: Fn(&Model) -> R + 'static,
        R: Into<Attr>,
    {
        Self {
            deps: deps.into_iter().map(Into::into).collect(),
            compute: Some(Rc::new(move |model: &Model| -> Attr { compute(model).into() })),
        }
    }

    /// Creates a spec with dependencies but no compute function.
    pub fn deps_only<I>(deps: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            deps: deps.into_iter().map(Into::into).collect(),
            compute: None,
        }
    }

    /// Returns the dependency keys in declaration order.
    #[inline]
    pub fn deps(&self) -> &[String] {
        &self.deps
    }

    /// Returns the compute function, if declared.
    #[inline]
    pub fn compute(&self) -> Option<&ComputeFn> {
        self.compute.as_ref()
    }

    /// Returns true if the spec can be wired.
    #[inline]
    pub fn is_well_formed(&self) -> bool {
        self.compute.is_some()
    }
}

impl fmt::Debug for DerivedSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedSpec")
            .field("deps", &self.deps)
            .field("compute", &self.compute.is_some())
            .finish()
    }
}

/// The declaration of a model type.
pub struct Schema {
    name: String,
    relations: Vec<(String, Relation)>,
    derived: Vec<(String, DerivedSpec)>,
    exposed_events: Option<Vec<String>>,
    on_initialized: Option<InitHook>,
    graph: DependencyGraph,
    initial_order: Vec<String>,
}

impl Schema {
    /// Starts building a schema.
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(name)
    }

    /// A schema with no declarations, used for child models built from raw
    /// data when their relation names no schema.
    pub fn anonymous() -> Rc<Schema> {
        Rc::new(Schema {
            name: String::new(),
            relations: Vec::new(),
            derived: Vec::new(),
            exposed_events: None,
            on_initialized: None,
            graph: DependencyGraph::new(),
            initial_order: Vec::new(),
        })
    }

    /// Returns the type name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the relations in declaration order.
    #[inline]
    pub fn relations(&self) -> &[(String, Relation)] {
        &self.relations
    }

    /// Returns the relation declared for `key`.
    pub fn relation(&self, key: &str) -> Option<&Relation> {
        self.relations
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, relation)| relation)
    }

    /// Returns the relation kind declared for `key`.
    pub fn relation_kind(&self, key: &str) -> Option<RelationKind> {
        self.relation(key).map(Relation::kind)
    }

    /// Returns the derived declarations in declaration order.
    #[inline]
    pub fn derived(&self) -> &[(String, DerivedSpec)] {
        &self.derived
    }

    /// Returns the derived declaration for `key`.
    pub fn derived_spec(&self, key: &str) -> Option<&DerivedSpec> {
        self.derived
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, spec)| spec)
    }

    /// Returns the events this type exposes to a parent, if declared.
    #[inline]
    pub fn exposed_events(&self) -> Option<&[String]> {
        self.exposed_events.as_deref()
    }

    /// Returns the initialization hook, if declared.
    #[inline]
    pub fn on_initialized(&self) -> Option<&InitHook> {
        self.on_initialized.as_ref()
    }

    /// Returns the validated dependency graph of well-formed derived keys.
    #[inline]
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Derived keys in the order their initial values are computed.
    #[inline]
    pub fn initial_order(&self) -> &[String] {
        &self.initial_order
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field("relations", &self.relations)
            .field("derived", &self.derived)
            .field("exposed_events", &self.exposed_events)
            .finish()
    }
}

/// Builder for `Schema`.
pub struct SchemaBuilder {
    name: String,
    relations: Vec<(String, Relation)>,
    derived: Vec<(String, DerivedSpec)>,
    exposed_events: Option<Vec<String>>,
    on_initialized: Option<InitHook>,
    errors: Vec<Error>,
}

impl SchemaBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            relations: Vec::new(),
            derived: Vec::new(),
            exposed_events: None,
            on_initialized: None,
            errors: Vec::new(),
        }
    }

    /// Declares a relation key.
    pub fn relation(mut self, key: impl Into<String>, relation: Relation) -> Self {
        let key = key.into();
        if self.relations.iter().any(|(k, _)| *k == key) {
            self.errors.push(Error::duplicate_declaration(key));
        } else {
            self.relations.push((key, relation));
        }
        self
    }

    /// Declares a derived attribute.
    pub fn derived<I, F, R>(self, key: impl Into<String>, deps: I, compute: F) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
        F: Fn(&Model) -> R + 'static,
        R: Into<Attr>,
    {
        self.derived_spec(key, DerivedSpec::new(deps, compute))
    }

    /// Declares a derived attribute from a prepared spec.
    pub fn derived_spec(mut self, key: impl Into<String>, spec: DerivedSpec) -> Self {
        let key = key.into();
        if self.derived.iter().any(|(k, _)| *k == key) {
            self.errors.push(Error::duplicate_declaration(key));
        } else {
            self.derived.push((key, spec));
        }
        self
    }

    /// Declares the events models of this type expose to a parent.
    pub fn exposes<I>(mut self, events: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.exposed_events = Some(events.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the hook run once a model is fully initialized.
    pub fn on_initialized<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Model) + 'static,
    {
        self.on_initialized = Some(Rc::new(hook));
        self
    }

    /// Validates the declarations and builds the schema.
    ///
    /// Fails on duplicate keys and on cycles among derived attributes.
    /// Derived specs without a compute function are kept but left out of
    /// the dependency graph.
    pub fn build(self) -> Result<Rc<Schema>> {
        if let Some(err) = self.errors.into_iter().next() {
            return Err(err);
        }

        let mut graph = DependencyGraph::new();
        for (key, spec) in &self.derived {
            if spec.is_well_formed() {
                graph.add(key, spec.deps());
            } else {
                tracing::warn!(
                    schema = %self.name,
                    key = %key,
                    "derived attribute has no compute function; skipping"
                );
            }
        }
        let initial_order = graph.topological_order()?;

        Ok(Rc::new(Schema {
            name: self.name,
            relations: self.relations,
            derived: self.derived,
            exposed_events: self.exposed_events,
            on_initialized: self.on_initialized,
            graph,
            initial_order,
        }))
    }
}

impl fmt::Debug for SchemaBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaBuilder")
            .field("name", &self.name)
            .field("relations", &self.relations.len())
            .field("derived", &self.derived.len())
            .finish()
    }
}
