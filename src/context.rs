//! The process-scoped `Context` (spec §3, §5): a type dictionary (builder
//! registrations) plus a taxonomy resolver, effectively immutable once
//! streams reference it.
//!
//! Grounded on the `OnceLock<RwLock<LeapSeconds>>` lazily-initialized
//! global table in the teacher's `timestamp.rs`, reused here for the
//! process-wide default `Context` that spec §9 ("Global state") requires
//! to be "an explicit constructor argument defaulting to a process-wide
//! singleton created on first use... never hidden module state" — the
//! `OnceLock` is the singleton storage, but every API that needs a
//! `Context` still takes one as an explicit argument (or `Arc` clone of
//! the default), matching that constraint.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use crate::message::Message;
use crate::taxonomy::TaxonomyResolver;

static DEFAULT_CONTEXT: OnceLock<Arc<Context>> = OnceLock::new();

/// A registered `(toMessage, fromMessage)` pair for one application type,
/// keyed by a stable type identifier (spec §9: the reflection-free
/// replacement for bean-mapping). Only the trait surface is core; no
/// concrete application type ships in this crate (spec §1 scopes bean
/// mapping itself out as an external collaborator).
pub trait MessageBuilder: Any + Send + Sync {
    /// The stable type identifier this builder is registered under.
    fn type_id(&self) -> &str;

    /// Convert an application value (passed as `&dyn Any`, downcast by the
    /// implementor) into a `Message`.
    fn to_message(&self, value: &dyn Any) -> Message;

    /// Reconstruct an application value (as a boxed `Any`) from a
    /// `Message`. Returns `None` if the message does not match this
    /// builder's expected shape.
    fn from_message(&self, message: &Message) -> Option<Box<dyn Any>>;
}

/// Type dictionary + taxonomy resolver, shared by every message built or
/// read under it. Registration mutates the dictionary; spec §5 places the
/// burden of synchronizing registration against concurrent stream use on
/// the caller (or: register everything before any stream begins).
pub struct Context {
    builders: RwLock<HashMap<String, Arc<dyn MessageBuilder>>>,
    taxonomy_resolver: Option<Box<dyn TaxonomyResolver>>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("builders", &self.builders.read().unwrap().len())
            .field("has_taxonomy_resolver", &self.taxonomy_resolver.is_some())
            .finish()
    }
}

impl Context {
    /// An empty context: no builders, no taxonomy resolver.
    pub fn new() -> Context {
        Context {
            builders: RwLock::new(HashMap::new()),
            taxonomy_resolver: None,
        }
    }

    /// A context with a taxonomy resolver attached.
    pub fn with_taxonomy_resolver(resolver: Box<dyn TaxonomyResolver>) -> Context {
        Context {
            builders: RwLock::new(HashMap::new()),
            taxonomy_resolver: Some(resolver),
        }
    }

    /// The process-wide default context, created on first use. Most
    /// callers should prefer constructing (and registering against) their
    /// own `Context`; this exists only so APIs that take `Arc<Context>`
    /// have something sensible to default to.
    pub fn default_context() -> Arc<Context> {
        DEFAULT_CONTEXT
            .get_or_init(|| Arc::new(Context::new()))
            .clone()
    }

    /// Register a builder. Last registration for a given `type_id` wins.
    pub fn register_builder(&self, builder: Arc<dyn MessageBuilder>) {
        let mut builders = self.builders.write().unwrap();
        builders.insert(builder.type_id().to_string(), builder);
    }

    /// Look up a builder by its stable type identifier.
    pub fn builder(&self, type_id: &str) -> Option<Arc<dyn MessageBuilder>> {
        self.builders.read().unwrap().get(type_id).cloned()
    }

    pub fn taxonomy_resolver(&self) -> Option<&dyn TaxonomyResolver> {
        self.taxonomy_resolver.as_deref()
    }
}

impl Default for Context {
    fn default() -> Self {
        Context::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_context_is_a_singleton() {
        let a = Context::default_context();
        let b = Context::default_context();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn empty_context_has_no_builders() {
        let ctx = Context::new();
        assert!(ctx.builder("widget").is_none());
    }
}
