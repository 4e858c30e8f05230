//! Runtime dispatcher over dynamic variant values.
//!
//! A [`Handlers`] set holds at most one handler per variant tag. Dispatching
//! a value invokes only the handler registered for the variant it holds; an
//! omitted handler is intentional disinterest and yields `R::default()`.

use crate::error::MatchError;
use crate::value::{Payload, VariantValue};
use std::collections::{HashMap, HashSet};

/// Boxed handler invoked with the payload of the matched variant.
pub type Handler<'h, R, E> = Box<dyn FnOnce(&Payload) -> Result<R, E> + 'h>;

/// Set of optional per-variant handlers, keyed by wire tag.
pub struct Handlers<'h, R, E> {
    handlers: HashMap<String, Handler<'h, R, E>>,
}

impl<'h, R, E> Handlers<'h, R, E> {
    /// Creates an empty handler set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registers the handler for `tag`, replacing any previous one.
    #[must_use]
    pub fn on<F>(mut self, tag: impl Into<String>, handler: F) -> Self
    where
        F: FnOnce(&Payload) -> Result<R, E> + 'h,
    {
        self.insert(tag, handler);
        self
    }

    /// Registers the handler for `tag` in place.
    pub fn insert<F>(&mut self, tag: impl Into<String>, handler: F)
    where
        F: FnOnce(&Payload) -> Result<R, E> + 'h,
    {
        self.handlers.insert(tag.into(), Box::new(handler));
    }

    /// Returns true if a handler is registered for `tag`.
    #[must_use]
    pub fn has_handler(&self, tag: &str) -> bool {
        self.handlers.contains_key(tag)
    }

    /// Number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns true if no handler is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<R, E> Default for Handlers<'_, R, E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Dispatcher for the declared variants of one sum type.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    enum_name: String,
    tags: HashSet<String>,
}

impl Dispatcher {
    /// Creates a dispatcher for an enum declaring the given variant tags.
    pub fn new<I, S>(enum_name: impl Into<String>, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            enum_name: enum_name.into(),
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }

    /// Name of the dispatched enum.
    #[must_use]
    pub fn enum_name(&self) -> &str {
        &self.enum_name
    }

    /// Returns true if `tag` is a declared variant.
    #[must_use]
    pub fn declares(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Invokes the handler for the variant held by `value`.
    ///
    /// Handlers for other variants are never consulted.
    ///
    /// # Errors
    /// Returns [`MatchError::UnsupportedVariant`] when `value` holds an
    /// undeclared tag and [`MatchError::Handler`] when the invoked handler
    /// fails.
    pub fn apply<R, E>(
        &self,
        value: &VariantValue,
        mut handlers: Handlers<'_, R, E>,
    ) -> Result<R, MatchError<E>>
    where
        R: Default,
    {
        if !self.declares(&value.tag) {
            return Err(MatchError::UnsupportedVariant(value.tag.clone()));
        }

        for tag in handlers.handlers.keys().filter(|tag| !self.declares(tag)) {
            tracing::warn!(
                "Handler registered for undeclared variant '{}' of enum '{}'",
                tag,
                self.enum_name
            );
        }

        match handlers.handlers.remove(&value.tag) {
            Some(handler) => handler(&value.payload).map_err(MatchError::Handler),
            None => {
                tracing::trace!(
                    "No handler for variant '{}' of enum '{}', returning default",
                    value.tag,
                    self.enum_name
                );
                Ok(R::default())
            }
        }
    }
}
