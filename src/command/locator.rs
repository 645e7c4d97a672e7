//! Capability-keyed service registry used at the wiring boundary.
//!
//! Filled once at startup, then shared read-only behind an `Arc`. Area
//! `register` functions resolve what their commands need and hand the
//! services to command constructors; command bodies never touch the locator.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::sync::Arc;

use crate::command::error::WiringError;

#[derive(Default)]
pub struct ServiceLocator {
    services: HashMap<TypeId, (&'static str, Box<dyn Any + Send + Sync>)>,
}

impl ServiceLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an implementation for capability `S` (usually `dyn Trait`).
    pub fn provide<S>(&mut self, service: Arc<S>) -> &mut Self
    where
        S: ?Sized + Send + Sync + 'static,
    {
        self.services
            .insert(TypeId::of::<S>(), (type_name::<S>(), Box::new(service)));
        self
    }

    /// Resolve capability `S`, failing if nothing was registered for it.
    pub fn service<S>(&self) -> Result<Arc<S>, WiringError>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        self.services
            .get(&TypeId::of::<S>())
            .and_then(|(_, boxed)| boxed.downcast_ref::<Arc<S>>())
            .cloned()
            .ok_or(WiringError::Unregistered(type_name::<S>()))
    }

    pub fn registered(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.services.values().map(|(n, _)| *n).collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for ServiceLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceLocator")
            .field("services", &self.registered())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    trait Unused: Send + Sync {}

    struct English;

    impl Greeter for English {
        fn greet(&self) -> String {
            "hello".into()
        }
    }

    #[test]
    fn resolves_trait_objects() {
        let mut locator = ServiceLocator::new();
        locator.provide::<dyn Greeter>(Arc::new(English));
        let g = locator.service::<dyn Greeter>().unwrap();
        assert_eq!(g.greet(), "hello");
    }

    #[test]
    fn unregistered_capability_is_an_error() {
        let locator = ServiceLocator::new();
        let err = locator.service::<dyn Unused>().err().unwrap();
        assert!(err.to_string().contains("Unused"));
    }
}
