// Copyright (c) 2023 xmpp-rs contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Pluggable per-connection service container.
//!
//! A [`Service`] is a unit of client functionality (roster cache, ad-hoc
//! commands, ...) that other services can depend on. Services are
//! instantiated lazily, on first [`ServiceRegistry::summon`], and torn down
//! in the reverse of their instantiation order when the registry is
//! dropped.

use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::Error;

/// Identifies a [`Service`] type for dependency bookkeeping.
pub type ServiceId = TypeId;

/// A unit of client functionality summoned on demand by a [`ServiceRegistry`].
///
/// Implementors that depend on another service should call
/// `registry.summon::<Dep>()` from within their own [`Service::new`]; the
/// `orders_after`/`orders_before` lists are not consulted to drive that
/// instantiation (Rust has no generic way to construct an arbitrary type
/// from a [`TypeId`]) but are checked afterwards as a sanity assertion that
/// the declared edges match what was actually summoned.
pub trait Service: Any + Send + Sync {
    /// Services that must already be present in the registry by the time
    /// this one finishes constructing.
    fn orders_after() -> &'static [ServiceId]
    where
        Self: Sized,
    {
        &[]
    }

    /// Services which, if summoned in the same registry, must be
    /// instantiated strictly after this one.
    fn orders_before() -> &'static [ServiceId]
    where
        Self: Sized,
    {
        &[]
    }

    /// Constructs this service. Implementations that depend on another
    /// service summon it via `registry.summon::<Dep>()`.
    fn new(registry: &mut ServiceRegistry) -> Result<Self, Error>
    where
        Self: Sized;
}

/// Container owning the summoned service instances for one client
/// connection.
#[derive(Default)]
pub struct ServiceRegistry {
    instances: HashMap<ServiceId, Arc<dyn Any + Send + Sync>>,
    /// Instantiation order, oldest first; torn down in reverse.
    order: Vec<ServiceId>,
    /// Services currently in the middle of being constructed, to detect
    /// cycles (A summons B summons A).
    in_progress: HashSet<ServiceId>,
    /// Declared ordering edges, recorded as each service is summoned, used
    /// by `check_declared_order` to flag inconsistent metadata.
    after_edges: HashMap<ServiceId, &'static [ServiceId]>,
    before_edges: HashMap<ServiceId, &'static [ServiceId]>,
}

impl ServiceRegistry {
    /// Creates an empty registry. No services are instantiated until
    /// `summon` is called.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the already-summoned instance of `S`, or constructs it (and
    /// transitively whatever its constructor summons) first.
    ///
    /// Returns `Err(Error::ServiceDependencyCycle)` if constructing `S`
    /// requires, directly or indirectly, summoning `S` itself again.
    pub fn summon<S: Service + 'static>(&mut self) -> Result<Arc<S>, Error> {
        let id = TypeId::of::<S>();

        if let Some(existing) = self.instances.get(&id) {
            return Ok(existing
                .clone()
                .downcast::<S>()
                .expect("ServiceRegistry type map invariant violated"));
        }

        if !self.in_progress.insert(id) {
            return Err(Error::ServiceDependencyCycle);
        }

        self.after_edges.insert(id, S::orders_after());
        self.before_edges.insert(id, S::orders_before());

        let result = S::new(self);

        self.in_progress.remove(&id);
        let service = result?;

        self.check_declared_order(id, S::orders_after());

        let arc: Arc<dyn Any + Send + Sync> = Arc::new(service);
        self.instances.insert(id, arc.clone());
        self.order.push(id);

        Ok(arc
            .downcast::<S>()
            .expect("ServiceRegistry type map invariant violated"))
    }

    /// Returns the already-summoned instance of `S`, if any, without
    /// constructing it.
    pub fn get<S: Service + 'static>(&self) -> Option<Arc<S>> {
        self.instances
            .get(&TypeId::of::<S>())
            .cloned()
            .map(|arc| arc.downcast::<S>().expect("ServiceRegistry type map invariant violated"))
    }

    fn check_declared_order(&self, id: ServiceId, orders_after: &'static [ServiceId]) {
        for dep in orders_after {
            if !self.instances.contains_key(dep) {
                log::warn!(
                    "service declared orders_after a dependency that was never summoned \
                     during its own construction (metadata/implementation mismatch)"
                );
            }
        }
        for (other, before) in &self.before_edges {
            if *other == id {
                continue;
            }
            if before.contains(&id) && !self.order.contains(other) {
                log::warn!(
                    "service declared orders_before a dependency summoned after it \
                     (metadata/implementation mismatch)"
                );
            }
        }
    }

    /// Tears down all summoned services, in the reverse of their
    /// instantiation order.
    pub fn shutdown(&mut self) {
        for id in self.order.drain(..).rev() {
            self.instances.remove(&id);
        }
        self.after_edges.clear();
        self.before_edges.clear();
    }
}

impl Drop for ServiceRegistry {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static NEXT_ORDER: AtomicUsize = AtomicUsize::new(0);

    struct Base {
        order: usize,
    }
    impl Service for Base {
        fn new(_registry: &mut ServiceRegistry) -> Result<Self, Error> {
            Ok(Base {
                order: NEXT_ORDER.fetch_add(1, Ordering::SeqCst),
            })
        }
    }

    struct Dependent {
        order: usize,
        base: Arc<Base>,
    }
    impl Service for Dependent {
        fn orders_after() -> &'static [ServiceId] {
            // Can't reference Base::type_id statically without an instance;
            // left empty here and exercised via the summon call below
            // instead (see `summons_dependency_first`).
            &[]
        }

        fn new(registry: &mut ServiceRegistry) -> Result<Self, Error> {
            let base = registry.summon::<Base>()?;
            Ok(Dependent {
                order: NEXT_ORDER.fetch_add(1, Ordering::SeqCst),
                base,
            })
        }
    }

    struct CyclicA;
    struct CyclicB;
    impl Service for CyclicA {
        fn new(registry: &mut ServiceRegistry) -> Result<Self, Error> {
            registry.summon::<CyclicB>()?;
            Ok(CyclicA)
        }
    }
    impl Service for CyclicB {
        fn new(registry: &mut ServiceRegistry) -> Result<Self, Error> {
            registry.summon::<CyclicA>()?;
            Ok(CyclicB)
        }
    }

    #[test]
    fn summons_dependency_first() {
        let mut registry = ServiceRegistry::new();
        let dependent = registry.summon::<Dependent>().unwrap();
        assert!(dependent.base.order < dependent.order);
    }

    #[test]
    fn summon_is_idempotent() {
        let mut registry = ServiceRegistry::new();
        let a = registry.summon::<Base>().unwrap();
        let b = registry.summon::<Base>().unwrap();
        assert_eq!(a.order, b.order);
    }

    #[test]
    fn detects_cycle() {
        let mut registry = ServiceRegistry::new();
        let result = registry.summon::<CyclicA>();
        assert!(matches!(result, Err(Error::ServiceDependencyCycle)));
    }

    #[test]
    fn teardown_is_reverse_of_instantiation() {
        let mut registry = ServiceRegistry::new();
        registry.summon::<Dependent>().unwrap();
        assert_eq!(registry.order, vec![TypeId::of::<Base>(), TypeId::of::<Dependent>()]);
        registry.shutdown();
        assert!(registry.order.is_empty());
        assert!(registry.instances.is_empty());
    }
}
