use alloc::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
    vec::Vec,
};
use core::any::TypeId;
use parking_lot::Mutex;
use tracing::debug;

use crate::{
    any::TypeInfo,
    container::Container,
    dependency_resolver::DependencyResolver,
    errors::{BuildErrorKind, InstantiateErrorKind, ResolveErrorKind},
    finalizer::{boxed_finalizer, BoxedCloneFinalizer, Finalizer},
    generic::{closed_instantiator, OpenGeneric},
    graph::DependencyGraph,
    instantiator::{boxed_injecting_instantiator, boxed_instantiator, instance, BoxedCloneInstantiator, Instantiator},
    lifetime::Lifetime,
    lookup::{ServiceKey, TypeKeyedMap},
    member::MemberInject,
    metadata::{self, TypeMetadata},
    validation::{LifetimeValidator, ValidationMode},
};

/// Everything the container needs to produce one service: its erased
/// constructor, lifetime, published metadata and optional finalizer.
pub(crate) struct Registration {
    pub(crate) service: TypeInfo,
    pub(crate) name: Option<&'static str>,
    pub(crate) lifetime: Lifetime,
    pub(crate) instantiator: BoxedCloneInstantiator,
    pub(crate) finalizer: Option<BoxedCloneFinalizer>,
    pub(crate) metadata: Arc<TypeMetadata>,
    /// Serializes first creation of this registration's cached instance.
    /// Per registration, so unrelated services never wait on each other;
    /// nested acquisition follows dependency edges, which the build-time
    /// cycle check proved acyclic.
    pub(crate) creation_lock: Mutex<()>,
}

impl Registration {
    #[must_use]
    pub(crate) fn key(&self) -> ServiceKey {
        ServiceKey {
            type_id: self.service.id,
            name: self.name,
        }
    }
}

struct Entry {
    service: TypeInfo,
    name: Option<&'static str>,
    lifetime: Lifetime,
    instantiator: BoxedCloneInstantiator,
    constructor_dependencies: Vec<TypeInfo>,
    member_dependencies: Vec<TypeInfo>,
}

/// Declares services and builds the immutable [`Container`].
///
/// Registrations are keyed by service type plus optional name; a second
/// registration under the same key replaces the first.
#[derive(Default)]
pub struct RegistryBuilder {
    entries: BTreeMap<ServiceKey, Entry>,
    finalizers: BTreeMap<TypeId, BoxedCloneFinalizer>,
    open_generics: BTreeMap<TypeId, Lifetime>,
    mode: ValidationMode,
    ignored_pairs: BTreeSet<(TypeId, TypeId)>,
    ignored_types: BTreeSet<TypeId>,
}

impl RegistryBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn provide<Inst, Deps>(self, instantiator: Inst, lifetime: Lifetime) -> Self
    where
        Inst: Instantiator<Deps, Error = InstantiateErrorKind> + Send + Sync,
        Inst::Provides: Send + Sync,
        Deps: DependencyResolver<Error = ResolveErrorKind>,
    {
        let mut dependencies = Vec::new();
        Deps::collect_dependencies(&mut dependencies);
        self.insert::<Inst::Provides>(None, lifetime, boxed_instantiator(instantiator), dependencies, Vec::new())
    }

    /// Registers an additional instantiator for a type already provided
    /// under its default key, addressable with
    /// [`Container::get_named`](crate::Container::get_named).
    #[must_use]
    pub fn provide_named<Inst, Deps>(self, name: &'static str, instantiator: Inst, lifetime: Lifetime) -> Self
    where
        Inst: Instantiator<Deps, Error = InstantiateErrorKind> + Send + Sync,
        Inst::Provides: Send + Sync,
        Deps: DependencyResolver<Error = ResolveErrorKind>,
    {
        let mut dependencies = Vec::new();
        Deps::collect_dependencies(&mut dependencies);
        self.insert::<Inst::Provides>(Some(name), lifetime, boxed_instantiator(instantiator), dependencies, Vec::new())
    }

    /// Registers an already constructed value as a singleton; resolutions
    /// share one cached clone of it.
    #[must_use]
    pub fn provide_instance<T: Clone + Send + Sync + 'static>(self, value: T) -> Self {
        self.provide(instance(value), Lifetime::Singleton)
    }

    /// Like [`provide`](Self::provide), but additionally runs the built
    /// instance's [`MemberInject::inject_members`] before it is cached or
    /// handed out.
    #[must_use]
    pub fn provide_with_members<Inst, Deps>(self, instantiator: Inst, lifetime: Lifetime) -> Self
    where
        Inst: Instantiator<Deps, Error = InstantiateErrorKind> + Send + Sync,
        Inst::Provides: MemberInject + Send + Sync,
        Deps: DependencyResolver<Error = ResolveErrorKind>,
    {
        let mut constructor_dependencies = Vec::new();
        Deps::collect_dependencies(&mut constructor_dependencies);
        let mut member_dependencies = Vec::new();
        <Inst::Provides as MemberInject>::member_dependencies(&mut member_dependencies);

        self.insert::<Inst::Provides>(
            None,
            lifetime,
            boxed_injecting_instantiator(instantiator),
            constructor_dependencies,
            member_dependencies,
        )
    }

    /// Registers an open generic family. Closings are created on first
    /// [`Container::get_generic`](crate::Container::get_generic) and share
    /// `lifetime`.
    #[must_use]
    pub fn provide_open<F: OpenGeneric>(mut self, lifetime: Lifetime) -> Self {
        self.open_generics.insert(TypeId::of::<F>(), lifetime);
        self
    }

    /// Attaches a cleanup hook to every registration of `Dep`. Rejected at
    /// [`build`](Self::build) if `Dep` is registered as transient, since
    /// the container does not hold transients and could only leak the
    /// tracked instances.
    #[must_use]
    pub fn add_finalizer<Dep, F>(mut self, finalizer: F) -> Self
    where
        Dep: Send + Sync + 'static,
        F: Finalizer<Dep> + Send + Sync,
    {
        self.finalizers.insert(TypeId::of::<Dep>(), boxed_finalizer(finalizer));
        self
    }

    #[must_use]
    pub fn with_validation(mut self, mode: ValidationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Suppresses captive-dependency reports for the edge from `Consumer`
    /// to `Dep`.
    #[must_use]
    pub fn allow_captive<Consumer: 'static, Dep: 'static>(mut self) -> Self {
        self.ignored_pairs.insert((TypeId::of::<Consumer>(), TypeId::of::<Dep>()));
        self
    }

    /// Suppresses captive-dependency reports for any edge where `T` is
    /// the consumer or the dependency.
    #[must_use]
    pub fn allow_captive_for<T: 'static>(mut self) -> Self {
        self.ignored_types.insert(TypeId::of::<T>());
        self
    }

    fn insert<Provides: 'static>(
        mut self,
        name: Option<&'static str>,
        lifetime: Lifetime,
        instantiator: BoxedCloneInstantiator,
        constructor_dependencies: Vec<TypeInfo>,
        member_dependencies: Vec<TypeInfo>,
    ) -> Self {
        let service = TypeInfo::of::<Provides>();
        let key = ServiceKey { type_id: service.id, name };
        self.entries.insert(key, Entry {
            service,
            name,
            lifetime,
            instantiator,
            constructor_dependencies,
            member_dependencies,
        });
        self
    }

    /// Publishes metadata, rejects cyclic graphs and transient finalizers,
    /// and freezes the registrations into a root [`Container`].
    pub fn build(self) -> Result<Container, BuildErrorKind> {
        let mut registrations = Vec::with_capacity(self.entries.len());
        for (key, entry) in self.entries {
            let finalizer = self.finalizers.get(&key.type_id).cloned();
            if finalizer.is_some() && entry.lifetime == Lifetime::Transient {
                return Err(BuildErrorKind::TransientFinalizer { service: entry.service });
            }

            let metadata = metadata::publish(TypeMetadata {
                type_info: entry.service,
                constructor_dependencies: entry.constructor_dependencies.into_boxed_slice(),
                member_dependencies: entry.member_dependencies.into_boxed_slice(),
            });

            registrations.push((key, Arc::new(Registration {
                service: entry.service,
                name: entry.name,
                lifetime: entry.lifetime,
                instantiator: entry.instantiator,
                finalizer,
                metadata,
                creation_lock: Mutex::new(()),
            })));
        }

        DependencyGraph::from_metadata(
            registrations.iter().map(|(_, registration)| &*registration.metadata),
        )
        .detect_cycles()?;

        debug!(registrations = registrations.len(), "Registry built");

        Ok(Container::new(Arc::new(Registry {
            lookup: TypeKeyedMap::build(registrations),
            open_generics: self.open_generics,
            closed: Mutex::new(BTreeMap::new()),
            validator: LifetimeValidator::new(self.mode, self.ignored_pairs, self.ignored_types),
        })))
    }
}

/// Immutable registration store shared by the root container and all of
/// its scopes. Only the lazily closed generics live behind a lock.
pub(crate) struct Registry {
    lookup: TypeKeyedMap<Arc<Registration>>,
    open_generics: BTreeMap<TypeId, Lifetime>,
    closed: Mutex<BTreeMap<ServiceKey, Arc<Registration>>>,
    pub(crate) validator: LifetimeValidator,
}

impl Registry {
    #[must_use]
    pub(crate) fn get(&self, key: &ServiceKey) -> Option<Arc<Registration>> {
        if let Some(registration) = self.lookup.get(key) {
            return Some(Arc::clone(registration));
        }
        self.closed.lock().get(key).cloned()
    }

    /// Returns the registration for `F::Closed<A>`, creating and memoizing
    /// it on first request. Every later request for the same closing, from
    /// any thread, gets the same registration.
    pub(crate) fn close_generic<F, A>(&self) -> Result<Arc<Registration>, ResolveErrorKind>
    where
        F: OpenGeneric,
        A: Send + Sync + 'static,
    {
        let service = TypeInfo::of::<F::Closed<A>>();
        let Some(lifetime) = self.open_generics.get(&TypeId::of::<F>()).copied() else {
            return Err(ResolveErrorKind::NoRegistration { service, name: None });
        };

        let key = ServiceKey { type_id: service.id, name: None };
        let registration = Arc::clone(self.closed.lock().entry(key).or_insert_with(|| {
            debug!(family = TypeInfo::of::<F>().name, closing = service.name, "Closed generic");
            Arc::new(Registration {
                service,
                name: None,
                lifetime,
                instantiator: closed_instantiator::<F, A>(),
                finalizer: None,
                metadata: metadata::publish(TypeMetadata {
                    type_info: service,
                    constructor_dependencies: alloc::boxed::Box::from([]),
                    member_dependencies: alloc::boxed::Box::from([]),
                }),
                creation_lock: Mutex::new(()),
            })
        }));
        Ok(registration)
    }
}
