use alloc::{sync::Arc, vec::Vec};
use core::any::Any;
use parking_lot::Mutex;
use tracing::{debug, error, info_span};

use crate::{
    any::TypeInfo,
    cache::CachePartition,
    context::{ConsumerInfo, ResolveContext},
    disposal::DisposalTracker,
    errors::{DisposalError, InstantiatorErrorKind, ResolveErrorKind},
    generic::OpenGeneric,
    lifetime::Lifetime,
    lookup::ServiceKey,
    member::MemberInject,
    registry::{Registration, Registry},
    validation::{ValidationMode, Violation, ViolationLevel},
};

struct ContainerInner {
    registry: Arc<Registry>,
    cache: Mutex<CachePartition>,
    disposal: Mutex<DisposalTracker>,
    /// Captive-dependency reports for the whole tree live at the root.
    violations: Mutex<Vec<Violation>>,
    parent: Option<Container>,
}

/// Resolves services from the registrations frozen by
/// [`RegistryBuilder::build`](crate::RegistryBuilder::build).
///
/// Cloning is cheap and shares state. The root container caches
/// singletons; each [`scope`](Self::scope) caches its own scoped
/// instances and disposes them when closed or dropped.
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

impl core::fmt::Debug for Container {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Container").finish_non_exhaustive()
    }
}

impl Container {
    #[must_use]
    pub(crate) fn new(registry: Arc<Registry>) -> Self {
        Self {
            inner: Arc::new(ContainerInner {
                registry,
                cache: Mutex::new(CachePartition::default()),
                disposal: Mutex::new(DisposalTracker::default()),
                violations: Mutex::new(Vec::new()),
                parent: None,
            }),
        }
    }

    /// Opens a child scope with its own scoped-instance partition.
    /// Singletons keep resolving through the root.
    #[must_use]
    pub fn scope(&self) -> Self {
        Self {
            inner: Arc::new(ContainerInner {
                registry: Arc::clone(&self.inner.registry),
                cache: Mutex::new(CachePartition::default()),
                disposal: Mutex::new(DisposalTracker::default()),
                violations: Mutex::new(Vec::new()),
                parent: Some(self.clone()),
            }),
        }
    }

    fn root(&self) -> Self {
        let mut current = self.clone();
        while let Some(parent) = current.inner.parent.clone() {
            current = parent;
        }
        current
    }

    pub fn get<Dep: Send + Sync + 'static>(&self) -> Result<Arc<Dep>, ResolveErrorKind> {
        self.get_with_consumer(None, None, &[])
    }

    pub fn get_named<Dep: Send + Sync + 'static>(
        &self,
        name: &'static str,
    ) -> Result<Arc<Dep>, ResolveErrorKind> {
        self.get_with_consumer(Some(name), None, &[])
    }

    pub(crate) fn get_with_consumer<Dep: Send + Sync + 'static>(
        &self,
        name: Option<&'static str>,
        consumer: Option<&ConsumerInfo>,
        path: &[ServiceKey],
    ) -> Result<Arc<Dep>, ResolveErrorKind> {
        let span = info_span!("resolve", service = core::any::type_name::<Dep>());
        let _enter = span.enter();

        let key = ServiceKey::of::<Dep>(name);
        let Some(registration) = self.inner.registry.get(&key) else {
            let err = ResolveErrorKind::NoRegistration {
                service: TypeInfo::of::<Dep>(),
                name,
            };
            error!("{err}");
            return Err(err);
        };

        self.resolve_registration(&registration, key, consumer, path)
    }

    /// Resolves the closing of the open generic family `F` at argument
    /// `A`, creating the closed registration on first request.
    pub fn get_generic<F, A>(&self) -> Result<Arc<F::Closed<A>>, ResolveErrorKind>
    where
        F: OpenGeneric,
        A: Send + Sync + 'static,
    {
        self.get_generic_with_consumer::<F, A>(None, &[])
    }

    pub(crate) fn get_generic_with_consumer<F, A>(
        &self,
        consumer: Option<&ConsumerInfo>,
        path: &[ServiceKey],
    ) -> Result<Arc<F::Closed<A>>, ResolveErrorKind>
    where
        F: OpenGeneric,
        A: Send + Sync + 'static,
    {
        let span = info_span!("resolve", service = core::any::type_name::<F::Closed<A>>());
        let _enter = span.enter();

        let registration = self.inner.registry.close_generic::<F, A>()?;
        let key = registration.key();
        self.resolve_registration(&registration, key, consumer, path)
    }

    fn resolve_registration<Dep: Send + Sync + 'static>(
        &self,
        registration: &Arc<Registration>,
        key: ServiceKey,
        consumer: Option<&ConsumerInfo>,
        path: &[ServiceKey],
    ) -> Result<Arc<Dep>, ResolveErrorKind> {
        // Registered constructor cycles are rejected at build time; this
        // catches cycles closed generics introduce at resolve time, which
        // would otherwise self-deadlock on the creation lock.
        if path.contains(&key) {
            let err = ResolveErrorKind::CyclicResolution {
                service: registration.service,
            };
            error!("{err}");
            return Err(err);
        }

        if let Some(consumer) = consumer {
            if let Some(violation) =
                self.inner
                    .registry
                    .validator
                    .check(consumer, registration.service, registration.lifetime)
            {
                let root = self.root();
                root.inner.violations.lock().push(violation);
                if self.inner.registry.validator.mode() == ValidationMode::Strict
                    && violation.level == ViolationLevel::Error
                {
                    let err = ResolveErrorKind::CaptiveDependency {
                        consumer: violation.consumer,
                        consumer_lifetime: violation.consumer_lifetime,
                        dependency: violation.dependency,
                        dependency_lifetime: violation.dependency_lifetime,
                    };
                    error!("{err}");
                    return Err(err);
                }
            }
        }

        match registration.lifetime {
            Lifetime::Transient => {
                let (instance, _) = self.instantiate::<Dep>(self, registration, path)?;
                Ok(instance)
            }
            Lifetime::Singleton => {
                let owner = self.root();
                self.resolve_cached(&owner, registration, key, path)
            }
            Lifetime::Scoped => self.resolve_cached(self, registration, key, path),
        }
    }

    /// Singleton and scoped resolution: check the owner's cache, then take
    /// the registration's creation lock and check again, so concurrent
    /// first resolutions produce exactly one instance. The cache mutex is
    /// never held while the instantiator runs.
    fn resolve_cached<Dep: Send + Sync + 'static>(
        &self,
        owner: &Self,
        registration: &Arc<Registration>,
        key: ServiceKey,
        path: &[ServiceKey],
    ) -> Result<Arc<Dep>, ResolveErrorKind> {
        if let Some(hit) = owner.inner.cache.lock().get::<Dep>(&key) {
            debug!("Cache hit");
            return Ok(hit);
        }

        let _creation = registration.creation_lock.lock();
        if let Some(hit) = owner.inner.cache.lock().get::<Dep>(&key) {
            debug!("Cache hit after wait");
            return Ok(hit);
        }
        debug!("Cache miss");

        let (instance, untyped) = self.instantiate::<Dep>(owner, registration, path)?;
        owner.inner.cache.lock().insert(key, Arc::clone(&untyped));
        if let Some(finalizer) = &registration.finalizer {
            owner.inner.disposal.lock().track(
                key,
                registration.service,
                registration.lifetime,
                untyped,
                finalizer.clone(),
            );
        }
        Ok(instance)
    }

    #[allow(clippy::type_complexity)]
    fn instantiate<Dep: Send + Sync + 'static>(
        &self,
        owner: &Self,
        registration: &Arc<Registration>,
        path: &[ServiceKey],
    ) -> Result<(Arc<Dep>, Arc<dyn Any + Send + Sync>), ResolveErrorKind> {
        let mut chain = path.to_vec();
        chain.push(registration.key());
        let cx = ResolveContext {
            container: owner.clone(),
            consumer: Some(ConsumerInfo {
                type_info: registration.service,
                lifetime: registration.lifetime,
            }),
            path: chain,
        };

        let boxed = registration
            .instantiator
            .clone()
            .call(&cx)
            .map_err(|err| match err {
                InstantiatorErrorKind::Deps(err) => {
                    ResolveErrorKind::Instantiator(InstantiatorErrorKind::Deps(alloc::boxed::Box::new(err)))
                }
                InstantiatorErrorKind::Factory(err) => {
                    ResolveErrorKind::Instantiator(InstantiatorErrorKind::Factory(err))
                }
            })?;

        let actual = (*boxed).type_id();
        let Ok(typed) = boxed.downcast::<Dep>() else {
            let err = ResolveErrorKind::IncorrectType {
                expected: TypeInfo::of::<Dep>(),
                actual,
            };
            error!("{err}");
            return Err(err);
        };
        let instance = Arc::new(*typed);
        let untyped: Arc<dyn Any + Send + Sync> = Arc::clone(&instance) as _;
        Ok((instance, untyped))
    }

    /// Runs the target's member injectors against this container.
    pub fn inject_members<T: MemberInject>(&self, target: &mut T) -> Result<(), ResolveErrorKind> {
        let cx = ResolveContext {
            container: self.clone(),
            consumer: None,
            path: Vec::new(),
        };
        target.inject_members(&cx)
    }

    /// Drops this container's cached instances and runs their finalizers
    /// newest-first. Closing the root disposes singletons; closing a scope
    /// disposes that scope's instances. Idempotent.
    pub fn close(&self) {
        self.inner.cache.lock().clear();
        self.inner.disposal.lock().dispose_all();
    }

    /// Disposes only instances of `lifetime`: singletons from the root's
    /// partition, scoped instances from this container's.
    pub fn dispose_by_lifetime(&self, lifetime: Lifetime) {
        let owner = match lifetime {
            Lifetime::Singleton => self.root(),
            Lifetime::Scoped | Lifetime::Transient => self.clone(),
        };
        let keys = owner.inner.disposal.lock().dispose_by_lifetime(lifetime);
        let mut cache = owner.inner.cache.lock();
        for key in &keys {
            cache.remove(key);
        }
    }

    /// Captive-dependency violations observed anywhere in this container
    /// tree so far.
    #[must_use]
    pub fn lifetime_violations(&self) -> Vec<Violation> {
        self.root().inner.violations.lock().clone()
    }

    /// Drains finalizer failures collected by this container's disposal
    /// sweeps.
    #[must_use]
    pub fn take_disposal_errors(&self) -> Vec<DisposalError> {
        self.inner.disposal.lock().take_errors()
    }
}

impl Drop for ContainerInner {
    fn drop(&mut self) {
        self.cache.lock().clear();
        self.disposal.lock().dispose_all();
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::{
        format,
        string::{String, ToString},
        sync::Arc,
    };
    use tracing_test::traced_test;

    use crate::{Inject, Lifetime, RegistryBuilder, ResolveErrorKind};

    struct Database;
    struct Repository {
        _db: Arc<Database>,
    }

    #[traced_test]
    #[test]
    fn test_singleton_instantiated_once() {
        let container = RegistryBuilder::new()
            .provide(|| Ok(Database), Lifetime::Singleton)
            .build()
            .unwrap();

        let first = container.get::<Database>().unwrap();
        assert!(logs_contain("Cache miss"));

        let second = container.get::<Database>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(logs_contain("Cache hit"));
    }

    #[traced_test]
    #[test]
    fn test_missing_registration_is_logged() {
        let container = RegistryBuilder::new().build().unwrap();

        assert!(matches!(
            container.get::<Database>(),
            Err(ResolveErrorKind::NoRegistration { .. })
        ));
        assert!(logs_contain("Registration not found"));
    }

    #[test]
    fn test_dependencies_resolve_through_the_same_container() {
        let container = RegistryBuilder::new()
            .provide(|| Ok(Database), Lifetime::Singleton)
            .provide(|Inject(db): Inject<Database>| Ok(Repository { _db: db }), Lifetime::Transient)
            .build()
            .unwrap();

        let repository = container.get::<Repository>().unwrap();
        let database = container.get::<Database>().unwrap();
        assert!(Arc::ptr_eq(&repository._db, &database));
    }
}
