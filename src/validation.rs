use alloc::collections::BTreeSet;
use core::any::TypeId;
use tracing::warn;

use crate::{any::TypeInfo, context::ConsumerInfo, lifetime::Lifetime};

/// How the container reacts to a longer-lived service depending on a
/// shorter-lived one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    Disabled,
    /// Record and log violations, but let every resolution complete.
    #[default]
    WarnOnly,
    /// Fail resolutions whose violation is [`ViolationLevel::Error`].
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ViolationLevel {
    Warning,
    Error,
}

/// One captive dependency observed while resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Violation {
    pub consumer: TypeInfo,
    pub consumer_lifetime: Lifetime,
    pub dependency: TypeInfo,
    pub dependency_lifetime: Lifetime,
    pub level: ViolationLevel,
}

/// Checks every traversed dependency edge for lifetime captivity.
///
/// A singleton holding a scoped service pins one scope's state for the
/// process lifetime, which is an error. Holding a transient merely freezes
/// a value meant to be fresh, which is a warning, as is a scoped service
/// holding a transient.
pub(crate) struct LifetimeValidator {
    mode: ValidationMode,
    ignored_pairs: BTreeSet<(TypeId, TypeId)>,
    ignored_types: BTreeSet<TypeId>,
}

impl LifetimeValidator {
    #[must_use]
    pub(crate) fn new(
        mode: ValidationMode,
        ignored_pairs: BTreeSet<(TypeId, TypeId)>,
        ignored_types: BTreeSet<TypeId>,
    ) -> Self {
        Self {
            mode,
            ignored_pairs,
            ignored_types,
        }
    }

    #[must_use]
    pub(crate) const fn mode(&self) -> ValidationMode {
        self.mode
    }

    fn classify(consumer: Lifetime, dependency: Lifetime) -> Option<ViolationLevel> {
        if dependency.captivity_rank() <= consumer.captivity_rank() {
            return None;
        }
        // A pinned scope leaks state across requests; a pinned transient
        // merely freezes a value meant to be fresh.
        if consumer == Lifetime::Singleton && dependency == Lifetime::Scoped {
            Some(ViolationLevel::Error)
        } else {
            Some(ViolationLevel::Warning)
        }
    }

    /// Returns the violation for the edge `consumer -> dependency`, if the
    /// edge is captive and not suppressed. Violations are logged here
    /// unless Strict is about to abort the resolution, which the caller
    /// reports itself.
    pub(crate) fn check(
        &self,
        consumer: &ConsumerInfo,
        dependency: TypeInfo,
        dependency_lifetime: Lifetime,
    ) -> Option<Violation> {
        if self.mode == ValidationMode::Disabled {
            return None;
        }
        let level = Self::classify(consumer.lifetime, dependency_lifetime)?;

        if self.ignored_types.contains(&dependency.id)
            || self.ignored_types.contains(&consumer.type_info.id)
            || self
                .ignored_pairs
                .contains(&(consumer.type_info.id, dependency.id))
        {
            return None;
        }

        let violation = Violation {
            consumer: consumer.type_info,
            consumer_lifetime: consumer.lifetime,
            dependency,
            dependency_lifetime,
            level,
        };
        if level == ViolationLevel::Warning || self.mode == ValidationMode::WarnOnly {
            warn!(
                consumer = consumer.type_info.name,
                dependency = dependency.name,
                "Captive dependency: {} {} holds {} {}",
                consumer.lifetime.name(),
                consumer.type_info.short_name(),
                dependency_lifetime.name(),
                dependency.short_name(),
            );
        }
        Some(violation)
    }
}
