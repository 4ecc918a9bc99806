use crate::{any::TypeInfo, lifetime::Lifetime};

/// A failure captured while finalizing one tracked instance.
///
/// Disposal failures are never propagated synchronously: they are recorded
/// and the remaining instances still get released.
#[derive(thiserror::Error, Debug)]
#[error("Finalizer for {} ({}) failed: {source}", type_info.name, lifetime.name())]
pub struct DisposalError {
    pub type_info: TypeInfo,
    pub lifetime: Lifetime,
    #[source]
    pub source: anyhow::Error,
}
