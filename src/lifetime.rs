/// Policy governing how many instances of a service exist and how long they live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Lifetime {
    /// One instance per root container, cached until the root closes.
    Singleton,
    /// One instance per scope, cached until the owning scope closes.
    Scoped,
    /// A fresh instance per request, never cached.
    Transient,
}

impl Lifetime {
    #[inline]
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Lifetime::Singleton => "singleton",
            Lifetime::Scoped => "scoped",
            Lifetime::Transient => "transient",
        }
    }

    /// Captivity rank: a longer-lived consumer holding a shorter-lived
    /// dependency is the captive-dependency condition, checked in
    /// [`crate::validation`].
    #[inline]
    #[must_use]
    pub(crate) fn captivity_rank(self) -> u8 {
        self as u8
    }
}

#[cfg(test)]
mod tests {
    use super::Lifetime::{Scoped, Singleton, Transient};

    #[test]
    fn test_rank_ordering() {
        assert!(Singleton.captivity_rank() < Scoped.captivity_rank());
        assert!(Scoped.captivity_rank() < Transient.captivity_rank());
    }
}
