use core::{
    any::{type_name, TypeId},
    cmp::Ordering,
};

#[derive(Debug, Clone, Copy)]
pub struct TypeInfo {
    pub name: &'static str,
    pub id: TypeId,
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl PartialOrd for TypeInfo {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeInfo {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl TypeInfo {
    #[inline]
    #[must_use]
    pub fn of<T>() -> Self
    where
        T: ?Sized + 'static,
    {
        Self {
            name: type_name::<T>(),
            id: TypeId::of::<T>(),
        }
    }

    #[inline]
    #[must_use]
    pub(crate) fn short_name(&self) -> &'static str {
        self.name.rsplit_once("::").map_or(self.name, |(_, name)| name)
    }
}

#[cfg(test)]
mod tests {
    use super::TypeInfo;

    struct Service;

    #[test]
    fn test_short_name() {
        assert_eq!(TypeInfo::of::<Service>().short_name(), "Service");
        assert_eq!(TypeInfo::of::<u8>().short_name(), "u8");
    }

    #[test]
    fn test_eq_by_id_only() {
        assert_eq!(TypeInfo::of::<Service>(), TypeInfo::of::<Service>());
        assert_ne!(TypeInfo::of::<Service>(), TypeInfo::of::<u8>());
    }
}
