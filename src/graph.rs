use alloc::{
    collections::{BTreeMap, BTreeSet},
    vec::Vec,
};
use core::any::TypeId;

use crate::{any::TypeInfo, errors::BuildErrorKind, metadata::TypeMetadata};

/// Static dependency graph built from the registrations' metadata.
///
/// Edges follow constructor and member dependencies; a dependency with no
/// registration of its own (a primitive, an externally supplied value) has
/// no node and is never traversed.
pub(crate) struct DependencyGraph {
    adjacency: BTreeMap<TypeId, (TypeInfo, Vec<TypeInfo>)>,
}

impl DependencyGraph {
    #[must_use]
    pub(crate) fn from_metadata<'a>(entries: impl Iterator<Item = &'a TypeMetadata>) -> Self {
        let mut adjacency = BTreeMap::new();
        for metadata in entries {
            let dependencies = metadata
                .constructor_dependencies
                .iter()
                .chain(metadata.member_dependencies.iter())
                .copied()
                .collect();
            adjacency.insert(metadata.type_info.id, (metadata.type_info, dependencies));
        }
        Self { adjacency }
    }

    /// Runs a depth-first search from every node, failing on the first
    /// cycle found. The reported cycle is a closed walk: it starts and ends
    /// with the repeated type.
    pub(crate) fn detect_cycles(&self) -> Result<(), BuildErrorKind> {
        let mut visited = BTreeSet::new();

        for id in self.adjacency.keys() {
            if visited.contains(id) {
                continue;
            }

            let mut stack = Vec::new();
            if let Some(repeat) = self.visit(*id, &mut visited, &mut stack) {
                let start = stack.iter().position(|info: &TypeInfo| info.id == repeat).unwrap_or(0);
                let mut cycle: Vec<TypeInfo> = stack[start..].to_vec();
                if let Some(first) = cycle.first().copied() {
                    cycle.push(first);
                }
                return Err(BuildErrorKind::CyclicDependency {
                    cycle: cycle.into_boxed_slice(),
                });
            }
        }

        Ok(())
    }

    /// Returns the id of the first type found twice on the current path.
    fn visit(&self, id: TypeId, visited: &mut BTreeSet<TypeId>, stack: &mut Vec<TypeInfo>) -> Option<TypeId> {
        let Some((info, dependencies)) = self.adjacency.get(&id) else {
            return None;
        };

        if stack.iter().any(|on_path| on_path.id == id) {
            return Some(id);
        }
        if visited.contains(&id) {
            return None;
        }

        stack.push(*info);
        for dependency in dependencies {
            if let Some(repeat) = self.visit(dependency.id, visited, stack) {
                return Some(repeat);
            }
        }
        stack.pop();

        visited.insert(id);
        None
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::DependencyGraph;
    use crate::{any::TypeInfo, errors::BuildErrorKind, metadata::TypeMetadata};

    struct A;
    struct B;
    struct C;

    fn metadata<T: 'static>(constructor: &[TypeInfo], members: &[TypeInfo]) -> TypeMetadata {
        TypeMetadata {
            type_info: TypeInfo::of::<T>(),
            constructor_dependencies: constructor.into(),
            member_dependencies: members.into(),
        }
    }

    #[test]
    fn test_acyclic_chain_passes() {
        let entries = [
            metadata::<A>(&[TypeInfo::of::<B>()], &[]),
            metadata::<B>(&[TypeInfo::of::<C>()], &[]),
            metadata::<C>(&[], &[]),
        ];
        let graph = DependencyGraph::from_metadata(entries.iter());
        assert!(graph.detect_cycles().is_ok());
    }

    #[test]
    fn test_diamond_is_not_a_cycle() {
        let entries = [
            metadata::<A>(&[TypeInfo::of::<B>(), TypeInfo::of::<C>()], &[]),
            metadata::<B>(&[TypeInfo::of::<C>()], &[]),
            metadata::<C>(&[], &[]),
        ];
        let graph = DependencyGraph::from_metadata(entries.iter());
        assert!(graph.detect_cycles().is_ok());
    }

    #[test]
    fn test_unregistered_dependency_ignored() {
        let entries = [metadata::<A>(&[TypeInfo::of::<u32>()], &[])];
        let graph = DependencyGraph::from_metadata(entries.iter());
        assert!(graph.detect_cycles().is_ok());
    }

    #[test]
    fn test_cycle_reported_as_closed_walk() {
        let entries = [
            metadata::<A>(&[TypeInfo::of::<B>()], &[]),
            metadata::<B>(&[], &[TypeInfo::of::<C>()]),
            metadata::<C>(&[TypeInfo::of::<A>()], &[]),
        ];
        let graph = DependencyGraph::from_metadata(entries.iter());

        let BuildErrorKind::CyclicDependency { cycle } = graph.detect_cycles().unwrap_err() else {
            panic!("expected a cycle");
        };
        assert_eq!(cycle.first(), cycle.last());
        let ids: Vec<_> = cycle.iter().map(|info| info.id).collect();
        assert!(ids.contains(&TypeInfo::of::<A>().id));
        assert!(ids.contains(&TypeInfo::of::<B>().id));
        assert!(ids.contains(&TypeInfo::of::<C>().id));
    }

    #[test]
    fn test_self_cycle() {
        let entries = [metadata::<A>(&[TypeInfo::of::<A>()], &[])];
        let graph = DependencyGraph::from_metadata(entries.iter());
        assert!(matches!(
            graph.detect_cycles(),
            Err(BuildErrorKind::CyclicDependency { cycle }) if cycle.len() == 2
        ));
    }
}
