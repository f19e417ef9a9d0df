use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use super::domain::{Location, LocationId};

/// Declarative restriction on which locations the return may be sent to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LocationFilter {
    /// Location equals one of the roots or sits anywhere beneath one of them.
    ChildOf { roots: BTreeSet<LocationId> },
    /// Location is the source picking's own location, or flagged as a return location.
    SourceOrReturn { source: LocationId },
}

impl LocationFilter {
    pub fn child_of<I>(roots: I) -> Self
    where
        I: IntoIterator<Item = LocationId>,
    {
        Self::ChildOf {
            roots: roots.into_iter().collect(),
        }
    }

    pub fn accepts(&self, location: &Location, tree: &LocationTree) -> bool {
        match self {
            Self::ChildOf { roots } => tree
                .ancestry(location.id)
                .any(|ancestor| roots.contains(&ancestor)),
            Self::SourceOrReturn { source } => location.id == *source || location.return_location,
        }
    }

    /// Narrow a location listing down to what the filter allows.
    pub fn select<'a>(&self, tree: &'a LocationTree) -> Vec<&'a Location> {
        let mut selected: Vec<&Location> = tree
            .iter()
            .filter(|location| self.accepts(location, tree))
            .collect();
        selected.sort_by_key(|location| location.id);
        selected
    }
}

/// Parent-linked view over the location hierarchy.
#[derive(Debug, Clone, Default)]
pub struct LocationTree {
    nodes: HashMap<LocationId, Location>,
}

impl LocationTree {
    pub fn new<I>(locations: I) -> Self
    where
        I: IntoIterator<Item = Location>,
    {
        Self {
            nodes: locations
                .into_iter()
                .map(|location| (location.id, location))
                .collect(),
        }
    }

    pub fn get(&self, id: LocationId) -> Option<&Location> {
        self.nodes.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Location> {
        self.nodes.values()
    }

    /// Yields `id` followed by each parent up to the root. Stops on cycles.
    pub fn ancestry(&self, id: LocationId) -> impl Iterator<Item = LocationId> + '_ {
        let mut seen = BTreeSet::new();
        let mut next = Some(id);
        std::iter::from_fn(move || {
            let current = next.take()?;
            if !seen.insert(current) {
                return None;
            }
            next = self.nodes.get(&current).and_then(|node| node.parent_id);
            Some(current)
        })
    }

    pub fn is_child_of(&self, id: LocationId, root: LocationId) -> bool {
        self.ancestry(id).any(|ancestor| ancestor == root)
    }
}
