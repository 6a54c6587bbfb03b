use crate::error::{SurgeError, SurgeResult};
use crate::traits::Scalar;

/// Append-only sequence of snapshots; index `i` belongs to temporal sample `i`.
///
/// Only the owning solver can append. Consumers get shared slices, so a
/// snapshot never changes once it has been written.
#[derive(Debug, Clone, PartialEq)]
pub struct SolutionArchive<T> {
    points: usize,
    snapshots: Vec<Vec<T>>,
}

impl<T: Scalar> SolutionArchive<T> {
    pub(crate) fn new(initial: Vec<T>, capacity: usize) -> SurgeResult<Self> {
        let mut snapshots = Vec::new();
        snapshots
            .try_reserve_exact(capacity.max(1))
            .map_err(|_| SurgeError::grid("Snapshot count is too large."))?;
        let points = initial.len();
        snapshots.push(initial);
        Ok(Self { points, snapshots })
    }

    pub(crate) fn push(&mut self, snapshot: Vec<T>) {
        debug_assert_eq!(snapshot.len(), self.points);
        self.snapshots.push(snapshot);
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Never true: the initial condition is archived on construction.
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Samples per snapshot.
    pub fn points(&self) -> usize {
        self.points
    }

    pub fn get(&self, index: usize) -> Option<&[T]> {
        self.snapshots.get(index).map(Vec::as_slice)
    }

    pub fn initial(&self) -> &[T] {
        &self.snapshots[0]
    }

    pub fn latest(&self) -> &[T] {
        &self.snapshots[self.snapshots.len() - 1]
    }

    pub fn iter(&self) -> impl Iterator<Item = &[T]> + '_ {
        self.snapshots.iter().map(Vec::as_slice)
    }
}
