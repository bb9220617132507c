//! Error types for the gravity simulation.
//!
//! Every variant is a caller contract violation: it is detected at the point
//! of the violating call and aborts only that operation. There are no
//! transient conditions here and no retry path.

use std::fmt;

/// Errors raised by particle construction, octree maintenance, and the
/// simulation entry points.
#[derive(Debug, Clone, PartialEq)]
pub enum GravityError {
    /// A particle was constructed with a mass that is not strictly positive.
    NonPositiveMass(f64),
    /// An octree was built from an empty particle set.
    EmptyParticleSet,
    /// An octant index outside `0..8` was passed to `Domain::octant_domain`.
    InvalidOctant(usize),
    /// A particle was added to a node whose domain does not contain it.
    OutsideDomain,
    /// A particle was added to a node that already holds it.
    AlreadyHeld,
    /// A particle was removed from (or looked up in) a node that does not
    /// hold it.
    NotHeld,
    /// A rebalance was entered with an ancestor path whose top entry is not
    /// the node being visited.
    InconsistentPath,
    /// A non-positive particle or timestep count was passed to the
    /// simulation.
    InvalidCount(usize),
}

impl fmt::Display for GravityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GravityError::NonPositiveMass(m) => {
                write!(f, "Particle mass must be positive, got {}", m)
            }
            GravityError::EmptyParticleSet => {
                write!(f, "Octree must contain at least one particle")
            }
            GravityError::InvalidOctant(i) => {
                write!(f, "Octant index must be in 0..8, got {}", i)
            }
            GravityError::OutsideDomain => {
                write!(f, "Particle position is not in the node's domain")
            }
            GravityError::AlreadyHeld => write!(f, "Particle is already held by the node"),
            GravityError::NotHeld => write!(f, "Particle is not held by the node"),
            GravityError::InconsistentPath => {
                write!(f, "Ancestor path does not end at the visited node")
            }
            GravityError::InvalidCount(n) => {
                write!(f, "Count must be positive, got {}", n)
            }
        }
    }
}

impl std::error::Error for GravityError {}
