//! Arena-based octree over the live particle set.
//!
//! Nodes are stored contiguously in a `Vec` and reference each other by
//! [`NodeId`] rather than owned pointers, so collapsing and re-inserting
//! subtrees during rebalancing is index reassignment instead of pointer
//! surgery. The tree does not own particles: every node keeps a set of
//! [`ParticleId`]s into the caller's [`ParticleSet`], and a particle's id
//! appears in the set of every node on the path from the root down to the
//! leaf that holds it.
//!
//! A node is a leaf iff it holds exactly one particle and has no children.
//! Internal nodes hold two or more particles transitively and carry children
//! only for non-empty octants. Each node caches the total mass and
//! mass-weighted center of mass of everything beneath it.
//!
//! The tree is built once and then kept consistent across timesteps through
//! [`Octree::rebalance`] rather than rebuilt, unless the caller chooses to
//! discard and reconstruct.

use std::collections::HashSet;

use smallvec::SmallVec;

use crate::domain::Domain;
use crate::error::GravityError;
use crate::particle::{ParticleId, ParticleSet, Vec3};

/// Index into the node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeId(u32);

impl NodeId {
    fn new(index: usize) -> Self {
        debug_assert!(index < u32::MAX as usize, "NodeId overflow");
        NodeId(index as u32)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// A node in the arena. Fields are crate-visible for the test modules.
#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) center_of_mass: Vec3,
    pub(crate) mass: f64,
    pub(crate) domain: Domain,
    pub(crate) particles: HashSet<ParticleId>,
    pub(crate) children: SmallVec<[NodeId; 8]>,
}

/// Octree spatial index with cached per-node mass aggregates.
#[derive(Debug, Clone)]
pub struct Octree {
    nodes: Vec<Option<Node>>,
    free: Vec<NodeId>,
    root: NodeId,
}

impl Octree {
    /// Builds an octree over the given particles and domain.
    ///
    /// Fails with [`GravityError::EmptyParticleSet`] before any allocation if
    /// the set is empty.
    ///
    /// Particle positions must be pairwise distinct: two particles at exactly
    /// the same position fall into the same octant at every depth and
    /// subdivision never terminates. The simulation upholds this by merging
    /// overlapping particles before it builds or rebuilds the tree.
    pub fn build(particles: &ParticleSet, domain: Domain) -> Result<Self, GravityError> {
        if particles.is_empty() {
            return Err(GravityError::EmptyParticleSet);
        }
        let mut tree = Octree {
            nodes: Vec::with_capacity(particles.len() * 2),
            free: Vec::new(),
            root: NodeId::new(0),
        };
        tree.root = tree.build_node(particles, particles.ids(), domain)?;
        Ok(tree)
    }

    /// Total mass held by the tree.
    pub fn mass(&self) -> f64 {
        self.node(self.root).mass
    }

    /// Mass-weighted center of mass of the whole tree.
    pub fn center_of_mass(&self) -> Vec3 {
        self.node(self.root).center_of_mass
    }

    /// Domain covered by the root node.
    pub fn domain(&self) -> Domain {
        self.node(self.root).domain
    }

    /// Number of particles currently indexed.
    pub fn len(&self) -> usize {
        self.node(self.root).particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the tree currently indexes the given particle.
    pub fn contains(&self, id: ParticleId) -> bool {
        self.node(self.root).particles.contains(&id)
    }

    /// Number of live nodes in the arena.
    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    /// Inserts a particle at the root.
    ///
    /// Fails if the particle's position is outside the root domain or the
    /// tree already holds it; both checks happen before any mutation.
    pub fn add_particle(
        &mut self,
        particles: &ParticleSet,
        id: ParticleId,
    ) -> Result<(), GravityError> {
        self.add_to_node(self.root, particles, id)
    }

    /// Removes a particle from the tree.
    ///
    /// Fails with [`GravityError::NotHeld`] if the tree does not hold it. A
    /// child left holding a single particle collapses back into a leaf; a
    /// child left empty is detached and freed.
    pub fn remove_particle(
        &mut self,
        particles: &ParticleSet,
        id: ParticleId,
    ) -> Result<(), GravityError> {
        self.remove_from_node(self.root, particles, id)
    }

    /// Re-settles particles that moved across domain boundaries since the
    /// last rebalance, then refreshes every cached aggregate bottom-up.
    ///
    /// A leaf whose particle left its domain is removed up to the nearest
    /// ancestor whose domain still contains the new position and re-inserted
    /// there. Particles that left the root domain entirely are removed from
    /// the tree and returned; the caller decides whether to rebuild over a
    /// larger domain.
    pub fn rebalance(&mut self, particles: &ParticleSet) -> Result<Vec<ParticleId>, GravityError> {
        let mut evicted = Vec::new();
        let mut path = vec![self.root];
        self.rebalance_node(self.root, particles, &mut path, &mut evicted)?;
        self.refresh_subtree(particles, self.root)?;
        Ok(evicted)
    }

    fn node(&self, id: NodeId) -> &Node {
        self.nodes[id.index()].as_ref().expect("stale NodeId")
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes[id.index()].as_mut().expect("stale NodeId")
    }

    #[cfg(test)]
    pub(crate) fn root_id(&self) -> NodeId {
        self.root
    }

    #[cfg(test)]
    pub(crate) fn node_ref(&self, id: NodeId) -> &Node {
        self.node(id)
    }

    fn is_live(&self, id: NodeId) -> bool {
        self.nodes[id.index()].is_some()
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.nodes[id.index()] = Some(node);
                id
            }
            None => {
                let id = NodeId::new(self.nodes.len());
                self.nodes.push(Some(node));
                id
            }
        }
    }

    fn free_subtree(&mut self, id: NodeId) {
        if let Some(node) = self.nodes[id.index()].take() {
            for child in node.children {
                self.free_subtree(child);
            }
            self.free.push(id);
        }
    }

    /// Recursively constructs a node over a non-empty id list.
    fn build_node(
        &mut self,
        particles: &ParticleSet,
        ids: Vec<ParticleId>,
        domain: Domain,
    ) -> Result<NodeId, GravityError> {
        debug_assert!(!ids.is_empty());
        if let [id] = ids[..] {
            let p = particles.get(id).ok_or(GravityError::NotHeld)?;
            return Ok(self.alloc(Node {
                center_of_mass: p.position(),
                mass: p.mass(),
                domain,
                particles: ids.into_iter().collect(),
                children: SmallVec::new(),
            }));
        }
        let children = self.build_children(particles, &ids, domain)?;
        let (mass, center_of_mass) = self.aggregate(&children);
        Ok(self.alloc(Node {
            center_of_mass,
            mass,
            domain,
            particles: ids.into_iter().collect(),
            children,
        }))
    }

    /// Buckets ids by octant and constructs a child node per non-empty
    /// octant. Used both at construction and when a leaf turns internal.
    fn build_children(
        &mut self,
        particles: &ParticleSet,
        ids: &[ParticleId],
        domain: Domain,
    ) -> Result<SmallVec<[NodeId; 8]>, GravityError> {
        let mut buckets: [Vec<ParticleId>; 8] = Default::default();
        for &id in ids {
            let p = particles.get(id).ok_or(GravityError::NotHeld)?;
            buckets[domain.octant_index(p.position())].push(id);
        }
        let mut children = SmallVec::new();
        for (octant, bucket) in buckets.into_iter().enumerate() {
            if !bucket.is_empty() {
                let child = self.build_node(particles, bucket, domain.octant_domain(octant)?)?;
                children.push(child);
            }
        }
        Ok(children)
    }

    /// Sums child masses and mass-weights their centers.
    ///
    /// Zero total mass would divide to NaN; it cannot occur while the
    /// positive-mass invariant on particles holds.
    fn aggregate(&self, children: &[NodeId]) -> (f64, Vec3) {
        let mut mass = 0.0;
        let mut weighted = Vec3::zeros();
        for &child in children {
            let node = self.node(child);
            mass += node.mass;
            weighted += node.center_of_mass * node.mass;
        }
        (mass, weighted / mass)
    }

    /// Recomputes a node's cached mass and center of mass: from its particle
    /// when it is a leaf, from its children otherwise.
    fn refresh_node(&mut self, particles: &ParticleSet, id: NodeId) -> Result<(), GravityError> {
        if self.node(id).children.is_empty() {
            match self.node(id).particles.iter().next().copied() {
                Some(pid) => {
                    let p = particles.get(pid).ok_or(GravityError::NotHeld)?;
                    let (mass, center) = (p.mass(), p.position());
                    let node = self.node_mut(id);
                    node.mass = mass;
                    node.center_of_mass = center;
                }
                // Empty nodes exist transiently during removal, before the
                // parent detaches them, and at the root after its last
                // particle is evicted.
                None => self.node_mut(id).mass = 0.0,
            }
        } else {
            let children: SmallVec<[NodeId; 8]> = self.node(id).children.clone();
            let (mass, center_of_mass) = self.aggregate(&children);
            let node = self.node_mut(id);
            node.mass = mass;
            node.center_of_mass = center_of_mass;
        }
        Ok(())
    }

    fn refresh_subtree(&mut self, particles: &ParticleSet, id: NodeId) -> Result<(), GravityError> {
        let children: SmallVec<[NodeId; 8]> = self.node(id).children.clone();
        for child in children {
            self.refresh_subtree(particles, child)?;
        }
        self.refresh_node(particles, id)
    }

    fn add_to_node(
        &mut self,
        node_id: NodeId,
        particles: &ParticleSet,
        id: ParticleId,
    ) -> Result<(), GravityError> {
        let pos = particles.get(id).ok_or(GravityError::NotHeld)?.position();
        {
            let node = self.node(node_id);
            if !node.domain.contains(pos) {
                return Err(GravityError::OutsideDomain);
            }
            if node.particles.contains(&id) {
                return Err(GravityError::AlreadyHeld);
            }
        }
        self.node_mut(node_id).particles.insert(id);

        let node = self.node(node_id);
        if node.children.is_empty() {
            if node.particles.len() >= 2 {
                // The node was a leaf: re-bucket everything it now holds,
                // exactly as construction does.
                let ids: Vec<ParticleId> = node.particles.iter().copied().collect();
                let domain = node.domain;
                let children = self.build_children(particles, &ids, domain)?;
                self.node_mut(node_id).children = children;
            }
        } else {
            // Delegate to an existing child if one covers the position,
            // otherwise open a new single-particle child for its octant.
            let children: SmallVec<[NodeId; 8]> = node.children.clone();
            let target = children
                .iter()
                .copied()
                .find(|&child| self.node(child).domain.contains(pos));
            match target {
                Some(child) => self.add_to_node(child, particles, id)?,
                None => {
                    let domain = self.node(node_id).domain;
                    let sub = domain.octant_domain(domain.octant_index(pos))?;
                    let p = particles.get(id).ok_or(GravityError::NotHeld)?;
                    let leaf = self.alloc(Node {
                        center_of_mass: p.position(),
                        mass: p.mass(),
                        domain: sub,
                        particles: std::iter::once(id).collect(),
                        children: SmallVec::new(),
                    });
                    self.node_mut(node_id).children.push(leaf);
                }
            }
        }
        self.refresh_node(particles, node_id)
    }

    fn remove_from_node(
        &mut self,
        node_id: NodeId,
        particles: &ParticleSet,
        id: ParticleId,
    ) -> Result<(), GravityError> {
        if !self.node(node_id).particles.contains(&id) {
            return Err(GravityError::NotHeld);
        }
        self.node_mut(node_id).particles.remove(&id);

        let children: SmallVec<[NodeId; 8]> = self.node(node_id).children.clone();
        for child in children {
            if self.node(child).particles.contains(&id) {
                self.remove_from_node(child, particles, id)?;
                if self.node(child).particles.is_empty() {
                    self.node_mut(node_id).children.retain(|c| *c != child);
                    self.free_subtree(child);
                }
                break;
            }
        }
        self.collapse_if_single(node_id);
        self.refresh_node(particles, node_id)
    }

    /// Collapses a degenerate internal node holding one particle back into a
    /// leaf, freeing its subtree.
    fn collapse_if_single(&mut self, node_id: NodeId) {
        let node = self.node(node_id);
        if node.particles.len() == 1 && !node.children.is_empty() {
            let children: SmallVec<[NodeId; 8]> = node.children.clone();
            for child in children {
                self.free_subtree(child);
            }
            self.node_mut(node_id).children.clear();
        }
    }

    /// Visits the subtree under the top of `path`, re-settling any leaf whose
    /// particle has moved outside its domain.
    ///
    /// Callers must push a node onto the path before recursing into it; a
    /// path whose top entry is not `node_id` is rejected.
    pub(crate) fn rebalance_node(
        &mut self,
        node_id: NodeId,
        particles: &ParticleSet,
        path: &mut Vec<NodeId>,
        evicted: &mut Vec<ParticleId>,
    ) -> Result<(), GravityError> {
        if path.last().copied() != Some(node_id) {
            return Err(GravityError::InconsistentPath);
        }
        if self.node(node_id).children.is_empty() {
            let Some(id) = self.node(node_id).particles.iter().next().copied() else {
                return Ok(());
            };
            let pos = particles.get(id).ok_or(GravityError::NotHeld)?.position();
            if self.node(node_id).domain.contains(pos) {
                return Ok(());
            }
            // Nearest ancestor whose domain re-contains the new position.
            let target = path[..path.len() - 1]
                .iter()
                .rev()
                .copied()
                .find(|&ancestor| self.node(ancestor).domain.contains(pos));
            match target {
                Some(ancestor) => {
                    self.remove_from_node(ancestor, particles, id)?;
                    self.add_to_node(ancestor, particles, id)?;
                }
                None => {
                    self.remove_from_node(self.root, particles, id)?;
                    evicted.push(id);
                }
            }
            return Ok(());
        }
        let children: SmallVec<[NodeId; 8]> = self.node(node_id).children.clone();
        for child in children {
            // Re-settling a sibling may have collapsed or replaced nodes in
            // this snapshot.
            if !self.is_live(child) || !self.node(node_id).children.contains(&child) {
                continue;
            }
            path.push(child);
            self.rebalance_node(child, particles, path, evicted)?;
            path.pop();
        }
        Ok(())
    }
}
