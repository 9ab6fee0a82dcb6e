//! Reference-counted sector octree.
//!
//! One [`GalaxySector`] tree exists per root coordinate. Loads descend from
//! the root, creating children lazily; unloads walk the same path back and
//! drop whole branches once nothing beneath them is wanted.
//!
//! ```text
//! root (weak 3)
//!  └─ L6 (weak 3)
//!      ├─ L5 (ref 1, weak 1)    <- loaded directly
//!      └─ L5 (weak 2)
//!          └─ L4 (ref 2, weak 2) <- loaded twice
//! ```
//!
//! The tree is only touched from the manager thread. Generation results are
//! merged by the manager through [`GalaxySector::lookup_mut`].

use std::sync::Arc;

use glam::IVec3;
use tracing::error;

use crate::elements::PackedSectorElements;
use crate::sector_pos::{SectorPos, ROOT_LEVEL};

/// Summary of the loaded state of one or more sector trees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SectorDebugInfo {
  /// Nodes with an allocated branch.
  pub branch_nodes: usize,
  /// Nodes without children.
  pub leaf_nodes: usize,
  /// Nodes with a non-zero reference count.
  pub strongly_loaded: usize,
  /// Nodes with a non-zero weak count.
  pub weakly_loaded: usize,
  /// Nodes holding generated elements.
  pub complete: usize,
  /// Sum of the weak counts of the visited roots.
  pub root_weak_count: u32,
}

pub struct GalaxySector {
  pos: SectorPos,
  reference_count: u32,
  weak_reference_count: u32,
  generation_started: bool,
  generation_finished: bool,
  elements: Option<Arc<PackedSectorElements>>,
  branch: Option<Box<[GalaxySector; 8]>>,
}

impl GalaxySector {
  /// Empty root tree at `coords`.
  pub fn root(coords: IVec3) -> Self {
    Self::new(SectorPos::new(ROOT_LEVEL, coords))
  }

  fn new(pos: SectorPos) -> Self {
    Self {
      pos,
      reference_count: 0,
      weak_reference_count: 0,
      generation_started: false,
      generation_finished: false,
      elements: None,
      branch: None,
    }
  }

  #[inline]
  pub fn pos(&self) -> SectorPos {
    self.pos
  }

  #[inline]
  pub fn level(&self) -> u8 {
    self.pos.level
  }

  #[inline]
  pub fn reference_count(&self) -> u32 {
    self.reference_count
  }

  #[inline]
  pub fn weak_reference_count(&self) -> u32 {
    self.weak_reference_count
  }

  /// Wanted directly by at least one ticket.
  #[inline]
  pub fn is_loaded(&self) -> bool {
    self.reference_count > 0
  }

  /// Generated elements are available.
  #[inline]
  pub fn is_complete(&self) -> bool {
    self.elements.is_some()
  }

  #[inline]
  pub fn generation_started(&self) -> bool {
    self.generation_started
  }

  #[inline]
  pub fn generation_finished(&self) -> bool {
    self.generation_finished
  }

  #[inline]
  pub fn elements(&self) -> Option<&Arc<PackedSectorElements>> {
    self.elements.as_ref()
  }

  #[inline]
  pub fn has_branch(&self) -> bool {
    self.branch.is_some()
  }

  /// Flag that a generation task has been dispatched for this node.
  pub fn mark_generation_started(&mut self) {
    self.generation_started = true;
  }

  /// Store the outcome of a generation task. `None` records a failed run:
  /// the node stays incomplete but is not dispatched again until it is
  /// unloaded to zero.
  pub fn finish_generation(&mut self, elements: Option<Arc<PackedSectorElements>>) {
    self.generation_finished = true;
    self.elements = elements;
  }

  fn covers(&self, pos: &SectorPos) -> bool {
    self.pos.contains_pos(pos)
  }

  fn child_index_for(&self, pos: &SectorPos) -> usize {
    let child = SectorPos::new(self.pos.level - 1, pos.level_coords_at(self.pos.level - 1));
    child.octant_in_parent() as usize
  }

  fn ensure_branch(&mut self) -> &mut [GalaxySector; 8] {
    let pos = self.pos;
    self.branch.get_or_insert_with(|| {
      Box::new(std::array::from_fn(|octant| {
        // A branch is only created above level 0.
        let child = pos.child(octant as u8).unwrap_or(pos);
        GalaxySector::new(child)
      }))
    })
  }

  /// Add one reference to `pos`. Returns `false` without touching anything
  /// when `pos` is not this node or one of its descendants.
  pub fn load(&mut self, pos: &SectorPos) -> bool {
    if !self.covers(pos) {
      return false;
    }
    self.load_within(pos);
    true
  }

  fn load_within(&mut self, pos: &SectorPos) {
    self.weak_reference_count += 1;
    if self.pos.level == pos.level {
      self.reference_count += 1;
      return;
    }
    let index = self.child_index_for(pos);
    self.ensure_branch()[index].load_within(pos);
  }

  /// Drop one reference to `pos`.
  ///
  /// Unloading a position that holds no reference is a caller bug: it is
  /// logged and ignored so the counts stay consistent. Returns whether this
  /// node's weak count is now zero, i.e. whether the caller may discard it.
  pub fn unload(&mut self, pos: &SectorPos) -> bool {
    let referenced = self.lookup(pos).is_some_and(|node| node.reference_count > 0);
    if !referenced {
      error!("unload of sector {} which is not loaded", pos);
      return self.weak_reference_count == 0;
    }
    self.unload_within(pos)
  }

  fn unload_within(&mut self, pos: &SectorPos) -> bool {
    self.weak_reference_count -= 1;

    if self.pos.level == pos.level {
      self.reference_count -= 1;
      if self.reference_count == 0 {
        self.elements = None;
        self.generation_started = false;
        self.generation_finished = false;
      }
    } else {
      let index = self.child_index_for(pos);
      let mut all_unloadable = false;
      if let Some(branch) = self.branch.as_mut() {
        branch[index].unload_within(pos);
        all_unloadable = branch.iter().all(|child| child.weak_reference_count == 0);
      }
      if all_unloadable && self.weak_reference_count == 0 {
        self.branch = None;
      }
    }

    self.weak_reference_count == 0
  }

  /// Node at `pos`, if it exists in the tree.
  pub fn lookup(&self, pos: &SectorPos) -> Option<&GalaxySector> {
    if !self.covers(pos) {
      return None;
    }
    let mut node = self;
    while node.pos.level > pos.level {
      let index = node.child_index_for(pos);
      node = &node.branch.as_ref()?[index];
    }
    Some(node)
  }

  pub fn lookup_mut(&mut self, pos: &SectorPos) -> Option<&mut GalaxySector> {
    if !self.covers(pos) {
      return None;
    }
    let mut node = self;
    while node.pos.level > pos.level {
      let index = node.child_index_for(pos);
      node = &mut node.branch.as_mut()?[index];
    }
    Some(node)
  }

  /// Visit every existing node, parents before children.
  pub fn for_each(&self, f: &mut impl FnMut(&GalaxySector)) {
    f(self);
    if let Some(branch) = &self.branch {
      for child in branch.iter() {
        child.for_each(f);
      }
    }
  }

  /// Accumulate this tree's state into `info`.
  pub fn debug_info(&self, info: &mut SectorDebugInfo) {
    info.root_weak_count += self.weak_reference_count;
    self.for_each(&mut |node: &GalaxySector| {
      if node.has_branch() {
        info.branch_nodes += 1;
      } else {
        info.leaf_nodes += 1;
      }
      if node.reference_count > 0 {
        info.strongly_loaded += 1;
      }
      if node.weak_reference_count > 0 {
        info.weakly_loaded += 1;
      }
      if node.is_complete() {
        info.complete += 1;
      }
    });
  }
}

#[cfg(test)]
#[path = "sector_test.rs"]
mod sector_test;
