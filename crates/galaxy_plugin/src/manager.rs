//! SectorManager - ticket-driven sector cache.
//!
//! Consumers hold tickets describing what they want loaded; the manager
//! turns the tickets into reference counts on the sector octrees, runs
//! generation on the worker pool, and merges finished results back into the
//! trees on its own thread.
//!
//! ```text
//!  tickets ──diff──► load / unload ──► GalaxySector trees
//!                         │                   ▲
//!                         ▼                   │ apply_finished
//!                     Executor ──completions──┘
//! ```
//!
//! Every mutation of the trees happens inside `&mut self` methods; workers
//! only ever see the immutable [`Galaxy`] and return owned results.
//!
//! # Usage
//!
//! ```ignore
//! let galaxy = Arc::new(Galaxy::new(GalaxyConfig::default(), density));
//! let mut manager = SectorManager::new(galaxy);
//!
//! let ticket = manager.create_sector_ticket(SectorTicketInfo::visual(camera));
//! loop {
//!     manager.update_ticket(ticket, SectorTicketInfo::visual(camera));
//!     manager.tick(time_s);
//!     manager.enumerate(ticket, |pos, elements| draw(pos, elements));
//! }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use glam::{DVec3, IVec3};
use tracing::{debug, error};
use web_time::Instant;

use crate::elements::{ElementHolder, PackedSectorElements};
use crate::error::GalaxyError;
use crate::galaxy::Galaxy;
use crate::metrics::GalaxyMetrics;
use crate::sector::{GalaxySector, SectorDebugInfo};
use crate::sector_pos::{GalaxySectorId, SectorPos};
use crate::system::StarSystem;
use crate::threading::{Executor, TaskError, TaskHandle, TaskId};
use crate::ticket::{SectorTicketInfo, TicketTracker};

// =============================================================================
// Tickets
// =============================================================================

static TICKET_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TicketId(u64);

impl TicketId {
  fn next() -> Self {
    Self(TICKET_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
  }

  #[inline]
  pub fn raw(&self) -> u64 {
    self.0
  }
}

impl fmt::Display for TicketId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "ticket#{}", self.0)
  }
}

/// Interest in a set of sectors. Release with
/// [`SectorManager::remove_sector_ticket`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct SectorTicket(TicketId);

impl SectorTicket {
  #[inline]
  pub fn id(&self) -> TicketId {
    self.0
  }
}

/// Interest in one fully expanded system. Release with
/// [`SectorManager::remove_system_ticket`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct SystemTicket(TicketId);

impl SystemTicket {
  #[inline]
  pub fn id(&self) -> TicketId {
    self.0
  }
}

// =============================================================================
// Slots
// =============================================================================

/// Output of a sector generation task.
#[derive(Clone, Debug)]
pub struct SectorResult {
  pub elements: Arc<PackedSectorElements>,
  pub elapsed_us: u64,
}

/// Output of a system expansion task.
#[derive(Clone, Debug)]
pub struct SystemResult {
  pub system: StarSystem,
  pub elapsed_us: u64,
}

type SectorTask = TaskHandle<SectorResult>;
type SystemTask = TaskHandle<Result<SystemResult, GalaxyError>>;

/// One root octree and the generation tasks running for its nodes.
struct SectorSlot {
  root: GalaxySector,
  pending: HashMap<SectorPos, SectorTask>,
}

impl SectorSlot {
  fn new(coords: IVec3) -> Self {
    Self {
      root: GalaxySector::root(coords),
      pending: HashMap::new(),
    }
  }

  #[inline]
  fn is_unused(&self) -> bool {
    self.root.weak_reference_count() == 0 && self.pending.is_empty()
  }
}

#[derive(Default)]
struct SystemSlot {
  reference_count: u32,
  system: Option<StarSystem>,
  pending: Option<SystemTask>,
  /// Sticky until the slot is dropped.
  generation_failed: bool,
}

#[derive(Clone, Copy, Debug)]
enum InFlight {
  Sector(SectorPos),
  System(GalaxySectorId),
}

/// Changes queued by ticket creation and removal, applied on the next pass.
#[derive(Default)]
struct QueuedChanges {
  load_sectors: Vec<SectorPos>,
  load_systems: Vec<GalaxySectorId>,
  unload_systems: Vec<GalaxySectorId>,
  unload_sectors: Vec<SectorPos>,
}

fn expand_system(
  galaxy: &Galaxy,
  id: GalaxySectorId,
  elements: &PackedSectorElements,
) -> Result<SystemResult, GalaxyError> {
  let start = Instant::now();
  let system = galaxy.generate_full_system(id, elements)?;
  Ok(SystemResult {
    system,
    elapsed_us: start.elapsed().as_micros() as u64,
  })
}

// =============================================================================
// SectorManager
// =============================================================================

pub struct SectorManager {
  galaxy: Arc<Galaxy>,
  executor: Executor,
  sector_tickets: HashMap<TicketId, TicketTracker>,
  system_tickets: HashMap<TicketId, GalaxySectorId>,
  queued: QueuedChanges,
  slots: HashMap<IVec3, SectorSlot>,
  systems: HashMap<GalaxySectorId, SystemSlot>,
  in_flight: HashMap<TaskId, InFlight>,
  metrics: GalaxyMetrics,
}

impl SectorManager {
  pub fn new(galaxy: Arc<Galaxy>) -> Self {
    Self::with_executor(galaxy, Executor::new())
  }

  pub fn with_executor(galaxy: Arc<Galaxy>, executor: Executor) -> Self {
    Self {
      galaxy,
      executor,
      sector_tickets: HashMap::new(),
      system_tickets: HashMap::new(),
      queued: QueuedChanges::default(),
      slots: HashMap::new(),
      systems: HashMap::new(),
      in_flight: HashMap::new(),
      metrics: GalaxyMetrics::default(),
    }
  }

  #[inline]
  pub fn galaxy(&self) -> &Arc<Galaxy> {
    &self.galaxy
  }

  #[inline]
  pub fn metrics(&self) -> &GalaxyMetrics {
    &self.metrics
  }

  /// Generation and expansion tasks not yet merged.
  #[inline]
  pub fn pending_task_count(&self) -> usize {
    self.in_flight.len()
  }

  // ---------------------------------------------------------------------------
  // Ticket API
  // ---------------------------------------------------------------------------

  /// Register interest in the sectors `info` covers. Loads are applied
  /// immediately.
  pub fn create_sector_ticket(&mut self, info: SectorTicketInfo) -> SectorTicket {
    let id = TicketId::next();
    self.sector_tickets.insert(id, TicketTracker::new(info));
    self.apply_ticket_changes();
    SectorTicket(id)
  }

  /// Replace the query of a ticket. Takes effect on the next tick.
  pub fn update_ticket(&mut self, ticket: SectorTicket, info: SectorTicketInfo) {
    match self.sector_tickets.get_mut(&ticket.0) {
      Some(tracker) => tracker.desired = info,
      None => error!("update of {} which was removed", ticket.0),
    }
  }

  pub fn ticket_info(&self, ticket: SectorTicket) -> Option<&SectorTicketInfo> {
    self.sector_tickets.get(&ticket.0).map(|tracker| &tracker.desired)
  }

  /// Drop a sector ticket. Its sectors are released on the next tick.
  pub fn remove_sector_ticket(&mut self, ticket: SectorTicket) {
    match self.sector_tickets.remove(&ticket.0) {
      Some(mut tracker) => self.queued.unload_sectors.extend(tracker.release()),
      None => error!("removal of {} which was already removed", ticket.0),
    }
  }

  /// Register interest in one expanded system. The owning sector is loaded
  /// along with it.
  pub fn create_system_ticket(&mut self, id: GalaxySectorId) -> SystemTicket {
    let ticket = TicketId::next();
    self.system_tickets.insert(ticket, id);
    self.queued.load_sectors.push(id.sector_pos);
    self.queued.load_systems.push(id);
    self.apply_ticket_changes();
    SystemTicket(ticket)
  }

  /// Drop a system ticket. The system and its sector are released on the
  /// next tick.
  pub fn remove_system_ticket(&mut self, ticket: SystemTicket) {
    match self.system_tickets.remove(&ticket.0) {
      Some(id) => {
        self.queued.unload_systems.push(id);
        self.queued.unload_sectors.push(id.sector_pos);
      }
      None => error!("removal of {} which was already removed", ticket.0),
    }
  }

  #[inline]
  pub fn system_ticket_target(&self, ticket: SystemTicket) -> Option<GalaxySectorId> {
    self.system_tickets.get(&ticket.0).copied()
  }

  // ---------------------------------------------------------------------------
  // Per-frame update
  // ---------------------------------------------------------------------------

  /// Apply ticket changes, merge finished tasks and advance system orbits to
  /// `time_s`.
  #[cfg_attr(feature = "profiling", tracing::instrument(skip_all, name = "galaxy::tick"))]
  pub fn tick(&mut self, time_s: f64) {
    let start = Instant::now();
    self.apply_ticket_changes();
    self.apply_finished();
    for system in self.systems.values_mut().filter_map(|slot| slot.system.as_mut()) {
      system.update_positions(time_s);
    }
    self.metrics.record_tick_timing(start.elapsed().as_micros() as u64);
  }

  /// Block until every sector of `ticket` has finished generating. Returns
  /// whether all of them are complete.
  pub fn force_load(&mut self, ticket: SectorTicket) -> bool {
    if !self.sector_tickets.contains_key(&ticket.0) {
      error!("force load of {} which was removed", ticket.0);
      return false;
    }
    self.apply_ticket_changes();

    let positions: Vec<SectorPos> = self
      .sector_tickets
      .get(&ticket.0)
      .map(|tracker| tracker.loaded().iter().copied().collect())
      .unwrap_or_default();
    for pos in &positions {
      self.join_sector(*pos);
    }
    self.apply_finished();

    positions.iter().all(|pos| self.is_complete(pos))
  }

  /// Block until the system of `ticket` is expanded. `None` when expansion
  /// failed or the ticket was removed.
  pub fn force_load_system(&mut self, ticket: SystemTicket) -> Option<&StarSystem> {
    let Some(id) = self.system_ticket_target(ticket) else {
      error!("force load of {} which was removed", ticket.0);
      return None;
    };
    self.apply_ticket_changes();
    self.join_sector(id.sector_pos);

    let pending = self.systems.get_mut(&id).and_then(|slot| slot.pending.take());
    if let Some(handle) = pending {
      self.in_flight.remove(&handle.id());
      let result = handle.join();
      self.store_system_result(id, result);
    }
    self.apply_finished();

    self.get_system(id)
  }

  // ---------------------------------------------------------------------------
  // Queries
  // ---------------------------------------------------------------------------

  fn node(&self, pos: &SectorPos) -> Option<&GalaxySector> {
    self.slots.get(&pos.root_coords()?)?.root.lookup(pos)
  }

  /// Whether some ticket holds `pos`.
  pub fn is_loaded(&self, pos: &SectorPos) -> bool {
    self.node(pos).is_some_and(GalaxySector::is_loaded)
  }

  /// Whether `pos` is loaded and its elements are available.
  pub fn is_complete(&self, pos: &SectorPos) -> bool {
    self.node(pos).is_some_and(GalaxySector::is_complete)
  }

  pub fn get_sector(&self, pos: &SectorPos) -> Option<&PackedSectorElements> {
    self.node(pos)?.elements().map(Arc::as_ref)
  }

  pub fn get_system(&self, id: GalaxySectorId) -> Option<&StarSystem> {
    self.systems.get(&id)?.system.as_ref()
  }

  pub fn is_system_loaded(&self, id: GalaxySectorId) -> bool {
    self.get_system(id).is_some()
  }

  /// Whether expansion of `id` failed. Cleared once every ticket on it is
  /// removed.
  pub fn is_system_failed(&self, id: GalaxySectorId) -> bool {
    self.systems.get(&id).is_some_and(|slot| slot.generation_failed)
  }

  /// Position of a system, read from its sector's summary.
  pub fn get_system_pos(&self, id: GalaxySectorId) -> Option<DVec3> {
    let elements = self.get_sector(&id.sector_pos)?;
    elements.get(id.element_index as usize).map(|summary| summary.system_pos)
  }

  /// Copy the summary of `id` into `out`. Returns `false` when its sector
  /// is not complete or the index is out of range.
  pub fn load_summary(&self, out: &mut ElementHolder, id: GalaxySectorId) -> bool {
    self
      .get_sector(&id.sector_pos)
      .is_some_and(|elements| elements.load(out, id.element_index as usize))
  }

  /// Fraction of the sectors `ticket` asks for that are complete. A ticket
  /// covering nothing is complete.
  pub fn percent_complete(&self, ticket: SectorTicket) -> f64 {
    let Some(tracker) = self.sector_tickets.get(&ticket.0) else {
      error!("progress query on {} which was removed", ticket.0);
      return 0.0;
    };
    let wanted = tracker.desired.affected_sectors();
    if wanted.is_empty() {
      return 1.0;
    }
    let complete = wanted.iter().filter(|pos| self.is_complete(pos)).count();
    complete as f64 / wanted.len() as f64
  }

  /// Visit the complete sectors held by `ticket`, in position order.
  pub fn enumerate(&self, ticket: SectorTicket, mut consumer: impl FnMut(SectorPos, &PackedSectorElements)) {
    let Some(tracker) = self.sector_tickets.get(&ticket.0) else {
      error!("enumerate on {} which was removed", ticket.0);
      return;
    };
    let mut positions: Vec<SectorPos> = tracker.loaded().iter().copied().collect();
    positions.sort_unstable();
    for pos in positions {
      if let Some(elements) = self.get_sector(&pos) {
        consumer(pos, elements);
      }
    }
  }

  /// Expanded systems currently held.
  pub fn systems(&self) -> impl Iterator<Item = &StarSystem> {
    self.systems.values().filter_map(|slot| slot.system.as_ref())
  }

  /// State of every sector tree.
  pub fn debug_info(&self) -> SectorDebugInfo {
    let mut info = SectorDebugInfo::default();
    for slot in self.slots.values() {
      slot.root.debug_info(&mut info);
    }
    info
  }

  // ---------------------------------------------------------------------------
  // Ticket application
  // ---------------------------------------------------------------------------

  /// Diff every ticket and apply the result together with the queued
  /// changes. Loads go first so a sector moving between tickets is never
  /// dropped and regenerated.
  fn apply_ticket_changes(&mut self) {
    let QueuedChanges {
      mut load_sectors,
      load_systems,
      unload_systems,
      mut unload_sectors,
    } = std::mem::take(&mut self.queued);

    for tracker in self.sector_tickets.values_mut() {
      let diff = tracker.diff();
      load_sectors.extend(diff.load);
      unload_sectors.extend(diff.unload);
    }

    if !(load_sectors.is_empty() && unload_sectors.is_empty()) {
      debug!(
        load = load_sectors.len(),
        unload = unload_sectors.len(),
        "Applying ticket changes"
      );
    }

    for pos in load_sectors {
      self.load_sector(pos);
    }
    for id in load_systems {
      self.load_system(id);
    }
    for id in unload_systems {
      self.unload_system(id);
    }
    for pos in unload_sectors {
      self.unload_sector(pos);
    }
  }

  fn load_sector(&mut self, pos: SectorPos) {
    let Some(coords) = pos.root_coords() else {
      error!("load of sector {} which is above the root level", pos);
      return;
    };
    let slot = self
      .slots
      .entry(coords)
      .or_insert_with(|| SectorSlot::new(coords));
    if !slot.root.load(&pos) {
      error!("sector {} is outside its root tree", pos);
      return;
    }
    let Some(node) = slot.root.lookup_mut(&pos) else {
      return;
    };
    // One task per position, shared by every ticket on it.
    if node.generation_started() || slot.pending.contains_key(&pos) {
      return;
    }
    node.mark_generation_started();

    let galaxy = Arc::clone(&self.galaxy);
    let handle = self.executor.spawn(move || {
      let start = Instant::now();
      let elements = galaxy.generate_sector_elements(pos);
      SectorResult {
        elements: Arc::new(elements),
        elapsed_us: start.elapsed().as_micros() as u64,
      }
    });
    self.in_flight.insert(handle.id(), InFlight::Sector(pos));
    slot.pending.insert(pos, handle);
  }

  fn unload_sector(&mut self, pos: SectorPos) {
    let Some(coords) = pos.root_coords() else {
      error!("unload of sector {} which is above the root level", pos);
      return;
    };
    let Some(slot) = self.slots.get_mut(&coords) else {
      error!("unload of sector {} which is not loaded", pos);
      return;
    };

    let resident = slot.root.lookup(&pos).and_then(|node| node.elements()).map(|e| e.len());
    slot.root.unload(&pos);

    let released = slot.root.lookup(&pos).map_or(true, |node| !node.is_loaded());
    if released {
      if let Some(handle) = slot.pending.remove(&pos) {
        // A running task finishes anyway; its completion is ignored.
        handle.cancel();
        self.in_flight.remove(&handle.id());
      }
      if let Some(len) = resident {
        self.metrics.remove_sector(pos.level, len);
      }
    }

    if slot.is_unused() {
      self.slots.remove(&coords);
    }
  }

  fn load_system(&mut self, id: GalaxySectorId) {
    let slot = self.systems.entry(id).or_default();
    slot.reference_count += 1;
    if slot.reference_count > 1 || slot.generation_failed {
      return;
    }
    self.dispatch_system(id);
  }

  /// Start expanding `id`, chained behind its sector when that is still
  /// generating.
  fn dispatch_system(&mut self, id: GalaxySectorId) {
    let pos = id.sector_pos;
    let sector_slot = pos.root_coords().and_then(|coords| self.slots.get(&coords));
    let ready = sector_slot
      .and_then(|slot| slot.root.lookup(&pos))
      .and_then(|node| node.elements())
      .cloned();
    let galaxy = Arc::clone(&self.galaxy);

    let handle = if let Some(elements) = ready {
      Some(self.executor.spawn(move || expand_system(&galaxy, id, &elements)))
    } else if let Some(sector) = sector_slot.and_then(|slot| slot.pending.get(&pos)) {
      Some(sector.then(
        &self.executor,
        move |sector: Result<SectorResult, TaskError>| -> Result<SystemResult, GalaxyError> {
          let sector = sector?;
          expand_system(&galaxy, id, &sector.elements)
        },
      ))
    } else {
      None
    };

    match handle {
      Some(handle) => {
        self.in_flight.insert(handle.id(), InFlight::System(id));
        if let Some(slot) = self.systems.get_mut(&id) {
          slot.pending = Some(handle);
        }
      }
      None => {
        error!("system {} has no sector data to expand from", id);
        self.metrics.record_system_failure();
        if let Some(slot) = self.systems.get_mut(&id) {
          slot.generation_failed = true;
        }
      }
    }
  }

  fn unload_system(&mut self, id: GalaxySectorId) {
    let Some(slot) = self.systems.get_mut(&id) else {
      error!("unload of system {} which is not loaded", id);
      return;
    };
    slot.reference_count = slot.reference_count.saturating_sub(1);
    if slot.reference_count > 0 {
      return;
    }
    if let Some(handle) = slot.pending.take() {
      handle.cancel();
      self.in_flight.remove(&handle.id());
    }
    if slot.system.is_some() {
      self.metrics.remove_system();
    }
    self.systems.remove(&id);
  }

  // ---------------------------------------------------------------------------
  // Completion
  // ---------------------------------------------------------------------------

  /// Merge every task that finished since the last call. Completions of
  /// cancelled or already joined tasks are skipped.
  fn apply_finished(&mut self) {
    let finished: Vec<TaskId> = self.executor.drain_completed().collect();
    for task in finished {
      match self.in_flight.remove(&task) {
        Some(InFlight::Sector(pos)) => self.finish_sector(pos),
        Some(InFlight::System(id)) => self.finish_system(id),
        None => {}
      }
    }
  }

  fn finish_sector(&mut self, pos: SectorPos) {
    let Some(slot) = pos.root_coords().and_then(|coords| self.slots.get_mut(&coords)) else {
      return;
    };
    let Some(handle) = slot.pending.remove(&pos) else {
      return;
    };
    match handle.try_take() {
      Some(result) => self.store_sector_result(pos, result),
      None => {
        // Not done after all; keep waiting.
        self.in_flight.insert(handle.id(), InFlight::Sector(pos));
        slot.pending.insert(pos, handle);
      }
    }
  }

  /// Wait for the generation task of `pos`, if any, and merge it.
  fn join_sector(&mut self, pos: SectorPos) {
    let Some(slot) = pos.root_coords().and_then(|coords| self.slots.get_mut(&coords)) else {
      return;
    };
    let Some(handle) = slot.pending.remove(&pos) else {
      return;
    };
    self.in_flight.remove(&handle.id());
    let result = handle.join();
    self.store_sector_result(pos, result);
  }

  fn store_sector_result(&mut self, pos: SectorPos, result: Result<SectorResult, TaskError>) {
    let Some(node) = pos
      .root_coords()
      .and_then(|coords| self.slots.get_mut(&coords))
      .and_then(|slot| slot.root.lookup_mut(&pos))
    else {
      return;
    };
    match result {
      Ok(sector) => {
        self.metrics.record_sector(pos.level, sector.elements.len(), sector.elapsed_us);
        node.finish_generation(Some(sector.elements));
      }
      Err(err) => {
        error!("generation of sector {} failed: {}", pos, err);
        self.metrics.record_sector_failure();
        node.finish_generation(None);
      }
    }
  }

  fn finish_system(&mut self, id: GalaxySectorId) {
    let Some(handle) = self.systems.get_mut(&id).and_then(|slot| slot.pending.take()) else {
      return;
    };
    match handle.try_take() {
      Some(result) => self.store_system_result(id, result),
      None => {
        self.in_flight.insert(handle.id(), InFlight::System(id));
        if let Some(slot) = self.systems.get_mut(&id) {
          slot.pending = Some(handle);
        }
      }
    }
  }

  fn store_system_result(
    &mut self,
    id: GalaxySectorId,
    result: Result<Result<SystemResult, GalaxyError>, TaskError>,
  ) {
    let Some(slot) = self.systems.get_mut(&id) else {
      return;
    };
    match result.map_err(GalaxyError::from).and_then(|inner| inner) {
      Ok(expanded) => {
        self.metrics.record_system(expanded.elapsed_us);
        slot.system = Some(expanded.system);
      }
      Err(err) => {
        error!("expansion of system {} failed: {}", id, err);
        self.metrics.record_system_failure();
        slot.generation_failed = true;
      }
    }
  }
}

impl Drop for SectorManager {
  fn drop(&mut self) {
    for slot in self.slots.values() {
      for handle in slot.pending.values() {
        handle.cancel();
      }
    }
    for handle in self.systems.values().filter_map(|slot| slot.pending.as_ref()) {
      handle.cancel();
    }
  }
}

#[cfg(test)]
#[path = "manager_test.rs"]
mod manager_test;
