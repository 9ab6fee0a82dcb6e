//! Task executor on top of rayon.
//!
//! Work is submitted with `rayon::spawn` and observed through a
//! [`TaskHandle`]. Every finished task also posts its [`TaskId`] on a
//! crossbeam channel, so the owner can drain completions once per tick
//! instead of polling every handle.
//!
//! # Usage
//!
//! ```ignore
//! let executor = Executor::new();
//!
//! // Queue work (non-blocking)
//! let elements = executor.spawn(move || galaxy.generate_sector_elements(pos));
//!
//! // Chain more work onto it without blocking a worker
//! let system = elements.then(&executor, move |elements| expand(elements));
//!
//! // Each tick
//! for id in executor.drain_completed() {
//!     // look the id up and `try_take` its handle
//! }
//! ```
//!
//! Panics inside a task are caught at the task boundary and surface as
//! [`TaskError::Panicked`]; the pool keeps running.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use crossbeam_channel::{Receiver, Sender};
use thiserror::Error;

/// Unique identifier for a spawned task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

impl TaskId {
  fn next() -> Self {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    Self(COUNTER.fetch_add(1, Ordering::Relaxed))
  }

  #[inline]
  pub fn raw(&self) -> u64 {
    self.0
  }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TaskError {
  #[error("task was cancelled before it started")]
  Cancelled,
  #[error("task panicked: {0}")]
  Panicked(String),
  #[error("task result was already taken")]
  Consumed,
}

type Continuation<T> = Box<dyn FnOnce(&Result<T, TaskError>) + Send>;

enum Slot<T> {
  Pending(Vec<Continuation<T>>),
  Done(Result<T, TaskError>),
  Taken,
}

struct Shared<T> {
  id: TaskId,
  slot: Mutex<Slot<T>>,
  done: Condvar,
  cancelled: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
  mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T> Shared<T> {
  fn new() -> Self {
    Self {
      id: TaskId::next(),
      slot: Mutex::new(Slot::Pending(Vec::new())),
      done: Condvar::new(),
      cancelled: AtomicBool::new(false),
    }
  }

  /// Publish the result, run continuations, wake joiners and post the id.
  fn complete(&self, result: Result<T, TaskError>, completions: &Sender<TaskId>) {
    {
      let mut slot = lock(&self.slot);
      if let Slot::Pending(continuations) = &mut *slot {
        for continuation in continuations.drain(..) {
          continuation(&result);
        }
      }
      *slot = Slot::Done(result);
    }
    self.done.notify_all();
    // The receiver lives as long as any executor clone; a send can only fail
    // during teardown.
    let _ = completions.send(self.id);
  }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
  if let Some(s) = payload.downcast_ref::<&str>() {
    (*s).to_owned()
  } else if let Some(s) = payload.downcast_ref::<String>() {
    s.clone()
  } else {
    "non-string panic payload".to_owned()
  }
}

fn run_guarded<T>(work: impl FnOnce() -> T) -> Result<T, TaskError> {
  panic::catch_unwind(AssertUnwindSafe(work)).map_err(|payload| TaskError::Panicked(panic_message(&*payload)))
}

/// Owner's view of one task.
///
/// Dropping a handle does not stop the task; call [`cancel`](Self::cancel)
/// first if the result is no longer wanted.
pub struct TaskHandle<T> {
  shared: Arc<Shared<T>>,
}

impl<T: Send + 'static> TaskHandle<T> {
  #[inline]
  pub fn id(&self) -> TaskId {
    self.shared.id
  }

  /// Ask the task not to run. A task that already started finishes normally
  /// and its result should simply be ignored.
  pub fn cancel(&self) {
    self.shared.cancelled.store(true, Ordering::Release);
  }

  #[inline]
  pub fn is_cancelled(&self) -> bool {
    self.shared.cancelled.load(Ordering::Acquire)
  }

  /// Whether the task has produced its result (taken or not).
  pub fn is_finished(&self) -> bool {
    !matches!(*lock(&self.shared.slot), Slot::Pending(_))
  }

  /// Take the result if the task is done (non-blocking).
  pub fn try_take(&self) -> Option<Result<T, TaskError>> {
    let mut slot = lock(&self.shared.slot);
    match std::mem::replace(&mut *slot, Slot::Taken) {
      Slot::Done(result) => Some(result),
      Slot::Taken => Some(Err(TaskError::Consumed)),
      pending @ Slot::Pending(_) => {
        *slot = pending;
        None
      }
    }
  }

  /// Block the calling thread until the task is done and take its result.
  ///
  /// Must not be called from inside a pool task.
  pub fn join(self) -> Result<T, TaskError> {
    let mut slot = lock(&self.shared.slot);
    while matches!(*slot, Slot::Pending(_)) {
      slot = self.shared.done.wait(slot).unwrap_or_else(PoisonError::into_inner);
    }
    match std::mem::replace(&mut *slot, Slot::Taken) {
      Slot::Done(result) => result,
      _ => Err(TaskError::Consumed),
    }
  }
}

impl<T: Clone + Send + 'static> TaskHandle<T> {
  /// Schedule `f` to run on the pool with this task's result once it is
  /// available. No worker blocks while waiting.
  pub fn then<U, F>(&self, executor: &Executor, f: F) -> TaskHandle<U>
  where
    F: FnOnce(Result<T, TaskError>) -> U + Send + 'static,
    U: Send + 'static,
  {
    let next = Arc::new(Shared::new());
    let handle = TaskHandle {
      shared: Arc::clone(&next),
    };

    let mut job = Some((next, f));
    let ready = {
      let mut slot = lock(&self.shared.slot);
      match &mut *slot {
        Slot::Pending(continuations) => {
          if let Some((next, f)) = job.take() {
            let executor = executor.clone();
            continuations.push(Box::new(move |upstream: &Result<T, TaskError>| {
              let upstream = upstream.clone();
              executor.dispatch(next, move || f(upstream));
            }));
          }
          None
        }
        Slot::Done(result) => Some(result.clone()),
        Slot::Taken => Some(Err(TaskError::Consumed)),
      }
    };

    if let (Some(upstream), Some((next, f))) = (ready, job.take()) {
      executor.dispatch(next, move || f(upstream));
    }
    handle
  }
}

/// Rayon-backed executor with a completion channel.
///
/// Clones share the channel and the in-flight counter.
#[derive(Clone)]
pub struct Executor {
  completed_tx: Sender<TaskId>,
  completed_rx: Receiver<TaskId>,
  in_flight: Arc<AtomicUsize>,
}

impl Executor {
  /// Create a new executor. Rayon manages its own thread pool; configure it
  /// with `rayon::ThreadPoolBuilder` before creating the executor if needed.
  pub fn new() -> Self {
    let (completed_tx, completed_rx) = crossbeam_channel::unbounded();
    Self {
      completed_tx,
      completed_rx,
      in_flight: Arc::new(AtomicUsize::new(0)),
    }
  }

  /// Spawn a task on rayon's thread pool (non-blocking).
  pub fn spawn<F, T>(&self, work: F) -> TaskHandle<T>
  where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
  {
    let shared = Arc::new(Shared::new());
    let handle = TaskHandle {
      shared: Arc::clone(&shared),
    };
    self.dispatch(shared, work);
    handle
  }

  fn dispatch<F, T>(&self, shared: Arc<Shared<T>>, work: F)
  where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
  {
    let completions = self.completed_tx.clone();
    let in_flight = Arc::clone(&self.in_flight);
    in_flight.fetch_add(1, Ordering::AcqRel);

    rayon::spawn(move || {
      let result = if shared.cancelled.load(Ordering::Acquire) {
        Err(TaskError::Cancelled)
      } else {
        run_guarded(work)
      };
      shared.complete(result, &completions);
      in_flight.fetch_sub(1, Ordering::AcqRel);
    });
  }

  /// Ids of tasks that finished since the last drain.
  pub fn drain_completed(&self) -> impl Iterator<Item = TaskId> + '_ {
    self.completed_rx.try_iter()
  }

  /// Tasks queued or running.
  pub fn pending_count(&self) -> usize {
    self.in_flight.load(Ordering::Acquire)
  }

  /// Get the number of worker threads in rayon's pool.
  pub fn num_threads(&self) -> usize {
    rayon::current_num_threads()
  }
}

impl Default for Executor {
  fn default() -> Self {
    Self::new()
  }
}

// =============================================================================
// Tests
// =============================================================================
