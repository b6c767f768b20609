//! Per-entity request state machine.
//!
//! Each visible entity (panel or category view) owns one explicit state cell:
//! Idle, Loading, Ready, or Errored. Transitions are driven only by request
//! completion events. Overlapping in-flight requests are disambiguated by a
//! per-entity generation counter: every request takes the generation current
//! at issue time, and completions from stale generations are discarded, so
//! the latest-issued request always wins and removed entities never receive
//! dangling writes.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

/// Identity of a refreshable entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityId {
    Panel(i64),
    Category(String),
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Panel(id) => write!(f, "panel:{id}"),
            EntityId::Category(name) => write!(f, "category:{name}"),
        }
    }
}

/// Lifecycle of an entity's most recent request.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityState<T> {
    Idle,
    Loading,
    Ready(T),
    Errored(String),
}

#[derive(Debug)]
struct StateCell<T> {
    state: EntityState<T>,
    generation: u64,
}

/// Owning map of entity states, shared between the scheduler's tasks and
/// whoever reads the results.
///
/// Concurrent refreshes of different entities touch different cells and
/// share no other mutable state.
#[derive(Debug)]
pub struct StateStore<T> {
    cells: Arc<Mutex<HashMap<EntityId, StateCell<T>>>>,
}

impl<T> Clone for StateStore<T> {
    fn clone(&self) -> Self {
        Self {
            cells: Arc::clone(&self.cells),
        }
    }
}

impl<T: Clone> Default for StateStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> StateStore<T> {
    pub fn new() -> Self {
        Self {
            cells: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Register an entity without starting a request.
    pub fn register(&self, id: EntityId) {
        let mut cells = self.cells.lock().unwrap();
        cells.entry(id).or_insert(StateCell {
            state: EntityState::Idle,
            generation: 0,
        });
    }

    /// Start a new request for `id`: bumps the generation, marks the entity
    /// Loading, and returns the generation token the completion must present.
    pub fn begin(&self, id: &EntityId) -> u64 {
        let mut cells = self.cells.lock().unwrap();
        let cell = cells.entry(id.clone()).or_insert(StateCell {
            state: EntityState::Idle,
            generation: 0,
        });
        cell.generation += 1;
        cell.state = EntityState::Loading;
        cell.generation
    }

    /// Record a successful completion.
    ///
    /// Returns false (and writes nothing) when the generation is stale or
    /// the entity has been removed.
    pub fn complete(&self, id: &EntityId, generation: u64, value: T) -> bool {
        let mut cells = self.cells.lock().unwrap();
        match cells.get_mut(id) {
            Some(cell) if cell.generation == generation => {
                cell.state = EntityState::Ready(value);
                true
            }
            _ => false,
        }
    }

    /// Record a failed completion, same staleness rules as [`complete`].
    ///
    /// [`complete`]: StateStore::complete
    pub fn fail(&self, id: &EntityId, generation: u64, error: String) -> bool {
        let mut cells = self.cells.lock().unwrap();
        match cells.get_mut(id) {
            Some(cell) if cell.generation == generation => {
                cell.state = EntityState::Errored(error);
                true
            }
            _ => false,
        }
    }

    /// Current state of an entity.
    pub fn get(&self, id: &EntityId) -> Option<EntityState<T>> {
        let cells = self.cells.lock().unwrap();
        cells.get(id).map(|cell| cell.state.clone())
    }

    /// Remove an entity. In-flight completions for it are silently dropped.
    pub fn remove(&self, id: &EntityId) {
        let mut cells = self.cells.lock().unwrap();
        cells.remove(id);
    }

    /// Number of tracked entities.
    pub fn len(&self) -> usize {
        self.cells.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all entity ids currently tracked.
    pub fn entity_ids(&self) -> Vec<EntityId> {
        self.cells.lock().unwrap().keys().cloned().collect()
    }
}
