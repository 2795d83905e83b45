//! Grid-backed position index.
//!
//! Locks, always taken in this order:
//!
//! 1. `table`: the ID → record map. Write-locked only to insert or remove
//!    a sprite; every update holds it for reading.
//! 2. one record's `Mutex`, so two updates of the same sprite serialize.
//! 3. one or two cell `RwLock`s to move the sprite between cells.
//!
//! Proximity queries read-lock only the cells they cover and never touch
//! the table or any record.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rand::Rng;
use swarm_shared::{NearMeInfo, SpriteId, SpriteState};
use tracing::{debug, warn};

use super::GridConfig;

/// Last known state of one sprite and the cell it sits in.
struct PositionRecord {
    state: SpriteState,
    cell: usize,
}

type Cell = RwLock<HashMap<SpriteId, NearMeInfo>>;

/// Concurrent index of sprite positions.
///
/// Lags the engine by one message hop: it holds whatever each sprite
/// last reported.
pub struct PositionBroker {
    grid: GridConfig,
    table: RwLock<HashMap<SpriteId, Arc<Mutex<PositionRecord>>>>,
    cells: Vec<Cell>,
}

impl PositionBroker {
    /// Creates an empty index over the requested grid.
    ///
    /// Axes are clamped to at least one cell, and the grid is shrunk along
    /// Y until it holds at most [`GridConfig::MAX_CELLS`] cells.
    #[must_use]
    pub fn new(requested: GridConfig) -> Self {
        let grid = requested.clamped();
        if (grid.cells_x, grid.cells_y) != (requested.cells_x, requested.cells_y) {
            warn!(
                requested_x = requested.cells_x,
                requested_y = requested.cells_y,
                cells_x = grid.cells_x,
                cells_y = grid.cells_y,
                "grid size clamped"
            );
        }
        let cells = (0..grid.cells_x * grid.cells_y)
            .map(|_| RwLock::new(HashMap::new()))
            .collect();
        Self {
            grid,
            table: RwLock::new(HashMap::new()),
            cells,
        }
    }

    /// Grid dimensions in use.
    #[must_use]
    pub const fn grid(&self) -> &GridConfig {
        &self.grid
    }

    /// Registers a sprite in a random cell until its first update.
    pub fn add_sprite(&self, id: SpriteId) {
        let mut table = self.table.write();
        if table.contains_key(&id) {
            warn!(%id, "sprite already in position broker");
            return;
        }

        let cell = rand::thread_rng().gen_range(0..self.cells.len());
        let state = SpriteState::new(id, String::new());
        self.cells[cell].write().insert(id, NearMeInfo::from(&state));
        table.insert(id, Arc::new(Mutex::new(PositionRecord { state, cell })));
        debug!(%id, cell, "sprite added to position broker");
    }

    /// Stores the latest state of a sprite, moving it to a new cell if
    /// its position crossed a cell boundary.
    pub fn update_sprite_info(&self, id: SpriteId, state: &SpriteState) {
        let table = self.table.read();
        let Some(record) = table.get(&id) else {
            warn!(%id, "position update for unknown sprite");
            return;
        };

        let mut record = record.lock();
        let cell = self.grid.cell_index(state.x, state.y);
        let info = NearMeInfo {
            id,
            ..NearMeInfo::from(state)
        };

        if cell == record.cell {
            self.cells[cell].write().insert(id, info);
        } else {
            self.cells[record.cell].write().remove(&id);
            self.cells[cell].write().insert(id, info);
            record.cell = cell;
        }
        record.state.clone_from(state);
        record.state.id = id;
    }

    /// Forgets a sprite. Unknown IDs are ignored.
    pub fn remove_sprite(&self, id: SpriteId) {
        let mut table = self.table.write();
        let Some(record) = table.remove(&id) else {
            debug!(%id, "remove of unknown sprite ignored");
            return;
        };
        let cell = record.lock().cell;
        self.cells[cell].write().remove(&id);
    }

    /// Last reported state, or the deleted sentinel if `id` is unknown.
    #[must_use]
    pub fn sprite_info(&self, id: SpriteId) -> SpriteState {
        let table = self.table.read();
        match table.get(&id) {
            Some(record) => record.lock().state.clone(),
            None => SpriteState::deleted(id),
        }
    }

    /// Every sprite in the cells overlapping the square
    /// `[x - radius, x + radius] × [y - radius, y + radius]`.
    ///
    /// May include sprites outside the circle of `radius`; never omits
    /// one inside it. Filter with [`NearMeInfo::distance_to`] for an
    /// exact answer.
    #[must_use]
    pub fn sprites_near_me(&self, x: f64, y: f64, radius: f64) -> Vec<NearMeInfo> {
        let radius = radius.abs();
        let (col_lo, col_hi) = (self.grid.column(x - radius), self.grid.column(x + radius));
        let (row_lo, row_hi) = (self.grid.row(y - radius), self.grid.row(y + radius));

        let mut found = Vec::new();
        for row in row_lo..=row_hi {
            let base = row * self.grid.cells_x;
            for col in col_lo..=col_hi {
                found.extend(self.cells[base + col].read().values().copied());
            }
        }
        found
    }

    /// Forgets every sprite.
    pub fn clear(&self) {
        let mut table = self.table.write();
        for (id, record) in table.drain() {
            let cell = record.lock().cell;
            self.cells[cell].write().remove(&id);
        }
    }

    /// Number of sprites tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    /// Whether no sprites are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.read().is_empty()
    }
}

impl Default for PositionBroker {
    fn default() -> Self {
        Self::new(GridConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use std::thread;

    fn small() -> PositionBroker {
        PositionBroker::new(GridConfig {
            cells_x: 50,
            cells_y: 50,
            cell_size: 20.0,
        })
    }

    fn state_at(id: u64, x: f64, y: f64) -> SpriteState {
        SpriteState {
            x,
            y,
            ..SpriteState::new(SpriteId::new(id), format!("s{id}"))
        }
    }

    fn ids(found: &[NearMeInfo]) -> Vec<u64> {
        let mut ids: Vec<u64> = found.iter().map(|n| n.id.raw()).collect();
        ids.sort_unstable();
        ids
    }

    #[test]
    fn test_far_edge_scenario() {
        let broker = small();
        let id = SpriteId::new(0);
        broker.add_sprite(id);
        broker.update_sprite_info(id, &state_at(0, 500.0, 0.0));

        assert_eq!(ids(&broker.sprites_near_me(500.0, 0.0, 1.0)), vec![0]);
        assert!(broker.sprites_near_me(-500.0, 0.0, 1.0).is_empty());
    }

    #[test]
    fn test_update_moves_between_cells() {
        let broker = small();
        let id = SpriteId::new(4);
        broker.add_sprite(id);
        broker.update_sprite_info(id, &state_at(4, -200.0, -200.0));
        assert_eq!(ids(&broker.sprites_near_me(-200.0, -200.0, 5.0)), vec![4]);

        broker.update_sprite_info(id, &state_at(4, 200.0, 200.0));
        assert!(broker.sprites_near_me(-200.0, -200.0, 5.0).is_empty());
        let found = broker.sprites_near_me(200.0, 200.0, 5.0);
        assert_eq!(ids(&found), vec![4]);
        assert_eq!(found[0].x, 200.0);
    }

    #[test]
    fn test_sprite_info_and_sentinel() {
        let broker = small();
        let id = SpriteId::new(2);
        broker.add_sprite(id);
        let mut state = state_at(2, 3.0, 4.0);
        state.sprite_type = 7;
        broker.update_sprite_info(id, &state);

        let info = broker.sprite_info(id);
        assert_eq!(info.sprite_type, 7);
        assert_eq!(info.x, 3.0);
        assert!(!info.deleted);

        broker.remove_sprite(id);
        assert!(broker.sprite_info(id).deleted);
        assert!(broker.sprites_near_me(3.0, 4.0, 10.0).is_empty());
        assert!(broker.is_empty());
    }

    #[test]
    fn test_update_unknown_is_ignored() {
        let broker = small();
        broker.update_sprite_info(SpriteId::new(9), &state_at(9, 0.0, 0.0));
        assert!(broker.is_empty());
        assert!(broker.sprites_near_me(0.0, 0.0, 100.0).is_empty());
    }

    #[test]
    fn test_one_cell_per_sprite() {
        let broker = small();
        let id = SpriteId::new(1);
        broker.add_sprite(id);
        for step in 0..40 {
            let x = f64::from(step) * 25.0 - 500.0;
            broker.update_sprite_info(id, &state_at(1, x, -x));
        }
        let everywhere = broker.sprites_near_me(0.0, 0.0, 10_000.0);
        assert_eq!(ids(&everywhere), vec![1]);
    }

    #[test]
    fn test_no_false_negatives() {
        let broker = small();
        let mut rng = StdRng::seed_from_u64(0x5EED);
        let mut positions = Vec::new();
        for raw in 0..300 {
            let id = SpriteId::new(raw);
            let (x, y) = (rng.gen_range(-500.0..500.0), rng.gen_range(-500.0..500.0));
            broker.add_sprite(id);
            broker.update_sprite_info(id, &state_at(raw, x, y));
            positions.push((raw, x, y));
        }

        for _ in 0..50 {
            let (qx, qy) = (rng.gen_range(-500.0..500.0), rng.gen_range(-500.0..500.0));
            let radius = rng.gen_range(0.0..120.0);
            let found = ids(&broker.sprites_near_me(qx, qy, radius));
            for &(raw, x, y) in &positions {
                if (x - qx).hypot(y - qy) <= radius {
                    assert!(found.binary_search(&raw).is_ok(), "missed #{raw}");
                }
            }
        }
    }

    #[test]
    fn test_clear_forgets_everything() {
        let broker = small();
        for raw in 0..10 {
            broker.add_sprite(SpriteId::new(raw));
        }
        assert_eq!(broker.len(), 10);
        broker.clear();
        assert!(broker.is_empty());
        assert!(broker.sprites_near_me(0.0, 0.0, 10_000.0).is_empty());
    }

    #[test]
    fn test_concurrent_updates_and_queries() {
        let broker = Arc::new(small());
        let workers: Vec<_> = (0..8u64)
            .map(|raw| {
                let broker = Arc::clone(&broker);
                thread::spawn(move || {
                    let id = SpriteId::new(raw);
                    broker.add_sprite(id);
                    for step in 0..500 {
                        let x = f64::from(step % 100) * 10.0 - 500.0;
                        broker.update_sprite_info(id, &state_at(raw, x, x));
                        let _ = broker.sprites_near_me(x, x, 30.0);
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(broker.len(), 8);
        let all = broker.sprites_near_me(0.0, 0.0, 10_000.0);
        assert_eq!(all.len(), 8);
    }
}
