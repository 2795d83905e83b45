//! # Scene Graph
//!
//! One arena of slots per layer plus a side table from sprite ID to its
//! current `(layer, slot)`.
//!
//! ```text
//!   layer 0: [ s3 | -- | s7 | s1 ]      -- = tombstone
//!   layer 1: [ s4 ]
//!   ...
//!   layer 9: [ s2 | s5 ]                painted last, on top
//!
//!   index:   s1 -> (0, 3)   s2 -> (9, 0)   ...
//! ```
//!
//! Moving a sprite to another layer swap-removes it from the old arena.
//! Whatever record lands in the vacated slot has its stored slot and its
//! index entry rewritten in the same call. Deleting leaves a tombstone so
//! no other record moves. Tombstones are compacted away once they
//! outnumber live records.
//!
//! Only the tick thread owns a `Scene`.

use std::collections::HashMap;

use swarm_shared::{MAX_LAYER, NUM_LAYERS, SpriteId};

use crate::costume::CostumeId;
use crate::error::{CommandError, CommandResult};

/// Engine-owned state of one sprite.
///
/// Angles are radians, counter-clockwise.
#[derive(Clone, Debug, PartialEq)]
pub struct SpriteRecord {
    /// Sprite identifier.
    pub id: SpriteId,
    /// Layer holding this record.
    pub layer: u8,
    /// Slot within that layer's arena.
    pub slot: usize,
    /// Costume worn, if any.
    pub costume: Option<CostumeId>,
    /// Cartesian X.
    pub x: f64,
    /// Cartesian Y.
    pub y: f64,
    /// Rotation in radians.
    pub angle: f64,
    /// Horizontal scale.
    pub scale_x: f64,
    /// Vertical scale.
    pub scale_y: f64,
    /// Opacity, 0 through 100.
    pub opacity: f64,
    /// Whether the sprite is drawn.
    pub visible: bool,
}

impl SpriteRecord {
    fn new(id: SpriteId, slot: usize) -> Self {
        Self {
            id,
            layer: 0,
            slot,
            costume: None,
            x: 0.0,
            y: 0.0,
            angle: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            opacity: 100.0,
            visible: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct SlotRef {
    layer: u8,
    slot: usize,
}

/// Layered sprite storage.
#[derive(Debug)]
pub struct Scene {
    layers: [Vec<Option<SpriteRecord>>; NUM_LAYERS],
    index: HashMap<SpriteId, SlotRef>,
    tombstones: usize,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Creates an empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self {
            layers: std::array::from_fn(|_| Vec::new()),
            index: HashMap::new(),
            tombstones: 0,
        }
    }

    /// Live sprites.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether no sprite is alive.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Deleted slots not yet compacted.
    #[must_use]
    pub const fn tombstones(&self) -> usize {
        self.tombstones
    }

    /// Whether `id` is alive.
    #[must_use]
    pub fn contains(&self, id: SpriteId) -> bool {
        self.index.contains_key(&id)
    }

    /// Adds a fresh record on layer 0.
    ///
    /// # Errors
    ///
    /// [`CommandError::DuplicateSprite`] if `id` is already alive.
    pub fn insert(&mut self, id: SpriteId) -> CommandResult<&mut SpriteRecord> {
        if self.index.contains_key(&id) {
            return Err(CommandError::DuplicateSprite(id));
        }
        let arena = &mut self.layers[0];
        let slot = arena.len();
        arena.push(Some(SpriteRecord::new(id, slot)));
        self.index.insert(id, SlotRef { layer: 0, slot });
        arena[slot]
            .as_mut()
            .ok_or(CommandError::UnknownSprite(id))
    }

    /// Record for `id`.
    #[must_use]
    pub fn get(&self, id: SpriteId) -> Option<&SpriteRecord> {
        let at = self.index.get(&id)?;
        self.layers[at.layer as usize].get(at.slot)?.as_ref()
    }

    /// Mutable record for `id`.
    ///
    /// Callers must not change `layer` or `slot` directly; use
    /// [`Scene::move_to_layer`].
    pub fn get_mut(&mut self, id: SpriteId) -> Option<&mut SpriteRecord> {
        let at = self.index.get(&id)?;
        self.layers[at.layer as usize].get_mut(at.slot)?.as_mut()
    }

    /// Moves a sprite to the end of another layer.
    ///
    /// Every field other than `layer` and `slot` is untouched.
    ///
    /// # Errors
    ///
    /// [`CommandError::LayerOutOfRange`] or
    /// [`CommandError::UnknownSprite`]; the scene is unchanged either way.
    pub fn move_to_layer(&mut self, id: SpriteId, layer: u8) -> CommandResult<()> {
        if layer > MAX_LAYER {
            return Err(CommandError::LayerOutOfRange(layer));
        }
        let from = *self.index.get(&id).ok_or(CommandError::UnknownSprite(id))?;
        if from.layer == layer {
            return Ok(());
        }

        let old_arena = &mut self.layers[from.layer as usize];
        let mut record = old_arena
            .swap_remove(from.slot)
            .ok_or(CommandError::UnknownSprite(id))?;

        // Patch whatever got swapped into the hole.
        if let Some(Some(moved)) = old_arena.get_mut(from.slot) {
            moved.slot = from.slot;
            self.index.insert(moved.id, from);
        }

        let new_arena = &mut self.layers[layer as usize];
        let slot = new_arena.len();
        record.layer = layer;
        record.slot = slot;
        new_arena.push(Some(record));
        self.index.insert(id, SlotRef { layer, slot });
        Ok(())
    }

    /// Deletes a sprite, leaving a tombstone in its slot.
    ///
    /// # Errors
    ///
    /// [`CommandError::UnknownSprite`] if `id` isn't alive.
    pub fn remove(&mut self, id: SpriteId) -> CommandResult<SpriteRecord> {
        let at = self.index.remove(&id).ok_or(CommandError::UnknownSprite(id))?;
        let mut record = self.layers[at.layer as usize]
            .get_mut(at.slot)
            .and_then(Option::take)
            .ok_or(CommandError::UnknownSprite(id))?;
        record.visible = false;
        self.tombstones += 1;
        Ok(record)
    }

    /// Drops every sprite and reallocates the arenas.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Squeezes tombstones out once they outnumber live records.
    ///
    /// Returns whether anything was compacted. Paint order within each
    /// layer is preserved.
    pub fn compact_if_sparse(&mut self) -> bool {
        if self.tombstones == 0 || self.tombstones <= self.index.len() {
            return false;
        }
        for (layer, arena) in self.layers.iter_mut().enumerate() {
            arena.retain(Option::is_some);
            for (slot, record) in arena.iter_mut().flatten().enumerate() {
                record.slot = slot;
                self.index.insert(
                    record.id,
                    SlotRef {
                        layer: layer as u8,
                        slot,
                    },
                );
            }
        }
        self.tombstones = 0;
        true
    }

    /// Live records in paint order: layer 0 first, then by slot.
    pub fn paint_order(&self) -> impl Iterator<Item = &SpriteRecord> {
        self.layers.iter().flat_map(|arena| arena.iter().flatten())
    }

    /// Asserts that every record's stored position matches the index.
    #[cfg(test)]
    pub(crate) fn verify(&self) {
        let mut live = 0;
        let mut holes = 0;
        for (layer, arena) in self.layers.iter().enumerate() {
            for (slot, entry) in arena.iter().enumerate() {
                let Some(record) = entry else {
                    holes += 1;
                    continue;
                };
                live += 1;
                assert_eq!(record.layer as usize, layer, "{} layer", record.id);
                assert_eq!(record.slot, slot, "{} slot", record.id);
                assert_eq!(
                    self.index.get(&record.id),
                    Some(&SlotRef {
                        layer: layer as u8,
                        slot
                    }),
                    "{} index",
                    record.id
                );
            }
        }
        assert_eq!(live, self.index.len());
        assert!(holes <= self.tombstones);
    }
}
