//! # Sprite Handle
//!
//! What one actor holds. It keeps a local copy of the sprite's state;
//! every mutator updates that copy, reports it to the position broker,
//! and sends one command to the engine:
//!
//! | mutator                                   | command          |
//! |-------------------------------------------|------------------|
//! | `set_position`, `set_angle`, `set_type`   | `UpdateMinimal`  |
//! | everything else                           | `UpdateFull`     |
//!
//! Angles are degrees here and radians in the engine.

use crossbeam_channel::Receiver;
use swarm_core::{Body, Subscription};
use swarm_engine::{Command, SpriteUpdate};
use swarm_shared::{
    degrees_to_radians, NearMeInfo, SpriteId, SpriteState, UserInput, MAX_LAYER,
};
use tracing::warn;

use crate::sim::{Message, Sim};

/// Per-actor sprite handle.
pub struct Sprite {
    sim: Sim,
    state: SpriteState,
    body: Body,
    inbox: Receiver<Message>,
    input: Option<Subscription<UserInput>>,
}

impl Sprite {
    pub(crate) fn new(sim: Sim, state: SpriteState, inbox: Receiver<Message>) -> Self {
        Self {
            sim,
            state,
            body: Body::new(),
            inbox,
            input: None,
        }
    }

    /// Sprite ID.
    #[must_use]
    pub fn id(&self) -> SpriteId {
        self.state.id
    }

    /// Name given at creation.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.state.name
    }

    /// Local copy of the state.
    #[must_use]
    pub const fn state(&self) -> &SpriteState {
        &self.state
    }

    /// The simulation this sprite belongs to.
    #[must_use]
    pub const fn sim(&self) -> &Sim {
        &self.sim
    }

    /// Whether `delete` was called.
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.state.deleted
    }

    // ------------------------------------------------------------------
    // Minimal updates
    // ------------------------------------------------------------------

    /// Moves the sprite to cartesian `(x, y)`.
    pub fn set_position(&mut self, x: f64, y: f64) {
        if self.rejects_update() {
            return;
        }
        self.state.x = x;
        self.state.y = y;
        self.body.set_position(x, y);
        self.update_minimal();
    }

    /// Rotates the sprite, counter-clockwise in degrees.
    pub fn set_angle(&mut self, degrees: f64) {
        if self.rejects_update() {
            return;
        }
        self.state.angle_degrees = degrees;
        self.body.set_angle(degrees_to_radians(degrees));
        self.update_minimal();
    }

    /// Sets the entity type reported to proximity queries.
    pub fn set_type(&mut self, sprite_type: i32) {
        if self.rejects_update() {
            return;
        }
        self.state.sprite_type = sprite_type;
        self.update_minimal();
    }

    // ------------------------------------------------------------------
    // Full updates
    // ------------------------------------------------------------------

    /// Puts on a registered costume.
    ///
    /// A name never passed to [`Sim::add_costume`] is logged and ignored,
    /// leaving the current costume on.
    pub fn set_costume(&mut self, name: impl Into<String>) {
        if self.rejects_update() {
            return;
        }
        let name = name.into();
        if !self.sim.has_costume(&name) {
            warn!(id = %self.state.id, costume = %name, "unknown costume ignored");
            return;
        }
        self.state.costume = Some(name);
        self.update_full();
    }

    /// Takes the costume off.
    pub fn clear_costume(&mut self) {
        if self.rejects_update() {
            return;
        }
        self.state.costume = None;
        self.update_full();
    }

    /// Moves the sprite to a draw layer, 0 through 9 with 9 on top.
    ///
    /// Anything above 9 is logged and ignored.
    pub fn set_layer(&mut self, layer: u8) {
        if self.rejects_update() {
            return;
        }
        if layer > MAX_LAYER {
            warn!(id = %self.state.id, layer, "layer must be 0 through 9");
            return;
        }
        self.state.layer = layer;
        self.update_full();
    }

    /// Shows or hides the sprite.
    pub fn set_visible(&mut self, visible: bool) {
        if self.rejects_update() {
            return;
        }
        self.state.visible = visible;
        self.update_full();
    }

    /// Scales both axes.
    pub fn set_scale(&mut self, scale: f64) {
        self.set_xy_scale(scale, scale);
    }

    /// Scales each axis separately.
    pub fn set_xy_scale(&mut self, scale_x: f64, scale_y: f64) {
        if self.rejects_update() {
            return;
        }
        self.state.scale_x = scale_x;
        self.state.scale_y = scale_y;
        self.update_full();
    }

    /// Sets opacity: 0 is transparent, 100 is opaque.
    pub fn set_opacity(&mut self, percent: f64) {
        if self.rejects_update() {
            return;
        }
        self.state.opacity = percent;
        self.update_full();
    }

    /// Copies every drawable field from `state` in one update.
    ///
    /// ID, name and the deleted flag are kept. A layer above 9 or an
    /// unregistered costume rejects the whole update.
    pub fn set_all(&mut self, state: &SpriteState) {
        if self.rejects_update() {
            return;
        }
        if state.layer > MAX_LAYER {
            warn!(id = %self.state.id, layer = state.layer, "layer must be 0 through 9");
            return;
        }
        if let Some(costume) = state.costume.as_deref() {
            if !self.sim.has_costume(costume) {
                warn!(id = %self.state.id, costume, "unknown costume ignored");
                return;
            }
        }
        self.state = SpriteState {
            id: self.state.id,
            name: std::mem::take(&mut self.state.name),
            deleted: false,
            ..state.clone()
        };
        self.body.set_position(state.x, state.y);
        self.body.set_angle(degrees_to_radians(state.angle_degrees));
        self.update_full();
    }

    /// Deletes the sprite. Later mutators are logged and ignored.
    pub fn delete(&mut self) {
        if self.state.deleted {
            warn!(id = %self.state.id, "sprite deleted twice");
            return;
        }
        self.state.deleted = true;
        self.state.visible = false;
        self.input = None;
        self.sim.delete_sprite(self.state.id);
    }

    /// Creates a new sprite with this one's state and a copy of its body.
    pub fn clone_as(&self, name: impl Into<String>) -> Self {
        let mut twin = self.sim.add_sprite(name);
        twin.set_all(&self.state);
        twin.replace_body(self.body.clone());
        twin
    }

    // ------------------------------------------------------------------
    // Hit-test body
    // ------------------------------------------------------------------

    /// Click-detection shape.
    #[must_use]
    pub const fn body(&self) -> &Body {
        &self.body
    }

    /// Click-detection shape, for adding circles and rectangles.
    pub fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    /// Swaps in a new body, placed where the sprite is.
    pub fn replace_body(&mut self, mut body: Body) {
        body.set_position(self.state.x, self.state.y);
        body.set_angle(degrees_to_radians(self.state.angle_degrees));
        self.body = body;
    }

    /// Whether a world point hits the sprite's body.
    #[must_use]
    pub fn is_point_in_body(&self, x: f64, y: f64) -> bool {
        self.body.contains(x, y)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Other sprites in the grid cells around this one.
    ///
    /// A superset of the circle of `radius`.
    #[must_use]
    pub fn who_is_near_me(&self, radius: f64) -> Vec<NearMeInfo> {
        let mut near = self
            .sim
            .who_is_near_me(self.state.x, self.state.y, radius);
        near.retain(|info| info.id != self.state.id);
        near
    }

    /// Everything held on the latest input sample.
    #[must_use]
    pub fn pressed_input(&self) -> UserInput {
        self.sim.pressed_input()
    }

    /// Next pending just-pressed event, if any.
    ///
    /// The first call subscribes, so events before it are not seen.
    pub fn just_pressed_input(&mut self) -> Option<UserInput> {
        if self.state.deleted {
            return None;
        }
        let sim = &self.sim;
        self.input
            .get_or_insert_with(|| sim.subscribe_just_pressed())
            .try_recv()
    }

    /// Drains the inbox, oldest first.
    pub fn receive_messages(&self) -> Vec<Message> {
        self.inbox.try_iter().collect()
    }

    // ------------------------------------------------------------------

    fn rejects_update(&self) -> bool {
        if self.state.deleted {
            warn!(id = %self.state.id, "update of deleted sprite ignored");
        }
        self.state.deleted
    }

    fn update_minimal(&self) {
        self.sim.report(&self.state);
        self.sim.submit(Command::UpdateMinimal {
            id: self.state.id,
            x: self.state.x,
            y: self.state.y,
            angle: degrees_to_radians(self.state.angle_degrees),
        });
    }

    fn update_full(&self) {
        self.sim.report(&self.state);
        self.sim.submit(Command::UpdateFull(SpriteUpdate {
            id: self.state.id,
            costume: self.state.costume.clone(),
            x: self.state.x,
            y: self.state.y,
            angle: degrees_to_radians(self.state.angle_degrees),
            layer: self.state.layer,
            visible: self.state.visible,
            scale_x: self.state.scale_x,
            scale_y: self.state.scale_y,
            opacity: self.state.opacity,
        }));
    }
}
