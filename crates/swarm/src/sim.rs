//! # Sim
//!
//! The facade every actor shares. It owns nothing that is drawn: it
//! turns calls into engine commands, keeps the position broker current,
//! and routes messages between sprite inboxes.

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Sender, TrySendError};
use image::RgbaImage;
use parking_lot::RwLock;
use swarm_core::{PositionBroker, Subscription};
use swarm_engine::{load_png, save_png, AudioBackend, Command, DecodeError, EngineHandle};
use swarm_shared::{NearMeInfo, SpriteId, SpriteState, UserInput};
use tracing::{debug, warn};

use crate::config::SimConfig;
use crate::error::{SimError, SimResult};
use crate::sprite::Sprite;

/// A message between actors.
pub type Message = Box<dyn Any + Send>;

struct Entry {
    mailbox: Sender<Message>,
    name: String,
}

/// Live sprites' inboxes and names.
#[derive(Default)]
struct Registry {
    entries: HashMap<SpriteId, Entry>,
    names: HashMap<String, SpriteId>,
}

struct SimInner {
    engine: EngineHandle,
    positions: PositionBroker,
    registry: RwLock<Registry>,
    costumes: RwLock<HashSet<String>>,
    audio: Arc<dyn AudioBackend>,
    config: SimConfig,
}

/// Shared simulation facade. Cheap to clone; hand one to every actor.
#[derive(Clone)]
pub struct Sim {
    inner: Arc<SimInner>,
}

impl Sim {
    /// Wraps an engine handle.
    #[must_use]
    pub fn new(engine: EngineHandle, audio: Arc<dyn AudioBackend>, config: SimConfig) -> Self {
        let positions = PositionBroker::new(config.grid);
        Self {
            inner: Arc::new(SimInner {
                engine,
                positions,
                registry: RwLock::new(Registry::default()),
                costumes: RwLock::new(HashSet::new()),
                audio,
                config,
            }),
        }
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &SimConfig {
        &self.inner.config
    }

    /// Screen width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.inner.config.width
    }

    /// Screen height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.inner.config.height
    }

    /// Creates a sprite: invisible, no costume, layer 0, at the origin.
    ///
    /// Names should be unique; reusing one points name lookups at the
    /// newest sprite. An empty name is replaced with `sprite-<id>`.
    pub fn add_sprite(&self, name: impl Into<String>) -> Sprite {
        let id = self.inner.engine.next_id();
        let mut name = name.into();
        if name.is_empty() {
            name = format!("sprite-{}", id.raw());
        }
        self.submit(Command::AddSprite(id));

        let (mailbox, inbox) = bounded(self.inner.config.mailbox_capacity);
        {
            let mut registry = self.inner.registry.write();
            registry.entries.insert(
                id,
                Entry {
                    mailbox,
                    name: name.clone(),
                },
            );
            if let Some(previous) = registry.names.insert(name.clone(), id) {
                warn!(%name, %previous, %id, "sprite name reused");
            }
        }

        let state = SpriteState::new(id, name);
        self.inner.positions.add_sprite(id);
        self.inner.positions.update_sprite_info(id, &state);
        Sprite::new(self.clone(), state, inbox)
    }

    /// Deletes one sprite. Prefer [`Sprite::delete`].
    pub fn delete_sprite(&self, id: SpriteId) {
        self.inner.positions.remove_sprite(id);
        {
            let mut registry = self.inner.registry.write();
            if let Some(entry) = registry.entries.remove(&id) {
                if registry.names.get(&entry.name) == Some(&id) {
                    registry.names.remove(&entry.name);
                }
            }
        }
        self.submit(Command::DeleteSprite(id));
    }

    /// Deletes every sprite. IDs keep counting up.
    pub fn delete_all(&self) {
        self.submit(Command::DeleteAll);
        self.inner.positions.clear();
        let mut registry = self.inner.registry.write();
        registry.entries.clear();
        registry.names.clear();
    }

    /// Last reported state of a sprite, or the deleted sentinel.
    #[must_use]
    pub fn sprite_state(&self, id: SpriteId) -> SpriteState {
        self.inner.positions.sprite_info(id)
    }

    /// ID of the sprite with this name.
    #[must_use]
    pub fn sprite_id(&self, name: &str) -> Option<SpriteId> {
        self.inner.registry.read().names.get(name).copied()
    }

    /// Last reported state of the sprite with this name.
    ///
    /// # Errors
    ///
    /// [`SimError::UnknownName`] if no live sprite has the name.
    pub fn sprite_state_by_name(&self, name: &str) -> SimResult<SpriteState> {
        let id = self
            .sprite_id(name)
            .ok_or_else(|| SimError::UnknownName(name.to_string()))?;
        Ok(self.sprite_state(id))
    }

    /// Sprites in the grid cells around `(x, y)`.
    ///
    /// A superset of the circle of `radius`; filter with
    /// [`NearMeInfo::distance_to`] for exact results.
    #[must_use]
    pub fn who_is_near_me(&self, x: f64, y: f64, radius: f64) -> Vec<NearMeInfo> {
        self.inner.positions.sprites_near_me(x, y, radius)
    }

    /// Drops a message in a sprite's inbox without blocking.
    ///
    /// # Errors
    ///
    /// [`SimError::UnknownSprite`] if the target is gone,
    /// [`SimError::MailboxFull`] if its inbox is full (the message is lost).
    pub fn send_message<M: Any + Send>(&self, target: SpriteId, payload: M) -> SimResult<()> {
        let registry = self.inner.registry.read();
        let entry = registry
            .entries
            .get(&target)
            .ok_or(SimError::UnknownSprite(target))?;
        match entry.mailbox.try_send(Box::new(payload)) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(SimError::MailboxFull(target)),
            Err(TrySendError::Disconnected(_)) => Err(SimError::UnknownSprite(target)),
        }
    }

    /// Like [`Sim::send_message`], addressing the target by name.
    ///
    /// # Errors
    ///
    /// [`SimError::UnknownName`] plus everything `send_message` returns.
    pub fn send_message_to<M: Any + Send>(&self, name: &str, payload: M) -> SimResult<()> {
        let target = self
            .sprite_id(name)
            .ok_or_else(|| SimError::UnknownName(name.to_string()))?;
        self.send_message(target, payload)
    }

    /// Registers decoded pixels as a costume, replacing any costume with
    /// the same name.
    ///
    /// # Errors
    ///
    /// [`SimError::Engine`] if the engine is gone.
    pub fn add_costume(&self, name: impl Into<String>, image: RgbaImage) -> SimResult<()> {
        let name = name.into();
        self.inner.engine.send(Command::AddCostume {
            name: name.clone(),
            image: Arc::new(image),
        })?;
        // Recorded after the send, so any update naming it queues behind it.
        self.inner.costumes.write().insert(name);
        Ok(())
    }

    /// Whether a costume with this name has been registered.
    #[must_use]
    pub fn has_costume(&self, name: &str) -> bool {
        self.inner.costumes.read().contains(name)
    }

    /// Decodes a PNG on this thread and registers it as a costume.
    ///
    /// # Errors
    ///
    /// [`SimError::Decode`] if the file can't be read or decoded.
    pub fn load_costume(&self, path: impl AsRef<Path>, name: impl Into<String>) -> SimResult<()> {
        let image = load_png(path.as_ref())?;
        self.add_costume(name, image)
    }

    /// Decodes a sound file on this thread and registers it.
    ///
    /// # Errors
    ///
    /// [`SimError::Decode`] if the file can't be read or decoded.
    pub fn add_sound(&self, path: impl AsRef<Path>, name: impl Into<String>) -> SimResult<()> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| DecodeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.add_sound_bytes(name, &bytes)
    }

    /// Decodes in-memory sound data and registers it.
    ///
    /// # Errors
    ///
    /// [`SimError::Decode`] if the backend rejects the data.
    pub fn add_sound_bytes(&self, name: impl Into<String>, bytes: &[u8]) -> SimResult<()> {
        let sound = self.inner.audio.decode(bytes)?;
        self.inner.engine.send(Command::AddSound {
            name: name.into(),
            sound,
        })?;
        Ok(())
    }

    /// Plays a registered sound. `volume` is clamped to 0.0 through 1.0.
    pub fn play_sound(&self, name: impl Into<String>, volume: f64) {
        self.submit(Command::PlaySound {
            name: name.into(),
            volume: volume.clamp(0.0, 1.0),
        });
    }

    /// Everything held on the latest input sample.
    #[must_use]
    pub fn pressed_input(&self) -> UserInput {
        self.inner.engine.pressed_input()
    }

    /// Subscribes to just-pressed input.
    ///
    /// The subscription ends when the host loop exits.
    #[must_use]
    pub fn subscribe_just_pressed(&self) -> Subscription<UserInput> {
        self.inner.engine.input_broker().subscribe()
    }

    /// Ends a just-pressed subscription.
    pub fn unsubscribe_just_pressed(&self, subscription: Subscription<UserInput>) {
        self.inner.engine.input_broker().unsubscribe(subscription);
    }

    /// Waits for the next frame and returns a copy of it.
    ///
    /// # Errors
    ///
    /// [`SimError::Engine`] if the engine is gone or stopped before
    /// drawing.
    pub fn screenshot(&self) -> SimResult<RgbaImage> {
        Ok(self.inner.engine.screenshot()?)
    }

    /// Captures the next frame and writes it to `path` as a PNG.
    ///
    /// # Errors
    ///
    /// [`SimError::Engine`] if no frame arrives, [`SimError::Decode`] if
    /// encoding or writing the file fails.
    pub fn save_screenshot(&self, path: impl AsRef<Path>) -> SimResult<()> {
        let frame = self.screenshot()?;
        save_png(&frame, path.as_ref())?;
        Ok(())
    }

    /// Captures `count` frames, one every `delay`.
    ///
    /// Captures are scheduled `delay` apart counting from the first one; a
    /// slow capture shortens the wait before the next.
    ///
    /// # Errors
    ///
    /// [`SimError::Engine`] if the engine goes away mid-capture.
    pub fn screenshot_frames(&self, delay: Duration, count: usize) -> SimResult<Vec<RgbaImage>> {
        let mut frames = Vec::with_capacity(count);
        let mut next = Instant::now();
        for _ in 0..count {
            frames.push(self.screenshot()?);
            next += delay;
            thread::sleep(next.saturating_duration_since(Instant::now()));
        }
        Ok(frames)
    }

    /// Asks the host loop to stop.
    pub fn exit(&self) {
        self.inner.engine.request_exit();
    }

    /// Whether an exit was requested.
    #[must_use]
    pub fn exit_requested(&self) -> bool {
        self.inner.engine.exit_requested()
    }

    pub(crate) fn report(&self, state: &SpriteState) {
        self.inner.positions.update_sprite_info(state.id, state);
    }

    pub(crate) fn submit(&self, command: Command) {
        let kind = command.kind();
        if self.inner.engine.send(command).is_err() {
            debug!(command = kind, "engine gone, command dropped");
        }
    }
}
