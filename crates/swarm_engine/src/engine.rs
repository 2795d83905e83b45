//! # Engine
//!
//! The single owner of the scene.
//!
//! ```text
//!   actor ─┐
//!   actor ─┼──► command queue (bounded, MPSC) ──► Engine::tick ──► Engine::draw
//!   actor ─┘         blocks when full              drain+apply      layers 0..9
//! ```
//!
//! Actors hold an [`EngineHandle`]: it enqueues commands, hands out
//! sprite IDs and reads the latest input snapshot. Only the thread that
//! owns the [`Engine`] ever touches sprite records.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, Sender};
use image::{Rgba, RgbaImage};
use parking_lot::{Mutex, RwLock};
use swarm_core::Broker;
use swarm_shared::{
    Affine2, SpriteId, UserInput, COMMAND_QUEUE_CAPACITY, INPUT_BUFFER_SIZE, MAX_LAYER,
};
use tracing::{debug, warn};

use crate::canvas::Canvas;
use crate::command::{Command, SpriteUpdate};
use crate::costume::CostumeTable;
use crate::error::{CommandError, CommandResult, EngineError, EngineResult};
use crate::input::{InputTracker, RawInput};
use crate::scene::{Scene, SpriteRecord};
use crate::sound::{AudioBackend, SoundBank};

/// Engine construction parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    /// Screen width in pixels.
    pub width: u32,
    /// Screen height in pixels.
    pub height: u32,
    /// Commands buffered before senders block.
    pub queue_capacity: usize,
    /// Per-subscriber buffer of the just-pressed input broker.
    pub input_buffer: usize,
    /// Colour the screen is cleared to before each draw.
    pub background: [u8; 4],
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 768,
            queue_capacity: COMMAND_QUEUE_CAPACITY,
            input_buffer: INPUT_BUFFER_SIZE,
            background: [0, 0, 0, 255],
        }
    }
}

/// Hands out sprite IDs.
///
/// IDs start at zero, only go up, and are never handed out twice, even
/// across a delete-all.
#[derive(Debug, Default)]
pub struct IdAllocator {
    next: Mutex<u64>,
}

impl IdAllocator {
    /// Creates an allocator starting at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a fresh ID.
    pub fn next_id(&self) -> SpriteId {
        let mut next = self.next.lock();
        let id = SpriteId::new(*next);
        *next += 1;
        id
    }

    /// The ID the next call will return.
    #[must_use]
    pub fn peek(&self) -> SpriteId {
        SpriteId::new(*self.next.lock())
    }
}

/// Thread-safe side of the engine. Cheap to clone.
#[derive(Clone)]
pub struct EngineHandle {
    commands: Sender<Command>,
    ids: Arc<IdAllocator>,
    exit: Arc<AtomicBool>,
    pressed: Arc<RwLock<UserInput>>,
    just_pressed: Broker<UserInput>,
    size: (u32, u32),
}

impl EngineHandle {
    /// Enqueues a command, blocking while the queue is full.
    ///
    /// # Errors
    ///
    /// [`EngineError::Disconnected`] if the engine has been dropped.
    pub fn send(&self, command: Command) -> EngineResult<()> {
        self.commands
            .send(command)
            .map_err(|_| EngineError::Disconnected)
    }

    /// Returns a fresh sprite ID.
    pub fn next_id(&self) -> SpriteId {
        self.ids.next_id()
    }

    /// Asks the host loop to stop after the current step.
    pub fn request_exit(&self) {
        self.exit.store(true, Ordering::Release);
    }

    /// Whether an exit was requested.
    #[must_use]
    pub fn exit_requested(&self) -> bool {
        self.exit.load(Ordering::Acquire)
    }

    /// Waits for the next frame to be drawn and returns a copy of it.
    ///
    /// Must not be called from the thread that drives the engine.
    ///
    /// # Errors
    ///
    /// [`EngineError::Disconnected`] if the engine is gone, or
    /// [`EngineError::ScreenshotDropped`] if it went away before drawing.
    pub fn screenshot(&self) -> EngineResult<RgbaImage> {
        let (reply, frame) = bounded(1);
        self.send(Command::Screenshot(reply))?;
        frame.recv().map_err(|_| EngineError::ScreenshotDropped)
    }

    /// Everything held on the most recent input sample.
    #[must_use]
    pub fn pressed_input(&self) -> UserInput {
        *self.pressed.read()
    }

    /// Broker carrying just-pressed input.
    #[must_use]
    pub const fn input_broker(&self) -> &Broker<UserInput> {
        &self.just_pressed
    }

    /// Screen width and height in pixels.
    #[must_use]
    pub const fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Commands waiting to be applied.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.commands.len()
    }
}

/// What one `tick` did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Commands applied.
    pub applied: usize,
    /// Commands logged and skipped.
    pub skipped: usize,
    /// Whether tombstones were compacted first.
    pub compacted: bool,
}

/// Scene owner. Lives on the host loop's thread.
pub struct Engine {
    commands: Receiver<Command>,
    handle: EngineHandle,
    scene: Scene,
    costumes: CostumeTable,
    sounds: SoundBank,
    audio: Arc<dyn AudioBackend>,
    input: InputTracker,
    screenshots: Vec<Sender<RgbaImage>>,
    background: Rgba<u8>,
    frame: u64,
}

impl Engine {
    /// Creates an engine and its command queue.
    #[must_use]
    pub fn new(config: &EngineConfig, audio: Arc<dyn AudioBackend>) -> Self {
        let (sender, commands) = bounded(config.queue_capacity.max(1));
        let handle = EngineHandle {
            commands: sender,
            ids: Arc::new(IdAllocator::new()),
            exit: Arc::new(AtomicBool::new(false)),
            pressed: Arc::new(RwLock::new(UserInput::default())),
            just_pressed: Broker::new(config.input_buffer),
            size: (config.width, config.height),
        };
        Self {
            commands,
            handle,
            scene: Scene::new(),
            costumes: CostumeTable::new(),
            sounds: SoundBank::new(),
            audio,
            input: InputTracker::new(config.width, config.height),
            screenshots: Vec::new(),
            background: Rgba(config.background),
            frame: 0,
        }
    }

    /// A handle for actors.
    #[must_use]
    pub fn handle(&self) -> EngineHandle {
        self.handle.clone()
    }

    /// Whether an exit was requested through any handle.
    #[must_use]
    pub fn exit_requested(&self) -> bool {
        self.handle.exit_requested()
    }

    /// Engine-owned record of a live sprite.
    #[must_use]
    pub fn sprite(&self, id: SpriteId) -> Option<&SpriteRecord> {
        self.scene.get(id)
    }

    /// Number of live sprites.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.scene.len()
    }

    /// Frames drawn so far.
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// Registered costumes.
    #[must_use]
    pub const fn costumes(&self) -> &CostumeTable {
        &self.costumes
    }

    /// Consumes this tick's raw input sample.
    ///
    /// Updates the polled snapshot and publishes just-pressed input when
    /// anything was newly pressed.
    pub fn feed_input(&mut self, raw: &RawInput) {
        let frame = self.input.update(raw);
        *self.handle.pressed.write() = frame.pressed;
        if frame.just_pressed.any_pressed {
            if let Err(err) = self.handle.just_pressed.publish(frame.just_pressed) {
                debug!(%err, "just-pressed input not published");
            }
        }
    }

    /// Drains the command queue to empty, applying each command in order.
    ///
    /// Commands enqueued while the drain runs are applied in the same
    /// tick. Bad commands are logged and skipped; nothing here stops the
    /// loop.
    pub fn tick(&mut self) -> TickReport {
        let mut report = TickReport {
            compacted: self.scene.compact_if_sparse(),
            ..TickReport::default()
        };

        while let Ok(command) = self.commands.try_recv() {
            let kind = command.kind();
            match self.apply(command) {
                Ok(()) => report.applied += 1,
                Err(err) => {
                    warn!(command = kind, %err, "command skipped");
                    report.skipped += 1;
                }
            }
        }
        report
    }

    fn apply(&mut self, command: Command) -> CommandResult<()> {
        match command {
            Command::AddSprite(id) => {
                self.scene.insert(id)?;
                debug!(%id, "sprite added");
            }
            Command::UpdateMinimal { id, x, y, angle } => {
                let record = self
                    .scene
                    .get_mut(id)
                    .ok_or(CommandError::UnknownSprite(id))?;
                record.x = x;
                record.y = y;
                record.angle = angle;
            }
            Command::UpdateFull(update) => self.apply_full(update)?,
            Command::AddCostume { name, image } => {
                let id = self.costumes.insert(name, image);
                debug!(?id, "costume registered");
            }
            Command::DeleteSprite(id) => {
                self.scene.remove(id)?;
                debug!(%id, "sprite deleted");
            }
            Command::DeleteAll => {
                let removed = self.scene.len();
                self.scene.clear();
                debug!(removed, "all sprites deleted");
            }
            Command::AddSound { name, sound } => self.sounds.insert(name, sound),
            Command::PlaySound { name, volume } => {
                let sound = self
                    .sounds
                    .get(&name)
                    .ok_or(CommandError::UnknownSound(name))?;
                self.audio.play(sound, volume.clamp(0.0, 1.0));
            }
            Command::Screenshot(reply) => self.screenshots.push(reply),
        }
        Ok(())
    }

    /// Validates everything first so a bad update changes nothing.
    fn apply_full(&mut self, update: SpriteUpdate) -> CommandResult<()> {
        let id = update.id;
        if update.layer > MAX_LAYER {
            return Err(CommandError::LayerOutOfRange(update.layer));
        }
        let costume = match update.costume {
            Some(name) => Some(
                self.costumes
                    .id(&name)
                    .ok_or(CommandError::UnknownCostume(name))?,
            ),
            None => None,
        };

        self.scene.move_to_layer(id, update.layer)?;
        let record = self
            .scene
            .get_mut(id)
            .ok_or(CommandError::UnknownSprite(id))?;
        record.costume = costume;
        record.x = update.x;
        record.y = update.y;
        record.angle = update.angle;
        record.visible = update.visible;
        record.scale_x = update.scale_x;
        record.scale_y = update.scale_y;
        record.opacity = update.opacity;
        Ok(())
    }

    /// Paints every visible, costumed sprite, layer 0 first, then answers
    /// pending screenshot requests with the finished frame.
    pub fn draw(&mut self, canvas: &mut dyn Canvas) {
        canvas.clear(self.background);
        let (screen_w, screen_h) = canvas.size();

        for record in self.scene.paint_order() {
            if !record.visible {
                continue;
            }
            let Some(costume) = record.costume.and_then(|id| self.costumes.get(id)) else {
                continue;
            };
            let image = costume.image();
            let transform = placement(record, image.dimensions(), (screen_w, screen_h));
            let alpha = if record.opacity == 100.0 {
                1.0
            } else {
                record.opacity / 100.0
            };
            canvas.draw_image(image, &transform, alpha);
        }

        if !self.screenshots.is_empty() {
            let shot = canvas.capture();
            for reply in self.screenshots.drain(..) {
                let _ = reply.try_send(shot.clone());
            }
        }
        self.frame += 1;
    }
}

/// Screen transform for a sprite's costume.
///
/// Centres the costume on its own origin, scales it, rotates it (angles
/// are counter-clockwise in cartesian space, so the screen rotation is
/// `-angle`), moves the origin to the middle of the screen and finally
/// offsets by the sprite position with Y flipped.
#[must_use]
pub fn placement(record: &SpriteRecord, image: (u32, u32), screen: (u32, u32)) -> Affine2 {
    let (w, h) = (f64::from(image.0), f64::from(image.1));
    let (sw, sh) = (f64::from(screen.0), f64::from(screen.1));
    Affine2::IDENTITY
        .translate(-w / 2.0, -h / 2.0)
        .scale(record.scale_x, record.scale_y)
        .rotate(-record.angle)
        .translate(sw / 2.0, sh / 2.0)
        .translate(record.x, -record.y)
}
