//! End-to-end tests: actors drive sprites through `Sim`, the host loop
//! steps the engine, and the engine's view is checked.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::bounded;
use image::{Rgba, RgbaImage};
use swarm::{
    GameLoop, GridConfig, Key, KeySet, RawInput, ScriptedInput, SilentAudio, Sim, SimConfig,
    SimError, SpriteId,
};
use swarm_engine::{load_png, DecodeError, Engine, FrameBuffer};

const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const WAIT: Duration = Duration::from_secs(5);

fn small_config() -> SimConfig {
    SimConfig {
        width: 40,
        height: 40,
        tick_rate: 200,
        command_queue_capacity: 10_000,
        mailbox_capacity: 2,
        grid: GridConfig {
            cells_x: 50,
            cells_y: 50,
            cell_size: 20.0,
        },
        ..SimConfig::default()
    }
}

struct Harness {
    game: GameLoop<FrameBuffer, ScriptedInput>,
    sim: Sim,
    audio: Arc<SilentAudio>,
}

fn harness() -> Harness {
    let config = small_config();
    let audio = Arc::new(SilentAudio::new());
    let engine = Engine::new(&config.engine_config(), audio.clone());
    let sim = Sim::new(engine.handle(), audio.clone(), config.clone());
    let canvas = FrameBuffer::new(config.width, config.height);
    let game = GameLoop::new(engine, canvas, ScriptedInput::new(), config.tick_rate);
    Harness { game, sim, audio }
}

#[test]
fn test_ids_survive_delete_all() {
    let mut h = harness();

    let mut first = h.sim.add_sprite("a");
    assert_eq!(first.id(), SpriteId::new(0));
    first.delete();
    let second = h.sim.add_sprite("b");
    assert_eq!(second.id(), SpriteId::new(1));

    h.sim.delete_all();
    let third = h.sim.add_sprite("c");
    assert_eq!(third.id(), SpriteId::new(2));

    h.game.step();
    assert_eq!(h.game.engine().live_count(), 1);
    assert!(h.game.engine().sprite(third.id()).is_some());
}

#[test]
fn test_live_count_matches_operations() {
    let mut h = harness();
    let mut state = 0x9E37_79B9_7F4A_7C15u64;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        state
    };

    let mut alive = Vec::new();
    let mut name = 0;
    for round in 0..400 {
        match next() % 10 {
            0..=5 => {
                alive.push(h.sim.add_sprite(format!("s{name}")));
                name += 1;
            }
            6..=8 if !alive.is_empty() => {
                let index = (next() % alive.len() as u64) as usize;
                let mut sprite = alive.swap_remove(index);
                sprite.delete();
            }
            9 if round % 50 == 0 => {
                h.sim.delete_all();
                alive.clear();
            }
            _ => {}
        }
        if round % 37 == 0 {
            h.game.step();
        }
    }
    h.game.step();
    assert_eq!(h.game.engine().live_count(), alive.len());
}

#[test]
fn test_state_and_proximity_follow_mutations() {
    let h = harness();
    let mut walker = h.sim.add_sprite("walker");
    let mut other = h.sim.add_sprite("other");
    walker.set_type(3);
    walker.set_position(500.0, 0.0);
    other.set_position(-500.0, 0.0);

    let state = h.sim.sprite_state(walker.id());
    assert_eq!((state.x, state.y, state.sprite_type), (500.0, 0.0, 3));
    assert_eq!(h.sim.sprite_state_by_name("walker").unwrap().id, walker.id());

    let near: Vec<_> = h.sim.who_is_near_me(500.0, 0.0, 1.0).iter().map(|n| n.id).collect();
    assert_eq!(near, vec![walker.id()]);
    assert!(walker.who_is_near_me(1.0).is_empty());

    walker.delete();
    assert!(h.sim.sprite_state(walker.id()).deleted);
    assert!(h.sim.who_is_near_me(500.0, 0.0, 1.0).is_empty());
    assert!(matches!(
        h.sim.sprite_state_by_name("walker"),
        Err(SimError::UnknownName(_))
    ));

    h.sim.delete_all();
    assert!(h.sim.sprite_state(other.id()).deleted);
}

#[test]
fn test_layer_change_keeps_everything_else() {
    let mut h = harness();
    h.sim.add_costume("dot", RgbaImage::from_pixel(2, 2, RED)).unwrap();
    let mut sprite = h.sim.add_sprite("layered");
    sprite.set_costume("dot");
    sprite.set_position(3.5, -2.25);
    sprite.set_angle(30.0);
    sprite.set_xy_scale(2.0, 0.5);
    sprite.set_opacity(40.0);
    sprite.set_visible(true);
    h.game.step();
    let before = h.game.engine().sprite(sprite.id()).unwrap().clone();

    sprite.set_layer(6);
    h.game.step();
    let after = h.game.engine().sprite(sprite.id()).unwrap();

    assert_eq!(after.layer, 6);
    assert_eq!(after.x.to_bits(), before.x.to_bits());
    assert_eq!(after.y.to_bits(), before.y.to_bits());
    assert_eq!(after.angle.to_bits(), before.angle.to_bits());
    assert_eq!(after.scale_x.to_bits(), before.scale_x.to_bits());
    assert_eq!(after.scale_y.to_bits(), before.scale_y.to_bits());
    assert_eq!(after.opacity.to_bits(), before.opacity.to_bits());
    assert_eq!(after.costume, before.costume);
    assert!(after.visible);
}

#[test]
fn test_invalid_layer_and_deleted_sprite_are_ignored() {
    let mut h = harness();
    let mut sprite = h.sim.add_sprite("s");
    sprite.set_layer(10);
    assert_eq!(sprite.state().layer, 0);

    let mut bad = sprite.state().clone();
    bad.layer = 200;
    bad.x = 99.0;
    sprite.set_all(&bad);
    assert_eq!(sprite.state().x, 0.0);

    sprite.delete();
    sprite.set_position(10.0, 10.0);
    sprite.delete();
    assert_eq!(sprite.state().x, 0.0);
    assert!(sprite.is_deleted());

    let report = h.game.step();
    assert_eq!(report.skipped, 0);
    assert_eq!(h.game.engine().live_count(), 0);
}

#[test]
fn test_unnamed_sprites_get_unique_names() {
    let h = harness();
    let first = h.sim.add_sprite("");
    let second = h.sim.add_sprite(String::new());

    assert_eq!(first.name(), format!("sprite-{}", first.id().raw()));
    assert_ne!(first.name(), second.name());
    assert_eq!(h.sim.sprite_id(first.name()), Some(first.id()));
    assert_eq!(h.sim.sprite_id(second.name()), Some(second.id()));
    assert_eq!(h.sim.sprite_id(""), None);
}

#[test]
fn test_unknown_costume_does_not_block_later_updates() {
    let mut h = harness();
    h.sim.add_costume("dot", RgbaImage::from_pixel(2, 2, RED)).unwrap();
    let mut sprite = h.sim.add_sprite("dressed");
    sprite.set_costume("dot");
    sprite.set_costume("missing");
    assert_eq!(sprite.state().costume.as_deref(), Some("dot"));

    let mut bad = sprite.state().clone();
    bad.costume = Some("missing".to_string());
    bad.x = 42.0;
    sprite.set_all(&bad);
    assert_eq!(sprite.state().x, 0.0);

    sprite.set_layer(3);
    sprite.set_visible(true);
    sprite.set_opacity(50.0);
    let report = h.game.step();
    assert_eq!(report.skipped, 0);

    let record = h.game.engine().sprite(sprite.id()).unwrap();
    assert_eq!(record.layer, 3);
    assert!(record.visible);
    assert_eq!(record.opacity, 50.0);
    assert!(record.costume.is_some());
}

#[test]
fn test_mailboxes() {
    let h = harness();
    let receiver = h.sim.add_sprite("receiver");
    let sender = h.sim.add_sprite("sender");

    h.sim.send_message(receiver.id(), 7u32).unwrap();
    h.sim.send_message_to("receiver", String::from("hi")).unwrap();
    assert!(matches!(
        h.sim.send_message(receiver.id(), 8u32),
        Err(SimError::MailboxFull(_))
    ));
    assert!(matches!(
        h.sim.send_message(SpriteId::new(1234), 0u8),
        Err(SimError::UnknownSprite(_))
    ));
    assert!(matches!(
        h.sim.send_message_to("nobody", 0u8),
        Err(SimError::UnknownName(_))
    ));

    let messages = receiver.receive_messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].downcast_ref::<u32>(), Some(&7));
    assert_eq!(messages[1].downcast_ref::<String>().map(String::as_str), Some("hi"));
    assert!(receiver.receive_messages().is_empty());
    assert!(sender.receive_messages().is_empty());
}

#[test]
fn test_clone_copies_state_and_body() {
    let mut h = harness();
    let mut original = h.sim.add_sprite("original");
    original.set_position(10.0, 10.0);
    original.set_layer(4);
    original.body_mut().add_circle(0.0, 0.0, 3.0);

    let mut twin = original.clone_as("twin");
    assert_ne!(twin.id(), original.id());
    assert_eq!(twin.name(), "twin");
    assert_eq!((twin.state().x, twin.state().layer), (10.0, 4));
    assert!(twin.is_point_in_body(11.0, 11.0));

    twin.body_mut().add_circle(50.0, 0.0, 3.0);
    twin.set_position(0.0, 0.0);
    assert!(twin.is_point_in_body(50.0, 0.0));
    assert!(!original.is_point_in_body(60.0, 10.0));

    h.game.step();
    assert_eq!(h.game.engine().sprite(twin.id()).unwrap().layer, 4);
}

#[test]
fn test_just_pressed_reaches_sprite() {
    let mut h = harness();
    let mut sprite = h.sim.add_sprite("listener");
    assert!(sprite.just_pressed_input().is_none());

    let mut keys = KeySet::EMPTY;
    keys.insert(Key::Space);
    h.game.input_mut().push(RawInput {
        keys,
        ..RawInput::default()
    });
    h.game.step();
    assert!(h.sim.pressed_input().key(Key::Space));

    let deadline = Instant::now() + WAIT;
    let event = loop {
        if let Some(event) = sprite.just_pressed_input() {
            break event;
        }
        assert!(Instant::now() < deadline, "no just-pressed event");
        thread::sleep(Duration::from_millis(1));
    };
    assert!(event.key(Key::Space));

    // Released on the next step.
    h.game.step();
    assert!(!h.sim.pressed_input().any_pressed);
}

#[test]
fn test_sounds() {
    let mut h = harness();
    assert!(matches!(
        h.sim.add_sound_bytes("bad", b"not audio"),
        Err(SimError::Decode(_))
    ));
    assert!(matches!(
        h.sim.add_sound("/no/such/file.wav", "missing"),
        Err(SimError::Decode(_))
    ));

    let mut wav = b"RIFF".to_vec();
    wav.extend_from_slice(&[0, 0, 0, 0]);
    wav.extend_from_slice(b"WAVE");
    h.sim.add_sound_bytes("beep", &wav).unwrap();
    h.sim.play_sound("beep", 0.5);
    h.sim.play_sound("unregistered", 0.5);

    let report = h.game.step();
    assert_eq!(report.skipped, 1);
    assert_eq!(h.audio.plays(), 1);
}

#[test]
fn test_run_screenshot_and_end_of_stream() {
    let (done, results) = bounded(1);
    let stats = swarm::run(small_config(), Arc::new(SilentAudio::new()), move |sim| {
        sim.add_costume("red", RgbaImage::from_pixel(4, 4, RED)).unwrap();
        let mut sprite = sim.add_sprite("shown");
        sprite.set_costume("red");
        sprite.set_visible(true);

        let frame = sim.screenshot().unwrap();
        let subscription = sim.subscribe_just_pressed();
        sim.exit();
        // The host loop closes every subscription on exit.
        let ended = subscription.recv().is_none();
        done.send((frame, ended)).unwrap();
    })
    .unwrap();

    let (frame, ended) = results.recv_timeout(WAIT).unwrap();
    assert_eq!(frame.dimensions(), (40, 40));
    assert_eq!(*frame.get_pixel(20, 20), RED);
    assert_eq!(*frame.get_pixel(0, 0), Rgba([0, 0, 0, 255]));
    assert!(ended);
    assert!(stats.frames >= 1);
}

#[test]
fn test_saved_screenshot_and_frame_series() {
    let path = std::env::temp_dir().join(format!("swarm-shot-{}.png", std::process::id()));
    let target = path.clone();
    let (done, results) = bounded(1);
    swarm::run(small_config(), Arc::new(SilentAudio::new()), move |sim| {
        sim.add_costume("red", RgbaImage::from_pixel(4, 4, RED)).unwrap();
        let mut sprite = sim.add_sprite("shown");
        sprite.set_costume("red");
        sprite.set_visible(true);

        let saved = sim.save_screenshot(&target);
        let frames = sim.screenshot_frames(Duration::from_millis(5), 3);
        sim.exit();
        done.send((saved, frames)).unwrap();
    })
    .unwrap();

    let (saved, frames) = results.recv_timeout(WAIT).unwrap();
    saved.unwrap();
    let loaded = load_png(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(loaded.dimensions(), (40, 40));
    assert_eq!(*loaded.get_pixel(20, 20), RED);
    assert_eq!(*loaded.get_pixel(0, 0), Rgba([0, 0, 0, 255]));

    let frames = frames.unwrap();
    assert_eq!(frames.len(), 3);
    assert!(frames.iter().all(|frame| *frame.get_pixel(20, 20) == RED));
}

#[test]
fn test_save_screenshot_to_bad_path() {
    let (done, results) = bounded(1);
    swarm::run(small_config(), Arc::new(SilentAudio::new()), move |sim| {
        let saved = sim.save_screenshot("/definitely/not/here/frame.png");
        sim.exit();
        done.send(saved).unwrap();
    })
    .unwrap();

    let saved = results.recv_timeout(WAIT).unwrap();
    assert!(matches!(saved, Err(SimError::Decode(DecodeError::Io { .. }))));
}

#[test]
fn test_run_rejects_bad_config() {
    let config = SimConfig {
        tick_rate: 0,
        ..small_config()
    };
    let result = swarm::run(config, Arc::new(SilentAudio::new()), |_| {});
    assert!(matches!(result, Err(SimError::Config(_))));
}

#[test]
fn test_many_actors() {
    let mut h = harness();
    let workers: Vec<_> = (0..16_i32)
        .map(|t| {
            let sim = h.sim.clone();
            thread::spawn(move || {
                let mut mine = Vec::new();
                for i in 0..50_i32 {
                    let mut sprite = sim.add_sprite(format!("t{t}-{i}"));
                    sprite.set_position(f64::from(i), f64::from(t));
                    sprite.set_visible(true);
                    mine.push(sprite);
                }
                for sprite in mine.iter_mut().step_by(2) {
                    sprite.delete();
                }
                mine.iter().map(|s| s.id().raw()).collect::<Vec<_>>()
            })
        })
        .collect();

    let mut ids: Vec<u64> = workers
        .into_iter()
        .flat_map(|w| w.join().unwrap())
        .collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 800);

    h.game.step();
    assert_eq!(h.game.engine().live_count(), 400);
}
