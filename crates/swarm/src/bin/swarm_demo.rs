//! # SWARM Demo
//!
//! A crowd of random walkers, each on its own thread. Walkers that bump
//! into a neighbour send it a greeting. After a few seconds one frame is
//! captured and the simulation exits.
//!
//! Usage: `swarm_demo [config.toml]`. Set `RUST_LOG=debug` for detail.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use image::{Rgba, RgbaImage};
use rand::Rng;
use swarm::{Sim, SimConfig, SilentAudio};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const WALKERS: usize = 500;
const RUN_FOR: Duration = Duration::from_secs(5);

fn dot(radius: u32, color: Rgba<u8>) -> RgbaImage {
    let size = radius * 2;
    let r = f64::from(radius);
    RgbaImage::from_fn(size, size, |x, y| {
        let dx = f64::from(x) + 0.5 - r;
        let dy = f64::from(y) + 0.5 - r;
        if dx.hypot(dy) < r {
            color
        } else {
            Rgba([0, 0, 0, 0])
        }
    })
}

fn walker(sim: &Sim, index: usize) {
    let mut rng = rand::thread_rng();
    let mut me = sim.add_sprite(format!("walker-{index}"));
    me.set_costume(if index % 2 == 0 { "red" } else { "blue" });
    me.set_layer((index % 10) as u8);
    me.set_position(
        rng.gen_range(-f64::from(sim.width()) / 2.0..f64::from(sim.width()) / 2.0),
        rng.gen_range(-f64::from(sim.height()) / 2.0..f64::from(sim.height()) / 2.0),
    );
    me.set_visible(true);
    me.body_mut().add_circle(0.0, 0.0, 4.0);

    let mut greeted = 0usize;
    while !sim.exit_requested() {
        let (x, y) = (me.state().x, me.state().y);
        me.set_position(x + rng.gen_range(-2.0..2.0), y + rng.gen_range(-2.0..2.0));
        me.set_angle(me.state().angle_degrees + 5.0);

        for neighbour in me.who_is_near_me(8.0) {
            if neighbour.distance_to(x, y) < 8.0 {
                // Greetings to a full inbox are dropped.
                let _ = sim.send_message(neighbour.id, me.id());
            }
        }
        greeted += me.receive_messages().len();

        thread::sleep(Duration::from_millis(16));
    }
    tracing::debug!(name = me.name(), greeted, "walker done");
}

fn start(sim: Sim) {
    let costumes = [("red", Rgba([230, 60, 60, 255])), ("blue", Rgba([60, 90, 230, 255]))];
    for (name, color) in costumes {
        if let Err(err) = sim.add_costume(name, dot(5, color)) {
            error!(%err, "failed to add costume");
            sim.exit();
            return;
        }
    }

    for index in 0..WALKERS {
        let sim = sim.clone();
        thread::spawn(move || walker(&sim, index));
    }

    let started = Instant::now();
    thread::sleep(RUN_FOR);
    match sim.screenshot() {
        Ok(frame) => {
            let lit = frame.pixels().filter(|p| p[3] > 0 && p.0 != [0, 0, 0, 255]).count();
            info!(width = frame.width(), height = frame.height(), lit, "captured frame");
        }
        Err(err) => error!(%err, "screenshot failed"),
    }
    info!(elapsed_ms = started.elapsed().as_millis() as u64, "exiting");
    sim.exit();
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => match SimConfig::load(&path) {
            Ok(config) => config,
            Err(err) => {
                error!(%err, "bad config");
                std::process::exit(1);
            }
        },
        None => SimConfig {
            width: 800,
            height: 600,
            grid: swarm::GridConfig {
                cells_x: 100,
                cells_y: 100,
                cell_size: 20.0,
            },
            ..SimConfig::default()
        },
    };

    match swarm::run(config, Arc::new(SilentAudio::new()), start) {
        Ok(stats) => info!(
            frames = stats.frames,
            applied = stats.applied,
            skipped = stats.skipped,
            "done"
        ),
        Err(err) => {
            error!(%err, "simulation failed");
            std::process::exit(1);
        }
    }
}
