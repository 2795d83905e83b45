//! # Command Drain Benchmark
//!
//! How long one tick takes to apply a full queue of updates, and how the
//! layer-move path compares with the minimal position update.

#![allow(missing_docs)]

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use swarm_engine::{Command, Engine, EngineConfig, SilentAudio, SpriteUpdate};
use swarm_shared::SpriteId;

const SPRITES: u64 = 10_000;

fn engine_with_sprites() -> (Engine, Vec<SpriteId>) {
    let config = EngineConfig {
        queue_capacity: 200_000,
        ..EngineConfig::default()
    };
    let mut engine = Engine::new(&config, Arc::new(SilentAudio::new()));
    let handle = engine.handle();
    let ids: Vec<_> = (0..SPRITES)
        .map(|_| {
            let id = handle.next_id();
            handle.send(Command::AddSprite(id)).ok();
            id
        })
        .collect();
    engine.tick();
    (engine, ids)
}

fn bench_minimal_updates(c: &mut Criterion) {
    c.bench_function("drain_10k_update_minimal", |b| {
        b.iter_batched(
            || {
                let (engine, ids) = engine_with_sprites();
                let handle = engine.handle();
                for (i, &id) in ids.iter().enumerate() {
                    let step = i as f64;
                    handle
                        .send(Command::UpdateMinimal {
                            id,
                            x: step,
                            y: -step,
                            angle: step * 0.01,
                        })
                        .ok();
                }
                engine
            },
            |mut engine| black_box(engine.tick()),
            BatchSize::LargeInput,
        );
    });
}

fn bench_layer_moves(c: &mut Criterion) {
    c.bench_function("drain_10k_layer_moves", |b| {
        b.iter_batched(
            || {
                let (engine, ids) = engine_with_sprites();
                let handle = engine.handle();
                for (i, &id) in ids.iter().enumerate() {
                    handle
                        .send(Command::UpdateFull(SpriteUpdate {
                            id,
                            costume: None,
                            x: 0.0,
                            y: 0.0,
                            angle: 0.0,
                            layer: (i % 10) as u8,
                            visible: true,
                            scale_x: 1.0,
                            scale_y: 1.0,
                            opacity: 100.0,
                        }))
                        .ok();
                }
                engine
            },
            |mut engine| black_box(engine.tick()),
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(benches, bench_minimal_updates, bench_layer_moves);
criterion_main!(benches);
