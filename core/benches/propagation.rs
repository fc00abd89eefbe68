use std::hint::black_box;

use autosweep_core::*;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

const PRESETS: [(&str, Coord2, CellCount); 3] = [
    ("beginner", (9, 9), 10),
    ("intermediate", (16, 16), 40),
    ("expert", (30, 16), 99),
];

fn play(config: GameConfig, seed: u64, direction: Direction) -> CellCount {
    let mut engine = Engine::new(config, seed).with_direction(direction);
    let center = (config.size.0 / 2, config.size.1 / 2);
    let _ = engine.uncover(center);
    engine.field().naked_count()
}

fn first_click_propagation(c: &mut Criterion) {
    let mut group = c.benchmark_group("first_click");
    for (name, size, mines) in PRESETS {
        let config = GameConfig::new_unchecked(size, mines);
        group.bench_with_input(BenchmarkId::from_parameter(name), &config, |b, &config| {
            let mut seed = 0;
            b.iter(|| {
                seed += 1;
                black_box(play(config, seed, Direction::Lifo))
            });
        });
    }
    group.finish();
}

fn directions(c: &mut Criterion) {
    let config = GameConfig::new_unchecked((30, 16), 99);
    let mut group = c.benchmark_group("direction");
    for direction in Direction::ALL {
        group.bench_with_input(
            BenchmarkId::from_parameter(direction),
            &direction,
            |b, &direction| {
                let mut seed = 0;
                b.iter(|| {
                    seed += 1;
                    black_box(play(config, seed, direction))
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, first_click_propagation, directions);
criterion_main!(benches);
