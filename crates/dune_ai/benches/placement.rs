//! Placement search and bot update benchmarks.
//!
//! Run with: `cargo bench -p dune_ai`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dune_ai::geometry;
use dune_ai::placement::PlacementSearch;
use dune_ai::{Bot, BotConfig};
use dune_core::house::HouseId;
use dune_core::items::ItemId;
use dune_core::orders::Orders;
use dune_test_utils::fixtures::skirmish_world;

/// Placement of a large and a small structure next to a starting base.
pub fn placement_benchmark(c: &mut Criterion) {
    let world = skirmish_world();
    let rally = geometry::squad_rally_location(&world, HouseId::Atreides);
    let centre = geometry::base_centre(&world, HouseId::Atreides);
    let mut search = PlacementSearch::new();

    c.bench_function("place_star_port", |b| {
        b.iter(|| {
            black_box(search.find_place_location(
                &world,
                HouseId::Atreides,
                ItemId::StarPort,
                rally,
                centre,
            ))
        })
    });

    c.bench_function("place_rocket_turret", |b| {
        b.iter(|| {
            black_box(search.find_place_location(
                &world,
                HouseId::Atreides,
                ItemId::RocketTurret,
                rally,
                centre,
            ))
        })
    });
}

/// One full decision pass.
pub fn update_benchmark(c: &mut Criterion) {
    let world = skirmish_world();
    c.bench_function("bot_update", |b| {
        b.iter(|| {
            let mut bot = Bot::new(HouseId::Harkonnen, BotConfig::default(), &world);
            let mut orders = Orders::new();
            bot.update(&world, &mut orders);
            black_box(orders.len())
        })
    });
}

criterion_group!(benches, placement_benchmark, update_benchmark);
criterion_main!(benches);
