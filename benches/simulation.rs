//! Performance benchmarks for ECOGENESIS

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ecogenesis::config::PopulationMode;
use ecogenesis::neural::{BreedingContext, MutationConfig, NeuralNetwork, NUM_OUTPUTS};
use ecogenesis::perception::encode_block;
use ecogenesis::{Config, World};
use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn benchmark_world_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("world_step");

    for population in [40, 100, 200].iter() {
        let mut config = Config::default();
        config.population.mode = PopulationMode::PredatorPrey {
            predators: population / 4,
            prey: population - population / 4,
        };

        let mut world = World::new_with_seed(config, 42).unwrap();

        // Warm up
        world.run(10);

        group.bench_with_input(BenchmarkId::new("population", population), population, |b, _| {
            b.iter(|| {
                world.step();
            });
        });
    }

    group.finish();
}

fn benchmark_network_evaluate(c: &mut Criterion) {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let mut ctx = BreedingContext::new();
    let inputs = [0.5f32; 27];

    let seeded = ctx.seed_genome(27, true, true, 15.0, &mut rng);
    let mut net = NeuralNetwork::new(27);
    net.build(&seeded);

    c.bench_function("network_evaluate_seeded", |b| {
        let mut outputs = [0.0f32; NUM_OUTPUTS];
        b.iter(|| net.evaluate(black_box(&inputs), &mut outputs));
    });

    let mut grown = seeded.clone();
    for _ in 0..10 {
        grown.mutate_add_neuron(&mut ctx, &mut rng);
        grown.mutate_add_connection(&mut ctx, &mut rng);
    }
    let mut grown_net = NeuralNetwork::new(27);
    grown_net.build(&grown);

    c.bench_function("network_evaluate_grown", |b| {
        let mut outputs = [0.0f32; NUM_OUTPUTS];
        b.iter(|| grown_net.evaluate(black_box(&inputs), &mut outputs));
    });
}

fn benchmark_perception(c: &mut Criterion) {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let objects: Vec<Vec2> = (0..100)
        .map(|_| Vec2::new(rng.gen_range(0.0..1500.0), rng.gen_range(0.0..1000.0)))
        .collect();
    let origin = Vec2::new(750.0, 500.0);

    c.bench_function("perception_block_100", |b| {
        let mut out = [0.0f32; 8];
        b.iter(|| {
            encode_block(
                black_box(origin),
                Vec2::X,
                objects.iter().copied(),
                1802.8,
                &mut out,
            )
        });
    });
}

fn benchmark_breeding(c: &mut Criterion) {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let mut ctx = BreedingContext::new();
    let config = MutationConfig::default();
    let a = ctx.seed_genome(27, true, true, 12.0, &mut rng);
    let b_parent = ctx.seed_genome(27, true, true, 18.0, &mut rng);

    c.bench_function("crossover_and_mutate", |b| {
        b.iter(|| {
            let mut child = a.crossover(&b_parent, false, &mut ctx, &mut rng);
            child.mutate(black_box(0.1), &config, &mut ctx, &mut rng);
            child
        });
    });
}

criterion_group!(
    benches,
    benchmark_world_step,
    benchmark_network_evaluate,
    benchmark_perception,
    benchmark_breeding
);
criterion_main!(benches);
