#[cfg(feature = "mimalloc-global")]
#[global_allocator]
static GLOBAL_ALLOCATOR: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::time::Instant;

use chunk_life::chunklife::{Automaton, AutomatonConfig, CHUNK_SIZE};
use chunk_life::patterns;
use chunk_life::rules::LifeLike;

struct ScaleRun {
    total_ms: f64,
    population: u64,
    chunks: usize,
    dense: usize,
}

fn bench_chunklife(size: i64, density: f64, iterations: u64, threads: Option<usize>) -> ScaleRun {
    let config = match threads {
        Some(n) => AutomatonConfig::default().thread_count(n),
        None => AutomatonConfig::default(),
    };
    let mut life = Automaton::with_config(LifeLike::conway(), false, config);
    patterns::random_soup(&mut life, 0, 0, size, size, density, 0x5EED_1234_ABCD_EF01);

    let start = Instant::now();
    life.run(iterations);
    let duration = start.elapsed();

    ScaleRun {
        total_ms: duration.as_secs_f64() * 1000.0,
        population: life.population(),
        chunks: life.active_chunk_count(),
        dense: life.storage_stats().dense,
    }
}

fn main() {
    let threads = std::env::args()
        .skip(1)
        .skip_while(|a| a != "--threads")
        .nth(1)
        .and_then(|v| v.parse::<usize>().ok());

    let scales: &[(i64, u64)] = &[
        (256, 100),  // 16 chunks, below the parallel threshold
        (512, 100),  // 64 chunks
        (1024, 50),  // 256 chunks
        (2048, 20),  // 1024 chunks
        (4096, 5),   // 4096 chunks
    ];

    println!(
        "{:<10} {:>8} {:>8} {:>12} {:>10} {:>12} {:>8}",
        "Grid", "Chunks", "Iters", "Total(ms)", "Avg(ms)", "Population", "Dense"
    );
    println!("{}", "-".repeat(74));

    let side = CHUNK_SIZE as i64;
    for &(size, iters) in scales {
        let seeded = (size / side) * (size / side);
        let run = bench_chunklife(size, 0.42, iters, threads);
        let avg_ms = run.total_ms / iters as f64;
        println!(
            "{:<10} {:>8} {:>8} {:>12.1} {:>10.4} {:>12} {:>8}",
            format!("{size}x{size}"),
            format!("{seeded}/{}", run.chunks),
            iters,
            run.total_ms,
            avg_ms,
            run.population,
            run.dense
        );
    }
}
