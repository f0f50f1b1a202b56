#[cfg(feature = "mimalloc-global")]
#[global_allocator]
static GLOBAL_ALLOCATOR: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::time::Instant;

use chunk_life::chunklife::Automaton;
use chunk_life::patterns;
use chunk_life::rules::LifeLike;

type Life = Automaton<bool, LifeLike>;

const SOUP_SEED: u64 = 0x5EED_1234_ABCD_EF01;

struct BenchConfig {
    name: &'static str,
    generations: u64,
    warmup_runs: usize,
    benchmark_runs: usize,
    setup: fn(&mut Life),
}

impl BenchConfig {
    fn new(name: &'static str, generations: u64, setup: fn(&mut Life)) -> Self {
        Self {
            name,
            generations,
            warmup_runs: 1,
            benchmark_runs: 5,
            setup,
        }
    }
}

struct BenchResult {
    name: &'static str,
    generations: u64,
    avg_ms: f64,
    min_ms: f64,
    max_ms: f64,
    std_dev_ms: f64,
    final_chunks: usize,
    final_population: u64,
    evaluated_cells: usize,
}

impl BenchResult {
    fn generations_per_sec(&self) -> f64 {
        if self.avg_ms > 0.0 {
            self.generations as f64 * 1000.0 / self.avg_ms
        } else {
            0.0
        }
    }
}

fn run_once(config: &BenchConfig) -> (f64, Life) {
    let mut life = Automaton::new(LifeLike::conway());
    (config.setup)(&mut life);
    let start = Instant::now();
    life.run(config.generations);
    (start.elapsed().as_secs_f64() * 1000.0, life)
}

fn run_benchmark(config: &BenchConfig, verbose: bool) -> BenchResult {
    for _ in 0..config.warmup_runs {
        std::hint::black_box(run_once(config).1.population());
    }

    let mut times = Vec::with_capacity(config.benchmark_runs);
    let mut last = None;
    for run in 0..config.benchmark_runs {
        let (ms, life) = run_once(config);
        if verbose {
            println!("  run {}: {ms:.3} ms", run + 1);
        }
        times.push(ms);
        last = Some(life);
    }

    let runs = times.len().max(1) as f64;
    let avg_ms = times.iter().sum::<f64>() / runs;
    let min_ms = times.iter().copied().fold(f64::INFINITY, f64::min);
    let max_ms = times.iter().copied().fold(0.0, f64::max);
    let variance = times.iter().map(|t| (t - avg_ms).powi(2)).sum::<f64>() / runs;

    let (final_chunks, final_population, evaluated_cells) = last
        .map(|life| {
            (
                life.active_chunk_count(),
                life.population(),
                life.last_step().candidates,
            )
        })
        .unwrap_or_default();

    BenchResult {
        name: config.name,
        generations: config.generations,
        avg_ms,
        min_ms: if min_ms.is_finite() { min_ms } else { 0.0 },
        max_ms,
        std_dev_ms: variance.sqrt(),
        final_chunks,
        final_population,
        evaluated_cells,
    }
}

fn print_result(result: &BenchResult) {
    println!("{}", result.name);
    println!("  generations:      {}", result.generations);
    println!(
        "  time (ms):        avg {:.3} | min {:.3} | max {:.3} | std dev {:.3}",
        result.avg_ms, result.min_ms, result.max_ms, result.std_dev_ms
    );
    println!("  generations/sec:  {:.1}", result.generations_per_sec());
    println!("  final chunks:     {}", result.final_chunks);
    println!("  final population: {}", result.final_population);
    println!("  cells evaluated in last step: {}", result.evaluated_cells);
}

fn print_summary(results: &[BenchResult]) {
    let best = results
        .iter()
        .map(BenchResult::generations_per_sec)
        .fold(0.0, f64::max);

    println!("\n--- Summary ---");
    println!(
        "{:<28} {:>8} {:>12} {:>12} {:>8} {:>8}",
        "Benchmark", "Gens", "Avg(ms)", "Gen/sec", "Chunks", "Rel"
    );
    println!("{}", "-".repeat(80));
    for result in results {
        let rate = result.generations_per_sec();
        let relative = if best > 0.0 { rate / best * 100.0 } else { 0.0 };
        println!(
            "{:<28} {:>8} {:>12.3} {:>12.1} {:>8} {:>7.1}%",
            result.name, result.generations, result.avg_ms, rate, result.final_chunks, relative
        );
    }
}

fn glider_fleet(life: &mut Life) {
    for i in 0..20 {
        for j in 0..20 {
            patterns::glider(life, i * 10, j * 10);
        }
    }
}

fn scenarios() -> Vec<BenchConfig> {
    vec![
        BenchConfig::new("R-pentomino", 1000, |life| patterns::r_pentomino(life, 0, 0)),
        BenchConfig::new("Small soup 50x50", 100, |life| {
            patterns::random_soup(life, -25, -25, 50, 50, 0.3, SOUP_SEED)
        }),
        BenchConfig::new("Glider fleet 20x20", 100, glider_fleet),
        BenchConfig::new("Medium soup 200x200", 50, |life| {
            patterns::random_soup(life, -100, -100, 200, 200, 0.25, SOUP_SEED)
        }),
        BenchConfig::new("Large sparse 1000x1000", 20, |life| {
            patterns::random_soup(life, -500, -500, 1000, 1000, 0.05, SOUP_SEED)
        }),
        BenchConfig::new("Dense 100x100", 50, |life| {
            patterns::random_soup(life, -50, -50, 100, 100, 0.8, SOUP_SEED)
        }),
        BenchConfig::new("Gosper glider gun", 500, |life| {
            patterns::gosper_glider_gun(life, 0, 0)
        }),
        BenchConfig::new("Large soup 500x500", 10, |life| {
            patterns::random_soup(life, -250, -250, 500, 500, 0.2, SOUP_SEED)
        }),
    ]
}

fn main() {
    let verbose = std::env::args().skip(1).any(|a| a == "-v" || a == "--verbose");

    let mut results = Vec::new();
    for config in scenarios() {
        if verbose {
            println!("running {} ({} generations)", config.name, config.generations);
        }
        let result = run_benchmark(&config, verbose);
        print_result(&result);
        results.push(result);
    }
    print_summary(&results);
}
