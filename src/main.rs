#[cfg(feature = "mimalloc-global")]
#[global_allocator]
static GLOBAL_ALLOCATOR: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::process::ExitCode;
use std::time::Instant;

use chunk_life::chunklife::{Automaton, AutomatonConfig, Rule, RuleParseError};
use chunk_life::patterns;
use chunk_life::render;
use chunk_life::rules::LifeLike;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const USAGE: &str = "usage: chunk-life [--rule B3/S23] [--pattern r-pentomino|glider|gun|soup] \
[--generations N] [--threads N] [--window N] [--seed N]";

#[derive(Debug, thiserror::Error)]
enum ArgError {
    #[error("{0} requires a value")]
    MissingValue(&'static str),
    #[error("{flag} expects a non-negative integer, got {value:?}")]
    InvalidNumber { flag: &'static str, value: String },
    #[error("unknown pattern {0:?} (expected r-pentomino, glider, gun or soup)")]
    UnknownPattern(String),
    #[error("invalid rule: {0}")]
    Rule(#[from] RuleParseError),
    #[error("unknown argument: {0}")]
    Unknown(String),
}

#[derive(Clone, Copy, Debug)]
enum Pattern {
    RPentomino,
    Glider,
    Gun,
    Soup,
}

struct MainArgs {
    rule: LifeLike,
    pattern: Pattern,
    generations: u64,
    window: i64,
    seed: u64,
    config: AutomatonConfig,
}

fn parse_number<T: std::str::FromStr>(flag: &'static str, value: Option<&String>) -> Result<T, ArgError> {
    let value = value.ok_or(ArgError::MissingValue(flag))?;
    value.parse().map_err(|_| ArgError::InvalidNumber {
        flag,
        value: value.clone(),
    })
}

fn parse_args() -> Result<MainArgs, ArgError> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut parsed = MainArgs {
        rule: LifeLike::conway(),
        pattern: Pattern::RPentomino,
        generations: 10,
        window: 20,
        seed: 0x5EED_1234_ABCD_EF01,
        config: AutomatonConfig::default(),
    };

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--rule" => {
                let value = iter.next().ok_or(ArgError::MissingValue("--rule"))?;
                parsed.rule = value.parse()?;
            }
            "--pattern" => {
                let value = iter.next().ok_or(ArgError::MissingValue("--pattern"))?;
                parsed.pattern = match value.to_ascii_lowercase().as_str() {
                    "r-pentomino" | "rpentomino" => Pattern::RPentomino,
                    "glider" => Pattern::Glider,
                    "gun" | "gosper" => Pattern::Gun,
                    "soup" => Pattern::Soup,
                    _ => return Err(ArgError::UnknownPattern(value.clone())),
                };
            }
            "--generations" => parsed.generations = parse_number("--generations", iter.next())?,
            "--threads" => {
                let n: usize = parse_number("--threads", iter.next())?;
                parsed.config = parsed.config.thread_count(n);
            }
            "--window" => parsed.window = parse_number("--window", iter.next())?,
            "--seed" => parsed.seed = parse_number("--seed", iter.next())?,
            other => return Err(ArgError::Unknown(other.to_string())),
        }
    }
    Ok(parsed)
}

fn print_window(automaton: &Automaton<bool, LifeLike>, half: i64) {
    println!("{}", render::summary(automaton));
    print!("{}", render::render_window(automaton, -half, -half, half, half));
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(err) => {
            eprintln!("error: {err}\n{USAGE}");
            return ExitCode::from(2);
        }
    };

    let mut automaton = Automaton::with_config(args.rule, false, args.config);
    match args.pattern {
        Pattern::RPentomino => patterns::r_pentomino(&mut automaton, 10, 10),
        Pattern::Glider => patterns::glider(&mut automaton, 0, 0),
        Pattern::Gun => patterns::gosper_glider_gun(&mut automaton, -18, -5),
        Pattern::Soup => patterns::random_soup(&mut automaton, -16, -16, 32, 32, 0.3, args.seed),
    }

    println!("{} ({})", automaton.rule().name(), args.rule);
    print_window(&automaton, args.window);

    let start = Instant::now();
    automaton.run(args.generations);
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

    println!("\nafter {} generations ({elapsed_ms:.3} ms):", args.generations);
    print_window(&automaton, args.window);
    println!("Generation: {}", automaton.generation());
    println!("Active chunks: {}", automaton.active_chunk_count());

    ExitCode::SUCCESS
}
