use gcsa::internal;
use gcsa::{Config, Endianness, PathGraph, RefGraph, SequenceChunk, Variant};

use std::time::Instant;
use std::{env, process};

use getopts::Options;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

//-----------------------------------------------------------------------------

fn main() -> Result<(), String> {
    let start = Instant::now();
    let config = BenchmarkConfig::new()?;
    rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .build_global()
        .map_err(|e| e.to_string())?;

    if config.verbose {
        eprintln!(
            "Building a prefix-sorted graph for a random reference of {} bases with {} substitutions",
            config.length, config.variants
        );
    }
    let (reference, variants) = random_input(config.length, config.variants, config.seed);
    let chunks = vec![SequenceChunk {
        len: reference.len(),
        off: 0,
    }];

    let construction = Config {
        threads: config.threads,
        endianness: config.endianness,
        verbose: config.verbose,
        large_index: config.large_index,
        lenient: false,
        spill_base: env::temp_dir().join(format!("gcsa-benchmark-{}", process::id())),
    };

    let phase = Instant::now();
    let graph = RefGraph::new(&reference, &chunks, &variants, &construction)
        .map_err(|x| x.to_string())?;
    internal::report_phase("Reference graph", phase.elapsed());
    if config.verbose {
        eprintln!("{} nodes, {} edges", graph.num_nodes(), graph.num_edges());
    }

    let phase = Instant::now();
    let mut paths = PathGraph::new(&graph, &construction).map_err(|x| x.to_string())?;
    internal::report_phase("Prefix doubling", phase.elapsed());
    if config.verbose {
        eprintln!(
            "{} path nodes after {} generations",
            paths.num_nodes(),
            paths.generation()
        );
    }

    let phase = Instant::now();
    paths.generate_edges(&graph).map_err(|x| x.to_string())?;
    internal::report_phase("Edge generation", phase.elapsed());

    let phase = Instant::now();
    let mut rows = 0;
    let mut f_bits = 0;
    for row in paths.rows() {
        rows += 1;
        f_bits += row.f as usize;
    }
    internal::report_phase("Row emission", phase.elapsed());
    eprintln!("{} rows, {} F bits", rows, f_bits);

    eprintln!("Total time: {:.3} seconds", start.elapsed().as_secs_f64());
    internal::report_memory_usage();
    eprintln!();
    Ok(())
}

//-----------------------------------------------------------------------------

fn random_input(length: usize, variants: usize, seed: u64) -> (Vec<u8>, Vec<Variant>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let reference: Vec<u8> = (0..length).map(|_| rng.gen_range(0..4)).collect();

    let mut positions: Vec<usize> = (0..variants).map(|_| rng.gen_range(0..length)).collect();
    positions.sort_unstable();
    positions.dedup();

    let variants = positions
        .iter()
        .map(|&pos| {
            let alt = (reference[pos] + rng.gen_range(1..4)) % 4;
            Variant::substitution(pos, alt)
        })
        .collect();
    (reference, variants)
}

//-----------------------------------------------------------------------------

struct BenchmarkConfig {
    length: usize,
    variants: usize,
    threads: usize,
    seed: u64,
    endianness: Endianness,
    large_index: bool,
    verbose: bool,
}

impl BenchmarkConfig {
    const LENGTH: usize = 1 << 20;
    const VARIANTS: usize = 1000;
    const MIN_THREADS: usize = 1;
    const MAX_THREADS: usize = 64;

    pub fn new() -> Result<BenchmarkConfig, String> {
        let args: Vec<String> = env::args().collect();
        let program = args[0].clone();

        let mut opts = Options::new();
        opts.optopt("l", "length", "length of the random reference (default 1048576)", "INT");
        opts.optopt("n", "variants", "number of random substitutions (default 1000)", "INT");
        opts.optopt("t", "threads", "number of construction threads (default 1)", "INT");
        opts.optopt("s", "seed", "seed for the random input (default 42)", "INT");
        opts.optflag("b", "big-endian", "write big-endian spill files");
        opts.optflag("", "large", "use 64-bit identifiers in spill files");
        opts.optflag("h", "help", "print this help");
        opts.optflag("v", "verbose", "print progress information");
        let matches = opts.parse(&args[1..]).map_err(|x| x.to_string())?;

        let mut config = BenchmarkConfig {
            length: Self::LENGTH,
            variants: Self::VARIANTS,
            threads: Self::MIN_THREADS,
            seed: 42,
            endianness: Endianness::Little,
            large_index: false,
            verbose: false,
        };
        if matches.opt_present("h") {
            let header = format!("Usage: {} [options]", program);
            eprint!("{}", opts.usage(&header));
            process::exit(0);
        }
        if let Some(s) = matches.opt_str("l") {
            match s.parse::<usize>() {
                Ok(n) => {
                    if n == 0 {
                        return Err("--length: the reference cannot be empty".to_string());
                    }
                    config.length = n;
                }
                Err(f) => {
                    return Err(format!("--length: {}", f));
                }
            }
        }
        if let Some(s) = matches.opt_str("n") {
            match s.parse::<usize>() {
                Ok(n) => config.variants = n,
                Err(f) => {
                    return Err(format!("--variants: {}", f));
                }
            }
        }
        if let Some(s) = matches.opt_str("t") {
            match s.parse::<usize>() {
                Ok(n) => {
                    if !(Self::MIN_THREADS..=Self::MAX_THREADS).contains(&n) {
                        return Err(format!(
                            "--threads: thread count must be between {} and {}",
                            Self::MIN_THREADS,
                            Self::MAX_THREADS
                        ));
                    }
                    config.threads = n;
                }
                Err(f) => {
                    return Err(format!("--threads: {}", f));
                }
            }
        }
        if let Some(s) = matches.opt_str("s") {
            match s.parse::<u64>() {
                Ok(n) => config.seed = n,
                Err(f) => {
                    return Err(format!("--seed: {}", f));
                }
            }
        }
        if matches.opt_present("b") {
            config.endianness = Endianness::Big;
        }
        if matches.opt_present("large") {
            config.large_index = true;
        }
        if matches.opt_present("v") {
            config.verbose = true;
        }

        Ok(config)
    }
}

//-----------------------------------------------------------------------------
