// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use buddhabrot::render::{write_image, write_pgm};
use buddhabrot::{BuddhaError, ComplexPlane, Pipeline, PipelineConfig};
use clap::{App, Arg, ArgMatches};
use log::{info, warn};
use num::Complex;
use std::io;
use std::str::FromStr;

fn parse_pair<T>(s: &str, separator: char) -> Option<(T, T)>
where
    T: FromStr,
{
    match s.find(separator) {
        None => None,
        Some(index) => match (T::from_str(&s[..index]), T::from_str(&s[index + 1..])) {
            (Ok(l), Ok(r)) => Some((l, r)),
            _ => None,
        },
    }
}

fn parse_complex(s: &str) -> Option<Complex<f64>> {
    match parse_pair(s, ',') {
        Some((re, im)) => Some(Complex { re, im }),
        None => None,
    }
}

/// Either a single number for a square grid, or WIDTHxHEIGHT.
fn parse_size(s: &str) -> Option<(usize, usize)> {
    match usize::from_str(s) {
        Ok(side) => Some((side, side)),
        Err(_) => parse_pair(s, 'x'),
    }
}

fn validate_size(s: String) -> Result<(), String> {
    match parse_size(&s) {
        Some((w, h)) if w > 0 && h > 0 => Ok(()),
        Some(_) => Err("Grid dimensions must be positive".to_string()),
        None => Err("Could not parse grid size; use N or WIDTHxHEIGHT".to_string()),
    }
}

fn validate_complex(s: &str, err: &str) -> Result<(), String> {
    match parse_complex(s) {
        Some(_) => Ok(()),
        None => Err(err.to_string()),
    }
}

fn validate_range<T: FromStr + Ord>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

fn validate_positive(s: String, what: &str) -> Result<(), String> {
    validate_range(
        &s,
        1,
        usize::max_value(),
        &format!("Could not parse {}", what),
        &format!("{} must be at least 1", what),
    )
}

const OUTPUT: &str = "output";
const SIZE: &str = "size";
const POINTS: &str = "points";
const ITERATIONS: &str = "iterations";
const THREADS: &str = "threads";
const CAPACITY: &str = "capacity";
const LEFTLOWER: &str = "leftlower";
const RIGHTUPPER: &str = "rightupper";
const WINDOW_LEFTLOWER: &str = "window-leftlower";
const WINDOW_RIGHTUPPER: &str = "window-rightupper";
const SEED: &str = "seed";
const VERBOSE: &str = "verbose";

// `cpus` is the default thread count; clap borrows it for as long as the
// matches live.
fn args<'a>(cpus: &'a str) -> ArgMatches<'a> {
    App::new("buddha")
        .version("0.3.0")
        .author("Elf M. Sternberg <elf.sternberg@gmail.com>")
        .about("Buddhabrot renderer")
        .arg(
            Arg::with_name(OUTPUT)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .help("Output file (.pgm, .txt, .pnm or .png); plain PGM on stdout if omitted"),
        )
        .arg(
            Arg::with_name(SIZE)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .default_value("512")
                .validator(validate_size)
                .help("Grid size, N for a square or WIDTHxHEIGHT"),
        )
        .arg(
            Arg::with_name(POINTS)
                .long(POINTS)
                .short("p")
                .takes_value(true)
                .default_value("1000000")
                .validator(|s| validate_positive(s, "Point count"))
                .help("Total number of random starting points to sample"),
        )
        .arg(
            Arg::with_name(ITERATIONS)
                .long(ITERATIONS)
                .short("i")
                .takes_value(true)
                .default_value("1000")
                .validator(|s| validate_positive(s, "Iteration count"))
                .help("Maximum iterations per starting point"),
        )
        .arg(
            Arg::with_name(THREADS)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .default_value(cpus)
                .validator(|s| validate_positive(s, "Thread count"))
                .help("Number of producer threads"),
        )
        .arg(
            Arg::with_name(CAPACITY)
                .long(CAPACITY)
                .short("c")
                .takes_value(true)
                .default_value("100")
                .validator(|s| validate_positive(s, "Queue capacity"))
                .help("Trajectories that may wait between producers and the plotter"),
        )
        .arg(
            Arg::with_name(LEFTLOWER)
                .long(LEFTLOWER)
                .allow_hyphen_values(true)
                .short("l")
                .takes_value(true)
                .default_value("-2.0,-1.5")
                .validator(|s| validate_complex(&s, "Could not parse left lower corner"))
                .help("Left lower corner of the sampling domain"),
        )
        .arg(
            Arg::with_name(RIGHTUPPER)
                .long(RIGHTUPPER)
                .allow_hyphen_values(true)
                .short("r")
                .takes_value(true)
                .default_value("1.0,1.5")
                .validator(|s| validate_complex(&s, "Could not parse right upper corner"))
                .help("Right upper corner of the sampling domain"),
        )
        .arg(
            Arg::with_name(WINDOW_LEFTLOWER)
                .long(WINDOW_LEFTLOWER)
                .allow_hyphen_values(true)
                .takes_value(true)
                .default_value("-2.0,-1.5")
                .validator(|s| validate_complex(&s, "Could not parse window left lower corner"))
                .help("Left lower corner of the plotted window"),
        )
        .arg(
            Arg::with_name(WINDOW_RIGHTUPPER)
                .long(WINDOW_RIGHTUPPER)
                .allow_hyphen_values(true)
                .takes_value(true)
                .default_value("1.0,1.5")
                .validator(|s| validate_complex(&s, "Could not parse window right upper corner"))
                .help("Right upper corner of the plotted window"),
        )
        .arg(
            Arg::with_name(SEED)
                .long(SEED)
                .takes_value(true)
                .validator(|s| {
                    u64::from_str(&s)
                        .map(|_| ())
                        .map_err(|_| "Could not parse seed".to_string())
                })
                .help("Seed for a reproducible render"),
        )
        .arg(
            Arg::with_name(VERBOSE)
                .long(VERBOSE)
                .short("v")
                .multiple(true)
                .help("More logging; repeat for more"),
        )
        .get_matches()
}

fn init_logging(verbosity: u64) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

// The validators have already run, so these lookups only fail on a bug.
fn value<T: FromStr>(matches: &ArgMatches, name: &str) -> T {
    matches
        .value_of(name)
        .and_then(|s| T::from_str(s).ok())
        .unwrap_or_else(|| panic!("{} was validated but did not parse", name))
}

fn complex(matches: &ArgMatches, name: &str) -> Complex<f64> {
    matches
        .value_of(name)
        .and_then(parse_complex)
        .unwrap_or_else(|| panic!("{} was validated but did not parse", name))
}

fn config(matches: &ArgMatches) -> PipelineConfig {
    let (width, height) = matches
        .value_of(SIZE)
        .and_then(parse_size)
        .expect("size was validated but did not parse");
    PipelineConfig {
        width,
        height,
        total_points: value(matches, POINTS),
        max_iterations: value(matches, ITERATIONS),
        workers: value(matches, THREADS),
        queue_capacity: value(matches, CAPACITY),
        domain: ComplexPlane(complex(matches, LEFTLOWER), complex(matches, RIGHTUPPER)),
        window: ComplexPlane(
            complex(matches, WINDOW_LEFTLOWER),
            complex(matches, WINDOW_RIGHTUPPER),
        ),
        seed: matches.value_of(SEED).and_then(|s| u64::from_str(s).ok()),
        verbose: matches.occurrences_of(VERBOSE) > 0,
    }
}

fn run(matches: &ArgMatches) -> Result<(), BuddhaError> {
    let pipeline = Pipeline::new(config(matches))?;
    let config = pipeline.config();
    info!(
        "Rendering {}x{} from {} points with {} threads",
        config.width, config.height, config.total_points, config.workers
    );
    let canceller = pipeline.canceller();
    if let Err(e) = ctrlc::set_handler(move || canceller.cancel()) {
        warn!("Could not install the interrupt handler: {}", e);
    }

    let render = pipeline.run()?;
    info!(
        "Render complete: busiest cell visited {} times",
        render.grid.max_value()
    );
    match matches.value_of(OUTPUT) {
        Some(path) => write_image(&render.grid, path),
        None => {
            let stdout = io::stdout();
            let out = io::BufWriter::new(stdout.lock());
            write_pgm(&render.grid, out)
        }
    }
}

fn main() {
    let cpus = num_cpus::get().to_string();
    let matches = args(&cpus);
    init_logging(matches.occurrences_of(VERBOSE));

    if let Err(e) = run(&matches) {
        eprintln!("Render failure: {}", e);
        std::process::exit(1);
    }
}
