use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use autosweep_core::*;
use clap::Parser;

mod render;
mod settings;

use render::{Summary, TerminalPresenter};
use settings::Settings;

/// Minesweeper that plays itself: uncovers a first cell and lets the
/// solver take it from there.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// What log level to use
    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity,

    #[arg(long)]
    width: Option<Coord>,

    #[arg(long)]
    height: Option<Coord>,

    /// Share of cells holding a mine, in percent
    #[arg(short, long, conflicts_with = "mines")]
    percent: Option<f64>,

    /// Exact number of mines
    #[arg(short, long)]
    mines: Option<CellCount>,

    /// Force a seed instead of random
    #[arg(short, long)]
    seed: Option<u64>,

    /// Queue processing order: lifo, fifo, random, whiplash, north, south,
    /// east or west
    #[arg(short, long)]
    direction: Option<Direction>,

    /// Solve Blocks automatically, even if the settings file turns it off
    #[arg(long, overrides_with = "no_auto")]
    auto: bool,

    /// Do not solve Blocks automatically
    #[arg(long, overrides_with = "auto")]
    no_auto: bool,

    /// Pair up undecided cells, even if the settings file turns it off
    #[arg(long, overrides_with = "no_hyper")]
    hyper: bool,

    /// Do not pair up undecided cells
    #[arg(long, overrides_with = "hyper")]
    no_hyper: bool,

    /// Give up propagating after this many queue steps
    #[arg(long)]
    step_limit: Option<u64>,

    /// First cell to uncover as `x,y`, the center by default
    #[arg(long, value_parser = parse_coords)]
    start: Option<Coord2>,

    /// Flag a cell before the first uncover, can be repeated
    #[arg(long = "flag", value_parser = parse_coords)]
    flags: Vec<Coord2>,

    /// Fixed mine layout as `x,y;x,y;...` instead of random placement
    #[arg(long, value_delimiter = ';', value_parser = parse_coords)]
    replay: Vec<Coord2>,

    /// TOML file with defaults for the options above plus stage emphasis
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Print the board after every change, pausing as the emphasis asks
    #[arg(short, long)]
    watch: bool,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

fn parse_coords(text: &str) -> Result<Coord2> {
    let (x, y) = text
        .split_once(',')
        .ok_or_else(|| anyhow!("expected `x,y`, got {text:?}"))?;
    let x = x.trim().parse().with_context(|| format!("bad x in {text:?}"))?;
    let y = y.trim().parse().with_context(|| format!("bad y in {text:?}"))?;
    Ok((x, y))
}

/// A `--x`/`--no-x` pair over a default from the settings file.
fn toggle(default: bool, on: bool, off: bool) -> bool {
    match (on, off) {
        (true, _) => true,
        (_, true) => false,
        _ => default,
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.verbose.tracing_level_filter())
        .with_writer(std::io::stderr)
        .init();

    let settings = match &args.settings {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    let summary = play(&args, &settings)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{summary}");
    }
    Ok(())
}

fn play(args: &Args, settings: &Settings) -> Result<Summary> {
    let seed = args.seed.unwrap_or_else(rand::random);
    log::debug!("seed: {}", seed);

    let default_size = settings.size();
    let size = (
        args.width.unwrap_or(default_size.0),
        args.height.unwrap_or(default_size.1),
    );

    let mut options = settings.solver;
    options.auto_solve = toggle(options.auto_solve, args.auto, args.no_auto);
    options.hyper_solve = toggle(options.hyper_solve, args.hyper, args.no_hyper);
    if args.step_limit.is_some() {
        options.step_limit = args.step_limit;
    }

    let presenter = TerminalPresenter::new(settings.emphasis, args.watch);
    let engine = if args.replay.is_empty() {
        let density = match (args.mines, args.percent) {
            (Some(count), _) => MineDensity::Count(count),
            (None, Some(percent)) => MineDensity::Percent(percent),
            (None, None) => settings.density(),
        };
        let config = GameConfig::new(size, density).context("Invalid game configuration")?;
        Engine::with_presenter(config, seed, presenter)
    } else {
        Engine::replay_with_presenter(size, &args.replay, seed, presenter)
            .context("Invalid replay layout")?
    };
    let mut engine = engine
        .with_options(options)
        .with_direction(args.direction.unwrap_or(settings.direction));

    for &coords in &args.flags {
        engine
            .toggle_flag(coords)
            .with_context(|| format!("Could not flag {coords:?}"))?;
    }

    let start = args.start.unwrap_or((size.0 / 2, size.1 / 2));
    let outcome = engine
        .uncover(start)
        .with_context(|| format!("Could not uncover {start:?}"))?;
    log::debug!("First uncover at {:?}: {:?}", start, outcome);

    Ok(Summary::new(&engine, seed))
}
