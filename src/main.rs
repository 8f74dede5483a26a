//! Roguegrid entry point
//!
//! Loads the blueprint library, drops the player on the ground floor and
//! walks them around with a seeded random policy, printing the player's view.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use glam::IVec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use roguegrid::sim::{Action, Frame, Renderer, TurnEvent, TurnInput, World, turn};
use roguegrid::{BlueprintKind, BlueprintLibrary, NEIGHBOR_OFFSETS, Result, Settings};

const SETTINGS_PATH: &str = "settings.json";
const START_BLUEPRINT: &str = "ground_floor";

/// Walk the player around the built-in dungeon with a seeded random policy
#[derive(Parser, Debug)]
#[command(name = "roguegrid")]
#[command(about = "Roguelike grid with field of view and dynamic lighting", long_about = None)]
struct Cli {
    /// Seed for the random walk
    #[arg(short, long, default_value = "12345")]
    seed: u64,

    /// Number of turns to play
    #[arg(short, long, default_value = "200")]
    turns: u32,

    /// Directory with blueprints.json (built-in blueprints when absent)
    #[arg(short, long)]
    blueprints: Option<PathBuf>,

    /// Print every redraw
    #[arg(short, long)]
    watch: bool,
}

/// Prints every redraw to stdout
struct Terminal;

impl Renderer for Terminal {
    fn redraw(&mut self, frame: &Frame) {
        println!("{}", frame.to_ascii());
    }
}

/// Mostly wander, sometimes poke at a neighbouring cell
fn random_action(rng: &mut Pcg32) -> Action {
    let direction: IVec2 = NEIGHBOR_OFFSETS[rng.random_range(0..NEIGHBOR_OFFSETS.len())];
    if rng.random_range(0..6) == 0 {
        Action::Interact(direction)
    } else {
        Action::Move(direction)
    }
}

fn run(options: &Cli) -> Result<()> {
    let settings = Settings::load(SETTINGS_PATH)?;
    let library = match &options.blueprints {
        Some(dir) => BlueprintLibrary::from_dir(dir)?,
        None => BlueprintLibrary::builtin()?,
    };
    let mut world = World::new(library, settings, &BlueprintKind::new(START_BLUEPRINT))?;
    if options.watch {
        world.set_renderer(Box::new(Terminal));
    }
    log::info!("Game initialized with seed: {}", options.seed);

    let mut rng = Pcg32::seed_from_u64(options.seed);
    let (mut moves, mut interactions, mut transitions) = (0u32, 0u32, 0u32);
    for _ in 0..options.turns {
        let input = TurnInput {
            actor: world.player(),
            action: random_action(&mut rng),
        };
        match turn(&mut world, &input)? {
            TurnEvent::Moved { .. } => moves += 1,
            TurnEvent::Interacted { .. } => interactions += 1,
            TurnEvent::Transitioned(t) => {
                transitions += 1;
                log::info!("Now on {} at {}", t.to, t.arrival);
            }
            _ => {}
        }
    }

    println!("{}", world.frame()?.to_ascii());
    let explored = world.cells_where(|c| c.explored)?.count();
    println!(
        "{} turns: {} moves, {} interactions, {} transitions, {} cells explored on {}",
        options.turns,
        moves,
        interactions,
        transitions,
        explored,
        world.active_kind().map(BlueprintKind::as_str).unwrap_or("?")
    );
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    log::info!("Roguegrid starting...");

    let options = Cli::parse();
    match run(&options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
