//! Terminal front end: one random battle against the computer.
use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use pokemon_random_battle::battle_logger::{move_label, LogEntry};
use pokemon_random_battle::session::RandomController;
use pokemon_random_battle::{
    battle_rng, load_catalog, BattleConfig, BattleSession, BattleSnapshot, Phase, PlayerController,
    PlayerInput, Presenter, SessionOutcome, Winner,
};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::watch;
use tracing::info;

#[derive(Parser)]
#[command(name = "pokemon-random-battle")]
#[command(about = "Fight a random battle in the terminal", long_about = None)]
#[command(version)]
struct Args {
    /// PokeAPI-shaped catalog snapshot
    #[arg(long, default_value = "data/catalog.json")]
    catalog: PathBuf,

    /// JSON file with battle settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Pokémon per side (1-6)
    #[arg(long)]
    team_size: Option<usize>,

    #[arg(long)]
    seed: Option<u64>,

    /// Let the computer play your side too
    #[arg(long)]
    auto: bool,

    /// Skip reveal delays
    #[arg(long)]
    fast: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut config = BattleConfig::load(args.config.as_deref())?;
    if let Some(size) = args.team_size {
        config.team_size = size;
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if args.fast {
        config.log_delay_ms = 0;
        config.typewriter_char_ms = 0;
    }
    config.validate()?;

    let catalog = load_catalog(&args.catalog)?;
    info!(entries = catalog.len(), team_size = config.team_size, "catalog loaded");

    let mut rng = battle_rng(&config);
    let controller_rng = SmallRng::from_rng(&mut rng)?;
    let mut presenter = TerminalPresenter::new(&config);
    let mut session = BattleSession::initialize(&catalog, &config, rng, &mut presenter).await;

    let (abandon_tx, abandon_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = abandon_tx.send(true);
        }
    });

    let outcome = if args.auto {
        let mut controller = RandomController::new(controller_rng);
        session.run(&mut presenter, &mut controller, abandon_rx).await
    } else {
        let mut controller = StdinController::new();
        session.run(&mut presenter, &mut controller, abandon_rx).await
    };

    match outcome {
        SessionOutcome::Finished(Winner::Error) => anyhow::bail!("battle could not be started"),
        SessionOutcome::Finished(winner) => info!(?winner, "battle finished"),
        SessionOutcome::Abandoned => println!("You left the battle."),
    }
    Ok(())
}

struct TerminalPresenter {
    char_delay: Duration,
    log_delay: Duration,
}

impl TerminalPresenter {
    fn new(config: &BattleConfig) -> Self {
        Self {
            char_delay: config.typewriter_delay(),
            log_delay: config.log_delay(),
        }
    }
}

#[async_trait]
impl Presenter for TerminalPresenter {
    fn progress(&mut self, message: &str) {
        println!("{message}");
    }

    async fn present(&mut self, entry: &LogEntry) {
        if !entry.typewriter {
            println!("{}", entry.message);
            tokio::time::sleep(self.log_delay).await;
            return;
        }
        let mut stdout = std::io::stdout();
        for ch in entry.message.chars() {
            print!("{ch}");
            let _ = stdout.flush();
            tokio::time::sleep(self.char_delay).await;
        }
        println!();
    }
}

struct StdinController {
    lines: Lines<BufReader<Stdin>>,
}

impl StdinController {
    fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

#[async_trait]
impl PlayerController for StdinController {
    async fn choose(
        &mut self,
        snapshot: &BattleSnapshot,
        legal: &[PlayerInput],
    ) -> Option<PlayerInput> {
        print_status(snapshot);
        loop {
            print_menu(snapshot);
            let line = match self.lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) | Err(_) => return None,
            };
            match parse_command(line.trim(), snapshot.phase) {
                Some(Command::Quit) => return None,
                Some(Command::Input(input)) if legal.contains(&input) => return Some(input),
                _ => println!("That is not an option right now."),
            }
        }
    }
}

enum Command {
    Quit,
    Input(PlayerInput),
}

fn parse_command(line: &str, phase: Phase) -> Option<Command> {
    let mut parts = line.split_whitespace();
    let head = parts.next()?.to_ascii_lowercase();
    let slot = |raw: Option<&str>| raw?.parse::<usize>().ok()?.checked_sub(1);
    let command = match head.as_str() {
        "q" | "quit" => Command::Quit,
        "f" | "fight" => Command::Input(PlayerInput::Fight),
        "r" | "run" => Command::Input(PlayerInput::Run),
        "b" | "back" => Command::Input(PlayerInput::Back),
        "s" | "switch" => Command::Input(PlayerInput::ChooseSwitch(slot(parts.next())?)),
        number => {
            let index = slot(Some(number))?;
            if phase == Phase::ForcedSwitch {
                Command::Input(PlayerInput::ChooseSwitch(index))
            } else {
                Command::Input(PlayerInput::ChooseMove(index))
            }
        }
    };
    Some(command)
}

fn print_status(snapshot: &BattleSnapshot) {
    if let Some(opponent) = snapshot.opponent.active() {
        println!(
            "  Foe {:<12} Lv{} HP {}/{}",
            opponent.display_name(),
            opponent.level,
            opponent.current_hp,
            opponent.max_hp
        );
    }
    if let Some(player) = snapshot.player.active() {
        println!(
            "  You {:<12} Lv{} HP {}/{}",
            player.display_name(),
            player.level,
            player.current_hp,
            player.max_hp
        );
    }
}

fn print_menu(snapshot: &BattleSnapshot) {
    match snapshot.phase {
        Phase::PlayerAction => println!("[f] Fight  [s N] Switch  [r] Run  [q] Quit"),
        Phase::MoveSelection => {
            if let Some(active) = snapshot.player.active() {
                for (idx, mv) in active.moves.iter().enumerate() {
                    println!(
                        "  [{}] {:<16} {:<9} power {:>3}  pp {}",
                        idx + 1,
                        move_label(&mv.name),
                        mv.move_type,
                        mv.power.unwrap_or(0),
                        mv.pp
                    );
                }
            }
            println!("  [b] Back");
        }
        Phase::ForcedSwitch => print_bench(snapshot),
        _ => {}
    }
    if snapshot.phase == Phase::PlayerAction && snapshot.player.len() > 1 {
        print_bench(snapshot);
    }
}

fn print_bench(snapshot: &BattleSnapshot) {
    for (idx, member) in snapshot.player.members().iter().enumerate() {
        let marker = if idx == snapshot.player_active {
            "*"
        } else if member.is_fainted {
            "x"
        } else {
            " "
        };
        println!(
            "  {marker}[{}] {:<12} HP {}/{}",
            idx + 1,
            member.display_name(),
            member.current_hp,
            member.max_hp
        );
    }
}
