//! Command-line surface of the `futsal` binary.

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use futsal_booking_core::{
    BookingEntry, BookingStatus, DateRange, DisplayNameMode, GameId, GameStatus, NewAbsence,
    NewGame, NewPlayer, Player, PlayerId, Tier,
};
use futsal_booking_runtime::{ActionOutcome, BookingEngine, GameSummary};
use std::io::Write;

/// Parsed command line.
#[derive(Parser, Debug)]
#[command(author, version, about = "Futsal booking status engine")]
pub struct Cli {
    /// Command
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Apply the database migrations
    Migrate,
    /// Manage players
    #[command(subcommand)]
    Player(PlayerCommand),
    /// Manage games
    #[command(subcommand)]
    Game(GameCommand),
    /// Opt a player in or out of a game
    Book {
        /// Player id
        player: i64,
        /// Game id
        game: i64,
        /// `--in` or `--out`
        #[command(flatten)]
        choice: Choice,
    },
    /// Manage absences
    #[command(subcommand)]
    Absence(AbsenceCommand),
    /// Print the booking history of a game
    History {
        /// Game id
        game: i64,
        /// Only show entries of this player
        #[arg(long)]
        player: Option<i64>,
    },
    /// List notifications that failed earlier in this process
    ///
    /// Failures are kept in memory only, so a one-shot invocation always
    /// prints nothing here. Every other command reports its own failed
    /// notifications on stderr before exiting.
    DeadLetters,
}

/// Direction of a booking action.
#[derive(Args, Debug, Clone, Copy, PartialEq, Eq)]
#[group(required = true, multiple = false)]
pub struct Choice {
    /// Opt in
    #[arg(long = "in")]
    pub opt_in: bool,
    /// Opt out
    #[arg(long = "out")]
    pub opt_out: bool,
}

/// `futsal player ...`
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum PlayerCommand {
    /// Register a player
    Add {
        /// Unique login name
        username: String,
        /// Contact e-mail
        #[arg(long)]
        email: String,
        /// Nine-digit mobile number
        #[arg(long)]
        mobile: String,
        /// Given name
        #[arg(long, default_value = "")]
        first_name: String,
        /// Family name
        #[arg(long, default_value = "")]
        last_name: String,
        /// Membership tier
        #[arg(long, default_value = "active")]
        tier: Tier,
    },
    /// List players
    List {
        /// Name fragment (at least two characters)
        #[arg(long)]
        name: Option<String>,
        /// Only players of this tier
        #[arg(long)]
        tier: Option<Tier>,
    },
    /// Change a player's tier
    Tier {
        /// Player id
        player: i64,
        /// New tier
        tier: Tier,
    },
    /// Count players per tier
    Stats,
}

/// `futsal game ...`
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum GameCommand {
    /// Schedule a game
    Add {
        /// Day of the game (YYYY-MM-DD)
        date: NaiveDate,
        /// Free-text description
        #[arg(long, default_value = "")]
        description: String,
        /// Do not create default bookings
        #[arg(long)]
        no_seed: bool,
    },
    /// List upcoming games
    List {
        /// List past games instead
        #[arg(long)]
        past: bool,
    },
    /// Show who is booked for a game
    Show {
        /// Game id
        game: i64,
        /// Print JSON
        #[arg(long)]
        json: bool,
    },
    /// Change a game's status or description
    Update {
        /// Game id
        game: i64,
        /// New status
        #[arg(long)]
        status: Option<GameStatus>,
        /// New description
        #[arg(long)]
        description: Option<String>,
    },
}

/// `futsal absence ...`
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum AbsenceCommand {
    /// Declare an absence
    Add {
        /// Player id
        player: i64,
        /// First day (YYYY-MM-DD)
        start: NaiveDate,
        /// Last day, inclusive (YYYY-MM-DD)
        end: NaiveDate,
        /// Status applied to the covered games
        #[arg(long, default_value = "resting")]
        status: BookingStatus,
        /// Free-text reason
        #[arg(long, default_value = "")]
        reason: String,
    },
    /// List absences
    List {
        /// Only absences of this player
        #[arg(long)]
        player: Option<i64>,
    },
}

/// Output settings of a command run.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    /// Reference date for upcoming/past splits
    pub today: NaiveDate,
    /// How player names are printed
    pub names: DisplayNameMode,
}

/// Runs `command` against `engine`, writing results to `out`.
///
/// # Errors
///
/// Returns the engine's error, or an I/O error from `out`.
pub async fn execute(
    command: Command,
    engine: &BookingEngine,
    settings: Output,
    out: &mut dyn Write,
) -> Result<()> {
    match command {
        Command::Migrate => writeln!(out, "Schema is up to date")?,
        Command::Player(command) => player(command, engine, settings, out).await?,
        Command::Game(command) => game(command, engine, settings, out).await?,
        Command::Book {
            player,
            game,
            choice,
        } => {
            let outcome = engine
                .apply_player_action(PlayerId::new(player), GameId::new(game), choice.opt_in)
                .await?;
            write_outcome(&outcome, out)?;
        }
        Command::Absence(command) => absence(command, engine, out).await?,
        Command::History { game, player } => {
            let game = GameId::new(game);
            let entries = match player {
                Some(player) => engine.player_history(PlayerId::new(player), game).await?,
                None => engine.booking_history(game).await?,
            };
            for entry in &entries {
                write_entry(entry, out)?;
            }
        }
        Command::DeadLetters => write_dead_letters(engine, settings.names, out)?,
    }
    Ok(())
}

async fn player(
    command: PlayerCommand,
    engine: &BookingEngine,
    settings: Output,
    out: &mut dyn Write,
) -> Result<()> {
    match command {
        PlayerCommand::Add {
            username,
            email,
            mobile,
            first_name,
            last_name,
            tier,
        } => {
            let player = engine
                .register_player(NewPlayer {
                    username,
                    first_name,
                    last_name,
                    email,
                    mobile_number: mobile,
                    tier,
                })
                .await?;
            writeln!(out, "Registered player #{} ({})", player.id, player.tier)?;
        }
        PlayerCommand::List { name, tier } => {
            for player in engine.find_players(name.as_deref(), tier).await? {
                write_player(&player, settings.names, out)?;
            }
        }
        PlayerCommand::Tier { player, tier } => {
            let player = engine.change_tier(PlayerId::new(player), tier).await?;
            writeln!(out, "Player #{} is now {}", player.id, player.tier)?;
        }
        PlayerCommand::Stats => {
            let counts = engine.tier_counts().await?;
            writeln!(out, "permanent\t{}", counts.permanent)?;
            writeln!(out, "active\t{}", counts.active)?;
            writeln!(out, "inactive\t{}", counts.inactive)?;
            writeln!(out, "total\t{}", counts.total)?;
        }
    }
    Ok(())
}

async fn game(
    command: GameCommand,
    engine: &BookingEngine,
    settings: Output,
    out: &mut dyn Write,
) -> Result<()> {
    match command {
        GameCommand::Add {
            date,
            description,
            no_seed,
        } => {
            let game = engine
                .create_game(NewGame::planned(date, description), !no_seed)
                .await?;
            writeln!(out, "Scheduled game #{} on {}", game.id, game.date)?;
        }
        GameCommand::List { past } => {
            let games = if past {
                engine.past_games(settings.today).await?
            } else {
                engine.upcoming_games(settings.today).await?
            };
            for game in &games {
                writeln!(
                    out,
                    "{}\t{}\t{}\t{}",
                    game.id, game.date, game.status, game.description
                )?;
            }
        }
        GameCommand::Show { game, json } => {
            let summary = engine.game_summary(GameId::new(game)).await?;
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&summary)?)?;
            } else {
                write_summary(&summary, settings.names, out)?;
            }
        }
        GameCommand::Update {
            game,
            status,
            description,
        } => {
            let game = engine
                .update_game(GameId::new(game), status, description)
                .await?;
            writeln!(out, "Game #{} is {}", game.id, game.status)?;
        }
    }
    Ok(())
}

async fn absence(command: AbsenceCommand, engine: &BookingEngine, out: &mut dyn Write) -> Result<()> {
    match command {
        AbsenceCommand::Add {
            player,
            start,
            end,
            status,
            reason,
        } => {
            let record = engine
                .declare_absence(NewAbsence {
                    player: PlayerId::new(player),
                    range: DateRange::new(start, end)?,
                    status,
                    reason,
                })
                .await?;
            writeln!(
                out,
                "Absence #{} recorded: player #{} {} over {}",
                record.id.get(), record.player, record.status, record.range
            )?;
        }
        AbsenceCommand::List { player } => {
            for record in engine.absences(player.map(PlayerId::new)).await? {
                writeln!(
                    out,
                    "{}\t{}\t{}\t{}\t{}",
                    record.id.get(), record.player, record.range, record.status, record.reason
                )?;
            }
        }
    }
    Ok(())
}

fn write_player(player: &Player, names: DisplayNameMode, out: &mut dyn Write) -> Result<()> {
    writeln!(
        out,
        "{}\t{}\t{}\t{}",
        player.id,
        player.display_name(names),
        player.tier,
        player.email
    )?;
    Ok(())
}

fn write_outcome(outcome: &ActionOutcome, out: &mut dyn Write) -> Result<()> {
    let show = |status: Option<BookingStatus>| status.map_or("none", |s| s.as_str());
    if outcome.changed() {
        writeln!(out, "{} -> {}", show(outcome.previous), show(outcome.status))?;
    } else {
        writeln!(out, "No change ({})", show(outcome.status))?;
    }
    if let Some(promotion) = &outcome.promotion {
        writeln!(out, "Promoted player #{} to {}", promotion.player, promotion.status)?;
    }
    Ok(())
}

fn write_entry(entry: &BookingEntry, out: &mut dyn Write) -> Result<()> {
    writeln!(
        out,
        "{}\t{}\t{}\t{}",
        entry.sequence.value(),
        entry.created_at.to_rfc3339(),
        entry.player,
        entry.status
    )?;
    Ok(())
}

fn write_summary(summary: &GameSummary, names: DisplayNameMode, out: &mut dyn Write) -> Result<()> {
    let list = |players: &[Player]| {
        players
            .iter()
            .map(|p| p.display_name(names))
            .collect::<Vec<_>>()
            .join(", ")
    };

    writeln!(out, "Game #{}: {}", summary.game.id, summary.game)?;
    if !summary.game.description.is_empty() {
        writeln!(out, "{}", summary.game.description)?;
    }
    writeln!(out, "booked: {}", summary.booked)?;
    writeln!(out, "planned: {}", list(&summary.planned))?;
    writeln!(out, "confirmed: {}", list(&summary.confirmed))?;
    writeln!(out, "reserved: {}", list(&summary.reserved))?;
    writeln!(out, "awaiting: {}", list(&summary.awaiting))?;
    writeln!(out, "cancelled: {}", list(&summary.cancelled))?;
    for (cancelled, substitute) in &summary.cancelled_with_substitutes {
        let substitute = substitute
            .as_ref()
            .map_or_else(|| "-".to_string(), |p| p.display_name(names));
        writeln!(out, "  {} -> {}", cancelled.display_name(names), substitute)?;
    }
    Ok(())
}

/// Prints every parked notification.
///
/// # Errors
///
/// Returns an I/O error from `out`.
pub fn write_dead_letters(
    engine: &BookingEngine,
    names: DisplayNameMode,
    out: &mut dyn Write,
) -> Result<()> {
    for letter in engine.dead_letters().snapshot() {
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}",
            letter.failed_at.to_rfc3339(),
            letter.audience,
            letter.change.player.display_name(names),
            letter.change.status,
            letter.error
        )?;
    }
    Ok(())
}
