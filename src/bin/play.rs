use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use maze_chase::constants::TICK_MS;
use maze_chase::engine::{GameEngine, GameEngineOptions};
use maze_chase::score_store::ScoreStore;
use maze_chase::types::{Direction, InputFrame};
use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

#[derive(Debug, Parser)]
#[command(name = "play", about = "Drive a maze-chase game from stdin, one JSON snapshot per tick")]
struct Cli {
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    lives: Option<u32>,
    /// Falls back to HIGH_SCORE_PATH, then `.data/high_score.json`.
    #[arg(long = "high-score-path")]
    high_score_path: Option<PathBuf>,
    /// Print a snapshot every N ticks. Events are never dropped.
    #[arg(long = "snapshot-every", default_value_t = 1)]
    snapshot_every: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Command {
    Move(Direction),
    Toggle,
    Quit,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let high_score_path = cli.high_score_path.clone().unwrap_or_else(|| {
        std::env::var("HIGH_SCORE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(".data/high_score.json"))
    });
    let store = ScoreStore::new(high_score_path);
    let seed = cli.seed.unwrap_or_else(rand::random::<u64>);

    let mut engine = GameEngine::new(GameEngineOptions {
        seed,
        high_score: store.load(),
        initial_lives_override: cli.lives,
    });
    eprintln!(
        "[play] seed {seed}, high score {} from {}",
        engine.high_score(),
        store.path().display()
    );
    println!(
        "{}",
        json!({
            "type": "init",
            "config": engine.config,
            "world": engine.world_init(),
        })
    );

    let (tx, mut rx) = mpsc::channel::<Command>(64);
    spawn_stdin_reader(tx);

    let every = cli.snapshot_every.max(1);
    let mut pending_events = Vec::new();
    let mut interval = tokio::time::interval(Duration::from_millis(TICK_MS));
    loop {
        interval.tick().await;
        let mut commands = Vec::new();
        while let Ok(command) = rx.try_recv() {
            commands.push(command);
        }

        engine.step(TICK_MS, merge_commands(&commands));
        if engine.is_quit_requested() {
            break;
        }

        let mut snapshot = engine.build_snapshot(true);
        pending_events.append(&mut snapshot.events);
        if snapshot.tick % every == 0 {
            snapshot.events = std::mem::take(&mut pending_events);
            println!(
                "{}",
                json!({
                    "type": "state",
                    "snapshot": snapshot,
                })
            );
        }
    }

    match store.save(engine.high_score()) {
        Ok(()) => eprintln!(
            "[play] high score {} saved to {}",
            engine.high_score(),
            store.path().display()
        ),
        Err(error) => eprintln!("[score-store] failed to save high score: {error}"),
    }
}

fn spawn_stdin_reader(tx: mpsc::Sender<Command>) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let Some(command) = parse_command(&line) else {
                        eprintln!("[play] ignoring unknown command: {}", line.trim());
                        continue;
                    };
                    if tx.send(command).await.is_err() {
                        return;
                    }
                }
                Ok(None) | Err(_) => {
                    // closed input ends the session
                    let _ = tx.send(Command::Quit).await;
                    return;
                }
            }
        }
    });
}

fn parse_command(raw: &str) -> Option<Command> {
    let normalized = raw.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "start" | "s" | "pause" | "p" => Some(Command::Toggle),
        "quit" | "q" => Some(Command::Quit),
        other => Direction::parse_move(other)
            .filter(|dir| *dir != Direction::None)
            .map(Command::Move),
    }
}

/// Last heading wins. Any toggle or quit in the batch is honoured once.
fn merge_commands(commands: &[Command]) -> InputFrame {
    let mut frame = InputFrame::default();
    for command in commands {
        match command {
            Command::Move(dir) => frame.heading = Some(*dir),
            Command::Toggle => frame.toggle_start = true,
            Command::Quit => frame.quit = true,
        }
    }
    frame
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_moves_and_controls() {
        assert_eq!(parse_command(" Up "), Some(Command::Move(Direction::Up)));
        assert_eq!(parse_command("l"), Some(Command::Move(Direction::Left)));
        assert_eq!(parse_command("p"), Some(Command::Toggle));
        assert_eq!(parse_command("start"), Some(Command::Toggle));
        assert_eq!(parse_command("QUIT"), Some(Command::Quit));
        assert_eq!(parse_command("none"), None);
        assert_eq!(parse_command("jump"), None);
    }

    #[test]
    fn latest_heading_wins_within_a_tick() {
        let frame = merge_commands(&[
            Command::Move(Direction::Up),
            Command::Toggle,
            Command::Move(Direction::Left),
        ]);
        assert_eq!(frame.heading, Some(Direction::Left));
        assert!(frame.toggle_start);
        assert!(!frame.quit);
    }

    #[test]
    fn empty_batch_is_idle() {
        assert_eq!(merge_commands(&[]), InputFrame::default());
    }
}
