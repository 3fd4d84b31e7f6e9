use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::Parser;
use maze_chase::constants::{TICK_MS, TICK_RATE};
use maze_chase::engine::{GameEngine, GameEngineOptions};
use maze_chase::maze::GridGraph;
use maze_chase::rng::Rng;
use maze_chase::types::{
    CellPos, Direction, GhostState, InputFrame, PelletKind, RuntimeEvent, Snapshot,
};
use serde::Serialize;
use serde_json::{json, Value};

#[derive(Debug, Parser)]
#[command(name = "simulate", about = "Headless maze-chase runs with invariant checks")]
struct Cli {
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    minutes: Option<u32>,
    #[arg(long)]
    lives: Option<u32>,
    #[arg(long)]
    single: bool,
    #[arg(long = "run-id")]
    run_id: Option<String>,
    #[arg(long = "summary-out")]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug)]
struct Scenario {
    name: String,
    seed: u64,
    minutes: u32,
    lives: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum FinishReason {
    GameOver,
    TickLimit,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScenarioResultLine {
    scenario: String,
    seed: u64,
    minutes: u32,
    lives: u32,
    reason: FinishReason,
    ticks: u64,
    duration_ms: u64,
    final_score: u32,
    high_score: u32,
    rounds_cleared: u32,
    pellets_eaten: u32,
    power_pellets: u32,
    ghosts_eaten: u32,
    deaths: u32,
    path_failures: u64,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug)]
struct ScenarioRunResult {
    result: ScenarioResultLine,
    anomaly_records: Vec<AnomalyRecord>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RunSummary {
    run_id: String,
    started_at_ms: u64,
    finished_at_ms: u64,
    scenario_count: usize,
    anomaly_count: usize,
    average_score: u32,
    reason_counts: BTreeMap<String, usize>,
    scenarios: Vec<ScenarioResultLine>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StructuredLogLine {
    timestamp_ms: u64,
    level: String,
    event: String,
    run_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    scenario: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tick: Option<u64>,
    details: Value,
}

/// Greedy player policy. Flees hunters within 3 cells, otherwise heads for pellet cells.
struct Autopilot {
    rng: Rng,
    think_at_ms: u64,
}

impl Autopilot {
    fn new(seed: u64) -> Self {
        Self {
            rng: Rng::new(seed ^ 0x5eed_a070),
            think_at_ms: 0,
        }
    }

    fn decide(&mut self, graph: &GridGraph, snapshot: &Snapshot) -> InputFrame {
        if snapshot.game_over || !snapshot.player.alive || snapshot.elapsed_ms < self.think_at_ms {
            return InputFrame::default();
        }
        self.think_at_ms = snapshot.elapsed_ms + self.rng.int(60, 160) as u64;

        let here = snapshot.player.cell;
        let options: Vec<(Direction, CellPos)> = Direction::CARDINAL
            .into_iter()
            .filter_map(|dir| {
                graph
                    .neighbor(here, dir)
                    .filter(|cell| graph.is_walkable(*cell))
                    .map(|cell| (dir, cell))
            })
            .collect();
        if options.is_empty() {
            return InputFrame::default();
        }

        let hunters: Vec<CellPos> = snapshot
            .ghosts
            .iter()
            .filter(|ghost| matches!(ghost.state, GhostState::Scatter | GhostState::Chase))
            .map(|ghost| ghost.cell)
            .collect();
        let nearest_hunter = |cell: CellPos| {
            hunters
                .iter()
                .map(|hunter| graph.distance(cell, *hunter))
                .min()
                .unwrap_or(u32::MAX)
        };

        if nearest_hunter(here) <= 3 {
            let safest = options
                .iter()
                .max_by_key(|(_, cell)| nearest_hunter(*cell))
                .map(|(dir, _)| *dir);
            if let Some(dir) = safest {
                return InputFrame::heading(dir);
            }
        }

        let reverse = snapshot.player.heading.opposite();
        let with_pellet: Vec<Direction> = options
            .iter()
            .filter(|(_, cell)| graph.pellet_at(*cell) != PelletKind::None)
            .map(|(dir, _)| *dir)
            .collect();
        if !with_pellet.is_empty() {
            return InputFrame::heading(with_pellet[self.rng.pick_index(with_pellet.len())]);
        }

        let forward: Vec<Direction> = options
            .iter()
            .map(|(dir, _)| *dir)
            .filter(|dir| *dir != reverse)
            .collect();
        let pool = if forward.is_empty() {
            options.iter().map(|(dir, _)| *dir).collect::<Vec<_>>()
        } else {
            forward
        };
        InputFrame::heading(pool[self.rng.pick_index(pool.len())])
    }
}

fn main() {
    let cli = Cli::parse();
    let scenarios = resolve_scenarios(&cli);
    let run_started_at_ms = now_ms();
    let seed_hint = scenarios.first().map(|scenario| scenario.seed).unwrap_or(0);
    let run_id = cli
        .run_id
        .clone()
        .unwrap_or_else(|| default_run_id(seed_hint, run_started_at_ms));
    let mut has_anomaly = false;
    let mut scenario_results = Vec::new();
    let mut reason_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total_anomalies = 0usize;

    for scenario in scenarios {
        emit_log(
            "info",
            "scenario_started",
            &run_id,
            Some(&scenario.name),
            Some(scenario.seed),
            None,
            json!({
                "minutes": scenario.minutes,
                "lives": scenario.lives,
            }),
        );
        let scenario_run = run_scenario(&scenario);

        for anomaly in &scenario_run.anomaly_records {
            emit_log(
                "warn",
                "anomaly_detected",
                &run_id,
                Some(&scenario.name),
                Some(scenario.seed),
                Some(anomaly.tick),
                json!({
                    "message": anomaly.message,
                }),
            );
        }

        if !scenario_run.result.anomalies.is_empty() {
            has_anomaly = true;
        }
        total_anomalies += scenario_run.anomaly_records.len();
        *reason_counts
            .entry(finish_reason_key(scenario_run.result.reason))
            .or_insert(0) += 1;

        emit_log(
            "info",
            "scenario_finished",
            &run_id,
            Some(&scenario.name),
            Some(scenario.seed),
            Some(scenario_run.result.ticks),
            json!({
                "reason": scenario_run.result.reason,
                "finalScore": scenario_run.result.final_score,
                "roundsCleared": scenario_run.result.rounds_cleared,
                "anomalyCount": scenario_run.anomaly_records.len(),
            }),
        );

        println!(
            "{}",
            serde_json::to_string(&scenario_run.result).expect("scenario result should serialize")
        );
        scenario_results.push(scenario_run.result);
    }

    let summary = build_run_summary(
        run_id.clone(),
        run_started_at_ms,
        now_ms(),
        scenario_results,
        reason_counts,
        total_anomalies,
    );

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                &run_id,
                None,
                None,
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    emit_log(
        "info",
        "run_finished",
        &run_id,
        None,
        None,
        None,
        json!({
            "scenarioCount": summary.scenario_count,
            "anomalyCount": summary.anomaly_count,
            "averageScore": summary.average_score,
            "reasonCounts": summary.reason_counts,
            "summaryOut": summary_out_written,
        }),
    );

    if has_anomaly {
        std::process::exit(1);
    }
}

fn run_scenario(scenario: &Scenario) -> ScenarioRunResult {
    let mut engine = GameEngine::new(GameEngineOptions {
        seed: scenario.seed,
        high_score: 0,
        initial_lives_override: Some(scenario.lives),
    });
    let mut autopilot = Autopilot::new(scenario.seed);
    let tick_limit = scenario.minutes as u64 * 60 * TICK_RATE as u64;
    let total_pellets = engine.config.total_pellets;

    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();
    let mut last_pellets = total_pellets;
    let mut final_score = 0;
    let mut power_pellets = 0;
    let mut snapshot = engine.build_snapshot(true);

    while !engine.is_game_over() && engine.tick() < tick_limit {
        let input = autopilot.decide(engine.graph(), &snapshot);
        engine.step(TICK_MS, input);
        snapshot = engine.build_snapshot(true);

        for message in collect_snapshot_anomalies(engine.graph(), &snapshot, last_pellets, total_pellets)
        {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                snapshot.tick,
                message,
            );
        }
        last_pellets = snapshot.pellets_remaining;
        final_score = final_score.max(snapshot.score);

        for event in &snapshot.events {
            match event {
                RuntimeEvent::PowerPelletEaten { .. } => power_pellets += 1,
                RuntimeEvent::GameOver { score, .. } => final_score = *score,
                _ => {}
            }
        }
    }

    let stats = engine.stats();
    let reason = if engine.is_game_over() {
        FinishReason::GameOver
    } else {
        final_score = engine.score();
        FinishReason::TickLimit
    };

    ScenarioRunResult {
        result: ScenarioResultLine {
            scenario: scenario.name.clone(),
            seed: scenario.seed,
            minutes: scenario.minutes,
            lives: scenario.lives,
            reason,
            ticks: engine.tick(),
            duration_ms: engine.elapsed_ms(),
            final_score,
            high_score: engine.high_score(),
            rounds_cleared: stats.rounds_cleared,
            pellets_eaten: stats.pellets_eaten,
            power_pellets,
            ghosts_eaten: stats.ghosts_eaten,
            deaths: stats.deaths,
            path_failures: stats.path_failures,
            anomalies,
        },
        anomaly_records,
    }
}

fn collect_snapshot_anomalies(
    graph: &GridGraph,
    snapshot: &Snapshot,
    last_pellets: u32,
    total_pellets: u32,
) -> Vec<String> {
    let mut anomalies = Vec::new();

    if !graph.is_walkable(snapshot.player.cell) {
        anomalies.push(format!(
            "player on wall cell ({}, {})",
            snapshot.player.cell.row, snapshot.player.cell.col
        ));
    }
    for ghost in &snapshot.ghosts {
        if !graph.is_walkable(ghost.cell) {
            anomalies.push(format!(
                "{:?} ghost on wall cell ({}, {})",
                ghost.personality, ghost.cell.row, ghost.cell.col
            ));
        }
        if !ghost.x.is_finite() || !ghost.y.is_finite() {
            anomalies.push(format!("{:?} ghost position not finite", ghost.personality));
        }
    }

    if snapshot.pellets_remaining > total_pellets {
        anomalies.push(format!(
            "pellet count above total: {}/{}",
            snapshot.pellets_remaining, total_pellets
        ));
    }
    let refilled = snapshot
        .events
        .iter()
        .any(|event| matches!(event, RuntimeEvent::RoundReset | RuntimeEvent::GameOver { .. }));
    if !refilled && snapshot.pellets_remaining > last_pellets {
        anomalies.push(format!(
            "pellet count grew without a reset: {} -> {}",
            last_pellets, snapshot.pellets_remaining
        ));
    }

    for event in &snapshot.events {
        if let RuntimeEvent::GhostStateChanged {
            personality,
            from,
            to,
        } = event
        {
            if !from.allows(*to) {
                anomalies.push(format!(
                    "illegal ghost transition for {personality:?}: {from:?} -> {to:?}"
                ));
            }
        }
    }
    anomalies
}

fn resolve_scenarios(cli: &Cli) -> Vec<Scenario> {
    let seed = cli.seed.unwrap_or_else(now_ms);

    if cli.single || cli.minutes.is_some() || cli.lives.is_some() {
        let lives = cli.lives.unwrap_or(3).clamp(1, 9);
        return vec![Scenario {
            name: format!("custom-lives{lives}"),
            seed,
            minutes: cli.minutes.unwrap_or(3).clamp(1, 30),
            lives,
        }];
    }

    vec![
        Scenario {
            name: "quick-check".to_string(),
            seed,
            minutes: 2,
            lives: 3,
        },
        Scenario {
            name: "endurance-lives5".to_string(),
            seed: seed.wrapping_add(1),
            minutes: 5,
            lives: 5,
        },
    ]
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    tick: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        tick,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn default_run_id(seed: u64, timestamp_ms: u64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn build_run_summary(
    run_id: String,
    started_at_ms: u64,
    finished_at_ms: u64,
    scenarios: Vec<ScenarioResultLine>,
    reason_counts: BTreeMap<String, usize>,
    anomaly_count: usize,
) -> RunSummary {
    let scenario_count = scenarios.len();
    let average_score = if scenario_count == 0 {
        0
    } else {
        let total: u64 = scenarios.iter().map(|s| s.final_score as u64).sum();
        (total / scenario_count as u64) as u32
    };
    RunSummary {
        run_id,
        started_at_ms,
        finished_at_ms,
        scenario_count,
        anomaly_count,
        average_score,
        reason_counts,
        scenarios,
    }
}

fn emit_log(
    level: &str,
    event: &str,
    run_id: &str,
    scenario: Option<&str>,
    seed: Option<u64>,
    tick: Option<u64>,
    details: Value,
) {
    let log_line = StructuredLogLine {
        timestamp_ms: now_ms(),
        level: level.to_string(),
        event: event.to_string(),
        run_id: run_id.to_string(),
        scenario: scenario.map(|value| value.to_string()),
        seed,
        tick,
        details,
    };
    eprintln!(
        "{}",
        serde_json::to_string(&log_line).expect("structured log should serialize")
    );
}

fn finish_reason_key(reason: FinishReason) -> String {
    match reason {
        FinishReason::GameOver => "game_over",
        FinishReason::TickLimit => "tick_limit",
    }
    .to_string()
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).expect("run summary should serialize");
    std::fs::write(path, summary_text)
}
