use anyhow::{Result, bail, ensure};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::logic::policy::GameplayStrategy;
use crate::logic::seeds::SeedInfo;
use crate::logic::simulation::{
    SimulationConfig, SimulationSession, SimulationSummary, replay_digest,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(with = "duration_vec_serde")]
    pub performance_data: Vec<Duration>,
}

type Expectation = fn(&SimulationSummary) -> Result<()>;

/// Checks every finished playthrough must satisfy.
const EXPECTATIONS: [Expectation; 4] = [
    expect_game_over,
    expect_hp_in_bounds,
    expect_components_capped,
    expect_replayable,
];

fn expect_game_over(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        summary.game_ended,
        "game still running after {} commands in {}",
        summary.decisions.len(),
        summary.final_snapshot.state_path
    );
    Ok(())
}

fn expect_hp_in_bounds(summary: &SimulationSummary) -> Result<()> {
    let hero = &summary.final_snapshot.state.character;
    ensure!(
        hero.hp <= hero.max_hp,
        "hp {} above max {}",
        hero.hp,
        hero.max_hp
    );
    Ok(())
}

fn expect_components_capped(summary: &SimulationSummary) -> Result<()> {
    let hero = &summary.final_snapshot.state.character;
    if let Some((component, count)) = hero
        .components
        .iter()
        .find(|(_, count)| **count > hero.component_cap)
    {
        bail!("{count} {component} exceeds cap {}", hero.component_cap);
    }
    Ok(())
}

fn expect_replayable(summary: &SimulationSummary) -> Result<()> {
    let digest = replay_digest(&summary.seed, summary.commands())?;
    ensure!(
        digest == summary.digest,
        "replay digest {digest:016x} differs from {:016x}",
        summary.digest
    );
    Ok(())
}

pub struct LogicTester {
    verbose: bool,
}

impl LogicTester {
    pub const fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    pub fn run_strategy(
        &self,
        strategy: GameplayStrategy,
        seeds: &[SeedInfo],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        let mut results = Vec::new();

        for seed in seeds {
            if self.verbose {
                println!(
                    "🧪 Testing strategy: {} (seed: {} {:?})",
                    strategy.label().bright_white(),
                    seed.text,
                    seed.source
                );
            }
            results.push(self.run_single(strategy, seed, iterations));
        }

        results
    }

    fn run_single(
        &self,
        strategy: GameplayStrategy,
        seed: &SeedInfo,
        iterations: usize,
    ) -> ScenarioResult {
        let mut successes = 0;
        let mut failures = Vec::new();
        let mut performance_data = Vec::new();

        for i in 0..iterations {
            let start_time = Instant::now();
            let seed_text = seed.for_iteration(i);
            let outcome = SimulationSession::new(SimulationConfig::new(strategy, &seed_text))
                .and_then(SimulationSession::run)
                .map_err(anyhow::Error::from)
                .and_then(|summary| match evaluate_expectations(&summary) {
                    Ok(()) => Ok(summary),
                    Err(err) => Err(err.context(summarize_decision_path(&summary))),
                });

            match outcome {
                Ok(summary) => {
                    successes += 1;
                    let duration = start_time.elapsed();
                    performance_data.push(duration);
                    if self.verbose {
                        println!(
                            "  ✅ Iteration {}/{} passed ({duration:?}) days:{} artifacts:{} commands:{}",
                            i + 1,
                            iterations,
                            summary.days_elapsed(),
                            summary.artifacts_found(),
                            summary.decisions.len()
                        );
                    }
                }
                Err(err) => {
                    let message = format!("{err:#}");
                    failures.push(format!(
                        "Iteration {} (strategy {}, seed {}): {}",
                        i + 1,
                        strategy.label(),
                        seed_text,
                        message
                    ));
                    if self.verbose {
                        println!(
                            "  ❌ Iteration {}/{} failed: {}",
                            i + 1,
                            iterations,
                            message.red()
                        );
                    }
                }
            }
        }

        let average_duration = if performance_data.is_empty() {
            Duration::ZERO
        } else {
            performance_data.iter().sum::<Duration>()
                / u32::try_from(performance_data.len()).unwrap_or(1)
        };

        ScenarioResult {
            scenario_name: format!("{} [{}]", strategy.label(), seed.text),
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            failures,
            average_duration,
            performance_data,
        }
    }
}

fn evaluate_expectations(summary: &SimulationSummary) -> Result<()> {
    for expectation in EXPECTATIONS {
        expectation(summary)?;
    }
    Ok(())
}

fn summarize_decision_path(summary: &SimulationSummary) -> String {
    if summary.decisions.is_empty() {
        return "no decisions recorded".to_string();
    }

    summary
        .decisions
        .iter()
        .rev()
        .take(3)
        .map(|entry| {
            let rationale = entry
                .rationale
                .as_deref()
                .filter(|s| !s.is_empty())
                .unwrap_or("-");
            format!(
                "day {} ({}): {:?} [{}] reason {}",
                entry.day, entry.state_path, entry.command, entry.policy_name, rationale
            )
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}

mod duration_vec_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(durations: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis: Vec<u128> = durations.iter().map(Duration::as_millis).collect();
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis_vec = Vec::<u128>::deserialize(deserializer)?;
        Ok(millis_vec
            .into_iter()
            .map(|m| Duration::from_millis(u64::try_from(m).unwrap_or(0)))
            .collect())
    }
}
