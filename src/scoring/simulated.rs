//! Simulated scorer and baseline
//!
//! Deterministic stand-ins for a real points model. Scores are drawn from a
//! `Xoshiro256PlusPlus` generator seeded from the configured seed, the run tag
//! and the strategy id, so the same strategy always scores the same within a
//! run regardless of which worker evaluates it.
//!
//! The scorer mimics the shape of a real transfer search: a single transfer
//! tries replacing each squad member in turn, a double transfer either samples
//! `iterations` pairs or tries all 105 pairs, and a wildcard samples
//! `iterations` whole squads. It ticks the progress reporter once per try.
//!
//! Every player has a simulated price. An incoming player must be paid for by
//! the outgoing player's price plus the money left in the bank, starting from
//! the request's budget, so a bigger bank allows pricier upgrades.

use super::{Baseline, BaselineProvider, EvaluationRequest, PlayerId, Scorer, StrategyResult};
use crate::progress::{ProgressReporter, EXHAUSTIVE_DOUBLE_INCREMENTS, SQUAD_SIZE};
use crate::store::RunTag;
use crate::strategy::{Action, Strategy};
use crate::Result;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};
use std::time::Duration;

/// First id of the transfer-market player pool
const MARKET_ID_BASE: PlayerId = 1000;

/// Size of the transfer-market player pool
const MARKET_SIZE: usize = 500;

/// Points gained per tenth of a unit of price difference on a transfer
const UPGRADE_POINTS_PER_PRICE: f64 = 0.05;

/// Simulated price of a player in tenths of a unit, from 40 to 129
pub fn player_price(player: PlayerId) -> u32 {
    40 + player.wrapping_mul(37) % 90
}

/// Baseline detail: expected points of the current squad per period
#[derive(Debug, Clone, PartialEq)]
pub struct SquadForecast {
    pub points_per_period: BTreeMap<u32, f64>,
    pub squad: Vec<PlayerId>,
}

fn seeded_rng(seed: u64, parts: &[&str]) -> Xoshiro256PlusPlus {
    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    for part in parts {
        part.hash(&mut hasher);
    }
    Xoshiro256PlusPlus::seed_from_u64(hasher.finish())
}

/// Baseline provider producing a random but reproducible squad forecast
#[derive(Debug, Clone)]
pub struct SimulatedBaseline {
    seed: u64,
    start_period: u32,
}

impl SimulatedBaseline {
    pub fn new(seed: u64, start_period: u32) -> Self {
        Self { seed, start_period }
    }
}

impl BaselineProvider for SimulatedBaseline {
    type Detail = SquadForecast;

    fn latest_run_tag(&self) -> Result<RunTag> {
        Ok(RunTag::new(&format!("sim-{}", self.seed))?)
    }

    fn baseline(&self, horizon: u32, run_tag: &RunTag) -> Result<Baseline<SquadForecast>> {
        if horizon == 0 {
            anyhow::bail!("baseline horizon must be at least 1 period");
        }

        let mut rng = seeded_rng(self.seed, &["baseline", run_tag.as_str()]);
        let points_per_period: BTreeMap<u32, f64> = (0..horizon)
            .map(|i| (self.start_period + i, rng.gen_range(40.0..60.0)))
            .collect();
        let squad = (1..=SQUAD_SIZE as PlayerId).collect();

        Ok(Baseline {
            score: points_per_period.values().sum(),
            detail: SquadForecast {
                points_per_period,
                squad,
            },
        })
    }
}

/// Scorer drawing reproducible random gains for each transfer
#[derive(Debug, Clone)]
pub struct SimulatedScorer {
    seed: u64,
    delay_per_increment: Duration,
}

impl SimulatedScorer {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            delay_per_increment: Duration::ZERO,
        }
    }

    /// Sleep this long per increment to imitate an expensive model
    pub fn with_delay(mut self, delay_per_increment: Duration) -> Self {
        self.delay_per_increment = delay_per_increment;
        self
    }

    /// Best gain out of `tries` draws, ticking once per draw
    fn search(&self, rng: &mut Xoshiro256PlusPlus, tries: u64, spread: f64, progress: &ProgressReporter) -> f64 {
        let mut best = f64::NEG_INFINITY;
        for _ in 0..tries.max(1) {
            best = best.max(rng.gen_range(-spread..spread));
            if !self.delay_per_increment.is_zero() {
                std::thread::sleep(self.delay_per_increment);
            }
            progress.tick();
        }
        best
    }
}

impl Scorer for SimulatedScorer {
    type Detail = SquadForecast;

    fn evaluate(
        &self,
        strategy: &Strategy,
        request: &EvaluationRequest,
        baseline: &SquadForecast,
        progress: &ProgressReporter,
    ) -> Result<StrategyResult> {
        let strategy_id = strategy.id();
        let mut rng = seeded_rng(self.seed, &[request.run_tag.as_str(), strategy_id.as_str()]);

        let mut squad = baseline.squad.clone();
        let mut bank = request.budget;
        let mut result = StrategyResult::default();

        for (period, action) in strategy.periods() {
            let base = baseline
                .points_per_period
                .get(&period)
                .copied()
                .ok_or_else(|| anyhow::anyhow!("baseline has no forecast for period {}", period))?;

            let (transfers, mut gain) = match action {
                Action::Hold => (0, 0.0),
                Action::Single => (1, self.search(&mut rng, SQUAD_SIZE, 4.0, progress)),
                Action::Double if request.exhaustive_double_transfer => {
                    (2, self.search(&mut rng, EXHAUSTIVE_DOUBLE_INCREMENTS, 6.0, progress))
                }
                Action::Double => (2, self.search(&mut rng, request.iterations, 6.0, progress)),
                Action::Multi(n) => (usize::from(n.get()), self.search(&mut rng, request.iterations, 8.0, progress)),
                Action::Wildcard => (squad.len(), self.search(&mut rng, request.iterations, 12.0, progress)),
            };

            if transfers > 0 {
                let transfers = transfers.min(squad.len());
                let out_slots = sample(&mut rng, squad.len(), transfers).into_vec();
                let mut candidates = sample(&mut rng, MARKET_SIZE, MARKET_SIZE)
                    .into_iter()
                    .map(|i| MARKET_ID_BASE + i as PlayerId);

                let mut sold = BTreeSet::new();
                let mut bought = BTreeSet::new();
                for slot in out_slots {
                    let outgoing = squad[slot];
                    let available = bank.saturating_add(player_price(outgoing));
                    let Some(incoming) = candidates
                        .by_ref()
                        .find(|p| player_price(*p) <= available && !squad.contains(p))
                    else {
                        break;
                    };

                    bank = available - player_price(incoming);
                    gain += (f64::from(player_price(incoming)) - f64::from(player_price(outgoing)))
                        * UPGRADE_POINTS_PER_PRICE;
                    sold.insert(outgoing);
                    bought.insert(incoming);
                    squad[slot] = incoming;
                }
                if !sold.is_empty() {
                    result.sold_per_period.insert(period, sold);
                    result.bought_per_period.insert(period, bought);
                }
            }

            result.score_per_period.insert(period, base + gain);
        }

        result.total_score =
            result.score_per_period.values().sum::<f64>() - f64::from(strategy.points_hit());
        Ok(result)
    }
}
