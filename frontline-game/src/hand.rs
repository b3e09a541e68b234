//! Smart-hand composition.
//!
//! Cards are biased toward playable combinations, scaled by difficulty and
//! desperation, while never handing the player more than one card that
//! answers the current call.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::combat::CardKind;
use crate::config::HandConfig;
use crate::constants::{VALUE_POOL_MAX, VALUE_POOL_MIN};
use crate::grid::Grid;
use crate::numbers::probability;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,
    pub value: u8,
    #[serde(rename = "type")]
    pub kind: CardKind,
    pub is_playable: bool,
}

impl Card {
    #[must_use]
    pub fn new(id: impl Into<String>, value: u8, kind: CardKind) -> Self {
        Self {
            id: id.into(),
            value,
            kind,
            is_playable: true,
        }
    }
}

/// Live state the composer reads when weighing a card.
#[derive(Debug, Clone, Copy)]
pub struct HandContext<'a> {
    pub grid: &'a Grid,
    pub call: Option<u8>,
    pub difficulty: f64,
    pub threat: f64,
}

impl HandContext<'_> {
    fn live_call(&self) -> Option<u8> {
        self.call.filter(|&call| self.grid.has_live_value(call))
    }
}

#[derive(Debug, Clone)]
pub struct HandComposer {
    cfg: HandConfig,
    next_id: u64,
}

impl HandComposer {
    #[must_use]
    pub const fn new(cfg: HandConfig) -> Self {
        Self { cfg, next_id: 0 }
    }

    #[must_use]
    pub const fn config(&self) -> &HandConfig {
        &self.cfg
    }

    /// Compose a full hand holding at most one card equal to the call.
    pub fn deal_hand<R>(&mut self, ctx: &HandContext<'_>, rng: &mut R) -> Vec<Card>
    where
        R: Rng + ?Sized,
    {
        let mut hand = Vec::with_capacity(self.cfg.hand_size);
        let mut matched = false;
        for slot in 0..self.cfg.hand_size {
            let card = self.compose(slot, matched, ctx, rng);
            matched |= ctx.call == Some(card.value);
            hand.push(card);
        }
        hand
    }

    /// One replacement card, never a second match for the call.
    pub fn draw_replacement<R>(&mut self, hand: &[Card], ctx: &HandContext<'_>, rng: &mut R) -> Card
    where
        R: Rng + ?Sized,
    {
        let matched = hand.iter().any(|card| ctx.call == Some(card.value));
        self.compose(hand.len(), matched, ctx, rng)
    }

    fn compose<R>(&mut self, slot: usize, forced_no_match: bool, ctx: &HandContext<'_>, rng: &mut R) -> Card
    where
        R: Rng + ?Sized,
    {
        let value = self.pick_value(slot, forced_no_match, ctx, rng);
        let kind = self.pick_kind(value, ctx, rng);
        self.next_id += 1;
        Card::new(format!("card-{}", self.next_id), value, kind)
    }

    fn match_chance(&self, ctx: &HandContext<'_>) -> f64 {
        if ctx.difficulty <= self.cfg.tutorial_tier_difficulty {
            self.cfg.match_chance_tutorial
        } else if ctx.threat > self.cfg.desperate_threat {
            self.cfg.match_chance_desperate
        } else {
            self.cfg.match_chance_baseline
        }
    }

    fn pick_value<R>(&self, slot: usize, forced_no_match: bool, ctx: &HandContext<'_>, rng: &mut R) -> u8
    where
        R: Rng + ?Sized,
    {
        if !forced_no_match && let Some(call) = ctx.live_call() {
            if rng.gen_bool(probability(self.match_chance(ctx))) {
                return call;
            }
            if slot == 0 && rng.gen_bool(probability(self.cfg.first_slot_match_chance)) {
                return call;
            }
        }

        let excluded = if forced_no_match { ctx.call } else { None };
        let live: Vec<u8> = ctx
            .grid
            .undaubed()
            .map(|cell| cell.value)
            .filter(|&value| Some(value) != excluded)
            .collect();
        if !live.is_empty() && rng.gen_bool(probability(self.cfg.live_target_chance)) {
            if let Some(&value) = live.choose(rng) {
                return value;
            }
        }
        random_value(excluded, rng)
    }

    fn pick_kind<R>(&self, value: u8, ctx: &HandContext<'_>, rng: &mut R) -> CardKind
    where
        R: Rng + ?Sized,
    {
        if ctx.difficulty > self.cfg.intel_min_difficulty
            && rng.gen_bool(probability(self.cfg.intel_chance))
        {
            return CardKind::Intel;
        }
        if rng.gen_bool(probability(self.cfg.airstrike_chance)) {
            return CardKind::Airstrike;
        }
        if let Some(cell) = ctx.grid.find_value(value) {
            if rng.gen_bool(probability(self.cfg.correct_weapon_chance)) {
                return cell.enemy_type.counter();
            }
        }
        CardKind::BASE_WEAPONS
            .choose(rng)
            .copied()
            .unwrap_or(CardKind::LightWeapon)
    }
}

/// Uniform value from the pool, skipping `excluded` when given.
fn random_value<R>(excluded: Option<u8>, rng: &mut R) -> u8
where
    R: Rng + ?Sized,
{
    match excluded {
        Some(skip) if (VALUE_POOL_MIN..=VALUE_POOL_MAX).contains(&skip) => {
            let value = rng.gen_range(VALUE_POOL_MIN..VALUE_POOL_MAX);
            if value >= skip { value + 1 } else { value }
        }
        _ => rng.gen_range(VALUE_POOL_MIN..=VALUE_POOL_MAX),
    }
}
