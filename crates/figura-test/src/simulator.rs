//! Session Simulator - Random editor sessions with invariant checks
//!
//! Checks after every step:
//! - The active effect is owned or none
//! - Available ids and the ledger agree
//! - A countdown is armed only for a visible, running, timed active effect
//! - The visible figure shows the selected effect
//! - The effects grid starts with the "none" sentinel
//! - Save emits effect-selected (if any) before exactly one figure update

use std::sync::Arc;

use figura_category::{
    CategoryName, FigureStructure, PaletteColor, PartSet, StaticFigureStructure, EFFECTS_CATEGORY,
};
use figura_core::{
    EffectGrant, EffectId, Gender, OutgoingMessage, OwnedEffect, ServerEvent,
};
use figura_runtime::{
    EditMode, EditorAction, EditorConfig, EditorOrchestrator, MemoryLookStore, RecordingOutbox,
};
use figura_state::EffectLifecycleController;
use figura_time::EffectTimeDisplay;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Simulator configuration
#[derive(Clone, Debug)]
pub struct SimulatorConfig {
    /// Effect ids are drawn from `1..=effect_pool`
    pub effect_pool: u32,
    /// Number of steps to run
    pub step_count: usize,
    /// Probability that a step is a countdown tick
    pub tick_prob: f64,
    /// Probability that a step is a server event
    pub server_prob: f64,
    /// Probability that a granted effect is permanent
    pub permanent_prob: f64,
    /// Longest effect duration in seconds
    pub max_duration: u32,
    /// Random seed
    pub seed: u64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        SimulatorConfig {
            effect_pool: 8,
            step_count: 1000,
            tick_prob: 0.4,
            server_prob: 0.3,
            permanent_prob: 0.1,
            max_duration: 20,
            seed: 42,
        }
    }
}

impl SimulatorConfig {
    /// Light run for quick tests
    pub fn light() -> Self {
        SimulatorConfig {
            effect_pool: 4,
            step_count: 200,
            ..Default::default()
        }
    }

    /// Heavy run with short effects and many collisions
    pub fn heavy() -> Self {
        SimulatorConfig {
            effect_pool: 16,
            step_count: 10000,
            tick_prob: 0.5,
            server_prob: 0.35,
            permanent_prob: 0.2,
            max_duration: 6,
            seed: 42,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// One simulated input
#[derive(Clone, Debug, PartialEq)]
pub enum SimStep {
    Server(ServerEvent),
    Tick,
    SelectEffect(usize),
    ToggleVisibility,
    SwitchGender,
    Action(EditorAction),
}

/// An invariant that did not hold
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    pub step: usize,
    pub description: String,
}

/// Simulation result
#[derive(Debug, Default)]
pub struct SimulationResult {
    pub steps: usize,
    pub server_events: usize,
    pub ticks: usize,
    pub saves: usize,
    pub violations: Vec<Violation>,
}

impl SimulationResult {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Catalog used by simulated sessions
pub fn sample_structure() -> StaticFigureStructure {
    StaticFigureStructure::new()
        .with_parts("hd", vec![PartSet::new(180, None), PartSet::new(600, None)])
        .with_palette("hd", vec![PaletteColor::new(1), PaletteColor::new(7)])
        .mandatory_for("hd", &Gender::ALL)
        .with_parts("hr", vec![PartSet::new(100, None), PartSet::new(515, None)])
        .with_palette("hr", vec![PaletteColor::new(33), PaletteColor::new(40)])
        .with_parts("ch", vec![PartSet::new(215, None), PartSet::new(635, None)])
        .with_palette("ch", vec![PaletteColor::new(66), PaletteColor::new(70)])
        .mandatory_for("ch", &Gender::ALL)
        .with_parts("lg", vec![PartSet::new(270, None), PartSet::new(716, None)])
        .with_palette("lg", vec![PaletteColor::new(79)])
}

/// Session simulator
pub struct SessionSimulator {
    config: SimulatorConfig,
    editor: EditorOrchestrator,
    outbox: RecordingOutbox,
    rng: StdRng,
}

impl SessionSimulator {
    pub fn new(config: SimulatorConfig) -> Self {
        let structure: Arc<dyn FigureStructure> = Arc::new(sample_structure());
        let outbox = RecordingOutbox::new();
        let mut editor = EditorOrchestrator::new(
            EditorConfig::default(),
            structure,
            Box::new(outbox.clone()),
            Box::new(MemoryLookStore::new()),
        )
        .with_seed(config.seed);
        editor.set_session_look("hr-100-40.hd-180-7.ch-215-66.lg-270-79", Gender::Male);

        SessionSimulator {
            rng: StdRng::seed_from_u64(config.seed),
            config,
            editor,
            outbox,
        }
    }

    pub fn editor(&self) -> &EditorOrchestrator {
        &self.editor
    }

    fn effect_id(&mut self) -> EffectId {
        EffectId::new(self.rng.gen_range(1..=self.config.effect_pool))
    }

    fn grant(&mut self) -> EffectGrant {
        EffectGrant {
            effect: self.effect_id(),
            duration: self.rng.gen_range(0..=self.config.max_duration),
            is_permanent: self.rng.gen_bool(self.config.permanent_prob),
        }
    }

    fn generate_snapshot(&mut self) -> ServerEvent {
        let count = self.rng.gen_range(0..=self.config.effect_pool as usize);
        let effects = (0..count)
            .map(|_| {
                let duration = self.rng.gen_range(0..=self.config.max_duration);
                let running = self.rng.gen_bool(0.3);
                OwnedEffect {
                    effect: self.effect_id(),
                    duration,
                    seconds_left_if_active: if running { duration } else { 0 },
                    is_permanent: self.rng.gen_bool(self.config.permanent_prob),
                }
            })
            .collect();
        ServerEvent::EffectsSnapshot(effects)
    }

    fn generate_server_event(&mut self) -> ServerEvent {
        match self.rng.gen_range(0..10) {
            0 => self.generate_snapshot(),
            1..=3 => ServerEvent::EffectAdded(self.grant()),
            4..=6 => ServerEvent::EffectActivated(self.grant()),
            _ => ServerEvent::EffectExpired(self.effect_id()),
        }
    }

    fn generate_step(&mut self) -> SimStep {
        let roll: f64 = self.rng.gen();
        if roll < self.config.tick_prob {
            return SimStep::Tick;
        }
        if roll < self.config.tick_prob + self.config.server_prob {
            return SimStep::Server(self.generate_server_event());
        }

        match self.rng.gen_range(0..12) {
            0..=4 => SimStep::SelectEffect(self.rng.gen_range(0..=self.config.effect_pool as usize)),
            5 | 6 => SimStep::ToggleVisibility,
            7 => SimStep::SwitchGender,
            8 => SimStep::Action(EditorAction::Clear),
            9 => SimStep::Action(EditorAction::Reset),
            10 => SimStep::Action(EditorAction::Randomize),
            _ => SimStep::Action(EditorAction::Save),
        }
    }

    /// Apply one step; returns the messages it emitted
    pub fn apply(&mut self, step: &SimStep) -> Vec<OutgoingMessage> {
        let before = self.outbox.sent().len();

        match step {
            SimStep::Server(event) => self.editor.handle_event(event),
            SimStep::Tick => {
                self.editor.tick();
            }
            SimStep::SelectEffect(index) => {
                self.editor
                    .select_part(CategoryName::Effects, EFFECTS_CATEGORY, *index)
            }
            SimStep::ToggleVisibility => self.editor.toggle(),
            SimStep::SwitchGender => {
                let next = match self.editor.current_gender() {
                    Gender::Male => Gender::Female,
                    Gender::Female => Gender::Male,
                };
                self.editor.set_gender(next);
            }
            SimStep::Action(action) => self.editor.process_action(*action),
        }

        self.outbox.sent().split_off(before)
    }

    /// Run the configured number of steps
    pub fn run(&mut self) -> SimulationResult {
        let mut result = SimulationResult::default();
        self.editor.show();

        for index in 0..self.config.step_count {
            let step = self.generate_step();
            let was_visible = self.editor.is_visible();
            let mode = self.editor.mode();
            let sent = self.apply(&step);

            match &step {
                SimStep::Server(_) => result.server_events += 1,
                SimStep::Tick => result.ticks += 1,
                SimStep::Action(EditorAction::Save) if was_visible => {
                    result.saves += 1;
                    if let Some(description) = check_save(&sent, mode) {
                        result.violations.push(Violation {
                            step: index,
                            description,
                        });
                    }
                }
                _ => {}
            }

            for description in self.check_invariants() {
                result.violations.push(Violation {
                    step: index,
                    description: format!("after {:?}: {}", step, description),
                });
            }
            result.steps += 1;
        }

        debug!(
            steps = result.steps,
            ticks = result.ticks,
            saves = result.saves,
            violations = result.violations.len(),
            "simulation finished"
        );
        result
    }

    /// Every invariant that does not hold right now
    pub fn check_invariants(&self) -> Vec<String> {
        let mut violations = Vec::new();
        let lifecycle = self.editor.lifecycle();
        let ledger = lifecycle.ledger();
        let active = lifecycle.active();

        if active.is_some() && !ledger.contains(active) {
            violations.push(format!("active {} is not owned", active));
        }

        if ledger.len() != ledger.available_ids().len()
            || ledger.available_ids().iter().any(|id| !ledger.contains(*id))
        {
            violations.push("available ids and ledger disagree".to_string());
        }

        if let Some(armed) = lifecycle.schedule().armed_for() {
            let running = ledger.get(armed).map_or(false, |m| m.is_counting_down());
            if !self.editor.is_visible() || armed != active || !running {
                violations.push(format!("countdown armed for {} while it should not run", armed));
            }
        } else if lifecycle.countdown_target(self.editor.is_visible()).is_some() {
            violations.push("running effect has no countdown".to_string());
        }

        if self.editor.is_visible() {
            let shown = self
                .editor
                .current_figure()
                .map(|f| f.avatar_effect_type())
                .unwrap_or(EffectId::NONE);
            if shown != lifecycle.selected() {
                violations.push(format!(
                    "figure shows {} but {} is selected",
                    shown,
                    lifecycle.selected()
                ));
            }
        }

        if let Some(effects) = self.editor.category(CategoryName::Effects) {
            let sentinel_ok = effects.categories().first().map_or(false, |grid| {
                properties::sentinel_first(grid.parts().iter().map(|p| (p.id(), p.is_clear())))
            });
            if !sentinel_ok {
                violations.push("effects grid does not start with the none sentinel".to_string());
            }
        }

        if lifecycle.selected().is_none() && !lifecycle.effect_time_display().is_empty() {
            violations.push("time label shown with nothing selected".to_string());
        }

        violations
    }
}

fn check_save(sent: &[OutgoingMessage], mode: EditMode) -> Option<String> {
    let effect_selected: Vec<usize> = sent
        .iter()
        .enumerate()
        .filter(|(_, m)| matches!(m, OutgoingMessage::EffectSelected(_)))
        .map(|(i, _)| i)
        .collect();
    let figure_updates: Vec<usize> = sent
        .iter()
        .enumerate()
        .filter(|(_, m)| {
            matches!(
                m,
                OutgoingMessage::FigureUpdate { .. } | OutgoingMessage::RestrictedFigureUpdate { .. }
            )
        })
        .map(|(i, _)| i)
        .collect();

    if mode.is_restricted() {
        return (!effect_selected.is_empty())
            .then(|| "restricted save sent an effect selection".to_string());
    }
    if figure_updates.len() != 1 {
        return Some(format!("save sent {} figure updates", figure_updates.len()));
    }
    if effect_selected.len() > 1 {
        return Some("save sent more than one effect selection".to_string());
    }
    if effect_selected.iter().any(|&i| i > figure_updates[0]) {
        return Some("effect selection sent after the figure update".to_string());
    }
    if sent
        .iter()
        .any(|m| matches!(m, OutgoingMessage::EffectSelected(e) if e.is_none()))
    {
        return Some("save sent effect selection for none".to_string());
    }
    None
}

/// Property helpers
pub mod properties {
    use super::*;

    /// Item 0 is the clear item with id 0 and no other item has id 0
    pub fn sentinel_first(mut items: impl Iterator<Item = (i32, bool)>) -> bool {
        match items.next() {
            Some((0, true)) => items.all(|(id, clear)| id != 0 && !clear),
            _ => false,
        }
    }

    /// Applying the same snapshot twice gives the same ledger and ids
    pub fn snapshot_idempotent(effects: &[OwnedEffect]) -> bool {
        let mut once = EffectLifecycleController::new();
        let _ = once.apply_snapshot(effects);

        let mut twice = EffectLifecycleController::new();
        let _ = twice.apply_snapshot(effects);
        let _ = twice.apply_snapshot(effects);

        once.ledger() == twice.ledger() && once.state() == twice.state()
    }

    /// The label for a remaining time never shows days below one day
    pub fn display_consistent(seconds_left: u32, is_permanent: bool) -> bool {
        match EffectTimeDisplay::from_remaining(seconds_left, is_permanent) {
            EffectTimeDisplay::Permanent => is_permanent,
            EffectTimeDisplay::DaysLeft(days) => {
                !is_permanent && days >= 1 && seconds_left >= figura_time::SECONDS_PER_DAY
            }
            EffectTimeDisplay::TimeLeft { hours, .. } => !is_permanent && hours < 24,
            EffectTimeDisplay::Empty => !is_permanent,
        }
    }
}
