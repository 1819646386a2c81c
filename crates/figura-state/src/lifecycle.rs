//! Effect lifecycle reconciliation
//!
//! Three sources of truth meet here: the owned-effect ledger pushed by the
//! server, the active effect the server is running, and the effect the
//! editor is previewing. The controller never touches a figure directly;
//! every transition returns a [`Reconciliation`] telling the caller what
//! to write into the current figure and whether to rebuild categories.

use figura_core::{EffectGrant, EffectId, OwnedEffect, ServerEvent};
use figura_time::{CountdownSchedule, EffectTimeDisplay, ScheduleChange, TickToken};
use tracing::{debug, info, warn};

use crate::{EffectLedger, EffectMeta};

/// Consequence of a transition for the editor
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Effect to write into the current figure (then refresh its view)
    pub figure_effect: Option<EffectId>,
    /// Category models must be rebuilt from the ledger
    pub rebuild_categories: bool,
}

impl Reconciliation {
    fn figure(effect: EffectId) -> Self {
        Reconciliation {
            figure_effect: Some(effect),
            rebuild_categories: false,
        }
    }

    fn rebuild() -> Self {
        Reconciliation {
            figure_effect: None,
            rebuild_categories: true,
        }
    }

    fn with_rebuild(mut self, rebuild: bool) -> Self {
        self.rebuild_categories |= rebuild;
        self
    }

    pub fn is_noop(&self) -> bool {
        self.figure_effect.is_none() && !self.rebuild_categories
    }
}

/// Active / selected / last effect ids
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EffectLifecycleState {
    /// Server-confirmed running effect
    pub active_effect_id: EffectId,
    /// Effect shown in the editor preview
    pub selected_effect_id: EffectId,
    /// Restored by the reset action
    pub last_effect_id: EffectId,
}

/// Effect lifecycle controller
#[derive(Debug, Default)]
pub struct EffectLifecycleController {
    ledger: EffectLedger,
    state: EffectLifecycleState,
    schedule: CountdownSchedule,
}

impl EffectLifecycleController {
    pub fn new() -> Self {
        EffectLifecycleController::default()
    }

    pub fn with_schedule(schedule: CountdownSchedule) -> Self {
        EffectLifecycleController {
            schedule,
            ..Default::default()
        }
    }

    pub fn ledger(&self) -> &EffectLedger {
        &self.ledger
    }

    pub fn state(&self) -> EffectLifecycleState {
        self.state
    }

    pub fn active(&self) -> EffectId {
        self.state.active_effect_id
    }

    pub fn selected(&self) -> EffectId {
        self.state.selected_effect_id
    }

    pub fn last(&self) -> EffectId {
        self.state.last_effect_id
    }

    pub fn schedule(&self) -> &CountdownSchedule {
        &self.schedule
    }

    /// Route an inbound event. Non-effect events are ignored.
    pub fn apply_event(&mut self, event: &ServerEvent) -> Reconciliation {
        match event {
            ServerEvent::EffectsSnapshot(effects) => self.apply_snapshot(effects),
            ServerEvent::EffectAdded(grant) => self.apply_added(grant),
            ServerEvent::EffectActivated(grant) => self.apply_activated(grant),
            ServerEvent::EffectExpired(effect) => self.apply_expired(*effect),
            ServerEvent::FigureSetIds { .. } | ServerEvent::WardrobePage(_) => {
                Reconciliation::default()
            }
        }
    }

    /// Owned-effects snapshot: authoritative, supersedes any unsaved selection
    pub fn apply_snapshot(&mut self, effects: &[OwnedEffect]) -> Reconciliation {
        self.ledger.replace_from_snapshot(effects);

        let reconciliation = match self.ledger.first_running() {
            Some(running) => {
                self.state.active_effect_id = running;
                self.state.selected_effect_id = running;
                self.state.last_effect_id = running;
                Reconciliation::figure(running)
            }
            None => {
                self.state.active_effect_id = EffectId::NONE;
                self.state.selected_effect_id = EffectId::NONE;
                Reconciliation::figure(EffectId::NONE)
            }
        };

        info!(
            owned = self.ledger.len(),
            active = %self.state.active_effect_id,
            "effects snapshot applied"
        );
        reconciliation.with_rebuild(true)
    }

    /// Newly granted effects start idle
    pub fn apply_added(&mut self, grant: &EffectGrant) -> Reconciliation {
        if grant.effect.is_none() {
            warn!("ignoring effect-added for the none sentinel");
            return Reconciliation::default();
        }

        self.ledger.upsert(
            grant.effect,
            EffectMeta::new(grant.duration, 0, grant.is_permanent),
        );
        self.ledger.add_available(grant.effect);

        debug!(effect = %grant.effect, duration = grant.duration, "effect added");
        Reconciliation::rebuild()
    }

    /// Server started an effect; a countdown already in progress is kept
    pub fn apply_activated(&mut self, grant: &EffectGrant) -> Reconciliation {
        if grant.effect.is_none() {
            warn!("ignoring effect-activated for the none sentinel");
            return Reconciliation::default();
        }

        let seconds_left = self
            .ledger
            .get(grant.effect)
            .map(|m| m.seconds_left_if_active)
            .filter(|secs| *secs > 0)
            .unwrap_or(grant.duration);

        self.ledger.upsert(
            grant.effect,
            EffectMeta::new(grant.duration, seconds_left, grant.is_permanent),
        );
        let newly_owned = self.ledger.add_available(grant.effect);

        self.state.active_effect_id = grant.effect;
        self.state.selected_effect_id = grant.effect;

        info!(effect = %grant.effect, seconds_left, "effect activated");
        Reconciliation::figure(grant.effect).with_rebuild(newly_owned)
    }

    /// Server expiry always wins over the local prediction
    pub fn apply_expired(&mut self, effect: EffectId) -> Reconciliation {
        let was_available = self.ledger.is_available(effect);
        let was_owned = self.ledger.remove(effect).is_some();

        if !was_owned && !was_available {
            warn!(%effect, "expiry for an effect that is not owned");
        }

        let mut reconciliation = Reconciliation::default();
        if self.state.active_effect_id == effect || self.state.selected_effect_id == effect {
            self.state.active_effect_id = EffectId::NONE;
            self.state.selected_effect_id = EffectId::NONE;
            reconciliation = Reconciliation::figure(EffectId::NONE);
        }

        info!(%effect, "effect expired");
        reconciliation.with_rebuild(was_owned || was_available)
    }

    /// Editor selection: preview only, never activates
    pub fn select(&mut self, effect: EffectId) -> Reconciliation {
        self.state.selected_effect_id = effect;
        debug!(%effect, active = %self.state.active_effect_id, "effect selected");
        Reconciliation::figure(effect)
    }

    /// Drop the preview selection (clear action)
    pub fn clear_selection(&mut self) -> Reconciliation {
        self.select(EffectId::NONE)
    }

    /// Remember the figure's effect at load time for a later reset
    pub fn record_last(&mut self, effect: EffectId) {
        self.state.last_effect_id = effect;
    }

    /// Reset action: bring back the effect recorded at load
    pub fn restore_last(&mut self) -> Reconciliation {
        self.select(self.state.last_effect_id)
    }

    /// The effect a countdown should be running for, if any
    pub fn countdown_target(&self, visible: bool) -> Option<EffectId> {
        if !visible || self.state.active_effect_id.is_none() {
            return None;
        }

        self.ledger
            .get(self.state.active_effect_id)
            .filter(|meta| meta.is_counting_down())
            .map(|_| self.state.active_effect_id)
    }

    /// Arm or tear down the countdown. Re-arms only when the target changes.
    pub fn sync_countdown(&mut self, visible: bool) -> ScheduleChange {
        let target = self.countdown_target(visible);
        self.schedule.reconcile(target)
    }

    /// Stop the countdown unconditionally (editor hidden or closed)
    pub fn stop_countdown(&mut self) -> Option<TickToken> {
        self.schedule.stop()
    }

    /// Tick the currently armed countdown, if any
    pub fn tick(&mut self) -> Reconciliation {
        match self.schedule.token() {
            Some(token) => self.tick_with(token),
            None => Reconciliation::default(),
        }
    }

    /// One countdown second. Ticks from a replaced or stopped timer are dropped.
    ///
    /// Expiry is predicted from the freshly decremented value, not from the
    /// value seen before the decrement.
    pub fn tick_with(&mut self, token: TickToken) -> Reconciliation {
        if !self.schedule.accepts(token) {
            debug!(effect = %token.effect, generation = token.generation, "dropping stale tick");
            return Reconciliation::default();
        }

        let active = self.state.active_effect_id;
        if token.effect != active {
            self.schedule.stop();
            return Reconciliation::default();
        }

        let Some(meta) = self.ledger.get_mut(active) else {
            warn!(effect = %active, "countdown for an effect that is no longer owned");
            self.schedule.stop();
            return Reconciliation::default();
        };

        if !meta.is_counting_down() {
            self.schedule.stop();
            return Reconciliation::default();
        }

        meta.seconds_left_if_active = meta.seconds_left_if_active.saturating_sub(1);
        if meta.seconds_left_if_active > 0 {
            return Reconciliation::default();
        }

        info!(effect = %active, "effect countdown reached zero");
        self.state.active_effect_id = EffectId::NONE;
        self.state.selected_effect_id = EffectId::NONE;
        self.schedule.stop();
        Reconciliation::figure(EffectId::NONE)
    }

    /// Meta of the previewed effect
    pub fn selected_meta(&self) -> Option<&EffectMeta> {
        if self.state.selected_effect_id.is_none() {
            return None;
        }
        self.ledger.get(self.state.selected_effect_id)
    }

    /// Remaining-time label for the previewed effect
    pub fn effect_time_display(&self) -> EffectTimeDisplay {
        match self.selected_meta() {
            Some(meta) => {
                EffectTimeDisplay::from_remaining(meta.seconds_left_if_active, meta.is_permanent)
            }
            None => EffectTimeDisplay::Empty,
        }
    }

    /// Progress bar fraction for the previewed effect
    pub fn selected_progress(&self) -> Option<f32> {
        self.selected_meta().and_then(|m| m.progress())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn owned(id: u32, duration: u32, left: u32, permanent: bool) -> OwnedEffect {
        OwnedEffect {
            effect: EffectId::new(id),
            duration,
            seconds_left_if_active: left,
            is_permanent: permanent,
        }
    }

    fn grant(id: u32, duration: u32, permanent: bool) -> EffectGrant {
        EffectGrant {
            effect: EffectId::new(id),
            duration,
            is_permanent: permanent,
        }
    }

    #[test]
    fn test_snapshot_with_running_effect() {
        let mut ctl = EffectLifecycleController::new();
        let r = ctl.apply_snapshot(&[owned(3, 60, 0, false), owned(5, 60, 42, false)]);

        assert_eq!(r.figure_effect, Some(EffectId::new(5)));
        assert!(r.rebuild_categories);
        assert_eq!(ctl.active(), EffectId::new(5));
        assert_eq!(ctl.selected(), EffectId::new(5));
        assert_eq!(ctl.last(), EffectId::new(5));
    }

    #[test]
    fn test_snapshot_without_running_effect_clears() {
        let mut ctl = EffectLifecycleController::new();
        ctl.apply_activated(&grant(5, 60, false));
        ctl.select(EffectId::new(5));

        let r = ctl.apply_snapshot(&[owned(5, 60, 0, false)]);

        assert_eq!(r.figure_effect, Some(EffectId::NONE));
        assert_eq!(ctl.active(), EffectId::NONE);
        assert_eq!(ctl.selected(), EffectId::NONE);
    }

    #[test]
    fn test_added_starts_idle() {
        let mut ctl = EffectLifecycleController::new();
        let r = ctl.apply_added(&grant(8, 120, false));

        assert!(r.rebuild_categories);
        assert_eq!(r.figure_effect, None);
        assert_eq!(ctl.ledger().get(EffectId::new(8)).unwrap().seconds_left_if_active, 0);
        assert!(ctl.ledger().is_available(EffectId::new(8)));
        assert_eq!(ctl.active(), EffectId::NONE);
    }

    #[test]
    fn test_activation_preserves_running_countdown() {
        let mut ctl = EffectLifecycleController::new();
        ctl.apply_snapshot(&[owned(5, 600, 100, false)]);

        ctl.apply_activated(&grant(5, 600, false));
        assert_eq!(ctl.ledger().get(EffectId::new(5)).unwrap().seconds_left_if_active, 100);

        ctl.apply_added(&grant(6, 300, false));
        ctl.apply_activated(&grant(6, 300, false));
        assert_eq!(ctl.ledger().get(EffectId::new(6)).unwrap().seconds_left_if_active, 300);
        assert_eq!(ctl.active(), EffectId::new(6));
        assert_eq!(ctl.selected(), EffectId::new(6));
    }

    #[test]
    fn test_added_activated_expired_sequence() {
        let mut ctl = EffectLifecycleController::new();
        let id = EffectId::new(12);

        ctl.apply_added(&grant(12, 60, false));
        ctl.apply_activated(&grant(12, 60, false));
        let r = ctl.apply_expired(id);

        assert!(!ctl.ledger().contains(id));
        assert!(!ctl.ledger().is_available(id));
        assert_eq!(ctl.active(), EffectId::NONE);
        assert_eq!(ctl.selected(), EffectId::NONE);
        assert_eq!(r.figure_effect, Some(EffectId::NONE));
        assert!(r.rebuild_categories);
    }

    #[test]
    fn test_expiry_of_other_effect_keeps_active() {
        let mut ctl = EffectLifecycleController::new();
        ctl.apply_added(&grant(1, 60, false));
        ctl.apply_activated(&grant(2, 60, false));

        let r = ctl.apply_expired(EffectId::new(1));
        assert_eq!(r.figure_effect, None);
        assert_eq!(ctl.active(), EffectId::new(2));
    }

    #[test]
    fn test_stale_expiry_is_noop() {
        let mut ctl = EffectLifecycleController::new();
        let r = ctl.apply_expired(EffectId::new(77));
        assert!(r.is_noop());
    }

    #[test]
    fn test_selection_does_not_activate() {
        let mut ctl = EffectLifecycleController::new();
        ctl.apply_added(&grant(4, 60, false));

        let r = ctl.select(EffectId::new(4));
        assert_eq!(r.figure_effect, Some(EffectId::new(4)));
        assert_eq!(ctl.selected(), EffectId::new(4));
        assert_eq!(ctl.active(), EffectId::NONE);
    }

    #[test]
    fn test_three_ticks_expire_locally() {
        let mut ctl = EffectLifecycleController::new();
        ctl.apply_snapshot(&[owned(5, 60, 3, false)]);
        assert!(matches!(ctl.sync_countdown(true), ScheduleChange::Started(_)));

        assert!(ctl.tick().is_noop());
        assert!(ctl.tick().is_noop());
        let r = ctl.tick();

        assert_eq!(r.figure_effect, Some(EffectId::NONE));
        assert_eq!(ctl.ledger().get(EffectId::new(5)).unwrap().seconds_left_if_active, 0);
        assert_eq!(ctl.active(), EffectId::NONE);
        assert_eq!(ctl.selected(), EffectId::NONE);
        assert!(!ctl.schedule().is_armed());

        // Further ticks do nothing
        assert!(ctl.tick().is_noop());
    }

    #[test]
    fn test_permanent_never_counts_down() {
        let mut ctl = EffectLifecycleController::new();
        ctl.apply_snapshot(&[owned(5, 100, 50, true)]);
        ctl.apply_activated(&grant(5, 100, true));

        assert_eq!(ctl.sync_countdown(true), ScheduleChange::Unchanged);
        for _ in 0..10 {
            assert!(ctl.tick().is_noop());
        }
        assert_eq!(ctl.active(), EffectId::new(5));
        assert_eq!(ctl.ledger().get(EffectId::new(5)).unwrap().seconds_left_if_active, 50);
    }

    #[test]
    fn test_hidden_editor_never_arms() {
        let mut ctl = EffectLifecycleController::new();
        ctl.apply_snapshot(&[owned(5, 60, 30, false)]);

        assert_eq!(ctl.sync_countdown(false), ScheduleChange::Unchanged);
        assert!(!ctl.schedule().is_armed());

        assert!(matches!(ctl.sync_countdown(true), ScheduleChange::Started(_)));
        assert!(matches!(ctl.sync_countdown(false), ScheduleChange::Stopped(_)));
    }

    #[test]
    fn test_metadata_update_does_not_rearm() {
        let mut ctl = EffectLifecycleController::new();
        ctl.apply_snapshot(&[owned(5, 60, 30, false)]);
        ctl.sync_countdown(true);
        let generation = ctl.schedule().generation();

        ctl.tick();
        ctl.apply_activated(&grant(5, 60, false));
        assert_eq!(ctl.sync_countdown(true), ScheduleChange::Unchanged);
        assert_eq!(ctl.schedule().generation(), generation);
    }

    #[test]
    fn test_server_expiry_beats_local_tick() {
        let mut ctl = EffectLifecycleController::new();
        ctl.apply_snapshot(&[owned(5, 60, 2, false)]);
        ctl.sync_countdown(true);
        let token = ctl.schedule().token().unwrap();

        ctl.apply_expired(EffectId::new(5));
        ctl.sync_countdown(true);

        assert!(ctl.tick_with(token).is_noop());
        assert!(!ctl.ledger().contains(EffectId::new(5)));
    }

    #[test]
    fn test_time_display() {
        let mut ctl = EffectLifecycleController::new();
        assert_eq!(ctl.effect_time_display(), EffectTimeDisplay::Empty);

        ctl.apply_snapshot(&[owned(5, 7200, 3661, false), owned(6, 0, 0, true)]);
        assert_eq!(ctl.effect_time_display().to_string(), "01:01:01");

        ctl.select(EffectId::new(6));
        assert_eq!(ctl.effect_time_display(), EffectTimeDisplay::Permanent);

        ctl.select(EffectId::new(404));
        assert_eq!(ctl.effect_time_display(), EffectTimeDisplay::Empty);
    }

    #[test]
    fn test_reset_restores_last() {
        let mut ctl = EffectLifecycleController::new();
        ctl.record_last(EffectId::new(9));
        ctl.select(EffectId::new(2));

        let r = ctl.restore_last();
        assert_eq!(r.figure_effect, Some(EffectId::new(9)));
        assert_eq!(ctl.selected(), EffectId::new(9));
    }

    fn arb_snapshot() -> impl Strategy<Value = Vec<OwnedEffect>> {
        prop::collection::vec(
            (1u32..20, 0u32..1000, 0u32..1000, any::<bool>())
                .prop_map(|(id, d, l, p)| owned(id, d, l, p)),
            0..8,
        )
    }

    proptest! {
        #[test]
        fn prop_snapshot_idempotent(snapshot in arb_snapshot()) {
            let mut ctl = EffectLifecycleController::new();
            ctl.apply_snapshot(&snapshot);
            let ledger = ctl.ledger().clone();
            let state = ctl.state();

            ctl.apply_snapshot(&snapshot);
            prop_assert_eq!(ctl.ledger(), &ledger);
            prop_assert_eq!(ctl.state(), state);
        }

        #[test]
        fn prop_active_always_owned(snapshot in arb_snapshot(), expire in 1u32..20) {
            let mut ctl = EffectLifecycleController::new();
            ctl.apply_snapshot(&snapshot);
            ctl.apply_expired(EffectId::new(expire));
            let active = ctl.active();
            prop_assert!(active.is_none() || ctl.ledger().contains(active));
        }
    }
}
