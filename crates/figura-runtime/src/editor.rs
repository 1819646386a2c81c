//! Editor orchestrator
//!
//! Owns one [`FigureData`] per gender, the category tabs, the effect
//! lifecycle and the outgoing collaborators. Every inbound event, click
//! and tick goes through here; the orchestrator applies the
//! [`Reconciliation`] the lifecycle controller hands back and keeps the
//! countdown armed only while the editor is visible.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use figura_category::{
    BuildContext, CategoryModel, CategoryName, EffectsModel, FigurePartModel, FigureStructure,
    IconResolver, SelectionContext, UrlTemplateResolver,
};
use figura_core::{
    set_type, EffectId, FiguraResult, FigureData, Gender, ObjectId, PreviewKey, ServerEvent,
};
use figura_state::{EffectLifecycleController, Reconciliation};
use figura_time::{CountdownSchedule, EffectTimeDisplay, TickToken};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::{
    normal_key, restricted_key, EditorConfig, EditorLink, FigureRandomizer, LinkAction, LookStore,
    Outbox, Wardrobe,
};

/// Preview surface notified on every figure refresh
pub type PreviewObserver = Arc<dyn Fn(&PreviewKey) + Send + Sync>;

/// Editing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditMode {
    #[default]
    Normal,
    /// Object gate: clothing only, saved to the gate instead of the user
    Restricted {
        gender: Gender,
        target: Option<ObjectId>,
    },
}

impl EditMode {
    pub fn is_restricted(&self) -> bool {
        matches!(self, EditMode::Restricted { .. })
    }

    pub fn category_names(&self) -> &'static [CategoryName] {
        match self {
            EditMode::Normal => &CategoryName::FULL,
            EditMode::Restricted { .. } => &CategoryName::RESTRICTED,
        }
    }
}

/// Toolbar actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorAction {
    Clear,
    Reset,
    Randomize,
    Save,
}

/// What Reset goes back to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadSnapshot {
    pub figure: String,
    pub gender: Gender,
}

/// The part category models may touch
struct Workspace {
    figures: HashMap<Gender, FigureData>,
    current: Gender,
    lifecycle: EffectLifecycleController,
}

impl Workspace {
    fn figure(&self) -> Option<&FigureData> {
        self.figures.get(&self.current)
    }

    fn figure_mut(&mut self) -> Option<&mut FigureData> {
        self.figures.get_mut(&self.current)
    }

    /// Write the reconciled effect into the current figure and refresh it.
    /// Without `force` a figure already showing that effect is left alone.
    fn apply_figure_effect(&mut self, reconciliation: Reconciliation, force: bool) {
        let Some(effect) = reconciliation.figure_effect else {
            return;
        };
        if let Some(figure) = self.figure_mut() {
            if force || figure.avatar_effect_type() != effect {
                figure.set_avatar_effect_type(effect);
                figure.update_view();
            }
        }
    }
}

impl SelectionContext for Workspace {
    fn current_figure(&mut self) -> Option<&mut FigureData> {
        self.figure_mut()
    }

    fn effect_selected(&mut self, effect: EffectId) {
        let reconciliation = self.lifecycle.select(effect);
        self.apply_figure_effect(reconciliation, false);
    }
}

/// Avatar editor orchestrator
pub struct EditorOrchestrator {
    config: EditorConfig,
    workspace: Workspace,
    categories: Vec<Box<dyn CategoryModel>>,
    active_category: CategoryName,
    structure: Arc<dyn FigureStructure>,
    icons: UrlTemplateResolver,
    outbox: Box<dyn Outbox>,
    store: Box<dyn LookStore>,
    wardrobe: Wardrobe,
    wardrobe_requested: bool,
    figure_set_ids: Vec<i32>,
    bound_furniture_names: Vec<String>,
    session_look: Option<(String, Gender)>,
    club_level: u8,
    mode: EditMode,
    visible: bool,
    needs_reset: bool,
    load_snapshot: Option<LoadSnapshot>,
    preview: Option<PreviewObserver>,
    rng: StdRng,
}

impl EditorOrchestrator {
    pub fn new(
        config: EditorConfig,
        structure: Arc<dyn FigureStructure>,
        outbox: Box<dyn Outbox>,
        store: Box<dyn LookStore>,
    ) -> Self {
        if let Err(e) = config.validate() {
            warn!(error = %e, "editor config failed validation");
        }
        let schedule = CountdownSchedule::with_period(config.tick_interval());

        let mut editor = EditorOrchestrator {
            workspace: Workspace {
                figures: HashMap::new(),
                current: Gender::Male,
                lifecycle: EffectLifecycleController::with_schedule(schedule),
            },
            categories: Vec::new(),
            active_category: CategoryName::Generic,
            structure,
            icons: UrlTemplateResolver::new(config.effect_icon_url.clone()),
            outbox,
            store,
            wardrobe: Wardrobe::new(config.max_wardrobe_slots),
            wardrobe_requested: false,
            figure_set_ids: Vec::new(),
            bound_furniture_names: Vec::new(),
            session_look: None,
            club_level: config.club_level,
            mode: EditMode::Normal,
            visible: false,
            needs_reset: true,
            load_snapshot: None,
            preview: None,
            rng: StdRng::from_entropy(),
            config,
        };

        editor.setup_figures();
        editor.rebuild_categories();
        editor
    }

    /// Deterministic randomizer
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    // Accessors

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn current_gender(&self) -> Gender {
        self.workspace.current
    }

    pub fn current_figure(&self) -> Option<&FigureData> {
        self.workspace.figure()
    }

    pub fn figure(&self, gender: Gender) -> Option<&FigureData> {
        self.workspace.figures.get(&gender)
    }

    pub fn lifecycle(&self) -> &EffectLifecycleController {
        &self.workspace.lifecycle
    }

    pub fn categories(&self) -> &[Box<dyn CategoryModel>] {
        &self.categories
    }

    pub fn category(&self, name: CategoryName) -> Option<&dyn CategoryModel> {
        self.categories
            .iter()
            .find(|model| model.name() == name)
            .map(|model| &**model)
    }

    pub fn active_category(&self) -> CategoryName {
        self.active_category
    }

    pub fn wardrobe(&self) -> &Wardrobe {
        &self.wardrobe
    }

    pub fn store(&self) -> &dyn LookStore {
        &*self.store
    }

    pub fn figure_set_ids(&self) -> &[i32] {
        &self.figure_set_ids
    }

    pub fn bound_furniture_names(&self) -> &[String] {
        &self.bound_furniture_names
    }

    pub fn load_snapshot(&self) -> Option<&LoadSnapshot> {
        self.load_snapshot.as_ref()
    }

    pub fn preview_key(&self) -> Option<PreviewKey> {
        self.workspace.figure().map(FigureData::preview_key)
    }

    pub fn effect_time_display(&self) -> EffectTimeDisplay {
        self.workspace.lifecycle.effect_time_display()
    }

    pub fn selected_progress(&self) -> Option<f32> {
        self.workspace.lifecycle.selected_progress()
    }

    pub fn effect_icon_url(&self, effect: EffectId) -> String {
        self.icons.effect_icon_url(effect)
    }

    pub fn countdown_token(&self) -> Option<TickToken> {
        self.workspace.lifecycle.schedule().token()
    }

    pub fn tick_period(&self) -> Duration {
        self.workspace.lifecycle.schedule().period()
    }

    // Session inputs

    /// The user's saved figure, loaded when the editor opens in normal mode
    pub fn set_session_look(&mut self, figure: impl Into<String>, gender: Gender) {
        self.session_look = Some((figure.into(), gender));
    }

    pub fn set_club_level(&mut self, club_level: u8) {
        if self.club_level != club_level {
            self.club_level = club_level;
            self.rebuild_categories();
        }
    }

    // Visibility

    /// Apply an `avatar-editor/...` link
    pub fn handle_link(&mut self, url: &str) -> FiguraResult<()> {
        let link = EditorLink::parse(url)?;
        let mode = match link.restricted_gender {
            Some(gender) => EditMode::Restricted {
                gender,
                target: link.gate_object,
            },
            None => EditMode::Normal,
        };

        let show = match link.action {
            LinkAction::Show => true,
            LinkAction::Hide => false,
            LinkAction::Toggle => !self.visible,
        };
        debug!(action = ?link.action, ?mode, show, "editor link");

        if show {
            self.set_mode(mode);
            self.show();
        } else {
            self.hide();
            self.mode = mode;
        }
        Ok(())
    }

    pub fn show(&mut self) {
        if self.visible {
            return;
        }
        self.visible = true;

        if !self.wardrobe_requested {
            self.request_wardrobe();
        }
        if self.needs_reset {
            self.load_for_mode();
            self.needs_reset = false;
        }

        self.attach_current_observer();
        self.rebuild_categories();
        self.workspace.lifecycle.sync_countdown(true);
        info!(mode = ?self.mode, gender = %self.workspace.current, "avatar editor shown");
    }

    /// Hide: the countdown stops, observers detach and the next show reloads
    pub fn hide(&mut self) {
        if !self.visible {
            return;
        }
        self.visible = false;

        self.workspace.lifecycle.stop_countdown();
        self.detach_observers();
        self.setup_figures();
        self.needs_reset = true;
        info!("avatar editor hidden");
    }

    pub fn toggle(&mut self) {
        if self.visible {
            self.hide();
        } else {
            self.show();
        }
    }

    /// Hide and leave restricted mode
    pub fn close(&mut self) {
        self.hide();
        self.mode = EditMode::Normal;
    }

    /// Switch mode; a visible editor reloads for the new mode
    pub fn set_mode(&mut self, mode: EditMode) {
        if self.mode == mode {
            return;
        }
        self.mode = mode;

        if self.visible {
            self.detach_observers();
            self.setup_figures();
            self.load_for_mode();
            self.needs_reset = false;
            self.attach_current_observer();
        }
        self.rebuild_categories();
    }

    fn setup_figures(&mut self) {
        self.workspace.figures = Gender::ALL
            .iter()
            .map(|&gender| {
                let mut figure = FigureData::new(gender);
                figure.load_avatar_data(self.config.default_figure(gender), gender);
                (gender, figure)
            })
            .collect();
        self.workspace.current = Gender::Male;
    }

    fn load_for_mode(&mut self) {
        let (figure, gender, effect) = match self.mode {
            EditMode::Normal => {
                let (figure, gender) = self.session_look.clone().unwrap_or_else(|| {
                    (self.config.default_figure(Gender::Male).to_string(), Gender::Male)
                });
                (figure, gender, self.workspace.lifecycle.active())
            }
            EditMode::Restricted { gender, .. } => {
                let figure = self
                    .store
                    .get(&restricted_key(gender))
                    .unwrap_or_else(|| self.config.restricted_figure(gender).to_string());
                (figure, gender, EffectId::NONE)
            }
        };

        self.load_avatar_in_editor(&figure, gender, false);
        let reconciliation = self.workspace.lifecycle.select(effect);
        self.apply_figure_effect(reconciliation);
        self.record_load_snapshot();
    }

    // Figures

    /// Load a figure into the editor, switching gender if needed. With
    /// `reset` the loaded look becomes the Reset target.
    pub fn load_avatar_in_editor(&mut self, figure: &str, gender: Gender, reset: bool) {
        if gender != self.workspace.current {
            self.switch_figure(gender);
        }

        if let Some(data) = self.workspace.figure_mut() {
            if data.figure_string() != figure {
                data.load_avatar_data(figure, gender);
            }
        }

        if reset {
            self.record_load_snapshot();
        }
    }

    fn record_load_snapshot(&mut self) {
        let Some(data) = self.workspace.figure() else {
            return;
        };
        let snapshot = LoadSnapshot {
            figure: data.figure_string(),
            gender: data.gender(),
        };
        let effect = data.avatar_effect_type();

        self.workspace.lifecycle.record_last(effect);
        self.load_snapshot = Some(snapshot);
    }

    /// Swap the current figure; the other gender keeps its edits
    pub fn set_gender(&mut self, gender: Gender) {
        if self.mode.is_restricted() {
            debug!(%gender, "gender is fixed in restricted mode");
            return;
        }
        if gender == self.workspace.current {
            return;
        }

        self.switch_figure(gender);
        let effect = self
            .workspace
            .figure()
            .map(FigureData::avatar_effect_type)
            .unwrap_or(EffectId::NONE);
        let reconciliation = self.workspace.lifecycle.select(effect);
        self.workspace.apply_figure_effect(reconciliation, false);
        self.rebuild_categories();
    }

    fn switch_figure(&mut self, gender: Gender) {
        if let Some(previous) = self.workspace.figure_mut() {
            previous.clear_notify();
        }
        self.workspace.current = gender;
        if self.visible {
            self.attach_current_observer();
        }
    }

    pub fn rotate(&mut self, step: i32) {
        if let Some(figure) = self.workspace.figure_mut() {
            figure.rotate(step);
        }
    }

    // Preview

    pub fn attach_preview(&mut self, observer: PreviewObserver) {
        self.preview = Some(observer);
        if self.visible {
            self.attach_current_observer();
        }
    }

    pub fn detach_preview(&mut self) {
        self.preview = None;
        self.detach_observers();
    }

    fn attach_current_observer(&mut self) {
        let Some(observer) = self.preview.clone() else {
            return;
        };
        if let Some(figure) = self.workspace.figure_mut() {
            figure.set_notify(Box::new(move |key: &PreviewKey| observer(key)));
        }
    }

    fn detach_observers(&mut self) {
        for figure in self.workspace.figures.values_mut() {
            figure.clear_notify();
        }
    }

    // Categories

    pub fn select_category(&mut self, name: CategoryName) -> bool {
        if !self.mode.category_names().contains(&name) {
            return false;
        }
        self.active_category = name;
        true
    }

    /// Grid click. Unknown tabs, grids and indices are ignored.
    pub fn select_part(&mut self, category: CategoryName, grid: &str, index: usize) {
        let Some(model) = self.categories.iter_mut().find(|m| m.name() == category) else {
            return;
        };
        model.select_part(grid, index, &mut self.workspace);
    }

    pub fn select_color(&mut self, category: CategoryName, grid: &str, layer: usize, index: usize) {
        let Some(model) = self.categories.iter_mut().find(|m| m.name() == category) else {
            return;
        };
        model.select_color(grid, layer, index, &mut self.workspace);
    }

    fn rebuild_categories(&mut self) {
        let names = self.mode.category_names();
        let mut models: Vec<Box<dyn CategoryModel>> = names
            .iter()
            .map(|&name| -> Box<dyn CategoryModel> {
                match FigurePartModel::for_category(name) {
                    Some(model) => Box::new(model),
                    None => Box::new(EffectsModel::new()),
                }
            })
            .collect();

        let ctx = BuildContext {
            figure: self.workspace.figure(),
            available_effects: self.workspace.lifecycle.ledger().available_ids(),
            structure: self.structure.as_ref(),
            club_level: self.club_level,
            owned_figure_sets: &self.figure_set_ids,
        };
        for model in models.iter_mut() {
            model.init(&ctx);
        }

        self.categories = models;
        if !names.contains(&self.active_category) {
            self.active_category = names[0];
        }
        debug!(tabs = self.categories.len(), active = %self.active_category, "categories rebuilt");
    }

    // Server events

    pub fn handle_event(&mut self, event: &ServerEvent) {
        debug!(kind = event.kind(), "server event");

        match event {
            ServerEvent::FigureSetIds {
                figure_set_ids,
                bound_furniture_names,
            } => {
                self.figure_set_ids = figure_set_ids.clone();
                self.bound_furniture_names = bound_furniture_names.clone();
                self.rebuild_categories();
            }
            ServerEvent::WardrobePage(looks) => self.wardrobe.apply_page(looks),
            _ => {
                let reconciliation = self.workspace.lifecycle.apply_event(event);
                self.apply_reconciliation(reconciliation);
            }
        }
    }

    fn apply_figure_effect(&mut self, reconciliation: Reconciliation) {
        self.workspace.apply_figure_effect(reconciliation, true);
    }

    fn apply_reconciliation(&mut self, reconciliation: Reconciliation) {
        self.apply_figure_effect(reconciliation);
        if reconciliation.rebuild_categories {
            self.rebuild_categories();
        }
        self.workspace.lifecycle.sync_countdown(self.visible);
    }

    // Countdown

    /// Tick whatever countdown is armed
    pub fn tick(&mut self) -> bool {
        match self.countdown_token() {
            Some(token) => self.tick_with(token),
            None => false,
        }
    }

    /// One countdown second. Returns whether `token` is still live.
    pub fn tick_with(&mut self, token: TickToken) -> bool {
        let reconciliation = self.workspace.lifecycle.tick_with(token);
        self.apply_reconciliation(reconciliation);
        self.workspace.lifecycle.schedule().accepts(token)
    }

    // Wardrobe

    pub fn request_wardrobe(&mut self) {
        self.outbox.send_wardrobe_request();
        self.wardrobe_requested = true;
    }

    /// Load a saved look; the Reset target is left alone
    pub fn load_from_wardrobe(&mut self, slot: usize) -> bool {
        let Some(look) = self.wardrobe.get(slot).cloned() else {
            return false;
        };
        if self.mode.is_restricted() && look.gender != self.workspace.current {
            debug!(slot, "wardrobe look has the wrong gender for restricted mode");
            return false;
        }

        self.load_avatar_in_editor(&look.figure, look.gender, false);
        self.rebuild_categories();
        true
    }

    // Actions

    pub fn process_action(&mut self, action: EditorAction) {
        debug!(?action, "editor action");
        match action {
            EditorAction::Clear => self.clear(),
            EditorAction::Reset => self.reset(),
            EditorAction::Randomize => self.randomize(),
            EditorAction::Save => self.save(),
        }
    }

    fn clear(&mut self) {
        let Some(figure) = self.workspace.figure() else {
            return;
        };
        let face_only = figure.figure_string_with_face(None);
        let gender = figure.gender();

        self.load_avatar_in_editor(&face_only, gender, false);
        let reconciliation = self.workspace.lifecycle.clear_selection();
        self.apply_figure_effect(reconciliation);
        self.rebuild_categories();
    }

    fn reset(&mut self) {
        let Some(snapshot) = self.load_snapshot.clone() else {
            return;
        };

        self.load_avatar_in_editor(&snapshot.figure, snapshot.gender, false);
        let reconciliation = self.workspace.lifecycle.restore_last();
        self.apply_figure_effect(reconciliation);
        self.rebuild_categories();
    }

    fn randomize(&mut self) {
        let Some(figure) = self.workspace.figure() else {
            return;
        };
        let gender = figure.gender();

        let randomizer =
            FigureRandomizer::new(self.structure.as_ref(), self.club_level, &self.figure_set_ids);
        let random = randomizer.randomize(&mut self.rng, figure.figure(), gender, &[set_type::FACE]);

        self.load_avatar_in_editor(&random.to_string(), gender, false);
        self.rebuild_categories();
    }

    fn save(&mut self) {
        let Some(figure) = self.workspace.figure() else {
            return;
        };
        let look = figure.figure_string();
        let gender = figure.gender();
        let effect = figure.avatar_effect_type();

        let key = match self.mode {
            EditMode::Normal => {
                if effect.is_some() {
                    self.outbox.send_effect_selected(effect);
                }
                self.outbox.send_figure_update(gender, &look);
                normal_key(gender)
            }
            EditMode::Restricted {
                gender: gate_gender,
                target,
            } => {
                match target {
                    Some(target) => {
                        self.outbox
                            .send_restricted_figure_update(target, gate_gender, &look)
                    }
                    None => warn!("restricted look has no gate object, not sent"),
                }
                restricted_key(gate_gender)
            }
        };

        if let Err(e) = self.store.set(&key, &look) {
            warn!(key = %key, error = %e, "failed to persist look");
        }

        info!(%gender, %effect, restricted = self.mode.is_restricted(), "look saved");
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryLookStore, RecordingOutbox};
    use figura_category::{PaletteColor, PartSet, StaticFigureStructure, EFFECTS_CATEGORY};
    use figura_core::{EffectGrant, OutgoingMessage, OwnedEffect, SavedLook};
    use parking_lot::Mutex;
    use proptest::prelude::*;

    const SESSION: &str = "hr-100-40.hd-180-7.ch-215-66.lg-270-79";

    fn structure() -> Arc<dyn FigureStructure> {
        Arc::new(
            StaticFigureStructure::new()
                .with_parts("hd", vec![PartSet::new(180, None), PartSet::new(190, None)])
                .with_palette("hd", vec![PaletteColor::new(7)])
                .mandatory_for("hd", &Gender::ALL)
                .with_parts("hr", vec![PartSet::new(100, None), PartSet::new(515, None)])
                .with_palette("hr", vec![PaletteColor::new(40), PaletteColor::new(33)])
                .with_parts("ch", vec![PartSet::new(215, None), PartSet::new(635, None)])
                .with_palette("ch", vec![PaletteColor::new(66)])
                .with_parts("lg", vec![PartSet::new(270, None)])
                .with_palette("lg", vec![PaletteColor::new(79)]),
        )
    }

    fn editor() -> (EditorOrchestrator, RecordingOutbox) {
        let outbox = RecordingOutbox::new();
        let mut editor = EditorOrchestrator::new(
            EditorConfig::default(),
            structure(),
            Box::new(outbox.clone()),
            Box::new(MemoryLookStore::new()),
        )
        .with_seed(7);
        editor.set_session_look(SESSION, Gender::Male);
        (editor, outbox)
    }

    fn owned(id: u32, duration: u32, left: u32) -> OwnedEffect {
        OwnedEffect {
            effect: EffectId::new(id),
            duration,
            seconds_left_if_active: left,
            is_permanent: false,
        }
    }

    fn figure_updates(sent: &[OutgoingMessage]) -> usize {
        sent.iter()
            .filter(|m| matches!(m, OutgoingMessage::FigureUpdate { .. }))
            .count()
    }

    #[test]
    fn test_show_loads_session_look_and_requests_wardrobe() {
        let (mut editor, outbox) = editor();
        editor.show();

        assert!(editor.is_visible());
        assert_eq!(editor.current_figure().unwrap().figure_string(), SESSION);
        assert_eq!(editor.categories().len(), 5);
        assert_eq!(editor.active_category(), CategoryName::Generic);
        assert_eq!(outbox.sent(), vec![OutgoingMessage::WardrobeRequest]);
        assert_eq!(editor.load_snapshot().unwrap().figure, SESSION);
    }

    #[test]
    fn test_save_sends_effect_before_figure() {
        let (mut editor, outbox) = editor();
        editor.handle_event(&ServerEvent::EffectsSnapshot(vec![
            owned(3, 60, 0),
            owned(5, 60, 30),
        ]));
        editor.show();
        outbox.clear();

        assert_eq!(editor.current_figure().unwrap().avatar_effect_type(), EffectId::new(5));
        editor.process_action(EditorAction::Save);

        assert_eq!(
            outbox.sent(),
            vec![
                OutgoingMessage::EffectSelected(EffectId::new(5)),
                OutgoingMessage::FigureUpdate {
                    gender: Gender::Male,
                    figure: SESSION.to_string()
                },
            ]
        );
        assert!(!editor.is_visible());
        assert_eq!(
            editor.store().get(&normal_key(Gender::Male)).as_deref(),
            Some(SESSION)
        );
    }

    #[test]
    fn test_save_without_effect_skips_effect_message() {
        let (mut editor, outbox) = editor();
        editor.show();
        outbox.clear();

        editor.process_action(EditorAction::Save);
        let sent = outbox.sent();
        assert!(!sent
            .iter()
            .any(|m| matches!(m, OutgoingMessage::EffectSelected(_))));
        assert_eq!(figure_updates(&sent), 1);
    }

    #[test]
    fn test_effect_grid_selects_without_activating() {
        let (mut editor, _) = editor();
        editor.handle_event(&ServerEvent::EffectAdded(EffectGrant {
            effect: EffectId::new(9),
            duration: 120,
            is_permanent: false,
        }));
        editor.show();

        editor.select_part(CategoryName::Effects, EFFECTS_CATEGORY, 1);

        assert_eq!(editor.current_figure().unwrap().avatar_effect_type(), EffectId::new(9));
        assert_eq!(editor.lifecycle().selected(), EffectId::new(9));
        assert_eq!(editor.lifecycle().active(), EffectId::NONE);
        assert!(editor.countdown_token().is_none());
    }

    #[test]
    fn test_restricted_mode_round_trip() {
        let (mut editor, outbox) = editor();
        editor.handle_link("avatar-editor/show/F/77").unwrap();

        assert!(editor.mode().is_restricted());
        assert_eq!(editor.current_gender(), Gender::Female);
        assert_eq!(editor.categories().len(), 2);
        assert_eq!(editor.active_category(), CategoryName::Torso);
        assert!(!editor.select_category(CategoryName::Effects));

        editor.select_part(CategoryName::Legs, "lg", 1);
        let look = editor.current_figure().unwrap().figure_string();
        assert!(look.contains("lg-270-79"));

        outbox.clear();
        editor.process_action(EditorAction::Save);
        assert_eq!(
            outbox.sent(),
            vec![OutgoingMessage::RestrictedFigureUpdate {
                target: ObjectId::new(77),
                gender: Gender::Female,
                figure: look.clone()
            }]
        );
        assert_eq!(editor.mode(), EditMode::Normal);

        // Reopening restricted mode starts from the stored look
        editor.handle_link("avatar-editor/show/F/77").unwrap();
        assert_eq!(editor.current_figure().unwrap().figure_string(), look);
    }

    #[test]
    fn test_clear_keeps_face_and_drops_effect() {
        let (mut editor, _) = editor();
        editor.handle_event(&ServerEvent::EffectsSnapshot(vec![owned(5, 60, 30)]));
        editor.show();

        editor.process_action(EditorAction::Clear);
        let figure = editor.current_figure().unwrap();
        assert_eq!(figure.figure_string(), "hd-180-7");
        assert_eq!(figure.avatar_effect_type(), EffectId::NONE);
        assert_eq!(editor.lifecycle().selected(), EffectId::NONE);
        // Clearing the preview does not stop the server effect
        assert_eq!(editor.lifecycle().active(), EffectId::new(5));
    }

    #[test]
    fn test_reset_restores_loaded_look_and_effect() {
        let (mut editor, _) = editor();
        editor.handle_event(&ServerEvent::EffectsSnapshot(vec![owned(5, 60, 30)]));
        editor.show();

        editor.process_action(EditorAction::Clear);
        editor.set_gender(Gender::Female);
        editor.process_action(EditorAction::Reset);

        let figure = editor.current_figure().unwrap();
        assert_eq!(editor.current_gender(), Gender::Male);
        assert_eq!(figure.figure_string(), SESSION);
        assert_eq!(figure.avatar_effect_type(), EffectId::new(5));
        assert_eq!(editor.lifecycle().selected(), EffectId::new(5));
    }

    #[test]
    fn test_randomize_preserves_face() {
        let (mut editor, _) = editor();
        editor.show();
        editor.process_action(EditorAction::Randomize);

        let figure = editor.current_figure().unwrap();
        assert_eq!(figure.figure().get("hd").unwrap().set_id, 180);
        assert_eq!(figure.avatar_effect_type(), EffectId::NONE);
    }

    #[test]
    fn test_gender_switch_keeps_other_edits() {
        let (mut editor, _) = editor();
        editor.show();
        editor.select_part(CategoryName::Head, "hr", 2);
        let male = editor.current_figure().unwrap().figure_string();

        editor.set_gender(Gender::Female);
        assert_eq!(editor.current_figure().unwrap().gender(), Gender::Female);
        editor.set_gender(Gender::Male);
        assert_eq!(editor.current_figure().unwrap().figure_string(), male);
        assert!(male.contains("hr-515"));
    }

    #[test]
    fn test_countdown_follows_visibility() {
        let (mut editor, _) = editor();
        editor.handle_event(&ServerEvent::EffectsSnapshot(vec![owned(5, 60, 3)]));
        assert!(editor.countdown_token().is_none());

        editor.show();
        let token = editor.countdown_token().unwrap();
        assert_eq!(token.effect, EffectId::new(5));

        editor.hide();
        assert!(editor.countdown_token().is_none());
        assert!(!editor.tick_with(token));

        editor.show();
        assert!(editor.tick());
        assert!(editor.tick());
        assert!(!editor.tick());
        assert_eq!(editor.lifecycle().active(), EffectId::NONE);
        assert_eq!(editor.current_figure().unwrap().avatar_effect_type(), EffectId::NONE);
    }

    #[test]
    fn test_expiry_clears_figure_effect() {
        let (mut editor, _) = editor();
        editor.handle_event(&ServerEvent::EffectsSnapshot(vec![owned(5, 60, 30)]));
        editor.show();

        editor.handle_event(&ServerEvent::EffectExpired(EffectId::new(5)));
        assert_eq!(editor.current_figure().unwrap().avatar_effect_type(), EffectId::NONE);
        assert!(editor.countdown_token().is_none());
        let effects = editor.category(CategoryName::Effects).unwrap();
        assert_eq!(effects.categories()[0].parts().len(), 1);
    }

    #[test]
    fn test_wardrobe_load_keeps_reset_target() {
        let (mut editor, _) = editor();
        editor.show();
        editor.handle_event(&ServerEvent::WardrobePage(vec![SavedLook {
            slot: 2,
            figure: "hd-600-1.ch-635-66".to_string(),
            gender: Gender::Female,
        }]));

        assert!(!editor.load_from_wardrobe(1));
        assert!(editor.load_from_wardrobe(2));
        assert_eq!(editor.current_gender(), Gender::Female);
        assert_eq!(editor.load_snapshot().unwrap().figure, SESSION);
    }

    #[test]
    fn test_figure_set_ids_rebuild_categories() {
        let (mut editor, _) = editor();
        editor.handle_event(&ServerEvent::FigureSetIds {
            figure_set_ids: vec![3001],
            bound_furniture_names: vec!["clothing_wavy".to_string()],
        });
        assert_eq!(editor.figure_set_ids(), &[3001]);
        assert_eq!(editor.bound_furniture_names().len(), 1);
    }

    #[test]
    fn test_links() {
        let (mut editor, _) = editor();
        editor.handle_link("avatar-editor/toggle").unwrap();
        assert!(editor.is_visible());
        editor.handle_link("avatar-editor/toggle").unwrap();
        assert!(!editor.is_visible());
        assert!(editor.handle_link("avatar-editor/jump").is_err());
        assert!(editor.handle_link("catalog/open").is_err());
    }

    #[test]
    fn test_preview_observer_attached_while_visible() {
        let (mut editor, _) = editor();
        let keys = Arc::new(Mutex::new(Vec::new()));
        let sink = keys.clone();
        editor.attach_preview(Arc::new(move |key: &PreviewKey| sink.lock().push(key.clone())));

        editor.show();
        editor.rotate(1);
        let seen = keys.lock().len();
        assert!(seen >= 1);
        assert_eq!(keys.lock().last().unwrap().direction.value(), 5);

        editor.hide();
        editor.rotate(1);
        assert_eq!(keys.lock().len(), seen);
    }

    #[test]
    fn test_icon_url() {
        let (editor, _) = editor();
        let url = editor.effect_icon_url(EffectId::new(12));
        assert!(url.ends_with("avatar_effect_12.png"));
    }

    #[test]
    fn test_selection_callback_writes_current_figure() {
        let (mut editor, _) = editor();
        editor.show();
        let before = editor.current_figure().unwrap().update_id();

        editor.workspace.effect_selected(EffectId::new(9));
        let figure = editor.current_figure().unwrap();
        assert_eq!(figure.avatar_effect_type(), EffectId::new(9));
        assert_eq!(figure.update_id(), before + 1);
        assert_eq!(editor.lifecycle().selected(), EffectId::new(9));

        // Already showing the effect: no extra refresh
        editor.workspace.effect_selected(EffectId::new(9));
        assert_eq!(editor.current_figure().unwrap().update_id(), before + 1);
    }

    #[test]
    fn test_gender_switch_selects_that_figures_effect() {
        let (mut editor, _) = editor();
        editor.handle_event(&ServerEvent::EffectsSnapshot(vec![owned(5, 60, 30)]));
        editor.show();

        editor.set_gender(Gender::Female);
        let female = editor.current_figure().unwrap().avatar_effect_type();
        assert_eq!(editor.lifecycle().selected(), female);

        editor.set_gender(Gender::Male);
        assert_eq!(editor.current_figure().unwrap().avatar_effect_type(), EffectId::new(5));
        assert_eq!(editor.lifecycle().selected(), EffectId::new(5));
    }

    #[test]
    fn test_zero_tick_interval_uses_default_period() {
        let config = EditorConfig {
            tick_interval_ms: 0,
            ..EditorConfig::default()
        };
        let editor = EditorOrchestrator::new(
            config,
            structure(),
            Box::new(RecordingOutbox::new()),
            Box::new(MemoryLookStore::new()),
        );
        assert_eq!(editor.tick_period(), Duration::from_secs(1));
    }

    proptest! {
        #[test]
        fn prop_save_sends_effect_before_figure(id in 0u32..5000, left in 1u32..600) {
            let (mut editor, outbox) = editor();
            let effects = if id == 0 { vec![] } else { vec![owned(id, 600, left)] };
            editor.handle_event(&ServerEvent::EffectsSnapshot(effects));
            editor.show();
            outbox.clear();

            editor.process_action(EditorAction::Save);

            let figure = OutgoingMessage::FigureUpdate {
                gender: Gender::Male,
                figure: SESSION.to_string(),
            };
            let expected = if id == 0 {
                vec![figure]
            } else {
                vec![OutgoingMessage::EffectSelected(EffectId::new(id)), figure]
            };
            prop_assert_eq!(outbox.sent(), expected);
            prop_assert!(!editor.is_visible());
        }
    }
}
