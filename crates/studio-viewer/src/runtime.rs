//! Scene runtime: the mutable scene shared by the frame loop and UI handlers
//!
//! User edits and history navigation are separate entry points. Only
//! `user_edit` records history; applying a history entry never does.

use crate::appearance::AppearanceController;
use crate::history::{HistoryStep, SceneHistory, SceneState};
use crate::motion::{self, SubjectMotion};
use crate::rng::XorShift32;
use std::path::Path;
use studio_catalog::{custom_backdrop, Backdrop, CustomIdGenerator, Outfit, Tint};
use studio_render::MAX_BLUR_PX;

/// How long the morph indicator stays up after a pulse
pub const MORPH_INDICATOR_SECS: f32 = 1.2;

/// A partial scene change. Unset fields keep their current value.
#[derive(Debug, Clone, Default)]
pub struct SceneUpdate {
    pub backdrop: Option<Backdrop>,
    /// `Some(None)` takes the outfit off
    pub outfit: Option<Option<Outfit>>,
    pub tint: Option<Tint>,
    pub reflection: Option<f32>,
    pub grid: Option<f32>,
}

impl SceneUpdate {
    pub fn backdrop(backdrop: Backdrop) -> Self {
        Self {
            backdrop: Some(backdrop),
            ..Default::default()
        }
    }

    pub fn outfit(outfit: Option<Outfit>) -> Self {
        Self {
            outfit: Some(outfit),
            ..Default::default()
        }
    }

    pub fn tint(tint: Tint) -> Self {
        Self {
            tint: Some(tint),
            ..Default::default()
        }
    }

    pub fn reflection(level: f32) -> Self {
        Self {
            reflection: Some(level),
            ..Default::default()
        }
    }

    pub fn grid(level: f32) -> Self {
        Self {
            grid: Some(level),
            ..Default::default()
        }
    }

    fn touches_appearance(&self) -> bool {
        self.outfit.is_some() || self.tint.is_some()
    }
}

/// What the host has to do after a scene change
#[derive(Debug, Clone, Default)]
pub struct SceneEffects {
    /// Backdrop to hand to the compositor
    pub backdrop: Option<Backdrop>,
    /// New style descriptor for the prompt builder
    pub descriptor: Option<String>,
    pub pulsed: bool,
    pub committed: bool,
}

pub struct SceneRuntime {
    state: SceneState,
    history: SceneHistory,
    appearance: AppearanceController,
    motion: SubjectMotion,
    rng: XorShift32,
    hovered: bool,
    blur: f32,
    clock: f32,
    morph_indicator_until: Option<f32>,
    user_backdrops: Vec<Backdrop>,
    ids: CustomIdGenerator,
}

impl SceneRuntime {
    /// Runtime whose history holds `initial` as its single entry
    pub fn new(initial: SceneState, blur: f32) -> Self {
        let mut appearance = AppearanceController::new();
        let mut motion = SubjectMotion::default();
        appearance.apply(initial.outfit.as_ref(), &initial.tint, &mut motion, false);
        motion.color = motion.target_color;
        Self {
            history: SceneHistory::with_initial(initial.clone()),
            state: initial,
            appearance,
            motion,
            rng: XorShift32::default(),
            hovered: false,
            blur: blur.clamp(0.0, MAX_BLUR_PX),
            clock: 0.0,
            morph_indicator_until: None,
            user_backdrops: Vec::new(),
            ids: CustomIdGenerator::new(),
        }
    }

    /// Effects that bring a fresh host in line with the initial state
    pub fn initial_effects(&self) -> SceneEffects {
        SceneEffects {
            backdrop: Some(self.state.backdrop.clone()),
            descriptor: Some(self.appearance.descriptor().to_string()),
            pulsed: false,
            committed: false,
        }
    }

    /// Apply a user change, then record the resulting state
    pub fn user_edit(&mut self, update: SceneUpdate) -> SceneEffects {
        let pulse = update.touches_appearance();
        let mut next = self.state.clone();
        if let Some(backdrop) = update.backdrop {
            next.backdrop = backdrop;
        }
        if let Some(outfit) = update.outfit {
            next.outfit = outfit;
        }
        if let Some(tint) = update.tint {
            next.tint = tint;
        }
        if let Some(level) = update.reflection {
            next.reflection = level.clamp(0.0, 1.0);
        }
        if let Some(level) = update.grid {
            next.grid = level.clamp(0.0, 1.0);
        }

        let mut effects = self.set_state(next, pulse);
        effects.committed = self.history.commit(self.state.clone());
        effects
    }

    /// Show a history entry. Never records history.
    pub fn apply_from_history(&mut self, step: HistoryStep) -> SceneEffects {
        self.set_state(step.state, step.appearance_changed)
    }

    pub fn undo(&mut self) -> Option<SceneEffects> {
        let step = self.history.undo()?;
        Some(self.apply_from_history(step))
    }

    pub fn redo(&mut self) -> Option<SceneEffects> {
        let step = self.history.redo()?;
        Some(self.apply_from_history(step))
    }

    /// Live reflection level while a slider is dragged, not recorded
    pub fn preview_reflection(&mut self, level: f32) {
        self.state.reflection = level.clamp(0.0, 1.0);
    }

    /// Live grid level while a slider is dragged, not recorded
    pub fn preview_grid(&mut self, level: f32) {
        self.state.grid = level.clamp(0.0, 1.0);
    }

    /// Focus blur is a view filter and never enters history
    pub fn set_blur(&mut self, px: f32) {
        self.blur = px.clamp(0.0, MAX_BLUR_PX);
    }

    /// Register an imported file as a backdrop and switch to it
    pub fn import_backdrop(&mut self, path: &Path, mime: Option<&str>) -> SceneEffects {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        let backdrop = custom_backdrop(
            self.ids.next_id(),
            &file_name,
            &path.to_string_lossy(),
            mime,
        );
        log::info!(
            "Imported backdrop '{}' as {} ({})",
            file_name,
            backdrop.kind.tag(),
            backdrop.id
        );
        self.user_backdrops.insert(0, backdrop.clone());
        self.user_edit(SceneUpdate::backdrop(backdrop))
    }

    pub fn push_impulse(&mut self, amount: f32) {
        self.motion.push_impulse(amount);
    }

    pub fn set_hovered(&mut self, hovered: bool) {
        self.hovered = hovered;
    }

    /// Step motion and timers by `dt` seconds
    pub fn advance(&mut self, dt: f32) {
        self.clock += dt.max(0.0);
        self.motion = motion::advance(self.motion, dt, self.hovered, &mut self.rng);
        if self.morph_indicator_until.is_some_and(|until| self.clock >= until) {
            self.morph_indicator_until = None;
        }
    }

    fn set_state(&mut self, next: SceneState, pulse: bool) -> SceneEffects {
        let backdrop_changed = next.backdrop.id != self.state.backdrop.id;
        let appearance_changed = next.appearance_differs(&self.state);
        self.state = next;

        let mut effects = SceneEffects {
            backdrop: backdrop_changed.then(|| self.state.backdrop.clone()),
            pulsed: pulse,
            ..Default::default()
        };
        if pulse || appearance_changed {
            effects.descriptor = self.appearance.apply(
                self.state.outfit.as_ref(),
                &self.state.tint,
                &mut self.motion,
                pulse,
            );
        }
        if pulse {
            self.morph_indicator_until = Some(self.clock + MORPH_INDICATOR_SECS);
        }
        effects
    }

    pub fn state(&self) -> &SceneState {
        &self.state
    }

    pub fn history(&self) -> &SceneHistory {
        &self.history
    }

    pub fn motion(&self) -> &SubjectMotion {
        &self.motion
    }

    pub fn blur(&self) -> f32 {
        self.blur
    }

    pub fn hovered(&self) -> bool {
        self.hovered
    }

    pub fn descriptor(&self) -> &str {
        self.appearance.descriptor()
    }

    pub fn morph_indicator_active(&self) -> bool {
        self.morph_indicator_until.is_some()
    }

    /// Imported backdrops, most recent first
    pub fn user_backdrops(&self) -> &[Backdrop] {
        &self.user_backdrops
    }

    /// Short label of what is on stage
    pub fn stream_status(&self) -> String {
        match &self.state.outfit {
            Some(outfit) => format!("{} {}", self.state.tint.name, outfit.name),
            None => format!("Set: {}", self.state.backdrop.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use studio_catalog::{BackdropKind, Catalog};
    use studio_core::Color;

    fn runtime() -> (Catalog, SceneRuntime) {
        let catalog = Catalog::builtin().unwrap();
        let initial = SceneState::initial(&catalog, 0.5, 0.3);
        let runtime = SceneRuntime::new(initial, 4.0);
        (catalog, runtime)
    }

    #[test]
    fn starts_with_one_entry_and_the_first_backdrop() {
        let (catalog, rt) = runtime();
        assert_eq!(rt.history().len(), 1);
        assert_eq!(rt.state().backdrop.id, catalog.default_backdrop().id);
        let effects = rt.initial_effects();
        assert_eq!(effects.backdrop.map(|b| b.id), Some(catalog.default_backdrop().id.clone()));
        assert_eq!(effects.descriptor.as_deref(), Some(""));
        assert_eq!(rt.motion().color, Color::WHITE);
    }

    #[test]
    fn selecting_an_outfit_pulses_and_describes() {
        let (catalog, mut rt) = runtime();
        let effects = rt.user_edit(SceneUpdate {
            outfit: Some(catalog.outfit("exec-suit").cloned()),
            tint: catalog.tint("Crimson").cloned(),
            ..Default::default()
        });
        assert!(effects.committed);
        assert!(effects.pulsed);
        assert!(effects.backdrop.is_none());
        assert_eq!(
            effects.descriptor.as_deref(),
            Some("wearing a crimson bespoke tailored three-piece suit, material: Super 120s Merino Wool, texture: Fine Twill, fit: Bespoke")
        );
        assert_eq!(rt.motion().morph, 1.0);
        assert_eq!(rt.motion().target_color.to_hex(), 0x8b0000);
        assert!(rt.morph_indicator_active());
        assert_eq!(rt.stream_status(), "Crimson Executive Suit");
    }

    #[test]
    fn backdrop_change_is_silent() {
        let (catalog, mut rt) = runtime();
        let next = catalog.backdrops()[1].clone();
        let effects = rt.user_edit(SceneUpdate::backdrop(next.clone()));
        assert!(!effects.pulsed);
        assert_eq!(effects.backdrop.map(|b| b.id), Some(next.id));
        assert_eq!(rt.motion().morph, 0.0);
        assert_eq!(rt.stream_status(), format!("Set: {}", next.name));
    }

    #[test]
    fn repeated_edit_does_not_commit() {
        let (catalog, mut rt) = runtime();
        let effects = rt.user_edit(SceneUpdate::backdrop(catalog.default_backdrop().clone()));
        assert!(!effects.committed);
        assert_eq!(rt.history().len(), 1);
    }

    #[test]
    fn undo_reapplies_without_recording() {
        let (catalog, mut rt) = runtime();
        rt.user_edit(SceneUpdate::outfit(catalog.outfit("heavy-hoodie").cloned()));
        rt.user_edit(SceneUpdate::backdrop(catalog.backdrops()[2].clone()));
        assert_eq!(rt.history().len(), 3);

        let effects = rt.undo().unwrap();
        assert!(!effects.committed);
        assert!(!effects.pulsed);
        assert_eq!(effects.backdrop.map(|b| b.id), Some(catalog.default_backdrop().id.clone()));
        assert_eq!(rt.history().len(), 3);

        let effects = rt.undo().unwrap();
        assert!(effects.pulsed);
        assert!(rt.state().outfit.is_none());
        assert_eq!(rt.motion().target_color, Color::WHITE);
        assert!(rt.undo().is_none());

        rt.redo().unwrap();
        assert_eq!(rt.state().outfit.as_ref().map(|o| o.id.as_str()), Some("heavy-hoodie"));
        assert_eq!(rt.history().cursor(), 1);
    }

    #[test]
    fn taking_the_outfit_off_goes_white() {
        let (catalog, mut rt) = runtime();
        rt.user_edit(SceneUpdate {
            outfit: Some(catalog.outfit("vneck-tee").cloned()),
            tint: catalog.tint("Emerald").cloned(),
            ..Default::default()
        });
        let effects = rt.user_edit(SceneUpdate::outfit(None));
        assert_eq!(effects.descriptor.as_deref(), Some(""));
        assert_eq!(rt.motion().target_color, Color::WHITE);
    }

    #[test]
    fn slider_preview_then_commit() {
        let (_, mut rt) = runtime();
        rt.preview_reflection(0.7);
        rt.preview_reflection(0.8);
        assert_eq!(rt.history().len(), 1);
        assert_eq!(rt.state().reflection, 0.8);

        let effects = rt.user_edit(SceneUpdate::reflection(0.8));
        assert!(effects.committed);
        assert_eq!(rt.history().len(), 2);

        rt.undo();
        assert_eq!(rt.state().reflection, 0.5);
    }

    #[test]
    fn blur_is_clamped_and_not_historied() {
        let (_, mut rt) = runtime();
        rt.set_blur(50.0);
        assert_eq!(rt.blur(), MAX_BLUR_PX);
        rt.set_blur(-1.0);
        assert_eq!(rt.blur(), 0.0);
        assert_eq!(rt.history().len(), 1);
    }

    #[test]
    fn morph_indicator_times_out() {
        let (catalog, mut rt) = runtime();
        rt.user_edit(SceneUpdate::tint(catalog.tint("Gold").cloned().unwrap()));
        for _ in 0..60 {
            rt.advance(1.0 / 60.0);
        }
        assert!(rt.morph_indicator_active());
        for _ in 0..15 {
            rt.advance(1.0 / 60.0);
        }
        assert!(!rt.morph_indicator_active());
    }

    #[test]
    fn imports_are_prepended_and_applied() {
        let (_, mut rt) = runtime();
        let first = rt.import_backdrop(Path::new("/media/loop.mp4"), Some("video/mp4"));
        let second = rt.import_backdrop(Path::new("/media/loft.glb"), None);

        let ids: Vec<&str> = rt.user_backdrops().iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids.len(), 2);
        assert_eq!(Some(ids[0]), second.backdrop.as_ref().map(|b| b.id.as_str()));
        assert_eq!(Some(ids[1]), first.backdrop.as_ref().map(|b| b.id.as_str()));
        assert!(matches!(rt.user_backdrops()[1].kind, BackdropKind::LoopingVideo(_)));
        assert!(matches!(rt.state().backdrop.kind, BackdropKind::Environment3D(_)));
        assert_eq!(rt.history().len(), 3);
    }

    #[test]
    fn hover_speeds_up_idle_spin() {
        let (_, mut rt) = runtime();
        rt.advance(1.0 / 60.0);
        let idle = rt.motion().rotation;
        rt.set_hovered(true);
        rt.advance(1.0 / 60.0);
        assert!(rt.motion().rotation - idle > idle);
    }
}
