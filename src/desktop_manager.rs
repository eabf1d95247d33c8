//! Top-level coordinator for placed widgets and profiles.
//!
//! The manager owns the profile list, the name of the active profile, every live
//! widget and the save debounce. User-facing prompts go through the [`Dialogs`]
//! collaborator and the context menu is handed out as plain data, so the egui shell
//! only presents things and reports back which action was picked.

use crate::constants::{BOOTSTRAP_PLACEMENT, DEFAULT_PROFILE_NAME, NEW_WIDGET_ORIGIN};
use crate::error::{AssetLoadError, ProfileError};
use crate::geometry::{Point, Size};
use crate::image_loader::MediaDecoder;
use crate::profile::{Profile, Profiles, WidgetEntry};
use crate::profile_store::ProfileStore;
use crate::save_scheduler::SaveScheduler;
use crate::widget::{PlacedWidget, PointerEvent, WidgetHost, WidgetId};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Modal prompts. `None` means the user cancelled.
pub trait Dialogs {
    fn prompt_open_media_file(&mut self, title: &str) -> Option<PathBuf>;
    fn prompt_text(&mut self, title: &str, label: &str) -> Option<String>;
    fn show_warning(&mut self, title: &str, message: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    DeleteWidget(WidgetId),
    ReplaceMedia(WidgetId),
    AddMedia,
    SwitchProfile(String),
    NewProfile,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuItem {
    Action {
        label: String,
        action: MenuAction,
        enabled: bool,
    },
    Heading(String),
    Separator,
}

impl MenuItem {
    fn action(label: impl Into<String>, action: MenuAction) -> Self {
        Self::Action {
            label: label.into(),
            action,
            enabled: true,
        }
    }
}

/// The actions offered at a pointer position, for the shell to present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextMenu {
    pub widget: Option<WidgetId>,
    pub position: Point,
    pub items: Vec<MenuItem>,
}

impl ContextMenu {
    #[cfg(test)]
    pub fn actions(&self) -> impl Iterator<Item = (&MenuAction, bool)> {
        self.items.iter().filter_map(|item| match item {
            MenuItem::Action {
                action, enabled, ..
            } => Some((action, *enabled)),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bootstrap {
    Loaded,
    Cancelled,
}

/// Collects what widgets ask for while the manager's fields are split-borrowed.
struct HostSink<'a> {
    saves: &'a mut SaveScheduler,
    menu_request: &'a mut Option<(WidgetId, Point)>,
}

impl WidgetHost for HostSink<'_> {
    fn on_context_menu_requested(&mut self, widget: WidgetId, global_pos: Point) {
        *self.menu_request = Some((widget, global_pos));
    }

    fn on_save_requested(&mut self) {
        self.saves.request();
    }
}

pub struct DesktopManager {
    store: ProfileStore,
    decoder: Box<dyn MediaDecoder>,
    screen: Size,
    profiles: Profiles,
    active_profile: Option<String>,
    widgets: Vec<PlacedWidget>,
    saves: SaveScheduler,
    menu_request: Option<(WidgetId, Point)>,
    quit_requested: bool,
}

impl DesktopManager {
    /// Reads the profile list; call [`Self::try_load_default_profile`] next.
    pub fn new(store: ProfileStore, decoder: Box<dyn MediaDecoder>, screen: Size) -> Self {
        let profiles = store.load();
        log::info!(
            "Loaded {} profile(s) from {}",
            profiles.len(),
            store.path().display()
        );
        Self {
            store,
            decoder,
            screen,
            profiles,
            active_profile: None,
            widgets: Vec::new(),
            saves: SaveScheduler::new(),
            menu_request: None,
            quit_requested: false,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn profiles(&self) -> &Profiles {
        &self.profiles
    }

    pub fn active_profile_name(&self) -> Option<&str> {
        self.active_profile.as_deref()
    }

    pub fn widgets(&self) -> &[PlacedWidget] {
        &self.widgets
    }

    pub fn widget(&self, id: WidgetId) -> Option<&PlacedWidget> {
        self.widgets.iter().find(|w| w.id() == id)
    }

    pub fn widget_mut(&mut self, id: WidgetId) -> Option<&mut PlacedWidget> {
        self.widgets.iter_mut().find(|w| w.id() == id)
    }

    pub fn is_save_pending(&self) -> bool {
        self.saves.is_pending()
    }

    pub fn should_quit(&self) -> bool {
        self.quit_requested
    }

    pub fn set_screen_bounds(&mut self, screen: Size) {
        if screen != self.screen && screen.width > 0 && screen.height > 0 {
            log::debug!("Screen bounds now {}x{}", screen.width, screen.height);
            self.screen = screen;
        }
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Profiles
    // ─────────────────────────────────────────────────────────────────────────────

    /// Activates "Default", bootstrapping it from a picked file if it does not exist
    /// or would leave nothing on screen. `Cancelled` means the user declined and the
    /// profile file was not touched.
    pub fn try_load_default_profile(&mut self, dialogs: &mut dyn Dialogs) -> Bootstrap {
        if self.profiles.contains(DEFAULT_PROFILE_NAME) {
            self.load_profile(DEFAULT_PROFILE_NAME);
            if !self.widgets.is_empty() {
                return Bootstrap::Loaded;
            }
            log::warn!("The Default profile has nothing to show");
            return self.refill_default_profile(dialogs);
        }

        let Some(path) = self.prompt_bootstrap_media(dialogs) else {
            log::info!("No media picked for the Default profile");
            return Bootstrap::Cancelled;
        };

        let entry = WidgetEntry::media(path.to_string_lossy(), BOOTSTRAP_PLACEMENT);
        self.profiles
            .push(Profile::new(DEFAULT_PROFILE_NAME, vec![entry]));
        log::info!("Created the Default profile with {}", path.display());
        self.persist();
        self.load_profile(DEFAULT_PROFILE_NAME);
        Bootstrap::Loaded
    }

    /// Puts a freshly picked file into the existing Default profile, replacing
    /// whatever entries it had that could not be shown.
    fn refill_default_profile(&mut self, dialogs: &mut dyn Dialogs) -> Bootstrap {
        let Some(path) = self.prompt_bootstrap_media(dialogs) else {
            log::info!("No media picked for the Default profile");
            return Bootstrap::Cancelled;
        };

        self.active_profile = Some(DEFAULT_PROFILE_NAME.to_string());
        match self.create_widget(&path) {
            Ok(id) => {
                if let Some(widget) = self.widget_mut(id) {
                    widget.set_geometry(BOOTSTRAP_PLACEMENT);
                }
                self.save_current_profile();
                Bootstrap::Loaded
            }
            Err(err) => {
                log::warn!("{err}");
                Bootstrap::Cancelled
            }
        }
    }

    /// Switches profiles. A profile whose entries all fail to load would leave no
    /// widget to open the menu from, so that falls back to Default.
    fn switch_profile(&mut self, name: &str, dialogs: &mut dyn Dialogs) {
        if !self.load_profile(name) || !self.widgets.is_empty() {
            return;
        }
        log::warn!("Profile '{name}' has nothing to show, falling back to Default");
        if self.try_load_default_profile(dialogs) == Bootstrap::Cancelled {
            self.quit();
        }
    }

    fn prompt_bootstrap_media(&self, dialogs: &mut dyn Dialogs) -> Option<PathBuf> {
        loop {
            let path = dialogs.prompt_open_media_file("Select Image or GIF to Put on Desktop")?;
            match self.decoder.decode(&path) {
                Ok(_) => return Some(path),
                Err(err) => {
                    log::warn!("{err}");
                    dialogs.show_warning("Could Not Open Media", &err.to_string());
                }
            }
        }
    }

    /// Makes `name` active and replaces the live widgets with its entries. A profile
    /// without entries only changes the active name. Returns false if unknown.
    ///
    /// The normalizing save is skipped when no entry could be shown, so a profile
    /// whose media is temporarily unreachable is not rewritten as empty.
    pub fn load_profile(&mut self, name: &str) -> bool {
        let Some(profile) = self.profiles.find(name) else {
            log::warn!("No profile named '{name}'");
            return false;
        };
        let entries = profile.widgets.clone();
        self.active_profile = Some(name.to_string());
        log::info!("Active profile is now '{name}'");
        if entries.is_empty() {
            return true;
        }

        self.clear_widgets();

        let loadable: Vec<&WidgetEntry> = entries
            .iter()
            .filter(|entry| {
                let known = entry.widget_kind().is_some();
                if !known {
                    log::warn!(
                        "Skipping widget of unknown type '{}' ({}) in profile '{name}'",
                        entry.kind,
                        entry.path
                    );
                }
                known
            })
            .collect();

        let decoder: &dyn MediaDecoder = &*self.decoder;
        let decoded: Vec<_> = loadable
            .par_iter()
            .map(|entry| (*entry, decoder.decode(Path::new(&entry.path))))
            .collect();

        for (entry, result) in decoded {
            match result {
                Ok(media) => {
                    let geometry = entry.geometry();
                    let mut widget = PlacedWidget::new(
                        Path::new(&entry.path),
                        media,
                        geometry.origin(),
                        self.screen,
                    );
                    widget.set_geometry(geometry);
                    self.widgets.push(widget);
                }
                Err(err) => log::warn!("Skipping widget in profile '{name}': {err}"),
            }
        }

        if self.widgets.is_empty() {
            // A pending save would now write an empty list over this profile.
            self.saves.cancel();
        } else {
            self.request_save();
        }
        true
    }

    /// Asks for a name and forks the displayed widgets into a new profile.
    /// `Ok(None)` when the prompt was cancelled or left blank.
    pub fn prompt_new_profile(
        &mut self,
        dialogs: &mut dyn Dialogs,
    ) -> Result<Option<String>, ProfileError> {
        let Some(input) = dialogs.prompt_text("New Profile", "Enter profile name:") else {
            return Ok(None);
        };
        let name = input.trim();
        if name.is_empty() {
            return Ok(None);
        }

        if self.profiles.contains(name) {
            let err = ProfileError::DuplicateName(name.to_string());
            log::warn!("{err}");
            dialogs.show_warning("Error", &err.to_string());
            return Err(err);
        }

        self.save_current_profile();
        self.active_profile = Some(name.to_string());
        log::info!("Created profile '{name}'");
        self.request_save();
        Ok(Some(name.to_string()))
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Widgets
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn create_widget(&mut self, path: &Path) -> Result<WidgetId, AssetLoadError> {
        let decoded = self.decoder.decode(path)?;
        let (x, y) = NEW_WIDGET_ORIGIN;
        let widget = PlacedWidget::new(path, decoded, Point::new(x, y), self.screen);
        let id = widget.id();
        self.widgets.push(widget);
        log::info!("Added {}", path.display());
        self.request_save();
        Ok(id)
    }

    /// Removes a widget. Emptying a profile deletes it and falls back to "Default".
    /// Returns false if the widget was not live.
    pub fn delete_widget(&mut self, id: WidgetId, dialogs: &mut dyn Dialogs) -> bool {
        let Some(index) = self.widgets.iter().position(|w| w.id() == id) else {
            return false;
        };
        self.widgets.remove(index);

        if !self.widgets.is_empty() {
            self.save_current_profile();
            return true;
        }

        if let Some(name) = self.active_profile.take() {
            self.profiles.remove(&name);
            log::info!("Removed profile '{name}' after its last widget was deleted");
        }
        self.saves.cancel();
        self.persist();

        if self.try_load_default_profile(dialogs) == Bootstrap::Cancelled {
            self.quit();
        }
        true
    }

    fn clear_widgets(&mut self) {
        self.widgets.clear();
    }

    fn add_media(&mut self, dialogs: &mut dyn Dialogs) {
        let Some(path) = dialogs.prompt_open_media_file("Select Image or GIF") else {
            return;
        };
        if let Err(err) = self.create_widget(&path) {
            log::warn!("{err}");
            dialogs.show_warning("Could Not Open Media", &err.to_string());
        }
    }

    fn replace_media(&mut self, id: WidgetId, dialogs: &mut dyn Dialogs) {
        if self.widget(id).is_none() {
            return;
        }
        let Some(path) = dialogs.prompt_open_media_file("Select Image or GIF") else {
            return;
        };

        let Self {
            widgets,
            decoder,
            saves,
            menu_request,
            screen,
            ..
        } = self;
        let Some(widget) = widgets.iter_mut().find(|w| w.id() == id) else {
            return;
        };
        let mut host = HostSink {
            saves,
            menu_request,
        };
        if let Err(err) = widget.load_media(&path, None, &**decoder, *screen, &mut host) {
            log::warn!("{err}");
            dialogs.show_warning("Could Not Open Media", &err.to_string());
        }
    }

    /// Routes pointer input to a widget. Returns false if the widget is gone.
    pub fn handle_pointer(&mut self, id: WidgetId, event: PointerEvent, now: Instant) -> bool {
        let Self {
            widgets,
            saves,
            menu_request,
            ..
        } = self;
        let Some(widget) = widgets.iter_mut().find(|w| w.id() == id) else {
            return false;
        };
        widget.handle_pointer(
            event,
            now,
            &mut HostSink {
                saves,
                menu_request,
            },
        );
        true
    }

    /// The window hosting a widget changed size on its own.
    pub fn handle_widget_resized(&mut self, id: WidgetId, size: Size) {
        if let Some(widget) = self.widget_mut(id) {
            if widget.geometry().size() != size {
                widget.handle_resized(size);
                self.request_save();
            }
        }
    }

    /// Fires timers and advances animations. Returns true if anything visible changed.
    pub fn tick(&mut self, now: Instant, dt: Duration) -> bool {
        let mut changed = false;
        for widget in &mut self.widgets {
            changed |= widget.tick(now);
            changed |= widget.advance(dt);
        }
        changed
    }

    /// Earliest time any widget needs attention.
    pub fn next_deadline(&self, now: Instant) -> Option<Duration> {
        self.widgets
            .iter()
            .filter_map(|w| w.next_deadline(now))
            .min()
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Context menu
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn show_context_menu(&self, widget: Option<WidgetId>, position: Point) -> ContextMenu {
        let widget = widget.filter(|id| self.widget(*id).is_some());
        let mut items = Vec::new();

        if let Some(id) = widget {
            items.push(MenuItem::action("Delete", MenuAction::DeleteWidget(id)));
            items.push(MenuItem::action(
                "Replace Image/GIF...",
                MenuAction::ReplaceMedia(id),
            ));
            items.push(MenuItem::Separator);
        }

        items.push(MenuItem::action("Add Image/GIF...", MenuAction::AddMedia));

        if !self.profiles.is_empty() {
            items.push(MenuItem::Heading("Profiles".to_string()));
            for name in self.profiles.names() {
                items.push(MenuItem::Action {
                    label: name.to_string(),
                    action: MenuAction::SwitchProfile(name.to_string()),
                    enabled: self.active_profile.as_deref() != Some(name),
                });
            }
        }

        items.push(MenuItem::action("New Profile...", MenuAction::NewProfile));
        items.push(MenuItem::Separator);
        items.push(MenuItem::action("Exit", MenuAction::Quit));

        ContextMenu {
            widget,
            position,
            items,
        }
    }

    /// The menu for the most recent secondary press on a widget, if any.
    pub fn take_menu_request(&mut self) -> Option<ContextMenu> {
        let (id, position) = self.menu_request.take()?;
        Some(self.show_context_menu(Some(id), position))
    }

    pub fn apply_menu_action(&mut self, action: MenuAction, dialogs: &mut dyn Dialogs) {
        log::debug!("Menu action {action:?}");
        match action {
            MenuAction::DeleteWidget(id) => {
                self.delete_widget(id, dialogs);
            }
            MenuAction::ReplaceMedia(id) => self.replace_media(id, dialogs),
            MenuAction::AddMedia => self.add_media(dialogs),
            MenuAction::SwitchProfile(name) => self.switch_profile(&name, dialogs),
            MenuAction::NewProfile => {
                // A duplicate name was already reported to the user.
                let _ = self.prompt_new_profile(dialogs);
            }
            MenuAction::Quit => self.quit(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Saving
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn request_save(&mut self) {
        if self.saves.request() {
            log::debug!("Save scheduled");
        }
    }

    /// Runs the coalesced save if one is pending. Call once per idle tick.
    pub fn process_pending_save(&mut self) -> bool {
        if !self.saves.take() {
            return false;
        }
        self.save_current_profile();
        log::debug!(
            "Flushed save {} ({} requests so far)",
            self.saves.flush_count(),
            self.saves.request_count()
        );
        true
    }

    /// Writes the live widgets into the active profile and persists every profile.
    pub fn save_current_profile(&mut self) {
        self.saves.cancel();
        let Some(name) = self.active_profile.clone() else {
            return;
        };
        let entries = self.widgets.iter().map(PlacedWidget::serialize).collect();
        self.profiles.upsert(&name, entries);
        self.persist();
    }

    fn persist(&self) {
        if let Err(err) = self.store.save(&self.profiles) {
            log::error!("Failed to save profiles: {err}");
        }
    }

    /// Flushes a pending save, then tears the widgets down.
    pub fn quit(&mut self) {
        self.process_pending_save();
        log::info!("Quitting with {} widget(s) on screen", self.widgets.len());
        self.clear_widgets();
        self.quit_requested = true;
    }
}
