//! eframe shell around [`DesktopManager`].
//!
//! Every placed widget gets its own frameless, always-on-top, transparent viewport.
//! Pointer input in those viewports is translated into [`PointerEvent`]s, the context
//! menu and the new-profile prompt are small viewports of their own, and file and
//! warning dialogs go through `rfd`. The root viewport only drives the loop.

use crate::constants::{
    APP_NAME, COLOR_RESIZE_HANDLE, COLOR_RESIZE_HANDLE_BORDER, IDLE_REPAINT_INTERVAL,
    MEDIA_EXTENSIONS, MENU_ROW_HEIGHT, MENU_SEPARATOR_HEIGHT, MENU_WIDTH, NAME_PROMPT_SIZE,
};
use crate::desktop_manager::{ContextMenu, DesktopManager, Dialogs, MenuAction, MenuItem};
use crate::geometry::{Point, Rect, Size};
use crate::media_surface::RenderKey;
use crate::widget::{CursorShape, PointerButton, PointerEvent, WidgetId};
use egui::{
    pos2, vec2, Color32, CursorIcon, Pos2, Stroke, TextureOptions, ViewportBuilder,
    ViewportCommand, ViewportId,
};
use image::RgbaImage;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;

/// Native dialogs through rfd. The text prompt has no native counterpart, so it
/// answers with whatever the egui name prompt staged.
#[derive(Default)]
pub struct NativeDialogs {
    staged_text: Option<String>,
}

impl Dialogs for NativeDialogs {
    fn prompt_open_media_file(&mut self, title: &str) -> Option<PathBuf> {
        rfd::FileDialog::new()
            .set_title(title)
            .add_filter("Image Files", &MEDIA_EXTENSIONS)
            .pick_file()
    }

    fn prompt_text(&mut self, _title: &str, _label: &str) -> Option<String> {
        self.staged_text.take()
    }

    fn show_warning(&mut self, title: &str, message: &str) {
        rfd::MessageDialog::new()
            .set_level(rfd::MessageLevel::Warning)
            .set_title(title)
            .set_description(message)
            .set_buttons(rfd::MessageButtons::Ok)
            .show();
    }
}

struct WidgetView {
    texture: egui::TextureHandle,
    key: RenderKey,
    /// Size last sent to the window; the reported size lags until it catches up.
    commanded_size: Option<Size>,
}

/// What a widget viewport reported back for one frame.
struct ViewportInput {
    events: Vec<PointerEvent>,
    inner_size: Option<Size>,
    close_requested: bool,
}

pub struct DesktopApp {
    manager: DesktopManager,
    dialogs: NativeDialogs,
    views: HashMap<WidgetId, WidgetView>,
    menu: Option<ContextMenu>,
    name_prompt: Option<String>,
    last_frame: Instant,
}

impl DesktopApp {
    pub fn new(manager: DesktopManager, dialogs: NativeDialogs) -> Self {
        Self {
            manager,
            dialogs,
            views: HashMap::new(),
            menu: None,
            name_prompt: None,
            last_frame: Instant::now(),
        }
    }

    /// Uploads the widget's current frame if it changed since the last upload.
    fn sync_texture(&mut self, ctx: &egui::Context, id: WidgetId) -> Option<egui::TextureId> {
        let widget = self.manager.widget_mut(id)?;
        let key = widget.surface().render_key();
        let stale = self.views.get(&id).map_or(true, |view| view.key != key);
        if stale {
            let image = color_image(widget.surface_mut().rendered_frame());
            match self.views.get_mut(&id) {
                Some(view) => {
                    view.texture.set(image, TextureOptions::LINEAR);
                    view.key = key;
                }
                None => {
                    let texture =
                        ctx.load_texture(format!("widget-{id}"), image, TextureOptions::LINEAR);
                    self.views.insert(
                        id,
                        WidgetView {
                            texture,
                            key,
                            commanded_size: None,
                        },
                    );
                }
            }
        }
        self.views.get(&id).map(|view| view.texture.id())
    }

    /// Draws one widget viewport and feeds its input back. Returns true if the
    /// widget saw a button press this frame.
    fn show_widget(&mut self, ctx: &egui::Context, id: WidgetId, now: Instant) -> bool {
        let Some(texture_id) = self.sync_texture(ctx, id) else {
            return false;
        };
        let Some(widget) = self.manager.widget(id) else {
            return false;
        };

        let before = widget.geometry();
        let handle_rect = widget
            .affordance()
            .is_visible()
            .then(|| to_egui_rect(widget.affordance().rect()));
        let cursor = match widget.cursor() {
            CursorShape::Arrow => CursorIcon::Default,
            CursorShape::ResizeDiagonal => CursorIcon::ResizeNwSe,
        };
        let title = widget
            .path()
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(APP_NAME)
            .to_string();

        let viewport_id = ViewportId::from_hash_of(id);
        let builder = ViewportBuilder::default()
            .with_title(title)
            .with_decorations(false)
            .with_always_on_top()
            .with_transparent(true)
            .with_taskbar(false)
            .with_resizable(false)
            .with_position(to_pos2(before.origin()))
            .with_inner_size(to_vec2(before.size()));

        let input = ctx.show_viewport_immediate(viewport_id, builder, |ctx, _class| {
            egui::CentralPanel::default()
                .frame(egui::Frame::none())
                .show(ctx, |ui| {
                    let rect = ui.max_rect();
                    let uv = egui::Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0));
                    ui.painter().image(texture_id, rect, uv, Color32::WHITE);
                    if let Some(handle) = handle_rect {
                        ui.painter().rect(
                            handle.translate(rect.min.to_vec2()),
                            0.0,
                            COLOR_RESIZE_HANDLE,
                            Stroke::new(1.0, COLOR_RESIZE_HANDLE_BORDER),
                        );
                    }
                });
            ctx.set_cursor_icon(cursor);
            ctx.input(|i| ViewportInput {
                events: pointer_events(i),
                inner_size: i
                    .viewport()
                    .inner_rect
                    .map(|r| Size::new(r.width().round() as i32, r.height().round() as i32)),
                close_requested: i.viewport().close_requested(),
            })
        });

        let pressed = input
            .events
            .iter()
            .any(|event| matches!(event, PointerEvent::Pressed { .. }));
        for event in input.events {
            self.manager.handle_pointer(id, event, now);
        }

        if input.close_requested {
            self.manager
                .apply_menu_action(MenuAction::DeleteWidget(id), &mut self.dialogs);
            return pressed;
        }

        self.sync_window(ctx, id, viewport_id, before, input.inner_size);
        pressed
    }

    /// Pushes geometry changes to the window, or adopts a size the window
    /// manager imposed on it.
    fn sync_window(
        &mut self,
        ctx: &egui::Context,
        id: WidgetId,
        viewport_id: ViewportId,
        before: Rect,
        reported: Option<Size>,
    ) {
        let Some(widget) = self.manager.widget(id) else {
            return;
        };
        let after = widget.geometry();
        let idle = widget.is_idle();
        let Some(view) = self.views.get_mut(&id) else {
            return;
        };

        if after.origin() != before.origin() {
            ctx.send_viewport_cmd_to(
                viewport_id,
                ViewportCommand::OuterPosition(to_pos2(after.origin())),
            );
        }

        if after.size() != before.size() {
            view.commanded_size = Some(after.size());
            ctx.send_viewport_cmd_to(viewport_id, ViewportCommand::InnerSize(to_vec2(after.size())));
            return;
        }

        match (view.commanded_size, reported) {
            (Some(commanded), Some(reported)) if commanded == reported => {
                view.commanded_size = None;
            }
            (None, Some(reported)) if idle && reported != after.size() => {
                log::debug!("Widget {id} was resized to {reported:?} by the window manager");
                self.manager.handle_widget_resized(id, reported);
            }
            _ => {}
        }
    }

    fn show_menu(&mut self, ctx: &egui::Context) {
        let Some(menu) = self.menu.as_ref() else {
            return;
        };

        let height = menu
            .items
            .iter()
            .map(|item| match item {
                MenuItem::Separator => MENU_SEPARATOR_HEIGHT,
                _ => MENU_ROW_HEIGHT,
            })
            .sum::<f32>()
            + MENU_ROW_HEIGHT;
        let title = self.manager.active_profile_name().unwrap_or(APP_NAME);
        let builder = ViewportBuilder::default()
            .with_title(title)
            .with_decorations(false)
            .with_always_on_top()
            .with_taskbar(false)
            .with_resizable(false)
            .with_position(to_pos2(menu.position))
            .with_inner_size([MENU_WIDTH, height]);

        let items = &menu.items;
        let (chosen, dismissed) = ctx.show_viewport_immediate(
            ViewportId::from_hash_of("context-menu"),
            builder,
            |ctx, _class| {
                let mut chosen = None;
                egui::CentralPanel::default().show(ctx, |ui| {
                    for item in items {
                        match item {
                            MenuItem::Action {
                                label,
                                action,
                                enabled,
                            } => {
                                let button = egui::Button::new(label.as_str()).frame(false);
                                if ui.add_enabled(*enabled, button).clicked() {
                                    chosen = Some(action.clone());
                                }
                            }
                            MenuItem::Heading(text) => {
                                ui.label(egui::RichText::new(text).weak());
                            }
                            MenuItem::Separator => {
                                ui.separator();
                            }
                        }
                    }
                });
                let dismissed = ctx.input(|i| {
                    i.key_pressed(egui::Key::Escape) || i.viewport().close_requested()
                });
                (chosen, dismissed)
            },
        );

        if chosen.is_some() || dismissed {
            self.menu = None;
        }
        if let Some(action) = chosen {
            self.dispatch(action);
        }
    }

    fn dispatch(&mut self, action: MenuAction) {
        match action {
            MenuAction::NewProfile => self.name_prompt = Some(String::new()),
            action => self.manager.apply_menu_action(action, &mut self.dialogs),
        }
    }

    fn show_name_prompt(&mut self, ctx: &egui::Context) {
        let Some(mut text) = self.name_prompt.take() else {
            return;
        };

        let builder = ViewportBuilder::default()
            .with_title("New Profile")
            .with_always_on_top()
            .with_resizable(false)
            .with_inner_size(NAME_PROMPT_SIZE);

        let profiles = self.manager.profiles();
        let outcome = ctx.show_viewport_immediate(
            ViewportId::from_hash_of("new-profile"),
            builder,
            |ctx, _class| {
                let mut outcome = None;
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.label("Enter profile name:");
                    let response = ui.text_edit_singleline(&mut text);
                    let submitted =
                        response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                    if !response.has_focus() && !response.lost_focus() {
                        response.request_focus();
                    }
                    if profiles.contains(text.trim()) {
                        ui.label(egui::RichText::new("Name already in use").weak());
                    }
                    ui.horizontal(|ui| {
                        if ui.button("OK").clicked() || submitted {
                            outcome = Some(true);
                        }
                        if ui.button("Cancel").clicked() {
                            outcome = Some(false);
                        }
                    });
                });
                if ctx.input(|i| i.key_pressed(egui::Key::Escape) || i.viewport().close_requested())
                {
                    outcome = Some(false);
                }
                outcome
            },
        );

        match outcome {
            None => self.name_prompt = Some(text),
            Some(confirmed) => {
                self.dialogs.staged_text = confirmed.then_some(text);
                // A duplicate name was already reported to the user.
                let _ = self.manager.prompt_new_profile(&mut self.dialogs);
                self.dialogs.staged_text = None;
            }
        }
    }
}

impl eframe::App for DesktopApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_frame);
        self.last_frame = now;

        // egui reports the whole monitor; the taskbar is not subtracted.
        if let Some(monitor) = ctx.input(|i| i.viewport().monitor_size) {
            self.manager
                .set_screen_bounds(Size::new(monitor.x as i32, monitor.y as i32));
        }
        self.manager.tick(now, dt);

        let mut pressed = false;
        let ids: Vec<WidgetId> = self.manager.widgets().iter().map(|w| w.id()).collect();
        for id in ids {
            pressed |= self.show_widget(ctx, id, now);
        }
        let manager = &self.manager;
        self.views.retain(|id, _| manager.widget(*id).is_some());

        if pressed {
            self.menu = None;
        }
        if let Some(menu) = self.manager.take_menu_request() {
            self.menu = Some(menu);
        }
        self.show_menu(ctx);
        self.show_name_prompt(ctx);

        self.manager.process_pending_save();

        if self.manager.should_quit() {
            ctx.send_viewport_cmd(ViewportCommand::Close);
            return;
        }

        let wait = self
            .manager
            .next_deadline(now)
            .map_or(IDLE_REPAINT_INTERVAL, |d| d.min(IDLE_REPAINT_INTERVAL));
        ctx.request_repaint_after(wait);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if self.manager.is_save_pending() {
            self.manager.process_pending_save();
        }
    }

    fn clear_color(&self, _visuals: &egui::Visuals) -> [f32; 4] {
        [0.0; 4]
    }
}

fn pointer_events(input: &egui::InputState) -> Vec<PointerEvent> {
    let origin = input
        .viewport()
        .inner_rect
        .map_or(Pos2::ZERO, |rect| rect.min)
        .to_vec2();
    let mut events = Vec::new();
    for event in &input.events {
        match event {
            egui::Event::PointerButton {
                pos,
                button,
                pressed,
                ..
            } => {
                let button = map_button(*button);
                let global = to_point(*pos + origin);
                events.push(if *pressed {
                    PointerEvent::Pressed {
                        button,
                        local: to_point(*pos),
                        global,
                    }
                } else {
                    PointerEvent::Released { button, global }
                });
            }
            egui::Event::PointerMoved(pos) => events.push(PointerEvent::Moved {
                local: to_point(*pos),
                global: to_point(*pos + origin),
            }),
            _ => {}
        }
    }
    events
}

fn map_button(button: egui::PointerButton) -> PointerButton {
    match button {
        egui::PointerButton::Primary => PointerButton::Primary,
        egui::PointerButton::Secondary => PointerButton::Secondary,
        _ => PointerButton::Other,
    }
}

fn color_image(image: &RgbaImage) -> egui::ColorImage {
    let size = [image.width() as usize, image.height() as usize];
    egui::ColorImage::from_rgba_unmultiplied(size, image.as_raw())
}

fn to_point(pos: Pos2) -> Point {
    Point::new(pos.x.round() as i32, pos.y.round() as i32)
}

fn to_pos2(point: Point) -> Pos2 {
    pos2(point.x as f32, point.y as f32)
}

fn to_vec2(size: Size) -> egui::Vec2 {
    vec2(size.width as f32, size.height as f32)
}

fn to_egui_rect(rect: Rect) -> egui::Rect {
    egui::Rect::from_min_size(
        pos2(rect.x as f32, rect.y as f32),
        vec2(rect.width as f32, rect.height as f32),
    )
}
