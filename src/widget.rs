//! A single draggable, aspect-locked resizable media widget.
//!
//! The widget owns its [`MediaSurface`] and [`ResizeAffordance`] and runs the pointer
//! interaction state machine. Everything it needs from its owner goes through the
//! two-method [`WidgetHost`] capability.

use crate::constants::MIN_WIDGET_WIDTH;
use crate::error::AssetLoadError;
use crate::geometry::{Point, Rect, Size};
use crate::image_loader::{DecodedMedia, MediaDecoder};
use crate::media_surface::MediaSurface;
use crate::profile::{WidgetEntry, WidgetKind};
use crate::resize_affordance::ResizeAffordance;
use std::path::Path;
use std::time::{Duration, Instant};
use uuid::Uuid;

pub type WidgetId = Uuid;

/// What a widget can ask of the coordinator that owns it.
pub trait WidgetHost {
    fn on_context_menu_requested(&mut self, widget: WidgetId, global_pos: Point);
    fn on_save_requested(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Other,
}

/// Pointer input delivered to a widget. `local` is relative to the widget's
/// top-left corner, `global` is in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    Pressed {
        button: PointerButton,
        local: Point,
        global: Point,
    },
    Moved {
        local: Point,
        global: Point,
    },
    Released {
        button: PointerButton,
        global: Point,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InteractionMode {
    Idle,
    Dragging {
        offset: Point,
    },
    Resizing {
        start_geometry: Rect,
        start_pointer: Point,
        aspect_ratio: f64,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CursorShape {
    #[default]
    Arrow,
    ResizeDiagonal,
}

/// Geometry for a bottom-right handle drag: the top-left stays at the start
/// position, width follows the pointer with a hard floor and height follows the ratio.
pub fn aspect_locked_geometry(
    start_geometry: Rect,
    start_pointer: Point,
    current: Point,
    aspect_ratio: f64,
) -> Rect {
    let delta = current - start_pointer;
    let width = (start_geometry.width + delta.x).max(MIN_WIDGET_WIDTH);
    let height = ((width as f64 / aspect_ratio).round() as i32).max(1);
    Rect::new(start_geometry.x, start_geometry.y, width, height)
}

pub struct PlacedWidget {
    id: WidgetId,
    surface: MediaSurface,
    affordance: ResizeAffordance,
    origin: Point,
    mode: InteractionMode,
    cursor: CursorShape,
}

impl PlacedWidget {
    /// Wraps decoded media at `origin`, sized by the surface's default size.
    pub fn new(path: &Path, decoded: DecodedMedia, origin: Point, screen: Size) -> Self {
        let surface = MediaSurface::from_decoded(path, decoded, screen);
        if surface.is_animated() {
            log::debug!("{} is animated", path.display());
        }
        let affordance = ResizeAffordance::new(surface.display_size());
        Self {
            id: Uuid::new_v4(),
            surface,
            affordance,
            origin,
            mode: InteractionMode::Idle,
            cursor: CursorShape::Arrow,
        }
    }

    pub fn id(&self) -> WidgetId {
        self.id
    }

    pub fn path(&self) -> &Path {
        self.surface.source_path()
    }

    pub fn geometry(&self) -> Rect {
        Rect::from_origin_size(self.origin, self.surface.display_size())
    }

    pub fn surface(&self) -> &MediaSurface {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut MediaSurface {
        &mut self.surface
    }

    pub fn affordance(&self) -> &ResizeAffordance {
        &self.affordance
    }

    #[cfg(test)]
    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn cursor(&self) -> CursorShape {
        self.cursor
    }

    pub fn is_idle(&self) -> bool {
        self.mode == InteractionMode::Idle
    }

    pub fn set_geometry(&mut self, geometry: Rect) {
        self.origin = geometry.origin();
        if geometry.size() != self.surface.display_size() {
            self.handle_resized(geometry.size());
        }
    }

    /// Re-synchronizes the rendered media and the handle with a new widget size,
    /// whoever changed it.
    pub fn handle_resized(&mut self, size: Size) {
        self.surface.resize_to(size);
        self.affordance.update_position(self.surface.display_size());
    }

    /// Swaps in a new asset, keeping the top-left corner. Uses `size` when given,
    /// otherwise the default size derived from the screen.
    pub fn load_media(
        &mut self,
        path: &Path,
        size: Option<Size>,
        decoder: &dyn MediaDecoder,
        screen: Size,
        host: &mut dyn WidgetHost,
    ) -> Result<(), AssetLoadError> {
        self.surface.set_media(path, decoder, screen)?;
        if let Some(size) = size {
            self.surface.resize_to(size);
        }
        self.affordance.update_position(self.surface.display_size());
        log::debug!("Widget {} now shows {}", self.id, path.display());
        host.on_save_requested();
        Ok(())
    }

    pub fn handle_pointer(&mut self, event: PointerEvent, now: Instant, host: &mut dyn WidgetHost) {
        match event {
            PointerEvent::Pressed {
                button: PointerButton::Primary,
                local,
                global,
            } => self.begin_interaction(local, global),
            PointerEvent::Pressed {
                button: PointerButton::Secondary,
                global,
                ..
            } => host.on_context_menu_requested(self.id, global),
            PointerEvent::Pressed { .. } => {}
            PointerEvent::Moved { local, global } => self.pointer_moved(local, global),
            PointerEvent::Released {
                button: PointerButton::Primary,
                ..
            } => self.end_interaction(now, host),
            PointerEvent::Released { .. } => {}
        }
    }

    fn begin_interaction(&mut self, local: Point, global: Point) {
        self.affordance.update_position(self.surface.display_size());
        self.affordance.show();
        self.mode = if self.affordance.contains_point(local) {
            InteractionMode::Resizing {
                start_geometry: self.geometry(),
                start_pointer: global,
                aspect_ratio: self.surface.aspect_ratio(),
            }
        } else {
            InteractionMode::Dragging {
                offset: global - self.origin,
            }
        };
        log::debug!("Widget {} entered {:?}", self.id, self.mode);
    }

    fn pointer_moved(&mut self, local: Point, global: Point) {
        match self.mode {
            InteractionMode::Resizing {
                start_geometry,
                start_pointer,
                aspect_ratio,
            } => {
                let geometry =
                    aspect_locked_geometry(start_geometry, start_pointer, global, aspect_ratio);
                self.set_geometry(geometry);
            }
            InteractionMode::Dragging { offset } => {
                self.origin = global - offset;
            }
            InteractionMode::Idle => {
                self.cursor = if self.affordance.contains_point(local) {
                    CursorShape::ResizeDiagonal
                } else {
                    CursorShape::Arrow
                };
            }
        }
    }

    fn end_interaction(&mut self, now: Instant, host: &mut dyn WidgetHost) {
        if self.mode == InteractionMode::Idle {
            return;
        }
        self.mode = InteractionMode::Idle;
        self.affordance.start_hide_timer(now);
        log::debug!("Widget {} settled at {:?}", self.id, self.geometry());
        host.on_save_requested();
    }

    /// Fires the handle's auto-hide timer. Returns true if something visible changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.affordance.tick(now)
    }

    /// Advances animation playback. Returns true if the frame changed.
    pub fn advance(&mut self, dt: Duration) -> bool {
        self.surface.advance(dt)
    }

    /// Time until this widget next needs a repaint, if it is waiting on anything.
    pub fn next_deadline(&self, now: Instant) -> Option<Duration> {
        let hide = self
            .affordance
            .hide_deadline()
            .map(|deadline| deadline.saturating_duration_since(now));
        match (hide, self.surface.time_until_next_frame()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Snapshot of the live placement.
    pub fn serialize(&self) -> WidgetEntry {
        let geometry = self.geometry();
        WidgetEntry {
            kind: WidgetKind::Media.as_str().to_string(),
            path: self.path().to_string_lossy().into_owned(),
            x: geometry.x,
            y: geometry.y,
            width: geometry.width,
            height: geometry.height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_loader::AnimationFrame;
    use image::RgbaImage;

    #[derive(Default)]
    struct RecordingHost {
        saves: usize,
        menus: Vec<(WidgetId, Point)>,
    }

    impl WidgetHost for RecordingHost {
        fn on_context_menu_requested(&mut self, widget: WidgetId, global_pos: Point) {
            self.menus.push((widget, global_pos));
        }

        fn on_save_requested(&mut self) {
            self.saves += 1;
        }
    }

    struct SolidDecoder(u32, u32);

    impl MediaDecoder for SolidDecoder {
        fn decode(&self, _path: &Path) -> Result<DecodedMedia, AssetLoadError> {
            Ok(solid(self.0, self.1))
        }
    }

    const SCREEN: Size = Size::new(1920, 1080);

    fn solid(width: u32, height: u32) -> DecodedMedia {
        DecodedMedia::from_frames(
            vec![AnimationFrame::still(RgbaImage::new(width, height))],
            false,
        )
    }

    /// 200x100 media placed at (10, 20).
    fn widget() -> PlacedWidget {
        PlacedWidget::new(Path::new("wide.png"), solid(200, 100), Point::new(10, 20), SCREEN)
    }

    fn press(local: Point, origin: Point) -> PointerEvent {
        PointerEvent::Pressed {
            button: PointerButton::Primary,
            local,
            global: origin + local,
        }
    }

    fn move_to(widget: &PlacedWidget, global: Point) -> PointerEvent {
        PointerEvent::Moved {
            local: global - widget.geometry().origin(),
            global,
        }
    }

    fn release(global: Point) -> PointerEvent {
        PointerEvent::Released {
            button: PointerButton::Primary,
            global,
        }
    }

    #[test]
    fn test_aspect_locked_geometry_keeps_origin_and_ratio() {
        let start = Rect::new(10, 20, 200, 100);
        let geometry = aspect_locked_geometry(start, Point::new(205, 115), Point::new(305, 90), 2.0);
        assert_eq!(geometry, Rect::new(10, 20, 300, 150));
    }

    #[test]
    fn test_aspect_locked_geometry_rounds_height() {
        let start = Rect::new(0, 0, 100, 100);
        let geometry = aspect_locked_geometry(start, Point::new(0, 0), Point::new(1, 0), 1.5);
        // 101 / 1.5 = 67.33
        assert_eq!(geometry.size(), Size::new(101, 67));
    }

    #[test]
    fn test_aspect_locked_geometry_width_floor() {
        let start = Rect::new(0, 0, 120, 60);
        for dx in [-70, -71, -500, -10_000] {
            let geometry = aspect_locked_geometry(start, Point::new(0, 0), Point::new(dx, 0), 2.0);
            assert_eq!(geometry.width, MIN_WIDGET_WIDTH);
            assert_eq!(geometry.height, 25);
        }
    }

    #[test]
    fn test_press_inside_handle_starts_resizing() {
        let mut widget = widget();
        let mut host = RecordingHost::default();
        widget.handle_pointer(press(Point::new(195, 95), Point::new(10, 20)), Instant::now(), &mut host);

        assert!(matches!(widget.mode(), InteractionMode::Resizing { .. }));
        assert!(widget.affordance().is_visible());
    }

    #[test]
    fn test_press_elsewhere_starts_dragging() {
        let mut widget = widget();
        let mut host = RecordingHost::default();
        widget.handle_pointer(press(Point::new(30, 40), Point::new(10, 20)), Instant::now(), &mut host);

        assert_eq!(
            widget.mode(),
            InteractionMode::Dragging {
                offset: Point::new(30, 40)
            }
        );
    }

    #[test]
    fn test_drag_moves_without_resizing() {
        let mut widget = widget();
        let mut host = RecordingHost::default();
        let now = Instant::now();
        widget.handle_pointer(press(Point::new(30, 40), Point::new(10, 20)), now, &mut host);

        for global in [Point::new(100, 100), Point::new(-50, 700), Point::new(540, 61)] {
            widget.handle_pointer(move_to(&widget, global), now, &mut host);
            assert_eq!(widget.geometry().origin(), global - Point::new(30, 40));
            assert_eq!(widget.geometry().size(), Size::new(200, 100));
        }

        widget.handle_pointer(release(Point::new(540, 61)), now, &mut host);
        assert!(widget.is_idle());
        assert_eq!(host.saves, 1);
        assert_eq!(widget.geometry(), Rect::new(510, 21, 200, 100));
    }

    #[test]
    fn test_resize_keeps_origin_and_natural_ratio() {
        let mut widget = widget();
        let mut host = RecordingHost::default();
        let now = Instant::now();
        // Distort the display size first; the natural 2:1 ratio still governs.
        widget.set_geometry(Rect::new(10, 20, 200, 200));
        widget.handle_pointer(press(Point::new(195, 195), Point::new(10, 20)), now, &mut host);

        let start = Point::new(205, 215);
        for dx in [10, 57, -80, -149, -400, 333] {
            widget.handle_pointer(move_to(&widget, start + Point::new(dx, 3)), now, &mut host);
            let geometry = widget.geometry();
            assert_eq!(geometry.origin(), Point::new(10, 20));
            assert!(geometry.width >= MIN_WIDGET_WIDTH);
            let expected = (geometry.width as f64 / 2.0).round() as i32;
            assert_eq!(geometry.height, expected);
            assert_eq!(widget.surface().display_size(), geometry.size());
        }
    }

    #[test]
    fn test_resize_repositions_handle() {
        let mut widget = widget();
        let mut host = RecordingHost::default();
        let now = Instant::now();
        widget.handle_pointer(press(Point::new(195, 95), Point::new(10, 20)), now, &mut host);
        widget.handle_pointer(move_to(&widget, Point::new(305, 115)), now, &mut host);
        widget.handle_pointer(release(Point::new(305, 115)), now, &mut host);

        assert_eq!(widget.geometry().size(), Size::new(300, 150));
        assert!(widget.affordance().contains_point(Point::new(295, 145)));
    }

    #[test]
    fn test_release_arms_hide_timer_and_requests_save() {
        let mut widget = widget();
        let mut host = RecordingHost::default();
        let now = Instant::now();
        widget.handle_pointer(press(Point::new(5, 5), Point::new(10, 20)), now, &mut host);
        widget.handle_pointer(release(Point::new(15, 25)), now, &mut host);

        assert_eq!(host.saves, 1);
        assert!(widget.affordance().is_visible());
        assert!(widget.tick(now + Duration::from_secs(3)));
        assert!(!widget.affordance().is_visible());
    }

    #[test]
    fn test_release_while_idle_is_ignored() {
        let mut widget = widget();
        let mut host = RecordingHost::default();
        widget.handle_pointer(release(Point::new(0, 0)), Instant::now(), &mut host);
        assert_eq!(host.saves, 0);
        assert_eq!(widget.affordance().hide_deadline(), None);
    }

    #[test]
    fn test_idle_move_only_updates_cursor() {
        let mut widget = widget();
        let mut host = RecordingHost::default();
        let before = widget.geometry();
        let now = Instant::now();

        widget.handle_pointer(move_to(&widget, Point::new(205, 115)), now, &mut host);
        assert_eq!(widget.cursor(), CursorShape::ResizeDiagonal);
        widget.handle_pointer(move_to(&widget, Point::new(50, 50)), now, &mut host);
        assert_eq!(widget.cursor(), CursorShape::Arrow);

        assert_eq!(widget.geometry(), before);
        assert!(widget.is_idle());
        assert_eq!(host.saves, 0);
    }

    #[test]
    fn test_secondary_press_requests_context_menu() {
        let mut widget = widget();
        let mut host = RecordingHost::default();
        widget.handle_pointer(
            PointerEvent::Pressed {
                button: PointerButton::Secondary,
                local: Point::new(3, 4),
                global: Point::new(13, 24),
            },
            Instant::now(),
            &mut host,
        );

        assert!(widget.is_idle());
        assert_eq!(host.menus, vec![(widget.id(), Point::new(13, 24))]);
    }

    #[test]
    fn test_load_media_keeps_origin_and_requests_save() {
        let mut widget = widget();
        let mut host = RecordingHost::default();
        widget
            .load_media(Path::new("tall.png"), None, &SolidDecoder(100, 300), SCREEN, &mut host)
            .unwrap();

        assert_eq!(widget.geometry(), Rect::new(10, 20, 100, 300));
        assert_eq!(widget.surface().natural_size(), Size::new(100, 300));
        assert_eq!(host.saves, 1);

        widget
            .load_media(
                Path::new("tall.png"),
                Some(Size::new(40, 40)),
                &SolidDecoder(100, 300),
                SCREEN,
                &mut host,
            )
            .unwrap();
        assert_eq!(widget.geometry(), Rect::new(10, 20, 40, 40));
        assert_eq!(host.saves, 2);
    }

    #[test]
    fn test_serialize_reflects_live_geometry() {
        let mut widget = widget();
        assert_eq!(
            widget.serialize(),
            WidgetEntry::media("wide.png", Rect::new(10, 20, 200, 100))
        );

        widget.set_geometry(Rect::new(-5, 7, 64, 32));
        let entry = widget.serialize();
        assert_eq!(entry.kind, "media");
        assert_eq!(entry.geometry(), Rect::new(-5, 7, 64, 32));
    }

    #[test]
    fn test_external_resize_syncs_surface_and_handle() {
        let mut widget = widget();
        widget.handle_resized(Size::new(80, 60));
        assert_eq!(widget.surface().display_size(), Size::new(80, 60));
        assert_eq!(widget.affordance().rect(), Rect::new(70, 50, 10, 10));
    }
}
