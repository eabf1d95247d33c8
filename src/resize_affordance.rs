use crate::constants::{RESIZE_HANDLE_HIDE_DELAY, RESIZE_HANDLE_SIZE};
use crate::geometry::{Point, Rect, Size};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Hidden,
    Visible,
}

/// Square hit region pinned to the bottom-right corner of its widget, in
/// widget-local coordinates. Hides itself once its one-shot timer expires.
#[derive(Debug, Clone)]
pub struct ResizeAffordance {
    edge: i32,
    rect: Rect,
    visibility: Visibility,
    hide_at: Option<Instant>,
}

impl ResizeAffordance {
    pub fn new(widget_size: Size) -> Self {
        Self::with_edge(widget_size, RESIZE_HANDLE_SIZE)
    }

    pub fn with_edge(widget_size: Size, edge: i32) -> Self {
        let mut affordance = Self {
            edge,
            rect: Rect::new(0, 0, edge, edge),
            visibility: Visibility::Hidden,
            hide_at: None,
        };
        affordance.update_position(widget_size);
        affordance
    }

    pub fn update_position(&mut self, widget_size: Size) {
        self.rect = Rect::new(
            widget_size.width - self.edge,
            widget_size.height - self.edge,
            self.edge,
            self.edge,
        );
    }

    /// Makes the handle visible and cancels a pending auto-hide.
    pub fn show(&mut self) {
        self.hide_at = None;
        self.visibility = Visibility::Visible;
    }

    /// Arms the auto-hide with the default delay.
    pub fn start_hide_timer(&mut self, now: Instant) {
        self.start_hide_timer_after(now, RESIZE_HANDLE_HIDE_DELAY);
    }

    /// Arms the auto-hide, replacing any timer already pending.
    pub fn start_hide_timer_after(&mut self, now: Instant, duration: Duration) {
        self.hide_at = Some(now + duration);
    }

    /// Fires the timer if it has expired. Returns true when the handle just hid.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.hide_at {
            Some(deadline) if now >= deadline => {
                self.hide_at = None;
                let was_visible = self.visibility == Visibility::Visible;
                self.visibility = Visibility::Hidden;
                was_visible
            }
            _ => false,
        }
    }

    pub fn hide_deadline(&self) -> Option<Instant> {
        self.hide_at
    }

    pub fn contains_point(&self, local: Point) -> bool {
        self.rect.contains(local)
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn is_visible(&self) -> bool {
        self.visibility == Visibility::Visible
    }
}
