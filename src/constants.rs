//! Centralized constants for widget sizing, timings, colors and profile defaults.
//!
//! This module consolidates the magic numbers used by the interaction state machine,
//! the profile bootstrap and the egui shell so each value has one semantic name.

use crate::geometry::{Rect, Size};
use egui::Color32;
use std::time::Duration;

// =============================================================================
// APPLICATION
// =============================================================================

/// Window title and application name passed to eframe.
pub const APP_NAME: &str = "DeskPins";

/// Environment variable that overrides the profile file location.
pub const PROFILES_PATH_ENV: &str = "DESKPINS_PROFILES";

/// File name of the profile store inside the data directory.
pub const PROFILES_FILE_NAME: &str = "profiles.json";

// =============================================================================
// PROFILES
// =============================================================================

/// Name of the implicit bootstrap profile.
pub const DEFAULT_PROFILE_NAME: &str = "Default";

/// Placement of the single widget created when bootstrapping the Default profile.
pub const BOOTSTRAP_PLACEMENT: Rect = Rect::new(100, 100, 150, 150);

/// Fallback x/y for entries that omit them.
pub const DEFAULT_ENTRY_POSITION: i32 = 100;

/// Fallback width/height for entries that omit them.
pub const DEFAULT_ENTRY_SIZE: i32 = 150;

/// Value of the `type` field for media widgets.
pub const MEDIA_WIDGET_KIND: &str = "media";

// =============================================================================
// WIDGET INTERACTION
// =============================================================================

/// Hard floor for a widget's width during aspect-locked resizing.
pub const MIN_WIDGET_WIDTH: i32 = 50;

/// Edge length of the square resize handle in the bottom-right corner.
pub const RESIZE_HANDLE_SIZE: i32 = 10;

/// Delay before the resize handle hides itself after an interaction ends.
pub const RESIZE_HANDLE_HIDE_DELAY: Duration = Duration::from_millis(3000);

/// Top-left corner used for widgets added through the context menu.
pub const NEW_WIDGET_ORIGIN: (i32, i32) = (100, 100);

// =============================================================================
// MEDIA
// =============================================================================

/// Maximum number of frames kept for an animated image.
pub const MAX_ANIMATION_FRAMES: usize = 1024;

/// Frame delay substituted for animations that declare a zero delay.
pub const ZERO_DELAY_FALLBACK: Duration = Duration::from_millis(16);

/// Extensions offered by the file picker.
pub const MEDIA_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "bmp", "gif", "webp"];

/// Screen size assumed until the windowing layer reports the monitor size.
pub const FALLBACK_SCREEN_SIZE: Size = Size::new(1920, 1080);

// =============================================================================
// SHELL
// =============================================================================

/// Repaint interval while nothing is animating or waiting on a timer.
pub const IDLE_REPAINT_INTERVAL: Duration = Duration::from_millis(250);

/// Width of the context menu viewport.
pub const MENU_WIDTH: f32 = 200.0;

/// Height of one context menu row.
pub const MENU_ROW_HEIGHT: f32 = 24.0;

/// Height of a separator row in the context menu.
pub const MENU_SEPARATOR_HEIGHT: f32 = 9.0;

/// Size of the new-profile name prompt viewport.
pub const NAME_PROMPT_SIZE: [f32; 2] = [280.0, 110.0];

/// Fill of the resize handle when visible (semi-transparent white).
pub const COLOR_RESIZE_HANDLE: Color32 = Color32::from_rgba_premultiplied(128, 128, 128, 128);

/// Border of the resize handle.
pub const COLOR_RESIZE_HANDLE_BORDER: Color32 = Color32::GRAY;
