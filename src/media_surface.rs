//! The renderable, resizable representation of a decoded image or animation.
//!
//! Frames are kept at their intrinsic resolution; the scaled output is produced on
//! demand for the current frame and display size, so resizing an animation only
//! retargets the frames still to be shown and never restarts playback.

use crate::error::AssetLoadError;
use crate::geometry::Size;
use crate::image_loader::{AnimationFrame, DecodedMedia, MediaDecoder};
use image::imageops::{self, FilterType};
use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default display size for newly placed media: never larger than half the
/// shorter screen dimension, aspect ratio preserved.
pub fn scale_to_screen_bounds(natural: Size, screen: Size) -> Size {
    let bound = screen.width.min(screen.height) / 2;
    if natural.width <= bound && natural.height <= bound {
        return natural;
    }

    // factor = bound / longer side; integer math keeps the truncation exact.
    let (width, height) = (i64::from(natural.width), i64::from(natural.height));
    let bound = i64::from(bound);
    let scaled = if width >= height {
        Size::new(bound as i32, (height * bound / width) as i32)
    } else {
        Size::new((width * bound / height) as i32, bound as i32)
    };
    scaled.at_least_one()
}

/// Identifies the pixels of the rendered output; changes whenever they would.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderKey {
    pub generation: u64,
    pub frame: usize,
    pub size: Size,
}

struct RenderedFrame {
    key: RenderKey,
    image: RgbaImage,
}

pub struct MediaSurface {
    source_path: PathBuf,
    frames: Vec<AnimationFrame>,
    animated: bool,
    natural_size: Size,
    display_size: Size,
    current_frame: usize,
    frame_elapsed: Duration,
    generation: u64,
    rendered: Option<RenderedFrame>,
}

impl MediaSurface {
    pub fn from_decoded(path: &Path, decoded: DecodedMedia, screen: Size) -> Self {
        let mut surface = Self {
            source_path: PathBuf::new(),
            frames: Vec::new(),
            animated: false,
            natural_size: Size::new(1, 1),
            display_size: Size::new(1, 1),
            current_frame: 0,
            frame_elapsed: Duration::ZERO,
            generation: 0,
            rendered: None,
        };
        surface.install(path, decoded, screen);
        surface
    }

    /// Replaces the asset. On failure the previous media stays in place.
    pub fn set_media(
        &mut self,
        path: &Path,
        decoder: &dyn MediaDecoder,
        screen: Size,
    ) -> Result<(), AssetLoadError> {
        let decoded = decoder.decode(path)?;
        self.install(path, decoded, screen);
        Ok(())
    }

    fn install(&mut self, path: &Path, decoded: DecodedMedia, screen: Size) {
        self.source_path = path.to_path_buf();
        self.natural_size = decoded.natural_size();
        self.animated = decoded.animated;
        self.frames = decoded.frames;
        if self.frames.is_empty() {
            self.frames.push(AnimationFrame::still(RgbaImage::new(1, 1)));
        }
        self.current_frame = 0;
        self.frame_elapsed = Duration::ZERO;
        self.generation += 1;
        self.rendered = None;
        self.resize_to(scale_to_screen_bounds(self.natural_size, screen));
    }

    /// Scales the output to exactly `size`; the caller owns the aspect ratio.
    pub fn resize_to(&mut self, size: Size) {
        self.display_size = size.at_least_one();
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn is_animated(&self) -> bool {
        self.animated
    }

    pub fn natural_size(&self) -> Size {
        self.natural_size
    }

    pub fn display_size(&self) -> Size {
        self.display_size
    }

    /// Width over height of the intrinsic size.
    pub fn aspect_ratio(&self) -> f64 {
        self.natural_size.width as f64 / self.natural_size.height as f64
    }

    #[cfg(test)]
    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    /// Advances playback by `dt`. Returns true when the visible frame changed.
    pub fn advance(&mut self, dt: Duration) -> bool {
        if !self.animated || self.frames.len() <= 1 {
            return false;
        }

        self.frame_elapsed += dt;
        let mut updated = false;
        while self.frame_elapsed >= self.frames[self.current_frame].duration {
            self.frame_elapsed -= self.frames[self.current_frame].duration;
            self.current_frame = (self.current_frame + 1) % self.frames.len();
            updated = true;
        }
        updated
    }

    pub fn time_until_next_frame(&self) -> Option<Duration> {
        if !self.animated || self.frames.len() <= 1 {
            return None;
        }

        let frame_duration = self.frames[self.current_frame].duration;
        let remaining = frame_duration.saturating_sub(self.frame_elapsed);
        if remaining.is_zero() {
            Some(Duration::from_millis(1))
        } else {
            Some(remaining)
        }
    }

    pub fn render_key(&self) -> RenderKey {
        RenderKey {
            generation: self.generation,
            frame: self.current_frame,
            size: self.display_size,
        }
    }

    /// The current frame scaled to the display size with smooth filtering.
    pub fn rendered_frame(&mut self) -> &RgbaImage {
        let key = self.render_key();
        if self.rendered.as_ref().is_some_and(|r| r.key != key) {
            self.rendered = None;
        }

        let source = &self.frames[self.current_frame].image;
        &self
            .rendered
            .get_or_insert_with(|| RenderedFrame {
                key,
                image: scale_frame(source, key.size),
            })
            .image
    }
}

fn scale_frame(source: &RgbaImage, size: Size) -> RgbaImage {
    let (width, height) = (size.width as u32, size.height as u32);
    if source.dimensions() == (width, height) {
        source.clone()
    } else {
        imageops::resize(source, width, height, FilterType::Triangle)
    }
}
