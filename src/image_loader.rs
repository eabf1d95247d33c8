use crate::constants::{MAX_ANIMATION_FRAMES, ZERO_DELAY_FALLBACK};
use crate::error::AssetLoadError;
use crate::geometry::Size;
use image::codecs::gif::GifDecoder;
use image::codecs::webp::WebPDecoder;
use image::{AnimationDecoder, DynamicImage, Frame, ImageFormat, RgbaImage};
use std::fs;
use std::io::Cursor;
use std::path::Path;
use std::time::Duration;

/// A single frame of an animated image, including its pixel data and display duration.
#[derive(Clone)]
pub struct AnimationFrame {
    pub image: RgbaImage,
    pub duration: Duration,
}

impl AnimationFrame {
    pub fn still(image: RgbaImage) -> Self {
        Self {
            image,
            duration: Duration::from_millis(1000),
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.image.width() as i32, self.image.height() as i32)
    }
}

/// All frames of a decoded asset at their intrinsic resolution.
pub struct DecodedMedia {
    pub frames: Vec<AnimationFrame>,
    pub animated: bool,
}

impl DecodedMedia {
    pub fn from_frames(frames: Vec<AnimationFrame>, animated: bool) -> Self {
        Self {
            animated: animated && frames.len() > 1,
            frames,
        }
    }

    /// Intrinsic size, taken from the first frame.
    pub fn natural_size(&self) -> Size {
        self.frames
            .first()
            .map(|frame| frame.size())
            .unwrap_or(Size::new(1, 1))
            .at_least_one()
    }
}

/// Turns a media path into frames. Shared across the rayon pool when a profile loads.
pub trait MediaDecoder: Send + Sync {
    fn decode(&self, path: &Path) -> Result<DecodedMedia, AssetLoadError>;
}

/// Decoder backed by the `image` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageDecoder;

impl MediaDecoder for ImageDecoder {
    fn decode(&self, path: &Path) -> Result<DecodedMedia, AssetLoadError> {
        load_media_frames(path)
    }
}

pub fn load_media_frames(path: &Path) -> Result<DecodedMedia, AssetLoadError> {
    let bytes = fs::read(path).map_err(|source| AssetLoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let format = image::guess_format(&bytes)
        .or_else(|_| ImageFormat::from_path(path))
        .map_err(|err| AssetLoadError::UnknownFormat {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;

    let decoded = match format {
        ImageFormat::Gif => decode_gif(&bytes),
        ImageFormat::WebP => decode_webp(&bytes),
        _ => decode_static(&bytes, format),
    }
    .map_err(|reason| AssetLoadError::Decode {
        path: path.to_path_buf(),
        reason,
    })?;

    if decoded.frames.is_empty() {
        return Err(AssetLoadError::Empty {
            path: path.to_path_buf(),
        });
    }
    Ok(decoded)
}

fn decode_static(bytes: &[u8], format: ImageFormat) -> Result<DecodedMedia, String> {
    let image = image::load_from_memory_with_format(bytes, format)
        .map_err(|err| format!("image decode error: {err}"))?;
    Ok(DecodedMedia::from_frames(
        vec![AnimationFrame::still(image.to_rgba8())],
        false,
    ))
}

fn decode_gif(bytes: &[u8]) -> Result<DecodedMedia, String> {
    let decoder =
        GifDecoder::new(Cursor::new(bytes)).map_err(|err| format!("GIF decode error: {err}"))?;
    let frames: Vec<Frame> = decoder
        .into_frames()
        .take(MAX_ANIMATION_FRAMES)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| format!("GIF frame error: {err}"))?;
    Ok(frames_to_media(frames))
}

fn decode_webp(bytes: &[u8]) -> Result<DecodedMedia, String> {
    let decoder =
        WebPDecoder::new(Cursor::new(bytes)).map_err(|err| format!("WebP decode error: {err}"))?;
    if decoder.has_animation() {
        let frames: Vec<Frame> = decoder
            .into_frames()
            .take(MAX_ANIMATION_FRAMES)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| format!("WebP frame error: {err}"))?;
        Ok(frames_to_media(frames))
    } else {
        let image = DynamicImage::from_decoder(decoder)
            .map_err(|err| format!("WebP decode error: {err}"))?;
        Ok(DecodedMedia::from_frames(
            vec![AnimationFrame::still(image.to_rgba8())],
            false,
        ))
    }
}

fn frames_to_media(frames: Vec<Frame>) -> DecodedMedia {
    let converted = frames
        .into_iter()
        .map(|frame| {
            let duration = sanitize_duration(duration_from_delay(frame.delay()));
            AnimationFrame {
                image: frame.into_buffer(),
                duration,
            }
        })
        .collect();
    DecodedMedia::from_frames(converted, true)
}

fn duration_from_delay(delay: image::Delay) -> Duration {
    let (numer, denom) = delay.numer_denom_ms();
    let denom = denom.max(1);
    Duration::from_micros(u64::from(numer) * 1000 / u64::from(denom))
}

fn sanitize_duration(duration: Duration) -> Duration {
    if duration.is_zero() {
        ZERO_DELAY_FALLBACK
    } else {
        duration
    }
}
