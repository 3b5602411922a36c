use crate::foundation::error::{ReelError, ReelResult};

/// Output frame size in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> ReelResult<Self> {
        if width == 0 || height == 0 {
            return Err(ReelError::validation("canvas width/height must be non-zero"));
        }
        if !width.is_multiple_of(2) || !height.is_multiple_of(2) {
            return Err(ReelError::validation(
                "canvas width/height must be even (required for yuv420p output)",
            ));
        }
        Ok(Self { width, height })
    }

    /// `WxH`, the form ffmpeg expects for `s=` / `size=` options.
    pub fn size_arg(self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    pub num: u32,
    pub den: u32, // must be > 0
}

impl Fps {
    pub fn new(num: u32, den: u32) -> ReelResult<Self> {
        if den == 0 {
            return Err(ReelError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(ReelError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Rational form (`30/1`) accepted by the `fps` filter and `-r`.
    pub fn rational_arg(self) -> String {
        format!("{}/{}", self.num, self.den)
    }
}

/// Frame geometry and time base shared by every clip, card and the reel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutputGeometry {
    pub canvas: Canvas,
    pub fps: Fps,
    /// Scale/pad/resample clips to `canvas` and `fps`. Cards and the reel are always normalized.
    pub normalize: bool,
}

/// Seconds with fixed microsecond precision, so the same value always serializes the same way.
pub fn format_time(value: f64) -> String {
    format!("{value:.6}")
}
