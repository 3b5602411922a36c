//! Structured ffmpeg filter graphs.
//!
//! Call sites describe overlays, fades, normalization and concatenation as values; this module is
//! the only place that turns them into ffmpeg's textual syntax. Free text and file paths are
//! escaped here, during serialization, and nowhere else.

use std::fmt::{self, Display, Formatter, Write as _};
use std::path::{Path, PathBuf};

use crate::caption::layout::escape;
use crate::foundation::core::{Canvas, Fps, format_time};

/// Sample rate every rendered stream is normalized to.
pub const AUDIO_SAMPLE_RATE: u32 = 48_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FadeDirection {
    In,
    Out,
}

impl FadeDirection {
    fn as_str(self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Out => "out",
        }
    }
}

/// A `drawtext` overlay for one line of text.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawText {
    pub text: String,
    pub font_file: PathBuf,
    pub font_size: u32,
    pub font_color: String,
    pub box_color: String,
    pub box_border: u32,
    pub x: String,
    pub y: String,
}

/// One filter inside a chain.
#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    /// Fit inside `canvas`, keeping aspect ratio.
    ScaleToFit(Canvas),
    /// Letterbox to exactly `canvas`, content centered.
    PadTo(Canvas),
    SetSar,
    Fps(Fps),
    PixelFormat(&'static str),
    DrawText(DrawText),
    Fade {
        direction: FadeDirection,
        start: f64,
        duration: f64,
    },
    AudioFade {
        direction: FadeDirection,
        start: f64,
        duration: f64,
    },
    /// Restart video timestamps at zero.
    ResetPts,
    /// Restart audio timestamps at zero.
    ResetAudioPts,
    AudioResample(u32),
    /// Force float planar stereo at `sample_rate`.
    AudioStereo { sample_rate: u32 },
    AudioTrim { duration: f64 },
    Concat {
        segments: usize,
        video: usize,
        audio: usize,
    },
}

impl Display for Filter {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::ScaleToFit(canvas) => write!(
                f,
                "scale={}:{}:force_original_aspect_ratio=decrease",
                canvas.width, canvas.height
            ),
            Self::PadTo(canvas) => write!(
                f,
                "pad={}:{}:(ow-iw)/2:(oh-ih)/2:color=black",
                canvas.width, canvas.height
            ),
            Self::SetSar => f.write_str("setsar=1"),
            Self::Fps(fps) => write!(f, "fps={}", fps.rational_arg()),
            Self::PixelFormat(fmt_name) => write!(f, "format={fmt_name}"),
            Self::DrawText(dt) => write!(
                f,
                "drawtext=fontfile='{font}':text='{text}':expansion=none:fontsize={size}:\
                 fontcolor={color}:box=1:boxcolor={box_color}:boxborderw={border}:x={x}:y={y}",
                font = escape_path(&dt.font_file),
                text = escape(&dt.text),
                size = dt.font_size,
                color = dt.font_color,
                box_color = dt.box_color,
                border = dt.box_border,
                x = dt.x,
                y = dt.y,
            ),
            Self::Fade {
                direction,
                start,
                duration,
            } => write!(
                f,
                "fade=t={}:st={}:d={}",
                direction.as_str(),
                format_time(*start),
                format_time(*duration)
            ),
            Self::AudioFade {
                direction,
                start,
                duration,
            } => write!(
                f,
                "afade=t={}:st={}:d={}",
                direction.as_str(),
                format_time(*start),
                format_time(*duration)
            ),
            Self::ResetPts => f.write_str("setpts=PTS-STARTPTS"),
            Self::ResetAudioPts => f.write_str("asetpts=PTS-STARTPTS"),
            Self::AudioResample(rate) => write!(f, "aresample={rate}"),
            Self::AudioStereo { sample_rate } => write!(
                f,
                "aformat=sample_fmts=fltp:sample_rates={sample_rate}:channel_layouts=stereo"
            ),
            Self::AudioTrim { duration } => {
                write!(f, "atrim=duration={}", format_time(*duration))
            }
            Self::Concat {
                segments,
                video,
                audio,
            } => write!(f, "concat=n={segments}:v={video}:a={audio}"),
        }
    }
}

/// Comma-joined sequence of filters applied one after another.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterChain {
    filters: Vec<Filter>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, filter: Filter) -> &mut Self {
        self.filters.push(filter);
        self
    }

    pub fn extend(&mut self, filters: impl IntoIterator<Item = Filter>) -> &mut Self {
        self.filters.extend(filters);
        self
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl Display for FilterChain {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.filters.is_empty() {
            // ffmpeg rejects empty chains; callers only build empty video chains.
            return f.write_str("null");
        }
        for (i, filter) in self.filters.iter().enumerate() {
            if i > 0 {
                f.write_char(',')?;
            }
            write!(f, "{filter}")?;
        }
        Ok(())
    }
}

/// A chain with its input and output pad labels, e.g. `[0:v]...[v0]`.
#[derive(Clone, Debug, PartialEq)]
pub struct LabeledChain {
    pub inputs: Vec<String>,
    pub chain: FilterChain,
    pub outputs: Vec<String>,
}

/// Semicolon-joined set of labeled chains, passed via `-filter_complex`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterGraph {
    chains: Vec<LabeledChain>,
}

impl FilterGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chain<I, O>(&mut self, inputs: I, chain: FilterChain, outputs: O) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
        O: IntoIterator,
        O::Item: Into<String>,
    {
        self.chains.push(LabeledChain {
            inputs: inputs.into_iter().map(Into::into).collect(),
            chain,
            outputs: outputs.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn chains(&self) -> &[LabeledChain] {
        &self.chains
    }
}

impl Display for FilterGraph {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, labeled) in self.chains.iter().enumerate() {
            if i > 0 {
                f.write_char(';')?;
            }
            for input in &labeled.inputs {
                write!(f, "[{input}]")?;
            }
            write!(f, "{}", labeled.chain)?;
            for output in &labeled.outputs {
                write!(f, "[{output}]")?;
            }
        }
        Ok(())
    }
}

/// Synthetic inputs read through `-f lavfi`.
#[derive(Clone, Debug, PartialEq)]
pub enum LavfiSource {
    /// Solid colour frames.
    Color {
        color: String,
        canvas: Canvas,
        fps: Fps,
        duration: f64,
    },
    /// A real but silent stereo audio stream.
    SilentStereo { sample_rate: u32 },
}

impl Display for LavfiSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Color {
                color,
                canvas,
                fps,
                duration,
            } => write!(
                f,
                "color=c={color}:s={}:r={}:d={}",
                canvas.size_arg(),
                fps.rational_arg(),
                format_time(*duration)
            ),
            Self::SilentStereo { sample_rate } => {
                write!(f, "anullsrc=r={sample_rate}:cl=stereo")
            }
        }
    }
}

/// Escape a filesystem path for use inside a quoted filter option.
pub fn escape_path(path: &Path) -> String {
    escape(&path.to_string_lossy())
}

/// Fade-in plus fade-out pair for a stream of `total` seconds.
///
/// The fade length shrinks to half the stream when the stream is too short for two full fades,
/// so the fade-out always ends exactly at `total`.
pub fn fade_pair(total: f64, fade: f64, audio: bool) -> [Filter; 2] {
    let fade = fade.min(total / 2.0).max(0.0);
    let out_start = (total - fade).max(0.0);
    if audio {
        [
            Filter::AudioFade {
                direction: FadeDirection::In,
                start: 0.0,
                duration: fade,
            },
            Filter::AudioFade {
                direction: FadeDirection::Out,
                start: out_start,
                duration: fade,
            },
        ]
    } else {
        [
            Filter::Fade {
                direction: FadeDirection::In,
                start: 0.0,
                duration: fade,
            },
            Filter::Fade {
                direction: FadeDirection::Out,
                start: out_start,
                duration: fade,
            },
        ]
    }
}

/// Scale + pad + square pixels + fixed frame rate: every output shares geometry and time base.
pub fn normalize_video(canvas: Canvas, fps: Fps) -> [Filter; 4] {
    [
        Filter::ScaleToFit(canvas),
        Filter::PadTo(canvas),
        Filter::SetSar,
        Filter::Fps(fps),
    ]
}

#[cfg(test)]
#[path = "../../tests/unit/encode/filter.rs"]
mod tests;
