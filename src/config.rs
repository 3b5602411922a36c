use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::caption::style::CaptionStyle;
use crate::encode::ffmpeg::EncoderSettings;
use crate::foundation::core::{Canvas, Fps, OutputGeometry};
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::card::FontRegistry;
use crate::transcript::segment::{DEFAULT_KEYWORDS, KeywordSet};

/// Ranking keywords and default budgets.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub keywords: Vec<String>,
    pub max_clips: usize,
    /// Seconds.
    pub max_total_duration: f64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            max_clips: 5,
            max_total_duration: 60.0,
        }
    }
}

impl SelectionConfig {
    pub fn keyword_set(&self) -> KeywordSet {
        KeywordSet::new(&self.keywords)
    }
}

/// Output frame geometry.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct VideoSettings {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub normalize: bool,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fps: 30,
            normalize: true,
        }
    }
}

impl VideoSettings {
    pub fn geometry(&self) -> ReelResult<OutputGeometry> {
        Ok(OutputGeometry {
            canvas: Canvas::new(self.width, self.height)?,
            fps: Fps::new(self.fps, 1)?,
            normalize: self.normalize,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Clips rendered concurrently. `1` renders sequentially.
    pub workers: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { workers: 1 }
    }
}

/// Everything tunable about a reel run. Every field has a default, so `{}` is a valid config.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub selection: SelectionConfig,
    pub caption: CaptionStyle,
    pub video: VideoSettings,
    pub fonts: FontRegistry,
    pub encoder: EncoderSettings,
    pub render: RenderConfig,
}

impl PipelineConfig {
    pub fn from_reader<R: std::io::Read>(r: R) -> ReelResult<Self> {
        let config: Self = serde_json::from_reader(r)
            .map_err(|e| ReelError::serde(format!("parse pipeline config JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(json: &str) -> ReelResult<Self> {
        Self::from_reader(json.as_bytes())
    }

    pub fn from_path(path: impl AsRef<Path>) -> ReelResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            ReelError::validation(format!("open config JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    pub fn validate(&self) -> ReelResult<()> {
        let max_total = self.selection.max_total_duration;
        if !max_total.is_finite() || max_total < 0.0 {
            return Err(ReelError::validation(
                "selection max_total_duration must be finite and >= 0",
            ));
        }
        self.caption.validate()?;
        self.video.geometry()?;
        self.fonts.validate()?;
        self.encoder.validate()?;
        if self.render.workers == 0 {
            return Err(ReelError::validation("render workers must be >= 1"));
        }
        Ok(())
    }
}
