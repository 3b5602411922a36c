use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::caption::layout::{Anchor, CaptionLayout};
use crate::caption::style::validate_color;
use crate::encode::ffmpeg::{Encoder, Invocation};
use crate::encode::filter::{
    AUDIO_SAMPLE_RATE, DrawText, Filter, FilterChain, FilterGraph, LavfiSource, fade_pair,
};
use crate::encode::profile::CLIP_PROFILE;
use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{CardRole, ReelError, ReelResult};
use crate::render::clip::FADE_SECONDS;

/// Length of every intro/outro card.
pub const CARD_SECONDS: f64 = 3.0;

const CARD_LINE_WIDTH: usize = 40;
const CARD_BOX_BORDER: u32 = 12;

/// Text and style of one title card.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CardSpec {
    pub text: String,
    /// Font name, resolved through [`FontRegistry`].
    pub font: String,
    pub font_size: u32,
    pub font_color: String,
    pub box_color: String,
    pub background: String,
    pub duration: f64,
    pub fade_duration: f64,
}

impl Default for CardSpec {
    fn default() -> Self {
        Self {
            text: String::new(),
            font: "default".to_string(),
            font_size: 64,
            font_color: "white".to_string(),
            box_color: "black@0.5".to_string(),
            background: "black".to_string(),
            duration: CARD_SECONDS,
            fade_duration: FADE_SECONDS,
        }
    }
}

impl CardSpec {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> ReelResult<()> {
        if self.text.trim().is_empty() {
            return Err(ReelError::validation("card text must be non-empty"));
        }
        if self.font_size == 0 {
            return Err(ReelError::validation("card font_size must be >= 1"));
        }
        if !self.duration.is_finite() || self.duration <= 0.0 {
            return Err(ReelError::validation("card duration must be finite and > 0"));
        }
        if !self.fade_duration.is_finite() || self.fade_duration < 0.0 {
            return Err(ReelError::validation(
                "card fade_duration must be finite and >= 0",
            ));
        }
        validate_color(&self.font_color)?;
        validate_color(&self.box_color)?;
        validate_color(&self.background)?;
        Ok(())
    }
}

/// Font name to font file mapping with a fallback, so the encoder is never handed an unresolved
/// font reference.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FontRegistry {
    /// Used for any name not in `fonts`.
    pub default: PathBuf,
    pub fonts: BTreeMap<String, PathBuf>,
}

impl Default for FontRegistry {
    fn default() -> Self {
        const DEJAVU: &str = "/usr/share/fonts/truetype/dejavu";
        let fonts = [
            ("sans", "DejaVuSans.ttf"),
            ("sans-bold", "DejaVuSans-Bold.ttf"),
            ("serif", "DejaVuSerif.ttf"),
            ("mono", "DejaVuSansMono.ttf"),
        ]
        .into_iter()
        .map(|(name, file)| (name.to_string(), Path::new(DEJAVU).join(file)))
        .collect();
        Self {
            default: Path::new(DEJAVU).join("DejaVuSans.ttf"),
            fonts,
        }
    }
}

impl FontRegistry {
    /// Resolve `name` (case-insensitive), falling back to the default font.
    pub fn resolve(&self, name: &str) -> &Path {
        let key = name.trim().to_ascii_lowercase();
        match self.fonts.get(&key) {
            Some(path) => path,
            None => {
                tracing::debug!(font = name, default = %self.default.display(), "unknown font; using default");
                &self.default
            }
        }
    }

    pub fn validate(&self) -> ReelResult<()> {
        if self.default.as_os_str().is_empty() {
            return Err(ReelError::validation("default font path must be non-empty"));
        }
        for (name, path) in std::iter::once(("default", &self.default))
            .chain(self.fonts.iter().map(|(n, p)| (n.as_str(), p)))
        {
            // `'` terminates the quoted fontfile value and has no escape inside it.
            if path.to_string_lossy().contains('\'') {
                return Err(ReelError::validation(format!(
                    "font '{name}' path '{}' must not contain a single quote",
                    path.display()
                )));
            }
        }
        if self
            .fonts
            .keys()
            .any(|k| k.is_empty() || *k != k.to_ascii_lowercase())
        {
            return Err(ReelError::validation(
                "font names must be non-empty and lowercase",
            ));
        }
        Ok(())
    }
}

/// A generated card on disk.
#[derive(Clone, Debug, PartialEq)]
pub struct CardFile {
    pub role: CardRole,
    pub path: PathBuf,
    pub duration: f64,
}

/// Renders intro/outro cards: solid background, centered boxed text, fades, and a real silent
/// stereo track.
pub struct CardGenerator<'a> {
    encoder: &'a dyn Encoder,
    fonts: &'a FontRegistry,
    canvas: Canvas,
    fps: Fps,
}

impl<'a> CardGenerator<'a> {
    pub fn new(encoder: &'a dyn Encoder, fonts: &'a FontRegistry, canvas: Canvas, fps: Fps) -> Self {
        Self {
            encoder,
            fonts,
            canvas,
            fps,
        }
    }

    pub fn invocation(&self, role: CardRole, spec: &CardSpec, output: &Path) -> ReelResult<Invocation> {
        spec.validate()?;
        let font_file = self.fonts.resolve(&spec.font);
        let layout = CaptionLayout::wrapped(
            &spec.text,
            CARD_LINE_WIDTH,
            spec.font_size,
            CARD_BOX_BORDER,
            Anchor::Center,
        );

        let mut video = FilterChain::new();
        video.push(Filter::SetSar);
        for (line, y) in layout.placements() {
            video.push(Filter::DrawText(DrawText {
                text: line.to_string(),
                font_file: font_file.to_path_buf(),
                font_size: spec.font_size,
                font_color: spec.font_color.clone(),
                box_color: spec.box_color.clone(),
                box_border: CARD_BOX_BORDER,
                x: layout.x_expr().to_string(),
                y,
            }));
        }
        video
            .extend(fade_pair(spec.duration, spec.fade_duration, false))
            .push(Filter::PixelFormat("yuv420p"));

        let mut audio = FilterChain::new();
        audio
            .push(Filter::AudioTrim {
                duration: spec.duration,
            })
            .push(Filter::ResetAudioPts)
            .push(Filter::AudioStereo {
                sample_rate: AUDIO_SAMPLE_RATE,
            })
            .extend(fade_pair(spec.duration, spec.fade_duration, true));

        let mut graph = FilterGraph::new();
        graph
            .chain(["0:v"], video, ["v"])
            .chain(["1:a"], audio, ["a"]);

        Ok(Invocation::builder(format!("{role} card"))
            .lavfi_input(&LavfiSource::Color {
                color: spec.background.clone(),
                canvas: self.canvas,
                fps: self.fps,
                duration: spec.duration,
            })
            .lavfi_input(&LavfiSource::SilentStereo {
                sample_rate: AUDIO_SAMPLE_RATE,
            })
            .filter_complex(&graph)
            .map_pad("v")
            .map_pad("a")
            .output_duration(spec.duration)
            .profile(&CLIP_PROFILE)
            .finish(output))
    }

    /// Render one card into `output_dir`. Any failure comes back as [`ReelError::Card`].
    #[tracing::instrument(skip(self, spec, output_dir), fields(text = %spec.text))]
    pub fn make_card(&self, role: CardRole, spec: &CardSpec, output_dir: &Path) -> ReelResult<CardFile> {
        let output = output_dir.join(format!("{role}-{}.mp4", uuid::Uuid::new_v4()));
        let result = self
            .invocation(role, spec, &output)
            .and_then(|invocation| self.encoder.run(&invocation));
        match result {
            Ok(()) => {
                tracing::info!(path = %output.display(), "card rendered");
                Ok(CardFile {
                    role,
                    path: output,
                    duration: spec.duration,
                })
            }
            Err(err) => Err(ReelError::card(role, err)),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/card.rs"]
mod tests;
