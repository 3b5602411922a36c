use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::assemble::reel::{ReelAssembler, ReelFile, ReelOrder};
use crate::config::PipelineConfig;
use crate::encode::ffmpeg::Encoder;
use crate::foundation::core::OutputGeometry;
use crate::foundation::error::{CardRole, ReelError, ReelResult};
use crate::progress::Progress;
use crate::render::card::{CardGenerator, CardSpec};
use crate::render::clip::{ClipRenderer, ClipSettings, FADE_SECONDS, RenderedClip, SourceMedia};
use crate::select::highlight::{Highlight, HighlightSelector, SelectionBudget};
use crate::transcript::segment::Segment;
use crate::transcript::source::Transcriber;

/// Manifest file names are `highlights-<run id>.json`, one per `generate_highlights` call.
pub const MANIFEST_PREFIX: &str = "highlights-";
const MANIFEST_EXT: &str = "json";

/// Record of one `generate_highlights` call, so assembly can run in a later process.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ClipManifest {
    pub run_id: String,
    pub source: PathBuf,
    /// Successfully rendered highlights, in ranked order. Files live next to the manifest.
    pub clips: Vec<Highlight>,
}

impl ClipManifest {
    pub fn new(source: impl Into<PathBuf>, clips: Vec<Highlight>) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            source: source.into(),
            clips,
        }
    }

    pub fn file_name(&self) -> String {
        format!("{MANIFEST_PREFIX}{}.{MANIFEST_EXT}", self.run_id)
    }

    fn is_manifest_name(name: &str) -> bool {
        name.starts_with(MANIFEST_PREFIX)
            && Path::new(name)
                .extension()
                .is_some_and(|ext| ext == MANIFEST_EXT)
    }

    pub fn read(path: &Path) -> ReelResult<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read clip manifest '{}'", path.display()))?;
        let manifest: Self = serde_json::from_slice(&bytes)
            .map_err(|e| ReelError::serde(format!("parse '{}': {e}", path.display())))?;
        for h in &manifest.clips {
            if !h.duration.is_finite()
                || h.duration <= 0.0
                || h.duration > h.segment.duration() + 1e-6
            {
                return Err(ReelError::validation(format!(
                    "manifest entry '{}' has invalid duration {}",
                    h.clip_id, h.duration
                )));
            }
        }
        Ok(manifest)
    }

    /// Every manifest in `dir`, ordered by file name. A missing directory has none.
    pub fn load_all(dir: &Path) -> ReelResult<Vec<Self>> {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(anyhow::Error::new(err)
                    .context(format!("failed to list '{}'", dir.display()))
                    .into());
            }
        };
        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.with_context(|| format!("failed to list '{}'", dir.display()))?;
            let path = entry.path();
            if path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(Self::is_manifest_name)
                && path.is_file()
            {
                paths.push(path);
            }
        }
        paths.sort();
        paths.iter().map(|p| Self::read(p)).collect()
    }

    /// Write to `dir` through a temporary file so readers never see a partial manifest.
    pub fn save(&self, dir: &Path) -> ReelResult<PathBuf> {
        let path = dir.join(self.file_name());
        let tmp = dir.join(format!(".{}.tmp", self.file_name()));
        let json = serde_json::to_vec_pretty(self)
            .map_err(|e| ReelError::serde(format!("serialize clip manifest: {e}")))?;
        std::fs::write(&tmp, json)
            .with_context(|| format!("failed to write '{}'", tmp.display()))?;
        if let Err(err) = std::fs::rename(&tmp, &path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(anyhow::Error::new(err)
                .context(format!("failed to move manifest into '{}'", path.display()))
                .into());
        }
        Ok(path)
    }

    pub fn rendered_clips(&self, dir: &Path) -> Vec<RenderedClip> {
        self.clips
            .iter()
            .map(|h| RenderedClip {
                path: dir.join(h.clip_id.as_str()),
                highlight: h.clone(),
            })
            .collect()
    }
}

/// Caller-facing reel pipeline.
///
/// Owns the configuration and every clip its [`Pipeline::generate_highlights`] calls produced;
/// borrows the encoder and any transcriber it is handed. Progress restarts with each new run.
pub struct Pipeline<'a> {
    config: PipelineConfig,
    geometry: OutputGeometry,
    encoder: &'a dyn Encoder,
    progress: Progress,
    registry: Vec<RenderedClip>,
    last_run: Vec<RenderedClip>,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: PipelineConfig, encoder: &'a dyn Encoder, progress: Progress) -> ReelResult<Self> {
        config.validate()?;
        let geometry = config.video.geometry()?;
        Ok(Self {
            config,
            geometry,
            encoder,
            progress,
            registry: Vec::new(),
            last_run: Vec::new(),
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    /// Clips produced by the last `generate_highlights` call.
    pub fn clips(&self) -> &[RenderedClip] {
        &self.last_run
    }

    pub fn transcribe(&self, transcriber: &dyn Transcriber, media: &Path) -> ReelResult<Vec<Segment>> {
        self.progress.begin_run();
        let segments = transcriber.transcribe(media)?;
        self.progress.transcribed();
        Ok(segments)
    }

    pub fn select(&self, segments: &[Segment], max_clips: usize, max_total_duration: f64) -> Vec<Highlight> {
        HighlightSelector::new(self.config.selection.keyword_set())
            .select(segments, SelectionBudget::new(max_clips, max_total_duration))
    }

    /// Select highlights and render one clip per highlight into `output_dir`.
    ///
    /// Clips the encoder fails on are dropped; an empty result is a valid outcome. The rendered
    /// set is added to what [`Pipeline::assemble_reel`] accepts and recorded in a manifest of its
    /// own, so earlier runs into the same directory stay assemblable.
    #[tracing::instrument(skip(self, segments), fields(segments = segments.len()))]
    pub fn generate_highlights(
        &mut self,
        source: &Path,
        segments: &[Segment],
        max_clips: usize,
        max_total_duration: f64,
        output_dir: &Path,
    ) -> ReelResult<Vec<RenderedClip>> {
        self.progress.begin_run();
        let media = SourceMedia::inspect(self.encoder, source)?;
        let highlights = self.select(segments, max_clips, max_total_duration);

        let font_file = self.config.fonts.resolve(&self.config.caption.font).to_path_buf();
        let renderer = ClipRenderer::new(
            self.encoder,
            ClipSettings {
                geometry: self.geometry,
                caption: self.config.caption.clone(),
                font_file,
                fade: FADE_SECONDS,
            },
        );
        let clips = renderer.render_all(
            &media,
            &highlights,
            output_dir,
            self.config.render.workers,
            &self.progress,
        )?;

        let manifest = ClipManifest::new(
            source,
            clips.iter().map(|c| c.highlight.clone()).collect(),
        );
        let manifest_path = manifest.save(output_dir)?;
        tracing::info!(
            selected = highlights.len(),
            rendered = clips.len(),
            manifest = %manifest_path.display(),
            "highlights generated"
        );

        self.registry.extend(clips.iter().cloned());
        self.last_run = clips.clone();
        Ok(clips)
    }

    fn available_clips(&self, output_dir: &Path) -> ReelResult<Vec<RenderedClip>> {
        let mut clips: Vec<RenderedClip> = self
            .registry
            .iter()
            .filter(|c| c.path.parent() == Some(output_dir))
            .cloned()
            .collect();
        for manifest in ClipManifest::load_all(output_dir)? {
            for clip in manifest.rendered_clips(output_dir) {
                if !clips.iter().any(|c| c.clip_id() == clip.clip_id()) {
                    clips.push(clip);
                }
            }
        }
        Ok(clips)
    }

    /// Build intro and outro cards and concatenate them around the clips named in `order`.
    ///
    /// Names must come from any previous `generate_highlights` into `output_dir` (this process or
    /// a manifest left there). Card and concatenation failures are fatal.
    #[tracing::instrument(skip_all, fields(clips = order.len(), output_dir = %output_dir.display()))]
    pub fn assemble_reel(
        &self,
        order: &ReelOrder,
        output_dir: &Path,
        intro: &CardSpec,
        outro: &CardSpec,
    ) -> ReelResult<ReelFile> {
        let available = self.available_clips(output_dir)?;
        let clips = order.resolve(&available)?;
        if let Some(missing) = clips.iter().find(|c| !c.path.is_file()) {
            return Err(ReelError::MissingInput(missing.path.clone()));
        }

        let cards = CardGenerator::new(
            self.encoder,
            &self.config.fonts,
            self.geometry.canvas,
            self.geometry.fps,
        );
        let intro = cards.make_card(CardRole::Intro, intro, output_dir)?;
        self.progress.intro_done();
        let outro = cards.make_card(CardRole::Outro, outro, output_dir)?;
        self.progress.outro_done();

        let output = output_dir.join(format!("reel-{}.mp4", uuid::Uuid::new_v4()));
        let reel = ReelAssembler::new(self.encoder, self.geometry.canvas, self.geometry.fps)
            .assemble(&intro, &outro, &clips, &output)?;
        self.progress.reel_done();
        Ok(reel)
    }

    /// Transcript to finished reel, clips in ranked order, budgets from the configuration.
    pub fn run(
        &mut self,
        source: &Path,
        transcriber: &dyn Transcriber,
        output_dir: &Path,
        intro: &CardSpec,
        outro: &CardSpec,
    ) -> ReelResult<ReelFile> {
        let segments = self.transcribe(transcriber, source)?;
        let selection = &self.config.selection;
        let (max_clips, max_total) = (selection.max_clips, selection.max_total_duration);
        let clips = self.generate_highlights(source, &segments, max_clips, max_total, output_dir)?;
        let order = ReelOrder::from_clips(&clips);
        self.assemble_reel(&order, output_dir, intro, outro)
    }
}
