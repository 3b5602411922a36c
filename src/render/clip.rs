use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;

use crate::caption::layout::{Anchor, CaptionLayout};
use crate::caption::style::CaptionStyle;
use crate::encode::ffmpeg::{Encoder, Invocation};
use crate::encode::filter::{
    AUDIO_SAMPLE_RATE, DrawText, Filter, FilterChain, FilterGraph, LavfiSource, fade_pair,
    normalize_video,
};
use crate::encode::profile::CLIP_PROFILE;
use crate::foundation::core::OutputGeometry;
use crate::foundation::error::{ReelError, ReelResult};
use crate::progress::Progress;
use crate::select::highlight::{ClipId, Highlight};

/// Fade-in and fade-out length for clips and cards.
pub const FADE_SECONDS: f64 = 0.5;

/// The video highlights are cut from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceMedia {
    path: PathBuf,
    has_audio: bool,
}

impl SourceMedia {
    pub fn new(path: impl Into<PathBuf>, has_audio: bool) -> Self {
        Self {
            path: path.into(),
            has_audio,
        }
    }

    /// Check that `path` exists and find out whether it carries audio.
    ///
    /// A failed probe is not fatal: the source is assumed to have audio and any real problem
    /// surfaces per clip.
    pub fn inspect(encoder: &dyn Encoder, path: &Path) -> ReelResult<Self> {
        if !path.is_file() {
            return Err(ReelError::MissingInput(path.to_path_buf()));
        }
        match encoder.probe(path) {
            Ok(info) => {
                if !info.has_video {
                    return Err(ReelError::validation(format!(
                        "source '{}' has no video stream",
                        path.display()
                    )));
                }
                Ok(Self::new(path, info.has_audio))
            }
            Err(err) if err.is_cancelled() => Err(err),
            Err(err) => {
                tracing::warn!(source = %path.display(), error = %err, "probe failed; assuming audio");
                Ok(Self::new(path, true))
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn has_audio(&self) -> bool {
        self.has_audio
    }
}

/// An encoded highlight on disk.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct RenderedClip {
    pub highlight: Highlight,
    pub path: PathBuf,
}

impl RenderedClip {
    pub fn clip_id(&self) -> &ClipId {
        &self.highlight.clip_id
    }

    pub fn duration(&self) -> f64 {
        self.highlight.duration
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClipSettings {
    pub geometry: OutputGeometry,
    pub caption: CaptionStyle,
    /// Already resolved caption font file.
    pub font_file: PathBuf,
    pub fade: f64,
}

/// Cuts highlights out of a source video, burning in captions and fades.
///
/// Every clip goes through the same codec profile and, when normalization is on, the same frame
/// geometry, so any subset of clips can later be concatenated.
pub struct ClipRenderer<'a> {
    encoder: &'a dyn Encoder,
    settings: ClipSettings,
}

impl<'a> ClipRenderer<'a> {
    pub fn new(encoder: &'a dyn Encoder, settings: ClipSettings) -> Self {
        Self { encoder, settings }
    }

    pub fn settings(&self) -> &ClipSettings {
        &self.settings
    }

    /// Wrap and place the caption of `highlight`.
    pub fn layout(&self, highlight: &Highlight) -> CaptionLayout {
        let style = &self.settings.caption;
        CaptionLayout::wrapped(
            highlight.text(),
            style.max_line_width,
            style.font_size,
            style.box_border,
            Anchor::Bottom {
                margin: style.bottom_margin,
            },
        )
    }

    /// The encoder run that produces `highlight` under `output_dir`.
    pub fn invocation(
        &self,
        source: &SourceMedia,
        highlight: &Highlight,
        layout: &CaptionLayout,
        output_dir: &Path,
    ) -> Invocation {
        let settings = &self.settings;
        let style = &settings.caption;
        let duration = highlight.duration;

        let mut video = FilterChain::new();
        if settings.geometry.normalize {
            video.extend(normalize_video(settings.geometry.canvas, settings.geometry.fps));
        }
        video.push(Filter::ResetPts);
        for (line, y) in layout.placements() {
            video.push(Filter::DrawText(DrawText {
                text: line.to_string(),
                font_file: settings.font_file.clone(),
                font_size: style.font_size,
                font_color: style.font_color.clone(),
                box_color: style.box_color.clone(),
                box_border: style.box_border,
                x: layout.x_expr().to_string(),
                y,
            }));
        }
        video
            .extend(fade_pair(duration, settings.fade, false))
            .push(Filter::PixelFormat("yuv420p"));

        let mut audio = FilterChain::new();
        audio
            .push(Filter::ResetAudioPts)
            .push(Filter::AudioResample(AUDIO_SAMPLE_RATE))
            .push(Filter::AudioStereo {
                sample_rate: AUDIO_SAMPLE_RATE,
            })
            .push(Filter::AudioTrim { duration })
            .extend(fade_pair(duration, settings.fade, true));

        let audio_input = if source.has_audio() { "0:a" } else { "1:a" };
        let mut graph = FilterGraph::new();
        graph
            .chain(["0:v"], video, ["v"])
            .chain([audio_input], audio, ["a"]);

        let mut builder = Invocation::builder(highlight.clip_id.to_string()).trimmed_input(
            source.path(),
            highlight.start(),
            duration,
        );
        if !source.has_audio() {
            builder = builder.lavfi_input(&LavfiSource::SilentStereo {
                sample_rate: AUDIO_SAMPLE_RATE,
            });
        }
        builder
            .filter_complex(&graph)
            .map_pad("v")
            .map_pad("a")
            .output_duration(duration)
            .profile(&CLIP_PROFILE)
            .finish(output_dir.join(highlight.clip_id.as_str()))
    }

    /// Render one highlight. Errors are returned to the caller untouched.
    #[tracing::instrument(skip_all, fields(clip = %highlight.clip_id, start = highlight.start(), duration = highlight.duration))]
    pub fn render(
        &self,
        source: &SourceMedia,
        highlight: &Highlight,
        layout: &CaptionLayout,
        output_dir: &Path,
    ) -> ReelResult<RenderedClip> {
        let invocation = self.invocation(source, highlight, layout, output_dir);
        self.encoder.run(&invocation)?;
        tracing::debug!(path = %invocation.output().display(), "clip rendered");
        Ok(RenderedClip {
            highlight: highlight.clone(),
            path: invocation.output().to_path_buf(),
        })
    }

    /// Render every highlight, skipping the ones the encoder fails on.
    ///
    /// With `workers > 1` clips render on a bounded rayon pool. The result always follows the
    /// order of `highlights`. Only cancellation aborts the batch.
    pub fn render_all(
        &self,
        source: &SourceMedia,
        highlights: &[Highlight],
        output_dir: &Path,
        workers: usize,
        progress: &Progress,
    ) -> ReelResult<Vec<RenderedClip>> {
        let total = highlights.len();
        let done = AtomicUsize::new(0);
        let render_one = |highlight: &Highlight| {
            let layout = self.layout(highlight);
            let result = self.render(source, highlight, &layout, output_dir);
            progress.clips(done.fetch_add(1, Ordering::SeqCst) + 1, total);
            result
        };

        let results: Vec<ReelResult<RenderedClip>> = if workers <= 1 || total <= 1 {
            let mut results = Vec::with_capacity(total);
            for highlight in highlights {
                let result = render_one(highlight);
                let cancelled = matches!(&result, Err(err) if err.is_cancelled());
                results.push(result);
                if cancelled {
                    break;
                }
            }
            results
        } else {
            let pool = build_thread_pool(workers)?;
            pool.install(|| highlights.par_iter().map(render_one).collect())
        };

        let mut clips = Vec::with_capacity(results.len());
        for (highlight, result) in highlights.iter().zip(results) {
            match result {
                Ok(clip) => clips.push(clip),
                Err(err) if err.is_cancelled() => return Err(err),
                Err(err) => tracing::warn!(
                    clip = %highlight.clip_id,
                    start = highlight.start(),
                    error = %err,
                    "clip render failed; skipping"
                ),
            }
        }
        progress.clips(total, total);
        tracing::info!(
            rendered = clips.len(),
            skipped = total - clips.len(),
            "clip rendering finished"
        );
        Ok(clips)
    }
}

fn build_thread_pool(workers: usize) -> ReelResult<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("reelcut-render-{i}"))
        .build()
        .map_err(|e| anyhow::anyhow!("failed to build rayon thread pool: {e}").into())
}

#[cfg(test)]
#[path = "../../tests/unit/render/clip.rs"]
mod tests;
