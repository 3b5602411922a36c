use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::encode::ffmpeg::{Encoder, Invocation};
use crate::encode::filter::{AUDIO_SAMPLE_RATE, Filter, FilterChain, FilterGraph, normalize_video};
use crate::encode::profile::REEL_PROFILE;
use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::card::CardFile;
use crate::render::clip::RenderedClip;
use crate::select::highlight::ClipId;

/// Caller-chosen sequence of clip names. Assembly follows it exactly.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReelOrder {
    clips: Vec<ClipId>,
}

impl ReelOrder {
    /// Parse clip names, rejecting path-like names and repeats.
    pub fn parse<I, S>(names: I) -> ReelResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut clips = Vec::new();
        for name in names {
            let id = ClipId::parse(name.as_ref())?;
            if !seen.insert(id.clone()) {
                return Err(ReelError::ordering(format!("clip '{id}' listed more than once")));
            }
            clips.push(id);
        }
        Ok(Self { clips })
    }

    pub fn from_clips(clips: &[RenderedClip]) -> Self {
        Self {
            clips: clips.iter().map(|c| c.clip_id().clone()).collect(),
        }
    }

    pub fn ids(&self) -> &[ClipId] {
        &self.clips
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    /// Look every name up in `available`, in order. Names that were never produced are an
    /// ordering error.
    pub fn resolve(&self, available: &[RenderedClip]) -> ReelResult<Vec<RenderedClip>> {
        let unknown: Vec<&str> = self
            .clips
            .iter()
            .filter(|id| !available.iter().any(|c| c.clip_id() == *id))
            .map(ClipId::as_str)
            .collect();
        if !unknown.is_empty() {
            return Err(ReelError::ordering(format!(
                "unknown clip(s): {}",
                unknown.join(", ")
            )));
        }
        Ok(self
            .clips
            .iter()
            .filter_map(|id| available.iter().find(|c| c.clip_id() == id).cloned())
            .collect())
    }
}

/// The finished reel.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ReelFile {
    pub path: PathBuf,
    /// Clips between the cards.
    pub clip_count: usize,
    /// Sum of the input durations.
    pub expected_duration: f64,
    /// Duration reported by the probe of the written file, when available.
    pub duration: Option<f64>,
}

/// Concatenates `[intro] + clips + [outro]` into one uniformly encoded file.
pub struct ReelAssembler<'a> {
    encoder: &'a dyn Encoder,
    canvas: Canvas,
    fps: Fps,
}

impl<'a> ReelAssembler<'a> {
    pub fn new(encoder: &'a dyn Encoder, canvas: Canvas, fps: Fps) -> Self {
        Self {
            encoder,
            canvas,
            fps,
        }
    }

    /// One filter graph: every input is re-timed to zero and brought to the reel geometry, then
    /// all video pads go through one `concat` and all audio pads through another.
    pub fn invocation(&self, inputs: &[&Path], output: &Path) -> Invocation {
        let n = inputs.len();
        let mut graph = FilterGraph::new();
        for i in 0..n {
            let mut video = FilterChain::new();
            video
                .push(Filter::ResetPts)
                .extend(normalize_video(self.canvas, self.fps))
                .push(Filter::PixelFormat("yuv420p"));
            graph.chain([format!("{i}:v")], video, [format!("v{i}")]);

            let mut audio = FilterChain::new();
            audio
                .push(Filter::ResetAudioPts)
                .push(Filter::AudioResample(AUDIO_SAMPLE_RATE))
                .push(Filter::AudioStereo {
                    sample_rate: AUDIO_SAMPLE_RATE,
                });
            graph.chain([format!("{i}:a")], audio, [format!("a{i}")]);
        }

        let mut video_concat = FilterChain::new();
        video_concat.push(Filter::Concat {
            segments: n,
            video: 1,
            audio: 0,
        });
        graph.chain((0..n).map(|i| format!("v{i}")), video_concat, ["outv"]);

        let mut audio_concat = FilterChain::new();
        audio_concat.push(Filter::Concat {
            segments: n,
            video: 0,
            audio: 1,
        });
        graph.chain((0..n).map(|i| format!("a{i}")), audio_concat, ["outa"]);

        let mut builder = Invocation::builder("concat");
        for input in inputs {
            builder = builder.input(input);
        }
        builder
            .filter_complex(&graph)
            .map_pad("outv")
            .map_pad("outa")
            .profile(&REEL_PROFILE)
            .finish(output)
    }

    /// Build the reel at `output`.
    ///
    /// Every input must exist before the encoder is started; a missing one fails the call with
    /// [`ReelError::MissingInput`]. Encoder failures propagate with their diagnostics.
    #[tracing::instrument(skip_all, fields(clips = clips.len(), output = %output.display()))]
    pub fn assemble(
        &self,
        intro: &CardFile,
        outro: &CardFile,
        clips: &[RenderedClip],
        output: &Path,
    ) -> ReelResult<ReelFile> {
        let inputs: Vec<&Path> = std::iter::once(intro.path.as_path())
            .chain(clips.iter().map(|c| c.path.as_path()))
            .chain(std::iter::once(outro.path.as_path()))
            .collect();
        if let Some(missing) = inputs.iter().find(|p| !p.is_file()) {
            return Err(ReelError::MissingInput(missing.to_path_buf()));
        }

        let invocation = self.invocation(&inputs, output);
        self.encoder.run(&invocation)?;

        let expected_duration =
            intro.duration + outro.duration + clips.iter().map(RenderedClip::duration).sum::<f64>();
        let duration = match self.encoder.probe(output) {
            Ok(info) => info.duration,
            Err(err) if err.is_cancelled() => return Err(err),
            Err(err) => {
                tracing::debug!(error = %err, "could not probe finished reel");
                None
            }
        };
        tracing::info!(expected_duration, ?duration, "reel assembled");

        Ok(ReelFile {
            path: output.to_path_buf(),
            clip_count: clips.len(),
            expected_duration,
            duration,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assemble/reel.rs"]
mod tests;
