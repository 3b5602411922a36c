//! reelcut turns a timestamped transcript of a video into a short highlight reel.
//!
//! The pipeline:
//!
//! - score transcript [`Segment`]s by keyword and pick a budget-bounded ranked set of
//!   [`Highlight`]s
//! - cut each highlight out of the source with burned-in captions and fades ([`ClipRenderer`])
//! - render intro/outro title cards ([`CardGenerator`])
//! - concatenate `[intro] + clips + [outro]` in caller order into one reel ([`ReelAssembler`])
//!
//! All media work is delegated to an external encoder behind the [`Encoder`] trait;
//! [`SystemEncoder`] drives the system `ffmpeg`/`ffprobe` with a deadline and cancellation.
#![forbid(unsafe_code)]

mod foundation;

pub(crate) mod assemble;
pub(crate) mod caption;
pub(crate) mod config;
pub(crate) mod encode;
pub(crate) mod pipeline;
pub(crate) mod progress;
pub(crate) mod render;
pub(crate) mod select;
pub(crate) mod transcript;

pub use crate::foundation::cancel::CancelToken;
pub use crate::foundation::core::{Canvas, Fps, OutputGeometry};
pub use crate::foundation::error::{CardRole, ReelError, ReelResult};

pub use crate::assemble::reel::{ReelAssembler, ReelFile, ReelOrder};
pub use crate::caption::layout::{Anchor, CaptionLayout, DEFAULT_MAX_LINE_WIDTH, escape, wrap};
pub use crate::caption::style::{CaptionStyle, validate_color};
pub use crate::config::{PipelineConfig, RenderConfig, SelectionConfig, VideoSettings};
pub use crate::encode::ffmpeg::{
    DEFAULT_TIMEOUT, Encoder, EncoderSettings, Invocation, InvocationBuilder, SystemEncoder,
    audio_extraction,
};
pub use crate::encode::filter::{DrawText, FadeDirection, Filter, FilterChain, FilterGraph, LavfiSource};
pub use crate::encode::probe::MediaInfo;
pub use crate::encode::profile::{CLIP_PROFILE, EncodeProfile, REEL_PROFILE, RateControl};
pub use crate::pipeline::{ClipManifest, MANIFEST_PREFIX, Pipeline};
pub use crate::progress::{Progress, ProgressSink, RecordingSink, TracingSink};
pub use crate::render::card::{CARD_SECONDS, CardFile, CardGenerator, CardSpec, FontRegistry};
pub use crate::render::clip::{ClipRenderer, ClipSettings, FADE_SECONDS, RenderedClip, SourceMedia};
pub use crate::select::highlight::{
    ClipId, Highlight, HighlightSelector, MIN_HIGHLIGHT_SECONDS, SelectionBudget, select,
};
pub use crate::transcript::segment::{DEFAULT_KEYWORDS, KeywordSet, Segment, normalize_segments};
pub use crate::transcript::source::{
    Transcriber, TranscriptFile, TranscriptFormat, parse_json_transcript, parse_srt,
};
