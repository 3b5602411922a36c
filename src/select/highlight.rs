use std::cmp::Ordering;

use crate::foundation::error::{ReelError, ReelResult};
use crate::transcript::segment::{KeywordSet, Segment};

/// Segments must be strictly longer than this to be considered at all.
pub const MIN_HIGHLIGHT_SECONDS: f64 = 5.0;

const CLIP_EXTENSION: &str = "mp4";

/// Collision-free clip file name (`<uuid>.mp4`), assigned at selection time.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[serde(transparent)]
pub struct ClipId(String);

impl ClipId {
    pub fn generate() -> Self {
        Self(format!("{}.{CLIP_EXTENSION}", uuid::Uuid::new_v4()))
    }

    /// Accept a caller-supplied clip name. Only bare file names are allowed so an ordering can
    /// never point outside the clip directory.
    pub fn parse(name: &str) -> ReelResult<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ReelError::ordering("clip name must be non-empty"));
        }
        if name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(ReelError::ordering(format!(
                "clip name '{name}' must be a bare file name"
            )));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ClipId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for ClipId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ClipId::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Clip-count and total-duration limits for one selection run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SelectionBudget {
    pub max_clips: usize,
    pub max_total_duration: f64,
}

impl SelectionBudget {
    pub fn new(max_clips: usize, max_total_duration: f64) -> Self {
        Self {
            max_clips,
            max_total_duration,
        }
    }
}

/// A segment chosen for rendering, possibly shortened to fit the remaining budget.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Highlight {
    pub clip_id: ClipId,
    pub segment: Segment,
    /// Seconds actually rendered from `segment.start()`; never more than the segment duration.
    pub duration: f64,
    pub keyword_score: u32,
    /// 0-based position in the ranked selection.
    pub rank: usize,
}

impl Highlight {
    pub fn start(&self) -> f64 {
        self.segment.start()
    }

    pub fn end(&self) -> f64 {
        self.segment.start() + self.duration
    }

    pub fn text(&self) -> &str {
        self.segment.text()
    }

    pub fn is_clamped(&self) -> bool {
        self.duration < self.segment.duration()
    }
}

/// Ranks transcript segments and trims the ranking to a budget.
#[derive(Clone, Debug, Default)]
pub struct HighlightSelector {
    keywords: KeywordSet,
}

impl HighlightSelector {
    pub fn new(keywords: KeywordSet) -> Self {
        Self { keywords }
    }

    pub fn keywords(&self) -> &KeywordSet {
        &self.keywords
    }

    /// Select highlights in ranked order.
    ///
    /// Segments no longer than [`MIN_HIGHLIGHT_SECONDS`] are discarded. The rest are ordered by
    /// keyword score, then duration, both descending; the sort is stable so ties keep transcript
    /// order. The walk stops at `max_clips`, and the first segment that would overrun
    /// `max_total_duration` is clamped to the remaining budget and becomes the last entry.
    #[tracing::instrument(skip(self, segments), fields(segments = segments.len()))]
    pub fn select(&self, segments: &[Segment], budget: SelectionBudget) -> Vec<Highlight> {
        if budget.max_clips == 0 || budget.max_total_duration.is_nan() || budget.max_total_duration <= 0.0 {
            return Vec::new();
        }

        let mut ranked: Vec<(u32, &Segment)> = segments
            .iter()
            .filter(|s| s.duration() > MIN_HIGHLIGHT_SECONDS)
            .map(|s| (self.keywords.score(s.text()), s))
            .collect();
        ranked.sort_by(|(score_a, a), (score_b, b)| {
            score_b
                .cmp(score_a)
                .then_with(|| b.duration().total_cmp(&a.duration()))
        });

        let mut out = Vec::new();
        let mut total = 0.0_f64;
        for (score, segment) in ranked {
            if out.len() >= budget.max_clips || total >= budget.max_total_duration {
                break;
            }
            let remaining = budget.max_total_duration - total;
            let full = segment.duration();
            let clamped = full.partial_cmp(&remaining) == Some(Ordering::Greater);
            let duration = if clamped { remaining } else { full };

            out.push(Highlight {
                clip_id: ClipId::generate(),
                segment: segment.clone(),
                duration,
                keyword_score: score,
                rank: out.len(),
            });
            total += duration;

            if clamped {
                tracing::debug!(
                    start = segment.start(),
                    full,
                    duration,
                    "clamped last highlight to remaining budget"
                );
                break;
            }
        }

        tracing::info!(selected = out.len(), total_seconds = total, "selected highlights");
        out
    }
}

/// Select with the default keyword set.
pub fn select(segments: &[Segment], max_clips: usize, max_total_duration: f64) -> Vec<Highlight> {
    HighlightSelector::default().select(
        segments,
        SelectionBudget::new(max_clips, max_total_duration),
    )
}

#[cfg(test)]
#[path = "../../tests/unit/select/highlight.rs"]
mod tests;
