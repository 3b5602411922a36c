use crate::foundation::error::{ReelError, ReelResult};

/// Keywords whose presence marks an utterance as highlight-worthy.
pub const DEFAULT_KEYWORDS: [&str; 7] = [
    "important",
    "wow",
    "amazing",
    "note",
    "key",
    "attention",
    "highlight",
];

/// One timestamped utterance from the transcript.
///
/// Constructed only through [`Segment::new`], which enforces `0 <= start < end` and non-empty
/// trimmed text. Fields are private so the pipeline can derive from a segment but never move its
/// bounds.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Segment {
    start: f64,
    end: f64,
    text: String,
}

impl Segment {
    pub fn new(start: f64, end: f64, text: impl AsRef<str>) -> ReelResult<Self> {
        if !start.is_finite() || !end.is_finite() {
            return Err(ReelError::validation("segment offsets must be finite"));
        }
        if start < 0.0 {
            return Err(ReelError::validation(format!(
                "segment start must be >= 0 (got {start})"
            )));
        }
        if end <= start {
            return Err(ReelError::validation(format!(
                "segment end must be after start (got {start}..{end})"
            )));
        }
        let text = text.as_ref().trim();
        if text.is_empty() {
            return Err(ReelError::validation("segment text must be non-empty"));
        }
        Ok(Self {
            start,
            end,
            text: text.to_string(),
        })
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

impl<'de> serde::Deserialize<'de> for Segment {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(serde::Deserialize)]
        struct Raw {
            start: f64,
            end: f64,
            text: String,
        }

        let raw = Raw::deserialize(deserializer)?;
        Segment::new(raw.start, raw.end, raw.text).map_err(serde::de::Error::custom)
    }
}

/// Case-insensitive keyword matcher used for highlight scoring.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeywordSet {
    lowered: Vec<String>,
}

impl KeywordSet {
    /// Build a set from arbitrary keywords; blanks and duplicates are dropped.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut lowered: Vec<String> = Vec::new();
        for kw in keywords {
            let kw = kw.as_ref().trim().to_lowercase();
            if !kw.is_empty() && !lowered.contains(&kw) {
                lowered.push(kw);
            }
        }
        Self { lowered }
    }

    pub fn len(&self) -> usize {
        self.lowered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lowered.is_empty()
    }

    /// Number of distinct keywords that occur in `text` as substrings, ignoring case.
    pub fn score(&self, text: &str) -> u32 {
        let text = text.to_lowercase();
        self.lowered
            .iter()
            .filter(|kw| text.contains(kw.as_str()))
            .count() as u32
    }
}

impl Default for KeywordSet {
    fn default() -> Self {
        Self::new(DEFAULT_KEYWORDS)
    }
}

/// Turn raw recognizer output into segments, dropping entries that cannot be segments.
///
/// Input order is kept; the recognizer is assumed to emit chronological, non-overlapping tuples.
pub fn normalize_segments<I, S>(raw: I) -> Vec<Segment>
where
    I: IntoIterator<Item = (f64, f64, S)>,
    S: AsRef<str>,
{
    let mut out = Vec::new();
    for (start, end, text) in raw {
        match Segment::new(start, end, text.as_ref()) {
            Ok(seg) => out.push(seg),
            Err(err) => {
                tracing::debug!(start, end, %err, "dropping transcript entry");
            }
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/transcript/segment.rs"]
mod tests;
