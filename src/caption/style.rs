use crate::caption::layout::DEFAULT_MAX_LINE_WIDTH;
use crate::foundation::error::{ReelError, ReelResult};

/// How captions are drawn onto rendered clips.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CaptionStyle {
    pub max_line_width: usize,
    /// Font name, resolved through the font registry.
    pub font: String,
    pub font_size: u32,
    pub font_color: String,
    pub box_color: String,
    pub box_border: u32,
    /// Pixels between the last caption line and the bottom edge.
    pub bottom_margin: u32,
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            max_line_width: DEFAULT_MAX_LINE_WIDTH,
            font: "default".to_string(),
            font_size: 28,
            font_color: "white".to_string(),
            box_color: "black@0.25".to_string(),
            box_border: 8,
            bottom_margin: 100,
        }
    }
}

impl CaptionStyle {
    pub fn validate(&self) -> ReelResult<()> {
        if self.max_line_width == 0 {
            return Err(ReelError::validation("caption max_line_width must be >= 1"));
        }
        if self.font_size == 0 {
            return Err(ReelError::validation("caption font_size must be >= 1"));
        }
        validate_color(&self.font_color)?;
        validate_color(&self.box_color)?;
        Ok(())
    }
}

/// Accept the ffmpeg colour forms we emit unquoted: a colour name, `#RRGGBB[AA]` or
/// `0xRRGGBB[AA]`, each with an optional `@alpha` in `[0, 1]`.
pub fn validate_color(color: &str) -> ReelResult<()> {
    let invalid = || ReelError::validation(format!("invalid colour '{color}'"));

    let (base, alpha) = match color.split_once('@') {
        Some((base, alpha)) => (base, Some(alpha)),
        None => (color, None),
    };

    let hex = base
        .strip_prefix('#')
        .or_else(|| base.strip_prefix("0x"))
        .or_else(|| base.strip_prefix("0X"));
    let base_ok = match hex {
        Some(digits) => {
            matches!(digits.len(), 6 | 8) && digits.chars().all(|c| c.is_ascii_hexdigit())
        }
        None => !base.is_empty() && base.chars().all(|c| c.is_ascii_alphabetic()),
    };
    if !base_ok {
        return Err(invalid());
    }

    if let Some(alpha) = alpha {
        let value: f64 = alpha.parse().map_err(|_| invalid())?;
        if !(0.0..=1.0).contains(&value) {
            return Err(invalid());
        }
    }
    Ok(())
}
