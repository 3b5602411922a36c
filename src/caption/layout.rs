/// Default maximum caption line width, in characters.
pub const DEFAULT_MAX_LINE_WIDTH: usize = 60;

/// Greedy word wrap.
///
/// Words are packed into a line while `sum(word lengths) + (words - 1)` stays within
/// `max_line_width` characters. A word longer than the limit sits alone on its own line; words are
/// never split. Whitespace runs collapse to single spaces.
pub fn wrap(text: &str, max_line_width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if current.is_empty() {
            current.push_str(word);
            current_len = word_len;
        } else if current_len + 1 + word_len <= max_line_width {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_len = word_len;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn is_filter_special(c: char) -> bool {
    matches!(c, '\\' | ':' | ',' | '[' | ']' | '=' | ';')
}

/// Make `text` safe to embed as a quoted option value in an ffmpeg filter graph.
///
/// - single quotes become typographic apostrophes (they cannot appear inside a quoted value)
/// - `\ : , [ ] = ;` are backslash-escaped
/// - control characters become spaces
///
/// A backslash already followed by one of the escaped characters is kept as that escape pair, so
/// `escape(escape(x)) == escape(x)`.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\'' => out.push('\u{2019}'),
            '\\' => {
                out.push('\\');
                match chars.peek().copied() {
                    Some(next) if is_filter_special(next) => {
                        out.push(next);
                        chars.next();
                    }
                    _ => out.push('\\'),
                }
            }
            c if is_filter_special(c) => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() => out.push(' '),
            c => out.push(c),
        }
    }
    out
}

/// Where a block of caption lines sits in the frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Anchor {
    /// Last line's box ends `margin` pixels above the bottom edge.
    Bottom { margin: u32 },
    /// Block centered vertically.
    Center,
}

/// Vertical geometry for a block of wrapped caption lines.
///
/// Every line is horizontally centered; line `i` gets a fixed slot of `line_height` pixels so a
/// multi-line caption keeps even spacing regardless of glyph heights.
#[derive(Clone, Debug, PartialEq)]
pub struct CaptionLayout {
    lines: Vec<String>,
    line_height: u32,
    anchor: Anchor,
}

impl CaptionLayout {
    pub fn new(lines: Vec<String>, font_size: u32, box_border: u32, anchor: Anchor) -> Self {
        Self {
            lines,
            line_height: line_height(font_size, box_border),
            anchor,
        }
    }

    /// Wrap `text` and lay it out in one step.
    pub fn wrapped(
        text: &str,
        max_line_width: usize,
        font_size: u32,
        box_border: u32,
        anchor: Anchor,
    ) -> Self {
        Self::new(wrap(text, max_line_width), font_size, box_border, anchor)
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line_height(&self) -> u32 {
        self.line_height
    }

    /// Horizontal position expression (shared by every line).
    pub fn x_expr(&self) -> &'static str {
        "(w-text_w)/2"
    }

    /// Vertical position expression for line `index`; indexes past the last line sit on it.
    fn y_expr(&self, index: usize) -> String {
        let n = self.lines.len() as u32;
        let i = (index as u32).min(n.saturating_sub(1));
        match self.anchor {
            Anchor::Bottom { margin } => {
                format!("h-{}", margin + (n - i) * self.line_height)
            }
            Anchor::Center => {
                format!("(h-{})/2+{}", n * self.line_height, i * self.line_height)
            }
        }
    }

    /// `(text, y_expr)` per line, top to bottom.
    pub fn placements(&self) -> impl Iterator<Item = (&str, String)> + '_ {
        self.lines
            .iter()
            .enumerate()
            .map(|(i, line)| (line.as_str(), self.y_expr(i)))
    }
}

fn line_height(font_size: u32, box_border: u32) -> u32 {
    font_size + font_size / 4 + 2 * box_border
}

#[cfg(test)]
#[path = "../../tests/unit/caption/layout.rs"]
mod tests;
