//! Styled text: an ordered list of (span, style) fragments over one string.
//!
//! ```rust
//! use composable_core::*;
//!
//! let title = build_annotated_string(|b| {
//!     b.with_style(SpanStyle::new().color(Color::BLUE), |b| {
//!         b.append("J");
//!     });
//!     b.append("etpack");
//! });
//! assert_eq!(title.text, "Jetpack");
//! assert_eq!(title.fragments().len(), 2);
//! ```

use std::ops::Range;

use serde::Serialize;

use crate::Color;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum TextDecoration {
    None,
    Underline,
    LineThrough,
}

/// Unset fields inherit from the enclosing style.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct SpanStyle {
    pub color: Option<Color>,
    pub font_size: Option<f32>,
    pub decoration: Option<TextDecoration>,
}

impl SpanStyle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn color(mut self, c: Color) -> Self {
        self.color = Some(c);
        self
    }

    pub fn font_size(mut self, sp: f32) -> Self {
        self.font_size = Some(sp);
        self
    }

    pub fn decoration(mut self, d: TextDecoration) -> Self {
        self.decoration = Some(d);
        self
    }

    /// `other` wins where it is set.
    pub fn merge(self, other: SpanStyle) -> SpanStyle {
        SpanStyle {
            color: other.color.or(self.color),
            font_size: other.font_size.or(self.font_size),
            decoration: other.decoration.or(self.decoration),
        }
    }
}

/// Byte range of `AnnotatedString::text` carrying a style.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SpanRange {
    pub range: Range<usize>,
    pub style: SpanStyle,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AnnotatedString {
    pub text: String,
    pub spans: Vec<SpanRange>,
}

impl AnnotatedString {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            spans: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Splits the text into consecutive runs that share one resolved style.
    pub fn fragments(&self) -> Vec<(&str, SpanStyle)> {
        if self.text.is_empty() {
            return Vec::new();
        }
        let mut cuts: Vec<usize> = vec![0, self.text.len()];
        for s in &self.spans {
            cuts.push(s.range.start.min(self.text.len()));
            cuts.push(s.range.end.min(self.text.len()));
        }
        cuts.sort_unstable();
        cuts.dedup();

        let mut out = Vec::with_capacity(cuts.len());
        for w in cuts.windows(2) {
            let (a, b) = (w[0], w[1]);
            let Some(piece) = self.text.get(a..b) else {
                continue;
            };
            let style = self
                .spans
                .iter()
                .rev()
                .filter(|s| s.range.start <= a && b <= s.range.end)
                .fold(SpanStyle::default(), |acc, s| acc.merge(s.style));
            out.push((piece, style));
        }
        out
    }
}

impl From<&str> for AnnotatedString {
    fn from(s: &str) -> Self {
        AnnotatedString::plain(s)
    }
}

impl From<String> for AnnotatedString {
    fn from(s: String) -> Self {
        AnnotatedString::plain(s)
    }
}

#[derive(Default)]
pub struct AnnotatedStringBuilder {
    text: String,
    spans: Vec<SpanRange>,
}

impl AnnotatedStringBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, s: &str) -> &mut Self {
        self.text.push_str(s);
        self
    }

    /// Text appended inside `f` carries `style`. Inner styles win over
    /// enclosing ones.
    pub fn with_style(&mut self, style: SpanStyle, f: impl FnOnce(&mut Self)) -> &mut Self {
        let start = self.text.len();
        f(self);
        let end = self.text.len();
        if end > start {
            self.spans.push(SpanRange {
                range: start..end,
                style,
            });
        }
        self
    }

    pub fn build(self) -> AnnotatedString {
        AnnotatedString {
            text: self.text,
            spans: self.spans,
        }
    }
}

pub fn build_annotated_string(f: impl FnOnce(&mut AnnotatedStringBuilder)) -> AnnotatedString {
    let mut b = AnnotatedStringBuilder::new();
    f(&mut b);
    b.build()
}
