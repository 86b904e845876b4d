use std::ops::Range;
use std::rc::Rc;

use composable_core::*;
use unicode_segmentation::UnicodeSegmentation;

pub const TF_FONT_SP: f32 = 16.0;
pub const TF_PADDING_X_DP: f32 = 12.0;
pub const TF_HEIGHT_DP: f32 = 56.0;

/// find prev/next grapheme boundaries around a byte index
fn prev_grapheme_boundary(text: &str, byte: usize) -> usize {
    let mut last = 0usize;
    for (i, _) in text.grapheme_indices(true) {
        if i >= byte {
            break;
        }
        last = i;
    }
    last
}

fn next_grapheme_boundary(text: &str, byte: usize) -> usize {
    for (i, _) in text.grapheme_indices(true) {
        if i > byte {
            return i;
        }
    }
    text.len()
}

fn clamp_to_char_boundary(s: &str, i: usize) -> usize {
    if i >= s.len() {
        return s.len();
    }
    let mut j = i;
    while j > 0 && !s.is_char_boundary(j) {
        j -= 1;
    }
    j
}

/// Platform-side editing bookkeeping for one controlled field.
///
/// The owner's value is authoritative: call `sync` with the value carried by
/// the current view before every edit. Edits compute the next string; the
/// platform hands it to `on_change` and never renders `text` itself.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TextFieldState {
    pub text: String,
    pub selection: Range<usize>,
}

impl TextFieldState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopt the owner's value. The caret stays where it was when the value
    /// is unchanged and moves to the end otherwise.
    pub fn sync(&mut self, value: &str) {
        if self.text == value {
            let s = clamp_to_char_boundary(&self.text, self.selection.start);
            let e = clamp_to_char_boundary(&self.text, self.selection.end);
            self.selection = s..e;
            return;
        }
        self.text = value.to_string();
        let end = self.text.len();
        self.selection = end..end;
    }

    pub fn insert_text(&mut self, text: &str) {
        let start = self.selection.start.min(self.text.len());
        let end = self.selection.end.min(self.text.len());
        let (start, end) = (start.min(end), start.max(end));

        self.text.replace_range(start..end, text);
        let new_pos = start + text.len();
        self.selection = new_pos..new_pos;
    }

    pub fn delete_backward(&mut self) {
        if self.selection.start == self.selection.end {
            let pos = self.selection.start.min(self.text.len());
            if pos > 0 {
                let prev = prev_grapheme_boundary(&self.text, pos);
                self.text.replace_range(prev..pos, "");
                self.selection = prev..prev;
            }
        } else {
            self.insert_text("");
        }
    }

    pub fn delete_forward(&mut self) {
        if self.selection.start == self.selection.end {
            let pos = self.selection.start.min(self.text.len());
            if pos < self.text.len() {
                let next = next_grapheme_boundary(&self.text, pos);
                self.text.replace_range(pos..next, "");
            }
        } else {
            self.insert_text("");
        }
    }

    pub fn move_cursor(&mut self, delta: isize, extend_selection: bool) {
        let mut pos = self.selection.end.min(self.text.len());
        if delta < 0 {
            for _ in 0..delta.unsigned_abs() {
                pos = prev_grapheme_boundary(&self.text, pos);
            }
        } else {
            for _ in 0..delta.unsigned_abs() {
                pos = next_grapheme_boundary(&self.text, pos);
            }
        }
        if extend_selection {
            self.selection.end = pos;
        } else {
            self.selection = pos..pos;
        }
    }
}

/// Controlled single-line field. `value` is the owner's state; every edit
/// calls `on_change` with the full new string, Enter calls `on_submit`.
pub fn TextField(
    value: impl Into<String>,
    label: impl Into<String>,
    modifier: Modifier,
    on_change: impl Fn(String) + 'static,
    on_submit: impl Fn(String) + 'static,
) -> View {
    let value = value.into();
    let label = label.into();
    View::new(
        0,
        ViewKind::TextField {
            value: value.clone(),
            label: label.clone(),
            on_change: Some(Rc::new(on_change)),
            on_submit: Some(Rc::new(on_submit)),
        },
    )
    .modifier(modifier)
    .semantics(Semantics::new(Role::TextField).label(label).value(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_textfield_insert() {
        let mut state = TextFieldState::new();
        state.insert_text("Hello");
        assert_eq!(state.text, "Hello");
        assert_eq!(state.selection, 5..5);
    }

    #[test]
    fn test_textfield_delete_backward() {
        let mut state = TextFieldState::new();
        state.insert_text("Hello");
        state.delete_backward();
        assert_eq!(state.text, "Hell");
        assert_eq!(state.selection, 4..4);
    }

    #[test]
    fn test_textfield_delete_forward() {
        let mut state = TextFieldState::new();
        state.insert_text("A👍🏽B");
        state.selection = 1..1;
        state.delete_forward();
        assert_eq!(state.text, "AB");
        assert_eq!(state.selection, 1..1);

        // at the end nothing happens
        state.move_cursor(1, false);
        state.delete_forward();
        assert_eq!(state.text, "AB");
    }

    #[test]
    fn test_textfield_selection_replace() {
        let mut state = TextFieldState::new();
        state.insert_text("Hello World");
        state.selection = 0..5;
        state.insert_text("Hi");
        assert_eq!(state.text, "Hi World");
        assert_eq!(state.selection, 2..2);
    }

    #[test]
    fn test_sync_follows_owner_value() {
        let mut state = TextFieldState::new();
        state.sync("Ada");
        assert_eq!(state.selection, 3..3);

        state.move_cursor(-1, false);
        state.sync("Ada");
        assert_eq!(state.selection, 2..2);

        // owner rewrote the value: caret goes to the end
        state.sync("Grace");
        assert_eq!(state.text, "Grace");
        assert_eq!(state.selection, 5..5);
    }

    #[test]
    fn test_grapheme_delete_and_move() {
        let mut st = TextFieldState::new();
        st.insert_text("A👍🏽B");
        st.move_cursor(-1, false);
        assert_eq!(st.selection.end, "A👍🏽".len());
        st.delete_backward();
        assert_eq!(st.text, "AB");
        assert_eq!(st.selection, "A".len().."A".len());
    }

    #[test]
    fn test_textfield_semantics() {
        let tf = TextField("Ada", "Enter name", Modifier::new(), |_| {}, |_| {});
        let sem = tf.semantics.unwrap();
        assert_eq!(sem.role, Role::TextField);
        assert_eq!(sem.label.as_deref(), Some("Enter name"));
        assert_eq!(sem.value.as_deref(), Some("Ada"));
    }
}
