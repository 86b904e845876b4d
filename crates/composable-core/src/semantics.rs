use serde::Serialize;

/// Semantic role of a view; what the node is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Role {
    Text,
    Button,
    TextField,
    Container,
    Image,
}

/// Semantics attached to a `View`. The headless runner flattens these into
/// `SemNode`s, which is how events are routed by label.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Semantics {
    pub role: Role,
    /// For buttons, the name that is announced.
    pub label: Option<String>,
    /// Current value of an editable node.
    pub value: Option<String>,
    pub focused: bool,
    pub enabled: bool,
}

impl Semantics {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            label: None,
            value: None,
            focused: false,
            enabled: true,
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}
