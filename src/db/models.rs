use serde::{Deserialize, Serialize};

/// A saved suggestion plus the student's reflection.
/// Identity is the position in the activity list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Activity {
    pub text: String,
    #[serde(default)]
    pub reflection: String,
}

impl Activity {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            reflection: String::new(),
        }
    }
}
