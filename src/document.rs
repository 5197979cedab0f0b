//! In-memory program text with its dirty flag.

pub const DEFAULT_TEMPLATE: &str = "import streamlit as st

st.title(\"Welcome to AI Studio\")
st.write(\"Generate your Streamlit app using AI!\")

# Your code here
";

/// The authored program plus whether it has diverged from the last value
/// known to be safe (durably persisted or accepted by the sandbox).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    text: String,
    dirty: bool,
    baseline: String,
}

impl Document {
    /// A document whose text is already safe, e.g. freshly loaded from storage.
    #[must_use]
    pub fn clean(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            baseline: text.clone(),
            text,
            dirty: false,
        }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Replaces the text. Returns `false` when `text` equals the current text.
    ///
    /// Returning to the saved baseline leaves `dirty` as it was.
    pub fn set_text(&mut self, text: &str) -> bool {
        if text == self.text {
            return false;
        }

        self.text = text.to_string();
        if self.text != self.baseline {
            self.dirty = true;
        }
        true
    }

    /// Records that `text` reached durable storage.
    pub fn mark_persisted(&mut self, text: &str) {
        self.mark_safe(text);
    }

    /// Records that `text` was accepted by the sandbox.
    pub fn mark_synced(&mut self, text: &str) {
        self.mark_safe(text);
    }

    fn mark_safe(&mut self, text: &str) {
        self.baseline = text.to_string();
        if self.text == text {
            self.dirty = false;
        }
    }
}
