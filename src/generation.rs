//! Prompt assembly for program generation.

use studio_provider::{ChatMessage, GenerationParams, GenerationRequest};

use crate::config::env_string_opt;

pub const GENERATION_MODEL_ENV: &str = "STUDIO_GENERATION_MODEL";
pub const GENERATION_PROVIDER_ENV: &str = "STUDIO_GENERATION_PROVIDER";

pub const DEFAULT_MODEL_ID: &str = "claude-3-haiku-20240307";
pub const DEFAULT_PROVIDER_ID: &str = "anthropic";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 2000;

pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are a senior software engineer specializing in Streamlit applications.

CRITICAL REQUIREMENTS:
1. You can ONLY generate Streamlit Python code. No other frameworks allowed.
2. All code must be Python 3.12 compatible and production-ready.
3. Always wrap code in markdown code blocks with ```python tag.

IMPLEMENTATION RULES:
- Output real, runnable code (no pseudocode or comments only)
- Include proper error handling where appropriate
- Use Streamlit best practices (st.cache_data, st.session_state, etc.)
- Create complete, working applications
- Keep code clean and well-structured

EXAMPLE CODE STRUCTURE:
```python
import streamlit as st

st.title("Your App Title")

# Your application code here
# Use st.sidebar for controls
# Use st.columns for layout
# Add interactivity with st.button, st.slider, etc.
```

If user requests non-Streamlit frameworks (React, Vue, HTML, etc.), politely inform them that you can only create Streamlit applications."#;

/// What a finished generation produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOutcome {
    /// Full assistant reply, for the transcript.
    pub reply: String,
    /// Program extracted from the reply.
    pub code: String,
    /// Whether `code` replaced the document. Empty extractions are not applied.
    pub applied: bool,
    pub model_id: String,
    pub provider_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    pub model_id: String,
    pub provider_id: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub system_prompt: String,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model_id: DEFAULT_MODEL_ID.to_string(),
            provider_id: DEFAULT_PROVIDER_ID.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

impl GenerationSettings {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            model_id: env_string_opt(GENERATION_MODEL_ENV)
                .map(|value| value.trim().to_string())
                .unwrap_or(defaults.model_id),
            provider_id: env_string_opt(GENERATION_PROVIDER_ENV)
                .map(|value| value.trim().to_string())
                .unwrap_or(defaults.provider_id),
            ..defaults
        }
    }

    /// `[system, user]` conversation for one prompt.
    #[must_use]
    pub fn request_for(&self, prompt: &str) -> GenerationRequest {
        GenerationRequest {
            messages: vec![
                ChatMessage::system(self.system_prompt.clone()),
                ChatMessage::user(prompt),
            ],
            params: GenerationParams {
                model_id: self.model_id.clone(),
                provider_id: self.provider_id.clone(),
                temperature: self.temperature,
                max_tokens: self.max_tokens,
            },
        }
    }
}
