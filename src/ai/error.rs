#[derive(Debug, thiserror::Error)]
pub enum AiError {
    /// Checked before any request is built
    #[error("AI service is not enabled or API key is not configured")]
    NotEnabled,

    #[error("AI request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("AI service returned {code}: {body}")]
    Status { code: u16, body: String },

    #[error("No response from AI service")]
    EmptyResponse,

    #[error("Failed to decode AI response: {0}")]
    Decode(String),
}

impl AiError {
    /// Whether the caller should fix settings rather than retry
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            AiError::NotEnabled | AiError::Status { code: 401 | 403, .. }
        )
    }
}
