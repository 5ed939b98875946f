use crate::types::NodeId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BrowserError {
    #[error("Protocol call {method} failed: {detail}")]
    Protocol { method: String, detail: String },

    #[error("Document is not loaded")]
    DocumentNotLoaded,

    #[error("Malformed protocol response: {0}")]
    MalformedResponse(String),

    #[error("Node {0} has no box model")]
    NoBoxModel(NodeId),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Browser launch failed: {0}")]
    LaunchFailed(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Anyhow error: {0}")]
    AnyhowError(String),
}

pub type Result<T> = std::result::Result<T, BrowserError>;

impl From<anyhow::Error> for BrowserError {
    fn from(err: anyhow::Error) -> Self {
        BrowserError::AnyhowError(err.to_string())
    }
}

impl BrowserError {
    pub fn protocol<E: std::fmt::Display>(method: &str, err: E) -> Self {
        BrowserError::Protocol {
            method: method.to_string(),
            detail: err.to_string(),
        }
    }

    /// True for failures of the remote protocol itself, as opposed to
    /// connection setup, configuration or scenario expectations.
    pub fn is_protocol(&self) -> bool {
        matches!(
            self,
            BrowserError::Protocol { .. }
                | BrowserError::DocumentNotLoaded
                | BrowserError::MalformedResponse(_)
                | BrowserError::NoBoxModel(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_classification() {
        assert!(BrowserError::protocol("DOM.focus", "node is not focusable").is_protocol());
        assert!(BrowserError::DocumentNotLoaded.is_protocol());
        assert!(BrowserError::NoBoxModel(NodeId(4)).is_protocol());
        assert!(!BrowserError::AssertionFailed("3 items".into()).is_protocol());
        assert!(!BrowserError::LaunchFailed("no chrome".into()).is_protocol());
    }

    #[test]
    fn protocol_error_message_names_method() {
        let err = BrowserError::protocol("DOM.getBoxModel", "Could not compute box model.");
        assert_eq!(
            err.to_string(),
            "Protocol call DOM.getBoxModel failed: Could not compute box model."
        );
    }
}
