use crate::error::ProviderError;
use crate::session::{Role, Turn};
use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    User,
    Model,
}

/// One turn of conversation as the provider sees it.
#[derive(Debug, Clone)]
pub struct ProviderMessage {
    pub role: MessageRole,
    pub text: String,
}

impl ProviderMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Model,
            text: text.into(),
        }
    }
}

impl From<&Turn> for ProviderMessage {
    fn from(turn: &Turn) -> Self {
        let role = match turn.role {
            Role::User => MessageRole::User,
            Role::Model => MessageRole::Model,
        };
        Self {
            role,
            text: turn.text.clone(),
        }
    }
}

#[async_trait]
pub trait Provider: Send + Sync {
    /// Generate the next model turn from the full linear history.
    ///
    /// The last message is expected to be the newest user turn.
    async fn generate(
        &self,
        history: &[ProviderMessage],
        model: &str,
        temperature: f64,
    ) -> Result<String, ProviderError>;

    fn name(&self) -> &str;
}
