//! Model invocation contract shared by every stage.

use std::future::Future;
use std::time::Duration;

use crate::error::ModelError;

/// Sampling settings sent alongside a prompt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

/// One self-contained prompt. The prompt text is sent exactly as given.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    pub prompt: String,
    pub settings: GenerationSettings,
}

/// Raw text returned by the model, unprocessed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelOutput {
    pub text: String,
}

/// A synchronous call-and-response text-completion service.
///
/// Implementations must not cache across calls or rewrite the prompt; each
/// call is independent. A returned error is a hard failure for the calling
/// stage, never partial data.
pub trait ModelClient: Send + Sync {
    fn invoke(
        &self,
        request: &ModelRequest,
    ) -> impl Future<Output = Result<ModelOutput, ModelError>> + Send;
}

impl<M: ModelClient> ModelClient for &M {
    fn invoke(
        &self,
        request: &ModelRequest,
    ) -> impl Future<Output = Result<ModelOutput, ModelError>> + Send {
        (**self).invoke(request)
    }
}

impl<M: ModelClient> ModelClient for std::sync::Arc<M> {
    fn invoke(
        &self,
        request: &ModelRequest,
    ) -> impl Future<Output = Result<ModelOutput, ModelError>> + Send {
        (**self).invoke(request)
    }
}

/// Run one invocation bounded by `deadline`.
///
/// # Errors
///
/// Returns [`ModelError::Timeout`] if the deadline elapses, otherwise whatever
/// the client returns.
pub(crate) async fn invoke_with_deadline<M: ModelClient>(
    client: &M,
    request: &ModelRequest,
    deadline: Duration,
) -> Result<ModelOutput, ModelError> {
    match tokio::time::timeout(deadline, client.invoke(request)).await {
        Ok(result) => result,
        Err(_) => Err(ModelError::Timeout {
            millis: u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
        }),
    }
}
