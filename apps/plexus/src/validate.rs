use plexus_protocol::anthropic::MessagesRequestBody;
use plexus_protocol::openai::ChatCompletionRequestBody;

use crate::error::ApiError;

pub fn validate_openai(body: &ChatCompletionRequestBody) -> Result<(), ApiError> {
    if body.messages.is_empty() {
        return Err(ApiError::invalid_request("At least one message is required"));
    }
    if let Some(temperature) = body.temperature {
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ApiError::invalid_request("temperature must be between 0 and 2"));
        }
    }
    Ok(())
}

pub fn validate_anthropic(body: &MessagesRequestBody) -> Result<(), ApiError> {
    if body.messages.is_empty() {
        return Err(ApiError::invalid_request("At least one message is required"));
    }
    if body.max_tokens <= 0 {
        return Err(ApiError::invalid_request("max_tokens must be positive"));
    }
    if let Some(temperature) = body.temperature {
        if !(0.0..=1.0).contains(&temperature) {
            return Err(ApiError::invalid_request("temperature must be between 0 and 1"));
        }
    }
    Ok(())
}
