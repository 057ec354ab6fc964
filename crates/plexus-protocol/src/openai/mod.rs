pub mod request;
pub mod response;
pub mod stream;
pub mod types;

pub use request::ChatCompletionRequestBody;
pub use response::ChatCompletionResponse;
pub use stream::ChatCompletionChunk;
pub use types::{ChatMessage, ChatRole, Choice, Delta, ToolCallDelta, Usage};
