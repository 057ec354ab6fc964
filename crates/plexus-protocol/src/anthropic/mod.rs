pub mod request;
pub mod response;
pub mod stream;
pub mod types;

pub use request::MessagesRequestBody;
pub use response::MessagesResponse;
pub use stream::MessagesStreamEvent;
pub use types::{AnthropicMessage, ContentBlock, Usage};
