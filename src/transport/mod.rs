//! TCP transport for the two service channels.
//!
//! - Request channel: newline-delimited JSON, one reply line per request line.
//! - Publish channel: newline-delimited JSON notifications pushed to every
//!   connected subscriber. Subscribers never write.

pub mod client;
pub mod publish;
pub mod request;

pub use client::{send_request, Subscription};
pub use publish::{BroadcastPublisher, PublishServer, Publisher};
pub use request::RequestServer;
