//! Session credentials for a realtime assistant
//!
//! Before joining a room the host asks the assistants API for a token and
//! the room's WebSocket URL:
//!
//! - `POST {api_base}/v1/realtime-assistants/{id}/createPublicSession` for
//!   assistants with public access
//! - `POST {api_base}/v1/realtime-assistants/{id}/createSession` with a bearer
//!   API key for private ones
//!
//! Both take `{"participantName": ...}` and answer `{"token", "wsUrl"}`.

mod client;
mod error;

pub use client::{SessionCredentials, SessionIssuer, CREATE_PUBLIC_SESSION, CREATE_SESSION};
pub use error::{IssueError, IssueResult};
