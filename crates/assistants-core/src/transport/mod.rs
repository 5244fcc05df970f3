//! Room transport seam
//!
//! The real-time room library (connection lifecycle, media, signaling and the
//! RPC call/response primitive) lives outside this crate. `RoomTransport` is
//! the part of it the session talks to, and `LoopbackRoom` is an in-memory
//! implementation for tests and the demo.

mod error;
mod loopback;
mod traits;

pub use error::{TransportError, TransportResult, APPLICATION_ERROR_CODE, UNSUPPORTED_METHOD_CODE};
pub use loopback::{LoopbackRoom, RecordedCall, RpcBehavior};
pub use traits::{
    ConnectionState, ParticipantInfo, ParticipantKind, RoomEvent, RoomTransport, RpcHandler,
    RpcRequest,
};
