//! Tool handlers and the per-session registry
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Host application                           │
//! │    ToolDefinition { name, schema, handler } │
//! └─────────────────────────────────────────────┘
//!           │ add / update / remove / upsert
//!           ▼
//! ┌─────────────────────────────────────────────┐
//! │  AssistantSession                           │
//! │    ToolRegistry (agreed tools)              │
//! │    ToolRelay (bind handlers, announce)      │
//! └─────────────────────────────────────────────┘
//!           │ RPC: update_tools / <tool name>
//!           ▼
//! ┌─────────────────────────────────────────────┐
//! │  Remote voice agent                         │
//! └─────────────────────────────────────────────┘
//! ```

mod handler;
mod registry;

pub use handler::{handler_fn, FnToolHandler, SharedToolHandler, ToolError, ToolHandler, ToolResult};
pub use registry::{RegistryError, RegistryResult, ToolRegistry};
