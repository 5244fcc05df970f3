//! RPC relay to the agent participant
//!
//! The relay speaks two fixed methods on the agent:
//!
//! - `update_tools` with a `RegistryMutation` (`{"action": ..., "tools": [...]}`)
//! - `update_instructions` with `{"instructions": "..."}`
//!
//! and registers one local method per active tool, named exactly as the tool,
//! so the agent can invoke it.
//!
//! ```rust,ignore
//! let relay = ToolRelay::new(transport, logger);
//! relay.bind_handler(&tool).await?;
//! relay.announce(agent, &RegistryMutation::add([&tool])).await?;
//! ```

mod tool_relay;

pub use tool_relay::{RelayError, RelayResult, ToolRelay, DEFAULT_RESPONSE_TIMEOUT};
