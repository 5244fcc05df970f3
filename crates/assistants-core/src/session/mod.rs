//! Assistant tool session
//!
//! An [`AssistantSession`] owns the tool registry for one room. It follows the
//! room's events to find the agent participant, performs the initial tool sync
//! when the agent appears, and applies host mutations as compensated sagas
//! (see the `saga` module).
//!
//! ```rust,ignore
//! let session = AssistantSession::builder(room.clone())
//!     .with_initial_tools([weather_tool()])
//!     .on_tools_change(|tools| println!("{} tools", tools.len()))
//!     .build();
//!
//! tokio::spawn(async move { session.run(room.subscribe()).await });
//! ```

mod assistant_session;
mod error;
mod saga;
mod state;

pub use assistant_session::{
    AssistantSession, ConnectionChangeCallback, SessionBuilder, ToolsChangeCallback,
};
pub use error::{SessionError, SessionResult};
pub use state::{select_agent, SessionPhase, SessionStatus};
