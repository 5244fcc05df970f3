//! Scripted agent run against an in-memory room

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use assistants_core::logging::SharedLogger;
use assistants_core::{log_info, log_warn, AssistantSession, LoopbackRoom, SessionConfig};
use serde_json::json;

use crate::tools;

const AGENT_IDENTITY: &str = "assistant-agent";

async fn wait_for_agent(session: &AssistantSession) -> Result<(), Box<dyn Error>> {
    tokio::time::timeout(Duration::from_secs(2), async {
        while session.agent_identity().is_none() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .map_err(|_| "agent did not appear in the room")?;
    Ok(())
}

fn tool_call(arguments: serde_json::Value) -> String {
    json!({ "arguments": { "raw_arguments": arguments } }).to_string()
}

/// Connect, let the agent use the tools, toggle one off and on, then hang up
pub async fn run(
    config: &SessionConfig,
    logger: SharedLogger,
    instructions: Option<String>,
) -> Result<(), Box<dyn Error>> {
    let room = Arc::new(LoopbackRoom::with_logger(config.participant_name.clone(), logger.clone()));
    let events = room.subscribe();

    let session = Arc::new(
        AssistantSession::builder(room.clone())
            .with_config(config)
            .with_logger(logger.clone())
            .with_initial_tools([tools::weather_tool()])
            .on_tools_change(|tools| {
                let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
                println!("Active tools: [{}]", names.join(", "));
            })
            .on_connection_change(|connected, agent| {
                println!("Connected: {}, agent: {}", connected, agent.unwrap_or("none"));
            })
            .build(),
    );

    let driver = tokio::spawn({
        let session = session.clone();
        async move { session.run(events).await }
    });

    room.connect();
    room.join_agent(AGENT_IDENTITY);
    wait_for_agent(&session).await?;

    let reply = room
        .invoke_local("get_weather", tool_call(json!({ "location": "San Francisco, CA" })))
        .await?;
    println!("get_weather -> {}", reply);

    session.add_tool(tools::joke_tool()).await?;
    let reply = room
        .invoke_local("random_joke_maker", tool_call(json!({ "category": "food" })))
        .await?;
    println!("random_joke_maker -> {}", reply);

    if let Some(instructions) = instructions {
        session.update_instruction(&instructions).await?;
        log_info!(logger, "[Demo] Instructions sent to {}", AGENT_IDENTITY);
    }

    session.remove_tool("random_joke_maker").await?;

    room.fail_next_rpc("agent is busy");
    if let Err(e) = session.add_tool(tools::joke_tool()).await {
        log_warn!(logger, "[Demo] Add was rejected and rolled back: {}", e);
    }
    println!("Tools after rejected add: {:?}", session.tool_names());

    room.disconnect();
    driver.await?;

    println!("Calls sent to the agent:");
    for call in room.calls() {
        println!("  {} {}", call.method, call.payload);
    }
    Ok(())
}
