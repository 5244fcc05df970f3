//! Sample tools: a fake weather lookup and a kid-friendly joke teller

use assistants_core::{ParameterConfig, ToolDefinition, ToolResponse};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::json;

const CONDITIONS: [&str; 3] = ["sunny", "cloudy", "rainy"];

#[derive(Debug, Clone, Copy, Serialize)]
struct Joke {
    setup: &'static str,
    punchline: &'static str,
    category: &'static str,
}

const JOKES: [Joke; 5] = [
    Joke {
        setup: "Why don't scientists trust atoms?",
        punchline: "Because they make up everything!",
        category: "science",
    },
    Joke {
        setup: "What do you call a bear with no teeth?",
        punchline: "A gummy bear!",
        category: "animal",
    },
    Joke {
        setup: "Why did the math book look so sad?",
        punchline: "Because it had too many problems!",
        category: "school",
    },
    Joke {
        setup: "What do you call cheese that isn't yours?",
        punchline: "Nacho cheese!",
        category: "food",
    },
    Joke {
        setup: "Why can't a bicycle stand up by itself?",
        punchline: "It's two tired!",
        category: "general",
    },
];

#[derive(Debug, Deserialize)]
struct WeatherArgs {
    location: String,
}

#[derive(Debug, Default, Deserialize)]
struct JokeArgs {
    category: Option<String>,
}

fn random_weather() -> (u32, &'static str) {
    let mut rng = rand::thread_rng();
    let temperature = rng.gen_range(50..80);
    let condition = CONDITIONS.choose(&mut rng).copied().unwrap_or("sunny");
    (temperature, condition)
}

fn pick_joke(category: Option<&str>) -> Option<Joke> {
    let available: Vec<Joke> = JOKES
        .iter()
        .filter(|joke| category.map_or(true, |c| joke.category == c))
        .copied()
        .collect();
    available.choose(&mut rand::thread_rng()).copied()
}

pub fn weather_tool() -> ToolDefinition {
    ToolDefinition::from_fn(
        "get_weather",
        "Get the current weather for a location",
        |invocation| async move {
            let args: WeatherArgs = invocation.arguments()?;
            let (temperature, condition) = random_weather();

            ToolResponse::success(json!({
                "location": args.location,
                "temperature": temperature,
                "condition": condition,
            }))
            .with_presentation(format!(
                "The weather in {} is {}°F and {}",
                args.location, temperature, condition
            ))
            .to_json()
        },
    )
    .with_parameter(
        "location",
        ParameterConfig::string("The city and state, e.g. San Francisco, CA"),
        true,
    )
    .with_timeout(10.0)
}

pub fn joke_tool() -> ToolDefinition {
    ToolDefinition::from_fn(
        "random_joke_maker",
        "Get a random kid-friendly joke",
        |invocation| async move {
            let args: JokeArgs = invocation.arguments().unwrap_or_default();

            let response = match pick_joke(args.category.as_deref()) {
                Some(joke) => ToolResponse::default()
                    .with_field("joke", json!(joke))
                    .with_presentation(format!("{}\n\n{} 😄", joke.setup, joke.punchline)),
                None => ToolResponse::error("No jokes found for that category").with_presentation(
                    "No jokes available in that category. Try: animal, school, or food. \
                     Relay the message in the preferred language.",
                ),
            };
            response.to_json()
        },
    )
    .with_parameter(
        "category",
        ParameterConfig::string("Optional joke category (animal, school, food)"),
        false,
    )
    .with_timeout(5.0)
}
