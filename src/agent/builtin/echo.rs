use futures::stream::{self, StreamExt};
use serde_json::Value;
use tracing::info;

use crate::agent::{Agent, AgentProfile, MessageRequest, RecordStream, ResultRecord};

/// 演示用回显 Agent
pub struct EchoAgent {
    display_name: String,
}

impl EchoAgent {
    pub fn new<T: Into<String>>(display_name: T) -> Self {
        Self {
            display_name: display_name.into(),
        }
    }

    fn conversation(&self, query: &str) -> Vec<ResultRecord> {
        let hello = ResultRecord::success(format!(
            "Hello! I'm {}. You said: '{query}'",
            self.display_name
        ));
        let lower = query.to_lowercase();
        let (step, content) = if lower.contains("weather") {
            (
                "weather_response",
                "I understand you're asking about weather. I'm a simple demo agent, so I can't provide real weather data, but I can help with other tasks!".to_string(),
            )
        } else if is_greeting(&lower) {
            (
                "greeting_response",
                "Nice to meet you! I'm excited to help. What would you like to do?".to_string(),
            )
        } else {
            (
                "general_response",
                format!("I processed your message about '{query}'. This is a demo agent that echoes your input and provides friendly responses."),
            )
        };
        vec![hello, ResultRecord::success(content).with_metadata("step", step)]
    }
}

impl Default for EchoAgent {
    fn default() -> Self {
        Self::new("echo")
    }
}

fn is_greeting(lower: &str) -> bool {
    lower
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| word == "hello" || word == "hi")
}

impl Agent for EchoAgent {
    fn name(&self) -> &'static str {
        "echo"
    }

    fn profile(&self) -> AgentProfile {
        AgentProfile::new("Echo Agent", "Demo agent that echoes input and answers greetings")
            .with_capabilities([
                "message_processing",
                "streaming",
                "friendly_conversation",
                "echo_responses",
            ])
    }

    fn process_message<'a>(&'a self, request: MessageRequest) -> RecordStream<'a> {
        info!(agent = %self.display_name, query = %request.query, "processing message");
        let records = match request.task_type() {
            Some("echo") => {
                let message = request
                    .task_parameters()
                    .and_then(|params| params.get("message"))
                    .map(|value| match value {
                        Value::String(text) => text.clone(),
                        other => other.to_string(),
                    })
                    .unwrap_or_else(|| request.query.clone());
                vec![ResultRecord::success(format!("Echo: {message}")).with_metadata("step", "echo_task")]
            }
            Some("greeting") => vec![ResultRecord::success(format!(
                "Hello from {}! Nice to meet you.",
                self.display_name
            ))
            .with_metadata("step", "greeting_task")],
            _ => self.conversation(&request.query),
        };
        stream::iter(records.into_iter().map(Ok)).boxed()
    }
}
