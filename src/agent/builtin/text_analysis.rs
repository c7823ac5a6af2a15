use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::agent::{AgentServices, ResultRecord};
use crate::error::{AgentStudioError, Result};
use crate::llm::LlmOptions;
use crate::workflow::{node_fn, pure_node, ExecutionState, GraphBuilder, Workflow, WorkflowGraph};

const EXTRACT_NODE: &str = "extract_text";
const LLM_NODE: &str = "llm_analysis";
const TOOL_NODE: &str = "tool_enhancement";
const FORMAT_NODE: &str = "format_response";

/// Text analysis pipeline: extract, LLM analysis, tool enhancement, format.
/// Each external call degrades to an `error` entry instead of failing the run.
pub struct TextAnalysisWorkflow {
    agent_id: String,
    services: AgentServices,
    temperature: f32,
}

impl TextAnalysisWorkflow {
    pub fn new<T: Into<String>>(agent_id: T, services: AgentServices, temperature: f32) -> Self {
        Self {
            agent_id: agent_id.into(),
            services,
            temperature,
        }
    }
}

#[async_trait]
impl Workflow for TextAnalysisWorkflow {
    fn workflow_id(&self) -> &str {
        "text_analysis"
    }

    fn build_graph(&self) -> Option<WorkflowGraph> {
        let llm_services = self.services.clone();
        let tool_services = self.services.clone();
        let temperature = self.temperature;
        let agent_id = self.agent_id.clone();

        let graph = GraphBuilder::new(self.workflow_id())
            .add_node(EXTRACT_NODE, pure_node(extract_text))
            .add_node(
                LLM_NODE,
                node_fn(move |state| analyze_with_llm(llm_services.clone(), temperature, state)),
            )
            .add_node(
                TOOL_NODE,
                node_fn(move |state| enhance_with_tools(tool_services.clone(), state)),
            )
            .add_node(
                FORMAT_NODE,
                pure_node(move |state| format_response(&agent_id, state)),
            )
            .connect(EXTRACT_NODE, LLM_NODE)
            .connect(LLM_NODE, TOOL_NODE)
            .connect(TOOL_NODE, FORMAT_NODE)
            .set_entry(EXTRACT_NODE)
            .set_finish(FORMAT_NODE)
            .build();
        Some(graph)
    }

    async fn process_query(
        &self,
        query: &str,
        _session_id: &str,
        _context: &Map<String, Value>,
    ) -> Result<ResultRecord> {
        let options = LlmOptions::default().with_temperature(self.temperature);
        match self.services.llm_call(query, options).await {
            Ok(text) => Ok(ResultRecord::success(text).with_metadata("agent_id", self.agent_id.as_str())),
            Err(AgentStudioError::LlmUnavailable) => Ok(ResultRecord::success(format!(
                "Received {} characters of text; no LLM is configured for analysis.",
                query.chars().count()
            ))
            .with_metadata("agent_id", self.agent_id.as_str())),
            Err(error) => Err(error),
        }
    }
}

fn text_input(state: &ExecutionState) -> String {
    state
        .value("text_input")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn extract_text(mut state: ExecutionState) -> ExecutionState {
    let text = state.query.trim().to_string();
    let preview: String = text.chars().take(50).collect();
    info!(preview = %preview, "extracting text");

    let mut details = Map::new();
    details.insert("text_length".into(), json!(text.chars().count()));
    state.record_step(EXTRACT_NODE, details);
    state.set_content(format!("📝 Extracted {} characters", text.chars().count()));
    state.set_value("text_input", text);
    state
}

async fn analyze_with_llm(
    services: AgentServices,
    temperature: f32,
    mut state: ExecutionState,
) -> Result<ExecutionState> {
    let text = text_input(&state);
    let analysis = if text.is_empty() {
        json!({ "error": "No text to analyze" })
    } else {
        let prompt = format!(
            "Analyze the following text and provide:\n\
             1. Sentiment (positive/negative/neutral)\n\
             2. Key entities mentioned\n\
             3. Main topics\n\
             4. Confidence score (0-1)\n\n\
             Text: {text}\n\n\
             Respond in JSON format."
        );
        let options = LlmOptions::default().with_temperature(temperature);
        match services.llm_call(&prompt, options).await {
            Ok(response) => {
                let mut analysis = serde_json::from_str::<Value>(&response)
                    .ok()
                    .and_then(|value| value.as_object().cloned())
                    .unwrap_or_default();
                analysis.insert("llm_response".into(), Value::String(response));
                analysis.insert("analyzed_text_length".into(), json!(text.chars().count()));
                Value::Object(analysis)
            }
            Err(error) => {
                warn!(error = %error, "LLM analysis failed");
                state.record_error(error.to_string());
                json!({ "error": error.to_string() })
            }
        }
    };

    let mut details = Map::new();
    details.insert("succeeded".into(), json!(analysis.get("error").is_none()));
    state.record_step(LLM_NODE, details);
    state.set_content("🧠 LLM analysis finished");
    state.set_value(LLM_NODE, analysis);
    Ok(state)
}

async fn enhance_with_tools(
    services: AgentServices,
    mut state: ExecutionState,
) -> Result<ExecutionState> {
    let mut parameters = Map::new();
    parameters.insert("text".into(), Value::String(text_input(&state)));
    parameters.insert(
        "initial_analysis".into(),
        state.value(LLM_NODE).cloned().unwrap_or(Value::Null),
    );

    let enhancement = match services.tool_call("text_enhancer", parameters).await {
        Ok(result) => json!({
            "tool_result": result,
            "enhancement_type": "detailed_analysis",
        }),
        Err(error) => {
            warn!(error = %error, "tool enhancement failed");
            json!({ "error": error.to_string(), "fallback": true })
        }
    };

    let mut details = Map::new();
    details.insert("fallback".into(), json!(enhancement.get("error").is_some()));
    state.record_step(TOOL_NODE, details);
    state.set_content("🔧 Tool enhancement finished");
    state.set_value(TOOL_NODE, enhancement);
    Ok(state)
}

fn format_response(agent_id: &str, mut state: ExecutionState) -> ExecutionState {
    let text = text_input(&state);
    let analysis = state.value(LLM_NODE).cloned().unwrap_or(Value::Null);
    let enhancement = state.value(TOOL_NODE).cloned().unwrap_or(Value::Null);

    let sentiment = analysis
        .get("sentiment")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string();
    let entities: Vec<String> = analysis
        .get("entities")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    let confidence = analysis
        .get("confidence")
        .and_then(Value::as_f64)
        .unwrap_or(0.0);
    let tool_enhanced = !enhancement.is_null() && enhancement.get("error").is_none();

    let final_result = json!({
        "input_text": text,
        "analysis": {
            "sentiment": sentiment,
            "entities": entities,
            "confidence": confidence,
        },
        "enhancement": {
            "tool_available": tool_enhanced,
            "tool_result": enhancement.get("tool_result").cloned().unwrap_or(Value::Null),
        },
        "metadata": {
            "agent_id": agent_id,
            "workflow_completed": true,
            "processing_steps": [LLM_NODE, TOOL_NODE, "formatting"],
        },
    });

    let preview: String = text.chars().take(100).collect();
    let content = format!(
        "Text Analysis Complete:\n\n\
         📝 Text: {preview}\n\
         😊 Sentiment: {sentiment}\n\
         🏷️  Entities: {}\n\
         📊 Confidence: {confidence:.2}\n\
         🔧 Tool Enhanced: {tool_enhanced}",
        entities.join(", ")
    );

    state.record_step(FORMAT_NODE, Map::new());
    state.set_value("final_result", final_result);
    state.set_content(content);
    state
}
