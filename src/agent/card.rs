use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Static description an agent gives of itself.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AgentProfile {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default = "default_modalities")]
    pub supported_modalities: Vec<String>,
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_modalities() -> Vec<String> {
    vec!["text".to_string(), "json".to_string()]
}

fn default_version() -> String {
    "1.0.0".to_string()
}

impl AgentProfile {
    pub fn new<N: Into<String>, D: Into<String>>(name: N, description: D) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            capabilities: Vec::new(),
            supported_modalities: default_modalities(),
            version: default_version(),
        }
    }

    pub fn with_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capabilities = capabilities.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_modalities<I, S>(mut self, modalities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.supported_modalities = modalities.into_iter().map(Into::into).collect();
        self
    }
}

/// Availability flags advertised on the card.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CardFlags {
    pub workflow_enabled: bool,
    pub llm_enabled: bool,
    pub mcp_enabled: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AgentEndpoints {
    pub tasks: String,
    pub status: String,
    pub messages: String,
}

impl AgentEndpoints {
    pub fn for_agent(agent_id: &str) -> Self {
        Self {
            tasks: format!("/agents/{agent_id}/tasks"),
            status: format!("/agents/{agent_id}/status"),
            messages: format!("/agents/{agent_id}/messages"),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CardMetadata {
    #[serde(flatten)]
    pub flags: CardFlags,
    pub created_at: DateTime<Utc>,
}

/// Agent 发现文档
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AgentCard {
    pub agent_id: String,
    pub name: String,
    pub description: String,
    pub capabilities: Vec<String>,
    pub supported_modalities: Vec<String>,
    pub version: String,
    pub endpoints: AgentEndpoints,
    pub metadata: CardMetadata,
}

impl AgentCard {
    pub fn new(agent_id: &str, profile: AgentProfile, flags: CardFlags) -> Self {
        Self {
            agent_id: agent_id.to_string(),
            name: profile.name,
            description: profile.description,
            capabilities: profile.capabilities,
            supported_modalities: profile.supported_modalities,
            version: profile.version,
            endpoints: AgentEndpoints::for_agent(agent_id),
            metadata: CardMetadata {
                flags,
                created_at: Utc::now(),
            },
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ClientCapabilities {
    #[serde(default)]
    pub modalities: Vec<String>,
}

impl ClientCapabilities {
    pub fn new<I, S>(modalities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            modalities: modalities.into_iter().map(Into::into).collect(),
        }
    }
}

/// 能力协商结果
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Negotiation {
    pub agreed_modalities: Vec<String>,
    pub agent_capabilities: Vec<String>,
    pub workflow_available: bool,
    pub protocol_version: String,
}

/// Sorted intersection of both modality sets. An empty result is a valid
/// outcome, not an error.
pub fn intersect_modalities(agent: &[String], client: &[String]) -> Vec<String> {
    let agent: BTreeSet<&str> = agent.iter().map(String::as_str).collect();
    client
        .iter()
        .map(String::as_str)
        .filter(|modality| agent.contains(modality))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub payload: Map<String, Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Artifact {
    pub id: String,
    #[serde(rename = "type", default)]
    pub artifact_type: String,
    #[serde(default)]
    pub content: Value,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ArtifactReceipt {
    pub artifact_id: String,
    pub processed: bool,
    pub processor_agent: String,
    pub processed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn intersection_keeps_shared_modalities() {
        let agreed = intersect_modalities(&strings(&["text", "json"]), &strings(&["json", "file"]));
        assert_eq!(agreed, strings(&["json"]));
    }

    #[test]
    fn disjoint_sets_agree_on_nothing() {
        let agreed = intersect_modalities(&strings(&["text"]), &strings(&["image", "image"]));
        assert!(agreed.is_empty());
    }

    #[test]
    fn card_flattens_flags_into_metadata() {
        let profile = AgentProfile::new("Echo", "echoes").with_capabilities(["echo"]);
        let card = AgentCard::new(
            "echo-1",
            profile,
            CardFlags {
                workflow_enabled: true,
                ..CardFlags::default()
            },
        );
        let value = serde_json::to_value(&card).unwrap();
        assert_eq!(value["endpoints"]["tasks"], json!("/agents/echo-1/tasks"));
        assert_eq!(value["metadata"]["workflow_enabled"], json!(true));
        assert_eq!(value["metadata"]["llm_enabled"], json!(false));
        assert_eq!(value["supported_modalities"], json!(["text", "json"]));
        assert_eq!(value["version"], json!("1.0.0"));
    }
}
