use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::error::Result;
use crate::tools::tool::Tool;

pub struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &'static str {
        "echo"
    }

    fn description(&self) -> &str {
        "returns its parameters unchanged"
    }

    async fn call(&self, parameters: Map<String, Value>) -> Result<Map<String, Value>> {
        let mut result = Map::new();
        result.insert("echo".into(), Value::Object(parameters));
        Ok(result)
    }
}

/// 文本增强：基础统计信息
pub struct TextEnhancerTool;

#[async_trait]
impl Tool for TextEnhancerTool {
    fn name(&self) -> &'static str {
        "text_enhancer"
    }

    fn description(&self) -> &str {
        "computes word, sentence and character statistics for `text`"
    }

    async fn call(&self, parameters: Map<String, Value>) -> Result<Map<String, Value>> {
        let text = parameters.get("text").and_then(Value::as_str).unwrap_or_default();
        let words = text.split_whitespace().count();
        let sentences = text
            .split(['.', '!', '?'])
            .filter(|s| !s.trim().is_empty())
            .count();
        let exclamations = text.matches('!').count();

        let mut result = Map::new();
        result.insert("word_count".into(), json!(words));
        result.insert("sentence_count".into(), json!(sentences));
        result.insert("char_count".into(), json!(text.chars().count()));
        result.insert("exclamations".into(), json!(exclamations));
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn text_enhancer_counts() {
        let mut params = Map::new();
        params.insert("text".into(), json!("I love this! It works. Great"));
        let out = TextEnhancerTool.call(params).await.unwrap();
        assert_eq!(out["word_count"], json!(6));
        assert_eq!(out["sentence_count"], json!(3));
        assert_eq!(out["exclamations"], json!(1));
    }
}
