use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::Result;

/// 外部工具：名称 + 参数输入，映射输出
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &str {
        ""
    }

    async fn call(&self, parameters: Map<String, Value>) -> Result<Map<String, Value>>;
}
