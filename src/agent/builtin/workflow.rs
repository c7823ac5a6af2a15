use std::sync::Arc;

use async_stream::stream;
use async_trait::async_trait;
use futures::StreamExt;

use crate::agent::{
    Agent, AgentProfile, AgentServices, CardFlags, MessageRequest, RecordStream,
};
use crate::error::{AgentStudioError, Result};
use crate::workflow::{RunnerPhase, WorkflowRunner};

/// Agent whose message pipeline is a [`WorkflowRunner`].
pub struct WorkflowAgent {
    profile: AgentProfile,
    runner: Arc<WorkflowRunner>,
    services: AgentServices,
}

impl WorkflowAgent {
    pub fn new(profile: AgentProfile, runner: Arc<WorkflowRunner>, services: AgentServices) -> Self {
        Self {
            profile,
            runner,
            services,
        }
    }

    pub fn runner(&self) -> &Arc<WorkflowRunner> {
        &self.runner
    }

    pub fn services(&self) -> &AgentServices {
        &self.services
    }
}

#[async_trait]
impl Agent for WorkflowAgent {
    fn name(&self) -> &'static str {
        "workflow_agent"
    }

    fn profile(&self) -> AgentProfile {
        self.profile.clone()
    }

    async fn setup_resources(&self) -> Result<()> {
        self.runner.ensure_initialized().await;
        Ok(())
    }

    fn process_message<'a>(&'a self, request: MessageRequest) -> RecordStream<'a> {
        Box::pin(stream! {
            let mut records = self
                .runner
                .stream(&request.query, &request.session_id, request.context.clone());
            while let Some(record) = records.next().await {
                yield Ok::<_, AgentStudioError>(record);
            }
        })
    }

    fn card_flags(&self) -> CardFlags {
        CardFlags {
            workflow_enabled: self.runner.graph_capable()
                && self.runner.phase() != RunnerPhase::ReadyFallback,
            llm_enabled: self.services.has_llm(),
            mcp_enabled: self.runner.config().mcp.enabled,
        }
    }
}
