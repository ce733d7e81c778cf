//! sw_install and sw_activate tool implementations.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_client::{ActivateReport, EventOutcome, InstallReport, LifecycleState, Worker, WorkerEvent};

use super::{json_result, unexpected};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct InstallOutput {
    #[serde(flatten)]
    pub report: InstallReport,
    /// Lifecycle state after the event.
    pub state: LifecycleState,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ActivateOutput {
    #[serde(flatten)]
    pub report: ActivateReport,
    pub state: LifecycleState,
}

pub async fn install_impl(worker: &Worker) -> Result<CallToolResult, McpError> {
    let report = match worker.dispatch(WorkerEvent::Install).await {
        EventOutcome::Installed(report) => report,
        other => return Err(unexpected(other)),
    };
    let state = worker.context().state().await;
    json_result(&InstallOutput { report, state })
}

pub async fn activate_impl(worker: &Worker) -> Result<CallToolResult, McpError> {
    let report = match worker.dispatch(WorkerEvent::Activate).await {
        EventOutcome::Activated(report) => report,
        other => return Err(unexpected(other)),
    };
    let state = worker.context().state().await;
    json_result(&ActivateOutput { report, state })
}
