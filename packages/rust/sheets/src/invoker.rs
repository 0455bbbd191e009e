//! Action-invocation adapters for the automation service.
//!
//! Automation clients have shipped the same "run this tool action" capability
//! under different entry points. Each [`InvokeMethod`] is one such entry point
//! and knows how to shape a request for it. An [`ActionBackend`] reports which
//! entry points it actually exposes; [`ActionInvoker::resolve`] picks the first
//! exposed one in priority order, once, at construction.

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use serde_json::{Value, json};

use leadscout_shared::{LeadScoutError, Result};

// ---------------------------------------------------------------------------
// InvokeMethod
// ---------------------------------------------------------------------------

/// Known entry points for running an action, highest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvokeMethod {
    /// `execute_action(action, params)`; v1 REST family.
    ExecuteAction,
    /// `actions.execute(action, params)`; v2 REST family.
    ActionsExecute,
    /// `tools.execute(slug, arguments)`; v3 REST family.
    ToolsExecute,
}

impl InvokeMethod {
    /// Resolution order.
    pub const PRIORITY: [InvokeMethod; 3] = [
        InvokeMethod::ExecuteAction,
        InvokeMethod::ActionsExecute,
        InvokeMethod::ToolsExecute,
    ];

    /// Method name as it appears on the client surface and in config.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExecuteAction => "execute_action",
            Self::ActionsExecute => "actions.execute",
            Self::ToolsExecute => "tools.execute",
        }
    }

    /// Endpoint path and JSON body for running `action` of `tool` with `params`.
    pub fn request(&self, tool: &str, action: &str, params: Value) -> (String, Value) {
        match self {
            Self::ExecuteAction => (
                format!("/api/v1/actions/{action}/execute"),
                json!({ "appName": tool, "input": params }),
            ),
            Self::ActionsExecute => (
                format!("/api/v2/actions/{action}/execute"),
                json!({ "appName": tool, "input": params }),
            ),
            Self::ToolsExecute => (
                format!("/api/v3/tools/execute/{action}"),
                json!({ "toolkit": tool, "arguments": params }),
            ),
        }
    }
}

impl fmt::Display for InvokeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvokeMethod {
    type Err = LeadScoutError;

    fn from_str(s: &str) -> Result<Self> {
        Self::PRIORITY
            .into_iter()
            .find(|m| m.as_str() == s.trim())
            .ok_or_else(|| {
                LeadScoutError::config(format!(
                    "unknown invocation method '{s}': expected one of execute_action, actions.execute, tools.execute"
                ))
            })
    }
}

// ---------------------------------------------------------------------------
// Backend surface
// ---------------------------------------------------------------------------

/// The raw automation client: which entry points exist, and a way to call one.
pub trait ActionBackend: Send + Sync {
    /// Whether `method` exists on this client.
    fn exposes(&self, method: InvokeMethod) -> bool;

    /// Run `action` of `tool` through `method`. Only called for exposed methods.
    fn call(
        &self,
        method: InvokeMethod,
        tool: &str,
        action: &str,
        params: Value,
    ) -> impl Future<Output = Result<Value>> + Send;
}

// ---------------------------------------------------------------------------
// Resolved invoker
// ---------------------------------------------------------------------------

/// A backend bound to the single entry point chosen for it.
#[derive(Debug)]
pub struct ActionInvoker<B> {
    backend: B,
    method: InvokeMethod,
}

impl<B: ActionBackend> ActionInvoker<B> {
    /// Select the first exposed method in [`InvokeMethod::PRIORITY`] order.
    pub fn resolve(backend: B) -> Result<Self> {
        let method = InvokeMethod::PRIORITY
            .into_iter()
            .find(|m| backend.exposes(*m))
            .ok_or_else(|| LeadScoutError::Capability {
                candidates: InvokeMethod::PRIORITY
                    .iter()
                    .map(|m| m.as_str().to_string())
                    .collect(),
            })?;

        tracing::debug!(%method, "resolved automation invocation method");
        Ok(Self { backend, method })
    }

    /// The entry point every call goes through.
    pub fn method(&self) -> InvokeMethod {
        self.method
    }

    #[cfg(test)]
    pub(crate) fn backend(&self) -> &B {
        &self.backend
    }

    /// Run `action` of `tool` with `params`.
    pub async fn invoke(&self, tool: &str, action: &str, params: Value) -> Result<Value> {
        self.backend.call(self.method, tool, action, params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Surface(Vec<InvokeMethod>);

    impl ActionBackend for Surface {
        fn exposes(&self, method: InvokeMethod) -> bool {
            self.0.contains(&method)
        }

        async fn call(
            &self,
            method: InvokeMethod,
            _tool: &str,
            action: &str,
            _params: Value,
        ) -> Result<Value> {
            Ok(json!({ "via": method.as_str(), "action": action }))
        }
    }

    #[test]
    fn highest_priority_exposed_method_wins() {
        let all = ActionInvoker::resolve(Surface(InvokeMethod::PRIORITY.to_vec())).unwrap();
        assert_eq!(all.method(), InvokeMethod::ExecuteAction);

        let later = ActionInvoker::resolve(Surface(vec![
            InvokeMethod::ToolsExecute,
            InvokeMethod::ActionsExecute,
        ]))
        .unwrap();
        assert_eq!(later.method(), InvokeMethod::ActionsExecute);

        let last = ActionInvoker::resolve(Surface(vec![InvokeMethod::ToolsExecute])).unwrap();
        assert_eq!(last.method(), InvokeMethod::ToolsExecute);
    }

    #[test]
    fn no_exposed_method_is_capability_error() {
        let err = ActionInvoker::resolve(Surface(vec![])).unwrap_err();
        match err {
            LeadScoutError::Capability { candidates } => {
                assert_eq!(candidates, vec!["execute_action", "actions.execute", "tools.execute"]);
            }
            other => panic!("expected Capability, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn invoke_goes_through_resolved_method() {
        let invoker = ActionInvoker::resolve(Surface(vec![InvokeMethod::ActionsExecute])).unwrap();
        let out = invoker
            .invoke("google_sheets", "create_spreadsheet", json!({}))
            .await
            .unwrap();
        assert_eq!(out["via"], "actions.execute");
        assert_eq!(out["action"], "create_spreadsheet");
    }

    #[test]
    fn method_names_parse() {
        assert_eq!("tools.execute".parse::<InvokeMethod>().unwrap(), InvokeMethod::ToolsExecute);
        assert_eq!(" execute_action ".parse::<InvokeMethod>().unwrap(), InvokeMethod::ExecuteAction);
        assert!("run".parse::<InvokeMethod>().unwrap_err().is_config());
    }

    #[test]
    fn request_shapes_per_method() {
        let (path, body) =
            InvokeMethod::ExecuteAction.request("google_sheets", "create_spreadsheet", json!({"title": "t"}));
        assert_eq!(path, "/api/v1/actions/create_spreadsheet/execute");
        assert_eq!(body, json!({"appName": "google_sheets", "input": {"title": "t"}}));

        let (path, body) =
            InvokeMethod::ToolsExecute.request("google_sheets", "batch_update_values", json!({}));
        assert_eq!(path, "/api/v3/tools/execute/batch_update_values");
        assert_eq!(body, json!({"toolkit": "google_sheets", "arguments": {}}));
    }
}
