//! Feature controllers and the master dispatch layer.
//!
//! Each controller owns one feature domain, a closed action catalog,
//! and an enable/disable lifecycle. All state transitions go through
//! [`ControllerCore`] so the lifecycle rules live in exactly one place.

pub mod intel;
pub mod master;
pub mod spectrum;
pub mod system;
pub mod tactical;
pub mod vision;

pub use master::{GlobalConfig, MasterController, MODULES};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use ssa_common::{Error, OperationResult};
use std::collections::BTreeMap;
use std::sync::Mutex;
use tracing::debug;

/// Controller lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ControllerStatus {
    /// Enabled, never executed anything yet.
    Idle,
    /// Enabled and between executions.
    Ready,
    /// Disabled; executions are refused.
    Disabled,
    /// An action is currently executing.
    Running,
}

/// Record of the most recent action attempt, successful or not.
#[derive(Debug, Clone, Serialize)]
pub struct LastAction {
    pub action: String,
    pub params: Value,
    pub timestamp: DateTime<Utc>,
}

/// Status snapshot of one controller.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub module: &'static str,
    pub enabled: bool,
    pub status: ControllerStatus,
    pub last_action: Option<LastAction>,
}

#[derive(Debug)]
struct CoreState {
    enabled: bool,
    status: ControllerStatus,
    last_action: Option<LastAction>,
}

/// Shared lifecycle state for a controller.
///
/// Controllers start enabled and idle. `begin` refuses work while
/// disabled, records the attempt, and marks the controller running;
/// the returned token restores `Ready` when dropped, so the state
/// recovers even if a dispatch panics.
#[derive(Debug)]
pub struct ControllerCore {
    name: &'static str,
    state: Mutex<CoreState>,
}

impl ControllerCore {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: Mutex::new(CoreState {
                enabled: true,
                status: ControllerStatus::Idle,
                last_action: None,
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CoreState> {
        // Poisoning can only come from a panicked dispatch; the state
        // itself is still coherent, so recover the guard.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Idempotent: enabling an enabled controller is a no-op.
    pub fn enable(&self) {
        let mut state = self.lock();
        if !state.enabled {
            debug!(module = self.name, "controller enabled");
            state.enabled = true;
            state.status = ControllerStatus::Ready;
        }
    }

    /// Idempotent: disabling a disabled controller is a no-op.
    pub fn disable(&self) {
        let mut state = self.lock();
        if state.enabled {
            debug!(module = self.name, "controller disabled");
            state.enabled = false;
            state.status = ControllerStatus::Disabled;
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.lock().enabled
    }

    /// Gate an execution: refuse while disabled, otherwise record the
    /// attempt and transition to running.
    pub fn begin(&self, action: &str, params: &Value) -> Result<RunToken<'_>, Error> {
        let mut state = self.lock();
        if !state.enabled {
            return Err(Error::ModuleDisabled {
                module: self.name.to_string(),
            });
        }
        state.last_action = Some(LastAction {
            action: action.to_string(),
            params: params.clone(),
            timestamp: Utc::now(),
        });
        state.status = ControllerStatus::Running;
        Ok(RunToken { core: self })
    }

    pub fn status_report(&self) -> StatusReport {
        let state = self.lock();
        StatusReport {
            module: self.name,
            enabled: state.enabled,
            status: state.status,
            last_action: state.last_action.clone(),
        }
    }
}

/// Restores the controller to `Ready` when an execution finishes.
pub struct RunToken<'a> {
    core: &'a ControllerCore,
}

impl Drop for RunToken<'_> {
    fn drop(&mut self) {
        let mut state = self.core.lock();
        // Disable during a run wins over the ready transition
        if state.enabled {
            state.status = ControllerStatus::Ready;
        }
    }
}

/// Common surface of the five feature controllers.
pub trait FeatureController: Send + Sync {
    fn core(&self) -> &ControllerCore;

    /// Closed action catalog, stable order.
    fn actions(&self) -> &'static [&'static str];

    /// Whether the action's primary (non-synthetic) path is currently
    /// available on this host and configuration.
    fn action_available(&self, action: &str) -> bool;

    /// Run a catalogued action. Only called with actions from
    /// [`FeatureController::actions`].
    fn dispatch(&self, action: &str, params: &Value) -> OperationResult;

    fn name(&self) -> &'static str {
        self.core().name()
    }

    /// Full execution path: catalog check, lifecycle gate, dispatch.
    fn execute(&self, action: &str, params: &Value) -> OperationResult {
        if !self.actions().contains(&action) {
            return OperationResult::from_error(&Error::UnknownAction {
                module: self.name().to_string(),
                action: action.to_string(),
                available: self.actions().to_vec(),
            });
        }
        match self.core().begin(action, params) {
            Ok(_token) => self.dispatch(action, params),
            Err(e) => OperationResult::from_error(&e),
        }
    }

    /// Per-action availability of the primary path.
    fn capability_map(&self) -> BTreeMap<&'static str, bool> {
        self.actions()
            .iter()
            .map(|a| (*a, self.action_available(a)))
            .collect()
    }
}

/// Fetch a required f64 parameter.
pub(crate) fn require_f64(params: &Value, key: &str) -> Result<f64, OperationResult> {
    params
        .get(key)
        .and_then(Value::as_f64)
        .ok_or_else(|| OperationResult::error(format!("missing required numeric parameter '{}'", key)))
}

/// Fetch a required string parameter.
pub(crate) fn require_str<'a>(params: &'a Value, key: &str) -> Result<&'a str, OperationResult> {
    params
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| OperationResult::error(format!("missing required string parameter '{}'", key)))
}

/// Map a proxy call outcome into a result record.
pub(crate) fn proxy_result(outcome: Result<Value, ssa_proxy::ProxyError>) -> OperationResult {
    match outcome {
        Ok(payload) => OperationResult::proxy(payload),
        Err(e) => OperationResult::from_error(&e.into()),
    }
}
