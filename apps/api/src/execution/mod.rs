//! Execution router: runs an evaluation on the local sandboxed backend and
//! falls back once to the remote service.
//!
//! State path per call:
//! `Idle → Evaluating(local) → Done`, or
//! `Idle → Evaluating(local) → Evaluating(remote) → Done`, or `… → Failed`.
//!
//! The router holds its backends as `Arc<dyn EvaluationBackend>` so tests can
//! swap either side.

pub mod local;
pub mod remote;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ats_engine::{validate_inputs, ATSEvaluationResponse, EngineError};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;
use self::local::LocalBackend;
use self::remote::RemoteBackend;

// ────────────────────────────────────────────────────────────────────────────
// Backend seam
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Local,
    Remote,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Local => f.write_str("local"),
            BackendKind::Remote => f.write_str("remote"),
        }
    }
}

/// What a single backend reports for one call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackendError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("unparseable input: {0}")]
    Parse(String),

    #[error("unavailable: {0}")]
    Unavailable(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl From<EngineError> for BackendError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Validation(msg) => BackendError::Validation(msg),
            EngineError::Parse(msg) => BackendError::Parse(msg),
            other => BackendError::Unavailable(other.to_string()),
        }
    }
}

/// A host able to run the evaluation pipeline.
#[async_trait]
pub trait EvaluationBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    async fn evaluate(
        &self,
        resume_text: &str,
        jd_text: &str,
    ) -> Result<ATSEvaluationResponse, BackendError>;

    /// Eagerly performs any lazy initialization.
    async fn warm_up(&self) -> Result<(), BackendError> {
        Ok(())
    }

    async fn shutdown(&self) {}
}

// ────────────────────────────────────────────────────────────────────────────
// Router
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "backend", rename_all = "snake_case")]
pub enum RouterState {
    Idle,
    Evaluating(BackendKind),
    Done,
    Failed,
}

/// Terminal error of a routed evaluation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("{backend} backend unavailable: {message}")]
    BackendUnavailable { backend: BackendKind, message: String },

    #[error("{backend} backend timed out after {timeout:?}")]
    Timeout { backend: BackendKind, timeout: Duration },
}

impl EvaluationError {
    fn from_backend(backend: BackendKind, err: BackendError) -> Self {
        match err {
            BackendError::Validation(msg) => EvaluationError::Validation(msg),
            BackendError::Parse(msg) => EvaluationError::Parse(msg),
            BackendError::Unavailable(message) => EvaluationError::BackendUnavailable { backend, message },
            BackendError::Timeout(timeout) => EvaluationError::Timeout { backend, timeout },
        }
    }
}

/// Outcome of one routed call together with the states it passed through.
#[derive(Debug)]
pub struct TracedEvaluation {
    pub path: Vec<RouterState>,
    pub result: Result<ATSEvaluationResponse, EvaluationError>,
}

pub struct ExecutionRouter {
    local: Arc<dyn EvaluationBackend>,
    remote: Option<Arc<dyn EvaluationBackend>>,
}

impl ExecutionRouter {
    pub fn new(
        local: Arc<dyn EvaluationBackend>,
        remote: Option<Arc<dyn EvaluationBackend>>,
    ) -> Self {
        Self { local, remote }
    }

    /// Sandboxed local engine plus, when `ATS_REMOTE_URL` is set, the remote service.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let local = LocalBackend::new(config.engine.clone(), config.catalog_path.clone());
        let remote = match &config.remote_url {
            Some(url) => {
                let backend: Arc<dyn EvaluationBackend> =
                    Arc::new(RemoteBackend::new(url, config.remote_timeout)?);
                Some(backend)
            }
            None => None,
        };
        Ok(Self::new(Arc::new(local), remote))
    }

    /// Bootstraps the local backend ahead of the first call.
    ///
    /// A failure is reported but not fatal: calls will retry the bootstrap
    /// and fall back to the remote backend meanwhile.
    pub async fn warm_up(&self) -> Result<(), EvaluationError> {
        match self.local.warm_up().await {
            Ok(()) => {
                info!("Local backend ready");
                Ok(())
            }
            Err(e) => {
                warn!("Local backend warm-up failed: {e}");
                Err(EvaluationError::from_backend(self.local.kind(), e))
            }
        }
    }

    pub async fn shutdown(&self) {
        self.local.shutdown().await;
        if let Some(remote) = &self.remote {
            remote.shutdown().await;
        }
        info!("Execution router shut down");
    }

    pub async fn evaluate(
        &self,
        resume_text: &str,
        jd_text: &str,
    ) -> Result<ATSEvaluationResponse, EvaluationError> {
        self.evaluate_traced(resume_text, jd_text).await.result
    }

    /// Like [`evaluate`](Self::evaluate), also returning the state path taken.
    pub async fn evaluate_traced(&self, resume_text: &str, jd_text: &str) -> TracedEvaluation {
        let mut path = vec![RouterState::Idle];

        if let Err(e) = validate_inputs(resume_text, jd_text) {
            path.push(RouterState::Failed);
            return TracedEvaluation {
                path,
                result: Err(EvaluationError::from_backend(BackendKind::Local, e.into())),
            };
        }

        let local_kind = self.local.kind();
        path.push(RouterState::Evaluating(local_kind));
        let local_err = match self.local.evaluate(resume_text, jd_text).await {
            Ok(response) => {
                path.push(RouterState::Done);
                return TracedEvaluation {
                    path,
                    result: Ok(response),
                };
            }
            Err(e @ (BackendError::Validation(_) | BackendError::Parse(_))) => {
                path.push(RouterState::Failed);
                return TracedEvaluation {
                    path,
                    result: Err(EvaluationError::from_backend(local_kind, e)),
                };
            }
            Err(e) => e,
        };

        warn!("{local_kind} backend failed ({local_err}), falling back to remote");

        let Some(remote) = &self.remote else {
            path.push(RouterState::Failed);
            return TracedEvaluation {
                path,
                result: Err(EvaluationError::BackendUnavailable {
                    backend: BackendKind::Remote,
                    message: format!("no remote URL configured (local {local_err})"),
                }),
            };
        };

        let remote_kind = remote.kind();
        path.push(RouterState::Evaluating(remote_kind));
        let result = remote
            .evaluate(resume_text, jd_text)
            .await
            .map_err(|e| EvaluationError::from_backend(remote_kind, e));

        path.push(if result.is_ok() {
            RouterState::Done
        } else {
            RouterState::Failed
        });
        debug!("Routed evaluation path: {path:?}");

        TracedEvaluation { path, result }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use ats_engine::Engine;

    /// Backend returning a canned outcome and counting calls.
    struct Scripted {
        kind: BackendKind,
        outcome: Option<BackendError>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn ok(kind: BackendKind) -> Arc<Self> {
            Arc::new(Self {
                kind,
                outcome: None,
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(kind: BackendKind, err: BackendError) -> Arc<Self> {
            Arc::new(Self {
                kind,
                outcome: Some(err),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl EvaluationBackend for Scripted {
        fn kind(&self) -> BackendKind {
            self.kind
        }

        async fn evaluate(
            &self,
            resume_text: &str,
            jd_text: &str,
        ) -> Result<ATSEvaluationResponse, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(err) = &self.outcome {
                return Err(err.clone());
            }
            Ok(Engine::with_defaults().unwrap().evaluate(resume_text, jd_text)?)
        }
    }

    const RESUME: &str = "Skills: Rust, Docker";
    const JD: &str = "Rust Engineer\nRust and Kubernetes required.";

    #[tokio::test]
    async fn test_local_success_never_touches_remote() {
        let local = Scripted::ok(BackendKind::Local);
        let remote = Scripted::ok(BackendKind::Remote);
        let router = ExecutionRouter::new(local.clone(), Some(remote.clone()));

        let traced = router.evaluate_traced(RESUME, JD).await;
        assert!(traced.result.is_ok());
        assert_eq!(
            traced.path,
            vec![
                RouterState::Idle,
                RouterState::Evaluating(BackendKind::Local),
                RouterState::Done
            ]
        );
        assert_eq!(local.calls(), 1);
        assert_eq!(remote.calls(), 0);
    }

    #[tokio::test]
    async fn test_local_unavailable_falls_back_once() {
        let local = Scripted::failing(
            BackendKind::Local,
            BackendError::Unavailable("bootstrap failed".into()),
        );
        let remote = Scripted::ok(BackendKind::Remote);
        let router = ExecutionRouter::new(local.clone(), Some(remote.clone()));

        let traced = router.evaluate_traced(RESUME, JD).await;
        assert!(traced.result.is_ok());
        assert_eq!(
            traced.path,
            vec![
                RouterState::Idle,
                RouterState::Evaluating(BackendKind::Local),
                RouterState::Evaluating(BackendKind::Remote),
                RouterState::Done
            ]
        );
        assert_eq!(local.calls(), 1);
        assert_eq!(remote.calls(), 1);
    }

    #[tokio::test]
    async fn test_remote_failure_is_terminal() {
        let local = Scripted::failing(BackendKind::Local, BackendError::Unavailable("down".into()));
        let remote = Scripted::failing(
            BackendKind::Remote,
            BackendError::Timeout(Duration::from_secs(30)),
        );
        let router = ExecutionRouter::new(local, Some(remote.clone()));

        let traced = router.evaluate_traced(RESUME, JD).await;
        assert_eq!(
            traced.result.unwrap_err(),
            EvaluationError::Timeout {
                backend: BackendKind::Remote,
                timeout: Duration::from_secs(30)
            }
        );
        assert_eq!(traced.path.last(), Some(&RouterState::Failed));
        assert_eq!(remote.calls(), 1);
    }

    #[tokio::test]
    async fn test_parse_error_does_not_fall_back() {
        let local = Scripted::failing(BackendKind::Local, BackendError::Parse("garbage".into()));
        let remote = Scripted::ok(BackendKind::Remote);
        let router = ExecutionRouter::new(local, Some(remote.clone()));

        let err = router.evaluate(RESUME, JD).await.unwrap_err();
        assert_eq!(err, EvaluationError::Parse("garbage".into()));
        assert_eq!(remote.calls(), 0);
    }

    #[tokio::test]
    async fn test_validation_happens_before_any_backend() {
        let local = Scripted::ok(BackendKind::Local);
        let router = ExecutionRouter::new(local.clone(), None);

        let traced = router.evaluate_traced(RESUME, "  ").await;
        assert!(matches!(traced.result, Err(EvaluationError::Validation(_))));
        assert_eq!(traced.path, vec![RouterState::Idle, RouterState::Failed]);
        assert_eq!(local.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_remote_is_unavailable() {
        let local = Scripted::failing(BackendKind::Local, BackendError::Unavailable("down".into()));
        let router = ExecutionRouter::new(local, None);

        let err = router.evaluate(RESUME, JD).await.unwrap_err();
        assert!(matches!(
            err,
            EvaluationError::BackendUnavailable {
                backend: BackendKind::Remote,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_each_call_starts_idle() {
        let local = Scripted::ok(BackendKind::Local);
        let router = ExecutionRouter::new(local.clone(), None);

        for _ in 0..3 {
            let traced = router.evaluate_traced(RESUME, JD).await;
            assert_eq!(traced.path.first(), Some(&RouterState::Idle));
        }
        assert_eq!(local.calls(), 3);
    }

    #[test]
    fn test_router_state_serializes_with_backend() {
        let json = serde_json::to_value(RouterState::Evaluating(BackendKind::Remote)).unwrap();
        assert_eq!(json["state"], "evaluating");
        assert_eq!(json["backend"], "remote");
    }
}
