//! Local backend: the engine runs on a dedicated sandbox thread.
//!
//! - Bootstrap is lazy and shared: concurrent first callers await one
//!   initialization. A failed bootstrap is not cached.
//! - Requests and replies cross the thread boundary as JSON strings.
//! - The worker serves one request at a time from an unbounded queue.
//! - A panic while evaluating is caught and reported as unavailability.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use async_trait::async_trait;
use ats_engine::{
    validate_inputs, ATSEvaluationResponse, Engine, EngineConfig, EngineError, KeywordCatalog,
    ResumeCanonicalModel,
};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot, Mutex, OnceCell};
use tracing::{debug, error, info};

use super::{BackendError, BackendKind, EvaluationBackend};

const WORKER_THREAD_NAME: &str = "ats-sandbox";
const ENCODING_FAILURE_REPLY: &str =
    r#"{"status":"internal","message":"sandbox reply could not be encoded"}"#;

type Bootstrap = Arc<dyn Fn() -> Result<Engine, EngineError> + Send + Sync>;

// ────────────────────────────────────────────────────────────────────────────
// Boundary messages
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SandboxRequest {
    resume_text: String,
    job_description_text: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum SandboxReply {
    Ok { response: ATSEvaluationResponse },
    Validation { message: String },
    Parse { message: String },
    Internal { message: String },
}

impl SandboxReply {
    fn into_result(self) -> Result<ATSEvaluationResponse, BackendError> {
        match self {
            SandboxReply::Ok { response } => Ok(response),
            SandboxReply::Validation { message } => Err(BackendError::Validation(message)),
            SandboxReply::Parse { message } => Err(BackendError::Parse(message)),
            SandboxReply::Internal { message } => Err(BackendError::Unavailable(message)),
        }
    }
}

struct Job {
    request: String,
    reply: oneshot::Sender<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Worker
// ────────────────────────────────────────────────────────────────────────────

struct Worker {
    /// `None` once shut down.
    queue: Mutex<Option<mpsc::UnboundedSender<Job>>>,
    handle: Mutex<Option<thread::JoinHandle<()>>>,
}

impl Worker {
    async fn spawn(bootstrap: Bootstrap) -> Result<Self, BackendError> {
        let (queue_tx, queue_rx) = mpsc::unbounded_channel::<Job>();
        let (ready_tx, ready_rx) = oneshot::channel::<Result<(), String>>();

        let handle = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || run_worker(bootstrap, queue_rx, ready_tx))
            .map_err(|e| BackendError::Unavailable(format!("cannot spawn sandbox thread: {e}")))?;

        match ready_rx.await {
            Ok(Ok(())) => Ok(Self {
                queue: Mutex::new(Some(queue_tx)),
                handle: Mutex::new(Some(handle)),
            }),
            // The thread returns right after reporting; no need to join it.
            Ok(Err(message)) => Err(BackendError::Unavailable(message)),
            Err(_) => Err(BackendError::Unavailable(
                "sandbox thread exited during bootstrap".to_string(),
            )),
        }
    }

    async fn submit(&self, request: String) -> Result<String, BackendError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        {
            let queue = self.queue.lock().await;
            let Some(queue) = queue.as_ref() else {
                return Err(BackendError::Unavailable("sandbox is shut down".to_string()));
            };
            queue
                .send(Job {
                    request,
                    reply: reply_tx,
                })
                .map_err(|_| BackendError::Unavailable("sandbox thread has stopped".to_string()))?;
        }
        reply_rx
            .await
            .map_err(|_| BackendError::Unavailable("sandbox dropped the request".to_string()))
    }

    async fn stop(&self) {
        // Closing the queue ends the worker loop after in-flight jobs.
        self.queue.lock().await.take();
        if let Some(handle) = self.handle.lock().await.take() {
            let joined = tokio::task::spawn_blocking(move || handle.join()).await;
            if !matches!(joined, Ok(Ok(()))) {
                error!("Sandbox thread did not exit cleanly");
            }
        }
    }
}

fn run_worker(
    bootstrap: Bootstrap,
    mut queue: mpsc::UnboundedReceiver<Job>,
    ready: oneshot::Sender<Result<(), String>>,
) {
    let engine = match panic::catch_unwind(AssertUnwindSafe(|| bootstrap())) {
        Ok(Ok(engine)) => engine,
        Ok(Err(e)) => {
            let _ = ready.send(Err(format!("sandbox bootstrap failed: {e}")));
            return;
        }
        Err(payload) => {
            let _ = ready.send(Err(format!(
                "sandbox bootstrap panicked: {}",
                panic_message(payload.as_ref())
            )));
            return;
        }
    };

    info!(
        "Sandbox ready (catalog {}, {} terms)",
        engine.catalog().version(),
        engine.catalog().len()
    );
    if ready.send(Ok(())).is_err() {
        return;
    }

    let mut memo: Option<ResumeMemo> = None;
    while let Some(job) = queue.blocking_recv() {
        let reply = serve(&engine, &mut memo, &job.request);
        // The caller may have gone away; nothing to do then.
        let _ = job.reply.send(reply);
    }
    debug!("Sandbox queue closed, worker exiting");
}

/// The most recently canonicalized resume, reused when the next request
/// carries the same resume text.
struct ResumeMemo {
    text: String,
    resume: ResumeCanonicalModel,
}

fn serve(engine: &Engine, memo: &mut Option<ResumeMemo>, request: &str) -> String {
    let reply = match serde_json::from_str::<SandboxRequest>(request) {
        Err(e) => SandboxReply::Internal {
            message: format!("malformed sandbox request: {e}"),
        },
        Ok(request) => {
            let outcome =
                panic::catch_unwind(AssertUnwindSafe(|| evaluate_memoized(engine, memo, &request)));
            match outcome {
                Ok(Ok(response)) => SandboxReply::Ok { response },
                Ok(Err(EngineError::Validation(message))) => SandboxReply::Validation { message },
                Ok(Err(EngineError::Parse(message))) => SandboxReply::Parse { message },
                Ok(Err(other)) => SandboxReply::Internal {
                    message: other.to_string(),
                },
                Err(payload) => {
                    *memo = None;
                    let message = format!("sandbox panicked: {}", panic_message(payload.as_ref()));
                    error!("{message}");
                    SandboxReply::Internal { message }
                }
            }
        }
    };

    serde_json::to_string(&reply).unwrap_or_else(|_| ENCODING_FAILURE_REPLY.to_string())
}

fn evaluate_memoized(
    engine: &Engine,
    memo: &mut Option<ResumeMemo>,
    request: &SandboxRequest,
) -> Result<ATSEvaluationResponse, EngineError> {
    validate_inputs(&request.resume_text, &request.job_description_text)?;

    let cached = memo
        .as_ref()
        .is_some_and(|m| m.text == request.resume_text);
    if !cached {
        *memo = None;
        let resume = engine.canonicalize_resume(&request.resume_text)?;
        *memo = Some(ResumeMemo {
            text: request.resume_text.clone(),
            resume,
        });
    } else {
        debug!("Reusing canonicalized resume");
    }

    match memo.as_ref() {
        Some(m) => engine.evaluate_with_resume(&m.resume, &request.job_description_text),
        None => engine.evaluate(&request.resume_text, &request.job_description_text),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Backend
// ────────────────────────────────────────────────────────────────────────────

/// In-process sandboxed host of the engine.
pub struct LocalBackend {
    bootstrap: Bootstrap,
    worker: OnceCell<Worker>,
}

impl LocalBackend {
    /// Loads the catalog (bundled, or from `catalog_path`) inside the sandbox.
    pub fn new(config: EngineConfig, catalog_path: Option<PathBuf>) -> Self {
        Self::with_bootstrap(move || {
            let catalog = match &catalog_path {
                Some(path) => KeywordCatalog::from_path(path)?,
                None => KeywordCatalog::bundled()?,
            };
            Engine::new(Arc::new(catalog), config.clone())
        })
    }

    /// Custom engine construction, run on the sandbox thread.
    pub fn with_bootstrap<F>(bootstrap: F) -> Self
    where
        F: Fn() -> Result<Engine, EngineError> + Send + Sync + 'static,
    {
        Self {
            bootstrap: Arc::new(bootstrap),
            worker: OnceCell::new(),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.worker.initialized()
    }

    async fn worker(&self) -> Result<&Worker, BackendError> {
        self.worker
            .get_or_try_init(|| Worker::spawn(self.bootstrap.clone()))
            .await
    }
}

#[async_trait]
impl EvaluationBackend for LocalBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    async fn evaluate(
        &self,
        resume_text: &str,
        jd_text: &str,
    ) -> Result<ATSEvaluationResponse, BackendError> {
        let worker = self.worker().await?;

        let request = serde_json::to_string(&SandboxRequest {
            resume_text: resume_text.to_string(),
            job_description_text: jd_text.to_string(),
        })
        .map_err(|e| BackendError::Unavailable(format!("cannot encode sandbox request: {e}")))?;

        let reply = worker.submit(request).await?;
        let reply: SandboxReply = serde_json::from_str(&reply)
            .map_err(|e| BackendError::Unavailable(format!("malformed sandbox reply: {e}")))?;
        reply.into_result()
    }

    async fn warm_up(&self) -> Result<(), BackendError> {
        self.worker().await.map(|_| ())
    }

    async fn shutdown(&self) {
        if let Some(worker) = self.worker.get() {
            worker.stop().await;
            info!("Sandbox shut down");
        }
    }
}
