//! Background scan tasks and the scan request they send.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use otn_tools::NotificationClient;
use sonic_orch_common::DbConnector;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::tables::fields;

pub const SCAN_REPLY_TIMEOUT: Duration = Duration::from_millis(20000);

/// Outcome of one scan request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanStatus {
    Success,
    Unavailable,
    Failed(String),
    Timeout,
}

/// What a scanner needs to talk to the agent.
#[derive(Clone)]
pub struct ScanContext {
    pub client: NotificationClient,
    pub state: Arc<dyn DbConnector>,
    /// Held for the duration of every OTDR scan in the process.
    pub scan_lock: Arc<Mutex<()>>,
    pub reply_timeout: Duration,
}

impl ScanContext {
    pub fn new(appl: Arc<dyn DbConnector>, state: Arc<dyn DbConnector>) -> Self {
        Self {
            client: NotificationClient::new(appl),
            state,
            scan_lock: Arc::new(Mutex::new(())),
            reply_timeout: SCAN_REPLY_TIMEOUT,
        }
    }

    /// Sends `("set", name, [scan=true])` and waits for the reply about `name`.
    pub async fn request_scan(&self, query: &str, reply: &str, name: &str) -> Result<ScanStatus> {
        let values = vec![(fields::SCAN.to_string(), "true".to_string())];
        let result = self
            .client
            .call_until(query, reply, "set", name, values, self.reply_timeout, |msg| msg.data == name)
            .await;
        match result {
            Ok(reply) => Ok(match reply.op.as_str() {
                "SUCCESS" => ScanStatus::Success,
                "UNAVAILABLE" => ScanStatus::Unavailable,
                _ => ScanStatus::Failed(reply.op),
            }),
            Err(e) if e.is_timeout() => Ok(ScanStatus::Timeout),
            Err(e) => Err(e.into()),
        }
    }
}

/// A spawned scan loop that stops when its token is cancelled.
pub struct ScanTask {
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl ScanTask {
    pub fn spawn<F, Fut>(body: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        let handle = tokio::spawn(body(token.clone()));
        Self {
            token,
            handle: Some(handle),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Cancels the loop and waits for it to exit.
    pub async fn stop(mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for ScanTask {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Sleeps for `duration`; `false` if cancelled first.
pub async fn sleep_or_cancel(token: &CancellationToken, duration: Duration) -> bool {
    tokio::select! {
        _ = token.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}
