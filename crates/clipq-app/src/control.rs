//! Control server: answers `clipq` subcommands by forwarding each request to
//! the UI thread that owns the queue.

use anyhow::Result;
use clipq_common::ipc::{recv_request, send_response};
use clipq_common::{ControlRequest, ControlResponse};
use std::sync::mpsc;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// A request waiting for the UI thread.
pub struct ControlCall {
    pub request: ControlRequest,
    pub reply: oneshot::Sender<ControlResponse>,
}

/// Sending half of the hop to the UI thread.
#[derive(Clone)]
pub struct Bridge {
    calls: mpsc::Sender<ControlCall>,
    wake: Arc<dyn Fn() -> bool + Send + Sync>,
}

impl Bridge {
    /// `wake` must make the UI thread drain the receiving end of `calls`.
    pub fn new(
        calls: mpsc::Sender<ControlCall>,
        wake: impl Fn() -> bool + Send + Sync + 'static,
    ) -> Self {
        Bridge {
            calls,
            wake: Arc::new(wake),
        }
    }

    pub async fn call(&self, request: ControlRequest) -> ControlResponse {
        let (reply, response) = oneshot::channel();
        if self.calls.send(ControlCall { request, reply }).is_err() {
            return ControlResponse::Error("daemon is shutting down".to_string());
        }
        if !(self.wake)() {
            warn!("Failed to wake the UI thread");
        }
        response
            .await
            .unwrap_or_else(|_| ControlResponse::Error("daemon dropped the request".to_string()))
    }
}

/// Serve one client until it disconnects or asks for shutdown.
pub async fn handle_connection<S>(mut stream: S, bridge: Bridge)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    loop {
        let request = match recv_request(&mut stream).await {
            Ok(request) => request,
            Err(e) => {
                debug!("Control client read ended: {}", e);
                break;
            }
        };
        debug!("Control request: {:?}", request);

        let shutdown = request == ControlRequest::Shutdown;
        let response = bridge.call(request).await;
        if let Err(e) = send_response(&mut stream, &response).await {
            debug!("Failed to send control response: {}", e);
            break;
        }
        if shutdown {
            break;
        }
    }
}

/// Accept clients on the named pipe forever. `first` is the already created
/// first pipe instance, which doubles as the single-daemon lock.
#[cfg(windows)]
pub async fn serve(
    pipe_name: String,
    first: tokio::net::windows::named_pipe::NamedPipeServer,
    bridge: Bridge,
) -> Result<()> {
    use clipq_common::ipc::pipe;
    use tracing::info;

    info!("Control server listening on {}", pipe_name);
    let mut pipe = first;
    loop {
        pipe.connect().await?;
        debug!("Control client connected");

        // Next instance exists before this one is handed off.
        let next_pipe = pipe::bind_next(&pipe_name)?;
        tokio::spawn(handle_connection(pipe, bridge.clone()));
        pipe = next_pipe;
    }
}

/// Connect to the daemon, send one request, wait for its response.
#[cfg(windows)]
pub async fn request(pipe_name: &str, request: &ControlRequest) -> Result<ControlResponse> {
    use clipq_common::ipc::{pipe, recv_response, send_request};

    let mut client = pipe::connect(pipe_name).await?;
    send_request(&mut client, request).await?;
    recv_response(&mut client).await
}

#[cfg(not(windows))]
pub async fn request(_pipe_name: &str, _request: &ControlRequest) -> Result<ControlResponse> {
    anyhow::bail!("clipq requires Windows")
}
