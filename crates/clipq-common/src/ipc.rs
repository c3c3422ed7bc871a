//! Control pipe framing: a little-endian u32 body length, then the bincode body.

use crate::protocol::{ControlRequest, ControlResponse};
use anyhow::Result;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{trace, warn};

/// Largest accepted frame body.
pub const MAX_FRAME_LEN: u64 = 16 * 1024 * 1024;

#[derive(Error, Debug)]
#[error("frame too large: {len} bytes (max {MAX_FRAME_LEN})")]
pub struct FrameTooLarge {
    pub len: u64,
}

/// Serialize `msg` into a complete frame, length prefix included.
pub fn encode_frame<T: Serialize>(msg: &T) -> Result<Vec<u8>> {
    let len = bincode::serialized_size(msg)?;
    if len > MAX_FRAME_LEN {
        return Err(FrameTooLarge { len }.into());
    }
    let mut frame = Vec::with_capacity(4 + len as usize);
    frame.extend_from_slice(&(len as u32).to_le_bytes());
    bincode::serialize_into(&mut frame, msg)?;
    Ok(frame)
}

async fn write_frame<W>(writer: &mut W, frame: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    trace!("Writing frame: {} bytes", frame.len());
    writer.write_all(frame).await?;
    writer.flush().await?;
    Ok(())
}

async fn read_frame<R, T>(reader: &mut R) -> Result<T>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let len = u64::from(reader.read_u32_le().await?);
    if len > MAX_FRAME_LEN {
        return Err(FrameTooLarge { len }.into());
    }
    let mut body = vec![0u8; len as usize];
    reader.read_exact(&mut body).await?;
    trace!("Read frame: {} bytes", len);
    Ok(bincode::deserialize(&body)?)
}

pub async fn send_request<W>(writer: &mut W, request: &ControlRequest) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    write_frame(writer, &encode_frame(request)?).await
}

pub async fn recv_request<R>(reader: &mut R) -> Result<ControlRequest>
where
    R: AsyncRead + Unpin,
{
    read_frame(reader).await
}

/// Send a response. One that does not fit in a frame goes out as an
/// [`ControlResponse::Error`] instead, so the client still gets an answer.
pub async fn send_response<W>(writer: &mut W, response: &ControlResponse) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let frame = match encode_frame(response) {
        Ok(frame) => frame,
        Err(e) => match e.downcast_ref::<FrameTooLarge>() {
            Some(too_large) => {
                warn!("Control response dropped: {}", too_large);
                encode_frame(&response.oversized(too_large.len))?
            }
            None => return Err(e),
        },
    };
    write_frame(writer, &frame).await
}

pub async fn recv_response<R>(reader: &mut R) -> Result<ControlResponse>
where
    R: AsyncRead + Unpin,
{
    read_frame(reader).await
}

/// The daemon's named pipe: one server instance per client.
#[cfg(windows)]
pub mod pipe {
    use anyhow::{Context, Result};
    use std::io::ErrorKind;
    use std::time::Duration;
    use tokio::net::windows::named_pipe::{
        ClientOptions, NamedPipeClient, NamedPipeServer, ServerOptions,
    };
    use tracing::debug;

    const ERROR_PIPE_BUSY: i32 = 231;
    const CONNECT_ATTEMPTS: u32 = 10;
    const CONNECT_RETRY_DELAY: Duration = Duration::from_millis(50);

    /// Claim the pipe name for this daemon. Fails if another daemon owns it.
    pub fn bind_first(pipe_name: &str) -> Result<NamedPipeServer> {
        debug!("Claiming control pipe {}", pipe_name);
        ServerOptions::new()
            .first_pipe_instance(true)
            .create(pipe_name)
            .with_context(|| format!("Is another clipq daemon running? ({})", pipe_name))
    }

    /// Another instance for the next client.
    pub fn bind_next(pipe_name: &str) -> Result<NamedPipeServer> {
        Ok(ServerOptions::new()
            .first_pipe_instance(false)
            .create(pipe_name)?)
    }

    /// Open the daemon's pipe. Waits briefly while every instance is busy.
    pub async fn connect(pipe_name: &str) -> Result<NamedPipeClient> {
        let mut attempt = 1;
        loop {
            match ClientOptions::new().open(pipe_name) {
                Ok(client) => return Ok(client),
                Err(e) if e.raw_os_error() == Some(ERROR_PIPE_BUSY) && attempt < CONNECT_ATTEMPTS => {
                    debug!("Control pipe busy (attempt {})", attempt);
                    attempt += 1;
                    tokio::time::sleep(CONNECT_RETRY_DELAY).await;
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    anyhow::bail!("clipq daemon is not running ({})", pipe_name)
                }
                Err(e) => {
                    return Err(e).with_context(|| format!("Failed to open {}", pipe_name))
                }
            }
        }
    }
}
