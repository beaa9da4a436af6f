//! Stdio transport for MCP.
//!
//! Newline-delimited JSON-RPC on any reader/writer pair, stdin/stdout in
//! production. Messages are handled one at a time; EOF ends the transport.

use anyhow::Result;
use futures::StreamExt;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::{AnyDelimiterCodec, AnyDelimiterCodecError, FramedRead};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::metrics::{connection_closed, connection_opened};
use super::state::GuardedDispatcher;
use crate::mcp::{McpError, McpResponse};

const TRANSPORT: &str = "stdio";

/// Largest accepted message, in bytes, excluding the newline
pub const MAX_MESSAGE_BYTES: usize = 1024 * 1024;

pub async fn serve_stdio<R, W>(
    dispatcher: GuardedDispatcher,
    reader: R,
    mut writer: W,
    cancel: CancellationToken,
) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    info!("Serving MCP over stdio");
    connection_opened(TRANSPORT);
    let result = run_loop(&dispatcher, reader, &mut writer, &cancel).await;
    connection_closed(TRANSPORT);
    info!("Stdio transport finished");
    result
}

async fn run_loop<R, W>(
    dispatcher: &GuardedDispatcher,
    reader: R,
    writer: &mut W,
    cancel: &CancellationToken,
) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    // Frames stay raw bytes so invalid UTF-8 reaches the JSON parser as a parse error.
    let codec = AnyDelimiterCodec::new_with_max_length(b"\n".to_vec(), b"\n".to_vec(), MAX_MESSAGE_BYTES);
    let mut lines = FramedRead::new(reader, codec);

    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => break,
            next = lines.next() => next,
        };

        let line = match next {
            None => {
                debug!("Stdin closed");
                break;
            }
            Some(Ok(line)) => line,
            Some(Err(AnyDelimiterCodecError::MaxChunkLengthExceeded)) => {
                warn!("Dropping stdio message larger than {} bytes", MAX_MESSAGE_BYTES);
                let reply = McpResponse::error(
                    None,
                    McpError::ParseError(Some(format!(
                        "message exceeds {} bytes",
                        MAX_MESSAGE_BYTES
                    ))),
                );
                write_frame(writer, &serde_json::to_vec(&reply)?).await?;
                continue;
            }
            Some(Err(AnyDelimiterCodecError::Io(e))) => return Err(e.into()),
        };

        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        if let Some(reply) = dispatcher.handle(&line, cancel).await {
            write_frame(writer, &reply).await?;
        }
    }

    Ok(())
}

async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, frame: &[u8]) -> Result<()> {
    writer.write_all(frame).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}
