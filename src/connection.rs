use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::select;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::SessionError;
use crate::util::close_once::CloseOnce;
use crate::util::shutdown::shutdown_requested;

/// A session's side of the connection: the write half, used only by the session's decision loop,
///  and the background task that owns the read half.
///
/// Closing is idempotent: whichever fault path gets there first shuts down the write half and
///  stops the reader, all later calls are no-ops.
pub struct Connection<W> {
    writer: W,
    reader: Option<JoinHandle<Result<(), SessionError>>>,
    close_guard: CloseOnce,
}

impl <W: AsyncWrite + Unpin> Connection<W> {
    pub fn new(writer: W, reader: JoinHandle<Result<(), SessionError>>) -> Connection<W> {
        Connection {
            writer,
            reader: Some(reader),
            close_guard: CloseOnce::new(),
        }
    }

    pub async fn write_all(&mut self, buf: &[u8]) -> Result<(), SessionError> {
        if self.close_guard.is_closed() {
            return Err(SessionError::ConnectionClosed);
        }
        self.writer.write_all(buf).await?;
        Ok(())
    }

    /// Writes like [Connection::write_all], but abandons the write as soon as shutdown is
    ///  requested, so a peer that stopped reading cannot hold the session open. Returns `false`
    ///  if the write was abandoned, possibly after writing part of the buffer.
    pub async fn write_all_unless_shutdown(&mut self, buf: &[u8], shutdown: &mut watch::Receiver<bool>) -> Result<bool, SessionError> {
        select! {
            biased;
            _ = shutdown_requested(shutdown) => Ok(false),
            result = self.write_all(buf) => result.map(|_| true),
        }
    }

    /// Waits for the reader task to finish and returns the reason it stopped. This is meant to be
    ///  called after the reader stopped forwarding data.
    pub async fn reader_outcome(&mut self) -> Result<(), SessionError> {
        match self.reader.take() {
            Some(handle) => match handle.await {
                Ok(result) => result,
                Err(e) => {
                    warn!("reader task terminated abnormally: {}", e);
                    Err(SessionError::ConnectionClosed)
                }
            },
            None => Err(SessionError::ConnectionClosed),
        }
    }

    /// returns `true` if this call actually closed the connection
    pub async fn close(&mut self) -> bool {
        if !self.close_guard.try_close() {
            return false;
        }

        if let Err(e) = self.writer.shutdown().await {
            debug!("error shutting down connection: {}", e);
        }
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        info!("disconnected");
        true
    }

    pub fn is_closed(&self) -> bool {
        self.close_guard.is_closed()
    }
}
