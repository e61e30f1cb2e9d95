use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

/// Wraps a stream and counts how often its write side is shut down, i.e. how often a session
///  closed the connection.
pub struct ShutdownCountingStream<S> {
    inner: S,
    num_shutdowns: Arc<AtomicUsize>,
}

impl <S> ShutdownCountingStream<S> {
    pub fn new(inner: S) -> (ShutdownCountingStream<S>, Arc<AtomicUsize>) {
        let num_shutdowns = Arc::new(AtomicUsize::new(0));
        let stream = ShutdownCountingStream {
            inner,
            num_shutdowns: num_shutdowns.clone(),
        };
        (stream, num_shutdowns)
    }
}

impl <S: AsyncRead + Unpin> AsyncRead for ShutdownCountingStream<S> {
    fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_read(cx, buf)
    }
}

impl <S: AsyncWrite + Unpin> AsyncWrite for ShutdownCountingStream<S> {
    fn poll_write(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.get_mut().inner).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let result = Pin::new(&mut this.inner).poll_shutdown(cx);
        if result.is_ready() {
            this.num_shutdowns.fetch_add(1, Ordering::SeqCst);
        }
        result
    }
}
