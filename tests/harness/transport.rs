//! In-memory transports with scripted faults.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Buf, Bytes};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

/// Yields `inbound` once, then never becomes readable again. Every write
/// fails with `BrokenPipe`.
#[derive(Debug)]
pub struct BrokenWriter {
    inbound: Bytes,
}

impl BrokenWriter {
    pub fn new(inbound: impl Into<Bytes>) -> Self {
        Self {
            inbound: inbound.into(),
        }
    }
}

impl AsyncRead for BrokenWriter {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if self.inbound.is_empty() {
            return Poll::Pending;
        }
        let n = self.inbound.len().min(buf.remaining());
        buf.put_slice(&self.inbound[..n]);
        self.inbound.advance(n);
        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for BrokenWriter {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Poll::Ready(Err(io::ErrorKind::BrokenPipe.into()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}
