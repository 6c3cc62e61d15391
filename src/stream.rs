//! The lazy chunk stream an archive is produced through.

use std::pin::Pin;
use std::task::{Context, Poll, ready};

use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::warn;

use crate::error::{ArchiveError, Result};

/// Archive bytes, produced in order as the consumer polls.
///
/// The first error ends the stream. Dropping it closes whatever source file
/// was open.
pub struct ArchiveStream {
    inner: Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>,
    produced: u64,
}

impl ArchiveStream {
    pub(crate) fn new<S>(inner: S) -> Self
    where
        S: Stream<Item = Result<Bytes>> + Send + 'static,
    {
        Self {
            inner: Box::pin(inner),
            produced: 0,
        }
    }

    /// Bytes yielded so far.
    pub fn bytes_produced(&self) -> u64 {
        self.produced
    }
}

impl Stream for ArchiveStream {
    type Item = Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        match ready!(this.inner.as_mut().poll_next(cx)) {
            Some(Ok(chunk)) => {
                this.produced += chunk.len() as u64;
                Poll::Ready(Some(Ok(chunk)))
            }
            Some(Err(e)) => {
                warn!(error = %e, produced = this.produced, "archive stream aborted");
                Poll::Ready(Some(Err(e)))
            }
            None => Poll::Ready(None),
        }
    }
}

impl std::fmt::Debug for ArchiveStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveStream")
            .field("produced", &self.produced)
            .finish_non_exhaustive()
    }
}

/// Drain `stream` into `writer`, returning the number of bytes written.
pub async fn write_all<W>(mut stream: ArchiveStream, writer: &mut W) -> Result<u64>
where
    W: AsyncWrite + Unpin,
{
    while let Some(chunk) = stream.try_next().await? {
        writer.write_all(&chunk).await.map_err(ArchiveError::Io)?;
    }
    writer.flush().await?;
    Ok(stream.bytes_produced())
}
