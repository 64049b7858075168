use std::io::Result;
use std::pin::Pin;
use std::task::{Context, Poll};

use async_channel::Sender;
use pin_project::pin_project;
use tokio::io::{AsyncRead, ReadBuf};

use crate::types::TransferStatistics;

/// Reports every chunk read from the inner reader to the statistics channel.
#[pin_project]
pub struct AsyncReadWithCallback<R: AsyncRead> {
    #[pin]
    inner: R,
    stats_sender: Sender<TransferStatistics>,
}

impl<R: AsyncRead> AsyncReadWithCallback<R> {
    pub fn new(inner: R, stats_sender: Sender<TransferStatistics>) -> Self {
        Self {
            inner,
            stats_sender,
        }
    }
}

impl<R: AsyncRead> AsyncRead for AsyncReadWithCallback<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<Result<()>> {
        let this = self.project();

        let before = buf.filled().len();

        let result = this.inner.poll_read(cx, buf);
        if !result.is_ready() {
            return result;
        }

        let transferred_bytes = buf.filled().len() - before;
        if 0 < transferred_bytes {
            // the statistics channel is unbounded, so this never waits.
            let _ = this
                .stats_sender
                .try_send(TransferStatistics::TransferBytes(transferred_bytes as u64));
        }

        result
    }
}
