use bytes::Buf;
use hyper::body::Body;
use pin_project_lite::pin_project;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

pin_project! {
    /// Polls a body to its end, keeping only the number of bytes seen.
    pub struct DrainBodyFuture<B: Body> {
        #[pin]
        body: B,
        drained: u64,
    }
}

impl<B> DrainBodyFuture<B>
where
    B: Body,
{
    #[inline]
    #[must_use]
    pub fn new(body: B) -> Self {
        Self { body, drained: 0 }
    }
}

impl<B> Future for DrainBodyFuture<B>
where
    B: Body,
{
    type Output = Result<u64, anyhow::Error>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut slf = self.project();
        loop {
            if slf.body.is_end_stream() {
                return Poll::Ready(Ok(*slf.drained));
            }
            let Some(next_res) = std::task::ready!(slf.body.as_mut().poll_frame(cx)) else {
                return Poll::Ready(Ok(*slf.drained));
            };
            let frame = match next_res {
                Ok(frame) => frame,
                Err(_e) => {
                    return Poll::Ready(Err(anyhow::anyhow!("Failed to poll next frame")));
                }
            };
            // Trailers carry nothing worth counting
            if let Ok(data) = frame.into_data() {
                *slf.drained += data.remaining() as u64;
            }
        }
    }
}
