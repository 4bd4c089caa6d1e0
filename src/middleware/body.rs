// Response body wrapper that counts the bytes actually written

use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::{Body, Bytes};
use http_body::{Frame, SizeHint};
use prometheus::Histogram;

/// Forwards every frame of `inner` and observes the total data length once
///
/// The observation happens at end of stream, or on drop when the client
/// goes away or the body fails part way through.
pub(crate) struct CountingBody {
    inner: Body,
    written: u64,
    histogram: Option<Histogram>,
}

impl CountingBody {
    pub(crate) fn new(inner: Body, histogram: Histogram) -> Self {
        Self {
            inner,
            written: 0,
            histogram: Some(histogram),
        }
    }

    fn finish(&mut self) {
        if let Some(histogram) = self.histogram.take() {
            histogram.observe(self.written as f64);
        }
    }
}

impl http_body::Body for CountingBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = &mut *self;
        let polled = Pin::new(&mut this.inner).poll_frame(cx);
        match &polled {
            Poll::Ready(Some(Ok(frame))) => {
                if let Some(data) = frame.data_ref() {
                    this.written += data.len() as u64;
                }
            }
            Poll::Ready(None) => this.finish(),
            _ => {}
        }
        polled
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl Drop for CountingBody {
    fn drop(&mut self) {
        self.finish();
    }
}
