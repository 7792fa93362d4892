//! Pooled body buffers.
//!
//! Every push request needs its body in memory before it can be classified.
//! Rather than allocating per request, buffers are recycled through a pool
//! shared by all middleware instances in the process.
//!
//! A buffer is owned by exactly one request from [`BufferPool::acquire`]
//! until its [`PooledBuffer`] guard drops. The guard returns it on every exit
//! path, including early returns on read or parse errors. Bytes that must
//! outlive the guard are copied out; nothing may keep a view into pooled
//! storage.

use std::ops::{Deref, DerefMut};

use bytes::BytesMut;
use http_body_util::BodyExt;
use parking_lot::Mutex;

use crate::error::BoxError;
use crate::request::Body;

/// Idle buffers kept for reuse. Extra returns are dropped.
const MAX_IDLE: usize = 64;

/// Buffers that grew beyond this are freed instead of recycled. Also caps
/// how much a declared content length reserves up front.
const MAX_RETAINED_CAPACITY: usize = 1024 * 1024;

static SHARED: BufferPool = BufferPool::new();

/// A lock-protected free list of byte buffers.
pub struct BufferPool {
    idle: Mutex<Vec<BytesMut>>,
}

impl BufferPool {
    pub const fn new() -> Self {
        Self { idle: parking_lot::const_mutex(Vec::new()) }
    }

    /// The process-wide pool used by the push middleware.
    pub fn shared() -> &'static BufferPool {
        &SHARED
    }

    /// Takes an empty buffer, reusing an idle one when available.
    pub fn acquire(&self) -> PooledBuffer<'_> {
        let mut buf = self.idle.lock().pop().unwrap_or_default();
        buf.clear();
        PooledBuffer { buf, pool: self }
    }

    /// Number of buffers currently waiting for reuse.
    pub fn idle(&self) -> usize {
        self.idle.lock().len()
    }

    fn release(&self, mut buf: BytesMut) {
        if buf.capacity() > MAX_RETAINED_CAPACITY {
            return;
        }
        buf.clear();
        let mut idle = self.idle.lock();
        if idle.len() < MAX_IDLE {
            idle.push(buf);
        }
    }
}

impl Default for BufferPool {
    fn default() -> Self { Self::new() }
}

/// Exclusive loan of a pooled buffer; returns it to the pool on drop.
pub struct PooledBuffer<'a> {
    buf: BytesMut,
    pool: &'a BufferPool,
}

impl PooledBuffer<'_> {
    /// Reserves room for `len` bytes. A hint only: clamped, and the buffer
    /// still grows past it if the body turns out longer.
    pub fn reserve_hint(&mut self, len: u64) {
        let len = usize::try_from(len).unwrap_or(usize::MAX).min(MAX_RETAINED_CAPACITY);
        self.buf.reserve(len);
    }

    /// Drains `body` into the buffer, appending every data frame.
    /// Trailers are ignored.
    pub async fn fill_from(&mut self, body: &mut Body) -> Result<(), BoxError> {
        while let Some(frame) = body.frame().await {
            if let Ok(data) = frame?.into_data() {
                self.buf.extend_from_slice(&data);
            }
        }
        Ok(())
    }
}

impl Deref for PooledBuffer<'_> {
    type Target = BytesMut;

    fn deref(&self) -> &BytesMut { &self.buf }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut BytesMut { &mut self.buf }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.buf));
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use http_body::Frame;
    use http_body_util::StreamBody;

    use super::*;

    fn body_of(chunks: Vec<Result<&'static str, &'static str>>) -> Body {
        let frames = chunks.into_iter().map(|chunk| {
            chunk.map(|s| Frame::data(Bytes::from_static(s.as_bytes()))).map_err(BoxError::from)
        });
        StreamBody::new(futures_util::stream::iter(frames)).boxed_unsync()
    }

    #[test]
    fn released_buffers_are_reused_empty() {
        let pool = BufferPool::new();
        {
            let mut buf = pool.acquire();
            buf.extend_from_slice(b"left over");
        }
        assert_eq!(pool.idle(), 1);

        let buf = pool.acquire();
        assert!(buf.is_empty());
        assert!(buf.capacity() >= b"left over".len());
        assert_eq!(pool.idle(), 0);
    }

    #[test]
    fn oversized_buffers_are_not_retained() {
        let pool = BufferPool::new();
        {
            let mut buf = pool.acquire();
            buf.reserve(MAX_RETAINED_CAPACITY + 1);
        }
        assert_eq!(pool.idle(), 0);
    }

    #[test]
    fn idle_list_is_bounded() {
        let pool = BufferPool::new();
        let loans: Vec<_> = (0..MAX_IDLE + 8).map(|_| pool.acquire()).collect();
        drop(loans);
        assert_eq!(pool.idle(), MAX_IDLE);
    }

    #[test]
    fn reserve_hint_is_clamped() {
        let pool = BufferPool::new();
        let mut buf = pool.acquire();
        buf.reserve_hint(u64::MAX);
        assert!(buf.capacity() <= 2 * MAX_RETAINED_CAPACITY);
        assert!(buf.capacity() >= MAX_RETAINED_CAPACITY);
    }

    #[tokio::test]
    async fn fill_from_concatenates_frames() {
        let pool = BufferPool::new();
        let mut buf = pool.acquire();
        let mut body = body_of(vec![Ok("hel"), Ok("lo")]);

        buf.fill_from(&mut body).await.unwrap();

        assert_eq!(&buf[..], b"hello");
    }

    #[tokio::test]
    async fn fill_error_still_returns_buffer() {
        let pool = BufferPool::new();
        {
            let mut buf = pool.acquire();
            let mut body = body_of(vec![Ok("partial"), Err("connection reset")]);

            let err = buf.fill_from(&mut body).await.unwrap_err();
            assert_eq!(err.to_string(), "connection reset");
        }
        assert_eq!(pool.idle(), 1);
    }
}
