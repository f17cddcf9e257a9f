//! Pool of reusable JPEG encoders
//!
//! Encoders are not reentrant, so every batch task or pool task leases its
//! own. A lease hands out `&mut JpegEncoder` and returns the encoder to the
//! idle queue when dropped.

use crossbeam_queue::ArrayQueue;
use ow_frame::{FrameError, Result};
use ow_jpeg::JpegEncoder;
use std::mem::ManuallyDrop;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};

pub struct EncoderPool {
    idle: ArrayQueue<JpegEncoder>,
    created: AtomicUsize,
    capacity: usize,
}

impl EncoderPool {
    /// Create a pool keeping at most `capacity` idle encoders.
    ///
    /// One encoder is created up front so codec resource failures surface
    /// at construction.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(FrameError::Configuration(
                "encoder pool capacity must be positive".to_string(),
            ));
        }

        let idle = ArrayQueue::new(capacity);
        // Queue is empty and capacity >= 1, so this push cannot be rejected
        let _ = idle.push(JpegEncoder::new()?);

        Ok(Self {
            idle,
            created: AtomicUsize::new(1),
            capacity,
        })
    }

    /// Take an idle encoder or create a new one
    pub fn acquire(&self) -> Result<EncoderLease<'_>> {
        let encoder = match self.idle.pop() {
            Some(encoder) => encoder,
            None => {
                let encoder = JpegEncoder::new()?;
                let created = self.created.fetch_add(1, Ordering::Relaxed) + 1;
                log::trace!("Encoder pool created encoder #{}", created);
                encoder
            }
        };

        Ok(EncoderLease {
            pool: self,
            encoder: ManuallyDrop::new(encoder),
        })
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            capacity: self.capacity,
            idle: self.idle.len(),
            created: self.created.load(Ordering::Relaxed),
        }
    }
}

/// Exclusive use of one encoder until dropped
pub struct EncoderLease<'a> {
    pool: &'a EncoderPool,
    encoder: ManuallyDrop<JpegEncoder>,
}

impl Deref for EncoderLease<'_> {
    type Target = JpegEncoder;

    fn deref(&self) -> &JpegEncoder {
        &self.encoder
    }
}

impl DerefMut for EncoderLease<'_> {
    fn deref_mut(&mut self) -> &mut JpegEncoder {
        &mut self.encoder
    }
}

impl Drop for EncoderLease<'_> {
    fn drop(&mut self) {
        // SAFETY: the encoder is taken exactly once, here
        let encoder = unsafe { ManuallyDrop::take(&mut self.encoder) };
        // Full queue: let the surplus encoder go
        let _ = self.pool.idle.push(encoder);
    }
}

/// Lazily acquired lease, for tasks that may never encode
pub struct EncoderSlot<'a> {
    pool: &'a EncoderPool,
    lease: Option<EncoderLease<'a>>,
}

impl<'a> EncoderSlot<'a> {
    pub fn new(pool: &'a EncoderPool) -> Self {
        Self { pool, lease: None }
    }

    pub fn get(&mut self) -> Result<&mut JpegEncoder> {
        let lease = match self.lease.take() {
            Some(lease) => lease,
            None => self.pool.acquire()?,
        };
        Ok(&mut **self.lease.insert(lease))
    }

    pub fn is_acquired(&self) -> bool {
        self.lease.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub capacity: usize,
    pub idle: usize,
    pub created: usize,
}
