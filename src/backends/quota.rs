//! Per-session limit on free generations
//!
//! Wraps any backend. A slot is reserved before the inner call and given back
//! if that call fails, so only successful generations count and concurrent
//! requests from one session cannot overshoot the limit. Sessions whose
//! reservations all failed are dropped from the table, and the table keeps at
//! most `capacity` sessions, evicting the least recently seen.

use super::ProcessingBackend;
use crate::{
    error::{Result, StudioError},
    types::{BackgroundOptions, BlurIntensity, RequestContext},
};
use image::DynamicImage;
use lru::LruCache;
use std::{
    num::NonZeroUsize,
    sync::{Arc, Mutex, MutexGuard},
};
use tracing::{debug, info};

/// Sessions tracked before the least recently seen one is forgotten
pub const DEFAULT_TRACKED_SESSIONS: usize = 10_000;

/// Decorator enforcing a fixed number of successful generations per session
pub struct QuotaBackend {
    inner: Arc<dyn ProcessingBackend>,
    limit: u32,
    usage: Mutex<LruCache<String, u32>>,
}

impl QuotaBackend {
    #[must_use]
    pub fn new(inner: Arc<dyn ProcessingBackend>, limit: u32) -> Self {
        Self::with_capacity(
            inner,
            limit,
            NonZeroUsize::new(DEFAULT_TRACKED_SESSIONS).unwrap_or(NonZeroUsize::MIN),
        )
    }

    /// Like [`QuotaBackend::new`], remembering at most `capacity` sessions
    #[must_use]
    pub fn with_capacity(
        inner: Arc<dyn ProcessingBackend>,
        limit: u32,
        capacity: NonZeroUsize,
    ) -> Self {
        Self {
            inner,
            limit,
            usage: Mutex::new(LruCache::new(capacity)),
        }
    }

    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Generations left for `session_id`
    ///
    /// # Errors
    /// - `Internal` if the usage table lock is poisoned
    pub fn remaining(&self, session_id: &str) -> Result<u32> {
        let used = self.usage()?.peek(session_id).copied().unwrap_or(0);
        Ok(self.limit.saturating_sub(used))
    }

    /// Number of sessions currently holding usage
    ///
    /// # Errors
    /// - `Internal` if the usage table lock is poisoned
    pub fn tracked_sessions(&self) -> Result<usize> {
        Ok(self.usage()?.len())
    }

    /// Forget the usage of `session_id`
    ///
    /// # Errors
    /// - `Internal` if the usage table lock is poisoned
    pub fn reset(&self, session_id: &str) -> Result<()> {
        self.usage()?.pop(session_id);
        Ok(())
    }

    fn usage(&self) -> Result<MutexGuard<'_, LruCache<String, u32>>> {
        self.usage
            .lock()
            .map_err(|_| StudioError::internal("quota usage table lock poisoned"))
    }

    fn reserve(&self, session_id: &str) -> Result<()> {
        let mut usage = self.usage()?;
        let used = usage.get(session_id).copied().unwrap_or(0);
        if used >= self.limit {
            info!(session_id, limit = self.limit, "Session quota exhausted");
            return Err(StudioError::QuotaExceeded { limit: self.limit });
        }
        if let Some((evicted, _)) = usage.push(session_id.to_string(), used + 1) {
            if evicted != session_id {
                debug!(session_id = %evicted, "Evicted least recently seen session");
            }
        }
        debug!(session_id, used = used + 1, limit = self.limit, "Reserved generation");
        Ok(())
    }

    fn release(&self, session_id: &str) {
        if let Ok(mut usage) = self.usage() {
            match usage.peek(session_id).copied() {
                Some(used) if used > 1 => {
                    usage.put(session_id.to_string(), used - 1);
                },
                Some(_) => {
                    usage.pop(session_id);
                },
                None => {},
            }
        }
    }

    fn guarded<F>(&self, ctx: &RequestContext, call: F) -> Result<DynamicImage>
    where
        F: FnOnce(&dyn ProcessingBackend) -> Result<DynamicImage>,
    {
        self.reserve(ctx.session_id())?;
        let result = call(self.inner.as_ref());
        if result.is_err() {
            self.release(ctx.session_id());
        }
        result
    }
}

impl ProcessingBackend for QuotaBackend {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn remove_background(
        &self,
        image: &DynamicImage,
        options: &BackgroundOptions,
        ctx: &RequestContext,
    ) -> Result<DynamicImage> {
        self.guarded(ctx, |inner| inner.remove_background(image, options, ctx))
    }

    fn upscale(&self, image: &DynamicImage, ctx: &RequestContext) -> Result<DynamicImage> {
        self.guarded(ctx, |inner| inner.upscale(image, ctx))
    }

    fn blur_background(
        &self,
        image: &DynamicImage,
        intensity: BlurIntensity,
        ctx: &RequestContext,
    ) -> Result<DynamicImage> {
        self.guarded(ctx, |inner| inner.blur_background(image, intensity, ctx))
    }
}
