// surfbridge/src/context.rs
//
//! Declarations common to all contexts.

use bitflags::bitflags;
use std::sync::Mutex;

/// A unique ID among all currently-allocated contexts.
///
/// If you destroy a context and create a new one, the new context might have the same ID as
/// the destroyed one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ContextID(pub u64);

pub(crate) static CREATE_CONTEXT_MUTEX: Mutex<ContextID> = Mutex::new(ContextID(0));

impl ContextID {
    pub(crate) fn next() -> ContextID {
        let mut next_context_id = match CREATE_CONTEXT_MUTEX.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let id = *next_context_id;
        next_context_id.0 += 1;
        id
    }
}

bitflags! {
    /// Various flags that control client context creation.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
    pub struct ContextAttributeFlags: u8 {
        /// Wrap the native context that is current on this thread instead of creating one.
        ///
        /// External contexts are never made current by the display; the embedder owns the
        /// binding.
        const EXTERNAL_CONTEXT = 0x01;
        /// Ask the driver to generate a context reset when video memory is purged
        /// (`EGL_NV_robustness_video_memory_purge`).
        const GENERATE_RESET_ON_VIDEO_MEMORY_PURGE = 0x02;
    }
}

/// Attributes to create a client context with.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ContextAttributes {
    pub flags: ContextAttributeFlags,
}

impl ContextAttributes {
    #[inline]
    pub fn new(flags: ContextAttributeFlags) -> ContextAttributes {
        ContextAttributes { flags }
    }

    #[inline]
    pub(crate) fn is_external(&self) -> bool {
        self.flags.contains(ContextAttributeFlags::EXTERNAL_CONTEXT)
    }
}

/// Whether a context asked for resets on video memory purge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RobustnessVideoMemoryPurgeStatus {
    NotRequested,
    Requested,
}

impl From<ContextAttributeFlags> for RobustnessVideoMemoryPurgeStatus {
    fn from(flags: ContextAttributeFlags) -> RobustnessVideoMemoryPurgeStatus {
        if flags.contains(ContextAttributeFlags::GENERATE_RESET_ON_VIDEO_MEMORY_PURGE) {
            RobustnessVideoMemoryPurgeStatus::Requested
        } else {
            RobustnessVideoMemoryPurgeStatus::NotRequested
        }
    }
}
