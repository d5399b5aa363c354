//! Host session store abstraction.
//!
//! This module defines the trait that decouples the namespaced store from
//! the host's session mechanism. The host owns cookie handling, session IDs
//! and persistence; the store only needs to start the session and reach
//! its namespace → bucket mapping.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::error::Result;

/// Variables of one namespace, in insertion order.
pub type Bucket = Map<String, Value>;

/// Top-level session mapping: namespace → bucket.
pub type Buckets = HashMap<String, Bucket>;

/// Trait for host session stores.
///
/// Implement this trait to connect the namespaced store to your session
/// mechanism. [`NamespacedStore::open`](crate::NamespacedStore::open) calls
/// [`start`](Self::start) once, only if the backend is not already active.
pub trait SessionBackend {
    /// Whether the session has been started for this request.
    fn is_active(&self) -> bool;

    /// Start the session. Must be a no-op when already active.
    fn start(&mut self) -> Result<()>;

    /// Read access to the session mapping.
    fn buckets(&self) -> &Buckets;

    /// Write access to the session mapping.
    fn buckets_mut(&mut self) -> &mut Buckets;
}

/// Lend a backend to a store without giving up ownership.
impl<B: SessionBackend + ?Sized> SessionBackend for &mut B {
    fn is_active(&self) -> bool {
        (**self).is_active()
    }

    fn start(&mut self) -> Result<()> {
        (**self).start()
    }

    fn buckets(&self) -> &Buckets {
        (**self).buckets()
    }

    fn buckets_mut(&mut self) -> &mut Buckets {
        (**self).buckets_mut()
    }
}

/// In-memory session store.
///
/// Suitable for hosts that keep sessions in process memory, and for tests.
/// Starts inactive; the first store opened over it starts it.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    buckets: Buckets,
    active: bool,
}

impl MemoryBackend {
    /// Create an empty, not yet started session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session pre-populated with data restored by the host.
    pub fn with_buckets(buckets: Buckets) -> Self {
        Self {
            buckets,
            active: false,
        }
    }

    /// Consume the backend and return its data for the host to persist.
    pub fn into_buckets(self) -> Buckets {
        self.buckets
    }
}

impl SessionBackend for MemoryBackend {
    fn is_active(&self) -> bool {
        self.active
    }

    fn start(&mut self) -> Result<()> {
        self.active = true;
        Ok(())
    }

    fn buckets(&self) -> &Buckets {
        &self.buckets
    }

    fn buckets_mut(&mut self) -> &mut Buckets {
        &mut self.buckets
    }
}
