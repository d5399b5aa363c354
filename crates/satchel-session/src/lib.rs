//! Namespaced key/value storage over a host session store.
//!
//! A host keeps one flat mapping per visitor session. This crate partitions
//! it into independent named buckets so unrelated features cannot collide
//! on variable names:
//! - explicit namespaces (`set_in`, `get_in`, ...)
//! - the unscoped default namespace (`"*"`)
//! - a page-scoped namespace keyed by the current request path
//!
//! A namespace exists only while it holds at least one variable.
//!
//! # Example
//!
//! ```rust,ignore
//! use satchel_session::{MemoryBackend, NamespacedStore, PageId};
//!
//! let page = PageId::from_request_path("/checkout?step=2");
//! let mut store = NamespacedStore::open(MemoryBackend::new(), page)?;
//!
//! store.set("locale", "da");
//! store.page_set("step", 2, None);
//! assert_eq!(store.get_in("/checkout", "step"), Some(&2.into()));
//! ```

mod backend;
mod error;
mod page;
mod store;
mod value;

pub use backend::{Bucket, Buckets, MemoryBackend, SessionBackend};
pub use error::{Error, Result};
pub use page::PageId;
pub use store::NamespacedStore;
pub use value::IntoValue;

/// Dynamic value stored under a session variable.
pub use serde_json::Value;
