//! Job workers.

#![allow(missing_docs)]

mod deliver;

pub use deliver::{DeliverContext, deliver_worker};
