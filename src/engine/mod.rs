// src/engine/mod.rs

//! Event loop for treewatch.
//!
//! The per-record semantics (filters, handlers, handing events to the sink)
//! live in [`dispatcher`]; the async/IO shell that reads the kernel channel
//! is implemented in [`runtime`].

pub mod dispatcher;
pub mod runtime;

pub use dispatcher::{Disposition, EventDispatcher};
pub use runtime::Runtime;
