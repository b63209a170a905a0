//! Prelude module for convenient imports
//!
//! This module provides the most commonly used types for working with
//! asynciter. Import everything from this module for quick access:
//!
//! ```no_run
//! use asynciter::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let runtime = Runtime::new();
//!     let source = Value::new_array(vec![Value::from(1), Value::from(2)]);
//!     let promise = runtime.from(&source)?.take(&Value::from(1))?.to_array()?;
//!     println!("{:?}", runtime.block_on(&promise)?);
//!     Ok(())
//! }
//! ```

// Core runtime types
pub use crate::runtime::{ObjectKind, Promise, PromiseState, Runtime, Value};

// Helpers
pub use crate::runtime::async_iterator::{AsyncIterator, AsyncIteratorHelper, GeneratorState};

// Iterator protocol
pub use crate::runtime::iterator::{create_iter_result, IteratorRecord};

// Error handling
pub use crate::error::{Error, ErrorKind, Result};

// Configuration
pub use crate::config::EngineConfig;

// Event loop
pub use crate::event_loop::{EventLoop, EventLoopStats};
