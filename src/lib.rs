//! asynciter: async iterator helpers for a JavaScript runtime
//!
//! asynciter implements the combinators of the async iterator helpers
//! (`map`, `filter`, `take`, `drop`, `flatMap`, `indexed`, `reduce`,
//! `toArray`, `forEach`, `some`, `every`, `find`) over any object that
//! follows the async iterator protocol. No coroutines are involved: each
//! operator body is a set of continuations driven by promise reactions on a
//! single-threaded microtask queue.
//!
//! # Quick Start
//!
//! ```no_run
//! use asynciter::{Runtime, Value};
//!
//! fn main() -> asynciter::Result<()> {
//!     let runtime = Runtime::new();
//!     let source = Value::new_array(vec![Value::from(1), Value::from(2), Value::from(3)]);
//!     let double = Value::native_function("double", |args| {
//!         Ok(Value::Number(args[0].to_number() * 2.0))
//!     });
//!     let promise = runtime.from(&source)?.map(&double)?.to_array()?;
//!     println!("{:?}", runtime.block_on(&promise)?);
//!     Ok(())
//! }
//! ```
//!
//! # Module Overview
//!
//! | Category | Modules |
//! |----------|---------|
//! | **Helpers** | [`runtime::async_iterator`] |
//! | **Host** | [`runtime`], [`event_loop`] |
//! | **Support** | [`config`], [`error`](Error) |
#![allow(clippy::new_without_default)]
#![allow(clippy::should_implement_trait)]
#![allow(clippy::enum_variant_names)]

pub mod config;
pub mod error;
pub mod event_loop;
pub mod prelude;
pub mod runtime;

pub use config::EngineConfig;
pub use error::{Error, ErrorKind, Result};
pub use runtime::{AsyncIterator, AsyncIteratorHelper, ObjectKind, Promise, PromiseState, Runtime, Value};

/// asynciter version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
