//! r6bind SDK - the foreign-runtime ABI
//!
//! This crate provides the minimal types and traits a foreign-runtime
//! connection implements so that the r6bind engine can mirror its classes,
//! without depending on the engine itself.
//!
//! # Example
//!
//! ```ignore
//! use r6bind_sdk::{CallArgs, ForeignRuntime, ForeignValue, Handle};
//!
//! fn push(rt: &dyn ForeignRuntime, stack: Handle) -> r6bind_sdk::AbiResult<ForeignValue> {
//!     let push = rt.get_attribute(stack, "push")?;
//!     rt.invoke(&push, &CallArgs::none().arg(5))
//! }
//! ```

#![warn(missing_docs)]

pub mod args;
pub mod error;
pub mod runtime;
pub mod value;

pub use args::CallArgs;
pub use error::{AbiResult, ForeignError};
pub use runtime::ForeignRuntime;
pub use value::{ForeignId, ForeignValue, Handle};
