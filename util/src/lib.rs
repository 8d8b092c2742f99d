pub mod build;
mod macros;

#[doc(hidden)]
pub use ::tracing;
