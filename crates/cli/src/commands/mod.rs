//! Command implementations.

mod demo;
mod info;
mod serve;
mod validate;

pub use demo::run_demo;
pub use info::run_info;
pub use serve::run_serve;
pub use validate::run_validate;
