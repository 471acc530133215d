//! # Verifier
//!
//! Step-by-step verification of sequences plus the demo scenario catalog.
//!
//! # Example
//!
//! ```no_run
//! use stream_engine::Sequence;
//! use verifier::StepVerifier;
//!
//! # async fn run() -> Result<(), verifier::VerifyError> {
//! StepVerifier::create(Sequence::just(["hello", "there"]))
//!     .expect_subscription()
//!     .expect_next(["hello", "there"])
//!     .verify_complete()
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod error;
pub mod scenarios;
mod step;

pub use error::VerifyError;
pub use scenarios::{Scenario, ScenarioContext, SCENARIOS};
pub use step::StepVerifier;
