//! Payment gateway integration
//!
//! A single `PaymentGateway` trait fronts the hosted-checkout provider
//! (Razorpay): minting gateway orders and authenticating checkout
//! confirmations. `verification` records every confirmation attempt and moves
//! the order into its paid state.

pub mod providers;
pub mod traits;
pub mod types;
pub mod verification;

pub use traits::PaymentGateway;
pub use verification::{PaymentVerifier, VerificationOutcome};
