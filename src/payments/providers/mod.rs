//! Payment gateway implementations
//!
//! Concrete implementations of the PaymentGateway trait.

pub mod razorpay;

pub use razorpay::{RazorpayConfig, RazorpayProvider};
