//! Remote service access.
//!
//! The typed HTTP client and the validation applied before anything is sent.

pub mod client;
pub mod submission;

pub use client::{ApiClient, ApiConfig, ApiError};
pub use submission::{
    validate_category_name, validate_model_name, validate_word, Submission, ValidatedSubmission,
};
