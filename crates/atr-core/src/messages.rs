//! Fixed user-facing messages, one per error type.
//!
//! These are what a console shows by default. Technical detail (`details`,
//! `stack`) stays behind an explicit "show details" affordance.

use crate::enums::ErrorType;

/// The non-technical message shown for an error of type `error_type`.
#[must_use]
pub const fn user_message(error_type: ErrorType) -> &'static str {
    match error_type {
        ErrorType::Authentication => "Please log in to continue",
        ErrorType::Authorization => "You do not have permission to perform this action",
        ErrorType::Network => "Please check your internet connection and try again",
        ErrorType::Server => "Our servers are experiencing issues. Please try again later",
        ErrorType::Client => "Something went wrong. Please try again",
        ErrorType::Validation => "Please check your input and try again",
        ErrorType::Unknown => "An unexpected error occurred",
    }
}
