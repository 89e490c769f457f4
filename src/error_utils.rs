//! Error reporting helpers.
//!
//! Failures reach the operator as one line: the innermost message of the
//! error chain. The full chain goes to the log.

use tracing::warn;

/// Message of the deepest `source()` in the chain.
pub fn innermost_message(error: &dyn std::error::Error) -> String {
    let mut current = error;
    while let Some(source) = current.source() {
        current = source;
    }
    current.to_string()
}

/// Every message in the chain, outermost first, joined with `: `.
pub fn chain_message(error: &dyn std::error::Error) -> String {
    let mut messages = vec![error.to_string()];
    let mut current = error;
    while let Some(source) = current.source() {
        let message = source.to_string();
        if messages.last() != Some(&message) {
            messages.push(message);
        }
        current = source;
    }
    messages.join(": ")
}

/// Log the full chain and print the flattened message to stderr.
pub fn report_error(error: &dyn std::error::Error) {
    warn!("{}", chain_message(error));
    eprintln!("ERROR: {}", innermost_message(error));
}

/// Report a warning consistently with both logging and user-facing output.
pub fn report_warning<E: std::fmt::Display>(warning: &E) {
    warn!("{}", warning);
    eprintln!("WARNING: {}", warning);
}
