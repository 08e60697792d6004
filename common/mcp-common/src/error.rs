//! Error constructors for MCP tool failures
//!
//! Tools return `Err(McpError)` for request-scoped failures. These helpers
//! pick the JSON-RPC error code so servers classify failures the same way:
//!
//! | Helper | Use for |
//! |---|---|
//! | [`invalid_params`] | malformed or rejected arguments |
//! | [`invalid_request`] | well-formed requests the server refuses (policy) |
//! | [`not_found`] | a named resource does not exist |
//! | [`internal_error`] | failures of the backing system |

use rmcp::ErrorData as McpError;

/// Create an internal error with a message
pub fn internal_error(message: impl Into<String>) -> McpError {
    McpError::internal_error(message.into(), None)
}

/// Create an invalid params error with a message
///
/// ```rust,ignore
/// if name.is_empty() {
///     return Err(invalid_params("name cannot be empty"));
/// }
/// ```
pub fn invalid_params(message: impl Into<String>) -> McpError {
    McpError::invalid_params(message.into(), None)
}

/// Create an invalid request error, used when a policy refuses the call
pub fn invalid_request(message: impl Into<String>) -> McpError {
    McpError::invalid_request(message.into(), None)
}

/// Create a resource-not-found error
pub fn not_found(message: impl Into<String>) -> McpError {
    McpError::resource_not_found(message.into(), None)
}
