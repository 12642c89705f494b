//! Unified infrastructure error type.

use thiserror::Error;

/// The error type returned by bitacora's infrastructure operations.
///
/// Application-level failures (404, 403, a rejected form) are expressed as
/// rendered [`Response`](crate::Response) values, and article failures as
/// [`ArticleError`](crate::ArticleError). This type surfaces what stops the
/// process from serving at all: opening the articles directory, binding the
/// port, accepting connections.
#[derive(Debug, Error)]
#[error("io: {0}")]
pub struct Error(#[from] std::io::Error);
