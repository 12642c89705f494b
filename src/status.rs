//! HTTP status codes as a typed enum.
//!
//! Only the codes the blog actually answers with are listed. Use [`Status`]
//! anywhere a status code is accepted: `Response::status()`,
//! `Response::builder().status()`, [`render_page`](crate::page::render_page),
//! or as a bare handler return value.
//!
//! ```rust
//! use bitacora::{Response, Status};
//!
//! Response::status(Status::NotFound);
//!
//! Response::builder()
//!     .status(Status::Forbidden)
//!     .text("wrong password");
//! ```

/// The HTTP status codes used by bitacora.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
    // ── 2xx Success ───────────────────────────────────────────────────────────
    Ok,                  // 200

    // ── 4xx Client errors ─────────────────────────────────────────────────────
    BadRequest,          // 400
    Forbidden,           // 403
    NotFound,            // 404

    // ── 5xx Server errors ─────────────────────────────────────────────────────
    InternalServerError, // 500
}

impl Status {
    /// Canonical reason phrase, as sent on the status line.
    pub fn reason(self) -> &'static str {
        match self {
            Self::Ok                  => "OK",
            Self::BadRequest          => "Bad Request",
            Self::Forbidden           => "Forbidden",
            Self::NotFound            => "Not Found",
            Self::InternalServerError => "Internal Server Error",
        }
    }
}

impl From<Status> for u16 {
    fn from(s: Status) -> u16 {
        match s {
            Status::Ok                  => 200,
            Status::BadRequest          => 400,
            Status::Forbidden           => 403,
            Status::NotFound            => 404,
            Status::InternalServerError => 500,
        }
    }
}

impl From<Status> for http::StatusCode {
    fn from(s: Status) -> http::StatusCode {
        // Every variant above is a registered code, so the fallback is unreachable.
        http::StatusCode::from_u16(s.into()).unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR)
    }
}

#[cfg(test)]
mod tests {
    use super::Status;

    #[test]
    fn codes_match_reason_phrases() {
        for status in [
            Status::Ok,
            Status::BadRequest,
            Status::Forbidden,
            Status::NotFound,
            Status::InternalServerError,
        ] {
            let code: http::StatusCode = status.into();
            assert_eq!(code.canonical_reason(), Some(status.reason()));
        }
    }
}
