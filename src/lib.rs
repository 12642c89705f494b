//! # bitacora
//!
//! A small blog server. Articles live as one JSON file each in a directory;
//! visitors read them as plain HTML; an administrator holding a shared
//! password creates and edits them through two forms.
//!
//! ## The contract
//!
//! bitacora serves plain HTTP from a single process. Whatever sits in front
//! of it (nginx, a k8s ingress) owns the rest:
//!
//! - **TLS termination**
//! - **Body-size limits**: form bodies are buffered whole
//! - **Rate limiting and slow-client protection**
//!
//! What bitacora does:
//!
//! - Radix-tree routing via [`matchit`], one tree per method
//! - Async I/O on tokio and hyper, with graceful shutdown on SIGTERM / Ctrl-C
//! - A record store over a pluggable [`Storage`] (filesystem or in-memory)
//! - askama templates, so every user-supplied string is escaped on output
//!
//! ## Wiring
//!
//! ```rust,no_run
//! use bitacora::{Articles, Blog, FsStorage, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), bitacora::Error> {
//!     let storage = FsStorage::open("articulos").await?;
//!     let blog = Blog::new(Articles::new(storage), "1234");
//!
//!     Server::bind("0.0.0.0:3000".parse().unwrap())
//!         .serve(blog.into_router())
//!         .await
//! }
//! ```

mod error;
mod handler;
mod method;
mod request;
mod response;
mod router;
mod server;
mod status;

pub mod article;
pub mod blog;
pub mod config;
pub mod page;
pub mod storage;

pub use article::{Article, ArticleError, Articles, Draft};
pub use blog::Blog;
pub use config::Config;
pub use error::Error;
pub use handler::Handler;
pub use method::Method;
pub use request::{Form, Request};
pub use response::{ContentType, IntoResponse, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
pub use status::Status;
pub use storage::{FsStorage, MemoryStorage, Storage};
