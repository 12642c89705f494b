//! Articles and the record store that persists them.
//!
//! An article is stored as one JSON record keyed by its identifier, a slug
//! derived from the title when the article is created. [`Articles`] owns
//! every rule about those records: validation, identifier derivation,
//! exclusive creation, in-place updates, and the date-descending listing.
//! Text is stored exactly as submitted; escaping is the renderer's job.

use std::io;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::status::Status;
use crate::storage::Storage;

/// A published article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub body: String,
    pub published_at: DateTime<Utc>,
}

impl Article {
    /// `dd/mm/yyyy`, as shown in listings and on the article page.
    pub fn display_date(&self) -> String {
        self.published_at.format("%d/%m/%Y").to_string()
    }

    /// `yyyy-mm-dd`, the value format of an HTML date input.
    pub fn input_date(&self) -> String {
        self.published_at.format("%Y-%m-%d").to_string()
    }
}

/// Administrator-supplied fields for a new or edited article.
#[derive(Debug, Clone, Default)]
pub struct Draft {
    pub title: String,
    pub body: String,
    pub date: String,
}

/// Persisted shape. Field names are kept compatible with existing article
/// directories; unknown fields such as a legacy `filename` are ignored.
#[derive(Debug, Serialize, Deserialize)]
struct Record {
    #[serde(rename = "titulo")]
    title: String,
    #[serde(rename = "contenido")]
    body: String,
    #[serde(rename = "fecha")]
    published_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum ArticleError {
    #[error("{0}")]
    Validation(String),
    #[error("El artículo `{0}` ya existe.")]
    Conflict(String),
    #[error("El artículo `{0}` no existe.")]
    NotFound(String),
    #[error("record `{0}` is empty")]
    Empty(String),
    #[error("record `{id}` is malformed: {source}")]
    Malformed {
        id: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("storage error: {0}")]
    Storage(#[from] io::Error),
}

impl ArticleError {
    /// Status the routing layer answers with when this error surfaces.
    pub fn status(&self) -> Status {
        match self {
            Self::Validation(_) | Self::Conflict(_) => Status::BadRequest,
            Self::NotFound(_) | Self::Empty(_) | Self::Malformed { .. } => Status::NotFound,
            Self::Storage(_) => Status::InternalServerError,
        }
    }
}

// ── Identifiers and dates ─────────────────────────────────────────────────────

/// Derives an article identifier from its title.
///
/// Trims the title, lowercases it, collapses each inner whitespace run into
/// one `_`, then drops every character outside `[a-z0-9_-]`. Pure and
/// deterministic; may return an empty string when the title has no usable
/// characters.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut in_space = false;
    for c in title.trim().chars().flat_map(char::to_lowercase) {
        if c.is_whitespace() {
            if !in_space {
                slug.push('_');
            }
            in_space = true;
            continue;
        }
        in_space = false;
        if is_id_char(c) {
            slug.push(c);
        }
    }
    slug
}

/// Whether an externally supplied identifier may be used as a storage key.
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(is_id_char)
}

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Parses an administrator-supplied publication date.
///
/// Accepts `YYYY-MM-DD` (midnight UTC), `YYYY-MM-DDTHH:MM[:SS]` (UTC) and
/// RFC 3339 with an explicit offset.
pub fn parse_date(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(input, fmt) {
            return Some(dt.and_utc());
        }
    }
    DateTime::parse_from_rfc3339(input).ok().map(|dt| dt.with_timezone(&Utc))
}

impl Draft {
    /// Checks the required fields and parses the date.
    fn validate(&self) -> Result<DateTime<Utc>, ArticleError> {
        let missing: Vec<&str> = [
            ("título", &self.title),
            ("contenido", &self.body),
            ("fecha", &self.date),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if !missing.is_empty() {
            return Err(ArticleError::Validation(format!(
                "Faltan los datos requeridos: {}.",
                missing.join(", ")
            )));
        }

        parse_date(&self.date).ok_or_else(|| {
            ArticleError::Validation(format!("La fecha `{}` no es válida.", self.date.trim()))
        })
    }

    fn into_record(self, published_at: DateTime<Utc>) -> Record {
        Record { title: self.title, body: self.body, published_at }
    }
}

// ── Record store ──────────────────────────────────────────────────────────────

/// The article record store.
///
/// Cheap to clone; clones share the same backing [`Storage`].
#[derive(Clone)]
pub struct Articles {
    storage: Arc<dyn Storage>,
}

impl Articles {
    pub fn new(storage: impl Storage + 'static) -> Self {
        Self { storage: Arc::new(storage) }
    }

    /// Every readable article, newest first.
    ///
    /// Keys that are not valid identifiers, and empty or malformed records,
    /// are skipped with a warning. If the storage
    /// cannot be enumerated at all the result is empty.
    pub async fn list(&self) -> Vec<Article> {
        let keys = match self.storage.list().await {
            Ok(keys) => keys,
            Err(e) => {
                error!(error = %e, "failed to enumerate articles");
                return Vec::new();
            }
        };

        let mut articles = Vec::with_capacity(keys.len());
        for key in keys {
            if !is_valid_id(&key) {
                warn!(id = %key, "skipping record with an invalid identifier");
                continue;
            }
            match self.load(&key).await {
                Ok(article) => articles.push(article),
                Err(e) => warn!(id = %key, error = %e, "skipping unreadable article"),
            }
        }
        articles.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        articles
    }

    /// The article stored under `id`.
    pub async fn get(&self, id: &str) -> Result<Article, ArticleError> {
        if !is_valid_id(id) {
            return Err(ArticleError::NotFound(id.to_owned()));
        }
        self.load(id).await
    }

    /// Validates `draft`, derives its identifier and stores it as a new
    /// article. Fails with [`ArticleError::Conflict`] when the identifier is
    /// taken, leaving the existing record untouched.
    pub async fn create(&self, draft: Draft) -> Result<Article, ArticleError> {
        let published_at = draft.validate()?;
        let id = slugify(&draft.title);
        if id.is_empty() {
            return Err(ArticleError::Validation(
                "El título debe contener al menos una letra o número.".to_owned(),
            ));
        }

        let record = draft.into_record(published_at);
        match self.storage.create(&id, &encode(&record)?).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(ArticleError::Conflict(id));
            }
            Err(e) => return Err(e.into()),
        }

        info!(id = %id, "article created");
        Ok(into_article(id, record))
    }

    /// Overwrites the title, body and date of the article stored under `id`.
    /// The identifier never changes, even when the title does.
    pub async fn update(&self, id: &str, draft: Draft) -> Result<Article, ArticleError> {
        if !is_valid_id(id) || !self.storage.exists(id).await? {
            return Err(ArticleError::NotFound(id.to_owned()));
        }
        let published_at = draft.validate()?;

        let record = draft.into_record(published_at);
        self.storage.put(id, &encode(&record)?).await?;

        info!(id = %id, "article updated");
        Ok(into_article(id.to_owned(), record))
    }

    async fn load(&self, id: &str) -> Result<Article, ArticleError> {
        let bytes = self
            .storage
            .get(id)
            .await?
            .ok_or_else(|| ArticleError::NotFound(id.to_owned()))?;

        if bytes.trim_ascii().is_empty() {
            return Err(ArticleError::Empty(id.to_owned()));
        }
        let record: Record = serde_json::from_slice(&bytes)
            .map_err(|source| ArticleError::Malformed { id: id.to_owned(), source })?;
        Ok(into_article(id.to_owned(), record))
    }
}

fn encode(record: &Record) -> Result<Vec<u8>, ArticleError> {
    serde_json::to_vec_pretty(record).map_err(|e| ArticleError::Storage(io::Error::other(e)))
}

fn into_article(id: String, record: Record) -> Article {
    Article {
        id,
        title: record.title,
        body: record.body,
        published_at: record.published_at,
    }
}
