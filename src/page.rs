//! Page rendering.
//!
//! Every page is an HTML fragment wrapped in one fixed document shell
//! (`templates/layout.html`) that carries the stylesheet. Fragments are
//! askama templates, so every interpolated value is HTML-escaped when the
//! page is rendered, whichever route stored it.

use askama::Template;
use tracing::error;

use crate::article::Article;
use crate::response::{ContentType, Response};
use crate::status::Status;

const SITE_TITLE: &str = "Mi Blog Personal";

#[derive(Template)]
#[template(path = "layout.html")]
struct Layout<'a> {
    title: &'a str,
    content: &'a str,
}

/// Wraps `fragment` in the site's document shell.
///
/// The fragment is inserted verbatim; callers own its escaping.
pub fn render_page(fragment: &str, status: Status) -> Response {
    let layout = Layout { title: SITE_TITLE, content: fragment };
    match layout.render() {
        Ok(html) => Response::builder()
            .status(status)
            .bytes(ContentType::Html, html.into_bytes()),
        Err(e) => template_failure("layout", &e),
    }
}

/// Renders a fragment template and wraps it with [`render_page`].
pub fn render<T: Template>(fragment: &T, status: Status) -> Response {
    match fragment.render() {
        Ok(html) => render_page(&html, status),
        Err(e) => template_failure(std::any::type_name::<T>(), &e),
    }
}

fn template_failure(template: &str, e: &askama::Error) -> Response {
    error!(template, error = %e, "template rendering failed");
    Response::builder()
        .status(Status::InternalServerError)
        .text("Error interno del servidor")
}

// ── Views ─────────────────────────────────────────────────────────────────────

/// One row of the home and admin listings.
pub struct ArticleRow {
    pub id: String,
    pub title: String,
    pub date: String,
}

impl From<&Article> for ArticleRow {
    fn from(article: &Article) -> Self {
        Self {
            id: article.id.clone(),
            title: article.title.clone(),
            date: article.display_date(),
        }
    }
}

fn rows(articles: &[Article]) -> Vec<ArticleRow> {
    articles.iter().map(ArticleRow::from).collect()
}

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeView {
    pub articles: Vec<ArticleRow>,
}

impl HomeView {
    pub fn new(articles: &[Article]) -> Self {
        Self { articles: rows(articles) }
    }
}

#[derive(Template)]
#[template(path = "article.html")]
pub struct ArticleView {
    pub title: String,
    pub date: String,
    /// Body split on newlines; rendered with `<br>` between lines.
    pub lines: Vec<String>,
}

impl From<&Article> for ArticleView {
    fn from(article: &Article) -> Self {
        Self {
            title: article.title.clone(),
            date: article.display_date(),
            lines: article.body.lines().map(str::to_owned).collect(),
        }
    }
}

#[derive(Template)]
#[template(path = "admin.html")]
pub struct AdminView {
    pub articles: Vec<ArticleRow>,
}

impl AdminView {
    pub fn new(articles: &[Article]) -> Self {
        Self { articles: rows(articles) }
    }
}

#[derive(Template)]
#[template(path = "edit.html")]
pub struct EditView {
    pub id: String,
    pub title: String,
    pub body: String,
    pub date: String,
}

impl From<&Article> for EditView {
    fn from(article: &Article) -> Self {
        Self {
            id: article.id.clone(),
            title: article.title.clone(),
            body: article.body.clone(),
            date: article.input_date(),
        }
    }
}

/// A heading, an optional detail line and a link back.
#[derive(Template)]
#[template(path = "message.html")]
pub struct MessageView {
    pub heading: &'static str,
    pub detail: Option<String>,
    pub back_href: &'static str,
    pub back_label: &'static str,
}

impl MessageView {
    pub fn new(heading: &'static str) -> Self {
        Self { heading, detail: None, back_href: "/", back_label: "Volver al inicio" }
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn back(mut self, href: &'static str, label: &'static str) -> Self {
        self.back_href = href;
        self.back_label = label;
        self
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn article(title: &str, body: &str) -> Article {
        Article {
            id: "hola".into(),
            title: title.into(),
            body: body.into(),
            published_at: Utc.with_ymd_and_hms(2024, 3, 9, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn shell_wraps_fragment_verbatim() {
        let res = render_page("<p id=\"x\">hola</p>", Status::NotFound);
        assert_eq!(res.status_code(), Status::NotFound);
        assert_eq!(res.header("content-type"), Some("text/html; charset=utf-8"));

        let html = res.body_text();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<style>"));
        assert!(html.contains("<p id=\"x\">hola</p>"));
    }

    #[test]
    fn article_view_escapes_and_breaks_lines() {
        let view = ArticleView::from(&article("<script>x</script>", "uno\ndos & tres"));
        let html = render(&view, Status::Ok).body_text();

        assert!(!html.contains("<script>x</script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("uno<br>dos &amp; tres"));
        assert!(html.contains("09/03/2024"));
    }

    #[test]
    fn home_view_lists_or_says_empty() {
        let empty = render(&HomeView::new(&[]), Status::Ok).body_text();
        assert!(empty.contains("No hay artículos disponibles."));

        let listed = render(&HomeView::new(&[article("Hola", "x")]), Status::Ok).body_text();
        assert!(listed.contains("href=\"/articulo/hola\""));
        assert!(!listed.contains("No hay artículos"));
    }

    #[test]
    fn edit_view_prefills_date_only_value() {
        let html = render(&EditView::from(&article("Hola", "x")), Status::Ok).body_text();
        assert!(html.contains("value=\"2024-03-09\""));
        assert!(html.contains("name=\"archivo\" value=\"hola\""));
    }

    #[test]
    fn admin_view_never_embeds_a_password_in_links() {
        let html = render(&AdminView::new(&[article("Hola", "x")]), Status::Ok).body_text();
        assert!(html.contains("/editar?archivo=hola"));
        assert!(!html.contains("password="));
    }

    #[test]
    fn admin_delete_link_asks_for_confirmation() {
        let html = render(&AdminView::new(&[article("Hola", "x")]), Status::Ok).body_text();
        assert!(html.contains(r#"class="btn-delete" href="/eliminar?archivo=hola""#));
        assert!(html.contains("onclick=\"return confirm('¿Eliminar este artículo?')\""));
    }
}
