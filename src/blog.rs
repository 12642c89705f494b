//! The blog's routes.
//!
//! | Route | Handler |
//! |---|---|
//! | `GET /` | [`home`] |
//! | `GET /articulo/{id}` | [`show_article`] |
//! | `GET /admin` | [`admin`] |
//! | `POST /crear-articulo` | [`create_article`] |
//! | `GET /editar?archivo=<id>` | [`edit_form`] |
//! | `POST /editar-articulo` | [`update_article`] |
//! | `GET /healthz` | [`liveness`] |
//! | anything else | [`not_found`] |
//!
//! Every handler answers with a rendered page; none of them can fail.

use std::future::Future;
use std::sync::Arc;

use subtle::ConstantTimeEq;
use tracing::{error, warn};

use crate::article::{ArticleError, Articles, Draft};
use crate::handler::Handler;
use crate::method::Method;
use crate::page::{self, AdminView, ArticleView, EditView, HomeView, MessageView};
use crate::request::{Form, Request};
use crate::response::Response;
use crate::router::Router;
use crate::status::Status;

/// Shared state behind every route: the record store and the admin secret.
pub struct Blog {
    articles: Articles,
    admin_password: String,
}

impl Blog {
    pub fn new(articles: Articles, admin_password: impl Into<String>) -> Self {
        Self { articles, admin_password: admin_password.into() }
    }

    pub fn articles(&self) -> &Articles { &self.articles }

    fn authorized(&self, form: &Form) -> bool {
        let submitted = form.field("password").as_bytes();
        submitted.ct_eq(self.admin_password.as_bytes()).into()
    }

    /// Builds the router serving this blog.
    pub fn into_router(self) -> Router {
        let blog = Arc::new(self);
        Router::new()
            .on(Method::Get,  "/",                with(&blog, home))
            .on(Method::Get,  "/articulo/{id}",   with(&blog, show_article))
            .on(Method::Get,  "/admin",           with(&blog, admin))
            .on(Method::Post, "/crear-articulo",  with(&blog, create_article))
            .on(Method::Get,  "/editar",          with(&blog, edit_form))
            .on(Method::Post, "/editar-articulo", with(&blog, update_article))
            .on(Method::Get,  "/healthz",         liveness)
            .fallback(not_found)
    }
}

/// Adapts a route taking the shared [`Blog`] into a plain [`Handler`].
fn with<F, Fut>(blog: &Arc<Blog>, route: F) -> impl Handler
where
    F: Fn(Arc<Blog>, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    let blog = Arc::clone(blog);
    move |req: Request| route(Arc::clone(&blog), req)
}

fn draft_from(form: &Form) -> Draft {
    Draft {
        title: form.field("titulo").to_owned(),
        body: form.field("contenido").to_owned(),
        date: form.field("fecha").to_owned(),
    }
}

fn access_denied() -> Response {
    page::render(
        &MessageView::new("Acceso denegado")
            .detail("Contraseña incorrecta.")
            .back("/admin", "Volver al panel de administración"),
        Status::Forbidden,
    )
}

/// Any failure to read an article is shown to the visitor as "not found".
fn lookup_failed(id: &str, e: &ArticleError) -> Response {
    if !matches!(e, ArticleError::NotFound(_)) {
        warn!(id, error = %e, "article unreadable");
    }
    page::render(
        &MessageView::new("Artículo no encontrado").detail("El artículo solicitado no existe."),
        Status::NotFound,
    )
}

fn write_failed(heading: &'static str, e: &ArticleError) -> Response {
    let status = e.status();
    let detail = if status == Status::InternalServerError {
        error!(error = %e, "article write failed");
        "No se pudo guardar el artículo.".to_owned()
    } else {
        e.to_string()
    };
    page::render(
        &MessageView::new(heading)
            .detail(detail)
            .back("/admin", "Volver al panel de administración"),
        status,
    )
}

// ── Handlers ──────────────────────────────────────────────────────────────────

pub async fn home(blog: Arc<Blog>, _req: Request) -> Response {
    let articles = blog.articles.list().await;
    page::render(&HomeView::new(&articles), Status::Ok)
}

pub async fn show_article(blog: Arc<Blog>, req: Request) -> Response {
    let id = req.param("id").unwrap_or_default();
    match blog.articles.get(id).await {
        Ok(article) => page::render(&ArticleView::from(&article), Status::Ok),
        Err(e) => lookup_failed(id, &e),
    }
}

pub async fn admin(blog: Arc<Blog>, _req: Request) -> Response {
    let articles = blog.articles.list().await;
    page::render(&AdminView::new(&articles), Status::Ok)
}

pub async fn create_article(blog: Arc<Blog>, req: Request) -> Response {
    let form = req.form();
    if !blog.authorized(&form) {
        warn!(route = "crear-articulo", "rejected admin password");
        return access_denied();
    }

    match blog.articles.create(draft_from(&form)).await {
        Ok(article) => page::render(
            &MessageView::new("Artículo creado")
                .detail(format!("El artículo \"{}\" ha sido creado exitosamente.", article.title)),
            Status::Ok,
        ),
        Err(e) => write_failed("Error al crear artículo", &e),
    }
}

pub async fn edit_form(blog: Arc<Blog>, req: Request) -> Response {
    let id = req.query("archivo").unwrap_or_default();
    match blog.articles.get(&id).await {
        Ok(article) => page::render(&EditView::from(&article), Status::Ok),
        Err(e) => lookup_failed(&id, &e),
    }
}

pub async fn update_article(blog: Arc<Blog>, req: Request) -> Response {
    let form = req.form();
    if !blog.authorized(&form) {
        warn!(route = "editar-articulo", "rejected admin password");
        return access_denied();
    }

    match blog.articles.update(form.field("archivo"), draft_from(&form)).await {
        Ok(_) => page::render(&MessageView::new("Artículo actualizado"), Status::Ok),
        Err(e) => write_failed("Error al actualizar artículo", &e),
    }
}

/// Liveness check: if the process answers HTTP at all, it is alive.
pub async fn liveness(_req: Request) -> Response {
    Response::text("ok")
}

pub async fn not_found(_req: Request) -> Response {
    page::render(&MessageView::new("404 - Página no encontrada"), Status::NotFound)
}
