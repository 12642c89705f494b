//! Incoming HTTP request type.

use std::collections::HashMap;

use bytes::Bytes;
use url::form_urlencoded;

/// An incoming HTTP request with its body fully buffered.
pub struct Request {
    uri: http::Uri,
    headers: http::HeaderMap,
    body: Bytes,
    params: HashMap<String, String>,
}

impl Request {
    pub(crate) fn new(req: http::Request<Bytes>, params: HashMap<String, String>) -> Self {
        let (parts, body) = req.into_parts();
        Self {
            uri: parts.uri,
            headers: parts.headers,
            body,
            params,
        }
    }

    /// Header lookup. Names are case-insensitive; non-UTF-8 values are skipped.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/articulo/{id}`, `req.param("id")` on `/articulo/hola`
    /// returns `Some("hola")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Returns the first value of a query-string parameter, percent-decoded.
    pub fn query(&self, key: &str) -> Option<String> {
        let query = self.uri.query()?;
        form_urlencoded::parse(query.as_bytes())
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    /// Decodes an `application/x-www-form-urlencoded` body.
    ///
    /// Repeated fields keep their last value, matching how browsers submit
    /// single-valued inputs. The content-type header is not checked.
    pub fn form(&self) -> Form {
        Form(form_urlencoded::parse(&self.body).into_owned().collect())
    }
}

/// Decoded form fields.
#[derive(Debug, Default)]
pub struct Form(HashMap<String, String>);

impl Form {
    /// A field's value, or `""` when the field was not submitted.
    pub fn field(&self, name: &str) -> &str {
        self.0.get(name).map(String::as_str).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(uri: &str, body: &'static str) -> Request {
        let req = http::Request::builder()
            .method(http::Method::POST)
            .uri(uri)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(Bytes::from_static(body.as_bytes()))
            .unwrap();
        Request::new(req, HashMap::new())
    }

    #[test]
    fn form_decodes_plus_and_percent_escapes() {
        let req = request("/crear-articulo", "titulo=Hola+Mundo&contenido=a%0Ab&password=1234");
        let form = req.form();
        assert_eq!(form.field("titulo"), "Hola Mundo");
        assert_eq!(form.field("contenido"), "a\nb");
        assert_eq!(form.field("password"), "1234");
        assert_eq!(form.field("fecha"), "");
    }

    #[test]
    fn query_returns_decoded_value() {
        let req = request("/editar?archivo=hola_mundo&x=%C3%B1", "");
        assert_eq!(req.query("archivo").as_deref(), Some("hola_mundo"));
        assert_eq!(req.query("x").as_deref(), Some("ñ"));
        assert_eq!(req.query("missing"), None);
    }

    #[test]
    fn header_lookup_ignores_case() {
        let req = request("/", "");
        assert_eq!(req.header("content-type"), Some("application/x-www-form-urlencoded"));
    }
}
