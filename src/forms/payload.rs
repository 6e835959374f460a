use std::collections::HashMap;

use axum::extract::{FromRequest, Request};
use axum::http::HeaderMap;
use bytes::Bytes;

/// A file attached to a multipart submission.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl UploadedFile {
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Fields and files of a submitted HTML form.
///
/// Extraction never rejects the request: a body that cannot be parsed
/// yields an empty payload with `parse_error` set, so form views can still
/// re-render the page with a form-level error.
#[derive(Debug, Clone, Default)]
pub struct FormPayload {
    pub fields: HashMap<String, String>,
    pub files: HashMap<String, UploadedFile>,
    pub parse_error: Option<String>,
}

impl FormPayload {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files.get(name)
    }

    pub fn checkbox(&self, name: &str) -> bool {
        matches!(self.field(name), Some("on" | "true" | "1"))
    }

    fn failed(message: String) -> Self {
        Self {
            parse_error: Some(message),
            ..Self::default()
        }
    }
}

impl<S: Send + Sync> FromRequest<S> for FormPayload {
    type Rejection = std::convert::Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let headers = req.headers().clone();
        let body = match Bytes::from_request(req, state).await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("Failed to read form body: {e}");
                return Ok(FormPayload::failed(format!("Could not read the submission: {e}")));
            }
        };

        let content_type = headers.get("content-type").and_then(|v| v.to_str().ok());

        let parsed = if content_type.is_some_and(|ct| ct.contains("multipart/form-data")) {
            parse_multipart(&headers, body).await
        } else {
            parse_urlencoded(&body)
        };

        Ok(parsed.unwrap_or_else(|e| {
            tracing::warn!("Failed to parse form body: {e}");
            FormPayload::failed(e)
        }))
    }
}

pub fn parse_urlencoded(body: &[u8]) -> Result<FormPayload, String> {
    std::str::from_utf8(body).map_err(|e| format!("Invalid UTF-8: {e}"))?;
    let fields = form_urlencoded::parse(body)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    Ok(FormPayload {
        fields,
        ..FormPayload::default()
    })
}

/// Parse multipart form data using multer.
///
/// Parts with a filename become files; a file input left empty by the
/// browser (no filename, no bytes) is dropped.
pub async fn parse_multipart(headers: &HeaderMap, body: Bytes) -> Result<FormPayload, String> {
    let boundary = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| multer::parse_boundary(ct).ok())
        .ok_or_else(|| "Missing multipart boundary".to_string())?;

    let stream = futures_util::stream::once(async { Ok::<_, std::io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut payload = FormPayload::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Multipart error: {e}"))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match field.file_name().map(str::to_string) {
            Some(filename) => {
                let content_type = field.content_type().map(|m| m.to_string());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| format!("File read error: {e}"))?;
                if filename.is_empty() && data.is_empty() {
                    continue;
                }
                payload.files.insert(
                    name,
                    UploadedFile {
                        filename,
                        content_type,
                        data,
                    },
                );
            }
            None => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| format!("Field read error: {e}"))?;
                payload.fields.insert(name, value);
            }
        }
    }

    Ok(payload)
}
