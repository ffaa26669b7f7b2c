//! Request body normalization.
//!
//! JSON bodies carry `content-type: application/json`. Multipart and binary
//! bodies drop any explicit content type so the transport can set its own
//! (including the multipart boundary).

use bytes::Bytes;
use reqwest::RequestBuilder;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};

use crate::error::FetchError;

/// An outbound request body. Cloneable so a request can be re-sent once after
/// a token refresh.
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Text(String),
    Bytes(Bytes),
    Multipart(MultipartBody),
}

impl RequestBody {
    /// Serialize any `Serialize` value as a JSON body.
    pub fn json<T: serde::Serialize>(value: &T) -> Result<Self, FetchError> {
        serde_json::to_value(value)
            .map(Self::Json)
            .map_err(|e| FetchError::InvalidRequest(format!("json body: {e}")))
    }

    /// Adjust `headers` for this body's content type.
    pub fn normalize_headers(&self, headers: &mut HeaderMap) {
        match self {
            RequestBody::Json(_) => {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            }
            RequestBody::Multipart(_) | RequestBody::Bytes(_) => {
                headers.remove(CONTENT_TYPE);
            }
            RequestBody::Empty | RequestBody::Text(_) => {}
        }
    }

    /// Attach the body to a request.
    pub fn attach(&self, builder: RequestBuilder) -> Result<RequestBuilder, FetchError> {
        Ok(match self {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => {
                let bytes = serde_json::to_vec(value)
                    .map_err(|e| FetchError::InvalidRequest(format!("json body: {e}")))?;
                builder.body(bytes)
            }
            RequestBody::Text(text) => builder.body(text.clone()),
            RequestBody::Bytes(bytes) => builder.body(bytes.clone()),
            RequestBody::Multipart(multipart) => builder.multipart(multipart.to_form()?),
        })
    }
}

/// One field of a multipart form.
#[derive(Debug, Clone)]
struct MultipartPart {
    name: String,
    data: Bytes,
    file_name: Option<String>,
    mime: Option<String>,
}

/// A multipart form that can be rebuilt for every send.
#[derive(Debug, Clone, Default)]
pub struct MultipartBody {
    parts: Vec<MultipartPart>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a plain text field.
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(MultipartPart {
            name: name.into(),
            data: Bytes::from(value.into()),
            file_name: None,
            mime: None,
        });
        self
    }

    /// Add a file field.
    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        mime: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        self.parts.push(MultipartPart {
            name: name.into(),
            data: data.into(),
            file_name: Some(file_name.into()),
            mime: Some(mime.into()),
        });
        self
    }

    fn to_form(&self) -> Result<Form, FetchError> {
        let mut form = Form::new();
        for part in &self.parts {
            let mut field = Part::bytes(part.data.to_vec());
            if let Some(file_name) = &part.file_name {
                field = field.file_name(file_name.clone());
            }
            if let Some(mime) = &part.mime {
                field = field.mime_str(mime).map_err(|e| {
                    FetchError::InvalidRequest(format!("multipart field '{}': {e}", part.name))
                })?;
            }
            form = form.part(part.name.clone(), field);
        }
        Ok(form)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with_content_type(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn json_sets_content_type() {
        let mut headers = headers_with_content_type("text/plain");
        RequestBody::Json(serde_json::json!({"a": 1})).normalize_headers(&mut headers);
        assert_eq!(headers[CONTENT_TYPE], "application/json");
    }

    #[test]
    fn multipart_strips_content_type() {
        let mut headers = headers_with_content_type("multipart/form-data");
        RequestBody::Multipart(MultipartBody::new().text("a", "b")).normalize_headers(&mut headers);
        assert!(headers.get(CONTENT_TYPE).is_none());
    }

    #[test]
    fn bytes_strip_content_type() {
        let mut headers = headers_with_content_type("application/json");
        RequestBody::Bytes(Bytes::from_static(b"\x00\x01")).normalize_headers(&mut headers);
        assert!(headers.get(CONTENT_TYPE).is_none());
    }

    #[test]
    fn text_keeps_caller_content_type() {
        let mut headers = headers_with_content_type("text/csv");
        RequestBody::Text("a,b".into()).normalize_headers(&mut headers);
        assert_eq!(headers[CONTENT_TYPE], "text/csv");
    }

    #[test]
    fn invalid_mime_is_rejected() {
        let body = MultipartBody::new().file("image", "a.png", "not a mime", vec![1u8, 2, 3]);
        assert!(matches!(body.to_form(), Err(FetchError::InvalidRequest(_))));
    }

    #[test]
    fn json_helper_serializes_structs() {
        #[derive(serde::Serialize)]
        struct Payload {
            name: &'static str,
        }
        let body = RequestBody::json(&Payload { name: "shoes" }).unwrap();
        assert!(matches!(body, RequestBody::Json(v) if v["name"] == "shoes"));
    }
}
