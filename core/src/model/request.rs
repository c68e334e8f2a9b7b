#![deny(missing_docs)]

//! # Request Metadata
//!
//! The editable request shape produced by every dialect transformer: method,
//! URL template, parameter rows, body and auth.

use serde::{Deserialize, Serialize};
use std::fmt;

/// HTTP methods a transformed request may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// DELETE
    Delete,
    /// PATCH
    Patch,
    /// HEAD
    Head,
    /// OPTIONS
    Options,
    /// TRACE
    Trace,
}

impl HttpMethod {
    /// Parses a method name case-insensitively.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "DELETE" => Some(Self::Delete),
            "PATCH" => Some(Self::Patch),
            "HEAD" => Some(Self::Head),
            "OPTIONS" => Some(Self::Options),
            "TRACE" => Some(Self::Trace),
            _ => None,
        }
    }

    /// Uppercase wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
            Self::Trace => "TRACE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One editable key/value row (header, query or path parameter, form field).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KeyValue {
    /// Row key.
    pub key: String,
    /// Row value (possibly an example).
    pub value: String,
    /// Whether the row is sent.
    pub checked: bool,
}

impl KeyValue {
    /// A checked row.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            checked: true,
        }
    }

    /// The blank row appended to empty sections.
    pub fn placeholder() -> Self {
        Self::default()
    }

    /// True for a row with neither key nor value.
    pub fn is_placeholder(&self) -> bool {
        self.key.is_empty() && self.value.is_empty()
    }
}

/// A multipart file part.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FormDataFile {
    /// Part name.
    pub key: String,
    /// File name or path hint.
    pub value: String,
    /// Whether the part is sent.
    pub checked: bool,
    /// Encoded file content, filled in by the client.
    pub base: String,
}

impl FormDataFile {
    /// A checked file part with no content yet.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: String::new(),
            checked: true,
            base: String::new(),
        }
    }
}

/// Multipart body sections.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FormData {
    /// Text parts.
    pub text: Vec<KeyValue>,
    /// File parts.
    pub file: Vec<FormDataFile>,
}

/// All body representations; `RequestMetaData::selected_request_body_type` says which is live.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RequestBody {
    /// Raw text (JSON, XML, plain text, ...).
    pub raw: String,
    /// `application/x-www-form-urlencoded` pairs.
    pub urlencoded: Vec<KeyValue>,
    /// `multipart/form-data` parts.
    pub formdata: FormData,
}

/// Which body representation is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BodyMode {
    /// No body.
    #[default]
    #[serde(rename = "none")]
    None,
    /// `application/json`
    #[serde(rename = "application/json")]
    Json,
    /// `application/xml`
    #[serde(rename = "application/xml")]
    Xml,
    /// `application/x-www-form-urlencoded`
    #[serde(rename = "application/x-www-form-urlencoded")]
    UrlEncoded,
    /// `multipart/form-data`
    #[serde(rename = "multipart/form-data")]
    FormData,
    /// `text/plain`
    #[serde(rename = "text/plain")]
    Text,
    /// `text/html`
    #[serde(rename = "text/html")]
    Html,
    /// `application/javascript`
    #[serde(rename = "application/javascript")]
    JavaScript,
}

impl BodyMode {
    /// Maps a raw-body language or content type to a mode.
    pub fn from_raw_language(language: &str) -> Self {
        let lang = language.to_ascii_lowercase();
        if lang.contains("json") {
            Self::Json
        } else if lang.contains("xml") {
            Self::Xml
        } else if lang.contains("html") {
            Self::Html
        } else if lang.contains("javascript") {
            Self::JavaScript
        } else {
            Self::Text
        }
    }
}

/// Where an API key is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ApiKeyPlacement {
    /// Sent as a request header.
    #[default]
    Header,
    /// Sent as a query string parameter.
    #[serde(rename = "Query Parameter")]
    QueryParameter,
}

/// Request authentication.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RequestAuth {
    /// No auth.
    #[default]
    None,
    /// `Authorization: Bearer <token>`
    Bearer {
        /// Token value.
        token: String,
    },
    /// HTTP basic auth.
    Basic {
        /// User name.
        username: String,
        /// Password.
        password: String,
    },
    /// API key sent in a header or query parameter.
    #[serde(rename_all = "camelCase")]
    ApiKey {
        /// Header or parameter name.
        auth_key: String,
        /// Key value.
        auth_value: String,
        /// Placement.
        add_to: ApiKeyPlacement,
    },
}

/// A transformed HTTP request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMetaData {
    /// HTTP method.
    pub method: HttpMethod,
    /// Full URL including `{param}` path templates.
    pub url: String,
    /// Upstream `operationId`, if any.
    #[serde(default)]
    pub operation_id: String,
    /// Body sections.
    #[serde(default)]
    pub body: RequestBody,
    /// Active body representation.
    #[serde(default)]
    pub selected_request_body_type: BodyMode,
    /// Header rows.
    #[serde(default)]
    pub headers: Vec<KeyValue>,
    /// Query rows.
    #[serde(default)]
    pub query_params: Vec<KeyValue>,
    /// Path parameter rows.
    #[serde(default)]
    pub path_params: Vec<KeyValue>,
    /// Authentication.
    #[serde(default)]
    pub auth: RequestAuth,
}

impl RequestMetaData {
    /// An empty request for `method` and `url`.
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            operation_id: String::new(),
            body: RequestBody::default(),
            selected_request_body_type: BodyMode::None,
            headers: Vec::new(),
            query_params: Vec::new(),
            path_params: Vec::new(),
            auth: RequestAuth::None,
        }
    }

    /// Gives every editable section at least one row.
    ///
    /// Path params are left alone; they always mirror the URL template.
    pub fn fill_placeholders(&mut self) {
        if self.headers.is_empty() {
            self.headers.push(KeyValue::placeholder());
        }
        if self.query_params.is_empty() {
            self.query_params.push(KeyValue::placeholder());
        }
        if self.body.urlencoded.is_empty() {
            self.body.urlencoded.push(KeyValue::placeholder());
        }
        if self.body.formdata.text.is_empty() {
            self.body.formdata.text.push(KeyValue::placeholder());
        }
        if self.body.formdata.file.is_empty() {
            self.body.formdata.file.push(FormDataFile::default());
        }
    }
}

/// Message format for a websocket endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SocketBodyMode {
    /// Plain text frames.
    #[default]
    #[serde(rename = "text/plain")]
    Text,
    /// JSON frames.
    #[serde(rename = "application/json")]
    Json,
    /// XML frames.
    #[serde(rename = "application/xml")]
    Xml,
    /// HTML frames.
    #[serde(rename = "text/html")]
    Html,
}

/// A websocket endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebSocketMetaData {
    /// `ws://` or `wss://` URL.
    pub url: String,
    /// Draft message.
    #[serde(default)]
    pub message: String,
    /// Handshake headers.
    #[serde(default)]
    pub headers: Vec<KeyValue>,
    /// Handshake query rows.
    #[serde(default)]
    pub query_params: Vec<KeyValue>,
    /// Message format.
    #[serde(default)]
    pub selected_web_socket_body_type: SocketBodyMode,
}
