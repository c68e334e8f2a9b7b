#![deny(missing_docs)]

//! # Postman Collection v2.1 Transformer
//!
//! Walks the literal `item` tree. An entry with a nested `item` array is a
//! folder; anything else is a request. Only GET, POST, PUT, DELETE and PATCH
//! requests are kept. Root-level requests land in the `default` folder;
//! nested folders are kept as nested folder items.
//!
//! URLs are taken as written (Postman `{{variables}}` stay intact), with
//! `:name` path segments rewritten to `{name}` placeholders.

use crate::error::{AppError, AppResult};
use crate::model::{
    ApiKeyPlacement, AuditStamp, BodyMode, CollectionItem, FormDataFile, HttpMethod, KeyValue,
    RequestAuth, RequestMetaData,
};
use crate::oas::document::text_or_content;
use crate::transform::common::{str_field, FolderMap, DEFAULT_FOLDER};
use serde_json::Value;
use tracing::{debug, warn};

/// Methods a Postman request may use to be imported.
const ALLOWED_METHODS: [HttpMethod; 5] = [
    HttpMethod::Get,
    HttpMethod::Post,
    HttpMethod::Put,
    HttpMethod::Delete,
    HttpMethod::Patch,
];

/// Transforms a Postman v2.1 collection into folders.
pub fn transform(document: &Value, stamp: &AuditStamp) -> AppResult<FolderMap> {
    let entries = document
        .get("info")
        .filter(|info| info.is_object())
        .and_then(|_| document.get("item"))
        .and_then(Value::as_array)
        .ok_or_else(|| {
            AppError::InvalidSpecification("not a Postman v2.1 collection".into())
        })?;

    let collection_auth = document.get("auth");
    let mut folders = FolderMap::new();

    for entry in entries {
        if entry.get("item").is_some_and(Value::is_array) {
            let folder = build_folder(entry, collection_auth, stamp);
            match folders.get_mut(&folder.name) {
                // Same-named sibling folders collapse into one.
                Some(existing) => existing.items.extend(folder.items),
                None => {
                    folders.insert(folder.name.clone(), folder);
                }
            }
        } else if let Some(item) = build_request(entry, collection_auth, stamp) {
            folders
                .entry(DEFAULT_FOLDER.to_string())
                .or_insert_with(|| CollectionItem::folder(DEFAULT_FOLDER, stamp))
                .items
                .push(item);
        }
    }

    Ok(folders)
}

fn build_folder(entry: &Value, inherited_auth: Option<&Value>, stamp: &AuditStamp) -> CollectionItem {
    let name = str_field(entry, "name");
    let auth = entry.get("auth").or(inherited_auth);
    let mut folder = CollectionItem::folder(name, stamp).with_description(
        entry
            .get("description")
            .map(text_or_content)
            .unwrap_or_default(),
    );

    for child in entry.get("item").and_then(Value::as_array).into_iter().flatten() {
        if child.get("item").is_some_and(Value::is_array) {
            folder.items.push(build_folder(child, auth, stamp));
        } else if let Some(item) = build_request(child, auth, stamp) {
            folder.items.push(item);
        }
    }
    debug!(folder = %folder.name, items = folder.items.len(), "Transformed folder");
    folder
}

fn build_request(
    entry: &Value,
    inherited_auth: Option<&Value>,
    stamp: &AuditStamp,
) -> Option<CollectionItem> {
    let name = str_field(entry, "name");
    let Some(raw_request) = entry.get("request") else {
        warn!(item = %name, "Skipping item without a request");
        return None;
    };

    // A request may be a bare URL string, meaning GET.
    let method = match raw_request {
        Value::String(_) => Some(HttpMethod::Get),
        _ => HttpMethod::parse(raw_request.get("method").and_then(Value::as_str).unwrap_or("GET")),
    };
    let method = match method {
        Some(method) if ALLOWED_METHODS.contains(&method) => method,
        _ => {
            debug!(item = %name, "Dropping request with unsupported method");
            return None;
        }
    };

    let url = match raw_request {
        Value::String(_) => Some(raw_request),
        _ => raw_request.get("url"),
    };
    let parsed = parse_url(url);
    let mut request = RequestMetaData::new(method, parsed.url);
    request.path_params = parsed.path_params;
    request.query_params = parsed.query_params;
    request.headers = key_values(raw_request.get("header"));

    if let Some(body) = raw_request.get("body") {
        fill_body(&mut request, body);
    }
    if let Some(auth) = raw_request.get("auth").or(inherited_auth) {
        request.auth = map_auth(auth);
    }
    request.fill_placeholders();

    let description = raw_request
        .get("description")
        .or_else(|| entry.get("description"))
        .map(text_or_content)
        .unwrap_or_default();
    Some(CollectionItem::request(name, request, stamp).with_description(description))
}

struct ParsedUrl {
    url: String,
    path_params: Vec<KeyValue>,
    query_params: Vec<KeyValue>,
}

/// Reads a Postman URL (string or object) and rewrites `:name` segments.
fn parse_url(url: Option<&Value>) -> ParsedUrl {
    let (raw, query_rows, variables) = match url {
        Some(Value::String(raw)) => (raw.clone(), None, None),
        Some(obj @ Value::Object(_)) => {
            let raw = obj
                .get("raw")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| url_from_parts(obj));
            (raw, obj.get("query"), obj.get("variable"))
        }
        _ => (String::new(), None, None),
    };

    let (path, query) = match raw.split_once('?') {
        Some((path, query)) => (path.to_string(), Some(query.to_string())),
        None => (raw.clone(), None),
    };

    let mut path_params = Vec::new();
    let rewritten: Vec<String> = path
        .split('/')
        .map(|segment| match segment.strip_prefix(':') {
            Some(name) if !name.is_empty() => {
                let value = variables
                    .and_then(Value::as_array)
                    .into_iter()
                    .flatten()
                    .find(|v| v.get("key").and_then(Value::as_str) == Some(name))
                    .map(|v| str_field(v, "value"))
                    .unwrap_or_default();
                path_params.push(KeyValue::new(name, value));
                format!("{{{name}}}")
            }
            _ => segment.to_string(),
        })
        .collect();

    let query_params = match query_rows {
        Some(rows) => key_values(Some(rows)),
        None => query
            .as_deref()
            .map(|q| {
                q.split('&')
                    .filter(|pair| !pair.is_empty())
                    .map(|pair| match pair.split_once('=') {
                        Some((k, v)) => KeyValue::new(k, v),
                        None => KeyValue::new(pair, ""),
                    })
                    .collect()
            })
            .unwrap_or_default(),
    };

    let mut url = rewritten.join("/");
    if let Some(query) = query {
        url.push('?');
        url.push_str(&query);
    }

    ParsedUrl {
        url,
        path_params,
        query_params,
    }
}

fn url_from_parts(url: &Value) -> String {
    let join = |key: &str, sep: &str| {
        url.get(key)
            .and_then(Value::as_array)
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(sep)
            })
            .unwrap_or_default()
    };
    let host = join("host", ".");
    let path = join("path", "/");
    let mut out = match url.get("protocol").and_then(Value::as_str) {
        Some(protocol) => format!("{protocol}://{host}"),
        None => host,
    };
    if !path.is_empty() {
        out.push('/');
        out.push_str(&path);
    }
    out
}

/// `[{ key, value, disabled }]` rows.
fn key_values(rows: Option<&Value>) -> Vec<KeyValue> {
    rows.and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter(|row| row.is_object())
        .map(|row| KeyValue {
            key: str_field(row, "key"),
            value: str_field(row, "value"),
            checked: !row.get("disabled").and_then(Value::as_bool).unwrap_or(false),
        })
        .collect()
}

fn fill_body(request: &mut RequestMetaData, body: &Value) {
    match body.get("mode").and_then(Value::as_str) {
        Some("raw") => {
            request.body.raw = str_field(body, "raw");
            let language = body
                .get("options")
                .and_then(|o| o.get("raw"))
                .and_then(|r| r.get("language"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .or_else(|| content_type_header(&request.headers));
            request.selected_request_body_type = language
                .map(|lang| BodyMode::from_raw_language(&lang))
                .unwrap_or(BodyMode::Text);
        }
        Some("urlencoded") => {
            request.body.urlencoded = key_values(body.get("urlencoded"));
            request.selected_request_body_type = BodyMode::UrlEncoded;
        }
        Some("formdata") => {
            for part in body.get("formdata").and_then(Value::as_array).into_iter().flatten() {
                let key = str_field(part, "key");
                let checked = !part.get("disabled").and_then(Value::as_bool).unwrap_or(false);
                if part.get("type").and_then(Value::as_str) == Some("file") {
                    let src = match part.get("src") {
                        Some(Value::String(src)) => src.clone(),
                        Some(Value::Array(srcs)) => srcs
                            .first()
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string(),
                        _ => String::new(),
                    };
                    request.body.formdata.file.push(FormDataFile {
                        key,
                        value: src,
                        checked,
                        base: String::new(),
                    });
                } else {
                    request.body.formdata.text.push(KeyValue {
                        key,
                        value: str_field(part, "value"),
                        checked,
                    });
                }
            }
            request.selected_request_body_type = BodyMode::FormData;
        }
        Some(other) => debug!(mode = other, "Body mode not mapped"),
        None => {}
    }
}

fn content_type_header(headers: &[KeyValue]) -> Option<String> {
    headers
        .iter()
        .find(|h| h.key.eq_ignore_ascii_case("content-type"))
        .map(|h| h.value.clone())
}

/// Postman auth blocks store attributes as `[{ key, value }]` lists.
fn map_auth(auth: &Value) -> RequestAuth {
    let attr = |section: &str, key: &str| {
        auth.get(section)
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .find(|entry| entry.get("key").and_then(Value::as_str) == Some(key))
            .map(|entry| match entry.get("value") {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Null) | None => String::new(),
                Some(other) => other.to_string(),
            })
            .unwrap_or_default()
    };

    match auth.get("type").and_then(Value::as_str) {
        Some("bearer") => RequestAuth::Bearer {
            token: attr("bearer", "token"),
        },
        Some("basic") => RequestAuth::Basic {
            username: attr("basic", "username"),
            password: attr("basic", "password"),
        },
        Some("apikey") => RequestAuth::ApiKey {
            auth_key: attr("apikey", "key"),
            auth_value: attr("apikey", "value"),
            add_to: match attr("apikey", "in").as_str() {
                "query" => ApiKeyPlacement::QueryParameter,
                _ => ApiKeyPlacement::Header,
            },
        },
        Some("noauth") | None => RequestAuth::None,
        Some(other) => {
            warn!("Unsupported Postman auth type '{}'", other);
            RequestAuth::None
        }
    }
}
