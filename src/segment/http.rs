//! HTTP segments.
//!
//! Requests and responses are only borrowed: the body is copied into the
//! field set and the caller's payload stays untouched and consumable.

use std::fmt;

use http::header::HeaderMap;
use http::{Request, Response, StatusCode};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::sink::Fields;

use super::data::SegmentData;
use super::traits::Segment;

const STATUS_CODE_KEY: &str = "status_code";

/// Segment for an HTTP exchange seen from the client side, or any HTTP call
/// whose response object is available.
#[derive(Debug)]
pub struct HttpSegment {
    data: SegmentData,
}

impl HttpSegment {
    /// Start a segment from the outgoing (or incoming) request.
    pub fn from_request<B: AsRef<[u8]>>(req: &Request<B>) -> Self {
        Self {
            data: SegmentData::new(request_fields(req)),
        }
    }

    /// Capture status, headers and body of the response.
    pub fn response<B: AsRef<[u8]>>(&self, res: &Response<B>) {
        self.data.update(|fields| {
            fields.insert(STATUS_CODE_KEY.to_string(), res.status().as_u16().into());
            fields.insert("response.headers".to_string(), headers_value(res.headers()));
            if let Some(body) = body_value(res.body()) {
                fields.insert("response.body".to_string(), body);
            }
        });
    }
}

impl Segment for HttpSegment {
    fn kind(&self) -> &str {
        "http"
    }

    /// Also forces `status_code` to 500.
    fn mark_failed(&self, err: &dyn fmt::Display) {
        mark_http_failed(&self.data, err);
    }

    fn fields(&self) -> Fields {
        self.data.snapshot()
    }

    fn has_failed(&self) -> bool {
        self.data.has_failed()
    }

    /// Defaults `status_code` to 200 when no response set one.
    fn finalize(&self) {
        finalize_http(&self.data);
    }
}

/// Segment for a request handled by this process (API server side).
#[derive(Debug)]
pub struct ServerSegment {
    data: SegmentData,
}

impl ServerSegment {
    /// Start a segment from the incoming request.
    pub fn from_request<B: AsRef<[u8]>>(req: &Request<B>) -> Self {
        Self {
            data: SegmentData::new(request_fields(req)),
        }
    }

    /// Record the JSON response about to be sent.
    ///
    /// If the body cannot be serialized, `response.body` is left unset.
    pub fn json_response<T: Serialize>(
        &self,
        status: StatusCode,
        body: Option<&T>,
        headers: &HeaderMap,
    ) {
        let body = body.and_then(|b| serde_json::to_string(b).ok());

        self.data.update(|fields| {
            fields.insert(STATUS_CODE_KEY.to_string(), status.as_u16().into());
            fields.insert("response.headers".to_string(), headers_value(headers));
            if let Some(body) = body {
                fields.insert("response.body".to_string(), Value::String(body));
            }
        });
    }
}

impl Segment for ServerSegment {
    fn kind(&self) -> &str {
        "http - server"
    }

    fn mark_failed(&self, err: &dyn fmt::Display) {
        mark_http_failed(&self.data, err);
    }

    fn fields(&self) -> Fields {
        self.data.snapshot()
    }

    fn has_failed(&self) -> bool {
        self.data.has_failed()
    }

    fn finalize(&self) {
        finalize_http(&self.data);
    }
}

fn mark_http_failed(data: &SegmentData, err: &dyn fmt::Display) {
    let detail = err.to_string();
    data.update(|fields| {
        fields.insert("error".to_string(), Value::String(detail));
        fields.insert(
            STATUS_CODE_KEY.to_string(),
            StatusCode::INTERNAL_SERVER_ERROR.as_u16().into(),
        );
    });
}

fn finalize_http(data: &SegmentData) {
    data.stop();
    data.set_if_absent(STATUS_CODE_KEY, StatusCode::OK.as_u16());
}

fn request_fields<B: AsRef<[u8]>>(req: &Request<B>) -> Fields {
    let mut fields = Fields::new();
    fields.insert("method".to_string(), Value::String(req.method().to_string()));
    fields.insert(
        "path".to_string(),
        Value::String(req.uri().path().to_string()),
    );
    fields.insert(
        "request.query_params".to_string(),
        query_value(req.uri().query()),
    );
    fields.insert("request.headers".to_string(), headers_value(req.headers()));
    if let Some(body) = body_value(req.body()) {
        fields.insert("request.body".to_string(), body);
    }
    fields
}

/// Query string as `name -> [values]`, in order of appearance. Values are kept
/// as sent (no percent-decoding).
fn query_value(query: Option<&str>) -> Value {
    let mut params: Map<String, Value> = Map::new();
    for pair in query.unwrap_or("").split('&').filter(|p| !p.is_empty()) {
        let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
        let values = params
            .entry(name.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(values) = values {
            values.push(Value::String(value.to_string()));
        }
    }
    Value::Object(params)
}

/// Headers as `name -> [values]`. Non UTF-8 values are converted lossily.
fn headers_value(headers: &HeaderMap) -> Value {
    let mut out: Map<String, Value> = Map::new();
    for name in headers.keys() {
        let values = headers
            .get_all(name)
            .iter()
            .map(|v| Value::String(String::from_utf8_lossy(v.as_bytes()).into_owned()))
            .collect();
        out.insert(name.as_str().to_string(), Value::Array(values));
    }
    Value::Object(out)
}

fn body_value<B: AsRef<[u8]>>(body: &B) -> Option<Value> {
    let bytes = body.as_ref();
    if bytes.is_empty() {
        None
    } else {
        Some(Value::String(String::from_utf8_lossy(bytes).into_owned()))
    }
}
