//! Minimal AJAX over ***fetch***.
//!
//! Parameters are given as [`serde_json::Value`] and sent either URL-encoded or as JSON.

use crate::{Error, Result};
use serde_json::Value;
use tracing::{instrument, trace, warn};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{DomParser, Headers, RequestCredentials, RequestInit, SupportedType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
	Get,
	Post,
	Put,
	Delete,
}
impl Method {
	#[must_use]
	pub fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
			Method::Put => "PUT",
			Method::Delete => "DELETE",
		}
	}
}

/// How parameters are encoded in request bodies. `GET` requests always use [`Format::Url`] in the query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
	/// `application/x-www-form-urlencoded`, with nested keys written as `outer[inner]`.
	Url,
	Json,
}
impl Format {
	#[must_use]
	pub fn content_type(self) -> &'static str {
		match self {
			Format::Url => "application/x-www-form-urlencoded",
			Format::Json => "application/json",
		}
	}
}

/// How a successful response body is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoding {
	Text,
	Json,
	Xml,
}

#[derive(Debug, Clone)]
pub struct Request {
	url: String,
	method: Method,
	params: Option<Value>,
	format: Format,
	decoding: Decoding,
	headers: Vec<(String, String)>,
}
impl Request {
	#[must_use]
	pub fn new(method: Method, url: impl Into<String>) -> Self {
		Self {
			url: url.into(),
			method,
			params: None,
			format: Format::Url,
			decoding: Decoding::Text,
			headers: Vec::new(),
		}
	}

	#[must_use]
	pub fn get(url: impl Into<String>) -> Self {
		Self::new(Method::Get, url)
	}

	#[must_use]
	pub fn post(url: impl Into<String>) -> Self {
		Self::new(Method::Post, url)
	}

	#[must_use]
	pub fn params(mut self, params: Value) -> Self {
		self.params = Some(params);
		self
	}

	#[must_use]
	pub fn format(mut self, format: Format) -> Self {
		self.format = format;
		self
	}

	#[must_use]
	pub fn decoding(mut self, decoding: Decoding) -> Self {
		self.decoding = decoding;
		self
	}

	/// Custom headers are sent after `Content-Type`, so they can override it.
	#[must_use]
	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));
		self
	}

	#[must_use]
	pub fn method(&self) -> Method {
		self.method
	}

	/// The URL to fetch, including the query string for `GET` requests with parameters.
	#[must_use]
	pub fn target_url(&self) -> String {
		match (&self.params, self.method) {
			(Some(params), Method::Get) => {
				let query = url_encode(params);
				let separator = if self.url.contains('?') { '&' } else { '?' };
				format!("{}{}{}", self.url, separator, query)
			}
			_ => self.url.clone(),
		}
	}

	/// The request body, if any.
	///
	/// # Errors
	///
	/// If the parameters can't be serialised as JSON.
	pub fn body(&self) -> Result<Option<String>> {
		if self.method == Method::Get {
			return Ok(None);
		}
		self.params
			.as_ref()
			.map(|params| match self.format {
				Format::Url => Ok(url_encode(params)),
				Format::Json => serde_json::to_string(params).map_err(Error::from),
			})
			.transpose()
	}
}

#[derive(Debug, Clone)]
pub enum Body {
	Text(String),
	Json(Value),
	Xml(web_sys::Document),
}

#[derive(Debug, Clone)]
pub struct Response {
	pub status: u16,
	/// Only present for status `200`.
	pub body: Option<Body>,
}

/// Sends `request` with credentials.
///
/// # Errors
///
/// If there's no `window`, ***fetch*** rejects (network failure), or a `200` response can't be decoded.
/// Other statuses are not errors.
#[instrument(skip(request), fields(method = request.method.as_str(), url = %request.url))]
pub async fn request(request: &Request) -> Result<Response> {
	let window = web_sys::window().ok_or(Error::NoWindow)?;

	let headers = Headers::new()?;
	headers.set("Content-Type", request.format.content_type())?;
	for (name, value) in &request.headers {
		headers.set(name, value)?;
	}

	let init = RequestInit::new();
	init.set_method(request.method.as_str());
	init.set_credentials(RequestCredentials::Include);
	init.set_headers(&headers);
	if let Some(body) = request.body()? {
		if cfg!(feature = "dangerous-logging") {
			trace!(body = body.as_str(), "Sending body.");
		}
		init.set_body(&JsValue::from_str(&body));
	}

	let fetch_request = web_sys::Request::new_with_str_and_init(&request.target_url(), &init)?;
	let response: web_sys::Response = JsFuture::from(window.fetch_with_request(&fetch_request)).await?.dyn_into()?;
	let status = response.status();
	trace!(status, "Received response.");

	if status != 200 {
		warn!(status, "Request unsuccessful.");
		return Ok(Response { status, body: None });
	}

	let text = JsFuture::from(response.text()?)
		.await?
		.as_string()
		.ok_or_else(|| Error::Js("Response text is not a string".to_owned()))?;
	let body = match request.decoding {
		Decoding::Text => Body::Text(text),
		Decoding::Json => Body::Json(serde_json::from_str(&text)?),
		Decoding::Xml => Body::Xml(DomParser::new()?.parse_from_string(&text, SupportedType::ApplicationXml)?),
	};
	Ok(Response { status, body: Some(body) })
}

/// URL-encodes `params` as `key=value` pairs joined by `&`.
///
/// Nested objects and arrays are flattened to `outer[inner]` keys, with array indices as inner keys.
/// `null`s and empty containers produce no pair. A bare scalar encodes to just its value.
#[must_use]
pub fn url_encode(params: &Value) -> String {
	let mut pairs = Vec::new();
	match params {
		Value::Object(_) | Value::Array(_) => push_children(&mut pairs, params, None),
		Value::Null => (),
		scalar => pairs.push(encode_component(&scalar_to_string(scalar))),
	}
	pairs.join("&")
}

fn push_children(pairs: &mut Vec<String>, value: &Value, prefix: Option<&str>) {
	match value {
		Value::Object(map) => {
			for (key, value) in map {
				push_pair(pairs, &child_key(prefix, key), value);
			}
		}
		Value::Array(items) => {
			for (index, value) in items.iter().enumerate() {
				push_pair(pairs, &child_key(prefix, &index.to_string()), value);
			}
		}
		_ => (),
	}
}

fn child_key(prefix: Option<&str>, key: &str) -> String {
	match prefix {
		Some(prefix) => format!("{}[{}]", prefix, key),
		None => key.to_owned(),
	}
}

fn push_pair(pairs: &mut Vec<String>, key: &str, value: &Value) {
	match value {
		Value::Object(_) | Value::Array(_) => push_children(pairs, value, Some(key)),
		Value::Null => (),
		scalar => pairs.push(format!("{}={}", encode_component(key), encode_component(&scalar_to_string(scalar)))),
	}
}

fn scalar_to_string(value: &Value) -> String {
	match value {
		Value::String(string) => string.clone(),
		other => other.to_string(),
	}
}

fn encode_component(component: &str) -> String {
	js_sys::encode_uri_component(component).into()
}
