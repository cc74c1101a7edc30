// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use catalog_app::{
    CatalogGateway, Company, Exchange, ItemForm, ItemId, ItemSummary, Message, QueryParams, Reply,
    Response, SearchCriteria, ToQuery, TransportError, id_query,
};
use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, RequestBuilder};
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Cookie the server sets with the anti-forgery token.
pub const CSRF_COOKIE: &str = "XSRF-TOKEN";
/// Header the token is echoed back in on every POST.
pub const CSRF_HEADER: &str = "X-XSRF-TOKEN";

const AJAX_HEADER: &str = "x-requested-with";
const AJAX_VALUE: &str = "XMLHttpRequest";
const AJAX_ACCEPT: &str = "application/json, text/plain, */*";

/// Paths of the catalog operations, relative to the base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub search: String,
    pub count: String,
    pub select: String,
    pub select_company: String,
    pub validate: String,
    pub insert: String,
    pub update: String,
    pub delete: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            search: "search".to_owned(),
            count: "count".to_owned(),
            select: "select".to_owned(),
            select_company: "select-company".to_owned(),
            validate: "validate".to_owned(),
            insert: "insert".to_owned(),
            update: "update".to_owned(),
            delete: "delete".to_owned(),
        }
    }
}

impl Endpoints {
    pub fn check(&self) -> Result<()> {
        for (name, path) in self.named() {
            if path.trim().is_empty() {
                bail!("endpoints.{name} must not be empty");
            }
            if path.starts_with('/') || path.contains("://") {
                bail!("endpoints.{name} must be relative to server.base_url, got {path:?}");
            }
        }
        Ok(())
    }

    fn named(&self) -> [(&'static str, &str); 8] {
        [
            ("search", &self.search),
            ("count", &self.count),
            ("select", &self.select),
            ("select_company", &self.select_company),
            ("validate", &self.validate),
            ("insert", &self.insert),
            ("update", &self.update),
            ("delete", &self.delete),
        ]
    }
}

/// HTTP implementation of [`CatalogGateway`].
#[derive(Debug, Clone)]
pub struct Client {
    base_url: Url,
    endpoints: Endpoints,
    timeout: Duration,
    csrf_token: Option<String>,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let trimmed = base_url.trim();
        if trimmed.is_empty() {
            bail!("server.base_url must not be empty");
        }
        let mut base_url =
            Url::parse(trimmed).with_context(|| format!("parse server.base_url {trimmed:?}"))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            bail!(
                "server.base_url must use http or https, got {:?}",
                base_url.scheme()
            );
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static(AJAX_HEADER),
            HeaderValue::from_static(AJAX_VALUE),
        );
        headers.insert(ACCEPT, HeaderValue::from_static(AJAX_ACCEPT));

        let http = HttpClient::builder()
            .timeout(timeout)
            .cookie_store(true)
            .default_headers(headers)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            endpoints: Endpoints::default(),
            timeout,
            csrf_token: None,
            http,
        })
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Seeds the anti-forgery token. A token set by the server later wins.
    pub fn with_csrf_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        if !token.trim().is_empty() {
            self.csrf_token = Some(token);
        }
        self
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn csrf_token(&self) -> Option<&str> {
        self.csrf_token.as_deref()
    }

    /// Reachability check: the company list is the cheapest read the server
    /// offers and also hands out the anti-forgery cookie.
    pub fn ping(&mut self) -> Result<usize> {
        let base = self.base_url.to_string();
        let companies = self
            .fetch_companies()
            .map_err(|error| match error {
                TransportError::Connection { detail, .. } => {
                    anyhow!("cannot reach {base} -- is the catalog server running? ({detail})")
                }
                other => anyhow!(other),
            })?
            .body;
        Ok(companies.len())
    }

    fn url(&self, path: &str, query: Option<&QueryParams>) -> Result<Url, TransportError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|error| TransportError::Connection {
                url: path.to_owned(),
                detail: error.to_string(),
            })?;
        if let Some(query) = query
            && !query.is_empty()
        {
            url.set_query(Some(&query.to_query_string()));
        }
        Ok(url)
    }

    fn get(&mut self, path: &str, query: Option<&QueryParams>) -> Result<RawReply, TransportError> {
        let url = self.url(path, query)?;
        debug!(%url, "GET");
        let request = self.http.get(url.clone());
        self.send(request, url)
    }

    fn post(
        &mut self,
        path: &str,
        query: Option<&QueryParams>,
        form: Option<&QueryParams>,
    ) -> Result<RawReply, TransportError> {
        let url = self.url(path, query)?;
        debug!(%url, "POST");
        let mut request = self.http.post(url.clone());
        match &self.csrf_token {
            Some(token) => request = request.header(CSRF_HEADER, token),
            None => warn!(%url, "posting without an anti-forgery token"),
        }
        if let Some(form) = form {
            request = request.form(form.pairs());
        }
        self.send(request, url)
    }

    fn send(&mut self, request: RequestBuilder, url: Url) -> Result<RawReply, TransportError> {
        let url = url.to_string();
        let response = request
            .send()
            .map_err(|error| connection_error(&url, &error))?;

        for cookie in response.cookies() {
            if cookie.name() == CSRF_COOKIE && !cookie.value().is_empty() {
                self.csrf_token = Some(cookie.value().to_owned());
            }
        }

        let status = response.status();
        debug!(%url, status = status.as_u16(), "catalog response");
        if status == StatusCode::UNAUTHORIZED {
            return Err(TransportError::Unauthorized { url });
        }
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.contains("json"));
        let body = response.text().map_err(|error| TransportError::Decode {
            url: url.clone(),
            detail: error.to_string(),
        })?;

        Ok(RawReply {
            status: status.as_u16(),
            url,
            json,
            body,
        })
    }
}

impl CatalogGateway for Client {
    fn search(&mut self, criteria: &SearchCriteria) -> Exchange<Reply<Vec<ItemSummary>>> {
        let path = self.endpoints.search.clone();
        self.get(&path, Some(&criteria.to_query()))?.data_or_message()
    }

    fn count(&mut self, criteria: &SearchCriteria) -> Exchange<Option<Message>> {
        let path = self.endpoints.count.clone();
        self.get(&path, Some(&criteria.to_query()))?.count_message()
    }

    fn fetch_one(&mut self, id: ItemId) -> Exchange<Reply<ItemForm>> {
        let path = self.endpoints.select.clone();
        self.get(&path, Some(&id_query(id)))?.data_or_message()
    }

    fn fetch_companies(&mut self) -> Exchange<Vec<Company>> {
        let path = self.endpoints.select_company.clone();
        self.get(&path, None)?.data()
    }

    fn validate(&mut self, form: &ItemForm) -> Exchange<Option<Message>> {
        let path = self.endpoints.validate.clone();
        self.post(&path, None, Some(&form.to_query()))?.message()
    }

    fn insert(&mut self, form: &ItemForm) -> Exchange<Option<Message>> {
        let path = self.endpoints.insert.clone();
        self.post(&path, None, Some(&form.to_query()))?.message()
    }

    fn update(&mut self, form: &ItemForm) -> Exchange<Option<Message>> {
        let path = self.endpoints.update.clone();
        self.post(&path, None, Some(&form.to_query()))?.message()
    }

    fn delete(&mut self, id: ItemId) -> Exchange<Option<Message>> {
        let path = self.endpoints.delete.clone();
        self.post(&path, Some(&id_query(id)), None)?.message()
    }
}

/// A 2xx body before it is interpreted for a particular operation.
#[derive(Debug)]
struct RawReply {
    status: u16,
    url: String,
    json: bool,
    body: String,
}

impl RawReply {
    /// JSON is the data; text is a message standing in for it.
    fn data_or_message<T: DeserializeOwned>(self) -> Exchange<Reply<T>> {
        if self.json {
            let data = self.decode::<T>()?;
            return Ok(Response::with_status(self.status, Ok(data)));
        }
        match Message::from_reply(&self.body) {
            Some(message) => Ok(Response::with_status(self.status, Err(message))),
            None => Err(TransportError::Decode {
                url: self.url,
                detail: "empty reply where data was expected".to_owned(),
            }),
        }
    }

    fn data<T: DeserializeOwned>(self) -> Exchange<T> {
        if !self.json {
            let detail = match Message::from_reply(&self.body) {
                Some(message) => format!("expected JSON, got text: {message}"),
                None => "expected JSON, got an empty reply".to_owned(),
            };
            return Err(TransportError::Decode {
                url: self.url,
                detail,
            });
        }
        let data = self.decode::<T>()?;
        Ok(Response::with_status(self.status, data))
    }

    /// Empty or missing body means "no message".
    fn message(self) -> Exchange<Option<Message>> {
        if !self.json {
            return Ok(Response::with_status(
                self.status,
                Message::from_reply(&self.body),
            ));
        }
        if self.body.trim().is_empty() {
            return Ok(Response::with_status(self.status, None));
        }
        let text = match self.decode::<serde_json::Value>()? {
            serde_json::Value::Null => String::new(),
            serde_json::Value::String(text) => {
                if text.is_empty() {
                    warn!(url = %self.url, "server sent a JSON empty string instead of an empty body");
                }
                text
            }
            other => {
                return Err(TransportError::Decode {
                    url: self.url,
                    detail: format!("expected a message, got {other}"),
                });
            }
        };
        Ok(Response::with_status(self.status, Message::from_reply(&text)))
    }

    /// The count endpoint answers with ready-made text, or `{"count": n}`.
    fn count_message(self) -> Exchange<Option<Message>> {
        if !self.json {
            return self.message();
        }
        let envelope = self.decode::<CountEnvelope>()?;
        Ok(Response::with_status(
            self.status,
            Some(Message::new(format!("結果予想件数: {} 件", envelope.count))),
        ))
    }

    fn decode<T: DeserializeOwned>(&self) -> Result<T, TransportError> {
        serde_json::from_str(&self.body).map_err(|error| TransportError::Decode {
            url: self.url.clone(),
            detail: error.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct CountEnvelope {
    count: i64,
}

fn connection_error(url: &str, error: &reqwest::Error) -> TransportError {
    let detail = if error.is_timeout() {
        "timeout exceeded".to_owned()
    } else {
        "Network Error".to_owned()
    };
    debug!(%url, %error, "transport failure");
    TransportError::Connection {
        url: url.to_owned(),
        detail,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gains_trailing_slash_so_paths_nest() {
        let client = Client::new("http://localhost:8080/spa", Duration::from_secs(1))
            .expect("client should build");
        assert_eq!(client.base_url(), "http://localhost:8080/spa/");
        let url = client
            .url("select-company", None)
            .expect("url should join");
        assert_eq!(url.as_str(), "http://localhost:8080/spa/select-company");
    }

    #[test]
    fn empty_query_adds_no_question_mark() {
        let client =
            Client::new("http://localhost/", Duration::from_secs(1)).expect("client should build");
        let url = client
            .url("count", Some(&QueryParams::new()))
            .expect("url should join");
        assert_eq!(url.as_str(), "http://localhost/count");
    }

    #[test]
    fn rejects_blank_and_non_http_base_urls() {
        let blank = Client::new("  ", Duration::from_secs(1)).expect_err("blank should fail");
        assert!(blank.to_string().contains("must not be empty"));
        let ftp = Client::new("ftp://example.com", Duration::from_secs(1))
            .expect_err("ftp should fail");
        assert!(ftp.to_string().contains("http or https"));
    }

    #[test]
    fn blank_configured_token_is_ignored() {
        let client = Client::new("http://localhost/", Duration::from_secs(1))
            .expect("client should build")
            .with_csrf_token("  ");
        assert_eq!(client.csrf_token(), None);
    }

    #[test]
    fn endpoints_must_be_relative_and_non_empty() {
        Endpoints::default().check().expect("defaults are valid");

        let absolute = Endpoints {
            search: "/search".to_owned(),
            ..Endpoints::default()
        };
        let error = absolute.check().expect_err("absolute path should fail");
        assert!(error.to_string().contains("endpoints.search"));

        let blank = Endpoints {
            delete: String::new(),
            ..Endpoints::default()
        };
        let error = blank.check().expect_err("blank path should fail");
        assert!(error.to_string().contains("endpoints.delete"));
    }

    fn reply(json: bool, body: &str) -> RawReply {
        RawReply {
            status: 200,
            url: "http://localhost/x".to_owned(),
            json,
            body: body.to_owned(),
        }
    }

    #[test]
    fn message_reply_treats_empty_and_json_empty_string_alike() {
        assert_eq!(reply(false, "").message().expect("ok").body, None);
        assert_eq!(reply(true, "\"\"").message().expect("ok").body, None);
        assert_eq!(reply(true, "null").message().expect("ok").body, None);
        assert_eq!(
            reply(true, "\"❌ 存在しません。\"")
                .message()
                .expect("ok")
                .body,
            Some(Message::new("❌ 存在しません。"))
        );
    }

    #[test]
    fn message_reply_rejects_structured_json() {
        let error = reply(true, "[1,2]").message().expect_err("array is not a message");
        assert!(matches!(error, TransportError::Decode { .. }));
    }

    #[test]
    fn count_accepts_text_and_envelope() {
        let text = reply(false, "結果予想件数: 3 件").count_message().expect("ok");
        assert_eq!(text.body, Some(Message::new("結果予想件数: 3 件")));
        let envelope = reply(true, r#"{"count":7}"#).count_message().expect("ok");
        assert_eq!(envelope.body, Some(Message::new("結果予想件数: 7 件")));
    }

    #[test]
    fn data_endpoint_refuses_text() {
        let error = reply(false, "oops")
            .data::<Vec<Company>>()
            .expect_err("text is not data");
        assert!(error.detail().contains("oops"));
    }
}
