//! Shared HTTP client construction and capped fetch helpers.
//!
//! One client per [`MetadataResolver`](super::MetadataResolver). Each request
//! carries its own total timeout; nothing is retried.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::LazyLock;
use std::time::Duration;

use encoding_rs::{Encoding, UTF_8};
use futures_util::StreamExt;
use regex::Regex;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::redirect::Policy;
use reqwest::{Client, ClientBuilder, Proxy, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::config::ResolverConfig;
use crate::user_agent;

use super::ResolveError;
use super::utils::compile_static_regex;

const MAX_REDIRECTS: usize = 5;

/// Bytes of the document head searched for a `<meta>` charset declaration.
const META_CHARSET_SCAN_BYTES: usize = 1024;

static META_CHARSET_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#"(?i)<meta[^>]*?charset\s*=\s*["']?\s*([a-z0-9_:.\-]+)"#)
});

/// Builds the resolver HTTP client.
///
/// # Errors
///
/// Returns [`ResolveError::ClientBuild`] when client construction fails.
pub(crate) fn build_http_client(config: &ResolverConfig) -> Result<Client, ResolveError> {
    match try_build_client(config, false) {
        Ok(client) => Ok(client),
        Err(BuildClientFailure::Panic) => {
            // Some sandboxed macOS environments panic while reading system proxy
            // settings; retry with env proxies only.
            warn!("HTTP client hit system proxy panic; using env-proxy fallback builder");
            match try_build_client(config, true) {
                Ok(client) => Ok(client),
                Err(BuildClientFailure::Panic) => Err(ResolveError::client_build(
                    "client construction panicked while reading proxy settings",
                )),
                Err(BuildClientFailure::Build(error)) => Err(ResolveError::client_build(error)),
            }
        }
        Err(BuildClientFailure::Build(error)) => Err(ResolveError::client_build(error)),
    }
}

enum BuildClientFailure {
    Panic,
    Build(reqwest::Error),
}

fn try_build_client(
    config: &ResolverConfig,
    disable_system_proxy_lookup: bool,
) -> Result<Client, BuildClientFailure> {
    let connect_timeout = config.connect_timeout();
    catch_unwind(AssertUnwindSafe(move || {
        let mut builder = base_builder(connect_timeout);
        if disable_system_proxy_lookup {
            builder = apply_env_proxy_fallback(builder.no_proxy());
        }
        builder.build().map_err(BuildClientFailure::Build)
    }))
    .map_err(|_| BuildClientFailure::Panic)?
}

fn base_builder(connect_timeout: Duration) -> ClientBuilder {
    Client::builder()
        .connect_timeout(connect_timeout)
        .redirect(Policy::limited(MAX_REDIRECTS))
        .user_agent(user_agent::api_user_agent())
        .gzip(true)
}

fn apply_env_proxy_fallback(mut builder: ClientBuilder) -> ClientBuilder {
    if let Some(proxy) = env_proxy(&["HTTPS_PROXY", "https_proxy", "ALL_PROXY", "all_proxy"])
        && let Ok(resolved) = Proxy::https(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    if let Some(proxy) = env_proxy(&["HTTP_PROXY", "http_proxy", "ALL_PROXY", "all_proxy"])
        && let Ok(resolved) = Proxy::http(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    builder
}

fn env_proxy(names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        std::env::var(name)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}

/// A successfully fetched response body with its effective URL.
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    /// URL after redirects.
    pub final_url: Url,
    /// HTTP status code (always below 400).
    pub status: u16,
    /// `Content-Type` header value, if any.
    pub content_type: Option<String>,
    /// Body bytes, capped at the configured limit.
    pub body: Vec<u8>,
    /// True when the body was cut at the limit.
    pub truncated: bool,
}

impl FetchedDocument {
    /// True when the content type declares a PDF.
    #[must_use]
    pub fn is_pdf(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("application/pdf"))
    }

    /// Body decoded with its declared charset.
    ///
    /// The `Content-Type` charset wins over a `<meta>` declaration; without
    /// either the body is read as UTF-8. A byte-order mark overrides both.
    /// Malformed sequences become U+FFFD.
    #[must_use]
    pub fn text(&self) -> String {
        let (decoded, _, _) = self.encoding().decode(&self.body);
        decoded.into_owned()
    }

    fn encoding(&self) -> &'static Encoding {
        self.content_type
            .as_deref()
            .and_then(charset_from_content_type)
            .or_else(|| charset_from_meta(&self.body))
            .and_then(|label| Encoding::for_label(label.as_bytes()))
            .unwrap_or(UTF_8)
    }
}

fn charset_from_content_type(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if !name.trim().eq_ignore_ascii_case("charset") {
            return None;
        }
        let label = value.trim().trim_matches(['"', '\'']);
        (!label.is_empty()).then(|| label.to_string())
    })
}

fn charset_from_meta(body: &[u8]) -> Option<String> {
    let head = &body[..body.len().min(META_CHARSET_SCAN_BYTES)];
    let head = String::from_utf8_lossy(head);
    META_CHARSET_PATTERN
        .captures(&head)
        .and_then(|caps| caps.get(1))
        .map(|label| label.as_str().to_string())
}

/// Thin fetch layer over a shared client.
#[derive(Debug, Clone)]
pub(crate) struct HttpFetcher {
    client: Client,
    max_body_bytes: usize,
}

impl HttpFetcher {
    pub(crate) fn new(client: Client, max_body_bytes: usize) -> Self {
        Self {
            client,
            max_body_bytes,
        }
    }

    /// Fetches a page with browser-like headers.
    ///
    /// Statuses of 400 and above, transport failures and empty bodies are errors.
    #[tracing::instrument(skip(self), fields(url = %url))]
    pub(crate) async fn fetch_page(
        &self,
        url: &Url,
        timeout: Duration,
    ) -> Result<FetchedDocument, ResolveError> {
        let response = self
            .client
            .get(url.clone())
            .headers(user_agent::browser_headers())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| ResolveError::transport(url.as_str(), &e))?;

        let status = response.status();
        if status.as_u16() >= 400 {
            return Err(ResolveError::http_status(url.as_str(), status.as_u16()));
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let (body, truncated) = read_capped(response, self.max_body_bytes)
            .await
            .map_err(|e| ResolveError::transport(url.as_str(), &e))?;
        if body.is_empty() {
            return Err(ResolveError::missing("body", url.as_str()));
        }
        if truncated {
            debug!(limit = self.max_body_bytes, "response body truncated");
        }

        Ok(FetchedDocument {
            final_url,
            status: status.as_u16(),
            content_type,
            body,
            truncated,
        })
    }

    /// Fetches and deserializes a JSON document.
    ///
    /// Any non-2xx status is an error.
    #[tracing::instrument(skip(self), fields(url = %url))]
    pub(crate) async fn fetch_json<T: DeserializeOwned>(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<T, ResolveError> {
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| ResolveError::transport(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResolveError::http_status(url, status.as_u16()));
        }

        let (body, truncated) = read_capped(response, self.max_body_bytes)
            .await
            .map_err(|e| ResolveError::transport(url, &e))?;
        if truncated {
            return Err(ResolveError::malformed("json", url, "response exceeded body limit"));
        }
        serde_json::from_slice(&body).map_err(|e| ResolveError::malformed("json", url, e))
    }
}

/// Reads at most `limit` bytes of the body; returns `(bytes, truncated)`.
async fn read_capped(response: Response, limit: usize) -> Result<(Vec<u8>, bool), reqwest::Error> {
    let mut stream = response.bytes_stream();
    let mut body = Vec::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        let remaining = limit.saturating_sub(body.len());
        if chunk.len() > remaining {
            body.extend_from_slice(&chunk[..remaining]);
            return Ok((body, true));
        }
        body.extend_from_slice(&chunk);
    }
    Ok((body, false))
}
