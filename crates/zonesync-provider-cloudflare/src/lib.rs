// # Cloudflare Record Store
//
// RecordStore implementation over the Cloudflare API v4.
//
// ## Behavior
//
// - `read()` renders the zone as master-file text: a synthetic SOA built
//   from the zone name, then every record, one per line
// - `add` POSTs, `change` PATCHes and `remove` DELETEs by record id; ids are
//   looked up from a fresh listing on every call
// - Listings follow `result_info.total_pages`
// - A rejected duplicate add surfaces as `Error::DuplicateRecord`
// - No retries and no caching: one run, one listing per call
//
// ## Security
//
// - Credentials NEVER appear in logs or Debug output
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - Zone details: GET `/zones/:zone_id`
// - List DNS records: GET `/zones/:zone_id/dns_records?page=N&per_page=100`
// - Create: POST `/zones/:zone_id/dns_records`
// - Update: PATCH `/zones/:zone_id/dns_records/:record_id`
// - Delete: DELETE `/zones/:zone_id/dns_records/:record_id`

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use zonesync_core::config::ProviderConfig;
use zonesync_core::traits::RecordStore;
use zonesync_core::{Error, Record, Result};

/// Cloudflare API base URL
const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Records requested per listing page (API maximum for this endpoint)
const PAGE_SIZE: u32 = 100;

/// Error codes Cloudflare uses for "record already exists"
const DUPLICATE_CODES: [u64; 2] = [81057, 81058];

/// How requests authenticate
#[derive(Clone)]
pub enum Auth {
    /// Scoped API token
    Token(String),
    /// Account email plus global API key
    Key {
        /// Account email
        email: String,
        /// Global API key
        key: String,
    },
}

/// Cloudflare-backed zone
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose credentials.
pub struct CloudflareStore {
    /// Zone identifier
    zone_id: String,

    /// Credentials
    /// ⚠️ NEVER log this value
    auth: Auth,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides credentials
impl std::fmt::Debug for CloudflareStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let auth = match self.auth {
            Auth::Token(_) => "token <REDACTED>",
            Auth::Key { .. } => "email+key <REDACTED>",
        };
        f.debug_struct("CloudflareStore")
            .field("zone_id", &self.zone_id)
            .field("auth", &auth)
            .finish()
    }
}

/// A DNS record as the API returns it
#[derive(Debug, Clone, Deserialize)]
struct ApiRecord {
    id: String,
    name: String,
    #[serde(rename = "type")]
    record_type: String,
    content: String,
    ttl: u32,
    #[serde(default)]
    priority: Option<u16>,
    #[serde(default)]
    comment: Option<String>,
}

/// Request body for create and update
#[derive(Debug, PartialEq, Eq, Serialize)]
struct ApiPayload {
    name: String,
    #[serde(rename = "type")]
    record_type: String,
    ttl: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    priority: Option<u16>,
    content: String,
    comment: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    result: T,
    #[serde(default)]
    result_info: Option<ResultInfo>,
}

#[derive(Debug, Deserialize)]
struct ResultInfo {
    #[serde(default)]
    total_pages: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ZoneDetails {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: u64,
    #[serde(default)]
    message: String,
}

impl CloudflareStore {
    /// Create a new Cloudflare store
    ///
    /// # Parameters
    ///
    /// - `zone_id`: Cloudflare zone identifier
    /// - `auth`: Token or email + global key
    ///
    /// # Security
    ///
    /// Credentials will NEVER be logged or displayed in error messages.
    pub fn new(zone_id: impl Into<String>, auth: Auth) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            zone_id: zone_id.into(),
            auth,
            client,
        })
    }

    /// Build from a `cloudflare` provider config
    ///
    /// A non-empty token wins over email + key.
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        config.validate()?;
        match config {
            ProviderConfig::Cloudflare {
                zone_id,
                token,
                email,
                key,
            } => {
                let auth = match token.as_deref().filter(|t| !t.is_empty()) {
                    Some(token) => Auth::Token(token.to_string()),
                    None => Auth::Key {
                        email: email.clone().unwrap_or_default(),
                        key: key.clone().unwrap_or_default(),
                    },
                };
                Self::new(zone_id.clone(), auth)
            }
            other => Err(Error::config(format!(
                "Invalid config for Cloudflare provider: {}",
                other.type_name()
            ))),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/zones/{}{}", CLOUDFLARE_API_BASE, self.zone_id, path);
        let builder = self
            .client
            .request(method, url)
            .header("Content-Type", "application/json");
        match &self.auth {
            Auth::Token(token) => builder.bearer_auth(token),
            Auth::Key { email, key } => builder
                .header("X-Auth-Email", email)
                .header("X-Auth-Key", key),
        }
    }

    /// Send a request, returning status and body
    async fn execute(&self, request: RequestBuilder) -> Result<(StatusCode, String)> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::provider("cloudflare", format!("HTTP request failed: {}", e)))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response".to_string());
        Ok((status, body))
    }

    /// Send a request and decode a successful JSON body
    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        request: RequestBuilder,
        context: &str,
    ) -> Result<T> {
        let (status, body) = self.execute(request).await?;
        if !status.is_success() {
            return Err(status_error(status, &body, context));
        }
        serde_json::from_str(&body).map_err(|e| {
            Error::provider("cloudflare", format!("Failed to parse response: {}", e))
        })
    }

    /// Zone apex name, without trailing dot
    async fn zone_name(&self) -> Result<String> {
        let zone: Envelope<ZoneDetails> = self
            .call(self.request(Method::GET, ""), "zone lookup")
            .await?;
        Ok(zone.result.name)
    }

    /// Every record in the zone with its id
    async fn all(&self) -> Result<Vec<(Record, String)>> {
        let mut records = Vec::new();
        let mut page = 1;
        loop {
            let request = self
                .request(Method::GET, "/dns_records")
                .query(&[("page", page), ("per_page", PAGE_SIZE)]);
            let envelope: Envelope<Vec<ApiRecord>> = self.call(request, "record listing").await?;

            for attrs in envelope.result {
                let id = attrs.id.clone();
                records.push((to_record(attrs), id));
            }

            let total_pages = envelope
                .result_info
                .and_then(|info| info.total_pages)
                .unwrap_or(1);
            if page >= total_pages {
                break;
            }
            page += 1;
        }

        tracing::debug!("Listed {} Cloudflare records", records.len());
        Ok(records)
    }

    async fn find_id(&self, record: &Record) -> Result<String> {
        self.all()
            .await?
            .into_iter()
            .find(|(existing, _)| existing == record)
            .map(|(_, id)| id)
            .ok_or_else(|| Error::not_found(format!("DNS record not found: {}", record)))
    }
}

#[async_trait]
impl RecordStore for CloudflareStore {
    async fn read(&self) -> Result<String> {
        let zone_name = self.zone_name().await?;
        let mut lines = vec![fake_soa(&zone_name).to_string()];
        lines.extend(self.all().await?.into_iter().map(|(record, _)| record.to_string()));
        Ok(lines.join("\n") + "\n")
    }

    async fn write(&self, _text: &str) -> Result<()> {
        Err(Error::provider(
            "cloudflare",
            "Writing a whole zone is not supported; use sync",
        ))
    }

    async fn add(&self, record: &Record) -> Result<()> {
        let request = self
            .request(Method::POST, "/dns_records")
            .json(&to_payload(record)?);
        let (status, body) = self.execute(request).await?;

        if !status.is_success() {
            if let Some(message) = duplicate_message(&body) {
                return Err(Error::duplicate(record.clone(), Some(message)));
            }
            return Err(status_error(status, &body, "record create"));
        }
        Ok(())
    }

    async fn remove(&self, record: &Record) -> Result<()> {
        let id = self.find_id(record).await?;
        let _: serde_json::Value = self
            .call(
                self.request(Method::DELETE, &format!("/dns_records/{}", id)),
                "record delete",
            )
            .await?;
        Ok(())
    }

    async fn change(&self, old: &Record, new: &Record) -> Result<()> {
        let id = self.find_id(old).await?;
        let request = self
            .request(Method::PATCH, &format!("/dns_records/{}", id))
            .json(&to_payload(new)?);
        let _: serde_json::Value = self.call(request, "record update").await?;
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "cloudflare"
    }
}

/// Map a failed response to an error
fn status_error(status: StatusCode, body: &str, context: &str) -> Error {
    match status.as_u16() {
        401 | 403 => Error::provider(
            "cloudflare",
            format!(
                "Authentication failed: Invalid credentials or insufficient permissions. Status: {}",
                status
            ),
        ),
        404 => Error::not_found(format!("Cloudflare {} failed: {}", context, body)),
        429 => Error::provider(
            "cloudflare",
            format!("Rate limit exceeded. Please retry later. Status: {}", status),
        ),
        500..=599 => Error::provider(
            "cloudflare",
            format!("Cloudflare server error (transient): {} - {}", status, body),
        ),
        _ => Error::provider(
            "cloudflare",
            format!("Cloudflare {} failed: {} - {}", context, status, body),
        ),
    }
}

/// Provider message when an error body reports an existing record
fn duplicate_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let error = parsed.errors.into_iter().find(|e| {
        DUPLICATE_CODES.contains(&e.code) || e.message.to_lowercase().contains("already exists")
    });
    match error {
        Some(error) => Some(error.message),
        None if body.to_lowercase().contains("already exists") => Some(body.to_string()),
        None => None,
    }
}

/// Normalize an API record into zone-file form
fn to_record(attrs: ApiRecord) -> Record {
    let mut rdata = attrs.content;
    if matches!(attrs.record_type.as_str(), "CNAME" | "MX") {
        rdata = with_trailing_period(&rdata);
    }
    if attrs.record_type == "MX" {
        rdata = format!("{} {}", attrs.priority.unwrap_or_default(), rdata);
    }
    if matches!(attrs.record_type.as_str(), "TXT" | "SPF" | "NAPTR") {
        rdata = normalize_quoting(&rdata);
    }

    Record {
        name: with_trailing_period(&attrs.name),
        record_type: attrs.record_type,
        ttl: attrs.ttl,
        rdata,
        comment: attrs.comment.filter(|c| !c.is_empty()),
    }
}

/// Build the API payload for `record`; MX priority travels separately
fn to_payload(record: &Record) -> Result<ApiPayload> {
    let (priority, content) = if record.record_type == "MX" {
        let (priority, exchange) = record.rdata.split_once(' ').ok_or_else(|| {
            Error::invalid_input(format!("MX record needs a priority and exchange: {}", record))
        })?;
        let priority = priority.parse::<u16>().map_err(|_| {
            Error::invalid_input(format!("Invalid MX priority '{}' in {}", priority, record))
        })?;
        let exchange = exchange.trim();
        (
            Some(priority),
            exchange.strip_suffix('.').unwrap_or(exchange).to_string(),
        )
    } else {
        (None, record.rdata.clone())
    };

    Ok(ApiPayload {
        name: record.name.clone(),
        record_type: record.record_type.clone(),
        ttl: record.ttl,
        priority,
        content,
        comment: record.comment.clone(),
    })
}

/// Stand-in SOA; the API does not expose the real one
///
/// Only the owner is absolute. The rdata names stay bare and the parser
/// qualifies them against the root.
fn fake_soa(zone_name: &str) -> Record {
    let bare = zone_name.trim_end_matches('.');
    Record::new(
        with_trailing_period(zone_name),
        "SOA",
        1,
        format!("{} admin.{} 2000010101 1 1 1 1", bare, bare),
    )
}

fn with_trailing_period(value: &str) -> String {
    if value.ends_with('.') {
        value.to_string()
    } else {
        format!("{}.", value)
    }
}

/// Quote bare text and join multi-string values into one
fn normalize_quoting(value: &str) -> String {
    let quoted = value.len() > 2 && value.starts_with('"') && value.ends_with('"');
    let value = if quoted {
        value.to_string()
    } else {
        format!("\"{}\"", value)
    };
    value.replace("\" \"", "")
}
