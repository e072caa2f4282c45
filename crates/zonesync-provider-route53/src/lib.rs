// # Route 53 Record Store
//
// RecordStore implementation over the Amazon Route 53 REST API (2013-04-01).
//
// ## Behavior
//
// - `read()` lists every resource record set and renders one record per
//   value, sorted, one per line
// - Route 53 groups same-name/type values into one RRSet, so every mutation
//   replaces the whole set inside a single change batch
// - `change` is `remove(old)` followed by `add(new)`
// - A rejected duplicate add surfaces as `Error::DuplicateRecord`
//
// ## Security
//
// - The secret access key NEVER appears in logs or Debug output
// - Every request is signed with AWS Signature Version 4
//
// ## API Reference
//
// - List: GET `/2013-04-01/hostedzone/:id/rrset?name=N&type=T`
// - Change: POST `/2013-04-01/hostedzone/:id/rrset` (ChangeResourceRecordSetsRequest)

mod sigv4;
mod xml;

pub use sigv4::{SigningRequest, Signer};
pub use xml::{Action, RecordSet};

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Method, StatusCode};
use std::time::Duration;
use zonesync_core::config::ProviderConfig;
use zonesync_core::traits::RecordStore;
use zonesync_core::{Error, Record, Result};

/// Route 53 API host (the service is global)
const ROUTE53_HOST: &str = "route53.amazonaws.com";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Route 53 hosted zone
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose the secret key.
#[derive(Debug)]
pub struct Route53Store {
    /// Hosted zone identifier, without the `/hostedzone/` prefix
    hosted_zone_id: String,

    /// Request signer; redacts its own secret
    signer: Signer,

    /// HTTP client for API requests
    client: reqwest::Client,
}

impl Route53Store {
    /// Create a new Route 53 store
    ///
    /// # Parameters
    ///
    /// - `hosted_zone_id`: Zone id, bare (`Z123`) or prefixed (`/hostedzone/Z123`)
    /// - `signer`: SigV4 credentials and region
    pub fn new(hosted_zone_id: impl Into<String>, signer: Signer) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        let hosted_zone_id = hosted_zone_id.into();
        let hosted_zone_id = hosted_zone_id
            .strip_prefix("/hostedzone/")
            .unwrap_or(&hosted_zone_id)
            .to_string();

        Ok(Self {
            hosted_zone_id,
            signer,
            client,
        })
    }

    /// Build from a `route53` provider config
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        config.validate()?;
        match config {
            ProviderConfig::Route53 {
                hosted_zone_id,
                aws_access_key_id,
                aws_secret_access_key,
                aws_region,
            } => Self::new(
                hosted_zone_id.clone(),
                Signer::new(
                    aws_access_key_id.clone(),
                    aws_secret_access_key.clone(),
                    aws_region.clone(),
                ),
            ),
            other => Err(Error::config(format!(
                "Invalid config for Route53 provider: {}",
                other.type_name()
            ))),
        }
    }

    fn rrset_path(&self) -> String {
        format!("/2013-04-01/hostedzone/{}/rrset", self.hosted_zone_id)
    }

    /// Sign and send a request, returning status and body
    async fn send(&self, method: Method, query: &str, body: String) -> Result<(StatusCode, String)> {
        let path = self.rrset_path();
        let now = Utc::now();
        let authorization = self.signer.authorization(
            &SigningRequest {
                method: method.as_str(),
                host: ROUTE53_HOST,
                path: &path,
                query,
                payload: body.as_bytes(),
            },
            now,
        )?;

        let mut url = format!("https://{}{}", ROUTE53_HOST, path);
        if !query.is_empty() {
            url.push('?');
            url.push_str(query);
        }

        let response = self
            .client
            .request(method, url)
            .header("Content-Type", "application/xml")
            .header("X-Amz-Date", sigv4::amz_date(now))
            .header("Authorization", authorization)
            .body(body)
            .send()
            .await
            .map_err(|e| Error::provider("route53", format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response".to_string());
        Ok((status, body))
    }

    /// Every record set in the zone, following pagination
    async fn record_sets(&self) -> Result<Vec<RecordSet>> {
        let mut sets = Vec::new();
        let mut query = String::new();
        loop {
            let (status, body) = self.send(Method::GET, &query, String::new()).await?;
            if !status.is_success() {
                return Err(status_error(status, &body, "record listing"));
            }
            let page = xml::parse_listing(&body)?;
            sets.extend(page.sets);

            match page.next {
                Some((name, record_type)) => {
                    query = format!(
                        "name={}&type={}",
                        sigv4::uri_encode(&name),
                        sigv4::uri_encode(&record_type)
                    );
                }
                None => break,
            }
        }

        tracing::debug!("Listed {} Route 53 record sets", sets.len());
        Ok(sets)
    }

    /// The set sharing `record`'s name and type, if any
    async fn find_set(&self, record: &Record) -> Result<Option<RecordSet>> {
        Ok(self
            .record_sets()
            .await?
            .into_iter()
            .find(|set| set.holds_name_of(record)))
    }

    /// Submit one change batch
    ///
    /// `adding` names the record being created so an "already exists"
    /// rejection maps to `DuplicateRecord`.
    async fn submit(&self, changes: &[(Action, RecordSet)], adding: Option<&Record>) -> Result<()> {
        let (status, body) = self
            .send(Method::POST, "", xml::change_batch(changes))
            .await?;
        if status.is_success() {
            return Ok(());
        }

        let message = xml::error_message(&body).unwrap_or_else(|| body.clone());
        match adding {
            Some(record) if is_duplicate(&message) => Err(Error::duplicate(record.clone(), Some(message))),
            _ => Err(status_error(status, &message, "change batch")),
        }
    }
}

#[async_trait]
impl RecordStore for Route53Store {
    async fn read(&self) -> Result<String> {
        let mut records: Vec<Record> = self
            .record_sets()
            .await?
            .iter()
            .flat_map(RecordSet::records)
            .collect();
        records.sort();
        let lines: Vec<String> = records.iter().map(ToString::to_string).collect();
        Ok(lines.join("\n") + "\n")
    }

    async fn write(&self, _text: &str) -> Result<()> {
        Err(Error::provider(
            "route53",
            "Writing a whole zone is not supported; use sync",
        ))
    }

    async fn add(&self, record: &Record) -> Result<()> {
        let changes = add_changes(self.find_set(record).await?, record)?;
        self.submit(&changes, Some(record)).await
    }

    async fn remove(&self, record: &Record) -> Result<()> {
        let changes = remove_changes(self.find_set(record).await?, record)?;
        self.submit(&changes, None).await
    }

    async fn change(&self, old: &Record, new: &Record) -> Result<()> {
        self.remove(old).await?;
        self.add(new).await
    }

    fn provider_name(&self) -> &'static str {
        "route53"
    }
}

/// Change batch that adds `record` to `existing`
///
/// An RRSet has a single TTL. A set holding only `record`'s value takes the
/// new TTL; a set holding other values must already share it, so that
/// values zonesync may not own are never rewritten.
fn add_changes(existing: Option<RecordSet>, record: &Record) -> Result<Vec<(Action, RecordSet)>> {
    let Some(existing) = existing else {
        return Ok(vec![(Action::Create, RecordSet::single(record))]);
    };
    if existing.contains(record) {
        return Err(Error::duplicate(
            record.clone(),
            Some("RRSet already exists".to_string()),
        ));
    }

    if existing.ttl != record.ttl && existing.values.iter().any(|v| v != &record.rdata) {
        return Err(Error::provider(
            "route53",
            format!(
                "RRSet {} {} has TTL {}; adding {} with TTL {} would change the TTL of its other values",
                existing.name, existing.record_type, existing.ttl, record.rdata, record.ttl
            ),
        ));
    }

    let mut grown = existing.clone();
    grown.ttl = record.ttl;
    if !grown.values.contains(&record.rdata) {
        grown.values.push(record.rdata.clone());
    }
    Ok(vec![(Action::Delete, existing), (Action::Create, grown)])
}

/// Change batch that drops `record` from `existing`
fn remove_changes(existing: Option<RecordSet>, record: &Record) -> Result<Vec<(Action, RecordSet)>> {
    let existing = existing
        .filter(|set| set.contains(record))
        .ok_or_else(|| Error::not_found(format!("DNS record not found: {}", record)))?;

    let mut remaining = existing.clone();
    remaining.values.retain(|value| value != &record.rdata);

    let mut changes = vec![(Action::Delete, existing)];
    if !remaining.values.is_empty() {
        changes.push((Action::Create, remaining));
    }
    Ok(changes)
}

fn is_duplicate(message: &str) -> bool {
    message.to_lowercase().contains("already exists")
}

/// Map a failed response to an error
fn status_error(status: StatusCode, message: &str, context: &str) -> Error {
    match status.as_u16() {
        401 | 403 => Error::provider(
            "route53",
            format!(
                "Authentication failed: Invalid credentials or insufficient permissions. Status: {}",
                status
            ),
        ),
        404 => Error::not_found(format!("Route 53 {} failed: {}", context, message)),
        400 if message.contains("Throttling") => Error::provider(
            "route53",
            format!("Rate limit exceeded. Please retry later. Status: {}", status),
        ),
        500..=599 => Error::provider(
            "route53",
            format!("Route 53 server error (transient): {} - {}", status, message),
        ),
        _ => Error::provider(
            "route53",
            format!("Route 53 {} failed: {} - {}", context, status, message),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a(name: &str, ttl: u32, rdata: &str) -> Record {
        Record::new(name, "A", ttl, rdata)
    }

    fn set(values: &[&str]) -> RecordSet {
        RecordSet {
            name: "www.example.com.".to_string(),
            record_type: "A".to_string(),
            ttl: 3600,
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    #[test]
    fn test_add_creates_new_set() {
        let record = a("www.example.com.", 3600, "192.0.2.1");
        let changes = add_changes(None, &record).unwrap();
        assert_eq!(changes, vec![(Action::Create, set(&["192.0.2.1"]))]);
    }

    #[test]
    fn test_add_grows_existing_set() {
        let record = a("www.example.com.", 3600, "192.0.2.2");
        let changes = add_changes(Some(set(&["192.0.2.1"])), &record).unwrap();
        assert_eq!(
            changes,
            vec![
                (Action::Delete, set(&["192.0.2.1"])),
                (Action::Create, set(&["192.0.2.1", "192.0.2.2"])),
            ]
        );
    }

    #[test]
    fn test_add_existing_value_is_duplicate() {
        let record = a("www.example.com.", 3600, "192.0.2.1");
        let err = add_changes(Some(set(&["192.0.2.1"])), &record).unwrap_err();
        assert!(matches!(err, Error::DuplicateRecord { .. }));
    }

    #[test]
    fn test_add_existing_value_with_new_ttl_replaces_set() {
        let record = a("www.example.com.", 300, "192.0.2.1");
        let changes = add_changes(Some(set(&["192.0.2.1"])), &record).unwrap();
        let mut replaced = set(&["192.0.2.1"]);
        replaced.ttl = 300;
        assert_eq!(
            changes,
            vec![(Action::Delete, set(&["192.0.2.1"])), (Action::Create, replaced)]
        );
    }

    #[test]
    fn test_add_with_other_ttl_leaves_siblings_alone() {
        let mut sibling = set(&["192.0.2.1"]);
        sibling.ttl = 300;
        let record = a("www.example.com.", 3600, "192.0.2.2");

        let err = add_changes(Some(sibling), &record).unwrap_err();
        match err {
            Error::Provider { provider, message } => {
                assert_eq!(provider, "route53");
                assert!(message.contains("TTL 300"), "{}", message);
                assert!(message.contains("192.0.2.2"), "{}", message);
            }
            other => panic!("expected provider error, got {:?}", other),
        }
    }

    #[test]
    fn test_remove_keeps_remaining_values() {
        let record = a("www.example.com.", 3600, "192.0.2.1");
        let changes = remove_changes(Some(set(&["192.0.2.1", "192.0.2.2"])), &record).unwrap();
        assert_eq!(
            changes,
            vec![
                (Action::Delete, set(&["192.0.2.1", "192.0.2.2"])),
                (Action::Create, set(&["192.0.2.2"])),
            ]
        );
    }

    #[test]
    fn test_remove_last_value_deletes_set() {
        let record = a("www.example.com.", 3600, "192.0.2.1");
        let changes = remove_changes(Some(set(&["192.0.2.1"])), &record).unwrap();
        assert_eq!(changes, vec![(Action::Delete, set(&["192.0.2.1"]))]);
    }

    #[test]
    fn test_remove_missing_record() {
        let record = a("www.example.com.", 3600, "192.0.2.9");
        assert!(matches!(
            remove_changes(Some(set(&["192.0.2.1"])), &record),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(remove_changes(None, &record), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_duplicate_detection() {
        assert!(is_duplicate("RRSet already exists"));
        assert!(is_duplicate(
            "Tried to create resource record set [name='www.example.com.', type='A'] but it already exists"
        ));
        assert!(!is_duplicate("InvalidChangeBatch: Some other error"));
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            status_error(StatusCode::NOT_FOUND, "NoSuchHostedZone", "record listing"),
            Error::NotFound(_)
        ));
        let err = status_error(StatusCode::FORBIDDEN, "SignatureDoesNotMatch", "record listing");
        assert!(err.to_string().contains("Authentication failed"));
        let err = status_error(StatusCode::BAD_REQUEST, "Throttling: Rate exceeded", "change batch");
        assert!(err.to_string().contains("Rate limit"));
    }

    #[test]
    fn test_from_config_strips_prefix() {
        let config = ProviderConfig::Route53 {
            hosted_zone_id: "/hostedzone/Z123".to_string(),
            aws_access_key_id: "AKIDEXAMPLE".to_string(),
            aws_secret_access_key: "secret_key_12345".to_string(),
            aws_region: "us-east-1".to_string(),
        };
        let store = Route53Store::from_config(&config).unwrap();
        assert_eq!(store.rrset_path(), "/2013-04-01/hostedzone/Z123/rrset");
        assert_eq!(store.provider_name(), "route53");
        assert!(!format!("{:?}", store).contains("secret_key"));
    }

    #[test]
    fn test_from_config_rejects_other_providers() {
        let config = ProviderConfig::Memory {
            string: String::new(),
        };
        assert!(Route53Store::from_config(&config).is_err());
    }
}
