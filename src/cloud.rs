//! Cloud orchestration API (XML).
//!
//! Sessions are opened with HTTP Basic auth and the token comes back in a
//! response header, not the body. Queries return `QueryResultRecords`
//! documents; each direct child named `*Record` is one result and a
//! `Link rel="nextPage"` child means the server has another page.

use std::collections::BTreeMap;

use async_trait::async_trait;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use reqwest::header::HeaderMap;
use reqwest::RequestBuilder;
use serde::Serialize;
use tracing::{debug, trace};

use crate::connector::{LoginApi, Session};
use crate::credential::{Credential, SessionToken};
use crate::format::{format_rows, CsvRecordProducer, Formattable, FormattingError, OutputFormat};
use crate::http_utils::{check_response, ApiError, HttpClient, HttpRequestConfig};
use crate::pagination::{collect_pages, Page, DEFAULT_MAX_PAGES};
use crate::secret::Secret;
use crate::session_context::{Namespace, KEY_SESSION_TOKEN};

pub const DEFAULT_API_VERSION: &str = "36.0";
pub const DEFAULT_PAGE_SIZE: u32 = 128;

const LEGACY_TOKEN_HEADER: &str = "x-vcloud-authorization";
const ACCESS_TOKEN_HEADER: &str = "x-vmware-vcloud-access-token";
const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug, Clone)]
pub struct CloudApi {
    api_version: String,
    org: Option<String>,
}

impl Default for CloudApi {
    fn default() -> Self {
        Self::new(None, None)
    }
}

impl CloudApi {
    pub fn new(api_version: Option<&str>, org: Option<&str>) -> Self {
        Self {
            api_version: api_version.unwrap_or(DEFAULT_API_VERSION).to_string(),
            org: org.filter(|o| !o.is_empty()).map(str::to_string),
        }
    }

    pub fn accept_header(&self) -> String {
        format!("application/*+xml;version={}", self.api_version)
    }

    /// `user@org` unless the identity already names its organization.
    pub fn login_name(&self, identity: &str) -> String {
        match &self.org {
            Some(org) if !identity.contains('@') => format!("{}@{}", identity, org),
            _ => identity.to_string(),
        }
    }
}

/// Pick the session token out of the login response headers.
///
/// Bearer tokens keep their prefix so later requests know which header to use.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    header(LEGACY_TOKEN_HEADER)
        .map(str::to_string)
        .or_else(|| header(ACCESS_TOKEN_HEADER).map(|t| format!("{}{}", BEARER_PREFIX, t)))
}

fn authorize(request: RequestBuilder, token: &str) -> RequestBuilder {
    if token.starts_with(BEARER_PREFIX) {
        request.header(reqwest::header::AUTHORIZATION, token)
    } else {
        request.header(LEGACY_TOKEN_HEADER, token)
    }
}

#[async_trait]
impl LoginApi for CloudApi {
    fn namespace(&self) -> Namespace {
        Namespace::Cloud
    }

    fn token_key(&self) -> &'static str {
        KEY_SESSION_TOKEN
    }

    fn configure(&self, config: HttpRequestConfig) -> HttpRequestConfig {
        config.header("Accept", &self.accept_header())
    }

    async fn login(&self, client: &HttpClient, credential: &Credential) -> Result<Secret, ApiError> {
        let response = client
            .post("/api/sessions")
            .basic_auth(
                self.login_name(credential.identity()),
                Some(credential.secret().expose()),
            )
            .send()
            .await?;
        let response = check_response(response).await?;
        let token = token_from_headers(response.headers()).ok_or(ApiError::MissingToken)?;
        Ok(Secret::plain(token))
    }

    async fn logoff(&self, client: &HttpClient, token: &SessionToken) -> Result<(), ApiError> {
        let response = authorize(client.delete("/api/session"), token.expose())
            .send()
            .await?;
        check_response(response).await?;
        Ok(())
    }
}

/// One query result: the element name and its attributes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryRecord {
    pub record_type: String,
    pub attributes: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct QueryRecords(pub Vec<QueryRecord>);

impl QueryRecords {
    fn attribute_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for record in &self.0 {
            for name in record.attributes.keys() {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
        }
        names.sort();
        names
    }
}

impl CsvRecordProducer for QueryRecords {
    fn csv_header(&self) -> Vec<String> {
        let mut header = vec!["RECORD_TYPE".to_string()];
        header.extend(self.attribute_names());
        header
    }

    fn as_csv_records(&self) -> Vec<Vec<String>> {
        let names = self.attribute_names();
        self.0
            .iter()
            .map(|record| {
                let mut row = vec![record.record_type.clone()];
                row.extend(
                    names
                        .iter()
                        .map(|n| record.attributes.get(n).cloned().unwrap_or_default()),
                );
                row
            })
            .collect()
    }
}

impl Formattable for QueryRecords {
    fn format(&self, f: &OutputFormat) -> Result<String, FormattingError> {
        format_rows(self, f)
    }
}

fn attributes_of(element: &BytesStart) -> Result<BTreeMap<String, String>, ApiError> {
    let mut attributes = BTreeMap::new();
    for attribute in element.attributes() {
        let attribute = attribute.map_err(quick_xml::Error::from)?;
        if attribute.key.as_namespace_binding().is_some() {
            continue;
        }
        let name = String::from_utf8_lossy(attribute.key.local_name().as_ref()).into_owned();
        let value = attribute.unescape_value()?.into_owned();
        attributes.insert(name, value);
    }
    Ok(attributes)
}

/// Parse one `QueryResultRecords` page.
pub fn parse_query_page(xml: &str) -> Result<Page<QueryRecord>, ApiError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut depth = 0usize;
    let mut records = Vec::new();
    let mut has_next = false;

    loop {
        let (element, is_start) = match reader.read_event()? {
            Event::Start(e) => (e, true),
            Event::Empty(e) => (e, false),
            Event::End(_) => {
                depth = depth.saturating_sub(1);
                continue;
            }
            Event::Eof => break,
            _ => continue,
        };

        // Direct children of the root sit at depth 1.
        if depth == 1 {
            let local = element.local_name();
            let name = String::from_utf8_lossy(local.as_ref()).into_owned();
            if name == "Link" {
                let attributes = attributes_of(&element)?;
                if attributes.get("rel").map(String::as_str) == Some("nextPage") {
                    has_next = true;
                }
            } else if name.ends_with("Record") {
                records.push(QueryRecord {
                    attributes: attributes_of(&element)?,
                    record_type: name,
                });
            }
        }

        if is_start {
            depth += 1;
        }
    }

    trace!("Parsed {} records (next page: {})", records.len(), has_next);
    Ok(Page::new(records, has_next))
}

/// Client for the query service of an open cloud session.
pub struct CloudClient<'a> {
    session: &'a Session,
}

impl<'a> CloudClient<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Run a typed query and gather every page, in page order.
    pub async fn query(
        &self,
        record_type: &str,
        filter: Option<&str>,
        page_size: u32,
    ) -> Result<QueryRecords, ApiError> {
        let client = self.session.client();
        let token = self.session.token().expose();
        let page_size = page_size.max(1);

        let records = collect_pages(DEFAULT_MAX_PAGES, |page| {
            let mut query = vec![
                ("type", record_type.to_string()),
                ("format", "records".to_string()),
                ("page", page.to_string()),
                ("pageSize", page_size.to_string()),
            ];
            if let Some(filter) = filter.filter(|f| !f.is_empty()) {
                query.push(("filter", filter.to_string()));
            }
            let request = authorize(client.get("/api/query").query(&query), token);
            async move {
                let response = check_response(request.send().await?).await?;
                let body = response.text().await?;
                parse_query_page(&body)
            }
        })
        .await?;

        debug!("Query for {} returned {} records", record_type, records.len());
        Ok(QueryRecords(records))
    }
}
