//! Privileged-access vault REST API.
//!
//! Login posts the credential to `auth/{method}/Logon` and receives the
//! session token as a bare JSON string. Every later call carries that token
//! verbatim in the `Authorization` header.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use strum::{Display, EnumIter, EnumString};
use tracing::debug;

use crate::batch::BatchOutcome;
use crate::connector::{LoginApi, Session};
use crate::credential::{Credential, SessionToken};
use crate::format::{format_rows, CsvRecordProducer, Formattable, FormattingError, OutputFormat};
use crate::http_utils::{check_response, send_json, ApiError, HttpClient};
use crate::pagination::{collect_pages, Page, DEFAULT_MAX_PAGES};
use crate::secret::Secret;
use crate::session_context::{Namespace, KEY_AUTHORIZATION_TOKEN};

const API_ROOT: &str = "/PasswordVault/API";
const API_ROOT_SEGMENTS: [&str; 2] = ["PasswordVault", "API"];

/// Path segments for one account, with `tail` appended after the id.
fn account_segments<'s>(id: &'s str, tail: &[&'s str]) -> Vec<&'s str> {
    let mut segments: Vec<&'s str> = API_ROOT_SEGMENTS.to_vec();
    segments.push("Accounts");
    segments.push(id);
    segments.extend_from_slice(tail);
    segments
}

/// Record offset of a 1-based page.
fn page_offset(page: u32, limit: u32) -> u64 {
    u64::from(page.saturating_sub(1)) * u64::from(limit)
}
pub const DEFAULT_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(ascii_case_insensitive)]
pub enum VaultAuthMethod {
    #[default]
    CyberArk,
    #[strum(serialize = "LDAP")]
    Ldap,
    #[strum(serialize = "RADIUS")]
    Radius,
    Windows,
}

#[derive(Debug, Clone, Default)]
pub struct VaultApi {
    auth_method: VaultAuthMethod,
}

impl VaultApi {
    pub fn new(auth_method: VaultAuthMethod) -> Self {
        Self { auth_method }
    }

    pub fn auth_method(&self) -> VaultAuthMethod {
        self.auth_method
    }
}

#[async_trait]
impl LoginApi for VaultApi {
    fn namespace(&self) -> Namespace {
        Namespace::Vault
    }

    fn token_key(&self) -> &'static str {
        KEY_AUTHORIZATION_TOKEN
    }

    async fn login(&self, client: &HttpClient, credential: &Credential) -> Result<Secret, ApiError> {
        let path = format!("{}/auth/{}/Logon", API_ROOT, self.auth_method);
        let body = json!({
            "username": credential.identity(),
            "password": credential.secret().expose(),
            "concurrentSession": true,
        });
        let token: String = send_json(client.post(&path).json(&body)).await?;
        Ok(Secret::plain(token))
    }

    async fn logoff(&self, client: &HttpClient, token: &SessionToken) -> Result<(), ApiError> {
        let path = format!("{}/Auth/Logoff", API_ROOT);
        check_response(
            client
                .post(&path)
                .header("Authorization", token.expose())
                .send()
                .await?,
        )
        .await?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub platform_id: Option<String>,
    #[serde(default)]
    pub safe_name: Option<String>,
    #[serde(default)]
    pub secret_type: Option<String>,
    #[serde(default)]
    pub created_time: Option<i64>,
}

impl Account {
    fn csv_row(&self) -> Vec<String> {
        let text = |v: &Option<String>| v.clone().unwrap_or_default();
        vec![
            self.id.clone(),
            text(&self.name),
            text(&self.address),
            text(&self.user_name),
            text(&self.platform_id),
            text(&self.safe_name),
        ]
    }

    fn csv_columns() -> Vec<String> {
        ["ID", "NAME", "ADDRESS", "USER_NAME", "PLATFORM_ID", "SAFE_NAME"]
            .iter()
            .map(|c| c.to_string())
            .collect()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct AccountList(pub Vec<Account>);

impl CsvRecordProducer for AccountList {
    fn csv_header(&self) -> Vec<String> {
        Account::csv_columns()
    }

    fn as_csv_records(&self) -> Vec<Vec<String>> {
        self.0.iter().map(Account::csv_row).collect()
    }
}

impl Formattable for AccountList {
    fn format(&self, f: &OutputFormat) -> Result<String, FormattingError> {
        format_rows(self, f)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountsResponse {
    #[serde(default)]
    value: Vec<Account>,
    #[serde(default)]
    next_link: Option<String>,
}

/// Client for the account endpoints of an open vault session.
pub struct VaultClient<'a> {
    session: &'a Session,
}

impl<'a> VaultClient<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.header("Authorization", self.session.token().expose())
    }

    pub async fn search_accounts(
        &self,
        search: Option<&str>,
        page_size: u32,
    ) -> Result<AccountList, ApiError> {
        let client = self.session.client();
        let path = format!("{}/Accounts", API_ROOT);
        let limit = page_size.max(1);

        let accounts = collect_pages(DEFAULT_MAX_PAGES, |page| {
            let mut query = vec![
                ("limit", limit.to_string()),
                ("offset", page_offset(page, limit).to_string()),
            ];
            if let Some(search) = search.filter(|s| !s.is_empty()) {
                query.push(("search", search.to_string()));
            }
            let request = self.authorized(client.get(&path).query(&query));
            async move {
                let response: AccountsResponse = send_json(request).await?;
                let has_next = response
                    .next_link
                    .as_deref()
                    .is_some_and(|link| !link.is_empty());
                Ok(Page::new(response.value, has_next))
            }
        })
        .await?;

        debug!("Found {} accounts", accounts.len());
        Ok(AccountList(accounts))
    }

    pub async fn get_account(&self, id: &str) -> Result<Account, ApiError> {
        let request = self
            .session
            .client()
            .get_segments(&account_segments(id, &[]))?;
        send_json(self.authorized(request)).await
    }

    /// Fetch each account independently; failures are recorded per id.
    pub async fn get_accounts(&self, ids: &[String]) -> BatchOutcome<Account> {
        let mut outcome = BatchOutcome::default();
        for id in ids {
            outcome.push(id.as_str(), self.get_account(id).await);
        }
        outcome
    }

    pub async fn retrieve_password(&self, id: &str, reason: Option<&str>) -> Result<Secret, ApiError> {
        let request = self
            .session
            .client()
            .post_segments(&account_segments(id, &["Password", "Retrieve"]))?;
        let mut body = json!({});
        if let Some(reason) = reason {
            body["reason"] = json!(reason);
        }
        let password: String = send_json(self.authorized(request.json(&body))).await?;
        Ok(Secret::plain(password))
    }
}
