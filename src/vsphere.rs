//! Virtualization management API.
//!
//! Login uses HTTP Basic auth against `/api/session` and returns the session
//! id as a JSON string; it travels in the `vmware-api-session-id` header.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::connector::{LoginApi, Session};
use crate::credential::{Credential, SessionToken};
use crate::format::{format_rows, CsvRecordProducer, Formattable, FormattingError, OutputFormat};
use crate::http_utils::{check_response, send_json, ApiError, HttpClient};
use crate::secret::Secret;
use crate::session_context::{Namespace, KEY_SESSION_TOKEN};

pub const SESSION_HEADER: &str = "vmware-api-session-id";

#[derive(Debug, Clone, Copy, Default)]
pub struct VSphereApi;

#[async_trait]
impl LoginApi for VSphereApi {
    fn namespace(&self) -> Namespace {
        Namespace::VSphere
    }

    fn token_key(&self) -> &'static str {
        KEY_SESSION_TOKEN
    }

    async fn login(&self, client: &HttpClient, credential: &Credential) -> Result<Secret, ApiError> {
        let request = client
            .post("/api/session")
            .basic_auth(credential.identity(), Some(credential.secret().expose()));
        let session_id: String = send_json(request).await?;
        Ok(Secret::plain(session_id))
    }

    async fn logoff(&self, client: &HttpClient, token: &SessionToken) -> Result<(), ApiError> {
        let response = client
            .delete("/api/session")
            .header(SESSION_HEADER, token.expose())
            .send()
            .await?;
        check_response(response).await?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VmSummary {
    pub vm: String,
    pub name: String,
    #[serde(default)]
    pub power_state: Option<String>,
    #[serde(default)]
    pub cpu_count: Option<u32>,
    #[serde(default, rename = "memory_size_MiB")]
    pub memory_size_mib: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatastoreSummary {
    pub datastore: String,
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub free_space: Option<u64>,
    #[serde(default)]
    pub capacity: Option<u64>,
}

fn optional<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(T::to_string).unwrap_or_default()
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct VmList(pub Vec<VmSummary>);

impl CsvRecordProducer for VmList {
    fn csv_header(&self) -> Vec<String> {
        ["VM", "NAME", "POWER_STATE", "CPU_COUNT", "MEMORY_MIB"]
            .iter()
            .map(|c| c.to_string())
            .collect()
    }

    fn as_csv_records(&self) -> Vec<Vec<String>> {
        self.0
            .iter()
            .map(|vm| {
                vec![
                    vm.vm.clone(),
                    vm.name.clone(),
                    optional(&vm.power_state),
                    optional(&vm.cpu_count),
                    optional(&vm.memory_size_mib),
                ]
            })
            .collect()
    }
}

impl Formattable for VmList {
    fn format(&self, f: &OutputFormat) -> Result<String, FormattingError> {
        format_rows(self, f)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct DatastoreList(pub Vec<DatastoreSummary>);

impl CsvRecordProducer for DatastoreList {
    fn csv_header(&self) -> Vec<String> {
        ["DATASTORE", "NAME", "TYPE", "FREE_SPACE", "CAPACITY"]
            .iter()
            .map(|c| c.to_string())
            .collect()
    }

    fn as_csv_records(&self) -> Vec<Vec<String>> {
        self.0
            .iter()
            .map(|ds| {
                vec![
                    ds.datastore.clone(),
                    ds.name.clone(),
                    optional(&ds.kind),
                    optional(&ds.free_space),
                    optional(&ds.capacity),
                ]
            })
            .collect()
    }
}

impl Formattable for DatastoreList {
    fn format(&self, f: &OutputFormat) -> Result<String, FormattingError> {
        format_rows(self, f)
    }
}

pub struct VSphereClient<'a> {
    session: &'a Session,
}

impl<'a> VSphereClient<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// All VMs, or only those whose names are listed.
    pub async fn list_vms(&self, names: &[String]) -> Result<VmList, ApiError> {
        let query: Vec<(&str, &str)> = names.iter().map(|n| ("names", n.as_str())).collect();
        let request = self
            .session
            .client()
            .get("/api/vcenter/vm")
            .query(&query)
            .header(SESSION_HEADER, self.session.token().expose());
        let vms: Vec<VmSummary> = send_json(request).await?;
        debug!("Found {} VMs", vms.len());
        Ok(VmList(vms))
    }

    pub async fn list_datastores(&self) -> Result<DatastoreList, ApiError> {
        let request = self
            .session
            .client()
            .get("/api/vcenter/datastore")
            .header(SESSION_HEADER, self.session.token().expose());
        let datastores: Vec<DatastoreSummary> = send_json(request).await?;
        debug!("Found {} datastores", datastores.len());
        Ok(DatastoreList(datastores))
    }
}
