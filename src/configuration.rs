use crate::{
    format::{Formattable, FormattingError, OutputFormat},
    session_context::Namespace,
};
use dirs::{config_dir, home_dir};
use serde::{Deserialize, Serialize};
use serde_yaml;
use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};
use strum::{Display, EnumString};
use tracing::debug;

pub const DEFAULT_APPLICATION_ID: &str = "adminctl";
pub const DEFAULT_CONFIGURATION_FILE_NAME: &str = "config.yml";
pub const DEFAULT_CREDENTIAL_DIRECTORY: &str = ".adminctl/credentials";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 1800;

pub const ENV_CONFIG_DIR: &str = "ADMINCTL_CONFIG_DIR";
pub const ENV_CREDENTIAL_DIR: &str = "ADMINCTL_CREDENTIAL_DIR";

#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("failed to resolve the configuration directory")]
    FailedToFindConfigurationDirectory,
    #[error("failed to resolve the home directory")]
    FailedToFindHomeDirectory,
    #[error("failed to load configuration data, because of: {cause}")]
    FailedToLoadData {
        cause: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("failed to write configuration data to file, because of: {cause}")]
    FailedToWriteData {
        cause: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("namespace {0} has no configuration section")]
    UnsupportedNamespace(Namespace),
    #[error("{cause}")]
    FormattingError {
        #[from]
        cause: FormattingError,
    },
}

/// Where the per-user protection key lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum KeyStoreKind {
    /// The operating system keyring.
    Os,
    /// A plain file in the configuration directory.
    File,
}

impl Default for KeyStoreKind {
    fn default() -> Self {
        if cfg!(feature = "dev-keyring") {
            KeyStoreKind::File
        } else {
            KeyStoreKind::Os
        }
    }
}

/// Lowest-priority values for one API family.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamespaceDefaults {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approve_all_certificates: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_directory: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfiguration {
    #[serde(flatten)]
    pub defaults: NamespaceDefaults,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_method: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudConfiguration {
    #[serde(flatten)]
    pub defaults: NamespaceDefaults,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    key_store: KeyStoreKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout_seconds: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    credential_directory: Option<PathBuf>,
    vault: VaultConfiguration,
    cloud: CloudConfiguration,
    vsphere: NamespaceDefaults,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            key_store: KeyStoreKind::default(),
            timeout_seconds: None,
            credential_directory: None,
            vault: VaultConfiguration::default(),
            cloud: CloudConfiguration::default(),
            vsphere: NamespaceDefaults::default(),
        }
    }
}

impl Configuration {
    pub fn get_default_configuration_file_path() -> Result<PathBuf, ConfigurationError> {
        if let Ok(config_dir_str) = std::env::var(ENV_CONFIG_DIR) {
            let mut config_path = PathBuf::from(config_dir_str);
            config_path.push(DEFAULT_CONFIGURATION_FILE_NAME);
            return Ok(config_path);
        }

        match config_dir() {
            Some(configuration_directory) => {
                let mut default_config_file_path = configuration_directory;
                default_config_file_path.push(DEFAULT_APPLICATION_ID);
                default_config_file_path.push(DEFAULT_CONFIGURATION_FILE_NAME);

                Ok(default_config_file_path)
            }
            None => Err(ConfigurationError::FailedToFindConfigurationDirectory),
        }
    }

    /// Load the default configuration, creating it if none exists yet.
    pub fn load_or_create_default() -> Result<Configuration, ConfigurationError> {
        let default_file_path = Configuration::get_default_configuration_file_path()?;
        debug!(
            "Loading or creating configuration from {}...",
            default_file_path.display()
        );
        Configuration::load_or_create(&default_file_path)
    }

    pub fn load_or_create(path: &Path) -> Result<Configuration, ConfigurationError> {
        if !path.exists() {
            debug!("Configuration file not found, creating default configuration");
            let default_config = Configuration::default();
            default_config.save(path)?;
            return Ok(default_config);
        }

        Configuration::load_from_file(path)
    }

    pub fn load_from_file(path: &Path) -> Result<Configuration, ConfigurationError> {
        let content = fs::read_to_string(path)
            .map_err(|cause| ConfigurationError::FailedToLoadData { cause: Box::new(cause) })?;
        if content.trim().is_empty() {
            return Ok(Configuration::default());
        }
        serde_yaml::from_str(&content)
            .map_err(|cause| ConfigurationError::FailedToLoadData { cause: Box::new(cause) })
    }

    pub fn write(&self, writer: Box<dyn Write>) -> Result<(), ConfigurationError> {
        serde_yaml::to_writer(writer, self)
            .map_err(|e| ConfigurationError::FailedToWriteData { cause: Box::new(e) })
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigurationError> {
        // create the parent directory if it does not exist yet
        match path.parent() {
            Some(directory) => fs::create_dir_all(directory)
                .map_err(|_| ConfigurationError::FailedToFindConfigurationDirectory)?,
            None => return Err(ConfigurationError::FailedToFindConfigurationDirectory),
        }

        let file = File::create(path)
            .map_err(|e| ConfigurationError::FailedToWriteData { cause: Box::new(e) })?;
        self.write(Box::new(file))
    }

    pub fn save_to_default(&self) -> Result<(), ConfigurationError> {
        self.save(&Self::get_default_configuration_file_path()?)
    }

    pub fn key_store(&self) -> KeyStoreKind {
        self.key_store
    }

    pub fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS)
    }

    pub fn vault(&self) -> &VaultConfiguration {
        &self.vault
    }

    pub fn cloud(&self) -> &CloudConfiguration {
        &self.cloud
    }

    /// Defaults for a namespace; `Utils` has none.
    pub fn defaults(&self, namespace: Namespace) -> Option<&NamespaceDefaults> {
        match namespace {
            Namespace::Vault => Some(&self.vault.defaults),
            Namespace::Cloud => Some(&self.cloud.defaults),
            Namespace::VSphere => Some(&self.vsphere),
            Namespace::Utils => None,
        }
    }

    pub fn defaults_mut(
        &mut self,
        namespace: Namespace,
    ) -> Result<&mut NamespaceDefaults, ConfigurationError> {
        match namespace {
            Namespace::Vault => Ok(&mut self.vault.defaults),
            Namespace::Cloud => Ok(&mut self.cloud.defaults),
            Namespace::VSphere => Ok(&mut self.vsphere),
            Namespace::Utils => Err(ConfigurationError::UnsupportedNamespace(namespace)),
        }
    }

    /// Directory for disk credential files.
    ///
    /// Order: namespace setting, global setting, `ADMINCTL_CREDENTIAL_DIR`,
    /// then `~/.adminctl/credentials`.
    pub fn credential_directory(&self, namespace: Namespace) -> Result<PathBuf, ConfigurationError> {
        if let Some(directory) = self
            .defaults(namespace)
            .and_then(|d| d.credential_directory.clone())
        {
            return Ok(directory);
        }
        if let Some(directory) = &self.credential_directory {
            return Ok(directory.clone());
        }
        default_credential_directory()
    }
}

pub fn default_credential_directory() -> Result<PathBuf, ConfigurationError> {
    if let Ok(directory) = std::env::var(ENV_CREDENTIAL_DIR) {
        return Ok(PathBuf::from(directory));
    }
    home_dir()
        .map(|home| home.join(DEFAULT_CREDENTIAL_DIRECTORY))
        .ok_or(ConfigurationError::FailedToFindHomeDirectory)
}

impl Formattable for Configuration {
    fn format(&self, f: &OutputFormat) -> Result<String, FormattingError> {
        match f {
            OutputFormat::Json(options) => {
                if options.pretty {
                    Ok(serde_json::to_string_pretty(self)?)
                } else {
                    Ok(serde_json::to_string(self)?)
                }
            }
            OutputFormat::Csv(_) => Err(FormattingError::UnsupportedOutputFormat(f.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_or_create_writes_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sub").join(DEFAULT_CONFIGURATION_FILE_NAME);
        let configuration = Configuration::load_or_create(&path).unwrap();
        assert_eq!(configuration, Configuration::default());
        assert!(path.exists());
    }

    #[test]
    fn test_yaml_sections() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIGURATION_FILE_NAME);
        fs::write(
            &path,
            "key_store: file\nvault:\n  server: pvwa.example.com\n  auth_method: LDAP\ncloud:\n  server: vcd.example.com\n  org: System\n",
        )
        .unwrap();

        let configuration = Configuration::load_from_file(&path).unwrap();
        assert_eq!(configuration.key_store(), KeyStoreKind::File);
        assert_eq!(
            configuration.defaults(Namespace::Vault).unwrap().server.as_deref(),
            Some("pvwa.example.com")
        );
        assert_eq!(configuration.vault().auth_method.as_deref(), Some("LDAP"));
        assert_eq!(configuration.cloud().org.as_deref(), Some("System"));
        assert!(configuration.defaults(Namespace::VSphere).unwrap().server.is_none());
        assert!(configuration.defaults(Namespace::Utils).is_none());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIGURATION_FILE_NAME);
        let mut configuration = Configuration::default();
        configuration.defaults_mut(Namespace::VSphere).unwrap().server =
            Some("vcenter.lab".to_string());
        configuration.save(&path).unwrap();

        let reloaded = Configuration::load_from_file(&path).unwrap();
        assert_eq!(reloaded, configuration);
    }

    #[test]
    fn test_namespace_credential_directory_wins() {
        let mut configuration = Configuration::default();
        configuration.credential_directory = Some(PathBuf::from("/global"));
        configuration.defaults_mut(Namespace::Cloud).unwrap().credential_directory =
            Some(PathBuf::from("/cloud"));

        assert_eq!(
            configuration.credential_directory(Namespace::Cloud).unwrap(),
            PathBuf::from("/cloud")
        );
        assert_eq!(
            configuration.credential_directory(Namespace::Vault).unwrap(),
            PathBuf::from("/global")
        );
    }

    #[test]
    fn test_utils_has_no_section() {
        let mut configuration = Configuration::default();
        assert!(matches!(
            configuration.defaults_mut(Namespace::Utils),
            Err(ConfigurationError::UnsupportedNamespace(Namespace::Utils))
        ));
    }
}
