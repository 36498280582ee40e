//! Dependency manifest and the install sequence that consumes it

use anyhow::{Context, Result, bail};
use bootstrap::{ArchiveExtractor, Downloader, EnvironmentStore, ProgressCallback, Scope, UrlSource};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Dependencies to install, in order
#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    pub dependencies: Vec<Dependency>,
    /// Directory relative paths are resolved against
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Dependency {
    pub name: String,
    /// Where the downloaded archive is written
    pub destination: PathBuf,
    pub urls: UrlSource,
    /// Variable that marks the dependency as installed
    pub variable: Variable,
    /// Directory to add to PATH once installed
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default = "default_extract")]
    pub extract: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Variable {
    pub name: String,
    #[serde(default = "default_scope")]
    pub scope: Scope,
    /// Defaults to the destination's directory
    #[serde(default)]
    pub value: Option<String>,
}

fn default_extract() -> bool {
    true
}

fn default_scope() -> Scope {
    Scope::System
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest {}", path.display()))?;
        let mut manifest: Manifest = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse manifest {}", path.display()))?;

        let base_dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        manifest.base_dir = std::path::absolute(base_dir)
            .with_context(|| format!("Failed to resolve {}", base_dir.display()))?;
        Ok(manifest)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.base_dir.join(path)
    }
}

/// What happened to one dependency
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Its variable already had a value
    AlreadyInstalled { value: String },
    Installed { value: String, path_changed: bool },
}

/// Runs fetch, extract and registration for each manifest entry
pub struct Installer<'a> {
    downloader: &'a Downloader,
    extractor: &'a dyn ArchiveExtractor,
    store: &'a dyn EnvironmentStore,
    progress_callback: Option<ProgressCallback>,
}

impl<'a> Installer<'a> {
    pub fn new(
        downloader: &'a Downloader,
        extractor: &'a dyn ArchiveExtractor,
        store: &'a dyn EnvironmentStore,
        progress_callback: Option<ProgressCallback>,
    ) -> Self {
        Self {
            downloader,
            extractor,
            store,
            progress_callback,
        }
    }

    /// Install every dependency in order, stopping at the first failure
    pub async fn install_all(&self, manifest: &Manifest) -> Result<Vec<(String, Outcome)>> {
        let mut outcomes = Vec::with_capacity(manifest.dependencies.len());
        for dependency in &manifest.dependencies {
            let outcome = self
                .install(manifest, dependency)
                .await
                .with_context(|| format!("Failed to install {}", dependency.name))?;
            outcomes.push((dependency.name.clone(), outcome));
        }
        Ok(outcomes)
    }

    async fn install(&self, manifest: &Manifest, dependency: &Dependency) -> Result<Outcome> {
        let variable = &dependency.variable;
        if let Some(value) = self.store.get(variable.scope, &variable.name)? {
            info!("{} already installed ({}={})", dependency.name, variable.name, value);
            return Ok(Outcome::AlreadyInstalled { value });
        }

        let destination = manifest.resolve(&dependency.destination);
        let Some(install_dir) = destination.parent() else {
            bail!("Destination {} has no parent directory", destination.display());
        };

        info!("Installing {}", dependency.name);
        let result = self
            .downloader
            .fetch(&dependency.urls, &destination, self.progress_callback.clone())
            .await?;
        info!("Fetched {} bytes from {}", result.size, result.url);

        if dependency.extract {
            self.extractor
                .extract(&destination, true, self.progress_callback.clone())?;
        }

        let value = match &variable.value {
            Some(value) => value.clone(),
            None => install_dir.to_string_lossy().into_owned(),
        };
        self.store.set(variable.scope, &variable.name, &value)?;
        info!("Set {} ({}) to {}", variable.name, variable.scope, value);

        let path_changed = match &dependency.path {
            Some(path) => {
                let directory = manifest.resolve(path);
                self.store.add_to_path(&directory.to_string_lossy())?
            }
            None => false,
        };

        Ok(Outcome::Installed { value, path_changed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bootstrap::env::{MemoryStore, PATH_VAR};
    use bootstrap::extract::{ExtractionSummary, Result as ExtractResult};
    use bootstrap::DownloadConfig;
    use std::sync::Mutex;
    use tempfile::tempdir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Records archives instead of unpacking them
    #[derive(Default)]
    struct RecordingExtractor {
        archives: Mutex<Vec<PathBuf>>,
    }

    impl ArchiveExtractor for RecordingExtractor {
        fn name(&self) -> &'static str {
            "recording"
        }

        fn extract(
            &self,
            archive: &Path,
            delete_after: bool,
            _progress_callback: Option<ProgressCallback>,
        ) -> ExtractResult<ExtractionSummary> {
            self.archives.lock().unwrap().push(archive.to_path_buf());
            Ok(ExtractionSummary {
                destination: archive.parent().unwrap().to_path_buf(),
                stats: None,
                archive_deleted: delete_after,
            })
        }
    }

    fn manifest_in(base_dir: &Path, json: &str) -> Manifest {
        let file = base_dir.join("dependencies.json");
        fs::write(&file, json).unwrap();
        Manifest::load(&file).unwrap()
    }

    async fn serve(server: &MockServer, route: &str, body: &[u8]) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
            .mount(server)
            .await;
    }

    #[test]
    fn parses_single_url_and_defaults() {
        let temp_dir = tempdir().unwrap();
        let manifest = manifest_in(
            temp_dir.path(),
            r#"{
                "dependencies": [{
                    "name": "premake",
                    "destination": "vendor/premake/premake.zip",
                    "urls": "https://example.com/premake.zip",
                    "variable": { "name": "PREMAKE_HOME" }
                }]
            }"#,
        );

        let dependency = &manifest.dependencies[0];
        assert_eq!(dependency.urls, UrlSource::Single("https://example.com/premake.zip".to_string()));
        assert_eq!(dependency.variable.scope, Scope::System);
        assert!(dependency.extract);
        assert_eq!(dependency.path, None);
        assert_eq!(manifest.base_dir, temp_dir.path());
    }

    #[test]
    fn rejects_non_string_urls() {
        let temp_dir = tempdir().unwrap();
        let file = temp_dir.path().join("dependencies.json");
        fs::write(
            &file,
            r#"{"dependencies": [{"name": "x", "destination": "x.zip", "urls": 42, "variable": {"name": "X"}}]}"#,
        )
        .unwrap();

        assert!(Manifest::load(&file).is_err());
    }

    #[tokio::test]
    async fn installs_from_second_mirror_and_registers() {
        let server = MockServer::start().await;
        serve(&server, "/sdk.zip", b"sdk archive").await;
        let temp_dir = tempdir().unwrap();
        let manifest = manifest_in(
            temp_dir.path(),
            &format!(
                r#"{{
                    "dependencies": [{{
                        "name": "vulkan-sdk",
                        "destination": "vendor/VulkanSDK/sdk.zip",
                        "urls": ["{0}/missing.zip", "{0}/sdk.zip"],
                        "variable": {{ "name": "VULKAN_SDK", "scope": "system" }},
                        "path": "vendor/VulkanSDK/bin"
                    }}]
                }}"#,
                server.uri()
            ),
        );

        let downloader = Downloader::new(DownloadConfig::default()).unwrap();
        let extractor = RecordingExtractor::default();
        let store = MemoryStore::new();
        let installer = Installer::new(&downloader, &extractor, &store, None);

        let outcomes = installer.install_all(&manifest).await.unwrap();

        let install_dir = temp_dir.path().join("vendor/VulkanSDK");
        let expected_value = install_dir.to_string_lossy().into_owned();
        assert_eq!(
            outcomes,
            vec![(
                "vulkan-sdk".to_string(),
                Outcome::Installed {
                    value: expected_value.clone(),
                    path_changed: true
                }
            )]
        );
        assert_eq!(fs::read(install_dir.join("sdk.zip")).unwrap(), b"sdk archive");
        assert_eq!(*extractor.archives.lock().unwrap(), vec![install_dir.join("sdk.zip")]);
        assert_eq!(store.get(Scope::System, "VULKAN_SDK").unwrap(), Some(expected_value));
        assert_eq!(
            store.get(Scope::System, PATH_VAR).unwrap(),
            Some(install_dir.join("bin").to_string_lossy().into_owned())
        );
    }

    #[tokio::test]
    async fn skips_dependency_whose_variable_is_set() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let temp_dir = tempdir().unwrap();
        let manifest = manifest_in(
            temp_dir.path(),
            &format!(
                r#"{{"dependencies": [{{
                    "name": "vulkan-sdk",
                    "destination": "vendor/VulkanSDK/sdk.zip",
                    "urls": "{}/sdk.zip",
                    "variable": {{ "name": "VULKAN_SDK" }}
                }}]}}"#,
                server.uri()
            ),
        );

        let downloader = Downloader::new(DownloadConfig::default()).unwrap();
        let extractor = RecordingExtractor::default();
        let store = MemoryStore::new();
        store.set(Scope::System, "VULKAN_SDK", "/opt/vulkan").unwrap();
        let installer = Installer::new(&downloader, &extractor, &store, None);

        let outcomes = installer.install_all(&manifest).await.unwrap();

        assert_eq!(
            outcomes[0].1,
            Outcome::AlreadyInstalled {
                value: "/opt/vulkan".to_string()
            }
        );
        assert!(extractor.archives.lock().unwrap().is_empty());
        assert!(!temp_dir.path().join("vendor").exists());
    }

    #[tokio::test]
    async fn plain_file_is_not_extracted() {
        let server = MockServer::start().await;
        serve(&server, "/premake5", b"binary").await;
        let temp_dir = tempdir().unwrap();
        let manifest = manifest_in(
            temp_dir.path(),
            &format!(
                r#"{{"dependencies": [{{
                    "name": "premake",
                    "destination": "vendor/premake/premake5",
                    "urls": "{}/premake5",
                    "variable": {{ "name": "PREMAKE_HOME", "scope": "user", "value": "custom" }},
                    "extract": false
                }}]}}"#,
                server.uri()
            ),
        );

        let downloader = Downloader::new(DownloadConfig::default()).unwrap();
        let extractor = RecordingExtractor::default();
        let store = MemoryStore::new();
        let installer = Installer::new(&downloader, &extractor, &store, None);

        installer.install_all(&manifest).await.unwrap();

        assert!(extractor.archives.lock().unwrap().is_empty());
        assert!(temp_dir.path().join("vendor/premake/premake5").is_file());
        assert_eq!(store.get(Scope::User, "PREMAKE_HOME").unwrap(), Some("custom".to_string()));
        assert_eq!(store.get(Scope::System, PATH_VAR).unwrap(), None);
    }

    #[tokio::test]
    async fn stops_at_first_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        let temp_dir = tempdir().unwrap();
        let manifest = manifest_in(
            temp_dir.path(),
            &format!(
                r#"{{"dependencies": [
                    {{
                        "name": "first",
                        "destination": "vendor/first/first.zip",
                        "urls": ["{0}/a.zip", "{0}/b.zip"],
                        "variable": {{ "name": "FIRST_HOME" }}
                    }},
                    {{
                        "name": "second",
                        "destination": "vendor/second/second.zip",
                        "urls": "{0}/second.zip",
                        "variable": {{ "name": "SECOND_HOME" }}
                    }}
                ]}}"#,
                server.uri()
            ),
        );

        let downloader = Downloader::new(DownloadConfig::default()).unwrap();
        let extractor = RecordingExtractor::default();
        let store = MemoryStore::new();
        let installer = Installer::new(&downloader, &extractor, &store, None);

        let error = installer.install_all(&manifest).await.unwrap_err();

        assert!(error.to_string().contains("first"));
        assert!(!temp_dir.path().join("vendor/first/first.zip").exists());
        assert_eq!(store.get(Scope::System, "FIRST_HOME").unwrap(), None);
        assert!(!temp_dir.path().join("vendor/second").exists());
    }
}
