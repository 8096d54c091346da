use anyhow::{anyhow, Context, Result};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, USER_AGENT};
use semver::Version;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use super::UpdateSource;
use crate::npm::{package_dir, PackageManager, PackageManifest};
use crate::tool::ManagedToolReference;

const DEFAULT_USER_AGENT: &str = concat!("claude-code-updater/", env!("CARGO_PKG_VERSION"));

/// Compares the globally installed package against the registry's `latest` tag.
pub struct NpmUpdater<P> {
    tool: ManagedToolReference,
    package_manager: P,
    registry: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct DistTags {
    latest: String,
}

impl<P: PackageManager> NpmUpdater<P> {
    pub fn new(
        tool: ManagedToolReference,
        package_manager: P,
        registry: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            tool,
            package_manager,
            registry: registry.into(),
            timeout,
        }
    }

    /// Version recorded in the installed package's manifest
    pub fn installed_version(&self) -> Result<Version> {
        let root = self
            .package_manager
            .global_root()
            .context("Failed to locate the global module root")?;
        let manifest_path = package_dir(&root, self.tool.registry_name()).join("package.json");
        let manifest = PackageManifest::load(&manifest_path)?;

        let version = manifest.version.ok_or_else(|| {
            anyhow!(
                "Package manifest {:?} does not declare a version",
                manifest_path
            )
        })?;
        Version::parse(&version)
            .with_context(|| format!("Installed version '{version}' is not valid semver"))
    }

    /// Version the registry currently tags as `latest`
    pub fn latest_version(&self) -> Result<Version> {
        let url = dist_tags_endpoint(&self.registry, self.tool.registry_name())?;
        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .context("Failed to build registry client")?;

        let response = client
            .get(url.clone())
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, DEFAULT_USER_AGENT)
            .send()
            .with_context(|| format!("Failed to request dist-tags from {url}"))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!(
                "Registry returned {status} for package '{}'",
                self.tool.registry_name()
            );
        }

        let tags = response
            .json::<DistTags>()
            .with_context(|| format!("Failed to decode dist-tags response from {url}"))?;
        Version::parse(&tags.latest)
            .with_context(|| format!("Registry version '{}' is not valid semver", tags.latest))
    }
}

impl<P: PackageManager> UpdateSource for NpmUpdater<P> {
    fn has_update(&self) -> Result<bool> {
        // Read the local version first so a missing install fails without a network round-trip
        let installed = self.installed_version()?;
        let latest = self.latest_version()?;
        tracing::debug!(%installed, %latest, "compared versions");
        Ok(needs_update(&installed, &latest))
    }

    fn update(&self) -> Result<()> {
        let spec = format!("{}@latest", self.tool.registry_name());
        self.package_manager
            .install(&spec)
            .with_context(|| format!("Failed to install {spec}"))?;
        Ok(())
    }
}

fn needs_update(installed: &Version, latest: &Version) -> bool {
    latest > installed
}

/// `<registry>/-/package/<name>/dist-tags`, with the scope separator escaped
pub(crate) fn dist_tags_endpoint(registry: &str, package: &str) -> Result<Url> {
    let mut url =
        Url::parse(registry).with_context(|| format!("Invalid registry URL '{registry}'"))?;
    url.path_segments_mut()
        .map_err(|_| anyhow!("Registry URL '{registry}' cannot carry a path"))?
        .pop_if_empty()
        .extend(["-", "package", package, "dist-tags"]);
    Ok(url)
}
