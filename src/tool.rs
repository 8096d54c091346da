/// Package name of this shim as published to the npm registry.
pub const SHIM_PACKAGE: &str = "claude-code-updater";

/// Comment written above shell integration lines at install time.
pub const INSTALL_MARKER: &str = "# Added by claude-code-updater";

/// Directory under `$HOME` holding the shim's persisted settings.
pub const USER_DATA_DIR: &str = ".claude-code-updater";

/// Identifies the external package and the command it installs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedToolReference {
    registry_name: String,
    local_command: String,
}

impl ManagedToolReference {
    pub fn new(registry_name: impl Into<String>, local_command: impl Into<String>) -> Self {
        Self {
            registry_name: registry_name.into(),
            local_command: local_command.into(),
        }
    }

    /// The Claude Code CLI as published on npm.
    pub fn claude_code() -> Self {
        Self::new("@anthropic-ai/claude-code", "claude")
    }

    pub fn registry_name(&self) -> &str {
        &self.registry_name
    }

    pub fn local_command(&self) -> &str {
        &self.local_command
    }

    /// Command the user can run to install the tool themselves.
    pub fn install_hint(&self) -> String {
        format!("npm i -g {}", self.registry_name)
    }
}
