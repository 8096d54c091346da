/// Operating system family the cleanup tables are keyed on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    MacOs,
    Windows,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Linux
        }
    }

    pub fn is_windows(self) -> bool {
        matches!(self, Platform::Windows)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Linux => "linux",
            Platform::MacOs => "macos",
            Platform::Windows => "windows",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_platform() {
        let platform = Platform::current();
        assert_eq!(platform.is_windows(), cfg!(windows));
    }

    #[test]
    fn test_platform_as_str() {
        assert_eq!(Platform::Linux.as_str(), "linux");
        assert_eq!(Platform::MacOs.as_str(), "macos");
        assert_eq!(Platform::Windows.as_str(), "windows");
    }
}
