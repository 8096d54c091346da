use regex::Regex;
use std::fs;
use std::io;
use std::path::PathBuf;

use super::CleanupContext;
use crate::tool::{INSTALL_MARKER, SHIM_PACKAGE};

/// Shell whose startup file may carry shim integration lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellDialect {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

impl ShellDialect {
    pub fn as_str(self) -> &'static str {
        match self {
            ShellDialect::Bash => "bash",
            ShellDialect::Zsh => "zsh",
            ShellDialect::Fish => "fish",
            ShellDialect::PowerShell => "powershell",
        }
    }

    /// Content with every shim-installed statement removed
    pub fn scrub(self, content: &str, rules: &ScrubRules) -> String {
        match self {
            ShellDialect::Bash | ShellDialect::Zsh | ShellDialect::Fish => {
                filter_lines(content, |line| rules.drops_line(line))
            }
            ShellDialect::PowerShell => scrub_powershell(content, rules),
        }
    }
}

/// What counts as shim-installed in a startup file
#[derive(Debug, Clone)]
pub struct ScrubRules {
    package: String,
    marker: String,
    alias: Regex,
    ps_function: Regex,
}

impl ScrubRules {
    pub fn new(package: &str, marker: &str, command: &str) -> Result<Self, regex::Error> {
        let command = regex::escape(command);
        Ok(Self {
            package: package.to_string(),
            marker: marker.to_string(),
            // `alias claude=...` (POSIX) or `alias claude ...` (fish)
            alias: Regex::new(&format!(r"\balias\s+{command}(=|\s)"))?,
            ps_function: Regex::new(&format!(
                r"(?imR)^[ \t]*function[ \t]+{command}(?:[ \t({{]|$)"
            ))?,
        })
    }

    /// Rules for the shim and the given managed command
    pub fn for_command(command: &str) -> Result<Self, regex::Error> {
        Self::new(SHIM_PACKAGE, INSTALL_MARKER, command)
    }

    fn drops_line(&self, line: &str) -> bool {
        line.contains(&self.package) || line.contains(&self.marker) || self.alias.is_match(line)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellProfileTarget {
    pub path: PathBuf,
    pub dialect: ShellDialect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrubOutcome {
    Modified,
    Unchanged,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrubReport {
    pub file: PathBuf,
    pub outcome: ScrubOutcome,
}

impl ScrubReport {
    pub fn modified(&self) -> bool {
        self.outcome == ScrubOutcome::Modified
    }
}

/// Startup files still holding shim lines, plus files that could not be read
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasScan {
    pub dirty: Vec<PathBuf>,
    pub errors: Vec<String>,
}

pub struct AliasScrubber<'a> {
    context: &'a CleanupContext,
    rules: ScrubRules,
}

impl<'a> AliasScrubber<'a> {
    pub fn new(context: &'a CleanupContext, rules: ScrubRules) -> Self {
        Self { context, rules }
    }

    pub fn targets(&self) -> Vec<ShellProfileTarget> {
        let home = &self.context.home;
        let mut targets = vec![
            ShellProfileTarget {
                path: home.join(".bashrc"),
                dialect: ShellDialect::Bash,
            },
            ShellProfileTarget {
                path: home.join(".bash_profile"),
                dialect: ShellDialect::Bash,
            },
            ShellProfileTarget {
                path: home.join(".zshrc"),
                dialect: ShellDialect::Zsh,
            },
            ShellProfileTarget {
                path: home.join(".config/fish/config.fish"),
                dialect: ShellDialect::Fish,
            },
        ];

        if self.context.platform.is_windows() {
            for dir in ["Documents/PowerShell", "Documents/WindowsPowerShell"] {
                targets.push(ShellProfileTarget {
                    path: home.join(dir).join("profile.ps1"),
                    dialect: ShellDialect::PowerShell,
                });
            }
        }

        targets
    }

    /// Rewrite every startup file that carries shim lines; missing files are skipped
    pub fn scrub_shell_configs(&self) -> Vec<ScrubReport> {
        self.targets()
            .into_iter()
            .filter_map(|target| {
                let outcome = match self.scrub_file(&target) {
                    Ok(Some(true)) => ScrubOutcome::Modified,
                    Ok(Some(false)) => ScrubOutcome::Unchanged,
                    Ok(None) => return None,
                    Err(err) => {
                        tracing::warn!(file = ?target.path, error = %err, "could not clean shell config");
                        ScrubOutcome::Failed(err.to_string())
                    }
                };
                Some(ScrubReport {
                    file: target.path,
                    outcome,
                })
            })
            .collect()
    }

    pub fn scan(&self) -> AliasScan {
        let mut scan = AliasScan::default();
        for target in self.targets() {
            match read_if_exists(&target) {
                Ok(Some(content)) => {
                    if target.dialect.scrub(&content, &self.rules) != content {
                        scan.dirty.push(target.path);
                    }
                }
                Ok(None) => {}
                Err(err) => scan
                    .errors
                    .push(format!("could not read {}: {err}", target.path.display())),
            }
        }
        scan
    }

    /// `Ok(None)` when the file does not exist, otherwise whether it was rewritten
    fn scrub_file(&self, target: &ShellProfileTarget) -> io::Result<Option<bool>> {
        let Some(content) = read_if_exists(target)? else {
            return Ok(None);
        };

        let scrubbed = target.dialect.scrub(&content, &self.rules);
        if scrubbed == content {
            return Ok(Some(false));
        }

        fs::write(&target.path, scrubbed)?;
        tracing::info!(file = ?target.path, dialect = target.dialect.as_str(), "removed shell integration");
        Ok(Some(true))
    }
}

fn read_if_exists(target: &ShellProfileTarget) -> io::Result<Option<String>> {
    match fs::read_to_string(&target.path) {
        Ok(content) => Ok(Some(content)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}

/// Drop matching lines, keeping order and the original line terminators
fn filter_lines(content: &str, drop: impl Fn(&str) -> bool) -> String {
    let lines: Vec<&str> = content.split('\n').collect();
    let kept: Vec<&str> = lines.iter().copied().filter(|line| !drop(line)).collect();

    if kept.len() == lines.len() {
        content.to_string()
    } else {
        kept.join("\n")
    }
}

fn scrub_powershell(content: &str, rules: &ScrubRules) -> String {
    if !content.contains(&rules.package) {
        return content.to_string();
    }

    let mut scrubbed = content.to_string();
    while let Some(found) = rules.ps_function.find(&scrubbed) {
        let end = statement_end(&scrubbed, found.start());
        scrubbed.replace_range(found.start()..end, "");
    }

    filter_lines(&scrubbed, |line| {
        line.contains(&rules.package) || line.contains(&rules.marker)
    })
}

/// End (exclusive, including the trailing newline) of the statement starting at `start`.
///
/// A function body may open on the same or the next line and spans until its
/// braces balance; an unbalanced body only claims its first line.
fn statement_end(content: &str, start: usize) -> usize {
    let rest = &content[start..];
    let first_line_end = line_end(rest, 0);
    let mut depth = 0usize;
    let mut opened = false;

    for (idx, ch) in rest.char_indices() {
        match ch {
            '{' => {
                depth += 1;
                opened = true;
            }
            '}' if opened => {
                depth -= 1;
                if depth == 0 {
                    return start + line_end(rest, idx);
                }
            }
            '\n' if !opened => {
                if !rest[idx + 1..].trim_start().starts_with('{') {
                    return start + idx + 1;
                }
            }
            _ => {}
        }
    }

    start + first_line_end
}

fn line_end(text: &str, from: usize) -> usize {
    text[from..]
        .find('\n')
        .map(|pos| from + pos + 1)
        .unwrap_or(text.len())
}
