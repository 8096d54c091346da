use anstyle::{AnsiColor, Style};
use is_terminal::IsTerminal;
use std::fmt::{Display, Write as _};
use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Right-aligned width of the label column
const LABEL_WIDTH: usize = 12;

static STATUS_TO_STDERR: AtomicBool = AtomicBool::new(false);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tone {
    Pending,
    Good,
    Note,
    Quiet,
    Caution,
    Bad,
}

impl Tone {
    fn style(self) -> Style {
        let color = match self {
            Tone::Quiet => return Style::new().dimmed(),
            Tone::Pending => AnsiColor::Cyan,
            Tone::Good => AnsiColor::Green,
            Tone::Note => AnsiColor::Blue,
            Tone::Caution => AnsiColor::Yellow,
            Tone::Bad => AnsiColor::Red,
        };
        Style::new().bold().fg_color(Some(color.into()))
    }

    fn to_stderr(self) -> bool {
        STATUS_TO_STDERR.load(Ordering::Relaxed) || matches!(self, Tone::Caution | Tone::Bad)
    }
}

/// Send every status line to stderr, leaving stdout to a delegated process.
pub fn route_to_stderr() {
    STATUS_TO_STDERR.store(true, Ordering::Relaxed);
}

fn colored(tty: bool) -> bool {
    tty && std::env::var_os("NO_COLOR").is_none()
}

/// Label column followed by the message; continuation lines line up under it
fn render(tone: Tone, label: &str, message: &str, color: bool) -> String {
    let style = if color { tone.style() } else { Style::new() };
    let mut out = String::new();

    for (idx, line) in message.split('\n').enumerate() {
        let label = if idx == 0 { label } else { "" };
        let _ = writeln!(
            out,
            "{}{label:>LABEL_WIDTH$}{} {line}",
            style.render(),
            style.render_reset()
        );
    }
    out
}

fn emit(tone: Tone, label: &str, message: &str) {
    let result = if tone.to_stderr() {
        let stderr = io::stderr();
        let text = render(tone, label, message, colored(stderr.is_terminal()));
        stderr.lock().write_all(text.as_bytes())
    } else {
        let stdout = io::stdout();
        let text = render(tone, label, message, colored(stdout.is_terminal()));
        let mut handle = stdout.lock();
        handle.write_all(text.as_bytes()).and_then(|()| handle.flush())
    };
    if let Err(err) = result {
        tracing::debug!(error = %err, "could not write status line");
    }
}

fn elapsed(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{millis}ms")
    } else if millis < 60_000 {
        format!("{:.1}s", duration.as_secs_f64())
    } else {
        format!("{}m {}s", millis / 60_000, (millis % 60_000) / 1000)
    }
}

pub fn status(label: &str, message: impl Display) {
    emit(Tone::Pending, label, &message.to_string());
}

pub fn info(message: impl Display) {
    emit(Tone::Note, "Info", &message.to_string());
}

/// Indented continuation line without a label
pub fn detail(message: impl Display) {
    emit(Tone::Quiet, "", &message.to_string());
}

pub fn warn(message: impl Display) {
    emit(Tone::Caution, "Warning", &message.to_string());
}

pub fn error(message: impl Display) {
    emit(Tone::Bad, "Error", &message.to_string());
}

pub fn success(label: &str, message: impl Display) {
    emit(Tone::Good, label, &message.to_string());
}

pub fn failure(label: &str, message: impl Display) {
    emit(Tone::Bad, label, &message.to_string());
}

/// Ask a yes/no question on an interactive terminal; anything but `y`/`yes` declines.
///
/// Returns `None` when stdin is not a terminal so callers can pick their own default.
pub fn confirm(question: impl Display) -> Option<bool> {
    let stdin = io::stdin();
    if !stdin.is_terminal() {
        return None;
    }

    emit(Tone::Pending, "Confirm", &format!("{question} [y/N]"));

    let mut answer = String::new();
    if stdin.lock().read_line(&mut answer).is_err() {
        return Some(false);
    }
    Some(is_affirmative(&answer))
}

fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// A step that prints when it starts and again when it settles.
///
/// Dropping an unsettled step reports it as aborted.
pub struct Progress {
    message: String,
    started: Instant,
    settled: bool,
}

impl Progress {
    pub fn new(label: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        emit(Tone::Pending, &label.into(), &message);
        Self {
            message,
            started: Instant::now(),
            settled: false,
        }
    }

    pub fn success(mut self, label: &str, detail: Option<String>) {
        let detail = detail.filter(|detail| !detail.is_empty());
        let text = match detail {
            Some(detail) => format!("{} {detail} in {}", self.message, self.took()),
            None => format!("{} in {}", self.message, self.took()),
        };
        self.settle(Tone::Good, label, &text);
    }

    /// Finish with a non-fatal problem; the caller carries on.
    pub fn warn(mut self, label: &str, reason: impl Display) {
        let text = format!("{} after {}: {reason}", self.message, self.took());
        self.settle(Tone::Caution, label, &text);
    }

    fn took(&self) -> String {
        elapsed(self.started.elapsed())
    }

    fn settle(&mut self, tone: Tone, label: &str, text: &str) {
        if !self.settled {
            self.settled = true;
            emit(tone, label, text);
        }
    }
}

impl Drop for Progress {
    fn drop(&mut self) {
        let text = format!("{} (aborted)", self.message);
        self.settle(Tone::Caution, "Cancelled", &text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Duration::from_micros(250), "0ms")]
    #[case(Duration::from_millis(42), "42ms")]
    #[case(Duration::from_millis(1500), "1.5s")]
    #[case(Duration::from_secs(120), "2m 0s")]
    #[case(Duration::from_secs(125), "2m 5s")]
    fn test_elapsed(#[case] duration: Duration, #[case] expected: &str) {
        assert_eq!(elapsed(duration), expected);
    }

    #[rstest]
    #[case("y\n", true)]
    #[case("YES", true)]
    #[case(" yes \r\n", true)]
    #[case("n", false)]
    #[case("", false)]
    #[case("yep", false)]
    fn test_is_affirmative(#[case] answer: &str, #[case] expected: bool) {
        assert_eq!(is_affirmative(answer), expected);
    }

    #[test]
    fn test_render_aligns_continuation_lines() {
        let text = render(Tone::Pending, "Manual", "first\nsecond", false);
        assert_eq!(text, "      Manual first\n             second\n");
    }

    #[test]
    fn test_render_blank_label_keeps_column() {
        let text = render(Tone::Quiet, "", "detail", false);
        assert_eq!(text, format!("{} detail\n", " ".repeat(LABEL_WIDTH)));
    }
}
