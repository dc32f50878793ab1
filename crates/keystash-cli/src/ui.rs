//! Terminal output helpers.

use std::io::IsTerminal;

use owo_colors::OwoColorize;

/// Whether stderr should carry ANSI colors.
pub fn stderr_color() -> bool {
    let term_is_dumb = std::env::var("TERM").map(|v| v == "dumb").unwrap_or(false);
    let no_color_env = std::env::var("NO_COLOR").is_ok();
    std::io::stderr().is_terminal() && !no_color_env && !term_is_dumb
}

/// Render an error line with an optional hint line.
///
/// Colored: red "error:" label and dim "hint:" label.
/// Plain: the same text without escapes.
pub fn error_message(color: bool, message: &str, hint: Option<&str>) -> String {
    let mut lines = Vec::new();
    if color {
        lines.push(format!("{} {}", "error:".red().bold(), message));
        if let Some(h) = hint {
            lines.push(format!("{} {}", "hint:".dimmed(), h));
        }
    } else {
        lines.push(format!("error: {}", message));
        if let Some(h) = hint {
            lines.push(format!("hint: {}", h));
        }
    }
    lines.join("\n")
}

/// Render a warning line.
pub fn warning_message(color: bool, message: &str) -> String {
    if color {
        format!("{} {}", "warning:".yellow().bold(), message)
    } else {
        format!("warning: {}", message)
    }
}

/// Print an error message to stderr with optional hint.
pub fn print_error(message: &str, hint: Option<&str>) {
    eprintln!("{}", error_message(stderr_color(), message, hint));
}

pub fn print_warning(message: &str) {
    eprintln!("{}", warning_message(stderr_color(), message));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_error_with_hint() {
        let rendered = error_message(false, "Nothing stored", Some("Run `keystash set`"));
        assert_eq!(rendered, "error: Nothing stored\nhint: Run `keystash set`");
    }

    #[test]
    fn test_plain_error_without_hint() {
        assert_eq!(error_message(false, "boom", None), "error: boom");
    }

    #[test]
    fn test_colored_error_contains_message() {
        let rendered = error_message(true, "boom", None);
        assert!(rendered.contains("boom"));
        assert!(rendered.contains('\u{1b}'));
    }

    #[test]
    fn test_plain_warning() {
        assert_eq!(warning_message(false, "careful"), "warning: careful");
    }
}
