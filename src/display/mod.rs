/// Status display module
///
/// Two-line character display showing the score and match status.
///
/// ## Architecture
///
/// ```text
/// MatchState ──> StatusPresenter ── throttle ── fit_line ──> StatusDisplay
///                                                              ├── ConsoleDisplay
///                                                              └── (hardware driver)
/// ```

pub mod console;
pub mod presenter;

use crate::error::DisplayError;

pub use console::ConsoleDisplay;
pub use presenter::StatusPresenter;

/// Two-line character display
///
/// Implementations receive lines already fitted to the display width.
pub trait StatusDisplay: Send {
    fn display(&mut self, line1: &str, line2: &str) -> Result<(), DisplayError>;

    fn clear(&mut self) -> Result<(), DisplayError>;
}

/// Pad with spaces or truncate to exactly `width` characters
pub fn fit_line(text: &str, width: usize) -> String {
    let mut line: String = text.chars().take(width).collect();
    let len = line.chars().count();
    line.extend(std::iter::repeat(' ').take(width - len));
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_line_pads() {
        assert_eq!(fit_line("L:03 - R:05", 16), "L:03 - R:05     ");
        assert_eq!(fit_line("", 4), "    ");
    }

    #[test]
    fn test_fit_line_truncates() {
        let line = fit_line("RIGHT PLAYER WON!", 16);
        assert_eq!(line, "RIGHT PLAYER WON");
        assert_eq!(line.chars().count(), 16);
    }

    #[test]
    fn test_fit_line_exact_width() {
        assert_eq!(fit_line("LEFT PLAYER WON!", 16), "LEFT PLAYER WON!");
    }
}
