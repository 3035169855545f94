use super::StatusDisplay;
use crate::error::DisplayError;

/// Display that writes to the log
///
/// Repeated content is logged once so a steady score doesn't flood the
/// output at the refresh rate.
#[derive(Debug, Default)]
pub struct ConsoleDisplay {
    current: Option<(String, String)>,
}

impl ConsoleDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines currently shown, `None` when cleared
    pub fn current(&self) -> Option<(&str, &str)> {
        self.current.as_ref().map(|(a, b)| (a.as_str(), b.as_str()))
    }
}

impl StatusDisplay for ConsoleDisplay {
    fn display(&mut self, line1: &str, line2: &str) -> Result<(), DisplayError> {
        if self.current() == Some((line1, line2)) {
            return Ok(());
        }

        tracing::info!("[display] {} | {}", line1, line2);
        self.current = Some((line1.to_string(), line2.to_string()));
        Ok(())
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        if self.current.take().is_some() {
            tracing::info!("[display] cleared");
        }
        Ok(())
    }
}
