//! Diagnostic output on stderr.

use metal_types::MetalError;

/// Writes diagnostics either as readable text or as one JSON object per
/// line.
pub struct Reporter {
    json: bool,
}

impl Reporter {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    pub fn error(&self, err: &MetalError) {
        eprintln!("{}", self.format(err));
    }

    fn format(&self, err: &MetalError) -> String {
        if self.json {
            return serde_json::to_string(err).unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}"));
        }
        if err.source_line.is_empty() {
            err.to_string()
        } else {
            format!("{err}\n  | {}", err.source_line)
        }
    }
}
