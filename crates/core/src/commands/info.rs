//! Command information types

/// Outcome of a command, printed by the loader
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandReply {
    /// Empty argument; the loader handles it (opens its own UI)
    NotHandled,
    /// Handled, nothing to print
    Handled,
    /// Handled, print as a normal message
    Echo(String),
    /// Print as an error; no state was changed
    Error(String),
}

impl CommandReply {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

/// One command invocation split into a subcommand and its argument
///
/// The argument is everything after the first space, kept verbatim so preset
/// names may contain spaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInfo {
    /// Subcommand (index 0) and, when present, its argument
    args: Vec<String>,

    /// Full argument string as typed
    raw_string: String,
}

impl CommandInfo {
    /// Split a raw argument string
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim_start();
        let mut args = Vec::new();

        if !trimmed.is_empty() {
            match trimmed.split_once(' ') {
                Some((name, rest)) => {
                    args.push(name.to_string());
                    if !rest.is_empty() {
                        args.push(rest.to_string());
                    }
                }
                None => args.push(trimmed.to_string()),
            }
        }

        Self {
            args,
            raw_string: raw.to_string(),
        }
    }

    /// Whether nothing but whitespace was typed
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Get the number of arguments (including the subcommand at index 0)
    pub fn arg_count(&self) -> usize {
        self.args.len()
    }

    /// Get argument by index (0 = subcommand)
    ///
    /// Returns empty string if index is out of bounds.
    pub fn arg(&self, index: usize) -> &str {
        self.args.get(index).map(|s| s.as_str()).unwrap_or("")
    }

    /// Lowercased subcommand
    pub fn command_name(&self) -> String {
        self.arg(0).to_lowercase()
    }

    /// Everything after the subcommand
    pub fn arg_string(&self) -> &str {
        self.arg(1)
    }

    /// Argument parsed as a finite float
    pub fn arg_f32(&self) -> Option<f32> {
        self.arg_string()
            .trim()
            .parse::<f32>()
            .ok()
            .filter(|v| v.is_finite())
    }

    /// Get the full raw command string
    pub fn get_command_string(&self) -> &str {
        &self.raw_string
    }
}
