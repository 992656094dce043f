//! Chat command surface
//!
//! ```text
//! /camrig [ help | preset [name] | zoom <value> | fov <value> | spectate | noclip | freecam ]
//! ```
//!
//! Parsing lives here; [`crate::Camrig::execute`] applies the parsed command.

mod info;

pub use info::{CommandInfo, CommandReply};

/// Usage line printed for unknown subcommands
pub const USAGE: &str = "/camrig [ help | preset | zoom | fov | spectate | noclip | freecam ]";

/// Text printed by `help`
pub const HELP: &str = "Subcommands:\
\npreset <name> - Pin the preset with this name over automatic selection. Without a name the pin is removed.\
\nzoom <value> - Set the current zoom.\
\nfov <value> - Set the current field of view.\
\nspectate - Toggle following the focus / soft target.\
\nnoclip - Toggle camera collision.\
\nfreecam - Toggle the free camera.";

/// A parsed subcommand
#[derive(Debug, Clone, PartialEq)]
pub enum Subcommand {
    /// Pin a preset by name, or clear the pin
    Preset(Option<String>),
    Zoom(f32),
    Fov(f32),
    Spectate,
    NoClip,
    FreeCam,
    Help,
}

impl Subcommand {
    /// Parse a command invocation
    ///
    /// `Ok(None)` for an empty invocation; `Err` carries the reply to print.
    pub fn parse(info: &CommandInfo) -> Result<Option<Self>, CommandReply> {
        if info.is_empty() {
            return Ok(None);
        }

        let command = match info.command_name().as_str() {
            "preset" => {
                let name = info.arg_string();
                Self::Preset((!name.is_empty()).then(|| name.to_string()))
            }
            "zoom" => Self::Zoom(
                info.arg_f32()
                    .ok_or_else(|| CommandReply::Error("Invalid amount.".to_string()))?,
            ),
            "fov" => Self::Fov(
                info.arg_f32()
                    .ok_or_else(|| CommandReply::Error("Invalid amount.".to_string()))?,
            ),
            "spectate" => Self::Spectate,
            "noclip" => Self::NoClip,
            "freecam" => Self::FreeCam,
            "help" => Self::Help,
            _ => return Err(CommandReply::Error(format!("Invalid usage: {}", USAGE))),
        };

        Ok(Some(command))
    }
}
