//! Gamedata system for loading signatures and offsets from JSON
//!
//! Signatures are loaded from a gamedata.json file deployed with the plugin.
//! This allows updating signatures for a new host version without recompiling.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading gamedata or resolving an entry
#[derive(Debug, Error)]
pub enum GamedataError {
    #[error("Failed to read gamedata file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse gamedata JSON: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Signature not found: {0}")]
    SignatureNotFound(String),

    #[error("Offset not found: {0}")]
    OffsetNotFound(String),

    #[error("Invalid signature format: {0}")]
    InvalidSignature(String),

    #[error("Failed to find signature in memory: {0}")]
    ScanFailed(String),
}

/// How a matched signature turns into an address
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureKind {
    /// The match itself is the address (function start, patch site)
    #[default]
    Function,
    /// The match contains a RIP-relative disp32 (`mov`/`lea` of a static,
    /// `call rel32`); the address is the displacement target
    #[serde(alias = "call")]
    Static,
}

/// Platform-specific signature entry
#[derive(Debug, Deserialize)]
pub struct SignatureEntry {
    /// Module to scan
    #[serde(default = "default_library")]
    pub library: String,
    /// Windows signature pattern
    pub windows: Option<String>,
    /// Linux signature pattern
    pub linux: Option<String>,
    #[serde(default)]
    pub kind: SignatureKind,
    /// Position of the disp32 inside the pattern (Static only).
    /// Defaults to the first wildcard byte.
    pub operand: Option<usize>,
    /// Added to the resolved address
    #[serde(default)]
    pub offset: i64,
}

fn default_library() -> String {
    "main".to_string()
}

/// Platform-specific offset entry
#[derive(Debug, Deserialize)]
pub struct OffsetEntry {
    /// Windows offset value
    pub windows: Option<i64>,
    /// Linux offset value
    pub linux: Option<i64>,
}

/// Loaded gamedata
#[derive(Debug, Default)]
pub struct Gamedata {
    signatures: HashMap<String, SignatureEntry>,
    offsets: HashMap<String, OffsetEntry>,
}

impl Gamedata {
    /// Load gamedata from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, GamedataError> {
        let content = std::fs::read_to_string(path)?;
        Self::load_from_str(&content)
    }

    /// Load gamedata from a JSON string
    pub fn load_from_str(json: &str) -> Result<Self, GamedataError> {
        let raw: HashMap<String, serde_json::Value> = serde_json::from_str(json)?;

        let mut gamedata = Gamedata::default();

        for (name, value) in raw {
            if value.get("signatures").is_some() {
                let entry: SignatureEntry = serde_json::from_value(value["signatures"].clone())?;
                gamedata.signatures.insert(name, entry);
            } else if value.get("offsets").is_some() {
                let entry: OffsetEntry = serde_json::from_value(value["offsets"].clone())?;
                gamedata.offsets.insert(name, entry);
            } else if value.get("linux").is_some() || value.get("windows").is_some() {
                // Flat signature entry
                let entry: SignatureEntry = serde_json::from_value(value)?;
                gamedata.signatures.insert(name, entry);
            }
        }

        tracing::info!(
            "Loaded gamedata: {} signatures, {} offsets",
            gamedata.signatures.len(),
            gamedata.offsets.len()
        );

        Ok(gamedata)
    }

    /// Get a signature entry by name
    pub fn get_entry(&self, name: &str) -> Result<&SignatureEntry, GamedataError> {
        self.signatures
            .get(name)
            .ok_or_else(|| GamedataError::SignatureNotFound(name.to_string()))
    }

    /// Get a signature pattern by name for the current platform
    pub fn get_signature(&self, name: &str) -> Result<&str, GamedataError> {
        let entry = self.get_entry(name)?;

        #[cfg(target_os = "linux")]
        let sig = entry.linux.as_deref();

        #[cfg(target_os = "windows")]
        let sig = entry.windows.as_deref();

        #[cfg(not(any(target_os = "linux", target_os = "windows")))]
        let sig: Option<&str> = None;

        sig.ok_or_else(|| {
            GamedataError::SignatureNotFound(format!("{} (no signature for this platform)", name))
        })
    }

    /// Get an offset by name for the current platform
    pub fn get_offset(&self, name: &str) -> Result<i64, GamedataError> {
        let entry = self
            .offsets
            .get(name)
            .ok_or_else(|| GamedataError::OffsetNotFound(name.to_string()))?;

        #[cfg(target_os = "linux")]
        let offset = entry.linux;

        #[cfg(target_os = "windows")]
        let offset = entry.windows;

        #[cfg(not(any(target_os = "linux", target_os = "windows")))]
        let offset: Option<i64> = None;

        offset.ok_or_else(|| {
            GamedataError::OffsetNotFound(format!("{} (no offset for this platform)", name))
        })
    }
}

/// Parse a signature pattern string into bytes
///
/// Supports:
/// - Hex bytes: "55 48 89 E5"
/// - Wildcards: "55 ? 89 E5" or "55 ?? 89 E5"
pub fn parse_signature(pattern: &str) -> Result<Vec<Option<u8>>, GamedataError> {
    let mut result = Vec::new();

    for part in pattern.split_whitespace() {
        if part == "?" || part == "??" {
            result.push(None);
        } else {
            let byte = u8::from_str_radix(part, 16).map_err(|_| {
                GamedataError::InvalidSignature(format!("Invalid hex byte: {}", part))
            })?;
            result.push(Some(byte));
        }
    }

    if result.is_empty() {
        return Err(GamedataError::InvalidSignature(
            "Empty signature pattern".to_string(),
        ));
    }

    Ok(result)
}

/// Scan memory for a signature pattern
///
/// # Safety
/// The memory region must be valid and readable.
pub unsafe fn scan_signature(
    start: *const u8,
    size: usize,
    pattern: &[Option<u8>],
) -> Option<*const u8> {
    if pattern.is_empty() || size < pattern.len() {
        return None;
    }

    let end = size - pattern.len();

    'outer: for offset in 0..=end {
        for (i, expected) in pattern.iter().enumerate() {
            if let Some(byte) = expected {
                let actual = *start.add(offset + i);
                if actual != *byte {
                    continue 'outer;
                }
            }
        }
        return Some(start.add(offset));
    }

    None
}

/// Turns gamedata names into addresses.
///
/// The core only depends on this contract; [`ModuleScanner`] is the
/// pattern-scanning implementation used against the live host.
pub trait SignatureResolver {
    /// Resolve a signature name to an address
    fn resolve(&self, name: &str) -> Result<usize, GamedataError>;

    /// Look up a plain offset (vtable index, field offset)
    fn offset(&self, name: &str) -> Result<i64, GamedataError>;
}

/// Scans one loaded module for gamedata signatures
pub struct ModuleScanner<'a> {
    gamedata: &'a Gamedata,
    base: *const u8,
    size: usize,
}

impl<'a> ModuleScanner<'a> {
    /// # Safety
    /// `base..base + size` must stay mapped and readable while the scanner is used.
    pub unsafe fn new(gamedata: &'a Gamedata, base: *const u8, size: usize) -> Self {
        Self {
            gamedata,
            base,
            size,
        }
    }
}

impl SignatureResolver for ModuleScanner<'_> {
    fn resolve(&self, name: &str) -> Result<usize, GamedataError> {
        let entry = self.gamedata.get_entry(name)?;
        let pattern = parse_signature(self.gamedata.get_signature(name)?)?;

        let found = unsafe { scan_signature(self.base, self.size, &pattern) }
            .ok_or_else(|| GamedataError::ScanFailed(name.to_string()))?;

        let address = match entry.kind {
            SignatureKind::Function => found as usize,
            SignatureKind::Static => {
                let operand = entry
                    .operand
                    .or_else(|| pattern.iter().position(Option::is_none))
                    .ok_or_else(|| {
                        GamedataError::InvalidSignature(format!("{}: no disp32 operand", name))
                    })?;
                if operand + 4 > pattern.len() {
                    return Err(GamedataError::InvalidSignature(format!(
                        "{}: operand at {} overruns the pattern",
                        name, operand
                    )));
                }
                let disp = unsafe { (found.add(operand) as *const i32).read_unaligned() };
                // disp32 is relative to the end of the instruction
                (found as usize + operand + 4).wrapping_add_signed(disp as isize)
            }
        };

        let address = address.wrapping_add_signed(entry.offset as isize);
        tracing::debug!("Resolved '{}' -> {:#x}", name, address);
        Ok(address)
    }

    fn offset(&self, name: &str) -> Result<i64, GamedataError> {
        self.gamedata.get_offset(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_signature() {
        let pattern = parse_signature("55 48 89 E5").unwrap();
        assert_eq!(
            pattern,
            vec![Some(0x55), Some(0x48), Some(0x89), Some(0xE5)]
        );

        let pattern = parse_signature("55 ? 89 ??").unwrap();
        assert_eq!(pattern, vec![Some(0x55), None, Some(0x89), None]);

        assert!(parse_signature("").is_err());
        assert!(parse_signature("55 XY").is_err());
    }

    #[test]
    fn test_scan_signature_with_wildcard() {
        let data = [0x00, 0x55, 0xFF, 0x89, 0xE5, 0x00];
        let pattern = vec![Some(0x55), None, Some(0x89), Some(0xE5)];

        unsafe {
            let result = scan_signature(data.as_ptr(), data.len(), &pattern);
            assert_eq!(result, Some(data.as_ptr().add(1)));
        }
    }

    const GAMEDATA: &str = r#"{
        "CameraCollision": {
            "signatures": {
                "windows": "E8 ?? ?? ?? ?? 45 0F 57 FF",
                "linux": "E8 ?? ?? ?? ?? 45 0F 57 FF"
            }
        },
        "FoVDelta": {
            "signatures": {
                "kind": "static",
                "windows": "F3 0F 59 05 ?? ?? ?? ?? 0F 28 74 24 20",
                "linux": "F3 0F 59 05 ?? ?? ?? ?? 0F 28 74 24 20"
            }
        },
        "ForceDisableMovement": {
            "signatures": {
                "kind": "static",
                "operand": 4,
                "offset": 4,
                "windows": "F3 0F 10 05 ?? ?? ?? ?? 0F 2E C6",
                "linux": "F3 0F 10 05 ?? ?? ?? ?? 0F 2E C6"
            }
        },
        "GameCamera::GetZoomDelta": {
            "offsets": { "windows": 28, "linux": 28 }
        }
    }"#;

    fn module() -> Vec<u8> {
        let mut bytes = vec![0xCCu8; 0x100];
        // collision call site at 0x10
        bytes[0x10..0x19].copy_from_slice(&[0xE8, 1, 2, 3, 4, 0x45, 0x0F, 0x57, 0xFF]);
        // mulss xmm0, [rip + 0x40] at 0x20, instruction ends at 0x28
        bytes[0x20..0x2D].copy_from_slice(&[
            0xF3, 0x0F, 0x59, 0x05, 0x40, 0x00, 0x00, 0x00, 0x0F, 0x28, 0x74, 0x24, 0x20,
        ]);
        // movss xmm0, [rip - 0x10] at 0x40, instruction ends at 0x48
        bytes[0x40..0x4B].copy_from_slice(&[
            0xF3, 0x0F, 0x10, 0x05, 0xF0, 0xFF, 0xFF, 0xFF, 0x0F, 0x2E, 0xC6,
        ]);
        bytes
    }

    #[test]
    fn test_module_scanner_resolves_kinds() {
        let gd = Gamedata::load_from_str(GAMEDATA).unwrap();
        let bytes = module();
        let base = bytes.as_ptr() as usize;
        let scanner = unsafe { ModuleScanner::new(&gd, bytes.as_ptr(), bytes.len()) };

        assert_eq!(scanner.resolve("CameraCollision").unwrap(), base + 0x10);
        assert_eq!(scanner.resolve("FoVDelta").unwrap(), base + 0x28 + 0x40);
        assert_eq!(
            scanner.resolve("ForceDisableMovement").unwrap(),
            base + 0x48 - 0x10 + 4
        );
        assert_eq!(scanner.offset("GameCamera::GetZoomDelta").unwrap(), 28);
    }

    #[test]
    fn test_module_scanner_failures() {
        let gd = Gamedata::load_from_str(GAMEDATA).unwrap();
        let bytes = vec![0u8; 0x40];
        let scanner = unsafe { ModuleScanner::new(&gd, bytes.as_ptr(), bytes.len()) };

        assert!(matches!(
            scanner.resolve("CameraCollision"),
            Err(GamedataError::ScanFailed(_))
        ));
        assert!(matches!(
            scanner.resolve("Missing"),
            Err(GamedataError::SignatureNotFound(_))
        ));
        assert!(matches!(
            scanner.offset("Missing"),
            Err(GamedataError::OffsetNotFound(_))
        ));
    }

    #[test]
    fn test_bundled_gamedata_covers_keys() {
        let gd = Gamedata::load_from_str(include_str!("../../../gamedata/camrig.json")).unwrap();
        for key in camrig_sdk::GAMEDATA_KEYS {
            assert!(
                gd.signatures.contains_key(*key) || gd.offsets.contains_key(*key),
                "missing gamedata entry {}",
                key
            );
        }
    }
}
