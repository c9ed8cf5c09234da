//! Persisted user preferences.
//!
//! Only the colour theme is stored, as the `"theme"` key of a small JSON
//! file. A missing or unreadable file means the light theme.

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment override for the preferences file location.
pub const PREFS_ENV: &str = "AADHAAR_GEN_PREFS";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl std::str::FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("unknown theme '{other}' (expected light or dark)")),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PrefsFile {
    /// Kept as text so an unknown value does not discard the other keys.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    theme: Option<String>,
    /// Keys written by other front-ends are carried through untouched.
    #[serde(flatten)]
    other: serde_json::Map<String, serde_json::Value>,
}

/// Reads and writes the preferences file.
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$AADHAAR_GEN_PREFS`, else `<config dir>/aadhaar-gen/prefs.json`.
    pub fn default_location() -> Self {
        if let Ok(p) = std::env::var(PREFS_ENV) {
            if !p.is_empty() {
                return Self::new(p);
            }
        }
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
            .unwrap_or_else(std::env::temp_dir);
        Self::new(base.join("aadhaar-gen").join("prefs.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load_theme(&self) -> Theme {
        let Some(raw) = self.read().theme else {
            return Theme::default();
        };
        raw.parse().unwrap_or_else(|e| {
            warn!("Ignoring theme in {}: {}", self.path.display(), e);
            Theme::default()
        })
    }

    pub fn set_theme(&self, theme: Theme) -> std::io::Result<()> {
        let mut prefs = self.read();
        prefs.theme = Some(theme.as_str().to_string());
        self.write(&prefs)?;
        debug!("Theme set to {}", theme.as_str());
        Ok(())
    }

    /// Flip the stored theme and return the new one.
    pub fn toggle(&self) -> std::io::Result<Theme> {
        let next = self.load_theme().toggled();
        self.set_theme(next)?;
        Ok(next)
    }

    fn read(&self) -> PrefsFile {
        let raw = match std::fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return PrefsFile::default(),
            Err(e) => {
                warn!("Cannot read {}: {}", self.path.display(), e);
                return PrefsFile::default();
            }
        };
        serde_json::from_slice(&raw).unwrap_or_else(|e| {
            warn!("Ignoring malformed {}: {}", self.path.display(), e);
            PrefsFile::default()
        })
    }

    fn write(&self, prefs: &PrefsFile) -> std::io::Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;
        let json = serde_json::to_vec_pretty(prefs)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(&json)?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_light() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferenceStore::new(dir.path().join("prefs.json"));
        assert_eq!(store.load_theme(), Theme::Light);
    }

    #[test]
    fn toggle_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("prefs.json");
        let store = PreferenceStore::new(&path);

        assert_eq!(store.toggle().unwrap(), Theme::Dark);
        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["theme"], "dark");

        assert_eq!(PreferenceStore::new(&path).load_theme(), Theme::Dark);
        assert_eq!(store.toggle().unwrap(), Theme::Light);
    }

    #[test]
    fn unknown_keys_survive_a_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, r#"{"theme":"light","lang":"hi"}"#).unwrap();

        PreferenceStore::new(&path).set_theme(Theme::Dark).unwrap();
        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["theme"], "dark");
        assert_eq!(raw["lang"], "hi");
    }

    #[test]
    fn unknown_theme_reads_light_and_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, r#"{"theme":"blue","lang":"hi"}"#).unwrap();
        let store = PreferenceStore::new(&path);

        assert_eq!(store.load_theme(), Theme::Light);
        assert_eq!(store.toggle().unwrap(), Theme::Dark);
        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["theme"], "dark");
        assert_eq!(raw["lang"], "hi");
    }

    #[test]
    fn malformed_file_is_light() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, "not json").unwrap();
        assert_eq!(PreferenceStore::new(&path).load_theme(), Theme::Light);
    }

    #[test]
    fn parse_theme() {
        assert_eq!("Dark".parse::<Theme>().unwrap(), Theme::Dark);
        assert!("blue".parse::<Theme>().is_err());
    }
}
