//! Editor Preferences
//!
//! Persistent settings for the bracket editor:
//! - History depth
//! - Defaults for new nodes
//! - Clipboard paste offset

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use bf_core::{DEFAULT_MATCH_CAPACITY, MAX_MATCH_CAPACITY, MIN_MATCH_CAPACITY, Point};

/// Editor preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorPreferences {
    /// Undo/redo settings
    pub history: HistoryPreferences,
    /// New node defaults
    pub nodes: NodePreferences,
    /// Copy/paste settings
    pub clipboard: ClipboardPreferences,
}

impl Default for EditorPreferences {
    fn default() -> Self {
        Self {
            history: HistoryPreferences::default(),
            nodes: NodePreferences::default(),
            clipboard: ClipboardPreferences::default(),
        }
    }
}

/// History preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryPreferences {
    /// Maximum number of actions kept in the undo log
    pub max_entries: usize,
}

impl Default for HistoryPreferences {
    fn default() -> Self {
        Self { max_entries: 50 }
    }
}

/// Node preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodePreferences {
    /// Participant slots given to a match added without an explicit capacity
    pub default_match_capacity: u32,
}

impl Default for NodePreferences {
    fn default() -> Self {
        Self {
            default_match_capacity: DEFAULT_MATCH_CAPACITY,
        }
    }
}

/// Clipboard preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipboardPreferences {
    /// Layout shift applied to pasted nodes when no anchor is given
    pub paste_offset: Point,
}

impl Default for ClipboardPreferences {
    fn default() -> Self {
        Self {
            paste_offset: Point::new(50.0, 50.0),
        }
    }
}

impl EditorPreferences {
    /// Load preferences from standard location
    pub fn load() -> Self {
        Self::load_from(Self::default_path())
    }

    /// Load preferences from specified path.
    ///
    /// A missing or unreadable file yields the defaults.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str::<Self>(&content) {
                Ok(prefs) => prefs.sanitized(),
                Err(e) => {
                    log::warn!("Ignoring malformed preferences {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Save preferences to standard location
    pub fn save(&self) -> std::io::Result<()> {
        self.save_to(Self::default_path())
    }

    /// Save preferences to specified path
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(path, json)
    }

    /// Get default preferences file path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("bracketforge"))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("preferences.json")
    }

    /// Clamp values a hand-edited file may have pushed out of range
    fn sanitized(mut self) -> Self {
        self.history.max_entries = self.history.max_entries.max(1);
        self.nodes.default_match_capacity = self
            .nodes
            .default_match_capacity
            .clamp(MIN_MATCH_CAPACITY, MAX_MATCH_CAPACITY);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_preferences() {
        let prefs = EditorPreferences::default();
        assert_eq!(prefs.history.max_entries, 50);
        assert_eq!(prefs.nodes.default_match_capacity, 2);
        assert_eq!(prefs.clipboard.paste_offset, Point::new(50.0, 50.0));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let prefs: EditorPreferences =
            serde_json::from_str(r#"{ "history": { "max_entries": 10 } }"#).unwrap();
        assert_eq!(prefs.history.max_entries, 10);
        assert_eq!(prefs.nodes.default_match_capacity, 2);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("preferences.json");

        let mut prefs = EditorPreferences::default();
        prefs.history.max_entries = 5;
        prefs.clipboard.paste_offset = Point::new(10.0, -20.0);
        prefs.save_to(&path).unwrap();

        assert_eq!(EditorPreferences::load_from(&path), prefs);
    }

    #[test]
    fn test_missing_or_broken_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert_eq!(EditorPreferences::load_from(&missing), EditorPreferences::default());

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{ not json").unwrap();
        assert_eq!(EditorPreferences::load_from(&broken), EditorPreferences::default());
    }

    #[test]
    fn test_out_of_range_values_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        fs::write(
            &path,
            r#"{ "history": { "max_entries": 0 }, "nodes": { "default_match_capacity": 0 } }"#,
        )
        .unwrap();

        let prefs = EditorPreferences::load_from(&path);
        assert_eq!(prefs.history.max_entries, 1);
        assert_eq!(prefs.nodes.default_match_capacity, 1);

        fs::write(&path, r#"{ "nodes": { "default_match_capacity": 4294967295 } }"#).unwrap();
        let prefs = EditorPreferences::load_from(&path);
        assert_eq!(prefs.nodes.default_match_capacity, MAX_MATCH_CAPACITY);
    }
}
