use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
struct StoredHighScore {
    #[serde(rename = "highScore", alias = "high_score")]
    high_score: u32,
    #[serde(rename = "updatedAtIso", alias = "updated_at_iso", default)]
    updated_at_iso: String,
}

/// Single best score kept across runs. Each save replaces the whole file.
pub struct ScoreStore {
    file_path: PathBuf,
}

impl ScoreStore {
    pub fn new(file_path: PathBuf) -> Self {
        Self { file_path }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Stored best score, or 0 when the file is missing or unreadable.
    pub fn load(&self) -> u32 {
        load_high_score(&self.file_path)
    }

    pub fn save(&self, high_score: u32) -> io::Result<()> {
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let payload = StoredHighScore {
            high_score,
            updated_at_iso: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };
        let text = serde_json::to_string_pretty(&payload)?;
        fs::write(&self.file_path, text)
    }
}

fn load_high_score(path: &Path) -> u32 {
    let text = match fs::read_to_string(path) {
        Ok(value) => value,
        Err(error) => {
            if error.kind() != io::ErrorKind::NotFound {
                eprintln!("[score-store] failed to read {}: {error}", path.display());
            }
            return 0;
        }
    };

    match serde_json::from_str::<StoredHighScore>(&text) {
        Ok(stored) => stored.high_score,
        // a bare integer is accepted as well
        Err(error) => match text.trim().parse::<u32>() {
            Ok(value) => value,
            Err(_) => {
                eprintln!("[score-store] failed to parse {}: {error}", path.display());
                0
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str) -> PathBuf {
        let unique = format!(
            "{}-{}-{}",
            name,
            std::process::id(),
            rand::random::<u64>()
        );
        std::env::temp_dir().join(unique).join("high_score.json")
    }

    #[test]
    fn missing_file_defaults_to_zero() {
        let store = ScoreStore::new(temp_file("score-missing"));
        assert_eq!(store.load(), 0);
    }

    #[test]
    fn save_then_load_returns_value_and_overwrites() {
        let path = temp_file("score-save");
        let store = ScoreStore::new(path.clone());
        store.save(4_210).expect("save should succeed");
        assert_eq!(store.load(), 4_210);

        store.save(90).expect("save should succeed");
        assert_eq!(ScoreStore::new(path.clone()).load(), 90);

        let text = fs::read_to_string(&path).expect("file written");
        let value: serde_json::Value = serde_json::from_str(&text).expect("json");
        assert_eq!(value["highScore"], 90);
        assert!(value["updatedAtIso"].as_str().is_some());
        let _ = fs::remove_dir_all(path.parent().expect("parent"));
    }

    #[test]
    fn bare_integer_file_is_accepted() {
        let path = temp_file("score-bare");
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(&path, "1234\n").expect("write");
        assert_eq!(ScoreStore::new(path.clone()).load(), 1_234);
        let _ = fs::remove_dir_all(path.parent().expect("parent"));
    }

    #[test]
    fn malformed_file_degrades_to_zero() {
        let path = temp_file("score-bad");
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(&path, "{\"highScore\": \"lots\"}").expect("write");
        assert_eq!(ScoreStore::new(path.clone()).load(), 0);
        let _ = fs::remove_dir_all(path.parent().expect("parent"));
    }
}
