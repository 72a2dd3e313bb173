use crate::arena::FileStatus;
use serde::{Deserialize, Serialize};

/// A fully decoded file change with no ties to the arena or source buffer.
///
/// This is the form to cache, serialize or keep past the parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDiff {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_path: Option<String>,
    pub status: FileStatus,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub binary: bool,
    pub hunks: Vec<Hunk>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hunk {
    pub old_start: u32,
    pub old_lines: u32,
    pub new_start: u32,
    pub new_lines: u32,
    /// Heading git prints after the closing `@@`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    pub additions: Vec<String>,
    pub deletions: Vec<String>,
}

impl FileDiff {
    /// A record with no hunks, as used for listed files the diff body omits.
    pub fn new(path: impl Into<String>, status: FileStatus) -> Self {
        FileDiff {
            path: path.into(),
            old_path: None,
            status,
            binary: false,
            hunks: Vec::new(),
        }
    }

    pub fn additions_count(&self) -> usize {
        self.hunks.iter().map(|h| h.additions.len()).sum()
    }

    pub fn deletions_count(&self) -> usize {
        self.hunks.iter().map(|h| h.deletions.len()).sum()
    }

    pub fn additions(&self) -> impl Iterator<Item = &str> {
        self.hunks
            .iter()
            .flat_map(|h| h.additions.iter().map(String::as_str))
    }

    pub fn deletions(&self) -> impl Iterator<Item = &str> {
        self.hunks
            .iter()
            .flat_map(|h| h.deletions.iter().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FileDiff {
        FileDiff {
            path: "src/lib.rs".to_string(),
            old_path: None,
            status: FileStatus::Modified,
            binary: false,
            hunks: vec![Hunk {
                old_start: 1,
                old_lines: 2,
                new_start: 1,
                new_lines: 3,
                section: None,
                additions: vec!["a".to_string(), "b".to_string()],
                deletions: vec!["c".to_string()],
            }],
        }
    }

    #[test]
    fn test_counts() {
        let diff = sample();
        assert_eq!(diff.additions_count(), 2);
        assert_eq!(diff.deletions_count(), 1);
        assert_eq!(diff.additions().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["path"], "src/lib.rs");
        assert_eq!(json["status"], "modified");
        assert!(json.get("oldPath").is_none());
        assert!(json.get("binary").is_none());
        assert_eq!(json["hunks"][0]["oldStart"], 1);
        assert_eq!(json["hunks"][0]["newLines"], 3);
        assert_eq!(json["hunks"][0]["additions"][1], "b");
    }

    #[test]
    fn test_deserialize_renamed() {
        let json = r#"{
            "path": "new.rs",
            "oldPath": "old.rs",
            "status": "renamed",
            "hunks": []
        }"#;
        let diff: FileDiff = serde_json::from_str(json).unwrap();
        assert_eq!(diff.status, FileStatus::Renamed);
        assert_eq!(diff.old_path.as_deref(), Some("old.rs"));
        assert!(!diff.binary);
    }
}
