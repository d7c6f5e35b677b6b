use std::path::Path;

use gantt_timeline::{ChartConfig, RawTask};
use serde::Deserialize;

/// Task files are either a bare array or an object with a `tasks` array.
#[derive(Deserialize)]
#[serde(untagged)]
enum TaskFile {
    List(Vec<RawTask>),
    Wrapped { tasks: Vec<RawTask> },
}

/// Load a task list from a JSON file.
pub fn load_tasks(path: &Path) -> Result<Vec<RawTask>, String> {
    let json = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    parse_tasks(&json)
}

fn parse_tasks(json: &str) -> Result<Vec<RawTask>, String> {
    match serde_json::from_str(json).map_err(|e| e.to_string())? {
        TaskFile::List(tasks) | TaskFile::Wrapped { tasks } => Ok(tasks),
    }
}

/// Load chart options from a JSON file. Missing keys keep their defaults.
pub fn load_config(path: &Path) -> Result<ChartConfig, String> {
    let json = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    ChartConfig::from_json(&json).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_task_file_shapes_load() {
        let bare = r#"[{"id": "a", "name": "A", "start": "2024-03-01", "end": "2024-03-02"}]"#;
        let wrapped = r#"{"tasks": [{"name": "B", "dependencies": "a, c"}]}"#;
        assert_eq!(parse_tasks(bare).unwrap()[0].id.as_deref(), Some("a"));
        assert_eq!(parse_tasks(wrapped).unwrap()[0].dependencies, vec!["a", "c"]);
        assert!(parse_tasks("{").is_err());
    }
}
