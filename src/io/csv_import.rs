use std::path::Path;

use chrono::NaiveDate;
use gantt_timeline::RawTask;

/// Map a status word to a progress percentage.
fn status_to_progress(status: &str) -> Option<f64> {
    let status = status.trim();
    if let Ok(value) = status.trim_end_matches('%').trim().parse::<f64>() {
        return Some(value);
    }
    match status.to_lowercase().as_str() {
        "finished" | "done" | "complete" | "completed" => Some(100.0),
        "in progress" | "in-progress" | "active" | "started" => Some(50.0),
        "released" | "planned" => Some(25.0),
        "not started" | "not-started" | "new" => Some(0.0),
        _ => None,
    }
}

/// Rewrite day-first and slash-separated dates into `YYYY-MM-DD`. Anything
/// else is passed through for the chart's own parser to judge.
fn normalize_date(s: &str) -> String {
    let s = s.trim();
    for fmt in ["%d/%m/%Y", "%m/%d/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.format("%Y-%m-%d").to_string();
        }
    }
    s.to_string()
}

/// Pick the delimiter that appears most in the header line.
fn detect_delimiter(first_line: &str) -> u8 {
    let semicolons = first_line.matches(';').count();
    let commas = first_line.matches(',').count();
    let tabs = first_line.matches('\t').count();

    if semicolons > commas && semicolons >= tabs {
        b';'
    } else if tabs > commas {
        b'\t'
    } else {
        b','
    }
}

fn normalize_header(h: &str) -> String {
    h.trim().to_lowercase().replace([' ', '-', '_'], "")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Id,
    Name,
    Start,
    End,
    Duration,
    Progress,
    Dependencies,
    CustomClass,
    Important,
    Thumbnail,
}

fn header_to_column(normalized: &str) -> Option<Column> {
    Some(match normalized {
        "id" | "taskid" | "key" => Column::Id,
        "name" | "task" | "taskname" | "label" | "title" | "activity" => Column::Name,
        "start" | "startdate" | "from" | "begin" => Column::Start,
        "end" | "enddate" | "to" | "finish" | "due" | "duedate" => Column::End,
        "duration" | "length" => Column::Duration,
        "progress" | "status" | "complete" | "percentcomplete" => Column::Progress,
        "dependencies" | "depends" | "dependson" | "predecessors" => Column::Dependencies,
        "class" | "customclass" | "category" => Column::CustomClass,
        "important" | "critical" | "flag" => Column::Important,
        "thumbnail" | "image" | "avatar" => Column::Thumbnail,
        _ => return None,
    })
}

/// Import tasks from a CSV file. Returns `(tasks, skipped_rows)`.
pub fn import_csv(path: &Path) -> Result<(Vec<RawTask>, usize), String> {
    let content =
        std::fs::read_to_string(path).map_err(|e| format!("Failed to read file: {}", e))?;
    parse_csv(&content)
}

/// Parse CSV text with a header row. Only a name column is required; rows
/// without dates become placeholders the user can draw in.
pub fn parse_csv(content: &str) -> Result<(Vec<RawTask>, usize), String> {
    let first_line = content.lines().next().unwrap_or("");
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(detect_delimiter(first_line))
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| format!("Failed to read CSV headers: {}", e))?
        .clone();
    let columns: Vec<Option<Column>> = headers
        .iter()
        .map(|h| header_to_column(&normalize_header(h)))
        .collect();

    if !columns.contains(&Some(Column::Name)) {
        let found: Vec<&str> = headers.iter().collect();
        return Err(format!(
            "CSV is missing a task name column. Found headers: {:?}",
            found
        ));
    }

    let mut tasks = Vec::new();
    let mut skipped = 0usize;

    for (i, result) in reader.records().enumerate() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(row = i + 2, error = %e, "skipping unreadable CSV row");
                skipped += 1;
                continue;
            }
        };

        let mut task = RawTask::default();
        for (field, column) in record.iter().zip(&columns) {
            let value = field.trim();
            let text = || Some(value.to_string()).filter(|v| !v.is_empty());
            match column {
                Some(Column::Id) => task.id = text(),
                Some(Column::Name) => task.name = value.to_string(),
                Some(Column::Start) => task.start = text().map(|v| normalize_date(&v)),
                Some(Column::End) => task.end = text().map(|v| normalize_date(&v)),
                Some(Column::Duration) => task.duration = text(),
                Some(Column::Progress) => task.progress = status_to_progress(value),
                Some(Column::Dependencies) => {
                    task = task.with_dependencies(&value.replace(';', ","));
                }
                Some(Column::CustomClass) => task.custom_class = text(),
                Some(Column::Important) => {
                    task.important =
                        matches!(value.to_lowercase().as_str(), "true" | "yes" | "1" | "x")
                }
                Some(Column::Thumbnail) => task.thumbnail = text(),
                None => {}
            }
        }

        if task.name.is_empty() {
            skipped += 1;
            continue;
        }
        tasks.push(task);
    }

    if tasks.is_empty() {
        return Err(if skipped > 0 {
            format!("No valid tasks found in CSV ({} rows skipped)", skipped)
        } else {
            "CSV file is empty or has no data rows".to_string()
        });
    }
    Ok((tasks, skipped))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn semicolon_files_with_loose_headers() {
        let csv = "Task ID;Task Name;Start Date;End Date;Status;Depends On\n\
                   a;Design;01/03/2024;05/03/2024;done;\n\
                   b;Build;2024-03-06;;in progress;a\n\
                   ;;;;;\n";
        let (tasks, skipped) = parse_csv(csv).unwrap();
        assert_eq!(skipped, 1);
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].start.as_deref(), Some("2024-03-01"));
        assert_eq!(tasks[0].progress, Some(100.0));
        assert_eq!(tasks[1].end, None);
        assert_eq!(tasks[1].dependencies, vec!["a"]);
    }

    #[test]
    fn name_column_is_required() {
        assert!(parse_csv("start,end\n2024-03-01,2024-03-02\n").is_err());
    }

    #[test]
    fn numeric_progress_and_durations() {
        let csv = "name,start,duration,progress,important\nShip,2024-03-01,6d,40%,yes\n";
        let (tasks, _) = parse_csv(csv).unwrap();
        assert_eq!(tasks[0].duration.as_deref(), Some("6d"));
        assert_eq!(tasks[0].progress, Some(40.0));
        assert!(tasks[0].important);
    }
}
