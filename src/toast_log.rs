use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

pub const TOAST_LOG_FILE: &str = "toast.log";

/// Append a timestamped notification line to `toast.log` inside `dir`.
pub fn append_toast_log(dir: &Path, msg: &str) {
    if let Ok(mut file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(TOAST_LOG_FILE))
    {
        let _ = writeln!(file, "{} - {}", Local::now().to_rfc3339(), msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        append_toast_log(dir.path(), "first");
        append_toast_log(dir.path(), "second");
        let content = std::fs::read_to_string(dir.path().join(TOAST_LOG_FILE)).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" - first"));
        assert!(lines[1].ends_with(" - second"));
    }
}
