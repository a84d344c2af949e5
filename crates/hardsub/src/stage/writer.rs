use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
#[error("failed to write subtitles to {}: {source}", path.display())]
pub struct WriterError {
    pub path: PathBuf,
    pub source: std::io::Error,
}

/// Writes `lines` joined by `\n` as UTF-8, replacing any existing file. No
/// trailing newline is added.
pub async fn write_transcript(path: &Path, lines: &[String]) -> Result<(), WriterError> {
    let wrap = |source| WriterError {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(wrap)?;
    }
    tokio::fs::write(path, lines.join("\n")).await.map_err(wrap)?;
    log::debug!("wrote {} lines to {}", lines.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn joins_without_trailing_newline_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("subs.txt");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "stale content that is longer").unwrap();

        let lines = vec!["你好".to_string(), "再见".to_string()];
        write_transcript(&path, &lines).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "你好\n再见");
    }

    #[tokio::test]
    async fn creates_missing_parent_and_handles_empty_transcript() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b/out.txt");
        write_transcript(&path, &[]).await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"");
    }

    #[tokio::test]
    async fn reports_path_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let err = write_transcript(dir.path(), &["x".to_string()])
            .await
            .unwrap_err();
        assert_eq!(err.path, dir.path());
    }
}
