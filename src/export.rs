use std::fmt::Write as _;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{Result, TopicError};
use crate::models::{Hierarchy, RankedWord, TopicScore};

/// `Topic k` followed by one `word:count` line per ranked word, then a blank line.
pub fn render_top_words(top_words: &[&[RankedWord]]) -> String {
    let mut out = String::new();
    for (topic, words) in top_words.iter().enumerate() {
        let _ = writeln!(out, "Topic {topic}");
        for word in words.iter() {
            let _ = writeln!(out, "{word}");
        }
        out.push('\n');
    }
    out
}

pub fn render_distribution(distribution: &[f64]) -> String {
    let mut out = String::new();
    for (topic, probability) in distribution.iter().enumerate() {
        let _ = writeln!(out, "{topic}\t{probability}");
    }
    out
}

/// `Topic k: p` followed by the topic's words, for each ranked topic.
pub fn render_ranked_topics(ranking: &[TopicScore], top_words: &[&[RankedWord]]) -> String {
    let mut out = String::new();
    for score in ranking {
        let _ = writeln!(out, "Topic {}: {}", score.topic, score.probability);
        for word in top_words.get(score.topic).copied().unwrap_or_default() {
            let _ = writeln!(out, "{word}");
        }
        out.push('\n');
    }
    out
}

pub fn ranked_hierarchy(ranking: &[TopicScore], top_words: &[&[RankedWord]]) -> Hierarchy {
    Hierarchy::from_topics(
        ranking
            .iter()
            .map(|score| top_words.get(score.topic).copied().unwrap_or_default()),
    )
}

pub fn render_hierarchy(hierarchy: &Hierarchy) -> Result<String> {
    Ok(serde_json::to_string(hierarchy)?)
}

/// Writes `contents` to a temporary file beside `path` and renames it into
/// place.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = temp_file_in(dir).map_err(|e| TopicError::io(dir, e))?;
    // An existing report keeps its mode.
    if let Ok(meta) = std::fs::metadata(path) {
        tmp.as_file()
            .set_permissions(meta.permissions())
            .map_err(|e| TopicError::io(tmp.path(), e))?;
    }
    tmp.write_all(contents.as_bytes())
        .and_then(|_| tmp.flush())
        .map_err(|e| TopicError::io(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| TopicError::io(path, e.error))?;
    Ok(())
}

// New files get 0o666 minus the umask, like `fs::write`.
#[cfg(unix)]
fn temp_file_in(dir: &Path) -> std::io::Result<tempfile::NamedTempFile> {
    use std::os::unix::fs::PermissionsExt;
    tempfile::Builder::new()
        .permissions(std::fs::Permissions::from_mode(0o666))
        .tempfile_in(dir)
}

#[cfg(not(unix))]
fn temp_file_in(dir: &Path) -> std::io::Result<tempfile::NamedTempFile> {
    tempfile::NamedTempFile::new_in(dir)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub top_words: PathBuf,
    pub composition: PathBuf,
    pub ranked: PathBuf,
    pub hierarchy: PathBuf,
}

impl ReportPaths {
    pub fn new(dir: &Path, name: &str) -> Self {
        ReportPaths {
            top_words: dir.join(format!("{name}_top_words.txt")),
            composition: dir.join(format!("{name}_composition.txt")),
            ranked: dir.join(format!("{name}_ranked.txt")),
            hierarchy: dir.join(format!("{name}.json")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reports {
    pub top_words: Option<String>,
    pub composition: String,
    pub ranked: String,
    pub hierarchy: String,
}

impl Reports {
    pub fn render(
        top_words: &[&[RankedWord]],
        distribution: &[f64],
        ranking: &[TopicScore],
        include_top_words: bool,
    ) -> Result<Self> {
        Ok(Reports {
            top_words: include_top_words.then(|| render_top_words(top_words)),
            composition: render_distribution(distribution),
            ranked: render_ranked_topics(ranking, top_words),
            hierarchy: render_hierarchy(&ranked_hierarchy(ranking, top_words))?,
        })
    }

    // Everything is rendered before the first file is touched.
    pub fn write(&self, paths: &ReportPaths) -> Result<()> {
        let mut files = vec![
            (&paths.composition, &self.composition),
            (&paths.ranked, &self.ranked),
            (&paths.hierarchy, &self.hierarchy),
        ];
        if let Some(top_words) = &self.top_words {
            files.insert(0, (&paths.top_words, top_words));
        }
        for (path, contents) in files {
            write_atomic(path, contents)?;
            info!(path = %path.display(), "wrote report");
        }
        Ok(())
    }
}
