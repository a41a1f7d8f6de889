use std::io::BufRead;
use std::path::Path;

use fxhash::FxHashSet;

use crate::error::VectorizeError;

const BUNDLED_EN: &str = include_str!("../assets/stop_words_en.txt");

/// Case-insensitive stop-word table.
#[derive(Debug, Clone)]
pub struct StopWords {
    words: FxHashSet<String>,
}

impl StopWords {
    /// The bundled English list.
    pub fn english() -> Self {
        Self::from_lines(BUNDLED_EN.lines())
    }

    /// One word per line; blank lines and `#` comments are ignored.
    pub fn load(path: &Path) -> Result<Self, VectorizeError> {
        let reader = corpus::open_artifact(path)?;
        let mut lines = Vec::new();
        for line in reader.lines() {
            lines.push(line.map_err(|source| VectorizeError::Io {
                path: path.to_path_buf(),
                source,
            })?);
        }
        Ok(Self::from_lines(lines.iter().map(String::as_str)))
    }

    pub fn from_lines<'a, I>(lines: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let words = lines
            .into_iter()
            .map(str::trim)
            .filter(|w| !w.is_empty() && !w.starts_with('#'))
            .map(str::to_lowercase)
            .collect();
        Self { words }
    }

    pub fn contains(&self, token: &str) -> bool {
        if self.words.contains(token) {
            return true;
        }
        token.chars().any(char::is_uppercase) && self.words.contains(&token.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl Default for StopWords {
    fn default() -> Self {
        Self::english()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_list_covers_common_function_words() {
        let stop = StopWords::english();
        for word in ["the", "and", "of", "however", "whereas"] {
            assert!(stop.contains(word), "{word} should be a stop word");
        }
        assert!(!stop.contains("protein"));
        assert!(stop.len() > 300);
    }

    #[test]
    fn lookup_ignores_case() {
        let stop = StopWords::english();
        assert!(stop.contains("The"));
        assert!(stop.contains("HOWEVER"));
    }

    #[test]
    fn custom_file_skips_comments() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stop.txt");
        std::fs::write(&path, "# custom\nfoo\n\n  Bar \n").unwrap();
        let stop = StopWords::load(&path).unwrap();
        assert_eq!(stop.len(), 2);
        assert!(stop.contains("bar"));
        assert!(!stop.contains("the"));
    }
}
