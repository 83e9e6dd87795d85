use crate::error::{ClipError, Error};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Audio container formats the engine is permitted to delete.
///
/// This enum is the whole universe of deletable file types. Configuration can
/// narrow the set, never widen it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioExtension {
    Wav,
    Mp3,
    Flac,
    Aac,
    Opus,
}

impl AudioExtension {
    pub const ALL: [AudioExtension; 5] = [
        AudioExtension::Wav,
        AudioExtension::Mp3,
        AudioExtension::Flac,
        AudioExtension::Aac,
        AudioExtension::Opus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AudioExtension::Wav => "wav",
            AudioExtension::Mp3 => "mp3",
            AudioExtension::Flac => "flac",
            AudioExtension::Aac => "aac",
            AudioExtension::Opus => "opus",
        }
    }

    /// Case-insensitive lookup. Accepts both `wav` and `.wav`.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.strip_prefix('.').unwrap_or(ext);
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.as_str().eq_ignore_ascii_case(ext))
    }
}

impl fmt::Display for AudioExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ".{}", self.as_str())
    }
}

impl FromStr for AudioExtension {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AudioExtension::from_extension(s.trim()).ok_or_else(|| {
            Error::InvalidConfig(format!("'{}' is not a supported audio extension", s))
        })
    }
}

/// Ordered, de-duplicated set of extensions eligible for destructive operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowList {
    extensions: Vec<AudioExtension>,
}

impl Default for AllowList {
    fn default() -> Self {
        Self::new(AudioExtension::ALL)
    }
}

impl AllowList {
    pub fn new(extensions: impl IntoIterator<Item = AudioExtension>) -> Self {
        let mut ordered: Vec<AudioExtension> = Vec::new();
        for ext in extensions {
            if !ordered.contains(&ext) {
                ordered.push(ext);
            }
        }
        Self { extensions: ordered }
    }

    /// Build from configuration strings. Unknown extensions and an empty list are rejected.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self, Error> {
        let extensions = names
            .iter()
            .map(|name| name.as_ref().parse::<AudioExtension>())
            .collect::<Result<Vec<_>, _>>()?;
        if extensions.is_empty() {
            return Err(Error::InvalidConfig(
                "allowed_extensions must name at least one audio extension".to_string(),
            ));
        }
        Ok(Self::new(extensions))
    }

    pub fn contains(&self, ext: AudioExtension) -> bool {
        self.extensions.contains(&ext)
    }

    pub fn iter(&self) -> impl Iterator<Item = AudioExtension> + '_ {
        self.extensions.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    /// Gate a path on its extension. Everything that is not an allow-listed
    /// audio container is `FileTypeNotEligible`.
    pub fn check(&self, path: &Path) -> Result<AudioExtension, ClipError> {
        let raw = path.extension().and_then(|e| e.to_str());
        match raw.and_then(AudioExtension::from_extension) {
            Some(ext) if self.contains(ext) => Ok(ext),
            _ => Err(ClipError::FileTypeNotEligible {
                extension: raw.map(|e| format!(".{}", e.to_ascii_lowercase())),
            }),
        }
    }
}

impl fmt::Display for AllowList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.extensions.iter().map(|e| e.to_string()).collect();
        write!(f, "{}", names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_extension_is_case_insensitive() {
        assert_eq!(AudioExtension::from_extension("WAV"), Some(AudioExtension::Wav));
        assert_eq!(AudioExtension::from_extension(".Flac"), Some(AudioExtension::Flac));
        assert_eq!(AudioExtension::from_extension("exe"), None);
    }

    #[test]
    fn test_allow_list_dedups_and_keeps_order() {
        let list = AllowList::new([
            AudioExtension::Opus,
            AudioExtension::Wav,
            AudioExtension::Opus,
        ]);
        let exts: Vec<_> = list.iter().collect();
        assert_eq!(exts, vec![AudioExtension::Opus, AudioExtension::Wav]);
    }

    #[test]
    fn test_from_names_rejects_non_audio() {
        let err = AllowList::from_names(&[".wav", ".db"]).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));

        let empty: [&str; 0] = [];
        assert!(AllowList::from_names(&empty).is_err());
    }

    #[test]
    fn test_narrowed_list_rejects_dropped_extension() {
        let list = AllowList::from_names(&[".wav"]).unwrap();
        assert!(list.check(Path::new("/c/owl_80p_20210102T150405Z.wav")).is_ok());
        let err = list
            .check(Path::new("/c/owl_80p_20210102T150405Z.mp3"))
            .unwrap_err();
        assert!(matches!(err, ClipError::FileTypeNotEligible { .. }));
    }

    #[test]
    fn test_check_without_extension() {
        let err = AllowList::default().check(Path::new("/c/README")).unwrap_err();
        match err {
            ClipError::FileTypeNotEligible { extension } => assert!(extension.is_none()),
            other => panic!("unexpected error: {other}"),
        }
    }
}
