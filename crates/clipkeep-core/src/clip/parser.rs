use super::{AllowList, ClipRecord};
use crate::error::ClipError;
use chrono::NaiveDateTime;
use std::fs;
use std::path::Path;

/// Timestamp segment layout, always UTC: `20210102T150405Z`.
pub const TIMESTAMP_LAYOUT: &str = "%Y%m%dT%H%M%SZ";

/// The slice of filesystem metadata the parser needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMeta {
    pub size_bytes: u64,
}

impl From<&fs::Metadata> for FileMeta {
    fn from(metadata: &fs::Metadata) -> Self {
        FileMeta {
            size_bytes: metadata.len(),
        }
    }
}

/// Parse `<species>_<confidence>p_<timestamp>.<ext>` into a [`ClipRecord`].
///
/// The extension is checked first, so a non-audio file is rejected before its
/// name is even looked at. Species may contain underscores; the confidence and
/// timestamp are always the last two segments.
pub fn parse_clip(path: &Path, meta: FileMeta, allow: &AllowList) -> Result<ClipRecord, ClipError> {
    let extension = allow.check(path)?;

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| ClipError::malformed("file name is not valid UTF-8"))?;

    let mut segments = stem.rsplitn(3, '_');
    let (timestamp_str, confidence_str, species) =
        match (segments.next(), segments.next(), segments.next()) {
            (Some(ts), Some(conf), Some(species)) if !species.is_empty() => (ts, conf, species),
            _ => {
                return Err(ClipError::malformed(format!(
                    "expected <species>_<confidence>p_<timestamp>, got '{}'",
                    stem
                )))
            }
        };

    let confidence_percent = parse_confidence(confidence_str)?;

    let captured_at = NaiveDateTime::parse_from_str(timestamp_str, TIMESTAMP_LAYOUT)
        .map_err(|e| {
            ClipError::malformed(format!("invalid timestamp '{}': {}", timestamp_str, e))
        })?
        .and_utc();

    Ok(ClipRecord {
        path: path.to_path_buf(),
        species: species.to_string(),
        confidence_percent,
        captured_at,
        size_bytes: meta.size_bytes,
        extension,
        locked: false,
    })
}

fn parse_confidence(segment: &str) -> Result<u8, ClipError> {
    let digits = segment
        .strip_suffix('p')
        .ok_or_else(|| ClipError::malformed(format!("confidence '{}' lacks 'p' suffix", segment)))?;

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ClipError::malformed(format!(
            "confidence '{}' is not an integer",
            segment
        )));
    }

    match digits.parse::<u8>() {
        Ok(value) if value <= 100 => Ok(value),
        _ => Err(ClipError::malformed(format!(
            "confidence '{}' is outside 0-100",
            segment
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn parse(name: &str) -> Result<ClipRecord, ClipError> {
        let path = Path::new("/clips").join(name);
        parse_clip(&path, FileMeta { size_bytes: 1024 }, &AllowList::default())
    }

    #[test]
    fn test_file_type_eligibility() {
        let cases = [
            ("owl_80p_20210102T150405Z.wav", true),
            ("owl_80p_20210102T150405Z.mp3", true),
            ("owl_80p_20210102T150405Z.flac", true),
            ("owl_80p_20210102T150405Z.aac", true),
            ("owl_80p_20210102T150405Z.opus", true),
            ("owl_80p_20210102T150405Z.txt", false),
            ("owl_80p_20210102T150405Z.jpg", false),
            ("owl_80p_20210102T150405Z.png", false),
            ("owl_80p_20210102T150405Z.db", false),
            ("owl_80p_20210102T150405Z.csv", false),
            ("system_80p_20210102T150405Z.exe", false),
        ];

        for (name, eligible) in cases {
            let result = parse(name);
            if eligible {
                assert!(result.is_ok(), "expected {} to parse: {:?}", name, result);
            } else {
                let err = result.expect_err(name);
                assert!(
                    err.to_string().contains("file type not eligible"),
                    "unexpected error for {}: {}",
                    name,
                    err
                );
            }
        }
    }

    #[test]
    fn test_parse_fields() {
        let clip = parse("owl_80p_20210102T150405Z.wav").unwrap();
        assert_eq!(clip.species, "owl");
        assert_eq!(clip.confidence_percent, 80);
        assert_eq!(
            clip.captured_at,
            Utc.with_ymd_and_hms(2021, 1, 2, 15, 4, 5).unwrap()
        );
        assert_eq!(clip.size_bytes, 1024);
        assert!(!clip.locked);
    }

    #[test]
    fn test_uppercase_extension_is_accepted() {
        let clip = parse("owl_80p_20210102T150405Z.WAV").unwrap();
        assert_eq!(clip.extension, crate::clip::AudioExtension::Wav);
    }

    #[test]
    fn test_species_with_underscores() {
        let clip = parse("great_horned_owl_95p_20240315T061500Z.flac").unwrap();
        assert_eq!(clip.species, "great_horned_owl");
        assert_eq!(clip.confidence_percent, 95);
    }

    #[test]
    fn test_malformed_names() {
        let cases = [
            "owl.wav",
            "owl_20210102T150405Z.wav",
            "_80p_20210102T150405Z.wav",
            "owl_80_20210102T150405Z.wav",
            "owl_xp_20210102T150405Z.wav",
            "owl_+80p_20210102T150405Z.wav",
            "owl_101p_20210102T150405Z.wav",
            "owl_80p_20210102.wav",
            "owl_80p_20211302T150405Z.wav",
            "owl_80p_20210102T150405.wav",
        ];
        for name in cases {
            let err = parse(name).expect_err(name);
            assert!(
                matches!(err, ClipError::MalformedFilename { .. }),
                "{} should be malformed, got {}",
                name,
                err
            );
        }
    }

    #[test]
    fn test_extension_checked_before_name() {
        let err = parse("not-a-clip.exe").unwrap_err();
        assert!(matches!(err, ClipError::FileTypeNotEligible { .. }));
    }
}
