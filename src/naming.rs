//! Output file naming and collision handling.
//!
//! Output names come from a pattern with `{token}` placeholders:
//!
//! | Token | Value | Example |
//! |---|---|---|
//! | `{stem}` | input file name without extension | `IMG_0042` |
//! | `{ratio}` | target ratio, filename-safe | `4x5` |
//! | `{mode}` | resize mode | `fill` |
//!
//! The extension always comes from the output format. With the default
//! pattern `{stem}_resized`, `IMG_0042.png` → `IMG_0042_resized.jpg`.
//!
//! ## Collisions
//!
//! Names for a whole batch are planned up front, in input order, so two
//! inputs can never race for the same output. A name counts as taken when an
//! earlier item in the batch claimed it or a file already exists at it.
//! Auto-rename appends `-1`, `-2`, ... to the stem. No plan ever targets an
//! input file of the same batch.

use crate::types::{CollisionPolicy, JobConfig, OutputFormat};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_PATTERN: &str = "{stem}_resized";

const TOKENS: &[&str] = &["stem", "ratio", "mode"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    #[error("naming pattern must contain {{stem}}")]
    MissingStem,
    #[error("naming pattern must not contain path separators")]
    PathSeparator,
    #[error("unknown naming token {{{0}}}")]
    UnknownToken(String),
    #[error("unbalanced braces in naming pattern")]
    Unbalanced,
}

/// Check that `pattern` only uses known tokens, includes `{stem}`, and names
/// a file (not a path).
pub fn validate_pattern(pattern: &str) -> Result<(), PatternError> {
    if pattern.contains(['/', '\\']) {
        return Err(PatternError::PathSeparator);
    }
    let mut rest = pattern;
    let mut has_stem = false;
    while let Some(open) = rest.find(['{', '}']) {
        if rest.as_bytes()[open] == b'}' {
            return Err(PatternError::Unbalanced);
        }
        let after = &rest[open + 1..];
        let close = after.find('}').ok_or(PatternError::Unbalanced)?;
        let token = &after[..close];
        if !TOKENS.contains(&token) {
            return Err(PatternError::UnknownToken(token.to_string()));
        }
        has_stem |= token == "stem";
        rest = &after[close + 1..];
    }
    if has_stem {
        Ok(())
    } else {
        Err(PatternError::MissingStem)
    }
}

fn input_stem(input: &Path) -> String {
    input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "image".to_string())
}

/// Output file stem for `input` under `job`'s naming pattern.
pub fn expand_pattern(input: &Path, job: &JobConfig) -> String {
    job.output
        .pattern
        .replace("{stem}", &input_stem(input))
        .replace("{ratio}", &job.aspect_ratio.slug())
        .replace("{mode}", &job.mode.to_string())
}

fn numbered(dir: &Path, stem: &str, format: OutputFormat, n: u32) -> PathBuf {
    let ext = format.extension();
    if n == 0 {
        dir.join(format!("{stem}.{ext}"))
    } else {
        dir.join(format!("{stem}-{n}.{ext}"))
    }
}

/// Where one item's output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputPlan {
    /// `replace` allows clobbering a pre-existing file at `path`.
    Write { path: PathBuf, replace: bool },
    /// Skip policy found a pre-existing file.
    Skip { existing: PathBuf },
}

impl OutputPlan {
    pub fn path(&self) -> &Path {
        match self {
            OutputPlan::Write { path, .. } => path,
            OutputPlan::Skip { existing } => existing,
        }
    }
}

/// Plan an output for every input, in order.
pub fn plan_outputs(inputs: &[PathBuf], dir: &Path, job: &JobConfig) -> Vec<OutputPlan> {
    let canonical_inputs: HashSet<PathBuf> = inputs
        .iter()
        .filter_map(|p| p.canonicalize().ok())
        .collect();
    let is_input = |candidate: &Path| {
        candidate
            .canonicalize()
            .is_ok_and(|c| canonical_inputs.contains(&c))
    };

    let format = job.output.format;
    let mut taken: HashSet<PathBuf> = HashSet::new();

    inputs
        .iter()
        .map(|input| {
            let stem = expand_pattern(input, job);
            let base = numbered(dir, &stem, format, 0);
            let free = |taken: &HashSet<PathBuf>| {
                let mut n = 0;
                loop {
                    let candidate = numbered(dir, &stem, format, n);
                    if !taken.contains(&candidate) && !candidate.exists() {
                        return candidate;
                    }
                    n += 1;
                }
            };

            let plan = match job.output.collision {
                CollisionPolicy::Overwrite if !taken.contains(&base) && !is_input(&base) => {
                    OutputPlan::Write {
                        path: base,
                        replace: true,
                    }
                }
                CollisionPolicy::Skip if !taken.contains(&base) && base.exists() => {
                    OutputPlan::Skip { existing: base }
                }
                _ => OutputPlan::Write {
                    path: free(&taken),
                    replace: false,
                },
            };
            taken.insert(plan.path().to_path_buf());
            plan
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AspectRatio, ResizeMode};
    use std::fs;
    use tempfile::TempDir;

    fn job(pattern: &str, collision: CollisionPolicy) -> JobConfig {
        let mut job = JobConfig {
            aspect_ratio: AspectRatio::PORTRAIT,
            mode: ResizeMode::Fill,
            ..JobConfig::default()
        };
        job.output.pattern = pattern.to_string();
        job.output.collision = collision;
        job
    }

    fn written(plan: &OutputPlan) -> &Path {
        match plan {
            OutputPlan::Write { path, .. } => path,
            other => panic!("expected write, got {other:?}"),
        }
    }

    // =========================================================================
    // Patterns
    // =========================================================================

    #[test]
    fn default_pattern_names_output() {
        let j = job(DEFAULT_PATTERN, CollisionPolicy::AutoRename);
        assert_eq!(expand_pattern(Path::new("/in/IMG_0042.png"), &j), "IMG_0042_resized");
    }

    #[test]
    fn all_tokens_expand() {
        let j = job("{stem}-{ratio}-{mode}", CollisionPolicy::AutoRename);
        assert_eq!(expand_pattern(Path::new("beach.jpeg"), &j), "beach-4x5-fill");
    }

    #[test]
    fn stem_keeps_inner_dots() {
        let j = job(DEFAULT_PATTERN, CollisionPolicy::AutoRename);
        assert_eq!(
            expand_pattern(Path::new("trip.2024.final.jpg"), &j),
            "trip.2024.final_resized"
        );
    }

    #[test]
    fn validate_accepts_good_patterns() {
        assert!(validate_pattern(DEFAULT_PATTERN).is_ok());
        assert!(validate_pattern("{stem}").is_ok());
        assert!(validate_pattern("insta_{ratio}_{stem}").is_ok());
    }

    #[test]
    fn validate_rejects_bad_patterns() {
        assert_eq!(validate_pattern("resized"), Err(PatternError::MissingStem));
        assert_eq!(validate_pattern("out/{stem}"), Err(PatternError::PathSeparator));
        assert_eq!(validate_pattern("{stem}\\x"), Err(PatternError::PathSeparator));
        assert_eq!(
            validate_pattern("{stem}_{date}"),
            Err(PatternError::UnknownToken("date".into()))
        );
        assert_eq!(validate_pattern("{stem"), Err(PatternError::Unbalanced));
        assert_eq!(validate_pattern("stem}{stem}"), Err(PatternError::Unbalanced));
    }

    // =========================================================================
    // Planning
    // =========================================================================

    #[test]
    fn plans_use_format_extension() {
        let tmp = TempDir::new().unwrap();
        let mut j = job(DEFAULT_PATTERN, CollisionPolicy::AutoRename);
        j.output.format = OutputFormat::Png;
        let plans = plan_outputs(&[PathBuf::from("/in/a.jpg")], tmp.path(), &j);
        assert_eq!(written(&plans[0]), tmp.path().join("a_resized.png"));
    }

    #[test]
    fn duplicate_stems_in_batch_get_numbered() {
        let tmp = TempDir::new().unwrap();
        let j = job(DEFAULT_PATTERN, CollisionPolicy::AutoRename);
        let inputs = vec![
            PathBuf::from("/one/photo.jpg"),
            PathBuf::from("/two/photo.png"),
            PathBuf::from("/three/photo.webp"),
        ];
        let plans = plan_outputs(&inputs, tmp.path(), &j);
        let names: Vec<_> = plans
            .iter()
            .map(|p| written(p).file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec!["photo_resized.jpg", "photo_resized-1.jpg", "photo_resized-2.jpg"]
        );
    }

    #[test]
    fn auto_rename_avoids_existing_files() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a_resized.jpg"), b"old").unwrap();
        fs::write(tmp.path().join("a_resized-1.jpg"), b"old").unwrap();
        let j = job(DEFAULT_PATTERN, CollisionPolicy::AutoRename);

        let plans = plan_outputs(&[PathBuf::from("/in/a.jpg")], tmp.path(), &j);
        assert_eq!(
            plans[0],
            OutputPlan::Write {
                path: tmp.path().join("a_resized-2.jpg"),
                replace: false
            }
        );
    }

    #[test]
    fn overwrite_targets_existing_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a_resized.jpg"), b"old").unwrap();
        let j = job(DEFAULT_PATTERN, CollisionPolicy::Overwrite);

        let plans = plan_outputs(&[PathBuf::from("/in/a.jpg")], tmp.path(), &j);
        assert_eq!(
            plans[0],
            OutputPlan::Write {
                path: tmp.path().join("a_resized.jpg"),
                replace: true
            }
        );
    }

    #[test]
    fn overwrite_never_targets_an_input() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("a.jpg");
        fs::write(&input, b"original").unwrap();
        let j = job("{stem}", CollisionPolicy::Overwrite);

        let plans = plan_outputs(std::slice::from_ref(&input), tmp.path(), &j);
        assert_eq!(
            plans[0],
            OutputPlan::Write {
                path: tmp.path().join("a-1.jpg"),
                replace: false
            }
        );
    }

    #[test]
    fn overwrite_still_separates_batch_duplicates() {
        let tmp = TempDir::new().unwrap();
        let j = job(DEFAULT_PATTERN, CollisionPolicy::Overwrite);
        let inputs = vec![PathBuf::from("/x/p.jpg"), PathBuf::from("/y/p.jpg")];
        let plans = plan_outputs(&inputs, tmp.path(), &j);
        assert_ne!(plans[0].path(), plans[1].path());
    }

    #[test]
    fn skip_reports_existing_output() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a_resized.jpg"), b"old").unwrap();
        let j = job(DEFAULT_PATTERN, CollisionPolicy::Skip);

        let inputs = vec![PathBuf::from("/in/a.jpg"), PathBuf::from("/in/b.jpg")];
        let plans = plan_outputs(&inputs, tmp.path(), &j);
        assert_eq!(
            plans[0],
            OutputPlan::Skip {
                existing: tmp.path().join("a_resized.jpg")
            }
        );
        assert_eq!(written(&plans[1]), tmp.path().join("b_resized.jpg"));
    }

    #[test]
    fn skip_numbers_batch_duplicates_instead_of_skipping() {
        let tmp = TempDir::new().unwrap();
        let j = job(DEFAULT_PATTERN, CollisionPolicy::Skip);
        let inputs = vec![PathBuf::from("/x/p.jpg"), PathBuf::from("/y/p.jpg")];
        let plans = plan_outputs(&inputs, tmp.path(), &j);
        assert_eq!(written(&plans[0]), tmp.path().join("p_resized.jpg"));
        assert_eq!(written(&plans[1]), tmp.path().join("p_resized-1.jpg"));
    }
}
