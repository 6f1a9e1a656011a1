use crate::metadata::{strip_timestamp_prefix, FileFacts};
use crate::sanitize::{cleanup_filename, sanitize_filename, truncate_filename_if_needed};
use crate::template::{parse_template, render_template};
use crate::DEFAULT_TEMPLATE;
use anyhow::{Context, Result};
use chrono::DateTime;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp"];

#[derive(Debug, Clone)]
pub struct PlanOptions {
    pub input: PathBuf,
    /// 先頭がドットのファイルも対象に含めるか。既定の false では隠しファイルとして
    /// スキップし、件数と理由を集計に残す。
    pub include_hidden: bool,
    pub template: String,
    pub max_filename_len: usize,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            include_hidden: false,
            template: DEFAULT_TEMPLATE.to_string(),
            max_filename_len: 240,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenameCandidate {
    pub original_path: PathBuf,
    pub target_path: PathBuf,
    pub facts: FileFacts,
    pub rendered_base: String,
    pub changed: bool,
}

#[derive(Debug, Clone)]
pub struct SkippedEntry {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct RenameStats {
    pub scanned_files: usize,
    pub image_files: usize,
    pub skipped_non_image: usize,
    pub skipped_hidden: usize,
    pub planned: usize,
    pub unchanged: usize,
}

#[derive(Debug, Clone)]
pub struct RenamePlan {
    pub input: PathBuf,
    pub template: String,
    pub candidates: Vec<RenameCandidate>,
    pub skipped: Vec<SkippedEntry>,
    pub stats: RenameStats,
}

pub fn generate_plan(options: &PlanOptions) -> Result<RenamePlan> {
    if !options.input.exists() {
        anyhow::bail!("対象フォルダが存在しません: {}", options.input.display());
    }
    if !options.input.is_dir() {
        anyhow::bail!(
            "対象パスがフォルダではありません: {}",
            options.input.display()
        );
    }

    let parts = parse_template(&options.template)?;
    let mut stats = RenameStats::default();
    let mut skipped = Vec::<SkippedEntry>::new();
    let image_files = collect_image_files(
        &options.input,
        options.include_hidden,
        &mut stats,
        &mut skipped,
    )?;

    let mut candidates = Vec::with_capacity(image_files.len());
    let mut planned_paths = HashSet::<PathBuf>::new();

    for path in image_files {
        let facts = read_file_facts(&path)?;

        let rendered = render_template(&parts, &facts);
        let cleaned = cleanup_filename(&rendered);
        let sanitized = sanitize_filename(&cleaned);
        let truncated =
            truncate_filename_if_needed(&sanitized, &facts.extension, options.max_filename_len);

        let target = resolve_collision(
            &path,
            &truncated,
            &facts.extension,
            &mut planned_paths,
            options.max_filename_len,
        )?;

        let changed = target != path;
        if !changed {
            stats.unchanged += 1;
        }

        stats.planned += 1;
        candidates.push(RenameCandidate {
            original_path: path,
            target_path: target,
            facts,
            rendered_base: truncated,
            changed,
        });
    }

    Ok(RenamePlan {
        input: options.input.clone(),
        template: options.template.clone(),
        candidates,
        skipped,
        stats,
    })
}

fn collect_image_files(
    root: &Path,
    include_hidden: bool,
    stats: &mut RenameStats,
    skipped: &mut Vec<SkippedEntry>,
) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();

    for entry in fs::read_dir(root)
        .with_context(|| format!("フォルダを読めませんでした: {}", root.display()))?
    {
        let entry = entry.with_context(|| format!("エントリ読み取り失敗: {}", root.display()))?;
        let path = entry.path();
        if path.is_dir() {
            continue;
        }
        stats.scanned_files += 1;
        if is_hidden(&path) && !include_hidden {
            stats.skipped_hidden += 1;
            skipped.push(SkippedEntry {
                path,
                reason: "隠しファイルです".to_string(),
            });
            continue;
        }
        if is_image(&path) {
            stats.image_files += 1;
            out.push(path);
        } else {
            stats.skipped_non_image += 1;
            skipped.push(SkippedEntry {
                path,
                reason: "対象外の拡張子です".to_string(),
            });
        }
    }
    out.sort();
    skipped.sort_by(|a, b| a.path.cmp(&b.path));

    Ok(out)
}

fn read_file_facts(path: &Path) -> Result<FileFacts> {
    let meta = fs::metadata(path)
        .with_context(|| format!("ファイル情報を読めませんでした: {}", path.display()))?;
    let modified = meta
        .modified()
        .with_context(|| format!("更新日時を取得できませんでした: {}", path.display()))?;

    let stem = path
        .file_stem()
        .map(|v| v.to_string_lossy().to_string())
        .unwrap_or_else(|| "untitled".to_string());
    let extension = path
        .extension()
        .map(|v| format!(".{}", v.to_string_lossy()))
        .unwrap_or_default();

    Ok(FileFacts {
        modified: DateTime::from(modified),
        size: meta.len(),
        original_stem: strip_timestamp_prefix(&stem).to_string(),
        extension,
        path: path.to_path_buf(),
    })
}

fn resolve_collision(
    original_path: &Path,
    base: &str,
    extension: &str,
    planned_paths: &mut HashSet<PathBuf>,
    max_len: usize,
) -> Result<PathBuf> {
    let parent = original_path
        .parent()
        .context("親ディレクトリを取得できませんでした")?;

    let mut candidate = parent.join(format!("{}{}", base, extension));
    if is_available(&candidate, original_path, planned_paths) {
        planned_paths.insert(candidate.clone());
        return Ok(candidate);
    }

    let mut n = 1usize;
    loop {
        let suffix = format!("-{}", n);
        let trimmed = truncate_filename_if_needed(
            base,
            extension,
            max_len.saturating_sub(suffix.chars().count()),
        );
        candidate = parent.join(format!("{}{}{}", trimmed, suffix, extension));
        if is_available(&candidate, original_path, planned_paths) {
            planned_paths.insert(candidate.clone());
            return Ok(candidate);
        }
        n += 1;
    }
}

fn is_available(candidate: &Path, original_path: &Path, planned_paths: &HashSet<PathBuf>) -> bool {
    if planned_paths.contains(candidate) {
        return false;
    }
    if candidate == original_path {
        return true;
    }
    !candidate.exists()
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .map(|ext| {
            let ext = ext.to_string_lossy();
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::{generate_plan, is_available, resolve_collision, PlanOptions};
    use chrono::{DateTime, Datelike, Local, Timelike};
    use std::collections::HashSet;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::tempdir;

    fn options_for(input: &Path) -> PlanOptions {
        PlanOptions {
            input: input.to_path_buf(),
            ..PlanOptions::default()
        }
    }

    fn expected_prefix(path: &Path) -> String {
        let modified: DateTime<Local> = DateTime::from(
            fs::metadata(path)
                .expect("metadata")
                .modified()
                .expect("modified"),
        );
        format!(
            "{:04}{:02}{:02}{:02}{:02}{:02}",
            modified.year(),
            modified.month(),
            modified.day(),
            modified.hour(),
            modified.minute(),
            modified.second()
        )
    }

    #[test]
    fn plan_targets_images_and_skips_the_rest() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join("a.jpg"), b"a").expect("write a");
        fs::write(temp.path().join("b.PNG"), b"b").expect("write b");
        fs::write(temp.path().join("notes.txt"), b"n").expect("write notes");
        fs::write(temp.path().join(".hidden.jpg"), b"h").expect("write hidden");
        fs::create_dir(temp.path().join("sub")).expect("create sub");

        let plan = generate_plan(&options_for(temp.path())).expect("plan");

        assert_eq!(plan.stats.scanned_files, 4);
        assert_eq!(plan.stats.image_files, 2);
        assert_eq!(plan.stats.skipped_non_image, 1);
        assert_eq!(plan.stats.skipped_hidden, 1);
        assert_eq!(plan.candidates.len(), 2);

        let a = &plan.candidates[0];
        assert_eq!(a.original_path, temp.path().join("a.jpg"));
        let expected = format!("{}_a.jpg", expected_prefix(&a.original_path));
        assert_eq!(
            a.target_path.file_name().and_then(|v| v.to_str()),
            Some(expected.as_str())
        );
        assert!(a.changed);

        let b = &plan.candidates[1];
        assert!(b
            .target_path
            .file_name()
            .and_then(|v| v.to_str())
            .map(|name| name.ends_with("_b.PNG"))
            .unwrap_or(false));
    }

    #[test]
    fn plan_keeps_extension_case_insensitive_match_only() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join("clip.webm"), b"v").expect("write clip");
        fs::write(temp.path().join("pic.WEBP"), b"p").expect("write pic");

        let plan = generate_plan(&options_for(temp.path())).expect("plan");
        assert_eq!(plan.stats.image_files, 1);
        assert_eq!(plan.stats.skipped_non_image, 1);
        assert_eq!(plan.candidates[0].original_path, temp.path().join("pic.WEBP"));
    }

    #[test]
    fn plan_for_empty_directory_is_empty() {
        let temp = tempdir().expect("tempdir");
        let plan = generate_plan(&options_for(temp.path())).expect("plan");
        assert!(plan.candidates.is_empty());
        assert_eq!(plan.stats.scanned_files, 0);
        assert_eq!(plan.stats.planned, 0);
    }

    #[test]
    fn plan_rejects_missing_directory() {
        let temp = tempdir().expect("tempdir");
        let missing = temp.path().join("nope");
        let err = generate_plan(&options_for(&missing)).expect_err("must fail");
        assert!(err.to_string().contains("対象フォルダが存在しません"));
    }

    #[test]
    fn plan_rejects_non_directory_path() {
        let temp = tempdir().expect("tempdir");
        let file = temp.path().join("a.jpg");
        fs::write(&file, b"a").expect("write a");
        let err = generate_plan(&options_for(&file)).expect_err("must fail");
        assert!(err.to_string().contains("フォルダではありません"));
    }

    #[test]
    fn already_renamed_file_is_unchanged() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("probe.jpg");
        fs::write(&path, b"p").expect("write probe");
        let stamped = temp
            .path()
            .join(format!("{}_probe.jpg", expected_prefix(&path)));
        fs::rename(&path, &stamped).expect("pre-stamp");

        let plan = generate_plan(&options_for(temp.path())).expect("plan");
        assert_eq!(plan.candidates.len(), 1);
        assert!(!plan.candidates[0].changed);
        assert_eq!(plan.stats.unchanged, 1);
        assert_eq!(plan.candidates[0].target_path, stamped);
    }

    #[test]
    fn resolve_collision_appends_numeric_disambiguator() {
        let temp = tempdir().expect("tempdir");
        let original_a = temp.path().join("a.jpg");
        let original_b = temp.path().join("b.jpg");
        fs::write(&original_a, b"a").expect("write a");
        fs::write(&original_b, b"b").expect("write b");
        fs::write(temp.path().join("photo.jpg"), b"x").expect("write occupant");

        let mut planned = HashSet::<PathBuf>::new();
        let target_a =
            resolve_collision(&original_a, "photo", ".jpg", &mut planned, 240).expect("resolve a");
        let target_b =
            resolve_collision(&original_b, "photo", ".jpg", &mut planned, 240).expect("resolve b");

        assert_eq!(
            target_a.file_name().and_then(|v| v.to_str()),
            Some("photo-1.jpg")
        );
        assert_eq!(
            target_b.file_name().and_then(|v| v.to_str()),
            Some("photo-2.jpg")
        );
    }

    #[test]
    fn disambiguator_survives_truncation_for_max_length_base() {
        let temp = tempdir().expect("tempdir");
        let base = "x".repeat(236);
        let occupant = temp.path().join(format!("{}.jpg", base));
        fs::write(&occupant, b"x").expect("write occupant");
        let original = temp.path().join("a.jpg");
        fs::write(&original, b"a").expect("write a");

        let mut planned = HashSet::<PathBuf>::new();
        let target =
            resolve_collision(&original, &base, ".jpg", &mut planned, 240).expect("resolve");

        let name = target
            .file_name()
            .and_then(|v| v.to_str())
            .expect("target name");
        assert!(name.ends_with("-1.jpg"));
        assert!(name.chars().count() <= 240);
        assert_ne!(target, occupant);
    }

    #[test]
    fn plan_records_per_file_skip_reasons() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join("a.jpg"), b"a").expect("write a");
        fs::write(temp.path().join("notes.txt"), b"n").expect("write notes");
        fs::write(temp.path().join(".hidden.jpg"), b"h").expect("write hidden");

        let plan = generate_plan(&options_for(temp.path())).expect("plan");

        assert_eq!(plan.skipped.len(), 2);
        assert_eq!(plan.skipped[0].path, temp.path().join(".hidden.jpg"));
        assert_eq!(plan.skipped[0].reason, "隠しファイルです");
        assert_eq!(plan.skipped[1].path, temp.path().join("notes.txt"));
        assert_eq!(plan.skipped[1].reason, "対象外の拡張子です");
    }

    #[test]
    fn own_name_counts_as_available() {
        let temp = tempdir().expect("tempdir");
        let original = temp.path().join("photo.jpg");
        fs::write(&original, b"x").expect("write photo");

        let planned = HashSet::<PathBuf>::new();
        assert!(is_available(&original, &original, &planned));
    }
}
