use std::{fs, io, path::Path};

use tracing::debug;

use crate::{
    config::TRACKED_KEYS,
    progress::{Progress, ProgressTracker},
};

/// Returns every line of `source` that sets one of the tracked keys, in file
/// order, with trailing whitespace stripped.
///
/// A line counts only when its prefix is exactly `KEY=`, so a key that merely
/// shares a prefix with a tracked one (`DB_HOSTNAME` vs `DB_HOST`) never
/// matches.
pub(crate) fn tracked_lines<'a>(source: &'a str, entries: &[(&str, &str)]) -> Vec<&'a str> {
    source
        .lines()
        .map(str::trim_end)
        .filter(|line| {
            entries.iter().any(|(key, _)| {
                line.strip_prefix(key)
                    .is_some_and(|rest| rest.starts_with('='))
            })
        })
        .collect()
}

/// Rewrites every line that sets a tracked key to `KEY=VALUE` and appends the
/// tracked keys the source never set. Untracked lines pass through
/// byte-for-byte, line terminators included.
///
/// The candidate key of a line is the trimmed text before its first `=`; a
/// line without `=` yields the whole trimmed line. A key set more than once
/// is rewritten at every occurrence.
///
/// Values are written verbatim with no quoting: a value containing `=` or a
/// newline will corrupt the file.
pub(crate) fn patch_source(source: &str, entries: &[(&str, &str)]) -> String {
    let mut seen = vec![false; entries.len()];
    let mut output = String::with_capacity(source.len());

    for line in source.split_inclusive('\n') {
        let candidate = line.split_once('=').map(|(key, _)| key).unwrap_or(line).trim();

        match entries.iter().position(|(key, _)| *key == candidate) {
            Some(index) => {
                let (key, value) = entries[index];
                output.push_str(key);
                output.push('=');
                output.push_str(value);
                output.push('\n');
                seen[index] = true;
            }
            None => output.push_str(line),
        }
    }

    for (index, (key, value)) in entries.iter().enumerate() {
        if !seen[index] {
            output.push_str(key);
            output.push('=');
            output.push_str(value);
            output.push('\n');
        }
    }

    output
}

/// Whole-file read-modify-write; the handles are scoped inside the `fs`
/// calls, so they are released on every exit path.
pub(crate) fn patch_file(path: &Path, entries: &[(&str, &str)]) -> io::Result<()> {
    let source = fs::read_to_string(path)?;
    let patched = patch_source(&source, entries);
    debug!(path = %path.display(), bytes = patched.len(), "writing patched env file");
    fs::write(path, patched)
}

/// `stackmate env-show`: print the tracked lines of the env file.
///
/// A file that cannot be read is reported on the console; the command still
/// exits cleanly.
pub(crate) fn show_command(path: &Path) {
    match fs::read_to_string(path) {
        Ok(source) => {
            for line in tracked_lines(&source, &TRACKED_KEYS) {
                println!("{line}");
            }
        }
        Err(error) => println!("failed to read {}: {error}", path.display()),
    }
}

/// `stackmate env-patch`: rewrite the tracked keys in the env file.
pub(crate) fn patch_command(path: &Path) {
    let mut progress = ProgressTracker::from_env(&format!("patching {}", path.display()));

    match patch_file(path, &TRACKED_KEYS) {
        Ok(()) => progress.success(Some(&format!("updated {}", path.display()))),
        Err(error) => {
            progress.failure(Some(&format!("failed to patch {}: {error}", path.display())))
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    const ENTRIES: [(&str, &str); 4] = [
        ("SANCTUM_STATEFUL_DOMAINS", "192.168.1.105:3003"),
        ("SESSION_DOMAIN", "192.168.1.105"),
        ("APP_URL", "http://192.168.1.105:8002"),
        ("DB_HOST", "172.25.0.2"),
    ];

    fn count_lines(output: &str, line: &str) -> usize {
        output.lines().filter(|candidate| *candidate == line).count()
    }

    #[test]
    fn patch_replaces_existing_value() {
        let output = patch_source("APP_URL=old\n", &ENTRIES);

        assert_eq!(count_lines(&output, "APP_URL=http://192.168.1.105:8002"), 1);
        assert!(!output.contains("old"));
    }

    #[test]
    fn patch_appends_missing_key_last() {
        let output = patch_source("APP_NAME=demo\nAPP_URL=old\n", &ENTRIES);

        assert_eq!(output.lines().last(), Some("DB_HOST=172.25.0.2"));
    }

    #[test]
    fn patch_sets_every_tracked_key_exactly_once() {
        let output = patch_source("APP_NAME=demo\nDB_HOST=127.0.0.1\n", &ENTRIES);

        for (key, value) in ENTRIES {
            assert_eq!(count_lines(&output, &format!("{key}={value}")), 1, "{key}");
        }
    }

    #[test]
    fn patch_is_idempotent() {
        let once = patch_source("APP_NAME=demo\nAPP_URL=old\n# comment\n", &ENTRIES);
        let twice = patch_source(&once, &ENTRIES);

        assert_eq!(once, twice);
    }

    #[test]
    fn patch_preserves_untracked_lines_and_their_order() {
        let source = "# local overrides\nAPP_NAME=demo\n\nAPP_URL=old\nMAIL_PORT=1025\n";
        let output = patch_source(source, &ENTRIES);

        let untracked: Vec<&str> = output
            .lines()
            .filter(|line| ["# local overrides", "APP_NAME=demo", "", "MAIL_PORT=1025"].contains(line))
            .collect();
        assert_eq!(
            untracked,
            ["# local overrides", "APP_NAME=demo", "", "MAIL_PORT=1025"]
        );
    }

    #[test]
    fn patch_rewrites_every_occurrence_of_a_duplicated_key() {
        let output = patch_source("APP_URL=a\nAPP_NAME=demo\nAPP_URL=b\n", &ENTRIES);

        assert_eq!(count_lines(&output, "APP_URL=http://192.168.1.105:8002"), 2);
        assert!(!output.contains("APP_URL=a"));
        assert!(!output.contains("APP_URL=b"));
    }

    #[rstest]
    #[case::no_equals("just some text\n")]
    #[case::prefix_of_tracked_key("DB_HOSTNAME=db.internal\n")]
    fn patch_passes_unmatched_lines_through(#[case] line: &str) {
        let output = patch_source(line, &ENTRIES);

        assert!(output.starts_with(line));
    }

    #[test]
    fn patch_treats_bare_key_line_as_setting_that_key() {
        // No `=`, so the candidate key is the whole trimmed line.
        let output = patch_source("DB_HOST\n", &ENTRIES);

        assert_eq!(count_lines(&output, "DB_HOST=172.25.0.2"), 1);
        assert!(!output.contains("\nDB_HOST\n"));
    }

    #[test]
    fn patch_matches_keys_padded_with_whitespace() {
        let output = patch_source("  DB_HOST = 127.0.0.1\n", &ENTRIES);

        assert_eq!(count_lines(&output, "DB_HOST=172.25.0.2"), 1);
        assert!(!output.contains("127.0.0.1"));
    }

    #[test]
    fn patch_keeps_final_line_without_newline_verbatim() {
        // All tracked keys present, so nothing gets appended after it.
        let source = "SANCTUM_STATEFUL_DOMAINS=a\nSESSION_DOMAIN=b\nAPP_URL=c\nDB_HOST=d\nAPP_NAME=demo";
        let output = patch_source(source, &ENTRIES);

        assert!(output.ends_with("APP_NAME=demo"));
    }

    #[test]
    fn show_strips_trailing_whitespace_and_keeps_duplicates_in_order() {
        let source = "APP_URL=one  \nAPP_NAME=demo\nAPP_URL=two\t\n";

        assert_eq!(
            tracked_lines(source, &ENTRIES),
            ["APP_URL=one", "APP_URL=two"]
        );
    }

    #[rstest]
    #[case::empty("")]
    #[case::untracked_only("APP_NAME=demo\nMAIL_PORT=1025\n")]
    #[case::shared_prefix("DB_HOSTNAME=db.internal\n")]
    #[case::no_equals("DB_HOST\n")]
    fn show_prints_nothing_without_tracked_keys(#[case] source: &str) {
        assert!(tracked_lines(source, &ENTRIES).is_empty());
    }

    #[test]
    fn patch_file_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "APP_NAME=demo\nAPP_URL=old\n").unwrap();

        patch_file(&path, &ENTRIES).unwrap();
        let first = std::fs::read_to_string(&path).unwrap();

        patch_file(&path, &ENTRIES).unwrap();
        let second = std::fs::read_to_string(&path).unwrap();

        assert_eq!(first, second);
        assert_eq!(
            tracked_lines(&first, &ENTRIES).len(),
            ENTRIES.len()
        );
        assert_eq!(first.lines().next(), Some("APP_NAME=demo"));
    }

    #[test]
    fn patch_file_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();

        let error = patch_file(&dir.path().join("nope.env"), &ENTRIES).unwrap_err();
        assert_eq!(error.kind(), std::io::ErrorKind::NotFound);
    }
}
