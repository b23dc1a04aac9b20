//! Unified diff translation
//!
//! Turns raw `git diff` text into the per-file set of changed line numbers.
//! Added lines contribute their after-side number and deleted lines their
//! before-side number, since either may sit on a previously covered line.

use crate::state::ChangedFile;
use std::collections::BTreeSet;

#[derive(Debug, Default)]
struct FileDiff {
    old_name: Option<String>,
    new_name: Option<String>,
    line_numbers: BTreeSet<u32>,
    saw_hunk: bool,
}

impl FileDiff {
    fn into_changed_file(self) -> Option<ChangedFile> {
        let name = self.new_name.or(self.old_name)?;
        if self.line_numbers.is_empty() {
            return None;
        }
        Some(ChangedFile {
            name,
            line_numbers: self.line_numbers,
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct Hunk {
    old_line: u32,
    new_line: u32,
    old_remaining: u32,
    new_remaining: u32,
}

impl Hunk {
    const fn is_open(&self) -> bool {
        self.old_remaining > 0 || self.new_remaining > 0
    }
}

/// Translate diff text into changed files, in diff order
///
/// Files without a name or without any added/deleted line are dropped.
#[must_use]
pub fn changed_files(diff_text: &str) -> Vec<ChangedFile> {
    let mut files: Vec<FileDiff> = Vec::new();
    let mut current: Option<FileDiff> = None;
    let mut hunk: Option<Hunk> = None;

    for line in diff_text.lines() {
        if let Some(active) = hunk.as_mut() {
            if consume_hunk_line(active, line, current.as_mut()) {
                if !active.is_open() {
                    hunk = None;
                }
                continue;
            }
            hunk = None;
        }

        if let Some(rest) = line.strip_prefix("diff --git ") {
            files.extend(current.take());
            let (old_name, new_name) = parse_git_header_paths(rest);
            current = Some(FileDiff {
                old_name,
                new_name,
                ..FileDiff::default()
            });
        } else if let Some(raw) = line.strip_prefix("--- ") {
            if current.as_ref().map_or(true, |file| file.saw_hunk) {
                files.extend(current.take());
                current = Some(FileDiff::default());
            }
            if let Some(file) = current.as_mut() {
                file.old_name = normalize_diff_path(raw, "a/");
            }
        } else if let Some(raw) = line.strip_prefix("+++ ") {
            if let Some(file) = current.as_mut() {
                file.new_name = normalize_diff_path(raw, "b/");
            }
        } else if let Some(raw) = line.strip_prefix("rename from ") {
            if let Some(file) = current.as_mut() {
                file.old_name = normalize_diff_path(raw, "");
            }
        } else if let Some(raw) = line.strip_prefix("rename to ") {
            if let Some(file) = current.as_mut() {
                file.new_name = normalize_diff_path(raw, "");
            }
        } else if line.starts_with("@@") {
            let Some(file) = current.as_mut() else {
                continue;
            };
            if let Some(parsed) = parse_hunk_header(line) {
                file.saw_hunk = true;
                hunk = parsed.is_open().then_some(parsed);
            }
        }
    }
    files.extend(current);

    files
        .into_iter()
        .filter_map(FileDiff::into_changed_file)
        .collect()
}

/// Apply one body line to the open hunk; false when the line is not hunk body
fn consume_hunk_line(hunk: &mut Hunk, line: &str, file: Option<&mut FileDiff>) -> bool {
    let Some(file) = file else {
        return false;
    };

    match line.as_bytes().first() {
        Some(b'+') if hunk.new_remaining > 0 => {
            record(file, hunk.new_line);
            hunk.new_line = hunk.new_line.saturating_add(1);
            hunk.new_remaining -= 1;
        }
        Some(b'-') if hunk.old_remaining > 0 => {
            record(file, hunk.old_line);
            hunk.old_line = hunk.old_line.saturating_add(1);
            hunk.old_remaining -= 1;
        }
        // Some tools strip the trailing space of empty context lines.
        Some(b' ') | None => {
            hunk.old_line = hunk.old_line.saturating_add(1);
            hunk.new_line = hunk.new_line.saturating_add(1);
            hunk.old_remaining = hunk.old_remaining.saturating_sub(1);
            hunk.new_remaining = hunk.new_remaining.saturating_sub(1);
        }
        // "\ No newline at end of file"
        Some(b'\\') => {}
        _ => return false,
    }
    true
}

fn record(file: &mut FileDiff, line_number: u32) {
    if line_number > 0 {
        file.line_numbers.insert(line_number);
    }
}

fn parse_git_header_paths(rest: &str) -> (Option<String>, Option<String>) {
    let rest = rest.trim();
    let split = if rest.starts_with('"') {
        closing_quote(rest).map(|end| end + 1)
    } else if rest.ends_with('"') {
        rest.rfind(" \"")
    } else {
        rest.rfind(" b/")
    };
    match split {
        Some(split) => (
            normalize_diff_path(&rest[..split], "a/"),
            normalize_diff_path(&rest[split..], "b/"),
        ),
        None => {
            let mut parts = rest.split_whitespace();
            let old_name = parts.next().and_then(|path| normalize_diff_path(path, "a/"));
            let new_name = parts.next().and_then(|path| normalize_diff_path(path, "b/"));
            (old_name, new_name)
        }
    }
}

/// Byte index of the quote closing the C-quoted string that `quoted` opens
fn closing_quote(quoted: &str) -> Option<usize> {
    let mut escaped = false;
    for (index, byte) in quoted.bytes().enumerate().skip(1) {
        match byte {
            _ if escaped => escaped = false,
            b'\\' => escaped = true,
            b'"' => return Some(index),
            _ => {}
        }
    }
    None
}

fn normalize_diff_path(raw: &str, prefix: &str) -> Option<String> {
    let raw = raw.trim();
    let path = match raw.strip_prefix('"').and_then(|quoted| quoted.strip_suffix('"')) {
        Some(quoted) => unquote_c_path(quoted),
        // `diff -u` appends a tab-separated timestamp
        None => raw.split('\t').next().unwrap_or(raw).trim().to_owned(),
    };
    if path.is_empty() || path == "/dev/null" {
        return None;
    }
    let normalized = if prefix.is_empty() {
        path.as_str()
    } else {
        path.strip_prefix(prefix).unwrap_or(path.as_str())
    };
    let normalized = normalized.trim();
    if normalized.is_empty() {
        None
    } else {
        Some(normalized.to_owned())
    }
}

/// Decode git's C-style path quoting (`\"`, `\\`, `\t`, octal byte escapes)
fn unquote_c_path(quoted: &str) -> String {
    let mut bytes = Vec::with_capacity(quoted.len());
    let mut input = quoted.bytes().peekable();
    while let Some(byte) = input.next() {
        if byte != b'\\' {
            bytes.push(byte);
            continue;
        }
        let Some(escape) = input.next() else {
            bytes.push(byte);
            break;
        };
        let decoded = match escape {
            b'a' => 0x07,
            b'b' => 0x08,
            b'f' => 0x0c,
            b'n' => b'\n',
            b'r' => b'\r',
            b't' => b'\t',
            b'v' => 0x0b,
            b'0'..=b'7' => {
                let mut value = u32::from(escape - b'0');
                for _ in 0..2 {
                    match input.peek() {
                        Some(digit @ b'0'..=b'7') => {
                            value = value * 8 + u32::from(digit - b'0');
                            input.next();
                        }
                        _ => break,
                    }
                }
                u8::try_from(value).unwrap_or(u8::MAX)
            }
            other => other,
        };
        bytes.push(decoded);
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

fn parse_hunk_header(line: &str) -> Option<Hunk> {
    let rest = line.strip_prefix("@@")?;
    let (header, _) = rest.split_once("@@")?;
    let mut parts = header.split_whitespace();
    let (old_line, old_remaining) = parse_hunk_range(parts.next()?, '-')?;
    let (new_line, new_remaining) = parse_hunk_range(parts.next()?, '+')?;
    Some(Hunk {
        old_line,
        new_line,
        old_remaining,
        new_remaining,
    })
}

fn parse_hunk_range(part: &str, expected_prefix: char) -> Option<(u32, u32)> {
    let raw = part.strip_prefix(expected_prefix)?;
    match raw.split_once(',') {
        Some((start, count)) => Some((start.parse().ok()?, count.parse().ok()?)),
        None => Some((raw.parse().ok()?, 1)),
    }
}
