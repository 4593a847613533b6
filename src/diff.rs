//! Line-granularity comparison between two code bodies, for the version
//! history view.

/// What happened to a run of lines between the old and new text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffKind {
    Equal,
    Insert,
    Delete,
}

/// A coalesced run of consecutive lines sharing one kind. `text` holds the
/// run's lines joined with `\n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffSegment {
    pub kind: DiffKind,
    pub text: String,
}

/// Longest-common-subsequence diff over lines.
///
/// Within a replacement, deleted lines come before inserted ones. Identical
/// inputs produce a single all-equal segment. Cost is O(old x new) in
/// lines, bounded in practice by snippet size.
pub fn diff_lines(old: &str, new: &str) -> Vec<DiffSegment> {
    if old == new {
        return vec![DiffSegment {
            kind: DiffKind::Equal,
            text: old.to_string(),
        }];
    }

    let a: Vec<&str> = old.lines().collect();
    let b: Vec<&str> = new.lines().collect();

    // lcs[i][j] = length of the LCS of a[i..] and b[j..].
    let mut lcs = vec![vec![0usize; b.len() + 1]; a.len() + 1];
    for i in (0..a.len()).rev() {
        for j in (0..b.len()).rev() {
            lcs[i][j] = if a[i] == b[j] {
                lcs[i + 1][j + 1] + 1
            } else {
                lcs[i + 1][j].max(lcs[i][j + 1])
            };
        }
    }

    let mut runs: Vec<(DiffKind, Vec<&str>)> = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if a[i] == b[j] {
            push_line(&mut runs, DiffKind::Equal, a[i]);
            i += 1;
            j += 1;
        } else if lcs[i + 1][j] >= lcs[i][j + 1] {
            push_line(&mut runs, DiffKind::Delete, a[i]);
            i += 1;
        } else {
            push_line(&mut runs, DiffKind::Insert, b[j]);
            j += 1;
        }
    }
    while i < a.len() {
        push_line(&mut runs, DiffKind::Delete, a[i]);
        i += 1;
    }
    while j < b.len() {
        push_line(&mut runs, DiffKind::Insert, b[j]);
        j += 1;
    }

    runs.into_iter()
        .map(|(kind, lines)| DiffSegment {
            kind,
            text: lines.join("\n"),
        })
        .collect()
}

fn push_line<'a>(runs: &mut Vec<(DiffKind, Vec<&'a str>)>, kind: DiffKind, line: &'a str) {
    match runs.last_mut() {
        Some((last_kind, lines)) if *last_kind == kind => lines.push(line),
        _ => runs.push((kind, vec![line])),
    }
}
