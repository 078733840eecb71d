//! Unified diff generation.
//!
//! Pure line-based diffing with conventional `---`/`+++` headers and
//! `@@ -oldStart,oldCount +newStart,newCount @@` hunk markers. The
//! alignment is a simple greedy walk, not a minimal-edit LCS: at each
//! divergence it resynchronizes on the next line of the new sequence that
//! also occurs in the old tail, consuming everything before that point as
//! one deletion/insertion run. On heavily interleaved changes this
//! over-reports churn relative to a minimal diff; that is expected
//! behavior, not a bug.

/// Render a unified diff between `before` and `after`.
///
/// `before = None` renders as an all-insertion diff against an empty
/// original. Identical inputs yield headers with no hunks.
#[must_use]
pub fn unified_diff(before: Option<&str>, after: &str, display_name: &str) -> String {
    let old: Vec<&str> = before.map(|text| text.lines().collect()).unwrap_or_default();
    let new: Vec<&str> = after.lines().collect();

    let mut out = String::new();
    out.push_str("--- ");
    out.push_str(display_name);
    out.push('\n');
    out.push_str("+++ ");
    out.push_str(display_name);
    out.push('\n');

    let mut i = 0;
    let mut j = 0;
    while i < old.len() || j < new.len() {
        if i < old.len() && j < new.len() && old[i] == new[j] {
            i += 1;
            j += 1;
            continue;
        }

        // Divergence: resynchronize on the first upcoming new line that
        // reoccurs anywhere in the old tail; everything before the sync
        // point is one maximal deletion/insertion run.
        let (sync_old, sync_new) = find_sync(&old, &new, i, j);
        let old_count = sync_old - i;
        let new_count = sync_new - j;

        let old_start = if old_count > 0 { i + 1 } else { i };
        let new_start = if new_count > 0 { j + 1 } else { j };
        out.push_str(&format!(
            "@@ -{old_start},{old_count} +{new_start},{new_count} @@\n"
        ));
        for line in &old[i..sync_old] {
            out.push('-');
            out.push_str(line);
            out.push('\n');
        }
        for line in &new[j..sync_new] {
            out.push('+');
            out.push_str(line);
            out.push('\n');
        }
        i = sync_old;
        j = sync_new;
    }

    out
}

/// First matching pair `(k, l)` with `k >= i`, `l >= j`, `old[k] == new[l]`,
/// scanning the new sequence outward first. Falls back to the end of both
/// sequences when no line matches again.
fn find_sync(old: &[&str], new: &[&str], i: usize, j: usize) -> (usize, usize) {
    for (l, new_line) in new.iter().enumerate().skip(j) {
        for (k, old_line) in old.iter().enumerate().skip(i) {
            if old_line == new_line {
                return (k, l);
            }
        }
    }
    (old.len(), new.len())
}
