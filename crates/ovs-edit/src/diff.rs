// diff.rs — Unified diff rendering for file edit plans.
//
// Minimal line-by-line diffs: removed lines with "-", added lines with "+".
// Not an LCS diff, but enough to show a reviewer what an edit will do.

/// Diff between two versions of an existing file.
pub fn unified_diff(path: &str, original: &str, modified: &str) -> String {
    let mut output = String::new();
    output.push_str(&format!("--- a/{}\n", path));
    output.push_str(&format!("+++ b/{}\n", path));

    let orig_lines: Vec<&str> = original.lines().collect();
    let mod_lines: Vec<&str> = modified.lines().collect();

    if orig_lines != mod_lines {
        output.push_str(&format!(
            "@@ -1,{} +1,{} @@\n",
            orig_lines.len(),
            mod_lines.len()
        ));
        for line in &orig_lines {
            output.push_str(&format!("-{}\n", line));
        }
        for line in &mod_lines {
            output.push_str(&format!("+{}\n", line));
        }
    }

    output
}

/// Diff for a newly created file.
pub fn new_file_diff(path: &str, content: &str) -> String {
    let mut output = String::new();
    output.push_str("--- /dev/null\n");
    output.push_str(&format!("+++ b/{}\n", path));

    let lines: Vec<&str> = content.lines().collect();
    output.push_str(&format!("@@ -0,0 +1,{} @@\n", lines.len()));
    for line in &lines {
        output.push_str(&format!("+{}\n", line));
    }

    output
}

/// Diff for a deleted file.
pub fn delete_file_diff(path: &str, content: &str) -> String {
    let mut output = String::new();
    output.push_str(&format!("--- a/{}\n", path));
    output.push_str("+++ /dev/null\n");

    let lines: Vec<&str> = content.lines().collect();
    output.push_str(&format!("@@ -1,{} +0,0 @@\n", lines.len()));
    for line in &lines {
        output.push_str(&format!("-{}\n", line));
    }

    output
}
