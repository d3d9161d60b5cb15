//! Output handling for external commands.
//!
//! Package managers and `openssl` can print pages of text; error messages only
//! carry the head of it.

/// Longest line kept, in characters.
const MAX_LINE_CHARS: usize = 200;

/// Upper bound for the whole excerpt, in bytes.
const MAX_EXCERPT_BYTES: usize = 1000;

/// Reduce command output to an excerpt suitable for an error message.
///
/// Keeps at most `max_lines` lines, shortens each line to a fixed width on a
/// character boundary, and marks every cut it makes.
pub fn sanitize_output(output: &str, max_lines: usize) -> String {
    let mut excerpt = String::new();

    for line in output.lines().take(max_lines) {
        let line = shorten(line);
        if excerpt.len() + line.len() > MAX_EXCERPT_BYTES {
            excerpt.push_str("...[truncated]");
            return excerpt;
        }
        if !excerpt.is_empty() {
            excerpt.push('\n');
        }
        excerpt.push_str(&line);
    }

    if output.lines().nth(max_lines).is_some() {
        excerpt.push_str("\n...[additional output truncated]");
    }

    excerpt
}

fn shorten(line: &str) -> String {
    match line.char_indices().nth(MAX_LINE_CHARS) {
        Some((cut, _)) => format!("{}...", &line[..cut]),
        None => line.to_string(),
    }
}
