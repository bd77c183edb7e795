//! Generated-code cleanup.
//!
//! Completion models wrap code in markdown fences and tack on noise the
//! notebook never wants: shebang lines, `export default` trailers, blank
//! edges. Cleanup runs over every cumulative snapshot while the stream is
//! still growing, so edge lines are matched by *partial* prefix: a trailing
//! `"``"` is already a fence being streamed and gets stripped the same as a
//! complete one, instead of flickering into view for one chunk.

/// Check `s` against `prefix` as far as both reach.
///
/// True when every compared position matches, including when `s` is shorter
/// than the prefix (a half-streamed edge line). The empty string matches
/// everything.
pub fn partial_prefix_match(s: &str, prefix: &str) -> bool {
    s.bytes().zip(prefix.bytes()).all(|(a, b)| a == b)
}

/// Strip fences, shebangs, `export default` trailers, and blank edge lines
/// from a code snapshot.
///
/// Each rule fires at most once, in order: leading fence, trailing fence,
/// leading shebang, trailing `export default`, then blank-edge trimming.
pub fn clean_code(code: &str) -> String {
    let lines: Vec<&str> = code.split('\n').collect();
    let mut start = 0;
    let mut end = lines.len();

    if start < end && partial_prefix_match(lines[start], "```") {
        start += 1;
    }
    if start < end && partial_prefix_match(lines[end - 1], "```") {
        end -= 1;
    }
    // bash cleanup
    if start < end && partial_prefix_match(lines[start], "#!/") {
        start += 1;
    }
    // js cleanup
    if start < end && partial_prefix_match(lines[end - 1], "export default") {
        end -= 1;
    }
    while start < end && lines[start].is_empty() {
        start += 1;
    }
    while start < end && lines[end - 1].is_empty() {
        end -= 1;
    }

    lines[start..end].join("\n")
}
