// Code extraction from model responses
//
// Models wrap code in markdown fences and pad it with commentary. The
// extractor takes the interior of the first fenced block; everything outside
// it is discarded. Responses without fences are taken verbatim.

/// Pull the executable code out of a model response.
///
/// A fence line is any line whose trimmed form starts with ``` (an opening
/// fence may carry a language tag such as ```python). The result is the
/// interior between the first fence line and the next one; with no closing
/// fence the interior runs to the end of the response. A first fence followed
/// only by blank lines closes rather than opens, so the code is what precedes
/// it; with no fence lines at all the whole response is the code. Leading and
/// trailing blank lines are dropped either way, so extraction is idempotent.
pub fn extract_code(raw: &str) -> String {
    let lines: Vec<&str> = raw.lines().collect();

    let interior: &[&str] = match lines.iter().position(|l| is_fence(l)) {
        Some(open) => {
            let after = &lines[open + 1..];
            if after.iter().all(|l| l.trim().is_empty()) {
                // A fence with nothing after it is a stray closing marker;
                // the code is what came before it.
                &lines[..open]
            } else {
                match after.iter().position(|l| is_fence(l)) {
                    Some(close) => &after[..close],
                    None => after,
                }
            }
        }
        None => &lines[..],
    };

    let Some(start) = interior.iter().position(|l| !l.trim().is_empty()) else {
        return String::new();
    };
    let end = interior
        .iter()
        .rposition(|l| !l.trim().is_empty())
        .unwrap_or(start);

    interior[start..=end].join("\n")
}

fn is_fence(line: &str) -> bool {
    line.trim_start().starts_with("```")
}
