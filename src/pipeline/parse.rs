//! JSON extraction from LLM output.

/// Extract the first balanced JSON object from LLM output.
///
/// Handles markdown code fences, surrounding prose, and braces inside
/// string values by scanning for the first `{` and tracking nesting depth
/// with string/escape state. If no balanced object is found, the trimmed
/// input is returned for the caller's parser to reject.
pub(crate) fn extract_json_object(text: &str) -> String {
    let trimmed = text.trim();
    let Some(start) = trimmed.find('{') else {
        return trimmed.to_string();
    };

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in trimmed[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return trimmed[start..=start + i].to_string();
                }
            }
            _ => {}
        }
    }

    trimmed.to_string()
}
