// Plan parser - raw model text to a Plan
//
// Models are asked for bare JSON but regularly wrap it in markdown fences or
// put a sentence of prose in front of it. Both are tolerated here.

use crate::errors::PlanParseError;

use super::types::Plan;

/// Parse a model response into a plan.
///
/// A decode failure is ordinary input, not a defect: callers fall back to
/// coercion or show the text as an informational answer.
pub fn parse_plan(response: &str) -> Result<Plan, PlanParseError> {
    let mut candidate = strip_markdown_fences(response.trim());

    if !candidate.starts_with('{') {
        if let Some(object) = extract_first_json_object(candidate) {
            candidate = object;
        }
    }

    let plan: Plan = serde_json::from_str(candidate)?;
    tracing::debug!("Parsed plan with {} operation(s)", plan.len());
    Ok(plan)
}

/// Strip a leading ``` fence (with optional `json` tag) and its closing fence.
/// Text that does not open with a fence is returned trimmed.
fn strip_markdown_fences(s: &str) -> &str {
    let s = s.trim();
    let Some(rest) = s.strip_prefix("```") else {
        return s;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest).trim();
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Find the first `{` and its matching `}` by depth counting.
///
/// Braces inside JSON string literals are counted too, so an object whose
/// string values contain unbalanced braces can be cut short. Returns `None`
/// when there is no opening brace or it is never closed.
fn extract_first_json_object(input: &str) -> Option<&str> {
    let start = input.find('{')?;
    let mut depth: usize = 0;

    for (offset, byte) in input.as_bytes()[start..].iter().enumerate() {
        match byte {
            b'{' => depth += 1,
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(input[start..=start + offset].trim());
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planning::types::OperationKind;

    const PLAN: &str = r#"{"operations":[{"type":"create_dir","path":"src"},{"type":"create_file","path":"src/lib.rs","content":"// lib\n"}]}"#;

    #[test]
    fn test_parse_bare_json() {
        let plan = parse_plan(PLAN).unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.operations[0].kind, OperationKind::CreateDir);
        assert_eq!(plan.operations[1].content, "// lib\n");
    }

    #[test]
    fn test_parse_fenced_json_matches_bare() {
        let fenced = format!("```json\n{}\n```", PLAN);
        assert_eq!(parse_plan(&fenced).unwrap(), parse_plan(PLAN).unwrap());

        let untagged = format!("  ```\n{}\n```  ", PLAN);
        assert_eq!(parse_plan(&untagged).unwrap(), parse_plan(PLAN).unwrap());
    }

    #[test]
    fn test_parse_fence_without_closing() {
        let fenced = format!("```json\n{}", PLAN);
        assert_eq!(parse_plan(&fenced).unwrap().len(), 2);
    }

    #[test]
    fn test_parse_object_after_prose() {
        let text = format!("Sure! Here is the plan you asked for:\n{}\nLet me know.", PLAN);
        let plan = parse_plan(&text).unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.operations[0].path, "src");
    }

    #[test]
    fn test_parse_empty_operations() {
        let plan = parse_plan(r#"{"operations":[]}"#).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_parse_plain_prose_fails() {
        assert!(parse_plan("This repo is organized by feature.").is_err());
        assert!(parse_plan("").is_err());
    }

    #[test]
    fn test_parse_unclosed_object_fails() {
        assert!(parse_plan("here: {\"operations\": [").is_err());
    }

    #[test]
    fn test_parse_unknown_kind_is_kept() {
        let plan = parse_plan(r#"{"operations":[{"type":"delete","path":"x"}]}"#).unwrap();
        assert_eq!(
            plan.operations[0].kind,
            OperationKind::Unknown("delete".to_string())
        );
    }

    #[test]
    fn test_extract_nested_object() {
        let text = r#"note {"a":{"b":1}} trailing }"#;
        assert_eq!(extract_first_json_object(text), Some(r#"{"a":{"b":1}}"#));
    }

    #[test]
    fn test_extract_counts_braces_inside_strings() {
        // Known limitation: the `}` inside the string closes the object early.
        let text = r#"plan: {"operations":[{"type":"create_file","path":"a","content":"}"}]}"#;
        let extracted = extract_first_json_object(text).unwrap();
        assert!(extracted.len() < text.len() - "plan: ".len());
        assert!(parse_plan(text).is_err());
    }

    #[test]
    fn test_strip_markdown_fences_variants() {
        assert_eq!(strip_markdown_fences("```json\n{}\n```"), "{}");
        assert_eq!(strip_markdown_fences("```\n{}\n```"), "{}");
        assert_eq!(strip_markdown_fences("{}"), "{}");
    }
}
