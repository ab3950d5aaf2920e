//! Depth-aware parameter list splitting

/// Split a raw parameter list into individual parameters.
///
/// Commas only separate parameters at nesting depth zero for all of `{}`,
/// `[]` and `()`, so destructured objects, tuples and generic arguments stay
/// whole. Entries are trimmed and empty ones dropped. Unbalanced input is
/// accepted: the counters may go negative or stay open, and whatever was
/// accumulated is returned.
pub fn split_parameters(raw: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut current = String::new();
    let mut brace_depth: i32 = 0;
    let mut bracket_depth: i32 = 0;
    let mut paren_depth: i32 = 0;

    for c in raw.chars() {
        match c {
            '{' => brace_depth += 1,
            '}' => brace_depth -= 1,
            '[' => bracket_depth += 1,
            ']' => bracket_depth -= 1,
            '(' => paren_depth += 1,
            ')' => paren_depth -= 1,
            _ => {}
        }

        if c == ',' && brace_depth == 0 && bracket_depth == 0 && paren_depth == 0 {
            push_trimmed(&mut result, &current);
            current.clear();
        } else {
            current.push(c);
        }
    }

    push_trimmed(&mut result, &current);
    result
}

fn push_trimmed(result: &mut Vec<String>, param: &str) {
    let trimmed = param.trim();
    if !trimmed.is_empty() {
        result.push(trimmed.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_list() {
        assert_eq!(
            split_parameters("a: number, b: number"),
            vec!["a: number", "b: number"]
        );
    }

    #[test]
    fn test_destructured_parameter_is_one_entry() {
        assert_eq!(
            split_parameters("{ children, isBatch, count }: Props"),
            vec!["{ children, isBatch, count }: Props"]
        );
    }

    #[test]
    fn test_nested_callbacks_and_tuples() {
        assert_eq!(
            split_parameters("cb: (err: Error, value: T) => void, [x, y]: [number, number], opts = {}"),
            vec![
                "cb: (err: Error, value: T) => void",
                "[x, y]: [number, number]",
                "opts = {}"
            ]
        );
    }

    #[test]
    fn test_empty_and_trailing_commas() {
        assert!(split_parameters("").is_empty());
        assert!(split_parameters("   ").is_empty());
        assert_eq!(split_parameters("a, b,"), vec!["a", "b"]);
        assert_eq!(split_parameters(",,a"), vec!["a"]);
    }

    #[test]
    fn test_unbalanced_input_terminates() {
        assert_eq!(split_parameters("{ a, b"), vec!["{ a, b"]);
        // Closing first drives the counter negative, so the comma is not a separator
        assert_eq!(split_parameters("a }, b"), vec!["a }, b"]);
        assert_eq!(split_parameters("))),,(("), vec!["))),,(("]);
    }

    #[test]
    fn test_resplit_of_rejoined_output_is_stable() {
        let inputs = [
            "a: number, b: number",
            "{ a, b }: Props, [c, d], fn: (x: T, y: U) => V",
            "x = foo(1, 2), y: Map<string, number[]>",
            "",
        ];
        for input in inputs {
            let first = split_parameters(input);
            let second = split_parameters(&first.join(", "));
            assert_eq!(first, second, "input: {input}");
        }
    }
}
