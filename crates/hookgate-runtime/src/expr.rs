//! Condition expressions for `skip` / `only` job gates.
//!
//! Grammar, lowest precedence first: `||`, `&&`, unary `!`, then an atom.
//! An atom is either `LHS OP RHS` with `OP` one of `==`, `!=`, `matches`
//! (glob) and `regex`, or a bare literal. `${NAME}` placeholders are
//! substituted from the bindings before anything else happens.

use std::collections::HashMap;

use regex::Regex;
use thiserror::Error;

/// Flat variable bindings assembled per event.
pub type Bindings = HashMap<String, String>;

#[derive(Debug, Error)]
pub enum ExprError {
    #[error("could not evaluate expression: {0:?}")]
    CouldNotEvaluate(String),

    #[error("invalid glob pattern '{pattern}': {source}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("invalid regex '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Eq,
    Ne,
    Matches,
    Regex,
}

/// Evaluate `expression` against `bindings`. An empty expression is true.
pub fn evaluate(expression: &str, bindings: &Bindings) -> Result<bool, ExprError> {
    if expression.trim().is_empty() {
        return Ok(true);
    }
    let expanded = substitute(expression, bindings);
    eval_or(&expanded)
}

/// Replace every `${NAME}` with its binding; unbound names become "".
pub fn substitute(input: &str, bindings: &Bindings) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let name = &after[..end];
                if let Some(value) = bindings.get(name) {
                    out.push_str(value);
                }
                rest = &after[end + 1..];
            }
            None => {
                // Unterminated placeholder stays verbatim
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

fn eval_or(expr: &str) -> Result<bool, ExprError> {
    for part in split_top_level(expr, "||") {
        if eval_and(part)? {
            return Ok(true);
        }
    }
    Ok(false)
}

fn eval_and(expr: &str) -> Result<bool, ExprError> {
    for part in split_top_level(expr, "&&") {
        if !eval_unary(part)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn eval_unary(expr: &str) -> Result<bool, ExprError> {
    let trimmed = expr.trim();
    match trimmed.strip_prefix('!') {
        // `!=` at the very start is a comparison with an empty LHS, not a negation
        Some(rest) if !rest.starts_with('=') => Ok(!eval_unary(rest)?),
        _ => eval_atom(trimmed),
    }
}

fn eval_atom(atom: &str) -> Result<bool, ExprError> {
    match find_operator(atom) {
        Some((op, start, len)) => {
            let lhs = unquote(atom[..start].trim());
            let rhs = unquote(atom[start + len..].trim());
            compare(op, lhs, rhs)
        }
        None => eval_literal(atom),
    }
}

fn compare(op: Op, lhs: &str, rhs: &str) -> Result<bool, ExprError> {
    match op {
        Op::Eq => Ok(lhs == rhs),
        Op::Ne => Ok(lhs != rhs),
        Op::Matches => {
            let pattern = glob::Pattern::new(rhs).map_err(|source| ExprError::InvalidGlob {
                pattern: rhs.to_string(),
                source,
            })?;
            Ok(lhs.split_whitespace().any(|token| pattern.matches(token)))
        }
        Op::Regex => {
            let re = Regex::new(rhs).map_err(|source| ExprError::InvalidRegex {
                pattern: rhs.to_string(),
                source,
            })?;
            Ok(lhs.split_whitespace().any(|token| re.is_match(token)))
        }
    }
}

fn eval_literal(atom: &str) -> Result<bool, ExprError> {
    let value = unquote(atom.trim());
    if value.is_empty() {
        return Err(ExprError::CouldNotEvaluate(atom.to_string()));
    }
    match value.to_ascii_lowercase().as_str() {
        "false" | "0" => Ok(false),
        _ => Ok(true),
    }
}

/// Split on `sep` wherever it occurs outside single or double quotes.
fn split_top_level<'a>(expr: &'a str, sep: &str) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut quote: Option<char> = None;
    let mut last = 0;
    let mut iter = expr.char_indices().peekable();

    while let Some((i, c)) = iter.next() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if expr[i..].starts_with(sep) => {
                parts.push(&expr[last..i]);
                last = i + sep.len();
                for _ in 1..sep.chars().count() {
                    iter.next();
                }
            }
            None => {}
        }
    }
    parts.push(&expr[last..]);
    parts
}

/// Locate the first comparison operator outside quotes.
/// Returns (operator, byte offset, byte length).
fn find_operator(atom: &str) -> Option<(Op, usize, usize)> {
    let mut quote: Option<char> = None;
    let mut prev: Option<char> = None;

    for (i, c) in atom.char_indices() {
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                }
            }
            None if c == '"' || c == '\'' => quote = Some(c),
            None => {
                let rest = &atom[i..];
                if rest.starts_with("==") {
                    return Some((Op::Eq, i, 2));
                }
                if rest.starts_with("!=") {
                    return Some((Op::Ne, i, 2));
                }
                // An empty LHS leaves the word operator at offset 0
                let at_word_start = prev.map_or(true, char::is_whitespace);
                if at_word_start {
                    for (word, op) in [("matches", Op::Matches), ("regex", Op::Regex)] {
                        if rest.starts_with(word)
                            && rest[word.len()..].starts_with(char::is_whitespace)
                        {
                            return Some((op, i, word.len()));
                        }
                    }
                }
            }
        }
        prev = Some(c);
    }
    None
}

fn unquote(s: &str) -> &str {
    for q in ['"', '\''] {
        if s.len() >= 2 && s.starts_with(q) && s.ends_with(q) {
            return &s[1..s.len() - 1];
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Bindings {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn eval(expr: &str) -> bool {
        evaluate(expr, &Bindings::new()).unwrap()
    }

    #[test]
    fn test_empty_expression_is_true() {
        assert!(eval(""));
        assert!(eval("   "));
    }

    #[test]
    fn test_literals() {
        assert!(eval("true"));
        assert!(eval("1"));
        assert!(eval("\"TRUE\""));
        assert!(eval("anything"));
        assert!(!eval("false"));
        assert!(!eval("'False'"));
        assert!(!eval("0"));
    }

    #[test]
    fn test_empty_atom_is_error() {
        let err = evaluate("${MISSING}", &Bindings::new()).unwrap_err();
        assert!(err.to_string().contains("could not evaluate expression"));
    }

    #[test]
    fn test_equality_with_substitution() {
        let b = vars(&[("TOOL_NAME", "Edit")]);
        assert!(evaluate("${TOOL_NAME} == \"Edit\"", &b).unwrap());
        assert!(!evaluate("${TOOL_NAME} != \"Edit\"", &b).unwrap());
        assert!(evaluate("${TOOL_NAME} != 'Write'", &b).unwrap());
    }

    #[test]
    fn test_unbound_variable_substitutes_empty() {
        let b = Bindings::new();
        assert!(evaluate("${NOPE} == \"\"", &b).unwrap());
        assert_eq!(substitute("a${NOPE}b", &b), "ab");
    }

    #[test]
    fn test_unterminated_placeholder_kept() {
        assert_eq!(substitute("x ${OPEN", &Bindings::new()), "x ${OPEN");
    }

    #[test]
    fn test_or_and_not() {
        assert!(eval("false || true"));
        assert!(!eval("false || false"));
        assert!(eval("true && true"));
        assert!(!eval("true && false"));
        assert!(eval("!false"));
        assert!(!eval("!true"));
        assert!(eval("!!true"));
    }

    #[test]
    fn test_precedence_and_binds_tighter() {
        // A==1 || (B==2 && C==3)
        let b = vars(&[("A", "1"), ("B", "0"), ("C", "0")]);
        assert!(evaluate("${A}==1 || ${B}==2 && ${C}==3", &b).unwrap());

        let b = vars(&[("A", "0"), ("B", "2"), ("C", "0")]);
        assert!(!evaluate("${A}==1 || ${B}==2 && ${C}==3", &b).unwrap());

        let b = vars(&[("A", "0"), ("B", "2"), ("C", "3")]);
        assert!(evaluate("${A}==1 || ${B}==2 && ${C}==3", &b).unwrap());
    }

    #[test]
    fn test_not_negates_whole_comparison() {
        let b = vars(&[("TOOL_NAME", "Bash")]);
        assert!(!evaluate("!${TOOL_NAME} == Bash", &b).unwrap());
        assert!(evaluate("! ${TOOL_NAME} == Read", &b).unwrap());
    }

    #[test]
    fn test_operators_inside_quotes_are_not_split_points() {
        let b = vars(&[("CMD", "a || b")]);
        assert!(evaluate("\"${CMD}\" == \"a || b\"", &b).unwrap());
        assert!(evaluate("'x && y' == 'x && y'", &b).unwrap());
        assert!(evaluate("'a == b' != 'c'", &b).unwrap());
    }

    #[test]
    fn test_matches_any_token() {
        let b = vars(&[("FILES_CHANGED", "a.py b.txt")]);
        assert!(evaluate("${FILES_CHANGED} matches *.py", &b).unwrap());
        assert!(evaluate("${FILES_CHANGED} matches \"*.txt\"", &b).unwrap());
        assert!(!evaluate("${FILES_CHANGED} matches *.rs", &b).unwrap());
    }

    #[test]
    fn test_matches_empty_lhs_is_false() {
        let b = vars(&[("FILES_CHANGED", "")]);
        assert!(!evaluate("${FILES_CHANGED} matches *.py", &b).unwrap());
        assert!(!evaluate("${FILES_CHANGED} regex \\.py$", &b).unwrap());
        assert!(!evaluate("${UNBOUND} matches *", &Bindings::new()).unwrap());
        assert!(evaluate("!${FILES_CHANGED} matches *.py", &b).unwrap());
    }

    #[test]
    fn test_word_operator_needs_word_boundary_at_start() {
        let b = vars(&[("MODE", "matchesx")]);
        assert!(evaluate("${MODE}", &b).unwrap());
        assert!(!evaluate("matches *.py", &b).unwrap());
    }

    #[test]
    fn test_regex_any_token() {
        let b = vars(&[("FILES_CHANGED", "src/main.rs docs/readme.md")]);
        assert!(evaluate("${FILES_CHANGED} regex ^docs/", &b).unwrap());
        assert!(!evaluate("${FILES_CHANGED} regex \\.go$", &b).unwrap());
    }

    #[test]
    fn test_invalid_regex_is_error() {
        let b = vars(&[("X", "abc")]);
        let err = evaluate("${X} regex (unclosed", &b).unwrap_err();
        assert!(matches!(err, ExprError::InvalidRegex { .. }));
    }

    #[test]
    fn test_invalid_glob_is_error() {
        let b = vars(&[("X", "abc")]);
        let err = evaluate("${X} matches [", &b).unwrap_err();
        assert!(matches!(err, ExprError::InvalidGlob { .. }));
    }

    #[test]
    fn test_operator_word_needs_boundaries() {
        // "rematches" is not the `matches` operator
        assert!(eval("rematches"));
        let b = vars(&[("NAME", "regexp")]);
        assert!(evaluate("${NAME} == regexp", &b).unwrap());
    }
}
