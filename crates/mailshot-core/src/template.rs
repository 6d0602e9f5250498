//! Template expression evaluation.
//!
//! Every configurable string is a [`tera`] template rendered without a
//! context. Besides tera's built-ins (`get_env`, `now`, filters, ...) a
//! `prompt(label="...")` function asks the user for a value on the
//! terminal, which keeps secrets such as passwords out of the config file:
//!
//! ```yaml
//! password: '{{ prompt(label="password:") }}'
//! ```

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tera::{Context, Tera, Value};

/// Resolves template source text to its final value.
pub trait Evaluator {
    /// Evaluates one expression.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Template`] if the expression fails to parse or render.
    fn evaluate(&self, expression: &str) -> Result<String>;
}

/// Source of answers for `prompt`.
pub type PromptFn = dyn Fn(&str) -> io::Result<String> + Send + Sync;

/// Production evaluator backed by tera.
///
/// Evaluations are independent: a literal that prompts prompts again every
/// time it is evaluated.
#[derive(Clone)]
pub struct TeraEvaluator {
    tera: Tera,
}

impl std::fmt::Debug for TeraEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TeraEvaluator").finish_non_exhaustive()
    }
}

impl TeraEvaluator {
    /// Creates an evaluator whose `prompt` reads from the terminal.
    #[must_use]
    pub fn new() -> Self {
        Self::with_prompt(stdin_prompt)
    }

    /// Creates an evaluator with a custom `prompt` answer source.
    pub fn with_prompt<F>(prompt: F) -> Self
    where
        F: Fn(&str) -> io::Result<String> + Send + Sync + 'static,
    {
        let prompt: Arc<PromptFn> = Arc::new(prompt);
        let mut tera = Tera::default();
        tera.autoescape_on(Vec::new());
        tera.register_function("prompt", move |args: &HashMap<String, Value>| {
            let label = match args.get("label") {
                Some(Value::String(label)) => label.clone(),
                Some(other) => other.to_string(),
                None => String::new(),
            };
            prompt(&label)
                .map(Value::String)
                .map_err(|e| tera::Error::msg(format!("prompt failed: {e}")))
        });
        Self { tera }
    }
}

impl Default for TeraEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator for TeraEvaluator {
    fn evaluate(&self, expression: &str) -> Result<String> {
        if !expression.contains("{{") && !expression.contains("{%") && !expression.contains("{#") {
            return Ok(expression.to_string());
        }

        let mut tera = self.tera.clone();
        tera.render_str(expression, &Context::new())
            .map_err(|e| Error::Template {
                expression: expression.to_string(),
                message: error_chain(&e),
            })
    }
}

fn error_chain(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Writes `label` to stderr and reads one line from stdin.
///
/// Blank answers re-prompt; the answer is trimmed.
///
/// # Errors
///
/// Fails on I/O errors or when stdin is closed before an answer.
pub fn stdin_prompt(label: &str) -> io::Result<String> {
    let stdin = io::stdin();
    let mut stderr = io::stderr();
    loop {
        write!(stderr, "{label} ")?;
        stderr.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "stdin closed while prompting",
            ));
        }
        let answer = line.trim();
        if !answer.is_empty() {
            return Ok(answer.to_string());
        }
    }
}

/// Parses a boolean the way Go's `strconv.ParseBool` does.
#[must_use]
pub fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting() -> (TeraEvaluator, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let evaluator = TeraEvaluator::with_prompt(move |label| {
            let n = seen.fetch_add(1, Ordering::SeqCst);
            Ok(format!("{label}{n}"))
        });
        (evaluator, calls)
    }

    #[test]
    fn plain_text_passes_through() {
        let (evaluator, _) = counting();
        assert_eq!(evaluator.evaluate("a@x.com").unwrap(), "a@x.com");
        assert_eq!(evaluator.evaluate("").unwrap(), "");
    }

    #[test]
    fn expressions_render() {
        let (evaluator, _) = counting();
        assert_eq!(evaluator.evaluate("{{ 580 + 7 }}").unwrap(), "587");
        assert_eq!(evaluator.evaluate("{{ \"hi\" | upper }}").unwrap(), "HI");
        assert_eq!(
            evaluator.evaluate("{% if true %}yes{% endif %}").unwrap(),
            "yes"
        );
    }

    #[test]
    fn no_html_escaping() {
        let (evaluator, _) = counting();
        assert_eq!(
            evaluator.evaluate("{{ \"A <a@x.com>\" }}").unwrap(),
            "A <a@x.com>"
        );
    }

    #[test]
    fn prompt_runs_on_every_evaluation() {
        let (evaluator, calls) = counting();
        let source = "{{ prompt(label=\"pw:\") }}";
        assert_eq!(evaluator.evaluate(source).unwrap(), "pw:0");
        assert_eq!(evaluator.evaluate(source).unwrap(), "pw:1");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn prompt_failure_is_template_error() {
        let evaluator = TeraEvaluator::with_prompt(|_| {
            Err(io::Error::new(io::ErrorKind::UnexpectedEof, "closed"))
        });
        let err = evaluator
            .evaluate("{{ prompt(label=\"pw:\") }}")
            .unwrap_err();
        assert!(matches!(err, Error::Template { .. }));
        assert!(err.to_string().contains("closed"));
    }

    #[test]
    fn syntax_error_reported() {
        let (evaluator, _) = counting();
        let err = evaluator.evaluate("{{ unclosed").unwrap_err();
        assert!(matches!(err, Error::Template { expression, .. } if expression == "{{ unclosed"));
    }

    #[test]
    fn go_compatible_bools() {
        for t in ["1", "t", "T", "TRUE", "true", "True"] {
            assert_eq!(parse_bool(t), Some(true));
        }
        for f in ["0", "f", "F", "FALSE", "false", "False"] {
            assert_eq!(parse_bool(f), Some(false));
        }
        for bad in ["", "yes", "tRuE", " true"] {
            assert_eq!(parse_bool(bad), None);
        }
    }
}
