//! Presentation: turns a match (or its absence) into display strings.
//! Every unavailable value is replaced by the shared missing-result message,
//! never by an empty string.

use serde::Serialize;

use crate::matcher::MatchResult;

/// Shown in place of any value that could not be produced.
pub const MISSING_MESSAGE: &str = "No se ha encontrado ningún resultado viable";

pub const ANSWER_TRUE: &str = "Verdadero";
pub const ANSWER_FALSE: &str = "Falso";

/// How rendered values are emphasized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Emphasis {
    /// `<b>…</b>`
    #[default]
    Html,
    /// Bold escape sequence for terminals.
    Ansi,
    Plain,
}

impl Emphasis {
    pub fn apply(&self, text: &str) -> String {
        match self {
            Emphasis::Html => format!("<b>{text}</b>"),
            Emphasis::Ansi => format!("\x1b[1m{text}\x1b[0m"),
            Emphasis::Plain => text.to_string(),
        }
    }
}

impl std::str::FromStr for Emphasis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "html" => Ok(Emphasis::Html),
            "ansi" => Ok(Emphasis::Ansi),
            "plain" => Ok(Emphasis::Plain),
            other => Err(format!("unknown emphasis: {other}")),
        }
    }
}

/// Display-ready query result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormattedOutput {
    pub text: String,
    #[serde(rename = "match")]
    pub matched: String,
    pub confidence: String,
    pub answer: String,
    pub explanation: String,
}

impl FormattedOutput {
    /// All fields, `text` included, set to the missing message.
    /// Used when there was no usable input at all.
    pub fn blank() -> Self {
        Self {
            text: MISSING_MESSAGE.to_string(),
            matched: MISSING_MESSAGE.to_string(),
            confidence: MISSING_MESSAGE.to_string(),
            answer: MISSING_MESSAGE.to_string(),
            explanation: MISSING_MESSAGE.to_string(),
        }
    }

    /// (field name, value) pairs in display order.
    pub fn fields(&self) -> [(&'static str, &str); 5] {
        [
            ("text", self.text.as_str()),
            ("match", self.matched.as_str()),
            ("confidence", self.confidence.as_str()),
            ("answer", self.answer.as_str()),
            ("explanation", self.explanation.as_str()),
        ]
    }
}

/// Ratio as a percentage rounded to two decimals, shortest form: `100%`, `95.24%`, `50.5%`.
pub fn confidence_percent(ratio: f64) -> String {
    let rounded = (ratio * 10000.0).round() / 100.0;
    format!("{rounded}%")
}

pub fn answer_label(answer: bool) -> &'static str {
    if answer {
        ANSWER_TRUE
    } else {
        ANSWER_FALSE
    }
}

/// Render `input` and its match. Pure: the same arguments always give the same output.
pub fn format(input: &str, m: Option<&MatchResult>, emphasis: Emphasis) -> FormattedOutput {
    let text = emphasis.apply(input);
    match m {
        None => FormattedOutput {
            text,
            matched: MISSING_MESSAGE.to_string(),
            confidence: MISSING_MESSAGE.to_string(),
            answer: MISSING_MESSAGE.to_string(),
            explanation: MISSING_MESSAGE.to_string(),
        },
        Some(m) => FormattedOutput {
            text,
            matched: emphasis.apply(&m.question_text),
            confidence: emphasis.apply(&confidence_percent(m.confidence)),
            answer: emphasis.apply(answer_label(m.answer)),
            explanation: match &m.explanation {
                Some(e) => emphasis.apply(e),
                None => MISSING_MESSAGE.to_string(),
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(explanation: Option<&str>) -> MatchResult {
        MatchResult {
            question_text: "¿Es la Tierra redonda?".into(),
            confidence: 0.952380952,
            answer: true,
            explanation: explanation.map(str::to_string),
        }
    }

    #[test]
    fn percent_uses_shortest_form() {
        assert_eq!(confidence_percent(1.0), "100%");
        assert_eq!(confidence_percent(0.952380952), "95.24%");
        assert_eq!(confidence_percent(0.505), "50.5%");
        assert_eq!(confidence_percent(0.0), "0%");
    }

    #[test]
    fn absent_match_uses_missing_message() {
        let out = format("", None, Emphasis::Html);
        assert_eq!(out.text, "<b></b>");
        for (name, value) in out.fields().into_iter().skip(1) {
            assert_eq!(value, MISSING_MESSAGE, "field {name}");
        }
    }

    #[test]
    fn present_match_is_emphasized() {
        let m = sample(Some("Confirmado por observación satelital"));
        let out = format("Es la tierra redonda", Some(&m), Emphasis::Html);
        assert_eq!(out.text, "<b>Es la tierra redonda</b>");
        assert_eq!(out.matched, "<b>¿Es la Tierra redonda?</b>");
        assert_eq!(out.confidence, "<b>95.24%</b>");
        assert_eq!(out.answer, "<b>Verdadero</b>");
        assert_eq!(out.explanation, "<b>Confirmado por observación satelital</b>");
    }

    #[test]
    fn missing_explanation_only_affects_that_field() {
        let mut m = sample(None);
        m.answer = false;
        let out = format("x", Some(&m), Emphasis::Plain);
        assert_eq!(out.answer, "Falso");
        assert_eq!(out.explanation, MISSING_MESSAGE);
        assert_eq!(out.matched, "¿Es la Tierra redonda?");
    }

    #[test]
    fn formatting_is_idempotent() {
        let m = sample(Some("e"));
        let first = format("q", Some(&m), Emphasis::Ansi);
        let second = format("q", Some(&m), Emphasis::Ansi);
        assert_eq!(first, second);
        assert_eq!(m, sample(Some("e")));
    }

    #[test]
    fn blank_covers_text_too() {
        let out = FormattedOutput::blank();
        assert!(out.fields().iter().all(|(_, v)| *v == MISSING_MESSAGE));
    }

    #[test]
    fn emphasis_parses_case_insensitively() {
        assert_eq!("HTML".parse::<Emphasis>().unwrap(), Emphasis::Html);
        assert_eq!("plain".parse::<Emphasis>().unwrap(), Emphasis::Plain);
        assert!("bold".parse::<Emphasis>().is_err());
    }
}
