//! Operator confirmation before manifests are rewritten.
//!
//! The orchestrator only sees the [`Confirm`] capability. The terminal
//! implementation loops until it gets a recognised answer; tests and the
//! `--yes` flag use non-interactive implementations.

use std::fmt;
use std::io::{self, BufRead, Write};

/// The operator's decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Answer {
    /// Go ahead with the repair.
    Yes,
    /// Do not repair.
    No,
    /// Stop without doing anything.
    Abort,
}

impl Answer {
    /// Interpret one line of operator input.
    ///
    /// Accepts `yes`/`y`, `no`/`n`, and `quit`/`q`, ignoring case and
    /// surrounding whitespace.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "yes" | "y" => Some(Self::Yes),
            "no" | "n" => Some(Self::No),
            "quit" | "q" => Some(Self::Abort),
            _ => None,
        }
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Yes => write!(f, "yes"),
            Self::No => write!(f, "no"),
            Self::Abort => write!(f, "quit"),
        }
    }
}

/// Asks the operator a yes/no/quit question.
pub trait Confirm {
    /// Present `intro` (if any), then ask `question` until it is answered.
    ///
    /// # Errors
    ///
    /// Returns an error if the answer cannot be read or the prompt cannot be
    /// written.
    fn ask(&mut self, intro: Option<&str>, question: &str) -> io::Result<Answer>;
}

/// Interactive prompt over a line-oriented input and an output stream.
#[derive(Debug)]
pub struct TerminalPrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    /// Build a prompt reading answers from `input` and writing to `output`.
    #[must_use]
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Consume the prompt and return the output stream.
    #[must_use]
    pub fn into_output(self) -> W {
        self.output
    }
}

impl TerminalPrompt<io::StdinLock<'static>, io::Stdout> {
    /// Prompt on the process's stdin and stdout.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Confirm for TerminalPrompt<R, W> {
    fn ask(&mut self, intro: Option<&str>, question: &str) -> io::Result<Answer> {
        if let Some(intro) = intro {
            writeln!(self.output, "{intro}")?;
        }
        let mut line = String::new();
        loop {
            write!(self.output, "{question} (yes/no/quit): ")?;
            self.output.flush()?;

            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                // End of input: nobody is there to say yes.
                writeln!(self.output)?;
                return Ok(Answer::Abort);
            }
            match Answer::parse(&line) {
                Some(answer) => return Ok(answer),
                None => writeln!(self.output, "Invalid answer, {}", line.trim())?,
            }
        }
    }
}

/// Answers yes to everything without reading input.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn ask(&mut self, _intro: Option<&str>, _question: &str) -> io::Result<Answer> {
        Ok(Answer::Yes)
    }
}

/// Replays a fixed list of answers and records the questions asked.
#[cfg(any(test, feature = "test-support"))]
#[derive(Debug, Default)]
pub struct ScriptedConfirm {
    answers: std::collections::VecDeque<Answer>,
    /// Every `(intro, question)` pair received, in order.
    pub asked: Vec<(Option<String>, String)>,
}

#[cfg(any(test, feature = "test-support"))]
impl ScriptedConfirm {
    /// Build a confirmation that answers with `answers` in order.
    #[must_use]
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            asked: Vec::new(),
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
impl Confirm for ScriptedConfirm {
    fn ask(&mut self, intro: Option<&str>, question: &str) -> io::Result<Answer> {
        self.asked
            .push((intro.map(str::to_owned), question.to_owned()));
        self.answers
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no scripted answer left"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn ask_with(input: &str) -> (Answer, String) {
        let mut prompt = TerminalPrompt::new(input.as_bytes(), Vec::new());
        let answer = prompt
            .ask(Some("Changed files"), "Update checksums?")
            .expect("prompt succeeds");
        let output = String::from_utf8(prompt.into_output()).expect("utf8 output");
        (answer, output)
    }

    #[rstest]
    #[case::yes("yes\n", Answer::Yes)]
    #[case::y("y\n", Answer::Yes)]
    #[case::upper("YES\n", Answer::Yes)]
    #[case::no("no\n", Answer::No)]
    #[case::n(" n \n", Answer::No)]
    #[case::quit("quit\n", Answer::Abort)]
    #[case::q("q\n", Answer::Abort)]
    fn recognises_answers(#[case] input: &str, #[case] expected: Answer) {
        let (answer, output) = ask_with(input);
        assert_eq!(answer, expected);
        assert!(output.starts_with("Changed files\n"));
        assert!(output.contains("Update checksums? (yes/no/quit): "));
    }

    #[test]
    fn re_asks_after_invalid_answer() {
        let (answer, output) = ask_with("maybe\ny\n");
        assert_eq!(answer, Answer::Yes);
        assert!(output.contains("Invalid answer, maybe"));
        assert_eq!(output.matches("(yes/no/quit)").count(), 2);
    }

    #[test]
    fn end_of_input_aborts() {
        let (answer, _) = ask_with("");
        assert_eq!(answer, Answer::Abort);
    }

    #[test]
    fn scripted_confirm_records_questions() {
        let mut confirm = ScriptedConfirm::new([Answer::No]);
        let answer = confirm.ask(None, "Proceed?").expect("scripted answer");
        assert_eq!(answer, Answer::No);
        assert_eq!(confirm.asked, vec![(None, "Proceed?".to_owned())]);
        assert!(confirm.ask(None, "Again?").is_err());
    }
}
