use std::{
    io::{self, BufRead, Write},
    time::Duration,
};

use tracing::debug;


/// Why a line typed at a prompt (or passed on the command line) was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub(crate) enum InputError {
    #[error("a job title or skill is required")]
    EmptyKeyword,
    #[error("{0:?} is a number, enter a job title or skill")]
    NumericKeyword(String),
    #[error("{0:?} is not a whole number")]
    NotANumber(String),
    #[error("{0:?} may only contain letters and spaces")]
    NonAlphabeticSkill(String),
}


/// A source of answers to interactive questions.
pub(crate) trait Prompt {
    /// Shows `message` and returns the next line without its line ending,
    /// or `None` once input is exhausted.
    fn ask(&mut self, message: &str) -> io::Result<Option<String>>;
}


/// Prompts on stdout and reads answers from stdin.
#[derive(Default)]
pub(crate) struct StdinPrompt;


impl Prompt for StdinPrompt {
    fn ask(&mut self, message: &str) -> io::Result<Option<String>> {
        // The lock is released before blocking on stdin so the interrupt
        // handler can still print.
        {
            let mut stdout = io::stdout().lock();
            stdout.write_all(message.as_bytes())?;
            stdout.flush()?;
        }

        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed_len = line.trim_end_matches(&['\r', '\n'][..]).len();
        line.truncate(trimmed_len);
        Ok(Some(line))
    }
}


/// Asks until `parse` accepts the answer. Returns `None` if input ends first.
pub(crate) fn prompt_until<P, T, F>(prompt: &mut P, message: &str, parse: F) -> io::Result<Option<T>>
where
    P: Prompt + ?Sized,
    F: Fn(&str) -> Result<T, InputError>,
{
    loop {
        let Some(answer) = prompt.ask(message)? else {
            return Ok(None);
        };
        match parse(&answer) {
            Ok(value) => return Ok(Some(value)),
            Err(e) => debug!("Rejected input: {e}"),
        }
    }
}


/// A search keyword: anything except blank or purely numeric text.
pub(crate) fn parse_keyword(input: &str) -> Result<String, InputError> {
    let keyword = input.trim();
    if keyword.is_empty() {
        return Err(InputError::EmptyKeyword);
    }
    if keyword.chars().all(char::is_numeric) {
        return Err(InputError::NumericKeyword(keyword.to_string()));
    }
    Ok(keyword.to_string())
}


/// A page count made of digits only.
pub(crate) fn parse_page_count(input: &str) -> Result<usize, InputError> {
    let digits = input.trim();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(InputError::NotANumber(input.to_string()));
    }
    digits.parse().map_err(|_| InputError::NotANumber(input.to_string()))
}


/// A pause between page loads in whole seconds, never shorter than one second.
pub(crate) fn parse_pause(input: &str) -> Result<Duration, InputError> {
    let seconds: i64 = input
        .trim()
        .parse()
        .map_err(|_| InputError::NotANumber(input.to_string()))?;
    Ok(Duration::from_secs(seconds.max(1) as u64))
}


/// Splits a `", "`-separated skill query into lower-cased tokens.
///
/// Every token must consist of letters once its spaces are removed, so
/// `"machine learning"` is fine and `"c++"` is not.
pub(crate) fn parse_skill_query(input: &str) -> Result<Vec<String>, InputError> {
    let skills: Vec<String> = input
        .trim()
        .split(", ")
        .map(|skill| skill.trim().to_lowercase())
        .collect();

    for skill in &skills {
        let mut letters = skill.chars().filter(|c| *c != ' ').peekable();
        if letters.peek().is_none() || !letters.all(char::is_alphabetic) {
            return Err(InputError::NonAlphabeticSkill(skill.clone()));
        }
    }
    Ok(skills)
}


/// Replays canned answers, for driving interactive code in tests.
#[cfg(test)]
pub(crate) struct ScriptedPrompt {
    answers: std::collections::VecDeque<String>,
    pub(crate) asked: Vec<String>,
}


#[cfg(test)]
impl ScriptedPrompt {
    pub(crate) fn new<'a>(answers: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            answers: answers.into_iter().map(String::from).collect(),
            asked: Vec::new(),
        }
    }
}


#[cfg(test)]
impl Prompt for ScriptedPrompt {
    fn ask(&mut self, message: &str) -> io::Result<Option<String>> {
        self.asked.push(message.to_string());
        Ok(self.answers.pop_front())
    }
}
