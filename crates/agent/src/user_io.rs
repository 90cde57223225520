//! UserChannel — the seam through which `ask_user` reaches a human.
//!
//! The built-in blocks for one line of external input. In production that
//! is stdin; in tests it is a scripted queue.

use std::collections::VecDeque;
use std::io::Write;
use std::sync::Mutex;

/// A blocking line-oriented channel to the end user.
pub trait UserChannel: Send + Sync {
    /// Pose `question` and block until one line of input arrives.
    fn ask(&self, question: &str) -> std::io::Result<String>;
}

/// Reads answers from stdin.
pub struct StdinChannel;

impl UserChannel for StdinChannel {
    fn ask(&self, question: &str) -> std::io::Result<String> {
        let mut stdout = std::io::stdout();
        writeln!(stdout, "? {question}")?;
        write!(stdout, "> ")?;
        stdout.flush()?;

        let mut line = String::new();
        std::io::stdin().read_line(&mut line)?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

/// Replays a fixed queue of answers. Errors when the queue runs dry.
#[derive(Default)]
pub struct ScriptedChannel {
    answers: Mutex<VecDeque<String>>,
}

impl ScriptedChannel {
    pub fn new<S: Into<String>>(answers: impl IntoIterator<Item = S>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().map(Into::into).collect()),
        }
    }
}

impl UserChannel for ScriptedChannel {
    fn ask(&self, _question: &str) -> std::io::Result<String> {
        self.answers.lock().unwrap().pop_front().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "no scripted answer available",
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_channel_replays_in_order() {
        let channel = ScriptedChannel::new(["yes", "blue"]);
        assert_eq!(channel.ask("Proceed?").unwrap(), "yes");
        assert_eq!(channel.ask("Color?").unwrap(), "blue");
        assert!(channel.ask("More?").is_err());
    }
}
