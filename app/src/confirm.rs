use std::io::{self, BufRead, Write};

use crate::pipeline::Confirmation;

/// Yes/no prompt on a line-oriented input. End of input declines.
pub struct StdinConfirmation<R> {
    input: R,
}

impl StdinConfirmation<io::StdinLock<'static>> {
    pub fn stdin() -> Self {
        Self {
            input: io::stdin().lock(),
        }
    }
}

impl<R: BufRead> StdinConfirmation<R> {
    pub fn new(input: R) -> Self {
        Self { input }
    }
}

fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

impl<R: BufRead> Confirmation for StdinConfirmation<R> {
    fn confirm(&mut self, message: &str) -> bool {
        print!("{}", message);
        let _ = io::stdout().flush();

        let mut answer = String::new();
        match self.input.read_line(&mut answer) {
            Ok(0) => false,
            Ok(_) => is_affirmative(&answer),
            Err(e) => {
                log::warn!("Failed to read answer: {}", e);
                false
            }
        }
    }
}
