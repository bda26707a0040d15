use std::io::{self, BufRead, Write};

/// Line-oriented prompts over any reader/writer pair.
///
/// Every `ask*` method returns `Ok(None)` once input is exhausted so callers
/// can treat end of input as "the user left".
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Prompter { input, output }
    }

    pub fn output(&mut self) -> &mut W {
        &mut self.output
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Ask for a value; an empty answer falls back to `default` when given.
    pub fn ask(&mut self, label: &str, default: Option<&str>) -> io::Result<Option<String>> {
        match default {
            Some(d) if !d.is_empty() => write!(self.output, "{label} [{d}]: ")?,
            _ => write!(self.output, "{label}: ")?,
        }
        self.output.flush()?;

        let Some(answer) = self.read_line()? else {
            writeln!(self.output)?;
            return Ok(None);
        };
        if answer.is_empty() {
            return Ok(Some(default.unwrap_or_default().to_string()));
        }
        Ok(Some(answer))
    }

    /// Yes/no question. Anything other than y/yes/n/no takes the default.
    pub fn confirm(&mut self, label: &str, default_yes: bool) -> io::Result<Option<bool>> {
        let hint = if default_yes { "Y/n" } else { "y/N" };
        write!(self.output, "{label} [{hint}]: ")?;
        self.output.flush()?;

        let Some(answer) = self.read_line()? else {
            writeln!(self.output)?;
            return Ok(None);
        };
        Ok(Some(match answer.to_ascii_lowercase().as_str() {
            "y" | "yes" => true,
            "n" | "no" => false,
            _ => default_yes,
        }))
    }
}
