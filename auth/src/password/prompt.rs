//! Masked password prompts.
//!
//! [`MaskedLineReader`] works on explicit input and output streams and is used
//! for piped input and tests. [`TerminalPrompt`] reads keystrokes from an
//! interactive terminal without echo and falls back to the line reader when
//! stdin is not a terminal.

use console::{Key, Term};
use std::io::{self, BufRead, IsTerminal as _, Write};

/// Character written in place of every typed character.
pub const MASK_CHAR: char = '*';

const BACKSPACE: char = '\u{8}';
const DELETE: char = '\u{7f}';

/// Source of a single password line.
pub trait PasswordPrompt: Send + 'static {
    /// Shows `prompt` and returns the entered text without its line terminator.
    fn read_password(&mut self, prompt: &str) -> io::Result<String>;
}

/// Reads one line from `input`, writing a mask character to `output` for each
/// character instead of the character itself.
pub struct MaskedLineReader<R, W> {
    input: R,
    output: W,
    mask: char,
}

impl<R: BufRead, W: Write> MaskedLineReader<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            mask: MASK_CHAR,
        }
    }

    /// Uses `mask` instead of [`MASK_CHAR`].
    pub fn with_mask(mut self, mask: char) -> Self {
        self.mask = mask;
        self
    }

    /// Returns the underlying streams.
    pub fn into_inner(self) -> (R, W) {
        (self.input, self.output)
    }

    /// Shows `prompt`, reads a line and returns it.
    ///
    /// Backspace and delete remove the previously captured character. EOF
    /// before any input is an `UnexpectedEof` error; a final line without a
    /// terminator is returned as is.
    pub fn read_masked(&mut self, prompt: &str) -> io::Result<String> {
        self.output.write_all(prompt.as_bytes())?;
        self.output.flush()?;

        let mut raw = Vec::new();
        if self.input.read_until(b'\n', &mut raw)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed before a password was entered",
            ));
        }
        if raw.last() == Some(&b'\n') {
            raw.pop();
        }
        if raw.last() == Some(&b'\r') {
            raw.pop();
        }
        let line = String::from_utf8(raw)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut captured = String::with_capacity(line.len());
        let mut mask_buf = [0u8; 4];
        let mask = self.mask.encode_utf8(&mut mask_buf).as_bytes();
        for c in line.chars() {
            if c == BACKSPACE || c == DELETE {
                if captured.pop().is_some() {
                    self.output.write_all(b"\x08 \x08")?;
                }
            } else {
                captured.push(c);
                self.output.write_all(mask)?;
            }
        }
        self.output.write_all(b"\n")?;
        self.output.flush()?;

        Ok(captured)
    }
}

impl<R, W> PasswordPrompt for MaskedLineReader<R, W>
where
    R: BufRead + Send + 'static,
    W: Write + Send + 'static,
{
    fn read_password(&mut self, prompt: &str) -> io::Result<String> {
        self.read_masked(prompt)
    }
}

/// Interactive prompt on the process terminal.
///
/// Whether keys are read in raw mode depends only on stdin being a terminal;
/// the prompt and masks go to the chosen output stream even when it is
/// redirected.
pub struct TerminalPrompt {
    term: Term,
    mask: char,
    stdin_is_tty: fn() -> bool,
}

/// How a [`TerminalPrompt`] collects input.
enum InputMode {
    /// Raw key reads, gated on a terminal handle.
    Keys(Term),
    /// Plain lines from a non-terminal stdin.
    Lines,
    /// Stdin is a terminal but no output handle is, so raw reads are refused.
    Unavailable,
}

fn stdin_is_terminal() -> bool {
    io::stdin().is_terminal()
}

impl TerminalPrompt {
    /// Prompts on stdout.
    pub fn stdout() -> Self {
        Self::on(Term::stdout())
    }

    /// Prompts on stderr, leaving stdout for command output.
    pub fn stderr() -> Self {
        Self::on(Term::stderr())
    }

    fn on(term: Term) -> Self {
        Self {
            term,
            mask: MASK_CHAR,
            stdin_is_tty: stdin_is_terminal,
        }
    }

    /// Replaces the stdin terminal check.
    pub fn with_tty_check(mut self, stdin_is_tty: fn() -> bool) -> Self {
        self.stdin_is_tty = stdin_is_tty;
        self
    }

    fn input_mode(&self) -> InputMode {
        if !(self.stdin_is_tty)() {
            return InputMode::Lines;
        }
        // console only reads keys through a handle that is itself a terminal.
        [self.term.clone(), Term::stderr(), Term::stdout()]
            .into_iter()
            .find(Term::is_term)
            .map_or(InputMode::Unavailable, InputMode::Keys)
    }

    fn read_keys(&self, keys: &Term, prompt: &str) -> io::Result<String> {
        let mask = self.mask.to_string();
        let mut captured = String::new();

        self.term.write_str(prompt)?;
        loop {
            // `read_key` switches stdin to raw mode for one key and restores it afterwards.
            match keys.read_key()? {
                Key::Enter => break,
                Key::Backspace => {
                    if captured.pop().is_some() {
                        self.term.clear_chars(1)?;
                    }
                }
                Key::Char(c) if !c.is_control() => {
                    captured.push(c);
                    self.term.write_str(&mask)?;
                }
                Key::CtrlC | Key::Escape => {
                    self.term.write_line("")?;
                    return Err(io::Error::new(
                        io::ErrorKind::Interrupted,
                        "password prompt cancelled",
                    ));
                }
                _ => {}
            }
        }
        self.term.write_line("")?;

        Ok(captured)
    }
}

impl PasswordPrompt for TerminalPrompt {
    fn read_password(&mut self, prompt: &str) -> io::Result<String> {
        match self.input_mode() {
            InputMode::Keys(keys) => self.read_keys(&keys, prompt),
            InputMode::Lines => MaskedLineReader::new(io::stdin().lock(), self.term.clone())
                .with_mask(self.mask)
                .read_masked(prompt),
            InputMode::Unavailable => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "cannot read a password without echo: no terminal output available",
            )),
        }
    }
}
