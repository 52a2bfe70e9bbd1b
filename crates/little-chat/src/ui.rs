use std::io::Write as _;
use std::pin::pin;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{
    self, AsyncBufRead, AsyncBufReadExt, AsyncReadExt, BufReader, Lines, Stdin,
};
use tokio::select;
use tokio::time::sleep;

pub const BAR_CHAR: &str = "▎";

const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Drives `fut` to completion while showing a spinner with `message`.
///
/// The spinner is cleared before returning, so the caller can print right
/// away.
pub async fn with_spinner<F: Future>(
    message: &'static str,
    fut: F,
) -> F::Output {
    let progress_bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {wide_msg}") {
        progress_bar.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    progress_bar.set_message(message);

    let mut fut = pin!(fut);
    let output = loop {
        progress_bar.inc(1);
        select! {
            output = &mut fut => break output,
            _ = sleep(TICK_INTERVAL) => {}
        }
    };

    progress_bar.finish_and_clear();
    output
}

/// Prints the input prompt.
pub fn prompt() {
    print!("> ");
    flush();
}

pub fn flush() {
    if let Err(err) = std::io::stdout().flush() {
        warn!("failed to flush stdout: {err}");
    }
}

/// Reads input line by line.
///
/// The same reader must be kept for the whole session, since it buffers
/// ahead of the line it returns.
pub struct LineReader<R> {
    lines: Lines<R>,
}

impl LineReader<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin> LineReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }

    /// Reads the next line without its line ending. Returns `None` at the
    /// end of input.
    pub async fn read_line(&mut self) -> Option<String> {
        match self.lines.next_line().await {
            Ok(line) => line,
            Err(err) => {
                error!("error reading input: {err}");
                None
            }
        }
    }
}

/// Reads the whole stdin.
pub async fn read_to_end() -> Option<String> {
    let mut text = String::new();
    match io::stdin().read_to_string(&mut text).await {
        Ok(_) => Some(text),
        Err(err) => {
            error!("error reading input: {err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_line_reader_keeps_buffered_lines() {
        let input: &[u8] = b"first\nsecond\r\n\nlast";
        let mut reader = LineReader::new(input);
        assert_eq!(reader.read_line().await.as_deref(), Some("first"));
        assert_eq!(reader.read_line().await.as_deref(), Some("second"));
        assert_eq!(reader.read_line().await.as_deref(), Some(""));
        assert_eq!(reader.read_line().await.as_deref(), Some("last"));
        assert_eq!(reader.read_line().await, None);
    }
}
