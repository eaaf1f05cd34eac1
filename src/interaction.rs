use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::{CollectorError, Locator, Operator, Renderer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

/// Result of an interaction that is allowed to fail without ending the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    Done { attempts: u32 },
    Skipped { attempts: u32, reason: String },
}

impl Interaction {
    pub fn is_done(&self) -> bool {
        matches!(self, Interaction::Done { .. })
    }
}

/// Clicks `target`, retrying transient failures after a fixed delay.
///
/// Gives up with [`Interaction::Skipped`] once `policy.max_attempts` clicks
/// have failed; callers skip the unit of work and carry on. Session errors are
/// returned as `Err` straight away.
pub async fn click_with_retry<R: Renderer + ?Sized>(
    renderer: &mut R,
    target: &Locator,
    policy: RetryPolicy,
) -> Result<Interaction, CollectorError> {
    let max_attempts = policy.max_attempts.max(1);
    let mut last_error = String::new();

    for attempt in 1..=max_attempts {
        match renderer.click(target).await {
            Ok(()) => {
                debug!("Clicked {} on attempt {}", target, attempt);
                return Ok(Interaction::Done { attempts: attempt });
            }
            Err(e) if e.is_transient() => {
                warn!("Retry {}/{} for click on {}: {}", attempt, max_attempts, target, e);
                last_error = e.to_string();
                if attempt < max_attempts {
                    tokio::time::sleep(policy.delay).await;
                }
            }
            Err(e) => return Err(e),
        }
    }

    Ok(Interaction::Skipped {
        attempts: max_attempts,
        reason: last_error,
    })
}

/// Line-oriented terminal input shared by every prompt of a run.
///
/// One reader owns the buffered input, so lines typed (or piped) ahead of a
/// prompt are kept for the next one instead of being dropped with a
/// throwaway buffer.
pub struct Console<R = BufReader<Stdin>> {
    lines: Mutex<Lines<R>>,
}

impl Console {
    pub fn stdin() -> Self {
        Console::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin + Send> Console<R> {
    pub fn new(reader: R) -> Self {
        Console {
            lines: Mutex::new(reader.lines()),
        }
    }

    /// Prints `prompt` and returns the next line, trimmed.
    ///
    /// End of input is a [`CollectorError::Session`]: nobody is left to answer.
    pub async fn ask(&self, prompt: &str) -> Result<String, CollectorError> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(prompt.as_bytes()).await?;
        stdout.flush().await?;

        match self.lines.lock().await.next_line().await? {
            Some(line) => Ok(line.trim().to_string()),
            None => Err(CollectorError::Session(
                "standard input closed while waiting for an answer".to_string(),
            )),
        }
    }
}

/// Asks the person at the terminal to fix things, then waits for Enter.
pub struct ConsoleOperator<R = BufReader<Stdin>> {
    console: Arc<Console<R>>,
}

impl<R> ConsoleOperator<R> {
    pub fn new(console: Arc<Console<R>>) -> Self {
        ConsoleOperator { console }
    }
}

#[async_trait::async_trait]
impl<R: AsyncBufRead + Unpin + Send> Operator for ConsoleOperator<R> {
    async fn intervene(&self, reason: &str) -> Result<(), CollectorError> {
        warn!("Manual intervention needed: {}", reason);
        let prompt = format!(
            "{reason}\nResolve it in the browser window, then press Enter to continue..."
        );
        self.console.ask(&prompt).await?;
        Ok(())
    }
}
