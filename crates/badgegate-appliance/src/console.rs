//! Operator console: input events typed (or piped) as text lines.
//!
//! ```text
//! card 04A1B2C3
//! key 1
//! key #
//! ```
//!
//! Blank lines and lines starting with `//` are skipped. Malformed lines are
//! logged and skipped; they never stop the console.

use badgegate_core::{InputEvent, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Parse one console line. `None` for lines that carry no event.
pub fn parse_line(line: &str) -> Option<Result<InputEvent>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with("//") {
        return None;
    }
    Some(line.parse())
}

/// Forward console lines into `events` until EOF, cancellation, or the
/// consumer going away. Returns the number of events forwarded.
pub async fn pump<R>(
    reader: R,
    events: mpsc::Sender<InputEvent>,
    cancel: CancellationToken,
) -> usize
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut forwarded = 0;

    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => break,
            line = lines.next_line() => line,
        };

        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => {
                debug!("Console reached end of input");
                break;
            }
            Err(e) => {
                warn!(error = %e, "Console read failed");
                break;
            }
        };

        let event = match parse_line(&line) {
            None => continue,
            Some(Ok(event)) => event,
            Some(Err(e)) => {
                warn!(line = %line.trim(), error = %e, "Ignoring console line");
                continue;
            }
        };

        if events.send(event).await.is_err() {
            info!("Event stream closed, console stopping");
            break;
        }
        forwarded += 1;
    }

    forwarded
}

#[cfg(test)]
mod tests {
    use super::*;
    use badgegate_core::{CardId, KeySymbol};
    use rstest::rstest;

    fn card(id: &str) -> InputEvent {
        InputEvent::card(CardId::new(id).unwrap())
    }

    fn key(symbol: KeySymbol) -> InputEvent {
        InputEvent::key(symbol)
    }

    #[rstest]
    #[case("card A1", card("A1"))]
    #[case("  key 7  ", key(KeySymbol::Digit(7)))]
    #[case("key #", key(KeySymbol::Submit))]
    #[case("key *", key(KeySymbol::Backspace))]
    fn test_parse_line(#[case] line: &str, #[case] expected: InputEvent) {
        assert_eq!(parse_line(line).unwrap().unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("// present the badge")]
    fn test_parse_line_skips_non_events(#[case] line: &str) {
        assert!(parse_line(line).is_none());
    }

    #[rstest]
    #[case("swipe A1")]
    #[case("card")]
    #[case("key")]
    fn test_parse_line_rejects_garbage(#[case] line: &str) {
        assert!(parse_line(line).unwrap().is_err());
    }

    #[tokio::test]
    async fn test_pump_forwards_in_order_and_skips_bad_lines() {
        let input = b"card A1\nkey 1\n\nbogus\n// comment\nkey 3\nkey #\n".as_slice();
        let (tx, mut rx) = mpsc::channel(16);

        let forwarded = pump(input, tx, CancellationToken::new()).await;

        assert_eq!(forwarded, 4);
        let mut received = Vec::new();
        while let Some(event) = rx.recv().await {
            received.push(event);
        }
        assert_eq!(
            received,
            vec![
                card("A1"),
                key(KeySymbol::Digit(1)),
                key(KeySymbol::Digit(3)),
                key(KeySymbol::Submit),
            ]
        );
    }

    #[tokio::test]
    async fn test_pump_stops_when_consumer_is_gone() {
        let input = b"card A1\nkey 1\n".as_slice();
        let (tx, rx) = mpsc::channel(16);
        drop(rx);

        assert_eq!(pump(input, tx, CancellationToken::new()).await, 0);
    }

    #[tokio::test]
    async fn test_pump_stops_on_cancel() {
        let (_writer, reader) = tokio::io::duplex(64);
        let (tx, _rx) = mpsc::channel(16);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let reader = tokio::io::BufReader::new(reader);
        assert_eq!(pump(reader, tx, cancel).await, 0);
    }
}
