// src/dispatch/runner.rs
// =============================================================================
// Reads URLs line by line and checks all of them at the same time.
//
// How it works:
// 1. Read a line (any bytes, decoded lossily) and trim it
// 2. Not a URL? Write "<line> invalid URL" right away
// 3. Otherwise spawn a task that probes it and writes "<line> <result>"
// 4. At end of input, wait for every spawned task before returning
//
// There is no cap on how many tasks run at once unless the caller asks for
// one with `with_max_concurrent`. Lines come out in the order probes finish,
// not the order they were read.
//
// Rust concepts:
// - tokio::spawn: Starts a task that runs alongside the others
// - Arc<T>: Lets many tasks share the same Sink
// - FuturesUnordered: A set of futures we can drain as they finish
// =============================================================================

use crate::checker::{is_valid_url, ProbeResult, Prober, TransportOptions};
use crate::dispatch::sink::Sink;
use crate::error::CheckError;
use futures::stream::{FuturesUnordered, StreamExt};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

// How result lines are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// `<line> <result>`
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

impl OutputFormat {
    pub fn render(self, result: &ProbeResult) -> String {
        match self {
            OutputFormat::Text => result.to_line(),
            OutputFormat::Json => {
                serde_json::to_string(result).unwrap_or_else(|_| result.to_line())
            }
        }
    }
}

// What happened during one run
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// Lines read from the input
    pub lines: usize,
    /// Lines rejected as invalid URLs
    pub invalid: usize,
    /// Probes spawned
    pub launched: usize,
    /// Probes that ran to the end and wrote their result
    pub completed: usize,
    /// Probe tasks that panicked
    pub failed_tasks: usize,
    /// Set when reading the input failed part way through
    pub read_error: Option<CheckError>,
}

#[derive(Debug, Clone)]
pub struct Dispatcher {
    prober: Prober,
    format: OutputFormat,
    limit: Option<Arc<Semaphore>>,
}

impl Dispatcher {
    /// Builds the shared HTTP client once for the whole run
    pub fn new(opts: &TransportOptions) -> reqwest::Result<Self> {
        Ok(Self {
            prober: Prober::new(opts)?,
            format: OutputFormat::default(),
            limit: None,
        })
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Caps how many probes may be talking to the network at once.
    /// `None` (or zero) means no cap.
    pub fn with_max_concurrent(mut self, max: Option<usize>) -> Self {
        self.limit = max
            .filter(|n| *n > 0)
            .map(|n| Arc::new(Semaphore::new(n)));
        self
    }

    // Processes every line of `input` and returns once all results are
    // written. A read error stops reading but not the probes already running.
    pub async fn run<R, W>(&self, input: R, sink: Arc<Sink<W>>) -> DispatchReport
    where
        R: AsyncBufRead + Unpin,
        W: Write + Send + 'static,
    {
        let mut report = DispatchReport::default();
        let mut in_flight = FuturesUnordered::new();
        // Split on raw bytes: a line that isn't UTF-8 is still a line
        let mut lines = input.split(b'\n');

        loop {
            let line = match lines.next_segment().await {
                Ok(Some(bytes)) => decode_line(&bytes),
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "stopped reading input");
                    report.read_error = Some(CheckError::InputRead(e));
                    break;
                }
            };
            report.lines += 1;

            if !is_valid_url(&line) {
                report.invalid += 1;
                emit(&sink, self.format, &ProbeResult::invalid(line));
                continue;
            }

            debug!(url = %line, "launching probe");
            report.launched += 1;

            let prober = self.prober.clone();
            let sink = Arc::clone(&sink);
            let format = self.format;
            let limit = self.limit.clone();

            in_flight.push(tokio::spawn(async move {
                let _permit = match limit {
                    Some(limit) => limit.acquire_owned().await.ok(),
                    None => None,
                };
                let result = prober.check(&line).await;
                emit(&sink, format, &result);
            }));
        }

        // Wait for every probe, including ones still sitting out a timeout
        while let Some(joined) = in_flight.next().await {
            match joined {
                Ok(()) => report.completed += 1,
                Err(e) => {
                    warn!(error = %e, "probe task failed");
                    report.failed_tasks += 1;
                }
            }
        }

        info!(
            lines = report.lines,
            invalid = report.invalid,
            launched = report.launched,
            "all probes finished"
        );
        report
    }
}

// Checks every line of `input` with `opts` and writes results to `output`.
//
// Convenience wrapper: plain text output, unbounded concurrency.
pub async fn dispatch_all<R, W>(
    input: R,
    output: W,
    opts: &TransportOptions,
) -> Result<DispatchReport, CheckError>
where
    R: AsyncBufRead + Unpin,
    W: Write + Send + 'static,
{
    let dispatcher = Dispatcher::new(opts).map_err(|e| CheckError::Transport(e.to_string()))?;
    let sink = Arc::new(Sink::new(output));
    Ok(dispatcher.run(input, sink).await)
}

// Lossy UTF-8 decode, without the "\r" of a CRLF ending, trimmed
fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r".as_slice()).unwrap_or(bytes);
    String::from_utf8_lossy(bytes).trim().to_string()
}

// A failed write (closed pipe, full disk) is logged and the run goes on
fn emit<W: Write>(sink: &Sink<W>, format: OutputFormat, result: &ProbeResult) {
    if let Err(e) = sink.write_line(&format.render(result)) {
        warn!(url = %result.source_line, error = %e, "failed to write result");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;
    use std::io;
    use std::pin::Pin;
    use std::sync::Mutex;
    use std::task::{Context, Poll};
    use std::time::Duration;
    use tokio::io::{AsyncRead, BufReader, ReadBuf};

    // A writer tests can keep a handle to after giving it away
    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl SharedBuf {
        fn lines(&self) -> Vec<String> {
            let bytes = self.0.lock().unwrap();
            String::from_utf8(bytes.clone())
                .unwrap()
                .lines()
                .map(str::to_string)
                .collect()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn opts(timeout_secs: u64) -> TransportOptions {
        TransportOptions {
            timeout: Duration::from_secs(timeout_secs),
            ..TransportOptions::default()
        }
    }

    #[tokio::test]
    async fn test_invalid_lines_make_no_requests() {
        let out = SharedBuf::default();
        let report = dispatch_all("not a url\n\n".as_bytes(), out.clone(), &opts(5))
            .await
            .unwrap();

        assert_eq!(report.lines, 2);
        assert_eq!(report.invalid, 2);
        assert_eq!(report.launched, 0);
        assert_eq!(out.lines(), vec!["not a url invalid URL", " invalid URL"]);
    }

    #[tokio::test]
    async fn test_one_output_line_per_input_line() {
        let addr = testutil::serve(|_| testutil::response("200 OK", "", "ok")).await;
        let url = format!("http://{}/", addr);
        let input = format!("{url}\n  {url}a  \nnot a url\n{url}b\n", url = url);

        let out = SharedBuf::default();
        let report = dispatch_all(input.as_bytes(), out.clone(), &opts(5))
            .await
            .unwrap();

        assert_eq!(report.lines, 4);
        assert_eq!(report.launched, 3);
        assert_eq!(report.completed, 3);

        let mut lines = out.lines();
        lines.sort();
        let mut expected = vec![
            format!("{} UP 200 OK", url),
            format!("{}a UP 200 OK", url),
            format!("{}b UP 200 OK", url),
            "not a url invalid URL".to_string(),
        ];
        expected.sort();
        assert_eq!(lines, expected);
    }

    #[tokio::test]
    async fn test_waits_for_slow_probes() {
        let fast = testutil::serve(|_| testutil::response("200 OK", "", "")).await;
        let slow = testutil::serve_silent(Duration::from_secs(5)).await;
        let input = format!("http://{}/\nhttp://{}/\n", slow, fast);

        let out = SharedBuf::default();
        let report = dispatch_all(input.as_bytes(), out.clone(), &opts(1))
            .await
            .unwrap();

        assert_eq!(report.completed, 2);
        let lines = out.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines.contains(&format!("http://{}/ DOWN timeout after 1s", slow)));
        assert!(lines.contains(&format!("http://{}/ UP 200 OK", fast)));
    }

    // Hands out `data` once, then fails like a broken pipe
    struct FailingReader {
        data: Vec<u8>,
        sent: bool,
    }

    impl AsyncRead for FailingReader {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            if self.sent {
                return Poll::Ready(Err(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "input went away",
                )));
            }
            self.sent = true;
            buf.put_slice(&self.data);
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_read_error_stops_scanning() {
        let reader = FailingReader {
            data: b"not a url\nhalf a li".to_vec(),
            sent: false,
        };

        let out = SharedBuf::default();
        let report = dispatch_all(BufReader::new(reader), out.clone(), &opts(5))
            .await
            .unwrap();

        assert_eq!(report.lines, 1);
        assert!(matches!(report.read_error, Some(CheckError::InputRead(_))));
        assert_eq!(out.lines(), vec!["not a url invalid URL"]);
    }

    #[tokio::test]
    async fn test_non_utf8_line_is_just_an_invalid_line() {
        let input = b"not a url\ncaf\xe9\r\nalso not a url\nthird bad".to_vec();

        let out = SharedBuf::default();
        let report = dispatch_all(input.as_slice(), out.clone(), &opts(5))
            .await
            .unwrap();

        assert_eq!(report.lines, 4);
        assert!(report.read_error.is_none());
        assert_eq!(
            out.lines(),
            vec![
                "not a url invalid URL",
                "caf\u{FFFD} invalid URL",
                "also not a url invalid URL",
                "third bad invalid URL",
            ]
        );
    }

    #[tokio::test]
    async fn test_bounded_concurrency_still_checks_everything() {
        let addr = testutil::serve(|_| testutil::response("204 No Content", "", "")).await;
        let input: String = (0..10)
            .map(|i| format!("http://{}/{}\n", addr, i))
            .collect();

        let out = SharedBuf::default();
        let dispatcher = Dispatcher::new(&opts(5))
            .unwrap()
            .with_max_concurrent(Some(2));
        let report = dispatcher
            .run(input.as_bytes(), Arc::new(Sink::new(out.clone())))
            .await;

        assert_eq!(report.completed, 10);
        let lines = out.lines();
        assert_eq!(lines.len(), 10);
        assert!(lines.iter().all(|l| l.ends_with(" UP 204 No Content")));
    }

    #[tokio::test]
    async fn test_json_output() {
        let out = SharedBuf::default();
        let dispatcher = Dispatcher::new(&opts(5))
            .unwrap()
            .with_format(OutputFormat::Json);
        dispatcher
            .run("bogus\n".as_bytes(), Arc::new(Sink::new(out.clone())))
            .await;

        let lines = out.lines();
        assert_eq!(lines.len(), 1);
        let value: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(value["url"], "bogus");
        assert_eq!(value["outcome"], "invalid");
        assert_eq!(value["result"], "invalid URL");
    }
}
