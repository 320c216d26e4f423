//! Listener thread: accepts one client at a time and relays its lines.
//!
//! Each line read from the client is queued for the host tick, and the
//! thread then waits until the console has drained and executed it before
//! flushing the accumulated output back. One command is in flight at a time.

use std::collections::VecDeque;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use devcon_types::config::NetworkConfig;

/// Ends a session.
const EXIT_COMMAND: &str = "exit";

/// Terminates every response.
const END_OF_RESPONSE: u8 = 0;

/// Prefix of echoed input lines, never sent to the client.
const ECHO_PREFIX: &str = "> ";

const LINE_TOO_LONG: &str = "#>>xInput line too long.";

/// Lock a mutex, recovering the data if a holder panicked.
pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default)]
struct Inbound {
    queue: VecDeque<String>,
    in_flight: bool,
    /// A line was taken from the client and its response is not sent yet.
    reply_pending: bool,
}

/// State shared between the listener thread and the host tick.
pub(crate) struct Shared {
    inbound: Mutex<Inbound>,
    outbound: Mutex<String>,
    stop: AtomicBool,
    /// Clone of the active client socket, for forced shutdown.
    pub(crate) client: Mutex<Option<TcpStream>>,
    poll_interval: Duration,
    max_line_len: usize,
}

impl Shared {
    pub(crate) fn new(config: &NetworkConfig) -> Self {
        Self {
            inbound: Mutex::new(Inbound::default()),
            outbound: Mutex::new(String::new()),
            stop: AtomicBool::new(false),
            client: Mutex::new(None),
            poll_interval: Duration::from_millis(config.poll_interval_ms.max(1)),
            max_line_len: config.max_line_len.max(1),
        }
    }

    pub(crate) fn push_line(&self, line: String) {
        let mut inbound = lock(&self.inbound);
        inbound.queue.push_back(line);
        inbound.reply_pending = true;
    }

    /// Dequeue the next line and mark it in flight.
    pub(crate) fn pop_line(&self) -> Option<String> {
        let mut inbound = lock(&self.inbound);
        let line = inbound.queue.pop_front()?;
        inbound.in_flight = true;
        Some(line)
    }

    pub(crate) fn finish_line(&self) {
        lock(&self.inbound).in_flight = false;
    }

    /// Nothing queued and nothing executing.
    pub(crate) fn is_idle(&self) -> bool {
        let inbound = lock(&self.inbound);
        inbound.queue.is_empty() && !inbound.in_flight
    }

    pub(crate) fn reply_sent(&self) {
        lock(&self.inbound).reply_pending = false;
    }

    pub(crate) fn reply_pending(&self) -> bool {
        lock(&self.inbound).reply_pending
    }

    pub(crate) fn append_output(&self, text: &str) {
        lock(&self.outbound).push_str(text);
    }

    pub(crate) fn clear_output(&self) {
        lock(&self.outbound).clear();
    }

    /// Read and clear the outbound buffer in one step.
    pub(crate) fn take_output(&self) -> String {
        std::mem::take(&mut *lock(&self.outbound))
    }

    pub(crate) fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub(crate) fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }
}

/// Accept loop. Runs until a stop is requested.
///
/// The listener must be non-blocking so the stop flag is observed between
/// accept attempts.
pub(crate) fn run(listener: TcpListener, shared: Arc<Shared>) {
    while !shared.stop_requested() {
        match listener.accept() {
            Ok((stream, peer)) => {
                log::info!("Console client connected from {peer}");
                if let Err(e) = serve(stream, &shared) {
                    log::debug!("Session with {peer} failed: {e}");
                }
                lock(&shared.client).take();
                shared.reply_sent();
                log::info!("Console client {peer} disconnected");
            },
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => thread::sleep(shared.poll_interval),
            Err(e) => {
                log::warn!("Console accept error: {e}");
                thread::sleep(shared.poll_interval);
            },
        }
    }
    log::info!("Console server stopped");
}

enum Line {
    Text(String),
    TooLong,
}

fn serve(stream: TcpStream, shared: &Shared) -> io::Result<()> {
    stream.set_nonblocking(false)?;
    *lock(&shared.client) = Some(stream.try_clone()?);
    if shared.stop_requested() {
        return Ok(());
    }

    let mut writer = stream.try_clone()?;
    let mut reader = BufReader::new(stream);
    flush_output(&mut writer, shared)?;

    while !shared.stop_requested() && !client_gone(&reader) {
        let line = match read_line(&mut reader, shared.max_line_len)? {
            Some(Line::Text(line)) => line,
            Some(Line::TooLong) => {
                log::debug!("Discarded input line over {} bytes", shared.max_line_len);
                shared.append_output(&format!("{LINE_TOO_LONG}\n"));
                flush_output(&mut writer, shared)?;
                continue;
            },
            None => break,
        };

        if line == EXIT_COMMAND {
            break;
        }
        log::debug!("<- {line}");
        shared.push_line(line);
        wait_for_execution(shared);
        flush_output(&mut writer, shared)?;
        shared.reply_sent();
    }
    Ok(())
}

/// Non-blocking peek on the socket. Buffered input means still connected.
fn client_gone(reader: &BufReader<TcpStream>) -> bool {
    if !reader.buffer().is_empty() {
        return false;
    }
    let stream = reader.get_ref();
    if stream.set_nonblocking(true).is_err() {
        return true;
    }
    let mut peeked = [0u8; 1];
    let gone = match stream.peek(&mut peeked) {
        Ok(0) => true,
        Ok(_) => false,
        Err(e) => e.kind() != io::ErrorKind::WouldBlock,
    };
    stream.set_nonblocking(false).is_err() || gone
}

/// Read one newline-terminated line of at most `max` bytes.
///
/// Returns `None` at end of stream. A longer line is consumed up to its
/// newline and reported as [`Line::TooLong`].
fn read_line<R: BufRead>(reader: &mut R, max: usize) -> io::Result<Option<Line>> {
    let mut buf = Vec::new();
    // Room for the limit plus a CRLF terminator.
    let n = reader.by_ref().take(max as u64 + 2).read_until(b'\n', &mut buf)?;
    if n == 0 {
        return Ok(None);
    }
    let terminated = buf.last() == Some(&b'\n');
    if terminated {
        buf.pop();
    }
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }
    if buf.len() > max {
        if !terminated {
            discard_line(reader)?;
        }
        return Ok(Some(Line::TooLong));
    }
    let text = String::from_utf8_lossy(&buf);
    Ok(Some(Line::Text(text.trim().to_string())))
}

fn discard_line<R: BufRead>(reader: &mut R) -> io::Result<()> {
    loop {
        let available = reader.fill_buf()?;
        if available.is_empty() {
            return Ok(());
        }
        match available.iter().position(|&b| b == b'\n') {
            Some(i) => {
                reader.consume(i + 1);
                return Ok(());
            },
            None => {
                let len = available.len();
                reader.consume(len);
            },
        }
    }
}

/// Sleep until the host tick has run the queued line.
fn wait_for_execution(shared: &Shared) {
    while !shared.is_idle() && !shared.stop_requested() {
        thread::sleep(shared.poll_interval);
    }
}

/// Send the outbound buffer as protocol lines followed by the terminator.
///
/// Blank lines and echoed input are dropped.
fn flush_output<W: Write>(writer: &mut W, shared: &Shared) -> io::Result<()> {
    let text = shared.take_output();
    let mut payload = Vec::with_capacity(text.len() + 1);
    for line in text
        .split('\n')
        .filter(|l| !l.trim().is_empty() && !l.starts_with(ECHO_PREFIX))
    {
        log::debug!("-> {line}");
        payload.extend_from_slice(line.as_bytes());
        payload.push(b'\n');
    }
    payload.push(END_OF_RESPONSE);
    writer.write_all(&payload)?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn shared() -> Shared {
        Shared::new(&NetworkConfig::default())
    }

    #[test]
    fn in_flight_until_finished() {
        let s = shared();
        assert!(s.is_idle());
        s.push_line("help".into());
        assert!(!s.is_idle());
        assert_eq!(s.pop_line().as_deref(), Some("help"));
        assert!(!s.is_idle());
        s.finish_line();
        assert!(s.is_idle());
        assert!(s.pop_line().is_none());
    }

    #[test]
    fn reply_pending_until_sent() {
        let s = shared();
        assert!(!s.reply_pending());
        s.push_line("quit".into());
        s.pop_line();
        s.finish_line();
        assert!(s.is_idle());
        assert!(s.reply_pending());
        s.reply_sent();
        assert!(!s.reply_pending());
    }

    #[test]
    fn queue_is_fifo() {
        let s = shared();
        s.push_line("a".into());
        s.push_line("b".into());
        assert_eq!(s.pop_line().as_deref(), Some("a"));
        assert_eq!(s.pop_line().as_deref(), Some("b"));
    }

    #[test]
    fn flush_filters_echo_and_blank_lines() {
        let s = shared();
        s.append_output("> help\n\n'Available commands': help\n#>>xboom\n   \n");
        let mut sent = Vec::new();
        flush_output(&mut sent, &s).unwrap();
        assert_eq!(sent, b"'Available commands': help\n#>>xboom\n\0");
        assert_eq!(s.take_output(), "");
    }

    #[test]
    fn flush_of_empty_buffer_is_terminator_only() {
        let s = shared();
        let mut sent = Vec::new();
        flush_output(&mut sent, &s).unwrap();
        assert_eq!(sent, b"\0");
    }

    #[test]
    fn read_line_trims_line_endings() {
        let mut input = Cursor::new(b"help\r\nchelp quit\n".to_vec());
        assert!(matches!(read_line(&mut input, 64).unwrap(), Some(Line::Text(l)) if l == "help"));
        assert!(matches!(read_line(&mut input, 64).unwrap(), Some(Line::Text(l)) if l == "chelp quit"));
        assert!(read_line(&mut input, 64).unwrap().is_none());
    }

    #[test]
    fn overlong_line_is_skipped_whole() {
        let mut input = Cursor::new(b"0123456789abcdef\nok\n".to_vec());
        assert!(matches!(read_line(&mut input, 8).unwrap(), Some(Line::TooLong)));
        assert!(matches!(read_line(&mut input, 8).unwrap(), Some(Line::Text(l)) if l == "ok"));
    }

    #[test]
    fn line_at_limit_is_accepted() {
        let mut input = Cursor::new(b"12345678\n".to_vec());
        assert!(matches!(read_line(&mut input, 8).unwrap(), Some(Line::Text(l)) if l == "12345678"));
    }

    #[test]
    fn crlf_line_at_limit_is_accepted() {
        let mut input = Cursor::new(b"12345678\r\n123456789\r\nok\r\n".to_vec());
        assert!(matches!(read_line(&mut input, 8).unwrap(), Some(Line::Text(l)) if l == "12345678"));
        assert!(matches!(read_line(&mut input, 8).unwrap(), Some(Line::TooLong)));
        assert!(matches!(read_line(&mut input, 8).unwrap(), Some(Line::Text(l)) if l == "ok"));
    }

    #[test]
    fn unterminated_final_line_is_kept() {
        let mut input = Cursor::new(b"quit".to_vec());
        assert!(matches!(read_line(&mut input, 8).unwrap(), Some(Line::Text(l)) if l == "quit"));
    }
}
