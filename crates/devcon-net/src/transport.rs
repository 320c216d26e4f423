use std::net::{Shutdown, SocketAddr, TcpListener};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use devcon_terminal::transport::Transport;
use devcon_terminal::writer::OutputStyle;
use devcon_types::config::NetworkConfig;
use devcon_types::error::Result;

use crate::server::{self, Shared, lock};

/// Console transport served over TCP.
///
/// A background thread owns the socket. The host drains submitted lines
/// with [`Transport::poll_input`] once per tick; output is buffered here and
/// flushed to the client when the line has been handled.
pub struct NetworkTransport {
    shared: Arc<Shared>,
    input: String,
    local_addr: SocketAddr,
    worker: Option<JoinHandle<()>>,
}

impl NetworkTransport {
    /// Bind the configured address and start the listener thread.
    ///
    /// Port 0 binds an ephemeral port; see [`local_addr`](Self::local_addr).
    pub fn start(config: &NetworkConfig) -> Result<Self> {
        let listener = TcpListener::bind(config.socket_addr())?;
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;

        let shared = Arc::new(Shared::new(config));
        let worker = thread::Builder::new()
            .name("devcon-net".to_string())
            .spawn({
                let shared = Arc::clone(&shared);
                move || server::run(listener, shared)
            })?;
        log::info!("Console server listening on {local_addr}");

        Ok(Self {
            shared,
            input: String::new(),
            local_addr,
            worker: Some(worker),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Whether the listener thread is still alive.
    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    /// Wait until the response to the last client line has been sent.
    ///
    /// Returns `false` if it is still pending after `timeout`.
    pub fn drain(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.shared.reply_pending() && self.is_running() {
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(1));
        }
        true
    }

    /// Stop the listener, drop the active client, and join the thread.
    /// Teardown errors are ignored.
    pub fn shutdown(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        self.shared.request_stop();
        if let Some(client) = lock(&self.shared.client).take() {
            let _ = client.shutdown(Shutdown::Both);
        }
        if worker.join().is_err() {
            log::warn!("Console server thread panicked");
        }
    }
}

impl Drop for NetworkTransport {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl Transport for NetworkTransport {
    fn input(&self) -> &str {
        &self.input
    }

    fn set_input(&mut self, text: &str) {
        self.input = text.to_string();
    }

    fn append_output(&mut self, text: &str) {
        self.shared.append_output(text);
    }

    fn clear_output(&mut self) {
        self.shared.clear_output();
    }

    fn style(&self) -> OutputStyle {
        OutputStyle::Plain
    }

    fn poll_input(&mut self) -> Option<String> {
        self.shared.pop_line()
    }

    fn input_handled(&mut self) {
        self.shared.finish_line();
    }
}
