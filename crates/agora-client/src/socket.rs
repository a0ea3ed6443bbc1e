use anyhow::{bail, Result};
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use agora_types::SocketFrame;

/// Long-lived subscription to the backend's chat/log socket.
///
/// Frames arrive on an internal channel; dropping the subscription (or
/// calling [`SocketSubscription::close`]) tears the connection down and
/// discards anything still in flight. There is no reconnect logic here:
/// the owning scope decides whether to resubscribe.
pub struct SocketSubscription {
    frames: mpsc::UnboundedReceiver<SocketFrame>,
    task: JoinHandle<()>,
}

impl SocketSubscription {
    /// Connects to the message socket for the named simulation instance.
    pub async fn connect(base_url: &str, sim_code: &str) -> Result<SocketSubscription> {
        let url = socket_url(base_url, sim_code)?;
        let (stream, _response) = connect_async(url.as_str()).await?;
        let (_write, mut read) = stream.split();

        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(async move {
            while let Some(message) = read.next().await {
                match message {
                    Ok(Message::Text(text)) => match SocketFrame::from_text(text.as_str()) {
                        Some(frame) => {
                            if tx.send(frame).is_err() {
                                break;
                            }
                        }
                        None => {
                            log::debug!("skipping undecodable socket frame: {text}");
                        }
                    },
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(err) => {
                        log::warn!("socket read failed: {err}");
                        break;
                    }
                }
            }
        });

        Ok(SocketSubscription { frames: rx, task })
    }

    /// Next decoded frame, or `None` once the connection is gone.
    pub async fn next(&mut self) -> Option<SocketFrame> {
        self.frames.recv().await
    }

    /// Tears the subscription down immediately.
    pub fn close(&mut self) {
        self.task.abort();
        self.frames.close();
    }
}

impl Drop for SocketSubscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Maps the backend's HTTP base URL onto its websocket endpoint.
fn socket_url(base_url: &str, sim_code: &str) -> Result<String> {
    let base = base_url.trim_end_matches('/');
    let ws_base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        bail!("Backend URL '{base_url}' has no http(s) scheme");
    };

    Ok(format!("{ws_base}/ws/message/{sim_code}"))
}
