//! Inbound frame streaming.
//!
//! The socket subscription is the only externally-triggered mutation path
//! into the session: chat frames land in the public transcript or the named
//! agent's private one, log frames land in the log buffer. The service owns
//! the subscription for its lifetime; aborting the service's task drops the
//! subscription, which closes the socket, and anything still in flight is
//! discarded.

use agora_client::SocketSubscription;
use agora_types::ChatScope;
use agora_types::SocketFrame;
use anyhow::Result;
use tokio::task::JoinHandle;

use crate::errors::SessionError;
use crate::store::SessionStore;

#[cfg(test)]
#[path = "stream_test.rs"]
mod tests;

pub struct StreamService {}

impl StreamService {
    /// Consumes frames until the socket closes.
    pub async fn start(mut subscription: SocketSubscription, store: SessionStore) -> Result<()> {
        while let Some(frame) = subscription.next().await {
            if let Err(err) = StreamService::apply(&store, frame) {
                log::error!("Failed to record a streamed frame: {err:?}");
            }
        }

        return Ok(());
    }

    /// Runs the service on its own task. Aborting the handle is the
    /// deterministic teardown path on scope exit.
    pub fn spawn(subscription: SocketSubscription, store: SessionStore) -> JoinHandle<Result<()>> {
        return tokio::spawn(StreamService::start(subscription, store));
    }

    /// Folds one frame into the session via read-merge-write.
    pub fn apply(store: &SessionStore, frame: SocketFrame) -> Result<(), SessionError> {
        let mut session = store.read();

        match frame {
            SocketFrame::Chat(message) => match message.scope {
                ChatScope::Public => {
                    session.public_messages.push(message);
                }
                ChatScope::Private => {
                    let agent = message.sender.clone();
                    session.push_private_message(&agent, message);
                }
            },
            SocketFrame::Log(line) => {
                session.logs.push(line.render());
            }
        }

        return store.write(session);
    }
}
