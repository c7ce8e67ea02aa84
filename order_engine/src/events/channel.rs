//! Simple stateless pub-sub event handler
//!
//! Components subscribe to engine events and react to them. The handler is stateless: it never sees the internal
//! state of the engine, only the event itself. Handlers can be async, and each event is handled on its own task, so
//! a slow handler does not hold up the channel.
//!
//! The order flow publishes with [`EventProducer::try_publish`], which never waits. A full or closed channel is
//! reported back to the caller instead.
use std::{
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicI64, Ordering},
        Arc,
    },
};

use log::*;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};

pub type Handler<E> = Arc<dyn Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventDispatchError {
    #[error("The event channel is full. The event was dropped.")]
    ChannelFull,
    #[error("The event handler has shut down. The event was dropped.")]
    ChannelClosed,
}

pub struct EventHandler<E: Send + Sync + 'static> {
    listener: mpsc::Receiver<E>,
    sender: mpsc::Sender<E>,
    handler: Handler<E>,
}

impl<E: Send + Sync + 'static> EventHandler<E> {
    pub fn new(buffer_size: usize, handler: Handler<E>) -> Self {
        let (sender, receiver) = mpsc::channel(buffer_size.max(1));
        Self { listener: receiver, sender, handler }
    }

    pub fn subscribe(&self) -> EventProducer<E> {
        EventProducer::new(self.sender.clone())
    }

    pub async fn start_handler(mut self) {
        debug!("📬️ Starting event handler");
        // drop the internal sender so that the handler shuts down when the last producer is dropped
        drop(self.sender);
        let jobs = Arc::new(AtomicI64::new(0));
        while let Some(ev) = self.listener.recv().await {
            trace!("📬️ Handling event");
            let handler = Arc::clone(&self.handler);
            jobs.fetch_add(1, Ordering::SeqCst);
            let job = jobs.clone();
            tokio::spawn(async move {
                (handler)(ev).await;
                job.fetch_sub(1, Ordering::SeqCst);
                trace!("📬️ Event handled");
            });
        }
        while jobs.load(Ordering::SeqCst) > 0 {
            debug!("📬️ Waiting for {} jobs to complete", jobs.load(Ordering::SeqCst));
            tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
        }
        debug!("📬️ Event handler has shut down");
    }
}

#[derive(Clone)]
pub struct EventProducer<E: Send + Sync> {
    sender: mpsc::Sender<E>,
}

impl<E: Send + Sync> EventProducer<E> {
    pub fn new(sender: mpsc::Sender<E>) -> Self {
        Self { sender }
    }

    /// Waits for room in the channel. Only fails if the handler has gone away.
    pub async fn publish_event(&self, event: E) -> Result<(), EventDispatchError> {
        self.sender.send(event).await.map_err(|_| EventDispatchError::ChannelClosed)
    }

    /// Hands the event over without waiting.
    pub fn try_publish(&self, event: E) -> Result<(), EventDispatchError> {
        self.sender.try_send(event).map_err(|e| match e {
            TrySendError::Full(_) => EventDispatchError::ChannelFull,
            TrySendError::Closed(_) => EventDispatchError::ChannelClosed,
        })
    }
}
