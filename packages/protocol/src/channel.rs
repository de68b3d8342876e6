use crate::codec::{decode, encode};
use crate::error::ProtocolError;
use crate::messages::{EditorEvent, HostCommand};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};

/// Sending half. Messages are encoded to JSON before they leave.
pub struct Sender<T> {
    tx: UnboundedSender<String>,
    _marker: PhantomData<fn(T)>,
}

impl<T> Clone for Sender<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: Serialize> Sender<T> {
    pub fn send(&self, message: &T) -> Result<(), ProtocolError> {
        let raw = encode(message)?;
        self.send_raw(raw)
    }

    /// Push an already-encoded (possibly malformed) message
    pub fn send_raw(&self, raw: impl Into<String>) -> Result<(), ProtocolError> {
        self.tx.send(raw.into()).map_err(|_| ProtocolError::Closed)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiving half. Undecodable messages are skipped.
pub struct Receiver<T> {
    rx: UnboundedReceiver<String>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> Receiver<T> {
    /// Next decodable message; `None` once the other side is gone
    pub async fn recv(&mut self) -> Option<T> {
        loop {
            let raw = self.rx.recv().await?;
            if let Some(message) = decode(&raw) {
                return Some(message);
            }
        }
    }

    /// Next decodable message already queued, without waiting
    pub fn try_recv(&mut self) -> Option<T> {
        loop {
            match self.rx.try_recv() {
                Ok(raw) => {
                    if let Some(message) = decode(&raw) {
                        return Some(message);
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return None,
            }
        }
    }

    /// Everything currently queued
    pub fn drain(&mut self) -> Vec<T> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}

/// One side of a preview/host connection
pub struct Endpoint<Out, In> {
    pub sender: Sender<Out>,
    pub receiver: Receiver<In>,
}

pub type EditorEndpoint = Endpoint<EditorEvent, HostCommand>;
pub type HostEndpoint = Endpoint<HostCommand, EditorEvent>;

impl<Out: Serialize, In: DeserializeOwned> Endpoint<Out, In> {
    pub fn send(&self, message: &Out) -> Result<(), ProtocolError> {
        self.sender.send(message)
    }

    pub async fn recv(&mut self) -> Option<In> {
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> Option<In> {
        self.receiver.try_recv()
    }

    pub fn split(self) -> (Sender<Out>, Receiver<In>) {
        (self.sender, self.receiver)
    }
}

/// Connected editor and host endpoints
pub fn pair() -> (EditorEndpoint, HostEndpoint) {
    let (to_host, from_editor) = mpsc::unbounded_channel();
    let (to_editor, from_host) = mpsc::unbounded_channel();

    let editor = Endpoint {
        sender: Sender {
            tx: to_host,
            _marker: PhantomData,
        },
        receiver: Receiver {
            rx: from_host,
            _marker: PhantomData,
        },
    };
    let host = Endpoint {
        sender: Sender {
            tx: to_editor,
            _marker: PhantomData,
        },
        receiver: Receiver {
            rx: from_editor,
            _marker: PhantomData,
        },
    };
    (editor, host)
}
