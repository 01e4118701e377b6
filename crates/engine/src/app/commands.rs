use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use thiserror::Error;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("command queue closed")]
pub struct CommandQueueClosed;

pub fn command_channel<C>() -> (CommandSender<C>, CommandQueue<C>) {
    let (sender, receiver) = mpsc::channel();
    (
        CommandSender { sender },
        CommandQueue {
            receiver,
            disconnect_logged: false,
        },
    )
}

/// Producer side, held by whatever feeds the loop (usually the network layer).
#[derive(Debug)]
pub struct CommandSender<C> {
    sender: Sender<C>,
}

impl<C> Clone for CommandSender<C> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<C> CommandSender<C> {
    pub fn send(&self, command: C) -> Result<(), CommandQueueClosed> {
        self.sender.send(command).map_err(|_| CommandQueueClosed)
    }
}

#[derive(Debug)]
pub struct CommandQueue<C> {
    receiver: Receiver<C>,
    disconnect_logged: bool,
}

impl<C> CommandQueue<C> {
    /// Never blocks.
    pub fn try_next(&mut self) -> Option<C> {
        match self.receiver.try_recv() {
            Ok(command) => Some(command),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                if !self.disconnect_logged {
                    self.disconnect_logged = true;
                    info!("command_queue_disconnected");
                }
                None
            }
        }
    }
}
