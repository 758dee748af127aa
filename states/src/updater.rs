use std::any::{Any, TypeId, type_name};

use flume::{Receiver, Sender};

use crate::{Command, Compute};

pub(crate) enum Message {
    Set {
        id: TypeId,
        name: &'static str,
        value: Box<dyn Any + Send>,
    },
    Enqueue {
        id: TypeId,
        name: &'static str,
    },
}

/// Write handle given to commands.
///
/// Nothing sent here is visible until the store owner calls
/// [`StateCtx::sync_computes`](crate::StateCtx::sync_computes), which applies
/// messages in the order they were sent.
#[derive(Clone)]
pub struct Updater {
    send: Sender<Message>,
}

impl Updater {
    pub(crate) fn channel() -> (Self, Receiver<Message>) {
        let (send, recv) = flume::unbounded();
        (Self { send }, recv)
    }

    /// Replace the whole value of a compute.
    pub fn set<T: Compute>(&self, value: T) {
        let message = Message::Set {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            value: Box::new(value),
        };
        if self.send.send(message).is_err() {
            log::debug!("Store dropped before {} update arrived", type_name::<T>());
        }
    }

    /// Ask the store to run another command on its next flush.
    pub fn enqueue<C: Command>(&self) {
        let message = Message::Enqueue {
            id: TypeId::of::<C>(),
            name: type_name::<C>(),
        };
        if self.send.send(message).is_err() {
            log::debug!("Store dropped before {} could be enqueued", type_name::<C>());
        }
    }
}

impl std::fmt::Debug for Updater {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Updater")
            .field("pending", &self.send.len())
            .finish()
    }
}
