use std::future::Future;
use std::pin::Pin;

use crate::{CommandSnapshot, Updater};

pub type CommandFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// An async unit of work dispatched through [`StateCtx::enqueue_command`](crate::StateCtx::enqueue_command).
///
/// `run` is called synchronously on the store owner's thread; everything it
/// needs must be cloned out of the snapshot before the returned future is
/// built. Results flow back only through the `updater`.
pub trait Command: Send + Sync + 'static {
    fn run(&self, snap: CommandSnapshot, updater: Updater) -> CommandFuture;
}
