//! Single-writer state store for examscan clients.
//!
//! States are host-edited inputs, computes are values commands write back,
//! and commands are async jobs spawned with a snapshot of both. All writes
//! from commands travel through an [`Updater`] channel and are applied by the
//! store owner, so observers always see a consistent sequence of values.

mod command;
mod compute;
mod ctx;
mod snapshot;
mod state;
mod updater;

pub use command::{Command, CommandFuture};
pub use compute::Compute;
pub use ctx::StateCtx;
pub use snapshot::CommandSnapshot;
pub use state::{State, state_assign_impl};
pub use updater::Updater;
