use crate::State;

/// A state written only by commands through an [`Updater`](crate::Updater).
///
/// Observers registered with [`StateCtx::observe`](crate::StateCtx::observe)
/// see every value applied to a compute, in order.
pub trait Compute: State + Clone {}
