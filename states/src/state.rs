use std::any::{Any, type_name};

/// A value owned by a [`StateCtx`](crate::StateCtx).
///
/// Plain states are inputs edited by the host through
/// [`StateCtx::update`](crate::StateCtx::update). Values that commands write
/// back implement [`Compute`](crate::Compute) as well.
pub trait State: Any + Send {
    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Clone of the value handed to commands.
    ///
    /// Returning `None` keeps the state out of every [`CommandSnapshot`](crate::CommandSnapshot).
    fn snapshot(&self) -> Option<Box<dyn Any + Send>> {
        None
    }

    fn assign_box(&mut self, new_self: Box<dyn Any + Send>);
}

/// Replaces `this` with the boxed value when the types line up.
pub fn state_assign_impl<T: State>(this: &mut T, new_self: Box<dyn Any + Send>) {
    match new_self.downcast::<T>() {
        Ok(value) => *this = *value,
        Err(_) => log::warn!("Ignoring assignment of mismatched type to {}", type_name::<T>()),
    }
}
