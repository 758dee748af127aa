use std::any::{Any, TypeId, type_name};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use flume::Receiver;
use tokio::task::{self, AbortHandle, JoinSet};

use crate::updater::Message;
use crate::{Command, CommandSnapshot, Compute, State, Updater};

type Observer = Box<dyn FnMut(&dyn Any) -> bool + Send>;

struct Slot {
    name: &'static str,
    value: Box<dyn State>,
}

struct RunningCommand {
    id: TypeId,
    handle: AbortHandle,
}

struct RegisteredCommand {
    name: &'static str,
    command: Arc<dyn Command>,
}

/// Owner of every state, compute and command of one client session.
///
/// The store is single-writer: commands run on spawned tasks and only talk
/// back through [`Updater`] messages, which [`StateCtx::sync_computes`]
/// applies on the owner's thread. A command type never runs twice at once;
/// enqueuing it while a previous run is still in flight drops the request.
/// A run that has already returned does not block the next one, even before
/// the owner joins it.
pub struct StateCtx {
    storage: BTreeMap<TypeId, Slot>,
    commands: BTreeMap<TypeId, RegisteredCommand>,
    queue: Vec<TypeId>,

    tasks: JoinSet<()>,
    running: HashMap<task::Id, RunningCommand>,

    updater: Updater,
    recv: Receiver<Message>,

    observers: BTreeMap<TypeId, Vec<Observer>>,
}

impl Default for StateCtx {
    fn default() -> Self {
        Self::new()
    }
}

impl StateCtx {
    pub fn new() -> Self {
        let (updater, recv) = Updater::channel();
        Self {
            storage: BTreeMap::new(),
            commands: BTreeMap::new(),
            queue: Vec::new(),
            tasks: JoinSet::new(),
            running: HashMap::new(),
            updater,
            recv,
            observers: BTreeMap::new(),
        }
    }

    pub fn add_state<T: State>(&mut self, state: T) {
        self.insert_slot(state);
    }

    pub fn record_compute<T: Compute>(&mut self, compute: T) {
        self.insert_slot(compute);
    }

    pub fn record_command<C: Command>(&mut self, command: C) {
        self.commands.insert(
            TypeId::of::<C>(),
            RegisteredCommand {
                name: type_name::<C>(),
                command: Arc::new(command),
            },
        );
    }

    fn insert_slot<T: State>(&mut self, value: T) {
        let name = type_name::<T>();
        if self
            .storage
            .insert(
                TypeId::of::<T>(),
                Slot {
                    name,
                    value: Box::new(value),
                },
            )
            .is_some()
        {
            log::warn!("{name} registered twice; the later value wins");
        }
    }

    pub fn try_state<T: State>(&self) -> Option<&T> {
        self.storage
            .get(&TypeId::of::<T>())
            .and_then(|slot| slot.value.as_any().downcast_ref::<T>())
    }

    /// # Panics
    /// Panics if `T` was never registered.
    pub fn state<T: State>(&self) -> &T {
        self.try_state::<T>()
            .unwrap_or_else(|| panic!("State {} is not registered", type_name::<T>()))
    }

    /// # Panics
    /// Panics if `T` was never registered.
    pub fn compute<T: Compute>(&self) -> &T {
        self.try_state::<T>()
            .unwrap_or_else(|| panic!("Compute {} is not registered", type_name::<T>()))
    }

    /// Edit a state in place from the owner's thread.
    ///
    /// # Panics
    /// Panics if `T` was never registered.
    pub fn update<T: State>(&mut self, f: impl FnOnce(&mut T)) {
        let id = TypeId::of::<T>();
        let Some(slot) = self.storage.get_mut(&id) else {
            panic!("State {} is not registered", type_name::<T>());
        };
        if let Some(value) = slot.value.as_any_mut().downcast_mut::<T>() {
            f(value);
        }
        self.notify(id);
    }

    pub fn updater(&self) -> Updater {
        self.updater.clone()
    }

    /// Subscribe to every value applied to `T` from now on.
    ///
    /// The receiver yields clones in application order. Dropping it
    /// unsubscribes on the next update.
    pub fn observe<T: Compute>(&mut self) -> Receiver<T> {
        let (send, recv) = flume::unbounded();
        let observer: Observer = Box::new(move |value: &dyn Any| match value.downcast_ref::<T>() {
            Some(value) => send.send(value.clone()).is_ok(),
            None => true,
        });
        self.observers
            .entry(TypeId::of::<T>())
            .or_default()
            .push(observer);
        recv
    }

    fn notify(&mut self, id: TypeId) {
        let (Some(slot), Some(observers)) = (self.storage.get(&id), self.observers.get_mut(&id))
        else {
            return;
        };
        observers.retain_mut(|observer| observer(slot.value.as_any()));
    }

    pub fn enqueue_command<C: Command>(&mut self) {
        self.queue.push(TypeId::of::<C>());
    }

    pub fn has_pending_commands(&self) -> bool {
        !self.queue.is_empty()
    }

    fn is_running(&self, id: TypeId) -> bool {
        self.running
            .values()
            .any(|running| running.id == id && !running.handle.is_finished())
    }

    fn snapshot(&self) -> CommandSnapshot {
        let mut snap = CommandSnapshot::new();
        for (id, slot) in &self.storage {
            if let Some(cloned) = slot.value.snapshot() {
                snap.insert_cloned(*id, cloned);
            }
        }
        snap
    }

    /// Spawn every queued command onto the task set.
    ///
    /// Must be called from inside a Tokio runtime.
    pub fn flush_commands(&mut self) {
        let queue = std::mem::take(&mut self.queue);
        for id in queue {
            let Some(registered) = self.commands.get(&id) else {
                log::error!("Enqueued command {id:?} was never recorded; dropping it");
                continue;
            };
            let name = registered.name;
            if self.is_running(id) {
                log::warn!("{name} is still running; dropping the new request");
                continue;
            }

            let command = Arc::clone(&registered.command);
            let future = command.run(self.snapshot(), self.updater());
            let handle = self.tasks.spawn(future);
            log::debug!("Spawned {name} as task {}", handle.id());
            self.running.insert(handle.id(), RunningCommand { id, handle });
        }
    }

    /// Apply every pending [`Updater`] message in send order.
    pub fn sync_computes(&mut self) {
        let messages: Vec<Message> = self.recv.try_iter().collect();
        for message in messages {
            match message {
                Message::Set { id, name, value } => match self.storage.get_mut(&id) {
                    Some(slot) => {
                        slot.value.assign_box(value);
                        self.notify(id);
                    }
                    None => log::warn!("Dropping update for unregistered compute {name}"),
                },
                Message::Enqueue { id, name } => {
                    log::debug!("Queueing follow-up command {name}");
                    self.queue.push(id);
                }
            }
        }
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Wait for the next command task to finish.
    ///
    /// Returns `false` when no task was running.
    pub async fn join_next_task(&mut self) -> bool {
        match self.tasks.join_next_with_id().await {
            Some(Ok((task_id, ()))) => {
                self.running.remove(&task_id);
                true
            }
            Some(Err(err)) => {
                let name = self
                    .running
                    .remove(&err.id())
                    .and_then(|running| self.commands.get(&running.id))
                    .map_or("<unknown>", |registered| registered.name);
                log::error!("Command {name} did not finish: {err}");
                true
            }
            None => false,
        }
    }

    /// Abort every running command and drop queued ones.
    pub async fn shutdown(&mut self) {
        self.queue.clear();
        self.tasks.shutdown().await;
        self.running.clear();
    }

    /// Names of the registered states and computes, for diagnostics.
    pub fn registered(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.storage.values().map(|slot| slot.name)
    }
}

impl std::fmt::Debug for StateCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateCtx")
            .field("states", &self.storage.len())
            .field("commands", &self.commands.len())
            .field("queued", &self.queue.len())
            .field(
                "running",
                &self
                    .running
                    .values()
                    .filter(|running| !running.handle.is_finished())
                    .count(),
            )
            .finish()
    }
}
