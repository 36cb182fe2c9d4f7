use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Key returned by listener registration, used for removal.
    pub struct ListenerKey;
}

struct Entry<E> {
    callback: Box<dyn FnMut(&E)>,
    once: bool,
}

/// Listener registry for a single typed event stream.
///
/// Dispatch is synchronous and fire-and-forget: `emit` calls every registered
/// listener in turn before returning. Listeners registered with `once` are
/// removed after their first invocation.
pub struct EventEmitter<E> {
    listeners: SlotMap<ListenerKey, Entry<E>>,
}

impl<E> EventEmitter<E> {
    pub fn new() -> Self {
        Self {
            listeners: SlotMap::with_key(),
        }
    }

    /// Register a listener called on every emitted event.
    pub fn on<F>(&mut self, callback: F) -> ListenerKey
    where
        F: FnMut(&E) + 'static,
    {
        self.listeners.insert(Entry {
            callback: Box::new(callback),
            once: false,
        })
    }

    /// Register a listener removed after its first invocation.
    pub fn once<F>(&mut self, callback: F) -> ListenerKey
    where
        F: FnOnce(&E) + 'static,
    {
        let mut callback = Some(callback);
        self.listeners.insert(Entry {
            callback: Box::new(move |event| {
                if let Some(callback) = callback.take() {
                    callback(event);
                }
            }),
            once: true,
        })
    }

    /// Remove a listener. Returns false if the key was already gone.
    pub fn off(&mut self, key: ListenerKey) -> bool {
        self.listeners.remove(key).is_some()
    }

    pub fn emit(&mut self, event: &E) {
        // Keys are snapshotted so listeners removed mid-dispatch are skipped
        // rather than invalidating the iteration.
        let keys: Vec<ListenerKey> = self.listeners.keys().collect();
        for key in keys {
            let once = match self.listeners.get_mut(key) {
                Some(entry) => {
                    (entry.callback)(event);
                    entry.once
                }
                None => continue,
            };
            if once {
                self.listeners.remove(key);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }
}

impl<E> Default for EventEmitter<E> {
    fn default() -> Self {
        Self::new()
    }
}
