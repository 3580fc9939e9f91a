use std::fmt;

/// Handle returned by [`Listeners::add`], used to remove the listener again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// An ordered list of callbacks fired synchronously with a shared borrow of `T`.
///
/// Listeners run in registration order, on the caller's stack. They only see
/// `&T`, so a clock listener cannot tick or reconfigure the clock that is
/// notifying it. Listeners that need to record something use interior
/// mutability.
pub struct Listeners<T: ?Sized> {
    next_id: u64,
    entries: Vec<(ListenerId, Box<dyn Fn(&T)>)>,
}

impl<T: ?Sized> Listeners<T> {
    /// Create an empty listener list.
    pub fn new() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }

    /// Register a callback. Returns a handle for [`remove`](Self::remove).
    pub fn add<F>(&mut self, listener: F) -> ListenerId
    where
        F: Fn(&T) + 'static,
    {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, Box::new(listener)));
        id
    }

    /// Unregister a callback. Returns `false` if it was not registered.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    /// Call every listener with `value`, in registration order.
    pub fn notify(&self, value: &T) {
        for (_, listener) in &self.entries {
            listener(value);
        }
    }

    /// Return the number of registered listeners.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return `true` if no listeners are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove all listeners.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<T: ?Sized> Default for Listeners<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for Listeners<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("len", &self.entries.len())
            .finish()
    }
}
