//! Observed<T> - single-threaded state cell with snapshot-on-change watchers.
//!
//! Every `update` pushes the new snapshot to all live watchers. Watchers whose
//! receiver was dropped are pruned on the next notification.

use futures::channel::mpsc;
use std::cell::RefCell;
use std::rc::Rc;

pub struct Observed<T: Clone> {
    state: Rc<RefCell<T>>,
    watchers: Rc<RefCell<Vec<mpsc::UnboundedSender<T>>>>,
}

impl<T: Clone> Clone for Observed<T> {
    fn clone(&self) -> Self {
        Self { state: self.state.clone(), watchers: self.watchers.clone() }
    }
}

impl<T: Clone + Default> Default for Observed<T> {
    fn default() -> Self { Self::new(T::default()) }
}

impl<T: Clone> Observed<T> {
    pub fn new(initial: T) -> Self {
        Self {
            state: Rc::new(RefCell::new(initial)),
            watchers: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn get(&self) -> T {
        self.state.borrow().clone()
    }

    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.state.borrow())
    }

    /// Mutate in place, then notify watchers with the new snapshot.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let (result, snapshot) = {
            let mut state = self.state.borrow_mut();
            let result = f(&mut state);
            (result, state.clone())
        };
        self.notify(snapshot);
        result
    }

    /// New receiver of every later snapshot. The channel is unbounded: a
    /// receiver that is kept but never drained queues every update. Drop it
    /// to unsubscribe.
    pub fn watch(&self) -> mpsc::UnboundedReceiver<T> {
        let (tx, rx) = mpsc::unbounded();
        self.watchers.borrow_mut().push(tx);
        rx
    }

    pub fn watcher_count(&self) -> usize {
        self.watchers.borrow().len()
    }

    fn notify(&self, snapshot: T) {
        self.watchers
            .borrow_mut()
            .retain(|tx| tx.unbounded_send(snapshot.clone()).is_ok());
    }
}
