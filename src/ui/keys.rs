use crossterm::event::KeyCode;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use tokio::sync::mpsc;

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: HashMap<u64, mpsc::UnboundedSender<KeyCode>>,
}

/// Fans key presses out to whichever views currently hold a subscription.
#[derive(Clone, Default)]
pub struct KeyBus {
    registry: Rc<RefCell<Registry>>,
}

impl KeyBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> KeySubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut registry = self.registry.borrow_mut();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.listeners.insert(id, tx);

        KeySubscription {
            id,
            rx,
            registry: Rc::downgrade(&self.registry),
        }
    }

    pub fn dispatch(&self, key: KeyCode) {
        self.registry
            .borrow_mut()
            .listeners
            .retain(|_, tx| tx.send(key).is_ok());
    }

    #[cfg(test)]
    pub fn listener_count(&self) -> usize {
        self.registry.borrow().listeners.len()
    }
}

/// A live key listener. Dropping it deregisters the listener.
pub struct KeySubscription {
    id: u64,
    rx: mpsc::UnboundedReceiver<KeyCode>,
    registry: Weak<RefCell<Registry>>,
}

impl KeySubscription {
    /// Keys delivered since the last drain, oldest first.
    pub fn drain(&mut self) -> Vec<KeyCode> {
        let mut keys = Vec::new();
        while let Ok(key) = self.rx.try_recv() {
            keys.push(key);
        }
        keys
    }
}

impl Drop for KeySubscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.borrow_mut().listeners.remove(&self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscription_receives_dispatched_keys() {
        let bus = KeyBus::new();
        let mut sub = bus.subscribe();
        bus.dispatch(KeyCode::Left);
        bus.dispatch(KeyCode::Char('+'));
        assert_eq!(sub.drain(), vec![KeyCode::Left, KeyCode::Char('+')]);
        assert!(sub.drain().is_empty());
    }

    #[test]
    fn test_drop_releases_listener() {
        let bus = KeyBus::new();
        let sub = bus.subscribe();
        assert_eq!(bus.listener_count(), 1);
        drop(sub);
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn test_remounting_does_not_accumulate_listeners() {
        let bus = KeyBus::new();
        let mut current = bus.subscribe();
        for _ in 0..5 {
            current = bus.subscribe();
        }
        assert_eq!(bus.listener_count(), 1);

        bus.dispatch(KeyCode::Right);
        assert_eq!(current.drain(), vec![KeyCode::Right]);
    }

    #[test]
    fn test_subscription_outliving_bus_is_harmless() {
        let bus = KeyBus::new();
        let sub = bus.subscribe();
        drop(bus);
        drop(sub);
    }
}
