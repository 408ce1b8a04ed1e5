use std::{
    cell::RefCell,
    collections::VecDeque,
    rc::{Rc, Weak},
};

use shared::{
    domain::EntityId,
    protocol::{Address, Envelope, EventKind},
};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interest {
    pub address: Address,
    pub kind: EventKind,
}

impl Interest {
    pub fn global(kind: EventKind) -> Self {
        Self {
            address: Address::Global,
            kind,
        }
    }

    pub fn entity(entity: EntityId, kind: EventKind) -> Self {
        Self {
            address: Address::Entity(entity),
            kind,
        }
    }

    fn matches(&self, envelope: &Envelope) -> bool {
        self.address == envelope.address && self.kind == envelope.event.kind()
    }
}

type Mailbox = Rc<RefCell<VecDeque<Envelope>>>;

struct Slot {
    id: u64,
    interests: Vec<Interest>,
    mailbox: Mailbox,
}

#[derive(Default)]
struct BusInner {
    next_id: u64,
    slots: Vec<Slot>,
    journal: Option<Vec<Envelope>>,
}

/// Single-threaded fan-out channel. Publishing copies the envelope into the
/// mailbox of every subscription whose interests match; nothing is delivered
/// synchronously, the runtime drains mailboxes in registration order.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Rc<RefCell<BusInner>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, interests: impl IntoIterator<Item = Interest>) -> Subscription {
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        let id = inner.next_id;
        let mailbox: Mailbox = Rc::new(RefCell::new(VecDeque::new()));
        inner.slots.push(Slot {
            id,
            interests: interests.into_iter().collect(),
            mailbox: Rc::clone(&mailbox),
        });
        Subscription {
            id,
            mailbox,
            bus: Rc::downgrade(&self.inner),
        }
    }

    /// Returns the number of subscriptions the envelope was queued for.
    pub fn publish(&self, envelope: Envelope) -> usize {
        let mut inner = self.inner.borrow_mut();
        let mut delivered = 0;
        for slot in &inner.slots {
            if slot.interests.iter().any(|interest| interest.matches(&envelope)) {
                slot.mailbox.borrow_mut().push_back(envelope.clone());
                delivered += 1;
            }
        }
        if let Some(journal) = inner.journal.as_mut() {
            journal.push(envelope);
        }
        delivered
    }

    pub fn pending(&self) -> usize {
        self.inner
            .borrow()
            .slots
            .iter()
            .map(|slot| slot.mailbox.borrow().len())
            .sum()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().slots.len()
    }

    pub fn enable_journal(&self) {
        let mut inner = self.inner.borrow_mut();
        if inner.journal.is_none() {
            inner.journal = Some(Vec::new());
        }
    }

    pub fn take_journal(&self) -> Vec<Envelope> {
        self.inner
            .borrow_mut()
            .journal
            .as_mut()
            .map(std::mem::take)
            .unwrap_or_default()
    }
}

/// Receiving end of a bus registration. Dropping it unregisters exactly this
/// subscription and discards anything still queued for it.
pub struct Subscription {
    id: u64,
    mailbox: Mailbox,
    bus: Weak<RefCell<BusInner>>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn try_recv(&self) -> Option<Envelope> {
        self.mailbox.borrow_mut().pop_front()
    }

    pub fn len(&self) -> usize {
        self.mailbox.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.mailbox.borrow().is_empty()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(inner) = self.bus.upgrade() else {
            return;
        };
        let mut inner = inner.borrow_mut();
        inner.slots.retain(|slot| slot.id != self.id);
        debug!(subscription = self.id, "bus subscription released");
    }
}

#[cfg(test)]
#[path = "tests/bus_tests.rs"]
mod tests;
