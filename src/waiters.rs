//! FIFO queue of borrowers waiting for an object

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crossbeam::channel;
use tokio::sync::oneshot;

/// What a waiting borrower is handed.
pub(crate) enum Grant<T> {
    /// An object already moved into the active registry as allocated
    Entry { id: u64, payload: T },

    /// A reserved slot; the borrower creates the object itself
    Create,
}

/// Sending half of a waiter's one-shot handoff channel.
pub(crate) enum GrantSender<T> {
    Blocking(channel::Sender<Grant<T>>),
    Async(oneshot::Sender<Grant<T>>),
}

impl<T> GrantSender<T> {
    fn send(self, grant: Grant<T>) -> Result<(), Grant<T>> {
        match self {
            Self::Blocking(tx) => tx.send(grant).map_err(|err| err.into_inner()),
            Self::Async(tx) => tx.send(grant),
        }
    }
}

/// A blocked borrow request.
struct Ticket<T> {
    id: u64,
    arrived_at: Instant,
    tx: GrantSender<T>,
}

pub(crate) struct WaiterQueue<T> {
    tickets: VecDeque<Ticket<T>>,
    next_ticket: u64,
}

impl<T> WaiterQueue<T> {
    pub fn new() -> Self {
        Self {
            tickets: VecDeque::new(),
            next_ticket: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }

    /// How long the head of the queue has been waiting.
    pub fn longest_wait(&self, now: Instant) -> Duration {
        self.tickets
            .front()
            .map(|t| now.saturating_duration_since(t.arrived_at))
            .unwrap_or_default()
    }

    /// Queue a waiter behind everyone already waiting.
    pub fn enqueue(&mut self, tx: GrantSender<T>) -> u64 {
        let id = self.next_ticket;
        self.next_ticket += 1;
        self.tickets.push_back(Ticket {
            id,
            arrived_at: Instant::now(),
            tx,
        });
        id
    }

    /// Withdraw a ticket. Returns `false` if it was already served.
    pub fn cancel(&mut self, ticket: u64) -> bool {
        match self.tickets.iter().position(|t| t.id == ticket) {
            Some(index) => {
                self.tickets.remove(index);
                true
            }
            None => false,
        }
    }

    /// Hand `grant` to the longest-waiting borrower still listening.
    /// Gives the grant back if nobody takes it.
    pub fn deliver(&mut self, mut grant: Grant<T>) -> Result<(), Grant<T>> {
        while let Some(ticket) = self.tickets.pop_front() {
            match ticket.tx.send(grant) {
                Ok(()) => return Ok(()),
                Err(returned) => grant = returned,
            }
        }
        Err(grant)
    }

    /// Drop every ticket. Their receivers observe a disconnect.
    pub fn clear(&mut self) -> usize {
        let count = self.tickets.len();
        self.tickets.clear();
        count
    }
}
