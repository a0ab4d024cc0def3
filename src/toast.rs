//! Toast notifications as an explicitly constructed store.
//!
//! Pages create a [`ToastStore`] and pass it to whatever shows toasts; there
//! is no global queue. The queue is bounded: publishing into a full store
//! dismisses the oldest toast first.

use std::collections::VecDeque;

use crate::error::{RenderError, Result};

pub type ToastId = u64;
pub type SubscriberId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub id: ToastId,
    pub kind: ToastKind,
    pub message: String,
    pub created_ms: f64,
    /// `None` stays until dismissed.
    pub duration_ms: Option<f64>,
}

impl Toast {
    fn expired(&self, now_ms: f64) -> bool {
        self.duration_ms
            .is_some_and(|d| now_ms - self.created_ms >= d)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DismissReason {
    User,
    Expired,
    Evicted,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToastEvent {
    Published(Toast),
    Dismissed { id: ToastId, reason: DismissReason },
}

type Listener = Box<dyn FnMut(&ToastEvent)>;

pub struct ToastStore {
    capacity: usize,
    queue: VecDeque<Toast>,
    listeners: Vec<(SubscriberId, Listener)>,
    next_toast: ToastId,
    next_subscriber: SubscriberId,
}

impl ToastStore {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(RenderError::invalid("toast capacity must be at least 1"));
        }
        Ok(Self {
            capacity,
            queue: VecDeque::with_capacity(capacity),
            listeners: Vec::new(),
            next_toast: 1,
            next_subscriber: 1,
        })
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&ToastEvent) + 'static) -> SubscriberId {
        let id = self.next_subscriber;
        self.next_subscriber += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    pub fn publish(
        &mut self,
        kind: ToastKind,
        message: impl Into<String>,
        now_ms: f64,
        duration_ms: Option<f64>,
    ) -> ToastId {
        if self.queue.len() == self.capacity {
            if let Some(oldest) = self.queue.pop_front() {
                self.emit(&ToastEvent::Dismissed {
                    id: oldest.id,
                    reason: DismissReason::Evicted,
                });
            }
        }
        let toast = Toast {
            id: self.next_toast,
            kind,
            message: message.into(),
            created_ms: now_ms,
            duration_ms,
        };
        self.next_toast += 1;
        let id = toast.id;
        self.emit(&ToastEvent::Published(toast.clone()));
        self.queue.push_back(toast);
        id
    }

    pub fn dismiss(&mut self, id: ToastId) -> bool {
        let Some(pos) = self.queue.iter().position(|t| t.id == id) else {
            return false;
        };
        self.queue.remove(pos);
        self.emit(&ToastEvent::Dismissed {
            id,
            reason: DismissReason::User,
        });
        true
    }

    /// Drop every toast whose duration has elapsed at `now_ms`.
    pub fn expire(&mut self, now_ms: f64) -> usize {
        let (gone, kept): (VecDeque<Toast>, VecDeque<Toast>) =
            self.queue.drain(..).partition(|t| t.expired(now_ms));
        self.queue = kept;
        for toast in &gone {
            self.emit(&ToastEvent::Dismissed {
                id: toast.id,
                reason: DismissReason::Expired,
            });
        }
        gone.len()
    }

    pub fn toasts(&self) -> impl Iterator<Item = &Toast> {
        self.queue.iter()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn emit(&mut self, event: &ToastEvent) {
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
    }
}
