//! Application events and the emitter game states subscribe to.

use std::rc::Rc;

use macroquad::input::{KeyCode, MouseButton};
use macroquad::math::Vec2;

use crate::Game;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum EventKind {
    KeyDown,
    MouseDown,
    MouseMove,
    LevelChanged,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum GameEvent {
    KeyDown(KeyCode),
    MouseDown(MouseButton),
    /// Mouse position in screen pixels.
    MouseMove(Vec2),
    LevelChanged,
}

impl GameEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            GameEvent::KeyDown(_) => EventKind::KeyDown,
            GameEvent::MouseDown(_) => EventKind::MouseDown,
            GameEvent::MouseMove(_) => EventKind::MouseMove,
            GameEvent::LevelChanged => EventKind::LevelChanged,
        }
    }
}

/// A subscribed callback. Like chain links, listeners have identity so they can be removed.
#[allow(clippy::type_complexity)]
pub struct Listener<W>(Rc<dyn Fn(&mut Game<W>, &GameEvent)>);

impl<W> Listener<W> {
    pub fn new(f: impl Fn(&mut Game<W>, &GameEvent) + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn same(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn call(&self, game: &mut Game<W>, event: &GameEvent) {
        (self.0)(game, event)
    }
}

impl<W> Clone for Listener<W> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

struct Subscription<W> {
    kind: EventKind,
    listener: Listener<W>,
    once: bool,
}

pub struct Emitter<W> {
    subscriptions: Vec<Subscription<W>>,
}

impl<W> Emitter<W> {
    pub fn new() -> Self {
        Self {
            subscriptions: Vec::new(),
        }
    }

    pub fn on(&mut self, kind: EventKind, listener: Listener<W>) -> Listener<W> {
        self.subscribe(kind, listener, false)
    }

    /// Subscribes for the next matching event only.
    pub fn once(&mut self, kind: EventKind, listener: Listener<W>) -> Listener<W> {
        self.subscribe(kind, listener, true)
    }

    fn subscribe(&mut self, kind: EventKind, listener: Listener<W>, once: bool) -> Listener<W> {
        self.subscriptions.push(Subscription {
            kind,
            listener: listener.clone(),
            once,
        });
        listener
    }

    /// Drops every subscription of `listener`. Unknown listeners are ignored.
    pub fn remove_listener(&mut self, listener: &Listener<W>) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| !s.listener.same(listener));
        before != self.subscriptions.len()
    }

    pub fn contains(&self, listener: &Listener<W>) -> bool {
        self.subscriptions.iter().any(|s| s.listener.same(listener))
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.subscriptions.iter().filter(|s| s.kind == kind).count()
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Listeners to call for one emit, in subscription order. `once` subscriptions are dropped
    /// here, before any listener runs.
    pub(crate) fn dispatch_list(&mut self, kind: EventKind) -> Vec<Listener<W>> {
        let listeners = self
            .subscriptions
            .iter()
            .filter(|s| s.kind == kind)
            .map(|s| s.listener.clone())
            .collect();
        self.subscriptions.retain(|s| !(s.once && s.kind == kind));
        listeners
    }
}

impl<W> Default for Emitter<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: 'static> Game<W> {
    /// Calls every listener subscribed to the event's kind. Listeners added while emitting
    /// only hear later events.
    pub fn emit(&mut self, event: GameEvent) {
        let listeners = self.events.dispatch_list(event.kind());
        for listener in listeners {
            listener.call(self, &event);
        }
    }
}
