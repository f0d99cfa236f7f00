//! # Game states
//!
//! A game state is a whole mode of play: menu, gameplay, the level editor. It wires itself into
//! the game in [`GameState::enable`] (chain links, listeners, view declarations) and takes every
//! one of those back out in [`GameState::disable`]. Switching modes is then just disabling one
//! state and enabling the next.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::error::GameError;
use crate::Game;

pub trait GameState<W> {
    fn enable(&mut self, game: &mut Game<W>);
    fn disable(&mut self, game: &mut Game<W>);

    fn name(&self) -> &'static str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }
}

/// States are shared so the one being left can be handed back to later.
pub type SharedState<W> = Rc<RefCell<dyn GameState<W>>>;

pub fn shared<W, S: GameState<W> + 'static>(state: S) -> SharedState<W> {
    Rc::new(RefCell::new(state))
}

pub(crate) struct StateMachine<W> {
    pub(crate) current: Option<SharedState<W>>,
    queue: VecDeque<SharedState<W>>,
    transitioning: bool,
}

impl<W> StateMachine<W> {
    pub(crate) fn new() -> Self {
        Self {
            current: None,
            queue: VecDeque::new(),
            transitioning: false,
        }
    }

    /// The state that will be active once every queued change has been applied.
    fn target(&self) -> Option<&SharedState<W>> {
        self.queue.back().or(self.current.as_ref())
    }
}

fn state_name<W>(state: &SharedState<W>) -> &'static str {
    // the state may be mid-enable, in which case it is already borrowed
    state.try_borrow().map_or("<busy>", |s| s.name())
}

impl<W: 'static> Game<W> {
    /// Disables the active state and enables `next`.
    ///
    /// Called from inside another state's `enable` or `disable`, the change is queued and runs
    /// as soon as the current transition is done.
    pub fn change_state(&mut self, next: SharedState<W>) -> Result<(), GameError> {
        if let Some(target) = self.states.target() {
            if Rc::ptr_eq(target, &next) {
                let name = state_name(&next);
                log::error!("tried to enter state `{}` while it is already active", name);
                return Err(GameError::StateAlreadyActive(name));
            }
        }

        self.states.queue.push_back(next);
        if self.states.transitioning {
            return Ok(());
        }

        self.states.transitioning = true;
        while let Some(next) = self.states.queue.pop_front() {
            if let Some(prev) = self.states.current.take() {
                log::debug!("leaving state `{}`", state_name(&prev));
                prev.borrow_mut().disable(self);
            }
            log::info!("entering state `{}`", state_name(&next));
            self.states.current = Some(Rc::clone(&next));
            next.borrow_mut().enable(self);
        }
        self.states.transitioning = false;
        Ok(())
    }

    pub fn is_active(&self, state: &SharedState<W>) -> bool {
        self.states
            .current
            .as_ref()
            .map_or(false, |current| Rc::ptr_eq(current, state))
    }

    pub fn state_name(&self) -> Option<&'static str> {
        self.states.current.as_ref().map(state_name)
    }
}
