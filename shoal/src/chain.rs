//! # Chains
//!
//! A chain is an ordered list of links that together make up one pass over the game, e.g. one
//! update or one draw. Each link gets the context, the pass arguments, and a [`Next`] handle
//! for the rest of the chain. A link decides whether the rest runs (and with what arguments) by
//! calling [`Next::run`], and can wrap work around it, like pushing a camera transform before
//! the objects draw and popping it afterwards.
//!
//! Links have identity, so whoever installed one can take exactly that link out again.

use std::fmt;
use std::rc::Rc;

use crate::error::GameError;

/// One interceptor in a [`Chain`]. Cloning a link clones the handle, not the callable.
#[allow(clippy::type_complexity)]
pub struct Link<C, A: ?Sized>(Rc<dyn Fn(&mut C, &mut A, Next<'_, C, A>)>);

impl<C, A: ?Sized> Link<C, A> {
    pub fn new(f: impl Fn(&mut C, &mut A, Next<'_, C, A>) + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Identity comparison.
    pub fn same(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<C, A: ?Sized> Clone for Link<C, A> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<C, A: ?Sized> fmt::Debug for Link<C, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Link({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}

/// The remainder of a running pass. Consumed by [`Next::run`], so a link continues at most once.
pub struct Next<'a, C, A: ?Sized> {
    rest: &'a [Link<C, A>],
    /// Finds the chain the pass was taken from, to skip links removed since.
    live: Option<fn(&C) -> &Chain<C, A>>,
}

impl<'a, C, A: ?Sized> Next<'a, C, A> {
    pub fn run(self, ctx: &mut C, args: &mut A) {
        let mut rest = self.rest;
        while let Some((link, tail)) = rest.split_first() {
            // links taken out earlier in this pass are skipped
            if self.live.map_or(true, |live| live(ctx).contains(link)) {
                (link.0)(
                    ctx,
                    args,
                    Next {
                        rest: tail,
                        live: self.live,
                    },
                );
                return;
            }
            rest = tail;
        }
    }
}

/// A snapshot of a chain's links, taken so the chain itself can be edited while the pass runs.
pub struct Pass<C, A: ?Sized> {
    links: Vec<Link<C, A>>,
}

impl<C, A: ?Sized> Pass<C, A> {
    /// Runs every link of the snapshot.
    pub fn run(&self, ctx: &mut C, args: &mut A) {
        Next {
            rest: &self.links,
            live: None,
        }
        .run(ctx, args);
    }

    /// Runs the snapshot, skipping links that are no longer in the chain `live` finds in `ctx`.
    /// Links added during the pass wait for the next one.
    pub fn run_live(&self, ctx: &mut C, args: &mut A, live: fn(&C) -> &Chain<C, A>) {
        Next {
            rest: &self.links,
            live: Some(live),
        }
        .run(ctx, args);
    }
}

pub struct Chain<C, A: ?Sized> {
    links: Vec<Link<C, A>>,
}

impl<C, A: ?Sized> Chain<C, A> {
    pub fn new() -> Self {
        Self { links: Vec::new() }
    }

    /// Appends a link and hands it back for later removal.
    pub fn push(&mut self, link: Link<C, A>) -> Link<C, A> {
        self.links.push(link.clone());
        link
    }

    /// Prepends a link, so it runs before everything already installed.
    pub fn unshift(&mut self, link: Link<C, A>) -> Link<C, A> {
        self.links.insert(0, link.clone());
        link
    }

    /// Inserts at `index`, clamped to the end of the chain.
    pub fn insert(&mut self, index: usize, link: Link<C, A>) -> Link<C, A> {
        let index = index.min(self.links.len());
        self.links.insert(index, link.clone());
        link
    }

    pub fn insert_before(
        &mut self,
        link: Link<C, A>,
        anchor: &Link<C, A>,
    ) -> Result<Link<C, A>, GameError> {
        let index = self.position(anchor).ok_or(GameError::AnchorNotFound)?;
        Ok(self.insert(index, link))
    }

    pub fn insert_after(
        &mut self,
        link: Link<C, A>,
        anchor: &Link<C, A>,
    ) -> Result<Link<C, A>, GameError> {
        let index = self.position(anchor).ok_or(GameError::AnchorNotFound)?;
        Ok(self.insert(index + 1, link))
    }

    /// Removes a link by identity and reports where it was. Removing a link that is not in the
    /// chain does nothing.
    pub fn remove(&mut self, link: &Link<C, A>) -> Option<usize> {
        let index = self.position(link)?;
        self.links.remove(index);
        Some(index)
    }

    pub fn position(&self, link: &Link<C, A>) -> Option<usize> {
        self.links.iter().position(|l| l.same(link))
    }

    pub fn contains(&self, link: &Link<C, A>) -> bool {
        self.position(link).is_some()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn links(&self) -> &[Link<C, A>] {
        &self.links
    }

    pub fn pass(&self) -> Pass<C, A> {
        Pass {
            links: self.links.clone(),
        }
    }

    /// Runs the chain as it is right now. Only usable when the chain is not part of `ctx`;
    /// chains owned by the game go through [`Chain::pass`] and [`Pass::run_live`].
    pub fn run(&self, ctx: &mut C, args: &mut A) {
        Next {
            rest: &self.links,
            live: None,
        }
        .run(ctx, args);
    }
}

impl<C, A: ?Sized> Default for Chain<C, A> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Log = Vec<&'static str>;

    fn tracer(name: &'static str) -> Link<Log, u32> {
        Link::new(move |log: &mut Log, n: &mut u32, next| {
            log.push(name);
            *n += 1;
            next.run(log, n);
        })
    }

    #[test]
    fn test_links_run_in_order() {
        let mut chain = Chain::new();
        chain.push(tracer("b"));
        chain.push(tracer("c"));
        chain.unshift(tracer("a"));

        let mut log = Log::new();
        let mut n = 0;
        chain.run(&mut log, &mut n);
        assert_eq!(log, vec!["a", "b", "c"]);
        assert_eq!(n, 3);
    }

    #[test]
    fn test_short_circuit_stops_the_pass() {
        let mut chain = Chain::new();
        chain.push(tracer("a"));
        chain.push(Link::new(|log: &mut Log, _: &mut u32, _next| log.push("stop")));
        chain.push(tracer("never"));

        let mut log = Log::new();
        chain.run(&mut log, &mut 0);
        assert_eq!(log, vec!["a", "stop"]);
    }

    #[test]
    fn test_link_can_change_args_for_the_rest() {
        let mut chain: Chain<Vec<u32>, u32> = Chain::new();
        chain.push(Link::new(|seen: &mut Vec<u32>, n: &mut u32, next| {
            let mut doubled = *n * 2;
            next.run(seen, &mut doubled);
        }));
        chain.push(Link::new(|seen: &mut Vec<u32>, n: &mut u32, next| {
            seen.push(*n);
            next.run(seen, n);
        }));

        let mut seen = Vec::new();
        chain.run(&mut seen, &mut 21);
        assert_eq!(seen, vec![42]);
    }

    #[test]
    fn test_wrapping_link_sees_rest_of_chain_inside() {
        let mut chain = Chain::new();
        chain.push(Link::new(|log: &mut Log, n: &mut u32, next| {
            log.push("save");
            next.run(log, n);
            log.push("restore");
        }));
        chain.push(tracer("draw"));

        let mut log = Log::new();
        chain.run(&mut log, &mut 0);
        assert_eq!(log, vec!["save", "draw", "restore"]);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut chain = Chain::new();
        let a = chain.push(tracer("a"));
        let b = chain.push(tracer("b"));

        assert_eq!(chain.remove(&a), Some(0));
        assert_eq!(chain.remove(&a), None);
        assert_eq!(chain.remove(&tracer("stranger")), None);
        assert_eq!(chain.len(), 1);
        assert!(chain.contains(&b));
    }

    #[test]
    fn test_insert_relative_to_anchor() {
        let mut chain = Chain::new();
        let objects = chain.push(tracer("objects"));
        chain.insert_before(tracer("camera"), &objects).unwrap();
        chain.insert_after(tracer("hud"), &objects).unwrap();

        let mut log = Log::new();
        chain.run(&mut log, &mut 0);
        assert_eq!(log, vec!["camera", "objects", "hud"]);
    }

    #[test]
    fn test_missing_anchor_is_an_error() {
        let mut chain: Chain<Log, u32> = Chain::new();
        let stray = tracer("stray");
        assert_eq!(
            chain.insert_before(tracer("a"), &stray).unwrap_err(),
            GameError::AnchorNotFound
        );
        assert_eq!(
            chain.insert_after(tracer("a"), &stray).unwrap_err(),
            GameError::AnchorNotFound
        );
        assert!(chain.is_empty());
    }

    #[test]
    fn test_remove_then_insert_restores_position() {
        let mut chain = Chain::new();
        chain.push(tracer("a"));
        let b = chain.push(tracer("b"));
        chain.push(tracer("c"));

        let at = chain.remove(&b).unwrap();
        chain.insert(at, b);

        let mut log = Log::new();
        chain.run(&mut log, &mut 0);
        assert_eq!(log, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_edits_during_a_pass_apply_next_pass() {
        struct Ctx {
            chain: Chain<Ctx, u32>,
            log: Log,
        }

        let mut ctx = Ctx {
            chain: Chain::new(),
            log: Log::new(),
        };
        ctx.chain.push(Link::new(|ctx: &mut Ctx, n: &mut u32, next| {
            ctx.log.push("first");
            ctx.chain.push(Link::new(|ctx: &mut Ctx, _: &mut u32, _next| {
                ctx.log.push("added");
            }));
            next.run(ctx, n);
        }));

        let pass = ctx.chain.pass();
        pass.run(&mut ctx, &mut 0);
        assert_eq!(ctx.log, vec!["first"]);
        assert_eq!(ctx.chain.len(), 2);
    }

    #[test]
    fn test_links_removed_during_a_live_pass_are_skipped() {
        struct Ctx {
            chain: Chain<Ctx, u32>,
            doomed: Option<Link<Ctx, u32>>,
            log: Log,
        }

        fn live(ctx: &Ctx) -> &Chain<Ctx, u32> {
            &ctx.chain
        }

        let mut ctx = Ctx {
            chain: Chain::new(),
            doomed: None,
            log: Log::new(),
        };
        ctx.chain.push(Link::new(|ctx: &mut Ctx, n: &mut u32, next| {
            ctx.log.push("first");
            if let Some(link) = ctx.doomed.take() {
                ctx.chain.remove(&link);
            }
            next.run(ctx, n);
        }));
        let doomed = ctx.chain.push(Link::new(|ctx: &mut Ctx, n: &mut u32, next| {
            ctx.log.push("doomed");
            next.run(ctx, n);
        }));
        ctx.chain.push(Link::new(|ctx: &mut Ctx, n: &mut u32, next| {
            ctx.log.push("last");
            next.run(ctx, n);
        }));
        ctx.doomed = Some(doomed);

        let pass = ctx.chain.pass();
        pass.run_live(&mut ctx, &mut 0, live);
        assert_eq!(ctx.log, vec!["first", "last"]);
    }
}
