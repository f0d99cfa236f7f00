//! # Touch detection
//!
//! Two entities touch while the distance between their positions is at most the sum of their
//! touch radii. Only the edges are reported: `touch` when a pair starts touching, `untouch`
//! when it stops. Both sides of a pair get their own callback.

use std::collections::BTreeSet;

use crate::store::{EntityId, IndexList, Tag};
use crate::{Game, UpdateLink};

/// The update link that runs [`detect`] every frame and then continues.
pub fn link<W: 'static>() -> UpdateLink<W> {
    UpdateLink::new(|game: &mut Game<W>, dt: &mut f32, next| {
        detect(game);
        next.run(game, dt);
    })
}

/// Checks every pair of touchable entities, plus every pair already recorded as touching, and
/// fires `touch`/`untouch` where the state changed.
pub fn detect<W: 'static>(game: &mut Game<W>) {
    let touchables = game
        .objects
        .try_list(Tag::TOUCHABLE)
        .map(IndexList::to_vec)
        .unwrap_or_default();
    let touchable: BTreeSet<EntityId> = touchables.iter().copied().collect();

    // entities that left the touchable view still have to hear their untouch
    let mut candidates = touchables.clone();
    candidates.extend(
        game.objects
            .iter()
            .filter(|(id, e)| !e.body.touching().is_empty() && !touchable.contains(id))
            .map(|(id, _)| id),
    );

    for a in candidates {
        let others: Vec<EntityId> = match game.objects.body(a) {
            Some(body) if !body.is_removed() => touchables
                .iter()
                .copied()
                .chain(
                    body.touching()
                        .iter()
                        .copied()
                        .filter(|b| !touchable.contains(b)),
                )
                .collect(),
            _ => continue,
        };

        for b in others {
            if a == b {
                continue;
            }
            // an earlier callback may have removed `a`
            let Some(body_a) = game.objects.body(a) else {
                break;
            };
            if body_a.is_removed() {
                break;
            }

            let touching = match game.objects.body(b) {
                Some(body_b) => {
                    !body_b.is_removed()
                        && touchable.contains(&a)
                        && touchable.contains(&b)
                        && body_a.position.distance(body_b.position)
                            <= body_a.touch_radius + body_b.touch_radius
                }
                None => false,
            };
            let recorded = body_a.touching().contains(&b);

            if touching && !recorded {
                if let Some(body) = game.objects.body_mut(a) {
                    body.touching_mut().push(b);
                }
                log::trace!("{} touched {}", a, b);
                game.with_behavior(a, |behavior, game| behavior.touch(game, a, b));
            } else if !touching && recorded {
                if let Some(body) = game.objects.body_mut(a) {
                    body.touching_mut().retain(|id| *id != b);
                }
                log::trace!("{} stopped touching {}", a, b);
                game.with_behavior(a, |behavior, game| behavior.untouch(game, a, b));
            }
        }
    }
}
