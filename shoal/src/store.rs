//! # Entity store
//!
//! The store owns every live entity. Other code refers to entities by [`EntityId`] and reaches
//! them through tag-indexed views ([`IndexList`]s) that are only ever changed at an explicit
//! flush point ([`EntityStore::handle_pending`]). That is what lets an `update` callback add or
//! remove entities while the rest of the frame is still walking the same view.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use macroquad::math::Vec2;

use crate::error::GameError;
use crate::graphics::Renderer;
use crate::Game;

/// Identity of an entity. Ids are handed out in increasing order and never reused, so a stale
/// id can never alias a newer entity.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct EntityId(u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A capability marker. An entity carrying a tag shows up in the index list declared for it.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Tag(&'static str);

impl Tag {
    pub const UPDATABLE: Tag = Tag("updatable");
    pub const BACKGROUND: Tag = Tag("background");
    pub const FOREGROUND: Tag = Tag("foreground");
    pub const TOUCHABLE: Tag = Tag("touchable");
    pub const EXPORT: Tag = Tag("export");
    pub const START: Tag = Tag("start");
    pub const END: Tag = Tag("end");
    pub const EDITOR_VISIBLE: Tag = Tag("editorVisible");

    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// The plain-data half of an entity: everything the core itself reads.
#[derive(Clone, Debug, Default)]
pub struct Body {
    pub position: Vec2,
    pub velocity: Vec2,
    pub touch_radius: f32,
    tags: BTreeSet<Tag>,
    removed: bool,
    touching: Vec<EntityId>,
}

impl Body {
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn has_tag(&self, tag: Tag) -> bool {
        self.tags.contains(&tag)
    }

    pub fn tags(&self) -> impl Iterator<Item = Tag> + '_ {
        self.tags.iter().copied()
    }

    /// Set as soon as `remove` is called, before the entity physically leaves the store.
    /// Callbacks should treat a removed entity as dead.
    pub fn is_removed(&self) -> bool {
        self.removed
    }

    /// Entities this one is currently touching, in the order the touches started.
    pub fn touching(&self) -> &[EntityId] {
        &self.touching
    }

    pub(crate) fn touching_mut(&mut self) -> &mut Vec<EntityId> {
        &mut self.touching
    }
}

/// Per-kind behavior of an entity. Every hook is optional.
///
/// Hooks that can change the game get the whole [`Game`] plus the entity's own id; look the
/// body up with `game.objects.body_mut(me)`. While a hook runs, the entity's behavior is
/// checked out of the store, so the hook cannot reach its own behavior through the store.
#[allow(unused_variables)]
pub trait Behavior<W> {
    /// Name of the kind of entity, e.g. for the level editor's export listing.
    fn kind(&self) -> &'static str {
        "entity"
    }

    fn update(&mut self, game: &mut Game<W>, me: EntityId, dt: f32) {}

    fn draw_background(&self, body: &Body, g: &mut dyn Renderer) {}

    fn draw_foreground(&self, body: &Body, g: &mut dyn Renderer) {}

    fn touch(&mut self, game: &mut Game<W>, me: EntityId, other: EntityId) {}

    fn untouch(&mut self, game: &mut Game<W>, me: EntityId, other: EntityId) {}

    fn start(&mut self, game: &mut Game<W>, me: EntityId) {}
}

/// An entity waiting to be added, or living in the store.
pub struct Entity<W> {
    pub body: Body,
    behavior: Option<Box<dyn Behavior<W>>>,
}

impl<W> Entity<W> {
    pub fn new(position: Vec2) -> Self {
        Self {
            body: Body::new(position),
            behavior: None,
        }
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.body.tags.insert(tag);
        self
    }

    pub fn with_tags(mut self, tags: &[Tag]) -> Self {
        self.body.tags.extend(tags.iter().copied());
        self
    }

    pub fn with_touch_radius(mut self, radius: f32) -> Self {
        self.body.touch_radius = radius;
        self
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.body.velocity = velocity;
        self
    }

    pub fn with_behavior(mut self, behavior: impl Behavior<W> + 'static) -> Self {
        self.behavior = Some(Box::new(behavior));
        self
    }

    pub fn behavior(&self) -> Option<&dyn Behavior<W>> {
        self.behavior.as_deref()
    }

    pub fn kind(&self) -> &'static str {
        self.behavior().map_or("entity", |b| b.kind())
    }
}

impl<W> fmt::Debug for Entity<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("kind", &self.kind())
            .field("body", &self.body)
            .finish()
    }
}

/// A tag-filtered view over the store, in insertion order.
#[derive(Clone, Debug)]
pub struct IndexList {
    tag: Tag,
    ids: Vec<EntityId>,
}

impl IndexList {
    fn new(tag: Tag) -> Self {
        Self {
            tag,
            ids: Vec::new(),
        }
    }

    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// The first entity of the view; handy for tags that mark a unique entity.
    pub fn first(&self) -> Option<EntityId> {
        self.ids.first().copied()
    }

    pub fn iter(&self) -> std::iter::Copied<std::slice::Iter<'_, EntityId>> {
        self.ids.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.ids.contains(&id)
    }

    /// A snapshot to iterate while the store is being changed.
    pub fn to_vec(&self) -> Vec<EntityId> {
        self.ids.clone()
    }

    fn insert(&mut self, id: EntityId) {
        if !self.ids.contains(&id) {
            self.ids.push(id);
        }
    }

    fn remove(&mut self, id: EntityId) {
        self.ids.retain(|i| *i != id);
    }
}

impl<'a> IntoIterator for &'a IndexList {
    type Item = EntityId;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, EntityId>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct EntityStore<W> {
    entities: BTreeMap<EntityId, Entity<W>>,
    lists: BTreeMap<Tag, IndexList>,
    to_add: Vec<(EntityId, Entity<W>)>,
    to_destroy: Vec<EntityId>,
    retagged: Vec<EntityId>,
    id_max: u64,
}

impl<W> EntityStore<W> {
    pub fn new() -> Self {
        Self {
            entities: BTreeMap::new(),
            lists: BTreeMap::new(),
            to_add: Vec::new(),
            to_destroy: Vec::new(),
            retagged: Vec::new(),
            id_max: 0,
        }
    }

    /// Queues an entity. It shows up in index lists after the next [`handle_pending`].
    ///
    /// [`handle_pending`]: EntityStore::handle_pending
    pub fn add(&mut self, entity: Entity<W>) -> EntityId {
        let id = EntityId(self.id_max);
        self.id_max += 1;
        self.to_add.push((id, entity));
        id
    }

    /// Queues an entity for removal and marks it dead right away. Removing an entity that is
    /// unknown or already on its way out does nothing.
    pub fn remove(&mut self, id: EntityId) {
        if let Some(entity) = self.entities.get_mut(&id) {
            if !entity.body.removed {
                entity.body.removed = true;
                self.to_destroy.push(id);
            }
        } else if let Some(idx) = self.to_add.iter().position(|(pending, _)| *pending == id) {
            // never made it into the store
            self.to_add.remove(idx);
        }
    }

    /// Removes every live entity and drops every pending add.
    pub fn clear(&mut self) {
        self.to_add.clear();
        let ids: Vec<EntityId> = self.entities.keys().copied().collect();
        for id in ids {
            self.remove(id);
        }
    }

    /// Declares the view for `tag`, filled with the live entities that already carry it.
    pub fn create_index_list(&mut self, tag: Tag) -> &IndexList {
        let entities = &self.entities;
        self.lists.entry(tag).or_insert_with(|| {
            let mut list = IndexList::new(tag);
            for (id, entity) in entities.iter() {
                if entity.body.has_tag(tag) {
                    list.insert(*id);
                }
            }
            list
        })
    }

    /// Looks up a declared view. Asking for a tag nobody declared is a bug in the caller.
    pub fn list(&self, tag: Tag) -> &IndexList {
        self.lists
            .get(&tag)
            .unwrap_or_else(|| panic!("no index list declared for tag `{}`", tag))
    }

    pub fn try_list(&self, tag: Tag) -> Result<&IndexList, GameError> {
        self.lists.get(&tag).ok_or(GameError::UnknownTag(tag))
    }

    pub fn has_list(&self, tag: Tag) -> bool {
        self.lists.contains_key(&tag)
    }

    /// Applies queued removals, then tag changes, then additions.
    pub fn handle_pending(&mut self) {
        if self.to_destroy.is_empty() && self.retagged.is_empty() && self.to_add.is_empty() {
            return;
        }
        log::debug!(
            "flushing {} removals, {} retags, {} additions",
            self.to_destroy.len(),
            self.retagged.len(),
            self.to_add.len()
        );

        let to_destroy = std::mem::take(&mut self.to_destroy);
        for id in to_destroy {
            if self.entities.remove(&id).is_some() {
                for list in self.lists.values_mut() {
                    list.remove(id);
                }
            }
        }

        let retagged = std::mem::take(&mut self.retagged);
        for id in retagged {
            if let Some(entity) = self.entities.get(&id) {
                for (tag, list) in self.lists.iter_mut() {
                    if entity.body.has_tag(*tag) {
                        list.insert(id);
                    } else {
                        list.remove(id);
                    }
                }
            }
        }

        let to_add = std::mem::take(&mut self.to_add);
        for (id, entity) in to_add {
            for tag in entity.body.tags.iter() {
                if let Some(list) = self.lists.get_mut(tag) {
                    list.insert(id);
                }
            }
            self.entities.insert(id, entity);
        }
    }

    pub fn has_pending(&self) -> bool {
        !(self.to_add.is_empty() && self.to_destroy.is_empty() && self.retagged.is_empty())
    }

    /// Gives an entity a tag. The body changes now; views follow at the next flush. Works on
    /// entities still waiting to be added too.
    pub fn add_tag(&mut self, id: EntityId, tag: Tag) {
        self.retag(id, |tags| tags.insert(tag));
    }

    pub fn remove_tag(&mut self, id: EntityId, tag: Tag) {
        self.retag(id, |tags| tags.remove(&tag));
    }

    fn retag(&mut self, id: EntityId, change: impl FnOnce(&mut BTreeSet<Tag>) -> bool) {
        if let Some(entity) = self.entities.get_mut(&id) {
            if change(&mut entity.body.tags) {
                self.retagged.push(id);
            }
        } else if let Some((_, entity)) = self.to_add.iter_mut().find(|(pending, _)| *pending == id)
        {
            // picked up by the add itself
            change(&mut entity.body.tags);
        }
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// True for live entities that have not been removed.
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.entities.get(&id).map_or(false, |e| !e.body.removed)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity<W>> {
        self.entities.get(&id)
    }

    pub fn body(&self, id: EntityId) -> Option<&Body> {
        self.entities.get(&id).map(|e| &e.body)
    }

    pub fn body_mut(&mut self, id: EntityId) -> Option<&mut Body> {
        self.entities.get_mut(&id).map(|e| &mut e.body)
    }

    /// All live entities in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity<W>)> {
        self.entities.iter().map(|(id, e)| (*id, e))
    }

    pub fn ids(&self) -> Vec<EntityId> {
        self.entities.keys().copied().collect()
    }

    pub(crate) fn take_behavior(&mut self, id: EntityId) -> Option<Box<dyn Behavior<W>>> {
        self.entities.get_mut(&id).and_then(|e| e.behavior.take())
    }

    /// Puts a checked-out behavior back. If the entity was flushed away meanwhile, the behavior
    /// is dropped with it.
    pub(crate) fn restore_behavior(&mut self, id: EntityId, behavior: Box<dyn Behavior<W>>) {
        if let Some(entity) = self.entities.get_mut(&id) {
            if entity.behavior.is_none() {
                entity.behavior = Some(behavior);
            }
        }
    }

    /// Calls `draw_background` on every entity of the `background` view, then
    /// `draw_foreground` on the `foreground` view. Views that were not declared are skipped.
    pub fn draw(&self, g: &mut dyn Renderer) {
        self.draw_list(Tag::BACKGROUND, g, |b, body, g| b.draw_background(body, g));
        self.draw_list(Tag::FOREGROUND, g, |b, body, g| b.draw_foreground(body, g));
    }

    /// Draws the foreground of every entity in `tag`'s view.
    pub fn draw_foregrounds(&self, tag: Tag, g: &mut dyn Renderer) {
        self.draw_list(tag, g, |b, body, g| b.draw_foreground(body, g));
    }

    fn draw_list(
        &self,
        tag: Tag,
        g: &mut dyn Renderer,
        draw: impl Fn(&dyn Behavior<W>, &Body, &mut dyn Renderer),
    ) {
        let Some(list) = self.lists.get(&tag) else {
            return;
        };
        for id in list {
            if let Some(entity) = self.entities.get(&id) {
                if let Some(behavior) = entity.behavior.as_deref() {
                    draw(behavior, &entity.body, g);
                }
            }
        }
    }
}
