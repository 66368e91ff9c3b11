use hecs::{
    Component, ComponentError, DynamicBundle, NoSuchEntity, Query, QueryBorrow, Ref, RefMut,
    World as HecsWorld,
};
use std::{any::TypeId, collections::HashMap};

pub use hecs::Entity;

/// Entity world with type-keyed singletons.
pub struct World {
    world: HecsWorld,
    singletons: HashMap<TypeId, Entity>,
}

/// Held by a parent entity; lists its children.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ParentOf(pub Vec<Entity>);

impl World {
    pub fn new() -> Self {
        Self {
            world: HecsWorld::new(),
            singletons: HashMap::new(),
        }
    }

    /// Stores `singleton`, replacing a previous one of the same type.
    pub fn set_singleton<T: Component>(&mut self, singleton: T) {
        match self.singletons.get(&TypeId::of::<T>()) {
            Some(entity) if self.world.contains(*entity) => {
                // Replaces the component in place; the holder is known alive.
                let _ = self.world.insert_one(*entity, singleton);
            }
            _ => {
                let entity = self.world.spawn((singleton,));
                self.singletons.insert(TypeId::of::<T>(), entity);
            }
        }
    }

    pub fn singleton<T: Component>(&self) -> Option<Ref<'_, T>> {
        let entity = self.singletons.get(&TypeId::of::<T>())?;
        self.world.get::<&T>(*entity).ok()
    }

    pub fn singleton_mut<T: Component>(&mut self) -> Option<&mut T> {
        let entity = self.singletons.get(&TypeId::of::<T>())?;
        self.world.query_one_mut::<&mut T>(*entity).ok()
    }

    pub fn query<Q: Query>(&self) -> QueryBorrow<'_, Q> {
        self.world.query::<Q>()
    }

    pub fn component<T: Component>(&self, entity: Entity) -> Result<Ref<'_, T>, ComponentError> {
        self.world.get::<&T>(entity)
    }

    pub fn component_mut<T: Component>(
        &self,
        entity: Entity,
    ) -> Result<RefMut<'_, T>, ComponentError> {
        self.world.get::<&mut T>(entity)
    }

    pub fn spawn(&mut self, components: impl DynamicBundle) -> Entity {
        self.world.spawn(components)
    }

    /// Removes `entity` and unlinks it from its parent. Its own children
    /// become roots.
    pub fn despawn(&mut self, entity: Entity) -> Result<(), NoSuchEntity> {
        self.world.despawn(entity)?;
        self.singletons.retain(|_, holder| *holder != entity);
        for (_, children) in self.world.query_mut::<&mut ParentOf>() {
            children.0.retain(|child| *child != entity);
        }
        Ok(())
    }

    /// Children of `parent` in the order they were attached.
    pub fn children(&self, parent: Entity) -> Vec<Entity> {
        self.world
            .get::<&ParentOf>(parent)
            .map(|children| children.0.clone())
            .unwrap_or_default()
    }

    pub fn set_parent(&mut self, child: Entity, parent: Entity) -> Result<(), NoSuchEntity> {
        if !self.world.contains(child) {
            return Err(NoSuchEntity);
        }
        let mut children = self.children(parent);
        if !children.contains(&child) {
            children.push(child);
        }
        self.world.insert_one(parent, ParentOf(children))
    }

    /// Entities that are nobody's child.
    pub fn roots(&self) -> Vec<Entity> {
        let mut parented = Vec::new();
        for (_, children) in self.world.query::<&ParentOf>().iter() {
            parented.extend_from_slice(&children.0);
        }

        let mut roots: Vec<Entity> = self
            .world
            .iter()
            .map(|entity| entity.entity())
            .filter(|entity| !parented.contains(entity))
            .filter(|entity| !self.singletons.values().any(|holder| holder == entity))
            .collect();
        roots.sort_by_key(|entity| entity.id());
        roots
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Name(&'static str);

    #[test]
    fn singletons_are_replaced_in_place() {
        let mut world = World::new();
        assert!(world.singleton::<u32>().is_none());

        world.set_singleton(1u32);
        world.set_singleton(2u32);
        assert_eq!(*world.singleton::<u32>().unwrap(), 2);

        *world.singleton_mut::<u32>().unwrap() += 1;
        assert_eq!(*world.singleton::<u32>().unwrap(), 3);
        assert_eq!(world.query::<&u32>().iter().count(), 1);
    }

    #[test]
    fn hierarchy_keeps_attach_order() {
        let mut world = World::new();
        let environment = world.spawn((Name("Environment"),));
        let player = world.spawn((Name("Player"),));
        let ground = world.spawn((Name("Ground"),));

        world.set_parent(player, environment).unwrap();
        world.set_parent(ground, environment).unwrap();
        world.set_parent(ground, environment).unwrap();

        assert_eq!(world.children(environment), vec![player, ground]);
        assert_eq!(world.roots(), vec![environment]);
        assert_eq!(world.component::<Name>(player).unwrap().0, "Player");
    }

    #[test]
    fn roots_skip_singleton_holders() {
        let mut world = World::new();
        world.set_singleton(0.5f32);
        let camera = world.spawn((Name("Camera"),));

        assert_eq!(world.roots(), vec![camera]);
    }

    #[test]
    fn despawned_child_leaves_its_parent() {
        let mut world = World::new();
        let environment = world.spawn((Name("Environment"),));
        let player = world.spawn((Name("Player"),));
        let weapon = world.spawn((Name("Weapon"),));
        world.set_parent(player, environment).unwrap();
        world.set_parent(weapon, player).unwrap();

        world.despawn(player).unwrap();

        assert!(world.children(environment).is_empty());
        assert_eq!(world.roots(), vec![environment, weapon]);
        assert!(world.despawn(player).is_err());
    }

    #[test]
    fn parenting_a_despawned_entity_fails() {
        let mut world = World::new();
        let parent = world.spawn((Name("Parent"),));
        let child = world.spawn((Name("Child"),));
        world.despawn(child).unwrap();

        assert!(world.set_parent(child, parent).is_err());
    }
}
