pub mod builder;
pub mod entity;
pub mod enums;
pub mod resolver;

pub use builder::{link_relations, EntityBuilder};
pub use entity::{Column, Entity, Relation};
pub use enums::{EnumEntry, EnumSet, Enumeration};
pub use resolver::NameScope;
