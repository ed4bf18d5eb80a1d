pub mod entity;

pub use entity::ENTITIES;
