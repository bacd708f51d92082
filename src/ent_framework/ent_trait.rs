// Entity Trait - identity shared by every stored entity

use serde::Serialize;

/// Entity trait that all wiki entities implement
pub trait Entity: Serialize + Send + Sync + Clone + Sized {
    /// Entity type name used to key hooks and log lines
    const ENTITY_TYPE: &'static str;

    /// Row id, `None` until the entity has been saved
    fn id(&self) -> Option<i64>;

    /// Whether the entity has never been written
    fn is_new(&self) -> bool {
        self.id().is_none()
    }
}
