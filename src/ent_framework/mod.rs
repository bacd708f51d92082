// Ent Framework - entity traits, builders, hooks and validation

pub mod ent_builder;
pub mod ent_hooks;
pub mod ent_trait;
pub mod validation;

pub use ent_builder::EntBuilder;
pub use ent_hooks::{create_default_hook_registry, HookRegistry};
pub use ent_trait::Entity;
pub use validation::{FieldError, ValidationErrors};
