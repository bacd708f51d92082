// Ent Builder - validated constructors and the create lifecycle

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    database::WikiDatabase,
    ent_framework::{
        ent_hooks::{HookContext, HookTiming},
        Entity, ValidationErrors,
    },
    error::AppResult,
};

/// Builder for a new entity. `build` is the validated constructor and
/// `savex` runs the full create lifecycle:
/// before-validate hooks, validation, insert, after-create hooks.
#[async_trait]
pub trait EntBuilder: Serialize + DeserializeOwned + Send + Sync + Sized {
    type Entity: Entity;

    /// Collect every field error, in field declaration order
    fn validate(&self) -> Result<(), ValidationErrors>;

    /// Validate and produce an unsaved entity. Does not run hooks.
    fn build(self) -> Result<Self::Entity, ValidationErrors>;

    /// Write a validated entity and return it with its id
    async fn insert(db: &WikiDatabase, entity: Self::Entity) -> AppResult<Self::Entity>;

    async fn savex(self, db: &WikiDatabase) -> AppResult<Self::Entity> {
        let entity_type = <Self::Entity as Entity>::ENTITY_TYPE;

        let mut ctx = HookContext::new(entity_type, serde_json::to_value(&self)?);
        db.hooks()
            .execute_hooks(HookTiming::BeforeValidate, &mut ctx)
            .await?;
        let builder: Self = serde_json::from_value(ctx.data)?;

        let entity = builder.build()?;
        let saved = Self::insert(db, entity).await?;

        let mut ctx = HookContext::new(entity_type, serde_json::to_value(&saved)?)
            .with_entity_id(saved.id());
        db.hooks().execute_hooks(HookTiming::AfterCreate, &mut ctx).await?;

        Ok(saved)
    }
}
