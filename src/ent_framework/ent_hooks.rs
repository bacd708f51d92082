// Ent Hooks System - Middleware pattern for entity mutations
// Hooks see the entity as a JSON object and may rewrite its fields

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

use crate::{
    entities::ent_page::{random_url_title, url_title_from},
    entities::{EntPage, EntUser},
    ent_framework::{Entity, ValidationErrors},
    error::{AppError, AppResult},
};

/// Hook context containing mutation information
#[derive(Debug, Clone)]
pub struct HookContext {
    pub entity_type: &'static str,
    pub entity_id: Option<i64>,
    pub data: Value,
}

impl HookContext {
    pub fn new(entity_type: &'static str, data: Value) -> Self {
        Self {
            entity_type,
            entity_id: None,
            data,
        }
    }

    pub fn with_entity_id(mut self, entity_id: Option<i64>) -> Self {
        self.entity_id = entity_id;
        self
    }

    /// String field of the payload; null and non-string values read as None
    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.data.get(field).and_then(Value::as_str)
    }

    pub fn set_field(&mut self, field: &str, value: Value) -> AppResult<()> {
        match self.data.as_object_mut() {
            Some(map) => {
                map.insert(field.to_string(), value);
                Ok(())
            }
            None => Err(AppError::Internal(format!(
                "{} hook payload is not an object",
                self.entity_type
            ))),
        }
    }
}

/// When a hook runs relative to the create mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookTiming {
    BeforeValidate,
    AfterCreate,
}

/// Trait for implementing entity hooks
#[async_trait]
pub trait EntHook: Send + Sync {
    /// Execute the hook logic
    async fn execute(&self, ctx: &mut HookContext) -> AppResult<()>;

    /// Get hook name for debugging
    fn name(&self) -> &str;

    /// Get hook timing
    fn timing(&self) -> HookTiming;
}

/// Hook registry for managing entity hooks
#[derive(Default)]
pub struct HookRegistry {
    hooks: HashMap<&'static str, Vec<Box<dyn EntHook>>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook for an entity type
    pub fn register_hook(&mut self, entity_type: &'static str, hook: Box<dyn EntHook>) {
        self.hooks.entry(entity_type).or_default().push(hook);
    }

    pub fn hook_names(&self, entity_type: &str, timing: HookTiming) -> Vec<&str> {
        self.hooks
            .get(entity_type)
            .map(|hooks| {
                hooks
                    .iter()
                    .filter(|h| h.timing() == timing)
                    .map(|h| h.name())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Execute all applicable hooks, in registration order
    pub async fn execute_hooks(&self, timing: HookTiming, ctx: &mut HookContext) -> AppResult<()> {
        if let Some(hooks) = self.hooks.get(ctx.entity_type) {
            for hook in hooks.iter().filter(|h| h.timing() == timing) {
                hook.execute(ctx).await.map_err(|e| match e {
                    AppError::Validation(errors) => AppError::Validation(errors),
                    other => AppError::Validation(ValidationErrors::single(
                        hook.name(),
                        format!("hook '{}' failed: {}", hook.name(), other),
                    )),
                })?;
            }
        }
        Ok(())
    }
}

/// Derives `url_title` from `title`, replacing whatever the caller set
pub struct UrlTitleHook;

#[async_trait]
impl EntHook for UrlTitleHook {
    async fn execute(&self, ctx: &mut HookContext) -> AppResult<()> {
        let url_title = ctx
            .str_field("title")
            .filter(|title| !title.trim().is_empty())
            .and_then(url_title_from)
            .unwrap_or_else(random_url_title);
        ctx.set_field("url_title", Value::String(url_title))
    }

    fn name(&self) -> &str {
        "url_title_hook"
    }

    fn timing(&self) -> HookTiming {
        HookTiming::BeforeValidate
    }
}

/// Timestamp hook - fills `created_at` when the caller left it empty
pub struct TimestampHook;

#[async_trait]
impl EntHook for TimestampHook {
    async fn execute(&self, ctx: &mut HookContext) -> AppResult<()> {
        if ctx.data.get("created_at").map_or(true, Value::is_null) {
            let now = chrono::Utc::now().to_rfc3339();
            ctx.set_field("created_at", Value::String(now))?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "timestamp_hook"
    }

    fn timing(&self) -> HookTiming {
        HookTiming::BeforeValidate
    }
}

/// Audit log hook - records every created entity
pub struct AuditLogHook;

#[async_trait]
impl EntHook for AuditLogHook {
    async fn execute(&self, ctx: &mut HookContext) -> AppResult<()> {
        tracing::info!(
            entity_type = ctx.entity_type,
            entity_id = ?ctx.entity_id,
            "entity created"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "audit_log_hook"
    }

    fn timing(&self) -> HookTiming {
        HookTiming::AfterCreate
    }
}

/// Create default hook registry with the wiki's hooks
pub fn create_default_hook_registry() -> HookRegistry {
    let mut registry = HookRegistry::new();

    registry.register_hook(EntPage::ENTITY_TYPE, Box::new(UrlTitleHook));
    for entity_type in [EntPage::ENTITY_TYPE, EntUser::ENTITY_TYPE] {
        registry.register_hook(entity_type, Box::new(TimestampHook));
        registry.register_hook(entity_type, Box::new(AuditLogHook));
    }

    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_url_title_hook_overwrites_slug() {
        let registry = create_default_hook_registry();
        let mut ctx = HookContext::new(
            EntPage::ENTITY_TYPE,
            json!({ "title": "Cracking the Code", "url_title": "reallyYouDoNot" }),
        );
        registry
            .execute_hooks(HookTiming::BeforeValidate, &mut ctx)
            .await
            .unwrap();

        assert_eq!(ctx.str_field("url_title"), Some("Cracking_the_Code"));
        assert!(ctx.str_field("created_at").is_some());
    }

    #[tokio::test]
    async fn test_url_title_hook_without_title_is_random() {
        let mut ctx = HookContext::new(EntPage::ENTITY_TYPE, json!({ "title": null }));
        UrlTitleHook.execute(&mut ctx).await.unwrap();

        let slug = ctx.str_field("url_title").unwrap();
        assert_eq!(slug.len(), 5);
        assert!(slug.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[tokio::test]
    async fn test_url_title_hook_blank_or_reserved_title_is_random() {
        for title in ["   ", "search", "add"] {
            let mut ctx = HookContext::new(EntPage::ENTITY_TYPE, json!({ "title": title }));
            UrlTitleHook.execute(&mut ctx).await.unwrap();

            let slug = ctx.str_field("url_title").unwrap();
            assert_eq!(slug.len(), 5, "title {:?}", title);
            assert_ne!(slug, title);
        }
    }

    #[tokio::test]
    async fn test_timestamp_hook_keeps_existing_value() {
        let mut ctx = HookContext::new(
            EntUser::ENTITY_TYPE,
            json!({ "created_at": "2020-01-01T00:00:00+00:00" }),
        );
        TimestampHook.execute(&mut ctx).await.unwrap();
        assert_eq!(ctx.str_field("created_at"), Some("2020-01-01T00:00:00+00:00"));
    }

    #[tokio::test]
    async fn test_non_object_payload_fails_as_validation() {
        let registry = create_default_hook_registry();
        let mut ctx = HookContext::new(EntUser::ENTITY_TYPE, json!([1, 2, 3]));
        let err = registry
            .execute_hooks(HookTiming::BeforeValidate, &mut ctx)
            .await
            .unwrap_err();

        let errors = err.validation_errors().expect("validation error");
        assert_eq!(errors.errors[0].path, "timestamp_hook");
    }

    #[test]
    fn test_registry_ordering() {
        let registry = create_default_hook_registry();
        assert_eq!(
            registry.hook_names(EntPage::ENTITY_TYPE, HookTiming::BeforeValidate),
            vec!["url_title_hook", "timestamp_hook"]
        );
        assert_eq!(
            registry.hook_names(EntUser::ENTITY_TYPE, HookTiming::AfterCreate),
            vec!["audit_log_hook"]
        );
        assert!(registry
            .hook_names("ent_unknown", HookTiming::BeforeValidate)
            .is_empty());
    }
}
