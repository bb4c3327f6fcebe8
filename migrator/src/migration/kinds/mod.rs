//! Resource kinds and the registry the orchestrator drives.
//!
//! Every kind exposes the same shape: a paged listing of what the source
//! principal owns, and a transfer that reassigns a batch of those resources.
//! The standard kinds are data-described ([`DeclarativeKind`]); anything that
//! does not fit the templates can implement [`ResourceKind`] directly.

pub mod catalog;
pub mod declarative;
pub mod template;

use async_trait::async_trait;
use std::sync::Arc;

use super::paginator::Cursor;
use super::types::{ItemOutcome, KindTag, ResourceRef, TransferContext};
use crate::services::client::Transport;
use crate::services::errors::{MigrationError, MigrationResult};

pub use declarative::{DeclarativeKind, SkipRule, TransferPlan, TransferStep, PROVENANCE_PREFIX};
pub use template::{IdSelector, ItemsSelector, RenderedRequest, RequestTemplate, TemplateVars};

/// When a kind's discovered resources are handed to `transfer`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferScope {
    /// Each page as soon as it is fetched
    PerPage,
    /// After the listing is exhausted. Required for owner-filtered listings:
    /// transferring a page shrinks the result set and the next offset would
    /// skip resources.
    FullResultSet,
}

#[async_trait]
pub trait ResourceKind: Send + Sync {
    /// Stable audit tag
    fn tag(&self) -> KindTag;

    fn page_size(&self) -> usize;

    fn scope(&self) -> TransferScope {
        TransferScope::PerPage
    }

    /// Why resources of this kind are never reassigned, if they are not
    fn unsupported_note(&self) -> Option<&str> {
        None
    }

    fn supports_transfer(&self) -> bool {
        self.unsupported_note().is_none()
    }

    /// One page of the source principal's resources
    async fn list_page(
        &self,
        transport: &dyn Transport,
        ctx: &TransferContext,
        cursor: Cursor,
    ) -> MigrationResult<Vec<ResourceRef>>;

    /// Reassign `items` to the new owner.
    ///
    /// Never fails as a whole: every item gets an outcome, in input order.
    /// Re-running a transfer for resources already owned by the new owner
    /// must leave them unchanged.
    async fn transfer(
        &self,
        transport: &dyn Transport,
        ctx: &TransferContext,
        items: Vec<ResourceRef>,
        max_concurrent: usize,
    ) -> Vec<ItemOutcome>;
}

/// Ordered set of kinds with unique tags
#[derive(Clone, Default)]
pub struct KindRegistry {
    kinds: Vec<Arc<dyn ResourceKind>>,
}

impl KindRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// All standard platform kinds, in catalog order
    pub fn standard() -> MigrationResult<Self> {
        let mut registry = Self::new();
        for kind in catalog::standard_kinds() {
            registry.register(Arc::new(kind))?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, kind: Arc<dyn ResourceKind>) -> MigrationResult<()> {
        let tag = kind.tag();
        if self.get(tag).is_some() {
            return Err(MigrationError::DuplicateKind { kind: tag });
        }
        self.kinds.push(kind);
        Ok(())
    }

    pub fn with(mut self, kind: Arc<dyn ResourceKind>) -> MigrationResult<Self> {
        self.register(kind)?;
        Ok(self)
    }

    pub fn get(&self, tag: KindTag) -> Option<&Arc<dyn ResourceKind>> {
        self.kinds.iter().find(|kind| kind.tag() == tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn ResourceKind>> {
        self.kinds.iter()
    }

    pub fn tags(&self) -> Vec<KindTag> {
        self.kinds.iter().map(|kind| kind.tag()).collect()
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}
