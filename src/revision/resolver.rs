//! Ranked strategies choosing the revision a translation is written into.

use std::fmt;

use crate::content::ContentEntity;
use crate::types::{
    ModerationState,
    RevisionId,
};

/// What a caller knows when writing a translation.
#[derive(Debug, Clone, Copy)]
pub struct ResolveRequest<'a> {
    pub entity: &'a ContentEntity,
    pub target_langcode: &'a str,
    pub requested_state: Option<ModerationState>,
    /// Revision the translation request was opened against.
    pub opened_against: Option<RevisionId>,
}

impl<'a> ResolveRequest<'a> {
    #[must_use]
    pub const fn new(entity: &'a ContentEntity, target_langcode: &'a str) -> Self {
        Self { entity, target_langcode, requested_state: None, opened_against: None }
    }
}

pub trait RevisionResolver: fmt::Debug + Send + Sync {
    /// Higher priorities are asked first.
    fn priority(&self) -> i32 {
        0
    }

    /// Picks a revision, or `None` to let the next resolver decide.
    fn resolve(&self, request: &ResolveRequest<'_>) -> Option<RevisionId>;
}

#[derive(Debug, Default)]
pub struct RevisionResolverChain {
    resolvers: Vec<Box<dyn RevisionResolver>>,
}

impl RevisionResolverChain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, resolver: Box<dyn RevisionResolver>) -> Self {
        self.register(resolver);
        self
    }

    /// Adds a resolver. Resolvers with equal priority keep registration order.
    pub fn register(&mut self, resolver: Box<dyn RevisionResolver>) {
        self.resolvers.push(resolver);
        self.resolvers.sort_by_key(|resolver| std::cmp::Reverse(resolver.priority()));
    }

    /// First answer wins; falls back to the request entity's own revision.
    #[must_use]
    pub fn resolve(&self, request: &ResolveRequest<'_>) -> RevisionId {
        for resolver in &self.resolvers {
            if let Some(revision_id) = resolver.resolve(request) {
                tracing::debug!(
                    entity = %request.entity.key(),
                    langcode = request.target_langcode,
                    revision_id,
                    resolver = ?resolver,
                    "Resolved target revision"
                );
                return revision_id;
            }
        }
        request.entity.revision_id
    }
}
