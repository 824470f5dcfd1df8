//! Revision selection and reactions to moderation transitions.
mod events;
mod moderation;
mod resolver;
mod workflow;

pub use events::ModerationEvent;
pub use moderation::{
    DefaultRevision,
    InMemoryModeration,
    LiveRevisions,
    ModerationInfo,
};
pub use resolver::{
    ResolveRequest,
    RevisionResolver,
    RevisionResolverChain,
};
pub use workflow::CorporateWorkflowPolicy;
