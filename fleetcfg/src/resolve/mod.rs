//! The resolution engine.
//!
//! Raw property sets flow through three stages:
//!
//! 1. [`SpecialPropertyInjector`] adds computed properties (`portOffset`,
//!    `order`, `ip`, ...) for keys the sources do not define;
//! 2. every `${...}` token is handed to a [`CompositeStrategy`], which asks
//!    overrides, specials, the target component's sources and the process
//!    environment, in that order;
//! 3. an [`ExpressionResolver`] expands the answers recursively, detecting
//!    cycles with a [`ResolutionChain`].
//!
//! [`ResolvedConfigProvider`] runs the whole pass for one (component, config
//! type, environment) triple and caches the outcome.

pub mod expression;
pub mod injector;
pub mod placeholder;
pub mod resolved;
pub mod specials;
pub mod strategy;

#[cfg(all(test, feature = "property-tests"))]
mod proptests;

pub use expression::{ChainEntry, ExpressionResolver, ResolutionChain, ResolverRegistry};
pub use injector::SpecialPropertyInjector;
pub use placeholder::{contains_placeholder, Placeholder};
pub use resolved::ResolvedConfigProvider;
pub use specials::SpecialContext;
pub use strategy::{
    CompositeStrategy, EnvVarStrategy, OverrideStrategy, PlaceholderStrategy, Resolution,
    ResolutionContext, SpecialScope, SpecialStrategy, StandardStrategy,
};
