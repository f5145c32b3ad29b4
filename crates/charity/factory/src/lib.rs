//! # charity-factory
//!
//! Produces isolated [`CharityPool`](charity_pool::CharityPool) instances from
//! a shared [`PoolTemplate`]. Each pool owns its storage; the factory only
//! keeps the handles, the creation log and the administrator gate for
//! template upgrades.

#![deny(unsafe_code)]

pub mod error;
pub mod factory;
pub mod template;

pub use error::{FactoryError, Result};
pub use factory::{PoolFactory, DEFAULT_FACTORY_LABEL};
pub use template::PoolTemplate;
