//! Domain layer - Core business logic and entities
//!
//! CDD Principle: Domain-Driven Design - Pure domain models with no external dependencies
//! - Violation records and reports describe policy failures in build descriptors
//! - Error taxonomy separates policy failures from IO and parse failures

pub mod violations;
