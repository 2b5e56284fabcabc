//! Shared test utilities for worker testing
//!
//! This crate provides reusable test infrastructure:
//! - `TestRabbitMq`: RabbitMQ container with automatic cleanup (feature: "rabbitmq")
//! - `TestDataBuilder`: Deterministic test data generation (always available)
//! - `assertions`: Custom assertion helpers (always available)
//!
//! # Features
//!
//! - `rabbitmq` (default): Enables RabbitMQ test infrastructure
//!
//! # Usage
//!
//! ```rust,ignore
//! use test_utils::{TestDataBuilder, TestRabbitMq};
//!
//! #[tokio::test]
//! async fn my_broker_test() {
//!     let rabbit = TestRabbitMq::new().await;
//!     let builder = TestDataBuilder::from_test_name("my_broker_test");
//!
//!     // Per-test queue names keep parallel tests isolated
//!     let request_queue = builder.name("queue", "requests");
//!     let response_queue = builder.name("queue", "responses");
//! }
//! ```

use uuid::Uuid;

// Conditionally compile broker modules based on features
#[cfg(feature = "rabbitmq")]
mod rabbitmq;

// Re-export based on enabled features
#[cfg(feature = "rabbitmq")]
pub use rabbitmq::TestRabbitMq;

/// Builder for test data with deterministic randomization
///
/// This ensures tests are reproducible by using seeded random data.
pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    /// Create a new builder with a seed (for deterministic tests)
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Create from test name (generates seed from test name hash)
    ///
    /// This is the recommended way to create a builder for consistent test data.
    ///
    /// # Example
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::from_test_name("test_scoring_roundtrip");
    /// ```
    pub fn from_test_name(name: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// Generate a deterministic request ID for testing
    pub fn request_id(&self) -> Uuid {
        // Use seed to generate deterministic UUID
        let bytes = self.seed.to_le_bytes();
        let mut uuid_bytes = [0u8; 16];
        uuid_bytes[..8].copy_from_slice(&bytes);
        uuid_bytes[8..16].copy_from_slice(&bytes);
        Uuid::from_bytes(uuid_bytes)
    }

    /// Generate a unique name for testing
    ///
    /// # Arguments
    ///
    /// * `prefix` - The type of resource (e.g., "queue", "job")
    /// * `suffix` - A unique identifier within the test (e.g., "requests", "responses")
    ///
    /// # Example
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::from_test_name("my_test");
    /// let name = builder.name("queue", "requests");
    /// // Returns: "test-queue-12345-requests"
    /// ```
    pub fn name(&self, prefix: &str, suffix: &str) -> String {
        format!("test-{}-{}-{}", prefix, self.seed, suffix)
    }
}

/// Test assertion helpers
pub mod assertions {
    /// Assert that an optional value is Some
    pub fn assert_some<T>(value: Option<T>, context: &str) -> T {
        value.unwrap_or_else(|| panic!("{}: expected Some, got None", context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_builder_deterministic() {
        let builder1 = TestDataBuilder::new(42);
        let builder2 = TestDataBuilder::new(42);

        assert_eq!(builder1.request_id(), builder2.request_id());
        assert_eq!(
            builder1.name("queue", "requests"),
            builder2.name("queue", "requests")
        );
    }

    #[test]
    fn test_data_builder_from_name() {
        let builder1 = TestDataBuilder::from_test_name("my_test");
        let builder2 = TestDataBuilder::from_test_name("my_test");

        assert_eq!(builder1.request_id(), builder2.request_id());
    }

    #[test]
    fn test_data_builder_different_names() {
        let builder1 = TestDataBuilder::from_test_name("test1");
        let builder2 = TestDataBuilder::from_test_name("test2");

        // Different test names should generate different data
        assert_ne!(builder1.request_id(), builder2.request_id());
    }
}
