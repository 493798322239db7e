//! Remote file catalog.
//!
//! The catalog is the authoritative listing and content store. The client
//! only ever talks to it through [`FileCatalog`]; [`GraphqlCatalog`] speaks
//! the server's GraphQL endpoint and [`MockCatalog`] keeps everything in
//! memory for tests.

mod graphql;
mod mock;
mod traits;
mod types;

pub use graphql::GraphqlCatalog;
pub use mock::{MockCalls, MockCatalog};
pub use traits::FileCatalog;
pub use types::{CatalogError, FileRecord};

#[cfg(test)]
mod tests {
    use super::*;

    async fn generic_round_trip<C: FileCatalog>(
        catalog: &C,
        name: &str,
    ) -> Result<String, CatalogError> {
        let id = catalog.create_file(name, "SGVsbG8=").await?;
        catalog.get_content(&id).await
    }

    #[tokio::test]
    async fn test_generic_trait_usage() {
        let catalog = MockCatalog::new();
        let content = generic_round_trip(&catalog, "hello.txt").await.unwrap();
        assert_eq!(content, "SGVsbG8=");
    }
}
