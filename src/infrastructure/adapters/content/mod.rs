//! Content Resolver Adapters

mod catalog_resolver;

pub use catalog_resolver::{CatalogContentResolver, CatalogResolverConfig};
