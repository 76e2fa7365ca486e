//! Catalog service.

use async_trait::async_trait;
use investomart::{
    catalog::{CatalogItem, ItemId},
    search::SearchTerm,
};
use mockall::automock;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{api::ApiClient, catalog::errors::CatalogServiceError};

/// Category value that disables the explore filter.
pub const ALL_CATEGORIES: &str = "all";

#[derive(Debug, Clone)]
pub struct HttpCatalogService {
    api: ApiClient,
}

impl HttpCatalogService {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<CatalogItem>,
}

#[async_trait]
impl CatalogService for HttpCatalogService {
    async fn search(&self, query: &str) -> Vec<CatalogItem> {
        let Ok(term) = SearchTerm::parse(query) else {
            debug!(query, "search term too short, skipping request");

            return Vec::new();
        };

        let request = self.api.get("search/").query(&[("q", term.as_str())]);

        match self
            .api
            .send_json::<SearchResponse>(request, "catalog search")
            .await
        {
            Ok(response) => response.results,
            Err(error) => {
                warn!(query = term.as_str(), %error, "search failed, returning no results");

                Vec::new()
            }
        }
    }

    async fn explore(
        &self,
        category: Option<String>,
    ) -> Result<Vec<CatalogItem>, CatalogServiceError> {
        let mut request = self.api.get("search/explore/");

        if let Some(category) = category
            .map(|category| category.trim().to_lowercase())
            .filter(|category| !category.is_empty() && category != ALL_CATEGORIES)
        {
            request = request.query(&[("category", category)]);
        }

        let response: SearchResponse = self.api.send_json(request, "catalog explore").await?;

        Ok(response.results)
    }

    async fn product(&self, id: &ItemId) -> Result<CatalogItem, CatalogServiceError> {
        let request = self.api.get(&format!("search/product/{id}/"));

        Ok(self.api.send_json(request, "product detail").await?)
    }

    async fn livestock(&self, id: &ItemId) -> Result<CatalogItem, CatalogServiceError> {
        let request = self.api.get(&format!("search/livestock/{id}/"));

        Ok(self.api.send_json(request, "livestock detail").await?)
    }
}

#[automock]
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Search products and livestock by free text.
    ///
    /// Terms shorter than two characters, and failed requests, yield no results.
    async fn search(&self, query: &str) -> Vec<CatalogItem>;

    /// List active listings, optionally restricted to one category.
    async fn explore(&self, category: Option<String>)
    -> Result<Vec<CatalogItem>, CatalogServiceError>;

    /// Retrieve a single product listing.
    async fn product(&self, id: &ItemId) -> Result<CatalogItem, CatalogServiceError>;

    /// Retrieve a single animal.
    async fn livestock(&self, id: &ItemId) -> Result<CatalogItem, CatalogServiceError>;
}

#[cfg(test)]
mod tests {
    use investomart::catalog::ItemKind;
    use testresult::TestResult;

    use crate::test::TestBackend;

    use super::*;

    async fn service() -> TestResult<(TestBackend, HttpCatalogService)> {
        let backend = TestBackend::spawn().await?;
        let service = HttpCatalogService::new(backend.client()?);

        Ok((backend, service))
    }

    #[tokio::test]
    async fn search_returns_matching_products_and_livestock() -> TestResult {
        let (_backend, catalog) = service().await?;

        let results = catalog.search("goat").await;

        let kinds: Vec<ItemKind> = results.iter().map(CatalogItem::kind).collect();

        assert_eq!(kinds, [ItemKind::Product, ItemKind::Livestock]);

        Ok(())
    }

    #[tokio::test]
    async fn short_search_terms_skip_the_backend() -> TestResult {
        let (backend, catalog) = service().await?;

        assert!(catalog.search(" g ").await.is_empty());
        assert_eq!(backend.state.search_calls(), 0);

        Ok(())
    }

    #[tokio::test]
    async fn failed_search_yields_no_results() -> TestResult {
        let (backend, catalog) = service().await?;

        assert!(catalog.search("error").await.is_empty());
        assert_eq!(backend.state.search_calls(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn explore_filters_by_category() -> TestResult {
        let (_backend, catalog) = service().await?;

        let goats = catalog.explore(Some("Goat".to_string())).await?;
        let everything = catalog.explore(Some(ALL_CATEGORIES.to_string())).await?;

        assert_eq!(goats.len(), 1);
        assert_eq!(everything.len(), 3);

        Ok(())
    }

    #[tokio::test]
    async fn explore_surfaces_backend_failures() -> TestResult {
        let (_backend, catalog) = service().await?;

        let result = catalog.explore(Some("broken".to_string())).await;

        assert!(
            matches!(result, Err(CatalogServiceError::Api(_))),
            "expected Api error, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn product_detail_is_tagged_product() -> TestResult {
        let (_backend, catalog) = service().await?;

        let item = catalog.product(&ItemId::from("PRD-FEED-01")).await?;

        assert_eq!(item.kind(), ItemKind::Product);
        assert_eq!(item.available_quantity(), 10);

        Ok(())
    }

    #[tokio::test]
    async fn livestock_detail_is_tagged_livestock() -> TestResult {
        let (_backend, catalog) = service().await?;

        let item = catalog.livestock(&ItemId::from("ANM-0007")).await?;

        let CatalogItem::Livestock(animal) = item else {
            return Err("expected livestock".into());
        };

        assert_eq!(animal.breed.as_deref(), Some("Khari"));

        Ok(())
    }

    #[tokio::test]
    async fn unknown_listing_is_not_found() -> TestResult {
        let (_backend, catalog) = service().await?;

        let result = catalog.product(&ItemId::from("missing")).await;

        assert!(
            matches!(result, Err(CatalogServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );

        Ok(())
    }
}
