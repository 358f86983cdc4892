use std::sync::{Arc, RwLock};

use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::models::product::{Product, ProductCreate, ProductListResponse};
use crate::services::api_gateway::{status_error, ApiGateway, RequestOptions};

/// Product panel. The in-memory list is always a direct reflection of
/// the last successful load; mutations never patch it locally, they
/// re-fetch after the server confirms.
pub struct ProductService {
    gateway: Arc<ApiGateway>,
    items: RwLock<Vec<Product>>,
}

impl ProductService {
    pub fn new(gateway: Arc<ApiGateway>) -> Self {
        Self {
            gateway,
            items: RwLock::new(Vec::new()),
        }
    }

    /// Replace the cached list wholesale with the server's current view.
    pub async fn load(&self) -> AppResult<Vec<Product>> {
        let response = self.gateway.send("/api/products", RequestOptions::get()).await?;
        if !response.is_ok() {
            return Err(status_error(
                response.status,
                response
                    .error_message()
                    .unwrap_or_else(|| "Failed to load products".to_string()),
            ));
        }

        let decoded: ProductListResponse = response.decode()?;
        self.replace_items(decoded.products.clone());
        debug!(target: "app::products", count = decoded.products.len(), "product list loaded");
        Ok(decoded.products)
    }

    /// Last successfully loaded list; unchanged by failed mutations.
    pub fn current(&self) -> Vec<Product> {
        self.items
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub async fn add(&self, input: ProductCreate) -> AppResult<Vec<Product>> {
        if input.name.trim().is_empty() || input.description.trim().is_empty() {
            return Err(AppError::validation("请填写产品名称和描述"));
        }

        let response = self
            .gateway
            .send(
                "/api/products",
                RequestOptions::post(serde_json::to_value(&input)?),
            )
            .await?;

        if !response.is_ok() {
            return Err(status_error(
                response.status,
                response
                    .error_message()
                    .unwrap_or_else(|| "Failed to add product".to_string()),
            ));
        }

        info!(target: "app::products", name = %input.name, "product added");
        self.load().await
    }

    /// Deletion demands an explicit confirmation from the caller; the
    /// cached list is left untouched on any failure.
    pub async fn delete(&self, id: i64, confirmed: bool) -> AppResult<Vec<Product>> {
        if !confirmed {
            return Err(AppError::validation("删除产品前需要确认"));
        }

        let response = self
            .gateway
            .send(&format!("/api/products/{id}"), RequestOptions::delete())
            .await?;

        if !response.is_ok() {
            return Err(status_error(
                response.status,
                response
                    .error_message()
                    .unwrap_or_else(|| "Failed to delete product".to_string()),
            ));
        }

        info!(target: "app::products", id, "product deleted");
        self.load().await
    }

    fn replace_items(&self, items: Vec<Product>) {
        if let Ok(mut guard) = self.items.write() {
            *guard = items;
        }
    }
}
