//! Solutions (knowledge base): categories, folders and articles.
//!
//! Folder listings come back without the id of their parent category, so
//! [`Solutions::list_folders`] stamps it onto every folder.

use serde_json::Value;

use crate::client::FreshdeskClient;
use crate::error::FreshdeskError;
use crate::request::RequestSpec;

/// Solutions resource, borrowed from a [`FreshdeskClient`].
///
/// # Example
///
/// ```ignore
/// let folders = client.solutions().list_folders(42).await?;
/// for folder in folders.as_array().into_iter().flatten() {
///     assert_eq!(folder["category_id"], 42);
/// }
/// ```
#[derive(Clone, Copy)]
pub struct Solutions<'a> {
    client: &'a FreshdeskClient,
}

impl<'a> Solutions<'a> {
    pub(crate) fn new(client: &'a FreshdeskClient) -> Self {
        Self { client }
    }

    /// Lists all solution categories.
    pub async fn list_categories(&self) -> Result<Value, FreshdeskError> {
        self.client.get("/solutions/categories").await
    }

    /// Gets one category.
    pub async fn get_category(&self, id: u64) -> Result<Value, FreshdeskError> {
        self.client
            .get(&format!("/solutions/categories/{}", id))
            .await
    }

    /// Creates a category.
    pub async fn create_category(&self, body: Value) -> Result<Value, FreshdeskError> {
        self.client.post("/solutions/categories", body).await
    }

    /// Updates a category.
    pub async fn update_category(&self, id: u64, body: Value) -> Result<Value, FreshdeskError> {
        self.client
            .put(&format!("/solutions/categories/{}", id), body)
            .await
    }

    /// Deletes a category.
    pub async fn delete_category(&self, id: u64) -> Result<Value, FreshdeskError> {
        self.client
            .delete(&format!("/solutions/categories/{}", id))
            .await
    }

    /// Lists the folders of a category, each stamped with `category_id`.
    pub async fn list_folders(&self, category_id: u64) -> Result<Value, FreshdeskError> {
        let spec = RequestSpec::get(format!("/solutions/categories/{}/folders", category_id))
            .with_correlation_id(category_id);
        self.client.request(spec).await
    }

    /// Gets one folder.
    pub async fn get_folder(&self, id: u64) -> Result<Value, FreshdeskError> {
        self.client.get(&format!("/solutions/folders/{}", id)).await
    }

    /// Creates a folder inside a category.
    pub async fn create_folder(&self, category_id: u64, body: Value) -> Result<Value, FreshdeskError> {
        self.client
            .post(&format!("/solutions/categories/{}/folders", category_id), body)
            .await
    }

    /// Updates a folder.
    pub async fn update_folder(&self, id: u64, body: Value) -> Result<Value, FreshdeskError> {
        self.client
            .put(&format!("/solutions/folders/{}", id), body)
            .await
    }

    /// Deletes a folder.
    pub async fn delete_folder(&self, id: u64) -> Result<Value, FreshdeskError> {
        self.client
            .delete(&format!("/solutions/folders/{}", id))
            .await
    }

    /// Lists the articles of a folder.
    pub async fn list_articles(&self, folder_id: u64) -> Result<Value, FreshdeskError> {
        self.client
            .get(&format!("/solutions/folders/{}/articles", folder_id))
            .await
    }

    /// Gets one article.
    pub async fn get_article(&self, id: u64) -> Result<Value, FreshdeskError> {
        self.client.get(&format!("/solutions/articles/{}", id)).await
    }

    /// Creates an article inside a folder.
    pub async fn create_article(&self, folder_id: u64, body: Value) -> Result<Value, FreshdeskError> {
        self.client
            .post(&format!("/solutions/folders/{}/articles", folder_id), body)
            .await
    }

    /// Updates an article.
    pub async fn update_article(&self, id: u64, body: Value) -> Result<Value, FreshdeskError> {
        self.client
            .put(&format!("/solutions/articles/{}", id), body)
            .await
    }

    /// Deletes an article.
    pub async fn delete_article(&self, id: u64) -> Result<Value, FreshdeskError> {
        self.client
            .delete(&format!("/solutions/articles/{}", id))
            .await
    }
}
