use moderation_core::{ItemId, ItemPayload, ItemRecord, Slug, Validated};

use super::{ListPage, ListRequest, Resource, Sort};
use crate::detail::DetailState;
use crate::error::ApiError;
use crate::http::ApiClient;
use crate::routes::Route;

pub struct ItemsResource;

impl Resource for ItemsResource {
    type Record = ItemRecord;

    const NAME: &'static str = "items";
    const PATH: &'static str = "items";
    const COLLECTION_KEY: &'static str = "items";
    const SORTABLE: &'static [&'static str] = &["name", "rating", "available", "owner_id"];
    const DEFAULT_SORT: Sort = Sort::desc("name");

    fn detail_route(record: &ItemRecord) -> Route {
        Route::ItemDetail(record.slug.clone())
    }
}

/// CRUD calls for items. Reads by slug, deletes by numeric id.
#[derive(Debug, Clone, Copy)]
pub struct ItemsApi<'a> {
    client: &'a ApiClient,
}

impl<'a> ItemsApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, request: &ListRequest) -> Result<ListPage<ItemRecord>, ApiError> {
        self.client.list::<ItemsResource>(request).await
    }

    pub async fn get(&self, slug: &Slug) -> Result<ItemRecord, ApiError> {
        let url = self.client.api_endpoint(&["items", slug.as_str()], false)?;
        self.client.get_json(url).await
    }

    pub async fn detail(&self, slug: &Slug) -> DetailState<ItemRecord> {
        DetailState::from_result(self.get(slug).await, "Failed to load item.")
    }

    pub async fn create(&self, item: &Validated<ItemPayload>) -> Result<ItemRecord, ApiError> {
        let url = self.client.api_endpoint(&["items"], true)?;
        let created: ItemRecord = self.client.send_json(reqwest::Method::POST, url, item.get()).await?;
        tracing::info!(slug = %created.slug, "item created");
        Ok(created)
    }

    pub async fn update(
        &self,
        slug: &Slug,
        item: &Validated<ItemPayload>,
    ) -> Result<ItemRecord, ApiError> {
        let url = self.client.api_endpoint(&["items", slug.as_str()], false)?;
        self.client.send_json(reqwest::Method::PUT, url, item.get()).await
    }

    pub async fn delete(&self, id: ItemId) -> Result<(), ApiError> {
        let url = self.client.api_endpoint(&["items", &id.to_string()], false)?;
        self.client.delete(url).await?;
        tracing::info!(%id, "item deleted");
        Ok(())
    }
}
