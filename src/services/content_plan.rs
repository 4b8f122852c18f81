use crate::error::Result;
use crate::rest::RestClient;
use crate::types::{
    ContentPlanItem, ContentPlanQuery, CreateContentPlanRequest, MaybeEnveloped,
    PaginatedEnvelope, UpdateContentPlanRequest,
};

/// The content calendar.
#[derive(Debug, Clone)]
pub struct ContentPlanService {
    rest: RestClient,
}

impl ContentPlanService {
    pub fn new(rest: RestClient) -> Self {
        Self { rest }
    }

    /// One page of content plan items matching `query`.
    pub async fn list(&self, query: &ContentPlanQuery) -> Result<PaginatedEnvelope<ContentPlanItem>> {
        self.rest
            .get_with_query(&["content-plans"], &query.to_pairs())
            .await
    }

    pub async fn get(&self, id: &str) -> Result<ContentPlanItem> {
        let item: MaybeEnveloped<ContentPlanItem> = self.rest.get(&["content-plans", id]).await?;
        Ok(item.into_inner())
    }

    pub async fn create(&self, request: &CreateContentPlanRequest) -> Result<ContentPlanItem> {
        let item: MaybeEnveloped<ContentPlanItem> =
            self.rest.post(&["content-plans"], request).await?;
        Ok(item.into_inner())
    }

    /// Sends only the fields set in `request`.
    pub async fn update(
        &self,
        id: &str,
        request: &UpdateContentPlanRequest,
    ) -> Result<ContentPlanItem> {
        let item: MaybeEnveloped<ContentPlanItem> =
            self.rest.put(&["content-plans", id], request).await?;
        Ok(item.into_inner())
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.rest.delete(&["content-plans", id]).await
    }
}
