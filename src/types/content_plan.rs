use serde::{Deserialize, Serialize};

/// Publication state of a planned content item.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ContentStatus {
    Draft,
    Scheduled,
    Published,
    Cancelled,
    Failed,
}

impl ContentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentStatus::Draft => "draft",
            ContentStatus::Scheduled => "scheduled",
            ContentStatus::Published => "published",
            ContentStatus::Cancelled => "cancelled",
            ContentStatus::Failed => "failed",
        }
    }
}

/// Channel a content item is published on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ChannelType {
    SocialMedia,
    Blog,
    Email,
    Video,
    Website,
    Newsletter,
    Podcast,
    Webinar,
}

impl ChannelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelType::SocialMedia => "social_media",
            ChannelType::Blog => "blog",
            ChannelType::Email => "email",
            ChannelType::Video => "video",
            ChannelType::Website => "website",
            ChannelType::Newsletter => "newsletter",
            ChannelType::Podcast => "podcast",
            ChannelType::Webinar => "webinar",
        }
    }
}

/// A scheduled piece of marketing content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentPlanItem {
    pub id: String,
    pub task_date: String,
    #[serde(default)]
    pub last_updated_date: Option<String>,
    pub channel_id: String,
    pub title: String,
    #[serde(default)]
    pub descript_content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    pub status: ContentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_post_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_data: Option<String>,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub publish_time: String,
    #[serde(default)]
    pub product: String,
    #[serde(default)]
    pub target_customer: String,
    #[serde(default)]
    pub goals: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article_route: Option<String>,
    pub channel_type: ChannelType,
}

/// Body of `POST /content-plans`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateContentPlanRequest {
    pub task_date: String,
    pub channel_id: String,
    pub title: String,
    pub descript_content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    pub status: ContentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_data: Option<String>,
    pub publish_time: String,
    pub product: String,
    pub target_customer: String,
    pub goals: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article_route: Option<String>,
    pub channel_type: ChannelType,
}

/// Body of `PUT /content-plans/{id}`.  Only the set fields are sent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UpdateContentPlanRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descript_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ContentStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_customer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goals: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article_route: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_type: Option<ChannelType>,
}

/// Filters for `GET /content-plans`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentPlanQuery {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub status: Option<ContentStatus>,
    pub channel_type: Option<ChannelType>,
    pub product: Option<String>,
    pub target_customer: Option<String>,
}

impl ContentPlanQuery {
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_status(mut self, status: ContentStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_channel_type(mut self, channel_type: ChannelType) -> Self {
        self.channel_type = Some(channel_type);
        self
    }

    /// The query as name/value pairs; unset and empty filters are omitted.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(offset) = self.offset {
            pairs.push(("offset", offset.to_string()));
        }
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        if let Some(channel_type) = self.channel_type {
            pairs.push(("channel_type", channel_type.as_str().to_string()));
        }
        if let Some(product) = self.product.as_ref().filter(|p| !p.is_empty()) {
            pairs.push(("product", product.clone()));
        }
        if let Some(target) = self.target_customer.as_ref().filter(|t| !t.is_empty()) {
            pairs.push(("target_customer", target.clone()));
        }
        pairs
    }
}
