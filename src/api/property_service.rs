use crate::{
    api::ApiClient,
    dto::documents::PropertyList,
    error::AppResult,
    models::PropertySummary,
};

#[derive(Clone)]
pub struct PropertyService {
    client: ApiClient,
}

impl PropertyService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Properties owned by the signed-in landlord.
    pub async fn list_my_properties(&self) -> AppResult<Vec<PropertySummary>> {
        let list: PropertyList = self.client.get(&["properties", "mine"], "property").await?;
        Ok(list.items)
    }

    pub async fn get_property(&self, property_id: &str) -> AppResult<PropertySummary> {
        self.client.get(&["properties", property_id], "property").await
    }
}
