use crate::{api::ApiClient, error::AppResult, models::Booking};

#[derive(Clone)]
pub struct BookingService {
    client: ApiClient,
}

impl BookingService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_booking_by_id(&self, booking_id: &str) -> AppResult<Booking> {
        self.client.get(&["bookings", booking_id], "booking").await
    }
}
