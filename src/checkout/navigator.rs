use tokio::sync::mpsc;

/// Places the checkout can send the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login { return_to: String },
    Checkout { booking_id: String },
    CheckoutSuccess { booking_id: String },
    Bookings,
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Login { return_to } => format!("/login?redirect={return_to}"),
            Route::Checkout { booking_id } => format!("/checkout/{booking_id}"),
            Route::CheckoutSuccess { booking_id } => format!("/checkout/{booking_id}/success"),
            Route::Bookings => "/bookings".to_string(),
        }
    }
}

/// Navigation side effect, owned by whatever renders the checkout.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Forwards navigation requests to a channel the view layer drains.
#[derive(Clone)]
pub struct ChannelNavigator {
    tx: mpsc::UnboundedSender<Route>,
}

impl ChannelNavigator {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Route>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Navigator for ChannelNavigator {
    fn navigate(&self, route: Route) {
        tracing::debug!(path = %route.path(), "navigate");
        if self.tx.send(route).is_err() {
            tracing::debug!("navigation receiver dropped");
        }
    }
}
