// Client-side core of the home-services marketplace: a session-aware API
// client, the backend proxy helper and the booking/payment status model

pub mod api_client;
pub mod config;
pub mod proxy;
pub mod session;
pub mod status;
pub mod telemetry;

// Re-export key types for convenience
pub use api_client::{
    ApiClient, ApiError, ApiResponse, ClientError, ClientStats, RequestOptions, ResponseBody,
    SessionClient, SESSION_EXPIRED_MESSAGE,
};
pub use config::ClientConfig;
pub use proxy::{backend_path, BackendProxy, ProxyRequest, ProxyResponse};
pub use session::{SessionObserver, TracingObserver};
pub use status::{
    allowed_transitions, can_transition_to, format_booking_status, format_payment_status,
    BookingStatus, PaymentStatus, StatusStyle, UnknownStatus,
};
