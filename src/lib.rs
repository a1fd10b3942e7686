// Client SDK for the tour-booking REST API.
//
// Layering, leaf to root: transport (request construction, bearer token,
// 401 interception) -> services (one pure request builder per endpoint)
// -> cache (staleness, coalescing, invalidation) -> client (the facade
// UI code talks to). Filter state lives beside them and turns search
// criteria into query parameters.

pub mod cache;
pub mod client;
pub mod error;
pub mod filters;
pub mod models;
pub mod services;
pub mod session;
pub mod transport;

// Re-export the types most integrations need.
pub use cache::{CacheStatsReport, QueryCache, QueryKey, ResourceFamily};
pub use client::{ClientConfig, TourBookingClient, DEFAULT_BASE_URL};
pub use error::{ApiError, ClientError};
pub use filters::{FilterKey, FilterValue, TourFilters, DEFAULT_PAGE_LIMIT};
pub use models::{
    AuthResponse, Booking, BookingStatus, Category, CheckoutData, CheckoutResponse,
    CreateBookingData, CreateCommentData, LoginData, RegisterData, Tour, TourComment,
    TourDifficulty, TourRating, ToursResponse, UpdateBookingData, UpdateCommentData,
    UpdateProfileData, UploadResponse, User, UserRole,
};
pub use session::{FileStorage, MemoryStorage, SessionStorage, SessionStore};
pub use transport::{FilePayload, HttpClient, ReqwestTransport, Transport};
