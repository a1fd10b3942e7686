// The client facade: wires config, session store, transport, HTTP client
// and query cache, and exposes one cached read or invalidating mutation
// per API operation. This is the layer UI code talks to.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::NaiveDate;

use crate::cache::{CacheStatsReport, QueryCache, QueryKey, ResourceFamily};
use crate::error::{ApiError, ClientError};
use crate::filters::TourFilters;
use crate::models::*;
use crate::services;
use crate::session::{MemoryStorage, SessionStorage, SessionStore};
use crate::transport::{encode_query, FilePayload, HttpClient, ReqwestTransport, Transport};

pub const DEFAULT_BASE_URL: &str = "http://localhost:4000/api";
const BASE_URL_ENV: &str = "TOUR_API_BASE_URL";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base endpoint of the API deployment; the only configuration that
    /// selects a target environment.
    pub base_url: String,
    /// Fixed per-request timeout.
    pub timeout: Duration,
    /// Staleness window for slow-moving resources (tours, categories).
    pub stale_ttl: Duration,
    /// Page size used when a filter state does not specify one.
    pub default_page_limit: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
            stale_ttl: Duration::from_secs(300),
            default_page_limit: crate::filters::DEFAULT_PAGE_LIMIT,
        }
    }
}

impl ClientConfig {
    /// Reads the base URL from `TOUR_API_BASE_URL`, falling back to the
    /// default deployment.
    pub fn from_env() -> Self {
        let base_url = std::env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self {
            base_url,
            ..Self::default()
        }
    }
}

pub struct TourBookingClient {
    config: ClientConfig,
    http: Arc<HttpClient>,
    cache: Arc<QueryCache>,
    session: Arc<SessionStore>,
}

impl TourBookingClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        if config.base_url.trim().is_empty() {
            return Err(ClientError::Config("base_url must not be empty".into()));
        }
        let transport = Arc::new(ReqwestTransport::new(config.timeout)?);
        Ok(Self::with_parts(
            config,
            transport,
            Box::new(MemoryStorage::new()),
        ))
    }

    /// Assembles a client from injected parts; the seam tests use to swap
    /// in a mock transport and storage backend.
    pub fn with_parts(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        storage: Box<dyn SessionStorage>,
    ) -> Self {
        let session = Arc::new(SessionStore::new(storage));
        let http = Arc::new(HttpClient::new(
            &config.base_url,
            transport,
            Arc::clone(&session),
        ));
        Self {
            config,
            http,
            cache: Arc::new(QueryCache::new()),
            session,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn cache_stats(&self) -> CacheStatsReport {
        self.cache.stats()
    }

    /// Filter state seeded with this client's configured page size.
    pub fn new_filters(&self) -> TourFilters {
        TourFilters::new(self.config.default_page_limit)
    }

    /// Called whenever any request comes back 401. The session store has
    /// already been cleared when the handler runs; the subscriber decides
    /// what "go to login" means for its surface.
    pub fn on_session_expired(&self, handler: impl Fn() + Send + Sync + 'static) {
        self.http.on_auth_expired(Arc::new(handler));
    }

    // ---- auth ----

    pub async fn register(&self, data: &RegisterData) -> Result<AuthResponse, ApiError> {
        let auth = services::auth::register(&self.http, data).await?;
        self.session.store_session(&auth.token, &auth.user);
        self.cache.put(QueryKey::Profile, &auth.user)?;
        Ok(auth)
    }

    pub async fn login(&self, data: &LoginData) -> Result<AuthResponse, ApiError> {
        let auth = services::auth::login(&self.http, data).await?;
        self.session.store_session(&auth.token, &auth.user);
        self.cache.put(QueryKey::Profile, &auth.user)?;
        Ok(auth)
    }

    /// Drops the session and every cached read.
    pub fn logout(&self) {
        self.session.clear();
        self.cache.clear();
    }

    /// Idle unless a token is present; the profile read never runs for an
    /// anonymous client.
    pub async fn profile(&self) -> Result<Option<User>, ApiError> {
        if !self.session.is_authenticated() {
            return Ok(None);
        }
        let http = Arc::clone(&self.http);
        let user = self
            .cache
            .get_or_fetch(QueryKey::Profile, None, move || async move {
                services::auth::profile(&http).await
            })
            .await?;
        Ok(Some(user))
    }

    pub async fn update_profile(&self, data: &UpdateProfileData) -> Result<User, ApiError> {
        let user = services::auth::update_profile(&self.http, data).await?;
        self.session.set_user(&user);
        self.cache.put(QueryKey::Profile, &user)?;
        Ok(user)
    }

    // ---- tours ----

    pub async fn tours(&self) -> Result<Vec<Tour>, ApiError> {
        let http = Arc::clone(&self.http);
        self.cache
            .get_or_fetch(QueryKey::Tours, Some(self.config.stale_ttl), move || {
                async move { services::tours::all(&http).await }
            })
            .await
    }

    pub async fn search_tours(&self, filters: &TourFilters) -> Result<ToursResponse, ApiError> {
        let key = QueryKey::TourSearch(encode_query(&filters.to_query_params()));
        let http = Arc::clone(&self.http);
        let filters = filters.clone();
        self.cache
            .get_or_fetch(key, Some(self.config.stale_ttl), move || async move {
                services::tours::search(&http, &filters).await
            })
            .await
    }

    pub async fn tour(&self, id: Option<i64>) -> Result<Option<Tour>, ApiError> {
        let Some(id) = id else { return Ok(None) };
        let http = Arc::clone(&self.http);
        let tour = self
            .cache
            .get_or_fetch(QueryKey::Tour(id), None, move || async move {
                services::tours::by_id(&http, id).await
            })
            .await?;
        Ok(Some(tour))
    }

    pub async fn tours_by_category(&self, category: &str) -> Result<Option<Vec<Tour>>, ApiError> {
        if category.is_empty() {
            return Ok(None);
        }
        let http = Arc::clone(&self.http);
        let key = QueryKey::ToursByCategory(category.to_string());
        let category = category.to_string();
        let tours = self
            .cache
            .get_or_fetch(key, None, move || async move {
                services::tours::by_category(&http, &category).await
            })
            .await?;
        Ok(Some(tours))
    }

    pub async fn available_tours(&self) -> Result<Vec<Tour>, ApiError> {
        let http = Arc::clone(&self.http);
        self.cache
            .get_or_fetch(QueryKey::AvailableTours, None, move || async move {
                services::tours::available(&http).await
            })
            .await
    }

    pub async fn tours_by_date_range(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Tour>, ApiError> {
        let key = QueryKey::ToursByDateRange(start_date.to_string(), end_date.to_string());
        let http = Arc::clone(&self.http);
        self.cache
            .get_or_fetch(key, None, move || async move {
                services::tours::by_date_range(&http, start_date, end_date).await
            })
            .await
    }

    // ---- bookings ----

    pub async fn my_bookings(&self) -> Result<Vec<Booking>, ApiError> {
        let http = Arc::clone(&self.http);
        self.cache
            .get_or_fetch(QueryKey::MyBookings, None, move || async move {
                services::bookings::my_bookings(&http).await
            })
            .await
    }

    pub async fn booking(&self, id: Option<i64>) -> Result<Option<Booking>, ApiError> {
        let Some(id) = id else { return Ok(None) };
        let http = Arc::clone(&self.http);
        let booking = self
            .cache
            .get_or_fetch(QueryKey::Booking(id), None, move || async move {
                services::bookings::by_id(&http, id).await
            })
            .await?;
        Ok(Some(booking))
    }

    pub async fn create_booking(&self, data: &CreateBookingData) -> Result<Booking, ApiError> {
        let booking = services::bookings::create(&self.http, data).await?;
        self.cache.invalidate_family(ResourceFamily::Bookings);
        Ok(booking)
    }

    pub async fn update_booking(
        &self,
        id: i64,
        data: &UpdateBookingData,
    ) -> Result<Booking, ApiError> {
        let booking = services::bookings::update(&self.http, id, data).await?;
        self.cache.invalidate_family(ResourceFamily::Bookings);
        Ok(booking)
    }

    pub async fn cancel_booking(&self, id: i64) -> Result<(), ApiError> {
        services::bookings::cancel(&self.http, id).await?;
        self.cache.invalidate_family(ResourceFamily::Bookings);
        Ok(())
    }

    /// Opens a payment checkout and returns the redirect URL. Nothing is
    /// invalidated; the booking only changes once payment is verified.
    pub async fn create_checkout(
        &self,
        booking_id: i64,
        data: &CheckoutData,
    ) -> Result<CheckoutResponse, ApiError> {
        services::bookings::create_checkout(&self.http, booking_id, data).await
    }

    pub async fn verify_payment(&self, booking_id: i64, order_id: &str) -> Result<(), ApiError> {
        services::bookings::verify_payment(&self.http, booking_id, order_id).await?;
        self.cache.invalidate_family(ResourceFamily::Bookings);
        Ok(())
    }

    // ---- comments ----

    pub async fn tour_comments(
        &self,
        tour_id: Option<i64>,
    ) -> Result<Option<Vec<TourComment>>, ApiError> {
        let Some(tour_id) = tour_id else { return Ok(None) };
        let http = Arc::clone(&self.http);
        let comments = self
            .cache
            .get_or_fetch(QueryKey::TourComments(tour_id), None, move || async move {
                services::comments::for_tour(&http, tour_id).await
            })
            .await?;
        Ok(Some(comments))
    }

    pub async fn tour_rating(&self, tour_id: Option<i64>) -> Result<Option<TourRating>, ApiError> {
        let Some(tour_id) = tour_id else { return Ok(None) };
        let http = Arc::clone(&self.http);
        let rating = self
            .cache
            .get_or_fetch(QueryKey::TourRating(tour_id), None, move || async move {
                services::comments::rating(&http, tour_id).await
            })
            .await?;
        Ok(Some(rating))
    }

    pub async fn comment(&self, id: Option<i64>) -> Result<Option<TourComment>, ApiError> {
        let Some(id) = id else { return Ok(None) };
        let http = Arc::clone(&self.http);
        let comment = self
            .cache
            .get_or_fetch(QueryKey::Comment(id), None, move || async move {
                services::comments::by_id(&http, id).await
            })
            .await?;
        Ok(Some(comment))
    }

    pub async fn create_comment(&self, data: &CreateCommentData) -> Result<TourComment, ApiError> {
        let comment = services::comments::create(&self.http, data).await?;
        self.invalidate_comments_for(comment.tour_id);
        Ok(comment)
    }

    pub async fn update_comment(
        &self,
        id: i64,
        data: &UpdateCommentData,
    ) -> Result<TourComment, ApiError> {
        let comment = services::comments::update(&self.http, id, data).await?;
        self.invalidate_comments_for(comment.tour_id);
        Ok(comment)
    }

    /// After a delete the tour the comment belonged to is no longer known
    /// client-side, so the whole comments family is invalidated.
    pub async fn delete_comment(&self, id: i64) -> Result<(), ApiError> {
        services::comments::delete(&self.http, id).await?;
        self.cache.invalidate_family(ResourceFamily::Comments);
        Ok(())
    }

    fn invalidate_comments_for(&self, tour_id: i64) {
        self.cache.invalidate_matching(move |key| {
            matches!(
                key,
                QueryKey::TourComments(t) | QueryKey::TourRating(t) if *t == tour_id
            )
        });
    }

    // ---- categories ----

    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        let http = Arc::clone(&self.http);
        self.cache
            .get_or_fetch(
                QueryKey::Categories,
                Some(self.config.stale_ttl),
                move || async move { services::categories::all(&http).await },
            )
            .await
    }

    pub async fn difficulties(&self) -> Result<Vec<Category>, ApiError> {
        let http = Arc::clone(&self.http);
        self.cache
            .get_or_fetch(
                QueryKey::Difficulties,
                Some(self.config.stale_ttl),
                move || async move { services::categories::difficulties(&http).await },
            )
            .await
    }

    // ---- upload ----

    pub async fn upload_file(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Bytes,
    ) -> Result<UploadResponse, ApiError> {
        services::upload::file(
            &self.http,
            FilePayload {
                file_name: file_name.to_string(),
                content_type: content_type.to_string(),
                bytes,
            },
        )
        .await
    }
}
