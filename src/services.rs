// One pure request builder per API operation, grouped per resource. No
// caching, no state, no error semantics beyond what the HTTP client
// already provides.

use crate::error::ApiError;
use crate::filters::TourFilters;
use crate::models::*;
use crate::transport::{FilePayload, HttpClient};

pub mod auth {
    use super::*;

    pub async fn register(http: &HttpClient, data: &RegisterData) -> Result<AuthResponse, ApiError> {
        http.post("/auth/register", data).await
    }

    pub async fn login(http: &HttpClient, data: &LoginData) -> Result<AuthResponse, ApiError> {
        http.post("/auth/login", data).await
    }

    pub async fn profile(http: &HttpClient) -> Result<User, ApiError> {
        http.get("/users/profile").await
    }

    pub async fn update_profile(
        http: &HttpClient,
        data: &UpdateProfileData,
    ) -> Result<User, ApiError> {
        http.patch("/users/profile", data).await
    }
}

pub mod tours {
    use super::*;
    use chrono::NaiveDate;

    pub async fn all(http: &HttpClient) -> Result<Vec<Tour>, ApiError> {
        http.get("/tours").await
    }

    pub async fn search(http: &HttpClient, filters: &TourFilters) -> Result<ToursResponse, ApiError> {
        http.get_with_query("/tours/search/tours", &filters.to_query_params())
            .await
    }

    pub async fn by_id(http: &HttpClient, id: i64) -> Result<Tour, ApiError> {
        http.get(&format!("/tours/{}", id)).await
    }

    pub async fn by_category(http: &HttpClient, category: &str) -> Result<Vec<Tour>, ApiError> {
        http.get(&format!(
            "/tours/category/{}",
            urlencoding::encode(category)
        ))
        .await
    }

    pub async fn available(http: &HttpClient) -> Result<Vec<Tour>, ApiError> {
        http.get("/tours/available").await
    }

    pub async fn by_date_range(
        http: &HttpClient,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Tour>, ApiError> {
        let query = [
            ("startDate", start_date.format("%Y-%m-%d").to_string()),
            ("endDate", end_date.format("%Y-%m-%d").to_string()),
        ];
        http.get_with_query("/tours/date-range", &query).await
    }
}

pub mod bookings {
    use super::*;

    pub async fn create(http: &HttpClient, data: &CreateBookingData) -> Result<Booking, ApiError> {
        http.post("/bookings", data).await
    }

    pub async fn my_bookings(http: &HttpClient) -> Result<Vec<Booking>, ApiError> {
        http.get("/bookings/my-bookings").await
    }

    pub async fn by_id(http: &HttpClient, id: i64) -> Result<Booking, ApiError> {
        http.get(&format!("/bookings/{}", id)).await
    }

    pub async fn update(
        http: &HttpClient,
        id: i64,
        data: &UpdateBookingData,
    ) -> Result<Booking, ApiError> {
        http.patch(&format!("/bookings/{}", id), data).await
    }

    /// Fire-and-forget: the server responds with no body of interest.
    pub async fn cancel(http: &HttpClient, id: i64) -> Result<(), ApiError> {
        http.post_empty(&format!("/bookings/{}/cancel", id)).await
    }

    pub async fn create_checkout(
        http: &HttpClient,
        booking_id: i64,
        data: &CheckoutData,
    ) -> Result<CheckoutResponse, ApiError> {
        http.post(
            &format!("/lemon-squeezy/create-checkout/{}", booking_id),
            data,
        )
        .await
    }

    pub async fn verify_payment(
        http: &HttpClient,
        booking_id: i64,
        order_id: &str,
    ) -> Result<(), ApiError> {
        http.post_no_content(
            &format!("/lemon-squeezy/verify-payment/{}", booking_id),
            &serde_json::json!({ "orderId": order_id }),
        )
        .await
    }
}

pub mod comments {
    use super::*;

    pub async fn create(
        http: &HttpClient,
        data: &CreateCommentData,
    ) -> Result<TourComment, ApiError> {
        http.post("/tour-comments", data).await
    }

    pub async fn for_tour(http: &HttpClient, tour_id: i64) -> Result<Vec<TourComment>, ApiError> {
        http.get(&format!("/tour-comments/tour/{}", tour_id)).await
    }

    pub async fn by_id(http: &HttpClient, id: i64) -> Result<TourComment, ApiError> {
        http.get(&format!("/tour-comments/{}", id)).await
    }

    pub async fn update(
        http: &HttpClient,
        id: i64,
        data: &UpdateCommentData,
    ) -> Result<TourComment, ApiError> {
        http.put(&format!("/tour-comments/{}", id), data).await
    }

    pub async fn delete(http: &HttpClient, id: i64) -> Result<(), ApiError> {
        http.delete(&format!("/tour-comments/{}", id)).await
    }

    pub async fn rating(http: &HttpClient, tour_id: i64) -> Result<TourRating, ApiError> {
        http.get(&format!("/tour-comments/rating/{}", tour_id)).await
    }
}

pub mod categories {
    use super::*;

    pub async fn all(http: &HttpClient) -> Result<Vec<Category>, ApiError> {
        http.get("/categories").await
    }

    pub async fn difficulties(http: &HttpClient) -> Result<Vec<Category>, ApiError> {
        http.get("/difficulties").await
    }
}

pub mod upload {
    use super::*;

    pub async fn file(http: &HttpClient, payload: FilePayload) -> Result<UploadResponse, ApiError> {
        http.post_multipart("/upload/file", payload).await
    }
}
