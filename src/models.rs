// Data structures for the tour-booking API, matching its JSON wire format.
// The client treats these as owned by the backend: it types them but does
// not validate them beyond deserialization.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Tourist,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub role: UserRole,
    pub profile_picture: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TourDifficulty {
    Easy,
    Moderate,
    Challenging,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tour {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub images: Vec<String>,
    pub location: String,
    /// Decimal amount as sent by the backend, e.g. "499.00".
    pub price: String,
    pub start_date: String,
    pub end_date: String,
    pub available_seats: i64,
    pub category: String,
    pub is_active: bool,
    pub duration: u32,
    pub difficulty: TourDifficulty,
    /// Comma-joined service lists, kept as-is.
    pub included_services: String,
    pub excluded_services: String,
    pub itinerary: String,
    pub meeting_point: String,
    pub end_point: String,
    pub created_at: String,
    pub updated_at: String,
    pub lemon_squeezy_product_id: Option<String>,
    pub lemon_squeezy_variant_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: i64,
    pub tour_id: i64,
    pub user_id: i64,
    pub number_of_people: u32,
    pub special_requests: Option<String>,
    pub contact_phone: String,
    pub contact_email: String,
    pub status: BookingStatus,
    pub payment_id: Option<String>,
    pub is_paid: bool,
    pub total_price: String,
    pub created_at: String,
    pub updated_at: String,
    pub tour: Option<Tour>,
    pub user: Option<User>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TourComment {
    pub id: i64,
    pub comment: String,
    /// 1-5 integer rating.
    pub rating: u8,
    pub user_id: i64,
    pub tour_id: i64,
    pub created_at: String,
    pub updated_at: String,
    pub user: Option<User>,
}

/// Read-only aggregate computed server-side.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TourRating {
    pub average_rating: f64,
    pub total_comments: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

/// Paginated result of a filtered tour search.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToursResponse {
    pub tours: Vec<Tour>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterData {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingData {
    pub tour_id: i64,
    pub number_of_people: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_requests: Option<String>,
    pub contact_phone: String,
    pub contact_email: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookingData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_of_people: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_requests: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
}

/// Redirect URLs handed to the payment provider when opening a checkout.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutData {
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CheckoutResponse {
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentData {
    pub comment: String,
    pub rating: u8,
    pub tour_id: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCommentData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
}

/// Descriptor of a stored object returned by the upload endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct UploadResponse {
    #[serde(rename = "originalname")]
    pub original_name: String,
    pub filename: String,
    pub mimetype: String,
    pub size: u64,
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booking_deserializes_camel_case_wire_format() {
        let json = r#"{
            "id": 7,
            "tourId": 3,
            "userId": 12,
            "numberOfPeople": 2,
            "contactPhone": "+998901234567",
            "contactEmail": "traveler@example.com",
            "status": "pending",
            "isPaid": false,
            "totalPrice": "998.00",
            "createdAt": "2025-05-01T10:00:00Z",
            "updatedAt": "2025-05-01T10:00:00Z"
        }"#;

        let booking: Booking = serde_json::from_str(json).unwrap();
        assert_eq!(booking.id, 7);
        assert_eq!(booking.tour_id, 3);
        assert_eq!(booking.status, BookingStatus::Pending);
        assert!(!booking.is_paid);
        assert!(booking.tour.is_none());
        assert!(booking.special_requests.is_none());
    }

    #[test]
    fn update_payloads_omit_unset_fields() {
        let data = UpdateCommentData {
            rating: Some(4),
            ..Default::default()
        };
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json, serde_json::json!({ "rating": 4 }));
    }

    #[test]
    fn upload_response_uses_flat_field_names() {
        let json = r#"{
            "originalname": "passport.jpg",
            "filename": "8f3a-passport.jpg",
            "mimetype": "image/jpeg",
            "size": 18234,
            "url": "/uploads/8f3a-passport.jpg"
        }"#;
        let resp: UploadResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.original_name, "passport.jpg");
        assert_eq!(resp.mimetype, "image/jpeg");
    }

    #[test]
    fn rating_aggregate_round_trips() {
        let json = r#"{"averageRating": 4.5, "totalComments": 12}"#;
        let rating: TourRating = serde_json::from_str(json).unwrap();
        assert_eq!(rating.total_comments, 12);
        assert!((rating.average_rating - 4.5).abs() < f64::EPSILON);
    }
}
