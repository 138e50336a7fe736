use actix_web::body::BoxBody;
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, Responder};
use serde::Serialize;

/// JSON envelope shared by every `/api/orders` response
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: &'static str,
    pub status_code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn created(message: impl Into<String>, results: T) -> Self {
        Self {
            status: "created",
            status_code: StatusCode::CREATED.as_u16(),
            message: message.into(),
            results: Some(results),
        }
    }

    pub fn success(message: impl Into<String>, results: T) -> Self {
        Self {
            status: "success",
            status_code: StatusCode::OK.as_u16(),
            message: message.into(),
            results: Some(results),
        }
    }

    pub fn into_response(self) -> HttpResponse {
        let status = StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        HttpResponse::build(status).json(self)
    }
}

impl ApiResponse<()> {
    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status: "error",
            status_code: status.as_u16(),
            message: message.into(),
            results: None,
        }
    }
}

impl<T: Serialize> Responder for ApiResponse<T> {
    type Body = BoxBody;

    fn respond_to(self, _req: &HttpRequest) -> HttpResponse<Self::Body> {
        self.into_response()
    }
}
