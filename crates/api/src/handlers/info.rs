use axum::Json;
use serde::Serialize;

use crate::response::DataResponse;

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub name: &'static str,
    pub version: &'static str,
}

/// GET /api/v1/
pub async fn service_info() -> Json<DataResponse<ServiceInfo>> {
    Json(DataResponse {
        data: ServiceInfo {
            name: "MANTA Dashboard API",
            version: env!("CARGO_PKG_VERSION"),
        },
    })
}
