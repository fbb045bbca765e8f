use actix_web::{web, HttpResponse};
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::capture::interfaces;
use crate::capture::session::{SessionState, SharedSession};
use crate::models::interface::InterfaceInfo;
use crate::utils::error::CaptureError;

/// Request for starting capture
#[derive(Deserialize)]
pub struct StartCaptureRequest {
    /// Interface to capture on
    pub interface: String,
}

/// Response for listing interfaces
#[derive(Serialize)]
struct InterfacesResponse {
    /// Interface names, in enumeration order
    interfaces: Vec<String>,

    /// Detailed interface information
    detailed_interfaces: Vec<InterfaceInfo>,
}

/// Response for capture status
#[derive(Serialize)]
struct CaptureStatusResponse {
    state: SessionState,
    interface: Option<String>,
    session_id: Uuid,
    last_error: Option<String>,
}

/// List available network interfaces
pub async fn list_interfaces() -> Result<HttpResponse, CaptureError> {
    let detailed_interfaces = interfaces::list()?;
    let interfaces = detailed_interfaces
        .iter()
        .map(|info| info.name.clone())
        .collect();

    Ok(HttpResponse::Ok().json(InterfacesResponse {
        interfaces,
        detailed_interfaces,
    }))
}

/// Start packet capture on the requested interface
pub async fn start_capture(
    session: web::Data<SharedSession>,
    request: web::Json<StartCaptureRequest>,
) -> Result<HttpResponse, CaptureError> {
    let mut session = session.write().await;
    session.start(&request.interface).await?;

    info!("Capture started on {}", request.interface);
    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "message": format!("Capture started on {}", request.interface),
    })))
}

/// Stop packet capture; a no-op success when nothing is running
pub async fn stop_capture(session: web::Data<SharedSession>) -> Result<HttpResponse, CaptureError> {
    let mut session = session.write().await;
    session.stop().await?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "message": "Capture stopped",
    })))
}

/// Get capture status
pub async fn get_capture_status(session: web::Data<SharedSession>) -> HttpResponse {
    let session = session.read().await;

    HttpResponse::Ok().json(CaptureStatusResponse {
        state: session.state(),
        interface: session.interface().map(str::to_string),
        session_id: session.session_id(),
        last_error: session.last_error().map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::session::CaptureSession;
    use crate::capture::source::{CaptureBackend, PacketSource};
    use crate::models::config::CaptureConfig;
    use crate::utils::error::CaptureResult;
    use actix_web::{http::StatusCode, test, App};
    use std::sync::Arc;

    struct StubBackend;

    impl CaptureBackend for StubBackend {
        fn interface_names(&self) -> CaptureResult<Vec<String>> {
            Ok(vec!["eth0".to_string(), "wlan0".to_string()])
        }

        fn open(
            &self,
            _interface: &str,
            _config: &CaptureConfig,
        ) -> CaptureResult<Box<dyn PacketSource>> {
            Ok(Box::new(EmptySource))
        }
    }

    struct EmptySource;

    impl PacketSource for EmptySource {
        fn next_frame(&mut self) -> CaptureResult<Option<Vec<u8>>> {
            Ok(None)
        }
    }

    fn shared_session() -> SharedSession {
        Arc::new(tokio::sync::RwLock::new(CaptureSession::new(
            Arc::new(StubBackend),
            CaptureConfig::default(),
        )))
    }

    #[actix_web::test]
    async fn start_with_empty_interface_is_a_bad_request() {
        let session = shared_session();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Arc::clone(&session)))
                .route("/api/capture/start", web::post().to(start_capture)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/capture/start")
            .set_json(json!({ "interface": "" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(session.read().await.state(), SessionState::Idle);
    }

    #[actix_web::test]
    async fn start_stop_round_trip_over_http() {
        let session = shared_session();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Arc::clone(&session)))
                .route("/api/capture/start", web::post().to(start_capture))
                .route("/api/capture/stop", web::post().to(stop_capture))
                .route("/api/capture/status", web::get().to(get_capture_status)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/capture/start")
            .set_json(json!({ "interface": "wlan0" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let status: serde_json::Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get()
                .uri("/api/capture/status")
                .to_request(),
        )
        .await;
        assert_eq!(status["state"], "active");
        assert_eq!(status["interface"], "wlan0");

        let req = test::TestRequest::post()
            .uri("/api/capture/stop")
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        // Redundant stop is still a success.
        let req = test::TestRequest::post()
            .uri("/api/capture/stop")
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
        assert_eq!(session.read().await.state(), SessionState::Idle);
    }
}
