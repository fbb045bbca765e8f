use actix_web::{web, HttpResponse, Responder};
use serde_json::json;

use crate::api::handlers::{
    capture::{get_capture_status, list_interfaces, start_capture, stop_capture},
    traffic::get_traffic_data,
};
use crate::api::websocket::ws_index;

/// Root endpoint to provide information about the API
async fn index() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "name": "netmeter API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "A network traffic monitoring backend with REST API",
        "endpoints": [
            {
                "path": "/api/interfaces",
                "method": "GET",
                "description": "List available network interfaces"
            },
            {
                "path": "/api/capture/start",
                "method": "POST",
                "description": "Start traffic capture on an interface"
            },
            {
                "path": "/api/capture/stop",
                "method": "POST",
                "description": "Stop traffic capture"
            },
            {
                "path": "/api/capture/status",
                "method": "GET",
                "description": "Get capture session status"
            },
            {
                "path": "/api/traffic",
                "method": "GET",
                "description": "Get current traffic counters"
            },
            {
                "path": "/api/ws",
                "method": "GET",
                "description": "WebSocket endpoint for traffic-update events"
            }
        ]
    }))
}

/// Configure API routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index)).service(
        web::scope("/api")
            // WebSocket route for pushed traffic updates
            .route("/ws", web::get().to(ws_index))
            .service(web::scope("/interfaces").route("", web::get().to(list_interfaces)))
            .service(
                web::scope("/capture")
                    .route("/start", web::post().to(start_capture))
                    .route("/stop", web::post().to(stop_capture))
                    .route("/status", web::get().to(get_capture_status)),
            )
            .route("/traffic", web::get().to(get_traffic_data)),
    );
}
