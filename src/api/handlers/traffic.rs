use actix_web::{web, HttpResponse};

use crate::capture::session::SharedSession;

/// Get the current traffic counters.
///
/// Always succeeds: before the first capture this returns the all-zero
/// snapshot with a nil session id.
pub async fn get_traffic_data(session: web::Data<SharedSession>) -> HttpResponse {
    let session = session.read().await;
    HttpResponse::Ok().json(session.snapshot())
}
