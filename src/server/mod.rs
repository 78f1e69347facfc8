mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::Extension,
    routing::{get, patch, post},
    Router,
};

use crate::api::{DynAPI, API};
use crate::server::handlers::{app_commission, bids, bookings, deleted_bookings, ride_limits};

pub async fn serve<T: API + Send + Sync + 'static>(api: T, addr: SocketAddr) {
    let api = Arc::new(api) as DynAPI;

    let app = Router::new()
        .route("/bookings", post(bookings::create))
        .route("/bookings/:id", get(bookings::find).delete(bookings::remove))
        .route("/bookings/:id/accept", patch(bookings::accept))
        .route("/bookings/:id/reject", patch(bookings::reject))
        .route("/bookings/:id/start", patch(bookings::start))
        .route("/bookings/:id/finish", patch(bookings::finish))
        .route("/bookings/:id/cancel", patch(bookings::cancel))
        .route("/bookings/:id/status", patch(bookings::set_status))
        .route("/bookings/:id/bids", get(bids::list))
        .route("/bids", post(bids::create))
        .route("/bids/:id/accept", patch(bids::accept))
        .route("/ride_limits/:rider_id", get(ride_limits::find))
        .route("/app_commission", get(app_commission::find).put(app_commission::set))
        .route("/deleted_bookings", get(deleted_bookings::list))
        .route("/deleted_bookings/:id", get(deleted_bookings::find))
        .layer(Extension(api));

    tracing::info!("listening on {}", addr);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
        .unwrap();
}
