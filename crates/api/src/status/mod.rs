use actix_web::{web, HttpResponse};
use medtrack_api_structs::get_service_health::*;

async fn get_service_health_controller() -> HttpResponse {
    HttpResponse::Ok().json(APIResponse {
        message: "Yo! We are up!\r\n".into(),
    })
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(get_service_health_controller));
}
