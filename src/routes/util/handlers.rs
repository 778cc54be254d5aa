use actix_web::{HttpResponse, Responder};

#[utoipa::path(
    get,
    path = "/util/health_check",
    tag = "Util",
    responses(
        (status=200, description= "Server is up", body= String),
    )
)]
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().body("Running Server")
}
