use actix_web::web;

use super::handlers::submit_document;

pub fn document_route(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/submit").route(web::post().to(submit_document)));
}
