use actix_web::web;

use super::handlers::{
    get_session, record_liveness_frame, request_otp, resend_otp, retry_liveness, submit_email,
    verify_otp,
};

pub fn verification_route(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/email").route(web::post().to(submit_email)));
    cfg.service(web::resource("/liveness/frame").route(web::post().to(record_liveness_frame)));
    cfg.service(web::resource("/liveness/retry").route(web::post().to(retry_liveness)));
    cfg.service(web::resource("/otp/send").route(web::post().to(request_otp)));
    cfg.service(web::resource("/otp/resend").route(web::post().to(resend_otp)));
    cfg.service(web::resource("/otp/verify").route(web::post().to(verify_otp)));
    cfg.service(web::resource("/session").route(web::get().to(get_session)));
}
