use crate::error::MedtrackError;
use actix_web::HttpRequest;
use medtrack_infra::MedtrackContext;
use subtle::ConstantTimeEq;

pub const CRON_SECRET_HEADER: &str = "medtrack-cron-secret";

/// Only the external scheduler knowing the cron secret may trigger jobs over http
pub fn protect_cron_route(req: &HttpRequest, ctx: &MedtrackContext) -> Result<(), MedtrackError> {
    let secret = req
        .headers()
        .get(CRON_SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            MedtrackError::Unauthorized(format!("Missing `{}` header", CRON_SECRET_HEADER))
        })?;

    let matches: bool = secret
        .as_bytes()
        .ct_eq(ctx.config.cron_secret.as_bytes())
        .into();
    if !matches {
        return Err(MedtrackError::Unauthorized(format!(
            "Invalid `{}` header",
            CRON_SECRET_HEADER
        )));
    }
    Ok(())
}
