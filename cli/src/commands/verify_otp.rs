//! Verify OTP command.

use anyhow::Result;
use webdesk_auth::otp::validate_otp;

use crate::output::Output;

/// Verifies `otp` offline and prints the result as JSON.
pub async fn run_verify_otp(otp: &str, out: &Output) -> Result<bool> {
    match validate_otp(otp).await {
        Ok(verification) => {
            out.print(serde_json::to_string_pretty(&verification)?);
            Ok(true)
        }
        Err(e) => {
            out.error(format!("OTP rejected: {e}"));
            Ok(false)
        }
    }
}
