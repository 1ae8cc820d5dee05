//! Human-readable error descriptions and structured JSON error formatting.

use lift_core::LiftError;

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(le) = err.downcast_ref::<LiftError>() {
        return match le {
            LiftError::Config(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Inverted floor range, zero capacity, a start floor outside the building, or a cycle outside 1..=10 s.\nHow to fix: Edit the config file (see etc/lift.toml), then rerun `lift check`."
            ),
            LiftError::InvalidRequest(msg) => format!(
                "What happened: A request was rejected ({msg}).\nLikely causes: Floor outside the building, destination equal to the origin floor, or a non-positive passenger count.\nHow to fix: Keep floors within the configured range and use FLOOR:DEST[:COUNT] with COUNT >= 1."
            ),
            LiftError::TaskTerminationTimeout(t) => format!(
                "What happened: The cycle task did not stop within {t:?}.\nLikely causes: A tick overran its cycle or the machine is heavily loaded.\nHow to fix: Raise timing.cancel_timeout_ms in the config."
            ),
            LiftError::Unconfigured => {
                "What happened: A request arrived before the simulation was configured.\nLikely causes: The client sent a call or ping before `configure`.\nHow to fix: Send a configure request first.".to_string()
            }
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();
    if lower.contains("read config") {
        return format!(
            "What happened: The config file could not be read ({msg}).\nLikely causes: Wrong --config path or missing permissions.\nHow to fix: Pass --config pointing at an existing TOML file."
        );
    }

    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes per error kind; anything untyped returns 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match err.downcast_ref::<LiftError>() {
        Some(LiftError::Config(_)) => 3,
        Some(LiftError::InvalidRequest(_)) => 4,
        Some(LiftError::TaskTerminationTimeout(_)) => 5,
        _ => 1,
    }
}

pub fn error_kind(err: &eyre::Report) -> &'static str {
    match err.downcast_ref::<LiftError>() {
        Some(LiftError::Config(_)) => "Config",
        Some(LiftError::InvalidRequest(_)) => "InvalidRequest",
        Some(LiftError::CapacityExceeded { .. }) => "CapacityExceeded",
        Some(LiftError::Inconsistency(_)) => "Inconsistency",
        Some(LiftError::TaskTerminationTimeout(_)) => "TaskTerminationTimeout",
        Some(LiftError::Unconfigured) => "Unconfigured",
        Some(LiftError::State(_)) => "State",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({
        "reason": error_kind(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_exit_3() {
        let err = eyre::Report::new(LiftError::Config("capacity must be >= 1".into()));
        assert_eq!(exit_code_for_error(&err), 3);
        assert!(humanize(&err).starts_with("What happened: Invalid configuration"));
    }

    #[test]
    fn untyped_errors_exit_1() {
        let err = eyre::eyre!("boom");
        assert_eq!(exit_code_for_error(&err), 1);
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&err)).unwrap();
        assert_eq!(v["reason"], "Error");
    }

    #[test]
    fn wrapped_lift_errors_still_downcast() {
        use eyre::WrapErr;
        let err = Err::<(), _>(LiftError::InvalidRequest("bad floor 9".into()))
            .wrap_err("step call 1")
            .unwrap_err();
        assert_eq!(exit_code_for_error(&err), 4);
    }
}
