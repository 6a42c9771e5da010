use concord_audit::{AuditError, IntegrityViolation};
use concord_domain::{ConsistencyViolation, FatalExit};

/// Map a failed run to its fatal exit code.
///
/// Layer disagreement and a broken audit chain mean the tool's own output cannot be
/// trusted; everything else (contract, settings, wiring, I/O) is an engine fault.
pub fn classify_fault(err: &anyhow::Error) -> FatalExit {
    let trust_broken = err.chain().any(|cause| {
        cause.is::<ConsistencyViolation>()
            || cause.is::<IntegrityViolation>()
            || matches!(
                cause.downcast_ref::<AuditError>(),
                Some(AuditError::Integrity(_))
            )
    });
    if trust_broken {
        FatalExit::TrustFault
    } else {
        FatalExit::EngineFault
    }
}
