use crate::error::TensorOpsError;

/// Logs a rejected call and returns the error.
pub(crate) fn reject<T>(err: TensorOpsError) -> Result<T, TensorOpsError> {
    log::debug!("rejected: {err}");
    Err(err)
}

/// Returns true if the two buffers share at least one element in memory.
///
/// Empty buffers never overlap anything.
pub fn overlaps(a: &[f32], b: &[f32]) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    let a = a.as_ptr_range();
    let b = b.as_ptr_range();
    a.start < b.end && b.start < a.end
}

/// Fails with [`TensorOpsError::AliasingViolation`] if `res` overlaps any of `inputs`.
pub(crate) fn ensure_disjoint(
    op: &'static str,
    res: &[f32],
    inputs: &[&[f32]],
) -> Result<(), TensorOpsError> {
    if inputs.iter().any(|input| overlaps(res, input)) {
        return reject(TensorOpsError::AliasingViolation { op });
    }
    Ok(())
}

/// Fails with [`TensorOpsError::ShapeMismatch`] if the supplied result shape is not the
/// expected one.
pub(crate) fn ensure_result_shape(
    op: &'static str,
    expected: [u8; 4],
    actual: [u8; 4],
) -> Result<(), TensorOpsError> {
    if expected != actual {
        return reject(TensorOpsError::ShapeMismatch {
            op,
            lhs: expected,
            rhs: actual,
        });
    }
    Ok(())
}
