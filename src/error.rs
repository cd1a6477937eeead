//! Failure signals returned by the ring and its role handles.

/// The producer could not store a byte.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PushError {
    /// Storing the byte would make the ring indistinguishable from empty.
    /// The byte was discarded and the drop counter incremented.
    #[error("byte ring full, byte dropped")]
    Full,
}

/// A role handle was requested while another handle of the same role is alive.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ClaimError {
    #[error("producer handle already active")]
    ProducerActive,
    #[error("consumer handle already active")]
    ConsumerActive,
}

#[cfg(test)]
mod tests {
    use super::{ClaimError, PushError};
    use std::string::ToString;

    #[test]
    fn messages_name_the_condition() {
        assert_eq!(PushError::Full.to_string(), "byte ring full, byte dropped");
        assert_eq!(
            ClaimError::ConsumerActive.to_string(),
            "consumer handle already active"
        );
    }
}
