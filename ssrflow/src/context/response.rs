//! Single-use holder for the outgoing response.

use crate::errors::TransportError;
use http::Response;

/// Holds the response for one request and refuses a second send.
#[derive(Debug, Default)]
pub struct ResponseSlot {
    response: Option<Response<String>>,
    sent: bool,
}

impl ResponseSlot {
    /// Creates an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the response.
    ///
    /// Fails with [`TransportError::AlreadySent`] if a response was already
    /// stored, even if it has since been taken.
    pub fn send(&mut self, response: Response<String>) -> Result<(), TransportError> {
        if self.sent {
            return Err(TransportError::AlreadySent);
        }
        self.sent = true;
        self.response = Some(response);
        Ok(())
    }

    /// Returns true once a response has been stored.
    #[must_use]
    pub fn is_sent(&self) -> bool {
        self.sent
    }

    /// Borrows the stored response.
    #[must_use]
    pub fn peek(&self) -> Option<&Response<String>> {
        self.response.as_ref()
    }

    /// Takes the stored response out of the slot.
    pub fn take(&mut self) -> Result<Response<String>, TransportError> {
        self.response.take().ok_or(TransportError::NotSent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_once() {
        let mut slot = ResponseSlot::new();
        assert!(!slot.is_sent());

        slot.send(Response::new("a".to_string())).unwrap();
        assert!(slot.is_sent());
        assert_eq!(slot.peek().map(|r| r.body().as_str()), Some("a"));

        let err = slot.send(Response::new("b".to_string())).unwrap_err();
        assert!(matches!(err, TransportError::AlreadySent));
    }

    #[test]
    fn test_take_then_send_still_fails() {
        let mut slot = ResponseSlot::new();
        slot.send(Response::new(String::new())).unwrap();
        assert!(slot.take().is_ok());
        assert!(matches!(slot.take(), Err(TransportError::NotSent)));
        assert!(slot.send(Response::new(String::new())).is_err());
    }
}
