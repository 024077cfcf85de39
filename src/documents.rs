//! Printable contract documents.
//!
//! Rendering and storage live outside the engine; validation only needs a
//! reference back, or a failure that aborts the transition.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::booking::Booking;

/// handle to a generated document held by the storage collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    pub id: Uuid,
    pub name: String,
}

/// renders the contract for a booking being validated
pub trait DocumentGenerator: Send + Sync {
    fn generate_contract(&self, booking: &Booking) -> std::result::Result<DocumentRef, String>;
}

/// queues a document named after the booking reference; rendering happens later
#[derive(Debug, Default)]
pub struct DeferredDocuments {
    requested: Mutex<Vec<String>>,
}

impl DeferredDocuments {
    pub fn new() -> Self {
        Self::default()
    }

    /// references of the contracts requested so far
    pub fn requested(&self) -> Vec<String> {
        self.requested
            .lock()
            .map(|r| r.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl DocumentGenerator for DeferredDocuments {
    fn generate_contract(&self, booking: &Booking) -> std::result::Result<DocumentRef, String> {
        let name = format!("{}.pdf", booking.reference);
        match self.requested.lock() {
            Ok(mut r) => r.push(booking.reference.clone()),
            Err(poisoned) => poisoned.into_inner().push(booking.reference.clone()),
        }
        Ok(DocumentRef {
            id: Uuid::new_v4(),
            name,
        })
    }
}
