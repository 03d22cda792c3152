//! Booking status transitions.
//!
//! Staff move bookings through a fixed table of edges; anything outside the
//! table is refused before it reaches the database.

use crate::errors::ServiceError;
use crate::models::BookingStatus;

impl BookingStatus {
    /// Statuses that hold the hall for their time range.
    pub fn blocks_calendar(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Approved)
    }

    pub fn is_terminal(&self) -> bool {
        self.allowed_transitions().is_empty()
    }

    pub fn allowed_transitions(&self) -> &'static [BookingStatus] {
        match self {
            BookingStatus::Pending => &[
                BookingStatus::Approved,
                BookingStatus::Rejected,
                BookingStatus::Cancelled,
            ],
            BookingStatus::Approved => &[BookingStatus::Completed, BookingStatus::Cancelled],
            BookingStatus::Rejected | BookingStatus::Cancelled | BookingStatus::Completed => &[],
        }
    }

    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }

    pub fn transition(self, next: BookingStatus) -> Result<BookingStatus, ServiceError> {
        if self == next {
            return Err(ServiceError::Conflict(format!("Booking is already {}", self)));
        }
        if self.is_terminal() {
            return Err(ServiceError::Conflict(format!("A {} booking can no longer change", self)));
        }
        if !self.can_transition_to(next) {
            return Err(ServiceError::Conflict(format!(
                "Cannot change booking status from {} to {}",
                self, next
            )));
        }
        Ok(next)
    }
}

/// Statuses a booking may be created with directly.
pub fn initial_status_allowed(status: BookingStatus) -> bool {
    status.blocks_calendar()
}
