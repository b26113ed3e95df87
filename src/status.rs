// Booking and payment status model
// Single lookup table for display metadata and advisory booking transitions.
// The backend owns the authoritative booking state; nothing here enforces it.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown status: {0}")]
pub struct UnknownStatus(pub String);

// Display metadata for a status badge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusStyle {
    pub label: &'static str,
    pub color: &'static str,
    pub bg_color: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    PendingPayment,
    CancelRequested,
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 6] = [
        BookingStatus::Pending,
        BookingStatus::PendingPayment,
        BookingStatus::CancelRequested,
        BookingStatus::Confirmed,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::PendingPayment => "PENDING_PAYMENT",
            BookingStatus::CancelRequested => "CANCEL_REQUESTED",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Completed => "COMPLETED",
            BookingStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn style(&self) -> StatusStyle {
        match self {
            BookingStatus::Pending => StatusStyle {
                label: "Pending",
                color: "text-yellow-800",
                bg_color: "bg-yellow-100",
                description: "Waiting for the provider to accept the booking",
            },
            BookingStatus::PendingPayment => StatusStyle {
                label: "Pending Payment",
                color: "text-orange-800",
                bg_color: "bg-orange-100",
                description: "Accepted, waiting for the customer to pay",
            },
            BookingStatus::CancelRequested => StatusStyle {
                label: "Cancel Requested",
                color: "text-purple-800",
                bg_color: "bg-purple-100",
                description: "Customer asked to cancel, awaiting review",
            },
            BookingStatus::Confirmed => StatusStyle {
                label: "Confirmed",
                color: "text-blue-800",
                bg_color: "bg-blue-100",
                description: "Booking is confirmed and scheduled",
            },
            BookingStatus::Completed => StatusStyle {
                label: "Completed",
                color: "text-green-800",
                bg_color: "bg-green-100",
                description: "Service has been delivered",
            },
            BookingStatus::Cancelled => StatusStyle {
                label: "Cancelled",
                color: "text-red-800",
                bg_color: "bg-red-100",
                description: "Booking was cancelled",
            },
        }
    }

    /// Statuses the UI may offer as the next step from `self`, in display order.
    pub fn allowed_transitions(&self) -> &'static [BookingStatus] {
        use BookingStatus::*;

        match self {
            Pending => &[PendingPayment, Confirmed, Cancelled],
            PendingPayment => &[Confirmed, Cancelled],
            CancelRequested => &[Confirmed, Cancelled],
            Confirmed => &[CancelRequested, Completed, Cancelled],
            Completed | Cancelled => &[],
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.allowed_transitions().is_empty()
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_uppercase();
        BookingStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == upper)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
    Failed,
    Cancelled,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 5] = [
        PaymentStatus::Pending,
        PaymentStatus::Paid,
        PaymentStatus::Refunded,
        PaymentStatus::Failed,
        PaymentStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Refunded => "REFUNDED",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn style(&self) -> StatusStyle {
        match self {
            PaymentStatus::Pending => StatusStyle {
                label: "Pending",
                color: "text-yellow-800",
                bg_color: "bg-yellow-100",
                description: "Payment has not been captured yet",
            },
            PaymentStatus::Paid => StatusStyle {
                label: "Paid",
                color: "text-green-800",
                bg_color: "bg-green-100",
                description: "Payment received",
            },
            PaymentStatus::Refunded => StatusStyle {
                label: "Refunded",
                color: "text-blue-800",
                bg_color: "bg-blue-100",
                description: "Payment was returned to the customer",
            },
            PaymentStatus::Failed => StatusStyle {
                label: "Failed",
                color: "text-red-800",
                bg_color: "bg-red-100",
                description: "Payment attempt failed",
            },
            PaymentStatus::Cancelled => StatusStyle {
                label: "Cancelled",
                color: "text-gray-800",
                bg_color: "bg-gray-100",
                description: "Payment was cancelled before capture",
            },
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_uppercase();
        PaymentStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == upper)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

pub fn can_transition_to(current: BookingStatus, next: BookingStatus) -> bool {
    current.allowed_transitions().contains(&next)
}

pub fn allowed_transitions(current: BookingStatus) -> &'static [BookingStatus] {
    current.allowed_transitions()
}

// Unknown values from the backend are shown as-is
pub fn format_booking_status(raw: &str) -> String {
    match raw.parse::<BookingStatus>() {
        Ok(status) => status.style().label.to_string(),
        Err(_) => raw.to_string(),
    }
}

pub fn format_payment_status(raw: &str) -> String {
    match raw.parse::<PaymentStatus>() {
        Ok(status) => status.style().label.to_string(),
        Err(_) => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses_have_no_transitions() {
        for terminal in [BookingStatus::Completed, BookingStatus::Cancelled] {
            assert!(terminal.is_terminal());
            assert!(allowed_transitions(terminal).is_empty());
            for next in BookingStatus::ALL {
                assert!(!can_transition_to(terminal, next));
            }
        }
    }

    #[test]
    fn test_transition_is_exact_membership() {
        for current in BookingStatus::ALL {
            let allowed = allowed_transitions(current);
            for next in BookingStatus::ALL {
                assert_eq!(can_transition_to(current, next), allowed.contains(&next));
            }
        }

        // Pending -> Confirmed -> Completed is allowed step by step, not as a jump
        assert!(can_transition_to(BookingStatus::Pending, BookingStatus::Confirmed));
        assert!(can_transition_to(BookingStatus::Confirmed, BookingStatus::Completed));
        assert!(!can_transition_to(BookingStatus::Pending, BookingStatus::Completed));
        assert!(!can_transition_to(BookingStatus::Confirmed, BookingStatus::Confirmed));
    }

    #[test]
    fn test_non_terminal_statuses_have_successors() {
        for status in BookingStatus::ALL {
            let terminal = matches!(status, BookingStatus::Completed | BookingStatus::Cancelled);
            assert_eq!(status.is_terminal(), terminal, "{status}");
        }
    }

    #[test]
    fn test_format_booking_status() {
        assert_eq!(format_booking_status("confirmed"), "Confirmed");
        assert_eq!(format_booking_status("CONFIRMED"), "Confirmed");
        assert_eq!(format_booking_status("pending_payment"), "Pending Payment");
        assert_eq!(format_booking_status("Cancel_Requested"), "Cancel Requested");
        assert_eq!(format_booking_status("SOME_UNKNOWN_STATUS"), "SOME_UNKNOWN_STATUS");
        assert_eq!(format_booking_status(""), "");
    }

    #[test]
    fn test_format_payment_status() {
        assert_eq!(format_payment_status("paid"), "Paid");
        assert_eq!(format_payment_status("REFUNDED"), "Refunded");
        assert_eq!(format_payment_status("chargeback"), "chargeback");
    }

    #[test]
    fn test_wire_names() {
        for status in BookingStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
            assert_eq!(status.as_str().parse::<BookingStatus>(), Ok(status));
        }

        let status: PaymentStatus = serde_json::from_str("\"PAID\"").unwrap();
        assert_eq!(status, PaymentStatus::Paid);

        assert_eq!(
            "ON_HOLD".parse::<BookingStatus>(),
            Err(UnknownStatus("ON_HOLD".to_string()))
        );
    }
}
