use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(AppointmentStatus {
    Pending => "pending",
    Confirmed => "confirmed",
    Completed => "completed",
    Cancelled => "cancelled",
});

impl AppointmentStatus {
    /// Single source of truth for the user-facing label.
    pub fn display_label(&self) -> &'static str {
        match self {
            Self::Pending => "Pendiente",
            Self::Confirmed => "Confirmada",
            Self::Completed => "Completada",
            Self::Cancelled => "Cancelada",
        }
    }

    /// Single source of truth for the UI accent color.
    pub fn color(&self) -> &'static str {
        match self {
            Self::Pending => "#f59e0b",
            Self::Confirmed => "#10b981",
            Self::Completed => "#3b82f6",
            Self::Cancelled => "#ef4444",
        }
    }

    /// Allowed lifecycle transitions. Terminal states are frozen.
    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Confirmed)
                | (Self::Pending, Self::Cancelled)
                | (Self::Confirmed, Self::Completed)
                | (Self::Confirmed, Self::Cancelled)
        )
    }
}

str_enum!(UploaderRole {
    Patient => "patient",
    Doctor => "doctor",
});

str_enum!(MessageRole {
    Patient => "patient",
    Assistant => "assistant",
});

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_round_trips_through_str() {
        for s in ["pending", "confirmed", "completed", "cancelled"] {
            let parsed = AppointmentStatus::from_str(s).unwrap();
            assert_eq!(parsed.as_str(), s);
        }
    }

    #[test]
    fn status_rejects_unknown_value() {
        let err = AppointmentStatus::from_str("rescheduled").unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidEnum { .. }));
    }

    #[test]
    fn lifecycle_transitions() {
        use AppointmentStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Completed));
        assert!(Confirmed.can_transition_to(Cancelled));

        assert!(!Pending.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Pending));
        assert!(!Confirmed.can_transition_to(Pending));
    }

    #[test]
    fn labels_are_spanish() {
        assert_eq!(AppointmentStatus::Pending.display_label(), "Pendiente");
        assert_eq!(AppointmentStatus::Cancelled.display_label(), "Cancelada");
    }

    #[test]
    fn every_status_has_a_color() {
        use AppointmentStatus::*;
        for status in [Pending, Confirmed, Completed, Cancelled] {
            assert!(status.color().starts_with('#'));
        }
    }
}
