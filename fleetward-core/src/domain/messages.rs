//! Rendered notification texts.

use fleetward_model::{ManifestEventKind, PanicEvent, Session};

pub fn manifest_transition(
    subject_name: &str,
    plate_number: &str,
    event_kind: ManifestEventKind,
    session: Session,
) -> String {
    format!(
        "{subject_name} {} bus {plate_number} for the {} session.",
        event_kind.verb_phrase(),
        session.label()
    )
}

pub fn duplicate_reason(
    subject_name: &str,
    event_kind: ManifestEventKind,
    session: Session,
) -> String {
    format!(
        "{subject_name} has already {} for this bus in the {} session today",
        event_kind.past_tense(),
        session.label()
    )
}

pub fn emergency_alert(event: &PanicEvent) -> String {
    format!(
        "EMERGENCY: panic alert {} raised by {} at {:.6},{:.6} ({}). Respond immediately.",
        event.id,
        event.created_by,
        event.position.latitude,
        event.position.longitude,
        event.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_message_names_subject_plate_and_session() {
        assert_eq!(
            manifest_transition(
                "Amani Otieno",
                "KDA 123A",
                ManifestEventKind::CheckedIn,
                Session::Morning
            ),
            "Amani Otieno has checked in to bus KDA 123A for the morning session."
        );
        assert_eq!(
            manifest_transition(
                "Amani Otieno",
                "KDA 123A",
                ManifestEventKind::CheckedOut,
                Session::Evening
            ),
            "Amani Otieno has checked out of bus KDA 123A for the evening session."
        );
    }

    #[test]
    fn duplicate_reason_is_human_readable() {
        assert_eq!(
            duplicate_reason("Amani", ManifestEventKind::CheckedIn, Session::Morning),
            "Amani has already checked in for this bus in the morning session today"
        );
    }
}
