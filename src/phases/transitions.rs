use super::Phase;

/// Phases reachable by completing `from`.
pub fn allowed_next_phases(from: Phase) -> &'static [Phase] {
    match from {
        Phase::IssueStart => &[Phase::Implementation],
        Phase::Implementation => &[Phase::QualityCheck],
        Phase::QualityCheck => &[Phase::PrCreation],
        Phase::PrCreation => &[Phase::Fix, Phase::Completion],
        Phase::Fix => &[Phase::QualityCheck],
        Phase::Completion => &[],
    }
}

pub fn is_valid_transition(from: Phase, to: Phase) -> bool {
    allowed_next_phases(from).contains(&to)
}

/// String form of [`is_valid_transition`]. Unknown names are never valid.
pub fn is_valid_transition_str(from: &str, to: &str) -> bool {
    match (from.parse::<Phase>(), to.parse::<Phase>()) {
        (Ok(from), Ok(to)) => is_valid_transition(from, to),
        _ => false,
    }
}

/// Next phase when the caller supplies no usable override.
///
/// `pr_creation` always proceeds to `completion`; reaching `fix` requires an
/// explicit override. `completion` maps to itself.
pub fn default_next_phase(from: Phase) -> Phase {
    match from {
        Phase::IssueStart => Phase::Implementation,
        Phase::Implementation => Phase::QualityCheck,
        Phase::QualityCheck => Phase::PrCreation,
        Phase::PrCreation => Phase::Completion,
        Phase::Fix => Phase::QualityCheck,
        Phase::Completion => Phase::Completion,
    }
}

pub fn is_terminal(phase: Phase) -> bool {
    allowed_next_phases(phase).is_empty()
}
