/// Candidate type advertised after the `typ` token of a candidate line.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum CandidateType {
    Host,
    ServerReflexive,
    PeerReflexive,
    Relay,
}

/// Reads the advertised type of a raw candidate line.
///
/// Accepts the line with or without the `a=` attribute prefix.
pub fn candidate_type(line: &str) -> Option<CandidateType> {
    let line = line.trim();
    let line = line.strip_prefix("a=").unwrap_or(line);
    let rest = line.strip_prefix("candidate:")?;

    let mut tokens = rest.split_ascii_whitespace();
    tokens.find(|token| *token == "typ")?;

    match tokens.next()? {
        "host" => Some(CandidateType::Host),
        "srflx" => Some(CandidateType::ServerReflexive),
        "prflx" => Some(CandidateType::PeerReflexive),
        "relay" => Some(CandidateType::Relay),
        _ => None,
    }
}

/// Decides whether a candidate exposes a direct address.
pub trait CandidatePolicy: Send + Sync {
    fn is_direct(&self, candidate_line: &str) -> bool;
}

impl<F> CandidatePolicy for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_direct(&self, candidate_line: &str) -> bool {
        self(candidate_line)
    }
}

/// Only relay candidates are kept; everything else, including lines that
/// cannot be classified, counts as direct.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelayOnly;

impl CandidatePolicy for RelayOnly {
    fn is_direct(&self, candidate_line: &str) -> bool {
        candidate_type(candidate_line) != Some(CandidateType::Relay)
    }
}
