//! Typed query failures
//!
//! Every failure on the read path is a typed result, never a silent null.
//! Build-time problems are handled locally in the builder and never appear
//! here.

use thiserror::Error;

use crate::searcher::MatchCandidate;

/// A failed name resolution.
#[derive(Debug, Clone, Error)]
pub enum MatchError {
    /// A genus-rank match is ambiguous and the supplied classification
    /// cannot resolve it. Carries the full candidate list so the caller
    /// can disambiguate.
    #[error("unresolvable homonym with {} candidates", candidates.len())]
    Homonym { candidates: Vec<MatchCandidate> },

    /// The best match is a name explicitly excluded from the taxonomy.
    /// `alternative` is a co-occurring non-excluded candidate, if any.
    #[error("name resolves to excluded concept {excluded}")]
    Excluded {
        excluded: Box<MatchCandidate>,
        alternative: Option<Box<MatchCandidate>>,
    },

    /// The input uses a "spp." marker: an intentionally unresolvable
    /// subset of a genus.
    #[error("species plural (spp.) cannot be matched to a single concept")]
    SpeciesPlural,

    /// Catch-all for unexpected input shape.
    #[error("{0}")]
    Generic(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = MatchError::Generic("no name supplied".into());
        assert_eq!(err.to_string(), "no name supplied");
        assert!(MatchError::SpeciesPlural.to_string().contains("spp."));
    }
}
