//! Artifact resolution.
//!
//! Maps a fingerprint to the ordered list of places a driver artifact may
//! live. Resolution only looks at the filesystem; it never loads anything.
//!
//! Tier order is fixed:
//! 1. versioned prebuilt (`prebuild/<os>/<arch>/<major>_<minor>/`)
//! 2. architecture prebuilt (`bin64/` or `bin32/`, legacy packaging)
//! 3. local build output (`build/Release/`)

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use sqlany_core::{ArtifactLayout, EnvironmentFingerprint};
use tracing::debug;

/// Priority class of a candidate location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionTier {
    VersionedPrebuilt,
    ArchPrebuilt,
    LocalBuildOutput,
}

impl ResolutionTier {
    pub const ALL: [Self; 3] = [
        Self::VersionedPrebuilt,
        Self::ArchPrebuilt,
        Self::LocalBuildOutput,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::VersionedPrebuilt => "versioned-prebuilt",
            Self::ArchPrebuilt => "arch-prebuilt",
            Self::LocalBuildOutput => "local-build-output",
        }
    }
}

impl fmt::Display for ResolutionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A location that might hold a usable driver artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidatePath {
    pub tier: ResolutionTier,
    pub path: PathBuf,
}

impl CandidatePath {
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }
}

/// Outcome of resolving a fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// No resolution strategy exists for this fingerprint.
    Unsupported { reason: String },
    /// Candidates in tier order (possibly empty).
    Candidates(Vec<CandidatePath>),
}

impl Resolution {
    pub const fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }

    /// Candidate list; always empty for an unsupported fingerprint.
    pub fn candidates(&self) -> &[CandidatePath] {
        match self {
            Self::Unsupported { .. } => &[],
            Self::Candidates(candidates) => candidates,
        }
    }
}

/// Every tier location for `fp`, whether or not a file exists there.
pub fn plan(fp: &EnvironmentFingerprint, layout: &ArtifactLayout) -> Resolution {
    if let Some(reason) = fp.unsupported_reason() {
        return Resolution::Unsupported { reason };
    }

    let locations = [
        (
            ResolutionTier::VersionedPrebuilt,
            layout.versioned_prebuilt(fp),
        ),
        (ResolutionTier::ArchPrebuilt, layout.arch_prebuilt(fp)),
        (
            ResolutionTier::LocalBuildOutput,
            layout.local_build_output(&fp.os),
        ),
    ];

    let candidates = locations
        .into_iter()
        .filter_map(|(tier, path)| path.map(|path| CandidatePath { tier, path }))
        .collect();

    Resolution::Candidates(dedupe_candidates(candidates))
}

/// Tier locations for `fp` that exist as files, in priority order.
pub fn resolve(fp: &EnvironmentFingerprint, layout: &ArtifactLayout) -> Resolution {
    match plan(fp, layout) {
        Resolution::Candidates(all) => {
            let existing: Vec<CandidatePath> = all
                .into_iter()
                .filter(|candidate| {
                    let exists = candidate.exists();
                    debug!(
                        tier = %candidate.tier,
                        path = %candidate.path.display(),
                        exists,
                        "Checked driver candidate"
                    );
                    exists
                })
                .collect();
            Resolution::Candidates(existing)
        }
        unsupported => unsupported,
    }
}

/// Drop later duplicates of the same path, keeping the highest tier.
fn dedupe_candidates(candidates: Vec<CandidatePath>) -> Vec<CandidatePath> {
    let mut seen: HashSet<PathBuf> = HashSet::new();
    candidates
        .into_iter()
        .filter(|candidate| seen.insert(candidate.path.clone()))
        .collect()
}
