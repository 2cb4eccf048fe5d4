//! Keyword heuristic guessing whether a video or track is free to reuse.
//!
//! This is string containment and nothing more.  Output is a hint for humans and every rendered
//! verdict carries [`DISCLAIMER`].

use crate::model::{LicenseVerdict, TrackRecord, VerdictBasis, VideoRecord};

pub const DISCLAIMER: &str =
    "Best-effort guess from license and text keywords. Not a legal determination.";

/// The one open license YouTube exposes in its license field.
const OPEN_LICENSE: &str = "creative commons";

/// Phrases uploaders use to advertise free reuse.  Matched against lower-cased text.
const FREE_USE_PHRASES: &[&str] = &[
    "no copyright",
    "copyright free",
    "copyright-free",
    "non copyrighted",
    "non-copyrighted",
    "royalty free",
    "royalty-free",
    "public domain",
    "free to use",
    "nocopyrightsounds",
    "cc0",
    "cc by",
    "cc-by",
];

pub fn classify_video(video: &VideoRecord) -> LicenseVerdict {
    classify_text(&video.license_label, &video.title, &video.description)
}

pub fn classify_text(license_label: &str, title: &str, description: &str) -> LicenseVerdict {
    let license = license_label.trim().to_lowercase();
    let title = title.to_lowercase();
    let description = description.to_lowercase();

    if license == OPEN_LICENSE {
        return free(VerdictBasis::LicenseField);
    }

    if description.contains(OPEN_LICENSE)
        || FREE_USE_PHRASES
            .iter()
            .any(|phrase| title.contains(phrase) || description.contains(phrase))
    {
        return free(VerdictBasis::TextHeuristic);
    }

    restricted(VerdictBasis::LicenseField)
}

/// Being listed in a commercial catalog is presumed restricted unless the catalog's own
/// copyright line names an open license.
pub fn classify_track(track: &TrackRecord) -> LicenseVerdict {
    let copyright = track.copyright_text.to_lowercase();

    let open = copyright.contains(OPEN_LICENSE)
        || FREE_USE_PHRASES
            .iter()
            .any(|phrase| copyright.contains(phrase));

    LicenseVerdict {
        is_likely_restricted: !open,
        basis: VerdictBasis::CatalogPresence,
    }
}

fn free(basis: VerdictBasis) -> LicenseVerdict {
    LicenseVerdict {
        is_likely_restricted: false,
        basis,
    }
}

fn restricted(basis: VerdictBasis) -> LicenseVerdict {
    LicenseVerdict {
        is_likely_restricted: true,
        basis,
    }
}
