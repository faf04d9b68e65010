//! Category Taxonomy
//!
//! The fixed set of document classes the triage pipeline recognizes. Every
//! other module depends on this table: the classifier validates model replies
//! against it and the organizer derives folder names and filename prefixes
//! from it. Defined once at compile time, never mutated.

use std::collections::HashMap;

/// A single document category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    /// Unique short code, e.g. "COF"
    pub code: &'static str,
    /// Human-readable display name
    pub label: &'static str,
    /// Description shown to the model in the classification prompt
    pub description: &'static str,
    /// Target directory name under the organize base directory
    pub folder_name: &'static str,
    /// Filename prefix for sequentially numbered documents, e.g. "ICTCOF"
    pub file_prefix: &'static str,
}

/// Code assigned whenever classification fails or the model returns a code
/// outside the taxonomy.
pub const FALLBACK_CODE: &str = "OOPR";

/// Terminal pseudo-category for supplier delivery orders. Files are still
/// routed to its folder but it is excluded from the default numbering
/// listing.
pub const SKIP_CODE: &str = "DO";

pub const CATEGORIES: [Category; 9] = [
    Category {
        code: "COF",
        label: "Computer Order Form",
        description: "Requests to purchase or issue new computers and peripherals",
        folder_name: "Computer Order Forms",
        file_prefix: "ICTCOF",
    },
    Category {
        code: "EAF",
        label: "Email Account Form",
        description: "Applications for new, renamed or deactivated email accounts",
        folder_name: "Email Account Forms",
        file_prefix: "ICTEAF",
    },
    Category {
        code: "SAF",
        label: "System Access Form",
        description: "Requests for access rights to internal systems and applications",
        folder_name: "System Access Forms",
        file_prefix: "ICTSAF",
    },
    Category {
        code: "HRF",
        label: "Hardware Repair Form",
        description: "Reports of faulty hardware and requests for repair or replacement",
        folder_name: "Hardware Repair Forms",
        file_prefix: "ICTHRF",
    },
    Category {
        code: "SIF",
        label: "Software Installation Form",
        description: "Requests to install, upgrade or license software",
        folder_name: "Software Installation Forms",
        file_prefix: "ICTSIF",
    },
    Category {
        code: "NRF",
        label: "Network Request Form",
        description: "Network point, Wi-Fi and VPN access requests",
        folder_name: "Network Request Forms",
        file_prefix: "ICTNRF",
    },
    Category {
        code: "ETF",
        label: "Equipment Transfer Form",
        description: "Transfers of ICT equipment between staff or departments",
        folder_name: "Equipment Transfer Forms",
        file_prefix: "ICTETF",
    },
    Category {
        code: "OOPR",
        label: "Other Office Paperwork",
        description: "Any office document that does not match another category",
        folder_name: "Other Office Paperwork",
        file_prefix: "ICTOOPR",
    },
    Category {
        code: "DO",
        label: "Delivery Order",
        description: "Supplier delivery orders; filed separately, not processed",
        folder_name: "Skip",
        file_prefix: "DO",
    },
];

/// Look up a category by code (case-insensitive)
pub fn by_code(code: &str) -> Option<&'static Category> {
    CATEGORIES
        .iter()
        .find(|c| c.code.eq_ignore_ascii_case(code))
}

/// Whether a code belongs to the taxonomy
pub fn is_valid_code(code: &str) -> bool {
    by_code(code).is_some()
}

/// The fallback category record
pub fn fallback() -> &'static Category {
    by_code(FALLBACK_CODE).expect("fallback code must be in the taxonomy")
}

/// Default per-category starting numbers for one organize run. The skip
/// pseudo-category is omitted; a skip file that is organized anyway gets a
/// lazy per-run counter starting at 1.
pub fn default_numbering() -> HashMap<String, u32> {
    CATEGORIES
        .iter()
        .filter(|c| c.code != SKIP_CODE)
        .map(|c| (c.code.to_string(), 1))
        .collect()
}
