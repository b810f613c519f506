pub mod normalize;
pub mod rating;

pub use normalize::{
    build_canonical_url, build_profile_url, effective_domain, extract_domain,
    extract_root_domain, normalize_domain, DEFAULT_PROFILE_BASE,
};
pub use rating::Rating;
