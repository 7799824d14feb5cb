//! The similarity engine.
//!
//! - **fingerprint**: decoded image → fixed-size rotation-canonical luma field
//! - **ssim**: whole-image SSIM between two fingerprints
//! - **pairs**: parallel all-pairs scoring with threshold filtering
//! - **resolve**: greedy keep/delete resolution in descending score order

pub mod fingerprint;
pub mod pairs;
pub mod resolve;
pub mod ssim;

pub use fingerprint::{Fingerprint, FingerprintExtractor, FIELD_LEN, FINGERPRINT_SIZE};
pub use pairs::{generate_scored_pairs, ScoredPair};
pub use resolve::{FileProbe, LocalFileProbe, Resolver};
pub use ssim::{ssim, ssim_from_stats};
