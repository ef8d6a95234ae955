//! # ob-bake: Credential Baking
//!
//! "Baking" embeds a credential in a badge image so the image itself is
//! portable proof of the award.
//!
//! | Format | Carrier |
//! |--------|---------|
//! | PNG    | `iTXt` chunk, keyword `openbadges`, placed before `IEND` |
//! | SVG    | `<openbadges:credential>` as the last child of the root |
//!
//! Both codecs validate the whole input before changing anything and leave
//! every byte outside the inserted chunk or element untouched.

pub mod baking;
pub mod detect;
pub mod error;
pub mod png;
pub mod svg;

pub use baking::{bake, is_baked, unbake, BakeOptions, BakedImage, UnbakeOptions, UnbakeResult};
pub use detect::{detect, ImageFormat};
pub use error::BakeError;
