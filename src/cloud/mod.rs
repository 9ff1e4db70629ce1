mod image;
mod published;
mod source;

pub use image::{Image, ImageState};
#[cfg(test)]
pub use image::{ImageStatus, InstallProfile};
pub use published::PublishedImage;
pub use source::{Appliance, Scan, Source};
