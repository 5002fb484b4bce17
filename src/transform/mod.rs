//! Affine leaf transforms.
//!
//! Every transform is pure: it reads its input through a shared borrow and
//! returns a newly owned [`PixelBuffer`](crate::pixel::PixelBuffer) in the
//! same pixel format.

mod crop;
mod flip;
mod resize;
mod rotate;

pub use crop::crop;
pub use flip::flip_xy;
pub use resize::{proportional_height, resize, resize_to_width};
pub use rotate::rotate;
