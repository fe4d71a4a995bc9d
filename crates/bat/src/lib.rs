#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

#[doc(inline)]
pub use bat_image as image;

#[doc(inline)]
pub use bat_imgproc as imgproc;

#[doc(inline)]
pub use bat_io as io;

#[doc(inline)]
pub use bat_3d as k3d;

#[doc(inline)]
pub use bat_scene as scene;

#[doc(inline)]
pub use bat_remote as remote;
