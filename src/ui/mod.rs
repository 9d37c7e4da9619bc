pub mod controls;
pub mod dialogs;
pub mod map;

pub use controls::{TransportAction, TransportWindow};
pub use dialogs::FileDialogs;
pub use map::{LatLon, MapView, MapWindow};
