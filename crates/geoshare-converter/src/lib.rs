pub mod error;
pub mod geo_uri;
pub mod google_maps;
pub mod intent;
pub mod network;
pub mod quote;
pub mod state;

pub use error::{ConversionError, FailureReason, NetworkError, ParseError};
pub use geo_uri::{GeoCoordinates, GeoParams, GeoUri, GeoUriBuilder};
pub use google_maps::GoogleMapsConverter;
pub use intent::{IntentAction, IntentEvent};
pub use network::{HttpNetwork, Network};
pub use quote::{PercentQuote, UriQuote};
pub use state::{
    ConversionContext, ConversionDeps, ConversionState, PlatformPermissions, ResultSink,
    ShareContext, ShareDeps, ShareState, SinkError, StateContext, Transition, MAX_ITERATIONS,
};
