mod analysis;
mod dashboard;
mod error;
mod frames;
mod i18n;
mod live;
mod types;

pub use error::{error_chain, DashboardError};
pub use i18n::{Locale, Text, UnknownLocale};

pub use live::client::*;
pub use live::error::TemperatureApiError;

pub use frames::error::DataError;
pub use frames::loader::parse_timestamp;
pub use frames::observation_frame::*;

pub use analysis::chart::*;
pub use analysis::compare::*;
pub use analysis::stats::*;
pub use analysis::trend::*;

pub use dashboard::dataset::*;
pub use dashboard::html::{escape, render_html};
pub use dashboard::server::*;
pub use dashboard::view::*;

pub use types::city::*;
pub use types::observation::PreparedObservation;
