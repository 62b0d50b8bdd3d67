//! Domain types shared by the research pipeline, the planner, and the
//! transports.

pub mod bundle;
pub mod category;
pub mod records;
pub mod state;
pub mod trip;

pub use bundle::{AgentOutcome, FailureReason, ResearchBundle};
pub use category::Category;
pub use records::{
    ActivityOption, CategoryRecords, EventOption, FlightOption, HotelOption, ResearchRecord,
    RestaurantOption, TransportationOption,
};
pub use state::{Phase, Speaker, TripState, Turn};
pub use trip::{REQUIRED_FIELDS, TripDetails, TripRequest};
