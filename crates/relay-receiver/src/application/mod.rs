//! Application layer use cases for the receiver.
//!
//! - **`consume_events`** – applies mapped pointer events to the cursor
//!   surface and tap dispatcher, recovering from surface failures.
//! - **`calibrate`** – the interactive two-click calibration flow and its
//!   persistence.
//! - **`pipeline`** – the loop that takes transport events off the bus,
//!   routes calibration clicks, maps everything else, and feeds the consumer.

pub mod calibrate;
pub mod consume_events;
pub mod pipeline;

pub use calibrate::{CalibrationController, CalibrationView};
pub use consume_events::{ConsumeOutcome, EventConsumer, CLICK_ANIMATION};
pub use pipeline::{PipelineStats, ReceiverPipeline};
