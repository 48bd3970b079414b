//! Seat-hold protocol for intercity trip booking
//!
//! A user first looks at a trip's [availability](availability), then places a
//! short-lived [hold](holds) on the seats they picked, and finally
//! [finalizes](finalizer) a booking. Every step re-validates against the
//! [`SeatLedger`](ledger::SeatLedger) because state can change in between.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use seating::{MemorySeatLedger, Policies, SeatingService, SystemClock};
//!
//! # async fn demo() -> seating::SeatingResult<()> {
//! let ledger = Arc::new(MemorySeatLedger::new());
//! let service = SeatingService::new(ledger, Arc::new(SystemClock), Policies::default());
//! let availability = service.availability.availability(1).await?;
//! println!("taken: {:?}", availability.taken);
//! # Ok(())
//! # }
//! ```

pub mod availability;
pub mod clock;
pub mod error;
pub mod finalizer;
pub mod holds;
pub mod layout;
pub mod ledger;
pub mod memory;
pub mod models;
pub mod policy;
pub mod service;
pub mod validation;

pub use availability::AvailabilityResolver;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{SeatingError, SeatingResult};
pub use finalizer::BookingFinalizer;
pub use holds::HoldManager;
pub use ledger::{LedgerTx, SeatLedger};
pub use memory::MemorySeatLedger;
pub use policy::{CancellationPolicy, Policies, ReholdPolicy};
pub use service::SeatingService;
