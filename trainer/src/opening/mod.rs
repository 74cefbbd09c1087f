pub mod catalog;
pub mod controller;
pub mod decoy;
pub mod line;

pub use catalog::{Catalog, CatalogError, Descriptions, LineSelection, SortOrder, MAIN_LINE};
pub use controller::{
    Choice, ChoiceOutcome, ControllerError, ControllerState, OpeningController, ResumeSource,
};
pub use decoy::DecoyGenerator;
pub use line::{Line, LineError, Ply};
