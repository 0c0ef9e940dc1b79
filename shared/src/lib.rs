pub mod api;
pub mod division;
pub mod prediction;
pub mod report;

pub use api::*;
pub use division::{
    Bounds, Coordinates, DIVISION_CATALOG, DIVISIONS, DivisionInfo, division_info,
    locate_division,
};
pub use prediction::*;
pub use report::*;
