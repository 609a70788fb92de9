//! Lotwise Queries - the authenticated query-dispatch core
//!
//! Routes a structured `(QueryKind, Property)` pair to one of ten
//! deterministic geospatial/relational lookups against Postgres/PostGIS.
//! Address resolution maps free text to the canonical property row first;
//! every distance-based lookup measures from that row's geocoded point.

pub mod payloads;
pub mod resolver;
pub mod router;
pub mod store;

pub use payloads::{
    AmenitiesInfo, AmenityInfo, AssessmentInfo, CatchmentInfo, DemographicsInfo, LotInfo,
    NearbySchool, NeighbourhoodAssessmentInfo, QueryPayload, TransitRoutesInfo, TransitStopInfo,
    ZoningInfo,
};
pub use resolver::AddressResolver;
pub use router::QueryRouter;
pub use store::PropertyStore;
