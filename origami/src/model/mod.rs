pub mod document;
pub mod oligo;
pub mod part;
pub mod property;
pub mod strand;
pub mod virtual_helix;

pub use document::{Document, Modification, PartId};
pub use oligo::{Oligo, OligoId};
pub use part::{Crossover, ModLocation, Part, PartProperties};
pub use property::PropertyValue;
pub use strand::{Strand, StrandRef, StrandSet};
pub use virtual_helix::{HelixPlacement, VirtualHelix, DEFAULT_EULER_Z};
