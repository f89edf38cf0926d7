pub mod decode;
pub mod direction;
pub mod error;
pub mod import;
pub mod lattice;
pub mod model;
pub mod observer;
pub mod record;
pub mod transaction;
pub mod view_mode;

pub use decode::{decode, decode_part, decode_str, DecodeOptions};
pub use direction::Direction;
pub use error::{DesignError, Result};
pub use import::import_to_part;
pub use lattice::{GridType, LatticeCoord, LatticeKind};
pub use model::{Document, Oligo, OligoId, Part, PartId, StrandRef, VirtualHelix};
pub use observer::{DesignEvent, DesignObserver, NullObserver};
pub use record::{DesignFile, PartRecord};
pub use transaction::TransactionLog;
pub use view_mode::{determine_ortho_view_type, OrthoViewType, RecordedView};
