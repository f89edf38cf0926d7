use crate::model::{OligoId, PartId, PropertyValue};
use crate::view_mode::OrthoViewType;

/// Change notifications for a presentation layer.
///
/// Every callback fires after the change it describes has been committed to
/// the document, in the order the changes were made.
pub trait DesignObserver {
    fn part_added(&mut self, _part: PartId) {}

    fn virtual_helix_added(&mut self, _part: PartId, _id_num: usize) {}

    fn oligo_added(&mut self, _part: PartId, _oligo: OligoId) {}

    fn part_z_dimensions_changed(&mut self, _part: PartId, _min_id: usize, _max_id: usize) {}

    fn part_property_changed(&mut self, _part: PartId, _key: &str, _value: &PropertyValue) {}

    fn modification_created(&mut self, _mod_id: &str) {}

    fn ortho_view_type_changed(&mut self, _view: OrthoViewType) {}
}

/// An observer that ignores everything, for headless loads.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl DesignObserver for NullObserver {}

/// One notification, as queued by the decoder and replayed to an observer.
#[derive(Debug, Clone, PartialEq)]
pub enum DesignEvent {
    PartAdded(PartId),
    VirtualHelixAdded(PartId, usize),
    OligoAdded(PartId, OligoId),
    PartZDimensionsChanged(PartId, usize, usize),
    PartPropertyChanged(PartId, String, PropertyValue),
    ModificationCreated(String),
    OrthoViewTypeChanged(OrthoViewType),
}

impl DesignEvent {
    pub fn dispatch(&self, observer: &mut dyn DesignObserver) {
        match self {
            DesignEvent::PartAdded(part) => observer.part_added(*part),
            DesignEvent::VirtualHelixAdded(part, id_num) => {
                observer.virtual_helix_added(*part, *id_num)
            }
            DesignEvent::OligoAdded(part, oligo) => observer.oligo_added(*part, *oligo),
            DesignEvent::PartZDimensionsChanged(part, min_id, max_id) => {
                observer.part_z_dimensions_changed(*part, *min_id, *max_id)
            }
            DesignEvent::PartPropertyChanged(part, key, value) => {
                observer.part_property_changed(*part, key, value)
            }
            DesignEvent::ModificationCreated(mod_id) => observer.modification_created(mod_id),
            DesignEvent::OrthoViewTypeChanged(view) => observer.ortho_view_type_changed(*view),
        }
    }
}

/// Keeps every notification it receives, in order.
#[derive(Debug, Default, Clone)]
pub struct RecordingObserver {
    pub events: Vec<DesignEvent>,
}

impl DesignObserver for RecordingObserver {
    fn part_added(&mut self, part: PartId) {
        self.events.push(DesignEvent::PartAdded(part));
    }

    fn virtual_helix_added(&mut self, part: PartId, id_num: usize) {
        self.events.push(DesignEvent::VirtualHelixAdded(part, id_num));
    }

    fn oligo_added(&mut self, part: PartId, oligo: OligoId) {
        self.events.push(DesignEvent::OligoAdded(part, oligo));
    }

    fn part_z_dimensions_changed(&mut self, part: PartId, min_id: usize, max_id: usize) {
        self.events
            .push(DesignEvent::PartZDimensionsChanged(part, min_id, max_id));
    }

    fn part_property_changed(&mut self, part: PartId, key: &str, value: &PropertyValue) {
        self.events.push(DesignEvent::PartPropertyChanged(
            part,
            key.to_string(),
            value.clone(),
        ));
    }

    fn modification_created(&mut self, mod_id: &str) {
        self.events
            .push(DesignEvent::ModificationCreated(mod_id.to_string()));
    }

    fn ortho_view_type_changed(&mut self, view: OrthoViewType) {
        self.events.push(DesignEvent::OrthoViewTypeChanged(view));
    }
}

/// Notifications held back until the change they describe is committed.
#[derive(Debug, Default)]
pub(crate) struct EventQueue {
    events: Vec<DesignEvent>,
    structural: bool,
}

impl EventQueue {
    pub(crate) fn new(emit_structural: bool) -> Self {
        Self {
            events: Vec::new(),
            structural: emit_structural,
        }
    }

    /// Queues a structural event, unless structural events are suppressed.
    pub(crate) fn structural(&mut self, event: DesignEvent) {
        if self.structural {
            self.events.push(event);
        }
    }

    pub(crate) fn always(&mut self, event: DesignEvent) {
        self.events.push(event);
    }

    pub(crate) fn flush(&mut self, observer: &mut dyn DesignObserver) {
        for event in self.events.drain(..) {
            event.dispatch(observer);
        }
    }
}
