use serde::de::{self, Deserialize, Deserializer};
use std::fmt;

/// Helix radius in nanometers used when files do not carry one.
pub const DEFAULT_RADIUS: f64 = 1.125;

/// The lattices a virtual helix can snap to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatticeKind {
    Honeycomb,
    Square,
}

/// Lattice a part was designed on. `None` means free placement with no
/// lattice to snap to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GridType {
    None,
    Square,
    #[default]
    Honeycomb,
}

impl GridType {
    pub fn lattice(&self) -> Option<LatticeKind> {
        match self {
            GridType::None => None,
            GridType::Square => Some(LatticeKind::Square),
            GridType::Honeycomb => Some(LatticeKind::Honeycomb),
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(GridType::None),
            1 => Some(GridType::Square),
            2 => Some(GridType::Honeycomb),
            _ => None,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "none" => Some(GridType::None),
            "square" => Some(GridType::Square),
            "honeycomb" => Some(GridType::Honeycomb),
            _ => None,
        }
    }
}

impl fmt::Display for GridType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GridType::None => write!(f, "none"),
            GridType::Square => write!(f, "square"),
            GridType::Honeycomb => write!(f, "honeycomb"),
        }
    }
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum RawEnum {
    Code(i64),
    Name(String),
}

impl<'de> Deserialize<'de> for GridType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let parsed = match RawEnum::deserialize(deserializer)? {
            RawEnum::Code(code) => GridType::from_code(code),
            RawEnum::Name(name) => GridType::from_name(&name),
        };
        parsed.ok_or_else(|| de::Error::custom("Unsupported grid type"))
    }
}

/// A (row, column) cell on a lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LatticeCoord {
    pub row: i64,
    pub column: i64,
}

impl LatticeCoord {
    pub fn new(row: i64, column: i64) -> Self {
        Self { row, column }
    }

    fn is_odd_parity(&self) -> bool {
        (self.row.rem_euclid(2)) != (self.column.rem_euclid(2))
    }
}

/// Model-space centre of a lattice cell.
pub fn lattice_coord_to_model_xy(kind: LatticeKind, radius: f64, coord: LatticeCoord) -> (f64, f64) {
    match kind {
        LatticeKind::Honeycomb => {
            let x = coord.column as f64 * radius * 3f64.sqrt();
            let y = if coord.is_odd_parity() {
                -(coord.row as f64) * radius * 3.0 + radius
            } else {
                -(coord.row as f64) * radius * 3.0
            };
            (x, y)
        }
        LatticeKind::Square => {
            let x = coord.column as f64 * radius * 2.0;
            let y = -(coord.row as f64) * radius * 2.0;
            (x, y)
        }
    }
}

/// Returns the distance from `(x, y)` to the nearest lattice cell centre and
/// the coordinate of that cell.
pub fn distance_from_closest_lattice_coord(
    x: f64,
    y: f64,
    radius: f64,
    kind: LatticeKind,
) -> (f64, LatticeCoord) {
    let (column_guess, row_guess) = match kind {
        LatticeKind::Honeycomb => (x / (radius * 3f64.sqrt()), -y / (radius * 3.0)),
        LatticeKind::Square => (x / (radius * 2.0), -y / (radius * 2.0)),
    };

    // Odd-parity honeycomb cells sit one radius above their row, so the
    // neighbouring rows have to be searched as well.
    let rows = (row_guess.floor() as i64).saturating_sub(1)
        ..=(row_guess.ceil() as i64).saturating_add(1);
    let columns = (column_guess.floor() as i64)..=(column_guess.ceil() as i64);

    let mut best = LatticeCoord::new(row_guess.round() as i64, column_guess.round() as i64);
    let mut shortest_distance = f64::INFINITY;
    for row in rows {
        for column in columns.clone() {
            let coord = LatticeCoord::new(row, column);
            let (guess_x, guess_y) = lattice_coord_to_model_xy(kind, radius, coord);
            let distance = (guess_x - x).hypot(guess_y - y);
            if distance < shortest_distance {
                shortest_distance = distance;
                best = coord;
            }
        }
    }
    (shortest_distance, best)
}
